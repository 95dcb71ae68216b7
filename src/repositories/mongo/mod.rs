use alloc::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database};
use tracing::Instrument;

use super::{
    check_membership, CommentQuery, CommentRepository, FollowQuery, FollowRepository,
    LikeRepository, NotificationQuery, NotificationRepository, PostCounter, PostCounters,
    PostQuery, PostRepository, Repositories, RepositoryError, Result, UserCounter, UserCounters,
    UserMutation, UserQuery, UserRepository,
};
use crate::entities::{
    Comment, CommentId, Follow, FollowId, Like, Notification, NotificationId, Post, PostId, User,
    UserId,
};
use crate::utils::LetChain;

mod converters;
mod helpers;
mod models;

use converters::{convert_repo_err, to_bool, try_unique_check};
use helpers::{
    and, after_filter, count, cursor_of, get_many, get_one, increment, index, initialize_coll,
    newest_first,
};
use models::{
    like_key, MongoCommentModel, MongoFollowModel, MongoLikeModel, MongoNotificationModel,
    MongoPostModel, MongoUserModel,
};

pub async fn mongo_repositories(
    uri_str: impl AsRef<str>,
    db_name: impl AsRef<str>,
) -> ::anyhow::Result<Repositories> {
    let c = Client::with_uri_str(uri_str).await?;
    let db = c.database(db_name.as_ref());

    let repos = Repositories {
        users: Arc::new(MongoUserRepository::new_with(&db).await?),
        follows: Arc::new(MongoFollowRepository::new_with(&db).await?),
        posts: Arc::new(MongoPostRepository::new_with(&db).await?),
        likes: Arc::new(MongoLikeRepository::new_with(&db).await?),
        comments: Arc::new(MongoCommentRepository::new_with(&db).await?),
        notifications: Arc::new(MongoNotificationRepository::new_with(&db).await?),
    };

    Ok(repos)
}

pub struct MongoUserRepository {
    coll: Collection<MongoUserModel>,
}

impl MongoUserRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "user",
            vec![index("topics", doc! { "topics": 1 })],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("user"),
        })
    }
}

pub struct MongoFollowRepository {
    coll: Collection<MongoFollowModel>,
}

impl MongoFollowRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "follow",
            vec![
                index("follower_created", doc! { "follower_id": 1, "created": -1 }),
                index("following_created", doc! { "following_id": 1, "created": -1 }),
            ],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("follow"),
        })
    }
}

pub struct MongoPostRepository {
    coll: Collection<MongoPostModel>,
}

impl MongoPostRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "post",
            vec![
                index("topics_created", doc! { "topics": 1, "created": -1 }),
                index("author_created", doc! { "author_id": 1, "created": -1 }),
            ],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("post"),
        })
    }
}

pub struct MongoLikeRepository {
    coll: Collection<MongoLikeModel>,
}

impl MongoLikeRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll("like", vec![index("post", doc! { "post_id": 1 })], db).await?;

        Ok(Self {
            coll: db.collection("like"),
        })
    }
}

pub struct MongoCommentRepository {
    coll: Collection<MongoCommentModel>,
}

impl MongoCommentRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "comment",
            vec![index("post_created", doc! { "post_id": 1, "created": -1 })],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("comment"),
        })
    }
}

pub struct MongoNotificationRepository {
    coll: Collection<MongoNotificationModel>,
}

impl MongoNotificationRepository {
    pub async fn new_with(db: &Database) -> ::anyhow::Result<Self> {
        initialize_coll(
            "notification",
            vec![
                index("recipient_created", doc! { "recipient_id": 1, "created": -1 }),
                index("comment", doc! { "comment_id": 1 }),
            ],
            db,
        )
        .await?;

        Ok(Self {
            coll: db.collection("notification"),
        })
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, item: User) -> Result<bool> {
        let model: MongoUserModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn is_exists(&self, id: &UserId) -> Result<bool> {
        count(&self.coll, doc! { "_id": &id.0 })
            .await
            .map(|n| n > 0)
    }

    async fn find(&self, id: &UserId) -> Result<User> {
        get_one(&self.coll, doc! { "_id": &id.0 }).await
    }

    async fn finds(&self, UserQuery { topic, limit }: UserQuery) -> Result<Vec<User>> {
        let filter = match topic {
            Some(t) => doc! { "topics": t.0 },
            None => doc! {},
        };
        let options = ::mongodb::options::FindOptions::builder()
            .limit(limit.map(|l| l as i64))
            .build();

        get_many(&self.coll, filter, options).await
    }

    async fn update(&self, id: &UserId, mutation: UserMutation) -> Result<User> {
        let UserMutation {
            display_name,
            photo_url,
            topics,
            suspended,
            admin,
        } = mutation;

        let mut set = Document::new();
        if let Some(val) = display_name {
            set.insert("display_name", val);
        }
        if let Some(val) = photo_url {
            set.insert("photo_url", val);
        }
        if let Some(val) = topics {
            set.insert(
                "topics",
                val.into_iter().map(|t| t.0).collect::<Vec<_>>(),
            );
        }
        if let Some(val) = suspended {
            set.insert("suspended", val);
        }
        if let Some(val) = admin {
            set.insert("admin", val);
        }

        if !set.is_empty() {
            let res = self
                .coll
                .update_one(doc! { "_id": &id.0 }, doc! { "$set": set }, None)
                .instrument(tracing::trace_span!("update_one"))
                .await
                .let_(convert_repo_err)?;

            if !res.matched_count.let_(to_bool) {
                return Err(RepositoryError::NotFound);
            }
        }

        self.find(id).await
    }

    async fn increment(&self, id: &UserId, counter: UserCounter, delta: i64) -> Result<()> {
        increment(&self.coll, &id.0, counter.field(), delta, false).await
    }

    async fn set_counters(&self, id: &UserId, counters: UserCounters) -> Result<()> {
        let res = self
            .coll
            .update_one(
                doc! { "_id": &id.0 },
                doc! { "$set": {
                    "followers_count": counters.followers,
                    "following_count": counters.following,
                    "posts_count": counters.posts,
                } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?;

        match res.matched_count.let_(to_bool) {
            true => Ok(()),
            false => Err(RepositoryError::NotFound),
        }
    }
}

fn follow_filter(follower: Option<UserId>, following: Option<UserId>) -> Vec<Document> {
    let mut filters = vec![];
    if let Some(u) = follower {
        filters.push(doc! { "follower_id": u.0 });
    }
    if let Some(u) = following {
        filters.push(doc! { "following_id": u.0 });
    }
    filters
}

#[async_trait]
impl FollowRepository for MongoFollowRepository {
    async fn insert(&self, item: Follow) -> Result<bool> {
        let model: MongoFollowModel = item.into();

        // `_id` is the edge key; a second insert of the pair fails with E11000.
        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn is_exists(&self, id: &FollowId) -> Result<bool> {
        count(&self.coll, doc! { "_id": &id.0 })
            .await
            .map(|n| n > 0)
    }

    async fn finds(
        &self,
        FollowQuery {
            follower,
            following,
            after,
            limit,
        }: FollowQuery,
    ) -> Result<Vec<Follow>> {
        let mut filters = follow_filter(follower, following);
        if let Some(a) = after {
            if let Some(created) = cursor_of(&self.coll, &a.0).await? {
                filters.push(after_filter(created, a.0));
            }
        }

        get_many(&self.coll, and(filters), newest_first(limit)).await
    }

    async fn count(&self, query: FollowQuery) -> Result<u64> {
        count(&self.coll, and(follow_filter(query.follower, query.following))).await
    }

    async fn delete(&self, id: &FollowId) -> Result<bool> {
        self.coll
            .delete_one(doc! { "_id": &id.0 }, None)
            .instrument(tracing::trace_span!("delete_one"))
            .await
            .let_(convert_repo_err)
            .map(|r| r.deleted_count.let_(to_bool))
    }
}

fn post_filter(query: &PostQuery) -> Result<Vec<Document>> {
    let mut filters = vec![];
    if let Some(ref t) = query.topic {
        filters.push(doc! { "topics": &t.0 });
    }
    if let Some(ref authors) = query.authors {
        check_membership(authors)?;
        let set = authors.iter().map(|a| a.0.clone()).collect::<Vec<_>>();
        filters.push(doc! { "author_id": { "$in": set } });
    }
    if let Some(ref a) = query.author {
        filters.push(doc! { "author_id": &a.0 });
    }
    Ok(filters)
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn insert(&self, item: Post) -> Result<bool> {
        let model: MongoPostModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: &PostId) -> Result<Post> {
        get_one(&self.coll, doc! { "_id": id.to_string() }).await
    }

    async fn finds(&self, query: PostQuery) -> Result<Vec<Post>> {
        let mut filters = post_filter(&query)?;
        if let Some(a) = query.after {
            if let Some(created) = cursor_of(&self.coll, a.to_string()).await? {
                filters.push(after_filter(created, a.to_string()));
            }
        }

        get_many(&self.coll, and(filters), newest_first(query.limit)).await
    }

    async fn count(&self, query: PostQuery) -> Result<u64> {
        count(&self.coll, and(post_filter(&query)?)).await
    }

    async fn increment(&self, id: &PostId, counter: PostCounter, delta: i64) -> Result<()> {
        increment(&self.coll, id.to_string(), counter.field(), delta, true).await
    }

    async fn set_counters(&self, id: &PostId, counters: PostCounters) -> Result<()> {
        let res = self
            .coll
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": {
                    "likes_count": counters.likes,
                    "comments_count": counters.comments,
                } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?;

        match res.matched_count.let_(to_bool) {
            true => Ok(()),
            false => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: &PostId) -> Result<Post> {
        let post = self.find(id).await?;

        self.coll
            .delete_one(doc! { "_id": id.to_string() }, None)
            .instrument(tracing::trace_span!("delete_one"))
            .await
            .let_(convert_repo_err)?;

        Ok(post)
    }
}

#[async_trait]
impl LikeRepository for MongoLikeRepository {
    async fn insert(&self, item: Like) -> Result<bool> {
        let model: MongoLikeModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn is_exists(&self, post_id: &PostId, user_id: &UserId) -> Result<bool> {
        count(&self.coll, doc! { "_id": like_key(post_id, user_id) })
            .await
            .map(|n| n > 0)
    }

    async fn count(&self, post_id: &PostId) -> Result<u64> {
        count(&self.coll, doc! { "post_id": post_id.to_string() }).await
    }

    async fn delete(&self, post_id: &PostId, user_id: &UserId) -> Result<bool> {
        self.coll
            .delete_one(doc! { "_id": like_key(post_id, user_id) }, None)
            .instrument(tracing::trace_span!("delete_one"))
            .await
            .let_(convert_repo_err)
            .map(|r| r.deleted_count.let_(to_bool))
    }

    async fn delete_by_post(&self, post_id: &PostId) -> Result<u64> {
        self.coll
            .delete_many(doc! { "post_id": post_id.to_string() }, None)
            .instrument(tracing::trace_span!("delete_many"))
            .await
            .let_(convert_repo_err)
            .map(|r| r.deleted_count)
    }
}

#[async_trait]
impl CommentRepository for MongoCommentRepository {
    async fn insert(&self, item: Comment) -> Result<bool> {
        let model: MongoCommentModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: &CommentId) -> Result<Comment> {
        get_one(&self.coll, doc! { "_id": id.to_string() }).await
    }

    async fn finds(&self, CommentQuery { post, after, limit }: CommentQuery) -> Result<Vec<Comment>> {
        let mut filters = vec![];
        if let Some(p) = post {
            filters.push(doc! { "post_id": p.to_string() });
        }
        if let Some(a) = after {
            if let Some(created) = cursor_of(&self.coll, a.to_string()).await? {
                filters.push(after_filter(created, a.to_string()));
            }
        }

        get_many(&self.coll, and(filters), newest_first(limit)).await
    }

    async fn count(&self, CommentQuery { post, .. }: CommentQuery) -> Result<u64> {
        let filter = match post {
            Some(p) => doc! { "post_id": p.to_string() },
            None => doc! {},
        };

        count(&self.coll, filter).await
    }

    async fn delete(&self, id: &CommentId) -> Result<Comment> {
        let comment = self.find(id).await?;

        self.coll
            .delete_one(doc! { "_id": id.to_string() }, None)
            .instrument(tracing::trace_span!("delete_one"))
            .await
            .let_(convert_repo_err)?;

        Ok(comment)
    }
}

fn notification_filter(query: &NotificationQuery) -> Vec<Document> {
    let mut filters = vec![];
    if let Some(ref r) = query.recipient {
        filters.push(doc! { "recipient_id": &r.0 });
    }
    if query.unread_only {
        filters.push(doc! { "read": false });
    }
    if let Some(c) = query.comment {
        filters.push(doc! { "comment_id": c.to_string() });
    }
    filters
}

#[async_trait]
impl NotificationRepository for MongoNotificationRepository {
    async fn insert(&self, item: Notification) -> Result<bool> {
        let model: MongoNotificationModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: &NotificationId) -> Result<Notification> {
        get_one(&self.coll, doc! { "_id": id.to_string() }).await
    }

    async fn finds(&self, query: NotificationQuery) -> Result<Vec<Notification>> {
        let mut filters = notification_filter(&query);
        if let Some(a) = query.after {
            if let Some(created) = cursor_of(&self.coll, a.to_string()).await? {
                filters.push(after_filter(created, a.to_string()));
            }
        }

        get_many(&self.coll, and(filters), newest_first(query.limit)).await
    }

    async fn count(&self, query: NotificationQuery) -> Result<u64> {
        count(&self.coll, and(notification_filter(&query))).await
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<bool> {
        let res = self
            .coll
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": { "read": true } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?;

        match res.matched_count.let_(to_bool) {
            true => Ok(res.modified_count.let_(to_bool)),
            false => Err(RepositoryError::NotFound),
        }
    }

    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64> {
        self.coll
            .update_many(
                doc! { "recipient_id": &recipient.0, "read": false },
                doc! { "$set": { "read": true } },
                None,
            )
            .instrument(tracing::trace_span!("update_many"))
            .await
            .let_(convert_repo_err)
            .map(|r| r.modified_count)
    }

    async fn delete_by_comment(&self, comment_id: &CommentId) -> Result<u64> {
        self.coll
            .delete_many(doc! { "comment_id": comment_id.to_string() }, None)
            .instrument(tracing::trace_span!("delete_many"))
            .await
            .let_(convert_repo_err)
            .map(|r| r.deleted_count)
    }
}
