use alloc::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

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

mod helpers;

use helpers::{find_mut, find_ref, newest_page, remove_one};

pub struct InMemoryRepository<T>(Mutex<Vec<T>>);

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self { Self(Mutex::new(vec![])) }
}
impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self { Self::new() }
}

pub fn in_memory_repositories() -> Repositories {
    Repositories {
        users: Arc::new(InMemoryRepository::<User>::new()),
        follows: Arc::new(InMemoryRepository::<Follow>::new()),
        posts: Arc::new(InMemoryRepository::<Post>::new()),
        likes: Arc::new(InMemoryRepository::<Like>::new()),
        comments: Arc::new(InMemoryRepository::<Comment>::new()),
        notifications: Arc::new(InMemoryRepository::<Notification>::new()),
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn insert(&self, item: User) -> Result<bool> {
        let mut guard = self.0.lock().await;

        match find_ref(&guard, |v| v.id == item.id) {
            Ok(_) => return Ok(false),
            Err(RepositoryError::NotFound) => (),
            Err(e) => return Err(e),
        }

        guard.push(item);
        Ok(true)
    }

    async fn is_exists(&self, id: &UserId) -> Result<bool> {
        let guard = self.0.lock().await;

        match find_ref(&guard, |v| v.id == *id) {
            Ok(_) => Ok(true),
            Err(RepositoryError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn find(&self, id: &UserId) -> Result<User> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.id == *id)?.clone())
    }

    async fn finds(&self, UserQuery { topic, limit }: UserQuery) -> Result<Vec<User>> {
        Ok(self
            .0
            .lock()
            .await
            .iter()
            .filter(|u| topic.as_ref().map(|t| u.topics.contains(t)).unwrap_or(true))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn update(&self, id: &UserId, mutation: UserMutation) -> Result<User> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == *id)?;

        let UserMutation {
            display_name,
            photo_url,
            topics,
            suspended,
            admin,
        } = mutation;
        if let Some(val) = display_name {
            item.display_name = Some(val);
        }
        if let Some(val) = photo_url {
            item.photo_url = Some(val);
        }
        if let Some(val) = topics {
            item.topics = val;
        }
        if let Some(val) = suspended {
            item.suspended = val;
        }
        if let Some(val) = admin {
            item.admin = val;
        }

        Ok(item.clone())
    }

    async fn increment(&self, id: &UserId, counter: UserCounter, delta: i64) -> Result<()> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == *id)?;

        match counter {
            UserCounter::Followers => item.followers_count += delta,
            UserCounter::Following => item.following_count += delta,
            UserCounter::Posts => item.posts_count += delta,
        }

        Ok(())
    }

    async fn set_counters(&self, id: &UserId, counters: UserCounters) -> Result<()> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == *id)?;

        item.followers_count = counters.followers;
        item.following_count = counters.following;
        item.posts_count = counters.posts;

        Ok(())
    }
}

fn follow_matches(f: &Follow, follower: &Option<UserId>, following: &Option<UserId>) -> bool {
    follower.as_ref().map(|u| f.follower_id == *u).unwrap_or(true)
        && following.as_ref().map(|u| f.following_id == *u).unwrap_or(true)
}

#[async_trait]
impl FollowRepository for InMemoryRepository<Follow> {
    async fn insert(&self, item: Follow) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if guard.iter().any(|v| v.id == item.id) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn is_exists(&self, id: &FollowId) -> Result<bool> {
        let guard = self.0.lock().await;

        Ok(guard.iter().any(|v| v.id == *id))
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
        let guard = self.0.lock().await;
        let key = |f: &Follow| (f.created, f.id.clone());

        let cursor = after.and_then(|a| guard.iter().find(|f| f.id == a).map(key));

        Ok(newest_page(
            &guard,
            key,
            cursor,
            |f| follow_matches(f, &follower, &following),
            limit,
        ))
    }

    async fn count(&self, query: FollowQuery) -> Result<u64> {
        let guard = self.0.lock().await;

        Ok(guard
            .iter()
            .filter(|f| follow_matches(f, &query.follower, &query.following))
            .count() as u64)
    }

    async fn delete(&self, id: &FollowId) -> Result<bool> {
        let mut guard = self.0.lock().await;

        match remove_one(&mut guard, |v| v.id == *id) {
            Ok(_) => Ok(true),
            Err(RepositoryError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn post_matches(p: &Post, query: &PostQuery) -> bool {
    query
        .topic
        .as_ref()
        .map(|t| p.topics.contains(t))
        .unwrap_or(true)
        && query
            .authors
            .as_ref()
            .map(|a| a.contains(&p.author_id))
            .unwrap_or(true)
        && query
            .author
            .as_ref()
            .map(|a| p.author_id == *a)
            .unwrap_or(true)
}

#[async_trait]
impl PostRepository for InMemoryRepository<Post> {
    async fn insert(&self, item: Post) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if guard.iter().any(|v| v.id == item.id) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: &PostId) -> Result<Post> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.id == *id)?.clone())
    }

    async fn finds(&self, query: PostQuery) -> Result<Vec<Post>> {
        if let Some(ref authors) = query.authors {
            check_membership(authors)?;
        }

        let guard = self.0.lock().await;
        let key = |p: &Post| (p.created, p.id);

        let cursor = query
            .after
            .and_then(|a| guard.iter().find(|p| p.id == a).map(key));

        Ok(newest_page(
            &guard,
            key,
            cursor,
            |p| post_matches(p, &query),
            query.limit,
        ))
    }

    async fn count(&self, query: PostQuery) -> Result<u64> {
        if let Some(ref authors) = query.authors {
            check_membership(authors)?;
        }

        let guard = self.0.lock().await;

        Ok(guard.iter().filter(|p| post_matches(p, &query)).count() as u64)
    }

    async fn increment(&self, id: &PostId, counter: PostCounter, delta: i64) -> Result<()> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == *id)?;

        match counter {
            PostCounter::Likes => item.likes_count += delta,
            PostCounter::Comments => item.comments_count += delta,
        }
        item.updated = ::chrono::Utc::now();

        Ok(())
    }

    async fn set_counters(&self, id: &PostId, counters: PostCounters) -> Result<()> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == *id)?;

        item.likes_count = counters.likes;
        item.comments_count = counters.comments;

        Ok(())
    }

    async fn delete(&self, id: &PostId) -> Result<Post> {
        let mut guard = self.0.lock().await;

        remove_one(&mut guard, |v| v.id == *id)
    }
}

#[async_trait]
impl LikeRepository for InMemoryRepository<Like> {
    async fn insert(&self, item: Like) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if guard
            .iter()
            .any(|v| v.post_id == item.post_id && v.user_id == item.user_id)
        {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn is_exists(&self, post_id: &PostId, user_id: &UserId) -> Result<bool> {
        let guard = self.0.lock().await;

        Ok(guard
            .iter()
            .any(|v| v.post_id == *post_id && v.user_id == *user_id))
    }

    async fn count(&self, post_id: &PostId) -> Result<u64> {
        let guard = self.0.lock().await;

        Ok(guard.iter().filter(|v| v.post_id == *post_id).count() as u64)
    }

    async fn delete(&self, post_id: &PostId, user_id: &UserId) -> Result<bool> {
        let mut guard = self.0.lock().await;

        match remove_one(&mut guard, |v| v.post_id == *post_id && v.user_id == *user_id) {
            Ok(_) => Ok(true),
            Err(RepositoryError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete_by_post(&self, post_id: &PostId) -> Result<u64> {
        let mut guard = self.0.lock().await;
        let before = guard.len();

        guard.retain(|v| v.post_id != *post_id);

        Ok((before - guard.len()) as u64)
    }
}

#[async_trait]
impl CommentRepository for InMemoryRepository<Comment> {
    async fn insert(&self, item: Comment) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if guard.iter().any(|v| v.id == item.id) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: &CommentId) -> Result<Comment> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.id == *id)?.clone())
    }

    async fn finds(&self, CommentQuery { post, after, limit }: CommentQuery) -> Result<Vec<Comment>> {
        let guard = self.0.lock().await;
        let key = |c: &Comment| (c.created, c.id);

        let cursor = after.and_then(|a| guard.iter().find(|c| c.id == a).map(key));

        Ok(newest_page(
            &guard,
            key,
            cursor,
            |c| post.map(|p| c.post_id == p).unwrap_or(true),
            limit,
        ))
    }

    async fn count(&self, CommentQuery { post, .. }: CommentQuery) -> Result<u64> {
        let guard = self.0.lock().await;

        Ok(guard
            .iter()
            .filter(|c| post.map(|p| c.post_id == p).unwrap_or(true))
            .count() as u64)
    }

    async fn delete(&self, id: &CommentId) -> Result<Comment> {
        let mut guard = self.0.lock().await;

        remove_one(&mut guard, |v| v.id == *id)
    }
}

fn notification_matches(n: &Notification, query: &NotificationQuery) -> bool {
    query
        .recipient
        .as_ref()
        .map(|r| n.recipient_id == *r)
        .unwrap_or(true)
        && (!query.unread_only || !n.read)
        && query
            .comment
            .map(|c| n.comment_id == Some(c))
            .unwrap_or(true)
}

#[async_trait]
impl NotificationRepository for InMemoryRepository<Notification> {
    async fn insert(&self, item: Notification) -> Result<bool> {
        let mut guard = self.0.lock().await;

        if guard.iter().any(|v| v.id == item.id) {
            return Ok(false);
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: &NotificationId) -> Result<Notification> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.id == *id)?.clone())
    }

    async fn finds(&self, query: NotificationQuery) -> Result<Vec<Notification>> {
        let guard = self.0.lock().await;
        let key = |n: &Notification| (n.created, n.id);

        let cursor = query
            .after
            .and_then(|a| guard.iter().find(|n| n.id == a).map(key));

        Ok(newest_page(
            &guard,
            key,
            cursor,
            |n| notification_matches(n, &query),
            query.limit,
        ))
    }

    async fn count(&self, query: NotificationQuery) -> Result<u64> {
        let guard = self.0.lock().await;

        Ok(guard
            .iter()
            .filter(|n| notification_matches(n, &query))
            .count() as u64)
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<bool> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |v| v.id == *id)?;

        let changed = !item.read;
        item.read = true;

        Ok(changed)
    }

    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64> {
        let mut guard = self.0.lock().await;
        let mut changed = 0;

        for n in guard
            .iter_mut()
            .filter(|n| n.recipient_id == *recipient && !n.read)
        {
            n.read = true;
            changed += 1;
        }

        Ok(changed)
    }

    async fn delete_by_comment(&self, comment_id: &CommentId) -> Result<u64> {
        let mut guard = self.0.lock().await;
        let before = guard.len();

        guard.retain(|v| v.comment_id != Some(*comment_id));

        Ok((before - guard.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::entities::{PostContent, TopicId};

    fn post(author: &str, topic: &str, minutes_ago: i64) -> Post {
        let created = Utc::now() - Duration::minutes(minutes_ago);

        Post {
            id: PostId::new(),
            author_id: author.into(),
            content: PostContent::Image {
                text: None,
                images: vec!["a.png".to_string()],
            },
            topics: vec![TopicId::from(topic)],
            likes_count: 0,
            comments_count: 0,
            created,
            updated: created,
        }
    }

    #[tokio::test]
    async fn follow_insert_is_insert_if_absent() {
        let repo = InMemoryRepository::<Follow>::new();

        assert!(repo.insert(Follow::new("a".into(), "b".into())).await.unwrap());
        assert!(!repo.insert(Follow::new("a".into(), "b".into())).await.unwrap());
        assert!(repo.insert(Follow::new("b".into(), "a".into())).await.unwrap());

        let q = FollowQuery {
            follower: Some("a".into()),
            ..Default::default()
        };
        assert_eq!(repo.count(q).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn posts_page_newest_first_after_cursor() {
        let repo = InMemoryRepository::<Post>::new();
        let posts = (0..5).map(|i| post("a", "BTS", i)).collect::<Vec<_>>();
        for p in posts.iter().rev() {
            repo.insert(p.clone()).await.unwrap();
        }

        let first = repo
            .finds(PostQuery {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            first.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![posts[0].id, posts[1].id]
        );

        let second = repo
            .finds(PostQuery {
                after: Some(posts[1].id),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            second.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![posts[2].id, posts[3].id]
        );
    }

    #[tokio::test]
    async fn membership_filter_is_capped() {
        let repo = InMemoryRepository::<Post>::new();
        let authors = (0..11).map(|i| UserId(format!("u{}", i))).collect();

        let res = repo
            .finds(PostQuery {
                authors: Some(authors),
                ..Default::default()
            })
            .await;

        match res {
            Err(RepositoryError::QueryLimit { requested, cap }) => {
                assert_eq!(requested, 11);
                assert_eq!(cap, super::super::MEMBERSHIP_FILTER_CAP);
            },
            other => panic!("expected query limit, got {:?}", other.map(|v| v.len())),
        }
    }

    #[tokio::test]
    async fn counters_are_additive() {
        let repo = InMemoryRepository::<User>::new();
        let id = UserId::from("a");
        repo.insert(User::new(id.clone(), None, vec![])).await.unwrap();

        repo.increment(&id, UserCounter::Followers, 1).await.unwrap();
        repo.increment(&id, UserCounter::Followers, 1).await.unwrap();
        repo.increment(&id, UserCounter::Followers, -1).await.unwrap();

        assert_eq!(repo.find(&id).await.unwrap().followers_count, 1);
        assert!(matches!(
            repo.increment(&"ghost".into(), UserCounter::Posts, 1).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
