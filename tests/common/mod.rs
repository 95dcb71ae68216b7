#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use fanbase::config::Limits;
use fanbase::entities::{PostContent, PostId, TopicId, User, UserId};
use fanbase::repositories::{
    Repositories, RepositoryError, Result, UserCounter, UserCounters, UserMutation, UserQuery,
    UserRepository,
};
use fanbase::usecases::engagement::create_post;
use fanbase::usecases::graph::follow;
use fanbase::{in_memory, App};

pub struct Fixture {
    pub app: App,
    pub repos: Repositories,
}

pub fn fixture() -> Fixture {
    let (app, repos) = in_memory(Limits::default());
    Fixture { app, repos }
}

impl Fixture {
    pub async fn user(&self, id: &str, name: Option<&str>, topics: &[&str]) -> UserId {
        let id = UserId::from(id);
        let user = User::new(
            id.clone(),
            name.map(str::to_string),
            topics.iter().map(|t| TopicId::from(*t)).collect(),
        );

        assert!(self.repos.users.insert(user).await.unwrap());
        id
    }

    pub async fn user_of(&self, id: &UserId) -> User { self.repos.users.find(id).await.unwrap() }

    pub async fn follow(&self, follower: &UserId, target: &UserId) {
        self.app
            .follow
            .handle(follow::Input {
                follower_id: follower.clone(),
                target_id: target.clone(),
            })
            .await
            .unwrap();
    }

    pub async fn post(&self, author: &UserId, topics: &[&str]) -> PostId {
        self.app
            .create_post
            .handle(create_post::Input {
                author_id: author.clone(),
                content: image_content(),
                topics: topics.iter().map(|t| TopicId::from(*t)).collect(),
            })
            .await
            .unwrap()
            .post
            .id
    }
}

pub fn image_content() -> PostContent {
    PostContent::Image {
        text: Some("hello".to_string()),
        images: vec!["img/1.png".to_string()],
    }
}

/// User store whose increments of one counter always fail.
pub struct FailingCounter {
    pub inner: Arc<dyn UserRepository + Sync + Send>,
    pub counter: UserCounter,
}

#[async_trait]
impl UserRepository for FailingCounter {
    async fn insert(&self, item: User) -> Result<bool> { self.inner.insert(item).await }

    async fn is_exists(&self, id: &UserId) -> Result<bool> { self.inner.is_exists(id).await }

    async fn find(&self, id: &UserId) -> Result<User> { self.inner.find(id).await }

    async fn finds(&self, query: UserQuery) -> Result<Vec<User>> { self.inner.finds(query).await }

    async fn update(&self, id: &UserId, mutation: UserMutation) -> Result<User> {
        self.inner.update(id, mutation).await
    }

    async fn increment(&self, id: &UserId, counter: UserCounter, delta: i64) -> Result<()> {
        if counter == self.counter {
            return Err(RepositoryError::Internal(anyhow::anyhow!(
                "write timeout on {}",
                counter.field()
            )));
        }

        self.inner.increment(id, counter, delta).await
    }

    async fn set_counters(&self, id: &UserId, counters: UserCounters) -> Result<()> {
        self.inner.set_counters(id, counters).await
    }
}

/// Same store contents, but the given counter can no longer be incremented.
pub fn with_failing_counter(fx: &Fixture, counter: UserCounter) -> App {
    let mut repos = fx.repos.clone();
    repos.users = Arc::new(FailingCounter {
        inner: fx.repos.users.clone(),
        counter,
    });

    App::new(repos, Limits::default())
}
