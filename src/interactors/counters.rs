use alloc::sync::Arc;

use crate::entities::{PostId, UserId};
use crate::repositories::{
    PostCounter, PostRepository, Repositories, Result, UserCounter, UserRepository,
};

/// Denormalized counters on owner documents. Every adjustment is one atomic
/// single-document increment; callers sequence them.
#[derive(Clone)]
pub struct EngagementCounters {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub post_repository: Arc<dyn PostRepository + Sync + Send>,
}

impl EngagementCounters {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            user_repository: repos.users.clone(),
            post_repository: repos.posts.clone(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn adjust_user(&self, id: &UserId, counter: UserCounter, delta: i64) -> Result<()> {
        self.user_repository.increment(id, counter, delta).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn adjust_post(&self, id: &PostId, counter: PostCounter, delta: i64) -> Result<()> {
        self.post_repository.increment(id, counter, delta).await
    }

    pub async fn increment_post_count(&self, author_id: &UserId, delta: i64) -> Result<()> {
        self.adjust_user(author_id, UserCounter::Posts, delta).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::User;
    use crate::repositories::mock::in_memory_repositories;
    use crate::repositories::RepositoryError;

    #[tokio::test]
    async fn increment_post_count_moves_by_delta() {
        let repos = in_memory_repositories();
        let alice = UserId::from("alice");
        repos
            .users
            .insert(User::new(alice.clone(), None, vec![]))
            .await
            .unwrap();

        let counters = EngagementCounters::new(&repos);
        counters.increment_post_count(&alice, 1).await.unwrap();
        counters.increment_post_count(&alice, 1).await.unwrap();
        counters.increment_post_count(&alice, -1).await.unwrap();

        assert_eq!(repos.users.find(&alice).await.unwrap().posts_count, 1);
    }

    #[tokio::test]
    async fn missing_owner_is_not_found() {
        let repos = in_memory_repositories();
        let counters = EngagementCounters::new(&repos);

        assert!(matches!(
            counters
                .adjust_post(&PostId::new(), PostCounter::Likes, 1)
                .await,
            Err(RepositoryError::NotFound)
        ));
    }
}
