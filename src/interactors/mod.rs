pub mod counters;
pub mod engagement;
pub mod graph;
pub mod notification;
pub mod reconcile;
pub mod recommendation;
pub mod timeline;

use anyhow::anyhow;

use crate::entities::{Profile, UserId};
use crate::repositories::{RepositoryError, UserRepository};
use crate::usecases::UsecaseError;

fn user_err_fmt(e: RepositoryError) -> UsecaseError {
    match e {
        RepositoryError::NotFound => UsecaseError::NotFound("cannot find user.".to_string()),
        e => UsecaseError::Internal(anyhow!("repository error: {}", e)),
    }
}

fn post_err_fmt(e: RepositoryError) -> UsecaseError {
    match e {
        RepositoryError::NotFound => UsecaseError::NotFound("cannot find post.".to_string()),
        e => UsecaseError::Internal(anyhow!("repository error: {}", e)),
    }
}

fn comment_err_fmt(e: RepositoryError) -> UsecaseError {
    match e {
        RepositoryError::NotFound => UsecaseError::NotFound("cannot find comment.".to_string()),
        e => UsecaseError::Internal(anyhow!("repository error: {}", e)),
    }
}

fn notification_err_fmt(e: RepositoryError) -> UsecaseError {
    match e {
        RepositoryError::NotFound => {
            UsecaseError::NotFound("cannot find notification.".to_string())
        },
        e => UsecaseError::Internal(anyhow!("repository error: {}", e)),
    }
}

/// Live public profile, `None` when the user record does not exist.
async fn profile_of(
    users: &(dyn UserRepository + Sync + Send),
    id: &UserId,
) -> Result<Option<Profile>, UsecaseError> {
    match users.find(id).await {
        Ok(u) => Ok(Some(u.into())),
        Err(RepositoryError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Ordered writes of one compound operation. Nothing is rolled back: a failing step
/// leaves the completed ones in place and is reported as a partial commit.
#[derive(Debug)]
pub(crate) struct Saga {
    name: &'static str,
    done: Vec<&'static str>,
}

impl Saga {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            done: vec![],
        }
    }

    pub(crate) fn done(&mut self, step: &'static str) { self.done.push(step) }

    pub(crate) fn fail(&self, step: &'static str, e: impl ::core::fmt::Display) -> UsecaseError {
        match self.done.is_empty() {
            true => tracing::error!(saga = self.name, step, "write failed: {}", e),
            false => tracing::error!(
                saga = self.name,
                step,
                completed = ?self.done,
                "partial commit: {}",
                e
            ),
        }

        UsecaseError::Internal(anyhow!("{} failed at {}", self.name, step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saga_failure_is_internal() {
        let mut saga = Saga::new("follow");
        saga.done("edge");

        match saga.fail("following_count", RepositoryError::NotFound) {
            UsecaseError::Internal(e) => {
                assert_eq!(e.to_string(), "follow failed at following_count")
            },
            e => panic!("unexpected: {:?}", e),
        }
    }

    #[test]
    fn not_found_keeps_resource_name() {
        assert!(matches!(
            user_err_fmt(RepositoryError::NotFound),
            UsecaseError::NotFound(m) if m == "cannot find user."
        ));
        assert!(matches!(
            post_err_fmt(RepositoryError::Internal(anyhow!("boom"))),
            UsecaseError::Internal(_)
        ));
    }
}
