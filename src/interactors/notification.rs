use alloc::sync::Arc;

use async_trait::async_trait;

use super::notification_err_fmt;
use crate::config::Limits;
use crate::entities::{
    ActorSnapshot, CommentId, Notification, NotificationId, NotificationKind, PostId, UserId,
};
use crate::repositories::{
    NotificationQuery, NotificationRepository, Repositories, RepositoryError, Result,
    UserRepository,
};
use crate::usecases::notification::{mark_read, notifications, ReadTarget};
use crate::usecases::UsecaseError;
use crate::utils::{split_page, AlsoChain, LetChain};

/// References carried by a notification besides its actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyPayload {
    pub related_post_id: Option<PostId>,
    pub comment_id: Option<CommentId>,
}

fn render(kind: NotificationKind, actor_name: &str) -> (String, String) {
    match kind {
        NotificationKind::Follow => (
            "New Follower".to_string(),
            format!("{} started following you", actor_name),
        ),
        NotificationKind::Like => (
            "New Like".to_string(),
            format!("{} liked your post", actor_name),
        ),
        NotificationKind::Comment => (
            "New Comment".to_string(),
            format!("{} commented on your post", actor_name),
        ),
    }
}

#[derive(Clone)]
pub struct NotificationFanout {
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub notification_repository: Arc<dyn NotificationRepository + Sync + Send>,
}

impl NotificationFanout {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            user_repository: repos.users.clone(),
            notification_repository: repos.notifications.clone(),
        }
    }

    /// Writes exactly one record, or none when the actor is the recipient.
    #[tracing::instrument(skip(self))]
    pub async fn notify(
        &self,
        recipient: &UserId,
        kind: NotificationKind,
        actor: &UserId,
        payload: NotifyPayload,
    ) -> Result<Option<Notification>> {
        if recipient == actor {
            return Ok(None);
        }

        let snapshot = match self.user_repository.find(actor).await {
            Ok(u) => ActorSnapshot {
                user_id: u.id,
                display_name: u.display_name,
                photo_url: u.photo_url,
            },
            Err(RepositoryError::NotFound) => ActorSnapshot {
                user_id: actor.clone(),
                display_name: None,
                photo_url: None,
            },
            Err(e) => return Err(e),
        };

        let (title, body) = render(
            kind,
            snapshot.display_name.as_deref().unwrap_or("Someone"),
        );

        let notification = Notification {
            id: NotificationId::new(),
            recipient_id: recipient.clone(),
            kind,
            title,
            body,
            actor: snapshot,
            read: false,
            related_post_id: payload.related_post_id,
            comment_id: payload.comment_id,
            created: ::chrono::Utc::now(),
        };

        self.notification_repository
            .insert(notification.clone())
            .await?;

        Ok(Some(notification))
    }
}

pub struct NotificationsInteractor {
    pub notification_repository: Arc<dyn NotificationRepository + Sync + Send>,
    pub limits: Limits,
}
#[async_trait]
impl notifications::Usecase for NotificationsInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(
        &self,
        data: notifications::Input,
    ) -> ::core::result::Result<notifications::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let notifications::Input {
            user_id,
            unread_only,
            cursor,
            limit,
        } = data;
        let limit = self.limits.page(limit);

        let rows = self
            .notification_repository
            .finds(NotificationQuery {
                recipient: Some(user_id.clone()),
                unread_only,
                after: cursor,
                limit: Some(limit + 1),
                ..Default::default()
            })
            .await?;

        let unread_count = self
            .notification_repository
            .count(NotificationQuery {
                recipient: Some(user_id),
                unread_only: true,
                ..Default::default()
            })
            .await?;

        split_page(rows, limit)
            .let_(|(entries, has_more)| notifications::Output {
                entries,
                has_more,
                unread_count,
            })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct MarkReadInteractor {
    pub notification_repository: Arc<dyn NotificationRepository + Sync + Send>,
}
#[async_trait]
impl mark_read::Usecase for MarkReadInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(
        &self,
        data: mark_read::Input,
    ) -> ::core::result::Result<mark_read::Output, UsecaseError> {
        tracing::trace!("input - {:?}", data);

        let mark_read::Input { user_id, target } = data;

        let updated = match target {
            ReadTarget::One(id) => {
                let n = self
                    .notification_repository
                    .find(&id)
                    .await
                    .map_err(notification_err_fmt)?;

                if n.recipient_id != user_id {
                    return Err(UsecaseError::Forbidden(
                        "cannot modify another user's notification".to_string(),
                    ));
                }

                match self
                    .notification_repository
                    .mark_read(&id)
                    .await
                    .map_err(notification_err_fmt)?
                {
                    true => 1,
                    false => 0,
                }
            },
            ReadTarget::All => self
                .notification_repository
                .mark_all_read(&user_id)
                .await?,
        };

        mark_read::Output { updated }
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::User;
    use crate::repositories::mock::in_memory_repositories;
    use crate::usecases::notification::{mark_read::Usecase as _, notifications::Usecase as _};

    async fn setup() -> (Repositories, NotificationFanout) {
        let repos = in_memory_repositories();
        for (id, name) in [("alice", Some("Alice")), ("bob", None)] {
            repos
                .users
                .insert(User::new(id.into(), name.map(str::to_string), vec![]))
                .await
                .unwrap();
        }
        let fanout = NotificationFanout::new(&repos);
        (repos, fanout)
    }

    #[tokio::test]
    async fn self_action_writes_nothing() {
        let (repos, fanout) = setup().await;
        let alice = UserId::from("alice");

        let res = fanout
            .notify(&alice, NotificationKind::Like, &alice, Default::default())
            .await
            .unwrap();

        assert!(res.is_none());
        assert_eq!(
            repos
                .notifications
                .count(NotificationQuery::default())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn body_falls_back_to_someone() {
        let (_, fanout) = setup().await;

        let n = fanout
            .notify(
                &"alice".into(),
                NotificationKind::Follow,
                &"bob".into(),
                Default::default(),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(n.title, "New Follower");
        assert_eq!(n.body, "Someone started following you");
        assert!(!n.read);
    }

    #[tokio::test]
    async fn unread_count_and_mark_read_owner_only() {
        let (repos, fanout) = setup().await;
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        let first = fanout
            .notify(&bob, NotificationKind::Like, &alice, Default::default())
            .await
            .unwrap()
            .unwrap();
        fanout
            .notify(&bob, NotificationKind::Follow, &alice, Default::default())
            .await
            .unwrap();

        let list = NotificationsInteractor {
            notification_repository: repos.notifications.clone(),
            limits: Limits::default(),
        };
        let read = MarkReadInteractor {
            notification_repository: repos.notifications.clone(),
        };

        let page = list
            .handle(notifications::Input {
                user_id: bob.clone(),
                unread_only: false,
                cursor: None,
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 1);
        assert!(page.has_more);
        assert_eq!(page.unread_count, 2);

        let denied = read
            .handle(mark_read::Input {
                user_id: alice.clone(),
                target: ReadTarget::One(first.id),
            })
            .await;
        assert!(matches!(denied, Err(UsecaseError::Forbidden(_))));

        let out = read
            .handle(mark_read::Input {
                user_id: bob.clone(),
                target: ReadTarget::One(first.id),
            })
            .await
            .unwrap();
        assert_eq!(out.updated, 1);

        let out = read
            .handle(mark_read::Input {
                user_id: bob.clone(),
                target: ReadTarget::All,
            })
            .await
            .unwrap();
        assert_eq!(out.updated, 1);

        let page = list
            .handle(notifications::Input {
                user_id: bob,
                unread_only: true,
                cursor: None,
                limit: None,
            })
            .await
            .unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.unread_count, 0);
    }

    #[tokio::test]
    async fn marking_unknown_notification_is_not_found() {
        let (repos, _) = setup().await;
        let read = MarkReadInteractor {
            notification_repository: repos.notifications.clone(),
        };

        let res = read
            .handle(mark_read::Input {
                user_id: UserId::from("bob"),
                target: ReadTarget::One(NotificationId::new()),
            })
            .await;

        assert!(matches!(res, Err(UsecaseError::NotFound(_))));
    }
}
