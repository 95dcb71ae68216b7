usecase! {
    notifications : {
        pub user_id: entities::UserId,
        pub unread_only: bool,
        pub cursor: Option<entities::NotificationId>,
        pub limit: Option<usize>,
    } => {
        pub entries: Vec<entities::Notification>,
        pub has_more: bool,
        pub unread_count: u64,
    }
}

usecase! {
    mark_read : {
        pub user_id: entities::UserId,
        pub target: super::ReadTarget,
    } => {
        pub updated: u64,
    }
}

use crate::entities::NotificationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    One(NotificationId),
    All,
}
