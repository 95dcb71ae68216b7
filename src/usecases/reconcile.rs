usecase! {
    reconcile : {
        pub users: Vec<entities::UserId>,
        pub posts: Vec<entities::PostId>,
    } => {
        pub users: Vec<super::UserDrift>,
        pub posts: Vec<super::PostDrift>,
    }
}

use crate::entities::{PostId, UserId};
use crate::repositories::{PostCounters, UserCounters};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDrift {
    pub user_id: UserId,
    pub stored: UserCounters,
    pub actual: UserCounters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDrift {
    pub post_id: PostId,
    pub stored: PostCounters,
    pub actual: PostCounters,
}

impl UserDrift {
    pub fn drifted(&self) -> bool { self.stored != self.actual }
}

impl PostDrift {
    pub fn drifted(&self) -> bool { self.stored != self.actual }
}
