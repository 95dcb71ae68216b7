use alloc::sync::Arc;

use crate::config::Limits;
use crate::controllers::auth::{Authenticator, UserIdAuthenticator};
use crate::interactors::counters::EngagementCounters;
use crate::interactors::engagement::{
    CommentsInteractor, CreateCommentInteractor, CreatePostInteractor, DeleteCommentInteractor,
    DeletePostInteractor, ToggleLikeInteractor,
};
use crate::interactors::graph::{
    FollowInteractor, FollowersInteractor, FollowingActivityInteractor, FollowingInteractor,
    IsFollowingInteractor, UnfollowInteractor, UserProfileInteractor,
};
use crate::interactors::notification::{
    MarkReadInteractor, NotificationFanout, NotificationsInteractor,
};
use crate::interactors::reconcile::ReconcileInteractor;
use crate::interactors::recommendation::RecommendInteractor;
use crate::interactors::timeline::FeedInteractor;
use crate::repositories::mock::in_memory_repositories;
use crate::repositories::mongo::mongo_repositories;
use crate::repositories::Repositories;
use crate::usecases::engagement::{
    comments, create_comment, create_post, delete_comment, delete_post, toggle_like,
};
use crate::usecases::graph::{
    follow, followers, following, following_activity, is_following, unfollow, user_profile,
};
use crate::usecases::notification::{mark_read, notifications};
use crate::usecases::reconcile::reconcile;
use crate::usecases::recommendation::recommend;
use crate::usecases::timeline::feed;

/// Every use case of the service, shared by the HTTP handlers.
pub struct App {
    pub auth: Arc<dyn Authenticator + Sync + Send>,

    pub follow: Arc<dyn follow::Usecase + Sync + Send>,
    pub unfollow: Arc<dyn unfollow::Usecase + Sync + Send>,
    pub is_following: Arc<dyn is_following::Usecase + Sync + Send>,
    pub following: Arc<dyn following::Usecase + Sync + Send>,
    pub followers: Arc<dyn followers::Usecase + Sync + Send>,
    pub user_profile: Arc<dyn user_profile::Usecase + Sync + Send>,
    pub following_activity: Arc<dyn following_activity::Usecase + Sync + Send>,

    pub toggle_like: Arc<dyn toggle_like::Usecase + Sync + Send>,
    pub create_comment: Arc<dyn create_comment::Usecase + Sync + Send>,
    pub delete_comment: Arc<dyn delete_comment::Usecase + Sync + Send>,
    pub comments: Arc<dyn comments::Usecase + Sync + Send>,
    pub create_post: Arc<dyn create_post::Usecase + Sync + Send>,
    pub delete_post: Arc<dyn delete_post::Usecase + Sync + Send>,

    pub feed: Arc<dyn feed::Usecase + Sync + Send>,
    pub recommend: Arc<dyn recommend::Usecase + Sync + Send>,

    pub notifications: Arc<dyn notifications::Usecase + Sync + Send>,
    pub mark_read: Arc<dyn mark_read::Usecase + Sync + Send>,

    pub reconcile: Arc<dyn reconcile::Usecase + Sync + Send>,
}

impl App {
    pub fn new(repos: Repositories, limits: Limits) -> Self {
        let counters = EngagementCounters::new(&repos);
        let fanout = NotificationFanout::new(&repos);

        Self {
            auth: Arc::new(UserIdAuthenticator {
                user_repository: repos.users.clone(),
            }),

            follow: Arc::new(FollowInteractor {
                repos: repos.clone(),
                counters: counters.clone(),
                fanout: fanout.clone(),
            }),
            unfollow: Arc::new(UnfollowInteractor {
                repos: repos.clone(),
                counters: counters.clone(),
            }),
            is_following: Arc::new(IsFollowingInteractor {
                repos: repos.clone(),
            }),
            following: Arc::new(FollowingInteractor {
                repos: repos.clone(),
                limits,
            }),
            followers: Arc::new(FollowersInteractor {
                repos: repos.clone(),
                limits,
            }),
            user_profile: Arc::new(UserProfileInteractor {
                repos: repos.clone(),
            }),
            following_activity: Arc::new(FollowingActivityInteractor {
                repos: repos.clone(),
                limits,
            }),

            toggle_like: Arc::new(ToggleLikeInteractor {
                repos: repos.clone(),
                counters: counters.clone(),
                fanout: fanout.clone(),
            }),
            create_comment: Arc::new(CreateCommentInteractor {
                repos: repos.clone(),
                counters: counters.clone(),
                fanout,
            }),
            delete_comment: Arc::new(DeleteCommentInteractor {
                repos: repos.clone(),
                counters: counters.clone(),
            }),
            comments: Arc::new(CommentsInteractor {
                repos: repos.clone(),
                limits,
            }),
            create_post: Arc::new(CreatePostInteractor {
                repos: repos.clone(),
                counters: counters.clone(),
            }),
            delete_post: Arc::new(DeletePostInteractor {
                repos: repos.clone(),
                counters,
            }),

            feed: Arc::new(FeedInteractor {
                repos: repos.clone(),
                limits,
            }),
            recommend: Arc::new(RecommendInteractor {
                repos: repos.clone(),
                limits,
            }),

            notifications: Arc::new(NotificationsInteractor {
                notification_repository: repos.notifications.clone(),
                limits,
            }),
            mark_read: Arc::new(MarkReadInteractor {
                notification_repository: repos.notifications.clone(),
            }),

            reconcile: Arc::new(ReconcileInteractor { repos }),
        }
    }

    pub fn with_authenticator(mut self, auth: Arc<dyn Authenticator + Sync + Send>) -> Self {
        self.auth = auth;
        self
    }
}

pub fn in_memory(limits: Limits) -> (App, Repositories) {
    let repos = in_memory_repositories();
    (App::new(repos.clone(), limits), repos)
}

pub async fn mongo(
    uri_str: impl AsRef<str>,
    db_name: impl AsRef<str>,
    limits: Limits,
) -> ::anyhow::Result<App> {
    let repos = mongo_repositories(uri_str, db_name).await?;

    Ok(App::new(repos, limits))
}
