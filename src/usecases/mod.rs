macro_rules! usecase {
    ($n:ident : { $( $i:tt )* } => { $( $o:tt )* }) => {
        pub mod $n {
            #[allow(unused_imports)]
            use crate::entities;

            #[::async_trait::async_trait]
            pub trait Usecase {
                async fn handle(&self, data: Input) -> ::core::result::Result<Output, crate::usecases::UsecaseError>;
            }

            #[derive(Debug, Clone)]
            pub struct Input { $( $i )* }

            #[derive(Debug, Clone)]
            pub struct Output { $( $o )* }
        }
    };
}

pub mod engagement;
pub mod graph;
pub mod notification;
pub mod reconcile;
pub mod recommendation;
pub mod timeline;

/// Failure taxonomy of every use case. Internal causes never reach the caller verbatim.
#[derive(Debug, ::thiserror::Error)]
pub enum UsecaseError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("cannot follow yourself")]
    SelfFollow,
    #[error("already following")]
    AlreadyFollowing,
    #[error("not following")]
    NotFollowing,
    #[error("internal error: {0}")]
    Internal(#[from] ::anyhow::Error),
}

impl From<crate::repositories::RepositoryError> for UsecaseError {
    fn from(e: crate::repositories::RepositoryError) -> Self {
        UsecaseError::Internal(::anyhow::anyhow!("repository error: {}", e))
    }
}
