use chirp_types::MediaId;
use thiserror::Error;

/// Every failure a core operation can report.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("user not found")]
    UserNotFound,
    #[error("tweet not found")]
    TweetNotFound,
    #[error("media {0} not found")]
    MediaNotFound(MediaId),
    #[error("like not found")]
    LikeNotFound,

    #[error("users cannot follow themselves")]
    SelfFollow,
    #[error("already following this user")]
    AlreadyFollowing,
    #[error("not following this user")]
    NotFollowing,
    #[error("credential key already in use")]
    CredentialTaken,

    #[error("only the author can do that")]
    Forbidden,

    #[error("API key authentication failed")]
    Authentication,

    /// Transient storage failures outlasted every retry.
    #[error("storage temporarily unavailable")]
    StorageUnavailable,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("media store error: {0}")]
    Media(#[source] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound | Self::TweetNotFound | Self::MediaNotFound(_) | Self::LikeNotFound
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SelfFollow | Self::AlreadyFollowing | Self::NotFollowing | Self::CredentialTaken
        )
    }
}
