/// Error type returned by the bookmark store
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to read bookmarks: {0}")]
    Read(String),
    #[error("Failed to deserialize bookmarks: {0}")]
    Deserialize(String),
    #[error("Failed to serialize bookmarks: {0}")]
    Serialize(String),
    #[error("Failed to write bookmarks: {0}")]
    Write(String),
    #[error("Job record has no usable id")]
    MissingId,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Error type returned by the feed
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    //reqwest errors are not Clone, so we keep only the message
    #[error("Feed request failed: {0}")]
    Request(String),
    #[error("Feed response could not be decoded: {0}")]
    Decode(String),
    #[error("Mutex error: {0}")]
    MutexError(String),
}

pub type FeedResult<T> = Result<T, FeedError>;
