use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("route store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("route {route_id} has invalid target URI {uri:?}: {reason}")]
    InvalidTargetUri {
        route_id: String,
        uri: String,
        reason: String,
    },

    #[error("route {0} has a blank path predicate")]
    BlankPredicate(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
