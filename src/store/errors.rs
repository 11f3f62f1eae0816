//! Error types for store actions

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The action was invoked with arguments it cannot run with. Nothing was
    /// sent and no state changed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The remote call failed; the message is also on the slice's `error`
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl StoreError {
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, StoreError::InvalidRequest(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
