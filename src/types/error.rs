use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum S3uploadError {
    #[error("cancelled")]
    Cancelled,
    #[error("the upload has already completed. no further chunk is accepted.")]
    AlreadyCompleted,
    #[error("the upload has already failed. no further chunk is accepted.")]
    AlreadyFailed,
    #[error("part number {0} exceeds the maximum number of parts.")]
    PartNumberOutOfRange(i32),
    #[error("part number {0} is not greater than the last completed part number.")]
    PartOutOfOrder(i32),
    #[error("the server did not return an upload id.")]
    MissingUploadId,
    #[error("the server did not return an ETag.")]
    MissingETag,
}

pub fn is_cancelled_error(err: &AnyhowError) -> bool {
    err.downcast_ref::<S3uploadError>()
        .is_some_and(|e| *e == S3uploadError::Cancelled)
}
