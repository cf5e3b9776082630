//! Error types for bucket operations

use aws_sdk_s3::{
    error::{BuildError, SdkError},
    operation::{
        delete_objects::DeleteObjectsError, list_objects::ListObjectsError,
        put_object::PutObjectError,
    },
};
use thiserror::Error;

/// Result type for bucket operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during bucket operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage client could not be constructed
    #[error("failed to create storage client: {0}")]
    Client(String),

    /// The bucket could not be resolved
    #[error("failed to resolve bucket: {0}")]
    Bucket(String),

    /// Listing objects or folders failed
    #[error("failed to list objects: {0}")]
    List(String),

    /// Storing an object failed
    #[error("failed to put object: {0}")]
    Put(String),

    /// Batch deletion failed
    #[error("failed to delete objects: {0}")]
    Delete(String),
}

impl From<SdkError<ListObjectsError>> for StorageError {
    fn from(error: SdkError<ListObjectsError>) -> Self {
        match error {
            SdkError::ServiceError(err) => Self::List(format!("{:?}", err.err())),
            _ => Self::List(error.to_string()),
        }
    }
}

impl From<SdkError<PutObjectError>> for StorageError {
    fn from(error: SdkError<PutObjectError>) -> Self {
        match error {
            SdkError::ServiceError(err) => Self::Put(format!("{:?}", err.err())),
            _ => Self::Put(error.to_string()),
        }
    }
}

impl From<SdkError<DeleteObjectsError>> for StorageError {
    fn from(error: SdkError<DeleteObjectsError>) -> Self {
        match error {
            SdkError::ServiceError(err) => Self::Delete(format!("{:?}", err.err())),
            _ => Self::Delete(error.to_string()),
        }
    }
}

impl From<BuildError> for StorageError {
    fn from(error: BuildError) -> Self {
        Self::Delete(format!("invalid delete request: {error}"))
    }
}
