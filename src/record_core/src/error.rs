//! Error types for record mapping and repository operations.

use aws_sdk_dynamodb::error::{BuildError, SdkError};
use thiserror::Error;

use crate::schema::TableSchema;
use crate::value::ValueError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // annotation syntax
    #[error("can't handle ddb annotations on private field `{field}`")]
    InaccessibleField { field: String },

    #[error("unknown annotation `{token}` on field `{field}`")]
    UnknownAnnotation { field: String, token: String },

    #[error("both hash-key and range-key are set for field `{field}`")]
    AmbiguousKey { field: String },

    #[error("malformed index annotation `{element}` on field `{field}`")]
    MalformedIndexAnnotation { field: String, element: String },

    #[error("duplicate index `{index}` on field `{field}`")]
    DuplicateIndex { field: String, index: String },

    #[error("unexpected key type in `{element}` on field `{field}`")]
    UnknownIndexRole { field: String, element: String },

    // schema validation
    #[error("type `{type_name}` is not supported as key for field `{field}`")]
    UnsupportedKeyType { field: String, type_name: String },

    #[error("invalid keys configuration: {hash} hash, {range} range, {total} total")]
    InvalidKeys {
        hash: usize,
        range: usize,
        total: usize,
        /// Whatever was assembled before the check failed.
        partial: Box<TableSchema>,
    },

    #[error("no hash key attribute found")]
    NoHashKey,

    // value conversion
    #[error("failed to encode field `{field}`")]
    Encode {
        field: String,
        #[source]
        source: ValueError,
    },

    #[error("failed to decode attribute `{attribute}`")]
    Decode {
        attribute: String,
        #[source]
        source: ValueError,
    },

    // write strategies
    #[error("no version column defined")]
    NoVersionColumn,

    #[error("failed to find column `{column}` value as next version")]
    MissingVersion { column: String },

    #[error("invalid version type {found} in column `{column}`")]
    InvalidVersionType { column: String, found: &'static str },

    #[error("version `{value}` in column `{column}` is not an integer")]
    InvalidVersionNumber { column: String, value: String },

    // repository
    #[error("table name is required")]
    MissingTableName,

    #[error("ddb connection is required")]
    MissingClient,

    #[error("item not found in `{table}`")]
    NotFound { table: String },

    #[error("table `{table}` not active after {waited_secs}s")]
    WaitTimeout { table: String, waited_secs: u64 },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Store(Box<aws_sdk_dynamodb::Error>),
}

impl<E, R> From<SdkError<E, R>> for Error
where
    aws_sdk_dynamodb::Error: From<SdkError<E, R>>,
{
    fn from(err: SdkError<E, R>) -> Self {
        Error::Store(Box::new(err.into()))
    }
}
