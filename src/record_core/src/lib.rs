//! Typed records on top of DynamoDB.
//!
//! A record is a plain struct deriving [`Record`]. Field annotations decide
//! attribute names, key roles, secondary indexes, the version column and the
//! expiry column:
//!
//! ```ignore
//! #[derive(Record, Default)]
//! pub struct Session {
//!     #[ddb("id,hash-key")]
//!     pub id: String,
//!     #[ddb(",version")]
//!     pub version: i64,
//!     #[ddb("expireOn,expire")]
//!     pub expire_on: i64,
//!     #[ddb_gsi("byOwner hash-key")]
//!     pub owner: String,
//! }
//! ```
//!
//! [`Repository`] derives the table schema once and then marshals records,
//! issues conditional writes and manages the table lifecycle.

extern crate self as record_core;

mod annotation;
pub mod condition;
mod config;
mod entry;
mod error;
mod field;
mod marshal;
mod record;
mod repo;
mod schema;
mod table;
mod value;

pub use annotation::{
    ParseProps, TAG_EXPIRE, TAG_HASH_KEY, TAG_IGNORE, TAG_RANGE_KEY, TAG_REQUIRED, TAG_VERSION,
    fold_name, parse_field,
};
pub use condition::{
    Condition, WriteColumns, WriteStrategy, attribute_exists, attribute_not_exists, insert,
    insert_or_replace_expired, is_next_version, replace, update,
};
pub use config::{BillingMode, DEFAULT_CAPACITY_UNITS, DEFAULT_WAIT_SECONDS, RepoConfig};
pub use entry::{QueryOption, ScanOption};
pub use error::{Error, Result};
pub use field::{FieldSpec, KeyRole};
pub use marshal::{Filter, Item, marshal, marshal_filtered, marshal_key, unmarshal};
pub use record::{FieldInfo, Record, ValueKind};
pub use record_macros::Record;
pub use repo::Repository;
pub use schema::{AttributeDef, IndexDef, KeyElement, TableSchema};
pub use table::TableReport;
pub use value::{ScalarAttribute, ValueError, type_tag};

#[doc(hidden)]
pub mod __private {
    pub use crate::value::{Codec, SerdeCodec};
    pub use aws_sdk_dynamodb::types::AttributeValue;
}
