//! Preconditions for put requests.
//!
//! A [`WriteStrategy`] runs after the record has been marshaled and before the
//! write is sent. It returns the condition expression (if any) and the values
//! the expression refers to.

use std::time::{SystemTime, UNIX_EPOCH};

use aws_sdk_dynamodb::types::AttributeValue;

use crate::error::{Error, Result};
use crate::marshal::Item;
use crate::value::type_tag;

/// Column names a write strategy needs from the table schema.
pub trait WriteColumns {
    fn hash_key_name(&self) -> Result<&str>;
    /// Empty when no version column is configured.
    fn version_column_name(&self) -> Result<&str>;
    fn expiry_column_name(&self) -> Option<&str>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    pub expression: Option<String>,
    pub values: Item,
}

impl Condition {
    fn expression(expression: String) -> Self {
        Self {
            expression: Some(expression),
            values: Item::new(),
        }
    }

    /// Splits into request parts; empty value maps become `None`.
    pub fn into_parts(self) -> (Option<String>, Option<Item>) {
        let values = Some(self.values).filter(|values| !values.is_empty());
        (self.expression, values)
    }
}

pub type WriteStrategy = fn(&dyn WriteColumns, &Item) -> Result<Condition>;

pub fn attribute_exists(name: &str) -> String {
    format!("attribute_exists({name})")
}

pub fn attribute_not_exists(name: &str) -> String {
    format!("attribute_not_exists({name})")
}

/// Unconditional overwrite.
pub fn replace(_columns: &dyn WriteColumns, _entry: &Item) -> Result<Condition> {
    Ok(Condition::default())
}

/// Fails the write when an item with the same hash key exists.
pub fn insert(columns: &dyn WriteColumns, _entry: &Item) -> Result<Condition> {
    Ok(Condition::expression(attribute_not_exists(columns.hash_key_name()?)))
}

/// Fails the write when no item with the same hash key exists.
pub fn update(columns: &dyn WriteColumns, _entry: &Item) -> Result<Condition> {
    Ok(Condition::expression(attribute_exists(columns.hash_key_name()?)))
}

/// Like [`insert`], but also overwrites an item whose expiry lies in the past.
///
/// "Now" is taken here, not when the store evaluates the condition.
pub fn insert_or_replace_expired(columns: &dyn WriteColumns, _entry: &Item) -> Result<Condition> {
    let mut condition = Condition::expression(attribute_not_exists(columns.hash_key_name()?));
    if let Some(expiry) = columns.expiry_column_name() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_secs())
            .unwrap_or_default();
        if let Some(expression) = condition.expression.as_mut() {
            expression.push_str(&format!(" or ({expiry} < :{expiry})"));
        }
        condition
            .values
            .insert(format!(":{expiry}"), AttributeValue::N(now.to_string()));
    }
    Ok(condition)
}

/// Optimistic locking: the entry already carries the incremented version, the
/// condition checks that the stored version is one less.
pub fn is_next_version(columns: &dyn WriteColumns, entry: &Item) -> Result<Condition> {
    let column = columns.version_column_name()?;
    if column.is_empty() {
        return Err(Error::NoVersionColumn);
    }
    let Some(value) = entry.get(column) else {
        return Err(Error::MissingVersion {
            column: column.to_owned(),
        });
    };
    let previous = increment_numeric_value_by(column, value, -1)?;
    Ok(Condition {
        expression: Some(format!("{column} = :{column}")),
        values: Item::from([(format!(":{column}"), previous)]),
    })
}

// Works on the wire text; the value has already been marshaled.
fn increment_numeric_value_by(
    column: &str,
    value: &AttributeValue,
    increment: i128,
) -> Result<AttributeValue> {
    let AttributeValue::N(text) = value else {
        return Err(Error::InvalidVersionType {
            column: column.to_owned(),
            found: type_tag(value),
        });
    };
    let current: i128 = text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidVersionNumber {
            column: column.to_owned(),
            value: text.clone(),
        })?;
    Ok(AttributeValue::N((current + increment).to_string()))
}
