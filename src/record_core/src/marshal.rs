use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::annotation::{ParseProps, parse_field};
use crate::error::{Error, Result};
use crate::field::FieldSpec;
use crate::record::Record;

/// A table item: attribute name to attribute value.
pub type Item = HashMap<String, AttributeValue>;

/// Selects which fields take part in marshaling.
#[derive(Debug, Clone)]
pub enum Filter {
    All,
    Key,
    HashKey,
    Version,
    Custom(fn(&FieldSpec) -> bool),
    AnyOf(Vec<Filter>),
    AllOf(Vec<Filter>),
}

impl Filter {
    pub fn matches(&self, spec: &FieldSpec) -> bool {
        match self {
            Filter::All => true,
            Filter::Key => spec.is_key(),
            Filter::HashKey => spec.is_hash_key(),
            Filter::Version => spec.is_version(),
            Filter::Custom(predicate) => predicate(spec),
            Filter::AnyOf(filters) => filters.iter().any(|f| f.matches(spec)),
            Filter::AllOf(filters) => filters.iter().all(|f| f.matches(spec)),
        }
    }

    pub fn or(self, other: Filter) -> Filter {
        Filter::AnyOf(vec![self, other])
    }

    pub fn and(self, other: Filter) -> Filter {
        Filter::AllOf(vec![self, other])
    }
}

pub fn marshal<T: Record, P: ParseProps + ?Sized>(props: &P, source: &T) -> Result<Item> {
    marshal_filtered(props, source, &Filter::All, "")
}

pub fn marshal_key<T: Record, P: ParseProps + ?Sized>(
    props: &P,
    source: &T,
    prefix: &str,
) -> Result<Item> {
    marshal_filtered(props, source, &Filter::Key, prefix)
}

/// Encodes every field matched by `filter` under `prefix + name`.
pub fn marshal_filtered<T: Record, P: ParseProps + ?Sized>(
    props: &P,
    source: &T,
    filter: &Filter,
    prefix: &str,
) -> Result<Item> {
    let mut item = Item::new();
    for (index, info) in T::fields().iter().enumerate() {
        let Some(spec) = parse_field(props, info)? else {
            continue;
        };
        if !filter.matches(&spec) {
            continue;
        }
        let value = source
            .field_value(index)
            .map_err(|source| Error::Encode {
                field: info.ident.to_owned(),
                source,
            })?;
        item.insert(format!("{prefix}{}", spec.name()), value);
    }
    Ok(item)
}

/// Decodes every attribute of `item` that maps to a field of `target`.
///
/// Fields without a matching attribute keep their current value.
pub fn unmarshal<T: Record, P: ParseProps + ?Sized>(
    props: &P,
    target: &mut T,
    item: &Item,
) -> Result<()> {
    for (index, info) in T::fields().iter().enumerate() {
        let Some(spec) = parse_field(props, info)? else {
            continue;
        };
        let Some(value) = item.get(spec.name()) else {
            continue;
        };
        target
            .set_field_value(index, value.clone())
            .map_err(|source| Error::Decode {
                attribute: spec.name().to_owned(),
                source,
            })?;
    }
    Ok(())
}
