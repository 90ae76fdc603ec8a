use std::collections::BTreeMap;

use aws_sdk_dynamodb::types::{KeyType, ProjectionType, ScalarAttributeType};
use tracing::debug;

use crate::annotation::{ParseProps, fold_name, parse_field};
use crate::condition::WriteColumns;
use crate::error::{Error, Result};
use crate::field::FieldSpec;
use crate::record::{FieldInfo, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    pub attribute_name: String,
    pub attribute_type: ScalarAttributeType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub index_name: String,
    pub projection: ProjectionType,
    /// In field declaration order, not sorted by role.
    pub key_schema: Vec<KeyElement>,
}

impl IndexDef {
    fn new(index_name: &str) -> Self {
        Self {
            index_name: index_name.to_owned(),
            projection: ProjectionType::All,
            key_schema: Vec::new(),
        }
    }
}

/// Table layout derived from a record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub(crate) key_schema: Vec<KeyElement>,
    pub(crate) attribute_definitions: Vec<AttributeDef>,
    pub(crate) indexes: BTreeMap<String, IndexDef>,
    pub(crate) version_column: String,
    pub(crate) ttl_column: String,
}

impl TableSchema {
    pub fn for_record<T: Record, P: ParseProps + ?Sized>(props: &P) -> Result<Self> {
        Self::build(T::fields(), props)
    }

    pub fn build<P: ParseProps + ?Sized>(fields: &[FieldInfo], props: &P) -> Result<Self> {
        let mut schema = TableSchema::default();
        let (mut hash_keys, mut range_keys, mut keys) = (0, 0, 0);

        for info in fields {
            let Some(spec) = parse_field(props, info)? else {
                continue;
            };
            if spec.is_key() {
                schema
                    .attribute_definitions
                    .push(attribute_definition(&spec, info)?);
                schema.key_schema.push(key_schema_element(&spec)?);
                if spec.is_hash_key() {
                    hash_keys += 1;
                }
                if spec.is_range_key() {
                    range_keys += 1;
                }
                keys += 1;
            }
            if spec.is_ttl_field() {
                schema.ttl_column = fold_name(props, spec.name());
            }
            if spec.is_version() {
                schema.version_column = fold_name(props, spec.name());
            }
            for (index, role) in spec.index_roles() {
                schema
                    .indexes
                    .entry(index.clone())
                    .or_insert_with(|| IndexDef::new(index))
                    .key_schema
                    .push(KeyElement {
                        attribute_name: spec.name().to_owned(),
                        key_type: role.key_type(),
                    });
                if schema.attribute_definition(spec.name()).is_none() {
                    schema
                        .attribute_definitions
                        .push(attribute_definition(&spec, info)?);
                }
            }
        }

        if keys > 2 || keys != hash_keys + range_keys || hash_keys != 1 || range_keys > 1 {
            return Err(Error::InvalidKeys {
                hash: hash_keys,
                range: range_keys,
                total: keys,
                partial: Box::new(schema),
            });
        }
        debug!(
            keys = schema.key_schema.len(),
            attributes = schema.attribute_definitions.len(),
            indexes = schema.indexes.len(),
            version = %schema.version_column,
            ttl = %schema.ttl_column,
            "table schema derived"
        );
        Ok(schema)
    }

    pub fn key_schema(&self) -> &[KeyElement] {
        &self.key_schema
    }

    pub fn attribute_definitions(&self) -> &[AttributeDef] {
        &self.attribute_definitions
    }

    pub fn attribute_definition(&self, name: &str) -> Option<&AttributeDef> {
        self.attribute_definitions
            .iter()
            .find(|def| def.attribute_name == name)
    }

    pub fn indexes(&self) -> &BTreeMap<String, IndexDef> {
        &self.indexes
    }

    /// Empty when the record has no version field.
    pub fn version_column(&self) -> &str {
        &self.version_column
    }

    /// Empty when the record has no expiry field.
    pub fn ttl_column(&self) -> &str {
        &self.ttl_column
    }
}

impl WriteColumns for TableSchema {
    fn hash_key_name(&self) -> Result<&str> {
        self.key_schema
            .iter()
            .find(|key| key.key_type == KeyType::Hash)
            .map(|key| key.attribute_name.as_str())
            .ok_or(Error::NoHashKey)
    }

    fn version_column_name(&self) -> Result<&str> {
        Ok(&self.version_column)
    }

    fn expiry_column_name(&self) -> Option<&str> {
        Some(self.ttl_column.as_str()).filter(|name| !name.is_empty())
    }
}

pub(crate) fn key_schema_element(spec: &FieldSpec) -> Result<KeyElement> {
    let key_type = match (spec.is_hash_key(), spec.is_range_key()) {
        (true, false) => KeyType::Hash,
        (false, true) => KeyType::Range,
        _ => {
            return Err(Error::AmbiguousKey {
                field: spec.name().to_owned(),
            });
        }
    };
    Ok(KeyElement {
        attribute_name: spec.name().to_owned(),
        key_type,
    })
}

pub(crate) fn attribute_definition(spec: &FieldSpec, info: &FieldInfo) -> Result<AttributeDef> {
    let attribute_type = info
        .kind
        .scalar_type()
        .ok_or_else(|| Error::UnsupportedKeyType {
            field: spec.name().to_owned(),
            type_name: info.type_name.to_owned(),
        })?;
    Ok(AttributeDef {
        attribute_name: spec.name().to_owned(),
        attribute_type,
    })
}
