use std::collections::BTreeMap;

use aws_sdk_dynamodb::types::KeyType;

/// Role of an attribute within a key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    Hash,
    Range,
}

impl KeyRole {
    pub fn key_type(self) -> KeyType {
        match self {
            KeyRole::Hash => KeyType::Hash,
            KeyRole::Range => KeyType::Range,
        }
    }
}

/// Normalized storage role of one record field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSpec {
    pub(crate) name: String,
    pub(crate) required: bool,
    pub(crate) is_hash_key: bool,
    pub(crate) is_range_key: bool,
    pub(crate) is_version: bool,
    pub(crate) is_ttl_field: bool,
    pub(crate) index_roles: BTreeMap<String, KeyRole>,
}

impl FieldSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Storage attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_hash_key(&self) -> bool {
        self.is_hash_key
    }

    pub fn is_range_key(&self) -> bool {
        self.is_range_key
    }

    pub fn is_key(&self) -> bool {
        self.is_hash_key || self.is_range_key
    }

    pub fn is_version(&self) -> bool {
        self.is_version
    }

    pub fn is_ttl_field(&self) -> bool {
        self.is_ttl_field
    }

    /// Secondary index memberships, by index name.
    pub fn index_roles(&self) -> &BTreeMap<String, KeyRole> {
        &self.index_roles
    }

    pub fn with_hash_key(mut self) -> Self {
        self.is_hash_key = true;
        self
    }

    pub fn with_range_key(mut self) -> Self {
        self.is_range_key = true;
        self
    }

    pub fn with_ttl(mut self) -> Self {
        self.is_ttl_field = true;
        self
    }

    pub fn with_index(mut self, index: impl Into<String>, role: KeyRole) -> Self {
        self.index_roles.insert(index.into(), role);
        self
    }
}
