use aws_sdk_dynamodb::types::{AttributeValue, ScalarAttributeType};

use crate::value::ValueError;

/// Storage kind of a field's type, resolved by `#[derive(Record)]` through
/// [`ScalarAttribute`](crate::ScalarAttribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    /// `SystemTime`, stored as epoch seconds.
    Time,
    Bytes,
    Other,
}

impl ValueKind {
    /// Scalar attribute type for a key attribute of this kind.
    pub fn scalar_type(self) -> Option<ScalarAttributeType> {
        match self {
            ValueKind::String => Some(ScalarAttributeType::S),
            ValueKind::Number | ValueKind::Time => Some(ScalarAttributeType::N),
            ValueKind::Bytes => Some(ScalarAttributeType::B),
            ValueKind::Other => None,
        }
    }
}

/// One declared field of a record type, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub ident: &'static str,
    pub visible: bool,
    /// Raw `#[ddb("...")]` string.
    pub annotation: Option<&'static str>,
    /// Raw `#[ddb_gsi("...")]` string.
    pub index_annotation: Option<&'static str>,
    pub kind: ValueKind,
    pub type_name: &'static str,
}

impl FieldInfo {
    pub const fn new(ident: &'static str, kind: ValueKind, type_name: &'static str) -> Self {
        Self {
            ident,
            visible: true,
            annotation: None,
            index_annotation: None,
            kind,
            type_name,
        }
    }

    pub const fn private(mut self) -> Self {
        self.visible = false;
        self
    }

    pub const fn annotated(mut self, annotation: &'static str) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub const fn indexed(mut self, index_annotation: &'static str) -> Self {
        self.index_annotation = Some(index_annotation);
        self
    }
}

/// A flat record stored as one table item.
///
/// Normally implemented with `#[derive(Record)]`. `field_value` and
/// `set_field_value` address fields by their position in [`Record::fields`].
pub trait Record {
    fn fields() -> &'static [FieldInfo];

    fn field_value(&self, index: usize) -> Result<AttributeValue, ValueError>;

    fn set_field_value(&mut self, index: usize, value: AttributeValue) -> Result<(), ValueError>;
}
