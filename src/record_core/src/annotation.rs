//! Annotation grammar.
//!
//! Primary: `#[ddb("name?(,role)*")]` with roles `required`, `hash-key`,
//! `range-key`, `expire`, `version` and `ignore`.
//!
//! Secondary index: `#[ddb_gsi("index role(, index role)*")]` with roles
//! `hash-key` and `range-key`.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::field::{FieldSpec, KeyRole};
use crate::record::FieldInfo;

pub const TAG_HASH_KEY: &str = "hash-key";
pub const TAG_RANGE_KEY: &str = "range-key";
pub const TAG_REQUIRED: &str = "required";
pub const TAG_EXPIRE: &str = "expire";
pub const TAG_IGNORE: &str = "ignore";
pub const TAG_VERSION: &str = "version";

/// Name resolution settings for fields without a primary annotation.
pub trait ParseProps {
    fn allow_untagged_fields(&self) -> bool;
    fn lowercase_untagged_fields(&self) -> bool;
}

/// Lower-cases the first character when configured to.
pub fn fold_name<P: ParseProps + ?Sized>(props: &P, name: &str) -> String {
    if !props.lowercase_untagged_fields() {
        return name.to_owned();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parses one field's annotations.
///
/// `Ok(None)` means the field is not stored at all.
pub fn parse_field<P: ParseProps + ?Sized>(props: &P, info: &FieldInfo) -> Result<Option<FieldSpec>> {
    let tagged = info.annotation.is_some() || info.index_annotation.is_some();
    if !info.visible {
        if tagged {
            return Err(Error::InaccessibleField {
                field: info.ident.to_owned(),
            });
        }
        return Ok(None);
    }

    let mut spec = FieldSpec::named(info.ident);
    if let Some(index_annotation) = info.index_annotation {
        spec.index_roles = parse_index_roles(info.ident, index_annotation)?;
    }

    let Some(annotation) = info.annotation else {
        if !props.allow_untagged_fields() {
            return Ok(None);
        }
        spec.name = fold_name(props, &spec.name);
        return Ok(Some(spec));
    };

    let mut tokens = annotation.split(',');
    if let Some(rename) = tokens.next().map(str::trim).filter(|t| !t.is_empty()) {
        spec.name = rename.to_owned();
    }
    for token in tokens {
        match token.trim() {
            TAG_REQUIRED => spec.required = true,
            TAG_HASH_KEY => spec.is_hash_key = true,
            TAG_RANGE_KEY => spec.is_range_key = true,
            TAG_EXPIRE => spec.is_ttl_field = true,
            TAG_VERSION => spec.is_version = true,
            TAG_IGNORE => return Ok(None),
            other => {
                return Err(Error::UnknownAnnotation {
                    field: info.ident.to_owned(),
                    token: other.to_owned(),
                });
            }
        }
    }
    if spec.is_hash_key && spec.is_range_key {
        return Err(Error::AmbiguousKey {
            field: info.ident.to_owned(),
        });
    }
    Ok(Some(spec))
}

fn parse_index_roles(field: &str, annotation: &str) -> Result<BTreeMap<String, KeyRole>> {
    let mut roles = BTreeMap::new();
    for element in annotation.split(',') {
        let element = element.trim();
        let parts: Vec<&str> = element.split(' ').collect();
        let &[index, role] = parts.as_slice() else {
            return Err(Error::MalformedIndexAnnotation {
                field: field.to_owned(),
                element: element.to_owned(),
            });
        };
        if roles.contains_key(index) {
            return Err(Error::DuplicateIndex {
                field: field.to_owned(),
                index: index.to_owned(),
            });
        }
        let role = match role {
            TAG_HASH_KEY => KeyRole::Hash,
            TAG_RANGE_KEY => KeyRole::Range,
            _ => {
                return Err(Error::UnknownIndexRole {
                    field: field.to_owned(),
                    element: element.to_owned(),
                });
            }
        };
        roles.insert(index.to_owned(), role);
    }
    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ValueKind;

    struct Props {
        allow_untagged: bool,
        lowercase_untagged: bool,
    }

    impl ParseProps for Props {
        fn allow_untagged_fields(&self) -> bool {
            self.allow_untagged
        }

        fn lowercase_untagged_fields(&self) -> bool {
            self.lowercase_untagged
        }
    }

    const fn props(allow_untagged: bool, lowercase_untagged: bool) -> Props {
        Props {
            allow_untagged,
            lowercase_untagged,
        }
    }

    const fn string_field(ident: &'static str) -> FieldInfo {
        FieldInfo::new(ident, ValueKind::String, "String")
    }

    #[test]
    fn private_field_without_annotation_is_skipped() {
        let field = string_field("privateField").private();
        assert_eq!(parse_field(&props(true, true), &field).unwrap(), None);
    }

    #[test]
    fn private_field_with_annotation_fails() {
        let field = string_field("privateTaggedField").private().annotated("required");
        let err = parse_field(&props(true, true), &field).unwrap_err();
        assert!(matches!(err, Error::InaccessibleField { field } if field == "privateTaggedField"));

        let indexed = string_field("privateIndexed").private().indexed("gsi1 hash-key");
        assert!(parse_field(&props(true, true), &indexed).is_err());
    }

    #[test]
    fn untagged_field_name_follows_config() {
        let field = string_field("PublicField");
        assert_eq!(
            parse_field(&props(true, true), &field).unwrap(),
            Some(FieldSpec::named("publicField"))
        );
        assert_eq!(
            parse_field(&props(true, false), &field).unwrap(),
            Some(FieldSpec::named("PublicField"))
        );
        assert_eq!(parse_field(&props(false, true), &field).unwrap(), None);
    }

    #[test]
    fn ignore_prevails() {
        let plain = string_field("PublicIgnoredField").annotated(",ignore");
        assert_eq!(parse_field(&props(true, true), &plain).unwrap(), None);

        let key = string_field("IgnoredKey").annotated("dropMe,hash-key,ignore");
        assert_eq!(parse_field(&props(true, false), &key).unwrap(), None);
    }

    #[test]
    fn tagged_names_are_not_case_folded() {
        let hash = string_field("HashKey").annotated(",hash-key");
        assert_eq!(
            parse_field(&props(true, true), &hash).unwrap(),
            Some(FieldSpec::named("HashKey").with_hash_key())
        );

        let range = string_field("RangeKey").annotated(",range-key");
        assert_eq!(
            parse_field(&props(true, true), &range).unwrap(),
            Some(FieldSpec::named("RangeKey").with_range_key())
        );

        let renamed = string_field("NamedField").annotated("RenamedField, hash-key");
        assert_eq!(
            parse_field(&props(true, true), &renamed).unwrap(),
            Some(FieldSpec::named("RenamedField").with_hash_key())
        );
    }

    #[test]
    fn role_keywords() {
        let field = string_field("ExpireOn").annotated(",expire");
        assert_eq!(
            parse_field(&props(true, false), &field).unwrap(),
            Some(FieldSpec::named("ExpireOn").with_ttl())
        );

        let field = string_field("Version").annotated("version,version,required");
        let spec = parse_field(&props(true, false), &field).unwrap().unwrap();
        assert!(spec.is_version());
        assert!(spec.is_required());
        assert!(!spec.is_key());
        assert_eq!(spec.name(), "version");
    }

    #[test]
    fn hash_and_range_on_one_field_fails() {
        let field = string_field("BadKey").annotated("bad,hash-key,range-key");
        let err = parse_field(&props(true, false), &field).unwrap_err();
        assert!(matches!(err, Error::AmbiguousKey { field } if field == "BadKey"));
    }

    #[test]
    fn unknown_token_fails() {
        let field = string_field("BadTag").annotated(",bad-tag");
        let err = parse_field(&props(true, false), &field).unwrap_err();
        assert!(matches!(err, Error::UnknownAnnotation { token, .. } if token == "bad-tag"));

        let trailing = string_field("Trailing").annotated("name,");
        assert!(parse_field(&props(true, false), &trailing).is_err());
    }

    #[test]
    fn index_only_field_uses_untagged_name() {
        let field = string_field("GsiMember").indexed("gsi1 hash-key, gsi2 range-key");
        assert_eq!(
            parse_field(&props(true, true), &field).unwrap(),
            Some(
                FieldSpec::named("gsiMember")
                    .with_index("gsi1", KeyRole::Hash)
                    .with_index("gsi2", KeyRole::Range)
            )
        );
        assert_eq!(parse_field(&props(false, true), &field).unwrap(), None);
    }

    #[test]
    fn malformed_index_annotations_fail() {
        let cases = [
            ("gsi1", "malformed"),
            ("gsi1 hash-key extra", "malformed"),
            ("gsi1 hash-key, gsi1 range-key", "duplicate"),
            ("gsi1 sort-key", "role"),
        ];
        for (annotation, kind) in cases {
            let field = string_field("Member").indexed(annotation);
            let err = parse_field(&props(true, true), &field).unwrap_err();
            let matched = match kind {
                "malformed" => matches!(err, Error::MalformedIndexAnnotation { .. }),
                "duplicate" => matches!(err, Error::DuplicateIndex { ref index, .. } if index == "gsi1"),
                _ => matches!(err, Error::UnknownIndexRole { .. }),
            };
            assert!(matched, "{annotation}: {err}");
        }
    }

    #[test]
    fn fold_name_lowers_only_first_char() {
        assert_eq!(fold_name(&props(true, true), "TheName"), "theName");
        assert_eq!(fold_name(&props(true, false), "TheName"), "TheName");
        assert_eq!(fold_name(&props(true, true), ""), "");
    }
}
