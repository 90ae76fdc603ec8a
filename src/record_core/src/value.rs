//! Field value codecs used by the derived accessors.
//!
//! Types implementing [`ScalarAttribute`] encode themselves as `S`, `N` or
//! `B`, so key attributes land on the scalar type the schema builder declares
//! for them. Everything else goes through `serde_dynamo`.

use std::marker::PhantomData;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::record::ValueKind;

/// Failure converting one field value to or from its attribute value.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error(transparent)]
    Serde(#[from] serde_dynamo::Error),

    #[error("expected {expected} attribute, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("binary value of {0} bytes does not fit the field")]
    Length(usize),

    #[error("invalid number `{0}`")]
    Number(String),

    #[error("invalid epoch seconds `{0}`")]
    Epoch(String),

    #[error("time is before the unix epoch")]
    BeforeEpoch,

    #[error("field #{0} is not mapped")]
    Unmapped(usize),
}

/// Short wire type tag of an attribute value, as used in error messages.
pub fn type_tag(value: &AttributeValue) -> &'static str {
    match value {
        AttributeValue::S(_) => "S",
        AttributeValue::N(_) => "N",
        AttributeValue::B(_) => "B",
        AttributeValue::Bool(_) => "BOOL",
        AttributeValue::Null(_) => "NULL",
        AttributeValue::L(_) => "L",
        AttributeValue::M(_) => "M",
        AttributeValue::Ss(_) => "SS",
        AttributeValue::Ns(_) => "NS",
        AttributeValue::Bs(_) => "BS",
        _ => "unknown",
    }
}

pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<AttributeValue, ValueError> {
    Ok(serde_dynamo::to_attribute_value(value)?)
}

pub fn decode_value<T: DeserializeOwned>(value: AttributeValue) -> Result<T, ValueError> {
    Ok(serde_dynamo::from_attribute_value(value)?)
}

pub fn encode_bytes<B: AsRef<[u8]> + ?Sized>(value: &B) -> Result<AttributeValue, ValueError> {
    Ok(AttributeValue::B(Blob::new(value.as_ref().to_vec())))
}

pub fn decode_bytes<B: TryFrom<Vec<u8>>>(value: AttributeValue) -> Result<B, ValueError> {
    match value {
        AttributeValue::B(blob) => {
            let bytes = blob.into_inner();
            let len = bytes.len();
            B::try_from(bytes).map_err(|_| ValueError::Length(len))
        }
        other => Err(ValueError::Mismatch {
            expected: "B",
            found: type_tag(&other),
        }),
    }
}

pub fn encode_time(value: &SystemTime) -> Result<AttributeValue, ValueError> {
    let since = value
        .duration_since(UNIX_EPOCH)
        .map_err(|_| ValueError::BeforeEpoch)?;
    let text = if since.subsec_nanos() == 0 {
        since.as_secs().to_string()
    } else {
        let fraction = format!("{:09}", since.subsec_nanos());
        format!("{}.{}", since.as_secs(), fraction.trim_end_matches('0'))
    };
    Ok(AttributeValue::N(text))
}

pub fn decode_time(value: AttributeValue) -> Result<SystemTime, ValueError> {
    let text = match value {
        AttributeValue::N(text) => text,
        other => {
            return Err(ValueError::Mismatch {
                expected: "N",
                found: type_tag(&other),
            });
        }
    };
    let (secs, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    if fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValueError::Epoch(text));
    }
    let secs: u64 = secs.parse().map_err(|_| ValueError::Epoch(text.clone()))?;
    let nanos: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<9}")
            .parse()
            .map_err(|_| ValueError::Epoch(text.clone()))?
    };
    Ok(UNIX_EPOCH + Duration::new(secs, nanos))
}

/// A value stored as one scalar attribute (`S`, `N` or `B`).
///
/// The derive resolves this through the field's real type, so aliases of the
/// implementing types work as keys. Implement it for a newtype to use the
/// newtype as a key.
pub trait ScalarAttribute: Sized {
    const KIND: ValueKind;

    fn to_attribute(&self) -> Result<AttributeValue, ValueError>;

    fn from_attribute(value: AttributeValue) -> Result<Self, ValueError>;
}

impl ScalarAttribute for String {
    const KIND: ValueKind = ValueKind::String;

    fn to_attribute(&self) -> Result<AttributeValue, ValueError> {
        Ok(AttributeValue::S(self.clone()))
    }

    fn from_attribute(value: AttributeValue) -> Result<Self, ValueError> {
        match value {
            AttributeValue::S(text) => Ok(text),
            other => Err(ValueError::Mismatch {
                expected: "S",
                found: type_tag(&other),
            }),
        }
    }
}

fn parse_number<T: FromStr>(value: AttributeValue) -> Result<T, ValueError> {
    match value {
        AttributeValue::N(text) => text.trim().parse().map_err(|_| ValueError::Number(text)),
        other => Err(ValueError::Mismatch {
            expected: "N",
            found: type_tag(&other),
        }),
    }
}

macro_rules! number_attribute {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ScalarAttribute for $ty {
                const KIND: ValueKind = ValueKind::Number;

                fn to_attribute(&self) -> Result<AttributeValue, ValueError> {
                    Ok(AttributeValue::N(self.to_string()))
                }

                fn from_attribute(value: AttributeValue) -> Result<Self, ValueError> {
                    parse_number(value)
                }
            }
        )*
    };
}

number_attribute!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl ScalarAttribute for Vec<u8> {
    const KIND: ValueKind = ValueKind::Bytes;

    fn to_attribute(&self) -> Result<AttributeValue, ValueError> {
        encode_bytes(self)
    }

    fn from_attribute(value: AttributeValue) -> Result<Self, ValueError> {
        decode_bytes(value)
    }
}

impl<const N: usize> ScalarAttribute for [u8; N] {
    const KIND: ValueKind = ValueKind::Bytes;

    fn to_attribute(&self) -> Result<AttributeValue, ValueError> {
        encode_bytes(self)
    }

    fn from_attribute(value: AttributeValue) -> Result<Self, ValueError> {
        decode_bytes(value)
    }
}

impl ScalarAttribute for SystemTime {
    const KIND: ValueKind = ValueKind::Time;

    fn to_attribute(&self) -> Result<AttributeValue, ValueError> {
        encode_time(self)
    }

    fn from_attribute(value: AttributeValue) -> Result<Self, ValueError> {
        decode_time(value)
    }
}

// Codec lookup for the derive. `<Codec<T>>::KIND`, `encode` and `decode`
// resolve to the inherent items when `T: ScalarAttribute` and to the
// `SerdeCodec` defaults otherwise.
#[doc(hidden)]
pub struct Codec<T: ?Sized>(PhantomData<T>);

impl<T: ScalarAttribute> Codec<T> {
    pub const KIND: ValueKind = T::KIND;

    pub fn encode(value: &T) -> Result<AttributeValue, ValueError> {
        value.to_attribute()
    }

    pub fn decode(value: AttributeValue) -> Result<T, ValueError> {
        T::from_attribute(value)
    }
}

#[doc(hidden)]
pub trait SerdeCodec {
    const KIND: ValueKind = ValueKind::Other;

    fn encode<V: Serialize + ?Sized>(value: &V) -> Result<AttributeValue, ValueError> {
        encode_value(value)
    }

    fn decode<V: DeserializeOwned>(value: AttributeValue) -> Result<V, ValueError> {
        decode_value(value)
    }
}

impl<T: ?Sized> SerdeCodec for Codec<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_keeps_sub_second_precision() {
        let t = UNIX_EPOCH + Duration::new(1_700_000_000, 120_000_000);
        let encoded = encode_time(&t).unwrap();
        assert_eq!(encoded, AttributeValue::N("1700000000.12".into()));
        assert_eq!(decode_time(encoded).unwrap(), t);
    }

    #[test]
    fn whole_seconds_encode_as_integer_text() {
        let t = UNIX_EPOCH + Duration::from_secs(55555);
        assert_eq!(encode_time(&t).unwrap(), AttributeValue::N("55555".into()));
    }

    #[test]
    fn decode_time_rejects_garbage() {
        assert!(matches!(
            decode_time(AttributeValue::N("12.x".into())),
            Err(ValueError::Epoch(_))
        ));
        assert!(matches!(
            decode_time(AttributeValue::S("12".into())),
            Err(ValueError::Mismatch { expected: "N", found: "S" })
        ));
    }

    #[test]
    fn fixed_size_bytes_check_length() {
        let encoded = encode_bytes(&[1u8, 2, 3]).unwrap();
        let decoded: [u8; 3] = decode_bytes(encoded.clone()).unwrap();
        assert_eq!(decoded, [1, 2, 3]);
        let wrong: Result<[u8; 4], _> = decode_bytes(encoded);
        assert!(matches!(wrong, Err(ValueError::Length(3))));
    }

    type Seconds = u64;

    struct Ticket(u32);

    impl ScalarAttribute for Ticket {
        const KIND: ValueKind = ValueKind::Number;

        fn to_attribute(&self) -> Result<AttributeValue, ValueError> {
            self.0.to_attribute()
        }

        fn from_attribute(value: AttributeValue) -> Result<Self, ValueError> {
            u32::from_attribute(value).map(Ticket)
        }
    }

    #[test]
    fn codec_resolves_through_the_real_type() {
        assert_eq!(<Codec<Seconds>>::KIND, ValueKind::Number);
        assert_eq!(<Codec<Ticket>>::KIND, ValueKind::Number);
        assert_eq!(<Codec<[u8; 2]>>::KIND, ValueKind::Bytes);
        assert_eq!(<Codec<SystemTime>>::KIND, ValueKind::Time);
        assert_eq!(<Codec<Vec<String>>>::KIND, ValueKind::Other);
        assert_eq!(<Codec<Option<u64>>>::KIND, ValueKind::Other);

        let encoded = <Codec<Ticket>>::encode(&Ticket(9)).unwrap();
        assert_eq!(encoded, AttributeValue::N("9".into()));
        let decoded: Ticket = <Codec<Ticket>>::decode(encoded).unwrap();
        assert_eq!(decoded.0, 9);

        let list = <Codec<Vec<String>>>::encode(&vec!["a".to_owned()]).unwrap();
        assert!(matches!(list, AttributeValue::L(_)));
    }

    #[test]
    fn numbers_reject_other_types_and_garbage() {
        assert!(matches!(
            u16::from_attribute(AttributeValue::S("1".into())),
            Err(ValueError::Mismatch { expected: "N", found: "S" })
        ));
        assert!(matches!(
            u16::from_attribute(AttributeValue::N("70000".into())),
            Err(ValueError::Number(_))
        ));
        assert_eq!(f64::from_attribute(AttributeValue::N("2.5".into())).unwrap(), 2.5);
    }

    #[test]
    fn serde_values_use_native_scalars() {
        assert_eq!(encode_value("abc").unwrap(), AttributeValue::S("abc".into()));
        assert_eq!(encode_value(&42u32).unwrap(), AttributeValue::N("42".into()));
        let back: i64 = decode_value(AttributeValue::N("-7".into())).unwrap();
        assert_eq!(back, -7);
    }
}
