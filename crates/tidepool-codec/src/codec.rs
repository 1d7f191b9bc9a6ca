//! Value <-> JSON text conversion
//!
//! The wire form is standard JSON with one leaf-level rule:
//! - a [`Value::BigInt`] leaf is written as the string `"<decimal>n"`
//! - a string leaf whose whole content is one or more ASCII digits followed
//!   by `n` is read back as a [`Value::BigInt`]
//!
//! Known limitations of the format (kept for compatibility with data already
//! stored in this form):
//! - a plain string such as `"123n"` cannot be told apart from an encoded big
//!   integer and decodes as one
//! - negative big integers encode as `"-123n"`, which the decode rule does
//!   not recognise, so they come back as strings
//!
//! Map keys are never reinterpreted.

use num_bigint::BigInt;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

use crate::{CodecError, Value};

/// Suffix that tags a string leaf as a big integer
pub const BIGINT_MARKER: char = 'n';

/// Serialize a value tree to JSON text
pub fn encode(value: &Value) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(CodecError::Serialize)
}

/// Serialize a value tree to JSON bytes
pub fn encode_to_vec(value: &Value) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Serialize)
}

/// Parse JSON text into a value tree
pub fn decode(text: &str) -> Result<Value, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Parse)
}

/// Parse JSON bytes into a value tree
pub fn decode_slice(bytes: &[u8]) -> Result<Value, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Parse)
}

/// Returns true if `s` matches `^[0-9]+n$`
pub fn is_bigint_token(s: &str) -> bool {
    match s.strip_suffix(BIGINT_MARKER) {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

fn parse_token(s: &str) -> Option<BigInt> {
    if !is_bigint_token(s) {
        return None;
    }
    s[..s.len() - 1].parse().ok()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::BigInt(n) => serializer.serialize_str(&format!("{}{}", n, BIGINT_MARKER)),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Number::from_f64(v)
            .map(Value::Number)
            .ok_or_else(|| E::custom(format!("non-finite number {}", v)))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(match parse_token(v) {
            Some(n) => Value::BigInt(n),
            None => Value::String(v.to_string()),
        })
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(match parse_token(&v) {
            Some(n) => Value::BigInt(n),
            None => Value::String(v),
        })
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(s: &str) -> BigInt {
        s.parse().unwrap()
    }

    #[test]
    fn test_token_detection() {
        assert!(is_bigint_token("0n"));
        assert!(is_bigint_token("123456789012345678901234567890n"));
        assert!(!is_bigint_token("n"));
        assert!(!is_bigint_token("12"));
        assert!(!is_bigint_token("-12n"));
        assert!(!is_bigint_token("1_000n"));
        assert!(!is_bigint_token("12nn"));
        assert!(!is_bigint_token(" 12n"));
        assert!(!is_bigint_token("١٢n"));
    }

    #[test]
    fn test_encode_nested_bigint() {
        let value: Value = vec![
            ("id", Value::from(big("98765432109876543210"))),
            ("items", Value::List(vec![Value::from(big("1")), Value::from(2i64)])),
        ]
        .into_iter()
        .collect();

        let text = encode(&value).unwrap();
        assert_eq!(text, r#"{"id":"98765432109876543210n","items":["1n",2]}"#);
    }

    #[test]
    fn test_decode_nested_bigint() {
        let value = decode(r#"{"a":{"b":["7n","x",1.5,true,null]}}"#).unwrap();
        let inner = value.get("a").and_then(|a| a.get("b")).unwrap();
        assert_eq!(
            inner,
            &Value::List(vec![
                Value::BigInt(big("7")),
                Value::from("x"),
                Value::from(1.5),
                Value::Bool(true),
                Value::Null,
            ])
        );
    }

    #[test]
    fn test_top_level_bigint() {
        let value = Value::BigInt(big("123456789012345678901234567890"));
        let text = encode(&value).unwrap();
        assert_eq!(text, "\"123456789012345678901234567890n\"");
        assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn test_leading_zeros_are_dropped() {
        assert_eq!(decode("\"007n\"").unwrap(), Value::BigInt(big("7")));
    }

    #[test]
    fn test_marker_string_collides_with_bigint() {
        let marker_text = Value::from("42n");
        let decoded = decode(&encode(&marker_text).unwrap()).unwrap();
        assert_ne!(decoded, marker_text);
        assert_eq!(decoded, Value::BigInt(big("42")));
    }

    #[test]
    fn test_negative_bigint_decodes_as_string() {
        let text = encode(&Value::BigInt(big("-5"))).unwrap();
        assert_eq!(text, "\"-5n\"");
        assert_eq!(decode(&text).unwrap(), Value::from("-5n"));
    }

    #[test]
    fn test_map_keys_are_not_converted() {
        let value = decode(r#"{"10n":"10n"}"#).unwrap();
        assert_eq!(value.get("10n"), Some(&Value::BigInt(big("10"))));
    }

    #[test]
    fn test_malformed_input_fails() {
        assert!(matches!(decode("{\"a\":"), Err(CodecError::Parse(_))));
        assert!(matches!(decode(""), Err(CodecError::Parse(_))));
        assert!(matches!(decode("[1,]"), Err(CodecError::Parse(_))));
    }

    #[test]
    fn test_byte_variants() {
        let value = Value::List(vec![Value::BigInt(big("3")), Value::from("s")]);
        let bytes = encode_to_vec(&value).unwrap();
        assert_eq!(bytes, br#"["3n","s"]"#);
        assert_eq!(decode_slice(&bytes).unwrap(), value);
    }
}
