//! Serde deserialization from the Recon value model.
//!
//! [`from_value`] is the inverse of [`to_value`](crate::ser::to_value): it
//! reads any `T: DeserializeOwned` out of a [`Value`]. A struct accepts a
//! record of slots and ignores its tag attribute, or a record of value items
//! in field order. Enums are read from a record whose first attribute names
//! the variant, or from text naming a unit variant.
//!
//! Numeric conversions are checked: reading `300` as a `u8` is a decode
//! error, never a truncation.
//!
//! ```rust
//! use recon_codec::de::from_str_serde;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! let point: Point = from_str_serde("@Point{x:1,y:2}").unwrap();
//! assert_eq!(point, Point { x: 1, y: 2 });
//! ```

use crate::error::{Error, ReadError, Result};
use crate::value::{Item, Number, Record, Value};
use num_traits::ToPrimitive;
use serde::de::{self, DeserializeOwned};
use serde::forward_to_deserialize_any;

/// Reads a `T` out of a [`Value`].
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(Deserializer::new(value))
}

/// Parses Recon text and reads a `T` out of it.
pub fn from_str_serde<T: DeserializeOwned>(input: &str) -> Result<T> {
    from_value(crate::parse_value(input)?)
}

fn mismatch(expected: &str, found: &Value) -> Error {
    Error::Decode(ReadError::unexpected(expected, found.kind()))
}

fn expect_number(value: Value, expected: &str) -> Result<Number> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(mismatch(expected, &other)),
    }
}

/// A serde deserializer over an owned [`Value`].
pub struct Deserializer {
    value: Value,
}

impl Deserializer {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Deserializer { value }
    }
}

macro_rules! deserialize_integer {
    ($($method:ident => $visit:ident : $ty:ident via $widen:ident),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                let n = expect_number(self.value, stringify!($ty))?;
                let narrowed = n
                    .$widen()
                    .and_then(|wide| <$ty>::try_from(wide).ok())
                    .ok_or_else(|| ReadError::out_of_range(&n, stringify!($ty)))?;
                visitor.$visit(narrowed)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Extant => visitor.visit_unit(),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Text(s) => visitor.visit_string(s),
            Value::Blob(bytes) => visitor.visit_byte_buf(bytes),
            Value::Number(Number::Int32(n)) => visitor.visit_i32(n),
            Value::Number(Number::Int64(n)) => visitor.visit_i64(n),
            Value::Number(Number::Float32(n)) => visitor.visit_f32(n),
            Value::Number(Number::Float64(n)) => visitor.visit_f64(n),
            Value::Number(Number::BigInt(n)) => match n.to_i128() {
                Some(n) => visitor.visit_i128(n),
                None => match n.to_u128() {
                    Some(n) => visitor.visit_u128(n),
                    None => visitor.visit_string(n.to_string()),
                },
            },
            Value::Number(n @ Number::BigDecimal(_)) => visitor.visit_f64(n.to_f64()),
            Value::Record(record) => visit_record(record, visitor),
        }
    }

    deserialize_integer! {
        deserialize_i8 => visit_i8: i8 via to_i64,
        deserialize_i16 => visit_i16: i16 via to_i64,
        deserialize_i32 => visit_i32: i32 via to_i64,
        deserialize_i64 => visit_i64: i64 via to_i64,
        deserialize_u8 => visit_u8: u8 via to_u64,
        deserialize_u16 => visit_u16: u16 via to_u64,
        deserialize_u32 => visit_u32: u32 via to_u64,
        deserialize_u64 => visit_u64: u64 via to_u64,
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let n = expect_number(self.value, "i128")?;
        let narrowed = n
            .to_big_int()
            .and_then(|wide| wide.to_i128())
            .ok_or_else(|| ReadError::out_of_range(&n, "i128"))?;
        visitor.visit_i128(narrowed)
    }

    fn deserialize_u128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let n = expect_number(self.value, "u128")?;
        let narrowed = n
            .to_big_int()
            .and_then(|wide| wide.to_u128())
            .ok_or_else(|| ReadError::out_of_range(&n, "u128"))?;
        visitor.visit_u128(narrowed)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f32(expect_number(self.value, "f32")?.to_f32())
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f64(expect_number(self.value, "f64")?.to_f64())
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Boolean(b) => visitor.visit_bool(b),
            other => Err(mismatch("boolean", &other)),
        }
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match &self.value {
            Value::Text(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(mismatch("a single character", &self.value)),
                }
            }
            other => Err(mismatch("a single character", other)),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Text(s) => visitor.visit_string(s),
            other => Err(mismatch("text", &other)),
        }
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Blob(bytes) => visitor.visit_byte_buf(bytes),
            Value::Record(record) => visit_items(record, visitor),
            other => Err(mismatch("blob", &other)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Extant => visitor.visit_none(),
            value => visitor.visit_some(Deserializer::new(value)),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Extant => visitor.visit_unit(),
            other => Err(mismatch("extant", &other)),
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Extant => visitor.visit_seq(SeqDeserializer::new(Vec::new())),
            Value::Record(record) => visit_items(record, visitor),
            other => Err(mismatch("record", &other)),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Extant => visitor.visit_map(MapDeserializer::new(Vec::new())),
            Value::Record(record) => visit_slots(record, visitor),
            other => Err(mismatch("record", &other)),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Record(record) => visit_record(record, visitor),
            Value::Extant => visitor.visit_map(MapDeserializer::new(Vec::new())),
            other => Err(mismatch("record", &other)),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Text(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                header: Value::Extant,
                body: Record::new(),
            }),
            Value::Record(mut record) if !record.attrs.is_empty() => {
                let tag = record.attrs.remove(0);
                visitor.visit_enum(EnumDeserializer {
                    variant: tag.name,
                    header: tag.value,
                    body: record,
                })
            }
            other => Err(mismatch("a variant", &other)),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_any(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Visits the body of a record as a sequence if it holds only value items,
/// and as a map otherwise. Attributes are ignored.
fn visit_record<'de, V>(record: Record, visitor: V) -> Result<V::Value>
where
    V: de::Visitor<'de>,
{
    if !record.items.is_empty() && record.items.iter().all(|item| !item.is_slot()) {
        visit_items(record, visitor)
    } else {
        visit_slots(record, visitor)
    }
}

fn visit_items<'de, V>(record: Record, visitor: V) -> Result<V::Value>
where
    V: de::Visitor<'de>,
{
    let values = record
        .items
        .into_iter()
        .map(|item| match item {
            Item::ValueItem(value) => Ok(value),
            Item::Slot(..) => Err(Error::Decode(ReadError::unexpected("value item", "slot"))),
        })
        .collect::<Result<Vec<_>>>()?;
    visitor.visit_seq(SeqDeserializer::new(values))
}

fn visit_slots<'de, V>(record: Record, visitor: V) -> Result<V::Value>
where
    V: de::Visitor<'de>,
{
    let slots = record
        .items
        .into_iter()
        .map(|item| match item {
            Item::Slot(key, value) => Ok((key, value)),
            Item::ValueItem(value) => Err(mismatch("slot", &value)),
        })
        .collect::<Result<Vec<_>>>()?;
    visitor.visit_map(MapDeserializer::new(slots))
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(values: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: values.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(Value, Value)>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(slots: Vec<(Value, Value)>) -> Self {
        MapDeserializer {
            iter: slots.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Deserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    // Value of the tag attribute.
    header: Value,
    body: Record,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(Deserializer::new(Value::Text(self.variant)))?;
        Ok((
            variant,
            VariantDeserializer {
                header: self.header,
                body: self.body,
            },
        ))
    }
}

struct VariantDeserializer {
    header: Value,
    body: Record,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        if self.header.is_extant() && self.body.is_empty() {
            Ok(())
        } else {
            Err(Error::Decode(ReadError::unexpected("unit variant", "content")))
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(Deserializer::new(self.header))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visit_items(self.body, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visit_slots(self.body, visitor)
    }
}

/// Lets a [`Value`] be read as any `T: Deserialize` in place.
impl<'de> de::Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Deserializer::new(self).deserialize_any(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::to_value;
    use serde::{Deserialize, Serialize};
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Config {
        name: String,
        port: u16,
        debug: bool,
        ratio: f64,
        peers: Vec<String>,
        limits: HashMap<String, u32>,
        fallback: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Event {
        Ping,
        Moved(i64),
        Resized(u32, u32),
        Renamed { from: String, to: String },
    }

    #[test]
    fn test_struct_round_trip() {
        let mut limits = HashMap::new();
        limits.insert("conn".to_string(), 64);
        let config = Config {
            name: "edge".to_string(),
            port: 8080,
            debug: false,
            ratio: 0.25,
            peers: vec!["a".to_string(), "b c".to_string()],
            limits,
            fallback: None,
        };
        let text = crate::ser::to_string_serde(&config).unwrap();
        let back: Config = from_str_serde(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_enum_round_trip() {
        for event in [
            Event::Ping,
            Event::Moved(-4),
            Event::Resized(640, 480),
            Event::Renamed {
                from: "x".to_string(),
                to: "y".to_string(),
            },
        ] {
            let value = to_value(&event).unwrap();
            assert_eq!(from_value::<Event>(value).unwrap(), event);
        }
        assert_eq!(from_str_serde::<Event>("Ping").unwrap(), Event::Ping);
    }

    #[test]
    fn test_positional_struct() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Pair {
            a: i32,
            b: String,
        }
        let pair: Pair = from_str_serde("{1, two}").unwrap();
        assert_eq!(
            pair,
            Pair {
                a: 1,
                b: "two".to_string()
            }
        );
    }

    #[test]
    fn test_checked_narrowing() {
        let err = from_str_serde::<u8>("300").unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(ReadError::NumberOutOfRange { .. })
        ));
        assert!(from_str_serde::<u32>("-1").is_err());
        assert_eq!(from_str_serde::<i64>("-1").unwrap(), -1);
        assert_eq!(
            from_str_serde::<u64>("18446744073709551615").unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_non_text_keys_and_blobs() {
        let map: BTreeMap<i32, bool> = from_str_serde("{1:true,2:false}").unwrap();
        assert_eq!(map.get(&2), Some(&false));

        let bytes: serde_bytes_like::Buf = from_str_serde("%AQID").unwrap();
        assert_eq!(bytes.0, vec![1, 2, 3]);
    }

    #[test]
    fn test_type_mismatch() {
        assert!(matches!(
            from_str_serde::<String>("42"),
            Err(Error::Decode(ReadError::UnexpectedEvent { .. }))
        ));
        assert!(from_str_serde::<Vec<i32>>("{a:1}").is_err());
    }

    mod serde_bytes_like {
        use serde::de::{Deserializer, Visitor};
        use std::fmt;

        pub struct Buf(pub Vec<u8>);

        impl<'de> serde::Deserialize<'de> for Buf {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct BufVisitor;

                impl<'de> Visitor<'de> for BufVisitor {
                    type Value = Buf;

                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        f.write_str("bytes")
                    }

                    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Buf, E> {
                        Ok(Buf(v))
                    }
                }

                deserializer.deserialize_byte_buf(BufVisitor)
            }
        }
    }
}
