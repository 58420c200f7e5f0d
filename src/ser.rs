//! Serde serialization into the Recon value model.
//!
//! This module provides a [`Serializer`] that turns any `T: Serialize` into
//! a [`Value`], which can then be printed with [`crate::to_string`]. It is the
//! derive-based path for application types that do not implement
//! [`Writable`](crate::writer::Writable) by hand.
//!
//! ## Mapping
//!
//! | Rust | Recon |
//! |---|---|
//! | `struct Point { x, y }` | `@Point{x:1,y:2}` |
//! | `Vec<T>`, tuples, tuple structs | `{a,b}` |
//! | maps | `{k:v}` |
//! | `E::Unit` | `@Unit` |
//! | `E::Newtype(v)` | `@Newtype(v)` |
//! | `E::Tuple(a, b)` / `E::Struct { a }` | `@Tuple{a,b}` / `@Struct{a:..}` |
//! | `None`, `()` | extant |
//! | `&[u8]` via `serialize_bytes` | blob |
//!
//! Integers keep the narrowest width able to hold them, so a `u64` above
//! `i64::MAX` or any 128-bit integer outside `i64` becomes a big integer.
//!
//! ```rust
//! use recon_codec::ser::to_value;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let value = to_value(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(value.to_string(), "@Point{x:1,y:2}");
//! ```

use crate::error::{Error, Result};
use crate::value::{Item, Number, Record, Value};
use num_bigint::BigInt;
use serde::ser::{self, Serialize};

/// Converts a `T: Serialize` into a [`Value`].
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(Serializer)
}

/// Serializes a `T: Serialize` to canonical Recon text.
///
/// ```rust
/// use recon_codec::ser::to_string_serde;
///
/// assert_eq!(to_string_serde(&vec![Some(1), None]).unwrap(), "{1,}");
/// ```
pub fn to_string_serde<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    crate::to_string(&to_value(value)?)
}

fn tagged(name: &str, value: Value) -> Record {
    Record::new().with_attr(name, value)
}

/// A serde serializer producing [`Value`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer;

impl ser::Serializer for Serializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeItems;
    type SerializeTuple = SerializeItems;
    type SerializeTupleStruct = SerializeItems;
    type SerializeTupleVariant = SerializeItems;
    type SerializeMap = SerializeSlots;
    type SerializeStruct = SerializeSlots;
    type SerializeStructVariant = SerializeSlots;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Ok(match i64::try_from(v) {
            Ok(v) => Value::from(v),
            Err(_) => Value::from(BigInt::from(v)),
        })
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        Ok(match u64::try_from(v) {
            Ok(v) => Value::from(v),
            Err(_) => Value::from(BigInt::from(v)),
        })
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Number(Number::Float32(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(Number::Float64(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Blob(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Extant)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Extant)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Extant)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::Record(tagged(variant, Value::Extant)))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(Value::Record(tagged(variant, to_value(value)?)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeItems> {
        Ok(SerializeItems::new(Record::new(), len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeItems> {
        Ok(SerializeItems::new(Record::new(), len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeItems> {
        Ok(SerializeItems::new(Record::new(), len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeItems> {
        Ok(SerializeItems::new(tagged(variant, Value::Extant), len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeSlots> {
        Ok(SerializeSlots::new(Record::new(), len.unwrap_or(0)))
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<SerializeSlots> {
        Ok(SerializeSlots::new(tagged(name, Value::Extant), len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeSlots> {
        Ok(SerializeSlots::new(tagged(variant, Value::Extant), len))
    }
}

/// Collects value items.
pub struct SerializeItems {
    record: Record,
}

impl SerializeItems {
    fn new(mut record: Record, len: usize) -> Self {
        record.items.reserve(len);
        SerializeItems { record }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.record.push_item(Item::ValueItem(to_value(value)?));
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeItems {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

impl ser::SerializeTuple for SerializeItems {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

impl ser::SerializeTupleStruct for SerializeItems {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

impl ser::SerializeTupleVariant for SerializeItems {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

/// Collects slots.
pub struct SerializeSlots {
    record: Record,
    current_key: Option<Value>,
}

impl SerializeSlots {
    fn new(mut record: Record, len: usize) -> Self {
        record.items.reserve(len);
        SerializeSlots {
            record,
            current_key: None,
        }
    }
}

impl ser::SerializeMap for SerializeSlots {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(to_value(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.record.push_item(Item::Slot(key, to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

impl ser::SerializeStruct for SerializeSlots {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.record.push_item(Item::slot(key, to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

impl ser::SerializeStructVariant for SerializeSlots {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.record.push_item(Item::slot(key, to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct User {
        id: u32,
        name: String,
        tags: Vec<String>,
        manager: Option<Box<User>>,
    }

    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle(f64),
        Rect(u8, u8),
        Label { text: String },
    }

    #[test]
    fn test_struct() {
        let user = User {
            id: 7,
            name: "Ada Lovelace".to_string(),
            tags: vec!["math".to_string()],
            manager: None,
        };
        assert_eq!(
            to_string_serde(&user).unwrap(),
            "@User{id:7,name:\"Ada Lovelace\",tags:{math},manager:}"
        );
    }

    #[test]
    fn test_enums() {
        let shapes = vec![
            Shape::Empty,
            Shape::Circle(1.5),
            Shape::Rect(2, 3),
            Shape::Label {
                text: "hi".to_string(),
            },
        ];
        let texts: Vec<String> = shapes.iter().map(|s| to_string_serde(s).unwrap()).collect();
        assert_eq!(texts, ["@Empty", "@Circle(1.5)", "@Rect{2,3}", "@Label{text:hi}"]);
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(
            to_value(&5u8).unwrap(),
            Value::Number(Number::Int32(5))
        );
        assert!(matches!(
            to_value(&u64::MAX).unwrap(),
            Value::Number(Number::BigInt(_))
        ));
        assert!(matches!(
            to_value(&i128::MIN).unwrap(),
            Value::Number(Number::BigInt(_))
        ));
        assert!(matches!(
            to_value(&-3i128).unwrap(),
            Value::Number(Number::Int64(-3))
        ));
    }

    #[test]
    fn test_map_keys_keep_their_type() {
        let mut map = BTreeMap::new();
        map.insert(1, true);
        map.insert(2, false);
        assert_eq!(
            to_value(&map).unwrap(),
            Value::from_slots([(1, true), (2, false)])
        );
    }
}
