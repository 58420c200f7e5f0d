//! Writing into the [`Value`] model.

use super::{BodyWriter, HeaderWriter, ItemCount, PrimitiveWriter, RecordBodyKind, StructuralWriter, Writable};
use crate::error::WriteError;
use crate::value::{Attr, Item, Number, Record, Value};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// Converts anything [`Writable`] into a [`Value`].
///
/// ```rust
/// use recon_codec::writer::write_value;
/// use recon_codec::Value;
///
/// let value = write_value(&vec![Some(1), None]).unwrap();
/// assert_eq!(value, Value::from_items([Value::from(1), Value::Extant]));
/// ```
pub fn write_value<T: Writable + ?Sized>(value: &T) -> Result<Value, WriteError> {
    value.write_with(ValueWriter)
}

/// A [`StructuralWriter`] building a [`Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueWriter;

impl PrimitiveWriter for ValueWriter {
    type Repr = Value;
    type Error = WriteError;

    fn write_extant(self) -> Result<Value, WriteError> {
        Ok(Value::Extant)
    }

    fn write_i32(self, value: i32) -> Result<Value, WriteError> {
        Ok(Value::Number(Number::Int32(value)))
    }

    fn write_i64(self, value: i64) -> Result<Value, WriteError> {
        Ok(Value::Number(Number::Int64(value)))
    }

    fn write_f32(self, value: f32) -> Result<Value, WriteError> {
        Ok(Value::Number(Number::Float32(value)))
    }

    fn write_f64(self, value: f64) -> Result<Value, WriteError> {
        Ok(Value::Number(Number::Float64(value)))
    }

    fn write_bool(self, value: bool) -> Result<Value, WriteError> {
        Ok(Value::Boolean(value))
    }

    fn write_big_int(self, value: &BigInt) -> Result<Value, WriteError> {
        Ok(Value::Number(Number::BigInt(value.clone())))
    }

    fn write_big_decimal(self, value: &BigDecimal) -> Result<Value, WriteError> {
        Ok(Value::Number(Number::BigDecimal(value.clone())))
    }

    fn write_text(self, value: &str) -> Result<Value, WriteError> {
        Ok(Value::Text(value.to_string()))
    }

    fn write_blob(self, value: &[u8]) -> Result<Value, WriteError> {
        Ok(Value::Blob(value.to_vec()))
    }
}

impl StructuralWriter for ValueWriter {
    type Header = RecordBuilder;

    fn record(self, num_attrs: usize) -> Result<RecordBuilder, WriteError> {
        Ok(RecordBuilder {
            record: Record {
                attrs: Vec::with_capacity(num_attrs),
                items: Vec::new(),
            },
            count: ItemCount::new(RecordBodyKind::Mixed, 0),
        })
    }
}

/// Collects the attributes and items of a record.
pub struct RecordBuilder {
    record: Record,
    count: ItemCount,
}

impl HeaderWriter for RecordBuilder {
    type Repr = Value;
    type Error = WriteError;
    type Body = RecordBuilder;

    fn write_attr_with<V: Writable + ?Sized>(
        mut self,
        name: &str,
        value: &V,
    ) -> Result<Self, WriteError> {
        let value = value.write_with(ValueWriter)?;
        self.record.attrs.push(Attr {
            name: name.to_string(),
            value,
        });
        Ok(self)
    }

    fn complete_header(
        mut self,
        kind: RecordBodyKind,
        num_items: usize,
    ) -> Result<RecordBuilder, WriteError> {
        self.record.items.reserve(num_items);
        self.count = ItemCount::new(kind, num_items);
        Ok(self)
    }
}

impl BodyWriter for RecordBuilder {
    type Repr = Value;
    type Error = WriteError;

    fn write_value<V: Writable + ?Sized>(mut self, value: &V) -> Result<Self, WriteError> {
        self.count.value();
        let value = value.write_with(ValueWriter)?;
        self.record.items.push(Item::ValueItem(value));
        Ok(self)
    }

    fn write_slot<K, V>(mut self, key: &K, value: &V) -> Result<Self, WriteError>
    where
        K: Writable + ?Sized,
        V: Writable + ?Sized,
    {
        self.count.slot()?;
        let key = key.write_with(ValueWriter)?;
        let value = value.write_with(ValueWriter)?;
        self.record.items.push(Item::Slot(key, value));
        Ok(self)
    }

    fn done(self) -> Result<Value, WriteError> {
        self.count.check()?;
        Ok(Value::Record(self.record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_value_writes_itself() {
        let value: Value = "@a(1,k:v){x:{1,%AAA=},,true:-2.5}".parse().unwrap();
        assert_eq!(write_value(&value).unwrap(), value);
    }

    #[test]
    fn test_widths_are_kept() {
        assert!(matches!(
            write_value(&7i64).unwrap(),
            Value::Number(Number::Int64(7))
        ));
        assert!(matches!(
            write_value(&7u8).unwrap(),
            Value::Number(Number::Int32(7))
        ));
        assert!(matches!(
            write_value(&u64::MAX).unwrap(),
            Value::Number(Number::BigInt(_))
        ));
    }

    #[test]
    fn test_maps_become_slots() {
        let mut map = BTreeMap::new();
        map.insert(1, "one");
        map.insert(2, "two");
        assert_eq!(
            write_value(&map).unwrap(),
            Value::from_slots([(1, "one"), (2, "two")])
        );
    }
}
