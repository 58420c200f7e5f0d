//! Writing structural events.
//!
//! [`EventWriter`] emits exactly the events that tokenizing the printed form
//! of a value produces, so its output can be fed straight to a recognizer
//! without going through text.

use super::{
    BodyWriter, HeaderWriter, ItemCount, Position, PrimitiveWriter, RecordBodyKind,
    StructuralWriter, Writable,
};
use crate::error::WriteError;
use crate::event::ReadEvent;
use crate::value::Number;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// Collects the events of a value.
///
/// ```rust
/// use recon_codec::event::ReadEvent;
/// use recon_codec::writer::write_events;
///
/// let events = write_events(&vec![1, 2]).unwrap();
/// assert_eq!(
///     events,
///     vec![ReadEvent::StartBody, 1.into(), 2.into(), ReadEvent::EndRecord]
/// );
/// ```
pub fn write_events<T: Writable + ?Sized>(value: &T) -> Result<Vec<ReadEvent>, WriteError> {
    let mut events = Vec::new();
    value.write_with(EventWriter::new(&mut events))?;
    Ok(events)
}

/// A [`StructuralWriter`] appending events to a vector.
pub struct EventWriter<'a> {
    events: &'a mut Vec<ReadEvent>,
    position: Position,
}

impl<'a> EventWriter<'a> {
    pub fn new(events: &'a mut Vec<ReadEvent>) -> Self {
        EventWriter {
            events,
            position: Position::TopLevel,
        }
    }

    fn push(self, event: ReadEvent) -> Result<(), WriteError> {
        self.events.push(event);
        Ok(())
    }
}

impl PrimitiveWriter for EventWriter<'_> {
    type Repr = ();
    type Error = WriteError;

    fn write_extant(self) -> Result<(), WriteError> {
        // An extant attribute value is an attribute without a body.
        if self.position == Position::AttrValue {
            return Ok(());
        }
        self.push(ReadEvent::Extant)
    }

    fn write_i32(self, value: i32) -> Result<(), WriteError> {
        self.push(ReadEvent::Number(Number::Int32(value)))
    }

    fn write_i64(self, value: i64) -> Result<(), WriteError> {
        self.push(ReadEvent::Number(Number::Int64(value)))
    }

    fn write_f32(self, value: f32) -> Result<(), WriteError> {
        self.push(ReadEvent::Number(Number::Float32(value)))
    }

    fn write_f64(self, value: f64) -> Result<(), WriteError> {
        self.push(ReadEvent::Number(Number::Float64(value)))
    }

    fn write_bool(self, value: bool) -> Result<(), WriteError> {
        self.push(ReadEvent::Boolean(value))
    }

    fn write_big_int(self, value: &BigInt) -> Result<(), WriteError> {
        self.push(ReadEvent::Number(Number::BigInt(value.clone())))
    }

    fn write_big_decimal(self, value: &BigDecimal) -> Result<(), WriteError> {
        self.push(ReadEvent::Number(Number::BigDecimal(value.clone())))
    }

    fn write_text(self, value: &str) -> Result<(), WriteError> {
        self.push(ReadEvent::Text(value.to_string()))
    }

    fn write_blob(self, value: &[u8]) -> Result<(), WriteError> {
        self.push(ReadEvent::Blob(value.to_vec()))
    }
}

impl<'a> StructuralWriter for EventWriter<'a> {
    type Header = EventHeader<'a>;

    fn record(self, _num_attrs: usize) -> Result<EventHeader<'a>, WriteError> {
        Ok(EventHeader {
            writer: self,
            attrs: 0,
        })
    }
}

pub struct EventHeader<'a> {
    writer: EventWriter<'a>,
    attrs: usize,
}

impl<'a> HeaderWriter for EventHeader<'a> {
    type Repr = ();
    type Error = WriteError;
    type Body = EventBody<'a>;

    fn write_attr_with<V: Writable + ?Sized>(
        mut self,
        name: &str,
        value: &V,
    ) -> Result<Self, WriteError> {
        let events = &mut *self.writer.events;
        events.push(ReadEvent::StartAttribute(name.to_string()));
        value.write_with(EventWriter {
            events: &mut *events,
            position: Position::AttrValue,
        })?;
        events.push(ReadEvent::EndAttribute);
        self.attrs += 1;
        Ok(self)
    }

    fn complete_header(
        self,
        kind: RecordBodyKind,
        num_items: usize,
    ) -> Result<EventBody<'a>, WriteError> {
        let EventWriter { events, position } = self.writer;
        // Mirrors the printer: only these shapes print with braces.
        let braced = self.attrs > 0 || position != Position::AttrValue || num_items == 0;
        if braced {
            events.push(ReadEvent::StartBody);
        }
        Ok(EventBody {
            events,
            braced,
            deferred: !braced && num_items == 1,
            count: ItemCount::new(kind, num_items),
        })
    }
}

pub struct EventBody<'a> {
    events: &'a mut Vec<ReadEvent>,
    braced: bool,
    deferred: bool,
    count: ItemCount,
}

impl EventBody<'_> {
    fn item(&mut self) -> EventWriter<'_> {
        EventWriter {
            events: &mut *self.events,
            position: Position::Item,
        }
    }
}

impl BodyWriter for EventBody<'_> {
    type Repr = ();
    type Error = WriteError;

    fn write_value<V: Writable + ?Sized>(mut self, value: &V) -> Result<Self, WriteError> {
        if self.deferred {
            self.deferred = false;
            self.braced = true;
            self.events.push(ReadEvent::StartBody);
        }
        value.write_with(self.item())?;
        self.count.value();
        Ok(self)
    }

    fn write_slot<K, V>(mut self, key: &K, value: &V) -> Result<Self, WriteError>
    where
        K: Writable + ?Sized,
        V: Writable + ?Sized,
    {
        self.count.slot()?;
        self.deferred = false;
        key.write_with(self.item())?;
        self.events.push(ReadEvent::Slot);
        value.write_with(self.item())?;
        Ok(self)
    }

    fn done(self) -> Result<(), WriteError> {
        self.count.check()?;
        if self.braced {
            self.events.push(ReadEvent::EndRecord);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use crate::writer::print;
    use crate::Value;

    fn assert_matches_tokenizer(text: &str) {
        let value: Value = text.parse().unwrap();
        let printed = print(&value).unwrap();
        assert_eq!(
            write_events(&value).unwrap(),
            tokenize(&printed).unwrap(),
            "events of {}",
            printed
        );
    }

    #[test]
    fn test_events_agree_with_tokenizer() {
        for text in [
            "",
            "7",
            "{}",
            "{1,,2}",
            "{a:,:b}",
            "@point{x:1,y:2}",
            "@a",
            "@a(1)",
            "@a(1,2)",
            "@a({1})",
            "@a({})",
            "@a(k:v) @b",
            "@a(@b(c){d}, e:@f)",
            "{%AAA=,\"x y\",-2.5}",
        ] {
            assert_matches_tokenizer(text);
        }
    }
}
