//! Builds [`Value`] trees from structural events.
//!
//! [`ValueBuilder`] is the recognizer used when the target of a decode is any
//! value rather than a specific type. It keeps one frame per open attribute
//! or record and folds each completed value into its parent.
//!
//! Attribute bodies are collapsed the same way the notation reads them: an
//! empty body is `Extant`, a body holding a single value item is that value,
//! and anything else is a record of the body's items.
//!
//! ```rust
//! use recon_codec::builder::ValueBuilder;
//! use recon_codec::recognizer::recognize_events;
//! use recon_codec::tokenizer::tokenize;
//! use recon_codec::{Record, Value};
//!
//! let events = tokenize("@point(2d){x:1,y:2}").unwrap();
//! let value = recognize_events(&mut ValueBuilder::new(), events).unwrap();
//!
//! let expected = Record::new()
//!     .with_attr("point", "2d")
//!     .with_slot("x", 1)
//!     .with_slot("y", 2);
//! assert_eq!(value, Value::Record(expected));
//! ```

use crate::error::ReadError;
use crate::event::ReadEvent;
use crate::recognizer::{Recognizable, Recognizer};
use crate::value::{Attr, Item, Record, Value};

enum Frame {
    Attr {
        name: String,
        items: Vec<Item>,
        key: Option<Value>,
    },
    Record {
        record: Record,
        in_body: bool,
        key: Option<Value>,
    },
}

impl Frame {
    fn push_value(&mut self, value: Value) -> Result<(), ReadError> {
        let (items, key) = match self {
            Frame::Attr { items, key, .. } => (items, key),
            Frame::Record {
                record,
                in_body: true,
                key,
            } => (&mut record.items, key),
            Frame::Record { in_body: false, .. } => {
                return Err(ReadError::unexpected("an attribute or body", value.kind()))
            }
        };
        match key.take() {
            Some(k) => items.push(Item::Slot(k, value)),
            None => items.push(Item::ValueItem(value)),
        }
        Ok(())
    }

    /// Turns the last value item into the key of a slot.
    fn start_slot(&mut self) -> Result<(), ReadError> {
        let (items, key) = match self {
            Frame::Attr { items, key, .. } => (items, key),
            Frame::Record {
                record,
                in_body: true,
                key,
            } => (&mut record.items, key),
            Frame::Record { in_body: false, .. } => {
                return Err(ReadError::unexpected("an attribute or body", "slot"))
            }
        };
        match items.pop() {
            Some(Item::ValueItem(k)) if key.is_none() => {
                *key = Some(k);
                Ok(())
            }
            Some(item) => {
                items.push(item);
                Err(ReadError::unexpected("a value item before ':'", "slot"))
            }
            None => Err(ReadError::unexpected("a slot key", "slot")),
        }
    }
}

fn attr_value(mut items: Vec<Item>) -> Value {
    match items.len() {
        0 => Value::Extant,
        1 if !items[0].is_slot() => match items.pop() {
            Some(Item::ValueItem(value)) => value,
            _ => Value::Extant,
        },
        _ => Value::Record(Record {
            attrs: Vec::new(),
            items,
        }),
    }
}

/// Recognizer producing a [`Value`].
#[derive(Default)]
pub struct ValueBuilder {
    stack: Vec<Frame>,
}

impl ValueBuilder {
    #[must_use]
    pub fn new() -> Self {
        ValueBuilder::default()
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn complete(&mut self, value: Value) -> Result<Option<Value>, ReadError> {
        match self.stack.last_mut() {
            None => Ok(Some(value)),
            Some(frame) => frame.push_value(value).map(|()| None),
        }
    }

    fn step(&mut self, event: ReadEvent) -> Result<Option<Value>, ReadError> {
        match event {
            ReadEvent::StartAttribute(name) => {
                let collecting_attrs = matches!(
                    self.stack.last(),
                    Some(Frame::Record { in_body: false, .. })
                );
                if !collecting_attrs {
                    self.stack.push(Frame::Record {
                        record: Record::new(),
                        in_body: false,
                        key: None,
                    });
                }
                self.stack.push(Frame::Attr {
                    name,
                    items: Vec::new(),
                    key: None,
                });
                Ok(None)
            }
            ReadEvent::EndAttribute => match self.stack.pop() {
                Some(Frame::Attr { name, items, key: None }) => match self.stack.last_mut() {
                    Some(Frame::Record {
                        record,
                        in_body: false,
                        ..
                    }) => {
                        record.attrs.push(Attr {
                            name,
                            value: attr_value(items),
                        });
                        Ok(None)
                    }
                    _ => Err(ReadError::unexpected("a record", "end of attribute")),
                },
                _ => Err(ReadError::unexpected("an item", "end of attribute")),
            },
            ReadEvent::StartBody => {
                if let Some(Frame::Record { in_body, .. }) = self.stack.last_mut() {
                    if !*in_body {
                        *in_body = true;
                        return Ok(None);
                    }
                }
                self.stack.push(Frame::Record {
                    record: Record::new(),
                    in_body: true,
                    key: None,
                });
                Ok(None)
            }
            ReadEvent::EndRecord => match self.stack.pop() {
                Some(Frame::Record {
                    record,
                    in_body: true,
                    key: None,
                }) => self.complete(Value::Record(record)),
                _ => Err(ReadError::unexpected("an item", "end of record")),
            },
            ReadEvent::Slot => match self.stack.last_mut() {
                Some(frame) => frame.start_slot().map(|()| None),
                None => Err(ReadError::unexpected("a value", "slot")),
            },
            ReadEvent::Text(text) => self.complete(Value::Text(text)),
            ReadEvent::Number(n) => self.complete(Value::Number(n)),
            ReadEvent::Boolean(b) => self.complete(Value::Boolean(b)),
            ReadEvent::Blob(bytes) => self.complete(Value::Blob(bytes)),
            ReadEvent::Extant => self.complete(Value::Extant),
        }
    }
}

impl Recognizer for ValueBuilder {
    type Target = Value;

    fn feed_event(&mut self, event: ReadEvent) -> Option<Result<Value, ReadError>> {
        match self.step(event) {
            Ok(None) => None,
            Ok(Some(value)) => Some(Ok(value)),
            Err(err) => {
                self.stack.clear();
                Some(Err(err))
            }
        }
    }

    fn reset(&mut self) {
        self.stack.clear();
    }
}

impl Recognizable for Value {
    type Rec = ValueBuilder;

    fn make_recognizer() -> ValueBuilder {
        ValueBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::recognize_events;
    use crate::tokenizer::tokenize;

    fn build(text: &str) -> Value {
        recognize_events(&mut ValueBuilder::new(), tokenize(text).unwrap()).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(build(""), Value::Extant);
        assert_eq!(build("42"), Value::from(42));
        assert_eq!(build("\"a b\""), Value::from("a b"));
        assert_eq!(build("true"), Value::from(true));
        assert_eq!(build("%AAA="), Value::Blob(vec![0, 0]));
    }

    #[test]
    fn test_nested_bodies() {
        let value = build("{a:{1,2},{},b:}");
        let expected = Record::new()
            .with_slot("a", Value::from_items([1, 2]))
            .with_item(Record::new())
            .with_slot("b", Value::Extant);
        assert_eq!(value, Value::Record(expected));
    }

    #[test]
    fn test_attribute_values() {
        let record = match build("@a @b() @c(1) @d(1,2) @e(k:v) @f({1})") {
            Value::Record(record) => record,
            other => panic!("expected a record, got {:?}", other),
        };
        let values: Vec<_> = record.attrs.iter().map(|a| a.value.clone()).collect();
        assert_eq!(values[0], Value::Extant);
        assert_eq!(values[1], Value::Extant);
        assert_eq!(values[2], Value::from(1));
        assert_eq!(values[3], Value::from_items([1, 2]));
        assert_eq!(values[4], Value::from_slots([("k", "v")]));
        assert_eq!(values[5], Value::from_items([1]));
        assert!(record.items.is_empty());
    }

    #[test]
    fn test_records_inside_attributes() {
        let value = build("@outer(@inner{1}, x: @leaf)");
        let inner = Record::new().with_attr("inner", Value::Extant).with_item(1);
        let leaf = Record::new().with_attr("leaf", Value::Extant);
        let attr = Value::Record(Record::new().with_item(inner).with_slot("x", leaf));
        assert_eq!(value, Value::Record(Record::new().with_attr("outer", attr)));
    }

    #[test]
    fn test_rejects_malformed_events() {
        let mut builder = ValueBuilder::new();
        assert!(matches!(builder.feed_event(ReadEvent::EndRecord), Some(Err(_))));
        builder.reset();
        assert!(builder.feed_event(ReadEvent::StartBody).is_none());
        assert!(matches!(builder.feed_event(ReadEvent::Slot), Some(Err(_))));
    }
}
