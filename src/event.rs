//! Structural events.
//!
//! The tokenizer turns notation into a flat stream of [`ReadEvent`]s and the
//! recognizers consume that stream. For `@point(1){x:2}` the stream is:
//!
//! ```text
//! StartAttribute("point") Number(1) EndAttribute StartBody Text("x") Slot Number(2) EndRecord
//! ```
//!
//! Every record ends with `StartBody ... EndRecord`, even when it was written
//! without braces. A `Slot` event always sits between the key's events and the
//! value's events.

use crate::value::Number;
use std::fmt;

/// A single structural event.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadEvent {
    StartAttribute(String),
    EndAttribute,
    StartBody,
    Slot,
    EndRecord,
    Text(String),
    Number(Number),
    Boolean(bool),
    Blob(Vec<u8>),
    Extant,
}

impl ReadEvent {
    /// Returns `true` for events that form a complete value on their own.
    #[inline]
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            ReadEvent::Text(_)
                | ReadEvent::Number(_)
                | ReadEvent::Boolean(_)
                | ReadEvent::Blob(_)
                | ReadEvent::Extant
        )
    }

    /// Nesting change caused by this event: `+1` when it opens an attribute
    /// or body, `-1` when it closes one.
    #[inline]
    #[must_use]
    pub const fn depth_change(&self) -> i32 {
        match self {
            ReadEvent::StartAttribute(_) | ReadEvent::StartBody => 1,
            ReadEvent::EndAttribute | ReadEvent::EndRecord => -1,
            _ => 0,
        }
    }
}

impl fmt::Display for ReadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadEvent::StartAttribute(name) => write!(f, "start of attribute '{}'", name),
            ReadEvent::EndAttribute => f.write_str("end of attribute"),
            ReadEvent::StartBody => f.write_str("start of record body"),
            ReadEvent::Slot => f.write_str("slot"),
            ReadEvent::EndRecord => f.write_str("end of record"),
            ReadEvent::Text(text) => write!(f, "text \"{}\"", text),
            ReadEvent::Number(n) => write!(f, "{} {}", n.kind(), n),
            ReadEvent::Boolean(b) => write!(f, "boolean {}", b),
            ReadEvent::Blob(bytes) => write!(f, "blob of {} bytes", bytes.len()),
            ReadEvent::Extant => f.write_str("extant"),
        }
    }
}

impl From<Number> for ReadEvent {
    fn from(value: Number) -> Self {
        ReadEvent::Number(value)
    }
}

impl From<i32> for ReadEvent {
    fn from(value: i32) -> Self {
        ReadEvent::Number(Number::Int32(value))
    }
}

impl From<&str> for ReadEvent {
    fn from(value: &str) -> Self {
        ReadEvent::Text(value.to_string())
    }
}

impl From<bool> for ReadEvent {
    fn from(value: bool) -> Self {
        ReadEvent::Boolean(value)
    }
}
