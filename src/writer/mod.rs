//! Writers: typed encoding into text, values or events.
//!
//! The writer framework is the inverse of the recognizers. A type implements
//! [`Writable`] by describing itself to a [`StructuralWriter`], which decides
//! what the description turns into:
//!
//! - [`Printer`] produces Recon text
//! - [`ValueWriter`] produces a [`Value`] tree
//! - [`EventWriter`] produces the [`ReadEvent`](crate::event::ReadEvent)
//!   sequence the tokenizer would read back from the printed text
//!
//! A compound type is written in a fixed order: [`StructuralWriter::record`]
//! with the number of attributes, one [`HeaderWriter::write_attr_with`] per
//! attribute, [`HeaderWriter::complete_header`] with the shape and number of
//! items, one [`BodyWriter::write_value`] or [`BodyWriter::write_slot`] per
//! item and finally [`BodyWriter::done`].
//!
//! ## Examples
//!
//! ```rust
//! use recon_codec::writer::{
//!     BodyWriter, HeaderWriter, RecordBodyKind, StructuralWriter, Writable,
//! };
//!
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Writable for Point {
//!     fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
//!         writer
//!             .record(1)?
//!             .write_attr_with("point", &())?
//!             .complete_header(RecordBodyKind::MapLike, 2)?
//!             .write_slot("x", &self.x)?
//!             .write_slot("y", &self.y)?
//!             .done()
//!     }
//! }
//!
//! let text = recon_codec::to_string(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(text, "@point{x:1,y:2}");
//! ```

mod events;
mod printer;
mod value_writer;

pub use events::{write_events, EventWriter};
pub use printer::{print, print_with_options, Printer};
pub use value_writer::{write_value, ValueWriter};

use crate::error::WriteError;
use crate::value::{Item, Number, Record, Value};
use bigdecimal::BigDecimal;
use bytes::Bytes;
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

/// The shape of a record body, declared before its items are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordBodyKind {
    /// Value items only.
    ArrayLike,
    /// Slots only.
    MapLike,
    Mixed,
}

impl RecordBodyKind {
    /// The kind that describes `items`.
    pub fn of(items: &[Item]) -> Self {
        let slots = items.iter().filter(|item| item.is_slot()).count();
        if slots == 0 {
            RecordBodyKind::ArrayLike
        } else if slots == items.len() {
            RecordBodyKind::MapLike
        } else {
            RecordBodyKind::Mixed
        }
    }
}

/// Where a value is being written, which affects how a few shapes print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    TopLevel,
    AttrValue,
    Item,
}

/// Writes scalars.
pub trait PrimitiveWriter: Sized {
    type Repr;
    type Error: From<WriteError>;

    fn write_extant(self) -> Result<Self::Repr, Self::Error>;

    fn write_i32(self, value: i32) -> Result<Self::Repr, Self::Error>;

    fn write_i64(self, value: i64) -> Result<Self::Repr, Self::Error>;

    fn write_f32(self, value: f32) -> Result<Self::Repr, Self::Error>;

    fn write_f64(self, value: f64) -> Result<Self::Repr, Self::Error>;

    fn write_bool(self, value: bool) -> Result<Self::Repr, Self::Error>;

    fn write_big_int(self, value: &BigInt) -> Result<Self::Repr, Self::Error>;

    fn write_big_decimal(self, value: &BigDecimal) -> Result<Self::Repr, Self::Error>;

    fn write_text(self, value: &str) -> Result<Self::Repr, Self::Error>;

    fn write_blob(self, value: &[u8]) -> Result<Self::Repr, Self::Error>;

    /// Writes a number at its own width.
    fn write_number(self, value: &Number) -> Result<Self::Repr, Self::Error> {
        match value {
            Number::Int32(n) => self.write_i32(*n),
            Number::Int64(n) => self.write_i64(*n),
            Number::Float32(n) => self.write_f32(*n),
            Number::Float64(n) => self.write_f64(*n),
            Number::BigInt(n) => self.write_big_int(n),
            Number::BigDecimal(n) => self.write_big_decimal(n),
        }
    }
}

/// Writes scalars and records.
pub trait StructuralWriter: PrimitiveWriter {
    type Header: HeaderWriter<Repr = Self::Repr, Error = Self::Error>;

    /// Starts a record with `num_attrs` attributes.
    fn record(self, num_attrs: usize) -> Result<Self::Header, Self::Error>;
}

/// Writes the attributes of a record.
pub trait HeaderWriter: Sized {
    type Repr;
    type Error: From<WriteError>;
    type Body: BodyWriter<Repr = Self::Repr, Error = Self::Error>;

    fn write_attr_with<V: Writable + ?Sized>(
        self,
        name: &str,
        value: &V,
    ) -> Result<Self, Self::Error>;

    /// Ends the attributes and declares the body.
    fn complete_header(
        self,
        kind: RecordBodyKind,
        num_items: usize,
    ) -> Result<Self::Body, Self::Error>;
}

/// Writes the items of a record.
pub trait BodyWriter: Sized {
    type Repr;
    type Error: From<WriteError>;

    fn write_value<V: Writable + ?Sized>(self, value: &V) -> Result<Self, Self::Error>;

    fn write_slot<K, V>(self, key: &K, value: &V) -> Result<Self, Self::Error>
    where
        K: Writable + ?Sized,
        V: Writable + ?Sized;

    fn done(self) -> Result<Self::Repr, Self::Error>;
}

/// Types that can describe themselves to a [`StructuralWriter`].
pub trait Writable {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error>;
}

macro_rules! writable_via {
    ($($t:ty => $method:ident as $target:ty),* $(,)?) => {
        $(
            impl Writable for $t {
                #[inline]
                fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
                    writer.$method(<$target>::from(*self))
                }
            }
        )*
    };
}

writable_via!(
    i8 => write_i32 as i32,
    i16 => write_i32 as i32,
    i32 => write_i32 as i32,
    u8 => write_i32 as i32,
    u16 => write_i32 as i32,
    i64 => write_i64 as i64,
    f32 => write_f32 as f32,
    f64 => write_f64 as f64,
    bool => write_bool as bool,
);

impl Writable for u32 {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_number(&Number::from(*self))
    }
}

impl Writable for u64 {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_number(&Number::from(*self))
    }
}

impl Writable for usize {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_number(&Number::from(*self as u64))
    }
}

impl Writable for BigInt {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_big_int(self)
    }
}

impl Writable for BigDecimal {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_big_decimal(self)
    }
}

impl Writable for Number {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_number(self)
    }
}

impl Writable for str {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_text(self)
    }
}

impl Writable for String {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_text(self)
    }
}

impl Writable for Bytes {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_blob(self)
    }
}

impl Writable for () {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer.write_extant()
    }
}

impl<T: Writable> Writable for Option<T> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        match self {
            Some(value) => value.write_with(writer),
            None => writer.write_extant(),
        }
    }
}

impl<T: Writable + ?Sized> Writable for &T {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        (**self).write_with(writer)
    }
}

impl<T: Writable + ?Sized> Writable for Box<T> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        (**self).write_with(writer)
    }
}

impl<T: Writable + ?Sized> Writable for Arc<T> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        (**self).write_with(writer)
    }
}

impl<T: Writable + ?Sized> Writable for Rc<T> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        (**self).write_with(writer)
    }
}

/// Writes the elements of an iterator as a body of value items.
pub fn write_seq<'a, W, T, I>(writer: W, len: usize, items: I) -> Result<W::Repr, W::Error>
where
    W: StructuralWriter,
    T: Writable + ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut body = writer
        .record(0)?
        .complete_header(RecordBodyKind::ArrayLike, len)?;
    for item in items {
        body = body.write_value(item)?;
    }
    body.done()
}

/// Writes the entries of an iterator as a body of slots.
pub fn write_map<'a, W, K, V, I>(writer: W, len: usize, entries: I) -> Result<W::Repr, W::Error>
where
    W: StructuralWriter,
    K: Writable + ?Sized + 'a,
    V: Writable + ?Sized + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    let mut body = writer
        .record(0)?
        .complete_header(RecordBodyKind::MapLike, len)?;
    for (key, value) in entries {
        body = body.write_slot(key, value)?;
    }
    body.done()
}

impl<T: Writable> Writable for [T] {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        write_seq(writer, self.len(), self)
    }
}

impl<T: Writable> Writable for Vec<T> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        write_seq(writer, self.len(), self)
    }
}

impl<K: Writable, V: Writable, S> Writable for HashMap<K, V, S> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        write_map(writer, self.len(), self)
    }
}

impl<K: Writable, V: Writable> Writable for BTreeMap<K, V> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        write_map(writer, self.len(), self)
    }
}

impl<K: Writable, V: Writable, S> Writable for IndexMap<K, V, S> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        write_map(writer, self.len(), self)
    }
}

impl Writable for Record {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        let mut header = writer.record(self.attrs.len())?;
        for attr in &self.attrs {
            header = header.write_attr_with(&attr.name, &attr.value)?;
        }
        let mut body = header.complete_header(RecordBodyKind::of(&self.items), self.items.len())?;
        for item in &self.items {
            body = match item {
                Item::ValueItem(value) => body.write_value(value)?,
                Item::Slot(key, value) => body.write_slot(key, value)?,
            };
        }
        body.done()
    }
}

impl Writable for Value {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        match self {
            Value::Extant => writer.write_extant(),
            Value::Text(text) => writer.write_text(text),
            Value::Number(n) => writer.write_number(n),
            Value::Boolean(b) => writer.write_bool(*b),
            Value::Blob(blob) => writer.write_blob(blob),
            Value::Record(record) => record.write_with(writer),
        }
    }
}

/// Counts the items written to a body and checks them against the
/// declaration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ItemCount {
    kind: RecordBodyKind,
    declared: usize,
    written: usize,
}

impl ItemCount {
    pub(crate) fn new(kind: RecordBodyKind, declared: usize) -> Self {
        ItemCount {
            kind,
            declared,
            written: 0,
        }
    }

    pub(crate) fn value(&mut self) {
        self.written += 1;
    }

    /// Fails if the body was declared to hold only values.
    pub(crate) fn accept_slot(&self) -> Result<(), WriteError> {
        if self.kind == RecordBodyKind::ArrayLike {
            return Err(WriteError::SlotInArrayBody);
        }
        Ok(())
    }

    pub(crate) fn slot(&mut self) -> Result<(), WriteError> {
        self.accept_slot()?;
        self.written += 1;
        Ok(())
    }

    pub(crate) fn written(&self) -> usize {
        self.written
    }

    pub(crate) fn check(&self) -> Result<(), WriteError> {
        if self.written == self.declared {
            Ok(())
        } else {
            Err(WriteError::ItemCountMismatch {
                declared: self.declared,
                written: self.written,
            })
        }
    }
}
