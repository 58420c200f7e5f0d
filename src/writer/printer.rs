//! Printing Recon text.
//!
//! The printer writes the canonical form: no whitespace, commas between
//! items (or newlines when configured), bare identifiers wherever the text
//! allows one and `%`-prefixed base64 for blobs.
//!
//! Attribute values print in the attribute's parentheses. A record without
//! attributes spreads its items directly into them, except when that would
//! read back differently: an empty record prints as `@a({})` and a record
//! holding a single value item as `@a({v})`. An `Extant` attribute value
//! prints no parentheses at all.

use super::{
    BodyWriter, HeaderWriter, ItemCount, Position, PrimitiveWriter, RecordBodyKind,
    StructuralWriter, Writable,
};
use crate::error::WriteError;
use crate::options::{ReconOptions, Separator};
use crate::tokenizer::{is_identifier, is_keyword};
use crate::value::Number;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// Prints a value with the default options.
///
/// ```rust
/// use recon_codec::writer::print;
/// use recon_codec::Value;
///
/// let value: Value = "@tag(\"a b\") {x: 1, \"y z\": %AAA=}".parse().unwrap();
/// assert_eq!(print(&value).unwrap(), "@tag(\"a b\"){x:1,\"y z\":%AAA=}");
/// ```
pub fn print<T: Writable + ?Sized>(value: &T) -> Result<String, WriteError> {
    print_with_options(value, &ReconOptions::default())
}

pub fn print_with_options<T: Writable + ?Sized>(
    value: &T,
    options: &ReconOptions,
) -> Result<String, WriteError> {
    let mut out = String::with_capacity(64);
    value.write_with(Printer::new(&mut out, options))?;
    Ok(out)
}

/// Appends `text` as an identifier when it is one, and quoted otherwise.
pub(crate) fn push_text(out: &mut String, text: &str) {
    if is_identifier(text) && !is_keyword(text) {
        out.push_str(text);
        return;
    }
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// A [`StructuralWriter`] appending Recon text to a `String`.
pub struct Printer<'a> {
    out: &'a mut String,
    options: &'a ReconOptions,
    position: Position,
}

impl<'a> Printer<'a> {
    pub fn new(out: &'a mut String, options: &'a ReconOptions) -> Self {
        Printer {
            out,
            options,
            position: Position::TopLevel,
        }
    }

    fn push_number(self, number: Number) -> Result<(), WriteError> {
        self.out.push_str(&number.to_string());
        Ok(())
    }
}

impl PrimitiveWriter for Printer<'_> {
    type Repr = ();
    type Error = WriteError;

    fn write_extant(self) -> Result<(), WriteError> {
        Ok(())
    }

    fn write_i32(self, value: i32) -> Result<(), WriteError> {
        self.out.push_str(&value.to_string());
        Ok(())
    }

    fn write_i64(self, value: i64) -> Result<(), WriteError> {
        self.out.push_str(&value.to_string());
        Ok(())
    }

    fn write_f32(self, value: f32) -> Result<(), WriteError> {
        self.push_number(Number::Float32(value))
    }

    fn write_f64(self, value: f64) -> Result<(), WriteError> {
        self.push_number(Number::Float64(value))
    }

    fn write_bool(self, value: bool) -> Result<(), WriteError> {
        self.out.push_str(if value { "true" } else { "false" });
        Ok(())
    }

    fn write_big_int(self, value: &BigInt) -> Result<(), WriteError> {
        self.out.push_str(&value.to_string());
        Ok(())
    }

    fn write_big_decimal(self, value: &BigDecimal) -> Result<(), WriteError> {
        self.push_number(Number::BigDecimal(value.clone()))
    }

    fn write_text(self, value: &str) -> Result<(), WriteError> {
        push_text(self.out, value);
        Ok(())
    }

    fn write_blob(self, value: &[u8]) -> Result<(), WriteError> {
        self.out.push('%');
        self.out.push_str(&STANDARD.encode(value));
        Ok(())
    }
}

impl<'a> StructuralWriter for Printer<'a> {
    type Header = HeaderPrinter<'a>;

    fn record(self, _num_attrs: usize) -> Result<HeaderPrinter<'a>, WriteError> {
        Ok(HeaderPrinter {
            printer: self,
            attrs: 0,
        })
    }
}

/// Prints the attributes of a record.
pub struct HeaderPrinter<'a> {
    printer: Printer<'a>,
    attrs: usize,
}

impl<'a> HeaderWriter for HeaderPrinter<'a> {
    type Repr = ();
    type Error = WriteError;
    type Body = BodyPrinter<'a>;

    fn write_attr_with<V: Writable + ?Sized>(
        mut self,
        name: &str,
        value: &V,
    ) -> Result<Self, WriteError> {
        let out = &mut *self.printer.out;
        out.push('@');
        push_text(out, name);
        let mut inner = String::new();
        value.write_with(Printer {
            out: &mut inner,
            options: self.printer.options,
            position: Position::AttrValue,
        })?;
        if !inner.is_empty() {
            out.push('(');
            out.push_str(&inner);
            out.push(')');
        }
        self.attrs += 1;
        Ok(self)
    }

    fn complete_header(
        self,
        kind: RecordBodyKind,
        num_items: usize,
    ) -> Result<BodyPrinter<'a>, WriteError> {
        let Printer {
            out,
            options,
            position,
        } = self.printer;
        let style = if self.attrs > 0 {
            if num_items == 0 {
                Style::Omitted
            } else {
                Style::Braced
            }
        } else if position == Position::AttrValue {
            match num_items {
                0 => Style::Braced,
                1 => Style::Deferred,
                _ => Style::Bare,
            }
        } else {
            Style::Braced
        };
        if style == Style::Braced {
            out.push('{');
        }
        Ok(BodyPrinter {
            out,
            options,
            style,
            count: ItemCount::new(kind, num_items),
            prev_empty: false,
            only_slot: false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Braced,
    /// Items spread into an attribute's parentheses.
    Bare,
    /// A single item in an attribute: braced if a value, bare if a slot.
    Deferred,
    /// A record with attributes and no items.
    Omitted,
}

/// Prints the items of a record.
pub struct BodyPrinter<'a> {
    out: &'a mut String,
    options: &'a ReconOptions,
    style: Style,
    count: ItemCount,
    prev_empty: bool,
    only_slot: bool,
}

impl<'a> BodyPrinter<'a> {
    fn item(&mut self) -> Printer<'_> {
        Printer {
            out: &mut *self.out,
            options: self.options,
            position: Position::Item,
        }
    }

    /// Writes the separator, returning its offset and the start of the item.
    fn begin_item(&mut self, slot: bool) -> (Option<usize>, usize) {
        if self.style == Style::Deferred {
            if slot {
                self.style = Style::Bare;
                self.only_slot = true;
            } else {
                self.style = Style::Braced;
                self.out.push('{');
            }
        }
        let separator = if self.count.written() > 0 {
            let at = self.out.len();
            self.out.push_str(self.options.separator.as_str());
            Some(at)
        } else {
            None
        };
        (separator, self.out.len())
    }

    /// An empty item next to a newline would be lost on reading, so the
    /// separators around empty items are always commas.
    fn end_item(&mut self, separator: Option<usize>, start: usize) {
        let empty = self.out.len() == start;
        if let Some(at) = separator {
            if (empty || self.prev_empty) && self.options.separator != Separator::Comma {
                self.out.replace_range(at..at + 1, ",");
            }
        }
        self.prev_empty = empty;
    }
}

impl BodyWriter for BodyPrinter<'_> {
    type Repr = ();
    type Error = WriteError;

    fn write_value<V: Writable + ?Sized>(mut self, value: &V) -> Result<Self, WriteError> {
        let (separator, start) = self.begin_item(false);
        value.write_with(self.item())?;
        self.end_item(separator, start);
        self.count.value();
        Ok(self)
    }

    fn write_slot<K, V>(mut self, key: &K, value: &V) -> Result<Self, WriteError>
    where
        K: Writable + ?Sized,
        V: Writable + ?Sized,
    {
        self.count.accept_slot()?;
        let (separator, start) = self.begin_item(true);
        key.write_with(self.item())?;
        self.out.push(':');
        value.write_with(self.item())?;
        self.end_item(separator, start);
        self.count.slot()?;
        Ok(self)
    }

    fn done(self) -> Result<(), WriteError> {
        self.count.check()?;
        if self.count.written() == 1 && self.prev_empty && !self.only_slot {
            return Err(WriteError::Message(
                "a body holding a single extant item has no text form".to_string(),
            ));
        }
        if self.style == Style::Braced {
            self.out.push('}');
        }
        Ok(())
    }
}
