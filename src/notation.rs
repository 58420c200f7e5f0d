//! The Recon notation
//!
//! This module documents the notation as read by the
//! [`Tokenizer`](crate::tokenizer::Tokenizer) and written by the
//! [`Printer`](crate::writer::Printer).
//!
//! # Overview
//!
//! Recon is a record notation. Every compound value is a *record*: an
//! ordered list of attributes followed by an ordered body of items. An item
//! is either a plain value or a `key:value` slot, and keys may be any value.
//!
//! ```text
//! @event(id: 7) @priority(high) {
//!   source: sensor-12
//!   readings: {21.5, 21.7, 22.0}
//!   raw: %AQID
//! }
//! ```
//!
//! # Values
//!
//! | Kind | Syntax | Example |
//! |------|--------|---------|
//! | Extant | nothing | `{a:}` |
//! | Boolean | `true`, `false` | `true` |
//! | Integer | decimal digits with optional `-`, or `0x` hex | `-42`, `0x1F` |
//! | Float | fraction and/or exponent, `nan`, `inf`, `-inf` | `2.5e-3` |
//! | Text | identifier or quoted string | `hello`, `"hello world"` |
//! | Blob | `%` then padded standard base64 | `%AQID` |
//! | Record | attributes and/or `{...}` | `@point{x:1,y:2}` |
//!
//! ## Identifiers
//!
//! An identifier starts with a letter or `_` and continues with letters,
//! digits, `_` or `-`. The words `true`, `false`, `nan` and `inf` are not
//! text; the printer quotes text equal to one of them.
//!
//! ## Quoted strings
//!
//! Strings are delimited by `"` and support the escapes
//! `\" \\ \/ \n \r \t \b \f` and `\uXXXX`.
//!
//! ```rust
//! use recon_codec::Value;
//!
//! let value: Value = r#""tab\there""#.parse().unwrap();
//! assert_eq!(value, Value::from("tab\there"));
//! ```
//!
//! ## Numbers
//!
//! Integers read as the narrowest of 32-bit, 64-bit and big integers.
//! Numbers with a fraction or an exponent read as 64-bit floats unless they
//! carry more significant digits than a float can hold, in which case they
//! read as big decimals. Floats always print with a fraction or exponent so
//! that they read back as floats.
//!
//! ```rust
//! use recon_codec::{Number, Value};
//!
//! assert!(matches!("7".parse::<Value>().unwrap(), Value::Number(Number::Int32(7))));
//! assert!(matches!("8589934592".parse::<Value>().unwrap(), Value::Number(Number::Int64(_))));
//! assert!(matches!("0.5".parse::<Value>().unwrap(), Value::Number(Number::Float64(_))));
//! ```
//!
//! # Records
//!
//! ## Bodies
//!
//! A body is written `{...}`. Items are separated by `,` or by newlines.
//! A comma with nothing before it, or with nothing between it and the
//! closing brace, stands for an extant item:
//!
//! | Text | Items |
//! |------|-------|
//! | `{}` | none |
//! | `{1,2}` | `1`, `2` |
//! | `{1,,2}` | `1`, extant, `2` |
//! | `{1,}` | `1`, extant |
//! | `{a:}` | slot `a` to extant |
//! | `{:b}` | slot extant to `b` |
//!
//! Newlines never produce empty items. A body holding a single extant item
//! has no text form; printing one is an error.
//!
//! ## Attributes
//!
//! An attribute is `@name`, optionally followed immediately by `(...)`. The
//! name is an identifier or a quoted string. The value of an attribute is
//! derived from its parenthesised items:
//!
//! - no parentheses, or `()`: extant
//! - a single value item: that value
//! - anything else: a record of the items
//!
//! ```rust
//! use recon_codec::{Value, Record};
//!
//! let value: Value = "@a(1) @b(x:1,y:2) @c".parse().unwrap();
//! let record = value.as_record().unwrap();
//! assert_eq!(record.attrs[0].value, Value::from(1));
//! assert_eq!(record.attrs[1].value, Value::from_slots([("x", 1), ("y", 2)]));
//! assert_eq!(record.attrs[2].value, Value::Extant);
//! ```
//!
//! Attributes of one record follow each other on the same line. A record
//! with attributes need not have a body: `@flag` is a record with one
//! attribute and no items.
//!
//! # Documents
//!
//! A document is a single value surrounded by optional whitespace. The empty
//! document is extant. Text after the value is an error when reading a whole
//! document; when reading a value embedded in a longer input the rest is left
//! unread.
//!
//! # Events
//!
//! Reading produces [`ReadEvent`](crate::event::ReadEvent)s rather than a
//! tree. A record's events always end with a body, even when the text has
//! none:
//!
//! ```rust
//! use recon_codec::event::ReadEvent;
//! use recon_codec::tokenizer::tokenize;
//!
//! assert_eq!(
//!     tokenize("@flag").unwrap(),
//!     vec![
//!         ReadEvent::StartAttribute("flag".into()),
//!         ReadEvent::EndAttribute,
//!         ReadEvent::StartBody,
//!         ReadEvent::EndRecord,
//!     ]
//! );
//! ```
