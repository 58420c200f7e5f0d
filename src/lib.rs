//! # recon_codec
//!
//! An incremental reader and writer for the Recon record notation.
//!
//! ## What is Recon?
//!
//! Recon is a compact, human-readable notation in which every compound value
//! is a *record*: attributes such as `@point` followed by a body of items,
//! each a plain value or a `key:value` slot.
//!
//! ```text
//! @point(units: metric) {x: 1, y: 2.5, label: "origin"}
//! ```
//!
//! ## Key Features
//!
//! - **Resumable**: input can arrive in arbitrary chunks, split anywhere,
//!   including inside a token or a UTF-8 character
//! - **Event based**: text is turned into a flat sequence of structural
//!   events which [`Recognizer`](recognizer::Recognizer)s consume to build
//!   typed values without an intermediate tree
//! - **Writer framework**: one [`Writable`](writer::Writable) implementation
//!   prints text, builds a [`Value`] or emits events
//! - **Binary framing**: map update, remove and clear messages over a
//!   length-prefixed byte protocol
//! - **Serde Compatible**: any `#[derive(Serialize, Deserialize)]` type can go
//!   through the [`Value`] model
//!
//! ## Quick Start
//!
//! ### Reading and writing typed values
//!
//! ```rust
//! use recon_codec::{from_str, to_string};
//! use std::collections::BTreeMap;
//!
//! let mut scores = BTreeMap::new();
//! scores.insert("ada".to_string(), 12);
//! scores.insert("alan".to_string(), 9);
//!
//! let text = to_string(&scores).unwrap();
//! assert_eq!(text, "{ada:12,alan:9}");
//!
//! let back: BTreeMap<String, i32> = from_str(&text).unwrap();
//! assert_eq!(back, scores);
//! ```
//!
//! ### Working with values dynamically
//!
//! ```rust
//! use recon_codec::{parse_value, Value};
//!
//! let value = parse_value("@point{x:1,y:2}").unwrap();
//! let record = value.as_record().unwrap();
//! assert_eq!(record.tag(), Some("point"));
//! assert_eq!(record.get("y"), Some(&Value::from(2)));
//! ```
//!
//! ### Decoding incrementally
//!
//! ```rust
//! use bytes::BytesMut;
//! use recon_codec::decoder::{decoder_of, DecodeOutcome, Decoder};
//!
//! let mut decoder = decoder_of::<Vec<String>>();
//! let mut buf = BytesMut::from(&b"{alpha, be"[..]);
//! assert_eq!(decoder.decode(&mut buf).unwrap(), DecodeOutcome::Incomplete);
//! buf.extend_from_slice(b"ta}");
//! let names = decoder.decode_eof(&mut buf).unwrap().complete().unwrap();
//! assert_eq!(names, ["alpha", "beta"]);
//! ```
//!
//! ### Building values with the recon! macro
//!
//! ```rust
//! use recon_codec::recon;
//!
//! let value = recon!({ "name": "Ada", "langs": ["en", "fr"] });
//! assert_eq!(value.to_string(), "{name:Ada,langs:{en,fr}}");
//! ```
//!
//! ## Module Guide
//!
//! - [`input`] and [`parser`]: the cursor over chunked input and the
//!   resumable parser combinators built on it
//! - [`tokenizer`] and [`event`]: text to structural events
//! - [`recognizer`] and [`builder`]: events to typed values and to [`Value`]
//! - [`writer`]: typed values to text, [`Value`] or events
//! - [`registry`]: writers and recognizers looked up by runtime type
//! - [`decoder`] and [`framing`]: byte-buffer decoders and the map message
//!   protocol
//! - [`ser`] and [`de`]: the serde bridge
//! - [`notation`]: a description of the grammar
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - Reading and writing typed values
//! - **`macro.rs`** - Building values with the recon! macro
//! - **`dynamic_values.rs`** - Working with `Value` and the type registry
//! - **`custom_options.rs`** - Separators and nesting limits
//! - **`map_messages.rs`** - Framing map messages over a byte stream
//!
//! Run any example with: `cargo run --example <name>`

pub mod builder;
pub mod de;
pub mod decoder;
pub mod error;
pub mod event;
pub mod framing;
pub mod input;
pub mod macros;
pub mod notation;
pub mod options;
pub mod parser;
pub mod recognizer;
pub mod registry;
pub mod ser;
pub mod tokenizer;
pub mod value;
pub mod writer;

pub use de::{from_str_serde, from_value};
pub use error::{Error, Result};
pub use options::{ReconOptions, Separator};
pub use ser::{to_string_serde, to_value};
pub use value::{Attr, Item, Number, Record, Value};
pub use writer::{write_events, write_value};

use bytes::BytesMut;
use decoder::{DecodeOutcome, Decoder, ReconDecoder};
use recognizer::Recognizable;
use std::io;
use writer::Writable;

const READ_CHUNK: usize = 8 * 1024;

/// Parses a document into a [`Value`].
///
/// # Examples
///
/// ```rust
/// use recon_codec::{parse_value, Value};
///
/// assert_eq!(parse_value("").unwrap(), Value::Extant);
/// assert_eq!(parse_value("{1,2}").unwrap(), Value::from_items([1, 2]));
/// assert!(parse_value("{1,2").is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::Syntax`] with the location of the problem if the input
/// is not valid Recon.
pub fn parse_value(input: &str) -> Result<Value> {
    from_str(input)
}

/// Parses a document into a [`Value`] with custom options.
pub fn parse_value_with_options(input: &str, options: &ReconOptions) -> Result<Value> {
    from_str_with_options(input, options)
}

/// Reads a `T` from a whole Recon document.
///
/// # Examples
///
/// ```rust
/// use recon_codec::from_str;
///
/// let names: Vec<String> = from_str("{ada, \"alan turing\"}").unwrap();
/// assert_eq!(names, ["ada", "alan turing"]);
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid Recon or does not describe a
/// `T`. Syntax errors carry a line and column.
pub fn from_str<T: Recognizable>(input: &str) -> Result<T> {
    from_slice(input.as_bytes())
}

/// Reads a `T` from a whole Recon document with custom options.
pub fn from_str_with_options<T: Recognizable>(input: &str, options: &ReconOptions) -> Result<T> {
    from_slice_with_options(input.as_bytes(), options)
}

/// Reads a `T` from UTF-8 bytes of Recon text.
///
/// # Examples
///
/// ```rust
/// use recon_codec::from_slice;
///
/// let flags: Vec<bool> = from_slice(b"{true,false}").unwrap();
/// assert_eq!(flags, vec![true, false]);
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not valid Recon, or do
/// not describe a `T`.
pub fn from_slice<T: Recognizable>(input: &[u8]) -> Result<T> {
    from_slice_with_options(input, &ReconOptions::default())
}

fn from_slice_with_options<T: Recognizable>(input: &[u8], options: &ReconOptions) -> Result<T> {
    let mut decoder = ReconDecoder::with_options(T::make_recognizer(), options);
    match decoder.decode_slice(input, true)? {
        (DecodeOutcome::Complete(value), _) => Ok(value),
        (DecodeOutcome::Incomplete, _) => Err(error::ReadError::IncompleteRecord.into()),
    }
}

/// Reads a `T` from an I/O stream of Recon text, decoding as it reads.
///
/// # Examples
///
/// ```rust
/// use recon_codec::from_reader;
/// use std::io::Cursor;
///
/// let numbers: Vec<i64> = from_reader(Cursor::new(b"{1, 2, 3}")).unwrap();
/// assert_eq!(numbers, vec![1, 2, 3]);
/// ```
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, and the errors of [`from_str`]
/// otherwise.
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: Recognizable,
{
    let mut decoder = decoder::decoder_of::<T>();
    let mut buf = BytesMut::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(&e.to_string())),
        };
        if n == 0 {
            return match decoder.decode_eof(&mut buf)? {
                DecodeOutcome::Complete(value) => Ok(value),
                DecodeOutcome::Incomplete => Err(error::ReadError::IncompleteRecord.into()),
            };
        }
        buf.extend_from_slice(&chunk[..n]);
        if let DecodeOutcome::Complete(value) = decoder.decode(&mut buf)? {
            return Ok(value);
        }
    }
}

/// Prints any `T: Writable` as canonical Recon text.
///
/// # Examples
///
/// ```rust
/// use recon_codec::to_string;
///
/// assert_eq!(to_string(&vec![Some("a b"), None]).unwrap(), "{\"a b\",}");
/// ```
///
/// # Errors
///
/// Returns [`Error::Encode`] if the value's writer breaks an invariant, such
/// as writing a different number of items than it declared.
pub fn to_string<T: Writable + ?Sized>(value: &T) -> Result<String> {
    Ok(writer::print(value)?)
}

/// Prints any `T: Writable` with custom options.
///
/// # Examples
///
/// ```rust
/// use recon_codec::{to_string_with_options, ReconOptions, Separator};
///
/// let options = ReconOptions::new().with_separator(Separator::Newline);
/// assert_eq!(to_string_with_options(&vec![1, 2], &options).unwrap(), "{1\n2}");
/// ```
pub fn to_string_with_options<T: Writable + ?Sized>(
    value: &T,
    options: &ReconOptions,
) -> Result<String> {
    Ok(writer::print_with_options(value, options)?)
}

/// Prints any `T: Writable` to an I/O stream.
///
/// # Errors
///
/// Returns an error if printing fails or writing to the stream fails.
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: Writable + ?Sized,
{
    to_writer_with_options(writer, value, &ReconOptions::default())
}

/// Prints any `T: Writable` to an I/O stream with custom options.
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: &ReconOptions) -> Result<()>
where
    W: io::Write,
    T: Writable + ?Sized,
{
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_round_trip_std_types() {
        let numbers = vec![1, -2, 3];
        let text = to_string(&numbers).unwrap();
        assert_eq!(text, "{1,-2,3}");
        assert_eq!(from_str::<Vec<i32>>(&text).unwrap(), numbers);

        let mut map = HashMap::new();
        map.insert("k".to_string(), Some(2.5));
        let text = to_string(&map).unwrap();
        assert_eq!(from_str::<HashMap<String, Option<f64>>>(&text).unwrap(), map);
    }

    #[test]
    fn test_to_writer() {
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &Value::from_slots([("a", 1)])).unwrap();
        assert_eq!(buffer, b"{a:1}");
    }

    #[test]
    fn test_from_reader_small_reads() {
        struct Trickle<'a>(&'a [u8]);

        impl io::Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                match self.0.split_first() {
                    Some((byte, rest)) if !buf.is_empty() => {
                        buf[0] = *byte;
                        self.0 = rest;
                        Ok(1)
                    }
                    _ => Ok(0),
                }
            }
        }

        let value: Value = from_reader(Trickle("@tag(\"é\"){%AQID, 1e3}".as_bytes())).unwrap();
        assert_eq!(value.to_string(), "@tag(é){%AQID,1000.0}");
    }

    #[test]
    fn test_syntax_error_location() {
        let err = parse_value("{\n  1,\n  @}").unwrap_err();
        let location = err.location().unwrap();
        assert_eq!(location.line, 3);
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(from_slice::<String>(&[b'"', 0xff, b'"']).is_err());
    }
}
