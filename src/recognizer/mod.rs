//! Recognizers: typed decoding from structural events.
//!
//! A [`Recognizer`] consumes [`ReadEvent`]s one at a time and eventually
//! produces a value of its target type or fails. Types that can be decoded
//! this way implement [`Recognizable`], which hands out a fresh recognizer.
//!
//! Recognizers are reusable: after producing a value or an error, calling
//! [`Recognizer::reset`] returns one to the state it was created in, so a
//! single instance can decode a stream of independent messages.
//!
//! ## Provided recognizers
//!
//! - integers, floats, `bool`, `String`, `BigInt`, `BigDecimal`, [`Bytes`]
//!   (blobs) and `()` (extant)
//! - `Option<T>` (`Extant` is `None`), `Vec<T>`, `HashMap`, `BTreeMap` and
//!   `IndexMap` via [`collections`]
//! - [`Value`](crate::Value) via [`ValueBuilder`](crate::builder::ValueBuilder)
//! - compound records via [`compound::RecordRecognizer`]
//!
//! Integer recognizers narrow numbers with a checked conversion: reading
//! `4294967296` as an `i32` fails with
//! [`ReadError::NumberOutOfRange`].
//!
//! ## Examples
//!
//! ```rust
//! use recon_codec::event::ReadEvent;
//! use recon_codec::recognizer::{Recognizable, Recognizer};
//! use recon_codec::Number;
//!
//! let mut recognizer = <i32 as Recognizable>::make_recognizer();
//! let result = recognizer.feed_event(ReadEvent::Number(Number::Int64(7)));
//! assert_eq!(result, Some(Ok(7)));
//!
//! let result = recognizer.feed_event(ReadEvent::Number(Number::Int64(1 << 40)));
//! assert!(matches!(result, Some(Err(_))));
//! ```

pub mod collections;
pub mod compound;

pub use collections::{MapRecognizer, SeqRecognizer};
pub use compound::{Field, FieldKey, ItemKey, RecordFields, RecordRecognizer};

use crate::error::ReadError;
use crate::event::ReadEvent;
use crate::value::Number;
use bigdecimal::BigDecimal;
use bytes::Bytes;
use num_bigint::BigInt;

/// Incremental decoder of one value from a stream of events.
pub trait Recognizer {
    type Target;

    /// Feeds one event. Returns `None` while more events are needed.
    ///
    /// After `Some(..)` has been returned the recognizer must be reset before
    /// it is fed again.
    fn feed_event(&mut self, event: ReadEvent) -> Option<Result<Self::Target, ReadError>>;

    /// Returns the recognizer to its pristine state.
    fn reset(&mut self);
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    type Target = R::Target;

    fn feed_event(&mut self, event: ReadEvent) -> Option<Result<Self::Target, ReadError>> {
        (**self).feed_event(event)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Types with a canonical recognizer.
pub trait Recognizable: Sized {
    type Rec: Recognizer<Target = Self>;

    fn make_recognizer() -> Self::Rec;
}

/// Recognizer for values carried by a single event.
pub struct SimpleRecognizer<T> {
    convert: fn(ReadEvent) -> Result<T, ReadError>,
}

impl<T> SimpleRecognizer<T> {
    pub const fn new(convert: fn(ReadEvent) -> Result<T, ReadError>) -> Self {
        SimpleRecognizer { convert }
    }
}

impl<T> Clone for SimpleRecognizer<T> {
    fn clone(&self) -> Self {
        SimpleRecognizer {
            convert: self.convert,
        }
    }
}

impl<T> Recognizer for SimpleRecognizer<T> {
    type Target = T;

    fn feed_event(&mut self, event: ReadEvent) -> Option<Result<T, ReadError>> {
        Some((self.convert)(event))
    }

    fn reset(&mut self) {}
}

fn expect_number(event: ReadEvent, expected: &'static str) -> Result<Number, ReadError> {
    match event {
        ReadEvent::Number(n) => Ok(n),
        other => Err(ReadError::unexpected(expected, other)),
    }
}

macro_rules! integer_recognizable {
    ($($t:ty => $narrow:expr),* $(,)?) => {
        $(
            impl Recognizable for $t {
                type Rec = SimpleRecognizer<$t>;

                fn make_recognizer() -> Self::Rec {
                    SimpleRecognizer::new(|event| {
                        let n = expect_number(event, "an integer")?;
                        if !n.is_integral() {
                            return Err(ReadError::unexpected("an integer", ReadEvent::Number(n)));
                        }
                        let narrow: fn(&Number) -> Option<$t> = $narrow;
                        narrow(&n).ok_or_else(|| ReadError::out_of_range(&n, stringify!($t)))
                    })
                }
            }
        )*
    };
}

integer_recognizable!(
    i8 => |n| n.to_i64().and_then(|v| i8::try_from(v).ok()),
    i16 => |n| n.to_i64().and_then(|v| i16::try_from(v).ok()),
    i32 => Number::to_i32,
    i64 => Number::to_i64,
    u8 => |n| n.to_u64().and_then(|v| u8::try_from(v).ok()),
    u16 => |n| n.to_u64().and_then(|v| u16::try_from(v).ok()),
    u32 => Number::to_u32,
    u64 => Number::to_u64,
    usize => |n| n.to_u64().and_then(|v| usize::try_from(v).ok()),
);

impl Recognizable for f64 {
    type Rec = SimpleRecognizer<f64>;

    fn make_recognizer() -> Self::Rec {
        SimpleRecognizer::new(|event| expect_number(event, "a number").map(|n| n.to_f64()))
    }
}

impl Recognizable for f32 {
    type Rec = SimpleRecognizer<f32>;

    fn make_recognizer() -> Self::Rec {
        SimpleRecognizer::new(|event| {
            let n = expect_number(event, "a number")?;
            let wide = n.to_f64();
            if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
                return Err(ReadError::out_of_range(&n, "f32"));
            }
            Ok(n.to_f32())
        })
    }
}

impl Recognizable for BigInt {
    type Rec = SimpleRecognizer<BigInt>;

    fn make_recognizer() -> Self::Rec {
        SimpleRecognizer::new(|event| {
            let n = expect_number(event, "an integer")?;
            n.to_big_int()
                .ok_or_else(|| ReadError::unexpected("an integer", ReadEvent::Number(n)))
        })
    }
}

impl Recognizable for BigDecimal {
    type Rec = SimpleRecognizer<BigDecimal>;

    fn make_recognizer() -> Self::Rec {
        SimpleRecognizer::new(|event| {
            let n = expect_number(event, "a decimal")?;
            n.to_big_decimal()
                .ok_or_else(|| ReadError::out_of_range(&n, "BigDecimal"))
        })
    }
}

impl Recognizable for bool {
    type Rec = SimpleRecognizer<bool>;

    fn make_recognizer() -> Self::Rec {
        SimpleRecognizer::new(|event| match event {
            ReadEvent::Boolean(b) => Ok(b),
            other => Err(ReadError::unexpected("a boolean", other)),
        })
    }
}

impl Recognizable for String {
    type Rec = SimpleRecognizer<String>;

    fn make_recognizer() -> Self::Rec {
        SimpleRecognizer::new(|event| match event {
            ReadEvent::Text(text) => Ok(text),
            other => Err(ReadError::unexpected("text", other)),
        })
    }
}

impl Recognizable for Bytes {
    type Rec = SimpleRecognizer<Bytes>;

    fn make_recognizer() -> Self::Rec {
        SimpleRecognizer::new(|event| match event {
            ReadEvent::Blob(bytes) => Ok(Bytes::from(bytes)),
            other => Err(ReadError::unexpected("a blob", other)),
        })
    }
}

impl Recognizable for () {
    type Rec = SimpleRecognizer<()>;

    fn make_recognizer() -> Self::Rec {
        SimpleRecognizer::new(|event| match event {
            ReadEvent::Extant => Ok(()),
            other => Err(ReadError::unexpected("extant", other)),
        })
    }
}

/// Recognizes `Option<T>`: a leading `Extant` is `None`.
#[derive(Debug, Clone)]
pub struct OptionRecognizer<R> {
    inner: R,
    started: bool,
}

impl<R: Recognizer> OptionRecognizer<R> {
    pub fn new(inner: R) -> Self {
        OptionRecognizer {
            inner,
            started: false,
        }
    }
}

impl<R: Recognizer> Recognizer for OptionRecognizer<R> {
    type Target = Option<R::Target>;

    fn feed_event(&mut self, event: ReadEvent) -> Option<Result<Self::Target, ReadError>> {
        if !self.started && event == ReadEvent::Extant {
            return Some(Ok(None));
        }
        self.started = true;
        self.inner.feed_event(event).map(|result| result.map(Some))
    }

    fn reset(&mut self) {
        self.started = false;
        self.inner.reset();
    }
}

impl<T: Recognizable> Recognizable for Option<T> {
    type Rec = OptionRecognizer<T::Rec>;

    fn make_recognizer() -> Self::Rec {
        OptionRecognizer::new(T::make_recognizer())
    }
}

/// Rejects an absent (`Extant`) value even when the inner recognizer would
/// accept one.
///
/// ```rust
/// use recon_codec::event::ReadEvent;
/// use recon_codec::recognizer::{Recognizable, Recognizer, Required};
/// use recon_codec::Value;
///
/// let mut recognizer = Required::new(Value::make_recognizer());
/// assert!(matches!(recognizer.feed_event(ReadEvent::Extant), Some(Err(_))));
/// ```
#[derive(Debug, Clone)]
pub struct Required<R> {
    inner: R,
    started: bool,
}

impl<R: Recognizer> Required<R> {
    pub fn new(inner: R) -> Self {
        Required {
            inner,
            started: false,
        }
    }
}

impl<R: Recognizer> Recognizer for Required<R> {
    type Target = R::Target;

    fn feed_event(&mut self, event: ReadEvent) -> Option<Result<R::Target, ReadError>> {
        if !self.started && event == ReadEvent::Extant {
            return Some(Err(ReadError::unexpected("a value", "extant")));
        }
        self.started = true;
        self.inner.feed_event(event)
    }

    fn reset(&mut self) {
        self.started = false;
        self.inner.reset();
    }
}

/// Feeds a sequence of events to a recognizer, returning its result.
///
/// Fails with [`ReadError::IncompleteRecord`] if the events run out first.
pub fn recognize_events<R, I>(recognizer: &mut R, events: I) -> Result<R::Target, ReadError>
where
    R: Recognizer,
    I: IntoIterator<Item = ReadEvent>,
{
    for event in events {
        if let Some(result) = recognizer.feed_event(event) {
            return result;
        }
    }
    Err(ReadError::IncompleteRecord)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognize<T: Recognizable>(events: Vec<ReadEvent>) -> Result<T, ReadError> {
        recognize_events(&mut T::make_recognizer(), events)
    }

    #[test]
    fn test_checked_narrowing() {
        let big = ReadEvent::Number(Number::Int64(4_294_967_296));
        assert!(matches!(
            recognize::<i32>(vec![big.clone()]),
            Err(ReadError::NumberOutOfRange { target: "i32", .. })
        ));
        assert_eq!(recognize::<i64>(vec![big]).unwrap(), 4_294_967_296);
        assert!(recognize::<u8>(vec![ReadEvent::from(256)]).is_err());
        assert!(recognize::<u32>(vec![ReadEvent::from(-1)]).is_err());
        assert_eq!(recognize::<u16>(vec![ReadEvent::from(65535)]).unwrap(), 65535);
    }

    #[test]
    fn test_integers_reject_floats() {
        let result = recognize::<i64>(vec![ReadEvent::Number(Number::Float64(1.0))]);
        assert!(matches!(result, Err(ReadError::UnexpectedEvent { .. })));
    }

    #[test]
    fn test_floats_accept_any_number() {
        assert_eq!(recognize::<f64>(vec![ReadEvent::from(3)]).unwrap(), 3.0);
        assert_eq!(
            recognize::<f32>(vec![ReadEvent::Number(Number::Float64(0.5))]).unwrap(),
            0.5
        );
    }

    #[test]
    fn test_f32_narrowing_is_checked() {
        let huge = ReadEvent::Number(Number::Float64(1e300));
        assert!(matches!(
            recognize::<f32>(vec![huge]),
            Err(ReadError::NumberOutOfRange { target: "f32", .. })
        ));
        let max = ReadEvent::Number(Number::Float64(f64::from(f32::MAX)));
        assert_eq!(recognize::<f32>(vec![max]).unwrap(), f32::MAX);
        let inf = ReadEvent::Number(Number::Float64(f64::NEG_INFINITY));
        assert_eq!(recognize::<f32>(vec![inf]).unwrap(), f32::NEG_INFINITY);
    }

    #[test]
    fn test_text_bool_blob_extant() {
        assert_eq!(recognize::<String>(vec![ReadEvent::from("hi")]).unwrap(), "hi");
        assert!(recognize::<String>(vec![ReadEvent::from(1)]).is_err());
        assert!(recognize::<bool>(vec![ReadEvent::from(true)]).unwrap());
        assert_eq!(
            recognize::<Bytes>(vec![ReadEvent::Blob(vec![1, 2])]).unwrap(),
            Bytes::from_static(&[1, 2])
        );
        recognize::<()>(vec![ReadEvent::Extant]).unwrap();
    }

    #[test]
    fn test_option() {
        assert_eq!(recognize::<Option<i32>>(vec![ReadEvent::Extant]).unwrap(), None);
        assert_eq!(recognize::<Option<i32>>(vec![ReadEvent::from(4)]).unwrap(), Some(4));
    }

    #[test]
    fn test_reset_restores_option_state() {
        let mut recognizer = <Option<Vec<i32>>>::make_recognizer();
        assert!(recognizer.feed_event(ReadEvent::StartBody).is_none());
        recognizer.reset();
        assert_eq!(recognizer.feed_event(ReadEvent::Extant), Some(Ok(None)));
    }

    #[test]
    fn test_incomplete_events() {
        let result = recognize::<Vec<i32>>(vec![ReadEvent::StartBody, ReadEvent::from(1)]);
        assert_eq!(result, Err(ReadError::IncompleteRecord));
    }
}
