//! Dynamic value representation for Recon data.
//!
//! This module provides the [`Value`] tree which represents any fully decoded
//! Recon document.
//!
//! ## Core Types
//!
//! - [`Value`]: extant, text, number, boolean, blob or record
//! - [`Record`]: an ordered sequence of attributes followed by an ordered
//!   sequence of items
//! - [`Attr`]: a named attribute (`@name(value)`)
//! - [`Item`]: a plain value item or a `key:value` slot
//! - [`Number`]: a number that keeps the width it was read or written with
//!
//! A record exclusively owns its attributes and items, so a value is always a
//! tree.
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use recon_codec::{Record, Value};
//!
//! let extant = Value::Extant;
//! let number = Value::from(42);
//! let text = Value::from("hello");
//!
//! let point = Value::Record(
//!     Record::new()
//!         .with_attr("point", Value::Extant)
//!         .with_slot("x", 1)
//!         .with_slot("y", 2),
//! );
//! assert_eq!(point.to_string(), "@point{x:1,y:2}");
//! ```
//!
//! ### Extracting Values
//!
//! ```rust
//! use recon_codec::Value;
//! use std::convert::TryFrom;
//!
//! let value = Value::from(42);
//! let num: i64 = i64::try_from(value).unwrap();
//! assert_eq!(num, 42);
//! ```

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::fmt;
use std::str::FromStr;

/// A dynamically-typed representation of any valid Recon value.
///
/// # Examples
///
/// ```rust
/// use recon_codec::{Number, Value};
///
/// let num = Value::Number(Number::Int32(42));
/// let text = Value::Text("hello".to_string());
///
/// assert!(Value::Extant.is_extant());
/// assert!(num.is_number());
/// assert!(text.is_text());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Extant,
    Text(String),
    Number(Number),
    Boolean(bool),
    Blob(Vec<u8>),
    Record(Record),
}

/// A record: attributes followed by items.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Record {
    pub attrs: Vec<Attr>,
    pub items: Vec<Item>,
}

/// A named attribute of a record.
#[derive(Clone, Debug, PartialEq)]
pub struct Attr {
    pub name: String,
    pub value: Value,
}

/// An item in the body of a record.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    ValueItem(Value),
    Slot(Value, Value),
}

/// A numeric value that retains the width it was produced with.
///
/// Equality is numeric rather than structural: `Int32(1) == Int64(1)`, and a
/// `Float32` equals any number that rounds to the same `f32`.
///
/// # Examples
///
/// ```rust
/// use recon_codec::Number;
///
/// let n = Number::Int64(7);
/// assert_eq!(n.to_i32(), Some(7));
/// assert_eq!(Number::Int64(1 << 40).to_i32(), None);
/// assert_eq!(Number::Int32(7), Number::Int64(7));
/// ```
#[derive(Clone, Debug)]
pub enum Number {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    BigInt(BigInt),
    BigDecimal(BigDecimal),
}

impl Number {
    /// The name of this number's width, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Number::Int32(_) => "int32",
            Number::Int64(_) => "int64",
            Number::Float32(_) => "float32",
            Number::Float64(_) => "float64",
            Number::BigInt(_) => "big integer",
            Number::BigDecimal(_) => "big decimal",
        }
    }

    /// Returns `true` for integer widths.
    #[inline]
    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(self, Number::Int32(_) | Number::Int64(_) | Number::BigInt(_))
    }

    /// Narrows to an `i32` if this is an integer within range.
    #[must_use]
    pub fn to_i32(&self) -> Option<i32> {
        match self {
            Number::Int32(n) => Some(*n),
            Number::Int64(n) => i32::try_from(*n).ok(),
            Number::BigInt(n) => n.to_i32(),
            _ => None,
        }
    }

    /// Narrows to an `i64` if this is an integer within range.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Number::Int32(n) => Some(i64::from(*n)),
            Number::Int64(n) => Some(*n),
            Number::BigInt(n) => n.to_i64(),
            _ => None,
        }
    }

    /// Narrows to a `u32` if this is a non-negative integer within range.
    #[must_use]
    pub fn to_u32(&self) -> Option<u32> {
        self.to_i64().and_then(|n| u32::try_from(n).ok()).or_else(|| match self {
            Number::BigInt(n) => n.to_u32(),
            _ => None,
        })
    }

    /// Narrows to a `u64` if this is a non-negative integer within range.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        match self {
            Number::Int32(n) => u64::try_from(*n).ok(),
            Number::Int64(n) => u64::try_from(*n).ok(),
            Number::BigInt(n) => n.to_u64(),
            _ => None,
        }
    }

    /// Converts to an `f64`, losing precision where necessary.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Int32(n) => f64::from(*n),
            Number::Int64(n) => *n as f64,
            Number::Float32(n) => f64::from(*n),
            Number::Float64(n) => *n,
            Number::BigInt(n) => n.to_f64().unwrap_or(f64::NAN),
            Number::BigDecimal(n) => n.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Converts to an `f32`, losing precision where necessary.
    #[must_use]
    pub fn to_f32(&self) -> f32 {
        match self {
            Number::Float32(n) => *n,
            other => other.to_f64() as f32,
        }
    }

    /// The exact integer value, for integer widths.
    #[must_use]
    pub fn to_big_int(&self) -> Option<BigInt> {
        match self {
            Number::Int32(n) => Some(BigInt::from(*n)),
            Number::Int64(n) => Some(BigInt::from(*n)),
            Number::BigInt(n) => Some(n.clone()),
            _ => None,
        }
    }

    /// The exact decimal value; floats convert through their shortest
    /// round-tripping representation. Non-finite floats have none.
    #[must_use]
    pub fn to_big_decimal(&self) -> Option<BigDecimal> {
        match self {
            Number::Int32(n) => Some(BigDecimal::from(i64::from(*n))),
            Number::Int64(n) => Some(BigDecimal::from(*n)),
            Number::BigInt(n) => Some(BigDecimal::new(n.clone(), 0)),
            Number::Float32(n) if n.is_finite() => BigDecimal::from_str(&format!("{:?}", n)).ok(),
            Number::Float64(n) if n.is_finite() => BigDecimal::from_str(&format!("{:?}", n)).ok(),
            Number::BigDecimal(n) => Some(n.clone()),
            _ => None,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int32(a), Number::Int32(b)) => a == b,
            (Number::Int64(a), Number::Int64(b)) => a == b,
            (Number::Float64(a), Number::Float64(b)) => a == b,
            (Number::Float32(a), b) | (b, Number::Float32(a)) => b.to_f32() == *a,
            (a, b) if a.is_integral() && b.is_integral() => {
                match (a.to_i64(), b.to_i64()) {
                    (Some(x), Some(y)) => x == y,
                    _ => a.to_big_int() == b.to_big_int(),
                }
            }
            (Number::BigDecimal(_), _) | (_, Number::BigDecimal(_)) => {
                match (self.to_big_decimal(), other.to_big_decimal()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (a, b) => a.to_f64() == b.to_f64(),
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64, debug: impl fmt::Debug) -> fmt::Result {
    if value.is_nan() {
        f.write_str("nan")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "inf" } else { "-inf" })
    } else {
        // Debug keeps a fraction or exponent, so the text re-parses as a float.
        write!(f, "{:?}", debug)
    }
}

fn write_big_decimal(f: &mut fmt::Formatter<'_>, value: &BigDecimal) -> fmt::Result {
    let (digits, scale) = value.as_bigint_and_exponent();
    let negative = digits.sign() == num_bigint::Sign::Minus;
    let magnitude = digits.magnitude().to_string();
    if negative {
        f.write_str("-")?;
    }
    if scale <= 0 {
        f.write_str(&magnitude)?;
        for _ in 0..(-scale) {
            f.write_str("0")?;
        }
        return f.write_str(".0");
    }
    let scale = scale as usize;
    if magnitude.len() > scale {
        let (int_part, frac_part) = magnitude.split_at(magnitude.len() - scale);
        write!(f, "{}.{}", int_part, frac_part)
    } else {
        f.write_str("0.")?;
        for _ in 0..(scale - magnitude.len()) {
            f.write_str("0")?;
        }
        f.write_str(&magnitude)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int32(n) => write!(f, "{}", n),
            Number::Int64(n) => write!(f, "{}", n),
            Number::Float32(n) => write_float(f, f64::from(*n), n),
            Number::Float64(n) => write_float(f, *n, n),
            Number::BigInt(n) => write!(f, "{}", n),
            Number::BigDecimal(n) => write_big_decimal(f, n),
        }
    }
}

impl From<i8> for Number {
    fn from(value: i8) -> Self {
        Number::Int32(i32::from(value))
    }
}

impl From<i16> for Number {
    fn from(value: i16) -> Self {
        Number::Int32(i32::from(value))
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int32(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int64(value)
    }
}

impl From<u8> for Number {
    fn from(value: u8) -> Self {
        Number::Int32(i32::from(value))
    }
}

impl From<u16> for Number {
    fn from(value: u16) -> Self {
        Number::Int32(i32::from(value))
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        match i32::try_from(value) {
            Ok(n) => Number::Int32(n),
            Err(_) => Number::Int64(i64::from(value)),
        }
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(n) => Number::Int64(n),
            Err(_) => Number::BigInt(BigInt::from(value)),
        }
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float32(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float64(value)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::BigInt(value)
    }
}

impl From<BigDecimal> for Number {
    fn from(value: BigDecimal) -> Self {
        Number::BigDecimal(value)
    }
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Attr {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Item {
    /// A plain value item.
    pub fn value(value: impl Into<Value>) -> Self {
        Item::ValueItem(value.into())
    }

    /// A `key:value` slot.
    pub fn slot(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Item::Slot(key.into(), value.into())
    }

    #[inline]
    #[must_use]
    pub const fn is_slot(&self) -> bool {
        matches!(self, Item::Slot(..))
    }
}

impl Record {
    /// Creates an empty record.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recon_codec::Record;
    ///
    /// let record = Record::new();
    /// assert!(record.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Record::default()
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.push(Attr::new(name, value));
        self
    }

    #[must_use]
    pub fn with_item(mut self, value: impl Into<Value>) -> Self {
        self.items.push(Item::value(value));
        self
    }

    #[must_use]
    pub fn with_slot(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.items.push(Item::slot(key, value));
        self
    }

    pub fn push_attr(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attrs.push(Attr::new(name, value));
    }

    pub fn push_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// The name of the first attribute, conventionally the record's tag.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.attrs.first().map(|attr| attr.name.as_str())
    }

    /// Looks up the value of the first slot whose key is the text `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recon_codec::{Record, Value};
    ///
    /// let record = Record::new().with_slot("x", 1).with_slot("y", 2);
    /// assert_eq!(record.get("y"), Some(&Value::from(2)));
    /// assert_eq!(record.get("z"), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.iter().find_map(|item| match item {
            Item::Slot(Value::Text(k), v) if k == key => Some(v),
            _ => None,
        })
    }

    /// Number of attributes plus items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len() + self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.items.is_empty()
    }
}

impl Value {
    /// Returns `true` if the value is extant (present but carrying nothing).
    #[inline]
    #[must_use]
    pub const fn is_extant(&self) -> bool {
        matches!(self, Value::Extant)
    }

    #[inline]
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_blob(&self) -> bool {
        matches!(self, Value::Blob(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, Value::Record(_))
    }

    /// If the value is text, returns a reference to it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recon_codec::Value;
    ///
    /// assert_eq!(Value::from("hello").as_str(), Some("hello"));
    /// assert_eq!(Value::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is an integer that fits in an `i64`, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.to_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.to_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// A record holding the given values as plain items.
    pub fn from_items<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Record(Record {
            attrs: Vec::new(),
            items: items.into_iter().map(Item::value).collect(),
        })
    }

    /// A record holding the given `key:value` slots.
    pub fn from_slots<I, K, V>(slots: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Record(Record {
            attrs: Vec::new(),
            items: slots.into_iter().map(|(k, v)| Item::slot(k, v)).collect(),
        })
    }

    /// Short description of the value's kind, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Extant => "extant",
            Value::Text(_) => "text",
            Value::Number(n) => n.kind(),
            Value::Boolean(_) => "boolean",
            Value::Blob(_) => "blob",
            Value::Record(_) => "record",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::to_string(self) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl FromStr for Value {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        crate::parse_value(s)
    }
}

// TryFrom implementations for extracting values from Value
impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match &value {
            Value::Number(n) => n.to_i64().ok_or_else(|| {
                crate::error::ReadError::out_of_range(n, "i64").into()
            }),
            _ => Err(crate::error::ReadError::unexpected("an integer", value.kind()).into()),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Number(n) => Ok(n.to_f64()),
            other => Err(crate::error::ReadError::unexpected("a number", other.kind()).into()),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(crate::error::ReadError::unexpected("a boolean", other.kind()).into()),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(crate::error::ReadError::unexpected("text", other.kind()).into()),
        }
    }
}

// From implementations for creating Value from primitives
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

macro_rules! value_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

value_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, BigInt, BigDecimal);

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Extant
    }
}
