//! Error types for Recon parsing, decoding and encoding.
//!
//! ## Error Categories
//!
//! - **Syntax Errors** ([`SyntaxError`]): malformed notation, with the line,
//!   column and byte offset of the offending character
//! - **Decode Errors** ([`ReadError`]): well-formed notation that cannot be
//!   recognized as the requested type (wrong event kind, numeric overflow,
//!   missing required field)
//! - **Encode Errors** ([`WriteError`]): a writer invariant was violated or no
//!   writer is registered for a runtime type
//! - **Frame Errors**: a binary frame whose header is inconsistent
//!
//! All of these are terminal for the parser, recognizer or decoder that
//! produced them.
//!
//! ## Examples
//!
//! ```rust
//! use recon_codec::{parse_value, Error};
//!
//! let result = parse_value("{a:1");
//! assert!(matches!(result, Err(Error::Syntax(_))));
//!
//! if let Err(err) = result {
//!     // Messages include the location of the problem.
//!     assert!(err.to_string().contains("line 1"));
//! }
//! ```

use crate::input::Location;
use std::fmt;
use thiserror::Error;

/// Malformed notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax error at {location}: {cause}")]
pub struct SyntaxError {
    pub cause: String,
    pub location: Location,
}

impl SyntaxError {
    /// Creates a syntax error at the given location.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recon_codec::error::SyntaxError;
    /// use recon_codec::input::Location;
    ///
    /// let err = SyntaxError::new("unexpected '}'", Location::start());
    /// assert!(err.to_string().contains("unexpected '}'"));
    /// ```
    pub fn new(cause: impl Into<String>, location: Location) -> Self {
        SyntaxError {
            cause: cause.into(),
            location,
        }
    }
}

/// Valid notation that cannot be recognized as the target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("Expected {expected}, found {found}")]
    UnexpectedEvent { expected: String, found: String },

    #[error("Number {value} is out of range for {target}")]
    NumberOutOfRange { value: String, target: &'static str },

    #[error("Missing required field '{0}'")]
    MissingField(String),

    #[error("Unexpected field '{0}'")]
    UnexpectedField(String),

    #[error("Field '{0}' occurs more than once")]
    DuplicateField(String),

    #[error("Expected tag '{expected}', found '{found}'")]
    UnexpectedTag { expected: String, found: String },

    #[error("Input ended before the record was complete")]
    IncompleteRecord,

    #[error("{0}")]
    Message(String),
}

impl ReadError {
    /// Creates an [`ReadError::UnexpectedEvent`] error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recon_codec::error::ReadError;
    ///
    /// let err = ReadError::unexpected("an integer", "text");
    /// assert!(err.to_string().contains("Expected an integer"));
    /// ```
    pub fn unexpected(expected: impl Into<String>, found: impl fmt::Display) -> Self {
        ReadError::UnexpectedEvent {
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Creates a [`ReadError::NumberOutOfRange`] error.
    pub fn out_of_range(value: impl fmt::Display, target: &'static str) -> Self {
        ReadError::NumberOutOfRange {
            value: value.to_string(),
            target,
        }
    }
}

/// A writer invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("No writer registered for type {0}")]
    NoWriter(String),

    #[error("Slot written into a body declared as array-like")]
    SlotInArrayBody,

    #[error("Record declared {declared} items but {written} were written")]
    ItemCountMismatch { declared: usize, written: usize },

    #[error("{0}")]
    Message(String),
}

/// Represents all possible errors raised by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("Decode error: {0}")]
    Decode(#[from] ReadError),

    #[error("Encode error: {0}")]
    Encode(#[from] WriteError),

    /// Malformed binary frame
    #[error("Invalid frame: {0}")]
    Frame(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error with location information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recon_codec::Error;
    /// use recon_codec::input::Location;
    ///
    /// let err = Error::syntax("unterminated string", Location { line: 3, column: 7, offset: 40 });
    /// assert!(err.to_string().contains("3:7 (offset 40)"));
    /// ```
    pub fn syntax(cause: impl Into<String>, location: Location) -> Self {
        Error::Syntax(SyntaxError::new(cause, location))
    }

    /// Creates a frame error for malformed binary framing.
    pub fn frame(msg: impl Into<String>) -> Self {
        Error::Frame(msg.into())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recon_codec::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// The location of the error in the source, for syntax errors.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Syntax(err) => Some(err.location),
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Decode(ReadError::Message(msg.to_string()))
    }

    fn missing_field(field: &'static str) -> Self {
        Error::Decode(ReadError::MissingField(field.to_string()))
    }

    fn unknown_field(field: &str, _expected: &'static [&'static str]) -> Self {
        Error::Decode(ReadError::UnexpectedField(field.to_string()))
    }

    fn duplicate_field(field: &'static str) -> Self {
        Error::Decode(ReadError::DuplicateField(field.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
