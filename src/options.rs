//! Configuration options for Recon parsing and printing.
//!
//! - [`ReconOptions`]: Main configuration struct
//! - [`Separator`]: Choice of separator between printed items (comma or newline)
//!
//! ## Examples
//!
//! ```rust
//! use recon_codec::{to_string_with_options, ReconOptions, Separator, Value};
//!
//! let value = Value::from_items([1, 2, 3]);
//!
//! let options = ReconOptions::new().with_separator(Separator::Newline);
//! let recon = to_string_with_options(&value, &options).unwrap();
//! assert_eq!(recon, "{1\n2\n3}");
//! ```

/// Separator printed between the items of a body.
///
/// # Examples
///
/// ```rust
/// use recon_codec::Separator;
///
/// assert_eq!(Separator::Comma.as_str(), ",");
/// assert_eq!(Separator::Newline.as_str(), "\n");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Separator {
    #[default]
    Comma,
    Newline,
}

impl Separator {
    /// Returns the string representation of this separator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Separator::Comma => ",",
            Separator::Newline => "\n",
        }
    }
}

/// Default limit on the nesting of attribute and record bodies.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration options for Recon parsing and printing.
///
/// # Examples
///
/// ```rust
/// use recon_codec::{ReconOptions, Separator};
///
/// let options = ReconOptions::new()
///     .with_separator(Separator::Newline)
///     .with_max_depth(32);
/// assert_eq!(options.max_depth, 32);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconOptions {
    pub separator: Separator,
    pub max_depth: usize,
}

impl Default for ReconOptions {
    fn default() -> Self {
        ReconOptions {
            separator: Separator::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ReconOptions {
    /// Creates default options (comma separator, nesting limit of 256).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recon_codec::ReconOptions;
    ///
    /// let options = ReconOptions::new();
    /// assert_eq!(options.max_depth, 256);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the separator printed between items.
    ///
    /// Parsing always accepts both separators.
    #[must_use]
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    /// Sets the maximum nesting of bodies accepted by the tokenizer.
    ///
    /// Deeper input is rejected with a syntax error.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
