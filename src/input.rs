//! Position-tracked views over input buffers.
//!
//! A [`Cursor`] borrows a byte buffer holding UTF-8 text and walks it one
//! character at a time. The buffer may be only a prefix of the full input: a
//! cursor created with `is_last == false` reports [`Empty::Pending`] when it
//! runs out of bytes (the caller should supply more), whereas a final cursor
//! reports [`Empty::Done`].
//!
//! Cursors are `Copy`. Cloning one to explore an alternative never disturbs
//! the original, which is what the alternation combinator relies on.
//!
//! ```rust
//! use recon_codec::input::{Cursor, Empty};
//!
//! let mut cursor = Cursor::new(b"ab", false);
//! assert_eq!(cursor.head(), Ok('a'));
//! cursor.step();
//! cursor.step();
//! assert_eq!(cursor.head(), Err(Empty::Pending));
//! ```

use std::fmt;

/// A position in the overall input stream.
///
/// `line` and `column` are 1-based; `offset` is the 0-based byte offset from
/// the start of the stream (not of the current buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Location {
    /// The location of the first character of a stream.
    #[must_use]
    pub const fn start() -> Self {
        Location {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    #[inline]
    fn advance(&mut self, c: char, width: usize) {
        self.offset += width;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::start()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} (offset {})",
            self.line, self.column, self.offset
        )
    }
}

/// Why a cursor has no head character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Empty {
    /// The buffer is exhausted but more input may follow.
    Pending,
    /// The buffer is exhausted and no more input will follow.
    Done,
    /// The bytes at the cursor are not valid UTF-8.
    Malformed,
}

/// A cursor over a (possibly partial) UTF-8 buffer.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    index: usize,
    location: Location,
    is_last: bool,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of a stream.
    #[must_use]
    pub fn new(buf: &'a [u8], is_last: bool) -> Self {
        Cursor::resume(buf, Location::start(), is_last)
    }

    /// Creates a final cursor over a complete string.
    #[must_use]
    pub fn complete(input: &'a str) -> Self {
        Cursor::new(input.as_bytes(), true)
    }

    /// Creates a cursor whose first byte sits at `location` in the stream.
    #[must_use]
    pub fn resume(buf: &'a [u8], location: Location, is_last: bool) -> Self {
        Cursor {
            buf,
            index: 0,
            location,
            is_last,
        }
    }

    /// Location of the head character in the stream.
    #[inline]
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    /// Number of bytes of this buffer consumed so far.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.index
    }

    /// Whether no input will follow this buffer.
    #[inline]
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.is_last
    }

    /// The unconsumed tail of the buffer.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.index..]
    }

    fn decode_at(&self, index: usize) -> Result<(char, usize), Empty> {
        let Some(&lead) = self.buf.get(index) else {
            return Err(if self.is_last {
                Empty::Done
            } else {
                Empty::Pending
            });
        };
        let width = utf8_width(lead);
        if width == 0 {
            return Err(Empty::Malformed);
        }
        let end = index + width;
        if end > self.buf.len() {
            // A multi-byte character split across buffers.
            return Err(if self.is_last {
                Empty::Malformed
            } else {
                Empty::Pending
            });
        }
        std::str::from_utf8(&self.buf[index..end])
            .ok()
            .and_then(|s| s.chars().next())
            .map(|c| (c, width))
            .ok_or(Empty::Malformed)
    }

    /// The character at the cursor.
    #[inline]
    pub fn head(&self) -> Result<char, Empty> {
        self.decode_at(self.index).map(|(c, _)| c)
    }

    /// The character `n` positions past the head.
    pub fn peek(&self, n: usize) -> Result<char, Empty> {
        let mut index = self.index;
        for _ in 0..n {
            let (_, width) = self.decode_at(index)?;
            index += width;
        }
        self.decode_at(index).map(|(c, _)| c)
    }

    /// Whether at least `n` characters are available in this buffer.
    ///
    /// Never looks past the end of the buffer: `false` on a non-final cursor
    /// means "ask for more input", not "end of input".
    #[must_use]
    pub fn has(&self, n: usize) -> bool {
        let mut index = self.index;
        for _ in 0..n {
            match self.decode_at(index) {
                Ok((_, width)) => index += width,
                Err(_) => return false,
            }
        }
        true
    }

    /// Advances past the head character, returning it.
    ///
    /// Returns `None`, leaving the cursor unchanged, when there is no head.
    pub fn step(&mut self) -> Option<char> {
        let (c, width) = self.decode_at(self.index).ok()?;
        self.index += width;
        self.location.advance(c, width);
        Some(c)
    }

    /// Steps forward until `offset` bytes of the buffer have been consumed.
    pub fn advance_to(&mut self, offset: usize) {
        while self.index < offset {
            if self.step().is_none() {
                break;
            }
        }
    }

    /// A head character is available.
    #[inline]
    #[must_use]
    pub fn is_cont(&self) -> bool {
        self.head().is_ok()
    }

    /// The buffer is exhausted and more input may arrive.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.head() == Err(Empty::Pending)
    }

    /// The input is exhausted for good.
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.head() == Err(Empty::Done)
    }

    /// The input at the cursor is malformed.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.head() == Err(Empty::Malformed)
    }
}

#[inline]
fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}
