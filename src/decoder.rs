//! Incremental decoding of Recon from byte buffers.
//!
//! A [`Decoder`] is fed whatever bytes have arrived so far and answers
//! [`DecodeOutcome::Incomplete`] until a whole message has been read. Bytes
//! it has consumed are removed from the buffer; bytes it has not (the tail of
//! a split UTF-8 character, or input a parser is still deciding about) stay
//! there and are presented again with the next read.
//!
//! After a [`DecodeOutcome::Complete`] or an error the decoder must be
//! [`reset`](Decoder::reset) before it is used for the next message. Errors
//! are terminal until then: feeding more input returns the same error.
//!
//! ## Examples
//!
//! ```rust
//! use bytes::BytesMut;
//! use recon_codec::decoder::{decoder_of, DecodeOutcome, Decoder};
//!
//! let mut decoder = decoder_of::<Vec<i32>>();
//! let mut buf = BytesMut::from(&b"{1,2"[..]);
//! assert!(matches!(decoder.decode(&mut buf).unwrap(), DecodeOutcome::Incomplete));
//!
//! buf.extend_from_slice(b",3}");
//! match decoder.decode_eof(&mut buf).unwrap() {
//!     DecodeOutcome::Complete(items) => assert_eq!(items, vec![1, 2, 3]),
//!     DecodeOutcome::Incomplete => unreachable!(),
//! }
//! ```

use crate::error::{Error, ReadError, Result, SyntaxError};
use crate::input::{Cursor, Location};
use crate::options::ReconOptions;
use crate::parser::{Parse, Parser};
use crate::recognizer::{Recognizable, Recognizer};
use crate::tokenizer::{Step, Tokenizer};
use bytes::{Buf, BytesMut};
use tracing::debug;

/// The result of feeding a decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome<T> {
    /// A whole message was decoded.
    Complete(T),
    /// More input is needed.
    Incomplete,
}

impl<T> DecodeOutcome<T> {
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, DecodeOutcome::Complete(_))
    }

    /// The decoded message, if complete.
    pub fn complete(self) -> Option<T> {
        match self {
            DecodeOutcome::Complete(item) => Some(item),
            DecodeOutcome::Incomplete => None,
        }
    }
}

/// Decodes messages from a growing byte buffer.
pub trait Decoder {
    type Item;

    /// Decodes from `src`, advancing it past the consumed bytes. More bytes
    /// may follow.
    fn decode(&mut self, src: &mut BytesMut) -> Result<DecodeOutcome<Self::Item>>;

    /// Like [`decode`](Decoder::decode), but `src` holds the last of the
    /// input.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<DecodeOutcome<Self::Item>>;

    /// Whether a message has been completed since the last reset.
    fn is_done(&self) -> bool;

    /// Prepares the decoder for the next message.
    fn reset(&mut self);
}

enum State<T> {
    Decoding(Option<T>),
    Done,
    Failed(Error),
}

/// Decodes one Recon value per message through a recognizer.
pub struct ReconDecoder<R: Recognizer> {
    tokenizer: Tokenizer,
    recognizer: R,
    location: Location,
    state: State<R::Target>,
}

/// A decoder reading whole documents as `T`.
#[must_use]
pub fn decoder_of<T: Recognizable>() -> ReconDecoder<T::Rec> {
    ReconDecoder::new(T::make_recognizer())
}

impl<R: Recognizer> ReconDecoder<R> {
    /// A decoder for whole documents: a message ends at the end of input.
    pub fn new(recognizer: R) -> Self {
        ReconDecoder::with_tokenizer(Tokenizer::new(), recognizer)
    }

    pub fn with_options(recognizer: R, options: &ReconOptions) -> Self {
        ReconDecoder::with_tokenizer(Tokenizer::with_options(options), recognizer)
    }

    /// A decoder for values embedded in a longer input: a message ends with
    /// its value, and the bytes after it are left unconsumed.
    pub fn embedded(recognizer: R, options: &ReconOptions) -> Self {
        ReconDecoder::with_tokenizer(Tokenizer::embedded(options), recognizer)
    }

    fn with_tokenizer(tokenizer: Tokenizer, recognizer: R) -> Self {
        ReconDecoder {
            tokenizer,
            recognizer,
            location: Location::start(),
            state: State::Decoding(None),
        }
    }

    /// Location of the next unread byte of the current message.
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    /// The error that stopped the decoder, if any.
    #[must_use]
    pub fn trap(&self) -> Option<&Error> {
        match &self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Decodes from a byte slice, returning the outcome and the number of
    /// bytes consumed. Unconsumed bytes must be presented again.
    pub fn decode_slice(
        &mut self,
        buf: &[u8],
        is_last: bool,
    ) -> Result<(DecodeOutcome<R::Target>, usize)> {
        let mut input = Cursor::resume(buf, self.location, is_last);
        let result = self.run(&mut input);
        self.location = input.location();
        match result {
            Ok(outcome) => {
                if outcome.is_complete() {
                    debug!(offset = self.location.offset, "decoded message");
                }
                Ok((outcome, input.offset()))
            }
            Err(err) => {
                if !matches!(self.state, State::Failed(_)) {
                    debug!(%err, "decode failed");
                    self.state = State::Failed(err.clone());
                }
                Err(err)
            }
        }
    }

    fn run(&mut self, input: &mut Cursor<'_>) -> Result<DecodeOutcome<R::Target>> {
        let pending = match &mut self.state {
            State::Decoding(pending) => pending,
            State::Done => {
                return Err(Error::custom("decoder fed after completing; reset it first"))
            }
            State::Failed(err) => return Err(err.clone()),
        };
        loop {
            match self.tokenizer.next_event(input)? {
                Step::Event(event) => {
                    if pending.is_some() {
                        return Err(ReadError::unexpected("the end of the message", event).into());
                    }
                    match self.recognizer.feed_event(event) {
                        None => {}
                        Some(Ok(value)) => *pending = Some(value),
                        Some(Err(err)) => return Err(err.into()),
                    }
                }
                Step::Pending => return Ok(DecodeOutcome::Incomplete),
                Step::End => {
                    let value = pending.take().ok_or(ReadError::IncompleteRecord)?;
                    self.state = State::Done;
                    return Ok(DecodeOutcome::Complete(value));
                }
            }
        }
    }

    fn decode_buf(&mut self, src: &mut BytesMut, is_last: bool) -> Result<DecodeOutcome<R::Target>> {
        let (outcome, consumed) = self.decode_slice(&src[..], is_last)?;
        src.advance(consumed);
        Ok(outcome)
    }
}

impl<R: Recognizer> Decoder for ReconDecoder<R> {
    type Item = R::Target;

    fn decode(&mut self, src: &mut BytesMut) -> Result<DecodeOutcome<R::Target>> {
        self.decode_buf(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<DecodeOutcome<R::Target>> {
        self.decode_buf(src, true)
    }

    fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    fn reset(&mut self) {
        self.tokenizer.reset();
        self.recognizer.reset();
        self.location = Location::start();
        self.state = State::Decoding(None);
    }
}

/// A recognizer driven by an embedded tokenizer, usable as a [`Parser`].
///
/// Decoding failures are reported as syntax errors at the location where
/// the offending value ended.
///
/// ```rust
/// use recon_codec::decoder::recognizer_parser;
/// use recon_codec::parser::{literal, parse_complete, Parser};
///
/// let parser = literal("point=").and_then(|_| recognizer_parser::<Vec<i32>>());
/// assert_eq!(parse_complete(parser, "point={1,2};").unwrap(), vec![1, 2]);
/// ```
pub struct RecognizerParser<R: Recognizer> {
    tokenizer: Tokenizer,
    recognizer: R,
    value: Option<R::Target>,
}

/// A [`RecognizerParser`] reading one `T`.
#[must_use]
pub fn recognizer_parser<T: Recognizable>() -> RecognizerParser<T::Rec> {
    RecognizerParser::new(T::make_recognizer(), &ReconOptions::default())
}

impl<R: Recognizer> RecognizerParser<R> {
    pub fn new(recognizer: R, options: &ReconOptions) -> Self {
        RecognizerParser {
            tokenizer: Tokenizer::embedded(options),
            recognizer,
            value: None,
        }
    }
}

impl<R: Recognizer> Parser for RecognizerParser<R> {
    type Output = R::Target;

    fn feed(mut self, input: &mut Cursor<'_>) -> Parse<Self, R::Target> {
        loop {
            match self.tokenizer.next_event(input) {
                Ok(Step::Event(event)) => match self.recognizer.feed_event(event) {
                    None => {}
                    Some(Ok(value)) => self.value = Some(value),
                    Some(Err(err)) => {
                        return Parse::Error(SyntaxError::new(err.to_string(), input.location()))
                    }
                },
                Ok(Step::Pending) => return Parse::Continue(self),
                Ok(Step::End) => {
                    return match self.value.take() {
                        Some(value) => Parse::Done(value),
                        None => Parse::Error(SyntaxError::new(
                            ReadError::IncompleteRecord.to_string(),
                            input.location(),
                        )),
                    }
                }
                Err(err) => return Parse::Error(err),
            }
        }
    }
}
