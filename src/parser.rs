//! Resumable parser combinators.
//!
//! A [`Parser`] is fed a [`Cursor`] and answers with a [`Parse`]:
//!
//! - [`Parse::Done`]: a result was produced and the cursor sits just past the
//!   consumed input
//! - [`Parse::Continue`]: more input is needed; the returned parser carries
//!   everything it has learned so far
//! - [`Parse::Error`]: the input cannot match, with a location
//!
//! Feeding consumes the parser and hands back its successor, so a suspended
//! parse is an ordinary value that can be stored between reads.
//!
//! ## Unconsumed input
//!
//! Most parsers consume input as they go. [`alt`] and [`many0`] explore
//! input speculatively and may answer `Continue` without advancing the
//! cursor past bytes they have already looked at. Whoever drives the parse
//! must keep every byte past `cursor.offset()` and present it again, followed
//! by new input, on the next call. The decoders in this crate do exactly
//! that.
//!
//! ## Examples
//!
//! ```rust
//! use recon_codec::input::Cursor;
//! use recon_codec::parser::{literal, take_while1, Parse, Parser};
//!
//! let parser = literal("0x").and_then(|_| take_while1(|c: char| c.is_ascii_hexdigit(), "hex digits"));
//!
//! let mut first = Cursor::new(b"0x1", false);
//! let parser = match parser.feed(&mut first) {
//!     Parse::Continue(parser) => parser,
//!     _ => unreachable!(),
//! };
//!
//! let mut second = Cursor::new(b"F;", true);
//! match parser.feed(&mut second) {
//!     Parse::Done(digits) => assert_eq!(digits, "1F"),
//!     _ => unreachable!(),
//! }
//! ```

use crate::error::SyntaxError;
use crate::input::{Cursor, Empty};
use tracing::trace;

/// The outcome of feeding a parser.
#[derive(Debug)]
pub enum Parse<P, O> {
    Continue(P),
    Done(O),
    Error(SyntaxError),
}

impl<P, O> Parse<P, O> {
    #[inline]
    #[must_use]
    pub fn is_cont(&self) -> bool {
        matches!(self, Parse::Continue(_))
    }

    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Parse::Done(_))
    }

    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Parse::Error(_))
    }

    /// Wraps a suspended parser, leaving results and errors alone.
    pub fn map_parser<Q>(self, f: impl FnOnce(P) -> Q) -> Parse<Q, O> {
        match self {
            Parse::Continue(p) => Parse::Continue(f(p)),
            Parse::Done(o) => Parse::Done(o),
            Parse::Error(e) => Parse::Error(e),
        }
    }
}

fn malformed(input: &Cursor<'_>) -> SyntaxError {
    SyntaxError::new("invalid UTF-8", input.location())
}

/// An incremental parser.
///
/// Implementations must not answer `Continue` once the cursor reports
/// [`Empty::Done`]: at end of input a parser either finishes or fails.
pub trait Parser: Sized {
    type Output;

    fn feed(self, input: &mut Cursor<'_>) -> Parse<Self, Self::Output>;

    /// Transforms the result of this parser.
    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        F: FnOnce(Self::Output) -> U,
    {
        Map { parser: self, f }
    }

    /// Transforms the result of this parser with a conversion that may fail.
    fn try_map<F, U>(self, f: F) -> TryMap<Self, F>
    where
        F: FnOnce(Self::Output) -> Result<U, String>,
    {
        TryMap { parser: self, f }
    }

    /// Runs the parser produced from this parser's result.
    fn and_then<F, Q>(self, f: F) -> AndThen<Self, F, Q>
    where
        F: FnOnce(Self::Output) -> Q,
        Q: Parser,
    {
        AndThen::First(self, f)
    }
}

/// Runs a parser over a complete input, returning its result.
///
/// Input after the parsed prefix is ignored.
pub fn parse_complete<P: Parser>(parser: P, input: &str) -> Result<P::Output, SyntaxError> {
    let mut cursor = Cursor::complete(input);
    match parser.feed(&mut cursor) {
        Parse::Done(output) => Ok(output),
        Parse::Error(err) => Err(err),
        Parse::Continue(_) => Err(SyntaxError::new(
            "unexpected end of input",
            cursor.location(),
        )),
    }
}

/// See [`Parser::map`].
#[derive(Debug, Clone)]
pub struct Map<P, F> {
    parser: P,
    f: F,
}

impl<P, F, U> Parser for Map<P, F>
where
    P: Parser,
    F: FnOnce(P::Output) -> U,
{
    type Output = U;

    fn feed(self, input: &mut Cursor<'_>) -> Parse<Self, U> {
        let Map { parser, f } = self;
        match parser.feed(input) {
            Parse::Continue(parser) => Parse::Continue(Map { parser, f }),
            Parse::Done(output) => Parse::Done(f(output)),
            Parse::Error(err) => Parse::Error(err),
        }
    }
}

/// See [`Parser::try_map`].
#[derive(Debug, Clone)]
pub struct TryMap<P, F> {
    parser: P,
    f: F,
}

impl<P, F, U> Parser for TryMap<P, F>
where
    P: Parser,
    F: FnOnce(P::Output) -> Result<U, String>,
{
    type Output = U;

    fn feed(self, input: &mut Cursor<'_>) -> Parse<Self, U> {
        let TryMap { parser, f } = self;
        match parser.feed(input) {
            Parse::Continue(parser) => Parse::Continue(TryMap { parser, f }),
            Parse::Done(output) => match f(output) {
                Ok(value) => Parse::Done(value),
                Err(cause) => Parse::Error(SyntaxError::new(cause, input.location())),
            },
            Parse::Error(err) => Parse::Error(err),
        }
    }
}

/// See [`Parser::and_then`].
#[derive(Debug, Clone)]
pub enum AndThen<P, F, Q> {
    First(P, F),
    Second(Q),
}

impl<P, F, Q> Parser for AndThen<P, F, Q>
where
    P: Parser,
    F: FnOnce(P::Output) -> Q,
    Q: Parser,
{
    type Output = Q::Output;

    fn feed(self, input: &mut Cursor<'_>) -> Parse<Self, Q::Output> {
        match self {
            AndThen::First(first, f) => match first.feed(input) {
                Parse::Continue(first) => Parse::Continue(AndThen::First(first, f)),
                Parse::Done(output) => AndThen::Second(f(output)).feed(input),
                Parse::Error(err) => Parse::Error(err),
            },
            AndThen::Second(second) => second.feed(input).map_parser(AndThen::Second),
        }
    }
}

/// One of two parsers with the same output, so both can sit in one [`Alt`].
#[derive(Debug, Clone)]
pub enum Either<A, B> {
    Left(A),
    Right(B),
}

impl<A, B> Parser for Either<A, B>
where
    A: Parser,
    B: Parser<Output = A::Output>,
{
    type Output = A::Output;

    fn feed(self, input: &mut Cursor<'_>) -> Parse<Self, A::Output> {
        match self {
            Either::Left(a) => a.feed(input).map_parser(Either::Left),
            Either::Right(b) => b.feed(input).map_parser(Either::Right),
        }
    }
}

#[derive(Debug, Clone)]
struct Branch<P> {
    parser: P,
    // Bytes this branch has consumed past the shared position.
    consumed: usize,
}

/// Ordered choice between parsers, fed in lockstep.
///
/// Every live branch sees the same input. The first branch (in order) to
/// finish wins and the cursor moves to where it stopped. A failing branch is
/// dropped; when all fail, the last error is reported. While two or more
/// branches are still undecided the cursor is not advanced, so the caller
/// must present the same bytes again (see the module docs).
#[derive(Debug, Clone)]
pub struct Alt<P> {
    branches: Vec<Branch<P>>,
}

/// Creates an [`Alt`] over `parsers`.
///
/// # Examples
///
/// ```rust
/// use recon_codec::parser::{alt, literal, parse_complete};
///
/// let keyword = alt([literal("true"), literal("false")]);
/// assert_eq!(parse_complete(keyword, "false").unwrap(), "false");
/// ```
pub fn alt<P: Parser>(parsers: impl IntoIterator<Item = P>) -> Alt<P> {
    Alt {
        branches: parsers
            .into_iter()
            .map(|parser| Branch {
                parser,
                consumed: 0,
            })
            .collect(),
    }
}

impl<P: Parser> Parser for Alt<P> {
    type Output = P::Output;

    fn feed(self, input: &mut Cursor<'_>) -> Parse<Self, P::Output> {
        let start = *input;
        let mut live = Vec::with_capacity(self.branches.len());
        let mut last_error = None;
        for (index, Branch { parser, consumed }) in self.branches.into_iter().enumerate() {
            let mut fork = start;
            fork.advance_to(start.offset() + consumed);
            match parser.feed(&mut fork) {
                Parse::Done(output) => {
                    *input = fork;
                    return Parse::Done(output);
                }
                Parse::Continue(parser) => live.push(Branch {
                    parser,
                    consumed: fork.offset() - start.offset(),
                }),
                Parse::Error(err) => {
                    trace!(branch = index, cause = %err.cause, "alternative eliminated");
                    last_error = Some(err);
                }
            }
        }
        if live.len() == 1 {
            if let Some(Branch { parser, consumed }) = live.pop() {
                input.advance_to(start.offset() + consumed);
                return Parse::Continue(Alt {
                    branches: vec![Branch {
                        parser,
                        consumed: 0,
                    }],
                });
            }
        }
        if live.is_empty() {
            return Parse::Error(last_error.unwrap_or_else(|| {
                SyntaxError::new("no alternative matched", start.location())
            }));
        }
        Parse::Continue(Alt { branches: live })
    }
}

/// Repeats a parser zero or more times, collecting the results.
///
/// Repetition stops at the first element that fails; the cursor is left at
/// the start of that element. Zero matches is not an error.
pub struct Many0<P: Parser, F> {
    factory: F,
    current: Option<Branch<P>>,
    items: Vec<P::Output>,
}

/// Creates a [`Many0`] that builds each element parser with `factory`.
///
/// # Examples
///
/// ```rust
/// use recon_codec::parser::{literal, many0, parse_complete};
///
/// let parser = many0(|| literal("ab"));
/// assert_eq!(parse_complete(parser, "ababa").unwrap().len(), 2);
/// ```
pub fn many0<P, F>(factory: F) -> Many0<P, F>
where
    P: Parser,
    F: Fn() -> P,
{
    Many0 {
        factory,
        current: None,
        items: Vec::new(),
    }
}

impl<P, F> Parser for Many0<P, F>
where
    P: Parser,
    F: Fn() -> P,
{
    type Output = Vec<P::Output>;

    fn feed(mut self, input: &mut Cursor<'_>) -> Parse<Self, Self::Output> {
        loop {
            let Branch { parser, consumed } = match self.current.take() {
                Some(branch) => branch,
                None => Branch {
                    parser: (self.factory)(),
                    consumed: 0,
                },
            };
            let mut fork = *input;
            fork.advance_to(input.offset() + consumed);
            match parser.feed(&mut fork) {
                Parse::Done(item) => {
                    let progressed = fork.offset() > input.offset();
                    *input = fork;
                    self.items.push(item);
                    if !progressed {
                        return Parse::Done(self.items);
                    }
                }
                Parse::Continue(parser) => {
                    self.current = Some(Branch {
                        parser,
                        consumed: fork.offset() - input.offset(),
                    });
                    return Parse::Continue(self);
                }
                Parse::Error(_) => return Parse::Done(self.items),
            }
        }
    }
}

/// Matches an exact string.
#[derive(Debug, Clone)]
pub struct Literal {
    expected: &'static str,
    matched: usize,
}

/// Creates a [`Literal`] parser; its output is the matched string.
pub fn literal(expected: &'static str) -> Literal {
    Literal {
        expected,
        matched: 0,
    }
}

impl Parser for Literal {
    type Output = &'static str;

    fn feed(mut self, input: &mut Cursor<'_>) -> Parse<Self, &'static str> {
        loop {
            let Some(want) = self.expected[self.matched..].chars().next() else {
                return Parse::Done(self.expected);
            };
            match input.head() {
                Ok(c) if c == want => {
                    input.step();
                    self.matched += c.len_utf8();
                }
                Ok(c) => {
                    return Parse::Error(SyntaxError::new(
                        format!("expected '{}', found '{}'", self.expected, c),
                        input.location(),
                    ))
                }
                Err(Empty::Pending) => return Parse::Continue(self),
                Err(Empty::Done) => {
                    return Parse::Error(SyntaxError::new(
                        format!("expected '{}', found end of input", self.expected),
                        input.location(),
                    ))
                }
                Err(Empty::Malformed) => return Parse::Error(malformed(input)),
            }
        }
    }
}

/// Matches a single character satisfying a predicate.
#[derive(Debug, Clone)]
pub struct Satisfy<F> {
    predicate: F,
    what: &'static str,
}

pub fn satisfy<F: Fn(char) -> bool>(predicate: F, what: &'static str) -> Satisfy<F> {
    Satisfy { predicate, what }
}

impl<F: Fn(char) -> bool> Parser for Satisfy<F> {
    type Output = char;

    fn feed(self, input: &mut Cursor<'_>) -> Parse<Self, char> {
        match input.head() {
            Ok(c) if (self.predicate)(c) => {
                input.step();
                Parse::Done(c)
            }
            Ok(c) => Parse::Error(SyntaxError::new(
                format!("expected {}, found '{}'", self.what, c),
                input.location(),
            )),
            Err(Empty::Pending) => Parse::Continue(self),
            Err(Empty::Done) => Parse::Error(SyntaxError::new(
                format!("expected {}, found end of input", self.what),
                input.location(),
            )),
            Err(Empty::Malformed) => Parse::Error(malformed(input)),
        }
    }
}

/// Collects the longest run of characters satisfying a predicate.
#[derive(Debug, Clone)]
pub struct TakeWhile<F> {
    predicate: F,
    min: usize,
    what: &'static str,
    text: String,
    count: usize,
}

/// Collects zero or more matching characters.
pub fn take_while0<F: Fn(char) -> bool>(predicate: F) -> TakeWhile<F> {
    TakeWhile {
        predicate,
        min: 0,
        what: "",
        text: String::new(),
        count: 0,
    }
}

/// Collects one or more matching characters; `what` names them in errors.
pub fn take_while1<F: Fn(char) -> bool>(predicate: F, what: &'static str) -> TakeWhile<F> {
    TakeWhile {
        predicate,
        min: 1,
        what,
        text: String::new(),
        count: 0,
    }
}

impl<F: Fn(char) -> bool> Parser for TakeWhile<F> {
    type Output = String;

    fn feed(mut self, input: &mut Cursor<'_>) -> Parse<Self, String> {
        loop {
            match input.head() {
                Ok(c) if (self.predicate)(c) => {
                    self.text.push(c);
                    self.count += 1;
                    input.step();
                }
                Ok(_) | Err(Empty::Done) => {
                    return if self.count < self.min {
                        Parse::Error(SyntaxError::new(
                            format!("expected {}", self.what),
                            input.location(),
                        ))
                    } else {
                        Parse::Done(self.text)
                    };
                }
                Err(Empty::Pending) => return Parse::Continue(self),
                Err(Empty::Malformed) => return Parse::Error(malformed(input)),
            }
        }
    }
}

/// A parser written as a step function over explicit state.
///
/// `step` is called with the current state each time input arrives and
/// returns the next state, a result, or an error.
#[derive(Debug, Clone)]
pub struct Stateful<S, F> {
    state: S,
    step: F,
}

pub fn stateful<S, F>(state: S, step: F) -> Stateful<S, F> {
    Stateful { state, step }
}

impl<S, F, O> Parser for Stateful<S, F>
where
    F: Fn(S, &mut Cursor<'_>) -> Parse<S, O>,
{
    type Output = O;

    fn feed(self, input: &mut Cursor<'_>) -> Parse<Self, O> {
        let Stateful { state, step } = self;
        match step(state, input) {
            Parse::Continue(state) => Parse::Continue(Stateful { state, step }),
            Parse::Done(output) => Parse::Done(output),
            Parse::Error(err) => Parse::Error(err),
        }
    }
}

/// A parser that consumes nothing and yields a fixed value.
#[derive(Debug, Clone)]
pub struct Succeed<O>(O);

/// Creates a [`Succeed`] parser. Clone it to run it again.
pub fn done<O>(value: O) -> Succeed<O> {
    Succeed(value)
}

impl<O> Parser for Succeed<O> {
    type Output = O;

    fn feed(self, _input: &mut Cursor<'_>) -> Parse<Self, O> {
        Parse::Done(self.0)
    }
}
