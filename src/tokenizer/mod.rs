//! The notation tokenizer.
//!
//! [`Tokenizer`] is a push-down automaton that turns Recon text into
//! [`ReadEvent`]s. Its stack holds one [`FrameState`] per open body; the
//! scalar currently being read (if any) is held alongside the stack so that a
//! token split across buffers resumes where it stopped.
//!
//! The tokenizer never buffers input itself. When it answers
//! [`Step::Pending`], every byte from `cursor.offset()` onwards must be
//! presented again, followed by new input, on the next call.
//!
//! ## Examples
//!
//! ```rust
//! use recon_codec::event::ReadEvent;
//! use recon_codec::tokenizer::tokenize;
//!
//! let events = tokenize("@point{x:1}").unwrap();
//! assert_eq!(events[0], ReadEvent::StartAttribute("point".into()));
//! assert_eq!(events.last(), Some(&ReadEvent::EndRecord));
//! ```

mod scalars;

pub use scalars::{is_identifier, is_keyword, Scalar, Token, MAX_FLOAT_DIGITS};

use crate::error::SyntaxError;
use crate::event::ReadEvent;
use crate::input::{Cursor, Empty};
use crate::options::ReconOptions;
use crate::parser::{parse_complete, Parse, Parser};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Which kind of body a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemsKind {
    Attr,
    Record,
}

impl ItemsKind {
    #[must_use]
    pub const fn end_delimiter(self) -> char {
        match self {
            ItemsKind::Attr => ')',
            ItemsKind::Record => '}',
        }
    }

    #[must_use]
    pub fn end_event(self) -> ReadEvent {
        match self {
            ItemsKind::Attr => ReadEvent::EndAttribute,
            ItemsKind::Record => ReadEvent::EndRecord,
        }
    }

    #[must_use]
    pub const fn end_action(self) -> Action {
        match self {
            ItemsKind::Attr => Action::PopAfterAttr,
            ItemsKind::Record => Action::PopAfterItem,
        }
    }
}

/// A change to the frame stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Close an attribute body, returning to the attribute list.
    PopAfterAttr,
    /// Close a record body; the enclosing frame has already moved past it.
    PopAfterItem,
    /// Open an attribute body.
    PushAttr,
    /// Open the body that follows a record's attributes.
    PushBody,
    /// Start a record where a value was expected: `true` when it opens with
    /// `{`, `false` when it opens with `@`.
    PushNewRecordWithBody(bool),
    None,
}

/// Grammar state of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Init,
    AttrBodyStartOrNl,
    AttrBodyAfterValue,
    AttrBodyAfterSlot,
    AttrBodySlot,
    AttrBodyAfterSep,
    AfterAttr,
    RecordBodyStartOrNl,
    RecordBodyAfterValue,
    RecordBodyAfterSlot,
    RecordBodySlot,
    RecordBodyAfterSep,
}

impl FrameState {
    /// The body this state belongs to, if any.
    #[must_use]
    pub const fn kind(self) -> Option<ItemsKind> {
        use FrameState as S;
        match self {
            S::AttrBodyStartOrNl
            | S::AttrBodyAfterValue
            | S::AttrBodyAfterSlot
            | S::AttrBodySlot
            | S::AttrBodyAfterSep => Some(ItemsKind::Attr),
            S::RecordBodyStartOrNl
            | S::RecordBodyAfterValue
            | S::RecordBodyAfterSlot
            | S::RecordBodySlot
            | S::RecordBodyAfterSep => Some(ItemsKind::Record),
            S::Init | S::AfterAttr => None,
        }
    }

    const fn start_or_nl(kind: ItemsKind) -> Self {
        match kind {
            ItemsKind::Attr => FrameState::AttrBodyStartOrNl,
            ItemsKind::Record => FrameState::RecordBodyStartOrNl,
        }
    }

    const fn after_sep(kind: ItemsKind) -> Self {
        match kind {
            ItemsKind::Attr => FrameState::AttrBodyAfterSep,
            ItemsKind::Record => FrameState::RecordBodyAfterSep,
        }
    }

    const fn after_slot(kind: ItemsKind) -> Self {
        match kind {
            ItemsKind::Attr => FrameState::AttrBodyAfterSlot,
            ItemsKind::Record => FrameState::RecordBodyAfterSlot,
        }
    }

    /// The state once a value started in this state has been read. `None`
    /// for [`FrameState::Init`], which is popped instead.
    const fn after_item(self) -> Option<Self> {
        use FrameState as S;
        match self {
            S::AttrBodyStartOrNl | S::AttrBodyAfterSep => Some(S::AttrBodyAfterValue),
            S::AttrBodyAfterSlot => Some(S::AttrBodySlot),
            S::RecordBodyStartOrNl | S::RecordBodyAfterSep => Some(S::RecordBodyAfterValue),
            S::RecordBodyAfterSlot => Some(S::RecordBodySlot),
            _ => None,
        }
    }
}

/// The result of asking the tokenizer for the next event.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Event(ReadEvent),
    /// More input is needed.
    Pending,
    /// The value (and, for documents, the input) is complete.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Document,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Tokenizing,
    Trailing,
    Complete,
    Failed(SyntaxError),
}

#[derive(Clone)]
enum InFlight {
    Value(Scalar),
    AttrNameStart,
    AttrName(Scalar),
    AttrBodyCheck,
}

#[inline]
fn is_space(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

fn malformed(input: &Cursor<'_>) -> SyntaxError {
    SyntaxError::new("invalid UTF-8", input.location())
}

/// Incremental Recon tokenizer.
#[derive(Clone)]
pub struct Tokenizer {
    stack: Vec<FrameState>,
    in_flight: Option<InFlight>,
    queue: VecDeque<ReadEvent>,
    phase: Phase,
    mode: Mode,
    max_depth: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::new()
    }
}

impl Tokenizer {
    /// A tokenizer for a whole document: one value, optionally surrounded by
    /// whitespace, then the end of input.
    #[must_use]
    pub fn new() -> Self {
        Tokenizer::with_options(&ReconOptions::default())
    }

    #[must_use]
    pub fn with_options(options: &ReconOptions) -> Self {
        Tokenizer {
            stack: vec![FrameState::Init],
            in_flight: None,
            queue: VecDeque::new(),
            phase: Phase::Tokenizing,
            mode: Mode::Document,
            max_depth: options.max_depth,
        }
    }

    /// A tokenizer that stops after one value, leaving whatever follows it
    /// unconsumed.
    #[must_use]
    pub fn embedded(options: &ReconOptions) -> Self {
        Tokenizer {
            mode: Mode::Value,
            ..Tokenizer::with_options(options)
        }
    }

    /// Returns the tokenizer to its initial state.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(FrameState::Init);
        self.in_flight = None;
        self.queue.clear();
        self.phase = Phase::Tokenizing;
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete && self.queue.is_empty()
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Wraps the tokenizer as a [`Parser`] collecting every event.
    #[must_use]
    pub fn into_parser(self) -> EventParser {
        EventParser {
            tokenizer: self,
            events: Vec::new(),
        }
    }

    /// Reads the next event from `input`.
    ///
    /// Errors are terminal: every later call returns the same error.
    pub fn next_event(&mut self, input: &mut Cursor<'_>) -> Result<Step, SyntaxError> {
        let result = self.advance(input);
        if let Err(err) = &result {
            if self.phase != Phase::Failed(err.clone()) {
                debug!(%err, "tokenizer failed");
                self.phase = Phase::Failed(err.clone());
            }
        }
        result
    }

    fn advance(&mut self, input: &mut Cursor<'_>) -> Result<Step, SyntaxError> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Ok(Step::Event(event));
            }
            match &self.phase {
                Phase::Failed(err) => return Err(err.clone()),
                Phase::Complete => return Ok(Step::End),
                Phase::Trailing => return self.skip_trailing(input),
                Phase::Tokenizing => {}
            }
            if let Some(in_flight) = self.in_flight.take() {
                if !self.resume(in_flight, input)? {
                    return Ok(Step::Pending);
                }
                continue;
            }
            let Some(&state) = self.stack.last() else {
                self.finish_value();
                continue;
            };
            let head = match input.head() {
                Ok(c) => Some(c),
                Err(Empty::Pending) => return Ok(Step::Pending),
                Err(Empty::Done) => None,
                Err(Empty::Malformed) => return Err(malformed(input)),
            };
            match state.kind() {
                Some(kind) => self.step_body(state, kind, head, input)?,
                None if state == FrameState::Init => self.step_init(head, input)?,
                None => self.step_after_attr(head, input)?,
            }
        }
    }

    /// Continues the scalar or attribute in flight. Returns `false` when it
    /// needs more input.
    fn resume(&mut self, in_flight: InFlight, input: &mut Cursor<'_>) -> Result<bool, SyntaxError> {
        match in_flight {
            InFlight::Value(scalar) => match scalar.feed(input) {
                Parse::Continue(scalar) => {
                    self.in_flight = Some(InFlight::Value(scalar));
                    Ok(false)
                }
                Parse::Done(token) => {
                    self.queue.push_back(token.into_event());
                    if self.stack.is_empty() {
                        self.finish_value();
                    }
                    Ok(true)
                }
                Parse::Error(err) => Err(err),
            },
            InFlight::AttrNameStart => match input.head() {
                Ok(c) => match Scalar::start_name(c) {
                    Some(scalar) => {
                        self.in_flight = Some(InFlight::AttrName(scalar));
                        Ok(true)
                    }
                    None => Err(SyntaxError::new(
                        format!("expected attribute name, found '{}'", c),
                        input.location(),
                    )),
                },
                Err(Empty::Pending) => {
                    self.in_flight = Some(InFlight::AttrNameStart);
                    Ok(false)
                }
                Err(Empty::Done) => Err(SyntaxError::new(
                    "expected attribute name, found end of input",
                    input.location(),
                )),
                Err(Empty::Malformed) => Err(malformed(input)),
            },
            InFlight::AttrName(scalar) => match scalar.feed(input) {
                Parse::Continue(scalar) => {
                    self.in_flight = Some(InFlight::AttrName(scalar));
                    Ok(false)
                }
                Parse::Done(token) => match token.into_name() {
                    Some(name) => {
                        self.queue.push_back(ReadEvent::StartAttribute(name));
                        self.in_flight = Some(InFlight::AttrBodyCheck);
                        Ok(true)
                    }
                    None => Err(SyntaxError::new(
                        "attribute names must be text",
                        input.location(),
                    )),
                },
                Parse::Error(err) => Err(err),
            },
            InFlight::AttrBodyCheck => match input.head() {
                Ok('(') => {
                    input.step();
                    self.apply(Action::PushAttr, input)?;
                    Ok(true)
                }
                Ok(_) | Err(Empty::Done) => {
                    self.queue.push_back(ReadEvent::EndAttribute);
                    Ok(true)
                }
                Err(Empty::Pending) => {
                    self.in_flight = Some(InFlight::AttrBodyCheck);
                    Ok(false)
                }
                Err(Empty::Malformed) => Err(malformed(input)),
            },
        }
    }

    fn step_init(&mut self, head: Option<char>, input: &mut Cursor<'_>) -> Result<(), SyntaxError> {
        match head {
            Some(c) if is_space(c) || c == '\n' => {
                input.step();
                Ok(())
            }
            Some(c) => self.start_value(c, input),
            None => {
                self.queue.push_back(ReadEvent::Extant);
                self.stack.pop();
                self.finish_value();
                Ok(())
            }
        }
    }

    fn step_after_attr(
        &mut self,
        head: Option<char>,
        input: &mut Cursor<'_>,
    ) -> Result<(), SyntaxError> {
        match head {
            Some(' ' | '\t') => {
                input.step();
                Ok(())
            }
            Some('@') => {
                input.step();
                self.in_flight = Some(InFlight::AttrNameStart);
                Ok(())
            }
            Some('{') => {
                input.step();
                self.apply(Action::PushBody, input)
            }
            _ => {
                // Attributes with no body: the record is complete.
                self.queue.push_back(ReadEvent::StartBody);
                self.apply(Action::PopAfterItem, input)
            }
        }
    }

    fn step_body(
        &mut self,
        state: FrameState,
        kind: ItemsKind,
        head: Option<char>,
        input: &mut Cursor<'_>,
    ) -> Result<(), SyntaxError> {
        use FrameState as S;
        let end = kind.end_delimiter();
        let Some(c) = head else {
            return Err(SyntaxError::new(
                format!("unexpected end of input, expected '{}'", end),
                input.location(),
            ));
        };
        let action = match state {
            S::AttrBodyStartOrNl | S::RecordBodyStartOrNl | S::AttrBodyAfterSep | S::RecordBodyAfterSep => {
                let after_sep = matches!(state, S::AttrBodyAfterSep | S::RecordBodyAfterSep);
                match c {
                    c if is_space(c) || c == '\n' => Action::None,
                    ',' => {
                        self.queue.push_back(ReadEvent::Extant);
                        self.set_top(FrameState::after_sep(kind));
                        Action::None
                    }
                    ':' => {
                        self.queue.push_back(ReadEvent::Extant);
                        self.queue.push_back(ReadEvent::Slot);
                        self.set_top(FrameState::after_slot(kind));
                        Action::None
                    }
                    c if c == end => {
                        if after_sep {
                            self.queue.push_back(ReadEvent::Extant);
                        }
                        kind.end_action()
                    }
                    c => return self.start_value(c, input),
                }
            }
            S::AttrBodyAfterValue | S::RecordBodyAfterValue | S::AttrBodySlot | S::RecordBodySlot => {
                let in_slot = matches!(state, S::AttrBodySlot | S::RecordBodySlot);
                match c {
                    c if is_space(c) => Action::None,
                    ',' => {
                        self.set_top(FrameState::after_sep(kind));
                        Action::None
                    }
                    '\n' => {
                        self.set_top(FrameState::start_or_nl(kind));
                        Action::None
                    }
                    ':' if !in_slot => {
                        self.queue.push_back(ReadEvent::Slot);
                        self.set_top(FrameState::after_slot(kind));
                        Action::None
                    }
                    c if c == end => kind.end_action(),
                    c => {
                        return Err(SyntaxError::new(
                            format!("unexpected '{}', expected ',' or '{}'", c, end),
                            input.location(),
                        ))
                    }
                }
            }
            S::AttrBodyAfterSlot | S::RecordBodyAfterSlot => match c {
                c if is_space(c) => Action::None,
                ',' => {
                    self.queue.push_back(ReadEvent::Extant);
                    self.set_top(FrameState::after_sep(kind));
                    Action::None
                }
                '\n' => {
                    self.queue.push_back(ReadEvent::Extant);
                    self.set_top(FrameState::start_or_nl(kind));
                    Action::None
                }
                ':' => {
                    return Err(SyntaxError::new("unexpected ':'", input.location()));
                }
                c if c == end => {
                    self.queue.push_back(ReadEvent::Extant);
                    kind.end_action()
                }
                c => return self.start_value(c, input),
            },
            S::Init | S::AfterAttr => Action::None,
        };
        input.step();
        self.apply(action, input)
    }

    /// Starts the value whose first character is `c`.
    fn start_value(&mut self, c: char, input: &mut Cursor<'_>) -> Result<(), SyntaxError> {
        match c {
            '@' => {
                input.step();
                self.apply(Action::PushNewRecordWithBody(false), input)?;
                self.in_flight = Some(InFlight::AttrNameStart);
                Ok(())
            }
            '{' => {
                input.step();
                self.apply(Action::PushNewRecordWithBody(true), input)
            }
            c => match Scalar::start(c) {
                Some(scalar) => {
                    self.advance_frame();
                    self.in_flight = Some(InFlight::Value(scalar));
                    Ok(())
                }
                None => Err(SyntaxError::new(
                    format!("unexpected '{}'", c),
                    input.location(),
                )),
            },
        }
    }

    fn apply(&mut self, action: Action, input: &Cursor<'_>) -> Result<(), SyntaxError> {
        if action != Action::None {
            trace!(?action, depth = self.stack.len(), "frame action");
        }
        match action {
            Action::PopAfterAttr => {
                self.stack.pop();
                self.queue.push_back(ReadEvent::EndAttribute);
            }
            Action::PopAfterItem => {
                self.stack.pop();
                self.queue.push_back(ReadEvent::EndRecord);
                if self.stack.is_empty() {
                    self.finish_value();
                }
            }
            Action::PushAttr => self.push(FrameState::AttrBodyStartOrNl, input)?,
            Action::PushBody => {
                self.stack.pop();
                self.push(FrameState::RecordBodyStartOrNl, input)?;
                self.queue.push_back(ReadEvent::StartBody);
            }
            Action::PushNewRecordWithBody(true) => {
                self.advance_frame();
                self.push(FrameState::RecordBodyStartOrNl, input)?;
                self.queue.push_back(ReadEvent::StartBody);
            }
            Action::PushNewRecordWithBody(false) => {
                self.advance_frame();
                self.push(FrameState::AfterAttr, input)?;
            }
            Action::None => {}
        }
        Ok(())
    }

    fn push(&mut self, state: FrameState, input: &Cursor<'_>) -> Result<(), SyntaxError> {
        if self.stack.len() >= self.max_depth {
            return Err(SyntaxError::new(
                format!("nesting too deep (limit {})", self.max_depth),
                input.location(),
            ));
        }
        self.stack.push(state);
        Ok(())
    }

    fn set_top(&mut self, state: FrameState) {
        if let Some(top) = self.stack.last_mut() {
            *top = state;
        }
    }

    /// Moves the top frame past the value that is starting in it.
    fn advance_frame(&mut self) {
        match self.stack.last().and_then(|state| state.after_item()) {
            Some(next) => self.set_top(next),
            None => {
                self.stack.pop();
            }
        }
    }

    fn finish_value(&mut self) {
        self.phase = match self.mode {
            Mode::Document => Phase::Trailing,
            Mode::Value => Phase::Complete,
        };
    }

    fn skip_trailing(&mut self, input: &mut Cursor<'_>) -> Result<Step, SyntaxError> {
        loop {
            match input.head() {
                Ok(c) if is_space(c) || c == '\n' => {
                    input.step();
                }
                Ok(c) => {
                    return Err(SyntaxError::new(
                        format!("unexpected '{}' after value", c),
                        input.location(),
                    ))
                }
                Err(Empty::Pending) => return Ok(Step::Pending),
                Err(Empty::Done) => {
                    self.phase = Phase::Complete;
                    return Ok(Step::End);
                }
                Err(Empty::Malformed) => return Err(malformed(input)),
            }
        }
    }
}

/// A [`Tokenizer`] collecting its events, usable wherever a [`Parser`] is.
#[derive(Clone)]
pub struct EventParser {
    tokenizer: Tokenizer,
    events: Vec<ReadEvent>,
}

impl Parser for EventParser {
    type Output = Vec<ReadEvent>;

    fn feed(mut self, input: &mut Cursor<'_>) -> Parse<Self, Vec<ReadEvent>> {
        loop {
            match self.tokenizer.next_event(input) {
                Ok(Step::Event(event)) => self.events.push(event),
                Ok(Step::Pending) => return Parse::Continue(self),
                Ok(Step::End) => return Parse::Done(self.events),
                Err(err) => return Parse::Error(err),
            }
        }
    }
}

/// Tokenizes a complete document.
pub fn tokenize(input: &str) -> Result<Vec<ReadEvent>, SyntaxError> {
    parse_complete(Tokenizer::new().into_parser(), input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Location;
    use crate::value::Number;

    fn text(s: &str) -> ReadEvent {
        ReadEvent::Text(s.to_string())
    }

    fn int(n: i32) -> ReadEvent {
        ReadEvent::Number(Number::Int32(n))
    }

    fn attr(name: &str) -> ReadEvent {
        ReadEvent::StartAttribute(name.to_string())
    }

    use ReadEvent::{EndAttribute, EndRecord, Extant, Slot, StartBody};

    fn tokenize_chunks(chunks: &[&str]) -> Result<Vec<ReadEvent>, SyntaxError> {
        let mut tokenizer = Tokenizer::new();
        let mut carry: Vec<u8> = Vec::new();
        let mut location = Location::start();
        let mut events = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            carry.extend_from_slice(chunk.as_bytes());
            let is_last = i + 1 == chunks.len();
            let mut cursor = Cursor::resume(&carry, location, is_last);
            loop {
                match tokenizer.next_event(&mut cursor)? {
                    Step::Event(event) => events.push(event),
                    Step::Pending | Step::End => break,
                }
            }
            location = cursor.location();
            let consumed = cursor.offset();
            carry.drain(..consumed);
        }
        Ok(events)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(tokenize("42").unwrap(), vec![int(42)]);
        assert_eq!(tokenize("  hello \n").unwrap(), vec![text("hello")]);
        assert_eq!(tokenize("\"a b\"").unwrap(), vec![text("a b")]);
        assert_eq!(tokenize("false").unwrap(), vec![ReadEvent::Boolean(false)]);
        assert_eq!(tokenize("%aGk=").unwrap(), vec![ReadEvent::Blob(b"hi".to_vec())]);
        assert_eq!(tokenize("").unwrap(), vec![Extant]);
        assert_eq!(tokenize(" \n ").unwrap(), vec![Extant]);
    }

    #[test]
    fn test_record_with_header_and_body() {
        assert_eq!(
            tokenize("@point(1){x:2}").unwrap(),
            vec![attr("point"), int(1), EndAttribute, StartBody, text("x"), Slot, int(2), EndRecord]
        );
    }

    #[test]
    fn test_record_without_body_is_closed() {
        assert_eq!(
            tokenize("@a @b(x:1)").unwrap(),
            vec![
                attr("a"),
                EndAttribute,
                attr("b"),
                text("x"),
                Slot,
                int(1),
                EndAttribute,
                StartBody,
                EndRecord
            ]
        );
        assert_eq!(
            tokenize("{@a,1}").unwrap(),
            vec![StartBody, attr("a"), EndAttribute, StartBody, EndRecord, int(1), EndRecord]
        );
    }

    #[test]
    fn test_quoted_attribute_name() {
        assert_eq!(
            tokenize("@\"two words\"").unwrap(),
            vec![attr("two words"), EndAttribute, StartBody, EndRecord]
        );
    }

    #[test]
    fn test_separators_and_empty_items() {
        let expected = vec![StartBody, int(1), int(2), int(3), EndRecord];
        assert_eq!(tokenize("{1,2,3}").unwrap(), expected);
        assert_eq!(tokenize("{1\n2\n\n3}").unwrap(), expected);
        assert_eq!(tokenize("{ 1 ,\n 2 , 3 }").unwrap(), expected);

        assert_eq!(
            tokenize("{1,,2}").unwrap(),
            vec![StartBody, int(1), Extant, int(2), EndRecord]
        );
        assert_eq!(tokenize("{1,}").unwrap(), vec![StartBody, int(1), Extant, EndRecord]);
        assert_eq!(tokenize("{}").unwrap(), vec![StartBody, EndRecord]);
    }

    #[test]
    fn test_slots_with_missing_parts() {
        assert_eq!(
            tokenize("{a:,b:}").unwrap(),
            vec![StartBody, text("a"), Slot, Extant, text("b"), Slot, Extant, EndRecord]
        );
        assert_eq!(
            tokenize("{:1}").unwrap(),
            vec![StartBody, Extant, Slot, int(1), EndRecord]
        );
    }

    #[test]
    fn test_nested_records() {
        assert_eq!(
            tokenize("{a:{1},b:@c}").unwrap(),
            vec![
                StartBody,
                text("a"),
                Slot,
                StartBody,
                int(1),
                EndRecord,
                text("b"),
                Slot,
                attr("c"),
                EndAttribute,
                StartBody,
                EndRecord,
                EndRecord
            ]
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(tokenize("{1 2}").is_err());
        assert!(tokenize("{a::b}").is_err());
        assert!(tokenize("{1").is_err());
        assert!(tokenize("{1)").is_err());
        assert!(tokenize("@(1)").is_err());
        assert!(tokenize("1 2").is_err());
        assert!(tokenize("}").is_err());
        let err = tokenize("{a:1,\n  ]}").unwrap_err();
        assert_eq!((err.location.line, err.location.column), (2, 3));
    }

    #[test]
    fn test_errors_are_sticky() {
        let mut tokenizer = Tokenizer::new();
        let mut cursor = Cursor::complete("}");
        assert!(tokenizer.next_event(&mut cursor).is_err());
        let mut cursor = Cursor::complete("1");
        assert!(tokenizer.next_event(&mut cursor).is_err());
        tokenizer.reset();
        let mut cursor = Cursor::complete("1");
        assert_eq!(tokenizer.next_event(&mut cursor).unwrap(), Step::Event(int(1)));
    }

    #[test]
    fn test_max_depth() {
        let options = ReconOptions::new().with_max_depth(2);
        let run = |text: &str| parse_complete(Tokenizer::with_options(&options).into_parser(), text);
        assert!(run("{{1}}").is_ok());
        let err = run("{{{1}}}").unwrap_err();
        assert!(err.cause.contains("nesting too deep"));
    }

    #[test]
    fn test_chunked_input_matches_whole() {
        let whole = "@update(key:\"x\\u0041\"){0x1F,-2.5e1,%aGk=,true}";
        let expected = tokenize(whole).unwrap();
        for split in 0..=whole.len() {
            let (a, b) = whole.split_at(split);
            assert_eq!(tokenize_chunks(&[a, b]).unwrap(), expected, "split at {}", split);
        }
    }

    #[test]
    fn test_embedded_stops_after_value() {
        let mut tokenizer = Tokenizer::embedded(&ReconOptions::default());
        let mut cursor = Cursor::complete("{1} rest");
        let mut events = Vec::new();
        loop {
            match tokenizer.next_event(&mut cursor).unwrap() {
                Step::Event(event) => events.push(event),
                Step::End => break,
                Step::Pending => panic!("unexpected pending"),
            }
        }
        assert_eq!(events, vec![StartBody, int(1), EndRecord]);
        assert_eq!(cursor.offset(), 3);
        assert!(tokenizer.is_complete());
    }
}
