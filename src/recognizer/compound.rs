//! Recognizers for records with named and positional fields.
//!
//! A [`RecordRecognizer`] walks the structure of a record and routes every
//! value it finds to a field, identified by a [`FieldKey`]:
//!
//! ```text
//! @point(z: 3) @units(metric) { x: 1, y: 2, 9 }
//!  |     |      |      |        |     |     +-- Item(Index(0))
//!  |     |      |      |        |     +-------- Item(Name("y"))
//!  |     |      |      |        +-------------- Item(Name("x"))
//!  |     |      |      +----------------------- Attr("units")
//!  |     |      +------------------------------ Attr("units")
//!  |     +------------------------------------- HeaderSlot("z")
//!  +------------------------------------------- Tag (or a fixed tag)
//! ```
//!
//! A type describes its fields by implementing [`RecordFields`]; the
//! recognizer takes care of the event grammar. Header values may be
//! addressed positionally ([`FieldKey::HeaderBody`] is the first value item
//! of the tag attribute) or by name, and body items likewise.
//!
//! Unknown fields are errors, as is a field that occurs twice.

use super::{Recognizable, Recognizer};
use crate::error::ReadError;
use crate::event::ReadEvent;
use std::fmt;
use std::mem;

/// Address of an item within a record body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKey<'a> {
    /// A slot with this text key.
    Name(&'a str),
    /// The n-th value item (slots are not counted).
    Index(usize),
}

/// Address of a value within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey<'a> {
    /// The name of the first attribute.
    Tag,
    /// The whole body of the first attribute, delivered as a record.
    Header,
    /// The first value item of the first attribute.
    HeaderBody,
    /// The value of a named attribute other than the first.
    Attr(&'a str),
    /// A slot within the first attribute.
    HeaderSlot(&'a str),
    /// An item of the record body.
    Item(ItemKey<'a>),
}

impl fmt::Display for FieldKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Tag => f.write_str("tag"),
            FieldKey::Header => f.write_str("header"),
            FieldKey::HeaderBody => f.write_str("header body"),
            FieldKey::Attr(name) => write!(f, "@{}", name),
            FieldKey::HeaderSlot(name) => write!(f, "header slot {}", name),
            FieldKey::Item(ItemKey::Name(name)) => f.write_str(name),
            FieldKey::Item(ItemKey::Index(index)) => write!(f, "item {}", index),
        }
    }
}

/// The fields of a compound type.
pub trait RecordFields {
    type Target;

    /// The name the first attribute must have, if the type is tagged.
    fn tag(&self) -> Option<&str> {
        None
    }

    /// The field receiving the value at `key`, or `None` if there is none.
    fn select(&self, key: FieldKey<'_>) -> Option<u32>;

    /// Feeds an event to a field; `Some(Ok(()))` once the field has its value.
    fn feed_field(&mut self, field: u32, event: ReadEvent) -> Option<Result<(), ReadError>>;

    /// Assembles the target once the record has ended.
    fn finish(&mut self) -> Result<Self::Target, ReadError>;

    fn reset(&mut self);
}

/// Holds the recognizer and the decoded value of one field.
pub struct Field<R: Recognizer> {
    name: &'static str,
    recognizer: R,
    value: Option<R::Target>,
}

/// A [`Field`] using the canonical recognizer of `T`.
pub fn field<T: Recognizable>(name: &'static str) -> Field<T::Rec> {
    Field::new(name, T::make_recognizer())
}

impl<R: Recognizer> Field<R> {
    pub fn new(name: &'static str, recognizer: R) -> Self {
        Field {
            name,
            recognizer,
            value: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn feed(&mut self, event: ReadEvent) -> Option<Result<(), ReadError>> {
        if self.value.is_some() {
            return Some(Err(ReadError::DuplicateField(self.name.to_string())));
        }
        match self.recognizer.feed_event(event)? {
            Ok(value) => {
                self.value = Some(value);
                self.recognizer.reset();
                Some(Ok(()))
            }
            Err(err) => Some(Err(err)),
        }
    }

    pub fn take(&mut self) -> Option<R::Target> {
        self.value.take()
    }

    /// Takes the value, failing with [`ReadError::MissingField`] if absent.
    pub fn take_required(&mut self) -> Result<R::Target, ReadError> {
        self.value
            .take()
            .ok_or_else(|| ReadError::MissingField(self.name.to_string()))
    }

    pub fn reset(&mut self) {
        self.value = None;
        self.recognizer.reset();
    }
}

impl<R> Field<R>
where
    R: Recognizer,
    R::Target: Default,
{
    pub fn take_or_default(&mut self) -> R::Target {
        self.value.take().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Init,
    HeaderItems,
    HeaderWhole { field: u32, depth: i32 },
    Attrs,
    Attr { field: u32, events: Vec<ReadEvent>, depth: i32 },
    Body,
    Complete,
}

/// Recognizes a record through its [`RecordFields`].
pub struct RecordRecognizer<F> {
    fields: F,
    stage: Stage,
    // A scalar item that becomes a slot key if the next event is `Slot`.
    pending: Option<ReadEvent>,
    key: Option<String>,
    index: usize,
    active: Option<u32>,
}

impl<F: RecordFields> RecordRecognizer<F> {
    pub fn new(fields: F) -> Self {
        RecordRecognizer {
            fields,
            stage: Stage::Init,
            pending: None,
            key: None,
            index: 0,
            active: None,
        }
    }

    fn select(&self, key: FieldKey<'_>) -> Result<u32, ReadError> {
        self.fields
            .select(key)
            .ok_or_else(|| ReadError::UnexpectedField(key.to_string()))
    }

    /// Feeds a field, returning whether it is complete.
    fn feed_field(&mut self, field: u32, event: ReadEvent) -> Result<bool, ReadError> {
        match self.fields.feed_field(field, event) {
            None => Ok(false),
            Some(Ok(())) => Ok(true),
            Some(Err(err)) => Err(err),
        }
    }

    fn start_items(&mut self, stage: Stage) {
        self.stage = stage;
        self.index = 0;
        self.pending = None;
        self.key = None;
        self.active = None;
    }

    fn enter_header(&mut self) -> Result<(), ReadError> {
        match self.fields.select(FieldKey::Header) {
            Some(field) => {
                self.stage = Stage::HeaderWhole { field, depth: 0 };
                if self.feed_field(field, ReadEvent::StartBody)? {
                    return Err(ReadError::unexpected("a header record", "start of record body"));
                }
            }
            None => self.start_items(Stage::HeaderItems),
        }
        Ok(())
    }

    fn enter_attr(&mut self, name: &str) -> Result<(), ReadError> {
        let field = self.select(FieldKey::Attr(name))?;
        self.stage = Stage::Attr {
            field,
            events: Vec::new(),
            depth: 0,
        };
        Ok(())
    }

    /// Feeds the value of an attribute body to its field.
    fn feed_attr(&mut self, field: u32, events: Vec<ReadEvent>) -> Result<(), ReadError> {
        let events = attr_value(events);
        let last = events.len() - 1;
        for (index, event) in events.into_iter().enumerate() {
            if self.feed_field(field, event)? {
                if index != last {
                    return Err(ReadError::unexpected("the end of the attribute", "more items"));
                }
                return Ok(());
            }
        }
        Err(ReadError::IncompleteRecord)
    }

    fn route(&self, section: Section, item: ItemKey<'_>) -> Result<u32, ReadError> {
        let key = match (section, item) {
            (Section::Header, ItemKey::Name(name)) => FieldKey::HeaderSlot(name),
            (Section::Header, ItemKey::Index(0)) => FieldKey::HeaderBody,
            (Section::Header, ItemKey::Index(index)) => {
                return Err(ReadError::UnexpectedField(format!("header item {}", index)))
            }
            (Section::Body, item) => FieldKey::Item(item),
        };
        self.select(key)
    }

    /// Delivers a positional item, starting with `event`.
    fn positional(&mut self, section: Section, event: ReadEvent) -> Result<(), ReadError> {
        let field = self.route(section, ItemKey::Index(self.index))?;
        self.index += 1;
        if !self.feed_field(field, event)? {
            self.active = Some(field);
        }
        Ok(())
    }

    /// Handles an event inside a header or body. Returns `true` when the
    /// section has been closed.
    fn feed_item(&mut self, section: Section, event: ReadEvent) -> Result<bool, ReadError> {
        if let Some(field) = self.active {
            if self.feed_field(field, event)? {
                self.active = None;
            }
            return Ok(false);
        }
        if let Some(pending) = self.pending.take() {
            if event == ReadEvent::Slot {
                return match pending {
                    ReadEvent::Text(key) => {
                        self.key = Some(key);
                        Ok(false)
                    }
                    other => Err(ReadError::unexpected("a text slot key", other)),
                };
            }
            self.positional(section, pending)?;
            if self.active.is_some() {
                return Err(ReadError::IncompleteRecord);
            }
        }
        if let Some(key) = self.key.take() {
            let field = self.route(section, ItemKey::Name(&key))?;
            if !self.feed_field(field, event)? {
                self.active = Some(field);
            }
            return Ok(false);
        }
        let closing = match section {
            Section::Header => ReadEvent::EndAttribute,
            Section::Body => ReadEvent::EndRecord,
        };
        match event {
            event if event == closing => Ok(true),
            ReadEvent::Slot => Err(ReadError::unexpected("a text slot key", "record")),
            event if event.is_scalar() => {
                self.pending = Some(event);
                Ok(false)
            }
            event @ (ReadEvent::StartAttribute(_) | ReadEvent::StartBody) => {
                self.positional(section, event)?;
                Ok(false)
            }
            other => Err(ReadError::unexpected("an item", other)),
        }
    }

    fn step(&mut self, event: ReadEvent) -> Result<Option<F::Target>, ReadError> {
        match mem::replace(&mut self.stage, Stage::Complete) {
            Stage::Init => match event {
                ReadEvent::StartAttribute(name) => {
                    let tag_matches = self.fields.tag().map(|tag| tag == name);
                    match tag_matches {
                        Some(true) => self.enter_header()?,
                        Some(false) => {
                            let expected = self.fields.tag().unwrap_or_default().to_string();
                            return Err(ReadError::UnexpectedTag {
                                expected,
                                found: name,
                            });
                        }
                        None => match self.fields.select(FieldKey::Tag) {
                            Some(field) => {
                                if !self.feed_field(field, ReadEvent::Text(name))? {
                                    return Err(ReadError::unexpected("a tag field", "text"));
                                }
                                self.enter_header()?;
                            }
                            None => self.enter_attr(&name)?,
                        },
                    }
                }
                ReadEvent::StartBody => {
                    if let Some(tag) = self.fields.tag() {
                        return Err(ReadError::UnexpectedTag {
                            expected: tag.to_string(),
                            found: String::new(),
                        });
                    }
                    self.start_items(Stage::Body);
                }
                other => return Err(ReadError::unexpected("a record", other)),
            },
            Stage::HeaderItems => {
                self.stage = Stage::HeaderItems;
                if self.feed_item(Section::Header, event)? {
                    self.stage = Stage::Attrs;
                }
            }
            Stage::HeaderWhole { field, depth } => {
                if depth == 0 && event == ReadEvent::EndAttribute {
                    if !self.feed_field(field, ReadEvent::EndRecord)? {
                        return Err(ReadError::IncompleteRecord);
                    }
                    self.stage = Stage::Attrs;
                } else {
                    let depth = depth + event.depth_change();
                    if self.feed_field(field, event)? {
                        return Err(ReadError::unexpected("the end of the header", "more items"));
                    }
                    self.stage = Stage::HeaderWhole { field, depth };
                }
            }
            Stage::Attrs => match event {
                ReadEvent::StartAttribute(name) => self.enter_attr(&name)?,
                ReadEvent::StartBody => self.start_items(Stage::Body),
                other => return Err(ReadError::unexpected("an attribute or body", other)),
            },
            Stage::Attr {
                field,
                mut events,
                depth,
            } => {
                if depth == 0 && event == ReadEvent::EndAttribute {
                    self.feed_attr(field, events)?;
                    self.stage = Stage::Attrs;
                } else {
                    let depth = depth + event.depth_change();
                    events.push(event);
                    self.stage = Stage::Attr {
                        field,
                        events,
                        depth,
                    };
                }
            }
            Stage::Body => {
                self.stage = Stage::Body;
                if self.feed_item(Section::Body, event)? {
                    self.stage = Stage::Complete;
                    return self.fields.finish().map(Some);
                }
            }
            Stage::Complete => {
                return Err(ReadError::unexpected("no more events", event));
            }
        }
        Ok(None)
    }
}

/// The events of an attribute's value: extant for an empty body, the item
/// itself for a single value item and a record of the items otherwise.
fn attr_value(mut events: Vec<ReadEvent>) -> Vec<ReadEvent> {
    if events.is_empty() {
        return vec![ReadEvent::Extant];
    }
    if is_single_value(&events) {
        return events;
    }
    events.insert(0, ReadEvent::StartBody);
    events.push(ReadEvent::EndRecord);
    events
}

fn is_single_value(events: &[ReadEvent]) -> bool {
    let mut depth = 0;
    let mut items = 0;
    // Inside a record item whose body has not closed yet.
    let mut open = false;
    for event in events {
        if depth == 0 {
            match event {
                ReadEvent::Slot => return false,
                event if event.is_scalar() => items += 1,
                ReadEvent::StartAttribute(_) | ReadEvent::StartBody if !open => {
                    items += 1;
                    open = true;
                }
                _ => {}
            }
        }
        depth += event.depth_change();
        if depth == 0 && *event == ReadEvent::EndRecord {
            open = false;
        }
    }
    items == 1
}

impl<F: RecordFields> Recognizer for RecordRecognizer<F> {
    type Target = F::Target;

    fn feed_event(&mut self, event: ReadEvent) -> Option<Result<F::Target, ReadError>> {
        match self.step(event) {
            Ok(None) => None,
            Ok(Some(target)) => Some(Ok(target)),
            Err(err) => {
                self.stage = Stage::Complete;
                Some(Err(err))
            }
        }
    }

    fn reset(&mut self) {
        self.fields.reset();
        self.stage = Stage::Init;
        self.pending = None;
        self.key = None;
        self.index = 0;
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::recognize_events;
    use crate::tokenizer::tokenize;
    use crate::value::Value;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: Option<String>,
    }

    struct PointFields {
        x: Field<<i32 as Recognizable>::Rec>,
        y: Field<<i32 as Recognizable>::Rec>,
        label: Field<<String as Recognizable>::Rec>,
    }

    impl RecordFields for PointFields {
        type Target = Point;

        fn tag(&self) -> Option<&str> {
            Some("point")
        }

        fn select(&self, key: FieldKey<'_>) -> Option<u32> {
            match key {
                FieldKey::Item(ItemKey::Name("x") | ItemKey::Index(0)) => Some(0),
                FieldKey::Item(ItemKey::Name("y") | ItemKey::Index(1)) => Some(1),
                FieldKey::HeaderBody | FieldKey::Attr("label") => Some(2),
                _ => None,
            }
        }

        fn feed_field(&mut self, field: u32, event: ReadEvent) -> Option<Result<(), ReadError>> {
            match field {
                0 => self.x.feed(event),
                1 => self.y.feed(event),
                _ => self.label.feed(event),
            }
        }

        fn finish(&mut self) -> Result<Point, ReadError> {
            Ok(Point {
                x: self.x.take_required()?,
                y: self.y.take_required()?,
                label: self.label.take(),
            })
        }

        fn reset(&mut self) {
            self.x.reset();
            self.y.reset();
            self.label.reset();
        }
    }

    fn point_recognizer() -> RecordRecognizer<PointFields> {
        RecordRecognizer::new(PointFields {
            x: field::<i32>("x"),
            y: field::<i32>("y"),
            label: field::<String>("label"),
        })
    }

    fn recognize_point(text: &str) -> Result<Point, ReadError> {
        recognize_events(&mut point_recognizer(), tokenize(text).unwrap())
    }

    #[test]
    fn test_named_and_positional_fields() {
        let expected = Point {
            x: 1,
            y: 2,
            label: None,
        };
        assert_eq!(recognize_point("@point{x:1,y:2}").unwrap(), expected);
        assert_eq!(recognize_point("@point{y:2,x:1}").unwrap(), expected);
        assert_eq!(recognize_point("@point{1,2}").unwrap(), expected);
    }

    #[test]
    fn test_header_body_and_attribute() {
        let point = recognize_point("@point(origin){x:0,y:0}").unwrap();
        assert_eq!(point.label.as_deref(), Some("origin"));

        let point = recognize_point("@point @label(centre) {x:0,y:0}").unwrap();
        assert_eq!(point.label.as_deref(), Some("centre"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            recognize_point("@line{x:1,y:2}"),
            Err(ReadError::UnexpectedTag { .. })
        ));
        assert!(matches!(
            recognize_point("@point{x:1}"),
            Err(ReadError::MissingField(name)) if name == "y"
        ));
        assert!(matches!(
            recognize_point("@point{x:1,y:2,z:3}"),
            Err(ReadError::UnexpectedField(name)) if name == "z"
        ));
        assert!(matches!(
            recognize_point("@point{x:1,x:2,y:3}"),
            Err(ReadError::DuplicateField(name)) if name == "x"
        ));
        assert!(matches!(
            recognize_point("@point{x:1,y:99999999999}"),
            Err(ReadError::NumberOutOfRange { .. })
        ));
    }

    #[test]
    fn test_reset_between_records() {
        let mut recognizer = point_recognizer();
        assert!(recognize_events(&mut recognizer, tokenize("@point{x:1}").unwrap()).is_err());
        recognizer.reset();
        let point = recognize_events(&mut recognizer, tokenize("@point{x:3,y:4}").unwrap()).unwrap();
        assert_eq!((point.x, point.y), (3, 4));
    }

    struct Tagged {
        tag: Field<<String as Recognizable>::Rec>,
        header: Field<<Value as Recognizable>::Rec>,
    }

    impl RecordFields for Tagged {
        type Target = (String, Value);

        fn select(&self, key: FieldKey<'_>) -> Option<u32> {
            match key {
                FieldKey::Tag => Some(0),
                FieldKey::Header => Some(1),
                _ => None,
            }
        }

        fn feed_field(&mut self, field: u32, event: ReadEvent) -> Option<Result<(), ReadError>> {
            if field == 0 {
                self.tag.feed(event)
            } else {
                self.header.feed(event)
            }
        }

        fn finish(&mut self) -> Result<(String, Value), ReadError> {
            Ok((self.tag.take_required()?, self.header.take_required()?))
        }

        fn reset(&mut self) {
            self.tag.reset();
            self.header.reset();
        }
    }

    #[test]
    fn test_dynamic_tag_and_whole_header() {
        let mut recognizer = RecordRecognizer::new(Tagged {
            tag: field::<String>("tag"),
            header: field::<Value>("header"),
        });
        let (tag, header) =
            recognize_events(&mut recognizer, tokenize("@event(a:1,{2})").unwrap()).unwrap();
        assert_eq!(tag, "event");
        assert_eq!(header, "{a:1,{2}}".parse::<Value>().unwrap());
    }

    struct Annotated {
        x: Field<<i32 as Recognizable>::Rec>,
        meta: Field<<Value as Recognizable>::Rec>,
    }

    impl RecordFields for Annotated {
        type Target = (i32, Value);

        fn tag(&self) -> Option<&str> {
            Some("point")
        }

        fn select(&self, key: FieldKey<'_>) -> Option<u32> {
            match key {
                FieldKey::Item(ItemKey::Name("x")) => Some(0),
                FieldKey::Attr("meta") => Some(1),
                _ => None,
            }
        }

        fn feed_field(&mut self, field: u32, event: ReadEvent) -> Option<Result<(), ReadError>> {
            if field == 0 {
                self.x.feed(event)
            } else {
                self.meta.feed(event)
            }
        }

        fn finish(&mut self) -> Result<(i32, Value), ReadError> {
            Ok((self.x.take_required()?, self.meta.take_required()?))
        }

        fn reset(&mut self) {
            self.x.reset();
            self.meta.reset();
        }
    }

    fn recognize_meta(text: &str) -> Result<Value, ReadError> {
        let mut recognizer = RecordRecognizer::new(Annotated {
            x: field::<i32>("x"),
            meta: field::<Value>("meta"),
        });
        let (x, meta) = recognize_events(&mut recognizer, tokenize(text).unwrap())?;
        assert_eq!(x, 1);
        Ok(meta)
    }

    #[test]
    fn test_attribute_field_values() {
        let parse = |text: &str| text.parse::<Value>().unwrap();
        assert_eq!(recognize_meta("@point @meta {x:1}").unwrap(), Value::Extant);
        assert_eq!(recognize_meta("@point @meta() {x:1}").unwrap(), Value::Extant);
        assert_eq!(recognize_meta("@point @meta(7) {x:1}").unwrap(), Value::from(7));
        assert_eq!(
            recognize_meta("@point @meta(a:1,b:2) {x:1}").unwrap(),
            parse("{a:1,b:2}")
        );
        assert_eq!(recognize_meta("@point @meta(k:v) {x:1}").unwrap(), parse("{k:v}"));
        assert_eq!(recognize_meta("@point @meta(1,2) {x:1}").unwrap(), parse("{1,2}"));
        assert_eq!(recognize_meta("@point @meta({1}) {x:1}").unwrap(), parse("{1}"));
        assert_eq!(
            recognize_meta("@point @meta(@tag(1){2}) {x:1}").unwrap(),
            parse("@tag(1){2}")
        );
        assert_eq!(
            recognize_meta("@point @meta(@tag,3) {x:1}").unwrap(),
            parse("{@tag,3}")
        );
    }

    #[test]
    fn test_attribute_field_matches_attribute_value() {
        for body in ["", "()", "(7)", "(a:1,b:2)", "(1,,2)", "({x})", "(@b(1))"] {
            let text = format!("@point @meta{} {{x:1}}", body);
            let parsed = parse_attr_value(&text);
            assert_eq!(recognize_meta(&text).unwrap(), parsed, "{}", text);
        }
    }

    fn parse_attr_value(text: &str) -> Value {
        let value: Value = text.parse().unwrap();
        value.as_record().unwrap().attrs[1].value.clone()
    }
}
