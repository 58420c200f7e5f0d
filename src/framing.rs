//! Length-prefixed binary framing of map messages.
//!
//! A stream of [`MapMessage`]s is sent as a sequence of frames:
//!
//! ```text
//! +----------------+---------+-----------------------------------------+
//! | length: u32 LE | tag: u8 | payload                                 |
//! +----------------+---------+-----------------------------------------+
//!
//! tag 0 (update): [key length: u32 LE][key as Recon][value as Recon]
//! tag 1 (remove): [key as Recon]
//! tag 2 (clear):  (empty)
//! ```
//!
//! The length counts every byte after the length field itself. Keys and
//! values are written and read with the same [`Writable`] and
//! [`Recognizable`] implementations as their text form.
//!
//! [`MapMessageDecoder`] is incremental: a frame may arrive split at any
//! byte, and a buffer may hold several frames. Each call decodes at most one
//! message and leaves the bytes of later frames in the buffer.
//!
//! ## Examples
//!
//! ```rust
//! use bytes::BytesMut;
//! use recon_codec::decoder::{DecodeOutcome, Decoder};
//! use recon_codec::framing::{MapMessage, MapMessageDecoder, MapMessageEncoder};
//!
//! let encoder = MapMessageEncoder::new();
//! let mut buf = BytesMut::new();
//! encoder.encode(&MapMessage::Update { key: 1, value: 2 }, &mut buf).unwrap();
//! encoder.encode(&MapMessage::<i32, i32>::Clear, &mut buf).unwrap();
//!
//! let mut decoder = MapMessageDecoder::<i32, i32>::new();
//! let first = decoder.decode(&mut buf).unwrap();
//! assert_eq!(first, DecodeOutcome::Complete(MapMessage::Update { key: 1, value: 2 }));
//! decoder.reset();
//! let second = decoder.decode(&mut buf).unwrap();
//! assert_eq!(second, DecodeOutcome::Complete(MapMessage::Clear));
//! ```

use crate::decoder::{DecodeOutcome, Decoder, ReconDecoder};
use crate::error::{Error, ReadError, Result};
use crate::event::ReadEvent;
use crate::options::ReconOptions;
use crate::recognizer::compound::field;
use crate::recognizer::{Field, FieldKey, Recognizable, Recognizer, RecordFields, RecordRecognizer};
use crate::writer::{
    print_with_options, BodyWriter, HeaderWriter, RecordBodyKind, StructuralWriter, Writable,
};
use bytes::{Buf, BufMut, BytesMut};
use std::mem;
use tracing::debug;

const LENGTH_SIZE: usize = 4;
const HEADER_SIZE: usize = LENGTH_SIZE + 1;

/// An operation on a remote map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapMessage<K, V> {
    Update { key: K, value: V },
    Remove { key: K },
    Clear,
}

impl<K, V> MapMessage<K, V> {
    #[must_use]
    pub fn tag(&self) -> MessageTag {
        match self {
            MapMessage::Update { .. } => MessageTag::Update,
            MapMessage::Remove { .. } => MessageTag::Remove,
            MapMessage::Clear => MessageTag::Clear,
        }
    }
}

/// The kind byte of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageTag {
    Update = 0,
    Remove = 1,
    Clear = 2,
}

impl MessageTag {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(MessageTag::Update),
            1 => Ok(MessageTag::Remove),
            2 => Ok(MessageTag::Clear),
            other => Err(Error::frame(format!("unknown message tag {}", other))),
        }
    }

    /// The attribute naming this kind in the text form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MessageTag::Update => "update",
            MessageTag::Remove => "remove",
            MessageTag::Clear => "clear",
        }
    }
}

/// Writes a `u32` little-endian length followed by whatever `write` puts in
/// `dst`, back-patching the length once it is known.
///
/// ```rust
/// use bytes::{BufMut, BytesMut};
/// use recon_codec::framing::encode_with_length;
///
/// let mut buf = BytesMut::new();
/// encode_with_length(&mut buf, |dst| {
///     dst.put_slice(b"abc");
///     Ok(())
/// })
/// .unwrap();
/// assert_eq!(&buf[..], b"\x03\x00\x00\x00abc");
/// ```
pub fn encode_with_length<F>(dst: &mut BytesMut, write: F) -> Result<()>
where
    F: FnOnce(&mut BytesMut) -> Result<()>,
{
    let start = dst.len();
    dst.put_u32_le(0);
    write(dst)?;
    let len = dst.len() - start - LENGTH_SIZE;
    let len = u32::try_from(len)
        .map_err(|_| Error::frame(format!("payload of {} bytes is too long", len)))?;
    dst[start..start + LENGTH_SIZE].copy_from_slice(&len.to_le_bytes());
    Ok(())
}

/// Encodes items into a byte buffer.
pub trait Encoder<Item: ?Sized> {
    fn encode(&self, item: &Item, dst: &mut BytesMut) -> Result<()>;
}

/// Frames [`MapMessage`]s.
#[derive(Debug, Clone, Default)]
pub struct MapMessageEncoder {
    options: ReconOptions,
}

impl MapMessageEncoder {
    #[must_use]
    pub fn new() -> Self {
        MapMessageEncoder::default()
    }

    #[must_use]
    pub fn with_options(options: ReconOptions) -> Self {
        MapMessageEncoder { options }
    }

    fn put_text<T: Writable + ?Sized>(&self, value: &T, dst: &mut BytesMut) -> Result<()> {
        let text = print_with_options(value, &self.options)?;
        dst.put_slice(text.as_bytes());
        Ok(())
    }
}

impl<K: Writable, V: Writable> Encoder<MapMessage<K, V>> for MapMessageEncoder {
    fn encode(&self, message: &MapMessage<K, V>, dst: &mut BytesMut) -> Result<()> {
        encode_with_length(dst, |dst| {
            dst.put_u8(message.tag() as u8);
            match message {
                MapMessage::Update { key, value } => {
                    encode_with_length(dst, |dst| self.put_text(key, dst))?;
                    self.put_text(value, dst)
                }
                MapMessage::Remove { key } => self.put_text(key, dst),
                MapMessage::Clear => Ok(()),
            }
        })
    }
}

impl MapMessageEncoder {
    /// Appends one framed message to `dst`.
    pub fn encode<K: Writable, V: Writable>(
        &self,
        message: &MapMessage<K, V>,
        dst: &mut BytesMut,
    ) -> Result<()> {
        Encoder::encode(self, message, dst)
    }
}

enum Stage<K> {
    Header,
    KeyLength { left: usize },
    Key { tag: MessageTag, region: usize, left: usize },
    Value { key: K, region: usize },
    Done,
    Failed(Error),
}

/// Incrementally decodes framed [`MapMessage`]s.
pub struct MapMessageDecoder<K: Recognizable, V: Recognizable> {
    key: ReconDecoder<K::Rec>,
    value: ReconDecoder<V::Rec>,
    stage: Stage<K>,
    frame_len: usize,
}

impl<K: Recognizable, V: Recognizable> Default for MapMessageDecoder<K, V> {
    fn default() -> Self {
        MapMessageDecoder::new()
    }
}

/// Feeds the available part of a region to `decoder`, returning the value
/// once the region is complete along with the bytes of the region left.
fn feed_region<R: Recognizer>(
    decoder: &mut ReconDecoder<R>,
    src: &mut BytesMut,
    region: usize,
) -> Result<(Option<R::Target>, usize)> {
    let available = region.min(src.len());
    let is_last = available == region;
    let (outcome, consumed) = decoder.decode_slice(&src[..available], is_last)?;
    src.advance(consumed);
    let region = region - consumed;
    match outcome {
        DecodeOutcome::Complete(value) if region == 0 => Ok((Some(value), 0)),
        DecodeOutcome::Complete(_) => Err(Error::frame(format!(
            "{} unread bytes after a complete value",
            region
        ))),
        DecodeOutcome::Incomplete => Ok((None, region)),
    }
}

impl<K: Recognizable, V: Recognizable> MapMessageDecoder<K, V> {
    #[must_use]
    pub fn new() -> Self {
        MapMessageDecoder::with_options(&ReconOptions::default())
    }

    #[must_use]
    pub fn with_options(options: &ReconOptions) -> Self {
        MapMessageDecoder {
            key: ReconDecoder::with_options(K::make_recognizer(), options),
            value: ReconDecoder::with_options(V::make_recognizer(), options),
            stage: Stage::Header,
            frame_len: 0,
        }
    }

    fn complete(&mut self, message: MapMessage<K, V>) -> Result<DecodeOutcome<MapMessage<K, V>>> {
        debug!(
            tag = message.tag().name(),
            frame_len = self.frame_len,
            "decoded map message"
        );
        self.stage = Stage::Done;
        Ok(DecodeOutcome::Complete(message))
    }

    fn step(&mut self, src: &mut BytesMut) -> Result<DecodeOutcome<MapMessage<K, V>>> {
        loop {
            match mem::replace(&mut self.stage, Stage::Done) {
                Stage::Header => {
                    if src.len() < HEADER_SIZE {
                        self.stage = Stage::Header;
                        return Ok(DecodeOutcome::Incomplete);
                    }
                    let len = src.get_u32_le() as usize;
                    let tag = MessageTag::from_byte(src.get_u8())?;
                    self.frame_len = len;
                    let left = len
                        .checked_sub(1)
                        .ok_or_else(|| Error::frame("frame length does not cover the tag"))?;
                    match tag {
                        MessageTag::Clear if left == 0 => return self.complete(MapMessage::Clear),
                        MessageTag::Clear => {
                            return Err(Error::frame(format!(
                                "clear message with a {} byte payload",
                                left
                            )))
                        }
                        MessageTag::Remove => {
                            self.stage = Stage::Key {
                                tag,
                                region: left,
                                left: 0,
                            }
                        }
                        MessageTag::Update if left < LENGTH_SIZE => {
                            return Err(Error::frame("update message without a key length"))
                        }
                        MessageTag::Update => self.stage = Stage::KeyLength { left },
                    }
                }
                Stage::KeyLength { left } => {
                    if src.len() < LENGTH_SIZE {
                        self.stage = Stage::KeyLength { left };
                        return Ok(DecodeOutcome::Incomplete);
                    }
                    let key_len = src.get_u32_le() as usize;
                    let left = left - LENGTH_SIZE;
                    if key_len > left {
                        return Err(Error::frame(format!(
                            "key length {} exceeds the {} bytes left in the frame",
                            key_len, left
                        )));
                    }
                    self.stage = Stage::Key {
                        tag: MessageTag::Update,
                        region: key_len,
                        left: left - key_len,
                    };
                }
                Stage::Key { tag, region, left } => {
                    match feed_region(&mut self.key, src, region)? {
                        (Some(key), _) if tag == MessageTag::Remove => {
                            return self.complete(MapMessage::Remove { key })
                        }
                        (Some(key), _) => self.stage = Stage::Value { key, region: left },
                        (None, region) => {
                            self.stage = Stage::Key { tag, region, left };
                            return Ok(DecodeOutcome::Incomplete);
                        }
                    }
                }
                Stage::Value { key, region } => match feed_region(&mut self.value, src, region)? {
                    (Some(value), _) => return self.complete(MapMessage::Update { key, value }),
                    (None, region) => {
                        self.stage = Stage::Value { key, region };
                        return Ok(DecodeOutcome::Incomplete);
                    }
                },
                Stage::Done => {
                    return Err(Error::custom(
                        "map message decoder fed after completing; reset it first",
                    ))
                }
                Stage::Failed(err) => {
                    self.stage = Stage::Failed(err.clone());
                    return Err(err);
                }
            }
        }
    }
}

impl<K: Recognizable, V: Recognizable> Decoder for MapMessageDecoder<K, V> {
    type Item = MapMessage<K, V>;

    fn decode(&mut self, src: &mut BytesMut) -> Result<DecodeOutcome<MapMessage<K, V>>> {
        self.step(src).map_err(|err| {
            if !matches!(self.stage, Stage::Failed(_)) {
                debug!(%err, "map message decoding failed");
                self.stage = Stage::Failed(err.clone());
            }
            err
        })
    }

    /// Frames carry their own length, so the end of input changes nothing
    /// except that an incomplete frame is an error.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<DecodeOutcome<MapMessage<K, V>>> {
        match self.decode(src)? {
            DecodeOutcome::Incomplete => {
                let err = Error::frame("input ended inside a frame");
                self.stage = Stage::Failed(err.clone());
                Err(err)
            }
            complete => Ok(complete),
        }
    }

    fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }

    fn reset(&mut self) {
        self.key.reset();
        self.value.reset();
        self.stage = Stage::Header;
        self.frame_len = 0;
    }
}

struct Slots<'a, K, V> {
    key: &'a K,
    value: Option<&'a V>,
}

impl<K: Writable, V: Writable> Writable for Slots<'_, K, V> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> std::result::Result<W::Repr, W::Error> {
        let len = if self.value.is_some() { 2 } else { 1 };
        let mut body = writer
            .record(0)?
            .complete_header(RecordBodyKind::MapLike, len)?
            .write_slot("key", self.key)?;
        if let Some(value) = self.value {
            body = body.write_slot("value", value)?;
        }
        body.done()
    }
}

/// The text form: `@update(key:k,value:v)`, `@remove(key:k)` or `@clear`.
impl<K: Writable, V: Writable> Writable for MapMessage<K, V> {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> std::result::Result<W::Repr, W::Error> {
        let header = writer.record(1)?;
        let header = match self {
            MapMessage::Update { key, value } => header.write_attr_with(
                MessageTag::Update.name(),
                &Slots {
                    key,
                    value: Some(value),
                },
            )?,
            MapMessage::Remove { key } => header.write_attr_with(
                MessageTag::Remove.name(),
                &Slots::<K, V> { key, value: None },
            )?,
            MapMessage::Clear => header.write_attr_with(MessageTag::Clear.name(), &())?,
        };
        header.complete_header(RecordBodyKind::ArrayLike, 0)?.done()
    }
}

/// Fields of the text form of a [`MapMessage`].
pub struct MapMessageFields<K: Recognizable, V: Recognizable> {
    tag: Field<<String as Recognizable>::Rec>,
    key: Field<K::Rec>,
    value: Field<V::Rec>,
}

impl<K: Recognizable, V: Recognizable> RecordFields for MapMessageFields<K, V> {
    type Target = MapMessage<K, V>;

    fn select(&self, key: FieldKey<'_>) -> Option<u32> {
        match key {
            FieldKey::Tag => Some(0),
            FieldKey::HeaderSlot("key") => Some(1),
            FieldKey::HeaderSlot("value") => Some(2),
            _ => None,
        }
    }

    fn feed_field(
        &mut self,
        index: u32,
        event: ReadEvent,
    ) -> Option<std::result::Result<(), ReadError>> {
        match index {
            0 => self.tag.feed(event),
            1 => self.key.feed(event),
            _ => self.value.feed(event),
        }
    }

    fn finish(&mut self) -> std::result::Result<MapMessage<K, V>, ReadError> {
        let tag = self.tag.take_required()?;
        let message = match tag.as_str() {
            "update" => MapMessage::Update {
                key: self.key.take_required()?,
                value: self.value.take_required()?,
            },
            "remove" => MapMessage::Remove {
                key: self.key.take_required()?,
            },
            "clear" => MapMessage::Clear,
            _ => {
                return Err(ReadError::UnexpectedTag {
                    expected: "update, remove or clear".to_string(),
                    found: tag,
                })
            }
        };
        if self.key.take().is_some() {
            return Err(ReadError::UnexpectedField("key".to_string()));
        }
        if self.value.take().is_some() {
            return Err(ReadError::UnexpectedField("value".to_string()));
        }
        Ok(message)
    }

    fn reset(&mut self) {
        self.tag.reset();
        self.key.reset();
        self.value.reset();
    }
}

impl<K: Recognizable, V: Recognizable> Recognizable for MapMessage<K, V> {
    type Rec = RecordRecognizer<MapMessageFields<K, V>>;

    fn make_recognizer() -> Self::Rec {
        RecordRecognizer::new(MapMessageFields {
            tag: field::<String>("tag"),
            key: field::<K>("key"),
            value: field::<V>("value"),
        })
    }
}
