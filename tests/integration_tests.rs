use bytes::BytesMut;
use recon_codec::decoder::{decoder_of, DecodeOutcome, Decoder};
use recon_codec::error::ReadError;
use recon_codec::event::ReadEvent;
use recon_codec::recognizer::compound::field;
use recon_codec::recognizer::{
    recognize_events, Field, FieldKey, ItemKey, Recognizable, RecordFields, RecordRecognizer,
};
use recon_codec::registry::{CodecRegistry, DynamicSeq};
use recon_codec::writer::{
    BodyWriter, HeaderWriter, RecordBodyKind, StructuralWriter, Writable,
};
use recon_codec::{
    from_str, from_str_serde, parse_value, to_string, to_string_serde, write_events, write_value,
    Error, Value,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
struct Reading {
    sensor: String,
    celsius: f64,
    tags: Vec<String>,
}

impl Writable for Reading {
    fn write_with<W: StructuralWriter>(&self, writer: W) -> Result<W::Repr, W::Error> {
        writer
            .record(1)?
            .write_attr_with("reading", &self.sensor)?
            .complete_header(RecordBodyKind::MapLike, 2)?
            .write_slot("celsius", &self.celsius)?
            .write_slot("tags", &self.tags)?
            .done()
    }
}

struct ReadingFields {
    sensor: Field<<String as Recognizable>::Rec>,
    celsius: Field<<f64 as Recognizable>::Rec>,
    tags: Field<<Vec<String> as Recognizable>::Rec>,
}

impl RecordFields for ReadingFields {
    type Target = Reading;

    fn tag(&self) -> Option<&str> {
        Some("reading")
    }

    fn select(&self, key: FieldKey<'_>) -> Option<u32> {
        match key {
            FieldKey::HeaderBody => Some(0),
            FieldKey::Item(ItemKey::Name("celsius")) => Some(1),
            FieldKey::Item(ItemKey::Name("tags")) => Some(2),
            _ => None,
        }
    }

    fn feed_field(&mut self, index: u32, event: ReadEvent) -> Option<Result<(), ReadError>> {
        match index {
            0 => self.sensor.feed(event),
            1 => self.celsius.feed(event),
            _ => self.tags.feed(event),
        }
    }

    fn finish(&mut self) -> Result<Reading, ReadError> {
        Ok(Reading {
            sensor: self.sensor.take_required()?,
            celsius: self.celsius.take_required()?,
            tags: self.tags.take_or_default(),
        })
    }

    fn reset(&mut self) {
        self.sensor.reset();
        self.celsius.reset();
        self.tags.reset();
    }
}

impl Recognizable for Reading {
    type Rec = RecordRecognizer<ReadingFields>;

    fn make_recognizer() -> Self::Rec {
        RecordRecognizer::new(ReadingFields {
            sensor: field::<String>("sensor"),
            celsius: field::<f64>("celsius"),
            tags: field::<Vec<String>>("tags"),
        })
    }
}

fn sample() -> Reading {
    Reading {
        sensor: "s-1".to_string(),
        celsius: 21.5,
        tags: vec!["indoor".to_string(), "east wing".to_string()],
    }
}

#[test]
fn test_hand_written_codec() {
    let text = to_string(&sample()).unwrap();
    assert_eq!(
        text,
        "@reading(s-1){celsius:21.5,tags:{indoor,\"east wing\"}}"
    );
    assert_eq!(from_str::<Reading>(&text).unwrap(), sample());
}

#[test]
fn test_optional_field_defaults() {
    let reading: Reading = from_str("@reading(s-2) {celsius: -3.0}").unwrap();
    assert_eq!(reading.celsius, -3.0);
    assert!(reading.tags.is_empty());
}

#[test]
fn test_whitespace_and_newlines() {
    let text = "@reading(\"s 3\") {\n  celsius: 19.25\n  tags: {a, b}\n}\n";
    let reading: Reading = from_str(text).unwrap();
    assert_eq!(reading.sensor, "s 3");
    assert_eq!(reading.tags, ["a", "b"]);
}

#[test]
fn test_wrong_tag_is_a_decode_error() {
    let err = from_str::<Reading>("@sample(s-1){celsius:1.0}").unwrap_err();
    assert!(matches!(err, Error::Decode(ReadError::UnexpectedTag { .. })));
}

#[test]
fn test_missing_field_is_a_decode_error() {
    let err = from_str::<Reading>("@reading(s-1){tags:{}}").unwrap_err();
    assert!(matches!(err, Error::Decode(ReadError::MissingField(name)) if name == "celsius"));
}

#[test]
fn test_writers_agree() {
    let reading = sample();
    let value = write_value(&reading).unwrap();
    assert_eq!(value, parse_value(&to_string(&reading).unwrap()).unwrap());

    let events = write_events(&reading).unwrap();
    let mut recognizer = Reading::make_recognizer();
    assert_eq!(recognize_events(&mut recognizer, events).unwrap(), reading);
}

#[test]
fn test_chunked_decoding_at_every_split() {
    let text = to_string(&vec![sample(), sample()]).unwrap();
    let bytes = text.as_bytes();
    for split in 0..=bytes.len() {
        let mut decoder = decoder_of::<Vec<Reading>>();
        let mut buf = BytesMut::from(&bytes[..split]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), DecodeOutcome::Incomplete);
        buf.extend_from_slice(&bytes[split..]);
        let readings = decoder.decode_eof(&mut buf).unwrap().complete().unwrap();
        assert_eq!(readings, vec![sample(), sample()], "split at {}", split);
    }
}

#[test]
fn test_decoder_reuse_after_reset() {
    let mut decoder = decoder_of::<Reading>();
    for celsius in [1.5, 2.5] {
        let reading = Reading {
            celsius,
            ..sample()
        };
        let mut buf = BytesMut::from(to_string(&reading).unwrap().as_bytes());
        assert_eq!(
            decoder.decode_eof(&mut buf).unwrap(),
            DecodeOutcome::Complete(reading)
        );
        assert!(decoder.is_done());
        decoder.reset();
    }
}

#[test]
fn test_registry_heterogeneous_sequence() {
    let registry = CodecRegistry::with_defaults();
    registry.register::<Reading>();

    let seq = DynamicSeq::new(&registry)
        .with(sample())
        .with(7i32)
        .with("done".to_string());
    assert_eq!(
        to_string(&seq).unwrap(),
        "{@reading(s-1){celsius:21.5,tags:{indoor,\"east wing\"}},7,done}"
    );

    let reading: Reading = registry.decode(&to_string(&sample()).unwrap()).unwrap();
    assert_eq!(reading, sample());
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    id: u64,
    customer: String,
    lines: Vec<Line>,
    note: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Line {
    sku: String,
    quantity: u32,
    price: f64,
}

#[test]
fn test_serde_bridge() {
    let order = Order {
        id: 12345,
        customer: "Ada".to_string(),
        lines: vec![
            Line {
                sku: "A-1".to_string(),
                quantity: 2,
                price: 9.99,
            },
            Line {
                sku: "B-2".to_string(),
                quantity: 1,
                price: 14.5,
            },
        ],
        note: None,
    };
    let text = to_string_serde(&order).unwrap();
    assert!(text.starts_with("@Order{id:12345,customer:Ada,lines:{@Line{sku:A-1,"));
    let back: Order = from_str_serde(&text).unwrap();
    assert_eq!(back, order);

    // The same text is readable as a plain value.
    let value: Value = text.parse().unwrap();
    assert_eq!(value.as_record().and_then(|r| r.tag()), Some("Order"));
}
