use bytes::{BufMut, BytesMut};
use recon_codec::decoder::{DecodeOutcome, Decoder};
use recon_codec::framing::{
    encode_with_length, MapMessage, MapMessageDecoder, MapMessageEncoder, MessageTag,
};
use recon_codec::{Error, ReconOptions, Separator, Value};

type Message = MapMessage<i32, i32>;

fn encode_all(messages: &[Message]) -> BytesMut {
    let encoder = MapMessageEncoder::new();
    let mut buf = BytesMut::new();
    for message in messages {
        encoder.encode(message, &mut buf).unwrap();
    }
    buf
}

fn decode_all(buf: &mut BytesMut) -> Vec<Message> {
    let mut decoder = MapMessageDecoder::<i32, i32>::new();
    let mut messages = Vec::new();
    while !buf.is_empty() {
        match decoder.decode(buf).unwrap() {
            DecodeOutcome::Complete(message) => {
                messages.push(message);
                decoder.reset();
            }
            DecodeOutcome::Incomplete => break,
        }
    }
    messages
}

#[test]
fn test_messages_decode_in_order() {
    let sent = vec![
        MapMessage::Update { key: 1, value: 2 },
        MapMessage::Clear,
        MapMessage::Remove { key: 5 },
    ];
    let mut buf = encode_all(&sent);
    assert_eq!(decode_all(&mut buf), sent);
    assert!(buf.is_empty());
}

#[test]
fn test_every_split_point() {
    let sent = vec![
        MapMessage::Update {
            key: -7,
            value: 1_000_000,
        },
        MapMessage::Remove { key: 3 },
        MapMessage::Clear,
        MapMessage::Update { key: 0, value: 0 },
    ];
    let bytes = encode_all(&sent);
    for split in 0..=bytes.len() {
        let mut decoder = MapMessageDecoder::<i32, i32>::new();
        let mut buf = BytesMut::new();
        let mut received = Vec::new();
        for part in [&bytes[..split], &bytes[split..]] {
            buf.extend_from_slice(part);
            while let DecodeOutcome::Complete(message) = decoder.decode(&mut buf).unwrap() {
                received.push(message);
                decoder.reset();
            }
        }
        assert_eq!(received, sent, "split at {}", split);
    }
}

#[test]
fn test_compound_keys_and_values() {
    let encoder = MapMessageEncoder::with_options(ReconOptions::new().with_separator(Separator::Newline));
    let key: Value = "@node(id:7)".parse().unwrap();
    let value: Value = "{1,2,{a:b}}".parse().unwrap();
    let message = MapMessage::Update {
        key: key.clone(),
        value: value.clone(),
    };
    let mut buf = BytesMut::new();
    encoder.encode(&message, &mut buf).unwrap();

    let mut decoder = MapMessageDecoder::<Value, Value>::new();
    assert_eq!(
        decoder.decode(&mut buf).unwrap(),
        DecodeOutcome::Complete(MapMessage::Update { key, value })
    );
}

#[test]
fn test_length_prefix() {
    let buf = encode_all(&[MapMessage::Update { key: 10, value: 200 }]);
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    assert_eq!(len, buf.len() - 4);
    assert_eq!(buf[4], MessageTag::Update as u8);
    let key_len = u32::from_le_bytes([buf[5], buf[6], buf[7], buf[8]]) as usize;
    assert_eq!(&buf[9..9 + key_len], b"10");
    assert_eq!(&buf[9 + key_len..], b"200");
}

#[test]
fn test_encode_with_length_nests() {
    let mut buf = BytesMut::new();
    encode_with_length(&mut buf, |outer| {
        outer.put_u8(9);
        encode_with_length(outer, |inner| {
            inner.put_slice(b"xy");
            Ok(())
        })
    })
    .unwrap();
    assert_eq!(&buf[..], b"\x07\x00\x00\x00\x09\x02\x00\x00\x00xy");
}

#[test]
fn test_errors_are_terminal_until_reset() {
    let mut decoder = MapMessageDecoder::<i32, i32>::new();
    let mut bad = BytesMut::from(&b"\x01\x00\x00\x00\x09"[..]);
    let err = decoder.decode(&mut bad).unwrap_err();
    assert!(matches!(err, Error::Frame(_)));

    let mut good = encode_all(&[MapMessage::Clear]);
    assert_eq!(decoder.decode(&mut good).unwrap_err(), err);

    decoder.reset();
    assert_eq!(
        decoder.decode(&mut good).unwrap(),
        DecodeOutcome::Complete(MapMessage::Clear)
    );
}

#[test]
fn test_value_of_wrong_type() {
    let encoder = MapMessageEncoder::new();
    let mut buf = BytesMut::new();
    encoder
        .encode(
            &MapMessage::Update {
                key: 1,
                value: "text".to_string(),
            },
            &mut buf,
        )
        .unwrap();
    let mut decoder = MapMessageDecoder::<i32, i32>::new();
    assert!(matches!(decoder.decode(&mut buf), Err(Error::Decode(_))));
}
