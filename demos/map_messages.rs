//! Streaming framed map messages over a byte buffer.
//!
//! Run with: cargo run --example map_messages

use bytes::BytesMut;
use recon_codec::decoder::{DecodeOutcome, Decoder};
use recon_codec::framing::{MapMessage, MapMessageDecoder, MapMessageEncoder};
use recon_codec::{recon, to_string, Value};
use std::collections::BTreeMap;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let encoder = MapMessageEncoder::new();
    let sent: Vec<MapMessage<String, Value>> = vec![
        MapMessage::Update {
            key: "alice".to_string(),
            value: recon!({ "role": "admin", "logins": 12 }),
        },
        MapMessage::Update {
            key: "bob".to_string(),
            value: recon!({ "role": "viewer", "logins": 3 }),
        },
        MapMessage::Remove {
            key: "alice".to_string(),
        },
        MapMessage::Clear,
    ];

    let mut wire = BytesMut::new();
    for message in &sent {
        encoder.encode(message, &mut wire)?;
        println!("{:<8} {}", message.tag().name(), to_string(message)?);
    }
    println!("\n{} messages in {} bytes\n", sent.len(), wire.len());

    // Deliver the bytes in small chunks, as a socket might.
    let mut decoder = MapMessageDecoder::<String, Value>::new();
    let mut buf = BytesMut::new();
    let mut state = BTreeMap::new();
    for chunk in wire.chunks(5) {
        buf.extend_from_slice(chunk);
        while let DecodeOutcome::Complete(message) = decoder.decode(&mut buf)? {
            match message {
                MapMessage::Update { key, value } => {
                    state.insert(key, value);
                }
                MapMessage::Remove { key } => {
                    state.remove(&key);
                }
                MapMessage::Clear => state.clear(),
            }
            println!("state: {}", to_string(&state)?);
            decoder.reset();
        }
    }

    assert!(state.is_empty());
    println!("\n✓ All messages applied");

    Ok(())
}
