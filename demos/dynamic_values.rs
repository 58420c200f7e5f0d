//! Working with Value for runtime flexibility.
//!
//! Run with: cargo run --example dynamic_values

use recon_codec::registry::{CodecRegistry, DynamicSeq};
use recon_codec::{recon, to_string, to_value, Record, Value};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: u32,
    name: String,
    roles: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Build config dynamically with recon! macro
    let config = recon!({
        "host": "localhost",
        "port": 8080,
        "features": ["auth", "logging", "metrics"],
        "debug": true
    });

    println!("Config as Recon:\n{}\n", to_string(&config)?);

    // Access values dynamically
    if let Some(record) = config.as_record() {
        if let Some(host) = record.get("host").and_then(Value::as_str) {
            println!("Accessing slot 'host': {}", host);
        }

        if let Some(port) = record.get("port").and_then(Value::as_i64) {
            println!("Accessing slot 'port': {}", port);
        }

        if let Some(features) = record.get("features").and_then(Value::as_record) {
            println!("Accessing slot 'features': {} items\n", features.items.len());
        }
    }

    // Records carry attributes as well as items
    let event: Value = "@event(id:7) @priority(high) {source:sensor-12}".parse()?;
    if let Some(record) = event.as_record() {
        println!("Tag: {:?}", record.tag());
        for attr in &record.attrs {
            println!("  @{} = {}", attr.name, attr.value);
        }
        println!();
    }

    // Convert existing struct to Value
    let user = User {
        id: 123,
        name: "Alice".to_string(),
        roles: vec!["admin".to_string(), "developer".to_string()],
    };

    let user_value = to_value(&user)?;
    println!("User as Value:\n{}\n", to_string(&user_value)?);

    // Runtime type checks
    println!("Type checks:");
    println!("  is_record: {}", user_value.is_record());
    println!("  is_text:   {}", user_value.is_text());
    println!("  kind:      {}\n", user_value.kind());

    // Sequences of mixed types go through a registry
    let registry = CodecRegistry::with_defaults();
    let header = Record::new().with_attr("batch", 1).with_slot("size", 3);
    let seq = DynamicSeq::new(&registry)
        .with(Value::Record(header))
        .with(42i32)
        .with("done".to_string());
    println!("Mixed sequence:\n{}", to_string(&seq)?);

    Ok(())
}
