//! Basic Recon serialization and deserialization.
//!
//! Run with: cargo run --example simple

use recon_codec::{from_str_serde, to_string_serde};
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let users = vec![
        User {
            id: 42,
            name: "Alice Johnson".to_string(),
            email: "alice@example.com".to_string(),
        },
        User {
            id: 43,
            name: "Bob Smith".to_string(),
            email: "bob@example.com".to_string(),
        },
    ];

    // Serialize to Recon
    let recon = to_string_serde(&users)?;
    println!("Recon output:\n{}\n", recon);

    // Deserialize back to struct
    let users_back: Vec<User> = from_str_serde(&recon)?;
    assert_eq!(users, users_back);
    println!("✓ Round-trip successful");

    Ok(())
}
