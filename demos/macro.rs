//! Using the recon! macro for dynamic value construction.
//!
//! Run with: cargo run --example macro

use recon_codec::{recon, to_string, Value};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let extant = recon!(extant);
    let flag = recon!(true);
    let number = recon!(42);
    let text = recon!("Hello, Recon!");

    println!("Primitives:");
    println!("  extant: {:?}", to_string(&extant)?);
    println!("  bool:   {}", to_string(&flag)?);
    println!("  number: {}", to_string(&number)?);
    println!("  text:   {}\n", to_string(&text)?);

    let numbers = recon!([1, 2, 3, 4, 5]);
    let mixed = recon!([1, "two", true, extant]);

    println!("Items:");
    println!("  Numbers: {}", to_string(&numbers)?);
    println!("  Mixed:   {}\n", to_string(&mixed)?);

    let user = recon!({
        "id": 123,
        "name": "Alice",
        "email": "alice@example.com",
        "roles": ["admin", "developer"]
    });
    println!("Slots:\n  {}\n", to_string(&user)?);

    // Keys need not be text.
    let sparse = recon!({ 1: "one", 10: "ten", extant: "default" });
    println!("Non-text keys:\n  {}\n", to_string(&sparse)?);

    // The macro builds exactly what reading the text would.
    let parsed: Value = to_string(&user)?.parse()?;
    assert_eq!(parsed, user);
    println!("✓ Macro output matches parsed text");

    Ok(())
}
