//! Customizing Recon output and input with ReconOptions.
//!
//! Run with: cargo run --example custom_options

use recon_codec::{
    from_str_with_options, parse_value_with_options, to_string, to_string_with_options,
    ReconOptions, Separator, Value,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let config: Value = "@config{name:MyApp,version:\"1.0.0\",debug:true,ports:{80,443}}".parse()?;

    // Default format (comma separator)
    println!("Default (comma):");
    println!("{}\n", to_string(&config)?);

    // Newline separator
    println!("Newline separator:");
    let newline_options = ReconOptions::new().with_separator(Separator::Newline);
    let newline_format = to_string_with_options(&config, &newline_options)?;
    println!("{}\n", newline_format);

    // Both forms read back to the same value
    assert_eq!(newline_format.parse::<Value>()?, config);

    // Empty items keep their commas even with the newline separator
    let sparse: Value = "{1,,3}".parse()?;
    println!("Sparse items with newlines:");
    println!("{}\n", to_string_with_options(&sparse, &newline_options)?);

    // Limit how deeply records may nest when reading
    let shallow = ReconOptions::new().with_max_depth(2);
    println!("Nesting limit of 2:");
    for text in ["{{1}}", "{{{1}}}"] {
        match parse_value_with_options(text, &shallow) {
            Ok(value) => println!("  {} -> {:?}", text, value),
            Err(err) => println!("  {} -> {}", text, err),
        }
    }

    let numbers: Vec<i32> = from_str_with_options("{1\n2\n3}", &shallow)?;
    println!("\nRead with options: {:?}", numbers);

    Ok(())
}
