use anyhow::Result;
use std::io::{self, Write};

/// Read a line of input from the terminal (used for passwords)
pub fn read_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    // Only the line terminator is stripped; spaces are part of the password
    Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
}

/// Format a unix timestamp for display
pub fn format_timestamp(secs: i64) -> String {
    match chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => secs.to_string(),
    }
}
