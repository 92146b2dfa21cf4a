use anyhow::Result;
use std::io::{self, Write};

/// Read a line of input from the terminal
pub fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    // Trim whitespace and newlines
    Ok(input.trim().to_string())
}

/// Read a hidden line of input from the terminal (like a password)
pub fn read_password(prompt: &str) -> Result<String> {
    // For cross-platform hidden input we'd use a crate like 'rpassword';
    // plain line input keeps piped stdin working for scripts and tests.
    read_line(prompt)
}
