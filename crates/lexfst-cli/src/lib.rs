// lexfst-cli: shared utilities for CLI tools.

use std::path::Path;
use std::process;

use clap::ValueEnum;
use lexfst::BuilderOptions;
use lexfst_core::{InputType, bytes_to_labels, labels_to_string, utf16_labels, utf32_labels};
use tracing_subscriber::EnvFilter;

/// Label width as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Width {
    /// UTF-8 bytes.
    Byte1,
    /// UTF-16 code units.
    Byte2,
    /// Unicode code points.
    Byte4,
}

impl From<Width> for InputType {
    fn from(width: Width) -> Self {
        match width {
            Width::Byte1 => InputType::Byte1,
            Width::Byte2 => InputType::Byte2,
            Width::Byte4 => InputType::Byte4,
        }
    }
}

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`
/// (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read builder options from a JSON file; absent fields keep their defaults.
pub fn load_options(path: Option<&Path>) -> Result<BuilderOptions, String> {
    let Some(path) = path else {
        return Ok(BuilderOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid options in {}: {e}", path.display()))
}

/// Split a `key<TAB>value` line. A line without a tab maps its key to
/// `ordinal`.
pub fn parse_line(line: &str, ordinal: u64) -> Result<(&str, u64), String> {
    match line.split_once('\t') {
        Some((key, value)) => {
            let value = value
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("invalid value {value:?} for key {key:?}: {e}"))?;
            Ok((key, value))
        }
        None => Ok((line, ordinal)),
    }
}

/// Labels of `key` in the given alphabet.
pub fn key_labels(input_type: InputType, key: &str) -> Vec<i32> {
    match input_type {
        InputType::Byte1 => bytes_to_labels(key.as_bytes()),
        InputType::Byte2 => utf16_labels(key),
        InputType::Byte4 => utf32_labels(key),
    }
}

/// Printable text for a label sequence; undecodable parts become U+FFFD.
pub fn labels_text(input_type: InputType, labels: &[i32]) -> String {
    match input_type {
        InputType::Byte1 => {
            let bytes: Vec<u8> = labels.iter().map(|&l| l as u8).collect();
            String::from_utf8_lossy(&bytes).into_owned()
        }
        InputType::Byte2 => {
            let units: Vec<u16> = labels.iter().map(|&l| l as u16).collect();
            String::from_utf16_lossy(&units)
        }
        InputType::Byte4 => labels_to_string(labels).unwrap_or_else(|| {
            labels
                .iter()
                .map(|&l| u32::try_from(l).ok().and_then(char::from_u32).unwrap_or('\u{FFFD}'))
                .collect()
        }),
    }
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}
