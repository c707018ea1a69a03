use serde_json::Value;
use std::io::{self, Read};

use vehicle_rollup_core::ingest;
use vehicle_rollup_core::rollup::record::ConfigurationRecord;

fn read_piped() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    if buffer.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(buffer))
}

/// Attempt to read JSON from stdin if data is being piped.
/// Returns None if stdin is a TTY (interactive).
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match read_piped()? {
        Some(buffer) => Ok(Some(serde_json::from_str(buffer.trim())?)),
        None => Ok(None),
    }
}

/// Piped records: a JSON array when the payload starts with `[`, CSV otherwise.
pub fn read_stdin_records() -> Result<Option<Vec<ConfigurationRecord>>, Box<dyn std::error::Error>>
{
    let Some(buffer) = read_piped()? else {
        return Ok(None);
    };
    let records = if buffer.trim_start().starts_with('[') {
        ingest::read_json(&buffer)?
    } else {
        ingest::read_csv(buffer.as_bytes())?
    };
    Ok(Some(records))
}
