//! Command implementations.

pub mod calendars;
pub mod config;
pub mod events;
pub mod principal;

use serde::Serialize;

use crate::error::ClientResult;

/// Renders a value as JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> ClientResult<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

/// Writes a value as JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> ClientResult<()> {
    println!("{}", to_json(value, pretty)?);
    Ok(())
}
