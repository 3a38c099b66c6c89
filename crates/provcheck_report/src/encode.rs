//! Canonical JSON encoding for report documents.
//!
//! Four-space indentation, keys in declaration (or parse) order, no HTML
//! escaping, trailing newline. Identical values always encode to identical
//! bytes.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::ReportResult;

const INDENT: &[u8] = b"    ";

/// Encode `value` as canonical JSON.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> ReportResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}
