// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = "Byte-exact canonical JSON serialization."]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! The bytes produced here are what gets signed and what a verifier must
//! reproduce independently. Any drift — key order, number formatting,
//! string escaping — breaks signature verification against data signed by
//! a different implementation, so every formatting choice here is
//! deliberate rather than "whatever `serde_json` happens to do".

mod number;
mod string;
mod value;

pub use number::format_number;
pub use string::escape_str;
pub use value::dump_value;

use signoff_core::Record;

/// Render a record set and a timestamp into the canonical payload that
/// gets signed: `{"data":[...],"last_modified":"<timestamp>"}`.
///
/// Tombstones (`deleted: true`) are dropped before sorting. Records are
/// sorted ascending by `id`, byte-wise. `last_modified` is embedded as a
/// JSON string (not a bare number), matching the envelope every signer
/// and verifier in this workflow agrees on.
#[must_use]
pub fn canonical_json(records: impl IntoIterator<Item = Record>, last_modified: i64) -> String {
    let mut live: Vec<Record> = records.into_iter().filter(|r| !r.is_deleted()).collect();
    live.sort_by(|a, b| a.id().unwrap_or("").cmp(b.id().unwrap_or("")));

    let mut out = String::from("{\"data\":[");
    for (i, record) in live.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&dump_value(&serde_json::Value::Object(record.0.clone())));
    }
    out.push_str("],\"last_modified\":");
    out.push_str(&escape_str(&last_modified.to_string()));
    out.push('}');
    out
}
