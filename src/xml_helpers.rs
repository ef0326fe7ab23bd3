//! Shared XML helpers for the package readers.
//!
//! All functions tolerate namespace prefixes and invalid UTF-8.

use quick_xml::events::{BytesStart, BytesText};

/// Extract a string attribute value by key.
///
/// Entities are unescaped. Returns `None` if the attribute is missing or
/// its value is not valid text.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Extract a string attribute by local name (ignoring namespace prefix).
///
/// `r:id` and `id` both match `b"id"`.
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Raw attribute bytes by key, for hot paths that avoid allocation.
pub fn attr_bytes(e: &BytesStart, key: &[u8]) -> Option<Vec<u8>> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| attr.value.into_owned())
}

/// Decode a text node, unescaping entities only when needed.
pub fn text_to_string(text: &BytesText) -> Option<String> {
    let raw = text.as_ref();
    if raw.contains(&b'&') {
        text.unescape().ok().map(|s| s.into_owned())
    } else {
        std::str::from_utf8(raw).ok().map(ToString::to_string)
    }
}
