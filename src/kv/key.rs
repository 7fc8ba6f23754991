//! Keys and composite-key encoding.
//!
//! A composite key is an object type followed by zero or more attributes,
//! each segment terminated by [`SEPARATOR`]:
//!
//! ```text
//! make_key("user", ["1"])        => "user\x001\x00"
//! make_key("sex~name", ["boy", "lzb3"]) => "sex~name\x00boy\x00lzb3\x00"
//! ```
//!
//! `U+0000` is the smallest code point and may not appear inside a segment,
//! so byte order of encoded keys equals segment-wise order of the inputs, and
//! every key sharing a composite prefix sorts between the prefix and its
//! successor.

use std::fmt;

use serde::Serialize;

use super::error::KvError;

/// Reserved segment terminator.
pub const SEPARATOR: char = '\u{0}';

/// A store key.
///
/// Keys are UTF-8 strings ordered by their bytes. Both plain keys
/// (`"name1"`) and composite keys built with [`make_key`] live in the same
/// key space.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Wrap a plain key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode a composite key. See [`split_key`].
    pub fn split(&self) -> Result<(String, Vec<String>), KvError> {
        split_key(self)
    }

    /// The smallest key greater than every key starting with `self`.
    ///
    /// Returns `None` when no such key exists (every character is
    /// `char::MAX`, or the key is empty), meaning the range is unbounded.
    pub fn prefix_successor(&self) -> Option<Key> {
        let mut chars: Vec<char> = self.0.chars().collect();
        while let Some(last) = chars.pop() {
            if let Some(next) = next_char(last) {
                chars.push(next);
                return Some(Key(chars.into_iter().collect()));
            }
        }
        None
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            if c == SEPARATOR {
                f.write_str("\\x00")?;
            } else {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build a composite key from an object type and its attributes.
///
/// Fails with [`KvError::InvalidArgument`] if `object_type` is empty or any
/// segment contains [`SEPARATOR`].
pub fn make_key<S: AsRef<str>>(object_type: &str, attributes: &[S]) -> Result<Key, KvError> {
    if object_type.is_empty() {
        return Err(KvError::invalid("object type must not be empty"));
    }
    let mut encoded = String::with_capacity(
        object_type.len()
            + 1
            + attributes.iter().map(|a| a.as_ref().len() + 1).sum::<usize>(),
    );
    push_segment(&mut encoded, object_type, "object type")?;
    for attribute in attributes {
        push_segment(&mut encoded, attribute.as_ref(), "attribute")?;
    }
    Ok(Key(encoded))
}

/// Decode a composite key into its object type and attributes.
///
/// Inverse of [`make_key`]. Fails with [`KvError::InvalidArgument`] if the
/// key is not framed as a composite key.
pub fn split_key(key: &Key) -> Result<(String, Vec<String>), KvError> {
    let Some(body) = key.0.strip_suffix(SEPARATOR) else {
        return Err(KvError::invalid(format!(
            "key '{key}' is not a composite key: missing trailing separator"
        )));
    };
    let mut segments = body.split(SEPARATOR);
    let object_type = match segments.next() {
        Some(object_type) if !object_type.is_empty() => object_type.to_string(),
        _ => {
            return Err(KvError::invalid(format!(
                "key '{key}' has an empty object type"
            )));
        }
    };
    let attributes = segments.map(str::to_string).collect();
    Ok((object_type, attributes))
}

fn push_segment(encoded: &mut String, segment: &str, what: &str) -> Result<(), KvError> {
    if segment.contains(SEPARATOR) {
        return Err(KvError::invalid(format!(
            "{what} '{}' contains the reserved separator U+0000",
            segment.escape_debug()
        )));
    }
    encoded.push_str(segment);
    encoded.push(SEPARATOR);
    Ok(())
}

fn next_char(c: char) -> Option<char> {
    match c {
        char::MAX => None,
        // Skip the surrogate block.
        '\u{D7FF}' => Some('\u{E000}'),
        _ => char::from_u32(u32::from(c) + 1),
    }
}
