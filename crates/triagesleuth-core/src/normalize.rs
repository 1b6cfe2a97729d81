/// Metadata normalizer: raw collaborator metadata to the canonical record
/// shape.
///
/// Everything here is total. Decoding faults are repaired in place
/// (replacement characters, `N/A` timestamps, zero sizes) and never fail
/// the extraction.
use crate::model::{CanonicalTime, RawMetadata, RawName};
use compact_str::CompactString;
use std::borrow::Cow;
use tracing::debug;

/// Placeholder used when a node has metadata but no name record.
pub const UNNAMED: &str = "<unnamed>";

/// Canonical metadata for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalMetadata {
    pub size: u64,
    pub created: CanonicalTime,
    pub modified: CanonicalTime,
    pub accessed: CanonicalTime,
    pub last_write: CanonicalTime,
}

/// Normalize raw metadata. Negative or missing sizes become 0.
pub fn normalize(raw: &RawMetadata) -> CanonicalMetadata {
    let size = match raw.size {
        Some(n) if n >= 0 => n as u64,
        Some(n) => {
            debug!("negative size {n} normalized to 0");
            0
        }
        None => 0,
    };
    CanonicalMetadata {
        size,
        created: timestamp(raw.created),
        modified: timestamp(raw.modified),
        accessed: timestamp(raw.accessed),
        last_write: timestamp(raw.last_write),
    }
}

#[inline]
fn timestamp(secs: Option<i64>) -> CanonicalTime {
    secs.map_or(CanonicalTime::MISSING, CanonicalTime::from_epoch_seconds)
}

/// Decode a raw name as UTF-8, substituting U+FFFD for invalid sequences.
pub fn decode_name(raw: &RawName) -> CompactString {
    match raw {
        RawName::Text(s) => s.clone(),
        RawName::Bytes(bytes) => CompactString::new(String::from_utf8_lossy(bytes)),
    }
}

/// Make a decoded name safe to use as one path component.
///
/// A separator inside a name would inflate the depth derived from the path,
/// so it is replaced with `_`. Empty names become [`UNNAMED`].
pub fn path_component(name: &str, separator: char) -> Cow<'_, str> {
    if name.is_empty() {
        Cow::Borrowed(UNNAMED)
    } else if name.contains(separator) {
        Cow::Owned(name.replace(separator, "_"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Decode leaf content for text rules.
pub fn decode_content(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
