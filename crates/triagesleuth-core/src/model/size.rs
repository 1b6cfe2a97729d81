/// Size helpers: human-readable byte counts for log lines and summaries,
/// and the size-bucket classification used by the size distribution.
///
/// All sizes are `u64` bytes; floating point only appears at the
/// formatting boundary.
use serde::Serialize;

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;
const TB: f64 = GB * 1024.0;

/// Format a byte count with a binary unit (KB = 1024).
pub fn format_size(bytes: u64) -> String {
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else if b < TB {
        format!("{:.2} GB", b / GB)
    } else {
        format!("{:.2} TB", b / TB)
    }
}

/// Format a count with thousand separators.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// File size bucket, in megabytes.
///
/// Only files are bucketed: a directory's size is a filesystem artifact and
/// says nothing about content volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SizeBucket {
    #[serde(rename = "<0.1MB")]
    Tiny,
    #[serde(rename = "0.1-1MB")]
    Small,
    #[serde(rename = "1-10MB")]
    Medium,
    #[serde(rename = "10-100MB")]
    Large,
    #[serde(rename = ">100MB")]
    Huge,
}

impl SizeBucket {
    pub const ALL: [SizeBucket; 5] = [
        Self::Tiny,
        Self::Small,
        Self::Medium,
        Self::Large,
        Self::Huge,
    ];

    pub fn of(bytes: u64) -> Self {
        let mb = bytes as f64 / MB;
        if mb < 0.1 {
            Self::Tiny
        } else if mb < 1.0 {
            Self::Small
        } else if mb < 10.0 {
            Self::Medium
        } else if mb < 100.0 {
            Self::Large
        } else {
            Self::Huge
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Tiny => "<0.1MB",
            Self::Small => "0.1-1MB",
            Self::Medium => "1-10MB",
            Self::Large => "10-100MB",
            Self::Huge => ">100MB",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1.0 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
        assert_eq!(format_size(1_099_511_627_776), "1.00 TB");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn buckets_follow_megabyte_boundaries() {
        assert_eq!(SizeBucket::of(0), SizeBucket::Tiny);
        assert_eq!(SizeBucket::of(100 * 1024), SizeBucket::Tiny);
        assert_eq!(SizeBucket::of(200 * 1024), SizeBucket::Small);
        assert_eq!(SizeBucket::of(5 * 1_048_576), SizeBucket::Medium);
        assert_eq!(SizeBucket::of(50 * 1_048_576), SizeBucket::Large);
        assert_eq!(SizeBucket::of(500 * 1_048_576), SizeBucket::Huge);
    }
}
