/// File category breakdown of artifact records.
///
/// Groups file records into broad evidence categories by extension and
/// totals size and count per category. Directory records and registry
/// keys are not counted.
use crate::model::{ArtifactRecord, TriageRecord};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FileCategory {
    Documents,
    Images,
    Media,
    Archives,
    Code,
    Executables,
    Logs,
    Captures,
    Databases,
    System,
    Other,
}

impl FileCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Media => "Media",
            Self::Archives => "Archives",
            Self::Code => "Code",
            Self::Executables => "Executables",
            Self::Logs => "Logs",
            Self::Captures => "Captures",
            Self::Databases => "Databases",
            Self::System => "System",
            Self::Other => "Other",
        }
    }

    /// Category of a file name, from the text after its last dot.
    pub fn of_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => categorise_extension(ext),
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category: FileCategory,
    pub total_size: u64,
    pub file_count: u64,
}

/// Categorise an extension, with or without its leading dot.
///
/// Extensions are lowercased into a stack buffer; anything longer than 16
/// bytes is `Other`.
pub fn categorise_extension(ext: &str) -> FileCategory {
    let bytes = ext.strip_prefix('.').unwrap_or(ext).as_bytes();
    if bytes.is_empty() || bytes.len() > 16 {
        return FileCategory::Other;
    }

    let mut lower = [0u8; 16];
    for (dest, &src) in lower.iter_mut().zip(bytes) {
        *dest = src.to_ascii_lowercase();
    }
    let Ok(lower) = std::str::from_utf8(&lower[..bytes.len()]) else {
        return FileCategory::Other;
    };

    match lower {
        "doc" | "docx" | "pdf" | "txt" | "rtf" | "odt" | "xls" | "xlsx" | "ppt" | "pptx"
        | "csv" | "md" | "eml" | "msg" | "pst" | "ost" => FileCategory::Documents,
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" | "ico" | "tiff" | "tif"
        | "heic" => FileCategory::Images,
        "mp4" | "mkv" | "avi" | "mov" | "wmv" | "webm" | "mp3" | "wav" | "flac" | "ogg"
        | "m4a" => FileCategory::Media,
        "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "zst" | "cab" | "iso" => {
            FileCategory::Archives
        }
        "rs" | "py" | "js" | "ts" | "c" | "cpp" | "h" | "cs" | "java" | "go" | "rb" | "php"
        | "html" | "css" | "json" | "xml" | "yaml" | "yml" | "toml" | "sql" | "sh" | "bat"
        | "ps1" | "vbs" => FileCategory::Code,
        "exe" | "msi" | "dll" | "so" | "dylib" | "com" | "scr" | "sys" => {
            FileCategory::Executables
        }
        "log" | "evt" | "evtx" | "etl" | "history" => FileCategory::Logs,
        "pcap" | "pcapng" | "cap" | "dnscache" => FileCategory::Captures,
        "sqlite" | "db" | "sqlite3" | "edb" | "mdb" => FileCategory::Databases,
        "dat" | "pf" | "reg" | "hve" | "inf" | "tmp" | "bak" | "lnk" | "hosts" => {
            FileCategory::System
        }
        _ => FileCategory::Other,
    }
}

fn file_name(record: &ArtifactRecord) -> &str {
    record
        .path
        .rsplit(ArtifactRecord::SEPARATOR)
        .next()
        .unwrap_or(&record.path)
}

/// Per-category totals over file records, largest total size first.
pub fn analyse_file_types(records: &[TriageRecord]) -> Vec<CategoryStats> {
    let mut map: HashMap<FileCategory, CategoryStats> = HashMap::new();

    for record in records.iter().filter_map(TriageRecord::as_artifact) {
        if record.is_directory() {
            continue;
        }
        let category = FileCategory::of_name(file_name(record));
        let entry = map.entry(category).or_insert(CategoryStats {
            category,
            total_size: 0,
            file_count: 0,
        });
        entry.total_size += record.size;
        entry.file_count += 1;
    }

    let mut results: Vec<CategoryStats> = map.into_values().collect();
    results.sort_by(|a, b| {
        b.total_size
            .cmp(&a.total_size)
            .then(a.category.cmp(&b.category))
    });
    results
}
