//! Filesystem helpers: filename sanitization and output discovery.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs;
use unicode_normalization::UnicodeNormalization;

use crate::error::MediaResult;

/// Sanitize a filename for use in a `Content-Disposition` header.
///
/// Accented characters are NFKD-folded to their ASCII base (`Café` →
/// `Cafe`); remaining non-ASCII is dropped. Anything outside
/// `[A-Za-z0-9._-]` becomes `_`, leading/trailing separators are trimmed,
/// and an empty result falls back to the provided default.
pub fn safe_filename(name: &str, fallback: &str) -> String {
    let mapped: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = mapped.trim_matches(|c| matches!(c, '.' | '_' | '-'));
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pick a unique archive entry name, suffixing ` (n)` before the extension
/// on collision.
pub fn unique_archive_name(used: &mut HashSet<String>, name: &str) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s.to_string(), format!(".{e}")),
        _ => (name.to_string(), String::new()),
    };

    let mut n = 1usize;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// List files in `dir` with the given extension.
///
/// Missing directories yield an empty set, matching the pre-download
/// snapshot case.
pub async fn files_with_extension(dir: &Path, ext: &str) -> MediaResult<HashSet<PathBuf>> {
    let mut found = HashSet::new();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(found),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false);
        if matches && entry.file_type().await?.is_file() {
            found.insert(path);
        }
    }

    Ok(found)
}

/// Find the most recently modified file present in `after` but not `before`.
///
/// yt-dlp templates output names from video titles, so the only reliable way
/// to attribute a file to the URL just processed is a before/after diff of
/// the job directory.
pub async fn newest_new_file(
    before: &HashSet<PathBuf>,
    after: &HashSet<PathBuf>,
) -> Option<PathBuf> {
    let mut newest: Option<(PathBuf, std::time::SystemTime)> = None;

    for path in after.difference(before) {
        let Some(modified) = fs::metadata(path)
            .await
            .ok()
            .and_then(|m| m.modified().ok())
        else {
            continue;
        };
        match &newest {
            Some((_, t)) if *t >= modified => {}
            _ => newest = Some((path.clone(), modified)),
        }
    }

    newest.map(|(p, _)| p)
}
