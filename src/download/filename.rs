//! Turning host-reported file names into safe target paths.

use std::path::{Component, Path, PathBuf};

use super::constants::FALLBACK_FILE_NAME;

/// Percent-decodes a host-reported file name.
///
/// Names that do not decode to valid UTF-8 are returned unchanged.
#[must_use]
pub fn decode_file_name(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |decoded| decoded.into_owned())
}

/// Sanitizes a file name for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

/// Builds `dir/<decoded, sanitized name>`.
///
/// The result always stays directly under `dir`. An existing file at that
/// path is overwritten by the streamer.
#[must_use]
pub fn target_path(dir: &Path, raw_name: &str) -> PathBuf {
    let sanitized = sanitize_filename(&decode_file_name(raw_name));
    if sanitized.trim_matches('_').is_empty() {
        dir.join(FALLBACK_FILE_NAME)
    } else {
        dir.join(sanitized)
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
