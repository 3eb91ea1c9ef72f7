//! Output filename sanitization and unique path resolution.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;

use crate::media::MediaRef;

/// Longest stem kept from a title, in characters.
pub const MAX_FILENAME_CHARS: usize = 200;

/// Extension used when the media type is not a concrete file extension.
pub const FALLBACK_EXTENSION: &str = ".mp4";

/// Stem used when sanitization leaves nothing.
const FALLBACK_STEM: &str = "download";

/// Sanitizes a title for filesystem safety.
///
/// Replaces `< > : " / \ | ? *` (and control characters) with `_`, truncates
/// to [`MAX_FILENAME_CHARS`] characters and trims surrounding whitespace.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_FILENAME_CHARS)
        .collect();
    let trimmed = sanitized.trim();

    if is_safe_filename_segment(trimmed) {
        trimmed.to_string()
    } else {
        trimmed.replace('.', "_")
    }
}

/// File name for a media download: sanitized title plus the media extension,
/// falling back to [`FALLBACK_EXTENSION`].
#[must_use]
pub fn output_file_name(media: &MediaRef) -> String {
    let stem = sanitize_filename(media.title());
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem.as_str() };
    let extension = media.file_type().extension().unwrap_or(FALLBACK_EXTENSION);
    format!("{stem}{extension}")
}

/// Resolves a path under `dir` that is neither on disk nor `taken`.
///
/// Conflicts get a ` (n)` suffix before the extension: `clip.mp4`,
/// `clip (1).mp4`, `clip (2).mp4`, ...
pub fn resolve_unique_path<F>(dir: &Path, filename: &str, taken: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let is_free = |path: &Path| !path.exists() && !taken(path);

    let base_path = dir.join(filename);
    if is_free(&base_path) {
        return base_path;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    };

    for i in 1..1000 {
        let candidate = dir.join(format!("{stem} ({i}){ext}"));
        if is_free(&candidate) {
            return candidate;
        }
    }

    // Fallback (extremely unlikely)
    dir.join(format!("{stem} ({}){ext}", Utc::now().timestamp_millis()))
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use tempfile::TempDir;

    use super::*;
    use crate::media::{FileType, Strategy};

    fn media(title: &str, file_type: FileType) -> MediaRef {
        MediaRef::new("https://e.com/x", title, file_type, "https://e.com/", Strategy::DirectLink)
    }

    #[test]
    fn test_sanitize_filename_removes_invalid_chars() {
        assert_eq!(sanitize_filename("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_filename_trims_and_truncates() {
        assert_eq!(sanitize_filename("  My Clip  "), "My Clip");
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_FILENAME_CHARS);
    }

    #[test]
    fn test_sanitize_filename_preserves_valid_chars() {
        assert_eq!(sanitize_filename("clip (1) - final"), "clip (1) - final");
        assert_eq!(sanitize_filename("日本語"), "日本語");
    }

    #[test]
    fn test_sanitize_filename_rewrites_dot_segments() {
        assert_eq!(sanitize_filename(".."), "__");
        assert_eq!(sanitize_filename("."), "_");
    }

    #[test]
    fn test_output_file_name_uses_extension_or_fallback() {
        assert_eq!(
            output_file_name(&media("Trip", FileType::Extension(".webm".to_string()))),
            "Trip.webm"
        );
        assert_eq!(output_file_name(&media("Trip", FileType::Unknown)), "Trip.mp4");
        assert_eq!(output_file_name(&media("Trip", FileType::Embedded)), "Trip.mp4");
        assert_eq!(output_file_name(&media("   ", FileType::Unknown)), "download.mp4");
    }

    #[test]
    fn test_resolve_unique_path_no_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let path = resolve_unique_path(temp_dir.path(), "clip.mp4", |_| false);
        assert_eq!(path, temp_dir.path().join("clip.mp4"));
    }

    #[test]
    fn test_resolve_unique_path_with_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("clip.mp4"), b"existing").unwrap();

        let path = resolve_unique_path(temp_dir.path(), "clip.mp4", |_| false);
        assert_eq!(path, temp_dir.path().join("clip (1).mp4"));
    }

    #[test]
    fn test_resolve_unique_path_with_claimed_paths() {
        let temp_dir = TempDir::new().unwrap();
        let claimed: HashSet<PathBuf> = [
            temp_dir.path().join("clip.mp4"),
            temp_dir.path().join("clip (1).mp4"),
        ]
        .into_iter()
        .collect();

        let path = resolve_unique_path(temp_dir.path(), "clip.mp4", |p| claimed.contains(p));
        assert_eq!(path, temp_dir.path().join("clip (2).mp4"));
    }

    #[test]
    fn test_resolve_unique_path_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("clip"), b"x").unwrap();
        let path = resolve_unique_path(temp_dir.path(), "clip", |_| false);
        assert_eq!(path, temp_dir.path().join("clip (1)"));
    }
}
