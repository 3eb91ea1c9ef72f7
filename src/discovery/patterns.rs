//! URL classification, file-type and title derivation.
//!
//! All recognition here is exact pattern matching: a fixed extension set, a
//! fixed list of path keywords and a fixed platform allowlist.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::media::FileType;

/// Maximum accepted URL length; longer references are ignored.
pub const MAX_URL_LENGTH: usize = 2000;

/// Recognized video file extensions (lowercase, with the leading dot).
pub const VIDEO_EXTENSIONS: [&str; 15] = [
    ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".3gp", ".ogv", ".ts", ".mts",
    ".m2ts", ".divx", ".xvid",
];

/// Hosts whose iframes are treated as embedded players.
pub const VIDEO_PLATFORMS: [&str; 8] = [
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "twitch.tv",
    "facebook.com",
    "instagram.com",
    "tiktok.com",
];

/// Fallback title when nothing usable can be derived.
pub const UNTITLED: &str = "Untitled Video";

/// Absolute URL whose path contains a media-ish keyword segment.
#[allow(clippy::expect_used)]
static PATH_KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s<>"']+/(?:video|media|stream|embed|player)/[^\s<>"']+"#)
        .expect("path keyword regex is valid") // Static pattern, safe to panic
});

/// Absolute URL ending in a video extension, used to scan free text.
#[allow(clippy::expect_used)]
static EXTENSION_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)https?://[^\s<>"']+\.(?:mp4|avi|mkv|mov|wmv|flv|webm|m4v|3gp|ogv|m2ts|mts|ts|divx|xvid)\b"#,
    )
    .expect("extension URL regex is valid") // Static pattern, safe to panic
});

/// `url(...)` references inside CSS.
#[allow(clippy::expect_used)]
static CSS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(["']?([^"')\s]+)["']?\)"#).expect("CSS url regex is valid") // Static pattern, safe to panic
});

/// Characters dropped from URL-derived titles.
#[allow(clippy::expect_used)]
static TITLE_STRIP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("title regex is valid")); // Static pattern, safe to panic

/// Resolves a raw reference against the page URL.
///
/// Returns `None` for empty, overlong, unparsable, or non-HTTP(S) references
/// (`javascript:`, `mailto:`, `data:` ...).
#[must_use]
pub fn resolve_reference(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > MAX_URL_LENGTH {
        return None;
    }
    let resolved = base.join(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" if resolved.host().is_some() => Some(resolved),
        _ => None,
    }
}

/// True if the URL's path ends in a known video extension or the URL contains
/// one of the media path keywords (`/video/`, `/media/`, `/stream/`,
/// `/embed/`, `/player/`).
#[must_use]
pub fn is_video_url(url: &Url) -> bool {
    extension_of(url).is_some() || PATH_KEYWORD_PATTERN.is_match(url.as_str())
}

/// True if the URL is hosted on an allowlisted video platform (or a subdomain of one).
#[must_use]
pub fn is_video_platform(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    VIDEO_PLATFORMS.iter().any(|platform| {
        host == *platform
            || host
                .strip_suffix(platform)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Derives the file type from the final path segment's extension.
#[must_use]
pub fn file_type_from_url(url: &Url) -> FileType {
    extension_of(url).map_or(FileType::Unknown, |ext| FileType::Extension(ext.to_string()))
}

/// Finds candidate absolute video URLs in free text (script bodies).
pub fn scan_text_for_urls(text: &str) -> impl Iterator<Item = &str> {
    EXTENSION_URL_PATTERN
        .find_iter(text)
        .chain(PATH_KEYWORD_PATTERN.find_iter(text))
        .map(|m| m.as_str())
}

/// Extracts the targets of `url(...)` references in a stylesheet.
pub fn scan_css_urls(css: &str) -> impl Iterator<Item = &str> {
    CSS_URL_PATTERN
        .captures_iter(css)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Builds a human label from the URL path.
///
/// Strips the video extension, keeps the last path segment, turns `-`, `_`
/// and `%20` into spaces and drops remaining non-word characters. Falls back
/// to [`UNTITLED`].
#[must_use]
pub fn title_from_url(url: &Url) -> String {
    let mut path = url.path();
    let lowered = path.to_ascii_lowercase();
    if let Some(ext) = VIDEO_EXTENSIONS.iter().find(|ext| lowered.ends_with(*ext)) {
        path = &path[..path.len() - ext.len()];
    }

    let segment = path.rsplit('/').next().unwrap_or_default();
    let spaced = segment
        .replace("%20", " ")
        .replace(['-', '_'], " ");
    let cleaned = TITLE_STRIP_PATTERN.replace_all(&spaced, "");
    let title = cleaned.trim();

    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

/// Picks the first non-blank label, or derives one from the URL.
#[must_use]
pub fn pick_title<'a>(labels: impl IntoIterator<Item = Option<&'a str>>, url: &Url) -> String {
    labels
        .into_iter()
        .flatten()
        .map(|label| label.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|label| !label.is_empty())
        .unwrap_or_else(|| title_from_url(url))
}

fn extension_of(url: &Url) -> Option<&'static str> {
    let last_segment = url.path().rsplit('/').next()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = last_segment[dot_index..].to_ascii_lowercase();
    VIDEO_EXTENSIONS.iter().copied().find(|known| *known == ext)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_is_video_url_by_extension() {
        assert!(is_video_url(&url("https://example.com/clips/a.mp4")));
        assert!(is_video_url(&url("https://example.com/clips/A.MKV")));
        assert!(is_video_url(&url("https://example.com/b.m2ts?x=1")));
        assert!(!is_video_url(&url("https://example.com/page.html")));
        assert!(!is_video_url(&url("https://example.com/app.tsx")));
    }

    #[test]
    fn test_is_video_url_by_path_keyword() {
        assert!(is_video_url(&url("https://example.com/video/123")));
        assert!(is_video_url(&url("https://example.com/a/embed/xyz")));
        assert!(is_video_url(&url("https://example.com/player/x?id=1")));
        // Keyword must be followed by something.
        assert!(!is_video_url(&url("https://example.com/video/")));
        assert!(!is_video_url(&url("https://example.com/videos/1")));
    }

    #[test]
    fn test_is_video_platform_matches_host_and_subdomains() {
        assert!(is_video_platform(&url("https://www.youtube.com/embed/abc")));
        assert!(is_video_platform(&url("https://player.vimeo.com/video/1")));
        assert!(is_video_platform(&url("https://youtu.be/abc")));
        assert!(!is_video_platform(&url("https://notyoutube.com/embed/abc")));
        assert!(!is_video_platform(&url("https://example.com/youtube.com")));
    }

    #[test]
    fn test_file_type_from_url() {
        assert_eq!(
            file_type_from_url(&url("https://e.com/a.MP4")),
            FileType::Extension(".mp4".to_string())
        );
        assert_eq!(
            file_type_from_url(&url("https://e.com/a.m2ts")),
            FileType::Extension(".m2ts".to_string())
        );
        assert_eq!(
            file_type_from_url(&url("https://e.com/video/123")),
            FileType::Unknown
        );
    }

    #[test]
    fn test_title_from_url_cleans_segment() {
        assert_eq!(
            title_from_url(&url("https://e.com/v/my-cool_video.mp4")),
            "my cool video"
        );
        assert_eq!(
            title_from_url(&url("https://e.com/v/summer%20trip.webm")),
            "summer trip"
        );
        assert_eq!(title_from_url(&url("https://e.com/v/(x).mp4")), "x");
    }

    #[test]
    fn test_title_from_url_falls_back_to_untitled() {
        assert_eq!(title_from_url(&url("https://e.com/")), UNTITLED);
        assert_eq!(title_from_url(&url("https://e.com/.mp4")), UNTITLED);
    }

    #[test]
    fn test_pick_title_prefers_first_non_blank_label() {
        let target = url("https://e.com/clip.mp4");
        assert_eq!(
            pick_title([None, Some("  "), Some(" Hello \n world ")], &target),
            "Hello world"
        );
        assert_eq!(pick_title([None], &target), "clip");
    }

    #[test]
    fn test_resolve_reference_rejects_non_http() {
        let base = url("https://e.com/dir/page.html");
        assert_eq!(
            resolve_reference(&base, "a.mp4").unwrap().as_str(),
            "https://e.com/dir/a.mp4"
        );
        assert!(resolve_reference(&base, "javascript:void(0)").is_none());
        assert!(resolve_reference(&base, "mailto:x@e.com").is_none());
        assert!(resolve_reference(&base, "   ").is_none());
    }

    #[test]
    fn test_scan_text_for_urls_finds_both_kinds() {
        let script = r#"var a = "https://cdn.e.com/x.mp4"; var b = 'https://e.com/stream/live1';"#;
        let found: Vec<_> = scan_text_for_urls(script).collect();
        assert!(found.contains(&"https://cdn.e.com/x.mp4"));
        assert!(found.contains(&"https://e.com/stream/live1"));
    }

    #[test]
    fn test_scan_css_urls() {
        let css = r#".hero { background: url("/media/bg.webm"); } .x { background: url(a.png) }"#;
        let found: Vec<_> = scan_css_urls(css).collect();
        assert_eq!(found, vec!["/media/bg.webm", "a.png"]);
    }
}
