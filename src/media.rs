//! Discovered media candidates.
//!
//! A [`MediaRef`] is the unit that flows from the discovery engine into the
//! download orchestrator. It is immutable once built; the orchestrator shares
//! it between tasks behind an `Arc`.

use std::fmt;

use serde::{Serialize, Serializer};

/// Extraction technique that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `<a href>` pointing at a video file or a media-looking path.
    DirectLink,
    /// `<video src>` and its nested `<source src>` children.
    MediaTag,
    /// Any `<source src>` whose URL looks like video.
    SourceTag,
    /// `<embed src>` / `<object data>`.
    EmbedTag,
    /// Absolute URLs inside inline `<script>` bodies.
    InlineScript,
    /// `url(...)` references inside `<style>` blocks.
    InlineStyle,
    /// `<iframe src>` hosted on a known video platform.
    Iframe,
}

impl Strategy {
    /// Every strategy, in the order the engine runs them.
    pub const ALL: [Strategy; 7] = [
        Self::DirectLink,
        Self::MediaTag,
        Self::SourceTag,
        Self::EmbedTag,
        Self::InlineScript,
        Self::InlineStyle,
        Self::Iframe,
    ];

    /// Returns the stable name used in logs and output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectLink => "direct_link",
            Self::MediaTag => "media_tag",
            Self::SourceTag => "source_tag",
            Self::EmbedTag => "embed_tag",
            Self::InlineScript => "inline_script",
            Self::InlineStyle => "inline_style",
            Self::Iframe => "iframe",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File type tag of a candidate.
///
/// Displays as the lowercase extension including the dot (`.mp4`), or as the
/// sentinels `unknown` / `embedded`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Known video extension, stored lowercase with the leading dot.
    Extension(String),
    /// No recognizable extension.
    Unknown,
    /// Player page on a hosting platform (iframe embed).
    Embedded,
}

impl FileType {
    /// Returns the display form (`.mp4`, `unknown`, `embedded`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Extension(ext) => ext,
            Self::Unknown => "unknown",
            Self::Embedded => "embedded",
        }
    }

    /// True for anything but [`FileType::Unknown`].
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns the extension when this is a concrete file type.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        match self {
            Self::Extension(ext) => Some(ext),
            Self::Unknown | Self::Embedded => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FileType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A discovered media candidate.
///
/// `url` is the identity key: within one discovery run no two returned
/// entries share a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    url: String,
    title: String,
    file_type: FileType,
    source_page: String,
    detected_by: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
}

impl MediaRef {
    /// Creates a candidate with no probe metadata.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        file_type: FileType,
        source_page: impl Into<String>,
        detected_by: Strategy,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            file_type,
            source_page: source_page.into(),
            detected_by,
            content_type: None,
            size_bytes: None,
        }
    }

    /// Returns a copy carrying the metadata observed by the reachability probe.
    #[must_use]
    pub fn with_probe_metadata(
        mut self,
        content_type: Option<String>,
        size_bytes: Option<u64>,
    ) -> Self {
        self.content_type = content_type;
        self.size_bytes = size_bytes;
        self
    }

    /// Absolute URL of the resource.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Best-effort human label.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn file_type(&self) -> &FileType {
        &self.file_type
    }

    /// Page the candidate was found on.
    #[must_use]
    pub fn source_page(&self) -> &str {
        &self.source_page
    }

    #[must_use]
    pub fn detected_by(&self) -> Strategy {
        self.detected_by
    }

    /// `Content-Type` reported by the probe, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// `Content-Length` reported by the probe, if any.
    #[must_use]
    pub fn size_bytes(&self) -> Option<u64> {
        self.size_bytes
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_display_forms() {
        assert_eq!(FileType::Extension(".mp4".to_string()).to_string(), ".mp4");
        assert_eq!(FileType::Unknown.to_string(), "unknown");
        assert_eq!(FileType::Embedded.to_string(), "embedded");
    }

    #[test]
    fn test_file_type_is_known() {
        assert!(FileType::Extension(".mkv".to_string()).is_known());
        assert!(FileType::Embedded.is_known());
        assert!(!FileType::Unknown.is_known());
    }

    #[test]
    fn test_media_ref_serializes_with_string_file_type() {
        let media = MediaRef::new(
            "https://example.com/a.mp4",
            "a",
            FileType::Extension(".mp4".to_string()),
            "https://example.com/",
            Strategy::MediaTag,
        );
        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["file_type"], ".mp4");
        assert_eq!(json["detected_by"], "media_tag");
        assert!(json.get("size_bytes").is_none());
    }

    #[test]
    fn test_with_probe_metadata_keeps_identity() {
        let media = MediaRef::new(
            "https://example.com/a.webm",
            "a",
            FileType::Extension(".webm".to_string()),
            "https://example.com/",
            Strategy::DirectLink,
        )
        .with_probe_metadata(Some("video/webm".to_string()), Some(1024));
        assert_eq!(media.url(), "https://example.com/a.webm");
        assert_eq!(media.content_type(), Some("video/webm"));
        assert_eq!(media.size_bytes(), Some(1024));
    }

    #[test]
    fn test_strategy_names_are_distinct() {
        let mut names: Vec<_> = Strategy::ALL.iter().map(Strategy::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 7);
    }
}
