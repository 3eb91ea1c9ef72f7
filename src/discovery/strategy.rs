//! Extraction strategies over a parsed HTML document.
//!
//! Each strategy is a stateless scan that returns its own candidates; none of
//! them share mutable state. [`extract_candidates`] runs all seven and
//! isolates failures so one broken strategy never hides the others' results.

use std::panic::{AssertUnwindSafe, catch_unwind};

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace, warn};
use url::Url;

use super::error::ExtractionError;
use super::patterns::{
    file_type_from_url, is_video_platform, is_video_url, pick_title, resolve_reference,
    scan_css_urls, scan_text_for_urls, title_from_url,
};
use crate::media::{FileType, MediaRef, Strategy};

/// Page being scanned: the parsed tree plus the URL references resolve against.
struct PageContext<'a> {
    document: &'a Html,
    base: &'a Url,
}

impl PageContext<'_> {
    fn candidate(&self, url: &Url, title: String, file_type: FileType, by: Strategy) -> MediaRef {
        trace!(url = %url, strategy = %by, "candidate found");
        MediaRef::new(url.as_str(), title, file_type, self.base.as_str(), by)
    }
}

/// Parses `html` and runs every strategy against it.
///
/// `page_url` is the final (post-redirect) URL of the page. The result may
/// contain duplicates; deduplication happens in the engine.
#[must_use]
pub fn extract_candidates(html: &str, page_url: &Url) -> Vec<MediaRef> {
    let document = Html::parse_document(html);
    let ctx = PageContext {
        document: &document,
        base: page_url,
    };

    let mut candidates = Vec::new();
    for strategy in Strategy::ALL {
        match run_isolated(strategy, || extract(strategy, &ctx)) {
            Ok(found) => {
                debug!(strategy = %strategy, count = found.len(), "strategy finished");
                candidates.extend(found);
            }
            Err(error) => warn!(error = %error, "skipping failed extraction strategy"),
        }
    }
    candidates
}

/// Runs one strategy scan, converting a panic into an [`ExtractionError`].
fn run_isolated<F>(strategy: Strategy, scan: F) -> Result<Vec<MediaRef>, ExtractionError>
where
    F: FnOnce() -> Result<Vec<MediaRef>, ExtractionError>,
{
    catch_unwind(AssertUnwindSafe(scan)).unwrap_or_else(|panic| {
        let reason = panic
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "strategy panicked".to_string());
        Err(ExtractionError::new(strategy, reason))
    })
}

fn extract(strategy: Strategy, ctx: &PageContext<'_>) -> Result<Vec<MediaRef>, ExtractionError> {
    match strategy {
        Strategy::DirectLink => direct_links(ctx),
        Strategy::MediaTag => media_tags(ctx),
        Strategy::SourceTag => source_tags(ctx),
        Strategy::EmbedTag => embed_tags(ctx),
        Strategy::InlineScript => inline_scripts(ctx),
        Strategy::InlineStyle => inline_styles(ctx),
        Strategy::Iframe => iframes(ctx),
    }
}

fn selector(strategy: Strategy, css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css)
        .map_err(|e| ExtractionError::new(strategy, format!("bad selector `{css}`: {e}")))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

fn direct_links(ctx: &PageContext<'_>) -> Result<Vec<MediaRef>, ExtractionError> {
    let anchors = selector(Strategy::DirectLink, "a[href]")?;
    let mut found = Vec::new();

    for anchor in ctx.document.select(&anchors) {
        let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_reference(ctx.base, href))
        else {
            continue;
        };
        if !is_video_url(&url) {
            continue;
        }
        let text = element_text(&anchor);
        let title = pick_title([Some(text.as_str()), anchor.value().attr("title")], &url);
        found.push(ctx.candidate(&url, title, file_type_from_url(&url), Strategy::DirectLink));
    }
    Ok(found)
}

fn media_tags(ctx: &PageContext<'_>) -> Result<Vec<MediaRef>, ExtractionError> {
    let videos = selector(Strategy::MediaTag, "video")?;
    let sources = selector(Strategy::MediaTag, "source[src]")?;
    let mut found = Vec::new();

    for video in ctx.document.select(&videos) {
        let video_title = video.value().attr("title");

        if let Some(url) = video
            .value()
            .attr("src")
            .and_then(|src| resolve_reference(ctx.base, src))
        {
            let title = pick_title([video_title, video.value().attr("alt")], &url);
            found.push(ctx.candidate(&url, title, file_type_from_url(&url), Strategy::MediaTag));
        }

        for source in video.select(&sources) {
            let Some(url) = source
                .value()
                .attr("src")
                .and_then(|src| resolve_reference(ctx.base, src))
            else {
                continue;
            };
            let title = pick_title([source.value().attr("title"), video_title], &url);
            found.push(ctx.candidate(&url, title, file_type_from_url(&url), Strategy::MediaTag));
        }
    }
    Ok(found)
}

fn source_tags(ctx: &PageContext<'_>) -> Result<Vec<MediaRef>, ExtractionError> {
    let sources = selector(Strategy::SourceTag, "source[src]")?;
    let mut found = Vec::new();

    for source in ctx.document.select(&sources) {
        let Some(url) = source
            .value()
            .attr("src")
            .and_then(|src| resolve_reference(ctx.base, src))
        else {
            continue;
        };
        if is_video_url(&url) {
            let title = pick_title([source.value().attr("title")], &url);
            found.push(ctx.candidate(&url, title, file_type_from_url(&url), Strategy::SourceTag));
        }
    }
    Ok(found)
}

fn embed_tags(ctx: &PageContext<'_>) -> Result<Vec<MediaRef>, ExtractionError> {
    let objects = selector(Strategy::EmbedTag, "object[data]")?;
    let embeds = selector(Strategy::EmbedTag, "embed[src]")?;
    let mut found = Vec::new();

    let tagged = ctx
        .document
        .select(&objects)
        .map(|el| (el, "data"))
        .chain(ctx.document.select(&embeds).map(|el| (el, "src")));

    for (element, attr) in tagged {
        let Some(url) = element
            .value()
            .attr(attr)
            .and_then(|raw| resolve_reference(ctx.base, raw))
        else {
            continue;
        };
        if is_video_url(&url) {
            let title = pick_title([element.value().attr("title")], &url);
            found.push(ctx.candidate(&url, title, file_type_from_url(&url), Strategy::EmbedTag));
        }
    }
    Ok(found)
}

fn inline_scripts(ctx: &PageContext<'_>) -> Result<Vec<MediaRef>, ExtractionError> {
    let scripts = selector(Strategy::InlineScript, "script")?;
    let mut found = Vec::new();

    for script in ctx.document.select(&scripts) {
        let body = element_text(&script);
        for raw in scan_text_for_urls(&body) {
            let Some(url) = resolve_reference(ctx.base, raw) else {
                continue;
            };
            if is_video_url(&url) {
                let title = title_from_url(&url);
                let file_type = file_type_from_url(&url);
                found.push(ctx.candidate(&url, title, file_type, Strategy::InlineScript));
            }
        }
    }
    Ok(found)
}

fn inline_styles(ctx: &PageContext<'_>) -> Result<Vec<MediaRef>, ExtractionError> {
    let styles = selector(Strategy::InlineStyle, "style")?;
    let mut found = Vec::new();

    for style in ctx.document.select(&styles) {
        let css = element_text(&style);
        for raw in scan_css_urls(&css) {
            let Some(url) = resolve_reference(ctx.base, raw) else {
                continue;
            };
            if is_video_url(&url) {
                let title = title_from_url(&url);
                let file_type = file_type_from_url(&url);
                found.push(ctx.candidate(&url, title, file_type, Strategy::InlineStyle));
            }
        }
    }
    Ok(found)
}

fn iframes(ctx: &PageContext<'_>) -> Result<Vec<MediaRef>, ExtractionError> {
    let frames = selector(Strategy::Iframe, "iframe[src]")?;
    let mut found = Vec::new();

    for frame in ctx.document.select(&frames) {
        let Some(url) = frame
            .value()
            .attr("src")
            .and_then(|src| resolve_reference(ctx.base, src))
        else {
            continue;
        };
        if is_video_platform(&url) {
            let title = pick_title([frame.value().attr("title")], &url);
            found.push(ctx.candidate(&url, title, FileType::Embedded, Strategy::Iframe));
        }
    }
    Ok(found)
}
