//! On-page auditor: fetches the target page and derives technical SEO signals.
//!
//! The fetch is the only async part. `scraper::Html` is not `Send`, so all
//! parsing happens inside the synchronous [`audit_html`], never held across an
//! await point.

use crate::config::Config;
use crate::domain::normalize_url;
use crate::error::{AppError, Result};
use crate::models::{HeadingSignal, ImageStats, OnPageData, OnPageSignal, SignalStatus};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector is valid"));
static META_DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name='description']").expect("meta description selector is valid")
});
static H1_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("h1 selector is valid"));
static H2_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2").expect("h2 selector is valid"));
static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("img selector is valid"));
static VIEWPORT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name='viewport']").expect("viewport selector is valid"));
static CANONICAL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel='canonical']").expect("canonical selector is valid"));
static OPEN_GRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property^='og:']").expect("open graph selector is valid"));

/// Fetches the candidate page and audits its on-page signals.
///
/// Any failure here (timeout, DNS, HTTP status, non-HTML payload) propagates
/// to the orchestrator, which substitutes [`OnPageData::unavailable`].
///
/// # Arguments
/// * `http_client` - A shared `reqwest::Client` carrying the bot user agent.
/// * `raw_url` - The URL as submitted by the lead (scheme optional).
/// * `config` - Injected settings; only the fetch timeout is used here.
pub(crate) async fn audit_page(
    http_client: &Client,
    raw_url: &str,
    config: &Config,
) -> Result<OnPageData> {
    let page_url = normalize_url(raw_url)?;
    tracing::info!(target: "audit_task", "Fetching page for audit: {}", page_url);

    let response = http_client
        .get(page_url.clone())
        .header(reqwest::header::ACCEPT, "text/html")
        .timeout(config.request_timeout)
        .send()
        .await?
        .error_for_status()?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !content_type.contains("html") {
        tracing::warn!(target: "audit_task", "Non-HTML content at {} ({})", page_url, content_type);
        return Err(AppError::ContentType(content_type));
    }

    let html = response.text().await?;
    let data = audit_html(&html);

    tracing::info!(target: "audit_task",
        "Audit of {} complete: technical score {}/100 (title: {:?}, meta: {:?}, h1: {:?})",
        page_url, data.technical_score, data.title.status, data.meta_description.status, data.h1.status
    );

    Ok(data)
}

/// Derives all on-page signals and the technical score from raw HTML.
/// Pure and synchronous.
pub(crate) fn audit_html(html: &str) -> OnPageData {
    let document = Html::parse_document(html);

    let title_text = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let title_length = title_text.chars().count();

    let meta_text = document
        .select(&META_DESCRIPTION_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default();
    let meta_length = meta_text.chars().count();

    let h1_count = document.select(&H1_SELECTOR).count();
    let h1_text = document
        .select(&H1_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let h2_count = document.select(&H2_SELECTOR).count();

    let mut total_images = 0;
    let mut without_alt = 0;
    for img in document.select(&IMG_SELECTOR) {
        total_images += 1;
        let alt = img.value().attr("alt").map(str::trim).unwrap_or("");
        if alt.is_empty() {
            without_alt += 1;
        }
    }

    let has_viewport = document.select(&VIEWPORT_SELECTOR).next().is_some();
    let has_canonical = document.select(&CANONICAL_SELECTOR).next().is_some();
    let has_open_graph = document.select(&OPEN_GRAPH_SELECTOR).next().is_some();

    let mut data = OnPageData {
        title: OnPageSignal {
            text: title_text,
            length: title_length,
            status: title_status(title_length),
        },
        meta_description: OnPageSignal {
            text: meta_text,
            length: meta_length,
            status: meta_description_status(meta_length),
        },
        h1: HeadingSignal {
            text: h1_text,
            count: h1_count,
            status: h1_status(h1_count),
        },
        h2_count,
        images: ImageStats {
            total: total_images,
            without_alt,
        },
        has_viewport,
        has_canonical,
        has_open_graph,
        technical_score: 0,
    };
    data.technical_score = technical_score(&data);
    data
}

/// Titles under 30 or over 60 characters get truncated or under-use the SERP
/// snippet; absent titles are a hard error.
fn title_status(length: usize) -> SignalStatus {
    if length == 0 {
        SignalStatus::Error
    } else if !(30..=60).contains(&length) {
        SignalStatus::Warning
    } else {
        SignalStatus::Good
    }
}

fn meta_description_status(length: usize) -> SignalStatus {
    if length == 0 {
        SignalStatus::Error
    } else if !(70..=160).contains(&length) {
        SignalStatus::Warning
    } else {
        SignalStatus::Good
    }
}

fn h1_status(count: usize) -> SignalStatus {
    match count {
        0 => SignalStatus::Error,
        1 => SignalStatus::Good,
        _ => SignalStatus::Warning,
    }
}

fn signal_points(status: SignalStatus, good: u32, warning: u32) -> u32 {
    match status {
        SignalStatus::Good => good,
        SignalStatus::Warning => warning,
        SignalStatus::Error => 0,
    }
}

/// Image alt coverage contributes up to 10 points; a page with no images
/// keeps the full credit.
fn alt_coverage_points(images: &ImageStats) -> u32 {
    if images.total == 0 {
        return 10;
    }
    let with_alt = images.total - images.without_alt;
    ((with_alt as f64 / images.total as f64) * 10.0).round() as u32
}

/// The weighted technical sub-score, max 100.
fn technical_score(data: &OnPageData) -> u8 {
    let mut score = 0u32;
    score += signal_points(data.title.status, 20, 10);
    score += signal_points(data.meta_description.status, 20, 10);
    score += signal_points(data.h1.status, 25, 12);
    score += if data.h2_count >= 3 {
        10
    } else if data.h2_count >= 1 {
        5
    } else {
        0
    };
    score += alt_coverage_points(&data.images);
    if data.has_viewport {
        score += 5;
    }
    if data.has_canonical {
        score += 5;
    }
    if data.has_open_graph {
        score += 5;
    }
    score.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_title(title: &str) -> String {
        format!("<html><head><title>{}</title></head><body></body></html>", title)
    }

    #[test]
    fn test_title_status_boundaries() {
        let cases = [
            (0, SignalStatus::Error),
            (29, SignalStatus::Warning),
            (30, SignalStatus::Good),
            (60, SignalStatus::Good),
            (61, SignalStatus::Warning),
        ];
        for (length, expected) in cases {
            let data = audit_html(&page_with_title(&"x".repeat(length)));
            assert_eq!(data.title.length, length);
            assert_eq!(data.title.status, expected, "title length {}", length);
        }
    }

    #[test]
    fn test_title_length_counts_characters_not_bytes() {
        // 30 accented characters are 60 bytes; the boundary must not shift.
        let data = audit_html(&page_with_title(&"é".repeat(30)));
        assert_eq!(data.title.length, 30);
        assert_eq!(data.title.status, SignalStatus::Good);
    }

    #[test]
    fn test_meta_description_boundaries() {
        let cases = [
            (0, SignalStatus::Error),
            (69, SignalStatus::Warning),
            (70, SignalStatus::Good),
            (160, SignalStatus::Good),
            (161, SignalStatus::Warning),
        ];
        for (length, expected) in cases {
            let html = format!(
                "<html><head><meta name=\"description\" content=\"{}\"></head></html>",
                "d".repeat(length)
            );
            let data = audit_html(&html);
            assert_eq!(data.meta_description.status, expected, "meta length {}", length);
        }
    }

    #[test]
    fn test_h1_signal() {
        let data = audit_html("<html><body><h1> Accueil </h1></body></html>");
        assert_eq!(data.h1.count, 1);
        assert_eq!(data.h1.text, "Accueil");
        assert_eq!(data.h1.status, SignalStatus::Good);

        let data = audit_html("<html><body><h1>One</h1><h1>Two</h1></body></html>");
        assert_eq!(data.h1.count, 2);
        assert_eq!(data.h1.text, "One");
        assert_eq!(data.h1.status, SignalStatus::Warning);

        let data = audit_html("<html><body></body></html>");
        assert_eq!(data.h1.count, 0);
        assert_eq!(data.h1.status, SignalStatus::Error);
    }

    #[test]
    fn test_image_alt_coverage() {
        let html = r#"<html><body>
            <img src="a.png" alt="logo">
            <img src="b.png" alt="  ">
            <img src="c.png">
            <img src="d.png" alt="photo">
        </body></html>"#;
        let data = audit_html(html);
        assert_eq!(data.images.total, 4);
        assert_eq!(data.images.without_alt, 2);
        // 2 of 4 covered -> round(5) alt points.
        assert_eq!(alt_coverage_points(&data.images), 5);
    }

    #[test]
    fn test_head_tag_detection() {
        let html = r#"<html><head>
            <meta name="viewport" content="width=device-width, initial-scale=1">
            <link rel="canonical" href="https://example.com/">
            <meta property="og:title" content="Accueil">
        </head></html>"#;
        let data = audit_html(html);
        assert!(data.has_viewport);
        assert!(data.has_canonical);
        assert!(data.has_open_graph);

        let data = audit_html("<html><head></head></html>");
        assert!(!data.has_viewport);
        assert!(!data.has_canonical);
        assert!(!data.has_open_graph);
    }

    #[test]
    fn test_technical_score_perfect_page() {
        let html = format!(
            r#"<html><head>
                <title>{}</title>
                <meta name="description" content="{}">
                <meta name="viewport" content="width=device-width">
                <link rel="canonical" href="https://example.com/">
                <meta property="og:title" content="Accueil">
            </head><body>
                <h1>Agence web à Paris</h1>
                <h2>Services</h2><h2>Tarifs</h2><h2>Contact</h2>
                <img src="a.png" alt="logo">
            </body></html>"#,
            "t".repeat(45),
            "d".repeat(120)
        );
        let data = audit_html(&html);
        assert_eq!(data.technical_score, 100);
    }

    #[test]
    fn test_technical_score_empty_document_keeps_alt_credit() {
        // No title/meta/h1/h2 and no viewport/canonical/og: every weighted
        // signal is zero, but a page without images keeps the 10 alt points.
        let data = audit_html("<html><head></head><body></body></html>");
        assert_eq!(data.title.status, SignalStatus::Error);
        assert_eq!(data.meta_description.status, SignalStatus::Error);
        assert_eq!(data.h1.status, SignalStatus::Error);
        assert_eq!(data.h2_count, 0);
        assert_eq!(data.technical_score, 10);
    }

    #[test]
    fn test_technical_score_empty_document_with_bare_image() {
        // Same page plus one alt-less image loses the alt credit entirely.
        let data = audit_html("<html><body><img src=\"a.png\"></body></html>");
        assert_eq!(data.images.total, 1);
        assert_eq!(data.images.without_alt, 1);
        assert_eq!(data.technical_score, 0);
    }

    #[test]
    fn test_technical_score_partial_page() {
        // Warning title (10) + good meta (20) + multiple h1 (12) + one h2 (5)
        // + no images (10) + viewport (5) = 62.
        let html = format!(
            r#"<html><head>
                <title>Court</title>
                <meta name="description" content="{}">
                <meta name="viewport" content="width=device-width">
            </head><body>
                <h1>Un</h1><h1>Deux</h1>
                <h2>Section</h2>
            </body></html>"#,
            "d".repeat(90)
        );
        let data = audit_html(&html);
        assert_eq!(data.technical_score, 62);
    }
}
