//! Page fetching and readable-text extraction.

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::config::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::error::{AppError, Result};

/// Sites often refuse obvious bot agents, so identify as a desktop browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Paragraphs at or below this many characters are treated as boilerplate.
pub const MIN_PARAGRAPH_CHARS: usize = 20;

// Create static selectors to avoid recompiling them each time
static STRIP_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, meta, link, noscript").expect("Failed to parse strip selector")
});

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to parse title selector"));

static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("Failed to parse heading selector")
});

static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("Failed to parse paragraph selector"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedContent {
    pub source_url: String,
    pub plain_text: String,
    /// Character count of `plain_text`.
    pub length: usize,
}

impl ScrapedContent {
    pub fn new(source_url: impl Into<String>, plain_text: String) -> Self {
        let length = plain_text.chars().count();
        Self {
            source_url: source_url.into(),
            plain_text,
            length,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredContent {
    pub title: String,
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub full_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScrapeOutput {
    Plain(ScrapedContent),
    Structured(StructuredContent),
}

impl ScrapeOutput {
    /// The text that should be handed to the model.
    pub fn text(&self) -> &str {
        match self {
            ScrapeOutput::Plain(content) => &content.plain_text,
            ScrapeOutput::Structured(content) => &content.full_text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ScrapeOutput::Plain(content) => content.plain_text,
            ScrapeOutput::Structured(content) => content.full_text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scraper {
    client: Client,
}

impl Scraper {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Fetch `url` and run one of the extraction paths over the body.
    pub async fn scrape(&self, url: &str, structured: bool) -> Result<ScrapeOutput> {
        let html = self.fetch(url).await?;

        let output = if structured {
            ScrapeOutput::Structured(extract_structured(&html))
        } else {
            ScrapeOutput::Plain(ScrapedContent::new(url, extract_plain_text(&html)))
        };

        info!(url, chars = output.text().chars().count(), structured, "scraped page");
        Ok(output)
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        if !is_valid_url(url) {
            return Err(AppError::InvalidUrl(url.to_string()));
        }

        debug!(url, "fetching page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                debug!(url, error = %e, "fetch failed");
                AppError::from(e)
            })?;

        let html = response.text().await?;
        debug!(url, bytes = html.len(), "fetched page");
        Ok(html)
    }
}

/// True when `url` parses and carries both a scheme and a host.
///
/// The host must be written out as a `//` authority: `Url::parse` fills one in
/// for special schemes (`http:example.com`), which does not count.
pub fn is_valid_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    let raw = url.trim_start();
    let has_authority = raw
        .get(parsed.scheme().len()..)
        .is_some_and(|rest| rest.starts_with("://"));

    !parsed.scheme().is_empty()
        && has_authority
        && parsed.host_str().is_some_and(|h| !h.is_empty())
}

/// Visible text of `html` with whitespace collapsed.
///
/// Re-running this on its own output is stable for ordinary text. Entities are
/// decoded, though, so output holding literal markup such as `<b>` parses as
/// tags on a second pass.
pub fn extract_plain_text(html: &str) -> String {
    let document = parse_stripped(html);
    document_text(&document)
}

pub fn extract_structured(html: &str) -> StructuredContent {
    let document = parse_stripped(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let headings = document
        .select(&HEADING_SELECTOR)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    let paragraphs = document
        .select(&PARAGRAPH_SELECTOR)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect();

    StructuredContent {
        title,
        headings,
        paragraphs,
        full_text: document_text(&document),
    }
}

/// Parse `html` and detach every element that never renders as content.
fn parse_stripped(html: &str) -> Html {
    let mut document = Html::parse_document(html);

    let ids: Vec<_> = document.select(&STRIP_SELECTOR).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    document
}

fn document_text(document: &Html) -> String {
    let raw: String = document.root_element().text().collect();
    normalize_whitespace(&raw)
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
