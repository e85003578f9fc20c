//! One-shot scrape, then optionally a question and a summary.

use std::io::Write;

use crate::error::Result;
use crate::qa::{AskOptions, DEFAULT_SUMMARY_WORDS, QaService, truncate_with_marker};
use crate::scraper::{ScrapeOutput, Scraper};

/// Characters of page text shown when nothing is asked.
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub url: String,
    pub question: Option<String>,
    pub summarize: bool,
    pub structured: bool,
    pub options: AskOptions,
}

impl BatchRequest {
    pub fn needs_llm(&self) -> bool {
        self.question.is_some() || self.summarize
    }
}

/// Scrape `request.url` and write the report to `output`.
///
/// `build_qa` is only called once the page is scraped and a question or
/// summary was requested, so a plain preview never needs a credential.
pub async fn run_batch<F, W>(
    scraper: &Scraper,
    request: &BatchRequest,
    build_qa: F,
    mut output: W,
) -> Result<()>
where
    F: FnOnce() -> Result<QaService>,
    W: Write,
{
    writeln!(output, "Scraping website: {}", request.url)?;
    let scraped = scraper.scrape(&request.url, request.structured).await?;

    match &scraped {
        ScrapeOutput::Structured(content) => {
            writeln!(output, "\nTitle: {}", content.title)?;
            writeln!(output, "Found {} headings", content.headings.len())?;
            writeln!(output, "Found {} paragraphs", content.paragraphs.len())?;
        }
        ScrapeOutput::Plain(content) => {
            writeln!(output, "\nSuccessfully scraped {} characters", content.length)?;
        }
    }
    let text = scraped.text();

    if !request.needs_llm() {
        writeln!(
            output,
            "\nContent Preview:\n{}",
            truncate_with_marker(text, PREVIEW_CHARS, "...")
        )?;
        writeln!(output, "\nTip: Use -q 'your question' to ask questions about this content")?;
        writeln!(output, "Tip: Use -s to generate a summary")?;
        return Ok(());
    }

    let qa = build_qa()?;

    if let Some(question) = &request.question {
        writeln!(output, "\nQuestion: {}", question)?;
        let result = qa.answer_question(text, question, &request.options).await?;
        writeln!(output, "\nAnswer:\n{}", result.answer)?;
        writeln!(output, "\nTokens used: {}", result.tokens_used)?;
    }

    if request.summarize {
        let summary = qa.summarize_content(text, DEFAULT_SUMMARY_WORDS).await?;
        writeln!(output, "\nSummary:\n{}", summary)?;
    }

    Ok(())
}
