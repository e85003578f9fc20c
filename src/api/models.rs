use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(default)]
    pub structured: bool,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub content: String,
    pub question: String,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    /// Overrides the server's configured key for this request only.
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub content: String,
    pub max_words: Option<usize>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub content_length: usize,
}
