//! Question answering and summarization over scraped page text.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{self, DEFAULT_MODEL, LlmSettings};
use crate::error::{AppError, Result};
use crate::llm::{ChatMessage, CompletionBackend, CompletionOptions, OpenAiClient};

pub const MAX_CONTEXT_CHARS: usize = 12_000;
pub const CONTEXT_TRUNCATION_MARKER: &str = "... [content truncated]";
pub const MAX_SUMMARY_INPUT_CHARS: usize = 8_000;
pub const SUMMARY_TRUNCATION_MARKER: &str = "...";

pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_SUMMARY_WORDS: usize = 200;

/// Summaries always use this model, whatever the caller picked for Q&A.
pub const SUMMARY_MODEL: &str = "gpt-3.5-turbo";
const SUMMARY_MAX_TOKENS: u32 = 300;
const SUMMARY_TEMPERATURE: f32 = 0.5;
const ANSWER_TEMPERATURE: f32 = 0.7;

const ANSWER_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions based on provided website content.";
const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that creates concise summaries.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerResult {
    pub question: String,
    pub answer: String,
    pub model: String,
    pub tokens_used: u32,
}

#[derive(Debug, Clone)]
pub struct AskOptions {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl AskOptions {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct QaService {
    backend: Arc<dyn CompletionBackend>,
}

impl QaService {
    /// Resolve the API key from `api_key` or `OPENAI_API_KEY` and build an
    /// OpenAI-backed service. No request is made here.
    pub fn new(api_key: Option<&str>, settings: &LlmSettings) -> Result<Self> {
        Self::with_resolver(api_key, settings, |name| std::env::var(name).ok())
    }

    pub fn with_resolver<F>(api_key: Option<&str>, settings: &LlmSettings, lookup: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let key = config::resolve_api_key(api_key, lookup)?;
        Ok(Self::with_backend(Arc::new(OpenAiClient::new(key, settings))))
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub async fn answer_question(
        &self,
        context: &str,
        question: &str,
        options: &AskOptions,
    ) -> Result<AnswerResult> {
        let messages = [
            ChatMessage::system(ANSWER_SYSTEM_PROMPT),
            ChatMessage::user(build_answer_prompt(context, question)),
        ];
        let completion_options = CompletionOptions {
            model: options.model.clone(),
            max_tokens: options.max_tokens,
            temperature: ANSWER_TEMPERATURE,
        };

        info!(model = %options.model, context_chars = context.chars().count(), "answering question");
        let completion = self
            .backend
            .complete(&messages, &completion_options)
            .await
            .map_err(|e| AppError::CompletionError(cause(e)))?;

        Ok(AnswerResult {
            question: question.to_string(),
            answer: completion.text.trim().to_string(),
            model: options.model.clone(),
            tokens_used: completion.tokens_used,
        })
    }

    /// `max_length_words` is only a hint in the prompt; the reply is not cut.
    pub async fn summarize_content(&self, content: &str, max_length_words: usize) -> Result<String> {
        let messages = [
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(build_summary_prompt(content, max_length_words)),
        ];
        let completion_options = CompletionOptions {
            model: SUMMARY_MODEL.to_string(),
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: SUMMARY_TEMPERATURE,
        };

        info!(content_chars = content.chars().count(), max_length_words, "summarizing content");
        let completion = self
            .backend
            .complete(&messages, &completion_options)
            .await
            .map_err(|e| AppError::SummarizationError(cause(e)))?;

        Ok(completion.text.trim().to_string())
    }
}

// Port errors already carry a "LLM request failed" prefix; keep only the cause.
fn cause(err: AppError) -> String {
    match err {
        AppError::LlmError(msg) => msg,
        other => other.to_string(),
    }
}

pub fn build_answer_prompt(context: &str, question: &str) -> String {
    let context = truncate_with_marker(context, MAX_CONTEXT_CHARS, CONTEXT_TRUNCATION_MARKER);
    format!(
        "Based on the following website content, please answer the question. \n\
         If the answer cannot be found in the content, please say so.\n\n\
         Website Content:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

pub fn build_summary_prompt(content: &str, max_length_words: usize) -> String {
    let content = truncate_with_marker(content, MAX_SUMMARY_INPUT_CHARS, SUMMARY_TRUNCATION_MARKER);
    format!(
        "Please provide a concise summary of the following website content in approximately \
         {max_length_words} words:\n\n{content}\n\nSummary:"
    )
}

/// Keep the first `max_chars` characters and append `marker` when `text` is longer.
pub fn truncate_with_marker(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            debug!(max_chars, "truncating content");
            let mut truncated = String::with_capacity(cut + marker.len());
            truncated.push_str(&text[..cut]);
            truncated.push_str(marker);
            truncated
        }
        None => text.to_string(),
    }
}
