#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use web_scraper_qa::error::{AppError, Result};
use web_scraper_qa::llm::{ChatMessage, Completion, CompletionBackend, CompletionOptions};
use web_scraper_qa::qa::QaService;

/// Backend that records every call and replays a canned reply.
pub struct RecordingBackend {
    pub calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
    reply: std::result::Result<Completion, String>,
}

impl RecordingBackend {
    pub fn replying(text: &str, tokens_used: u32) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Ok(Completion {
                text: text.to_string(),
                tokens_used,
            }),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Err(message.to_string()),
        })
    }

    pub fn service(self: &Arc<Self>) -> QaService {
        QaService::with_backend(self.clone())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> (Vec<ChatMessage>, CompletionOptions) {
        self.calls.lock().unwrap().last().cloned().expect("no calls recorded")
    }
}

#[async_trait]
impl CompletionBackend for RecordingBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.clone()));
        self.reply
            .clone()
            .map_err(AppError::LlmError)
    }
}
