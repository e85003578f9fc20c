use axum::{
    Router,
    extract::{Json, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::api::models::{AskRequest, ScrapeRequest, SummarizeRequest, SummaryResponse};
use crate::api::response;
use crate::error::{AppError, Result};
use crate::qa::{AnswerResult, AskOptions, DEFAULT_SUMMARY_WORDS};
use crate::scraper::ScrapeOutput;

const INDEX_HTML: &str = include_str!("index.html");

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/scrape", post(scrape_handler))
        .route("/api/ask", post(ask_handler))
        .route("/api/summarize", post(summarize_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn scrape_handler(
    State(state): State<AppState>,
    Json(req): Json<ScrapeRequest>,
) -> Response {
    response::respond(scrape(&state, &req).await)
}

async fn ask_handler(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    response::respond(ask(&state, req).await)
}

async fn summarize_handler(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Response {
    response::respond(summarize(&state, req).await)
}

async fn scrape(state: &AppState, req: &ScrapeRequest) -> Result<ScrapeOutput> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(AppError::InvalidRequest("Please enter a URL".to_string()));
    }

    info!(url, structured = req.structured, "scrape requested");
    state.scraper.scrape(url, req.structured).await
}

async fn ask(state: &AppState, req: AskRequest) -> Result<AnswerResult> {
    if req.question.trim().is_empty() {
        return Err(AppError::InvalidRequest("Please enter a question".to_string()));
    }
    require_content(&req.content)?;

    let qa = state.qa_for(req.api_key.as_deref())?;
    let mut options = AskOptions::with_model(
        req.model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| state.config.llm.default_model.clone()),
    );
    if let Some(max_tokens) = req.max_tokens {
        options.max_tokens = max_tokens;
    }

    qa.answer_question(&req.content, req.question.trim(), &options)
        .await
}

async fn summarize(state: &AppState, req: SummarizeRequest) -> Result<SummaryResponse> {
    require_content(&req.content)?;

    let qa = state.qa_for(req.api_key.as_deref())?;
    let summary = qa
        .summarize_content(&req.content, req.max_words.unwrap_or(DEFAULT_SUMMARY_WORDS))
        .await?;

    Ok(SummaryResponse {
        summary,
        content_length: req.content.chars().count(),
    })
}

fn require_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Please scrape a website first".to_string(),
        ));
    }
    Ok(())
}
