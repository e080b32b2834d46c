use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::ACCEPT_LANGUAGE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use books::{Book, BookError, GutenbergClient};
use extract::{CharacterAnalyzer, CompletionSource, PipelineError, RequestedLocale};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::messages::{status_for, user_message};
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};
use crate::retry::RetryPolicy;

pub struct AppState<C> {
    pub analyzer: CharacterAnalyzer<C>,
    pub books: GutenbergClient,
    pub retry: RetryPolicy,
    pub metrics: Arc<Metrics>,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    text: Option<String>,
}

#[derive(Deserialize)]
struct BookQuery {
    #[serde(rename = "bookId")]
    book_id: Option<String>,
}

#[derive(Serialize)]
struct BookResponse {
    success: bool,
    #[serde(flatten)]
    book: Book,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router<C: CompletionSource + 'static>(state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics::<C>))
        .route("/api/analyze-characters", post(analyze_characters::<C>))
        .route("/api/gutenberg", get(fetch_book::<C>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn get_metrics<C: CompletionSource + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn analyze_characters<C: CompletionSource + 'static>(
    State(state): State<Arc<AppState<C>>>,
    headers: HeaderMap,
    req: Option<Json<AnalyzeRequest>>,
) -> Response {
    let locale = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .map(RequestedLocale::from_language_tag)
        .unwrap_or_default();
    let text = req.and_then(|Json(req)| req.text).unwrap_or_default();
    let span = info_span!("analyze_characters", request_id = %Uuid::new_v4(), %locale);

    async move {
        let timer = TimedOperation::start();
        let outcome = run_analysis(&state, &text, locale).await;
        state
            .metrics
            .record_analysis(outcome.as_ref().map(|_| ()).map_err(PipelineError::kind), timer.elapsed());

        match outcome {
            Ok(result) => {
                info!(
                    characters = result.characters.len(),
                    interactions = result.interactions.len(),
                    "Character analysis complete"
                );
                Json(result).into_response()
            }
            Err(err) => {
                warn!(kind = ?err.kind(), error = %err, "Character analysis failed");
                error_response(status_for(err.kind()), user_message(err.kind(), locale))
            }
        }
    }
    .instrument(span)
    .await
}

async fn run_analysis<C: CompletionSource>(
    state: &AppState<C>,
    text: &str,
    locale: RequestedLocale,
) -> Result<extract::AnalysisResult, PipelineError> {
    let raw = state
        .retry
        .retry("model_completion", || state.analyzer.request_raw(text, locale))
        .await?;
    state.analyzer.interpret(&raw, locale)
}

async fn fetch_book<C: CompletionSource + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Query(query): Query<BookQuery>,
) -> Response {
    let Some(book_id) = query.book_id.filter(|id| !id.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Book ID is required");
    };

    let outcome = state.books.fetch_book(book_id.trim()).await;
    state.metrics.record_book_fetch(outcome.is_ok());

    match outcome {
        Ok(book) => Json(BookResponse {
            success: true,
            book,
        })
        .into_response(),
        Err(BookError::InvalidId(_)) => error_response(StatusCode::BAD_REQUEST, "Book ID must be a number"),
        Err(BookError::MetadataStatus(code)) => error_response(
            StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
            "Failed to fetch book metadata",
        ),
        Err(BookError::ContentStatus(code)) => error_response(
            StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
            "Failed to fetch book content",
        ),
        Err(err @ BookError::Transport(_)) => {
            warn!(book_id = %book_id, error = %err, "Book fetch failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Can't find book")
        }
    }
}
