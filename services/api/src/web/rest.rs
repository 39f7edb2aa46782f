//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the language-assessment REST API and the master
//! definition for the OpenAPI specification.

use crate::error::{ErrorBody, ErrorDetail, RequestError};
use crate::web::state::AppState;
use assessment_core::{
    languages, CacheStats, LanguageCode, Passage, PassageManager, PassageSummary,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Optional header naming the assessment attempt whose session tier serves the request.
pub const ATTEMPT_HEADER: &str = "x-attempt-id";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_language_code_handler,
        get_passage_handler,
        get_new_passage_handler,
        generate_passage_handler,
        list_passages_handler,
        passage_status_handler,
        clear_language_handler,
        clear_session_handler,
        cache_stats_handler,
        supported_languages_handler,
    ),
    components(
        schemas(
            LanguageRequest, GetPassageRequest, GeneratePassageRequest, LanguageCodeResponse, PassageResponse,
            AvailableLanguagesResponse, PassageStatusResponse, CacheStatsResponse,
            PassageSummaryResponse, SupportedLanguage, ErrorBody, ErrorDetail
        )
    ),
    tags(
        (name = "Language Assessment API", description = "Reading passages for spoken language assessments.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LanguageRequest {
    /// A language name, native name or code ("English", "français", "zh").
    language: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetPassageRequest {
    language: String,
    #[serde(default)]
    force_new: bool,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePassageRequest {
    /// The language as the user named it; used in the prompt.
    language: String,
    /// Skips resolution of `language` when given.
    #[serde(default)]
    target_language_code: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LanguageCodeResponse {
    language_code: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassageResponse {
    id: Uuid,
    text: String,
    title: String,
    /// Expected reading time in seconds.
    estimated_duration: u32,
    language_code: String,
    /// English name of the passage language.
    language_name: String,
    generated_at: DateTime<Utc>,
}

impl From<Passage> for PassageResponse {
    fn from(passage: Passage) -> Self {
        Self {
            id: passage.id,
            language_name: languages::display_name(passage.language_code.as_str()),
            language_code: passage.language_code.to_string(),
            text: passage.text,
            title: passage.title,
            estimated_duration: passage.estimated_duration,
            generated_at: passage.generated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AvailableLanguagesResponse {
    languages: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassageStatusResponse {
    language_code: String,
    cached: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassageSummaryResponse {
    id: Uuid,
    language_code: String,
    title: String,
    generated_at: DateTime<Utc>,
}

impl From<PassageSummary> for PassageSummaryResponse {
    fn from(summary: PassageSummary) -> Self {
        Self {
            id: summary.id,
            language_code: summary.language_code.to_string(),
            title: summary.title,
            generated_at: summary.generated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    total_cached: usize,
    session_cached: usize,
    languages: Vec<String>,
    /// Most recently generated passages, oldest first.
    recent_passages: Vec<PassageSummaryResponse>,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            total_cached: stats.total_cached,
            session_cached: stats.session_cached,
            languages: stats.languages.into_iter().map(|c| c.to_string()).collect(),
            recent_passages: stats.recent_passages.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SupportedLanguage {
    code: String,
    name: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn attempt_id(headers: &HeaderMap) -> Result<Option<Uuid>, RequestError> {
    let Some(value) = headers.get(ATTEMPT_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(Some)
        .ok_or_else(|| RequestError::bad_request(format!("Invalid {} header", ATTEMPT_HEADER)))
}

/// The attempt's manager, starting its session tier if this is its first passage request.
async fn manager(
    app_state: &AppState,
    headers: &HeaderMap,
) -> Result<Arc<PassageManager>, RequestError> {
    let attempt = attempt_id(headers)?;
    Ok(app_state.sessions.manager_for(attempt).await)
}

/// The attempt's manager for requests that do not write a session tier.
async fn observer(
    app_state: &AppState,
    headers: &HeaderMap,
) -> Result<Arc<PassageManager>, RequestError> {
    let attempt = attempt_id(headers)?;
    Ok(app_state.sessions.observe(attempt).await)
}

fn language_code(raw: &str) -> Result<LanguageCode, RequestError> {
    LanguageCode::parse(raw)
        .ok_or_else(|| RequestError::bad_request(format!("'{}' is not a language code", raw)))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Resolve a language name or code to its ISO code.
#[utoipa::path(
    post,
    path = "/language-assessment/get-language-code",
    request_body = LanguageRequest,
    responses(
        (status = 200, description = "Language resolved", body = LanguageCodeResponse),
        (status = 422, description = "Language could not be resolved", body = ErrorBody)
    )
)]
pub async fn get_language_code_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LanguageRequest>, JsonRejection>,
) -> Result<Json<LanguageCodeResponse>, RequestError> {
    let Json(body) = payload?;
    let manager = observer(&app_state, &headers).await?;
    let code = manager.resolve(&body.language).await?;
    Ok(Json(LanguageCodeResponse {
        language_code: code.to_string(),
    }))
}

/// Get the session's passage for a language, generating one if none is cached.
#[utoipa::path(
    post,
    path = "/language-assessment/get-passage",
    request_body = GetPassageRequest,
    responses(
        (status = 200, description = "Passage for the language", body = PassageResponse),
        (status = 400, description = "Bad request (e.g., malformed attempt header)", body = ErrorBody),
        (status = 422, description = "Language could not be resolved", body = ErrorBody),
        (status = 502, description = "Passage generation failed", body = ErrorBody)
    ),
    params(
        ("x-attempt-id" = Option<Uuid>, Header, description = "The assessment attempt this request belongs to.")
    )
)]
pub async fn get_passage_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<GetPassageRequest>, JsonRejection>,
) -> Result<Json<PassageResponse>, RequestError> {
    let Json(body) = payload?;
    let manager = manager(&app_state, &headers).await?;
    let passage = manager.get_passage(&body.language, body.force_new).await?;
    Ok(Json(passage.into()))
}

/// Generate a fresh passage for a language, replacing the cached one.
#[utoipa::path(
    post,
    path = "/language-assessment/get-new-passage",
    request_body = LanguageRequest,
    responses(
        (status = 200, description = "Newly generated passage", body = PassageResponse),
        (status = 422, description = "Language could not be resolved", body = ErrorBody),
        (status = 502, description = "Passage generation failed", body = ErrorBody)
    ),
    params(
        ("x-attempt-id" = Option<Uuid>, Header, description = "The assessment attempt this request belongs to.")
    )
)]
pub async fn get_new_passage_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LanguageRequest>, JsonRejection>,
) -> Result<Json<PassageResponse>, RequestError> {
    let Json(body) = payload?;
    let manager = manager(&app_state, &headers).await?;
    let passage = manager.get_new_passage(&body.language).await?;
    Ok(Json(passage.into()))
}

/// Generate a one-off passage that is not cached in either tier.
#[utoipa::path(
    post,
    path = "/language-assessment/generate-passage",
    request_body = GeneratePassageRequest,
    responses(
        (status = 200, description = "Generated passage", body = PassageResponse),
        (status = 400, description = "Not a language code", body = ErrorBody),
        (status = 422, description = "Language could not be resolved", body = ErrorBody),
        (status = 502, description = "Passage generation failed", body = ErrorBody)
    )
)]
pub async fn generate_passage_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<GeneratePassageRequest>, JsonRejection>,
) -> Result<Json<PassageResponse>, RequestError> {
    let Json(body) = payload?;
    let target = body
        .target_language_code
        .as_deref()
        .map(language_code)
        .transpose()?;
    let manager = observer(&app_state, &headers).await?;
    let passage = manager.generate_uncached(&body.language, target).await?;
    Ok(Json(passage.into()))
}

/// List the language codes with a cached passage.
#[utoipa::path(
    get,
    path = "/language-assessment/passages",
    responses((status = 200, description = "Cached languages", body = AvailableLanguagesResponse))
)]
pub async fn list_passages_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AvailableLanguagesResponse>, RequestError> {
    let manager = observer(&app_state, &headers).await?;
    let languages = manager
        .list_available_languages()
        .await
        .into_iter()
        .map(|c| c.to_string())
        .collect();
    Ok(Json(AvailableLanguagesResponse { languages }))
}

/// Report whether a passage is cached for a language code.
#[utoipa::path(
    get,
    path = "/language-assessment/passages/{code}",
    params(("code" = String, Path, description = "ISO language code")),
    responses(
        (status = 200, description = "Cache status", body = PassageStatusResponse),
        (status = 400, description = "Not a language code", body = ErrorBody)
    )
)]
pub async fn passage_status_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Json<PassageStatusResponse>, RequestError> {
    let code = language_code(&code)?;
    let manager = observer(&app_state, &headers).await?;
    let cached = manager.has_passage(&code).await;
    Ok(Json(PassageStatusResponse {
        language_code: code.to_string(),
        cached,
    }))
}

/// Drop the cached passage for a language code from every session.
#[utoipa::path(
    delete,
    path = "/language-assessment/passages/{code}",
    params(("code" = String, Path, description = "ISO language code")),
    responses(
        (status = 204, description = "Cleared (or nothing was cached)"),
        (status = 400, description = "Not a language code", body = ErrorBody)
    )
)]
pub async fn clear_language_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<StatusCode, RequestError> {
    attempt_id(&headers)?;
    let code = language_code(&code)?;
    app_state.sessions.clear_language(&code).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Empty the session tier of the current attempt.
#[utoipa::path(
    delete,
    path = "/language-assessment/session",
    responses((status = 204, description = "Session cache cleared")),
    params(
        ("x-attempt-id" = Option<Uuid>, Header, description = "The assessment attempt this request belongs to.")
    )
)]
pub async fn clear_session_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, RequestError> {
    let attempt = attempt_id(&headers)?;
    let manager = app_state.sessions.observe(attempt).await;
    manager.clear_session_cache().await;
    // The attempt's next request starts from a fresh registry entry.
    if let Some(attempt) = attempt {
        app_state.sessions.end_attempt(attempt).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Diagnostics for both cache tiers.
#[utoipa::path(
    get,
    path = "/language-assessment/cache-stats",
    responses((status = 200, description = "Cache statistics", body = CacheStatsResponse))
)]
pub async fn cache_stats_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CacheStatsResponse>, RequestError> {
    let manager = observer(&app_state, &headers).await?;
    let stats = manager.cache_stats().await;
    info!(
        "Cache stats requested: {} cached, {} in session",
        stats.total_cached, stats.session_cached
    );
    Ok(Json(stats.into()))
}

/// All language codes the service knows a display name for.
#[utoipa::path(
    get,
    path = "/language-assessment/languages",
    responses((status = 200, description = "Known languages", body = [SupportedLanguage]))
)]
pub async fn supported_languages_handler() -> impl IntoResponse {
    let supported: Vec<SupportedLanguage> = languages::supported_language_codes()
        .zip(languages::supported_language_names())
        .map(|(code, name)| SupportedLanguage {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect();
    Json(supported)
}

pub async fn health_handler() -> &'static str {
    "ok"
}
