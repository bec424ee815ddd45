//! Axum route handlers for the lookup API.
//!
//! Every handler follows the same order: admit the client, validate the
//! query, build the upstream request plus a stable cache key, fetch.

use anyhow::anyhow;
use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client_id::ClientId;
use crate::errors::AppError;
use crate::extract::ValidQuery;
use crate::lookup::discover::{
    discover, normalize_topics, validate_term, DiscoverRequest, FailurePolicy, Flavor,
    RankedCandidate,
};
use crate::lookup::rate_limit::{
    CONCEPTNET_POLICY, DICTIONARY_POLICY, DISCOVER_POLICY, WIKIDATA_POLICY, WIKIPEDIA_POLICY,
};
use crate::lookup::upstream::{UpstreamError, UpstreamRequest};
use crate::state::AppState;

const DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
const WIKIPEDIA_SEARCH_URL: &str = "https://en.wikipedia.org/w/rest.php/v1/search/title";
const WIKIPEDIA_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const WIKIDATA_API_URL: &str = "https://www.wikidata.org/w/api.php";
const WIKIDATA_SPARQL_URL: &str = "https://query.wikidata.org/sparql";
const CONCEPTNET_URL: &str = "https://api.conceptnet.io/c/en";

const MAX_QUERY_CHARS: usize = 120;
const MAX_TITLE_CHARS: usize = 200;
const DEFAULT_RESULTS: usize = 25;
const MIN_RESULTS: usize = 5;
const MAX_RESULTS: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

// Query fields stay loosely typed so that malformed values are rejected after
// admission, by the handler, with a validation error.

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    #[serde(default)]
    pub term: String,
    pub topics: Option<String>,
    pub max: Option<String>,
    pub flavors: Option<String>,
    pub policy: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub term: String,
    pub topics: Option<String>,
    pub items: Vec<RankedCandidate>,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DictionaryQuery {
    #[serde(default)]
    pub word: String,
}

#[derive(Debug, Serialize)]
pub struct DictionaryResponse {
    pub word: String,
    pub data: Value,
    pub remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WikipediaMode {
    Search,
    Summary,
}

impl WikipediaMode {
    /// Absent means `search`.
    fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim).filter(|m| !m.is_empty()).unwrap_or("search") {
            "search" => Ok(WikipediaMode::Search),
            "summary" => Ok(WikipediaMode::Summary),
            other => Err(AppError::Validation(format!("Unknown mode '{other}'"))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WikipediaQuery {
    pub mode: Option<String>,
    pub q: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WikidataMode {
    Search,
    Attrs,
}

impl WikidataMode {
    /// Absent means `search`.
    fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim).filter(|m| !m.is_empty()).unwrap_or("search") {
            "search" => Ok(WikidataMode::Search),
            "attrs" => Ok(WikidataMode::Attrs),
            other => Err(AppError::Validation(format!("Unknown mode '{other}'"))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WikidataQuery {
    pub mode: Option<String>,
    pub q: Option<String>,
    pub id: Option<String>,
}

/// Shared reply shape of the encyclopedia and entity lookups.
#[derive(Debug, Serialize)]
pub struct ModeLookupResponse<M> {
    pub mode: M,
    /// The query, title or entity id the lookup ran for.
    pub subject: String,
    pub data: Value,
    pub remaining: u32,
}

#[derive(Debug, Deserialize)]
pub struct ConceptNetQuery {
    #[serde(default)]
    pub term: String,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConceptNetResponse {
    pub term: String,
    pub data: Value,
    pub remaining: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/lookup/discover
///
/// Related-word discovery merged across flavors. Unknown flavors are ignored.
/// A failing flavor contributes nothing unless `policy=fail_fast`.
pub async fn handle_discover(
    State(state): State<AppState>,
    client: ClientId,
    ValidQuery(params): ValidQuery<DiscoverQuery>,
) -> Result<Json<DiscoverResponse>, AppError> {
    let admission = state.limiter.check(&DISCOVER_POLICY, client.as_str())?;

    let max_results = clamp_results(parse_count(params.max.as_deref(), "max")?);
    let policy = match params.policy.as_deref().map(str::trim) {
        None | Some("") => FailurePolicy::default(),
        Some(raw) => FailurePolicy::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("Unknown policy '{raw}'")))?,
    };

    let flavors = match params.flavors.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Flavor::parse_list(raw),
        _ => Flavor::DEFAULT.to_vec(),
    };
    let request = DiscoverRequest {
        topics: normalize_topics(params.topics.as_deref()).map(str::to_string),
        term: params.term,
        max_results,
        flavors,
        policy,
    };

    let items = discover(&state.fetcher, &request).await?;

    Ok(Json(DiscoverResponse {
        term: request.term.trim().to_string(),
        topics: request.topics,
        items,
        remaining: admission.remaining,
        reset_at: admission.reset_at,
    }))
}

/// GET /api/v1/lookup/dictionary
pub async fn handle_dictionary(
    State(state): State<AppState>,
    client: ClientId,
    ValidQuery(params): ValidQuery<DictionaryQuery>,
) -> Result<Json<DictionaryResponse>, AppError> {
    let admission = state.limiter.check(&DICTIONARY_POLICY, client.as_str())?;
    let word = validate_term(&params.word)?.to_string();

    let request = UpstreamRequest::get(url_with_segment(DICTIONARY_URL, &word)?);
    let data = state
        .fetcher
        .fetch_cached(&request, &format!("dict:{word}"), Duration::days(7))
        .await
        .map_err(|e| not_found_on_404(e, &word))?;

    Ok(Json(DictionaryResponse {
        word,
        data,
        remaining: admission.remaining,
    }))
}

/// GET /api/v1/lookup/wikipedia?mode=search|summary
pub async fn handle_wikipedia(
    State(state): State<AppState>,
    client: ClientId,
    ValidQuery(params): ValidQuery<WikipediaQuery>,
) -> Result<Json<ModeLookupResponse<WikipediaMode>>, AppError> {
    let admission = state.limiter.check(&WIKIPEDIA_POLICY, client.as_str())?;
    let mode = WikipediaMode::parse(params.mode.as_deref())?;

    let (subject, data) = match mode {
        WikipediaMode::Search => {
            let q = require_param(params.q.as_deref(), "q", MAX_QUERY_CHARS)?;
            let request = UpstreamRequest::get(WIKIPEDIA_SEARCH_URL)
                .param("q", q.as_str())
                .param("limit", "10");
            let data = state
                .fetcher
                .fetch_cached(&request, &format!("wp:search:{q}"), Duration::days(1))
                .await?;
            (q, data)
        }
        WikipediaMode::Summary => {
            let title = require_param(params.title.as_deref(), "title", MAX_TITLE_CHARS)?;
            let request = UpstreamRequest::get(url_with_segment(WIKIPEDIA_SUMMARY_URL, &title)?);
            let data = state
                .fetcher
                .fetch_cached(&request, &format!("wp:sum:{title}"), Duration::days(7))
                .await
                .map_err(|e| not_found_on_404(e, &title))?;
            (title, data)
        }
    };

    Ok(Json(ModeLookupResponse {
        mode,
        subject,
        data,
        remaining: admission.remaining,
    }))
}

/// GET /api/v1/lookup/wikidata?mode=search|attrs
pub async fn handle_wikidata(
    State(state): State<AppState>,
    client: ClientId,
    ValidQuery(params): ValidQuery<WikidataQuery>,
) -> Result<Json<ModeLookupResponse<WikidataMode>>, AppError> {
    let admission = state.limiter.check(&WIKIDATA_POLICY, client.as_str())?;
    let mode = WikidataMode::parse(params.mode.as_deref())?;

    let (subject, data) = match mode {
        WikidataMode::Search => {
            let q = require_param(params.q.as_deref(), "q", MAX_QUERY_CHARS)?;
            let request = UpstreamRequest::get(WIKIDATA_API_URL)
                .param("action", "wbsearchentities")
                .param("search", q.as_str())
                .param("language", "en")
                .param("format", "json")
                .param("limit", "10");
            let data = state
                .fetcher
                .fetch_cached(&request, &format!("wd:search:{q}"), Duration::days(7))
                .await?;
            (q, data)
        }
        WikidataMode::Attrs => {
            let id = validate_entity_id(params.id.as_deref())?;
            let request = UpstreamRequest::get(WIKIDATA_SPARQL_URL)
                .param("format", "json")
                .param("query", attribute_query(&id));
            let data = state
                .fetcher
                .fetch_cached(&request, &format!("wd:attrs:{id}"), Duration::days(14))
                .await?;
            (id, data)
        }
    };

    Ok(Json(ModeLookupResponse {
        mode,
        subject,
        data,
        remaining: admission.remaining,
    }))
}

/// GET /api/v1/lookup/conceptnet
pub async fn handle_conceptnet(
    State(state): State<AppState>,
    client: ClientId,
    ValidQuery(params): ValidQuery<ConceptNetQuery>,
) -> Result<Json<ConceptNetResponse>, AppError> {
    let admission = state.limiter.check(&CONCEPTNET_POLICY, client.as_str())?;
    let term = validate_term(&params.term)?.to_string();
    let limit = clamp_results(parse_count(params.limit.as_deref(), "limit")?);

    let request = UpstreamRequest::get(url_with_segment(CONCEPTNET_URL, &term)?)
        .param("limit", limit.to_string());
    let data = state
        .fetcher
        .fetch_cached(&request, &format!("cn:{term}:{limit}"), Duration::days(3))
        .await?;

    Ok(Json(ConceptNetResponse {
        term,
        data,
        remaining: admission.remaining,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn clamp_results(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_RESULTS)
        .clamp(MIN_RESULTS, MAX_RESULTS)
}

/// Blank counts as absent; anything else must be a non-negative integer.
fn parse_count(raw: Option<&str>, name: &str) -> Result<Option<usize>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{name} must be a whole number"))),
    }
}

fn require_param(value: Option<&str>, name: &str, max_chars: usize) -> Result<String, AppError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(AppError::Validation(format!("Missing {name}")));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{name} must be at most {max_chars} characters"
        )));
    }
    Ok(value.to_string())
}

/// Entity ids are interpolated into SPARQL, so only `Q<digits>` is accepted.
fn validate_entity_id(id: Option<&str>) -> Result<String, AppError> {
    let id = id.map(str::trim).unwrap_or_default();
    let valid = id.len() >= 2
        && id.len() <= 20
        && id.starts_with('Q')
        && id[1..].chars().all(|c| c.is_ascii_digit());
    if !valid {
        return Err(AppError::Validation(format!("Invalid entity id '{id}'")));
    }
    Ok(id.to_string())
}

/// Label, description, instance-of, country, location, coordinates, image.
fn attribute_query(id: &str) -> String {
    format!(
        r#"SELECT ?item ?itemLabel ?itemDescription ?instanceOfLabel ?countryLabel ?locationLabel ?coord ?image WHERE {{
  BIND(wd:{id} AS ?item)
  OPTIONAL {{ ?item wdt:P31 ?instanceOf. }}
  OPTIONAL {{ ?item wdt:P17 ?country. }}
  OPTIONAL {{ ?item wdt:P276 ?location. }}
  OPTIONAL {{ ?item wdt:P625 ?coord. }}
  OPTIONAL {{ ?item wdt:P18 ?image. }}
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en". }}
}}
LIMIT 25"#
    )
}

/// Appends one percent-encoded path segment to `base`.
fn url_with_segment(base: &str, segment: &str) -> Result<String, AppError> {
    let mut url = Url::parse(base).map_err(|e| AppError::Internal(e.into()))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal(anyhow!("{base} cannot take path segments")))?
        .push(segment);
    Ok(url.into())
}

fn not_found_on_404(err: UpstreamError, what: &str) -> AppError {
    match err.status() {
        Some(404) => AppError::NotFound(format!("No entry for '{what}'")),
        _ => AppError::Upstream(err),
    }
}
