//! Vocabulary discovery: fan out one cached lookup per flavor, then merge.
//!
//! Merge pipeline: flatten in flavor order → case-insensitive dedupe (first
//! wins) → `raw_score - penalty` → stable descending sort → truncate.

use std::collections::HashSet;

use chrono::Duration;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::lookup::fetch::CachedFetcher;
use crate::lookup::upstream::{UpstreamError, UpstreamRequest};

pub const DATAMUSE_WORDS_URL: &str = "https://api.datamuse.com/words";
pub const MAX_TERM_CHARS: usize = 80;

const DISCOVER_TTL_HOURS: i64 = 24;
const MULTI_WORD_PENALTY: f64 = 60.0;
const LONG_WORD_PENALTY: f64 = 30.0;
const LONG_WORD_CHARS: usize = 18;

/// Query variant against the word-finding upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    /// Means like.
    Ml,
    Syn,
    /// Trigger words (statistically associated).
    Trg,
    /// Adjectives often used to modify the term.
    Adj,
    /// Nouns often modified by the term.
    Noun,
}

impl Flavor {
    pub const ALL: [Flavor; 5] = [
        Flavor::Ml,
        Flavor::Syn,
        Flavor::Trg,
        Flavor::Adj,
        Flavor::Noun,
    ];

    pub const DEFAULT: [Flavor; 3] = [Flavor::Ml, Flavor::Syn, Flavor::Trg];

    pub fn code(self) -> &'static str {
        match self {
            Flavor::Ml => "ml",
            Flavor::Syn => "syn",
            Flavor::Trg => "trg",
            Flavor::Adj => "adj",
            Flavor::Noun => "noun",
        }
    }

    /// Upstream query parameter carrying the term for this flavor.
    fn query_param(self) -> &'static str {
        match self {
            Flavor::Ml => "ml",
            Flavor::Syn => "rel_syn",
            Flavor::Trg => "rel_trg",
            Flavor::Adj => "rel_jjb",
            Flavor::Noun => "rel_jja",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    /// Parses a comma-separated list. Unknown codes are skipped and repeats
    /// collapse onto their first position.
    pub fn parse_list(raw: &str) -> Vec<Flavor> {
        let mut flavors = Vec::new();
        for flavor in raw.split(',').filter_map(|code| Self::parse(code.trim())) {
            if !flavors.contains(&flavor) {
                flavors.push(flavor);
            }
        }
        flavors
    }
}

/// What to do when one flavor's upstream call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// The failed flavor contributes nothing; the rest still merge.
    #[default]
    Isolate,
    /// Wait for every flavor, then report the first failure in flavor order.
    FailFast,
}

impl FailurePolicy {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "isolate" => Some(FailurePolicy::Isolate),
            "fail_fast" => Some(FailurePolicy::FailFast),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoverRequest {
    pub term: String,
    pub topics: Option<String>,
    pub max_results: usize,
    pub flavors: Vec<Flavor>,
    pub policy: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordCandidate {
    pub text: String,
    pub raw_score: f64,
    pub source_flavor: Flavor,
}

/// A merged candidate with its ranking penalty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub word: String,
    pub score: f64,
    pub penalty: f64,
    pub flavor: Flavor,
}

impl RankedCandidate {
    pub fn adjusted_score(&self) -> f64 {
        self.score - self.penalty
    }
}

impl From<WordCandidate> for RankedCandidate {
    fn from(candidate: WordCandidate) -> Self {
        let penalty = penalty_for(&candidate.text);
        Self {
            word: candidate.text,
            score: candidate.raw_score,
            penalty,
            flavor: candidate.source_flavor,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamWord {
    word: String,
    #[serde(default)]
    score: Option<f64>,
}

/// Multi-word results cost 60, results longer than 18 chars cost 30.
pub fn penalty_for(text: &str) -> f64 {
    let mut penalty = 0.0;
    if text.chars().any(char::is_whitespace) {
        penalty += MULTI_WORD_PENALTY;
    }
    if text.chars().count() > LONG_WORD_CHARS {
        penalty += LONG_WORD_PENALTY;
    }
    penalty
}

/// Trims and bounds a search term. Runs before any I/O.
pub fn validate_term(term: &str) -> Result<&str, AppError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(AppError::Validation("term cannot be empty".to_string()));
    }
    if term.chars().count() > MAX_TERM_CHARS {
        return Err(AppError::Validation(format!(
            "term must be at most {MAX_TERM_CHARS} characters"
        )));
    }
    Ok(term)
}

/// Trimmed topics, with blank treated as absent.
pub fn normalize_topics(topics: Option<&str>) -> Option<&str> {
    topics.map(str::trim).filter(|t| !t.is_empty())
}

fn flavor_cache_key(flavor: Flavor, topics: Option<&str>, term: &str, max: usize) -> String {
    format!("dm:{}:{}:{}:{}", flavor.code(), topics.unwrap_or(""), term, max)
}

fn flavor_request(flavor: Flavor, topics: Option<&str>, term: &str, max: usize) -> UpstreamRequest {
    let mut request = UpstreamRequest::get(DATAMUSE_WORDS_URL).param("max", max.to_string());
    if let Some(topics) = topics {
        request = request.param("topics", topics);
    }
    request.param(flavor.query_param(), term)
}

async fn fetch_flavor(
    fetcher: &CachedFetcher,
    flavor: Flavor,
    topics: Option<&str>,
    term: &str,
    max: usize,
) -> Result<Vec<WordCandidate>, UpstreamError> {
    let request = flavor_request(flavor, topics, term, max);
    let key = flavor_cache_key(flavor, topics, term, max);
    let body = fetcher
        .fetch_cached(&request, &key, Duration::hours(DISCOVER_TTL_HOURS))
        .await?;
    let words: Vec<UpstreamWord> = serde_json::from_value(body)?;

    Ok(words
        .into_iter()
        .map(|w| WordCandidate {
            text: w.word,
            raw_score: w.score.unwrap_or(0.0),
            source_flavor: flavor,
        })
        .collect())
}

/// Issues one lookup per flavor concurrently and merges the results.
///
/// All flavor lookups run to completion; none is cancelled because a sibling
/// failed. See `FailurePolicy` for how failures are folded in.
pub async fn discover(
    fetcher: &CachedFetcher,
    request: &DiscoverRequest,
) -> Result<Vec<RankedCandidate>, AppError> {
    let term = validate_term(&request.term)?;
    let topics = normalize_topics(request.topics.as_deref());
    let max = request.max_results;

    let lookups = request.flavors.iter().map(|&flavor| async move {
        let outcome = fetch_flavor(fetcher, flavor, topics, term, max).await;
        (flavor, outcome)
    });
    let outcomes = join_all(lookups).await;

    let mut batches = Vec::with_capacity(outcomes.len());
    for (flavor, outcome) in outcomes {
        match outcome {
            Ok(candidates) => {
                debug!("Flavor {} returned {} candidates", flavor.code(), candidates.len());
                batches.push(candidates);
            }
            Err(e) => match request.policy {
                FailurePolicy::Isolate => {
                    warn!("Flavor {} failed for '{term}', skipping: {e}", flavor.code());
                }
                FailurePolicy::FailFast => return Err(AppError::Upstream(e)),
            },
        }
    }

    Ok(merge_candidates(batches, max))
}

/// Pure merge step. Batches are in flavor order; earlier batches win
/// case-insensitive duplicates. `sort_by` is stable, so equal adjusted
/// scores keep their merged order.
pub fn merge_candidates(batches: Vec<Vec<WordCandidate>>, max_results: usize) -> Vec<RankedCandidate> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<RankedCandidate> = batches
        .into_iter()
        .flatten()
        .filter(|c| seen.insert(c.text.to_lowercase()))
        .map(RankedCandidate::from)
        .collect();

    ranked.sort_by(|a, b| b.adjusted_score().total_cmp(&a.adjusted_score()));
    ranked.truncate(max_results);
    ranked
}
