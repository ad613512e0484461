//! Debug record retrieval.
//!
//! Search runs in two phases so a query never scans every record file:
//!
//! 1. **Candidates**: query tokens are widened with synonyms and matched
//!    against keyword buckets (equal, containing, or contained), ranked by an
//!    IDF-like weight, then joined by filter buckets and, when too few,
//!    the most recent records.
//! 2. **Scoring**: each candidate record is loaded and scored by weighted
//!    term overlap across its fields, filter bonuses, and an exact-phrase
//!    bonus.
//!
//! Ties keep candidate order, so results are deterministic.

use crate::models::{DebugIndex, DebugRecord, RecordId, SearchHit, SearchQuery, SearchResult};
use crate::services::keywords::tokenize;
use crate::services::synonyms::SynonymExpander;
use crate::storage::RecordStore;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::instrument;

/// Weight of a term found in the error type, before IDF and boosts.
const ERROR_TYPE_WEIGHT: f64 = 0.25;
/// Weight of a term found in the error message.
const ERROR_MESSAGE_WEIGHT: f64 = 0.20;
/// Weight of a term found in the cause.
const CAUSE_WEIGHT: f64 = 0.15;
/// Weight of a term found in the solution.
const SOLUTION_WEIGHT: f64 = 0.15;
/// Weight of a term found in the joined tags.
const TAGS_WEIGHT: f64 = 0.10;
/// Bonus when the error type filter matches.
const ERROR_TYPE_FILTER_BONUS: f64 = 0.3;
/// Bonus per tag shared with the tag filter.
const TAG_FILTER_BONUS: f64 = 0.1;
/// Bonus when the whole query appears verbatim.
const PHRASE_BONUS: f64 = 0.3;
/// Boost for terms typed by the caller over synonyms.
const ORIGINAL_TERM_BOOST: f64 = 2.0;
/// Boost for exact matches over substring matches.
const EXACT_MATCH_BOOST: f64 = 1.5;
/// Keyword candidates kept per requested result.
const KEYWORD_CANDIDATE_FACTOR: usize = 3;
/// Recent records added per requested result when candidates run short.
const RECENCY_CANDIDATE_FACTOR: usize = 2;

/// IDF-like rarity weight: `ln(total / matches) + 1`, never below 1.
#[allow(clippy::cast_precision_loss)]
fn idf(total: usize, matches: usize) -> f64 {
    let ratio = total.max(1) as f64 / matches.max(1) as f64;
    ratio.ln().max(0.0) + 1.0
}

fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// An expanded query term with its precomputed weights.
#[derive(Debug, Clone)]
struct WeightedTerm {
    text: String,
    origin_boost: f64,
    error_type_idf: f64,
}

/// A query prepared against one index snapshot.
#[derive(Debug, Clone)]
struct QueryPlan {
    /// Trimmed, lowercased query text for the phrase bonus.
    phrase: String,
    /// Original tokens followed by their synonyms.
    terms: Vec<WeightedTerm>,
    /// Lowercased error type filter.
    error_type: Option<String>,
    /// Lowercased tag filters.
    tags: HashSet<String>,
}

impl QueryPlan {
    fn new(expander: &SynonymExpander, index: &DebugIndex, query: &SearchQuery) -> Self {
        let tokens = tokenize(&query.text);
        let originals: HashSet<String> = tokens.iter().cloned().collect();
        let total = index.records.len();

        let terms = expander
            .expand(&tokens)
            .into_iter()
            .map(|text| {
                let matches: HashSet<&RecordId> = index
                    .error_types
                    .iter()
                    .filter(|(key, _)| key.contains(text.as_str()))
                    .flat_map(|(_, ids)| ids)
                    .collect();
                WeightedTerm {
                    origin_boost: if originals.contains(&text) {
                        ORIGINAL_TERM_BOOST
                    } else {
                        1.0
                    },
                    error_type_idf: idf(total, matches.len()),
                    text,
                }
            })
            .collect();

        Self {
            phrase: query.text.trim().to_lowercase(),
            terms,
            error_type: query.error_type_filter().map(str::to_lowercase),
            tags: query
                .tags
                .iter()
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect(),
        }
    }
}

/// Ordered, de-duplicated candidate ids.
#[derive(Debug, Default)]
struct CandidateSet {
    ids: Vec<RecordId>,
    seen: HashSet<RecordId>,
}

impl CandidateSet {
    fn extend<'a>(&mut self, ids: impl IntoIterator<Item = &'a RecordId>) {
        for id in ids {
            if self.seen.insert(id.clone()) {
                self.ids.push(id.clone());
            }
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Two-phase search over a project's index and record store.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalEngine {
    expander: SynonymExpander,
}

impl RetrievalEngine {
    /// Creates an engine using the built-in synonym table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            expander: SynonymExpander::new(),
        }
    }

    /// Searches for records matching `query`, best first.
    ///
    /// Returns an empty result, not an error, when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `query.limit` is zero, or an error
    /// if the record store fails.
    #[instrument(
        skip(self, index, store, query),
        fields(query_len = query.text.len(), limit = query.limit, result_count = tracing::field::Empty)
    )]
    pub fn search(
        &self,
        index: &DebugIndex,
        store: &dyn RecordStore,
        query: &SearchQuery,
    ) -> Result<SearchResult> {
        if query.limit == 0 {
            return Err(Error::InvalidInput("search limit must be at least 1".to_string()));
        }

        let start = Instant::now();
        let plan = QueryPlan::new(&self.expander, index, query);
        let candidates = collect_candidates(index, &plan, query.limit);

        let mut hits = Vec::with_capacity(candidates.len());
        for id in &candidates {
            let Some(record) = store.get(id)? else {
                tracing::debug!(record_id = %id, "Candidate record missing, skipping");
                continue;
            };
            if let Some(score) = score_record(&record, &plan).filter(|score| *score > 0.0) {
                hits.push(SearchHit {
                    record,
                    relevance_score: score,
                });
            }
        }

        // Stable: equal scores keep candidate order.
        hits.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        hits.truncate(query.limit);
        for hit in &mut hits {
            hit.relevance_score = round_score(hit.relevance_score);
        }

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::Span::current().record("result_count", hits.len());
        tracing::debug!(
            candidates = candidates.len(),
            results = hits.len(),
            elapsed_ms,
            "Search completed"
        );

        Ok(SearchResult::new(hits, elapsed_ms))
    }

    /// Returns the candidate ids phase one would score for `query`.
    #[must_use]
    pub fn candidates(&self, index: &DebugIndex, query: &SearchQuery) -> Vec<RecordId> {
        let plan = QueryPlan::new(&self.expander, index, query);
        collect_candidates(index, &plan, query.limit.max(1))
    }
}

/// Collects keyword, filter, and recency candidates in that order.
fn collect_candidates(index: &DebugIndex, plan: &QueryPlan, limit: usize) -> Vec<RecordId> {
    let mut set = CandidateSet::default();

    set.extend(&keyword_candidates(index, plan, limit * KEYWORD_CANDIDATE_FACTOR));

    if let Some(error_type) = &plan.error_type {
        set.extend(
            index
                .error_types
                .iter()
                .filter(|(key, _)| key.contains(error_type.as_str()))
                .flat_map(|(_, ids)| ids),
        );
    }
    for tag in &plan.tags {
        if let Some(ids) = index.tags.get(tag) {
            set.extend(ids);
        }
    }

    if set.len() < limit {
        set.extend(
            index
                .recent_entries(limit * RECENCY_CANDIDATE_FACTOR)
                .iter()
                .rev()
                .map(|entry| &entry.id),
        );
    }

    set.ids
}

/// Ranks ids by the IDF-weighted keyword buckets matching the plan's terms.
fn keyword_candidates(index: &DebugIndex, plan: &QueryPlan, take: usize) -> Vec<RecordId> {
    let total = index.records.len();
    let mut order: Vec<&RecordId> = Vec::new();
    let mut scores: HashMap<&RecordId, f64> = HashMap::new();

    for term in &plan.terms {
        let term_text = term.text.as_str();
        for (keyword, ids) in &index.keywords {
            let exact = keyword == term_text;
            if !exact && !keyword.contains(term_text) && !term_text.contains(keyword.as_str()) {
                continue;
            }
            let exact_boost = if exact { EXACT_MATCH_BOOST } else { 1.0 };
            let weight = idf(total, ids.len()) * term.origin_boost * exact_boost;
            for id in ids {
                let score = scores.entry(id).or_insert_with(|| {
                    order.push(id);
                    0.0
                });
                *score += weight;
            }
        }
    }

    let mut ranked: Vec<(&RecordId, f64)> = order
        .into_iter()
        .map(|id| (id, scores.get(id).copied().unwrap_or_default()))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(take).map(|(id, _)| id.clone()).collect()
}

/// Number of terms appearing as substrings of `text`.
#[allow(clippy::cast_precision_loss)]
fn term_matches(terms: &[WeightedTerm], text: &str) -> f64 {
    terms.iter().filter(|term| text.contains(term.text.as_str())).count() as f64
}

/// Scores a record, or returns `None` if it fails a hard filter.
///
/// A score of zero means no overlap at all; callers drop such records.
#[allow(clippy::cast_precision_loss)]
fn score_record(record: &DebugRecord, plan: &QueryPlan) -> Option<f64> {
    let error_type = record.context.error_type.to_lowercase();
    let mut score = 0.0;

    if let Some(filter) = &plan.error_type {
        if !error_type.contains(filter.as_str()) {
            return None;
        }
        score += ERROR_TYPE_FILTER_BONUS;
    }

    if !plan.tags.is_empty() {
        let shared = plan.tags.iter().filter(|tag| record.has_tag(tag)).count();
        if shared == 0 {
            return None;
        }
        score += TAG_FILTER_BONUS * shared as f64;
    }

    for term in plan.terms.iter().filter(|t| error_type.contains(t.text.as_str())) {
        let exact = if error_type == term.text {
            EXACT_MATCH_BOOST
        } else {
            1.0
        };
        score += ERROR_TYPE_WEIGHT * term.error_type_idf * term.origin_boost * exact;
    }

    let message = record.context.error_message.to_lowercase();
    let cause = record.cause.to_lowercase();
    let solution = record.solution.to_lowercase();
    let tags = record.joined_tags().to_lowercase();

    score += ERROR_MESSAGE_WEIGHT * term_matches(&plan.terms, &message);
    score += CAUSE_WEIGHT * term_matches(&plan.terms, &cause);
    score += SOLUTION_WEIGHT * term_matches(&plan.terms, &solution);
    score += TAGS_WEIGHT * term_matches(&plan.terms, &tags);

    if !plan.phrase.is_empty()
        && (message.contains(&plan.phrase)
            || cause.contains(&plan.phrase)
            || solution.contains(&plan.phrase))
    {
        score += PHRASE_BONUS;
    }

    Some(score)
}
