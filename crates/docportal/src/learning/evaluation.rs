//! Offline quality metrics over the query log and feedback

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

use super::feedback::{FeedbackRecord, FeedbackType, QueryLogEntry};

/// Words too common to count as keywords
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "with", "that", "this", "from", "what", "which",
    "who", "whom", "when", "where", "why", "how", "does", "did", "has", "have", "had", "not",
    "but", "you", "your", "its", "their", "there", "they", "them", "can", "will", "would",
    "should", "could", "about", "into", "than", "then", "also", "any", "all", "our", "his",
    "her", "she", "him", "been", "being", "these", "those", "such",
];

/// Lower-cased content words of at least three characters
pub fn keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3)
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Share of `wanted` keywords present in `available`. `None` if nothing is wanted.
fn coverage(wanted: &HashSet<String>, available: &HashSet<String>) -> Option<f64> {
    if wanted.is_empty() {
        return None;
    }
    let hits = wanted.iter().filter(|k| available.contains(*k)).count();
    Some(hits as f64 / wanted.len() as f64)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Nearest-rank percentile of an ascending slice
fn percentile(sorted: &[u64], p: f64) -> u64 {
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// LLM latency distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub mean_ms: f64,
    pub p50_ms: u64,
    pub p95_ms: u64,
}

impl LatencyStats {
    fn from_samples(samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        Some(Self {
            mean_ms: sorted.iter().sum::<u64>() as f64 / sorted.len() as f64,
            p50_ms: percentile(&sorted, 50.0),
            p95_ms: percentile(&sorted, 95.0),
        })
    }
}

/// Metrics for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetrics {
    pub document_id: String,
    pub queries: usize,
    pub rated: usize,
    pub satisfaction_rate: Option<f64>,
    pub mean_feedback_score: Option<f64>,
    pub retrieval_precision: Option<f64>,
}

/// Aggregate evaluation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub total_queries: usize,
    pub rated_queries: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    /// Positive share of rated queries
    pub satisfaction_rate: Option<f64>,
    /// Mean of +1 / 0 / -1 over rated queries
    pub mean_feedback_score: Option<f64>,
    /// Threshold used for retrieval precision
    pub relevance_threshold: f32,
    /// Share of context chunks scoring at or above the threshold, averaged per query
    pub retrieval_precision: Option<f64>,
    /// Mean best similarity per query
    pub mean_top_score: Option<f64>,
    /// Share of question keywords found in the answer
    pub answer_relevance: Option<f64>,
    /// Share of answer keywords found in the context
    pub groundedness: Option<f64>,
    pub latency: Option<LatencyStats>,
    pub by_document: Vec<DocumentMetrics>,
}

/// Per-query values shared by the overall and per-document aggregates
struct QueryScores<'a> {
    document_id: &'a str,
    rating: Option<FeedbackType>,
    precision: Option<f64>,
    top_score: Option<f64>,
    relevance: Option<f64>,
    groundedness: Option<f64>,
    latency_ms: u64,
}

/// Computes [`EvaluationReport`]s
#[derive(Debug, Clone)]
pub struct Evaluator {
    relevance_threshold: f32,
}

impl Evaluator {
    pub fn new(relevance_threshold: f32) -> Self {
        Self {
            relevance_threshold,
        }
    }

    /// Latest rating per query. Feedback for unknown queries is ignored.
    fn latest_ratings(
        queries: &[QueryLogEntry],
        feedback: &[FeedbackRecord],
    ) -> HashMap<Uuid, FeedbackType> {
        let known: HashSet<Uuid> = queries.iter().map(|q| q.query_id).collect();

        let mut ordered: Vec<&FeedbackRecord> = feedback
            .iter()
            .filter(|f| known.contains(&f.query_id))
            .collect();
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        ordered
            .into_iter()
            .map(|f| (f.query_id, f.rating))
            .collect()
    }

    fn score_query<'a>(&self, entry: &'a QueryLogEntry, rating: Option<FeedbackType>) -> QueryScores<'a> {
        let precision = if entry.context.is_empty() {
            None
        } else {
            let relevant = entry
                .context
                .iter()
                .filter(|c| c.score >= self.relevance_threshold)
                .count();
            Some(relevant as f64 / entry.context.len() as f64)
        };

        let top_score = entry
            .context
            .iter()
            .map(|c| c.score)
            .max_by(|a, b| a.total_cmp(b))
            .map(f64::from);

        let answer_keywords = keywords(&entry.answer);
        let context_text = entry
            .context
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        QueryScores {
            document_id: entry.document_id.as_str(),
            rating,
            precision,
            top_score,
            relevance: coverage(&keywords(&entry.question), &answer_keywords),
            groundedness: coverage(&answer_keywords, &keywords(&context_text)),
            latency_ms: entry.latency_ms,
        }
    }

    /// Evaluate logged queries against their feedback
    pub fn evaluate(&self, queries: &[QueryLogEntry], feedback: &[FeedbackRecord]) -> EvaluationReport {
        let ratings = Self::latest_ratings(queries, feedback);
        let scores: Vec<QueryScores> = queries
            .iter()
            .map(|q| self.score_query(q, ratings.get(&q.query_id).copied()))
            .collect();

        let count = |rating: FeedbackType| scores.iter().filter(|s| s.rating == Some(rating)).count();
        let positive = count(FeedbackType::Positive);
        let neutral = count(FeedbackType::Neutral);
        let negative = count(FeedbackType::Negative);
        let rated = positive + neutral + negative;

        let values = |f: fn(&QueryScores) -> Option<f64>| scores.iter().filter_map(f).collect::<Vec<_>>();
        let latencies: Vec<u64> = scores.iter().map(|s| s.latency_ms).collect();

        let mut grouped: BTreeMap<&str, Vec<&QueryScores>> = BTreeMap::new();
        for score in &scores {
            grouped.entry(score.document_id).or_default().push(score);
        }

        let by_document = grouped
            .into_iter()
            .map(|(document_id, group)| {
                let ratings: Vec<FeedbackType> = group.iter().filter_map(|s| s.rating).collect();
                let precisions: Vec<f64> = group.iter().filter_map(|s| s.precision).collect();
                DocumentMetrics {
                    document_id: document_id.to_string(),
                    queries: group.len(),
                    rated: ratings.len(),
                    satisfaction_rate: satisfaction(&ratings),
                    mean_feedback_score: feedback_score(&ratings),
                    retrieval_precision: mean(&precisions),
                }
            })
            .collect();

        let all_ratings: Vec<FeedbackType> = scores.iter().filter_map(|s| s.rating).collect();

        EvaluationReport {
            total_queries: queries.len(),
            rated_queries: rated,
            positive,
            neutral,
            negative,
            satisfaction_rate: satisfaction(&all_ratings),
            mean_feedback_score: feedback_score(&all_ratings),
            relevance_threshold: self.relevance_threshold,
            retrieval_precision: mean(&values(|s| s.precision)),
            mean_top_score: mean(&values(|s| s.top_score)),
            answer_relevance: mean(&values(|s| s.relevance)),
            groundedness: mean(&values(|s| s.groundedness)),
            latency: LatencyStats::from_samples(&latencies),
            by_document,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(0.5)
    }
}

fn satisfaction(ratings: &[FeedbackType]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let positive = ratings.iter().filter(|r| **r == FeedbackType::Positive).count();
    Some(positive as f64 / ratings.len() as f64)
}

fn feedback_score(ratings: &[FeedbackType]) -> Option<f64> {
    let scores: Vec<f64> = ratings.iter().map(|r| r.to_score() as f64).collect();
    mean(&scores)
}

fn fmt_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0))
}

fn fmt_score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.3}", v))
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluation report")?;
        writeln!(f, "=================")?;
        writeln!(f, "Queries:              {}", self.total_queries)?;
        writeln!(
            f,
            "Rated:                {} (+{} / ={} / -{})",
            self.rated_queries, self.positive, self.neutral, self.negative
        )?;
        writeln!(f, "Satisfaction:         {}", fmt_ratio(self.satisfaction_rate))?;
        writeln!(f, "Mean feedback score:  {}", fmt_score(self.mean_feedback_score))?;
        writeln!(
            f,
            "Retrieval precision:  {} (threshold {:.2})",
            fmt_ratio(self.retrieval_precision),
            self.relevance_threshold
        )?;
        writeln!(f, "Mean top score:       {}", fmt_score(self.mean_top_score))?;
        writeln!(f, "Answer relevance:     {}", fmt_ratio(self.answer_relevance))?;
        writeln!(f, "Groundedness:         {}", fmt_ratio(self.groundedness))?;
        match &self.latency {
            Some(l) => writeln!(
                f,
                "LLM latency:          mean {:.0}ms, p50 {}ms, p95 {}ms",
                l.mean_ms, l.p50_ms, l.p95_ms
            )?,
            None => writeln!(f, "LLM latency:          n/a")?,
        }

        if !self.by_document.is_empty() {
            writeln!(f)?;
            writeln!(f, "By document:")?;
            for doc in &self.by_document {
                writeln!(
                    f,
                    "  {}  queries {}  rated {}  satisfaction {}  precision {}",
                    doc.document_id,
                    doc.queries,
                    doc.rated,
                    fmt_ratio(doc.satisfaction_rate),
                    fmt_ratio(doc.retrieval_precision)
                )?;
            }
        }

        Ok(())
    }
}
