use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::value_objects::{ExtractionResult, ReportVocabulary};
use crate::inference::{CommentContext, InferenceClient};

/// `=75` style explicit total, e.g. `25+25+25=75`
static EXPLICIT_TOTAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=([0-9]+)").expect("Invalid explicit total pattern"));

static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("Invalid digit run pattern"));

/// Turns free-form chat text into a pushup count.
///
/// Strategies, in precedence order:
/// 1. an explicit `=N` total
/// 2. the inference collaborator, when configured
/// 3. a keyword heuristic
///
/// The `is_total` flag is decided separately from the count, by marker words.
/// Results are memoized per exact input text.
pub struct CountExtractor {
    inference: Option<Arc<dyn InferenceClient>>,
    vocabulary: ReportVocabulary,
    inference_timeout: Duration,
    cache: LruCache<String, ExtractionResult>,
}

impl CountExtractor {
    pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
        Some(n) => n,
        None => unreachable!(),
    };

    pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(8);

    pub fn new(inference: Option<Arc<dyn InferenceClient>>) -> Self {
        Self {
            inference,
            vocabulary: ReportVocabulary::default(),
            inference_timeout: Self::DEFAULT_INFERENCE_TIMEOUT,
            cache: LruCache::new(Self::DEFAULT_CACHE_CAPACITY),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: ReportVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.cache = LruCache::new(capacity);
        self
    }

    pub fn has_inference(&self) -> bool {
        self.inference.is_some()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Extract `(count, is_total)` from `text`. A zero count means "not a report".
    pub async fn extract(&mut self, text: &str) -> ExtractionResult {
        if let Some(cached) = self.cache.get(text) {
            return *cached;
        }

        let lower = text.to_lowercase();
        let is_total = self.vocabulary.has_total_marker(&lower);

        if let Some(run) = overflowing_run(text) {
            warn!(run, "Number too large for a pushup count, message ignored");
            let result = ExtractionResult { count: 0, is_total };
            self.cache.put(text.to_string(), result);
            return result;
        }

        let count = match explicit_total(text) {
            Some(count) => count,
            None => match self.infer_count(text).await {
                Some(count) => count,
                None => self.heuristic_count(&lower),
            },
        };

        let result = ExtractionResult { count, is_total };
        debug!(count, is_total, "Extracted pushup count");

        self.cache.put(text.to_string(), result);
        result
    }

    /// Ask the inference collaborator for a literal count.
    ///
    /// Every failure, including a timeout or an answer without digits, yields `None`.
    async fn infer_count(&self, text: &str) -> Option<u32> {
        let client = self.inference.as_ref()?;

        let prompt = format!(
            "Извлеки количество отжиманий из текста: '{text}'. Отвечай только числом. Если не уверен — 0."
        );

        let answer = match tokio::time::timeout(
            self.inference_timeout,
            client.complete(&prompt, CommentContext::Report),
        )
        .await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(error = %e, "Inference extraction failed, using heuristic");
                return None;
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.inference_timeout.as_millis() as u64,
                    "Inference extraction timed out, using heuristic"
                );
                return None;
            }
        };

        let count = DIGIT_RUN
            .find(&answer)
            .and_then(|m| m.as_str().parse::<u32>().ok());

        if count.is_none() {
            warn!(answer = %answer, "Inference answer has no usable number");
        }
        count
    }

    /// Keyword fallback. Expects lowercased text.
    ///
    /// Any digit run that does not fit a `u32` makes the whole text a non-report.
    pub fn heuristic_count(&self, lower: &str) -> u32 {
        let has_plus = lower.contains('+');
        if !has_plus && !self.vocabulary.has_keyword(lower) {
            return 0;
        }

        let Some(numbers) = digit_runs(lower) else {
            return 0;
        };
        if numbers.is_empty() {
            return 0;
        }

        if has_plus || lower.contains(',') {
            numbers.iter().fold(0u32, |acc, n| acc.saturating_add(*n))
        } else {
            numbers[0]
        }
    }
}

fn explicit_total(text: &str) -> Option<u32> {
    EXPLICIT_TOTAL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// `None` when some run overflows `u32`
fn digit_runs(text: &str) -> Option<Vec<u32>> {
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str().parse::<u32>().ok())
        .collect()
}

fn overflowing_run(text: &str) -> Option<&str> {
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|run| run.parse::<u32>().is_err())
}
