//! Meta-analysis: extraction and merge of the four point categories
//!
//! Each refresh asks the model for a subset of categories only. Requested
//! categories that come back in the reply replace their previous points;
//! everything else is left exactly as it was. A reply that is not valid
//! JSON never fails the request: the requested categories are answered with
//! placeholders and nothing is persisted.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::BoardConfig;
use crate::error::{CoboardError, Result};
use crate::providers::{CompletionOptions, Message, Provider};
use crate::storage::{Analysis, Category, PointFilter, SqliteStorage};

use super::summarizer::transcript;

/// Category lists extracted from one model reply
pub type ExtractedPoints = BTreeMap<Category, Vec<String>>;

/// Result of one meta-analysis refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    /// Merged analysis covering all four categories
    pub analysis: Analysis,
    /// Number of messages the analysis was computed from
    pub message_count: usize,
    /// Categories whose points were replaced by this refresh
    pub replaced: Vec<Category>,
    /// True when the model reply was unusable and placeholders were returned
    pub degraded: bool,
}

/// Resolve the requested category names
///
/// `None` or an empty list selects all four categories. The result is
/// deduplicated and in display order.
///
/// # Errors
///
/// Returns a validation error for unknown names
pub fn resolve_categories(requested: Option<&[String]>) -> Result<Vec<Category>> {
    let names = match requested {
        Some(names) if !names.is_empty() => names,
        _ => return Ok(Category::ALL.to_vec()),
    };

    let mut selected = BTreeSet::new();
    for name in names {
        selected.insert(name.parse::<Category>()?);
    }
    Ok(selected.into_iter().collect())
}

/// System prompt asking for the given categories as a strict JSON object
pub fn build_prompt(categories: &[Category], max_points: usize) -> String {
    let mut prompt = String::from(
        "Du bist ein Meta-Analyst für Gespräche. Analysiere den folgenden Chatverlauf und extrahiere:\n\n",
    );

    for (idx, category) in categories.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {}: {}\n",
            idx + 1,
            category.label(),
            category.instruction()
        ));
    }

    prompt.push_str("\nAntworte ausschließlich mit einem JSON-Objekt im folgenden Format:\n{\n");
    let keys: Vec<String> = categories
        .iter()
        .map(|c| format!("  \"{}\": [\"Punkt 1\", \"Punkt 2\", ...]", c.key()))
        .collect();
    prompt.push_str(&keys.join(",\n"));
    prompt.push_str(&format!(
        "\n}}\n\nSei präzise und fokussiere dich auf die wichtigsten Punkte. \
         Maximal {} kurze Punkte pro Kategorie.",
        max_points
    ));
    prompt
}

/// Remove a Markdown code fence wrapped around a reply, if present
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // the info string (e.g. "json") ends at a newline or the opening bracket
    let start = rest
        .find(|c: char| c == '\n' || c == '{' || c == '[')
        .unwrap_or(rest.len());
    let body = rest[start..].trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model reply into per-category lists
///
/// Only requested categories are read. A category whose value is not an
/// array is treated as absent. Items are trimmed, blank or non-string items
/// are dropped and each list is truncated to `max_points`. Returns `None`
/// when the reply is not a JSON object.
pub fn parse_response(
    text: &str,
    categories: &[Category],
    max_points: usize,
) -> Option<ExtractedPoints> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(text)).ok()?;
    let object = value.as_object()?;

    let mut extracted = ExtractedPoints::new();
    for category in categories {
        let Some(items) = object.get(category.key()).and_then(|v| v.as_array()) else {
            continue;
        };
        let points: Vec<String> = items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .take(max_points)
            .map(str::to_string)
            .collect();
        extracted.insert(*category, points);
    }
    Some(extracted)
}

/// Apply extracted lists over the existing analysis
pub fn merge(existing: &Analysis, extracted: &ExtractedPoints) -> Analysis {
    let mut merged = existing.clone();
    for (category, points) in extracted {
        merged.set(*category, points.clone());
    }
    merged
}

/// Existing analysis with each requested category set to its placeholder
pub fn with_placeholders(existing: &Analysis, categories: &[Category]) -> Analysis {
    let mut analysis = existing.clone();
    for category in categories {
        analysis.set(*category, vec![category.placeholder().to_string()]);
    }
    analysis
}

/// Runs meta-analysis refreshes against the store and provider
pub struct MetaAnalyzer<'a> {
    storage: &'a SqliteStorage,
    provider: &'a dyn Provider,
    config: &'a BoardConfig,
}

impl<'a> MetaAnalyzer<'a> {
    /// Create an analyzer
    pub fn new(
        storage: &'a SqliteStorage,
        provider: &'a dyn Provider,
        config: &'a BoardConfig,
    ) -> Self {
        Self {
            storage,
            provider,
            config,
        }
    }

    /// Analysis made of the conversation's active points
    pub fn current(&self, conversation_id: &str) -> Result<Analysis> {
        let points = self
            .storage
            .list_points(conversation_id, PointFilter::Active)?;
        Ok(Analysis::from_points(&points))
    }

    /// Refresh the given categories of a conversation's analysis
    ///
    /// # Errors
    ///
    /// Returns store errors and completion failures; an unparseable reply
    /// is not an error
    pub async fn analyze(
        &self,
        conversation_id: &str,
        categories: &[Category],
    ) -> Result<AnalysisOutcome> {
        if categories.is_empty() {
            return Err(CoboardError::Validation("No categories requested".to_string()).into());
        }

        let existing = self.current(conversation_id)?;

        let mut messages = self
            .storage
            .recent_messages(conversation_id, self.config.analysis_window)?;
        messages.reverse();

        if messages.is_empty() {
            tracing::debug!("No messages to analyze for {}", conversation_id);
            return Ok(AnalysisOutcome {
                analysis: existing,
                message_count: 0,
                replaced: Vec::new(),
                degraded: false,
            });
        }

        tracing::info!(
            "Analyzing {} messages of {} for {:?}",
            messages.len(),
            conversation_id,
            categories
        );

        let prompt = [
            Message::system(build_prompt(
                categories,
                self.config.max_points_per_category,
            )),
            Message::user(transcript(&messages)),
        ];
        let options = CompletionOptions::new(
            self.config.analysis_temperature,
            self.config.analysis_max_tokens,
        );
        let response = self.provider.complete(&prompt, &options).await?;

        let Some(extracted) = parse_response(
            response.content(),
            categories,
            self.config.max_points_per_category,
        ) else {
            tracing::debug!("Unparseable meta-analysis reply: {}", response.content());
            return Ok(AnalysisOutcome {
                analysis: with_placeholders(&existing, categories),
                message_count: messages.len(),
                replaced: Vec::new(),
                degraded: true,
            });
        };

        let merged = merge(&existing, &extracted);
        for (category, points) in &extracted {
            self.storage
                .replace_active_points(conversation_id, *category, points)?;
        }
        self.storage
            .save_analysis(conversation_id, &merged, messages.len())?;

        Ok(AnalysisOutcome {
            analysis: merged,
            message_count: messages.len(),
            replaced: extracted.keys().copied().collect(),
            degraded: false,
        })
    }
}
