//! Analysis export documents

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{Analysis, PointFilter, SqliteStorage};

/// Exported meta-analysis of one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisExport {
    /// The four category lists
    pub analysis: Analysis,
    /// Messages the analysis was last computed from
    pub message_count: usize,
    /// When the export was produced
    pub exported_at: DateTime<Utc>,
}

impl AnalysisExport {
    /// Create an export stamped with the current time
    pub fn new(analysis: Analysis, message_count: usize) -> Self {
        Self {
            analysis,
            message_count,
            exported_at: Utc::now(),
        }
    }

    /// Pretty-printed JSON document
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a previously exported document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Build the export for one conversation from the store
///
/// Lists come from the active points, so hidden and deleted points are
/// excluded. The count is the one stored with the last refresh.
pub fn export_analysis(storage: &SqliteStorage, conversation_id: &str) -> Result<AnalysisExport> {
    storage.require_conversation(conversation_id)?;
    let points = storage.list_points(conversation_id, PointFilter::Active)?;
    let message_count = storage
        .load_analysis(conversation_id)?
        .map(|(_, count)| count)
        .unwrap_or(0);
    Ok(AnalysisExport::new(Analysis::from_points(&points), message_count))
}

/// Default file name for an export taken on `date`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("copilot-board-analysis-{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Category;

    #[test]
    fn test_export_round_trip_preserves_lists_and_count() {
        let mut analysis = Analysis::default();
        analysis.set(Category::CoreIdea, vec!["Idee".to_string()]);
        analysis.set(Category::Todo, vec!["A".to_string(), "B".to_string()]);

        let export = AnalysisExport::new(analysis.clone(), 7);
        let parsed = AnalysisExport::from_json(&export.to_json_pretty().unwrap()).unwrap();

        assert_eq!(parsed.analysis, analysis);
        assert_eq!(parsed.message_count, 7);
        assert_eq!(parsed.exported_at, export.exported_at);
    }

    #[test]
    fn test_export_uses_camel_case_keys() {
        let json = AnalysisExport::new(Analysis::default(), 0)
            .to_json_pretty()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("messageCount").is_some());
        assert!(value.get("exportedAt").is_some());
        assert!(value["analysis"]["offene_fragen"].is_array());
    }

    #[test]
    fn test_export_of_unanalyzed_conversation_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(dir.path().join("board.db")).unwrap();
        let conv = storage.create_conversation("Leer").unwrap();

        let export = export_analysis(&storage, &conv.id).unwrap();
        assert!(export.analysis.is_empty());
        assert_eq!(export.message_count, 0);
        assert!(export_analysis(&storage, "missing").is_err());
    }

    #[test]
    fn test_default_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            default_file_name(date),
            "copilot-board-analysis-2024-03-09.json"
        );
    }
}
