//! Export command handler

use std::path::{Path, PathBuf};

use chrono::Local;
use colored::Colorize;

use crate::board::{default_file_name, export_analysis};
use crate::config::Config;
use crate::error::Result;
use crate::storage::SqliteStorage;

/// Write a conversation's analysis to `output`, or to the default file name
///
/// Returns the path that was written.
pub fn run_export(
    config: &Config,
    conversation_id: &str,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let storage = SqliteStorage::from_config(&config.storage)?;
    let export = export_analysis(&storage, conversation_id)?;

    let path = output.unwrap_or_else(|| PathBuf::from(default_file_name(Local::now().date_naive())));
    write_export(&path, &export.to_json_pretty()?)?;

    println!(
        "{} {} ({} messages analyzed)",
        "Exported analysis to".green(),
        path.display().to_string().cyan(),
        export.message_count
    );
    Ok(path)
}

fn write_export(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    tracing::debug!("Wrote {} bytes to {}", json.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::AnalysisExport;
    use crate::storage::{Analysis, Category};
    use tempfile::tempdir;

    #[test]
    fn test_export_writes_round_trippable_file() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.db_path = Some(dir.path().join("board.db").to_string_lossy().to_string());

        let storage = SqliteStorage::from_config(&config.storage).unwrap();
        let conv = storage.create_conversation("Export").unwrap();
        let todos = vec!["Release planen".to_string()];
        storage
            .replace_active_points(&conv.id, Category::Todo, &todos)
            .unwrap();
        let mut analysis = Analysis::default();
        analysis.set(Category::Todo, todos.clone());
        storage.save_analysis(&conv.id, &analysis, 3).unwrap();

        let target = dir.path().join("out").join("analysis.json");
        let written = run_export(&config, &conv.id, Some(target.clone())).unwrap();
        assert_eq!(written, target);

        let parsed = AnalysisExport::from_json(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(parsed.analysis, analysis);
        assert_eq!(parsed.message_count, 3);
    }

    #[test]
    fn test_export_unknown_conversation_fails() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.db_path = Some(dir.path().join("board.db").to_string_lossy().to_string());

        let target = dir.path().join("analysis.json");
        assert!(run_export(&config, "missing", Some(target.clone())).is_err());
        assert!(!target.exists());
    }
}
