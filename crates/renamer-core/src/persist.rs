//! Saved forms of rule chains and mapping lists.
//!
//! Rules and mappings are stored as JSON arrays whose order is significant. A rename plan can
//! also be written as CSV with an `old_path,new_path` header; plans carry no status and load as
//! pending entries.

use crate::mapping::Mapping;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid plan at line {line}: {message}")]
    Plan { line: u64, message: String },
}

pub type Result<T> = std::result::Result<T, PersistError>;

#[derive(Debug, Serialize, Deserialize)]
struct PlanRow {
    old_path: PathBuf,
    new_path: PathBuf,
}

pub fn rules_to_json(rules: &[Rule]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rules)?)
}

pub fn rules_from_json(data: &str) -> Result<Vec<Rule>> {
    let rules: Vec<Rule> = serde_json::from_str(data)?;
    debug!("Parsed {} rule(s)", rules.len());
    Ok(rules)
}

pub fn mappings_to_json(mappings: &[Mapping]) -> Result<String> {
    Ok(serde_json::to_string_pretty(mappings)?)
}

pub fn mappings_from_json(data: &str) -> Result<Vec<Mapping>> {
    let mappings: Vec<Mapping> = serde_json::from_str(data)?;
    debug!("Parsed {} mapping(s)", mappings.len());
    Ok(mappings)
}

/// Writes the `old_path,new_path` plan. Status and message are dropped.
pub fn plan_to_csv(mappings: &[Mapping]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(["old_path", "new_path"])?;
    for mapping in mappings {
        writer.serialize(PlanRow {
            old_path: mapping.old_path.clone(),
            new_path: mapping.new_path.clone(),
        })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PersistError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reads an `old_path,new_path` plan into pending mappings.
pub fn plan_from_csv(data: &str) -> Result<Vec<Mapping>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.get(0) != Some("old_path") || headers.get(1) != Some("new_path") {
        return Err(PersistError::Plan {
            line: 1,
            message: format!(
                "expected header 'old_path,new_path', found '{}'",
                headers.iter().collect::<Vec<_>>().join(",")
            ),
        });
    }

    let mut mappings = Vec::new();
    for row in reader.deserialize::<PlanRow>() {
        let row = row?;
        mappings.push(Mapping::pending(row.old_path, row.new_path));
    }
    debug!("Parsed {} plan row(s)", mappings.len());
    Ok(mappings)
}

/// Loads a mapping file, choosing the CSV plan reader for `.csv` files and JSON otherwise.
pub fn load_mappings(path: &Path) -> Result<Vec<Mapping>> {
    let data = fs::read_to_string(path)?;
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        plan_from_csv(&data)
    } else {
        mappings_from_json(&data)
    }
}

pub fn save_mappings(path: &Path, mappings: &[Mapping]) -> Result<()> {
    fs::write(path, mappings_to_json(mappings)?)?;
    Ok(())
}

pub fn save_plan(path: &Path, mappings: &[Mapping]) -> Result<()> {
    fs::write(path, plan_to_csv(mappings)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Status;
    use crate::rule::factory;
    use crate::RenameError;

    #[test]
    fn test_rules_round_trip_in_order() {
        let mut rules = vec![
            factory::add_prefix("{index:1:3}_"),
            factory::replace_between_delimiters("(", ")", "x"),
            factory::remove_numbers(),
        ];
        for (i, rule) in rules.iter_mut().enumerate() {
            rule.id = format!("rule-{i}");
        }

        let json = rules_to_json(&rules).unwrap();
        assert!(json.contains(r#""replace": "{index:1:3}_""#));
        assert_eq!(rules_from_json(&json).unwrap(), rules);
    }

    #[test]
    fn test_mapping_json_shape() {
        let mut failed = Mapping::pending("dir/a.txt", "dir/b.txt");
        failed.mark_error(&RenameError::Filesystem("denied".to_string()));
        let mappings = vec![Mapping::pending("x", "y"), failed];

        let json = mappings_to_json(&mappings).unwrap();
        assert!(json.contains(r#""oldPath": "dir/a.txt""#));
        assert!(json.contains(r#""status": "error""#));
        assert!(json.contains(r#""message": "rename failed: denied""#));
        assert_eq!(mappings_from_json(&json).unwrap(), mappings);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let data = r#"[{"oldPath":"a","newPath":"b","status":"done"}]"#;
        assert!(matches!(mappings_from_json(data), Err(PersistError::Json(_))));
    }

    #[test]
    fn test_mapping_without_status_defaults_to_pending() {
        let data = r#"[{"oldPath":"a","newPath":"b"}]"#;
        assert_eq!(mappings_from_json(data).unwrap()[0].status, Status::Pending);
    }

    #[test]
    fn test_plan_csv() {
        let mut done = Mapping::pending("a,1.txt", "b.txt");
        done.mark_success(None);

        let csv = plan_to_csv(&[done, Mapping::pending("c.txt", "d.txt")]).unwrap();
        assert_eq!(csv.lines().next(), Some("old_path,new_path"));

        let plan = plan_from_csv(&csv).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].old_path, PathBuf::from("a,1.txt"));
        assert!(plan.iter().all(|m| m.status == Status::Pending));
    }

    #[test]
    fn test_plan_keeps_edge_spaces_in_names() {
        let csv = plan_to_csv(&[Mapping::pending(" lead.txt", "trail.txt ")]).unwrap();
        let plan = plan_from_csv(&csv).unwrap();
        assert_eq!(plan[0].old_path, PathBuf::from(" lead.txt"));
        assert_eq!(plan[0].new_path, PathBuf::from("trail.txt "));
    }

    #[test]
    fn test_plan_header_tolerates_padding() {
        let plan = plan_from_csv("old_path , new_path\na,b\n").unwrap();
        assert_eq!(plan[0].new_path, PathBuf::from("b"));
    }

    #[test]
    fn test_empty_plan_keeps_header() {
        let csv = plan_to_csv(&[]).unwrap();
        assert!(plan_from_csv(&csv).unwrap().is_empty());
    }

    #[test]
    fn test_plan_requires_header() {
        let err = plan_from_csv("from,to\na,b\n").unwrap_err();
        assert!(matches!(err, PersistError::Plan { line: 1, .. }));
    }

    #[test]
    fn test_load_and_save_files() {
        let dir = tempfile::tempdir().unwrap();
        let mappings = vec![Mapping::pending("a.txt", "b.txt")];

        let json_path = dir.path().join("results.json");
        save_mappings(&json_path, &mappings).unwrap();
        assert_eq!(load_mappings(&json_path).unwrap(), mappings);

        let csv_path = dir.path().join("plan.CSV");
        save_plan(&csv_path, &mappings).unwrap();
        assert_eq!(load_mappings(&csv_path).unwrap(), mappings);
    }
}
