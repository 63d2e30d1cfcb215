//! Input document schema and compilation.
//!
//! `ScanConfig` mirrors the JSON document field-for-field; `compile` turns it
//! into the validated `RunConfig` the engine runs with. All semantic checks
//! (operators, combine policy, date options, input presence) happen here,
//! before any input file is opened.

use crate::detection::{
    CombinePolicy, Cmp, Detection, RuleValue, StateChangeRule, ThresholdRule, WindowSpec,
};
use crate::selection::{DateFilter, Selection};
use crate::validate::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One entry of the `threshold` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdEntry {
    pub column_of_interest: String,

    #[serde(default = "default_operator")]
    pub operator: String,

    pub value: f64,
}

fn default_operator() -> String {
    "=".to_string()
}

/// One entry of the `state_change` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangeEntry {
    pub column_of_interest: String,
    pub value_1: RuleValue,
    pub value_2: RuleValue,
}

/// The raw scan configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub threshold: Vec<ThresholdEntry>,

    #[serde(default = "default_combine")]
    pub threshold_combine: String,

    #[serde(default)]
    pub state_change: Vec<StateChangeEntry>,

    #[serde(default)]
    pub extra_columns: Vec<String>,

    #[serde(default)]
    pub rows_before_abnormality: usize,

    #[serde(default)]
    pub rows_after_abnormality: usize,

    #[serde(default)]
    pub create_detailed_csv: bool,

    pub output_directory: String,

    #[serde(default)]
    pub input_csvs: Vec<String>,

    #[serde(default)]
    pub input_directories: Vec<String>,

    #[serde(default)]
    pub remove_duplicates: bool,

    #[serde(default)]
    pub number_of_days: Option<u32>,

    #[serde(default)]
    pub start_date: Option<String>,

    #[serde(default)]
    pub end_date: Option<String>,

    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub end_time: Option<String>,
}

fn default_combine() -> String {
    "any".to_string()
}

/// A compiled, validated run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub detection: Detection,
    pub selection: Selection,
    pub output_directory: String,
}

impl ScanConfig {
    /// Load a scan configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse a scan configuration from a JSON string.
    ///
    /// Lone backslashes (raw Windows paths pasted into the document) are
    /// escaped before parsing; valid JSON escapes pass through untouched.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        let escaped = escape_stray_backslashes(json);
        serde_json::from_str(&escaped)
            .map_err(|e| ValidationError::ParseError(format!("invalid JSON: {e}")))
    }

    /// Compile and validate into the immutable run configuration.
    pub fn compile(&self) -> Result<RunConfig, ValidationError> {
        let mut thresholds = Vec::with_capacity(self.threshold.len());
        for entry in &self.threshold {
            thresholds.push(ThresholdRule {
                column: entry.column_of_interest.clone(),
                op: Cmp::parse(&entry.operator)?,
                value: entry.value,
            });
        }

        let combine = CombinePolicy::parse(&self.threshold_combine)?;

        let state_changes = self
            .state_change
            .iter()
            .map(|entry| StateChangeRule {
                column: entry.column_of_interest.clone(),
                value_a: entry.value_1.clone(),
                value_b: entry.value_2.clone(),
            })
            .collect();

        if self.input_csvs.is_empty() && self.input_directories.is_empty() {
            return Err(ValidationError::NoInputs);
        }

        let detection = Detection {
            thresholds,
            combine,
            state_changes,
            extra_columns: self.extra_columns.clone(),
            window: WindowSpec::new(self.rows_before_abnormality, self.rows_after_abnormality),
            detailed: self.create_detailed_csv,
        };

        let selection = Selection {
            files: self.input_csvs.iter().map(PathBuf::from).collect(),
            directories: self.input_directories.iter().map(PathBuf::from).collect(),
            remove_duplicates: self.remove_duplicates,
            date_filter: self.compile_date_filter()?,
        };

        Ok(RunConfig {
            detection,
            selection,
            output_directory: self.output_directory.clone(),
        })
    }

    fn compile_date_filter(&self) -> Result<Option<DateFilter>, ValidationError> {
        if let Some(days) = self.number_of_days {
            if self.end_date.is_some() {
                return Err(ValidationError::ConflictingDateOptions);
            }
            if days == 0 {
                return Err(ValidationError::InvalidDayCount);
            }
            return Ok(Some(DateFilter::WithinDays(days)));
        }

        let Some(start_date) = self.start_date.as_deref() else {
            return Ok(None);
        };

        let start_time = self.start_time.as_deref().unwrap_or("00:00");
        let start = parse_datetime(start_date, start_time)?;

        let end = match self.end_date.as_deref() {
            Some(end_date) => {
                let end_time = self.end_time.as_deref().unwrap_or("23:59");
                Some(parse_datetime(end_date, end_time)?)
            }
            None => None,
        };

        Ok(Some(DateFilter::Range { start, end }))
    }
}

fn parse_datetime(date: &str, time: &str) -> Result<NaiveDateTime, ValidationError> {
    let value = format!("{date} {time}");
    NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M").map_err(|e| {
        ValidationError::InvalidDate {
            value,
            message: e.to_string(),
        }
    })
}

/// Double every backslash that does not start a valid JSON escape.
fn escape_stray_backslashes(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => out.push('\\'),
            _ => out.push_str("\\\\"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Helper ===

    fn minimal_json() -> &'static str {
        r#"{
            "output_directory": "out/triage",
            "input_csvs": ["a.csv"],
            "threshold": [
                {"column_of_interest": "Pressure", "operator": ">=", "value": 5}
            ],
            "state_change": [
                {"column_of_interest": "ValveOpen", "value_1": 0, "value_2": 1}
            ]
        }"#
    }

    // === Parsing ===

    #[test]
    fn test_parse_minimal_config() {
        let cfg = ScanConfig::parse_json(minimal_json()).unwrap();
        assert_eq!(cfg.output_directory, "out/triage");
        assert_eq!(cfg.threshold.len(), 1);
        assert_eq!(cfg.state_change.len(), 1);
        assert_eq!(cfg.threshold[0].operator, ">=");
    }

    #[test]
    fn test_parse_defaults() {
        let cfg = ScanConfig::parse_json(
            r#"{"output_directory": "out", "input_csvs": ["a.csv"]}"#,
        )
        .unwrap();
        assert!(cfg.threshold.is_empty());
        assert!(cfg.state_change.is_empty());
        assert_eq!(cfg.threshold_combine, "any");
        assert_eq!(cfg.rows_before_abnormality, 0);
        assert_eq!(cfg.rows_after_abnormality, 0);
        assert!(!cfg.create_detailed_csv);
        assert!(!cfg.remove_duplicates);
        assert!(cfg.number_of_days.is_none());
    }

    #[test]
    fn test_parse_operator_defaults_to_eq() {
        let cfg = ScanConfig::parse_json(
            r#"{
                "output_directory": "out",
                "input_csvs": ["a.csv"],
                "threshold": [{"column_of_interest": "X", "value": 1}]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.threshold[0].operator, "=");
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(ScanConfig::parse_json("{not json}").is_err());
    }

    #[test]
    fn test_parse_tolerates_windows_paths() {
        let cfg = ScanConfig::parse_json(
            r#"{"output_directory": "C:\logs\out", "input_csvs": ["C:\data\a.csv"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.output_directory, r"C:\logs\out");
        assert_eq!(cfg.input_csvs[0], r"C:\data\a.csv");
    }

    #[test]
    fn test_parse_keeps_valid_escapes() {
        let cfg = ScanConfig::parse_json(
            r#"{"output_directory": "C:\\logs", "input_csvs": ["a.csv"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.output_directory, r"C:\logs");
    }

    #[test]
    fn test_from_file_nonexistent() {
        let result = ScanConfig::from_file(std::path::Path::new("/nonexistent/scan.json"));
        assert!(matches!(result, Err(ValidationError::IoError(_))));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, minimal_json()).unwrap();
        let cfg = ScanConfig::from_file(&path).unwrap();
        assert_eq!(cfg.input_csvs, vec!["a.csv"]);
    }

    // === Compilation ===

    #[test]
    fn test_compile_happy_path() {
        let run = ScanConfig::parse_json(minimal_json()).unwrap().compile().unwrap();
        assert_eq!(run.detection.thresholds.len(), 1);
        assert_eq!(run.detection.thresholds[0].op, Cmp::Ge);
        assert_eq!(run.detection.combine, CombinePolicy::Any);
        assert_eq!(run.detection.state_changes[0].value_a, RuleValue::Number(0.0));
        assert!(run.detection.window.is_pass_through());
        assert_eq!(run.selection.files.len(), 1);
        assert!(run.selection.date_filter.is_none());
    }

    #[test]
    fn test_compile_rejects_unknown_operator() {
        let cfg = ScanConfig::parse_json(
            r#"{
                "output_directory": "out",
                "input_csvs": ["a.csv"],
                "threshold": [{"column_of_interest": "X", "operator": "~", "value": 1}]
            }"#,
        )
        .unwrap();
        assert!(matches!(
            cfg.compile(),
            Err(ValidationError::InvalidOperator(op)) if op == "~"
        ));
    }

    #[test]
    fn test_compile_rejects_unknown_combine_policy() {
        let cfg = ScanConfig::parse_json(
            r#"{
                "output_directory": "out",
                "input_csvs": ["a.csv"],
                "threshold_combine": "sometimes"
            }"#,
        )
        .unwrap();
        assert!(matches!(
            cfg.compile(),
            Err(ValidationError::InvalidCombinePolicy(_))
        ));
    }

    #[test]
    fn test_compile_rejects_no_inputs() {
        let cfg = ScanConfig::parse_json(r#"{"output_directory": "out"}"#).unwrap();
        assert!(matches!(cfg.compile(), Err(ValidationError::NoInputs)));
    }

    #[test]
    fn test_compile_rejects_days_with_end_date() {
        let cfg = ScanConfig::parse_json(
            r#"{
                "output_directory": "out",
                "input_csvs": ["a.csv"],
                "number_of_days": 7,
                "end_date": "2026-01-31"
            }"#,
        )
        .unwrap();
        assert!(matches!(
            cfg.compile(),
            Err(ValidationError::ConflictingDateOptions)
        ));
    }

    #[test]
    fn test_compile_rejects_zero_days() {
        let cfg = ScanConfig::parse_json(
            r#"{"output_directory": "out", "input_csvs": ["a.csv"], "number_of_days": 0}"#,
        )
        .unwrap();
        assert!(matches!(cfg.compile(), Err(ValidationError::InvalidDayCount)));
    }

    #[test]
    fn test_compile_date_range_defaults() {
        let cfg = ScanConfig::parse_json(
            r#"{
                "output_directory": "out",
                "input_csvs": ["a.csv"],
                "start_date": "2026-01-01",
                "end_date": "2026-01-31"
            }"#,
        )
        .unwrap();
        let run = cfg.compile().unwrap();
        match run.selection.date_filter.unwrap() {
            DateFilter::Range { start, end } => {
                assert_eq!(start.format("%H:%M").to_string(), "00:00");
                assert_eq!(end.unwrap().format("%H:%M").to_string(), "23:59");
            }
            other => panic!("expected range filter, got {other:?}"),
        }
    }

    #[test]
    fn test_compile_open_ended_range() {
        let cfg = ScanConfig::parse_json(
            r#"{
                "output_directory": "out",
                "input_csvs": ["a.csv"],
                "start_date": "2026-01-01",
                "start_time": "08:30"
            }"#,
        )
        .unwrap();
        let run = cfg.compile().unwrap();
        match run.selection.date_filter.unwrap() {
            DateFilter::Range { start, end } => {
                assert_eq!(start.format("%Y-%m-%d %H:%M").to_string(), "2026-01-01 08:30");
                assert!(end.is_none());
            }
            other => panic!("expected range filter, got {other:?}"),
        }
    }

    #[test]
    fn test_compile_rejects_bad_date() {
        let cfg = ScanConfig::parse_json(
            r#"{
                "output_directory": "out",
                "input_csvs": ["a.csv"],
                "start_date": "01/02/2026"
            }"#,
        )
        .unwrap();
        assert!(matches!(
            cfg.compile(),
            Err(ValidationError::InvalidDate { .. })
        ));
    }
}
