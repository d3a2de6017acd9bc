//! JSONL dataset parser.
//!
//! Loads one dataset per task from `<task>.jsonl` files and validates them.
//! Each non-blank line is one example:
//!
//! ```text
//! {"id": 1, "context": "...", "question": "...", "expected": "...", "category": "..."}
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{json_to_string, Answer, Dataset, Example, TaskKind};
use crate::scorer::{ScoringConfig, TaskScorer};
use crate::synonyms::SynonymTable;

/// Keys used as the example's input text when `text` is absent, in order.
const TEXT_FALLBACKS: &[&str] = &["context", "description", "original", "hashtag", "question"];

/// Intermediate structure for one JSONL line.
#[derive(Debug, Deserialize)]
struct JsonlExample {
    id: u64,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    expected: Option<serde_json::Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

impl JsonlExample {
    fn into_example(self, task: TaskKind) -> Example {
        let attributes: BTreeMap<String, String> = self
            .rest
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key, json_to_string(&value)))
            .collect();

        let text = self.text.unwrap_or_else(|| {
            TEXT_FALLBACKS
                .iter()
                .find_map(|key| attributes.get(*key).cloned())
                .unwrap_or_default()
        });

        Example {
            id: self.id,
            text,
            expected: self.expected.and_then(Answer::from_json),
            category: self
                .category
                .unwrap_or_else(|| task.as_str().to_string()),
            attributes,
        }
    }
}

/// Parse a single JSONL file into a `Dataset`.
pub fn load_dataset(path: &Path, task: TaskKind) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset file: {}", path.display()))?;

    parse_dataset_str(&content, task)
        .with_context(|| format!("failed to parse dataset: {}", path.display()))
}

/// Parse JSONL content into a `Dataset` (useful for testing).
///
/// Blank lines and lines starting with `#` or `//` are skipped.
pub fn parse_dataset_str(content: &str, task: TaskKind) -> Result<Dataset> {
    let mut examples = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let parsed: JsonlExample = serde_json::from_str(line)
            .with_context(|| format!("invalid example on line {}", index + 1))?;
        examples.push(parsed.into_example(task));
    }

    Dataset::new(task, examples)
}

/// The task a dataset file belongs to, from its `<task>.jsonl` name.
pub fn task_for_path(path: &Path) -> Option<TaskKind> {
    if !path.extension().is_some_and(|ext| ext == "jsonl") {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

/// Load every `<task>.jsonl` file in a directory, in suite order.
///
/// Files whose name is not a known task are skipped with a warning.
pub fn load_dataset_directory(dir: &Path) -> Result<Vec<Dataset>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut datasets = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "jsonl") {
            continue;
        }
        match task_for_path(&path) {
            Some(task) => datasets.push(load_dataset(&path, task)?),
            None => tracing::warn!("skipping {}: not a known task dataset", path.display()),
        }
    }

    datasets.sort_by_key(|d| d.task);
    Ok(datasets)
}

/// A warning from dataset validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The example ID (if applicable).
    pub example_id: Option<u64>,
    /// Warning message.
    pub message: String,
}

/// Validate a dataset for examples that cannot be scored or look suspicious.
pub fn validate_dataset(dataset: &Dataset) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if dataset.is_empty() {
        warnings.push(ValidationWarning {
            example_id: None,
            message: "dataset has no examples".into(),
        });
    }

    // Default weights always validate.
    let scorer = TaskScorer::new(
        dataset.task,
        &ScoringConfig::default(),
        Arc::new(SynonymTable::fashion()),
    )
    .ok();

    for example in &dataset.examples {
        let malformed = match &scorer {
            Some(scorer) => scorer.check(example).err(),
            None => example.expected_for(dataset.task).err(),
        };
        if let Some(e) = malformed {
            warnings.push(ValidationWarning {
                example_id: Some(example.id),
                message: e.to_string(),
            });
        }

        if example.text.trim().is_empty() {
            warnings.push(ValidationWarning {
                example_id: Some(example.id),
                message: "input text is empty".into(),
            });
        }

        if example.category != dataset.task.as_str() {
            warnings.push(ValidationWarning {
                example_id: Some(example.id),
                message: format!(
                    "category `{}` does not match task `{}`",
                    example.category, dataset.task
                ),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldValue;

    const TRENDS: &str = r#"
{"id": 1, "context": "Pink everything on the runway", "question": "What trend?", "expected": "Barbiecore and Y2K pink aesthetic revival", "category": "trend_detection"}

# seasonal
{"id": 2, "context": "Chunky loafers everywhere", "question": "List the trends", "expected": ["chunky loafers", "mini bags"]}
"#;

    #[test]
    fn parse_valid_jsonl() {
        let dataset = parse_dataset_str(TRENDS, TaskKind::TrendDetection).unwrap();
        assert_eq!(dataset.len(), 2);

        let first = &dataset.examples[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.text, "Pink everything on the runway");
        assert_eq!(first.attributes["question"], "What trend?");
        assert_eq!(
            first.expected,
            Some(Answer::from("Barbiecore and Y2K pink aesthetic revival"))
        );

        let second = &dataset.examples[1];
        assert_eq!(second.category, "trend_detection");
        assert_eq!(
            second.expected,
            Some(Answer::List(vec!["chunky loafers".into(), "mini bags".into()]))
        );
    }

    #[test]
    fn text_falls_back_through_known_keys() {
        let line = r##"{"id": 4, "hashtag": "#ootd", "context": "Posted a mirror selfie", "expected": {"meaning": "Outfit Of The Day"}}"##;
        let dataset = parse_dataset_str(line, TaskKind::HashtagUnderstanding).unwrap();
        let example = &dataset.examples[0];
        assert_eq!(example.text, "Posted a mirror selfie");
        assert_eq!(example.attributes["hashtag"], "#ootd");

        let line = r##"{"id": 5, "text": "explicit", "description": "ignored", "expected": "Boho"}"##;
        let dataset = parse_dataset_str(line, TaskKind::StyleClassification).unwrap();
        assert_eq!(dataset.examples[0].text, "explicit");
    }

    #[test]
    fn mapping_expected_values() {
        let line = r#"{"id": 1, "text": "Zara blazer $89.99", "expected": {"brand": "Zara", "link_mentioned": true}}"#;
        let dataset = parse_dataset_str(line, TaskKind::ProductExtraction).unwrap();
        let Some(Answer::Fields(fields)) = &dataset.examples[0].expected else {
            panic!("expected mapping");
        };
        assert_eq!(fields["link_mentioned"], FieldValue::Bool(true));
    }

    #[test]
    fn duplicate_ids_are_an_error() {
        let content = "{\"id\": 1, \"text\": \"a\", \"expected\": \"x\"}\n{\"id\": 1, \"text\": \"b\", \"expected\": \"y\"}";
        let err = parse_dataset_str(content, TaskKind::TrendDetection).unwrap_err();
        assert!(err.to_string().contains("duplicate example id 1"));
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let content = "{\"id\": 1, \"text\": \"a\", \"expected\": \"x\"}\nnot json";
        let err = parse_dataset_str(content, TaskKind::TrendDetection).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn validate_flags_unscorable_examples() {
        let content = r#"
{"id": 1, "description": "Floral maxi dress", "expected": "Bohemian/Boho"}
{"id": 2, "description": "Cargo pants", "expected": {"label": "Hypebeast"}}
{"id": 3, "description": "", "expected": "Grunge", "category": "trend_detection"}
{"id": 4, "description": "Tweed jacket"}
"#;
        let dataset = parse_dataset_str(content, TaskKind::StyleClassification).unwrap();
        let warnings = validate_dataset(&dataset);

        let for_id = |id: u64| -> Vec<&str> {
            warnings
                .iter()
                .filter(|w| w.example_id == Some(id))
                .map(|w| w.message.as_str())
                .collect()
        };
        assert!(for_id(1).is_empty());
        assert!(for_id(2).iter().any(|m| m.contains("expects a string")));
        assert!(for_id(3).iter().any(|m| m.contains("input text is empty")));
        assert!(for_id(3).iter().any(|m| m.contains("does not match task")));
        assert!(for_id(4).iter().any(|m| m.contains("missing expected answer")));
    }

    #[test]
    fn task_for_path_uses_file_stem() {
        assert_eq!(
            task_for_path(Path::new("datasets/style_classification.jsonl")),
            Some(TaskKind::StyleClassification)
        );
        assert_eq!(task_for_path(Path::new("datasets/notes.jsonl")), None);
        assert_eq!(task_for_path(Path::new("trend_detection.json")), None);
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("trend_detection.jsonl"), TRENDS).unwrap();
        std::fs::write(
            dir.path().join("style_classification.jsonl"),
            r#"{"id": 1, "description": "Hoodie and joggers", "expected": "Athleisure/Sporty"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("scratch.jsonl"), "{}").unwrap();
        std::fs::write(dir.path().join("README.md"), "# datasets").unwrap();

        let datasets = load_dataset_directory(dir.path()).unwrap();
        let tasks: Vec<TaskKind> = datasets.iter().map(|d| d.task).collect();
        assert_eq!(
            tasks,
            vec![TaskKind::TrendDetection, TaskKind::StyleClassification]
        );
    }

    #[test]
    fn load_missing_directory_fails() {
        let err = load_dataset_directory(Path::new("/nonexistent/datasets")).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
