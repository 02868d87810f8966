use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: Value,

    /// Optional annotations attached by downstream tooling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Cell {
    pub fn new(value: Value) -> Self {
        Cell {
            value,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Tuning for record element detection
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Repeated child tags are only trusted when there are fewer than this many
    /// distinct ones under a single parent
    pub max_distinct_tags: usize,

    /// A candidate wins when `count / competitors` (integer division) exceeds this
    pub dominance_ratio: usize,
}

impl Default for DetectConfig {
    fn default() -> Self {
        DetectConfig {
            max_distinct_tags: 5,
            dominance_ratio: 5,
        }
    }
}

/// Column naming rules
#[derive(Debug, Clone)]
pub struct SchemaConfig {
    /// Label for bare text directly under the record root
    pub text_column_name: String,

    /// Joins a parent group's label with a child's local name
    pub name_separator: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        SchemaConfig {
            text_column_name: String::from("Text"),
            name_separator: String::from(" - "),
        }
    }
}

/// Configuration for a whole import
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Explicit path from the document root to the record element
    pub record_path: Option<Vec<String>>,

    /// Record element name to locate when no path is given
    pub record_tag: Option<String>,

    pub detect: DetectConfig,

    pub schema: SchemaConfig,

    /// Infer numbers and booleans from text; otherwise every value stays a string
    pub guess_cell_types: bool,

    /// Strip surrounding whitespace from element text before storing it
    pub trim_text: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            record_path: None,
            record_tag: None,
            detect: DetectConfig::default(),
            schema: SchemaConfig::default(),
            guess_cell_types: true,
            trim_text: true,
        }
    }
}
