//! Per-feature coverage records.
//!
//! A coverage record maps each Gherkin scenario of one feature file to the
//! test code (and, optionally, implementation code) that exercises it. Records
//! are produced outside the engine and are read-only here.
//!
//! ```json
//! {
//!   "scenarios": [
//!     {
//!       "name": "Login with valid credentials",
//!       "testMappings": [
//!         {
//!           "file": "src/__tests__/login.test.ts",
//!           "lines": "12-40",
//!           "implMappings": [{ "file": "src/login.ts", "lines": [3, 4, 9] }]
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Coverage data for a single feature file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRecord {
    #[serde(default)]
    pub scenarios: Vec<ScenarioCoverage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioCoverage {
    pub name: String,
    #[serde(default)]
    pub test_mappings: Vec<TestMapping>,
}

impl ScenarioCoverage {
    #[must_use]
    pub fn is_covered(&self) -> bool {
        !self.test_mappings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMapping {
    pub file: String,
    pub lines: LineRange,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impl_mappings: Vec<ImplMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplMapping {
    pub file: String,
    #[serde(default)]
    pub lines: Vec<u32>,
}

impl CoverageRecord {
    /// Parse a record from JSON text, rejecting structurally invalid input.
    ///
    /// # Errors
    ///
    /// Returns the parser message when the text is not a valid record.
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Number of scenarios with at least one test mapping.
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.is_covered()).count()
    }

    /// Uncovered scenario names in record order.
    pub fn uncovered(&self) -> impl Iterator<Item = &str> {
        self.scenarios
            .iter()
            .filter(|s| !s.is_covered())
            .map(|s| s.name.as_str())
    }

    /// Distinct test files referenced by any scenario, in first-seen order.
    #[must_use]
    pub fn distinct_test_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for mapping in self.scenarios.iter().flat_map(|s| &s.test_mappings) {
            if !files.iter().any(|f| f == &mapping.file) {
                files.push(mapping.file.clone());
            }
        }
        files
    }
}

/// Inclusive 1-based line range, written as `"start-end"` or `"n"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    /// Build a range, validating `1 <= start <= end`.
    ///
    /// # Errors
    ///
    /// Returns a description of the violated bound.
    pub fn new(start: u32, end: u32) -> Result<Self, String> {
        if start == 0 {
            return Err("line numbers are 1-based".to_string());
        }
        if end < start {
            return Err(format!("line range end {end} precedes start {start}"));
        }
        Ok(Self { start, end })
    }
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid line range '{s}'"))
        };
        match s.split_once('-') {
            Some((start, end)) => Self::new(parse(start)?, parse(end)?),
            None => {
                let line = parse(s)?;
                Self::new(line, line)
            }
        }
    }
}

impl TryFrom<String> for LineRange {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LineRange> for String {
    fn from(range: LineRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
