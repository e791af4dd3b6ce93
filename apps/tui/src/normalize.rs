//! Defensive extraction of chart-ready rows from loosely shaped payloads.
//!
//! The statistics service does not commit to one schema: some endpoints
//! return a bare array, others wrap it under a resource-specific key, and
//! column names alternate between the upstream uppercase Spanish headers
//! (`CATEGORIA`, `ANO`) and lowercase English aliases. Every alias lives in a
//! [`ShapeSchema`] so supporting a new one means adding a string, not a branch.

use serde::Serialize;
use serde_json::{Map, Value};

const CONTAINER_KEYS: &[&str] = &[
    "time_series",
    "stats",
    "data",
    "categories",
    "top_emitters",
    "category_summary",
];

const VALUE_KEYS: &[&str] = &["total", "mean", "value", "count"];

const NAME_KEYS: &[&str] = &[
    "CATEGORIA",
    "categoria",
    "CATEGORY",
    "REGION",
    "region",
    "DEPARTAMENTO",
    "name",
    "ANO",
    "year",
];

pub const DEFAULT_VALUE_KEY: &str = "value";

const SUMMARY_SECTIONS: &[&str] = &["co2_stats", "stats", "summary", "data", "date_range"];
const SUMMARY_TOTAL_KEYS: &[&str] = &["total", "total_emissions", "sum"];
const SUMMARY_AVERAGE_KEYS: &[&str] = &["avg", "average", "mean"];
const SUMMARY_COUNT_KEYS: &[&str] = &["count", "total_records", "records"];
const SUMMARY_MIN_YEAR_KEYS: &[&str] = &["min_year", "year_min", "from"];
const SUMMARY_MAX_YEAR_KEYS: &[&str] = &["max_year", "year_max", "to"];

/// Priority-ordered alias lists used while probing payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeSchema {
    containers: Vec<String>,
    value_keys: Vec<String>,
    name_keys: Vec<String>,
}

impl Default for ShapeSchema {
    fn default() -> Self {
        Self {
            containers: to_owned(CONTAINER_KEYS),
            value_keys: to_owned(VALUE_KEYS),
            name_keys: to_owned(NAME_KEYS),
        }
    }
}

fn to_owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| (*key).to_string()).collect()
}

fn push_unique(keys: &mut Vec<String>, alias: &str) {
    let alias = alias.trim();
    if !alias.is_empty() && !keys.iter().any(|key| key == alias) {
        keys.push(alias.to_string());
    }
}

impl ShapeSchema {
    /// Appends a container key after the built-in ones.
    #[must_use]
    pub fn with_container(mut self, key: &str) -> Self {
        push_unique(&mut self.containers, key);
        self
    }

    #[must_use]
    pub fn with_value_alias(mut self, key: &str) -> Self {
        push_unique(&mut self.value_keys, key);
        self
    }

    #[must_use]
    pub fn with_name_alias(mut self, key: &str) -> Self {
        push_unique(&mut self.name_keys, key);
        self
    }

    pub fn containers(&self) -> &[String] {
        &self.containers
    }

    pub fn value_keys(&self) -> &[String] {
        &self.value_keys
    }

    pub fn name_keys(&self) -> &[String] {
        &self.name_keys
    }

    /// Locates the rows to plot.
    ///
    /// A top-level array is used as is; otherwise the first container key
    /// holding an array wins. Anything else yields no rows.
    pub fn extract_rows<'a>(&self, payload: &'a Value) -> &'a [Value] {
        match payload {
            Value::Array(rows) => rows.as_slice(),
            Value::Object(map) => self
                .containers
                .iter()
                .find_map(|key| map.get(key).and_then(Value::as_array))
                .map(Vec::as_slice)
                .unwrap_or_default(),
            _ => &[],
        }
    }

    pub fn detect_value_key(&self, first_row: Option<&Value>) -> String {
        first_row
            .and_then(Value::as_object)
            .and_then(|row| first_present(row, &self.value_keys))
            .unwrap_or(DEFAULT_VALUE_KEY)
            .to_string()
    }

    pub fn detect_name_key(&self, first_row: Option<&Value>, default_key: &str) -> String {
        first_row
            .and_then(Value::as_object)
            .and_then(|row| first_present(row, &self.name_keys))
            .unwrap_or(default_key)
            .to_string()
    }

    pub fn normalize(&self, payload: &Value, default_name_key: &str) -> NormalizedSeries {
        let rows = self.extract_rows(payload);
        let first = rows.first();

        NormalizedSeries {
            name_key: self.detect_name_key(first, default_name_key),
            value_key: self.detect_value_key(first),
            rows: rows.to_vec(),
        }
    }
}

fn first_present<'a>(row: &Map<String, Value>, keys: &'a [String]) -> Option<&'a str> {
    keys.iter()
        .find(|key| row.contains_key(key.as_str()))
        .map(String::as_str)
}

/// Normalizes with the built-in aliases.
pub fn normalize(payload: &Value, default_name_key: &str) -> NormalizedSeries {
    ShapeSchema::default().normalize(payload, default_name_key)
}

/// Chart-ready rows plus the fields that hold their label and quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedSeries {
    pub name_key: String,
    pub value_key: String,
    pub rows: Vec<Value>,
}

impl NormalizedSeries {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Display label of a row, empty when the name field is absent.
    pub fn label(&self, row: &Value) -> String {
        match row.get(&self.name_key) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Number(number)) => number
                .as_f64()
                .filter(|value| value.fract() == 0.0)
                .map_or_else(|| number.to_string(), |value| format!("{value:.0}")),
            Some(Value::Bool(flag)) => flag.to_string(),
            _ => String::new(),
        }
    }

    /// Numeric value of a row; accepts numbers and numeric strings.
    pub fn value(&self, row: &Value) -> Option<f64> {
        row.get(&self.value_key).and_then(as_number)
    }

    /// `(label, value)` pairs in row order, skipping rows without a number.
    pub fn points(&self) -> Vec<(String, f64)> {
        self.rows
            .iter()
            .filter_map(|row| self.value(row).map(|value| (self.label(row), value)))
            .collect()
    }
}

/// Reads a JSON number or a numeric string such as `"1,234.5"`.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Headline figures of the general-stats resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GeneralSummary {
    pub total: Option<f64>,
    pub average: Option<f64>,
    pub count: Option<f64>,
    pub min_year: Option<f64>,
    pub max_year: Option<f64>,
}

impl GeneralSummary {
    pub fn is_empty(&self) -> bool {
        self.total.is_none()
            && self.average.is_none()
            && self.count.is_none()
            && self.min_year.is_none()
            && self.max_year.is_none()
    }
}

/// Probes the general-stats record, top level first, then known sub-objects.
pub fn summarize_general(payload: &Value) -> GeneralSummary {
    let Some(root) = payload.as_object() else {
        return GeneralSummary::default();
    };

    let mut scopes = vec![root];
    scopes.extend(
        SUMMARY_SECTIONS
            .iter()
            .filter_map(|section| root.get(*section).and_then(Value::as_object)),
    );

    let probe = |keys: &[&str]| {
        scopes.iter().find_map(|scope| {
            keys.iter()
                .find_map(|key| scope.get(*key).and_then(as_number))
        })
    };

    GeneralSummary {
        total: probe(SUMMARY_TOTAL_KEYS),
        average: probe(SUMMARY_AVERAGE_KEYS),
        count: probe(SUMMARY_COUNT_KEYS),
        min_year: probe(SUMMARY_MIN_YEAR_KEYS),
        max_year: probe(SUMMARY_MAX_YEAR_KEYS),
    }
}
