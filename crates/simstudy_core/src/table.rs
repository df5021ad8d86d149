//! The study results table: one flat row per (scenario, analyzer).
//!
//! Columns are the design's varying parameters followed by a fixed set of
//! metric columns. Missing metrics are empty cells in CSV and `null` in JSON.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::model::{MetricEstimate, PerformanceSummary};
use crate::params::ParamValue;

/// Value type of a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

impl ColumnType {
    /// Column type a single design level maps to; lists render as text
    #[must_use]
    pub fn of_level(value: &ParamValue) -> Self {
        match value {
            ParamValue::Int(_) => ColumnType::Int,
            ParamValue::Float(_) => ColumnType::Float,
            ParamValue::List(_) | ParamValue::Text(_) => ColumnType::Text,
        }
    }

    /// Common type of two columns. Int widens to Float; text never mixes
    /// with numbers.
    #[must_use]
    pub fn merge(self, other: Self) -> Option<Self> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                Some(ColumnType::Float)
            }
            _ => None,
        }
    }

    /// Type shared by a sequence of levels, `None` when they don't agree
    pub fn of_levels<'a>(levels: impl IntoIterator<Item = &'a ParamValue>) -> Option<Self> {
        let mut levels = levels.into_iter().map(Self::of_level);
        let first = levels.next()?;
        levels.try_fold(first, Self::merge)
    }
}

/// One cell of a row, in column order
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(Option<f64>),
    Text(String),
}

impl Cell {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => *v,
            Cell::Text(_) => None,
        }
    }

    fn from_level(value: &ParamValue, ty: ColumnType) -> Self {
        match (value, ty) {
            (ParamValue::Int(v), ColumnType::Int) => Cell::Int(*v),
            (ParamValue::Int(v), ColumnType::Float) => Cell::Float(Some(*v as f64)),
            (ParamValue::Float(v), ColumnType::Float) => Cell::Float(Some(*v)),
            (other, _) => Cell::Text(other.to_string()),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(Some(v)) => write!(f, "{v}"),
            Cell::Float(None) => Ok(()),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Metric columns shared by every table, in order
pub const METRIC_COLUMNS: &[(&str, ColumnType)] = &[
    ("scenario", ColumnType::Int),
    ("analyzer", ColumnType::Text),
    ("attempted", ColumnType::Int),
    ("successful", ColumnType::Int),
    ("failure_rate", ColumnType::Float),
    ("failure_rate_mcse", ColumnType::Float),
    ("warning_rate", ColumnType::Float),
    ("coverage", ColumnType::Float),
    ("coverage_mcse", ColumnType::Float),
    ("coverage_lower", ColumnType::Float),
    ("coverage_upper", ColumnType::Float),
    ("rejection_rate", ColumnType::Float),
    ("rejection_rate_mcse", ColumnType::Float),
    ("rejection_rate_lower", ColumnType::Float),
    ("rejection_rate_upper", ColumnType::Float),
    ("bias", ColumnType::Float),
    ("bias_mcse", ColumnType::Float),
    ("rmse", ColumnType::Float),
    ("rmse_mcse", ColumnType::Float),
    ("mean_estimate", ColumnType::Float),
    ("empirical_se", ColumnType::Float),
    ("mean_std_error", ColumnType::Float),
    ("mean_interval_width", ColumnType::Float),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRow {
    pub scenario: usize,
    /// Values of the design's varying parameters
    pub levels: Vec<ParamValue>,
    pub analyzer: String,
    pub attempted: usize,
    pub successful: usize,

    pub failure_rate: f64,
    pub failure_rate_mcse: f64,
    pub warning_rate: Option<f64>,

    pub coverage: Option<f64>,
    pub coverage_mcse: Option<f64>,
    pub coverage_lower: Option<f64>,
    pub coverage_upper: Option<f64>,

    pub rejection_rate: Option<f64>,
    pub rejection_rate_mcse: Option<f64>,
    pub rejection_rate_lower: Option<f64>,
    pub rejection_rate_upper: Option<f64>,

    pub bias: Option<f64>,
    pub bias_mcse: Option<f64>,
    pub rmse: Option<f64>,
    pub rmse_mcse: Option<f64>,

    pub mean_estimate: Option<f64>,
    pub empirical_se: Option<f64>,
    pub mean_std_error: Option<f64>,
    pub mean_interval_width: Option<f64>,
}

impl StudyRow {
    #[must_use]
    pub fn from_summary(levels: Vec<ParamValue>, summary: &PerformanceSummary) -> Self {
        let value = |m: &Option<MetricEstimate>| m.map(|m| m.value);
        let mcse = |m: &Option<MetricEstimate>| m.map(|m| m.mcse);
        let lower = |m: &Option<MetricEstimate>| m.map(|m| m.lower);
        let upper = |m: &Option<MetricEstimate>| m.map(|m| m.upper);

        Self {
            scenario: summary.scenario,
            levels,
            analyzer: summary.analyzer.clone(),
            attempted: summary.attempted,
            successful: summary.successful,
            failure_rate: summary.failure_rate.value,
            failure_rate_mcse: summary.failure_rate.mcse,
            warning_rate: value(&summary.warning_rate),
            coverage: value(&summary.coverage),
            coverage_mcse: mcse(&summary.coverage),
            coverage_lower: lower(&summary.coverage),
            coverage_upper: upper(&summary.coverage),
            rejection_rate: value(&summary.rejection_rate),
            rejection_rate_mcse: mcse(&summary.rejection_rate),
            rejection_rate_lower: lower(&summary.rejection_rate),
            rejection_rate_upper: upper(&summary.rejection_rate),
            bias: value(&summary.bias),
            bias_mcse: mcse(&summary.bias),
            rmse: value(&summary.rmse),
            rmse_mcse: mcse(&summary.rmse),
            mean_estimate: summary.mean_estimate,
            empirical_se: summary.empirical_se,
            mean_std_error: summary.mean_std_error,
            mean_interval_width: summary.mean_interval_width,
        }
    }

    /// Metric cells in `METRIC_COLUMNS` order
    #[must_use]
    pub fn metric_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.scenario as i64),
            Cell::Text(self.analyzer.clone()),
            Cell::Int(self.attempted as i64),
            Cell::Int(self.successful as i64),
            Cell::Float(Some(self.failure_rate)),
            Cell::Float(Some(self.failure_rate_mcse)),
            Cell::Float(self.warning_rate),
            Cell::Float(self.coverage),
            Cell::Float(self.coverage_mcse),
            Cell::Float(self.coverage_lower),
            Cell::Float(self.coverage_upper),
            Cell::Float(self.rejection_rate),
            Cell::Float(self.rejection_rate_mcse),
            Cell::Float(self.rejection_rate_lower),
            Cell::Float(self.rejection_rate_upper),
            Cell::Float(self.bias),
            Cell::Float(self.bias_mcse),
            Cell::Float(self.rmse),
            Cell::Float(self.rmse_mcse),
            Cell::Float(self.mean_estimate),
            Cell::Float(self.empirical_se),
            Cell::Float(self.mean_std_error),
            Cell::Float(self.mean_interval_width),
        ]
    }

    /// All cells: factor levels first, then metrics. Levels are converted
    /// to `factor_types`, as returned by `StudyTable::factor_types`.
    #[must_use]
    pub fn cells(&self, factor_types: &[ColumnType]) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .levels
            .iter()
            .zip(factor_types)
            .map(|(level, ty)| Cell::from_level(level, *ty))
            .collect();
        cells.extend(self.metric_cells());
        cells
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyTable {
    pub factor_names: Vec<String>,
    pub rows: Vec<StudyRow>,
}

impl StudyTable {
    #[must_use]
    pub fn new(factor_names: Vec<String>) -> Self {
        Self {
            factor_names,
            rows: Vec::new(),
        }
    }

    /// Append the rows of one scenario
    pub fn push_scenario(&mut self, levels: &[ParamValue], summaries: &[PerformanceSummary]) {
        self.rows.extend(
            summaries
                .iter()
                .map(|s| StudyRow::from_summary(levels.to_vec(), s)),
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Type of each factor column, merged over every row. Integer and
    /// float levels make a float column; any other mix falls back to text.
    #[must_use]
    pub fn factor_types(&self) -> Vec<ColumnType> {
        (0..self.factor_names.len())
            .map(|idx| {
                ColumnType::of_levels(self.rows.iter().filter_map(|r| r.levels.get(idx)))
                    .unwrap_or(ColumnType::Text)
            })
            .collect()
    }

    /// Column schema: factor columns, then `METRIC_COLUMNS`
    #[must_use]
    pub fn columns(&self) -> Vec<(String, ColumnType)> {
        let mut columns: Vec<(String, ColumnType)> = self
            .factor_names
            .iter()
            .cloned()
            .zip(self.factor_types())
            .collect();
        columns.extend(
            METRIC_COLUMNS
                .iter()
                .map(|(name, ty)| ((*name).to_string(), *ty)),
        );
        columns
    }

    pub fn rows_for_analyzer<'a>(
        &'a self,
        analyzer: &'a str,
    ) -> impl Iterator<Item = &'a StudyRow> + 'a {
        self.rows.iter().filter(move |r| r.analyzer == analyzer)
    }

    /// Numeric values of one column (factor or metric), row by row.
    /// `None` when no column has that name.
    #[must_use]
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.columns().iter().position(|(n, _)| n == name)?;
        let types = self.factor_types();
        Some(
            self.rows
                .iter()
                .map(|row| row.cells(&types).get(idx).and_then(Cell::as_f64))
                .collect(),
        )
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let header: Vec<String> = self
            .columns()
            .into_iter()
            .map(|(name, _)| csv_field(&name))
            .collect();
        writeln!(writer, "{}", header.join(","))?;

        let types = self.factor_types();
        for row in &self.rows {
            let fields: Vec<String> = row
                .cells(&types)
                .iter()
                .map(|cell| csv_field(&cell.to_string()))
                .collect();
            writeln!(writer, "{}", fields.join(","))?;
        }
        writer.flush()
    }

    pub fn to_csv_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_csv(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Quote a CSV field when it contains a separator, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
