//! Plain-text rendering of study results

use std::fmt::Write;

use simstudy_core::{StudyResults, StudyRow, StudyTable};

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

pub fn render(results: &StudyResults, format: OutputFormat) -> color_eyre::Result<String> {
    Ok(match format {
        OutputFormat::Table => render_text(results),
        OutputFormat::Csv => results.table.to_csv_string(),
        OutputFormat::Json => results.table.to_json()? + "\n",
    })
}

fn fmt_opt(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.digits$}"),
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

/// Value with its Monte Carlo standard error, e.g. `0.9412 (0.0024)`
fn fmt_with_mcse(value: Option<f64>, mcse: Option<f64>) -> String {
    match (value, mcse) {
        (Some(v), Some(se)) => format!("{v:.4} ({se:.4})"),
        (Some(v), None) => format!("{v:.4}"),
        _ => "-".to_string(),
    }
}

fn header(table: &StudyTable) -> Vec<String> {
    let mut header = table.factor_names.clone();
    header.extend(
        [
            "analyzer",
            "ok/trials",
            "failure",
            "coverage (mcse)",
            "rejection (mcse)",
            "bias (mcse)",
            "rmse",
            "emp_se",
            "mean_se",
        ]
        .map(String::from),
    );
    header
}

fn row_fields(row: &StudyRow) -> Vec<String> {
    let mut fields: Vec<String> = row.levels.iter().map(ToString::to_string).collect();
    fields.push(row.analyzer.clone());
    fields.push(format!("{}/{}", row.successful, row.attempted));
    fields.push(format!("{:.4}", row.failure_rate));
    fields.push(fmt_with_mcse(row.coverage, row.coverage_mcse));
    fields.push(fmt_with_mcse(row.rejection_rate, row.rejection_rate_mcse));
    fields.push(fmt_with_mcse(row.bias, row.bias_mcse));
    fields.push(fmt_opt(row.rmse, 4));
    fields.push(fmt_opt(row.empirical_se, 4));
    fields.push(fmt_opt(row.mean_std_error, 4));
    fields
}

/// Render the table with aligned columns and a one-line footer
pub fn render_text(results: &StudyResults) -> String {
    let header = header(&results.table);
    let rows: Vec<Vec<String>> = results.table.rows.iter().map(row_fields).collect();

    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in &rows {
        for (width, field) in widths.iter_mut().zip(row) {
            *width = (*width).max(field.len());
        }
    }

    let mut out = String::new();
    let line = |fields: &[String]| -> String {
        fields
            .iter()
            .zip(&widths)
            .map(|(field, width)| format!("{field:>width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let _ = writeln!(out, "{}", line(&header));
    let rule: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let _ = writeln!(out, "{}", "-".repeat(rule));
    for row in &rows {
        let _ = writeln!(out, "{}", line(row));
    }

    let _ = write!(
        out,
        "{} of {} scenarios",
        results.scenarios_completed, results.scenarios_total
    );
    if results.cancelled {
        out.push_str(" (cancelled)");
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use simstudy_core::sweep::run_sweep;
    use simstudy_core::{
        Design, Factor, OneSampleGenerator, OneSampleT, RepeatConfig, Study, SweepConfig,
    };

    fn results() -> StudyResults {
        let study = Study::builder()
            .generator(OneSampleGenerator::new())
            .analyzer(OneSampleT::new(0.95))
            .build()
            .unwrap();
        let design = Design::full_factorial(vec![Factor::new("n", [5_i64, 50])]);
        let config = SweepConfig {
            repeat: RepeatConfig {
                trials: 100,
                ..Default::default()
            },
            ..Default::default()
        };
        run_sweep(&study, &design, &config, None).unwrap()
    }

    #[test]
    fn test_text_report_has_row_per_scenario() {
        let text = render_text(&results());
        let lines: Vec<&str> = text.lines().collect();

        // header, rule, two rows, footer
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("coverage (mcse)"));
        assert!(lines[0].trim_start().starts_with('n'));
        assert!(lines[2].contains("one_sample_t"));
        assert!(lines[3].contains("100/100"));
        assert_eq!(lines[4], "2 of 2 scenarios");
    }

    #[test]
    fn test_csv_and_json_formats() {
        let results = results();
        let csv = render(&results, OutputFormat::Csv).unwrap();
        assert!(csv.starts_with("n,scenario,analyzer"));
        assert_eq!(csv.lines().count(), 3);

        let json = render(&results, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rows"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_metrics_render_as_dash() {
        assert_eq!(fmt_opt(None, 4), "-");
        assert_eq!(fmt_with_mcse(Some(0.5), Some(0.01)), "0.5000 (0.0100)");
        assert_eq!(fmt_with_mcse(None, None), "-");
    }
}
