//! Formatted terminal output.
//!
//! Formatting lives here so the pipeline and query code stay free of
//! presentation details.

use crate::app::JobReport;
use crate::domain::{AnalysisResult, ItemParameter, StatusRecord};

/// Full summary of a completed analysis: data, model, fit, item table.
pub fn format_analysis_summary(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== irt - IRT Analysis {} ===\n", result.session_id));
    out.push_str(&format!(
        "Type: {} | Created: {}\n",
        result.analysis_type,
        result.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let data = &result.data_summary;
    out.push_str(&format!(
        "Data: {} students ({} uploaded) | {} items | response rate {:.3}\n",
        data.n_students, data.original_students, data.n_items, data.response_rate
    ));

    let info = &result.model_info;
    out.push_str(&format!(
        "Model: {} | converged={} | iterations={} | logLik={:.3}\n",
        info.model_type, info.converged, info.iterations, info.log_likelihood
    ));

    let fit = &result.model_fit;
    out.push_str(&format!(
        "Fit: M2={:.3} (df={}, p={:.4}) RMSEA={:.4} TLI={:.4} reliability={:.3}\n",
        fit.m2, fit.m2_df, fit.m2_p, fit.rmsea, fit.tli, fit.reliability
    ));
    out.push_str(&format!("     AIC={:.3} BIC={:.3}\n", fit.aic, fit.bic));

    if let Some((theta, peak)) = peak_information(result) {
        out.push_str(&format!("Peak test information: {peak:.3} at theta={theta:.2}\n"));
    }

    out.push_str("\nItem parameters:\n");
    out.push_str(&format_item_table(&result.item_parameters));
    out
}

/// Fixed-width item parameter table.
pub fn format_item_table(items: &[ItemParameter]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
        "item", "model", "a", "se(a)", "b", "se(b)", "c", "se(c)"
    ));
    for item in items {
        out.push_str(&format!(
            "{:<16} {:>6} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4}\n",
            truncate(&item.item_id, 16),
            item.model_type,
            item.discrimination,
            item.se_discrimination,
            item.difficulty,
            item.se_difficulty,
            item.guessing,
            item.se_guessing,
        ));
    }
    out
}

pub fn format_status(session_id: &str, status: &StatusRecord) -> String {
    if status.message.is_empty() {
        format!("{session_id}: {}", status.status)
    } else {
        format!("{session_id}: {} - {}", status.status, status.message)
    }
}

/// One line per finished job, as kept by the job runner.
pub fn format_job_report(report: &JobReport) -> String {
    match &report.error {
        None => format!("{} [ok] {}", report.session_id, report.file.display()),
        Some(error) => format!("{} [failed] {}: {error}", report.session_id, report.file.display()),
    }
}

fn peak_information(result: &AnalysisResult) -> Option<(f64, f64)> {
    let ti = &result.test_information;
    ti.theta
        .iter()
        .copied()
        .zip(ti.information.iter().copied())
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width - 1).collect();
        out.push('~');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobStatus, TestInformation};
    use std::path::PathBuf;

    #[test]
    fn summary_mentions_items_and_peak() {
        let result = AnalysisResult {
            session_id: "abc".into(),
            analysis_type: "3PL_IRT".into(),
            item_parameters: vec![ItemParameter {
                item_id: "Q1".into(),
                discrimination: 1.5,
                model_type: "3PL".into(),
                ..ItemParameter::default()
            }],
            test_information: TestInformation {
                theta: vec![-1.0, 0.0, 1.0],
                information: vec![0.5, 2.0, 0.7],
            },
            ..AnalysisResult::default()
        };
        let text = format_analysis_summary(&result);
        assert!(text.contains("IRT Analysis abc"));
        assert!(text.contains("Peak test information: 2.000 at theta=0.00"));
        assert!(text.lines().any(|l| l.starts_with("Q1") && l.contains("1.5000")));
    }

    #[test]
    fn status_and_report_lines() {
        let status = StatusRecord::new(JobStatus::Error, "Analysis failed: boom");
        assert_eq!(format_status("s1", &status), "s1: error - Analysis failed: boom");

        let ok = JobReport {
            session_id: "s2".into(),
            file: PathBuf::from("a.csv"),
            error: None,
        };
        assert_eq!(format_job_report(&ok), "s2 [ok] a.csv");
    }

    #[test]
    fn long_item_ids_are_truncated() {
        assert_eq!(truncate("abcdefghijklmnopqrst", 8), "abcdefg~");
        assert_eq!(truncate("short", 8), "short");
    }
}
