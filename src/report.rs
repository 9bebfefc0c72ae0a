//! Report generation for analysis, balance and verification runs.
//!
//! Every report renders as plain text, Markdown or JSON. Text and Markdown
//! lay distributions out as tables; JSON serializes the full run summary.

use crate::distribution::{AnswerDistribution, IDEAL_PERCENTAGE};
use crate::question::{index_to_letter, QuestionRecord, CHOICE_COUNT};
use crate::runner::{AnalysisSummary, BalanceSummary, QuestionComparison, RunMode, SkippedBank, VerificationSummary};
use crate::verify::BankVerification;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as FmtWrite;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const RULE_HEAVY: &str = "═══════════════════════════════════════════════════════════════";
const RULE_LIGHT: &str = "───────────────────────────────────────────────────────────────";

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Report title
    pub title: String,
    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Tool version
    pub tool_version: String,
}

impl ReportMetadata {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn letter(index: usize) -> String {
    index_to_letter(index).map_or_else(|| index.to_string(), String::from)
}

fn signed(value: f64) -> String {
    format!("{value:+.1}%")
}

/// Table row for a single distribution
#[derive(Tabled)]
struct DistributionRow {
    #[tabled(rename = "Answer")]
    answer: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Percentage")]
    percentage: String,
    #[tabled(rename = "Ideal")]
    ideal: String,
    #[tabled(rename = "Deviation")]
    deviation: String,
}

/// Table row comparing two distributions
#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "Answer")]
    answer: String,
    #[tabled(rename = "Before")]
    before: String,
    #[tabled(rename = "After")]
    after: String,
    #[tabled(rename = "Δ from Ideal")]
    delta: String,
}

/// Table row for one bank's spot check
#[derive(Tabled)]
struct VerificationRow {
    #[tabled(rename = "Bank")]
    bank: String,
    #[tabled(rename = "Sampled")]
    sampled: String,
    #[tabled(rename = "Passed")]
    passed: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
    #[tabled(rename = "Warnings")]
    warnings: usize,
    #[tabled(rename = "Pass Rate")]
    pass_rate: String,
}

impl VerificationRow {
    fn new(bank: &str, verification: &BankVerification) -> Self {
        Self {
            bank: bank.to_string(),
            sampled: format!("{}/{}", verification.sample_size, verification.total),
            passed: verification.passed,
            failed: verification.failed,
            warnings: verification.warnings,
            pass_rate: format!("{:.1}%", verification.pass_rate() * 100.0),
        }
    }
}

fn render_table<T: Tabled>(rows: Vec<T>, markdown: bool) -> String {
    let mut table = Table::new(rows);
    if markdown {
        table.with(Style::markdown());
    }
    table.to_string()
}

fn distribution_table(dist: &AnswerDistribution, markdown: bool) -> String {
    let ideal = dist.ideal_per_position();
    let rows: Vec<DistributionRow> = (0..CHOICE_COUNT)
        .map(|i| DistributionRow {
            answer: letter(i),
            count: dist.count(i),
            percentage: format!("{:.1}%", dist.percentage(i)),
            ideal: format!("{ideal:.1}"),
            deviation: format!("{:+.1}", dist.count_deviation(i)),
        })
        .collect();
    render_table(rows, markdown)
}

fn comparison_table(before: &AnswerDistribution, after: &AnswerDistribution, markdown: bool) -> String {
    let rows: Vec<ComparisonRow> = (0..CHOICE_COUNT)
        .map(|i| ComparisonRow {
            answer: letter(i),
            before: format!("{} ({:.1}%)", before.count(i), before.percentage(i)),
            after: format!("{} ({:.1}%)", after.count(i), after.percentage(i)),
            delta: signed(after.deviation_from_ideal(i)),
        })
        .collect();
    render_table(rows, markdown)
}

fn write_extremes(output: &mut String, dist: &AnswerDistribution, prefix: &str) {
    if let (Some((most, most_n)), Some((least, least_n))) = (dist.most_common(), dist.least_common()) {
        writeln!(
            output,
            "{prefix}Most common:  {} ({most_n}, {:.1}%)",
            letter(most),
            dist.percentage(most)
        )
        .ok();
        writeln!(
            output,
            "{prefix}Least common: {} ({least_n}, {:.1}%)",
            letter(least),
            dist.percentage(least)
        )
        .ok();
    }
    writeln!(
        output,
        "{prefix}Max deviation from {IDEAL_PERCENTAGE:.0}%: {:.1} points",
        dist.max_deviation()
    )
    .ok();
    if dist.skipped() > 0 {
        writeln!(output, "{prefix}Without a valid answer index: {}", dist.skipped()).ok();
    }
}

fn write_failures(output: &mut String, verification: &BankVerification, limit: usize, prefix: &str) {
    let failures: Vec<_> = verification.failures().collect();
    if failures.is_empty() {
        return;
    }
    for failure in failures.iter().take(limit) {
        writeln!(output, "{prefix}Position {} ({}):", failure.position, failure.question_id).ok();
        for error in &failure.errors {
            writeln!(output, "{prefix}  - {error}").ok();
        }
    }
    if failures.len() > limit {
        writeln!(output, "{prefix}... and {} more", failures.len() - limit).ok();
    }
}

fn write_skipped(output: &mut String, skipped: &[SkippedBank], prefix: &str) {
    for bank in skipped {
        writeln!(output, "{prefix}{} skipped: {}", bank.name, bank.reason).ok();
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Read-only distribution report
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub summary: AnalysisSummary,
    pub combined: AnswerDistribution,
}

impl AnalysisReport {
    /// Build a report for `summary`
    #[must_use]
    pub fn new(summary: AnalysisSummary) -> Self {
        Self {
            metadata: ReportMetadata::new("Answer Distribution Analysis"),
            combined: summary.combined(),
            summary,
        }
    }

    /// Render report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render report as markdown
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        writeln!(output, "# {}", self.metadata.title).ok();
        writeln!(output).ok();
        writeln!(output, "**Generated:** {}", self.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")).ok();
        writeln!(output).ok();

        for bank in &self.summary.banks {
            writeln!(output, "## {} ({} questions)", bank.name, bank.distribution.total()).ok();
            writeln!(output).ok();
            writeln!(output, "{}", distribution_table(&bank.distribution, true)).ok();
            writeln!(output).ok();
        }

        writeln!(output, "## Combined ({} questions)", self.combined.total()).ok();
        writeln!(output).ok();
        writeln!(output, "{}", distribution_table(&self.combined, true)).ok();
        writeln!(output).ok();
        write_extremes(&mut output, &self.combined, "- ");
        write_skipped(&mut output, &self.summary.skipped, "- ");
        output
    }

    /// Render report as plain text
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        writeln!(output, "{RULE_HEAVY}").ok();
        writeln!(output, "  {}", self.metadata.title).ok();
        writeln!(output, "{RULE_HEAVY}").ok();
        writeln!(output).ok();

        for bank in &self.summary.banks {
            writeln!(output, "{} ({} questions)", bank.name.to_uppercase(), bank.distribution.total()).ok();
            writeln!(output, "{RULE_LIGHT}").ok();
            writeln!(output, "{}", distribution_table(&bank.distribution, false)).ok();
            write_extremes(&mut output, &bank.distribution, "  ");
            writeln!(output).ok();
        }

        writeln!(output, "COMBINED ({} questions)", self.combined.total()).ok();
        writeln!(output, "{RULE_LIGHT}").ok();
        writeln!(output, "{}", distribution_table(&self.combined, false)).ok();
        write_extremes(&mut output, &self.combined, "  ");
        write_skipped(&mut output, &self.summary.skipped, "  ");
        output
    }
}

// ============================================================================
// Balance
// ============================================================================

/// Before/after report for a balance run
#[derive(Debug, Clone, Serialize)]
pub struct BalanceReport {
    pub metadata: ReportMetadata,
    pub summary: BalanceSummary,
    pub before: AnswerDistribution,
    pub after: AnswerDistribution,
    #[serde(skip)]
    max_reported_failures: usize,
}

impl BalanceReport {
    /// Build a report for `summary`, listing up to `max_reported_failures`
    /// failures per bank
    #[must_use]
    pub fn new(summary: BalanceSummary, max_reported_failures: usize) -> Self {
        let title = match summary.mode {
            RunMode::DryRun => "Answer Balance (dry run)",
            RunMode::Apply => "Answer Balance",
        };
        Self {
            metadata: ReportMetadata::new(title),
            before: summary.before(),
            after: summary.after(),
            summary,
            max_reported_failures,
        }
    }

    /// Render report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render report as markdown
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        writeln!(output, "# {}", self.metadata.title).ok();
        writeln!(output).ok();
        writeln!(output, "**Generated:** {}", self.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")).ok();
        writeln!(output, "**Seed:** {}", self.summary.seed).ok();
        writeln!(output).ok();

        writeln!(output, "## Summary").ok();
        writeln!(output).ok();
        writeln!(output, "| Bank | Questions | Shuffled | Malformed | Spot Check | Written |").ok();
        writeln!(output, "|------|-----------|----------|-----------|------------|---------|").ok();
        for bank in &self.summary.banks {
            writeln!(
                output,
                "| {} | {} | {} | {} | {}/{} passed | {} |",
                bank.name,
                bank.questions,
                bank.shuffled,
                bank.malformed,
                bank.verification.passed,
                bank.verification.sample_size,
                if bank.persisted.is_some() { "Yes" } else { "No" }
            )
            .ok();
        }
        writeln!(output).ok();

        for bank in &self.summary.banks {
            writeln!(output, "## {}", bank.name).ok();
            writeln!(output).ok();
            writeln!(output, "{}", comparison_table(&bank.before, &bank.after, true)).ok();
            writeln!(output).ok();
            write_failures(&mut output, &bank.verification, self.max_reported_failures, "- ");
        }

        writeln!(output, "## Combined").ok();
        writeln!(output).ok();
        writeln!(output, "{}", comparison_table(&self.before, &self.after, true)).ok();
        writeln!(output).ok();
        write_skipped(&mut output, &self.summary.skipped, "- ");
        output
    }

    /// Render report as plain text
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        writeln!(output, "{RULE_HEAVY}").ok();
        writeln!(output, "  {}", self.metadata.title).ok();
        writeln!(output, "{RULE_HEAVY}").ok();
        writeln!(output).ok();

        for bank in &self.summary.banks {
            writeln!(output, "{} ({} questions, seed {})", bank.name.to_uppercase(), bank.questions, bank.seed).ok();
            writeln!(output, "{RULE_LIGHT}").ok();
            writeln!(output, "{}", comparison_table(&bank.before, &bank.after, false)).ok();
            writeln!(output, "  Shuffled:   {}", bank.shuffled).ok();
            if bank.malformed > 0 {
                writeln!(output, "  Malformed:  {} (left unchanged)", bank.malformed).ok();
            }
            writeln!(
                output,
                "  Spot check: {}/{} passed, {} warnings",
                bank.verification.passed, bank.verification.sample_size, bank.verification.warnings
            )
            .ok();
            write_failures(&mut output, &bank.verification, self.max_reported_failures, "  ");
            if let Some(persisted) = &bank.persisted {
                let kept = if persisted.backup_created { "" } else { " (kept from an earlier run)" };
                writeln!(output, "  Backup:     {}{kept}", persisted.backup_path.display()).ok();
            }
            writeln!(output).ok();
        }

        writeln!(output, "COMBINED ({} questions)", self.before.total()).ok();
        writeln!(output, "{RULE_LIGHT}").ok();
        writeln!(output, "{}", comparison_table(&self.before, &self.after, false)).ok();
        write_skipped(&mut output, &self.summary.skipped, "  ");

        if self.summary.mode == RunMode::DryRun {
            writeln!(output).ok();
            writeln!(output, "Dry run: no files were written. Re-run with --apply to write changes.").ok();
        }
        output
    }
}

// ============================================================================
// Verification
// ============================================================================

/// Spot-check report for a verify run
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub metadata: ReportMetadata,
    pub summary: VerificationSummary,
    pub passed: bool,
    #[serde(skip)]
    max_reported_failures: usize,
}

impl VerificationReport {
    /// Build a report for `summary`
    #[must_use]
    pub fn new(summary: VerificationSummary, max_reported_failures: usize) -> Self {
        Self {
            metadata: ReportMetadata::new("Shuffle Integrity Verification"),
            passed: summary.is_clean(),
            summary,
            max_reported_failures,
        }
    }

    fn rows(&self) -> Vec<VerificationRow> {
        self.summary
            .banks
            .iter()
            .map(|b| VerificationRow::new(&b.name, &b.verification))
            .collect()
    }

    /// Render report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render report as markdown
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        writeln!(output, "# {}", self.metadata.title).ok();
        writeln!(output).ok();
        writeln!(output, "**Generated:** {}", self.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")).ok();
        writeln!(output, "**Result:** {}", if self.passed { "PASS" } else { "FAIL" }).ok();
        writeln!(output).ok();
        writeln!(output, "{}", render_table(self.rows(), true)).ok();
        writeln!(output).ok();

        for bank in &self.summary.banks {
            if !bank.verification.is_clean() {
                writeln!(output, "## {} failures", bank.name).ok();
                writeln!(output).ok();
                write_failures(&mut output, &bank.verification, self.max_reported_failures, "- ");
                writeln!(output).ok();
            }
        }
        write_skipped(&mut output, &self.summary.skipped, "- ");
        output
    }

    /// Render report as plain text
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        writeln!(output, "{RULE_HEAVY}").ok();
        writeln!(output, "  {}", self.metadata.title).ok();
        writeln!(output, "{RULE_HEAVY}").ok();
        writeln!(output).ok();
        writeln!(output, "{}", render_table(self.rows(), false)).ok();
        writeln!(output).ok();

        for bank in &self.summary.banks {
            if !bank.verification.is_clean() {
                writeln!(output, "{} FAILURES", bank.name.to_uppercase()).ok();
                writeln!(output, "{RULE_LIGHT}").ok();
                write_failures(&mut output, &bank.verification, self.max_reported_failures, "  ");
                writeln!(output).ok();
            }
        }
        write_skipped(&mut output, &self.summary.skipped, "  ");

        writeln!(
            output,
            "Overall: {} sampled, {} passed, {} failed, {} with warnings",
            self.summary.sampled(),
            self.summary.passed(),
            self.summary.failed(),
            self.summary.warnings()
        )
        .ok();
        writeln!(output, "Result: {}", if self.passed { "PASS" } else { "FAIL" }).ok();
        output
    }
}

// ============================================================================
// Single question
// ============================================================================

fn write_question(output: &mut String, question: &QuestionRecord) {
    for (i, choice) in question.choices().iter().enumerate() {
        let marker = if question.correct_index() == Some(i) { "*" } else { " " };
        writeln!(output, "  {marker} {}. {choice}", letter(i)).ok();
    }
    writeln!(output, "  Explanation: {}", question.explanation_text()).ok();
}

/// Render a backup/current comparison of one question
#[must_use]
pub fn render_comparison(comparison: &QuestionComparison) -> String {
    let mut output = String::new();
    writeln!(output, "{RULE_HEAVY}").ok();
    writeln!(
        output,
        "  Question {} ({}) in {}",
        comparison.index,
        comparison.original.identifier(),
        comparison.bank.display()
    )
    .ok();
    writeln!(output, "{RULE_HEAVY}").ok();
    writeln!(output, "{}", comparison.original.question_text().unwrap_or_default()).ok();
    writeln!(output).ok();

    writeln!(output, "ORIGINAL").ok();
    writeln!(output, "{RULE_LIGHT}").ok();
    write_question(&mut output, &comparison.original);
    writeln!(output).ok();

    writeln!(output, "CURRENT").ok();
    writeln!(output, "{RULE_LIGHT}").ok();
    write_question(&mut output, &comparison.transformed);
    writeln!(output).ok();

    let result = &comparison.result;
    let refs = |letters: &[char]| letters.iter().collect::<String>();
    writeln!(
        output,
        "References: [{}] -> [{}]",
        refs(&result.original_refs),
        refs(&result.transformed_refs)
    )
    .ok();
    for error in &result.errors {
        writeln!(output, "ERROR: {error}").ok();
    }
    for warning in &result.warnings {
        writeln!(output, "WARNING: {warning}").ok();
    }
    writeln!(output, "Result: {}", if result.passed { "PASS" } else { "FAIL" }).ok();
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{BankAnalysis, BankRunResult, BankVerifyResult};
    use crate::verify::{verify_question, SpotCheckConfig, SpotChecker};
    use std::path::PathBuf;

    fn question(correct: i64) -> QuestionRecord {
        let mut q = QuestionRecord::new(
            "q-1",
            "Which one?",
            vec!["X".into(), "Y".into(), "Z".into(), "W".into()],
            0,
            "A: X is right.",
        );
        q.set_correct_answer_index(correct);
        q
    }

    fn dist(indices: &[i64]) -> AnswerDistribution {
        let bank: Vec<QuestionRecord> = indices.iter().map(|&i| question(i)).collect();
        AnswerDistribution::from_questions(&bank)
    }

    fn verification(original: &[QuestionRecord], transformed: &[QuestionRecord]) -> BankVerification {
        SpotChecker::new(SpotCheckConfig {
            sample_fraction: 1.0,
            ..SpotCheckConfig::default()
        })
        .verify_bank(original, transformed)
        .expect("verify")
    }

    fn balance_summary(mode: RunMode) -> BalanceSummary {
        let original = vec![question(0), question(0)];
        let mut transformed = original.clone();
        transformed[1].set_choices(["Y", "X", "Z", "W"]);
        transformed[1].set_correct_answer_index(1);
        BalanceSummary {
            seed: 42,
            mode,
            banks: vec![BankRunResult {
                name: "People".into(),
                path: PathBuf::from("people.json"),
                seed: 42,
                questions: 2,
                shuffled: 1,
                malformed: 0,
                before: dist(&[0, 0]),
                after: dist(&[0, 1]),
                verification: verification(&original, &transformed),
                persisted: None,
            }],
            skipped: vec![SkippedBank {
                name: "Process".into(),
                path: PathBuf::from("process.json"),
                reason: "Question bank not found: process.json".into(),
            }],
        }
    }

    // ========================================================================
    // Tables
    // ========================================================================

    #[test]
    fn test_distribution_table() {
        let table = distribution_table(&dist(&[0, 0, 0, 1]), false);
        assert!(table.contains("Answer"));
        assert!(table.contains("75.0%"));
        assert!(table.contains("+2.0"));
        assert!(table.contains("-1.0"));
    }

    #[test]
    fn test_comparison_table_markdown() {
        let table = comparison_table(&dist(&[0, 0]), &dist(&[0, 1]), true);
        assert!(table.contains("| Answer"));
        assert!(table.contains("Δ from Ideal"));
        assert!(table.contains("2 (100.0%)"));
        assert!(table.contains("+25.0%"));
    }

    // ========================================================================
    // Reports
    // ========================================================================

    #[test]
    fn test_analysis_report_formats() {
        let report = AnalysisReport::new(AnalysisSummary {
            banks: vec![BankAnalysis {
                name: "People".into(),
                path: PathBuf::from("people.json"),
                distribution: dist(&[0, 0, 0, 2]),
            }],
            skipped: Vec::new(),
        });
        assert_eq!(report.combined.total(), 4);

        let text = report.to_text();
        assert!(text.contains("PEOPLE (4 questions)"));
        assert!(text.contains("Most common:  A (3, 75.0%)"));
        assert!(text.contains("Least common: B (0, 0.0%)"));

        let md = report.to_markdown();
        assert!(md.starts_with("# Answer Distribution Analysis"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().expect("json")).expect("parse");
        assert_eq!(json["combined"]["total"], 4);
    }

    #[test]
    fn test_balance_report_text() {
        let report = BalanceReport::new(balance_summary(RunMode::DryRun), 5);
        let text = report.to_text();
        assert!(text.contains("Answer Balance (dry run)"));
        assert!(text.contains("PEOPLE (2 questions, seed 42)"));
        assert!(text.contains("Spot check: 2/2 passed"));
        assert!(text.contains("Process skipped"));
        assert!(text.contains("--apply"));
    }

    #[test]
    fn test_balance_report_markdown_and_json() {
        let report = BalanceReport::new(balance_summary(RunMode::Apply), 5);
        let md = report.to_markdown();
        assert!(md.contains("| People | 2 | 1 | 0 | 2/2 passed | No |"));
        assert!(!md.contains("--apply"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().expect("json")).expect("parse");
        assert_eq!(json["summary"]["mode"], "apply");
        assert_eq!(json["after"]["counts"], serde_json::json!([1, 1, 0, 0]));
        assert!(json.get("max_reported_failures").is_none());
    }

    fn failing_summary(failures: usize) -> VerificationSummary {
        let original: Vec<QuestionRecord> = (0..failures).map(|_| question(0)).collect();
        let transformed: Vec<QuestionRecord> = (0..failures).map(|_| question(1)).collect();
        VerificationSummary {
            banks: vec![BankVerifyResult {
                name: "People".into(),
                path: PathBuf::from("people.json"),
                backup_path: PathBuf::from("people.backup.json"),
                verification: verification(&original, &transformed),
            }],
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_verification_report_lists_limited_failures() {
        let report = VerificationReport::new(failing_summary(4), 2);
        assert!(!report.passed);
        let text = report.to_text();
        assert!(text.contains("PEOPLE FAILURES"));
        assert!(text.contains("Position 0 (q-1):"));
        assert!(text.contains("Position 1 (q-1):"));
        assert!(!text.contains("Position 2 (q-1):"));
        assert!(text.contains("... and 2 more"));
        assert!(text.contains("Correct answer content mismatch"));
        assert!(text.contains("Result: FAIL"));
    }

    #[test]
    fn test_verification_report_clean() {
        let original = vec![question(0)];
        let summary = VerificationSummary {
            banks: vec![BankVerifyResult {
                name: "People".into(),
                path: PathBuf::from("people.json"),
                backup_path: PathBuf::from("people.backup.json"),
                verification: verification(&original, &original),
            }],
            skipped: Vec::new(),
        };
        let report = VerificationReport::new(summary, 5);
        assert!(report.passed);
        assert!(report.to_text().contains("Result: PASS"));
        assert!(report.to_markdown().contains("**Result:** PASS"));
        assert!(report.to_markdown().contains("100.0%"));
    }

    #[test]
    fn test_render_comparison() {
        let original = question(0);
        let mut transformed = original.clone();
        transformed.set_choices(["Z", "X", "Y", "W"]);
        transformed.set_correct_answer_index(1);
        transformed.set_explanation("B: X is right.");

        let comparison = QuestionComparison {
            bank: PathBuf::from("people.json"),
            index: 0,
            result: verify_question(0, &original, &transformed),
            original,
            transformed,
        };
        let text = render_comparison(&comparison);
        assert!(text.contains("Question 0 (q-1) in people.json"));
        assert!(text.contains("* A. X"));
        assert!(text.contains("* B. X"));
        assert!(text.contains("References: [A] -> [B]"));
        assert!(text.contains("Result: PASS"));
    }
}
