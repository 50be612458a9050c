//! Vertical summary cards for batch runs and analysis results.

use std::fmt::Write as _;

use wahlsim_pipeline::BatchSummary;

use crate::analysis::{Describe, Statistics};

// ── Public API ──

pub fn print_batch_card(summary: &BatchSummary) {
    print!("{}", batch_card(summary));
}

pub fn print_statistics_card(stats: &Statistics) {
    print!("{}", statistics_card(stats));
}

// ── Rendering ──

fn batch_card(summary: &BatchSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Pipeline run ===");
    row(&mut out, "records", summary.total);
    row(&mut out, "completed", summary.completed);
    row(&mut out, "failed", summary.failed.len());
    if !summary.failed.is_empty() {
        let _ = writeln!(out, "\nFailures");
        for f in &summary.failed {
            let _ = writeln!(
                out,
                "  #{:<5} stage {} ({}): {}",
                f.id,
                f.stage.number(),
                f.stage,
                f.error
            );
        }
    }
    out
}

fn statistics_card(stats: &Statistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Analysis: {} records ===", stats.records);
    let _ = writeln!(out, "{}\n", stats.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));

    let _ = writeln!(out, "Party choice");
    let mut votes: Vec<(&String, &usize)> = stats.party_distribution.iter().collect();
    votes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (party, count) in votes {
        let pct = *count as f64 / stats.records as f64 * 100.0;
        let _ = writeln!(out, "  {:<26} {:>4}  ({pct:.1}%)", party, count);
    }

    section(&mut out, "Age", &stats.age);
    section(&mut out, "Certainty", &stats.certainty);

    let _ = writeln!(out, "\nMatch scores (mean ± std)");
    for (party, m) in &stats.match_scores {
        let _ = writeln!(out, "  {:<26} {:>6.2} ± {}", party, m.mean, fmt_opt(m.std));
    }

    let _ = writeln!(out, "\nMatch score correlation");
    let parties: Vec<&String> = stats.match_correlations.keys().collect();
    let header: String = parties.iter().map(|p| format!(" {p:>7}")).collect();
    let _ = writeln!(out, "  {:<8}{header}", "");
    for (party, row) in &stats.match_correlations {
        let cells: String = row
            .values()
            .map(|c| format!(" {:>7}", c.map_or_else(|| "-".to_string(), |c| format!("{c:.2}"))))
            .collect();
        let _ = writeln!(out, "  {party:<8}{cells}");
    }

    let _ = writeln!(out, "\nConsistency");
    row(
        &mut out,
        "mean match of choice",
        format!("{:.2}", stats.mean_match_of_choice),
    );
    row(
        &mut out,
        "choice = top match",
        format!("{:.1}%", stats.top_match_agreement),
    );
    out
}

fn section(out: &mut String, header: &str, d: &Describe) {
    let _ = writeln!(out, "\n{header}");
    row(out, "mean", format!("{:.2}", d.mean));
    row(out, "std", fmt_opt(d.std));
    row(
        out,
        "min / 25% / 50% / 75% / max",
        format!("{} / {} / {} / {} / {}", d.min, d.p25, d.p50, d.p75, d.max),
    );
}

fn row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {label:<26} {value}");
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
