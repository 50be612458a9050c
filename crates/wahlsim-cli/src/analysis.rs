//! Descriptive statistics over stored pipeline results.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use wahlsim_core::{PartySet, ResultRecord};

pub const STATISTICS_FILE: &str = "statistics.json";

/// Count, mean, sample standard deviation and quartiles, as pandas'
/// `describe()` reports them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// `None` for fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub p25: f64,
    #[serde(rename = "50%")]
    pub p50: f64,
    #[serde(rename = "75%")]
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    pub mean: f64,
    pub std: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub generated_at: DateTime<Utc>,
    pub records: usize,
    /// Votes per party, every configured party listed.
    pub party_distribution: BTreeMap<String, usize>,
    pub age: Describe,
    pub certainty: Describe,
    pub match_scores: BTreeMap<String, MatchStats>,
    /// Pearson correlation between the parties' match scores across records.
    /// `None` where a party's scores do not vary.
    pub match_correlations: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    /// Mean match score of the party each persona actually chose.
    pub mean_match_of_choice: f64,
    /// Share of records, in percent, whose choice is their top match.
    pub top_match_agreement: f64,
}

pub fn compute(records: &[ResultRecord], parties: &PartySet) -> anyhow::Result<Statistics> {
    if records.is_empty() {
        bail!("no results to analyze");
    }

    let mut party_distribution: BTreeMap<String, usize> =
        parties.iter().map(|p| (p.to_string(), 0)).collect();
    let mut choice_scores = Vec::with_capacity(records.len());
    let mut agreeing = 0usize;

    for record in records {
        let choice = record.final_decision().party();
        *party_distribution.entry(choice.to_string()).or_default() += 1;

        let matches = record.judge_distribution();
        let Some(score) = matches.score(choice) else {
            bail!(
                "record {}: chosen party {choice} has no match score (keys: {})",
                record.id(),
                matches.matches().keys().cloned().collect::<Vec<_>>().join(", ")
            );
        };
        choice_scores.push(score);
        if top_match(record, parties) == Some(choice) {
            agreeing += 1;
        }
    }

    let ages: Vec<f64> = records.iter().map(|r| f64::from(r.persona().age())).collect();
    let certainties: Vec<f64> = records
        .iter()
        .map(|r| f64::from(r.final_decision().certainty()))
        .collect();

    let match_scores = parties
        .iter()
        .map(|party| {
            let scores: Vec<f64> = records
                .iter()
                .filter_map(|r| r.judge_distribution().score(party))
                .collect();
            let stats = MatchStats {
                mean: mean(&scores),
                std: sample_std(&scores),
            };
            (party.to_string(), stats)
        })
        .collect();

    let columns: Vec<(&str, Vec<f64>)> = parties
        .iter()
        .map(|party| {
            let scores = records
                .iter()
                .map(|r| r.judge_distribution().score(party).unwrap_or(f64::NAN))
                .collect();
            (party, scores)
        })
        .collect();
    let match_correlations = columns
        .iter()
        .map(|(a, xs)| {
            let row = columns
                .iter()
                .map(|(b, ys)| (b.to_string(), pearson(xs, ys)))
                .collect();
            (a.to_string(), row)
        })
        .collect();

    Ok(Statistics {
        generated_at: Utc::now(),
        records: records.len(),
        party_distribution,
        age: describe(&ages),
        certainty: describe(&certainties),
        match_scores,
        match_correlations,
        mean_match_of_choice: mean(&choice_scores),
        top_match_agreement: agreeing as f64 / records.len() as f64 * 100.0,
    })
}

/// Highest-scoring party; ties go to the party listed first in the set.
fn top_match<'a>(record: &ResultRecord, parties: &'a PartySet) -> Option<&'a str> {
    let matches = record.judge_distribution();
    let mut best: Option<(&str, f64)> = None;
    for party in parties.iter() {
        if let Some(score) = matches.score(party)
            && best.is_none_or(|(_, b)| score > b)
        {
            best = Some((party, score));
        }
    }
    best.map(|(party, _)| party)
}

/// Write `statistics.json` into `dir`, creating it if needed.
pub fn write_statistics(stats: &Statistics, dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(STATISTICS_FILE);
    let json = serde_json::to_string_pretty(stats).context("serializing statistics")?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Over pairs where both values are present (not NaN).
fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx * vy).sqrt())
}

/// Caller guarantees `values` is non-empty.
fn describe(values: &[f64]) -> Describe {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Describe {
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min: sorted[0],
        p25: quantile(&sorted, 0.25),
        p50: quantile(&sorted, 0.50),
        p75: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}

/// Linear interpolation between closest ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: u64, age: u8, choice: &str, certainty: u8, top: &str) -> ResultRecord {
        let answers: Vec<_> = (1..=35)
            .map(|i| json!({ "question_id": i, "stance": 1, "justification": "Dem stimme ich voll zu." }))
            .collect();
        let mut matches = serde_json::Map::new();
        for party in PartySet::default().iter() {
            let score = if party == top { 90.0 } else { 40.0 };
            matches.insert(party.to_string(), json!(score));
        }
        let line = json!({
            "id": id,
            "persona": {
                "name": "Test Person",
                "age": age,
                "occupation": "Pflegerin",
                "residence": "Hamburg",
                "description": "Arbeitet im Schichtdienst in einem städtischen Krankenhaus und engagiert sich im Betriebsrat.",
                "political_stance": "Gewerkschaftsnah und sozialpolitisch orientiert.",
                "core_topics": ["Pflege", "Löhne"],
                "voting_pattern": "Wählt regelmäßig, meist Parteien links der Mitte.",
                "concerns": ["Personalmangel"],
                "hopes": ["Bessere Bezahlung"]
            },
            "questionnaire": { "answers": answers },
            "judge_distribution": {
                "matches": matches,
                "analysis": "Die Antworten zeigen eine starke Orientierung an sozialpolitischen Themen \
                    wie Pflege, Löhnen und Arbeitsbedingungen, wobei die Persona marktliberale Ansätze \
                    durchgehend ablehnt und staatliche Regulierung befürwortet."
            },
            "final_decision": {
                "party": choice,
                "justification": "Diese Partei setzt sich am glaubwürdigsten für bessere Bedingungen in der Pflege ein.",
                "certainty": certainty
            }
        });
        ResultRecord::from_json_line(&line.to_string(), &PartySet::default()).unwrap()
    }

    #[test]
    fn quantiles_interpolate_like_pandas() {
        let d = describe(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, 25.0);
        assert_eq!(d.p25, 17.5);
        assert_eq!(d.p50, 25.0);
        assert_eq!(d.p75, 32.5);
        assert_eq!((d.min, d.max), (10.0, 40.0));
        let std = d.std.unwrap();
        assert!((std - 12.909944).abs() < 1e-6, "{std}");
    }

    #[test]
    fn single_value_has_no_std() {
        let d = describe(&[42.0]);
        assert_eq!(d.std, None);
        assert_eq!(d.p75, 42.0);
    }

    #[test]
    fn computes_distribution_and_agreement() {
        let records = vec![
            record(1, 30, "SPD", 80, "SPD"),
            record(2, 50, "SPD", 60, "CDU"),
            record(3, 70, "CDU", 70, "CDU"),
            record(4, 40, "GRÜNE", 90, "GRÜNE"),
        ];
        let stats = compute(&records, &PartySet::default()).unwrap();

        assert_eq!(stats.records, 4);
        assert_eq!(stats.party_distribution["SPD"], 2);
        assert_eq!(stats.party_distribution["AFD"], 0);
        assert_eq!(stats.age.mean, 47.5);
        assert_eq!(stats.certainty.max, 90.0);
        // Record 2 chose SPD at 40 while CDU topped it.
        assert_eq!(stats.mean_match_of_choice, (90.0 + 40.0 + 90.0 + 90.0) / 4.0);
        assert_eq!(stats.top_match_agreement, 75.0);
        assert_eq!(stats.match_scores["CDU"].mean, (40.0 + 90.0 + 90.0 + 40.0) / 4.0);
    }

    #[test]
    fn ties_go_to_the_first_listed_party() {
        let r = record(1, 30, "FDP", 50, "none");
        // Every party scored 40: CDU is listed first.
        assert_eq!(top_match(&r, &PartySet::default()), Some("CDU"));
    }

    #[test]
    fn match_scores_are_correlated_across_records() {
        let records = vec![
            record(1, 30, "CDU", 80, "CDU"),
            record(2, 40, "SPD", 70, "SPD"),
            record(3, 50, "CDU", 60, "CDU"),
        ];
        let corr = compute(&records, &PartySet::default()).unwrap().match_correlations;

        let cdu_spd = corr["CDU"]["SPD"].unwrap();
        assert!((cdu_spd + 1.0).abs() < 1e-9, "{cdu_spd}");
        assert!((corr["SPD"]["SPD"].unwrap() - 1.0).abs() < 1e-9);
        // FDP is 40 everywhere.
        assert_eq!(corr["FDP"]["CDU"], None);
        assert_eq!(corr.len(), 6);
        assert_eq!(corr["AFD"].len(), 6);
    }

    #[test]
    fn pearson_needs_two_points() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), Some(1.0));
    }

    #[test]
    fn empty_results_are_an_error() {
        assert!(compute(&[], &PartySet::default()).is_err());
    }

    #[test]
    fn statistics_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let stats = compute(&[record(1, 30, "SPD", 80, "SPD")], &PartySet::default()).unwrap();
        let path = write_statistics(&stats, &dir.path().join("out")).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["records"], 1);
        assert_eq!(value["age"]["50%"], 30.0);
        assert!(value["age"]["std"].is_null());
        assert_eq!(value["top_match_agreement"], 100.0);
        assert!(value["match_correlations"]["CDU"]["SPD"].is_null());
    }
}
