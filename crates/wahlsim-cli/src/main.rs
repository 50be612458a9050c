mod analysis;
mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use wahlsim_ai::{OpenAiTransport, StructuredClient};
use wahlsim_core::config::DEFAULT_API_BASE;
use wahlsim_core::{ApiKey, GenerationConfig};
use wahlsim_pipeline::{BatchRunner, IndexRange, Orchestrator};
use wahlsim_store::corpus::load_parties;
use wahlsim_store::{CorpusPaths, JsonlSink, load_corpora, load_voters, read_results};

#[derive(Parser, Debug)]
#[command(name = "wahlsim", version, about = "Synthetic voter simulation")]
struct Cli {
    /// Generate personas, answers, judgements and choices for the CSV rows.
    #[arg(long)]
    run_pipeline: bool,

    /// Compute statistics over the results file.
    #[arg(long)]
    run_analysis: bool,

    /// Voter demographics, one row per voter.
    #[arg(long, default_value = "data/voters.csv")]
    csv_path: PathBuf,

    /// Results file (JSON lines, appended to).
    #[arg(long, default_value = "data/results/pipeline_results.jsonl")]
    output_path: PathBuf,

    /// Directory holding news.txt, parties.json, questions.json and programs/.
    #[arg(long, default_value = "data/corpus")]
    data_dir: PathBuf,

    /// First CSV row to process (0-based, inclusive).
    #[arg(long, default_value_t = 0)]
    sample_start: usize,

    /// Row to stop at (exclusive). Defaults to the end of the file.
    #[arg(long)]
    sample_end: Option<usize>,

    #[arg(long, default_value = "gpt-4o")]
    model: String,

    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Attempts per generation call.
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Base backoff delay; doubled after every failed attempt.
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    /// Extra stage calls when a reply fails validation.
    #[arg(long, default_value_t = 0)]
    validation_retries: u32,

    /// Records processed at once.
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

impl Cli {
    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_delay_ms),
            temperature: self.temperature,
            validation_retries: self.validation_retries,
            ..Default::default()
        }
    }

    fn results_dir(&self) -> &Path {
        match self.output_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    info!("wahlsim v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    if !cli.run_pipeline && !cli.run_analysis {
        eprintln!("Nothing to do: pass --run-pipeline and/or --run-analysis.");
        return Ok(());
    }

    if cli.run_pipeline {
        run_pipeline(&cli).await?;
    }
    if cli.run_analysis {
        run_analysis(&cli)?;
    }
    Ok(())
}

async fn run_pipeline(cli: &Cli) -> anyhow::Result<()> {
    // Configuration problems end the run before any record is touched.
    let api_key = ApiKey::new(cli.api_key.clone())?;
    let config = cli.generation_config();
    config.validate()?;

    let corpora = load_corpora(&CorpusPaths::in_dir(&cli.data_dir))
        .with_context(|| format!("loading reference corpora from {}", cli.data_dir.display()))?;
    let voters = load_voters(&cli.csv_path)
        .with_context(|| format!("loading voters from {}", cli.csv_path.display()))?;
    let range = IndexRange::new(cli.sample_start, cli.sample_end);
    let span = range.resolve(voters.len());
    eprintln!(
        "  Loaded {} voters, processing rows {}..{} ({})",
        voters.len(),
        span.start,
        span.end,
        span.len()
    );

    let transport = OpenAiTransport::new(&config.api_base, api_key, config.request_timeout)
        .context("building HTTP client")?;
    let client = StructuredClient::new(Arc::new(transport), config);
    let orchestrator = Orchestrator::new(client, Arc::new(corpora));
    let sink = JsonlSink::open(&cli.output_path)
        .await
        .with_context(|| format!("opening {}", cli.output_path.display()))?;

    let summary = BatchRunner::new(Arc::new(orchestrator), Arc::new(sink))
        .with_concurrency(cli.concurrency)
        .run(&voters, range, |p| {
            eprint!("\r  processed {}/{}", p.processed, p.total);
        })
        .await?;
    eprintln!();

    display::print_batch_card(&summary);
    Ok(())
}

fn run_analysis(cli: &Cli) -> anyhow::Result<()> {
    let paths = CorpusPaths::in_dir(&cli.data_dir);
    let parties = load_parties(&paths.parties).context("loading party set")?;
    let records = read_results(&cli.output_path, &parties)
        .with_context(|| format!("reading results from {}", cli.output_path.display()))?;
    info!(records = records.len(), "results loaded");

    let stats = analysis::compute(&records, &parties)?;
    let path = analysis::write_statistics(&stats, cli.results_dir())?;
    display::print_statistics_card(&stats);
    eprintln!("  Statistics written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_generation_config() {
        let cli = Cli::parse_from([
            "wahlsim",
            "--run-pipeline",
            "--model",
            "gpt-4o-mini",
            "--max-retries",
            "5",
            "--retry-delay-ms",
            "250",
            "--sample-start",
            "10",
            "--sample-end",
            "20",
            "--api-key",
            "sk-test",
        ]);
        assert!(cli.run_pipeline && !cli.run_analysis);
        assert_eq!(cli.sample_end, Some(20));

        let config = cli.generation_config();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay, Duration::from_millis(250));
        assert_eq!(config.max_output_tokens, 4000);
    }

    #[test]
    fn defaults_follow_generation_defaults() {
        let cli = Cli::parse_from(["wahlsim", "--run-analysis"]);
        assert_eq!(cli.generation_config().model, GenerationConfig::default().model);
        assert_eq!(cli.concurrency, 1);
        assert_eq!(cli.results_dir(), Path::new("data/results"));
    }

    #[test]
    fn bare_output_file_uses_current_dir() {
        let cli = Cli::parse_from(["wahlsim", "--output-path", "results.jsonl"]);
        assert_eq!(cli.results_dir(), Path::new("."));
    }

    #[tokio::test]
    async fn missing_credential_stops_before_loading() {
        let mut cli = Cli::parse_from(["wahlsim", "--run-pipeline", "--data-dir", "/nonexistent"]);
        cli.api_key = None;
        let err = run_pipeline(&cli).await.unwrap_err();
        assert!(err.to_string().contains("credential missing"), "{err}");
    }
}
