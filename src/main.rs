use clap::{Args, Parser, Subcommand};
use relative_valuation::config::{self, AppConfig};
use relative_valuation::error::AppError;
use relative_valuation::telemetry;
use relative_valuation::valuation::weights::STANDARD_WEIGHTS;
use relative_valuation::valuation::{
    ComparableCsvImporter, DirectionTable, RelativeValuationEngine, ValuationInput,
    ValuationReport, Variable,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Relative Valuation",
    about = "Rank a subject lease property against market comparables and size the pricing gap",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank the subject against its comparables and write the valuation report
    Rank(RankArgs),
    /// Print the standard weight schema and variable directions
    Weights,
}

#[derive(Args, Debug)]
struct RankArgs {
    /// Input document with subject_property, comparables and optional weights
    #[arg(long)]
    input: PathBuf,
    /// Where to write the report (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Extra comparables exported as CSV, appended to the input document's list
    #[arg(long)]
    comparables_csv: Option<PathBuf>,
    /// Override the configured share of base weight that must stay scoreable
    #[arg(long, value_parser = parse_floor)]
    min_scored_weight: Option<f64>,
    /// Skip the console summary
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Serialize)]
struct WeightsDocument {
    weights: BTreeMap<&'static str, f64>,
    directions: BTreeMap<&'static str, &'static str>,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("{}", err.to_json());
        std::process::exit(err.exit_code());
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(
        ?config.environment,
        min_scored_weight = config.engine.min_scored_weight,
        "relative valuation starting"
    );

    match cli.command {
        Command::Rank(args) => run_rank(config, args),
        Command::Weights => print_weights(),
    }
}

fn parse_floor(raw: &str) -> Result<f64, String> {
    config::parse_min_scored_weight(raw).map_err(|err| err.to_string())
}

fn run_rank(mut config: AppConfig, args: RankArgs) -> Result<(), AppError> {
    let RankArgs {
        input,
        output,
        comparables_csv,
        min_scored_weight,
        quiet,
    } = args;

    if let Some(floor) = min_scored_weight {
        config.engine.min_scored_weight = floor;
    }

    let mut document = ValuationInput::from_reader(BufReader::new(File::open(&input)?))?;
    if let Some(path) = comparables_csv {
        let imported = ComparableCsvImporter::from_path(&path)?;
        info!(rows = imported.len(), path = %path.display(), "appending CSV comparables");
        document.comparables.extend(imported);
    }

    let report = RelativeValuationEngine::new(config.engine).run_input(document)?;
    let rendered = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            std::fs::write(&path, format!("{rendered}\n"))?;
            info!(path = %path.display(), "valuation report written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{rendered}")?;
        }
    }

    if !quiet {
        render_summary(&report);
    }

    Ok(())
}

fn weights_document() -> WeightsDocument {
    let directions = DirectionTable::standard();
    WeightsDocument {
        weights: STANDARD_WEIGHTS
            .into_iter()
            .map(|(variable, weight)| (variable.key(), weight))
            .collect(),
        directions: Variable::core()
            .into_iter()
            .chain(Variable::optional())
            .map(|variable| (variable.key(), directions.direction(variable).key()))
            .collect(),
    }
}

fn print_weights() -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(&weights_document())?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}

fn render_summary(report: &ValuationReport) {
    let subject = &report.subject;
    eprintln!("Relative valuation");
    eprintln!(
        "Subject: {} (rank {} of {}, score {:.3}, {})",
        subject.address,
        subject.final_rank,
        report.record_count,
        subject.weighted_score,
        subject.status_label
    );

    let gap = &report.gap_analysis;
    match (&gap.threshold_address, gap.threshold_score) {
        (Some(address), Some(score)) => eprintln!(
            "Threshold: rank {} is {} at {:.3}; gap {:.3}",
            gap.threshold_rank, address, score, gap.gap
        ),
        _ => eprintln!("Threshold: fewer than {} records", gap.threshold_rank),
    }

    if !report.dropped_variables.is_empty() {
        eprintln!("\nWeights redistributed");
        for dropped in &report.dropped_variables {
            eprintln!(
                "- {} ({:.1}%): {}",
                dropped.label,
                dropped.base_weight * 100.0,
                dropped.reason
            );
        }
    }

    if !report.sensitivity_scenarios.is_empty() {
        eprintln!("\nSensitivity scenarios");
        for scenario in &report.sensitivity_scenarios {
            let outcome = if scenario.closes_gap {
                "closes gap"
            } else {
                "does not close gap"
            };
            eprintln!(
                "- {}: rent ${:.2}, TMI ${:.2} -> rank {} ({})",
                scenario.label,
                scenario.proposed_rent,
                scenario.proposed_tmi,
                scenario.projected_rank,
                outcome
            );
        }
    }

    eprintln!("\nRecommendation: {}", report.recommendation);
}
