//! Mortality pipeline CLI
//!
//! Builds the canonical snapshot from raw INSEE death files and prints
//! filtered aggregate reports as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use mortality_pipeline::{
    AgeGroup, NameQuery, Pipeline, PipelineConfig, PredicateSet, RecordFilter, Sex, YearRange,
    full_report, matching_given_names,
};

/// Mortality record cleaning and aggregation
#[derive(Parser, Debug)]
#[command(name = "mortality-pipeline")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(short, long, global = true, env = "MORTALITY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the raw yearly files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge and clean the raw files, then publish the snapshot
    Build,

    /// Load the snapshot, apply filters and print every statistic
    Report {
        /// Death years, `2020-2022` or `2021`
        #[arg(long)]
        years: Option<YearRange>,

        /// `male` or `female`
        #[arg(long, value_parser = parse_sex)]
        sex: Option<Sex>,

        /// Substring of the birth commune
        #[arg(long)]
        birth_place: Option<String>,

        /// Substring of the given name
        #[arg(long)]
        name: Option<String>,

        /// Match the given name exactly instead of as a substring
        #[arg(long, requires = "name")]
        exclusive_name: bool,

        /// One of all, 90+, 75-89, 60-74, 40-59, 20-39, 0-19
        #[arg(long)]
        age_group: Option<AgeGroup>,
    },
}

fn parse_sex(value: &str) -> std::result::Result<Sex, String> {
    Sex::from_label(value).ok_or_else(|| format!("unknown sex '{value}', expected male or female"))
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.input.data_dir.clone_from(dir);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let config = load_config(&cli)?;
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;

    match cli.command {
        Commands::Build => {
            let (dataset, report) = pipeline.rebuild().context("Pipeline run failed")?;
            info!(
                "Snapshot {} holds {} records",
                pipeline.store().path().display(),
                dataset.len()
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Report {
            years,
            sex,
            birth_place,
            name,
            exclusive_name,
            age_group,
        } => {
            let dataset = pipeline
                .run()
                .context("No canonical snapshot could be loaded")?;

            let mut predicates = PredicateSet::new();
            predicates.death_years = years;
            predicates.sex = sex;
            predicates.birth_place = birth_place;
            predicates.given_name = name.clone().map(|query| {
                if exclusive_name {
                    NameQuery::Exact(query)
                } else {
                    NameQuery::Contains(query)
                }
            });
            if let Some(group) = age_group {
                predicates = predicates.with_age_group(group, pipeline.config().cleaning.max_age);
            }

            let unfiltered = dataset.view();
            let view = unfiltered.refine(&predicates);
            info!(
                "{} of {} records match the filters",
                view.len(),
                dataset.len()
            );

            let suggestions = name
                .as_deref()
                .map(|query| matching_given_names(&unfiltered, query))
                .unwrap_or_default();
            let analysis = &pipeline.config().analysis;
            let report = full_report(&view, analysis);
            let top_departments = report
                .departments
                .as_ready()
                .map(|summary| summary.top(analysis.top_departments));
            let output = serde_json::json!({
                "records": dataset.len(),
                "matching_records": view.len(),
                "matching_given_names": suggestions,
                "unrestricted": predicates.is_unrestricted(),
                "top_departments": top_departments,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
