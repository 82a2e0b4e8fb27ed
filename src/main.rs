//! Command-line entry point for panel construction and the lag sweep.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use climsec::data::loader::{
    load_controls, load_disasters, load_speeches, save_disasters, save_speeches,
};
use climsec::data::types::{DisasterEvent, DisasterGroup, SpeechRecord, TopicFlag};
use climsec::models::{run_lag_sweep, EngineConfig};
use climsec::panel::{build_panel, SpeechFilter};
use climsec::report::{
    collect_disaster_terms, render_report, save_panel, save_results_csv, save_results_json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Poisson};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "climsec")]
#[command(about = "Country-year panels linking disaster exposure to securitized climate speech")]
struct Cli {
    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the panel and run the lag 0..5 regression sweep
    Regress {
        /// Classified speech records CSV
        #[arg(long)]
        speeches: PathBuf,

        /// Disaster events CSV
        #[arg(long)]
        disasters: PathBuf,

        /// Per-document control covariates CSV
        #[arg(long)]
        controls: Option<PathBuf>,

        /// Keep only climate-topic speeches in the panel
        #[arg(long)]
        climate_only: bool,

        /// Add decade fixed effects
        #[arg(long)]
        decade_fe: bool,

        /// Fit without control covariates even when a file is given
        #[arg(long)]
        no_controls: bool,

        /// Confidence level for intervals, strictly between 0 and 1
        #[arg(long, default_value = "0.95", value_parser = parse_confidence)]
        confidence: f64,

        /// Write the aggregated panel CSV here
        #[arg(long)]
        panel_out: Option<PathBuf>,

        /// Write the disaster-term results CSV here
        #[arg(long)]
        results_out: Option<PathBuf>,

        /// Write the full results JSON (failures included) here
        #[arg(long)]
        json_out: Option<PathBuf>,
    },

    /// Build the aggregated country-year panel and save it
    Panel {
        /// Classified speech records CSV
        #[arg(long)]
        speeches: PathBuf,

        /// Disaster events CSV
        #[arg(long)]
        disasters: PathBuf,

        /// Per-document control covariates CSV
        #[arg(long)]
        controls: Option<PathBuf>,

        /// Keep only climate-topic speeches in the panel
        #[arg(long)]
        climate_only: bool,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate a synthetic dataset with a known lag-4 effect and fit it
    Simulate {
        /// Number of entities
        #[arg(long, default_value = "8")]
        entities: usize,

        /// Observed years per entity
        #[arg(long, default_value = "30")]
        years: usize,

        /// RNG seed
        #[arg(long, default_value = "7")]
        seed: u64,

        /// True coefficient on the 4-year-lagged disaster count
        #[arg(long, default_value = "2.0")]
        effect: f64,

        /// Standard deviation of the outcome noise
        #[arg(long, default_value = "0.0")]
        noise: f64,

        /// Write the generated speech records here
        #[arg(long)]
        speeches_out: Option<PathBuf>,

        /// Write the generated disaster events here
        #[arg(long)]
        disasters_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    FmtSubscriber::builder().with_max_level(level).init();

    match cli.command {
        Commands::Regress {
            speeches,
            disasters,
            controls,
            climate_only,
            decade_fe,
            no_controls,
            confidence,
            panel_out,
            results_out,
            json_out,
        } => {
            let speeches = load_speeches(&speeches)?;
            info!("loaded {} speech records", speeches.len());
            let disasters = load_disasters(&disasters)?;
            info!("loaded {} disaster events", disasters.len());
            let control_records = match &controls {
                Some(path) => {
                    let records = load_controls(path)?;
                    info!("loaded {} control records", records.len());
                    records
                }
                None => Vec::new(),
            };

            let filter = if climate_only {
                SpeechFilter::ClimateOnly
            } else {
                SpeechFilter::All
            };
            let (panel, stats) = build_panel(&speeches, &disasters, &control_records, filter);
            info!(
                rows = panel.len(),
                merged = stats.rows,
                matched = stats.matched_rows,
                "aggregated country-year panel"
            );

            if let Some(path) = panel_out {
                save_panel(&path, &panel)?;
                info!("panel saved to {:?}", path);
            }

            let config = EngineConfig {
                with_controls: controls.is_some() && !no_controls,
                entity_fe: true,
                decade_fe,
                confidence,
            };
            let fits = run_lag_sweep(&panel, &config);
            let table = collect_disaster_terms(&fits);
            println!("{}", render_report(&fits));

            if let Some(path) = results_out {
                save_results_csv(&path, &table)?;
                info!("results saved to {:?}", path);
            }
            if let Some(path) = json_out {
                save_results_json(&path, &table)?;
                info!("results saved to {:?}", path);
            }
        }

        Commands::Panel {
            speeches,
            disasters,
            controls,
            climate_only,
            output,
        } => {
            let speeches = load_speeches(&speeches)?;
            let disasters = load_disasters(&disasters)?;
            let control_records = match &controls {
                Some(path) => load_controls(path)?,
                None => Vec::new(),
            };

            let filter = if climate_only {
                SpeechFilter::ClimateOnly
            } else {
                SpeechFilter::All
            };
            let (panel, stats) = build_panel(&speeches, &disasters, &control_records, filter);
            info!(
                rows = panel.len(),
                gap_cells = stats.gap_cells,
                "aggregated country-year panel"
            );

            save_panel(&output, &panel)?;
            info!("panel saved to {:?}", output);
        }

        Commands::Simulate {
            entities,
            years,
            seed,
            effect,
            noise,
            speeches_out,
            disasters_out,
        } => {
            let (speeches, disasters) = generate_dataset(entities, years, seed, effect, noise)?;
            info!(
                speeches = speeches.len(),
                disasters = disasters.len(),
                "generated synthetic dataset"
            );

            if let Some(path) = speeches_out {
                save_speeches(&path, &speeches)?;
                info!("speeches saved to {:?}", path);
            }
            if let Some(path) = disasters_out {
                save_disasters(&path, &disasters)?;
                info!("disasters saved to {:?}", path);
            }

            let (panel, _) = build_panel(&speeches, &disasters, &[], SpeechFilter::All);
            let config = EngineConfig {
                with_controls: false,
                entity_fe: true,
                decade_fe: false,
                confidence: 0.95,
            };
            let fits = run_lag_sweep(&panel, &config);
            let table = collect_disaster_terms(&fits);
            println!("{}", render_report(&fits));
            println!("true effect at lag 4: {effect:.4}");
            if let Some(row) = table.rows.iter().find(|r| r.lag == 4) {
                println!("estimated at lag 4:   {:.4}", row.estimate);
            }
        }
    }

    Ok(())
}

fn parse_confidence(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "confidence level {value} is not strictly between 0 and 1"
        ))
    }
}

/// Build a speech/disaster dataset whose securitized speech count follows
/// `effect x disaster_count(year - 4) + entity offset + noise`. Every
/// entity-year gets at least one disaster so the panel has no gaps, and
/// integer entity offsets keep the zero-noise case exactly recoverable.
fn generate_dataset(
    entities: usize,
    years: usize,
    seed: u64,
    effect: f64,
    noise: f64,
) -> Result<(Vec<SpeechRecord>, Vec<DisasterEvent>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let extra_events = Poisson::new(1.2).context("invalid event rate")?;
    let shock = Normal::new(0.0, noise).context("invalid noise level")?;
    let start_year = 1990;

    let mut speeches = Vec::new();
    let mut disasters = Vec::new();

    for e in 0..entities {
        let entity = format!("E{:02}", e + 1);
        let offset = 1.0 + e as f64;

        let counts: Vec<usize> = (0..years)
            .map(|_| 1 + extra_events.sample(&mut rng) as usize)
            .collect();

        for (t, &count) in counts.iter().enumerate() {
            let year = start_year + t as i32;

            for seq in 0..count {
                let spans_two_years = seq % 4 == 3;
                disasters.push(DisasterEvent {
                    entity_code: entity.clone(),
                    start_year: year,
                    end_year: if spans_two_years { year + 1 } else { year },
                    event_type: Some(if seq % 2 == 0 { "flood" } else { "storm" }.to_string()),
                    subtype: None,
                    group: Some(if seq % 5 == 4 {
                        DisasterGroup::Technological
                    } else {
                        DisasterGroup::Natural
                    }),
                    deaths: Some(10.0 + 3.0 * seq as f64),
                    affected: Some(200.0 * (seq + 1) as f64),
                    damage_adjusted: if seq % 3 == 0 { Some(1.5) } else { None },
                });
            }

            let signal = if t >= 4 {
                effect * counts[t - 4] as f64 + offset
            } else {
                offset
            };
            let n_securitized = (signal + shock.sample(&mut rng)).round().max(0.0) as usize;

            let mut doc = 0;
            for _ in 0..n_securitized {
                speeches.push(speech(&entity, year, doc, TopicFlag::SecuritizedClimate));
                doc += 1;
            }
            for _ in 0..2 {
                speeches.push(speech(&entity, year, doc, TopicFlag::ClimateOnly));
                doc += 1;
            }
            speeches.push(speech(&entity, year, doc, TopicFlag::NonClimate));
        }
    }

    Ok((speeches, disasters))
}

fn speech(entity: &str, year: i32, seq: usize, topic_flag: TopicFlag) -> SpeechRecord {
    SpeechRecord {
        doc_id: format!("{entity}_{year}_{seq}"),
        entity_code: entity.to_string(),
        year,
        topic_flag,
    }
}
