use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod batch;
mod classifier;
mod config;
mod error;
mod explain;
mod forest;
mod models;
mod pipeline;
mod recommend;
mod report;
mod validate;

use classifier::ClassifierHandle;
use models::RawInputs;

#[derive(Parser)]
#[command(name = "diabetes-risk")]
#[command(about = "Diabetes risk prediction with health guidance and a printable summary", long_about = None)]
struct Cli {
    /// Trained model artifact, overrides DIABETES_MODEL_PATH
    #[arg(long, global = true)]
    model: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one patient and write the PDF summary
    #[command(allow_negative_numbers = true)]
    Predict {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(long, default_value = report::REPORT_FILENAME)]
        out: PathBuf,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify every row of a CSV file
    Batch {
        #[arg(long)]
        csv: PathBuf,
        /// Print one JSON object per row
        #[arg(long)]
        json: bool,
    },
    /// Show the model's ranked feature importance
    Importance,
    /// Describe the loaded model
    ModelInfo,
}

#[derive(Args)]
struct InputArgs {
    /// Pregnancies (0-20)
    #[arg(long, default_value_t = 1.0)]
    pregnancies: f64,
    /// Glucose level (0-200)
    #[arg(long, default_value_t = 110.0)]
    glucose: f64,
    /// Blood pressure (0-200)
    #[arg(long, default_value_t = 70.0)]
    blood_pressure: f64,
    /// Skin thickness (0-100)
    #[arg(long, default_value_t = 20.0)]
    skin_thickness: f64,
    /// Insulin level (0-900)
    #[arg(long, default_value_t = 80.0)]
    insulin: f64,
    /// BMI (0.0-70.0)
    #[arg(long, default_value_t = 25.0)]
    bmi: f64,
    /// Diabetes pedigree function (0.0-3.0)
    #[arg(long = "dpf", default_value_t = 0.5)]
    diabetes_pedigree_function: f64,
    /// Age (1-120)
    #[arg(long, default_value_t = 30.0)]
    age: f64,
}

impl From<InputArgs> for RawInputs {
    fn from(args: InputArgs) -> Self {
        Self {
            pregnancies: args.pregnancies,
            glucose: args.glucose,
            blood_pressure: args.blood_pressure,
            skin_thickness: args.skin_thickness,
            insulin: args.insulin,
            bmi: args.bmi,
            diabetes_pedigree_function: args.diabetes_pedigree_function,
            age: args.age,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = config::Config::from_env().with_model_override(cli.model);

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let handle = ClassifierHandle::load(&config.model_path)
        .with_context(|| format!("cannot serve predictions without {}", config.model_path.display()))?;

    match cli.command {
        Commands::Predict { inputs, out, json } => {
            let raw = RawInputs::from(inputs);
            let outcome = pipeline::run(&handle, &raw).context("input rejected")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{}", pipeline::render_text(&outcome));
            }

            match &outcome.report {
                Ok(document) => {
                    std::fs::write(&out, &document.bytes)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    eprintln!("Summary ({}) written to {}.", document.mime, out.display());
                }
                Err(err) => {
                    eprintln!("Summary document unavailable: {err}");
                    eprint!(
                        "{}",
                        report::summary_text(outcome.result.inputs(), &outcome.result)
                    );
                }
            }
        }
        Commands::Batch { csv, json } => {
            let rows = batch::run_csv(&handle, &csv)?;
            if rows.is_empty() {
                println!("No rows found in {}.", csv.display());
                return Ok(());
            }

            for row in &rows {
                match (&row.outcome, json) {
                    (Ok(outcome), true) => println!("{}", serde_json::to_string(outcome)?),
                    (Ok(outcome), false) => println!(
                        "- row {}: {} ({})",
                        row.row,
                        outcome.result.label(),
                        outcome.result.confidence_percent()
                    ),
                    (Err(err), true) => println!(
                        "{}",
                        serde_json::json!({ "row": row.row, "error": err.to_string() })
                    ),
                    (Err(err), false) => println!("- row {}: rejected, {err}", row.row),
                }
            }
        }
        Commands::Importance => {
            println!("{}:", explain::IMPORTANCE_CHART_TITLE);
            print!(
                "{}",
                pipeline::render_importance(&explain::ranked_importance(handle.importances()))
            );
            println!("({})", explain::IMPORTANCE_AXIS_LABEL);
        }
        Commands::ModelInfo => {
            let info = handle.info();
            let features: Vec<&str> = models::Feature::ALL
                .iter()
                .map(|feature| feature.display_name())
                .collect();
            println!("Model: {}", info.name);
            println!("Trained on: {}", info.trained_on);
            println!("Features used: {}", features.join(", "));
            println!("Interpretation: {}", info.interpretation);
            println!("Loaded from {} at {}", handle.source(), handle.loaded_at());
        }
    }

    Ok(())
}
