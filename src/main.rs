use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod app;
mod assets;
mod auth;
mod batch;
mod db;
mod error;
mod metrics;
mod models;
mod report;
mod risk;
mod router;
mod session;
mod views;

use crate::models::{Mutation, PatientInput, TreatmentResponse};

#[derive(Parser)]
#[command(name = "baqa")]
#[command(about = "BAQĀ decision intelligence demo: risk scoring, dashboards and patient reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StoreKind {
    Memory,
    Postgres,
}

#[derive(clap::Args)]
struct PatientArgs {
    #[arg(long, value_parser = clap::value_parser!(u32).range(18..=89))]
    age: u32,
    #[arg(long)]
    mutation: Mutation,
    #[arg(long)]
    response: TreatmentResponse,
    #[arg(long)]
    ldh: f64,
}

impl PatientArgs {
    fn to_input(&self) -> anyhow::Result<PatientInput> {
        Ok(PatientInput::new(
            self.age,
            self.mutation,
            self.response,
            self.ldh,
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the session store schema
    InitDb,
    /// Start an interactive dashboard session on stdin/stdout
    Run {
        #[arg(long = "assets", default_value = "assets")]
        assets_dir: PathBuf,
        #[arg(long, default_value = "reports")]
        reports_dir: PathBuf,
        #[arg(long, default_value_t = metrics::DEFAULT_SEED)]
        seed: u64,
        #[arg(long, value_enum, default_value_t = StoreKind::Memory)]
        store: StoreKind,
        /// Resume (or start) the session with this id
        #[arg(long)]
        session: Option<Uuid>,
    },
    /// Score a single patient or a CSV of patients
    #[command(group(
        ArgGroup::new("source")
            .args(["csv", "age"])
            .required(true)
            .multiple(false)
    ))]
    Score {
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long, requires = "csv")]
        out: Option<PathBuf>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(18..=89))]
        age: Option<u32>,
        #[arg(long)]
        mutation: Option<Mutation>,
        #[arg(long)]
        response: Option<TreatmentResponse>,
        #[arg(long)]
        ldh: Option<f64>,
    },
    /// Print the seeded decision-maker metrics
    Metrics {
        #[arg(long, default_value_t = metrics::DEFAULT_SEED)]
        seed: u64,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a PDF patient report
    Report {
        #[command(flatten)]
        patient: PatientArgs,
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
        #[arg(long = "assets", default_value = "assets")]
        assets_dir: PathBuf,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to use the Postgres session store")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Run {
            assets_dir,
            reports_dir,
            seed,
            store,
            session,
        } => {
            let store = match store {
                StoreKind::Memory => db::SessionStore::memory(),
                StoreKind::Postgres => db::SessionStore::Postgres(connect().await?),
            };
            let dashboard = app::Dashboard {
                verifier: auth::DemoCredentials,
                assets: assets::Assets::discover(&assets_dir),
                reports_dir,
                seed,
            };
            let session = store.load_or_new(session).await?;
            let session = app::run(
                &dashboard,
                &store,
                session,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await?;
            eprintln!("Session {} saved.", session.id);
        }
        Commands::Score {
            csv: Some(csv),
            out,
            ..
        } => {
            let file = std::fs::File::open(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let rows = batch::score_csv(file)?;
            match out {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    batch::write_scores(file, &rows)?;
                    println!("Scored {} patients into {}.", rows.len(), path.display());
                }
                None => batch::write_scores(std::io::stdout(), &rows)?,
            }
        }
        Commands::Score {
            age: Some(age),
            mutation: Some(mutation),
            response: Some(response),
            ldh: Some(ldh),
            ..
        } => {
            let input = PatientInput::new(age, mutation, response, ldh)?;
            let assessment = risk::assess(risk::score(&input));
            println!(
                "Estimated 1-year mortality probability: {}",
                risk::format_percent(assessment.probability)
            );
            println!("Risk Level: {}", assessment.level);
        }
        Commands::Score { .. } => {
            anyhow::bail!("pass either --csv or all of --age, --mutation, --response and --ldh");
        }
        Commands::Metrics { seed, json } => {
            let metrics = metrics::generate(seed);
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                println!("Cases Included: {}", views::group_thousands(metrics.cases));
                println!("Deaths Included: {}", views::group_thousands(metrics.deaths));
                println!("Overall Risk Level: {}", metrics.overall_level);
                println!("Five-year Mortality: {:.1}%", metrics.five_year_mortality);
                println!("Risk by region:");
                for region in &metrics.regions {
                    println!("- {}: {}", region.region, region.index);
                }
                println!("High-risk factors:");
                for factor in &metrics.factors {
                    println!("- {}: {}%", factor.factor, factor.percent);
                }
            }
        }
        Commands::Report {
            patient,
            out_dir,
            assets_dir,
        } => {
            let input = patient.to_input()?;
            let assets = assets::Assets::discover(&assets_dir);
            let generated_at = Local::now().naive_local();
            let exporter = report::ReportExporter::new(out_dir, assets.logo.clone());
            let path = exporter
                .export(&input.report_attributes(), risk::score(&input), generated_at)
                .context("failed to export report")?;
            println!(
                "Report written to {} (download as {}).",
                path.display(),
                report::download_name(generated_at)
            );
        }
    }

    Ok(())
}
