mod config;
mod snapshot;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use engine::dto::FormationRequest;
use engine::models::{Period, RankingFilter, ScoreRecord, TRIO_SIZE};
use engine::repository::{
    CollectingRankingSink, InMemoryCompetitors, InMemoryResults, InMemoryScoreStore,
    InMemoryTrioStore, TrioStore,
};
use engine::{FormationConfig, FormationService, ScoringService};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "penning")]
#[command(about = "Team penning trio formation and scoring", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Overrides PENNING_RETRY_BUDGET.
    #[arg(long, global = true)]
    retry_budget: Option<usize>,

    /// Overrides PENNING_PRIZE_DISCOUNT.
    #[arg(long, global = true)]
    prize_discount: Option<Decimal>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw the trios of one category for an event
    Draw {
        #[command(flatten)]
        formation: FormationArgs,

        /// Only restrict the pool to these competitors
        #[arg(long, value_delimiter = ',')]
        entrants: Option<Vec<Uuid>>,

        /// Check feasibility without committing
        #[arg(long)]
        dry_run: bool,
    },
    /// Champions Cup: spread ranked seeds over the trios, then draw the rest
    Seed {
        #[command(flatten)]
        formation: FormationArgs,

        /// Seeds, best rank first
        #[arg(long, value_delimiter = ',', required = true)]
        seeds: Vec<Uuid>,
    },
    /// Check whether three competitors form a valid trio
    Validate {
        #[arg(long)]
        competitors: PathBuf,

        #[arg(long)]
        category: String,

        #[arg(long, value_delimiter = ',', required = true)]
        members: Vec<Uuid>,

        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Score an event (trios and results) into score records
    Score {
        #[arg(long)]
        event: PathBuf,
    },
    /// Rank competitors from stored score records
    Rank {
        #[arg(long)]
        scores: PathBuf,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        limit: Option<usize>,
    },
    /// Top scorer of each handicap level, in Champions Cup pick order
    Champions {
        #[arg(long)]
        scores: PathBuf,

        #[arg(long)]
        competitors: PathBuf,

        #[arg(long)]
        year: Option<i32>,
    },
    /// Statistics of one competitor
    Stats {
        #[arg(long)]
        scores: PathBuf,

        #[arg(long)]
        competitor: Uuid,

        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(clap::Args)]
struct FormationArgs {
    #[arg(long)]
    competitors: PathBuf,

    #[arg(long)]
    event: Uuid,

    #[arg(long)]
    category: String,

    /// Random seed; a fresh one is picked and logged when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Date ages are computed on, defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl FormationArgs {
    fn reference_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(today)
    }

    fn request(&self) -> FormationRequest {
        let seed = self.seed.unwrap_or_else(|| {
            let seed = Utc::now().timestamp_millis().unsigned_abs();
            tracing::info!("No seed given, using {}", seed);
            seed
        });
        FormationRequest::new(self.event, self.category.clone(), self.reference_date()).with_seed(seed)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("penning={},engine={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?
        .with_overrides(cli.retry_budget, cli.prize_discount)
        .formation_config()?;

    match cli.command {
        Commands::Draw {
            formation,
            entrants,
            dry_run,
        } => handle_draw(formation, entrants, dry_run, &config).await,
        Commands::Seed { formation, seeds } => handle_seed(formation, seeds, &config).await,
        Commands::Validate {
            competitors,
            category,
            members,
            date,
        } => handle_validate(competitors, category, members, date, &config).await,
        Commands::Score { event } => handle_score(event, &config).await,
        Commands::Rank {
            scores,
            category,
            year,
            limit,
        } => handle_rank(scores, category, year, limit, &config).await,
        Commands::Champions {
            scores,
            competitors,
            year,
        } => handle_champions(scores, competitors, year, &config).await,
        Commands::Stats {
            scores,
            competitor,
            year,
        } => handle_stats(scores, competitor, year, &config).await,
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn period(year: Option<i32>) -> Result<Option<Period>> {
    year.map(|y| Period::year(y).ok_or_else(|| anyhow!("Year {} is out of range", y)))
        .transpose()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn formation_service(
    path: &Path,
    on: NaiveDate,
    config: &FormationConfig,
) -> Result<FormationService<InMemoryCompetitors, InMemoryTrioStore>> {
    let competitors = snapshot::load_competitors(path, on).await?;
    Ok(FormationService::new(
        InMemoryCompetitors::new(competitors),
        InMemoryTrioStore::new(),
        config,
    ))
}

fn scoring_service(
    scores: Vec<ScoreRecord>,
    config: &FormationConfig,
) -> ScoringService<InMemoryTrioStore, InMemoryResults, InMemoryScoreStore> {
    ScoringService::new(
        InMemoryTrioStore::new(),
        InMemoryResults::new(),
        InMemoryScoreStore::new(scores),
        config,
    )
}

async fn handle_draw(
    formation: FormationArgs,
    entrants: Option<Vec<Uuid>>,
    dry_run: bool,
    config: &FormationConfig,
) -> Result<()> {
    let service = formation_service(&formation.competitors, formation.reference_date(), config).await?;

    let mut request = formation.request();
    if let Some(entrants) = entrants {
        request = request.with_entrants(entrants);
    }

    let report = if dry_run {
        service.check_feasibility(&request).await
    } else {
        service.run_draw(&request).await
    }
    .with_context(|| format!("Draw for {} failed", request.category))?;

    tracing::info!(
        "✓ {} trio(s) formed in {} attempt(s)",
        report.trios.len(),
        report.attempts
    );
    print_json(&report)
}

async fn handle_seed(formation: FormationArgs, seeds: Vec<Uuid>, config: &FormationConfig) -> Result<()> {
    let service = formation_service(&formation.competitors, formation.reference_date(), config).await?;
    let request = formation.request();

    let report = service
        .run_seeding(&request, &seeds)
        .await
        .with_context(|| format!("Seeding for {} failed", request.category))?;

    tracing::info!("✓ {} trio(s) formed around {} seed(s)", report.trios.len(), seeds.len());
    print_json(&report)
}

#[derive(Serialize)]
struct CandidateReport<'a> {
    category: &'a str,
    members: &'a [Uuid],
    validation: engine::Validation,
}

async fn handle_validate(
    competitors: PathBuf,
    category: String,
    members: Vec<Uuid>,
    date: Option<NaiveDate>,
    config: &FormationConfig,
) -> Result<()> {
    if members.len() != TRIO_SIZE {
        tracing::warn!("{} member(s) given, a trio has {}", members.len(), TRIO_SIZE);
    }

    let on = date.unwrap_or_else(today);
    let service = formation_service(&competitors, on, config).await?;
    let validation = service.validate_candidate(&category, &members, on).await?;

    if validation.is_valid() {
        tracing::info!("✓ Valid {} trio", category);
    } else {
        tracing::warn!("✗ Not a valid {} trio", category);
    }

    print_json(&CandidateReport {
        category: &category,
        members: &members,
        validation,
    })
}

async fn handle_score(event: PathBuf, config: &FormationConfig) -> Result<()> {
    let prova = snapshot::load_prova(&event).await?;

    let trios = InMemoryTrioStore::new();
    trios.commit(prova.prova_id, &prova.trios).await?;
    let results = InMemoryResults::new();
    results.insert(prova.prova_id, prova.results.clone()).await;

    let service = ScoringService::new(trios, results, InMemoryScoreStore::default(), config);
    let records = service
        .score_event(&prova)
        .await
        .with_context(|| format!("Scoring '{}' failed", prova.name))?;

    print_json(&records)
}

async fn handle_rank(
    scores: PathBuf,
    category: Option<String>,
    year: Option<i32>,
    limit: Option<usize>,
    config: &FormationConfig,
) -> Result<()> {
    let records = snapshot::load_scores(&scores).await?;
    let filter = RankingFilter {
        category: category.as_deref().map(str::parse).transpose()?,
        period: period(year)?,
        limit,
    };

    let sink = CollectingRankingSink::new();
    scoring_service(records, config)
        .publish_ranking(&filter, &sink)
        .await?;

    for ranking in sink.published().await {
        print_json(&ranking)?;
    }
    Ok(())
}

async fn handle_champions(
    scores: PathBuf,
    competitors: PathBuf,
    year: Option<i32>,
    config: &FormationConfig,
) -> Result<()> {
    let records = snapshot::load_scores(&scores).await?;
    let competitors = snapshot::load_competitors(&competitors, today()).await?;

    let champions = scoring_service(records, config)
        .champions(&competitors, period(year)?)
        .await?;

    tracing::info!("✓ {} handicap level(s) have a champion", champions.len());
    print_json(&champions)
}

async fn handle_stats(
    scores: PathBuf,
    competitor: Uuid,
    year: Option<i32>,
    config: &FormationConfig,
) -> Result<()> {
    let records = snapshot::load_scores(&scores).await?;
    let stats = scoring_service(records, config)
        .stats(competitor, period(year)?)
        .await?
        .ok_or_else(|| anyhow!("No score records for competitor {}", competitor))?;

    print_json(&stats)
}
