use crate::data::{BuiltTables, DataDir};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cobuy_interactions::{CoOccurrenceTable, LiftTable};
use cobuy_recommender::{
    CancellationToken, Catalog, Recommendation, RecommendationStore, Recommender,
    RecommenderConfig,
};
use cobuy_similarity_index::{SignalStatus, TimeoutConfig};
use log::{info, warn};
use owo_colors::{OwoColorize, Stream};
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "cobuy",
    version,
    about = "Customers-also-bought recommendations from purchase lift and product similarity"
)]
pub struct CobuyCli {
    /// Directory holding products.json, interactions.json and derived files
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        env = "COBUY_DATA_DIR",
        default_value = "data"
    )]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: CobuyCommand,
}

#[derive(Debug, Subcommand)]
pub enum CobuyCommand {
    /// Build co-occurrence and lift tables from the interaction log
    Build,

    /// Show recommendations for one product
    Recommend(RecommendArgs),

    /// Compute recommendations for the whole catalog and store them
    Batch(BatchArgs),

    /// Show what the data directory currently holds
    Status,
}

#[derive(Debug, Parser)]
pub struct RecommendArgs {
    /// Product id to recommend for
    #[arg(value_name = "PRODUCT_ID")]
    pub product_id: String,

    /// Ignore stored results and compute from current data
    #[arg(long)]
    pub fresh: bool,

    /// Print the recommendation as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub scoring: ScoringArgs,
}

#[derive(Debug, Parser)]
pub struct BatchArgs {
    #[command(flatten)]
    pub scoring: ScoringArgs,
}

/// Recommender settings; flags override the config file
#[derive(Debug, Args)]
pub struct ScoringArgs {
    /// TOML file with recommender settings
    #[arg(long, value_name = "PATH", env = "COBUY_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "COLLABORATIVE_WEIGHT")]
    pub collaborative_weight: Option<f64>,

    #[arg(long, env = "CONTENT_WEIGHT")]
    pub content_weight: Option<f64>,

    #[arg(long, env = "ENRICHMENT_WEIGHT")]
    pub enrichment_weight: Option<f64>,

    /// Recommendations per product
    #[arg(long = "top-n", env = "TOP_N_RECOMMENDATIONS")]
    pub top_n: Option<usize>,

    /// Collaborative and content candidates per product
    #[arg(long = "top-k", env = "TOP_K_SIMILAR")]
    pub top_k: Option<usize>,

    /// Neighbors per collaborative candidate
    #[arg(long = "top-m", env = "TOP_M_ENRICHMENT")]
    pub top_m: Option<usize>,

    /// Products computed concurrently during a batch run
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Keep candidates that are missing from the catalog
    #[arg(long)]
    pub keep_unknown: bool,

    /// Per-query similarity timeout in milliseconds
    #[arg(long, env = "SIMILARITY_TIMEOUT_MS", default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Retries after a failed or timed out similarity query
    #[arg(long, default_value_t = 1)]
    pub retries: u32,
}

impl ScoringArgs {
    /// Whether any setting that changes scores or list length was given
    pub fn has_overrides(&self) -> bool {
        self.config.is_some()
            || self.collaborative_weight.is_some()
            || self.content_weight.is_some()
            || self.enrichment_weight.is_some()
            || self.top_n.is_some()
            || self.top_k.is_some()
            || self.top_m.is_some()
            || self.keep_unknown
    }

    pub fn recommender_config(&self) -> Result<RecommenderConfig> {
        let mut config = match &self.config {
            Some(path) => RecommenderConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => RecommenderConfig::default(),
        };

        if let Some(weight) = self.collaborative_weight {
            config.collaborative_weight = weight;
        }
        if let Some(weight) = self.content_weight {
            config.content_weight = weight;
        }
        if let Some(weight) = self.enrichment_weight {
            config.enrichment_weight = weight;
        }
        if let Some(n) = self.top_n {
            config.top_n_recommendations = n;
        }
        if let Some(k) = self.top_k {
            config.top_k_candidates = k;
        }
        if let Some(m) = self.top_m {
            config.top_m_enrichment = m;
        }
        if let Some(max) = self.max_concurrent {
            config.max_concurrent = max;
        }
        if self.keep_unknown {
            config.drop_unknown_candidates = false;
        }

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
        Ok(config)
    }

    pub fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig {
            timeout_ms: self.timeout_ms,
            retries: self.retries,
        }
    }
}

impl CobuyCli {
    pub async fn run(self) -> Result<()> {
        let data = DataDir::new(self.data_dir);
        match self.command {
            CobuyCommand::Build => run_build(&data),
            CobuyCommand::Recommend(args) => run_recommend(&data, args).await,
            CobuyCommand::Batch(args) => run_batch(&data, args).await,
            CobuyCommand::Status => run_status(&data).await,
        }
    }
}

fn highlight<T: Display>(value: T) -> String {
    value
        .if_supports_color(Stream::Stdout, |v| v.bright_cyan())
        .to_string()
}

fn ok_mark() -> String {
    "✓".if_supports_color(Stream::Stdout, |v| v.bright_green())
        .to_string()
}

fn fail_mark() -> String {
    "✗".if_supports_color(Stream::Stdout, |v| v.bright_red())
        .to_string()
}

fn step_mark() -> String {
    "▶".if_supports_color(Stream::Stdout, |v| v.bright_blue())
        .to_string()
}

async fn build_recommender(
    data: &DataDir,
    scoring: &ScoringArgs,
    co_occurrence: CoOccurrenceTable,
    lift: LiftTable,
) -> Result<Recommender> {
    let config = scoring.recommender_config()?;
    let catalog = data.load_catalog()?;
    let loaded = data.load_index(scoring.timeout_config()).await?;
    info!("Similarity source: {}", loaded.source);

    Recommender::new(catalog, co_occurrence, lift, loaded.index, config)
        .context("Failed to create recommender")
}

fn run_build(data: &DataDir) -> Result<()> {
    println!(
        "{} Building interaction tables in {}",
        step_mark(),
        data.root().display()
    );

    let BuiltTables {
        interactions,
        co_occurrence,
        lift,
    } = data.rebuild_tables()?;

    println!("{} Tables built", ok_mark());
    println!("  Interactions: {}", highlight(interactions));
    println!("  Users: {}", highlight(lift.total_users));
    println!("  Co-occurring pairs: {}", highlight(co_occurrence.pair_count()));
    println!("  Lift rows: {}", highlight(lift.len()));

    Ok(())
}

async fn run_recommend(data: &DataDir, args: RecommendArgs) -> Result<()> {
    // Stored lists were scored with the batch's settings
    if !args.fresh && !args.scoring.has_overrides() {
        let store = data.load_store()?;
        if let Some(recommendation) = store.recommendation(&args.product_id) {
            info!("Serving stored recommendations for {}", args.product_id);
            let catalog = data.load_catalog().ok();
            return print_recommendation(recommendation, catalog.as_ref(), "stored", args.json);
        }
    } else if !args.fresh {
        info!("Scoring settings given, computing {} fresh", args.product_id);
    }

    let (co_occurrence, lift) = data.load_tables()?;
    let recommender = build_recommender(data, &args.scoring, co_occurrence, lift).await?;
    let recommendation = recommender
        .recommend_for(&args.product_id)
        .await
        .with_context(|| format!("Failed to recommend for {}", args.product_id))?;

    print_recommendation(
        &recommendation,
        Some(recommender.catalog()),
        "computed",
        args.json,
    )
}

fn print_recommendation(
    recommendation: &Recommendation,
    catalog: Option<&Catalog>,
    origin: &str,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(recommendation)?);
        return Ok(());
    }

    let title = |id: &str| {
        catalog
            .and_then(|c| c.get(id))
            .map(|p| p.title.clone())
            .unwrap_or_default()
    };

    println!(
        "{} Recommendations for {} {} ({origin})",
        step_mark(),
        highlight(&recommendation.target_product_id),
        title(&recommendation.target_product_id)
    );

    if recommendation.is_empty() {
        println!("{} No recommendations", fail_mark());
        if let SignalStatus::UpstreamError { detail } = &recommendation.stats.content_signal {
            println!("  Similarity index error: {detail}");
        }
        return Ok(());
    }

    for (i, entry) in recommendation.recommendations.iter().enumerate() {
        println!(
            "{}. {} {} score {:.4}",
            i + 1,
            highlight(&entry.product_id),
            title(&entry.product_id),
            entry.final_score
        );
        println!(
            "   lift {:.4} ({} co-buyers)  content {:.4}  enrichment {:.4}",
            entry.components.collaborative_score,
            entry.components.collaborative_interactions,
            entry.components.content_score,
            entry.components.enrichment_score
        );
    }

    let stats = &recommendation.stats;
    println!(
        "  Candidates: {} collaborative, {} content, {} enrichment, {} scored",
        stats.collaborative_candidates,
        stats.content_candidates,
        stats.enrichment_candidates,
        stats.total_candidates
    );

    Ok(())
}

async fn run_batch(data: &DataDir, args: BatchArgs) -> Result<()> {
    // Validate settings before touching the saved tables
    args.scoring.recommender_config()?;
    let tables = data.rebuild_tables()?;
    info!(
        "Rebuilt tables from {} interactions ({} lift rows)",
        tables.interactions,
        tables.lift.len()
    );
    let recommender =
        build_recommender(data, &args.scoring, tables.co_occurrence, tables.lift).await?;

    println!(
        "{} Computing recommendations for {} products",
        step_mark(),
        highlight(recommender.catalog().len())
    );

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing products already started");
                cancel.cancel();
            }
        })
    };

    let batch = recommender.recommend_all_with_cancel(cancel).await;
    watcher.abort();

    let store = RecommendationStore::from_batch(&batch);
    store
        .save(&data.recommendations())
        .context("Failed to save recommendations")?;

    let summary = batch.summary;
    if summary.cancelled {
        println!(
            "{} Cancelled, {} products skipped",
            fail_mark(),
            highlight(summary.skipped)
        );
    } else {
        println!("{} Batch complete", ok_mark());
    }
    println!("  Attempted: {}", highlight(summary.attempted));
    println!("  Succeeded: {}", highlight(summary.succeeded));
    println!("  Failed: {}", highlight(summary.failed));
    for id in batch.failed_ids() {
        println!("    {} {id}", fail_mark());
    }
    println!("  Saved to {}", data.recommendations().display());

    Ok(())
}

async fn run_status(data: &DataDir) -> Result<()> {
    println!("{} Data directory {}", step_mark(), data.root().display());

    if data.products().exists() {
        let catalog = data.load_catalog()?;
        println!("  Products: {}", highlight(catalog.len()));
    } else {
        println!("  Products: {} missing {}", fail_mark(), data.products().display());
    }

    if data.interactions().exists() {
        let log = data.load_interactions()?;
        println!("  Interactions: {}", highlight(log.len()));
    } else {
        println!(
            "  Interactions: {} missing {}",
            fail_mark(),
            data.interactions().display()
        );
    }

    if data.co_occurrence().exists() && data.lift_scores().exists() {
        let (co_occurrence, lift) = data.load_tables()?;
        println!("  Co-occurrence rows: {}", highlight(co_occurrence.len()));
        println!("  Lift rows: {}", highlight(lift.len()));
    } else {
        println!("  Tables: not built (run 'cobuy build')");
    }

    let loaded = data.load_index(TimeoutConfig::default()).await?;
    println!("  Similarity index: {}", loaded.source);

    let store = data.load_store()?;
    if store.is_empty() {
        println!("  Stored recommendations: none (run 'cobuy batch')");
    } else {
        println!(
            "  Stored recommendations: {} ({} failed)",
            highlight(store.len()),
            store.failed_count()
        );
        if let Some(generated_at) = store.generated_at {
            println!("  Generated at: {}", generated_at.to_rfc3339());
        }
    }

    Ok(())
}
