use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{Catalog, DietLabel, RecipeId, UserId};
use engine::{EngineConfig, RecommendationEngine, RecommendationRequest};
use pipeline::{NutritionPolicy, Recommendation};
use rand::Rng;
use scorers::user_context::build_user_context;
use scorers::{Outcome, ScorerKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// diet-recs - Calorie-aware recipe recommendations
#[derive(Parser)]
#[command(name = "diet-recs")]
#[command(about = "Recipe recommendations filtered by calorie budget and diet labels", long_about = None)]
struct Cli {
    /// Directory holding recipes.csv, users.csv and ratings.csv
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Load the catalog from a JSON snapshot instead of the CSV files
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Engine configuration (JSON); missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    Popularity,
    Content,
    Collaborative,
    Hybrid,
}

impl From<Strategy> for ScorerKind {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Popularity => ScorerKind::Popularity,
            Strategy::Content => ScorerKind::Content,
            Strategy::Collaborative => ScorerKind::Collaborative,
            Strategy::Hybrid => ScorerKind::Hybrid,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get recipe recommendations
    Recommend {
        /// User to recommend for (optional for popularity)
        #[arg(long)]
        user_id: Option<UserId>,

        #[arg(long, value_enum, default_value = "hybrid")]
        strategy: Strategy,

        /// Number of recommendations to return
        #[arg(long)]
        limit: Option<usize>,

        /// Per-meal calorie ceiling; defaults to the user's daily budget / meals per day
        #[arg(long)]
        max_calories: Option<f64>,

        /// Keep the first N recipes instead of balancing across diet labels
        #[arg(long)]
        simple: bool,

        /// Recipes allowed per diet label when balancing
        #[arg(long)]
        per_label: Option<usize>,

        /// Recipe ids to leave out (comma separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<RecipeId>,

        /// Leave out recipes the user has already rated
        #[arg(long)]
        exclude_rated: bool,

        /// Hybrid sources, most significant first (comma separated)
        #[arg(long, value_enum, value_delimiter = ',')]
        sources: Vec<Strategy>,

        /// Show provenance and diet labels for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Show a user's budget and rating history
    User {
        #[arg(long)]
        user_id: UserId,
    },

    /// Search for recipes by name
    Search {
        /// Case-insensitive substring of the recipe name
        #[arg(long)]
        name: String,
    },

    /// Show the global popularity ranking
    Popular {
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Write the loaded catalog to a JSON snapshot
    Snapshot {
        #[arg(long)]
        output: PathBuf,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,

        #[arg(long, value_enum, default_value = "hybrid")]
        strategy: Strategy,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let start = Instant::now();
    let engine = Arc::new(load_engine(&cli, config)?);
    println!("{} Engine ready in {:?}", "✓".green(), start.elapsed());

    match cli.command {
        Commands::Recommend {
            user_id,
            strategy,
            limit,
            max_calories,
            simple,
            per_label,
            exclude,
            exclude_rated,
            sources,
            explain,
        } => {
            let mut request = RecommendationRequest::new(
                strategy.into(),
                limit.unwrap_or(engine.config().default_top_n),
            )
            .with_policy(choose_policy(engine.config(), simple, per_label))
            .excluding(exclude)
            .exclude_rated(exclude_rated);
            if let Some(user_id) = user_id {
                request = request.for_user(user_id);
            }
            if let Some(ceiling) = max_calories {
                request = request.with_calorie_ceiling(ceiling);
            }
            if !sources.is_empty() {
                request = request.with_hybrid_sources(sources.into_iter().map(Into::into).collect());
            }
            handle_recommend(&engine, &request, explain)?
        }
        Commands::User { user_id } => handle_user(engine.catalog(), &engine, user_id)?,
        Commands::Search { name } => handle_search(engine.catalog(), &name),
        Commands::Popular { limit } => handle_popular(&engine, limit),
        Commands::Snapshot { output } => handle_snapshot(&engine, &output)?,
        Commands::Benchmark {
            requests,
            concurrent,
            strategy,
        } => handle_benchmark(engine, requests, concurrent, strategy.into()).await?,
    }

    Ok(())
}

fn load_engine(cli: &Cli, config: EngineConfig) -> Result<RecommendationEngine> {
    if let Some(path) = &cli.snapshot {
        println!("Loading snapshot {}...", path.display());
        return RecommendationEngine::load_snapshot(path, config)
            .with_context(|| format!("Failed to load snapshot {}", path.display()));
    }

    println!("Loading recipe dataset from {}...", cli.data_dir.display());
    let catalog = Catalog::load_from_files(&cli.data_dir).context("Failed to load recipe dataset")?;
    RecommendationEngine::new(Arc::new(catalog), config).context("Failed to build engine")
}

fn choose_policy(config: &EngineConfig, simple: bool, per_label: Option<usize>) -> NutritionPolicy {
    match (simple, per_label) {
        (true, _) => NutritionPolicy::Simple,
        (false, Some(per_label)) => NutritionPolicy::Quota { per_label },
        (false, None) => config.default_policy,
    }
}

/// Handle the 'recommend' command
fn handle_recommend(engine: &RecommendationEngine, request: &RecommendationRequest, explain: bool) -> Result<()> {
    let outcome = engine
        .recommend(request)
        .context("Recommendation request failed")?;

    match outcome {
        Outcome::Ranked(recommendations) if recommendations.is_empty() => {
            println!("{}", "No recipes fit this request.".yellow());
        }
        Outcome::Ranked(recommendations) => print_recommendations(&recommendations, explain),
        Outcome::UserNotFound => {
            let user = request.user_id.map(|id| id.to_string()).unwrap_or_default();
            println!("{}", format!("User {} not found.", user).red());
        }
        Outcome::NoSignal => {
            println!(
                "{}",
                format!(
                    "Not enough rating history for {} recommendations; try --strategy popularity.",
                    request.strategy
                )
                .yellow()
            );
        }
    }
    Ok(())
}

/// Handle the 'user' command
fn handle_user(catalog: &Catalog, engine: &RecommendationEngine, user_id: UserId) -> Result<()> {
    let context = build_user_context(catalog, user_id, engine.config().meals_per_day)
        .with_context(|| format!("Failed to load user {}", user_id))?;
    let interactions = catalog.get_user_interactions(user_id);

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    match context.calories_per_day {
        Some(budget) => println!("{}Daily budget: {:.0} kcal", "• ".green(), budget),
        None => println!("{}Daily budget: not set", "• ".green()),
    }
    if let Some(ceiling) = context.calorie_ceiling {
        println!("{}Per-meal ceiling: {:.0} kcal", "• ".green(), ceiling);
    }

    println!("{}Number of ratings: {}", "• ".cyan(), interactions.len());
    println!("{}Distinct recipes rated: {}", "• ".cyan(), context.rated_recipes.len());
    println!("{}Average rating: {:.2}", "• ".cyan(), context.avg_rating);

    let mut top_rated: Vec<_> = interactions.iter().collect();
    top_rated.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    println!("Top rated recipes:");
    for interaction in top_rated.iter().take(5) {
        if let Some(recipe) = catalog.get_recipe(interaction.recipe_id) {
            println!("  - {} (Rating: {})", recipe.name, interaction.rating);
        }
    }

    // Average rating per diet label
    let mut label_ratings: HashMap<DietLabel, (f64, u32)> = HashMap::new();
    for interaction in interactions {
        let Some(recipe) = catalog.get_recipe(interaction.recipe_id) else {
            continue;
        };
        for label in recipe.diet_labels.iter().filter_map(|tag| DietLabel::from_tag(tag)) {
            let entry = label_ratings.entry(label).or_insert((0.0, 0));
            entry.0 += interaction.rating;
            entry.1 += 1;
        }
    }
    println!("Diet label preferences:");
    for label in DietLabel::ALL {
        if let Some(&(total, n)) = label_ratings.get(&label) {
            println!("  - {}: Average Rating: {:.2} ({} ratings)", label, total / n as f64, n);
        }
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(catalog: &Catalog, name: &str) {
    let needle = name.to_lowercase();
    let mut matches = catalog.search_by_name(name);

    // Exact matches first, then by average rating
    let avg = |id: RecipeId| catalog.get_recipe_stats(id).map(|s| s.avg_rating).unwrap_or(0.0);
    matches.sort_by(|a, b| {
        let a_exact = a.name.to_lowercase() != needle;
        let b_exact = b.name.to_lowercase() != needle;
        a_exact.cmp(&b_exact).then_with(|| avg(b.id).total_cmp(&avg(a.id)))
    });

    println!("{}", format!("Search results for '{}':", name).bold().blue());
    for recipe in matches.iter().take(20) {
        let count = catalog.get_recipe_stats(recipe.id).map(|s| s.rating_count).unwrap_or(0);
        println!(
            "{}: {} [{}] {:.0} kcal, avg {:.2} ({} ratings)",
            recipe.id,
            recipe.name,
            recipe.diet_labels.join(", "),
            recipe.calories,
            avg(recipe.id),
            count
        );
    }
}

/// Handle the 'popular' command
fn handle_popular(engine: &RecommendationEngine, limit: usize) {
    let catalog = engine.catalog();
    println!("{}", "Most popular recipes:".bold().blue());
    for (rank, candidate) in engine.rank_popular().iter().take(limit).enumerate() {
        let name = catalog
            .get_recipe(candidate.recipe_id)
            .map(|r| r.name.as_str())
            .unwrap_or("<unknown>");
        println!(
            "{}. {} - Score: {:.1}",
            (rank + 1).to_string().green(),
            name,
            candidate.score
        );
    }
}

/// Handle the 'snapshot' command
fn handle_snapshot(engine: &RecommendationEngine, output: &Path) -> Result<()> {
    engine
        .save_snapshot(output)
        .with_context(|| format!("Failed to write snapshot {}", output.display()))?;
    println!("{} Snapshot written to {}", "✓".green(), output.display());
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: Arc<RecommendationEngine>,
    requests: usize,
    concurrent: usize,
    strategy: ScorerKind,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }

    // Sample users from the catalog
    let users = engine.catalog().users();
    if users.is_empty() {
        bail!("Catalog has no users to benchmark with");
    }
    let mut rng = rand::rng();
    let user_ids: Vec<UserId> = (0..requests)
        .map(|_| users[rng.random_range(0..users.len())].id)
        .collect();

    let limit = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();

    let mut handles = Vec::with_capacity(requests);
    for user_id in user_ids {
        let engine = engine.clone();
        let limit = limit.clone();
        handles.push(tokio::spawn(async move {
            let _permit = limit.acquire_owned().await?;
            tokio::task::spawn_blocking(move || {
                let request = RecommendationRequest::new(strategy, engine.config().default_top_n)
                    .for_user(user_id)
                    .with_policy(engine.config().default_policy);
                let start = Instant::now();
                engine.recommend(&request)?;
                Ok::<_, anyhow::Error>(start.elapsed())
            })
            .await?
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = wall_clock.elapsed();

    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    let throughput = requests as f64 / wall_time.as_secs_f64();

    info!("Benchmark finished: {} {} requests", requests, strategy);
    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Format and print recommendations
fn print_recommendations(recommendations: &[Recommendation], explain: bool) {
    println!("{}", "Recipe Recommendations:".bold().blue());
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} ({:.0} kcal) - Score: {:.3}",
            (i + 1).to_string().green(),
            rec.name,
            rec.calories,
            rec.score
        );
        if explain {
            println!(
                "   Source: {}, labels: [{}], recipe id {}",
                rec.provenance,
                rec.diet_labels.join(", "),
                rec.recipe_id
            );
        }
    }
}
