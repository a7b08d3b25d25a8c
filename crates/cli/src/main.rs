use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;

use catalog::{Genre, MovieId, UserId};
use engine::{EngineConfig, Explanation, RecommendOptions, Recommendation, RecommenderService};
use signals::LatentFactors;

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// ReelSense - Hybrid Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reelsense")]
#[command(about = "Hybrid movie recommendations from CF, content, latent and novelty signals", long_about = None)]
struct Cli {
    /// Path to MovieLens dataset directory (movies.csv, ratings.csv, tags.csv)
    #[arg(short, long, default_value = "data/ml-latest-small")]
    data_dir: PathBuf,

    /// Path to an engine configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a trained latent-factor model (JSON); falls back to a
    /// bias baseline when absent
    #[arg(short, long)]
    factors: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movie recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Show the per-signal score breakdown for each recommendation
        #[arg(long)]
        explain: bool,

        /// Skip genre-diversity re-ranking
        #[arg(long)]
        no_diversify: bool,

        /// Keep movies the user has already rated
        #[arg(long)]
        include_rated: bool,
    },

    /// Explain why a movie scores the way it does for a user
    Explain {
        /// User ID
        #[arg(long)]
        user_id: UserId,

        /// Movie ID to explain
        #[arg(long)]
        movie_id: MovieId,
    },

    /// Find movies similar to a given one by content
    Similar {
        /// Movie ID to find neighbors for
        #[arg(long)]
        movie_id: MovieId,

        /// Number of similar movies to return
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Record a rating and show the refreshed top list
    Rate {
        /// User ID
        #[arg(long)]
        user_id: UserId,

        /// Movie ID being rated
        #[arg(long)]
        movie_id: MovieId,

        /// Rating value on the half-star scale, 0.5 to 5.0
        #[arg(long)]
        value: f32,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,

        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show engine status and dataset statistics
    Stats,

    /// Run benchmark to test recommendation latency
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load data and fit the engine (this may take a moment)
    println!(
        "Loading MovieLens dataset from {}...",
        cli.data_dir.display()
    );
    let start = Instant::now();
    let service = build_service(&cli).context("Failed to build recommendation engine")?;
    println!("{} Engine fitted in {:?}", "✓".green(), start.elapsed());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            explain,
            no_diversify,
            include_rated,
        } => handle_recommend(&service, user_id, limit, explain, no_diversify, include_rated)?,
        Commands::Explain { user_id, movie_id } => handle_explain(&service, user_id, movie_id)?,
        Commands::Similar { movie_id, limit } => handle_similar(&service, movie_id, limit)?,
        Commands::Rate {
            user_id,
            movie_id,
            value,
        } => handle_rate(&service, user_id, movie_id, value)?,
        Commands::Search { title, limit } => handle_search(&service, title, limit)?,
        Commands::Stats => handle_stats(&service),
        Commands::Benchmark { requests } => handle_benchmark(&service, requests)?,
    }

    Ok(())
}

/// Parse the dataset, load or derive latent factors, and fit the engine.
fn build_service(cli: &Cli) -> Result<RecommenderService> {
    let movies = catalog::parser::parse_movies(&cli.data_dir.join("movies.csv"))
        .context("Failed to parse movies.csv")?;
    let ratings = catalog::parser::parse_ratings(&cli.data_dir.join("ratings.csv"))
        .context("Failed to parse ratings.csv")?;
    // Tags are optional; a missing file yields an empty map.
    let tags = catalog::parser::parse_tags(&cli.data_dir.join("tags.csv"))
        .context("Failed to parse tags.csv")?;

    let latent = match &cli.factors {
        Some(path) => LatentFactors::from_file(path)
            .with_context(|| format!("Failed to load latent factors from {}", path.display()))?,
        None => {
            tracing::info!("no factor file given, using rating-bias baseline");
            LatentFactors::bias_baseline(&ratings)
        }
    };

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let mut service = RecommenderService::new(config);
    service.fit(movies, ratings, tags, latent)?;
    Ok(service)
}

/// Handle the 'recommend' command
fn handle_recommend(
    service: &RecommenderService,
    user_id: UserId,
    limit: usize,
    explain: bool,
    no_diversify: bool,
    include_rated: bool,
) -> Result<()> {
    let options = RecommendOptions {
        exclude_rated: !include_rated,
        diversify: !no_diversify,
        explain,
    };
    let recommendations = service.recommend(user_id, limit, options)?;
    if recommendations.is_empty() {
        println!("No recommendations available for user {}", user_id);
        return Ok(());
    }

    print_recommendations(&recommendations, explain);
    Ok(())
}

/// Handle the 'explain' command
fn handle_explain(service: &RecommenderService, user_id: UserId, movie_id: MovieId) -> Result<()> {
    let (rec, explanation) = service
        .explain(user_id, movie_id)?
        .ok_or_else(|| anyhow!("Movie {} not found", movie_id))?;

    println!(
        "{}",
        format!("Why '{}' for user {}:", rec.title, user_id)
            .bold()
            .blue()
    );
    println!("Overall score: {:.4}", rec.score);
    print_explanation(&explanation);
    Ok(())
}

fn print_explanation(explanation: &Explanation) {
    println!(
        "Primary reason: {}",
        explanation.dominant_signal.label().bold()
    );
    println!("\"{}\"", explanation.rationale.italic());
    println!("Signal contributions:");
    for (signal, contribution) in &explanation.contributions {
        println!("  {} {}: {:.4}", "•".cyan(), signal.label(), contribution);
    }
}

/// Handle the 'similar' command
fn handle_similar(service: &RecommenderService, movie_id: MovieId, limit: usize) -> Result<()> {
    let anchor = service
        .movie_info(movie_id)?
        .ok_or_else(|| anyhow!("Movie {} not found", movie_id))?;
    let similar = service.similar_movies(movie_id, limit)?;

    println!(
        "{}",
        format!("Movies similar to '{}':", anchor.title).bold().blue()
    );
    if similar.is_empty() {
        println!("No content neighbors found");
        return Ok(());
    }
    for (rank, (movie, score)) in similar.iter().enumerate() {
        println!(
            "{}. {} [{}] - similarity {:.3}",
            (rank + 1).to_string().green(),
            movie.title,
            format_genres(&movie.genres),
            score
        );
    }
    Ok(())
}

/// Handle the 'rate' command
fn handle_rate(
    service: &RecommenderService,
    user_id: UserId,
    movie_id: MovieId,
    value: f32,
) -> Result<()> {
    let movie = service
        .movie_info(movie_id)?
        .ok_or_else(|| anyhow!("Movie {} not found", movie_id))?;

    service.add_rating(user_id, movie_id, value)?;
    println!(
        "{} Recorded {:.1} for '{}' from user {}",
        "✓".green(),
        value,
        movie.title,
        user_id
    );

    // The new rating shapes the liked-set immediately; show the effect.
    let refreshed = service.recommend(user_id, 5, RecommendOptions::default())?;
    if !refreshed.is_empty() {
        println!("\nRefreshed top picks:");
        print_recommendations(&refreshed, false);
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(service: &RecommenderService, title: String, limit: usize) -> Result<()> {
    let matches = service.search(&title, limit)?;

    println!(
        "{}",
        format!("Search results for '{}':", title).bold().blue()
    );
    if matches.is_empty() {
        println!("No movies matched");
        return Ok(());
    }
    for movie in &matches {
        let year = movie
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "????".to_string());
        println!(
            "{}: {} ({}) [{}]",
            movie.id,
            movie.title,
            year,
            format_genres(&movie.genres)
        );
    }
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(service: &RecommenderService) {
    let stats = service.stats();
    println!("{}", "Engine status:".bold().blue());
    println!("{}Fitted: {}", "• ".green(), stats.fitted);
    println!("{}Movies: {}", "• ".green(), stats.movie_count);
    println!("{}Ratings: {}", "• ".green(), stats.rating_count);
    println!("{}Users: {}", "• ".green(), stats.user_count);
    println!(
        "{}Weights: cf={} content={} latent={} novelty={}",
        "• ".cyan(),
        stats.weights.cf,
        stats.weights.content,
        stats.weights.latent,
        stats.weights.novelty
    );
}

/// Handle the 'benchmark' command
fn handle_benchmark(service: &RecommenderService, requests: usize) -> Result<()> {
    if requests == 0 {
        println!("Nothing to benchmark: --requests is 0");
        return Ok(());
    }
    let user_count = service.stats().user_count.max(1) as u32;

    // Sample random known user IDs for a realistic mix of histories.
    let user_ids: Vec<UserId> = (0..requests)
        .map(|_| rand::random::<u32>() % user_count + 1)
        .collect();

    let mut timings = Vec::with_capacity(requests);
    let wall_clock = Instant::now();
    for user_id in user_ids {
        let start = Instant::now();
        service.recommend(user_id, 10, RecommendOptions::default())?;
        timings.push(start.elapsed());
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let avg_latency = total_time / (timings.len() as u32);
    let p50 = percentile(&timings, 0.50).unwrap_or_default();
    let p95 = percentile(&timings, 0.95).unwrap_or_default();
    let p99 = percentile(&timings, 0.99).unwrap_or_default();
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("Benchmark results:");
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", p50);
    println!("P95 latency: {:?}", p95);
    println!("P99 latency: {:?}", p99);
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[Recommendation], explain: bool) {
    println!("{}", "Movie Recommendations:".bold().blue());
    for (rank, rec) in recommendations.iter().enumerate() {
        let year = rec
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "????".to_string());
        println!(
            "{}. {} ({}) [{}] - Score: {:.4}",
            (rank + 1).to_string().green(),
            rec.title,
            year,
            format_genres(&rec.genres),
            rec.score
        );
        if explain {
            if let Some(b) = &rec.breakdown {
                println!(
                    "   cf {:.3}x{:.2} | content {:.3}x{:.2} | latent {:.3}x{:.2} | novelty {:.3}x{:.2}",
                    b.cf_score,
                    b.cf_weight,
                    b.content_score,
                    b.content_weight,
                    b.latent_score,
                    b.latent_weight,
                    b.novelty_score,
                    b.novelty_weight
                );
            }
        }
    }
}

/// Latency at the given fraction of a sorted sample set.
///
/// Returns `None` for an empty sample set rather than indexing past the end.
fn percentile(sorted: &[Duration], fraction: f32) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }
    let index = ((sorted.len() as f32 * fraction) as usize).min(sorted.len() - 1);
    Some(sorted[index])
}

fn format_genres(genres: &[Genre]) -> String {
    if genres.is_empty() {
        return "no genres listed".to_string();
    }
    genres
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_of_empty_samples_is_none() {
        assert_eq!(percentile(&[], 0.50), None);
        assert_eq!(percentile(&[], 0.99), None);
    }

    #[test]
    fn test_percentile_single_sample() {
        let samples = [Duration::from_millis(7)];
        assert_eq!(percentile(&samples, 0.50), Some(samples[0]));
        assert_eq!(percentile(&samples, 0.99), Some(samples[0]));
    }

    #[test]
    fn test_percentile_stays_in_bounds() {
        let samples: Vec<Duration> = (1..=100).map(Duration::from_millis).collect();
        assert_eq!(percentile(&samples, 0.50), Some(Duration::from_millis(51)));
        assert_eq!(percentile(&samples, 0.99), Some(Duration::from_millis(100)));
        assert_eq!(percentile(&samples, 1.0), Some(Duration::from_millis(100)));
    }
}
