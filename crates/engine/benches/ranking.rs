//! Benchmarks for hybrid scoring and ranking.
//!
//! Run with: cargo bench --package engine
//!
//! Uses a synthetic world of 2,000 movies and 500 users so timings do
//! not depend on dataset files being present.

use std::collections::HashMap;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use catalog::{Genre, Movie, MovieId, Rating};
use engine::{EngineConfig, RecommendOptions, RecommenderService};
use signals::LatentFactors;

const MOVIE_COUNT: u32 = 2_000;
const USER_COUNT: u32 = 500;

fn synthetic_service() -> RecommenderService {
    let genre_pool = [
        Genre::Action,
        Genre::Comedy,
        Genre::Drama,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
        Genre::Horror,
        Genre::Documentary,
    ];

    let movies: Vec<Movie> = (1..=MOVIE_COUNT)
        .map(|id| Movie {
            id,
            title: format!("Movie {id}"),
            year: Some(1980 + (id % 40) as u16),
            genres: vec![
                genre_pool[(id % 8) as usize],
                genre_pool[((id / 8) % 8) as usize],
            ],
        })
        .collect();

    // Deterministic rating pattern: each user rates ~40 movies on a
    // half-star grid skewed by a simple hash of the pair.
    let mut ratings = Vec::new();
    let mut ts = 0i64;
    for user in 1..=USER_COUNT {
        for slot in 0..40u32 {
            let movie: MovieId = (user.wrapping_mul(53).wrapping_add(slot * 97)) % MOVIE_COUNT + 1;
            let value = 0.5 + 0.5 * ((user.wrapping_add(movie * 31) % 10) as f32);
            ratings.push(Rating::new(user, movie, value.min(5.0), ts).unwrap());
            ts += 1;
        }
    }

    let latent = LatentFactors::bias_baseline(&ratings);
    let mut service = RecommenderService::new(EngineConfig::default());
    service
        .fit(movies, ratings, HashMap::new(), latent)
        .expect("fit should succeed");
    service
}

fn bench_recommend(c: &mut Criterion) {
    let service = synthetic_service();

    c.bench_function("recommend_top10", |b| {
        b.iter(|| {
            let recs = service
                .recommend(black_box(1), black_box(10), RecommendOptions::default())
                .unwrap();
            black_box(recs)
        })
    });
}

fn bench_recommend_no_diversify(c: &mut Criterion) {
    let service = synthetic_service();
    let options = RecommendOptions {
        diversify: false,
        ..Default::default()
    };

    c.bench_function("recommend_top10_no_diversify", |b| {
        b.iter(|| {
            let recs = service
                .recommend(black_box(1), black_box(10), options)
                .unwrap();
            black_box(recs)
        })
    });
}

fn bench_explain(c: &mut Criterion) {
    let service = synthetic_service();

    c.bench_function("explain_single_movie", |b| {
        b.iter(|| {
            let explanation = service.explain(black_box(1), black_box(42)).unwrap();
            black_box(explanation)
        })
    });
}

criterion_group!(
    benches,
    bench_recommend,
    bench_recommend_no_diversify,
    bench_explain
);
criterion_main!(benches);
