//! Parsers for the MovieLens ml-latest CSV files.
//!
//! - movies.csv:  movieId,title,genres
//! - ratings.csv: userId,movieId,rating,timestamp
//! - tags.csv:    userId,movieId,tag,timestamp
//!
//! Titles containing commas are quoted ("American President, The (1995)"),
//! so lines are split with a small quote-aware splitter rather than a plain
//! `split(',')`.

use crate::error::{CatalogError, Result};
use crate::types::{Genre, Movie, MovieId, Rating};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Split one CSV line into fields, honoring double-quoted fields and the
/// "" escape inside them.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

fn parse_field<T: std::str::FromStr>(
    value: &str,
    field: &str,
    file: &str,
    line: usize,
) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| CatalogError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", field, e),
    })
}

/// Parse movies.csv into a list of movies.
///
/// The header line is skipped. "(no genres listed)" yields an empty genre
/// list rather than an error.
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let lines = read_lines(path)?;
    let mut movies = Vec::new();

    for (idx, line) in lines.iter().enumerate().skip(1) {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let fields = split_csv_line(trimmed);
        if fields.len() != 3 {
            return Err(CatalogError::ParseError {
                file: "movies.csv".to_string(),
                line: line_no,
                reason: format!("Expected 3 fields, found {}", fields.len()),
            });
        }

        let id: MovieId = parse_field(&fields[0], "movieId", "movies.csv", line_no)?;
        let title = fields[1].trim().to_string();
        let genres = parse_genre_list(&fields[2])?;

        movies.push(Movie {
            id,
            year: extract_year_from_title(&title),
            title,
            genres,
        });
    }

    Ok(movies)
}

/// Parse ratings.csv into validated rating events.
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let lines = read_lines(path)?;
    let mut ratings = Vec::new();

    for (idx, line) in lines.iter().enumerate().skip(1) {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(',').collect();
        if fields.len() != 4 {
            return Err(CatalogError::ParseError {
                file: "ratings.csv".to_string(),
                line: line_no,
                reason: format!("Expected 4 fields, found {}", fields.len()),
            });
        }

        let user_id = parse_field(fields[0], "userId", "ratings.csv", line_no)?;
        let movie_id = parse_field(fields[1], "movieId", "ratings.csv", line_no)?;
        let value = parse_field(fields[2], "rating", "ratings.csv", line_no)?;
        let timestamp = parse_field(fields[3], "timestamp", "ratings.csv", line_no)?;

        ratings.push(Rating::new(user_id, movie_id, value, timestamp)?);
    }

    Ok(ratings)
}

/// Parse tags.csv and aggregate tag text per movie.
///
/// A missing tags file is not an error; content features then fall back to
/// genre text alone.
pub fn parse_tags(path: &Path) -> Result<HashMap<MovieId, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let lines = read_lines(path)?;
    let mut tags: HashMap<MovieId, String> = HashMap::new();

    for (idx, line) in lines.iter().enumerate().skip(1) {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let fields = split_csv_line(trimmed);
        if fields.len() != 4 {
            return Err(CatalogError::ParseError {
                file: "tags.csv".to_string(),
                line: line_no,
                reason: format!("Expected 4 fields, found {}", fields.len()),
            });
        }

        let movie_id: MovieId = parse_field(&fields[1], "movieId", "tags.csv", line_no)?;
        let entry = tags.entry(movie_id).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(fields[2].trim());
    }

    Ok(tags)
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        if let Ok(year) = title[start + 1..end].parse::<u16>() {
            return Some(year);
        }
    }
    None
}

/// Parse pipe-separated genres, e.g. "Action|Adventure|Sci-Fi".
fn parse_genre_list(s: &str) -> Result<Vec<Genre>> {
    let s = s.trim();
    if s.is_empty() || s == "(no genres listed)" {
        return Ok(Vec::new());
    }
    s.split('|').map(Genre::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year_from_title("Toy Story (1995)"), Some(1995));
        assert_eq!(extract_year_from_title("Movie Title"), None);
    }

    #[test]
    fn test_split_csv_line_quoted_title() {
        let fields = split_csv_line(r#"11,"American President, The (1995)",Comedy|Drama|Romance"#);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], "American President, The (1995)");
    }

    #[test]
    fn test_split_csv_line_escaped_quote() {
        let fields = split_csv_line(r#"1,"He said ""hi""",Drama"#);
        assert_eq!(fields[1], r#"He said "hi""#);
    }

    #[test]
    fn test_parse_genre_list() {
        let genres = parse_genre_list("Action|Adventure|Sci-Fi").unwrap();
        assert_eq!(genres, vec![Genre::Action, Genre::Adventure, Genre::SciFi]);
    }

    #[test]
    fn test_no_genres_listed() {
        assert!(parse_genre_list("(no genres listed)").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_genre_is_an_error() {
        assert!(parse_genre_list("Action|Telenovela").is_err());
    }
}
