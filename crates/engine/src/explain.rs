//! Human-readable score explanations.
//!
//! Turns a [`ScoreBreakdown`] into the dominant signal (largest weighted
//! contribution) plus a canned one-line rationale for that signal.

use serde::Serialize;

use crate::combiner::ScoreBreakdown;

/// One of the four scoring signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    CollaborativeFiltering,
    Content,
    Latent,
    Novelty,
}

impl Signal {
    /// Short label used in CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Signal::CollaborativeFiltering => "collaborative filtering",
            Signal::Content => "content similarity",
            Signal::Latent => "rating prediction",
            Signal::Novelty => "novelty/discovery",
        }
    }

    fn rationale(&self) -> &'static str {
        match self {
            Signal::CollaborativeFiltering => {
                "Users with similar taste to yours loved this movie"
            }
            Signal::Content => "This movie matches the genres and themes you enjoy",
            Signal::Latent => "Our algorithm predicts you'll rate this highly",
            Signal::Novelty => "This is a hidden gem you might not have discovered otherwise",
        }
    }
}

/// Why a movie scored the way it did.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    /// Signal with the largest weighted contribution.
    pub dominant_signal: Signal,
    /// Weighted contribution of every signal, largest first.
    pub contributions: Vec<(Signal, f32)>,
    /// One-line rationale for the dominant signal.
    pub rationale: &'static str,
}

/// Derive an explanation from a score breakdown.
///
/// Contributions are `score * weight` per signal, sorted descending;
/// the stable sort keeps CF ahead of content, content ahead of latent,
/// and latent ahead of novelty on exact ties.
pub fn explain(breakdown: &ScoreBreakdown) -> Explanation {
    let mut contributions = vec![
        (
            Signal::CollaborativeFiltering,
            breakdown.cf_score * breakdown.cf_weight,
        ),
        (
            Signal::Content,
            breakdown.content_score * breakdown.content_weight,
        ),
        (
            Signal::Latent,
            breakdown.latent_score * breakdown.latent_weight,
        ),
        (
            Signal::Novelty,
            breakdown.novelty_score * breakdown.novelty_weight,
        ),
    ];
    contributions.sort_by(|a, b| b.1.total_cmp(&a.1));

    let dominant_signal = contributions[0].0;
    Explanation {
        dominant_signal,
        contributions,
        rationale: dominant_signal.rationale(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(cf: f32, content: f32, latent: f32, novelty: f32) -> ScoreBreakdown {
        ScoreBreakdown {
            cf_score: cf,
            cf_weight: 0.25,
            content_score: content,
            content_weight: 0.25,
            latent_score: latent,
            latent_weight: 0.35,
            novelty_score: novelty,
            novelty_weight: 0.15,
            final_score: 0.0,
        }
    }

    #[test]
    fn test_dominant_signal_by_contribution() {
        // Latent wins on weighted contribution even though novelty has
        // the larger raw score.
        let exp = explain(&breakdown(0.1, 0.1, 0.9, 1.0));
        assert_eq!(exp.dominant_signal, Signal::Latent);
        assert_eq!(
            exp.rationale,
            "Our algorithm predicts you'll rate this highly"
        );
    }

    #[test]
    fn test_contributions_sorted_descending() {
        let exp = explain(&breakdown(0.9, 0.2, 0.1, 0.5));
        for pair in exp.contributions.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        assert_eq!(exp.contributions.len(), 4);
    }

    #[test]
    fn test_tie_prefers_cf() {
        // All contributions zero: CF wins by fixed tie order.
        let exp = explain(&breakdown(0.0, 0.0, 0.0, 0.0));
        assert_eq!(exp.dominant_signal, Signal::CollaborativeFiltering);
        assert_eq!(
            exp.rationale,
            "Users with similar taste to yours loved this movie"
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Signal::Content.label(), "content similarity");
        assert_eq!(Signal::Novelty.label(), "novelty/discovery");
    }
}
