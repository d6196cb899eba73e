//! Score aggregation over classified rounds

use serde::Serialize;

use crate::types::{Outcome, Round};

/// Session score: win 1, draw 0.5, loss 0
pub fn score(rounds: &[Round]) -> f64 {
    rounds.iter().map(|r| r.outcome.points()).sum()
}

/// At-a-glance numbers for the overlay
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub score: f64,
    /// Games played in the session
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    /// Mean over rounds that carry an accuracy
    pub average_accuracy: Option<f64>,
}

impl SessionSummary {
    pub fn from_rounds(rounds: &[Round]) -> Self {
        let count = |outcome: Outcome| rounds.iter().filter(|r| r.outcome == outcome).count();

        let accuracies: Vec<f64> = rounds.iter().filter_map(|r| r.accuracy).collect();
        let average_accuracy = if accuracies.is_empty() {
            None
        } else {
            Some(accuracies.iter().sum::<f64>() / accuracies.len() as f64)
        };

        Self {
            score: score(rounds),
            total: rounds.len(),
            wins: count(Outcome::Win),
            losses: count(Outcome::Loss),
            draws: count(Outcome::Draw),
            average_accuracy,
        }
    }

    /// `score/total`, with halves shown as `.5`
    pub fn score_line(&self) -> String {
        format!("{}/{}", format_score(self.score), self.total)
    }
}

/// Format a score without a trailing `.0`
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{:.1}", score)
    }
}

/// Fixed-width round strip: played rounds in order, `None` for rounds not yet played.
///
/// Sessions longer than `max_rounds` extend the strip rather than hiding rounds.
pub fn round_slots(rounds: &[Round], max_rounds: usize) -> Vec<Option<Outcome>> {
    let width = rounds.len().max(max_rounds);
    (0..width)
        .map(|i| rounds.get(i).map(|r| r.outcome))
        .collect()
}
