//! Candidate scoring for the scheduling pass
//!
//! The sticky preference always sorts first; this score orders the rest of
//! the candidates. With `score_then_age`, queued models gain score as their
//! head job waits, so a low-priority queue cannot starve forever.

use crate::config::{ConfigStore, PickNextStrategy};

/// Score assigned to models flagged `always_run_last`.
const ALWAYS_LAST_SCORE: f64 = -1000.0;

/// Score for a candidate model whose queue head has waited
/// `head_age_seconds`.
pub fn candidate_score(config: &ConfigStore, model_id: &str, head_age_seconds: f64) -> f64 {
    let app = config.app();
    let score = config.model_score(model_id);

    if score.always_run_last {
        return ALWAYS_LAST_SCORE;
    }

    match app.scheduling.pick_next_strategy {
        PickNextStrategy::ScoreThenAge => {
            (score.base_priority - score.load_penalty) as f64
                + head_age_seconds * app.scheduling.aging_bonus_per_second
        }
        PickNextStrategy::Priority => score.base_priority as f64,
    }
}
