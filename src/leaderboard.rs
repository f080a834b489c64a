// src/leaderboard.rs

use std::collections::HashMap;

use crate::models::attempt::{Attempt, LeaderboardEntry};

/// Derives the ranked view of one quiz's attempts.
///
/// Each user is represented by their best score; if several of their attempts
/// share that score, the earliest one counts. Entries are ordered by score
/// descending, ties broken by earliest attempt timestamp ascending (first to
/// achieve the score ranks higher), then by user id so the ordering is total.
pub fn rank(attempts: &[Attempt]) -> Vec<LeaderboardEntry> {
    let mut best: HashMap<i64, (i64, chrono::DateTime<chrono::Utc>)> = HashMap::new();

    for attempt in attempts {
        match best.get_mut(&attempt.user_id) {
            Some((score, achieved_at)) => {
                if attempt.score > *score
                    || (attempt.score == *score && attempt.created_at < *achieved_at)
                {
                    *score = attempt.score;
                    *achieved_at = attempt.created_at;
                }
            }
            None => {
                best.insert(attempt.user_id, (attempt.score, attempt.created_at));
            }
        }
    }

    let mut ranked: Vec<(i64, i64, chrono::DateTime<chrono::Utc>)> = best
        .into_iter()
        .map(|(user_id, (score, achieved_at))| (user_id, score, achieved_at))
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .map(|(user_id, score, _)| LeaderboardEntry { user_id, score })
        .collect()
}
