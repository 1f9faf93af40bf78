//! Leaderboard bookkeeping. The host owns the network; this side validates
//! submissions and tracks the score needed to enter the top list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of the global top list.
pub const TOP_N: usize = 10;
pub const MAX_NAME_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("player name is empty")]
    EmptyName,

    #[error("score must be greater than zero")]
    ZeroScore,
}

/// A validated submission, ready for the host to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub name: String,
    pub score: u32,
}

/// Reply to a `leaderboard.submit` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitReply {
    Accepted { name: String, score: u32 },
    Rejected { reason: String },
}

impl From<Result<Submission, SubmitError>> for SubmitReply {
    fn from(result: Result<Submission, SubmitError>) -> Self {
        match result {
            Ok(Submission { name, score }) => SubmitReply::Accepted { name, score },
            Err(err) => SubmitReply::Rejected {
                reason: err.to_string(),
            },
        }
    }
}

/// First 12 characters, keeping only ASCII letters, digits and spaces.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .take(MAX_NAME_LEN)
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect()
}

pub fn prepare_submission(raw_name: &str, score: u32) -> Result<Submission, SubmitError> {
    let trimmed = raw_name.trim();
    if trimmed.is_empty() {
        return Err(SubmitError::EmptyName);
    }
    if score == 0 {
        return Err(SubmitError::ZeroScore);
    }
    let name = sanitize_name(trimmed);
    if name.trim().is_empty() {
        return Err(SubmitError::EmptyName);
    }
    Ok(Submission { name, score })
}

/// Last known cutoff for the global top list. Starts at 0, so every
/// positive score counts as notable until a list arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    min_to_beat: u32,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a host-fetched top list (JSON array, best first).
    pub fn parse_top(json: &str) -> Result<Vec<LeaderboardEntry>, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Update the cutoff: 0 while the list has free slots, otherwise the
    /// lowest listed score.
    pub fn apply_top(&mut self, entries: &[LeaderboardEntry]) {
        let min = if entries.len() < TOP_N {
            0
        } else {
            entries.last().map(|e| e.score).unwrap_or(0)
        };
        log::info!("leaderboard updated, min to beat: {}", min);
        self.min_to_beat = min;
    }

    /// Fetch failures keep the last known cutoff.
    pub fn fetch_failed(&self, reason: &str) {
        log::warn!("leaderboard fetch failed: {} (keeping {})", reason, self.min_to_beat);
    }

    pub fn min_to_beat(&self) -> u32 {
        self.min_to_beat
    }
}
