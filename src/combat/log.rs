//! Combat logs
//!
//! Two append-only logs: a narrative one for players and a technical trace.
//! Every line is stamped with the round and initiative it happened in and is
//! also forwarded to `tracing`.

use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct CombatLog {
    narrative: String,
    technical: String,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a player-facing line
    pub fn narrate(&mut self, round: u32, initiative: i32, comment: &str) {
        info!(round, initiative, "{}", comment);
        self.narrative.push_str(&format_line(round, initiative, comment));
    }

    /// Append a diagnostic line
    pub fn trace(&mut self, round: u32, initiative: i32, comment: &str) {
        debug!(round, initiative, "{}", comment);
        self.technical.push_str(&format_line(round, initiative, comment));
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn technical(&self) -> &str {
        &self.technical
    }
}

fn format_line(round: u32, initiative: i32, comment: &str) -> String {
    format!("R: {}  I:{} {}\n", round, initiative, comment)
}
