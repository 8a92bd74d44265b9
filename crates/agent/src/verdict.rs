//! Terminator decision parsing

use std::fmt;

use serde::{Deserialize, Serialize};

/// Continue/stop decision returned by the terminator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub stop: bool,
    pub outcome: String,
}

impl Verdict {
    /// Parse the JSON object embedded in a terminator reply.
    ///
    /// Prose or code fences around the object are ignored; the span from
    /// the first `{` to the last `}` must be `{"stop": bool, "outcome": string}`
    /// with a non-blank outcome.
    pub fn parse(reply: &str) -> Result<Self, String> {
        let start = reply
            .find('{')
            .ok_or_else(|| "no JSON object in reply".to_string())?;
        let end = reply
            .rfind('}')
            .filter(|end| *end > start)
            .ok_or_else(|| "unterminated JSON object in reply".to_string())?;

        let mut verdict: Verdict =
            serde_json::from_str(&reply[start..=end]).map_err(|e| e.to_string())?;

        verdict.outcome = verdict.outcome.trim().to_string();
        if verdict.outcome.is_empty() {
            return Err("outcome is empty".to_string());
        }
        Ok(verdict)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.stop { "stop" } else { "continue" };
        write!(f, "[{}] {}", label, self.outcome)
    }
}
