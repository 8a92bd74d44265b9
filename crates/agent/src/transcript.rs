//! Transcript data model

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::persona::Persona;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Planner,
    Actor,
    Critic,
    Terminator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Planner => "planner",
            Role::Actor => "actor",
            Role::Critic => "critic",
            Role::Terminator => "terminator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Persona> for Role {
    fn from(persona: Persona) -> Self {
        match persona {
            Persona::Planner => Role::Planner,
            Persona::Actor => Role::Actor,
            Persona::Critic => Role::Critic,
            Persona::Terminator => Role::Terminator,
        }
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub step: u32,
}

/// Append-only log of turns; steps start at 0 and increase by one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, stamping it with the next step
    pub fn push(&mut self, role: Role, content: impl Into<String>) -> &Turn {
        // bounded by MAX_CYCLES, so this never saturates in practice
        let step = u32::try_from(self.turns.len()).unwrap_or(u32::MAX);
        self.turns.push(Turn {
            role,
            content: content.into(),
            step,
        });
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

/// Leading text of every outcome that reports a failed run
pub const CRASH_OUTCOME: &str = "Agent crashed during execution";

/// Final artifact of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub transcript: Vec<Turn>,
    pub outcome: String,
    pub completed: bool,
}

impl RunResult {
    /// Body reported when a run dies without producing a result
    pub fn crashed() -> Self {
        Self {
            transcript: Vec::new(),
            outcome: format!("{}.", CRASH_OUTCOME),
            completed: false,
        }
    }

    /// Whether the run ended on a failure rather than a decision or the cycle limit
    pub fn is_crash(&self) -> bool {
        !self.completed && self.outcome.starts_with(CRASH_OUTCOME)
    }
}
