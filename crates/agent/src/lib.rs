//! Self-calling agent core
//!
//! Drives a goal through planner, actor, critic and terminator personas
//! until the terminator is satisfied or the cycle limit is reached.

use std::time::Duration;

use thiserror::Error;

pub mod controller;
pub mod llm;
pub mod persona;
pub mod prompts;
pub mod transcript;
pub mod verdict;

pub use controller::{AgentLoop, Phase, MAX_CYCLES};
pub use llm::LlmPersonas;
pub use persona::{Persona, PersonaContext, PersonaInvoker};
pub use prompts::PromptBuilder;
pub use transcript::{Role, RunResult, Transcript, Turn, CRASH_OUTCOME};
pub use verdict::Verdict;

/// Persona invocation errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("◆ PROVIDER ERROR: {0}")]
    Provider(#[from] selfcall_provider::ProviderError),

    #[error("◆ TIMEOUT: {persona} gave no reply within {}s", .after.as_secs())]
    Timeout { persona: Persona, after: Duration },

    #[error("◆ MALFORMED {persona} REPLY: {reason}")]
    Malformed { persona: Persona, reason: String },
}

pub type Result<T> = std::result::Result<T, AgentError>;
