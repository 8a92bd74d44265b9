//! Prompt builder for persona calls

use chrono::Local;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

use selfcall_provider::Message;

use crate::controller::MAX_CYCLES;
use crate::persona::{Persona, PersonaContext};
use crate::transcript::Role;

const PLANNER_PROMPT: &str = "You are the Planner of a self-calling agent. \
Decompose the goal into a short, numbered plan of concrete steps for the Actor. \
When a critique from an earlier cycle is provided, revise the plan to address every gap it names \
instead of repeating the previous plan.";

const ACTOR_PROMPT: &str = "You are the Actor of a self-calling agent. \
Carry out the plan you are given as far as possible in writing: produce the concrete artifacts, \
decisions and partial results each step calls for. Do not re-plan.";

const CRITIC_PROMPT: &str = "You are the Critic of a self-calling agent. \
Audit the Actor's output against the goal and the plan. List concrete gaps, errors or risks, \
or state plainly that the result is sufficient.";

const TERMINATOR_PROMPT: &str = "You are the Terminator of a self-calling agent. \
Decide whether the loop can stop safely given the critique. \
Reply with a single JSON object and nothing else: \
{\"stop\": true|false, \"outcome\": \"one-paragraph summary of the current result\"}";

/// Builds system and user messages for each persona
pub struct PromptBuilder {
    overrides: Option<PathBuf>,
}

impl PromptBuilder {
    /// Prompts loaded from `<dir>/<persona>.md` when present, built-ins otherwise
    pub fn new(personas_dir: impl AsRef<Path>) -> Self {
        Self {
            overrides: Some(personas_dir.as_ref().to_path_buf()),
        }
    }

    /// Built-in prompts only
    pub fn builtin() -> Self {
        Self { overrides: None }
    }

    /// File name of a persona's override
    pub fn file_name(persona: Persona) -> String {
        format!("{}.md", persona.name())
    }

    /// Built-in system prompt
    pub fn default_prompt(persona: Persona) -> &'static str {
        match persona {
            Persona::Planner => PLANNER_PROMPT,
            Persona::Actor => ACTOR_PROMPT,
            Persona::Critic => CRITIC_PROMPT,
            Persona::Terminator => TERMINATOR_PROMPT,
        }
    }

    /// System prompt for `persona`
    pub async fn system_prompt(&self, persona: Persona) -> String {
        let body = match self.load_override(persona).await {
            Some(custom) => custom,
            None => Self::default_prompt(persona).to_string(),
        };

        let today = Local::now().format("%Y-%m-%d (%A)");
        format!("{}\n\n## Current Date\n{}", body, today)
    }

    async fn load_override(&self, persona: Persona) -> Option<String> {
        let path = self.overrides.as_ref()?.join(Self::file_name(persona));
        if !path.exists() {
            return None;
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(content) if !content.trim().is_empty() => {
                debug!("using {} prompt from {:?}", persona, path);
                Some(content.trim().to_string())
            }
            Ok(_) => {
                debug!("{:?} is blank, using built-in {} prompt", path, persona);
                None
            }
            Err(e) => {
                debug!("Failed to read {:?}: {}", path, e);
                None
            }
        }
    }

    /// User message carrying the slice of run state `persona` needs
    pub fn user_prompt(persona: Persona, ctx: &PersonaContext<'_>) -> String {
        let goal = if ctx.goal.trim().is_empty() {
            "(no goal provided)"
        } else {
            ctx.goal
        };

        let mut out = format!(
            "# Goal\n{}\n\n# Cycle\n{} of {}\n",
            goal, ctx.cycle, MAX_CYCLES
        );

        match persona {
            Persona::Planner => {
                let history: Vec<_> = ctx
                    .transcript
                    .iter()
                    .filter(|turn| turn.role != Role::System)
                    .collect();
                if !history.is_empty() {
                    out.push_str("\n# Previous cycles\n");
                    for turn in history {
                        let _ = writeln!(out, "[{}] {}: {}", turn.step, turn.role, turn.content);
                    }
                }
                if let Some(critique) = ctx.critique {
                    let _ = write!(out, "\n# Latest critique\n{}\n", critique);
                }
            }
            Persona::Actor => {
                let _ = write!(out, "\n# Plan\n{}\n", or_none(ctx.plan));
            }
            Persona::Critic => {
                let _ = write!(
                    out,
                    "\n# Plan\n{}\n\n# Execution\n{}\n",
                    or_none(ctx.plan),
                    or_none(ctx.action)
                );
            }
            Persona::Terminator => {
                let _ = write!(
                    out,
                    "\n# Execution\n{}\n\n# Critique\n{}\n\nRespond with the JSON decision only.\n",
                    or_none(ctx.action),
                    or_none(ctx.critique)
                );
            }
        }

        out
    }

    /// Complete message list for one persona call
    pub async fn build_messages(&self, persona: Persona, ctx: &PersonaContext<'_>) -> Vec<Message> {
        vec![
            Message::system(self.system_prompt(persona).await),
            Message::user(Self::user_prompt(persona, ctx)),
        ]
    }
}

fn or_none(slot: Option<&str>) -> &str {
    slot.unwrap_or("(none)")
}
