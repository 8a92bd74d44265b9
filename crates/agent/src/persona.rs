//! Personas and the capability that voices them

use std::fmt;

use async_trait::async_trait;

use crate::transcript::{Role, Turn};

/// The four reasoning roles of a cycle, in invocation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    Planner,
    Actor,
    Critic,
    Terminator,
}

impl Persona {
    /// Every persona in cycle order
    pub const CYCLE: [Persona; 4] = [
        Persona::Planner,
        Persona::Actor,
        Persona::Critic,
        Persona::Terminator,
    ];

    pub fn name(&self) -> &'static str {
        self.role().as_str()
    }

    pub fn role(&self) -> Role {
        Role::from(*self)
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State visible to a persona when it is invoked
#[derive(Debug, Clone, Copy)]
pub struct PersonaContext<'a> {
    pub goal: &'a str,
    pub cycle: u32,
    /// Every turn appended so far, system turn included
    pub transcript: &'a [Turn],
    pub plan: Option<&'a str>,
    pub action: Option<&'a str>,
    pub critique: Option<&'a str>,
}

/// External reasoning capability
///
/// Returns the persona's reply text. For [`Persona::Terminator`] the text
/// must carry a JSON decision, see [`crate::Verdict`].
#[async_trait]
pub trait PersonaInvoker: Send + Sync {
    async fn invoke(&self, persona: Persona, ctx: PersonaContext<'_>) -> crate::Result<String>;
}
