//! Agent loop controller

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::persona::{Persona, PersonaContext, PersonaInvoker};
use crate::transcript::{Role, RunResult, Transcript, CRASH_OUTCOME};
use crate::verdict::Verdict;
use crate::AgentError;

/// Hard ceiling on planner→actor→critic→terminator cycles per run.
///
/// This is the only termination guarantee when the terminator never asks
/// to stop. A run performs at most `4 * MAX_CYCLES + 1` turns.
pub const MAX_CYCLES: u32 = 4;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Planning,
    Acting,
    Critiquing,
    Deciding,
    Done,
}

impl Phase {
    fn of(persona: Persona) -> Self {
        match persona {
            Persona::Planner => Phase::Planning,
            Persona::Actor => Phase::Acting,
            Persona::Critic => Phase::Critiquing,
            Persona::Terminator => Phase::Deciding,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "INIT",
            Phase::Planning => "PLANNING",
            Phase::Acting => "ACTING",
            Phase::Critiquing => "CRITIQUING",
            Phase::Deciding => "DECIDING",
            Phase::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Mutable state of one run, owned by the controller
struct RunState<'g> {
    goal: &'g str,
    transcript: Transcript,
    plan: Option<String>,
    action: Option<String>,
    critique: Option<String>,
    cycle: u32,
    phase: Phase,
}

impl<'g> RunState<'g> {
    fn new(goal: &'g str) -> Self {
        let mut transcript = Transcript::new();
        let shown = if goal.trim().is_empty() {
            "(no goal provided)"
        } else {
            goal
        };
        transcript.push(Role::System, format!("Goal received: {}", shown));

        Self {
            goal,
            transcript,
            plan: None,
            action: None,
            critique: None,
            cycle: 0,
            phase: Phase::Init,
        }
    }

    fn context(&self) -> PersonaContext<'_> {
        PersonaContext {
            goal: self.goal,
            cycle: self.cycle,
            transcript: self.transcript.turns(),
            plan: self.plan.as_deref(),
            action: self.action.as_deref(),
            critique: self.critique.as_deref(),
        }
    }

    /// Append the persona's turn and replace the slot it owns
    fn record(&mut self, persona: Persona, content: String) {
        self.transcript.push(persona.role(), content.clone());
        match persona {
            Persona::Planner => self.plan = Some(content),
            Persona::Actor => self.action = Some(content),
            Persona::Critic => self.critique = Some(content),
            Persona::Terminator => {}
        }
    }
}

/// How a run ended, before it is flattened into a [`RunResult`]
enum Exit {
    Stopped(String),
    Exhausted,
    Failed {
        persona: Persona,
        cycle: u32,
        error: AgentError,
    },
}

/// Decides whether a persona call may run to completion
trait Gate: Sync {
    type Halt;

    fn pass<F>(&self, call: F) -> impl Future<Output = Result<F::Output, Self::Halt>> + Send
    where
        F: Future + Send,
        F::Output: Send;
}

/// Gate of [`AgentLoop::run`]: nothing can halt it
struct Uncancellable;

impl Gate for Uncancellable {
    type Halt = Infallible;

    fn pass<F>(&self, call: F) -> impl Future<Output = Result<F::Output, Infallible>> + Send
    where
        F: Future + Send,
        F::Output: Send,
    {
        async move { Ok(call.await) }
    }
}

/// The run was cancelled before it finished
struct Cancelled;

impl Gate for &CancellationToken {
    type Halt = Cancelled;

    fn pass<F>(&self, call: F) -> impl Future<Output = Result<F::Output, Cancelled>> + Send
    where
        F: Future + Send,
        F::Output: Send,
    {
        async move {
            tokio::select! {
                biased;
                _ = self.cancelled() => Err(Cancelled),
                out = call => Ok(out),
            }
        }
    }
}

/// Runs goals through the persona cycle
pub struct AgentLoop<I: ?Sized> {
    invoker: Arc<I>,
}

impl<I: ?Sized> Clone for AgentLoop<I> {
    fn clone(&self) -> Self {
        Self {
            invoker: Arc::clone(&self.invoker),
        }
    }
}

impl<I: PersonaInvoker> AgentLoop<I> {
    pub fn new(invoker: I) -> Self {
        Self {
            invoker: Arc::new(invoker),
        }
    }
}

impl<I: PersonaInvoker + ?Sized> AgentLoop<I> {
    /// Build from an invoker that is already shared, e.g. `Arc<dyn PersonaInvoker>`
    pub fn from_shared(invoker: Arc<I>) -> Self {
        Self { invoker }
    }

    /// Run `goal` to completion. Never fails: invocation errors and cycle
    /// exhaustion are both reported through the returned result.
    pub async fn run(&self, goal: &str) -> RunResult {
        let mut state = RunState::new(goal);
        let span = info_span!("run", run_id = %Uuid::new_v4());

        let exit = match self
            .drive(&mut state, &Uncancellable)
            .instrument(span.clone())
            .await
        {
            Ok(exit) => exit,
            Err(never) => match never {},
        };
        span.in_scope(|| finish(state, exit))
    }

    /// Like [`AgentLoop::run`], but stops invoking personas as soon as
    /// `cancel` fires. A cancelled run yields `None` and its turns are dropped.
    pub async fn run_until_cancelled(
        &self,
        goal: &str,
        cancel: &CancellationToken,
    ) -> Option<RunResult> {
        let mut state = RunState::new(goal);
        let span = info_span!("run", run_id = %Uuid::new_v4());

        let outcome = self
            .drive(&mut state, &cancel)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match outcome {
            Ok(exit) => Some(finish(state, exit)),
            Err(Cancelled) => {
                info!(
                    "run cancelled in cycle {} ({}), discarding {} turns",
                    state.cycle,
                    state.phase,
                    state.transcript.len()
                );
                None
            }
        })
    }

    /// Errs only when `gate` halts the run
    async fn drive<G: Gate>(
        &self,
        state: &mut RunState<'_>,
        gate: &G,
    ) -> Result<Exit, G::Halt> {
        info!("starting run ({} chars of goal)", state.goal.len());

        for cycle in 1..=MAX_CYCLES {
            state.cycle = cycle;
            debug!("cycle {}/{}", cycle, MAX_CYCLES);

            for persona in Persona::CYCLE {
                state.phase = Phase::of(persona);
                debug!("{} -> {}", state.phase, persona);

                let reply = match self.invoke(state, persona, gate).await? {
                    Ok(reply) => reply,
                    Err(error) => {
                        warn!("{} failed in cycle {}: {}", persona, cycle, error);
                        return Ok(Exit::Failed {
                            persona,
                            cycle,
                            error,
                        });
                    }
                };

                if persona != Persona::Terminator {
                    state.record(persona, reply);
                    continue;
                }

                let verdict = match Verdict::parse(&reply) {
                    Ok(verdict) => verdict,
                    Err(reason) => {
                        warn!("unparseable terminator reply in cycle {}: {}", cycle, reason);
                        return Ok(Exit::Failed {
                            persona,
                            cycle,
                            error: AgentError::Malformed { persona, reason },
                        });
                    }
                };

                state.record(persona, verdict.to_string());
                if verdict.stop {
                    info!("terminator stopped the run in cycle {}", cycle);
                    return Ok(Exit::Stopped(verdict.outcome));
                }
            }
        }

        info!("cycle limit of {} reached", MAX_CYCLES);
        Ok(Exit::Exhausted)
    }

    /// One persona call passed through `gate`
    async fn invoke<G: Gate>(
        &self,
        state: &RunState<'_>,
        persona: Persona,
        gate: &G,
    ) -> Result<crate::Result<String>, G::Halt> {
        let reply = gate
            .pass(self.invoker.invoke(persona, state.context()))
            .await?;

        Ok(reply.and_then(|text| {
            let text = text.trim();
            if text.is_empty() {
                Err(AgentError::Malformed {
                    persona,
                    reason: "empty reply".to_string(),
                })
            } else {
                Ok(text.to_string())
            }
        }))
    }
}

/// Single exit point: flatten the run into its public result
fn finish(mut state: RunState<'_>, exit: Exit) -> RunResult {
    state.phase = Phase::Done;

    let (outcome, completed) = match exit {
        Exit::Stopped(outcome) => (outcome, true),
        Exit::Exhausted => (
            format!(
                "Reached the safety limit of {} cycles without the terminator signalling completion.",
                MAX_CYCLES
            ),
            false,
        ),
        Exit::Failed {
            persona,
            cycle,
            error,
        } => (
            format!(
                "{}: {} failed in cycle {}: {}",
                CRASH_OUTCOME, persona, cycle, error
            ),
            false,
        ),
    };

    info!(
        "run {} after {} turns (completed={})",
        state.phase,
        state.transcript.len(),
        completed
    );

    RunResult {
        transcript: state.transcript.into_turns(),
        outcome,
        completed,
    }
}
