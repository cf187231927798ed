//! # Command Validation Pipeline
//!
//! A host-delivered command invocation passes through a fixed sequence of
//! stages before application code sees it:
//!
//! ```text
//! Permission -> SenderKind -> ArgumentCount -> CustomErrorChain -> Dispatch
//! ```
//!
//! Each stage either passes the invocation on or rejects it, sending that
//! stage's message to the actor. Only an invocation that clears every stage is
//! turned into a [`CommandExecution`] and handed to the `on_execute` callback,
//! exactly once.
//!
//! - [`rules`] - built-in validation rules and the ordered [`rules::RuleSet`]
//! - [`args`] - [`CommandArgs`], a never-failing typed view over arguments
//! - [`chain`] - externally supplied [`chain::CustomErrorHandler`]s
//! - [`handler`] - [`CommandHandler`] and its builder
//! - [`registry`] - name/alias lookup and the callback-failure boundary

pub mod args;
pub mod chain;
pub mod execution;
pub mod handler;
pub mod registry;
pub mod rules;

pub use args::CommandArgs;
pub use chain::{reject_when, CustomErrorHandler, ErrorChain};
pub use execution::CommandExecution;
pub use handler::{CommandHandler, CommandHandlerBuilder};
pub use registry::CommandRegistry;
pub use rules::{RuleSet, SenderPolicy, ValidationRule};

use crate::host::Actor;

/// Validation stages in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Permission,
    SenderKind,
    ArgumentCount,
    CustomError,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::Permission,
        Stage::SenderKind,
        Stage::ArgumentCount,
        Stage::CustomError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Permission => "permission",
            Stage::SenderKind => "sender-kind",
            Stage::ArgumentCount => "argument-count",
            Stage::CustomError => "custom-error",
        }
    }
}

/// Terminal state of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every stage passed; the callback ran once and returned Ok.
    Dispatched,
    /// A stage rejected the invocation; the callback did not run.
    Rejected(Stage),
    /// No handler is registered under the label.
    Unknown,
    /// The callback ran and returned an error (registry boundary only).
    Failed,
}

/// One host-delivered command call. Immutable; discarded after dispatch.
///
/// `args` distinguishes an absent argument list (`None`) from an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    actor: Actor,
    label: String,
    args: Option<Vec<String>>,
}

impl CommandInvocation {
    pub fn new(actor: Actor, label: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            actor,
            label: label.into(),
            args: Some(args),
        }
    }

    /// Invocation whose host delivered no argument list at all.
    pub fn without_args(actor: Actor, label: impl Into<String>) -> Self {
        Self {
            actor,
            label: label.into(),
            args: None,
        }
    }

    /// Split a typed line (`/give alice 3`) into label and arguments.
    /// Returns `None` for a blank line.
    pub fn parse(actor: Actor, line: &str) -> Option<Self> {
        let line = line.trim();
        let line = line.strip_prefix('/').unwrap_or(line);
        let mut parts = line.split_whitespace();
        let label = parts.next()?;
        let args = parts.map(str::to_string).collect();
        Some(Self::new(actor, label, args))
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn args(&self) -> Option<&[String]> {
        self.args.as_deref()
    }
}

/// Replace `{command}` in a configured message template.
pub(crate) fn fill_command(template: &str, command: &str) -> String {
    template.replace("{command}", command)
}
