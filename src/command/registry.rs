//! Command table: label and alias lookup plus the hosting boundary that keeps
//! a failing callback from leaking past the current invocation.
use log::{debug, error, info};
use std::collections::HashMap;

use super::{fill_command, CommandHandler, CommandInvocation, Outcome};
use crate::config::CommandMessages;
use crate::error::{KitError, KitResult};
use crate::host::ActorHost;

pub struct CommandRegistry<H: ?Sized> {
    handlers: HashMap<String, CommandHandler<H>>,
    aliases: HashMap<String, String>,
    unknown_message: String,
}

impl<H: ActorHost + ?Sized> CommandRegistry<H> {
    pub fn new(messages: &CommandMessages) -> Self {
        Self {
            handlers: HashMap::new(),
            aliases: HashMap::new(),
            unknown_message: messages.unknown_command.clone(),
        }
    }

    /// Add a handler. A name or alias already taken is a configuration error
    /// and leaves the registry unchanged.
    pub fn register(&mut self, handler: CommandHandler<H>) -> KitResult<()> {
        let name = handler.name().to_string();
        for label in std::iter::once(&name).chain(handler.aliases()) {
            if self.handlers.contains_key(label) || self.aliases.contains_key(label) {
                return Err(KitError::config(format!(
                    "command label '{}' is already registered",
                    label
                )));
            }
        }
        for alias in handler.aliases() {
            self.aliases.insert(alias.clone(), name.clone());
        }
        info!("registered command '{}' (aliases: {:?})", name, handler.aliases());
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Handler for a label or alias, case-insensitive.
    pub fn resolve(&self, label: &str) -> Option<&CommandHandler<H>> {
        let label = label.to_ascii_lowercase();
        let name = self.aliases.get(&label).unwrap_or(&label);
        self.handlers.get(name)
    }

    /// Dispatch one invocation.
    ///
    /// Unknown labels get the unknown-command message. A callback error is
    /// logged and reported as [`Outcome::Failed`]; the registry and handler
    /// keep serving later invocations.
    pub fn dispatch(&self, host: &mut H, invocation: &CommandInvocation) -> Outcome {
        let Some(handler) = self.resolve(invocation.label()) else {
            debug!("unknown command '{}' from {}", invocation.label(), invocation.actor().name);
            let text = fill_command(&self.unknown_message, invocation.label());
            host.send_message(invocation.actor(), &text);
            return Outcome::Unknown;
        };
        match handler.handle(host, invocation) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{} (sender: {})", e, invocation.actor().name);
                Outcome::Failed
            }
        }
    }

    /// Registered primary names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
