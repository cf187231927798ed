use super::CommandArgs;
use crate::host::{Actor, ActorHost};

/// Validated context handed to an `on_execute` callback.
///
/// Only built after every validation stage passed; consumed by exactly one
/// callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExecution {
    sender: Actor,
    label: String,
    args: Vec<String>,
    usage: String,
}

impl CommandExecution {
    pub(crate) fn new(sender: Actor, label: String, args: Vec<String>, usage: String) -> Self {
        Self {
            sender,
            label,
            args,
            usage,
        }
    }

    pub fn sender(&self) -> &Actor {
        &self.sender
    }

    /// The sender narrowed to an interactive actor, `None` for the console.
    pub fn player(&self) -> Option<&Actor> {
        Some(&self.sender).filter(|a| a.is_interactive())
    }

    /// Label the command was invoked with (may be an alias).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn args(&self) -> CommandArgs<'_> {
        CommandArgs::new(&self.args)
    }

    pub fn raw_args(&self) -> &[String] {
        &self.args
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn reply<H: ActorHost + ?Sized>(&self, host: &mut H, text: &str) {
        host.send_message(&self.sender, text);
    }

    /// Send the usage message, for callbacks that find the arguments wrong.
    pub fn send_usage<H: ActorHost + ?Sized>(&self, host: &mut H) {
        host.send_message(&self.sender, &self.usage);
    }
}
