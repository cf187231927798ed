//! The per-command validation pipeline.
//!
//! A [`CommandHandler`] is configured once through [`CommandHandlerBuilder`]
//! and is immutable afterwards: the terminal [`CommandHandlerBuilder::on_execute`]
//! consumes the builder, so nothing can be reconfigured between invocations.
//!
//! ```rust
//! use plugkit::command::{CommandHandler, CommandInvocation, Outcome, SenderPolicy};
//! use plugkit::host::{memory::MemoryHost, Actor};
//!
//! let handler = CommandHandler::<MemoryHost>::builder("greet", SenderPolicy::Any, 1)
//!     .usage("/greet <name>")
//!     .not_enough_args_message("Who should I greet?")
//!     .on_execute(|host, exec| {
//!         let name = exec.args().string_at(0).unwrap_or_default().to_string();
//!         exec.reply(host, &format!("Hello, {}!", name));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let mut host = MemoryHost::new();
//! let inv = CommandInvocation::new(Actor::console(), "greet", vec!["world".into()]);
//! assert_eq!(handler.handle(&mut host, &inv).unwrap(), Outcome::Dispatched);
//! ```
use log::{debug, trace, warn};

use super::chain::{CustomErrorHandler, ErrorChain};
use super::rules::{RuleSet, SenderPolicy, ValidationRule};
use super::{fill_command, CommandExecution, CommandInvocation, Outcome, Stage};
use crate::config::{CommandDef, CommandMessages};
use crate::error::{KitError, KitResult};
use crate::host::ActorHost;
use crate::logutil::preview_args;
use crate::metrics;
use crate::validation::{validate_command_name, validate_permission_node};

pub struct CommandHandlerBuilder<H: ?Sized> {
    name: String,
    aliases: Vec<String>,
    policy: SenderPolicy,
    min_args: usize,
    usage: String,
    sender_message: String,
    args_message: String,
    default_permission_message: String,
    permission: Option<(String, String)>,
    chain: ErrorChain<H>,
}

impl<H: ActorHost + ?Sized> CommandHandlerBuilder<H> {
    /// Start a pipeline with messages taken from `messages`.
    pub fn with_messages(
        name: impl Into<String>,
        policy: SenderPolicy,
        min_args: usize,
        messages: &CommandMessages,
    ) -> Self {
        let name = name.into();
        let label = name.trim().to_ascii_lowercase();
        Self {
            usage: fill_command(&messages.usage, &label),
            sender_message: fill_command(messages.sender_message(policy), &label),
            args_message: fill_command(&messages.not_enough_args, &label),
            default_permission_message: fill_command(&messages.no_permission, &label),
            name,
            aliases: Vec::new(),
            policy,
            min_args,
            permission: None,
            chain: ErrorChain::new(),
        }
    }

    /// Message for actors whose kind the sender policy excludes.
    pub fn sender_message(mut self, message: impl Into<String>) -> Self {
        self.sender_message = message.into();
        self
    }

    pub fn not_enough_args_message(mut self, message: impl Into<String>) -> Self {
        self.args_message = message.into();
        self
    }

    pub fn usage(mut self, message: impl Into<String>) -> Self {
        self.usage = message.into();
        self
    }

    /// Require `node`, rejecting with `message`. Last call wins.
    pub fn permission(mut self, node: impl Into<String>, message: impl Into<String>) -> Self {
        self.permission = Some((node.into(), message.into()));
        self
    }

    /// Require `node` with the default no-permission message.
    pub fn require_permission(self, node: impl Into<String>) -> Self {
        let message = self.default_permission_message.clone();
        self.permission(node, message)
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn custom_error(mut self, handler: impl CustomErrorHandler<H> + 'static) -> Self {
        self.chain.append(handler);
        self
    }

    /// Install the callback and finish configuration.
    ///
    /// Fails with [`KitError::Configuration`] on a malformed name, alias or
    /// permission node.
    pub fn on_execute<F>(self, callback: F) -> KitResult<CommandHandler<H>>
    where
        F: Fn(&mut H, &CommandExecution) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let invalid = |what: &str, e: crate::validation::ValidationError| {
            KitError::config(format!("command '{}': invalid {}: {}", self.name, what, e))
        };
        let name = validate_command_name(&self.name).map_err(|e| invalid("name", e))?;
        let mut aliases = Vec::with_capacity(self.aliases.len());
        for alias in &self.aliases {
            let alias = validate_command_name(alias).map_err(|e| invalid("alias", e))?;
            if alias != name && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        let mut rules = RuleSet::new();
        if let Some((node, message)) = self.permission.clone() {
            validate_permission_node(&node).map_err(|e| invalid("permission", e))?;
            rules.set(ValidationRule::Permission { node, message });
        }
        rules.set(ValidationRule::SenderKind {
            policy: self.policy,
            message: self.sender_message.clone(),
        });
        rules.set(ValidationRule::ArgumentCount {
            minimum: self.min_args,
            message: self.args_message.clone(),
        });

        debug!(
            "command '{}' configured: sender={} min_args={} permission={:?} custom_errors={}",
            name,
            self.policy.as_str(),
            self.min_args,
            self.permission.as_ref().map(|(node, _)| node.as_str()),
            self.chain.len()
        );

        Ok(CommandHandler {
            name,
            aliases,
            usage: self.usage,
            rules,
            chain: self.chain,
            callback: Box::new(callback),
        })
    }
}

pub struct CommandHandler<H: ?Sized> {
    name: String,
    aliases: Vec<String>,
    usage: String,
    rules: RuleSet,
    chain: ErrorChain<H>,
    /// Application logic run once per fully validated invocation.
    callback: Box<dyn Fn(&mut H, &CommandExecution) -> anyhow::Result<()> + Send + Sync>,
}

impl<H: ActorHost + ?Sized> CommandHandler<H> {
    /// Builder using the default message set.
    pub fn builder(
        name: impl Into<String>,
        policy: SenderPolicy,
        min_args: usize,
    ) -> CommandHandlerBuilder<H> {
        CommandHandlerBuilder::with_messages(name, policy, min_args, &CommandMessages::default())
    }

    /// Builder pre-filled from a declared command; per-command message
    /// overrides win over `messages`.
    pub fn builder_from_def(
        def: &CommandDef,
        messages: &CommandMessages,
    ) -> CommandHandlerBuilder<H> {
        let mut builder =
            CommandHandlerBuilder::with_messages(&def.name, def.sender, def.min_args, messages);
        for alias in &def.aliases {
            builder = builder.alias(alias);
        }
        if let Some(usage) = &def.usage {
            builder = builder.usage(usage);
        }
        if let Some(msg) = &def.sender_message {
            builder = builder.sender_message(msg);
        }
        if let Some(msg) = &def.args_message {
            builder = builder.not_enough_args_message(msg);
        }
        if let Some(node) = &def.permission {
            builder = match &def.permission_message {
                Some(msg) => builder.permission(node, msg),
                None => builder.require_permission(node),
            };
        }
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn custom_error_count(&self) -> usize {
        self.chain.len()
    }

    /// Run one invocation through the pipeline.
    ///
    /// Rejections send exactly one message (built-in stages) and return
    /// `Ok(Outcome::Rejected(_))`. A callback error is returned as
    /// [`KitError::Callback`]; the handler itself stays usable.
    pub fn handle(&self, host: &mut H, invocation: &CommandInvocation) -> KitResult<Outcome> {
        let actor = invocation.actor();
        trace!(
            "command '{}' from {} args={}",
            self.name,
            actor.name,
            preview_args(invocation.args())
        );

        if let Some(rule) = self.rules.first_failure(host, invocation) {
            let stage = rule.stage();
            if stage == Stage::Permission {
                warn!(
                    target: "security",
                    "{} denied '{}': missing permission",
                    actor.name, self.name
                );
            } else {
                debug!("command '{}' rejected at {} for {}", self.name, stage.as_str(), actor.name);
            }
            host.send_message(actor, rule.message());
            metrics::record_rejection(&self.name, stage);
            return Ok(Outcome::Rejected(stage));
        }

        if let Some(index) = self.chain.run(host, invocation) {
            debug!(
                "command '{}' stopped by custom error handler #{} for {}",
                self.name, index, actor.name
            );
            metrics::record_rejection(&self.name, Stage::CustomError);
            return Ok(Outcome::Rejected(Stage::CustomError));
        }

        let execution = CommandExecution::new(
            actor.clone(),
            invocation.label().to_string(),
            invocation.args().map(<[String]>::to_vec).unwrap_or_default(),
            self.usage.clone(),
        );
        (self.callback)(host, &execution).map_err(|source| {
            metrics::record_callback_failure(&self.name);
            KitError::Callback {
                command: self.name.clone(),
                source,
            }
        })?;
        metrics::record_dispatch(&self.name);
        debug!("command '{}' dispatched for {}", self.name, actor.name);
        Ok(Outcome::Dispatched)
    }
}
