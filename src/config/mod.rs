//! # Configuration Management Module
//!
//! Loads and validates the toolkit configuration. A plugin built on plugkit
//! declares its commands, default feedback messages and GUI sentinels here
//! instead of hard-coding them.
//!
//! ## Configuration Structure
//!
//! - [`PluginConfig`] - plugin name and the command prefix shown in messages
//! - [`CommandsConfig`] - default [`CommandMessages`] and declared [`CommandDef`]s
//! - [`GuiConfig`] - pagination sentinels, page size and the idle sweep
//! - [`LoggingConfig`] - log level and log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use plugkit::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("plugkit.toml").await?;
//!     let config = Config::load("plugkit.toml").await?;
//!     config.validate()?;
//!     println!("Plugin: {}", config.plugin.name);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [plugin]
//! name = "plugkit"
//! command_prefix = "/"
//!
//! [commands.messages]
//! no_permission = "You do not have permission to use /{command}."
//!
//! [[commands.defs]]
//! name = "menu"
//! sender = "players"
//! permission = "plugkit.menu"
//!
//! [gui]
//! page_size = 54
//!
//! [gui.forward]
//! material = "ARROW"
//! name = "Next Page"
//! ```
//!
//! Message templates may contain `{command}`; the page indicator name may
//! contain `{page}` and `{pages}`.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::fs;

use crate::command::SenderPolicy;
use crate::error::{KitError, KitResult};
use crate::gui::pagination::Sentinels;
use crate::host::ItemStack;
use crate::validation::{validate_command_name, validate_paged_size, validate_permission_node};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub plugin: PluginConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub gui: GuiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    pub name: String,
    /// Prefix shown to users in help output. Commands themselves are matched without it.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_command_prefix() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommandsConfig {
    #[serde(default)]
    pub messages: CommandMessages,
    #[serde(default)]
    pub defs: Vec<CommandDef>,
}

/// Default rejection and help messages. Any field left out of the file keeps
/// its built-in text, so a rule never ends up without feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandMessages {
    pub no_permission: String,
    pub players_only: String,
    pub console_only: String,
    pub not_enough_args: String,
    pub usage: String,
    pub unknown_command: String,
}

impl Default for CommandMessages {
    fn default() -> Self {
        Self {
            no_permission: "You do not have permission to use /{command}.".to_string(),
            players_only: "Only players can use this command.".to_string(),
            console_only: "This command can only be run from the console.".to_string(),
            not_enough_args: "Not enough arguments for /{command}.".to_string(),
            usage: "Usage: /{command}".to_string(),
            unknown_command: "Unknown command: /{command}".to_string(),
        }
    }
}

impl CommandMessages {
    /// Sender-kind rejection text for `policy`. `Any` never rejects, so it
    /// borrows the players-only text.
    pub fn sender_message(&self, policy: SenderPolicy) -> &str {
        match policy {
            SenderPolicy::PassiveOnly => &self.console_only,
            SenderPolicy::InteractiveOnly | SenderPolicy::Any => &self.players_only,
        }
    }
}

/// A command declared in the config file, the analogue of a plugin
/// descriptor's command table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub sender: SenderPolicy,
    #[serde(default)]
    pub min_args: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_message: Option<String>,
}

impl CommandDef {
    pub fn new(name: impl Into<String>, sender: SenderPolicy, min_args: usize) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            sender,
            min_args,
            permission: None,
            usage: None,
            permission_message: None,
            sender_message: None,
            args_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelConfig {
    pub material: String,
    pub name: String,
}

impl SentinelConfig {
    fn item(&self) -> ItemStack {
        ItemStack::new(&self.material).with_title(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    /// Capacity of paginated menus opened by the built-in commands.
    pub page_size: usize,
    pub forward: SentinelConfig,
    pub backward: SentinelConfig,
    pub indicator: SentinelConfig,
    /// How often the idle-GUI sweep runs, in ticks.
    pub sweep_interval_ticks: u64,
    pub max_idle_minutes: u32,
}

impl Default for GuiConfig {
    fn default() -> Self {
        let sentinels = Sentinels::default();
        let entry = |item: &ItemStack| SentinelConfig {
            material: item.material.clone(),
            name: item.label().to_string(),
        };
        Self {
            page_size: 54,
            forward: entry(&sentinels.forward),
            backward: entry(&sentinels.backward),
            indicator: entry(&sentinels.indicator),
            sweep_interval_ticks: 200,
            max_idle_minutes: 30,
        }
    }
}

impl GuiConfig {
    pub fn sentinels(&self) -> Sentinels {
        Sentinels {
            forward: self.forward.item(),
            backward: self.backward.item(),
            indicator: self.indicator.item(),
        }
    }

    pub fn max_idle(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.max_idle_minutes))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default)]
    pub security_file: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn from_toml_str(content: &str) -> KitResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fail fast on anything that would otherwise surface at dispatch time:
    /// malformed names or permission nodes, labels claimed twice, and GUI sizes
    /// or sentinels a paginated menu cannot use.
    pub fn validate(&self) -> KitResult<()> {
        let mut labels = HashSet::new();
        for def in &self.commands.defs {
            let name = validate_command_name(&def.name)
                .map_err(|e| KitError::config(format!("command '{}': {}", def.name, e)))?;
            if !labels.insert(name.clone()) {
                return Err(KitError::config(format!("duplicate command label '{}'", name)));
            }
            for alias in &def.aliases {
                let alias = validate_command_name(alias)
                    .map_err(|e| KitError::config(format!("command '{}' alias: {}", name, e)))?;
                if alias != name && !labels.insert(alias.clone()) {
                    return Err(KitError::config(format!("duplicate command label '{}'", alias)));
                }
            }
            if let Some(node) = &def.permission {
                validate_permission_node(node)
                    .map_err(|e| KitError::config(format!("command '{}': {}", name, e)))?;
            }
        }
        validate_paged_size(self.gui.page_size)
            .map_err(|e| KitError::config(format!("gui.page_size: {}", e)))?;
        self.gui.sentinels().validate()?;
        if self.gui.sweep_interval_ticks == 0 {
            return Err(KitError::config("gui.sweep_interval_ticks must be at least 1"));
        }
        Ok(())
    }

    pub fn command_def(&self, name: &str) -> Option<&CommandDef> {
        self.commands
            .defs
            .iter()
            .find(|def| def.name.eq_ignore_ascii_case(name))
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut echo = CommandDef::new("echo", SenderPolicy::Any, 1);
        echo.aliases.push("say".to_string());
        echo.usage = Some("Usage: /echo <text...>".to_string());
        echo.args_message = Some("Tell me what to echo.".to_string());

        let mut menu = CommandDef::new("menu", SenderPolicy::InteractiveOnly, 0);
        menu.permission = Some("plugkit.menu".to_string());
        menu.usage = Some("Usage: /menu [items]".to_string());

        Config {
            plugin: PluginConfig {
                name: "plugkit".to_string(),
                command_prefix: default_command_prefix(),
            },
            commands: CommandsConfig {
                messages: CommandMessages::default(),
                defs: vec![echo, menu],
            },
            gui: GuiConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("plugkit.log".to_string()),
                security_file: Some("plugkit-security.log".to_string()),
            },
        }
    }
}
