//! Scripted sessions against the in-memory host.
//!
//! `plugkit replay <script.json>` builds the commands declared in the config,
//! then plays a list of steps (commands, clicks, closes, ticks, layout dumps)
//! and reports every message the host delivered along the way.
//!
//! ```json
//! {
//!   "actors": [{ "name": "alice", "kind": "player", "permissions": ["plugkit.menu"] }],
//!   "steps": [
//!     { "type": "command", "actor": "alice", "line": "/menu 30" },
//!     { "type": "click", "actor": "alice", "slot": 53 },
//!     { "type": "layout", "actor": "alice" },
//!     { "type": "close", "actor": "alice" },
//!     { "type": "tick", "count": 200 }
//!   ]
//! }
//! ```
//!
//! Locks are always taken host first, then the GUI manager.
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::command::{
    reject_when, CommandArgs, CommandExecution, CommandHandler, CommandHandlerBuilder,
    CommandInvocation, CommandRegistry, Outcome,
};
use crate::config::{CommandDef, Config};
use crate::error::{KitError, KitResult};
use crate::gui::{ClickEvent, CloseEvent, GuiManager, PaginationGui, Sentinels, SharedGuiManager};
use crate::host::memory::MemoryHost;
use crate::host::{Actor, ActorId, ActorKind, ContainerHost, ContainerId, ItemStack};
use crate::task::{TaskKind, TaskScheduler};

/// Items in a `/menu` opened without an argument.
pub const DEFAULT_MENU_ITEMS: i32 = 27;
pub const MAX_MENU_ITEMS: i32 = 500;

const MENU_MATERIALS: [&str; 6] = [
    "DIAMOND",
    "EMERALD",
    "GOLD_INGOT",
    "IRON_INGOT",
    "REDSTONE",
    "LAPIS_LAZULI",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
    pub steps: Vec<ScriptStep>,
}

impl ReplayScript {
    pub async fn load(path: &str) -> KitResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> KitResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSpec {
    pub name: String,
    #[serde(default = "default_actor_kind")]
    pub kind: ActorKind,
    #[serde(default)]
    pub permissions: Vec<String>,
}

fn default_actor_kind() -> ActorKind {
    ActorKind::Interactive
}

fn default_tick_count() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    /// A typed command line, with or without the leading `/`.
    Command { actor: String, line: String },
    /// Click a slot of the container the actor is viewing, or of `container` if given.
    Click {
        actor: String,
        slot: usize,
        #[serde(default)]
        container: Option<u64>,
    },
    /// Close the actor's open container, or deliver a close for `container`.
    Close {
        actor: String,
        #[serde(default)]
        container: Option<u64>,
    },
    Tick {
        #[serde(default = "default_tick_count")]
        count: u64,
    },
    /// Dump the slots of the container the actor is viewing.
    Layout { actor: String },
}

pub struct ReplaySession {
    host: Arc<Mutex<MemoryHost>>,
    guis: SharedGuiManager,
    registry: CommandRegistry<MemoryHost>,
    scheduler: TaskScheduler,
    actors: BTreeMap<String, Actor>,
    prefix: String,
    report: Vec<String>,
}

impl ReplaySession {
    /// Register the configured commands and schedule the idle-GUI sweep.
    pub fn new(config: &Config) -> KitResult<Self> {
        config.validate()?;
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let guis = GuiManager::from_config(&config.gui).shared();

        let mut registry = CommandRegistry::new(&config.commands.messages);
        for def in &config.commands.defs {
            let builder = CommandHandler::builder_from_def(def, &config.commands.messages);
            registry.register(bind_demo(def, builder, &guis, config)?)?;
        }

        let mut scheduler = TaskScheduler::new();
        let interval = config.gui.sweep_interval_ticks;
        let (sweep_host, sweep_guis) = (host.clone(), guis.clone());
        scheduler.schedule(TaskKind::sync_timer(interval, interval), move |_| {
            let mut host = sweep_host.lock().expect("host mutex poisoned");
            let removed = sweep_guis
                .lock()
                .expect("gui manager mutex poisoned")
                .sweep(&mut *host, Utc::now());
            if !removed.is_empty() {
                debug!("replay sweep removed {:?}", removed);
            }
        })?;

        info!("replay session ready with commands {:?}", registry.names());
        Ok(Self {
            host,
            guis,
            registry,
            scheduler,
            actors: BTreeMap::new(),
            prefix: config.plugin.command_prefix.clone(),
            report: Vec::new(),
        })
    }

    pub fn add_actor(&mut self, spec: &ActorSpec) -> Actor {
        let actor = Actor::new(ActorId(Uuid::new_v4()), &spec.name, spec.kind);
        {
            let mut host = self.host.lock().expect("host mutex poisoned");
            for node in &spec.permissions {
                host.grant_permission(&actor, node);
            }
        }
        self.actors.insert(spec.name.to_ascii_lowercase(), actor.clone());
        actor
    }

    /// Play every step and return the report.
    pub fn run(&mut self, script: &ReplayScript) -> KitResult<Vec<String>> {
        for spec in &script.actors {
            self.add_actor(spec);
        }
        for step in &script.steps {
            self.step(step)?;
        }
        Ok(std::mem::take(&mut self.report))
    }

    pub fn step(&mut self, step: &ScriptStep) -> KitResult<()> {
        match step {
            ScriptStep::Command { actor, line } => self.command(actor, line)?,
            ScriptStep::Click { actor, slot, container } => self.click(actor, *slot, *container)?,
            ScriptStep::Close { actor, container } => self.close(actor, *container)?,
            ScriptStep::Tick { count } => {
                let ran: usize = (0..*count).map(|_| self.scheduler.tick()).sum();
                let open = self.guis.lock().expect("gui manager mutex poisoned").len();
                self.report.push(format!(
                    "tick x{} (now {}): {} job run(s), {} GUI(s) open",
                    count,
                    self.scheduler.current_tick(),
                    ran,
                    open
                ));
            }
            ScriptStep::Layout { actor } => self.layout(actor)?,
        }
        self.flush_messages();
        Ok(())
    }

    pub fn host(&self) -> Arc<Mutex<MemoryHost>> {
        self.host.clone()
    }

    pub fn guis(&self) -> SharedGuiManager {
        self.guis.clone()
    }

    pub fn actor(&self, name: &str) -> KitResult<Actor> {
        self.actors
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| KitError::config(format!("script uses undeclared actor '{}'", name)))
    }

    fn command(&mut self, name: &str, line: &str) -> KitResult<()> {
        let actor = self.actor(name)?;
        let Some(invocation) = CommandInvocation::parse(actor.clone(), line) else {
            self.report.push(format!("{}: (blank line ignored)", actor.name));
            return Ok(());
        };
        let outcome = {
            let mut host = self.host.lock().expect("host mutex poisoned");
            self.registry.dispatch(&mut *host, &invocation)
        };
        let outcome = match outcome {
            Outcome::Dispatched => "dispatched".to_string(),
            Outcome::Rejected(stage) => format!("rejected at {}", stage.as_str()),
            Outcome::Unknown => "unknown command".to_string(),
            Outcome::Failed => "callback failed".to_string(),
        };
        self.report.push(format!(
            "{} > {}{} [{}]",
            actor.name,
            self.prefix,
            line.trim().trim_start_matches('/'),
            outcome
        ));
        Ok(())
    }

    fn click(&mut self, name: &str, slot: usize, container: Option<u64>) -> KitResult<()> {
        let actor = self.actor(name)?;
        let mut host = self.host.lock().expect("host mutex poisoned");
        let Some(target) = container.map(ContainerId::new).or_else(|| host.viewed_by(&actor)) else {
            self.report
                .push(format!("{} clicks slot {}: not viewing a container", actor.name, slot));
            return Ok(());
        };
        let item = host
            .contents(target)
            .and_then(|slots| slots.get(slot).cloned().flatten());
        let mut event = ClickEvent::new(target, actor.clone(), Some(slot), item);
        let mut guis = self.guis.lock().expect("gui manager mutex poisoned");
        let delivery = guis.on_click(&mut *host, &mut event)?;
        let page = guis
            .paged_mut(target)
            .map(|g| format!(", page {}/{}", g.page() + 1, g.page_count()))
            .unwrap_or_default();
        self.report.push(format!(
            "{} clicks {} slot {}: {:?}{}{}",
            actor.name,
            target,
            slot,
            delivery,
            if event.is_cancelled() { " (cancelled)" } else { "" },
            page
        ));
        Ok(())
    }

    fn close(&mut self, name: &str, container: Option<u64>) -> KitResult<()> {
        let actor = self.actor(name)?;
        let mut host = self.host.lock().expect("host mutex poisoned");
        let target = match container {
            Some(raw) => Some(ContainerId::new(raw)),
            None => host.close_view(&actor),
        };
        let Some(target) = target else {
            self.report.push(format!("{} closes: nothing open", actor.name));
            return Ok(());
        };
        let removed = self
            .guis
            .lock()
            .expect("gui manager mutex poisoned")
            .on_close(&CloseEvent::new(target, actor.clone()));
        self.report.push(format!(
            "{} closes {}: {}",
            actor.name,
            target,
            if removed { "unregistered" } else { "not registered" }
        ));
        Ok(())
    }

    fn layout(&mut self, name: &str) -> KitResult<()> {
        let actor = self.actor(name)?;
        let host = self.host.lock().expect("host mutex poisoned");
        let Some(container) = host.viewed_by(&actor) else {
            self.report.push(format!("{} layout: not viewing a container", actor.name));
            return Ok(());
        };
        let slots = host.contents(container).unwrap_or_default();
        self.report
            .push(format!("{} layout of {} ({} slots):", actor.name, container, slots.len()));
        for (row, chunk) in slots.chunks(9).enumerate() {
            let cells: Vec<&str> = chunk
                .iter()
                .map(|s| s.as_ref().map_or(".", ItemStack::label))
                .collect();
            self.report.push(format!("  row {}: {}", row, cells.join(" | ")));
        }
        Ok(())
    }

    fn flush_messages(&mut self) {
        let messages = self.host.lock().expect("host mutex poisoned").take_messages();
        for message in messages {
            let to = self
                .actors
                .values()
                .find(|a| a.id == message.to)
                .map_or("?", |a| a.name.as_str());
            self.report.push(format!("  -> {}: {}", to, message.text));
        }
    }
}

/// Attach the demo behaviour for a declared command.
fn bind_demo(
    def: &CommandDef,
    builder: CommandHandlerBuilder<MemoryHost>,
    guis: &SharedGuiManager,
    config: &Config,
) -> KitResult<CommandHandler<MemoryHost>> {
    match def.name.to_ascii_lowercase().as_str() {
        "echo" => builder.on_execute(|host, exec| {
            exec.reply(host, &exec.args().joined_from(0));
            Ok(())
        }),
        "menu" => {
            let guis = guis.clone();
            let sentinels = config.gui.sentinels();
            let page_size = config.gui.page_size;
            builder
                .custom_error(reject_when(
                    |inv: &CommandInvocation| {
                        let args = CommandArgs::new(inv.args().unwrap_or_default());
                        args.int_at(0, DEFAULT_MENU_ITEMS) > MAX_MENU_ITEMS
                    },
                    format!("That menu would be too large (max {} items).", MAX_MENU_ITEMS),
                ))
                .on_execute(move |host, exec| open_menu(host, exec, &guis, &sentinels, page_size))
        }
        _ => builder.on_execute(|host, exec| {
            let text = format!("/{} ran with {} argument(s).", exec.label(), exec.args().len());
            exec.reply(host, &text);
            Ok(())
        }),
    }
}

fn open_menu(
    host: &mut MemoryHost,
    exec: &CommandExecution,
    guis: &SharedGuiManager,
    sentinels: &Sentinels,
    page_size: usize,
) -> anyhow::Result<()> {
    let Some(player) = exec.player() else {
        anyhow::bail!("menu reached dispatch without a player sender");
    };
    let count = exec.args().int_at(0, DEFAULT_MENU_ITEMS);
    if count < 0 {
        exec.send_usage(host);
        return Ok(());
    }
    let mut gui = PaginationGui::create(host, player, "Menu", page_size)?;
    gui.set_sentinels(sentinels.clone())?;
    gui.add_items((1..=count).map(|i| {
        let material = MENU_MATERIALS[i as usize % MENU_MATERIALS.len()];
        ItemStack::new(material).with_title(format!("Item #{}", i))
    }));
    gui.on_inventory_click(|event| {
        if let Some(label) = event.item.as_ref().map(|item| item.label().to_string()) {
            event.reply(format!("You picked {}.", label));
        }
    });
    let pages = gui.page_count();
    guis.lock().expect("gui manager mutex poisoned").open(host, gui)?;
    exec.reply(host, &format!("Opened a menu with {} item(s) on {} page(s).", count, pages));
    Ok(())
}
