//! # Host Abstraction
//!
//! The game-server runtime owns actors, containers and the event thread. The
//! toolkit only talks to it through the two narrow traits in this module:
//!
//! - [`ActorHost`] - message delivery and permission lookups (command pipeline)
//! - [`ContainerHost`] - inventory container primitives (GUI layer)
//!
//! [`memory::MemoryHost`] implements both in memory and backs the test suite
//! and the `plugkit replay` subcommand.

pub mod memory;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::KitResult;

/// Stable identity of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an actor is a player-like entity or a passive sender such as the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    #[serde(alias = "player")]
    Interactive,
    #[serde(alias = "console")]
    Passive,
}

/// Snapshot of the entity that issued a command or owns a GUI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub kind: ActorKind,
}

impl Actor {
    pub fn new(id: ActorId, name: impl Into<String>, kind: ActorKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }

    /// Interactive actor with a fresh random id.
    pub fn player(name: impl Into<String>) -> Self {
        Self::new(ActorId(Uuid::new_v4()), name, ActorKind::Interactive)
    }

    /// The server console. Always the nil id.
    pub fn console() -> Self {
        Self::new(ActorId(Uuid::nil()), "CONSOLE", ActorKind::Passive)
    }

    pub fn is_interactive(&self) -> bool {
        self.kind == ActorKind::Interactive
    }
}

/// Opaque host handle for one inventory container. Equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(u64);

impl ContainerId {
    pub const fn new(raw: u64) -> Self {
        ContainerId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// A display item placed into a container slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub material: String,
    #[serde(default = "default_amount")]
    pub amount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<String>,
}

fn default_amount() -> u32 {
    1
}

impl ItemStack {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            amount: 1,
            display_name: None,
            lore: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.display_name = Some(title.into());
        self
    }

    pub fn with_lore<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lore = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount.max(1);
        self
    }

    /// True when both items carry a display name and the names match ignoring ASCII case.
    pub fn same_display_name(&self, other: &ItemStack) -> bool {
        match (&self.display_name, &other.display_name) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }

    /// Label used in layouts and logs: display name if set, material otherwise.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.material)
    }
}

/// Actor-facing host primitives used by the command pipeline.
pub trait ActorHost {
    /// One-way text delivery.
    fn send_message(&mut self, actor: &Actor, text: &str);

    fn has_permission(&self, actor: &Actor, node: &str) -> bool;
}

/// Container primitives used by the GUI layer.
pub trait ContainerHost {
    /// Allocate a container of `size` slots owned by `owner`.
    fn create_container(
        &mut self,
        owner: &Actor,
        title: &str,
        size: usize,
    ) -> KitResult<ContainerId>;

    /// Show `container` to `viewer`.
    fn open_container(&mut self, viewer: &Actor, container: ContainerId) -> KitResult<()>;

    fn set_slot(
        &mut self,
        container: ContainerId,
        index: usize,
        item: Option<ItemStack>,
    ) -> KitResult<()>;

    fn clear_container(&mut self, container: ContainerId) -> KitResult<()>;

    /// Current slot contents, `None` if the container no longer exists.
    fn contents(&self, container: ContainerId) -> Option<Vec<Option<ItemStack>>>;

    /// Whether `actor` currently has `container` open.
    fn is_viewing(&self, actor: &Actor, container: ContainerId) -> bool;

    /// Close `container` for `viewer`. A no-op if they are not viewing it.
    fn close_container(&mut self, viewer: &Actor, container: ContainerId) -> KitResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_match_ignores_case_and_requires_names() {
        let a = ItemStack::new("ARROW").with_title("Next Page");
        let b = ItemStack::new("PAPER").with_title("next page");
        let plain = ItemStack::new("ARROW");
        assert!(a.same_display_name(&b));
        assert!(!a.same_display_name(&plain));
        assert!(!plain.same_display_name(&plain.clone()));
    }

    #[test]
    fn console_is_passive_with_nil_id() {
        let c = Actor::console();
        assert!(!c.is_interactive());
        assert_eq!(c.id.0, Uuid::nil());
        assert!(Actor::player("alice").is_interactive());
    }

    #[test]
    fn actor_kind_accepts_player_alias() {
        let k: ActorKind = serde_json::from_str("\"player\"").unwrap();
        assert_eq!(k, ActorKind::Interactive);
        let k: ActorKind = serde_json::from_str("\"passive\"").unwrap();
        assert_eq!(k, ActorKind::Passive);
    }
}
