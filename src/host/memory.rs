//! In-memory host used by tests and the replay CLI.
//!
//! Messages are appended to a log, permissions are plain string sets (with
//! `prefix.*` and `*` wildcards), and each actor views at most one container.
use log::trace;
use std::collections::{HashMap, HashSet};

use super::{Actor, ActorHost, ActorId, ActorKind, ContainerHost, ContainerId, ItemStack};
use crate::error::{KitError, KitResult};
use crate::logutil::escape_log;

/// Largest container the host hands out (six rows).
pub const MAX_CONTAINER_SIZE: usize = 54;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: ActorId,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct MemoryContainer {
    pub owner: ActorId,
    pub title: String,
    pub slots: Vec<Option<ItemStack>>,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    next_container: u64,
    containers: HashMap<ContainerId, MemoryContainer>,
    viewing: HashMap<ActorId, ContainerId>,
    permissions: HashMap<ActorId, HashSet<String>>,
    messages: Vec<SentMessage>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_permission(&mut self, actor: &Actor, node: impl Into<String>) {
        self.permissions
            .entry(actor.id)
            .or_default()
            .insert(node.into());
    }

    pub fn revoke_permission(&mut self, actor: &Actor, node: &str) {
        if let Some(set) = self.permissions.get_mut(&actor.id) {
            set.remove(node);
        }
    }

    pub fn messages(&self) -> &[SentMessage] {
        &self.messages
    }

    pub fn messages_for(&self, actor: &Actor) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.to == actor.id)
            .map(|m| m.text.as_str())
            .collect()
    }

    pub fn take_messages(&mut self) -> Vec<SentMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn container(&self, id: ContainerId) -> Option<&MemoryContainer> {
        self.containers.get(&id)
    }

    /// Container the actor has open, if any.
    pub fn viewed_by(&self, actor: &Actor) -> Option<ContainerId> {
        self.viewing.get(&actor.id).copied()
    }

    /// Simulate the actor closing their open container. Returns the closed
    /// container so the caller can deliver the matching close event.
    pub fn close_view(&mut self, actor: &Actor) -> Option<ContainerId> {
        self.viewing.remove(&actor.id)
    }

    /// Drop a container entirely, as if the host discarded it.
    pub fn discard_container(&mut self, id: ContainerId) -> bool {
        self.viewing.retain(|_, c| *c != id);
        self.containers.remove(&id).is_some()
    }

    fn container_mut(&mut self, id: ContainerId) -> KitResult<&mut MemoryContainer> {
        self.containers
            .get_mut(&id)
            .ok_or(KitError::UnknownContainer(id))
    }
}

impl ActorHost for MemoryHost {
    fn send_message(&mut self, actor: &Actor, text: &str) {
        trace!("message to {}: {}", actor.name, escape_log(text));
        self.messages.push(SentMessage {
            to: actor.id,
            text: text.to_string(),
        });
    }

    fn has_permission(&self, actor: &Actor, node: &str) -> bool {
        if actor.kind == ActorKind::Passive {
            return true;
        }
        let Some(granted) = self.permissions.get(&actor.id) else {
            return false;
        };
        granted.iter().any(|g| {
            g == "*"
                || g == node
                || g.strip_suffix(".*").is_some_and(|prefix| {
                    node.starts_with(prefix) && node[prefix.len()..].starts_with('.')
                })
        })
    }
}

impl ContainerHost for MemoryHost {
    fn create_container(
        &mut self,
        owner: &Actor,
        title: &str,
        size: usize,
    ) -> KitResult<ContainerId> {
        if size == 0 || size > MAX_CONTAINER_SIZE {
            return Err(KitError::Host(format!(
                "container size {} outside 1..={}",
                size, MAX_CONTAINER_SIZE
            )));
        }
        self.next_container += 1;
        let id = ContainerId::new(self.next_container);
        self.containers.insert(
            id,
            MemoryContainer {
                owner: owner.id,
                title: title.to_string(),
                slots: vec![None; size],
            },
        );
        Ok(id)
    }

    fn open_container(&mut self, viewer: &Actor, container: ContainerId) -> KitResult<()> {
        if !self.containers.contains_key(&container) {
            return Err(KitError::UnknownContainer(container));
        }
        self.viewing.insert(viewer.id, container);
        Ok(())
    }

    fn set_slot(
        &mut self,
        container: ContainerId,
        index: usize,
        item: Option<ItemStack>,
    ) -> KitResult<()> {
        let c = self.container_mut(container)?;
        let size = c.slots.len();
        let slot = c
            .slots
            .get_mut(index)
            .ok_or_else(|| KitError::Host(format!("slot {} out of range (size {})", index, size)))?;
        *slot = item;
        Ok(())
    }

    fn clear_container(&mut self, container: ContainerId) -> KitResult<()> {
        let c = self.container_mut(container)?;
        c.slots.iter_mut().for_each(|s| *s = None);
        Ok(())
    }

    fn contents(&self, container: ContainerId) -> Option<Vec<Option<ItemStack>>> {
        self.containers.get(&container).map(|c| c.slots.clone())
    }

    fn is_viewing(&self, actor: &Actor, container: ContainerId) -> bool {
        self.viewing.get(&actor.id) == Some(&container)
    }

    fn close_container(&mut self, viewer: &Actor, container: ContainerId) -> KitResult<()> {
        if !self.containers.contains_key(&container) {
            return Err(KitError::UnknownContainer(container));
        }
        if self.is_viewing(viewer, container) {
            self.viewing.remove(&viewer.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_permissions() {
        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        host.grant_permission(&alice, "kit.admin.*");
        assert!(host.has_permission(&alice, "kit.admin.reload"));
        assert!(!host.has_permission(&alice, "kit.adminx"));
        assert!(!host.has_permission(&alice, "kit.menu"));
        host.grant_permission(&alice, "*");
        assert!(host.has_permission(&alice, "anything.at.all"));
    }

    #[test]
    fn revoke_removes_node() {
        let mut host = MemoryHost::new();
        let bob = Actor::player("bob");
        host.grant_permission(&bob, "x.y");
        assert!(host.has_permission(&bob, "x.y"));
        host.revoke_permission(&bob, "x.y");
        assert!(!host.has_permission(&bob, "x.y"));
    }

    #[test]
    fn console_holds_every_node() {
        let host = MemoryHost::new();
        assert!(host.has_permission(&Actor::console(), "x.y"));
    }

    #[test]
    fn container_lifecycle() {
        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        let id = host.create_container(&alice, "Box", 9).unwrap();
        host.set_slot(id, 3, Some(ItemStack::new("STONE"))).unwrap();
        assert!(host.set_slot(id, 9, None).is_err());
        host.open_container(&alice, id).unwrap();
        assert!(host.is_viewing(&alice, id));
        assert_eq!(host.close_view(&alice), Some(id));
        assert!(!host.is_viewing(&alice, id));
        host.clear_container(id).unwrap();
        assert!(host.contents(id).unwrap().iter().all(Option::is_none));
        assert!(host.discard_container(id));
        assert!(host.contents(id).is_none());
    }

    #[test]
    fn close_container_only_closes_that_view() {
        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        let a = host.create_container(&alice, "A", 9).unwrap();
        let b = host.create_container(&alice, "B", 9).unwrap();
        host.open_container(&alice, b).unwrap();
        host.close_container(&alice, a).unwrap();
        assert!(host.is_viewing(&alice, b));
        host.close_container(&alice, b).unwrap();
        assert_eq!(host.viewed_by(&alice), None);
        assert!(host.contents(b).is_some());
        assert!(host.close_container(&alice, ContainerId::new(99)).is_err());
    }

    #[test]
    fn rejects_bad_sizes() {
        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        assert!(host.create_container(&alice, "x", 0).is_err());
        assert!(host.create_container(&alice, "x", 55).is_err());
    }
}
