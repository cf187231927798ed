//! Registry of open GUIs keyed by container.
//!
//! Entries are inserted by [`GuiManager::open`] and removed by a close event,
//! an explicit [`GuiManager::unregister`], [`GuiManager::unregister_all`] or
//! the idle [`GuiManager::sweep`]. A container maps to at most one entry.
//!
//! The manager itself does no locking. Hosts that touch it from timers or
//! async tasks as well as the event thread wrap it in a [`SharedGuiManager`].
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, trace, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::click::{ClickEvent, CloseEvent, Delivery};
use super::pagination::PaginationGui;
use super::Gui;
use crate::config::GuiConfig;
use crate::error::{KitError, KitResult};
use crate::host::{ActorHost, ContainerHost, ContainerId};
use crate::logutil::escape_log;
use crate::metrics;

pub type SharedGuiManager = Arc<Mutex<GuiManager>>;

struct Entry {
    gui: Gui,
    last_activity: DateTime<Utc>,
}

pub struct GuiManager {
    entries: BTreeMap<ContainerId, Entry>,
    max_idle: Duration,
}

impl GuiManager {
    pub fn new(max_idle: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_idle,
        }
    }

    pub fn from_config(config: &GuiConfig) -> Self {
        Self::new(config.max_idle())
    }

    pub fn shared(self) -> SharedGuiManager {
        Arc::new(Mutex::new(self))
    }

    /// Render the GUI, show it to its owner and start routing its events.
    pub fn open<H: ContainerHost + ?Sized>(
        &mut self,
        host: &mut H,
        gui: impl Into<Gui>,
    ) -> KitResult<ContainerId> {
        let gui = gui.into();
        let container = gui.container();
        if self.entries.contains_key(&container) {
            return Err(KitError::config(format!("{} is already registered", container)));
        }
        gui.render(host)?;
        host.open_container(gui.owner(), container)?;
        info!(
            "opened '{}' ({}) for {}",
            escape_log(gui.title()),
            container,
            gui.owner().name
        );
        self.entries.insert(
            container,
            Entry {
                gui,
                last_activity: Utc::now(),
            },
        );
        metrics::inc_gui_opened();
        Ok(container)
    }

    /// Route a click to the GUI registered for its container, then send any
    /// replies the callbacks queued.
    pub fn on_click<H>(&mut self, host: &mut H, event: &mut ClickEvent) -> KitResult<Delivery>
    where
        H: ActorHost + ContainerHost + ?Sized,
    {
        let Some(entry) = self.entries.get_mut(&event.container) else {
            trace!("click on unregistered {} ignored", event.container);
            return Ok(Delivery::Ignored);
        };
        entry.last_activity = Utc::now();
        let delivery = entry.gui.handle_click(host, event)?;
        for text in event.take_replies() {
            host.send_message(&event.actor, &text);
        }
        Ok(delivery)
    }

    /// Tear down the GUI for a closed container. Unknown containers are
    /// ignored; returns whether an entry was removed.
    pub fn on_close(&mut self, event: &CloseEvent) -> bool {
        let closed = match self.entries.get_mut(&event.container) {
            Some(entry) => entry.gui.router_mut().deliver_close(event),
            None => {
                trace!("close of unregistered {} ignored", event.container);
                return false;
            }
        };
        if closed {
            self.entries.remove(&event.container);
            metrics::inc_gui_closed();
            debug!("{} closed by {}", event.container, event.actor.name);
        }
        closed
    }

    /// Remove a GUI without waiting for a close event. Idempotent.
    pub fn unregister(&mut self, container: ContainerId) -> bool {
        match self.entries.remove(&container) {
            Some(mut entry) => {
                entry.gui.router_mut().unregister();
                metrics::inc_gui_closed();
                true
            }
            None => false,
        }
    }

    /// Remove every GUI, e.g. on plugin shutdown. Returns how many were removed.
    pub fn unregister_all(&mut self) -> usize {
        let count = self.entries.len();
        for (_, mut entry) in std::mem::take(&mut self.entries) {
            entry.gui.router_mut().unregister();
            metrics::inc_gui_closed();
        }
        if count > 0 {
            info!("unregistered {} GUI(s)", count);
        }
        count
    }

    /// Drop entries whose owner no longer views the container, covering close
    /// events the host never delivered. Entries idle for longer than the limit
    /// are closed on the host first, so no container stays on screen without
    /// a router cancelling its clicks. An entry whose close fails is kept.
    pub fn sweep<H: ContainerHost + ?Sized>(
        &mut self,
        host: &mut H,
        now: DateTime<Utc>,
    ) -> Vec<ContainerId> {
        let max_idle = self.max_idle;
        let candidates: Vec<ContainerId> = self
            .entries
            .iter()
            .filter(|(container, entry)| {
                !host.is_viewing(entry.gui.owner(), **container)
                    || now - entry.last_activity > max_idle
            })
            .map(|(container, _)| *container)
            .collect();

        let mut stale = Vec::with_capacity(candidates.len());
        for container in candidates {
            let Some(entry) = self.entries.get(&container) else {
                continue;
            };
            let owner = entry.gui.owner();
            if host.is_viewing(owner, container) {
                if let Err(e) = host.close_container(owner, container) {
                    warn!("sweep could not close idle {} for {}: {}", container, owner.name, e);
                    continue;
                }
                debug!("closed idle {} for {}", container, owner.name);
            }
            if let Some(mut entry) = self.entries.remove(&container) {
                entry.gui.router_mut().unregister();
                stale.push(container);
            }
        }
        if !stale.is_empty() {
            metrics::add_gui_swept(stale.len() as u64);
            info!("sweep removed {} stale GUI(s): {:?}", stale.len(), stale);
        }
        stale
    }

    pub fn get(&self, container: ContainerId) -> Option<&Gui> {
        self.entries.get(&container).map(|e| &e.gui)
    }

    pub fn get_mut(&mut self, container: ContainerId) -> Option<&mut Gui> {
        self.entries.get_mut(&container).map(|e| &mut e.gui)
    }

    pub fn paged_mut(&mut self, container: ContainerId) -> Option<&mut PaginationGui> {
        self.get_mut(container).and_then(Gui::as_paged_mut)
    }

    pub fn contains(&self, container: ContainerId) -> bool {
        self.entries.contains_key(&container)
    }

    pub fn containers(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for GuiManager {
    fn default() -> Self {
        Self::from_config(&GuiConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::{BasicGui, GuiKind};
    use crate::host::memory::MemoryHost;
    use crate::host::{Actor, ItemStack};

    #[test]
    fn open_registers_and_shows() {
        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        let mut mgr = GuiManager::default();
        let gui = BasicGui::create(&mut host, &alice, "Chest", GuiKind::Chest).unwrap();
        let id = mgr.open(&mut host, gui).unwrap();
        assert!(mgr.contains(id));
        assert!(host.is_viewing(&alice, id));
    }

    #[test]
    fn replies_are_sent_to_the_clicker() {
        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        let mut mgr = GuiManager::default();
        let mut gui: Gui = BasicGui::create(&mut host, &alice, "Chest", GuiKind::Chest)
            .unwrap()
            .into();
        gui.on_inventory_click(|e| {
            let slot = e.slot.unwrap_or_default();
            e.reply(format!("clicked {}", slot));
        });
        let id = mgr.open(&mut host, gui).unwrap();
        let mut ev = ClickEvent::new(id, alice.clone(), Some(4), None);
        assert_eq!(mgr.on_click(&mut host, &mut ev).unwrap(), Delivery::Forwarded);
        assert_eq!(host.messages_for(&alice), vec!["clicked 4"]);
    }

    #[test]
    fn sweep_removes_unviewed_and_idle() {
        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        let bob = Actor::player("bob");
        let mut mgr = GuiManager::new(Duration::minutes(30));
        let gui_a = BasicGui::create(&mut host, &alice, "A", GuiKind::Chest).unwrap();
        let a = mgr.open(&mut host, gui_a).unwrap();
        let gui_b = BasicGui::create(&mut host, &bob, "B", GuiKind::Chest).unwrap();
        let b = mgr.open(&mut host, gui_b).unwrap();

        host.close_view(&bob);
        assert_eq!(mgr.sweep(&mut host, Utc::now()), vec![b]);
        assert!(mgr.contains(a));

        assert!(mgr.sweep(&mut host, Utc::now() + Duration::minutes(10)).is_empty());
        assert_eq!(mgr.sweep(&mut host, Utc::now() + Duration::minutes(31)), vec![a]);
        assert!(mgr.is_empty());
        assert!(!host.is_viewing(&alice, a));
    }

    #[test]
    fn idle_sweep_leaves_no_unguarded_paged_gui_on_screen() {
        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        let bob = Actor::player("bob");
        let mut mgr = GuiManager::new(Duration::minutes(30));
        let mut open_paged = |host: &mut MemoryHost, owner: &Actor| {
            let mut gui = PaginationGui::create(host, owner, "Shop", 18).unwrap();
            gui.add_items((1..=12).map(|i| ItemStack::new("STONE").with_title(format!("#{}", i))));
            mgr.open(host, gui).unwrap()
        };
        let idle = open_paged(&mut host, &alice);
        let busy = open_paged(&mut host, &bob);

        let later = Utc::now() + Duration::minutes(31);
        mgr.entries.get_mut(&busy).unwrap().last_activity = later;
        assert_eq!(mgr.sweep(&mut host, later), vec![idle]);
        assert!(!host.is_viewing(&alice, idle));
        assert!(host.is_viewing(&bob, busy));

        let mut ev = ClickEvent::new(busy, bob.clone(), Some(0), None);
        assert_eq!(mgr.on_click(&mut host, &mut ev).unwrap(), Delivery::Dropped);
        assert!(ev.is_cancelled());
    }
}
