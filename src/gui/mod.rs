//! # Inventory GUIs
//!
//! A GUI is one open container bound to one owner and a set of click
//! callbacks. The host delivers every click and close event to the
//! [`GuiManager`], which looks the container up and hands the event to the
//! matching GUI's [`GuiRouter`]. Events for containers the manager does not
//! know are ignored.
//!
//! - [`click`] - click and close events plus the [`Delivery`] result
//! - [`router`] - per-container callback slot and item handlers
//! - [`pagination`] - [`PaginationGui`], the paged container with sentinel navigation
//! - [`manager`] - the owned registry of open GUIs, with the idle sweep

pub mod click;
pub mod manager;
pub mod pagination;
pub mod router;

pub use click::{ClickEvent, CloseEvent, Delivery};
pub use manager::{GuiManager, SharedGuiManager};
pub use pagination::{Navigation, PaginationGui, Refusal, Sentinels};
pub use router::{ClickCallback, GuiRouter};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{KitError, KitResult};
use crate::host::{Actor, ContainerHost, ContainerId, ItemStack};
use crate::logutil::escape_log;
use crate::validation::{validate_chest_size, validate_paged_size};

/// Container shapes a GUI can be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuiKind {
    /// Three-row chest.
    Chest,
    /// Chest with a custom number of slots (whole rows).
    Custom(usize),
    Anvil,
    /// Crafting grid plus result slot.
    Workbench,
    Paginated(usize),
}

impl GuiKind {
    pub fn capacity(self) -> usize {
        match self {
            GuiKind::Chest => 27,
            GuiKind::Custom(size) | GuiKind::Paginated(size) => size,
            GuiKind::Anvil => 3,
            GuiKind::Workbench => 10,
        }
    }

    pub fn validate(self) -> KitResult<()> {
        let checked = match self {
            GuiKind::Custom(size) => validate_chest_size(size),
            GuiKind::Paginated(size) => validate_paged_size(size),
            GuiKind::Chest | GuiKind::Anvil | GuiKind::Workbench => Ok(()),
        };
        checked.map_err(|e| KitError::config(format!("{:?}: {}", self, e)))
    }
}

/// A fixed-layout GUI: slots are set directly and every click goes to the router.
pub struct BasicGui {
    owner: Actor,
    container: ContainerId,
    title: String,
    kind: GuiKind,
    slots: Vec<Option<ItemStack>>,
    router: GuiRouter,
}

impl BasicGui {
    pub fn create<H: ContainerHost + ?Sized>(
        host: &mut H,
        owner: &Actor,
        title: impl Into<String>,
        kind: GuiKind,
    ) -> KitResult<Self> {
        if let GuiKind::Paginated(_) = kind {
            return Err(KitError::config("paginated GUIs are built with PaginationGui::create"));
        }
        kind.validate()?;
        let title = title.into();
        let container = host.create_container(owner, &title, kind.capacity())?;
        debug!("GUI '{}' created as {} ({:?})", escape_log(&title), container, kind);
        Ok(Self {
            owner: owner.clone(),
            container,
            title,
            kind,
            slots: vec![None; kind.capacity()],
            router: GuiRouter::new(container, owner.clone()),
        })
    }

    pub fn set_item(&mut self, index: usize, item: Option<ItemStack>) -> KitResult<()> {
        let capacity = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            KitError::config(format!("slot {} out of range for {} slots", index, capacity))
        })?;
        *slot = item;
        Ok(())
    }

    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    /// Set the GUI-wide click callback (last write wins).
    pub fn on_inventory_click(&mut self, callback: impl FnMut(&mut ClickEvent) + Send + 'static) {
        self.router.set_click_callback(callback);
    }

    /// Route clicks on items named `name` to `handler` ahead of the GUI-wide callback.
    pub fn on_item_click(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&mut ClickEvent) + Send + 'static,
    ) {
        self.router.on_item_click(name, handler);
    }

    pub fn router(&self) -> &GuiRouter {
        &self.router
    }

    pub fn render<H: ContainerHost + ?Sized>(&self, host: &mut H) -> KitResult<()> {
        host.clear_container(self.container)?;
        for (index, item) in self.slots.iter().enumerate() {
            if item.is_some() {
                host.set_slot(self.container, index, item.clone())?;
            }
        }
        Ok(())
    }
}

/// Any GUI the manager can hold.
pub enum Gui {
    Basic(BasicGui),
    Paged(PaginationGui),
}

impl From<BasicGui> for Gui {
    fn from(gui: BasicGui) -> Self {
        Gui::Basic(gui)
    }
}

impl From<PaginationGui> for Gui {
    fn from(gui: PaginationGui) -> Self {
        Gui::Paged(gui)
    }
}

impl Gui {
    pub fn owner(&self) -> &Actor {
        match self {
            Gui::Basic(g) => &g.owner,
            Gui::Paged(g) => g.owner(),
        }
    }

    pub fn container(&self) -> ContainerId {
        match self {
            Gui::Basic(g) => g.container,
            Gui::Paged(g) => g.container(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Gui::Basic(g) => &g.title,
            Gui::Paged(g) => g.title(),
        }
    }

    pub fn kind(&self) -> GuiKind {
        match self {
            Gui::Basic(g) => g.kind,
            Gui::Paged(g) => g.kind(),
        }
    }

    pub fn router(&self) -> &GuiRouter {
        match self {
            Gui::Basic(g) => &g.router,
            Gui::Paged(g) => g.router(),
        }
    }

    pub fn router_mut(&mut self) -> &mut GuiRouter {
        match self {
            Gui::Basic(g) => &mut g.router,
            Gui::Paged(g) => g.router_mut(),
        }
    }

    /// Set the GUI-wide click callback (last write wins).
    pub fn on_inventory_click(&mut self, callback: impl FnMut(&mut ClickEvent) + Send + 'static) {
        self.router_mut().set_click_callback(callback);
    }

    pub fn on_item_click(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&mut ClickEvent) + Send + 'static,
    ) {
        self.router_mut().on_item_click(name, handler);
    }

    pub fn render<H: ContainerHost + ?Sized>(&self, host: &mut H) -> KitResult<()> {
        match self {
            Gui::Basic(g) => g.render(host),
            Gui::Paged(g) => g.render(host),
        }
    }

    pub fn handle_click<H: ContainerHost + ?Sized>(
        &mut self,
        host: &mut H,
        event: &mut ClickEvent,
    ) -> KitResult<Delivery> {
        match self {
            Gui::Basic(g) => Ok(g.router.deliver_click(event)),
            Gui::Paged(g) => g.handle_click(host, event),
        }
    }

    pub fn as_paged(&self) -> Option<&PaginationGui> {
        match self {
            Gui::Paged(g) => Some(g),
            Gui::Basic(_) => None,
        }
    }

    pub fn as_paged_mut(&mut self) -> Option<&mut PaginationGui> {
        match self {
            Gui::Paged(g) => Some(g),
            Gui::Basic(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;

    #[test]
    fn kind_capacities() {
        assert_eq!(GuiKind::Chest.capacity(), 27);
        assert_eq!(GuiKind::Anvil.capacity(), 3);
        assert_eq!(GuiKind::Workbench.capacity(), 10);
        assert_eq!(GuiKind::Custom(45).capacity(), 45);
        assert!(GuiKind::Custom(10).validate().is_err());
        assert!(GuiKind::Paginated(9).validate().is_err());
    }

    #[test]
    fn basic_gui_renders_set_items() {
        let mut host = MemoryHost::new();
        let owner = Actor::player("alice");
        let mut gui = BasicGui::create(&mut host, &owner, "Forge", GuiKind::Anvil).unwrap();
        gui.set_item(0, Some(ItemStack::new("IRON_SWORD"))).unwrap();
        assert!(gui.set_item(3, None).is_err());
        gui.render(&mut host).unwrap();
        let contents = host.contents(gui.container).unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].as_ref().unwrap().material, "IRON_SWORD");
    }

    #[test]
    fn basic_gui_accepts_callbacks_before_conversion() {
        let mut host = MemoryHost::new();
        let owner = Actor::player("alice");
        let mut gui = BasicGui::create(&mut host, &owner, "Shop", GuiKind::Chest).unwrap();
        gui.set_item(2, Some(ItemStack::new("EMERALD").with_title("Buy"))).unwrap();
        gui.on_inventory_click(|e| e.reply("any slot"));
        gui.on_item_click("BUY", |e| {
            e.cancel();
            e.reply("bought");
        });
        assert!(gui.router().has_click_callback());

        let container = gui.container;
        let mut gui: Gui = gui.into();
        let item = Some(ItemStack::new("EMERALD").with_title("Buy"));
        let mut on_item = ClickEvent::new(container, owner.clone(), Some(2), item);
        assert_eq!(gui.handle_click(&mut host, &mut on_item).unwrap(), Delivery::Forwarded);
        assert!(on_item.is_cancelled());
        assert_eq!(on_item.take_replies(), vec!["bought", "any slot"]);

        let mut elsewhere = ClickEvent::new(container, owner, Some(5), None);
        assert_eq!(gui.handle_click(&mut host, &mut elsewhere).unwrap(), Delivery::Forwarded);
        assert!(!elsewhere.is_cancelled());
        assert_eq!(elsewhere.take_replies(), vec!["any slot"]);
    }

    #[test]
    fn basic_gui_refuses_paginated_kind() {
        let mut host = MemoryHost::new();
        let owner = Actor::player("alice");
        assert!(BasicGui::create(&mut host, &owner, "x", GuiKind::Paginated(27)).is_err());
    }
}
