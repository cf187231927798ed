//! Binds one open container to its click callbacks.
//!
//! A router forwards a click only when the event's container is the one it was
//! created for. The GUI-wide callback slot is last-write-wins; a click with no
//! callback set is dropped. A close event for the container unregisters the
//! router, after which every event is ignored.
use log::{debug, trace};

use super::click::{ClickEvent, CloseEvent, Delivery};
use crate::host::{Actor, ContainerId};

pub type ClickCallback = Box<dyn FnMut(&mut ClickEvent) + Send>;

pub struct GuiRouter {
    container: ContainerId,
    owner: Actor,
    callback: Option<ClickCallback>,
    item_handlers: Vec<(String, ClickCallback)>,
    listening: bool,
}

impl GuiRouter {
    pub fn new(container: ContainerId, owner: Actor) -> Self {
        Self {
            container,
            owner,
            callback: None,
            item_handlers: Vec::new(),
            listening: true,
        }
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn owner(&self) -> &Actor {
        &self.owner
    }

    /// Replace the GUI-wide click callback.
    pub fn set_click_callback(&mut self, callback: impl FnMut(&mut ClickEvent) + Send + 'static) {
        if self.callback.replace(Box::new(callback)).is_some() {
            debug!("{}: click callback replaced", self.container);
        }
    }

    pub fn has_click_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Route clicks on items displayed as `name` (ASCII case-insensitive) to
    /// `handler`, ahead of the GUI-wide callback. Re-registering a name replaces
    /// its handler.
    pub fn on_item_click(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&mut ClickEvent) + Send + 'static,
    ) {
        let name = name.into();
        let handler: ClickCallback = Box::new(handler);
        match self
            .item_handlers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = handler,
            None => self.item_handlers.push((name, handler)),
        }
    }

    pub fn deliver_click(&mut self, event: &mut ClickEvent) -> Delivery {
        if !self.listening || event.container != self.container {
            return Delivery::Ignored;
        }
        let mut delivered = false;
        if let Some(name) = event.item.as_ref().and_then(|i| i.display_name.clone()) {
            if let Some((_, handler)) = self
                .item_handlers
                .iter_mut()
                .find(|(n, _)| n.eq_ignore_ascii_case(&name))
            {
                handler(event);
                delivered = true;
            }
        }
        if let Some(callback) = self.callback.as_mut() {
            callback(event);
            delivered = true;
        }
        if delivered {
            Delivery::Forwarded
        } else {
            trace!("{}: click dropped, no callback set", self.container);
            Delivery::Dropped
        }
    }

    /// Returns true if this close event tore the router down.
    pub fn deliver_close(&mut self, event: &CloseEvent) -> bool {
        if event.container != self.container {
            return false;
        }
        self.unregister()
    }

    /// Stop listening and drop all callbacks. Returns false if already unregistered.
    pub fn unregister(&mut self) -> bool {
        if !self.listening {
            return false;
        }
        self.listening = false;
        self.callback = None;
        self.item_handlers.clear();
        debug!("{}: router unregistered", self.container);
        true
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }
}
