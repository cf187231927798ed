use crate::host::{Actor, ContainerId, ItemStack};

/// A click inside a container, as delivered by the host.
///
/// Callbacks decide whether the underlying item move happens by cancelling
/// the event. Text queued with [`ClickEvent::reply`] is sent to the clicking
/// actor once delivery finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub container: ContainerId,
    pub actor: Actor,
    /// Raw slot index; `None` for clicks outside the container grid.
    pub slot: Option<usize>,
    /// Item in the clicked slot at click time.
    pub item: Option<ItemStack>,
    cancelled: bool,
    replies: Vec<String>,
}

impl ClickEvent {
    pub fn new(
        container: ContainerId,
        actor: Actor,
        slot: Option<usize>,
        item: Option<ItemStack>,
    ) -> Self {
        Self {
            container,
            actor,
            slot,
            item,
            cancelled: false,
            replies: Vec::new(),
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn reply(&mut self, text: impl Into<String>) {
        self.replies.push(text.into());
    }

    pub fn take_replies(&mut self) -> Vec<String> {
        std::mem::take(&mut self.replies)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    pub container: ContainerId,
    pub actor: Actor,
}

impl CloseEvent {
    pub fn new(container: ContainerId, actor: Actor) -> Self {
        Self { container, actor }
    }
}

/// What happened to a delivered click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to at least one registered callback.
    Forwarded,
    /// Matched the GUI but no callback was set.
    Dropped,
    /// Container not registered (or no longer listening).
    Ignored,
    /// Taken by pagination navigation; not forwarded.
    Consumed,
}
