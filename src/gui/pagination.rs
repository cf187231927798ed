//! Paged container GUI.
//!
//! The last row of the container is the control row; every other slot shows
//! content. With `ipp = capacity - 9` items per page, page `p` shows the
//! window `[p * ipp, p * ipp + ipp)` of the item list. The control row holds
//! the backward sentinel in its first slot, the page indicator in its middle
//! slot and the forward sentinel in its last slot.
//!
//! Navigation guards:
//!
//! - advance from `p` only while `items.len() > (p + 1) * ipp`, so no page is
//!   ever rendered empty;
//! - retreat only while `p > 0`.
//!
//! Sentinels are recognised by display name, ignoring ASCII case. Clicks on
//! either navigation sentinel are always consumed, whether or not the page
//! moved. Every other click is cancelled and then forwarded to the router.
use log::{debug, trace};

use super::click::{ClickEvent, Delivery};
use super::router::GuiRouter;
use super::GuiKind;
use crate::error::{KitError, KitResult};
use crate::host::{Actor, ContainerHost, ContainerId, ItemStack};
use crate::logutil::escape_log;
use crate::metrics;
use crate::validation::{validate_paged_size, ROW_SIZE};

/// Slots reserved at the bottom of a paged container.
pub const CONTROL_ROW: usize = ROW_SIZE;

const BACKWARD_OFFSET: usize = 0;
const INDICATOR_OFFSET: usize = 4;
const FORWARD_OFFSET: usize = 8;

/// The three control items of a paged GUI.
///
/// The indicator's display name may use `{page}` and `{pages}` (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinels {
    pub forward: ItemStack,
    pub backward: ItemStack,
    pub indicator: ItemStack,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            forward: ItemStack::new("ARROW").with_title("Next Page"),
            backward: ItemStack::new("ARROW").with_title("Previous Page"),
            indicator: ItemStack::new("PAPER").with_title("Page {page}/{pages}"),
        }
    }
}

impl Sentinels {
    /// Navigation sentinels need distinct display names, or clicks could not
    /// be told apart.
    pub fn validate(&self) -> KitResult<()> {
        for (role, item) in [
            ("forward", &self.forward),
            ("backward", &self.backward),
            ("indicator", &self.indicator),
        ] {
            if item.display_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                return Err(KitError::config(format!("{} sentinel needs a display name", role)));
            }
        }
        if self.forward.same_display_name(&self.backward) {
            return Err(KitError::config(
                "forward and backward sentinels share a display name",
            ));
        }
        Ok(())
    }

    fn indicator_for(&self, page: usize, pages: usize) -> ItemStack {
        let mut item = self.indicator.clone();
        if let Some(name) = item.display_name.as_mut() {
            *name = name
                .replace("{page}", &(page + 1).to_string())
                .replace("{pages}", &pages.to_string());
        }
        item
    }
}

/// Why a navigation click did not move the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// The next page would have no items.
    LastPage,
    /// Already on page 0.
    FirstPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Advanced { from: usize, to: usize },
    Retreated { from: usize, to: usize },
    Refused(Refusal),
    /// Not a navigation click.
    PassThrough,
}

impl Navigation {
    pub fn moved(self) -> bool {
        matches!(self, Navigation::Advanced { .. } | Navigation::Retreated { .. })
    }
}

pub struct PaginationGui {
    owner: Actor,
    container: ContainerId,
    title: String,
    capacity: usize,
    items: Vec<ItemStack>,
    page: usize,
    sentinels: Sentinels,
    router: GuiRouter,
}

impl PaginationGui {
    /// Allocate the backing container. `size` must be a multiple of 9 between 18 and 54.
    pub fn create<H: ContainerHost + ?Sized>(
        host: &mut H,
        owner: &Actor,
        title: impl Into<String>,
        size: usize,
    ) -> KitResult<Self> {
        let title = title.into();
        validate_paged_size(size).map_err(|e| KitError::config(format!("paginated GUI: {}", e)))?;
        let container = host.create_container(owner, &title, size)?;
        debug!(
            "paginated GUI '{}' created as {} for {} ({} slots)",
            escape_log(&title),
            container,
            owner.name,
            size
        );
        Ok(Self {
            owner: owner.clone(),
            container,
            title,
            capacity: size,
            items: Vec::new(),
            page: 0,
            sentinels: Sentinels::default(),
            router: GuiRouter::new(container, owner.clone()),
        })
    }

    pub fn owner(&self) -> &Actor {
        &self.owner
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> GuiKind {
        GuiKind::Paginated(self.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn items_per_page(&self) -> usize {
        self.capacity - CONTROL_ROW
    }

    pub fn add_item(&mut self, item: ItemStack) {
        self.items.push(item);
    }

    pub fn add_items(&mut self, items: impl IntoIterator<Item = ItemStack>) {
        self.items.extend(items);
    }

    /// Remove all content and return to the first page.
    pub fn clear_items(&mut self) {
        self.items.clear();
        self.page = 0;
    }

    pub fn items(&self) -> &[ItemStack] {
        &self.items
    }

    pub fn sentinels(&self) -> &Sentinels {
        &self.sentinels
    }

    /// Replace all three sentinels at once.
    pub fn set_sentinels(&mut self, sentinels: Sentinels) -> KitResult<()> {
        sentinels.validate()?;
        self.sentinels = sentinels;
        Ok(())
    }

    pub fn set_forward_sentinel(&mut self, item: ItemStack) -> KitResult<()> {
        self.set_sentinels(Sentinels {
            forward: item,
            ..self.sentinels.clone()
        })
    }

    pub fn set_backward_sentinel(&mut self, item: ItemStack) -> KitResult<()> {
        self.set_sentinels(Sentinels {
            backward: item,
            ..self.sentinels.clone()
        })
    }

    pub fn set_page_indicator(&mut self, item: ItemStack) -> KitResult<()> {
        self.set_sentinels(Sentinels {
            indicator: item,
            ..self.sentinels.clone()
        })
    }

    /// Zero-based current page.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages; an empty GUI still has one.
    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.items_per_page()).max(1)
    }

    pub fn can_advance(&self) -> bool {
        self.items.len() > (self.page + 1) * self.items_per_page()
    }

    pub fn can_retreat(&self) -> bool {
        self.page > 0
    }

    pub fn advance(&mut self) -> Navigation {
        if !self.can_advance() {
            return Navigation::Refused(Refusal::LastPage);
        }
        let from = self.page;
        self.page += 1;
        metrics::inc_page_turn();
        Navigation::Advanced { from, to: self.page }
    }

    pub fn retreat(&mut self) -> Navigation {
        if !self.can_retreat() {
            return Navigation::Refused(Refusal::FirstPage);
        }
        let from = self.page;
        self.page -= 1;
        metrics::inc_page_turn();
        Navigation::Retreated { from, to: self.page }
    }

    /// Apply the navigation a click on `item` asks for.
    pub fn navigate(&mut self, item: Option<&ItemStack>) -> Navigation {
        match item {
            Some(item) if item.same_display_name(&self.sentinels.forward) => self.advance(),
            Some(item) if item.same_display_name(&self.sentinels.backward) => self.retreat(),
            _ => Navigation::PassThrough,
        }
    }

    /// Slot contents for the current page. Pure; [`render`](Self::render) writes it out.
    pub fn layout(&self) -> Vec<Option<ItemStack>> {
        let ipp = self.items_per_page();
        let start = (self.page * ipp).min(self.items.len());
        let end = (start + ipp).min(self.items.len());

        let mut slots: Vec<Option<ItemStack>> = vec![None; self.capacity];
        for (slot, item) in slots.iter_mut().zip(&self.items[start..end]) {
            *slot = Some(item.clone());
        }
        let control = self.capacity - CONTROL_ROW;
        slots[control + BACKWARD_OFFSET] = Some(self.sentinels.backward.clone());
        slots[control + INDICATOR_OFFSET] =
            Some(self.sentinels.indicator_for(self.page, self.page_count()));
        slots[control + FORWARD_OFFSET] = Some(self.sentinels.forward.clone());
        slots
    }

    /// Clear the container and write the current page into it.
    pub fn render<H: ContainerHost + ?Sized>(&self, host: &mut H) -> KitResult<()> {
        host.clear_container(self.container)?;
        for (index, item) in self.layout().into_iter().enumerate() {
            if item.is_some() {
                host.set_slot(self.container, index, item)?;
            }
        }
        trace!("{} rendered page {}/{}", self.container, self.page + 1, self.page_count());
        Ok(())
    }

    /// Render, then show the container to its owner.
    pub fn open<H: ContainerHost + ?Sized>(&self, host: &mut H) -> KitResult<()> {
        self.render(host)?;
        host.open_container(&self.owner, self.container)
    }

    pub fn router(&self) -> &GuiRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut GuiRouter {
        &mut self.router
    }

    pub fn on_inventory_click(&mut self, callback: impl FnMut(&mut ClickEvent) + Send + 'static) {
        self.router.set_click_callback(callback);
    }

    /// Navigate on sentinel clicks, forward everything else.
    pub fn handle_click<H: ContainerHost + ?Sized>(
        &mut self,
        host: &mut H,
        event: &mut ClickEvent,
    ) -> KitResult<Delivery> {
        if event.container != self.container || !self.router.is_listening() {
            return Ok(Delivery::Ignored);
        }
        event.cancel();
        match self.navigate(event.item.as_ref()) {
            Navigation::PassThrough => Ok(self.router.deliver_click(event)),
            Navigation::Refused(reason) => {
                debug!(
                    "{}: navigation refused ({:?}) on page {}",
                    self.container, reason, self.page
                );
                Ok(Delivery::Consumed)
            }
            moved => {
                debug!("{}: {:?}", self.container, moved);
                self.render(host)?;
                Ok(Delivery::Consumed)
            }
        }
    }
}
