//! Toolbar and "more" menu registries.
//!
//! Validation happens in the dispatcher before items reach this manager;
//! everything here assumes accepted input.

use huddle_core::{MenuItem, default_more_items, default_toolbar_items};
use tracing::debug;
use uuid::Uuid;

/// Holds the active toolbar and "more" menu item lists.
///
/// Injected (non-built-in) items receive a fresh GUID on installation; the
/// GUID is echoed back on click notifications and identifies the item for
/// state updates.
#[derive(Debug)]
pub struct MenuItemManager {
    toolbar: Vec<MenuItem>,
    more: Vec<MenuItem>,
}

impl Default for MenuItemManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuItemManager {
    /// Starts with the built-in presets in both menus.
    pub fn new() -> Self {
        Self {
            toolbar: default_toolbar_items(),
            more: default_more_items(),
        }
    }

    /// The active toolbar items.
    pub fn toolbar(&self) -> &[MenuItem] {
        &self.toolbar
    }

    /// The active "more" menu items.
    pub fn more(&self) -> &[MenuItem] {
        &self.more
    }

    /// Replaces the toolbar; an empty list restores the built-in preset.
    pub fn install_toolbar(&mut self, items: &[MenuItem]) {
        self.toolbar = if items.is_empty() {
            default_toolbar_items()
        } else {
            assign_guids(items)
        };
        debug!(items = self.toolbar.len(), "toolbar installed");
    }

    /// Replaces the "more" menu; an empty list restores the built-in preset.
    pub fn install_more(&mut self, items: &[MenuItem]) {
        self.more = if items.is_empty() {
            default_more_items()
        } else {
            assign_guids(items)
        };
        debug!(items = self.more.len(), "more menu installed");
    }

    /// Registered built-in items for the given ids; all of them when `ids`
    /// is empty.
    pub fn preset_items(&self, ids: &[i32]) -> Vec<MenuItem> {
        default_toolbar_items()
            .into_iter()
            .chain(default_more_items())
            .filter(|item| ids.is_empty() || ids.contains(&item.item_id))
            .collect()
    }

    /// Updates the checked index of the item matching id and guid.
    ///
    /// Returns false when no stored item matches.
    pub fn modify_item(&mut self, item_id: i32, item_guid: &str, checked_index: i32) -> bool {
        let found = self
            .toolbar
            .iter_mut()
            .chain(self.more.iter_mut())
            .find(|item| item.item_id == item_id && item.item_guid == item_guid);
        match found {
            Some(item) => {
                item.item_checked_index = checked_index;
                true
            }
            None => false,
        }
    }
}

/// Clones the list, stamping a fresh GUID onto every injected item.
fn assign_guids(items: &[MenuItem]) -> Vec<MenuItem> {
    items
        .iter()
        .map(|item| {
            let mut item = item.clone();
            if !item.is_built_in() {
                item.item_guid = Uuid::new_v4().to_string();
            }
            item
        })
        .collect()
}
