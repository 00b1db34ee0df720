//! Request validation: menu-item acceptance rules and the meeting password
//! rule.
//!
//! Violations are collected, not short-circuited, and answered as one
//! aggregated parameter-error reply with zero state mutation.

use huddle_core::{
    FIRST_INJECTED_MENU_ID, MENU_TITLE_LIMIT, MIC_MENU_ID, MORE_MENU_EXCLUDED_IDS, MenuItem,
    MenuVisibility, WHITEBOARD_MENU_ID,
};

/// Most items either menu may show to one audience (host or member).
const TOOLBAR_ITEM_LIMIT: usize = 7;
const MORE_ITEM_LIMIT: usize = 10;

/// Checks the menu lists of a start/join request.
///
/// Returns one human-readable line per violated rule, in a fixed order.
pub fn menu_violations(toolbar: &[MenuItem], more: &[MenuItem]) -> Vec<String> {
    let mut violations = Vec::new();

    if !more.is_empty() {
        if !ids_unique(toolbar.iter().chain(more.iter())) {
            violations
                .push("the item_id of toolbar_items and more_items cannot be duplicated".to_owned());
        }
        if !visibility_counts_within(more, MORE_ITEM_LIMIT) {
            violations.push("more_items cannot exceed 10 items".to_owned());
        }
        if !ids_at_or_above_floor(more) {
            violations.push(
                "item_id in more_items cannot be less than the first injected menu id".to_owned(),
            );
        }
        if !free_of_reserved_ids(more) {
            violations.push(
                "more_items can not add the mic, camera, manage-participants or chat items"
                    .to_owned(),
            );
        }
        if !titles_and_images_valid(more) {
            violations.push("title or image in more_items is invalid".to_owned());
        }
    } else if !ids_unique(toolbar.iter()) {
        violations.push("item_id in toolbar_items cannot be duplicated".to_owned());
    }

    if !visibility_counts_within(toolbar, TOOLBAR_ITEM_LIMIT) {
        violations.push("toolbar_items cannot exceed 7 items".to_owned());
    }
    if !ids_at_or_above_floor(toolbar) {
        violations.push(
            "item_id in toolbar_items cannot be less than the first injected menu id".to_owned(),
        );
    }
    if !titles_and_images_valid(toolbar) {
        violations.push("title or image in toolbar_items is invalid".to_owned());
    }

    violations
}

/// Checks the start-meeting password rule: empty, or digits only with at
/// least four of them.
pub fn password_violation(password: &str) -> Option<String> {
    if !password.is_empty()
        && (password.len() < 4 || !password.chars().all(|c| c.is_ascii_digit()))
    {
        return Some("The password must contain at least 4 digits".to_owned());
    }
    None
}

/// Joins violations under the "Invalid params:" heading, one per line.
pub fn aggregate_message(violations: &[String]) -> String {
    let mut message = String::from("Invalid params:");
    for line in violations {
        message.push('\n');
        message.push_str(line);
    }
    message
}

fn ids_unique<'a>(items: impl Iterator<Item = &'a MenuItem>) -> bool {
    let mut seen = Vec::new();
    for item in items {
        if seen.contains(&item.item_id) {
            return false;
        }
        seen.push(item.item_id);
    }
    true
}

/// Ids must be registered built-ins or at/above the injected floor.
fn ids_at_or_above_floor(items: &[MenuItem]) -> bool {
    items.iter().all(|item| {
        (MIC_MENU_ID..=WHITEBOARD_MENU_ID).contains(&item.item_id)
            || item.item_id >= FIRST_INJECTED_MENU_ID
    })
}

fn free_of_reserved_ids(items: &[MenuItem]) -> bool {
    !items
        .iter()
        .any(|item| MORE_MENU_EXCLUDED_IDS.contains(&item.item_id))
}

/// Counts the items visible to the host and to ordinary members; both
/// audiences must stay within `limit`.
fn visibility_counts_within(items: &[MenuItem], limit: usize) -> bool {
    let mut host = 0;
    let mut member = 0;
    for item in items {
        let visibility = MenuVisibility::from_wire(item.item_visibility);
        if visibility.visible_to_host() {
            host += 1;
        }
        if visibility.visible_to_member() {
            member += 1;
        }
    }
    host <= limit && member <= limit
}

fn titles_and_images_valid(items: &[MenuItem]) -> bool {
    items.iter().all(|item| {
        let title2 = item.item_title2.trim();
        let image2 = item.item_image2.trim();
        if title2.is_empty() != image2.is_empty() {
            return false;
        }
        if item.item_title.trim().is_empty() || item.item_image.trim().is_empty() {
            return false;
        }
        if item.item_title.chars().count() > MENU_TITLE_LIMIT {
            return false;
        }
        if !title2.is_empty() && item.item_title2.chars().count() > MENU_TITLE_LIMIT {
            return false;
        }
        true
    })
}
