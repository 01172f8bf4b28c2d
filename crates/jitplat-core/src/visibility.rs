//! Accelerator visibility allow-lists.
//!
//! A session may restrict which accelerator ordinals are visible through a
//! comma-separated list such as `"0,2"`. An empty list means no restriction.

use std::collections::BTreeSet;

use crate::error::{CoreError, Result};

/// An optional set of visible device ordinals. `None` means unrestricted.
pub type AllowedDevices = Option<BTreeSet<i32>>;

/// Parse a comma-separated allow-list.
///
/// The empty string yields `None`. Every other input must be a list of
/// signed integers; surrounding ASCII whitespace on a token is ignored.
/// Duplicates collapse.
pub fn parse_visible_device_list(visible_device_list: &str) -> Result<AllowedDevices> {
    if visible_device_list.is_empty() {
        return Ok(None);
    }

    let mut ids = BTreeSet::new();
    for entry in visible_device_list.split(',') {
        let id = entry
            .trim_matches(|c: char| c.is_ascii_whitespace())
            .parse::<i32>()
            .map_err(|_| CoreError::InvalidVisibleDeviceEntry {
                entry: entry.to_string(),
                list: visible_device_list.to_string(),
            })?;
        ids.insert(id);
    }
    Ok(Some(ids))
}

/// Collect ordinals into a restricting allow-list.
pub fn allow_list(ordinals: impl IntoIterator<Item = i32>) -> AllowedDevices {
    Some(ordinals.into_iter().collect())
}
