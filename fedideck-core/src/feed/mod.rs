// Fedideck - A multi-column Mastodon desktop client
// Copyright (C) 2025 Fedideck Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Column reconciliation
//!
//! Incoming posts, notifications and conversations (from polling, streaming
//! or finished actions) are matched against what a column already shows. The
//! feeds here own that bookkeeping and report every visible consequence as a
//! [`FeedChange`] for the UI to apply.

mod flat;
mod posts;
mod schedule;

pub use flat::*;
pub use posts::*;
pub use schedule::*;

use serde::Serialize;
use std::cmp::Ordering;

/// A change the UI has to mirror
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum FeedChange<E> {
    /// New entry at `index` among the roots, or among the replies of `parent`
    Inserted {
        id: String,
        index: usize,
        parent: Option<String>,
        entry: E,
    },
    /// A root entry moved to `index` among the replies of the parent it was
    /// waiting for
    Reparented {
        id: String,
        parent: String,
        index: usize,
    },
    /// Counters, flags or content of a known entry changed
    Updated { id: String, entry: E },
    /// The content of a known post changed on the server
    Edited { id: String },
    Removed { id: String },
}

/// Order two status/notification ids.
///
/// Mastodon ids are decimal snowflakes of varying width, so plain string
/// comparison misorders "999" and "1000". Non-numeric ids (other server
/// software) fall back to string order.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    fn numeric(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit())
    }

    if numeric(a) && numeric(b) {
        let a = a.trim_start_matches('0');
        let b = b.trim_start_matches('0');
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    } else {
        a.cmp(b)
    }
}

/// The larger of two optional ids
pub fn newest_id<'a>(current: Option<&'a str>, candidate: &'a str) -> &'a str {
    match current {
        Some(current) if compare_ids(current, candidate) != Ordering::Less => current,
        _ => candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_compare_by_value() {
        assert_eq!(compare_ids("999", "1000"), Ordering::Less);
        assert_eq!(compare_ids("109876543210987654", "109876543210987653"), Ordering::Greater);
        assert_eq!(compare_ids("0042", "42"), Ordering::Equal);
    }

    #[test]
    fn non_numeric_ids_compare_as_strings() {
        assert_eq!(compare_ids("AbCd", "AbCe"), Ordering::Less);
        assert_eq!(compare_ids("9", "A1"), Ordering::Less);
    }

    #[test]
    fn newest_id_keeps_the_larger_value() {
        assert_eq!(newest_id(None, "5"), "5");
        assert_eq!(newest_id(Some("10"), "9"), "10");
        assert_eq!(newest_id(Some("9"), "10"), "10");
    }
}
