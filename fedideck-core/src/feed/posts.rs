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

//! Threaded post feed for timeline columns

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{ActionOutcome, ColumnKind, Post, StatusAction, StatusEdit, User};

use super::{compare_ids, FeedChange};

/// Account that boosted a post into this column
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BoostedBy {
    pub id: String,
    pub acct: String,
    pub display_name: String,
    pub url: String,
}

impl From<&User> for BoostedBy {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            acct: user.acct.clone(),
            display_name: user.display_name.clone(),
            url: user.url.clone(),
        }
    }
}

/// A post as a column shows it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostEntry {
    /// The displayed post, already unwrapped if it arrived as a boost
    pub post: Post,
    /// Id used for ordering: the boost's id for boosts, the post's id otherwise
    pub sort_id: String,
    pub boosted_by: Option<BoostedBy>,
    /// Set when the post is shown under its parent
    pub parent: Option<String>,
    /// Replies shown under this post, oldest first
    pub children: Vec<String>,
    pub unread: bool,
    /// A reply whose parent is not in the column yet
    pub orphaned: bool,
    pub authored_by_me: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<StatusEdit>>,
}

/// Timeline column contents with threading and unread state
#[derive(Debug)]
pub struct PostFeed {
    my_id: String,
    counts_unread: bool,
    always_purge: bool,
    entries: HashMap<String, PostEntry>,
    /// Top level posts, newest sort id first
    roots: Vec<String>,
    /// Parent id -> replies waiting for it
    wanted_parents: HashMap<String, Vec<String>>,
    queue: Vec<Post>,
    unread: usize,
}

impl PostFeed {
    pub fn new(kind: &ColumnKind, my_id: &str) -> Self {
        Self {
            my_id: my_id.to_string(),
            counts_unread: kind.counts_unread(),
            always_purge: kind.always_purge(),
            entries: HashMap::new(),
            roots: Vec::new(),
            wanted_parents: HashMap::new(),
            queue: Vec::new(),
            unread: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn entry(&self, id: &str) -> Option<&PostEntry> {
        self.entries.get(id)
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    /// Ids of replies still waiting for `parent_id`
    #[cfg(test)]
    pub fn waiting_for(&self, parent_id: &str) -> &[String] {
        self.wanted_parents
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reconcile one incoming post
    pub fn add_post(&mut self, post: Post) -> Vec<FeedChange<PostEntry>> {
        let sort_id = post.id.clone();
        let (mut post, boosted_by) = unwrap_boost(post);
        normalize_viewer_flags(&mut post);

        let mut changes = Vec::new();
        if self.entries.contains_key(&post.id) {
            self.update_known(post, &mut changes);
        } else {
            self.insert_new(post, sort_id, boosted_by, &mut changes);
        }
        changes
    }

    fn insert_new(
        &mut self,
        post: Post,
        sort_id: String,
        boosted_by: Option<BoostedBy>,
        changes: &mut Vec<FeedChange<PostEntry>>,
    ) {
        let id = post.id.clone();
        let parent_id = post.in_reply_to_id.clone().filter(|p| *p != id);

        let mut entry = PostEntry {
            authored_by_me: !self.my_id.is_empty() && post.account.id == self.my_id,
            post,
            sort_id,
            boosted_by,
            parent: None,
            children: Vec::new(),
            unread: true,
            orphaned: false,
            history: None,
        };
        if self.counts_unread {
            self.unread += 1;
        }

        let known_parent = parent_id
            .as_ref()
            .filter(|p| self.entries.contains_key(p.as_str()))
            .cloned();

        match known_parent {
            Some(parent) => {
                entry.parent = Some(parent.clone());
                let index = self.attach_child(&parent, &id);
                changes.push(FeedChange::Inserted {
                    id: id.clone(),
                    index,
                    parent: Some(parent),
                    entry: entry.clone(),
                });
            }
            None => {
                if let Some(parent) = parent_id {
                    entry.orphaned = true;
                    self.wanted_parents
                        .entry(parent)
                        .or_default()
                        .push(id.clone());
                }
                let index = self.root_index(&entry.sort_id);
                self.roots.insert(index, id.clone());
                changes.push(FeedChange::Inserted {
                    id: id.clone(),
                    index,
                    parent: None,
                    entry: entry.clone(),
                });
            }
        }
        self.entries.insert(id.clone(), entry);

        // Replies that arrived before this post move under it, even when
        // this post is itself shown under its own parent.
        if let Some(waiting) = self.wanted_parents.remove(&id) {
            for child in waiting {
                if !self.entries.contains_key(&child) {
                    continue;
                }
                self.roots.retain(|r| *r != child);
                if let Some(entry) = self.entries.get_mut(&child) {
                    entry.parent = Some(id.clone());
                    entry.orphaned = false;
                }
                let index = self.attach_child(&id, &child);
                changes.push(FeedChange::Reparented {
                    id: child,
                    parent: id.clone(),
                    index,
                });
            }
        }
    }

    fn update_known(&mut self, post: Post, changes: &mut Vec<FeedChange<PostEntry>>) {
        let id = post.id.clone();
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };

        let edited = is_edited(&entry.post, &post);
        entry.post = post;

        let mut newly_unread = false;
        if edited && !entry.unread {
            entry.unread = true;
            newly_unread = true;
        }
        changes.push(FeedChange::Updated {
            id: id.clone(),
            entry: entry.clone(),
        });
        if edited {
            changes.push(FeedChange::Edited { id });
        }
        if newly_unread && self.counts_unread {
            self.unread += 1;
        }
    }

    /// Number of roots that sort at or above `sort_id`
    fn root_index(&self, sort_id: &str) -> usize {
        self.roots
            .iter()
            .take_while(|r| {
                self.entries
                    .get(r.as_str())
                    .map(|e| compare_ids(&e.sort_id, sort_id) != Ordering::Less)
                    .unwrap_or(false)
            })
            .count()
    }

    /// Add `child` to the replies of `parent` in id order, returning its index
    fn attach_child(&mut self, parent: &str, child: &str) -> usize {
        let Some(entry) = self.entries.get_mut(parent) else {
            return 0;
        };
        let index = entry
            .children
            .iter()
            .take_while(|c| compare_ids(c, child) == Ordering::Less)
            .count();
        entry.children.insert(index, child.to_string());
        index
    }

    /// Remove a post and every reply shown under it. `id` may also be the id
    /// of the boost that put a post into the feed.
    pub fn remove_post(&mut self, id: &str) -> Vec<FeedChange<PostEntry>> {
        let mut changes = Vec::new();
        let Some(id) = self.resolve_id(id) else {
            return changes;
        };
        let parent = self.entries.get(&id).and_then(|e| e.parent.clone());

        if let Some(parent) = parent {
            if let Some(entry) = self.entries.get_mut(&parent) {
                entry.children.retain(|c| *c != id);
            }
        }
        self.roots.retain(|r| *r != id);
        self.remove_subtree(&id, &mut changes);
        self.wanted_parents.retain(|_, waiting| !waiting.is_empty());
        changes
    }

    /// Entry key for a post id or a boost wrapper id
    fn resolve_id(&self, id: &str) -> Option<String> {
        if self.entries.contains_key(id) {
            return Some(id.to_string());
        }
        self.entries
            .values()
            .find(|e| e.boosted_by.is_some() && e.sort_id == id)
            .map(|e| e.post.id.clone())
    }

    fn remove_subtree(&mut self, id: &str, changes: &mut Vec<FeedChange<PostEntry>>) {
        let Some(entry) = self.entries.remove(id) else {
            return;
        };
        if entry.unread && self.counts_unread {
            self.unread = self.unread.saturating_sub(1);
        }
        for waiting in self.wanted_parents.values_mut() {
            waiting.retain(|c| c != id);
        }
        changes.push(FeedChange::Removed { id: id.to_string() });

        for child in entry.children {
            self.remove_subtree(&child, changes);
        }
    }

    /// Drop the oldest top level posts beyond `max_len`.
    ///
    /// Columns that count unread posts are only trimmed while the user is
    /// looking at the window so nothing unread disappears unseen.
    pub fn purge(&mut self, max_len: usize, window_active: bool) -> Vec<FeedChange<PostEntry>> {
        let mut changes = Vec::new();
        if !(window_active || self.always_purge) {
            return changes;
        }
        while self.roots.len() > max_len {
            let Some(oldest) = self.roots.last().cloned() else {
                break;
            };
            changes.extend(self.remove_post(&oldest));
        }
        changes
    }

    /// Returns true if the post was unread
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) if entry.unread => {
                entry.unread = false;
                if self.counts_unread {
                    self.unread = self.unread.saturating_sub(1);
                }
                true
            }
            _ => false,
        }
    }

    /// Returns the number of posts that were unread
    pub fn mark_all_read(&mut self) -> usize {
        let mut count = 0;
        for entry in self.entries.values_mut() {
            if entry.unread {
                entry.unread = false;
                count += 1;
            }
        }
        self.unread = 0;
        count
    }

    /// Ids in display order with their thread depth
    pub fn display_order(&self) -> Vec<(String, usize)> {
        let mut order = Vec::with_capacity(self.entries.len());
        let mut stack: Vec<(&str, usize)> = self.roots.iter().rev().map(|r| (r.as_str(), 0)).collect();

        while let Some((id, depth)) = stack.pop() {
            let Some(entry) = self.entries.get(id) else {
                continue;
            };
            order.push((id.to_string(), depth));
            for child in entry.children.iter().rev() {
                stack.push((child.as_str(), depth + 1));
            }
        }
        order
    }

    /// Entries in display order
    pub fn snapshot(&self) -> Vec<&PostEntry> {
        self.display_order()
            .iter()
            .filter_map(|(id, _)| self.entries.get(id))
            .collect()
    }

    /// First unread post strictly after `after` in display order. `None` once
    /// nothing unread is left below it.
    pub fn next_unread(&self, after: Option<&str>) -> Option<String> {
        let order = self.display_order();
        let start = after
            .and_then(|a| order.iter().position(|(id, _)| id == a))
            .map(|i| i + 1)
            .unwrap_or(0);

        order[start..]
            .iter()
            .find(|(id, _)| self.entries.get(id).map(|e| e.unread).unwrap_or(false))
            .map(|(id, _)| id.clone())
    }

    /// Queue a post for the next drain, replacing a queued copy with the same id
    pub fn queue_post(&mut self, post: Post) {
        match self.queue.iter_mut().find(|q| q.id == post.id) {
            Some(queued) => *queued = post,
            None => self.queue.push(post),
        }
    }

    pub fn has_queued(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Reconcile everything queued since the last drain
    pub fn add_queued(&mut self) -> Vec<FeedChange<PostEntry>> {
        let queued = std::mem::take(&mut self.queue);
        queued.into_iter().flat_map(|post| self.add_post(post)).collect()
    }

    /// Apply a finished action to the post it targeted, if this column shows it
    pub fn apply_action(&mut self, outcome: &ActionOutcome) -> Vec<FeedChange<PostEntry>> {
        if outcome.action == StatusAction::Delete {
            return self.remove_post(&outcome.status_id);
        }
        match &outcome.status {
            Some(status) => {
                let target = status.reblog.as_ref().map(|r| r.id.as_str()).unwrap_or(&status.id);
                if self.entries.contains_key(target) {
                    self.add_post(status.clone())
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        }
    }

    /// Attach fetched edit history. Returns false if the post is gone.
    pub fn set_history(&mut self, id: &str, history: Vec<StatusEdit>) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.history = Some(history);
                true
            }
            None => false,
        }
    }
}

fn unwrap_boost(mut post: Post) -> (Post, Option<BoostedBy>) {
    match post.reblog.take() {
        Some(inner) => {
            let by = BoostedBy::from(&post.account);
            (*inner, Some(by))
        }
        None => (post, None),
    }
}

/// Streaming payloads leave the viewer flags out
fn normalize_viewer_flags(post: &mut Post) {
    for flag in [
        &mut post.reblogged,
        &mut post.favourited,
        &mut post.bookmarked,
        &mut post.muted,
    ] {
        flag.get_or_insert(false);
    }
}

/// Whether `incoming` carries an edit of `current`. Poll votes and counters
/// are not edits.
fn is_edited(current: &Post, incoming: &Post) -> bool {
    let poll_titles = |post: &Post| -> Option<Vec<String>> {
        post.poll
            .as_ref()
            .map(|p| p.options.iter().map(|o| o.title.clone()).collect())
    };

    current.content != incoming.content
        || current.spoiler_text != incoming.spoiler_text
        || current.sensitive != incoming.sensitive
        || current.emojis != incoming.emojis
        || current.media_attachments != incoming.media_attachments
        || poll_titles(current) != poll_titles(incoming)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{boost, post, reply};
    use crate::models::{Poll, PollOption};

    fn home() -> PostFeed {
        PostFeed::new(&ColumnKind::Home, "1")
    }

    fn roots(feed: &PostFeed) -> Vec<&str> {
        feed.roots().iter().map(String::as_str).collect()
    }

    #[test]
    fn roots_are_ordered_newest_first() {
        let mut feed = home();
        feed.add_post(post("100"));
        feed.add_post(post("300"));
        let changes = feed.add_post(post("200"));

        assert_eq!(roots(&feed), vec!["300", "200", "100"]);
        assert!(matches!(
            &changes[0],
            FeedChange::Inserted { id, index: 1, parent: None, .. } if id == "200"
        ));
    }

    #[test]
    fn numeric_ordering_handles_different_widths() {
        let mut feed = home();
        feed.add_post(post("999"));
        feed.add_post(post("1000"));
        assert_eq!(roots(&feed), vec!["1000", "999"]);
    }

    #[test]
    fn boosts_are_unwrapped_and_sorted_by_the_boost_id() {
        let mut feed = home();
        feed.add_post(post("50"));
        feed.add_post(boost("70", "9", post("10")));

        assert_eq!(roots(&feed), vec!["10", "50"]);
        let entry = feed.entry("10").unwrap();
        assert_eq!(entry.sort_id, "70");
        assert_eq!(entry.boosted_by.as_ref().unwrap().id, "9");
        assert!(entry.post.reblog.is_none());
    }

    #[test]
    fn replies_thread_under_a_known_parent() {
        let mut feed = home();
        feed.add_post(post("10"));
        let changes = feed.add_post(reply("11", "10"));

        assert_eq!(roots(&feed), vec!["10"]);
        assert_eq!(feed.entry("10").unwrap().children, vec!["11"]);
        assert!(matches!(
            &changes[0],
            FeedChange::Inserted { parent: Some(p), index: 0, .. } if p == "10"
        ));
        assert_eq!(
            feed.display_order(),
            vec![("10".to_string(), 0), ("11".to_string(), 1)]
        );
    }

    #[test]
    fn orphans_move_under_a_parent_that_arrives_later() {
        let mut feed = home();
        feed.add_post(reply("20", "10"));
        assert!(feed.entry("20").unwrap().orphaned);
        assert_eq!(feed.waiting_for("10"), ["20".to_string()]);

        let changes = feed.add_post(post("10"));

        assert_eq!(roots(&feed), vec!["10"]);
        let child = feed.entry("20").unwrap();
        assert_eq!(child.parent.as_deref(), Some("10"));
        assert!(!child.orphaned);
        assert!(feed.waiting_for("10").is_empty());
        assert!(changes.contains(&FeedChange::Reparented {
            id: "20".to_string(),
            parent: "10".to_string(),
            index: 0,
        }));
    }

    #[test]
    fn reparented_replies_report_their_place_among_siblings() {
        let mut feed = home();
        feed.add_post(reply("30", "10"));
        feed.add_post(reply("20", "10"));
        let changes = feed.add_post(post("10"));

        assert_eq!(feed.entry("10").unwrap().children, vec!["20", "30"]);
        let moved: Vec<(&str, usize)> = changes
            .iter()
            .filter_map(|c| match c {
                FeedChange::Reparented { id, index, .. } => Some((id.as_str(), *index)),
                _ => None,
            })
            .collect();
        assert_eq!(moved, vec![("30", 0), ("20", 0)]);

        // replaying the moves in order rebuilds the reply list
        let mut replayed: Vec<&str> = Vec::new();
        for (id, index) in moved {
            replayed.insert(index, id);
        }
        assert_eq!(replayed, vec!["20", "30"]);
    }

    #[test]
    fn removing_an_orphan_stops_waiting_for_its_parent() {
        let mut feed = home();
        feed.add_post(reply("20", "5"));
        assert_eq!(feed.waiting_for("5"), ["20".to_string()]);

        assert_eq!(feed.remove_post("20"), vec![FeedChange::Removed { id: "20".to_string() }]);
        assert!(feed.waiting_for("5").is_empty());

        let changes = feed.add_post(post("5"));
        assert!(!changes.iter().any(|c| matches!(c, FeedChange::Reparented { .. })));
        assert_eq!(roots(&feed), vec!["5"]);
    }

    #[test]
    fn purging_an_orphan_stops_waiting_for_its_parent() {
        let mut feed = PostFeed::new(&ColumnKind::Public, "1");
        feed.add_post(reply("20", "5"));
        feed.add_post(post("30"));
        assert_eq!(feed.waiting_for("5"), ["20".to_string()]);

        let changes = feed.purge(1, false);

        assert_eq!(changes, vec![FeedChange::Removed { id: "20".to_string() }]);
        assert!(feed.waiting_for("5").is_empty());
        assert_eq!(roots(&feed), vec!["30"]);
    }

    #[test]
    fn removing_by_boost_id_drops_the_boosted_post() {
        let mut feed = home();
        feed.add_post(post("50"));
        feed.add_post(boost("70", "9", post("10")));
        feed.add_post(reply("11", "10"));

        let changes = feed.remove_post("70");

        assert_eq!(
            changes,
            vec![
                FeedChange::Removed { id: "10".to_string() },
                FeedChange::Removed { id: "11".to_string() },
            ]
        );
        assert_eq!(roots(&feed), vec!["50"]);
        assert!(!feed.contains("10"));
        assert!(feed.remove_post("70").is_empty());
    }

    #[test]
    fn unknown_ids_that_match_no_boost_remove_nothing() {
        let mut feed = home();
        feed.add_post(post("50"));
        assert!(feed.remove_post("70").is_empty());
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn orphans_move_under_a_parent_that_is_itself_threaded() {
        let mut feed = home();
        feed.add_post(post("1"));
        feed.add_post(reply("3", "2"));
        feed.add_post(reply("2", "1"));

        assert_eq!(roots(&feed), vec!["1"]);
        assert_eq!(
            feed.display_order(),
            vec![
                ("1".to_string(), 0),
                ("2".to_string(), 1),
                ("3".to_string(), 2)
            ]
        );
    }

    #[test]
    fn self_replies_do_not_loop() {
        let mut feed = home();
        feed.add_post(reply("5", "5"));
        assert_eq!(roots(&feed), vec!["5"]);
        assert!(feed.waiting_for("5").is_empty());
    }

    #[test]
    fn known_posts_update_counters_without_an_edit() {
        let mut feed = home();
        feed.add_post(post("10"));
        feed.mark_read("10");

        let mut again = post("10");
        again.favourites_count = 4;
        again.favourited = Some(true);
        let changes = feed.add_post(again);

        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], FeedChange::Updated { .. }));
        let entry = feed.entry("10").unwrap();
        assert_eq!(entry.post.favourites_count, 4);
        assert_eq!(entry.post.favourited, Some(true));
        assert!(!entry.unread);
    }

    #[test]
    fn edited_posts_are_reported_and_marked_unread() {
        let mut feed = home();
        feed.add_post(post("10"));
        feed.mark_read("10");
        assert_eq!(feed.unread_count(), 0);

        let mut edited = post("10");
        edited.content = "<p>fixed typo</p>".to_string();
        let changes = feed.add_post(edited);

        assert!(changes.contains(&FeedChange::Edited { id: "10".to_string() }));
        assert!(feed.entry("10").unwrap().unread);
        assert_eq!(feed.unread_count(), 1);
    }

    #[test]
    fn poll_votes_are_not_edits() {
        let poll = |voted: bool, votes: u64| Poll {
            id: "p".to_string(),
            expires_at: None,
            expired: false,
            multiple: false,
            votes_count: votes,
            voters_count: None,
            options: vec![PollOption {
                title: "yes".to_string(),
                votes_count: Some(votes),
            }],
            voted: Some(voted),
            own_votes: None,
        };

        let mut feed = home();
        feed.add_post(Post { poll: Some(poll(false, 1)), ..post("10") });
        let changes = feed.add_post(Post { poll: Some(poll(true, 2)), ..post("10") });

        assert!(!changes.iter().any(|c| matches!(c, FeedChange::Edited { .. })));
        assert_eq!(feed.entry("10").unwrap().post.poll.as_ref().unwrap().votes_count, 2);
    }

    #[test]
    fn missing_viewer_flags_become_false() {
        let mut feed = home();
        feed.add_post(post("10"));
        let entry = feed.entry("10").unwrap();
        assert_eq!(entry.post.reblogged, Some(false));
        assert_eq!(entry.post.bookmarked, Some(false));
    }

    #[test]
    fn removing_a_post_removes_its_replies() {
        let mut feed = home();
        feed.add_post(post("10"));
        feed.add_post(reply("11", "10"));
        feed.add_post(reply("12", "11"));
        feed.add_post(post("20"));

        let changes = feed.remove_post("10");

        assert_eq!(changes.len(), 3);
        assert_eq!(roots(&feed), vec!["20"]);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.unread_count(), 1);
    }

    #[test]
    fn removing_a_reply_detaches_it_from_the_parent() {
        let mut feed = home();
        feed.add_post(post("10"));
        feed.add_post(reply("11", "10"));

        feed.remove_post("11");
        assert!(feed.entry("10").unwrap().children.is_empty());
    }

    #[test]
    fn purge_waits_for_an_active_window_on_unread_columns() {
        let mut feed = home();
        for id in ["1", "2", "3", "4"] {
            feed.add_post(post(id));
        }

        assert!(feed.purge(2, false).is_empty());
        assert_eq!(feed.len(), 4);

        feed.purge(2, true);
        assert_eq!(roots(&feed), vec!["4", "3"]);
    }

    #[test]
    fn public_columns_always_purge_and_never_count_unread() {
        let mut feed = PostFeed::new(&ColumnKind::Public, "1");
        for id in ["1", "2", "3"] {
            feed.add_post(post(id));
        }
        assert_eq!(feed.unread_count(), 0);

        feed.purge(1, false);
        assert_eq!(roots(&feed), vec!["3"]);
    }

    #[test]
    fn next_unread_follows_display_order_without_wrapping() {
        let mut feed = home();
        feed.add_post(post("10"));
        feed.add_post(reply("11", "10"));
        feed.add_post(post("20"));
        feed.mark_read("20");

        assert_eq!(feed.next_unread(None).as_deref(), Some("10"));
        assert_eq!(feed.next_unread(Some("20")).as_deref(), Some("10"));
        assert_eq!(feed.next_unread(Some("10")).as_deref(), Some("11"));
        assert_eq!(feed.next_unread(Some("11")), None);

        assert_eq!(feed.mark_all_read(), 2);
        assert_eq!(feed.next_unread(None), None);
    }

    #[test]
    fn queue_replaces_duplicates_and_drains_in_order() {
        let mut feed = home();
        feed.queue_post(post("1"));
        let mut newer = post("1");
        newer.replies_count = 3;
        feed.queue_post(newer);
        feed.queue_post(post("2"));

        let changes = feed.add_queued();

        assert_eq!(changes.len(), 2);
        assert!(!feed.has_queued());
        assert_eq!(feed.entry("1").unwrap().post.replies_count, 3);
    }

    #[test]
    fn action_outcomes_only_touch_known_posts() {
        let mut feed = home();
        feed.add_post(post("10"));

        let mut favourited = post("10");
        favourited.favourited = Some(true);
        let changes = feed.apply_action(&ActionOutcome {
            status_id: "10".to_string(),
            action: StatusAction::Favourite,
            status: Some(favourited),
        });
        assert_eq!(changes.len(), 1);
        assert_eq!(feed.entry("10").unwrap().post.favourited, Some(true));

        let changes = feed.apply_action(&ActionOutcome {
            status_id: "99".to_string(),
            action: StatusAction::Favourite,
            status: Some(post("99")),
        });
        assert!(changes.is_empty());
        assert!(!feed.contains("99"));

        let changes = feed.apply_action(&ActionOutcome {
            status_id: "10".to_string(),
            action: StatusAction::Delete,
            status: None,
        });
        assert_eq!(changes, vec![FeedChange::Removed { id: "10".to_string() }]);
    }

    #[test]
    fn authored_by_me_uses_the_logged_in_account() {
        let mut feed = PostFeed::new(&ColumnKind::Home, "1");
        feed.add_post(post("10"));
        assert!(feed.entry("10").unwrap().authored_by_me);

        let mut other = PostFeed::new(&ColumnKind::Home, "2");
        other.add_post(post("10"));
        assert!(!other.entry("10").unwrap().authored_by_me);
    }
}
