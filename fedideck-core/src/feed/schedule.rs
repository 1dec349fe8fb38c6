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

//! Per-column polling schedule

use std::time::{Duration, Instant};

use super::newest_id;

/// Delay before the first poll of a freshly opened column
pub const FIRST_POLL_DELAY: Duration = Duration::from_secs(1);

/// What the next poll should request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    /// `None` for a full reload
    pub since_id: Option<String>,
    pub full: bool,
}

/// Tracks when a column polls next and where the last poll stopped
#[derive(Debug, Clone)]
pub struct RefreshSchedule {
    interval: Duration,
    next_due: Instant,
    full_reload: bool,
    newest_id: Option<String>,
    in_flight: bool,
}

impl RefreshSchedule {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + FIRST_POLL_DELAY,
            full_reload: true,
            newest_id: None,
            in_flight: false,
        }
    }

    pub fn set_interval(&mut self, interval: Duration, now: Instant) {
        self.interval = interval;
        if !self.in_flight {
            self.next_due = self.next_due.min(now + interval);
        }
    }

    pub fn newest_id(&self) -> Option<&str> {
        self.newest_id.as_deref()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        !self.in_flight && now >= self.next_due
    }

    /// Claim the next poll if it is due
    pub fn plan(&mut self, now: Instant) -> Option<FetchPlan> {
        if !self.is_due(now) {
            return None;
        }
        self.in_flight = true;

        let since_id = if self.full_reload {
            None
        } else {
            self.newest_id.clone()
        };
        Some(FetchPlan {
            full: since_id.is_none(),
            since_id,
        })
    }

    /// Record a finished poll and the ids it returned
    pub fn completed<'a>(&mut self, now: Instant, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            let newest = newest_id(self.newest_id.as_deref(), id).to_string();
            self.newest_id = Some(newest);
        }
        self.full_reload = false;
        self.in_flight = false;
        self.next_due = now + self.interval;
    }

    /// A failed poll waits a full interval before the next try
    pub fn failed(&mut self, now: Instant) {
        self.in_flight = false;
        self.next_due = now + self.interval;
    }

    /// Push the next poll back, e.g. after streaming delivered fresh content
    pub fn postpone(&mut self, now: Instant) {
        if !self.in_flight {
            self.next_due = now + self.interval;
        }
    }

    /// Next poll reloads everything, as soon as possible
    pub fn force_reload(&mut self, now: Instant) {
        self.full_reload = true;
        self.next_due = now;
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn first_poll_is_a_full_reload_after_a_second() {
        let start = Instant::now();
        let mut schedule = RefreshSchedule::new(MINUTE, start);

        assert!(schedule.plan(start).is_none());
        let plan = schedule.plan(start + FIRST_POLL_DELAY).unwrap();
        assert_eq!(plan, FetchPlan { since_id: None, full: true });
    }

    #[test]
    fn later_polls_ask_for_posts_since_the_newest_seen() {
        let start = Instant::now();
        let mut schedule = RefreshSchedule::new(MINUTE, start);
        let t = start + FIRST_POLL_DELAY;
        schedule.plan(t);
        schedule.completed(t, ["998", "1099", "1001"]);

        assert_eq!(schedule.newest_id(), Some("1099"));
        assert!(schedule.plan(t + Duration::from_secs(30)).is_none());

        let plan = schedule.plan(t + MINUTE).unwrap();
        assert_eq!(plan.since_id.as_deref(), Some("1099"));
        assert!(!plan.full);
    }

    #[test]
    fn in_flight_polls_are_not_planned_twice() {
        let start = Instant::now();
        let mut schedule = RefreshSchedule::new(MINUTE, start);
        let t = start + FIRST_POLL_DELAY;

        assert!(schedule.plan(t).is_some());
        assert!(schedule.plan(t + MINUTE * 5).is_none());

        schedule.failed(t + MINUTE * 5);
        assert_eq!(schedule.remaining(t + MINUTE * 5), MINUTE);
    }

    #[test]
    fn postpone_and_force_reload_move_the_deadline() {
        let start = Instant::now();
        let mut schedule = RefreshSchedule::new(MINUTE, start);
        let t = start + FIRST_POLL_DELAY;
        schedule.plan(t);
        schedule.completed(t, ["5"]);

        schedule.postpone(t + Duration::from_secs(50));
        assert!(!schedule.is_due(t + MINUTE));

        schedule.force_reload(t + MINUTE);
        let plan = schedule.plan(t + MINUTE).unwrap();
        assert!(plan.full);
        assert_eq!(plan.since_id, None);
    }
}
