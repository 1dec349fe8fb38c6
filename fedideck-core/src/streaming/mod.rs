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

//! Streaming workers
//!
//! One tokio task per streaming endpoint. A worker forwards everything the
//! connection delivers to its session and reconnects after a delay when the
//! connection ends, until the stream is stopped. Columns sharing an endpoint
//! (home and notifications both read the user stream) share the worker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::api::SocialApi;
use crate::log_stream;
use crate::models::{Conversation, Notification, Post, StreamKind};

/// Wait before reconnecting a dropped stream
pub const RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Event from a streaming connection
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// New post
    Update(Post),
    Notification(Notification),
    /// New or changed direct conversation
    Conversation(Conversation),
    /// Post was deleted
    Delete(String),
    /// Post was edited
    StatusUpdate(Post),
    Connected,
    Disconnected(String),
}

/// A stream event tagged with the endpoint it came from
#[derive(Debug, Clone)]
pub struct StreamMessage {
    pub stream: StreamKind,
    pub event: StreamEvent,
}

struct Worker {
    users: usize,
    stop: watch::Sender<bool>,
}

/// Streaming workers of one account
pub struct StreamManager<M> {
    api: Arc<dyn SocialApi>,
    account: String,
    out: mpsc::UnboundedSender<M>,
    reconnect_delay: Duration,
    workers: HashMap<StreamKind, Worker>,
}

impl<M> StreamManager<M>
where
    M: From<StreamMessage> + Send + 'static,
{
    pub fn new(api: Arc<dyn SocialApi>, account: &str, out: mpsc::UnboundedSender<M>) -> Self {
        Self {
            api,
            account: account.to_string(),
            out,
            reconnect_delay: RECONNECT_DELAY,
            workers: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Start the worker for `kind`, or add a user to the running one
    pub fn start(&mut self, kind: &StreamKind) {
        if let Some(worker) = self.workers.get_mut(kind) {
            worker.users += 1;
            debug!("Stream {} now has {} users", kind.name(), worker.users);
            return;
        }

        info!("Starting stream {} for {}", kind.name(), self.account);
        let (stop, stop_rx) = watch::channel(false);
        tokio::spawn(run_worker(
            self.api.clone(),
            kind.clone(),
            self.account.clone(),
            self.out.clone(),
            stop_rx,
            self.reconnect_delay,
        ));
        self.workers.insert(kind.clone(), Worker { users: 1, stop });
    }

    /// Drop one user of `kind`; the last one stops the worker
    pub fn stop(&mut self, kind: &StreamKind) {
        let Some(worker) = self.workers.get_mut(kind) else {
            return;
        };
        worker.users -= 1;
        if worker.users == 0 {
            if let Some(worker) = self.workers.remove(kind) {
                info!("Stopping stream {} for {}", kind.name(), self.account);
                let _ = worker.stop.send(true);
            }
        }
    }

    pub fn stop_all(&mut self) {
        for (_, worker) in self.workers.drain() {
            let _ = worker.stop.send(true);
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, kind: &StreamKind) -> bool {
        self.workers.contains_key(kind)
    }

    #[cfg(test)]
    pub fn running(&self) -> Vec<StreamKind> {
        self.workers.keys().cloned().collect()
    }
}

impl<M> Drop for StreamManager<M> {
    fn drop(&mut self) {
        for (_, worker) in self.workers.drain() {
            let _ = worker.stop.send(true);
        }
    }
}

async fn run_worker<M>(
    api: Arc<dyn SocialApi>,
    kind: StreamKind,
    account: String,
    out: mpsc::UnboundedSender<M>,
    mut stop: watch::Receiver<bool>,
    reconnect_delay: Duration,
) where
    M: From<StreamMessage> + Send + 'static,
{
    let name = kind.name();
    let forward = |event: StreamEvent| {
        out.send(M::from(StreamMessage {
            stream: kind.clone(),
            event,
        }))
        .is_ok()
    };

    loop {
        let (tx, mut rx) = mpsc::channel(64);
        let connection = api.stream(&kind, tx);
        tokio::pin!(connection);

        let reason = loop {
            tokio::select! {
                _ = stop.changed() => return,
                result = &mut connection => {
                    break match result {
                        Ok(()) => "connection closed".to_string(),
                        Err(e) => format!("{:#}", e),
                    };
                }
                Some(event) = rx.recv() => {
                    if !forward(event) {
                        return;
                    }
                }
            }
        };

        // events still buffered when the connection ended
        while let Ok(event) = rx.try_recv() {
            if !forward(event) {
                return;
            }
        }

        log_stream!(disconnected, account.as_str(), name.as_str(), reason.as_str());
        if !forward(StreamEvent::Disconnected(reason)) {
            return;
        }

        tokio::select! {
            _ = stop.changed() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::models::fixtures;

    async fn next(rx: &mut mpsc::UnboundedReceiver<StreamMessage>) -> StreamMessage {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no stream message in time")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn worker_forwards_events_and_reconnects() {
        let api = Arc::new(FakeApi::new());
        api.stream_events
            .lock()
            .unwrap()
            .extend([StreamEvent::Update(fixtures::post("10")), StreamEvent::Delete("9".into())]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager: StreamManager<StreamMessage> =
            StreamManager::new(api.clone(), "user1@example.social", tx)
                .with_reconnect_delay(Duration::from_millis(10));
        manager.start(&StreamKind::User);

        assert!(matches!(next(&mut rx).await.event, StreamEvent::Connected));
        assert!(matches!(next(&mut rx).await.event, StreamEvent::Update(p) if p.id == "10"));
        assert!(matches!(next(&mut rx).await.event, StreamEvent::Delete(id) if id == "9"));
        let dropped = next(&mut rx).await;
        assert_eq!(dropped.stream, StreamKind::User);
        assert!(matches!(dropped.event, StreamEvent::Disconnected(_)));
        assert!(matches!(next(&mut rx).await.event, StreamEvent::Connected));

        manager.stop_all();
    }

    #[tokio::test]
    async fn shared_stream_stops_with_its_last_user() {
        let api = Arc::new(FakeApi::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut manager: StreamManager<StreamMessage> = StreamManager::new(api, "me", tx);

        manager.start(&StreamKind::User);
        manager.start(&StreamKind::User);
        manager.start(&StreamKind::Local);

        manager.stop(&StreamKind::User);
        assert!(manager.is_running(&StreamKind::User));

        manager.stop(&StreamKind::User);
        assert!(!manager.is_running(&StreamKind::User));
        assert_eq!(manager.running(), vec![StreamKind::Local]);

        manager.stop(&StreamKind::Public);
        manager.stop_all();
        assert!(manager.running().is_empty());
    }

    #[tokio::test]
    async fn failed_connection_reports_the_reason() {
        let api = Arc::new(FakeApi::new());
        api.fail("stream");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager: StreamManager<StreamMessage> =
            StreamManager::new(api, "me", tx).with_reconnect_delay(Duration::from_secs(60));
        manager.start(&StreamKind::Direct);

        let message = next(&mut rx).await;
        assert!(matches!(message.event, StreamEvent::Disconnected(reason) if reason == "stream failed"));
        manager.stop_all();
    }
}
