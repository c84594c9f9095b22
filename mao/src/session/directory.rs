//! Connection bindings and per-player state broadcast.

use serde::Serialize;
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::game::{GameCode, GameSnapshot, PlayerId, PlayerView};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A live client connection and the bounded outbox its writer drains.
#[derive(Clone, Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub outbox: mpsc::Sender<PlayerView>,
}

impl Connection {
    /// Create a connection along with the receiving end of its outbox.
    pub fn new(outbox_capacity: usize) -> (Self, mpsc::Receiver<PlayerView>) {
        let (outbox, receiver) = mpsc::channel(outbox_capacity.max(1));
        let connection = Self {
            id: ConnectionId::new(),
            outbox,
        };
        (connection, receiver)
    }
}

/// The game and player a connection acts as.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Binding {
    pub game_id: GameCode,
    pub player_id: PlayerId,
}

struct BoundConnection {
    binding: Binding,
    outbox: mpsc::Sender<PlayerView>,
}

#[derive(Default)]
struct DirectoryInner {
    connections: HashMap<ConnectionId, BoundConnection>,
    /// Highest snapshot version broadcast per game
    latest_versions: HashMap<GameCode, u64>,
}

/// Maps connections to the game and player they're bound to and fans out
/// game state to them.
#[derive(Clone, Default)]
pub struct SessionDirectory {
    inner: Arc<RwLock<DirectoryInner>>,
    /// Views skipped because an outbox was full or closed
    dropped: Arc<AtomicU64>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection, replacing any earlier binding it had.
    pub async fn bind(&self, connection: &Connection, game_id: GameCode, player_id: PlayerId) {
        let mut inner = self.inner.write().await;
        log::debug!(
            "Binding connection {} to {} as {}",
            connection.id,
            game_id,
            player_id
        );
        inner.connections.insert(
            connection.id,
            BoundConnection {
                binding: Binding { game_id, player_id },
                outbox: connection.outbox.clone(),
            },
        );
    }

    pub async fn unbind(&self, connection_id: ConnectionId) -> Option<Binding> {
        let mut inner = self.inner.write().await;
        let removed = inner.connections.remove(&connection_id)?;
        log::debug!(
            "Unbound connection {} from {}",
            connection_id,
            removed.binding.game_id
        );
        Some(removed.binding)
    }

    pub async fn binding(&self, connection_id: ConnectionId) -> Option<Binding> {
        let inner = self.inner.read().await;
        inner
            .connections
            .get(&connection_id)
            .map(|bound| bound.binding.clone())
    }

    /// Total number of views that couldn't be delivered.
    pub fn dropped_views(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of connections bound to a game.
    pub async fn connection_count(&self, game_id: &GameCode) -> usize {
        let inner = self.inner.read().await;
        inner
            .connections
            .values()
            .filter(|bound| bound.binding.game_id == *game_id)
            .count()
    }

    /// Push each bound player's view of `snapshot` into their outbox.
    ///
    /// Never waits on a connection: a full or closed outbox is logged and
    /// skipped, and the binding stays in place. A snapshot older than one
    /// already broadcast for the same game is dropped. Deliveries happen
    /// under the write guard, so concurrent broadcasts can't interleave and
    /// each outbox sees versions in increasing order. Returns the number of
    /// connections the view was delivered to.
    pub async fn broadcast_state(&self, snapshot: &GameSnapshot) -> usize {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let latest = inner
            .latest_versions
            .entry(snapshot.id.clone())
            .or_insert(snapshot.version);
        if snapshot.version < *latest {
            log::debug!(
                "Dropping stale snapshot v{} of {} (latest v{})",
                snapshot.version,
                snapshot.id,
                latest
            );
            return 0;
        }
        *latest = snapshot.version;

        let mut delivered = 0;
        for (connection_id, bound) in inner
            .connections
            .iter()
            .filter(|(_, bound)| bound.binding.game_id == snapshot.id)
        {
            match bound
                .outbox
                .try_send(snapshot.view_for(&bound.binding.player_id))
            {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    log::warn!(
                        "Connection {} outbox full, dropping {} v{}",
                        connection_id,
                        snapshot.id,
                        snapshot.version
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Connection {} closed, skipping", connection_id);
                }
            }
        }

        log::debug!(
            "Broadcast {} v{} to {} connection(s)",
            snapshot.id,
            snapshot.version,
            delivered
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{game::Game, session::GameConfig};

    fn id(name: &str) -> PlayerId {
        PlayerId::new(name).unwrap()
    }

    fn game(code: &str) -> Game {
        let mut game = Game::new(GameCode::new(code), id("alice"), "alice", &GameConfig::default());
        game.join(id("bob"), "bob").unwrap();
        game
    }

    #[tokio::test]
    async fn test_bind_overwrites() {
        let directory = SessionDirectory::new();
        let (connection, _rx) = Connection::new(4);

        directory
            .bind(&connection, GameCode::new("AAAA"), id("alice"))
            .await;
        directory
            .bind(&connection, GameCode::new("BBBB"), id("bob"))
            .await;

        let binding = directory.binding(connection.id).await.unwrap();
        assert_eq!(binding.game_id, GameCode::new("BBBB"));
        assert_eq!(binding.player_id, id("bob"));
        assert_eq!(directory.connection_count(&GameCode::new("AAAA")).await, 0);

        assert_eq!(directory.unbind(connection.id).await, Some(binding));
        assert!(directory.binding(connection.id).await.is_none());
        assert!(directory.unbind(connection.id).await.is_none());
    }

    #[tokio::test]
    async fn test_broadcast_sends_each_player_their_view() {
        let directory = SessionDirectory::new();
        let mut game = game("CAST");
        game.start(&id("alice")).unwrap();
        let snapshot = game.snapshot();

        let (alice, mut alice_rx) = Connection::new(4);
        let (bob, mut bob_rx) = Connection::new(4);
        directory.bind(&alice, snapshot.id.clone(), id("alice")).await;
        directory.bind(&bob, snapshot.id.clone(), id("bob")).await;

        assert_eq!(directory.broadcast_state(&snapshot).await, 2);

        let alice_view = alice_rx.recv().await.unwrap();
        let bob_view = bob_rx.recv().await.unwrap();
        assert_eq!(alice_view.player_id, id("alice"));
        assert_eq!(alice_view.hand, game.player(&id("alice")).unwrap().hand);
        assert_eq!(bob_view.hand, game.player(&id("bob")).unwrap().hand);
    }

    #[tokio::test]
    async fn test_stale_snapshots_are_dropped() {
        let directory = SessionDirectory::new();
        let mut game = game("OLDV");
        let old = game.snapshot();
        game.start(&id("alice")).unwrap();
        let new = game.snapshot();

        let (alice, mut rx) = Connection::new(4);
        directory.bind(&alice, new.id.clone(), id("alice")).await;

        assert_eq!(directory.broadcast_state(&new).await, 1);
        assert_eq!(directory.broadcast_state(&old).await, 0);
        assert_eq!(rx.recv().await.unwrap().version, new.version);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_outbox_is_skipped_not_unbound() {
        let directory = SessionDirectory::new();
        let game = game("FULL");
        let snapshot = game.snapshot();

        let (slow, _slow_rx) = Connection::new(1);
        let (fast, mut fast_rx) = Connection::new(4);
        directory.bind(&slow, snapshot.id.clone(), id("alice")).await;
        directory.bind(&fast, snapshot.id.clone(), id("bob")).await;

        assert_eq!(directory.broadcast_state(&snapshot).await, 2);
        assert_eq!(directory.broadcast_state(&snapshot).await, 1);
        assert_eq!(directory.dropped_views(), 1);
        assert!(directory.binding(slow.id).await.is_some());
        assert!(fast_rx.recv().await.is_some());
        assert!(fast_rx.recv().await.is_some());
    }
}
