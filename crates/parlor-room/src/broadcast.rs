//! Outbound fan-out: the only component that serializes frames.
//!
//! Every connected socket registers a [`ClientHandle`] here: an unbounded
//! queue the session's writer task drains, plus the client's identity
//! binding (player id, display name, current room code). Sends are
//! non-blocking queue pushes — a slow or dead recipient is logged and
//! skipped, never awaited, so a broadcast can safely run under a room
//! lock.
//!
//! Messages are serialized once per broadcast no matter how many
//! recipients there are.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;
use tokio::sync::mpsc;

use parlor_protocol::{Codec, JsonCodec, PlayerId, RoomCode, ServerMessage};

/// Counter for session ids, process-wide.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one connected socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sess-{}", self.0)
    }
}

/// The identity a client has bound so far. Everything starts out `None`;
/// the first identity-bearing command fills in id and name.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub player_id: Option<PlayerId>,
    pub player_name: Option<String>,
    pub room_code: Option<RoomCode>,
}

struct ClientHandle {
    tx: mpsc::UnboundedSender<String>,
    identity: Mutex<Identity>,
}

/// Process-wide client map plus the three send operations:
/// [`send`](Broadcaster::send), room fan-out (via
/// [`send_raw`](Broadcaster::send_raw) from the room layer), and
/// [`broadcast_all`](Broadcaster::broadcast_all).
pub struct Broadcaster {
    clients: DashMap<SessionId, ClientHandle>,
    codec: JsonCodec,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            codec: JsonCodec,
        }
    }

    /// Registers a new session and returns its id plus the queue the
    /// session's writer task must drain.
    pub fn register(&self) -> (SessionId, mpsc::UnboundedReceiver<String>) {
        let id = SessionId::next();
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.insert(
            id,
            ClientHandle {
                tx,
                identity: Mutex::new(Identity::default()),
            },
        );
        tracing::debug!(%id, "session registered");
        (id, rx)
    }

    pub fn unregister(&self, id: SessionId) {
        self.clients.remove(&id);
        tracing::debug!(%id, "session unregistered");
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Serializes a message once. Encode failures are logged and yield
    /// `None` — they never propagate to callers mid-fan-out.
    pub fn encode(&self, msg: &ServerMessage) -> Option<String> {
        match self.codec.encode(msg) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode outbound frame");
                None
            }
        }
    }

    /// Queues an already-serialized frame to one session. Returns `false`
    /// (after logging) if the session is gone or its queue is closed.
    pub fn send_raw(&self, id: SessionId, frame: &str) -> bool {
        match self.clients.get(&id) {
            Some(handle) => match handle.tx.send(frame.to_owned()) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!(%id, "send queue closed, dropping frame");
                    false
                }
            },
            None => {
                tracing::debug!(%id, "send to unknown session");
                false
            }
        }
    }

    /// Serializes and sends one message to one session.
    pub fn send(&self, id: SessionId, msg: &ServerMessage) {
        if let Some(frame) = self.encode(msg) {
            self.send_raw(id, &frame);
        }
    }

    /// Sends one message to every connected session.
    pub fn broadcast_all(&self, msg: &ServerMessage) -> usize {
        let Some(frame) = self.encode(msg) else {
            return 0;
        };
        let mut sent = 0;
        for entry in self.clients.iter() {
            if entry.value().tx.send(frame.clone()).is_ok() {
                sent += 1;
            }
        }
        sent
    }

    // -- Identity binding ---------------------------------------------------

    pub fn identity(&self, id: SessionId) -> Option<Identity> {
        self.clients.get(&id).map(|h| {
            h.identity
                .lock()
                .map(|i| i.clone())
                .unwrap_or_default()
        })
    }

    /// Binds player id and display name (the first identity-bearing
    /// command does this).
    pub fn bind_identity(&self, id: SessionId, player: &PlayerId, name: &str) {
        if let Some(handle) = self.clients.get(&id) {
            if let Ok(mut identity) = handle.identity.lock() {
                identity.player_id = Some(player.clone());
                identity.player_name = Some(name.to_owned());
            }
        }
    }

    /// Updates (or clears) the session's current room.
    pub fn set_room(&self, id: SessionId, code: Option<RoomCode>) {
        if let Some(handle) = self.clients.get(&id) {
            if let Ok(mut identity) = handle.identity.lock() {
                identity.room_code = code;
            }
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
