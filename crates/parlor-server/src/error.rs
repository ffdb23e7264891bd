//! Unified error type for the server crate.

use parlor_engine::EngineError;
use parlor_protocol::ProtocolError;
use parlor_room::RoomError;

/// Top-level error wrapping the layer errors.
///
/// The transparent variants keep the layer's human-readable message, which
/// is what ends up in an `error` frame when a command fails.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Encode/decode failure at the protocol layer.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room or registry operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// An engine rejected a move.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Binding the listen socket failed. The only startup-fatal error.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// The accept/serve loop died.
    #[error("serve failed: {0}")]
    Serve(#[source] std::io::Error),
}
