//! # Parlor
//!
//! A realtime multiplayer game server. One process hosts many short-lived
//! rooms; each room holds up to eight players (plus spectators) exchanging
//! JSON frames over a WebSocket, with the server as the sole authority on
//! game rules.
//!
//! This crate is the outermost layer: the axum endpoint (`/ws`, `/health`),
//! the per-connection session loop, and the command dispatcher that ties
//! the protocol, room, and engine crates together.
//!
//! ```text
//! socket → session → dispatcher → registry/room → engine
//!             ↑                        │
//!             └──── broadcaster ◄──────┘
//! ```

mod dispatcher;
mod error;
mod server;
mod session;

pub use error::ServerError;
pub use server::{AppState, ParlorServer, ServerBuilder};
