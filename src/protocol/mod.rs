//! # Protocol Layer
//!
//! Packet framing and the client/server handshake built on it.

pub mod client;
pub mod endpoint;
pub mod packet;
pub mod server;

pub use client::{Client, ClientReport};
pub use endpoint::Endpoint;
pub use packet::Packet;
pub use server::{Server, ServerReport};
