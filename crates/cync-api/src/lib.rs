//! Wire-level client for the Cync/GE cloud REST API and TCP/TLS gateway
//! protocol.
//!
//! This crate knows bytes: HTTP request/response shapes, the binary packet
//! codec, and the gateway connect/login handshake. It has no notion of
//! rooms, capability rollups, or command retry policy — that domain layer
//! lives in `cync-core`, which depends on this crate and translates
//! [`Error`] into its own error type.

pub mod codec;
pub mod error;
pub mod rest;
pub mod session;
pub mod transport;

pub use error::{Error, Result};
pub use rest::RestClient;
