//! One handler module per subcommand, plus shared helpers.

pub mod auth;
pub mod connect;
pub mod devices;
pub mod discover;
pub mod login;
pub mod power;
pub mod rooms;
pub mod util;
