//! Dwara Pinpad - session state machine for a BLE access-control peripheral
//!
//! The pinpad advertises a writable characteristic, accepts `user:code`
//! submissions, validates the code with TOTP against a single shared secret,
//! and exposes the accept/reject outcome to typed subscribers.
//!
//! This crate is transport-agnostic: the radio is reached through the
//! [`Transport`] trait, and platform crates (see `firmware/esp32-pinpad`)
//! implement it with their BLE stack and forward raw writes into
//! [`PinpadServer::on_raw_write`].

mod events;
mod server;
mod transport;

pub use events::EventDispatcher;
pub use server::{PinpadError, PinpadServer, State};
pub use transport::Transport;

// Re-export the types callers need to configure and feed a server.
pub use dwara_otp::{Credential, CredentialError};
pub use dwara_proto::{IncomingCommand, ParseError};
