//! # lanyard-ctl
//!
//! Control surface for lanyard: a small JSON request/response listener over
//! a local transport (Unix-domain or TCP socket), with the endpoint
//! lifecycle operations registered as path handlers.
//!
//! The listener is generic machinery; [`api`] wires the provision,
//! deprovision, describe, and list operations of a
//! [`Network`](lanyard_core::Network) onto it.

pub mod api;
pub mod config;
pub mod listener;

pub use api::{register_handlers, AppState};
pub use config::CtlConfig;
pub use listener::{
    decode, encode, handler, send_error, ApiError, Handler, HandlerResult, Listener,
    ListenerError, ListenerState, Transport,
};
