//! WebSocket HTTP handler for the web layer.
//!
//! This module contains only the Axum upgrade endpoint. The hub, the
//! connection loops and the message types live in the `ws` crate.

pub mod handler;
