//! WebSocket transport layer.
//!
//! This module handles communication between the local end (Rust) and the
//! browser's DevTools endpoint via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  CdpPage (Rust) │         WebSocket            │  Chromium       │
//! │                 │◄────────────────────────────►│  DevTools       │
//! │  Connection     │   ws://127.0.0.1:PORT/...    │  endpoint       │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. Browser launched with `--remote-debugging-port=0`
//! 2. Endpoint URL read from the browser's stderr
//! 3. `Connection::connect` - WebSocket handshake, event loop spawned
//! 4. `Connection::call` / `dispatch` - commands, events to the handler
//! 5. `Connection::shutdown` - close when the session is released

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventHandler};
