//! WebSocket client management.
//!
//! # Data Flow
//! ```text
//! upgrade request (any path, ?user=&type=)
//!     → http/websocket.rs (handshake)
//!     → manager.rs (register, echo loop, unregister)
//!
//! BroadcastBus event
//!     → manager.rs relay task
//!     → every registered client
//! ```

pub mod manager;

pub use manager::{Registration, WsClientManager, WsError};
