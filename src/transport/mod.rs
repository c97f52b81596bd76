//! Transport layer.
//!
//! Everything that moves bytes: the control-plane HTTP client, the
//! WebSocket event loop, and the port abstraction with its in-process
//! implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   GET /json/new    ┌─────────────────┐
//! │  RemoteDriver   │───────────────────►│  Control plane  │
//! │                 │◄─ descriptor ──────│  localhost:PORT │
//! │  SocketHandle   │                    └─────────────────┘
//! │  → Multiplexer  │◄──── WebSocket ───►  Target
//! └─────────────────┘
//!
//! ┌─────────────────┐       Port         ┌─────────────────┐
//! │  PortDriver     │◄──────────────────►│  any channel    │
//! │  → Multiplexer  │  send / on / close │  (e.g. pipe)    │
//! └─────────────────┘                    └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `discovery` | `/json/` control-plane client |
//! | `pipe` | In-process port pair |
//! | `port` | Port capability trait |
//! | `socket` | WebSocket event loop |

// ============================================================================
// Submodules
// ============================================================================

/// Control-plane HTTP client.
pub mod discovery;

/// In-process port pair.
pub mod pipe;

/// Port capability trait.
pub mod port;

/// WebSocket event loop.
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

pub use discovery::{BrowserVersion, DiscoveryClient, TargetDescriptor};
pub use pipe::{PipeEnd, PipePort, pipe};
pub use port::{Port, PortCallback, PortEvent};
pub use socket::SocketHandle;
