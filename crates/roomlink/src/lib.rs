//! Top-level facade crate for roomlink.
//!
//! Re-exports the wire model and the realtime client so users can depend on a single crate.

pub mod core {
    pub use roomlink_core::*;
}

pub mod client {
    pub use roomlink_client::*;
}
