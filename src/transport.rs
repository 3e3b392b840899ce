//! Device-side transport
//!
//! The transport client keeps one persistent connection to the collector,
//! submits captures, and relays acknowledgements. Connection lifecycle is an
//! explicit state machine; the capture source injected at construction is
//! torn down on every disconnect path.

pub mod capture_source;
pub mod client;

pub use capture_source::{CaptureSource, DeviceCapabilities, FileCaptureSource};
pub use client::{ClientState, TransportClient};
