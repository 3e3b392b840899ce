//! Capture ingestion
//!
//! One handler validates, decodes, and commits every screenshot submission,
//! whether it arrived over the persistent channel or the one-shot upload
//! endpoint. The wire payload types live in `payload`.

pub mod handler;
pub mod payload;

pub use handler::IngestionHandler;
pub use payload::{CaptureAck, CaptureRequest, DeviceInfo};
