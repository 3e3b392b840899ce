pub mod broadcast;
pub use broadcast::{ArtifactEvent, EventBroadcaster, ObserverConnection};

pub mod configuration;
pub use configuration::Config;

pub mod controller;
pub use controller::Controller;

pub mod error_handling;

pub mod ingestion;
pub use ingestion::{CaptureAck, CaptureRequest, DeviceInfo, IngestionHandler};

pub mod network;
pub use network::{ChannelFrame, ChannelListener};

pub mod session_management;
pub use session_management::{DeviceSession, SessionManager, SessionStatus};

pub mod storage;
pub use storage::{FileStorage, StoredArtifact};

pub mod transport;
pub use transport::{CaptureSource, DeviceCapabilities, FileCaptureSource, TransportClient};

pub mod web_interface;
pub use web_interface::WebServer;
