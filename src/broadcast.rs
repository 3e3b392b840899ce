// Broadcast module root
pub mod broadcaster;
pub mod types;

pub use broadcaster::{EventBroadcaster, ObserverConnection};
pub use types::ArtifactEvent;
