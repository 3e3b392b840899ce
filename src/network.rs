// Network module root
pub mod channel_listener;
pub mod frames;

pub use channel_listener::ChannelListener;
pub use frames::{read_frame, write_frame, ChannelFrame};
