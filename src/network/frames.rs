//! Wire frames for the persistent channel.
//!
//! One JSON object per line. Devices send `capture` frames; the collector
//! answers the submitting device with an `ack` frame and pushes
//! `artifactCreated` frames to every connected observer.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

use crate::broadcast::ArtifactEvent;
use crate::ingestion::payload::{CaptureAck, CaptureRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ChannelFrame {
    #[serde(rename = "capture")]
    Capture(CaptureRequest),
    #[serde(rename = "ack")]
    Ack(CaptureAck),
    #[serde(rename = "artifactCreated")]
    ArtifactCreated(ArtifactEvent),
}

/// Serialize one frame and write it as a single newline-terminated line.
pub async fn write_frame<W>(writer: &mut W, frame: &ChannelFrame) -> std::io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    let mut line = serde_json::to_vec(frame)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

/// Read the next frame, or `None` on a clean EOF.
///
/// A line that is not a valid frame surfaces as `InvalidData`; callers that
/// want to keep the connection alive on bad input read raw lines instead.
pub async fn read_frame<R>(reader: &mut R) -> std::io::Result<Option<ChannelFrame>>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        return serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e));
    }
}
