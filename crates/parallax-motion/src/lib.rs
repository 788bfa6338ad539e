pub mod anchor;
pub mod blend;
pub mod pointer;
pub mod protocol;
pub mod selector;
pub mod session;
pub mod stats;
pub mod types;

pub use anchor::{AnchorState, Diagnostics, OrientationAnchorTracker, TrackerOutput};
pub use blend::MotionBlender;
pub use pointer::pointer_steering;
pub use selector::{SteeringSelector, SteeringSource};
pub use session::{OrientationAccess, OrientationSession, ToggleOutcome};
pub use stats::{CircularWindow, VectorStats};
pub use types::{clamp_to_unit_disc, OrientationSample};

use anyhow::Result;
use glam::Vec2;
use parallax_config::MotionConfig;
use protocol::SampleDecoder;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

/// Commands sent to the tracking task.
enum TrackerCommand {
    Reset,
    Reconfigure(MotionConfig),
}

/// Subscription to an orientation sample stream.
///
/// A background task owns the anchor tracker, decodes incoming samples and
/// publishes the latest steering target. Dropping the client (or calling
/// `detach`) stops the task.
pub struct OrientationClient {
    target_rx: watch::Receiver<Option<Vec2>>,
    command_tx: mpsc::UnboundedSender<TrackerCommand>,
    task: tokio::task::JoinHandle<()>,
}

impl OrientationClient {
    /// Connect to an orientation streamer and start tracking.
    ///
    /// An error here means orientation access is unavailable; callers fall
    /// back to pointer steering.
    pub async fn connect(endpoint: &str, config: MotionConfig) -> Result<Self> {
        tracing::info!(%endpoint, "Connecting to orientation stream");

        let stream = TcpStream::connect(endpoint).await?;
        tracing::info!("Connected to orientation stream");

        Ok(Self::from_reader(stream, config))
    }

    /// Track samples read from any byte stream.
    pub fn from_reader<R>(reader: R, config: MotionConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (target_tx, target_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(sample_read_loop(reader, target_tx, command_rx, config));

        Self {
            target_rx,
            command_tx,
            task,
        }
    }

    /// Latest steering target (non-blocking). `None` until a complete
    /// sample has been tracked.
    pub fn target(&self) -> Option<Vec2> {
        *self.target_rx.borrow()
    }

    /// Receiver that is notified whenever a new target is published.
    pub fn subscribe(&self) -> watch::Receiver<Option<Vec2>> {
        self.target_rx.clone()
    }

    /// Whether the stream is still delivering samples.
    pub fn is_attached(&self) -> bool {
        !self.task.is_finished()
    }

    /// Drop both anchors; the next sample becomes the new zero tilt.
    pub fn reset(&self) {
        let _ = self.command_tx.send(TrackerCommand::Reset);
    }

    /// Swap the tracker configuration between two samples.
    pub fn reconfigure(&self, config: MotionConfig) {
        let _ = self.command_tx.send(TrackerCommand::Reconfigure(config));
    }

    /// Stop listening for samples.
    pub fn detach(self) {
        tracing::info!("Orientation stream detached");
    }
}

impl Drop for OrientationClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Background task: read the stream, decode samples, track, publish targets.
async fn sample_read_loop<R>(
    mut reader: R,
    target_tx: watch::Sender<Option<Vec2>>,
    mut command_rx: mpsc::UnboundedReceiver<TrackerCommand>,
    config: MotionConfig,
) where
    R: AsyncRead + Unpin,
{
    let mut decoder = SampleDecoder::new();
    let mut tracker = OrientationAnchorTracker::new(config);
    let mut buf = [0u8; 4096];
    let mut sample_count: u64 = 0;

    loop {
        tokio::select! {
            result = reader.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        tracing::warn!("Orientation stream closed");
                        break;
                    }
                    Ok(n) => {
                        decoder.push_data(&buf[..n]);

                        // Drain all available samples.
                        while let Some(result) = decoder.next_sample() {
                            match result {
                                Ok(sample) => {
                                    if let Some(output) = tracker.update(&sample) {
                                        tracing::trace!(diagnostics = %output.diagnostics);
                                        let _ = target_tx.send(Some(output.target));
                                    }
                                    sample_count += 1;
                                    if sample_count % 1000 == 0 {
                                        tracing::debug!(sample_count, "Orientation samples processed");
                                    }
                                }
                                Err(e @ protocol::ProtocolError::LineTooLong(_)) => {
                                    tracing::warn!(%e, "Discarding oversized sample line");
                                }
                                Err(e) => {
                                    tracing::trace!(?e, "Skipping undecodable sample line");
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(?e, "Orientation stream read error");
                        break;
                    }
                }
            }
            Some(cmd) = command_rx.recv() => {
                match cmd {
                    TrackerCommand::Reset => tracker.reset(),
                    TrackerCommand::Reconfigure(config) => tracker.reconfigure(config),
                }
            }
        }
    }
}
