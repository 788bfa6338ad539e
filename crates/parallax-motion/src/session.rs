use crate::selector::SteeringSource;
use crate::OrientationClient;
use glam::Vec2;
use parallax_config::MotionConfig;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Orientation permission, from the application's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationAccess {
    NotRequested,
    /// A request is in flight. The pointer steers until it resolves.
    Pending,
    Granted,
    /// The request failed. Pointer steering for the rest of the session.
    Denied,
    /// Given up by the user or by the stream; may be requested again.
    Revoked,
}

/// What a toggle asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Request,
    Detach,
    Ignore,
}

impl OrientationAccess {
    /// State after the user toggles orientation steering, and the side
    /// effect that goes with it.
    pub fn on_toggle(self) -> (Self, ToggleOutcome) {
        match self {
            Self::NotRequested | Self::Revoked => (Self::Pending, ToggleOutcome::Request),
            Self::Granted => (Self::Revoked, ToggleOutcome::Detach),
            Self::Pending | Self::Denied => (self, ToggleOutcome::Ignore),
        }
    }

    /// State once a pending request resolves.
    pub fn on_resolved(self, granted: bool) -> Self {
        match (self, granted) {
            (Self::Pending, true) => Self::Granted,
            (Self::Pending, false) => Self::Denied,
            (other, _) => other,
        }
    }

    /// State after the sample stream ends on its own.
    pub fn on_stream_end(self) -> Self {
        match self {
            Self::Granted => Self::Revoked,
            other => other,
        }
    }

    /// Only granted access steers with orientation.
    pub fn steering_source(self) -> SteeringSource {
        match self {
            Self::Granted => SteeringSource::Orientation,
            _ => SteeringSource::Pointer,
        }
    }
}

struct PendingRequest {
    result_rx: oneshot::Receiver<anyhow::Result<OrientationClient>>,
    task: tokio::task::JoinHandle<()>,
}

/// Owns the orientation client across permission changes.
///
/// Requests run on the tokio runtime; `poll` is cheap and never blocks, so
/// it can be called once per frame from the event loop.
pub struct OrientationSession {
    runtime: Handle,
    endpoint: String,
    config: MotionConfig,
    access: OrientationAccess,
    pending: Option<PendingRequest>,
    client: Option<OrientationClient>,
}

impl OrientationSession {
    pub fn new(runtime: Handle, endpoint: impl Into<String>, config: MotionConfig) -> Self {
        Self {
            runtime,
            endpoint: endpoint.into(),
            config,
            access: OrientationAccess::NotRequested,
            pending: None,
            client: None,
        }
    }

    pub fn access(&self) -> OrientationAccess {
        self.access
    }

    /// Request access if none was requested yet.
    pub fn request(&mut self) {
        if self.access == OrientationAccess::NotRequested {
            self.toggle();
        }
    }

    pub fn toggle(&mut self) {
        let (next, outcome) = self.access.on_toggle();
        self.access = next;
        match outcome {
            ToggleOutcome::Request => self.spawn_request(),
            ToggleOutcome::Detach => {
                if let Some(client) = self.client.take() {
                    client.detach();
                }
            }
            ToggleOutcome::Ignore => {
                tracing::info!(access = ?self.access, "Orientation toggle ignored");
            }
        }
    }

    fn spawn_request(&mut self) {
        let (result_tx, result_rx) = oneshot::channel();
        let endpoint = self.endpoint.clone();
        let config = self.config.clone();
        let task = self.runtime.spawn(async move {
            let _ = result_tx.send(OrientationClient::connect(&endpoint, config).await);
        });
        self.pending = Some(PendingRequest { result_rx, task });
    }

    /// Advance the permission state without blocking and return the latest
    /// orientation target, if orientation currently steers.
    pub fn poll(&mut self) -> Option<Vec2> {
        let resolved = self
            .pending
            .as_mut()
            .map(|pending| pending.result_rx.try_recv());
        match resolved {
            None | Some(Err(oneshot::error::TryRecvError::Empty)) => {}
            Some(Ok(Ok(client))) => {
                self.pending = None;
                self.access = self.access.on_resolved(true);
                self.client = Some(client);
            }
            Some(Ok(Err(e))) => {
                self.pending = None;
                tracing::warn!(?e, "Orientation access denied, steering with the pointer");
                self.access = self.access.on_resolved(false);
            }
            Some(Err(oneshot::error::TryRecvError::Closed)) => {
                self.pending = None;
                tracing::warn!("Orientation request abandoned, steering with the pointer");
                self.access = self.access.on_resolved(false);
            }
        }

        let attached = self.client.as_ref().map(OrientationClient::is_attached);
        if attached == Some(false) {
            tracing::warn!("Orientation stream ended, steering with the pointer");
            self.client = None;
            self.access = self.access.on_stream_end();
        }

        self.client.as_ref().and_then(OrientationClient::target)
    }

    pub fn steering_source(&self) -> SteeringSource {
        self.access.steering_source()
    }

    /// Forget the anchors. Returns false when no stream is attached.
    pub fn reset(&self) -> bool {
        match &self.client {
            Some(client) => {
                client.reset();
                true
            }
            None => false,
        }
    }

    /// Use `config` for the attached tracker and for later requests.
    pub fn reconfigure(&mut self, config: MotionConfig) {
        if let Some(client) = &self.client {
            client.reconfigure(config.clone());
        }
        self.config = config;
    }
}

impl Drop for OrientationSession {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn denied_stays_denied() {
        let (next, outcome) = OrientationAccess::Denied.on_toggle();
        assert_eq!(next, OrientationAccess::Denied);
        assert_eq!(outcome, ToggleOutcome::Ignore);
        assert_eq!(OrientationAccess::Denied.on_stream_end(), OrientationAccess::Denied);
        assert_eq!(OrientationAccess::Denied.on_resolved(true), OrientationAccess::Denied);
        assert_eq!(OrientationAccess::Denied.steering_source(), SteeringSource::Pointer);
    }

    #[test]
    fn granted_toggle_detaches_to_pointer() {
        let (next, outcome) = OrientationAccess::Granted.on_toggle();
        assert_eq!(next, OrientationAccess::Revoked);
        assert_eq!(outcome, ToggleOutcome::Detach);
        assert_eq!(next.steering_source(), SteeringSource::Pointer);
        assert_eq!(
            OrientationAccess::Granted.steering_source(),
            SteeringSource::Orientation
        );
    }

    #[test]
    fn not_requested_and_revoked_request_again() {
        for state in [OrientationAccess::NotRequested, OrientationAccess::Revoked] {
            let (next, outcome) = state.on_toggle();
            assert_eq!(next, OrientationAccess::Pending);
            assert_eq!(outcome, ToggleOutcome::Request);
            assert_eq!(next.steering_source(), SteeringSource::Pointer);
        }
    }

    #[test]
    fn pending_resolves_once() {
        let pending = OrientationAccess::Pending;
        assert_eq!(pending.on_toggle(), (pending, ToggleOutcome::Ignore));
        assert_eq!(pending.on_resolved(true), OrientationAccess::Granted);
        assert_eq!(pending.on_resolved(false), OrientationAccess::Denied);
        assert_eq!(
            OrientationAccess::Revoked.on_resolved(true),
            OrientationAccess::Revoked
        );
    }

    #[test]
    fn stream_end_revokes_granted_access() {
        assert_eq!(
            OrientationAccess::Granted.on_stream_end(),
            OrientationAccess::Revoked
        );
        assert_eq!(
            OrientationAccess::Pending.on_stream_end(),
            OrientationAccess::Pending
        );
    }

    async fn poll_until(
        session: &mut OrientationSession,
        done: impl Fn(&OrientationSession) -> bool,
    ) {
        tokio::time::timeout(WAIT, async {
            while !done(&*session) {
                session.poll();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn request_is_pending_then_granted() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();

        let mut session =
            OrientationSession::new(Handle::current(), endpoint, MotionConfig::default());
        session.request();
        assert_eq!(session.access(), OrientationAccess::Pending);
        assert_eq!(session.steering_source(), SteeringSource::Pointer);

        let (mut stream, _) = listener.accept().await.unwrap();
        poll_until(&mut session, |s| s.access() == OrientationAccess::Granted).await;
        assert_eq!(session.steering_source(), SteeringSource::Orientation);
        assert!(session.reset());

        // Closing the stream falls back to the pointer.
        stream.shutdown().await.unwrap();
        drop(stream);
        poll_until(&mut session, |s| s.access() == OrientationAccess::Revoked).await;
        assert_eq!(session.steering_source(), SteeringSource::Pointer);
        assert!(!session.reset());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn refused_request_is_denied_for_good() {
        // Bind then release a port so nothing listens on it.
        let endpoint = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let mut session =
            OrientationSession::new(Handle::current(), endpoint, MotionConfig::default());
        session.request();
        poll_until(&mut session, |s| s.access() == OrientationAccess::Denied).await;

        session.toggle();
        assert_eq!(session.access(), OrientationAccess::Denied);
        assert!(session.pending.is_none());
        assert_eq!(session.poll(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn toggle_while_granted_detaches() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();

        let mut session =
            OrientationSession::new(Handle::current(), endpoint, MotionConfig::default());
        session.toggle();
        let (_stream, _) = listener.accept().await.unwrap();
        poll_until(&mut session, |s| s.access() == OrientationAccess::Granted).await;

        session.toggle();
        assert_eq!(session.access(), OrientationAccess::Revoked);
        assert!(session.client.is_none());
        assert_eq!(session.poll(), None);

        // A revoked session may ask again.
        session.toggle();
        assert_eq!(session.access(), OrientationAccess::Pending);
    }
}
