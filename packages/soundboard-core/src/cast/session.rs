//! Cast session lifecycle management.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use std::sync::OnceLock;
use tokio::sync::broadcast;

use crate::config::CastConfig;
use crate::context::AppContext;
use crate::events::{CastEvent, EventEmitter};
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::utils::now_millis;

use super::transport::{CastOptions, CastTransport, MediaLoadRequest, TransportEvent};
use super::{CastError, CastPhase, ConnectionState, RemoteSession, SessionOutcome, TransportCapability};

/// Manages the lifecycle of the remote playback session.
///
/// Initialization runs once: secure-context check, capability probe (cached
/// for the life of the process), bounded wait for runtime readiness, then
/// configuration. A readiness signal arriving after the timeout is ignored;
/// the manager stays `Unavailable` until restart.
///
/// All session operations degrade gracefully when cast is unavailable:
/// they log and return a failure value instead of panicking.
pub struct CastSessionManager {
    transport: Arc<dyn CastTransport>,
    ctx: AppContext,
    config: CastConfig,
    emitter: Arc<dyn EventEmitter>,
    spawner: TokioSpawner,
    phase: RwLock<CastPhase>,
    connection: RwLock<ConnectionState>,
    session: RwLock<Option<RemoteSession>>,
    capability: OnceLock<TransportCapability>,
}

impl CastSessionManager {
    /// Creates a manager over the given transport. Nothing touches the
    /// transport until [`initialize`](Self::initialize).
    pub fn new(
        transport: Arc<dyn CastTransport>,
        ctx: AppContext,
        config: CastConfig,
        emitter: Arc<dyn EventEmitter>,
        spawner: TokioSpawner,
    ) -> Self {
        Self {
            transport,
            ctx,
            config,
            emitter,
            spawner,
            phase: RwLock::new(CastPhase::Uninitialized),
            connection: RwLock::new(ConnectionState::NoReceiversFound),
            session: RwLock::new(None),
            capability: OnceLock::new(),
        }
    }

    /// Initializes the cast runtime and starts listening for state changes.
    ///
    /// Returns the resulting phase. Every failure path lands in
    /// [`CastPhase::Unavailable`] with a reason; the rest of the system
    /// keeps working without cast.
    pub async fn initialize(self: &Arc<Self>) -> CastPhase {
        *self.phase.write() = CastPhase::Initializing;

        if !self.ctx.is_secure_context() {
            return self.fail_initialize("cast requires a secure origin (https or localhost)");
        }

        let capability = self
            .capability
            .get_or_init(|| self.transport.detect_capability());
        if let TransportCapability::Incapable(reason) = capability {
            return self.fail_initialize(reason);
        }

        let timeout = Duration::from_secs(self.config.init_timeout_secs);
        match tokio::time::timeout(timeout, self.transport.wait_ready()).await {
            Err(_) => {
                return self.fail_initialize(&format!(
                    "timed out after {}s waiting for the cast runtime",
                    self.config.init_timeout_secs
                ));
            }
            Ok(false) => {
                return self.fail_initialize("cast runtime reported itself unavailable");
            }
            Ok(true) => {}
        }

        let options = CastOptions::from_config(&self.config);
        if let Err(err) = self.transport.configure(&options) {
            return self.fail_initialize(&err.to_string());
        }

        *self.phase.write() = CastPhase::Ready;
        let initial = if self.transport.receiver_availability() {
            ConnectionState::Idle
        } else {
            ConnectionState::NoReceiversFound
        };
        self.set_connection(initial);
        self.spawn_state_listener();
        log::info!(
            "[Cast] Initialized (receiver app {}, {})",
            options.receiver_application_id,
            initial.description()
        );
        CastPhase::Ready
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> CastPhase {
        self.phase.read().clone()
    }

    /// Summarized connection state. Anything short of a ready runtime
    /// reports as no receivers, which disables the connect affordance.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        if *self.phase.read() != CastPhase::Ready {
            return ConnectionState::NoReceiversFound;
        }
        *self.connection.read()
    }

    /// Whether at least one receiver is discoverable.
    #[must_use]
    pub fn devices_available(&self) -> bool {
        self.connection_state() != ConnectionState::NoReceiversFound
    }

    /// Whether a session is currently established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.read().is_some()
    }

    /// Friendly name of the connected receiver, if any.
    #[must_use]
    pub fn receiver_name(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.receiver_name.clone())
    }

    /// Opens the device picker and negotiates a session.
    ///
    /// User cancellation is a normal outcome and never reported as an
    /// error; only transport failures emit an error event.
    pub async fn start_casting(&self) -> SessionOutcome {
        if *self.phase.read() != CastPhase::Ready {
            log::error!("[Cast] Session requested before the runtime was ready");
            return SessionOutcome::Failed("cast is not available".to_string());
        }
        if !self.devices_available() {
            log::info!("[Cast] Session requested with no receivers on the network");
            return SessionOutcome::Failed("no receivers available".to_string());
        }

        self.set_connection(ConnectionState::Connecting);
        match self.transport.request_session().await {
            SessionOutcome::Established(session) => {
                log::info!("[Cast] Session established with {}", session.receiver_name);
                *self.session.write() = Some(session.clone());
                self.set_connection(ConnectionState::Connected);
                SessionOutcome::Established(session)
            }
            SessionOutcome::Cancelled => {
                // Backing out of the device picker is not an error.
                log::info!("[Cast] Session request cancelled by the user");
                self.set_connection(ConnectionState::Idle);
                SessionOutcome::Cancelled
            }
            SessionOutcome::Failed(reason) => {
                log::error!("[Cast] Session request failed: {reason}");
                self.set_connection(ConnectionState::Idle);
                self.emitter.emit_cast(CastEvent::Error {
                    message: reason.clone(),
                    timestamp: now_millis(),
                });
                SessionOutcome::Failed(reason)
            }
        }
    }

    /// Ends the current session, stopping whatever the receiver is playing.
    ///
    /// A no-op when no session is active.
    pub async fn stop_casting(&self) {
        if self.session.write().take().is_none() {
            return;
        }
        self.transport.end_session(true).await;
        self.set_connection(ConnectionState::Idle);
        log::info!("[Cast] Session stopped");
    }

    /// Loads a clip into the active session and lets it autoplay.
    ///
    /// Returns whether the handoff succeeded. Never panics or propagates:
    /// a missing session, a relative URL, or a transport failure all log
    /// and return `false`.
    pub async fn play_on_receiver(&self, media_url: &str, title: &str) -> bool {
        let session = match self.session.read().clone() {
            Some(session) => session,
            None => {
                log::error!("[Cast] Cannot play {title}: {}", CastError::NotConnected);
                return false;
            }
        };

        if !media_url.starts_with("http://") && !media_url.starts_with("https://") {
            log::error!(
                "[Cast] {}",
                CastError::InvalidMediaUrl(media_url.to_string())
            );
            return false;
        }

        let request = MediaLoadRequest::buffered_audio(media_url, title);
        match self.transport.load_media(&session, &request).await {
            Ok(()) => {
                log::info!("[Cast] Playing {title} on {}", session.receiver_name);
                true
            }
            Err(err) => {
                // The caller surfaces the single user-visible error for a
                // failed handoff; emitting one here too would double-report.
                log::error!("[Cast] Media load failed for {title}: {err}");
                false
            }
        }
    }

    /// Marks initialization as failed and reports the degraded state.
    fn fail_initialize(&self, reason: &str) -> CastPhase {
        log::warn!("[Cast] Unavailable: {reason}");
        let phase = CastPhase::Unavailable(reason.to_string());
        *self.phase.write() = phase.clone();
        self.publish_connection();
        phase
    }

    /// Forwards transport state notifications into the domain event stream.
    fn spawn_state_listener(self: &Arc<Self>) {
        let mut rx = self.transport.subscribe();
        let manager = Arc::clone(self);
        self.spawner.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(TransportEvent::CastStateChanged(state)) => {
                        manager.set_connection(state);
                    }
                    Ok(TransportEvent::SessionChanged) => {
                        manager.refresh_session();
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        log::warn!("[Cast] State listener lagged, missed {missed} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            log::debug!("[Cast] Transport event feed closed, listener exiting");
        });
    }

    /// Re-reads the transport's session after a session-level notification
    /// (covers sessions established by auto-join or ended by the receiver).
    fn refresh_session(&self) {
        let session = self.transport.current_session();
        let had_session = {
            let mut guard = self.session.write();
            let had = guard.is_some();
            *guard = session.clone();
            had
        };
        match (had_session, session.is_some()) {
            (false, true) => self.set_connection(ConnectionState::Connected),
            (true, false) => self.set_connection(ConnectionState::Idle),
            _ => {}
        }
    }

    /// Records a connection state change and notifies observers. Emits an
    /// availability event whenever discoverability flips.
    fn set_connection(&self, state: ConnectionState) {
        let previous = {
            let mut guard = self.connection.write();
            std::mem::replace(&mut *guard, state)
        };
        if previous == state {
            return;
        }
        let was_available = previous != ConnectionState::NoReceiversFound;
        let is_available = state != ConnectionState::NoReceiversFound;
        if was_available != is_available {
            self.emitter.emit_cast(CastEvent::AvailabilityChanged {
                available: is_available,
                timestamp: now_millis(),
            });
        }
        self.publish_connection();
    }

    fn publish_connection(&self) {
        self.emitter.emit_cast(CastEvent::ConnectionChanged {
            state: self.connection_state(),
            receiver_name: self.receiver_name(),
            timestamp: now_millis(),
        });
    }
}
