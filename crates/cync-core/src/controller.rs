//! The `CyncClient` orchestrator (spec §4.3/§5/§6): drives login, discovery,
//! the persistent gateway session's reconnect loop, and the reader/writer/
//! heartbeat/tracker-refresh tasks that run while it is `Ready`. Modeled on
//! the teacher's `Controller`/`ControllerInner` split — a small `Clone`
//! handle wrapping an `Arc<Inner>`, with a cancellation token scoping every
//! spawned task to one `connect()`/`shutdown()` lifetime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cync_api::codec::{self, InboundEvent};
use cync_api::rest::{AuthOutcome, RestClient, Session as RestSession};
use cync_api::session::{self, GatewayReadHalf, GatewayStream, GatewayWriteHalf};
use secrecy::ExposeSecret;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{CommandEngine, CommandTarget, CurrentLevels, DeviceAction};
use crate::config::{CyncConfig, GatewayTlsPolicy};
use crate::controller_tracker::ControllerTracker;
use crate::discovery::build_topology;
use crate::error::CoreError;
use crate::model::{ChangeEvent, Device, EntityId, HomeId, Room, SessionStatus, Topology};
use crate::store::DataStore;
use crate::stream::EntityStream;

const OUTBOUND_QUEUE_CAPACITY: usize = 64;

struct Inner {
    config: CyncConfig,
    rest: RestClient,
    store: Arc<DataStore>,
    status: watch::Sender<SessionStatus>,
    rest_session: Mutex<Option<RestSession>>,
    topology: Mutex<Option<Topology>>,
    active_home: Mutex<Option<HomeId>>,
    command_engine: Mutex<Option<Arc<CommandEngine>>>,
    tracker: Mutex<Option<Arc<ControllerTracker>>>,
    session_task: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    connecting: AtomicBool,
}

/// A cheap, cloneable handle to a running (or not-yet-connected) Cync
/// bridge client. All clones share the same session, store, and task set.
#[derive(Clone)]
pub struct CyncClient {
    inner: Arc<Inner>,
}

impl CyncClient {
    #[must_use]
    pub fn new(config: CyncConfig) -> Result<Self, CoreError> {
        let rest = RestClient::new().map_err(CoreError::from)?;
        let (status, _) = watch::channel(SessionStatus::Disconnected);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                rest,
                store: Arc::new(DataStore::new()),
                status,
                rest_session: Mutex::new(None),
                topology: Mutex::new(None),
                active_home: Mutex::new(None),
                command_engine: Mutex::new(None),
                tracker: Mutex::new(None),
                session_task: Mutex::new(None),
                cancel: CancellationToken::new(),
                connecting: AtomicBool::new(false),
            }),
        })
    }

    /// `POST /v2/user_auth`. May return [`CoreError::TwoFactorRequired`], in
    /// which case the host should prompt for the emailed code and call
    /// [`Self::submit_two_factor`].
    pub async fn login(&self) -> Result<(), CoreError> {
        let creds = self.inner.config.credentials.clone();
        let outcome = self.inner.rest.authenticate(&creds.email, creds.password.expose_secret()).await?;
        match outcome {
            AuthOutcome::Authorized(session) => {
                *self.inner.rest_session.lock().await = Some(session);
                Ok(())
            }
            AuthOutcome::TwoFactorRequired => Err(CoreError::TwoFactorRequired),
        }
    }

    pub async fn submit_two_factor(&self, code: &str) -> Result<(), CoreError> {
        let creds = self.inner.config.credentials.clone();
        let session =
            self.inner.rest.submit_two_factor(&creds.email, creds.password.expose_secret(), code).await?;
        *self.inner.rest_session.lock().await = Some(session);
        Ok(())
    }

    /// Fetch and rebuild the device/room graph (spec §4.1). Requires a
    /// prior successful [`Self::login`]/[`Self::submit_two_factor`].
    pub async fn discover(&self) -> Result<Topology, CoreError> {
        let rest_session = self.inner.rest_session.lock().await.clone().ok_or(CoreError::InvalidAuth)?;
        let raw_homes = self.inner.rest.discover(&rest_session).await?;
        let (topology, devices, rooms) = build_topology(raw_homes)?;
        self.inner.store.load_topology(&topology, devices, rooms);
        *self.inner.active_home.lock().await = topology.homes.first().map(|h| h.id.clone());
        *self.inner.topology.lock().await = Some(topology.clone());
        Ok(topology)
    }

    /// Ensure login/discovery has happened, then start (or no-op if already
    /// running) the persistent session loop (spec §4.3).
    pub async fn connect(&self) -> Result<(), CoreError> {
        if self.inner.rest_session.lock().await.is_none() {
            self.login().await?;
        }
        if self.inner.topology.lock().await.is_none() {
            self.discover().await?;
        }
        if self.inner.connecting.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let client = self.clone();
        let handle = tokio::spawn(async move { client.session_loop().await });
        *self.inner.session_task.lock().await = Some(handle);
        Ok(())
    }

    /// Cancel the session loop and every task it spawned, wait for them to
    /// finish, and fail any pending command waiters (spec §3/§5).
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.session_task.lock().await.take() {
            let _ = handle.await;
        }
        if let Some(engine) = self.inner.command_engine.lock().await.take() {
            engine.fail_all_shutting_down();
        }
        self.inner.connecting.store(false, Ordering::SeqCst);
        let _ = self.inner.status.send(SessionStatus::Disconnected);
    }

    #[must_use]
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    #[must_use]
    pub fn devices(&self) -> EntityStream<Device> {
        EntityStream::new(self.inner.store.subscribe_devices())
    }

    #[must_use]
    pub fn rooms(&self) -> EntityStream<Room> {
        EntityStream::new(self.inner.store.subscribe_rooms())
    }

    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.store.subscribe_changes()
    }

    /// Send a `turn_on`/`turn_off` command against a device or room,
    /// retrying across controllers until acked (spec §4.5).
    pub async fn command(&self, entity: &EntityId, action: DeviceAction) -> Result<(), CoreError> {
        let engine = self.inner.command_engine.lock().await.clone().ok_or(CoreError::LostConnection)?;
        let (target, current) = self.target_and_current(entity)?;
        engine.execute(&target, current, action).await
    }

    fn target_and_current(&self, entity: &EntityId) -> Result<(CommandTarget, CurrentLevels), CoreError> {
        match entity {
            EntityId::Device(id) => {
                let device = self.inner.store.device(id).ok_or_else(|| CoreError::NotFound(id.to_string()))?;
                let target = CommandTarget {
                    mesh_id: device.mesh_id,
                    controllers_in_order: device.controllers_in_order.clone(),
                    default_controller: device.default_controller,
                };
                let current = CurrentLevels {
                    power: device.state.power,
                    brightness: device.state.brightness,
                    color_temp: device.state.color_temp,
                    rgb: device.state.rgb.rgb,
                };
                Ok((target, current))
            }
            EntityId::Room(id) => {
                let room = self.inner.store.room(id).ok_or_else(|| CoreError::NotFound(id.to_string()))?;
                let target = CommandTarget {
                    mesh_id: room.mesh_id,
                    controllers_in_order: room.controllers_in_order.clone(),
                    default_controller: room.default_controller,
                };
                let current = CurrentLevels {
                    power: room.state.power,
                    brightness: room.state.brightness,
                    color_temp: room.state.color_temp,
                    rgb: room.state.rgb.rgb,
                };
                Ok((target, current))
            }
        }
    }

    async fn active_home(&self) -> HomeId {
        self.inner.active_home.lock().await.clone().unwrap_or_else(|| HomeId::from(""))
    }

    /// Drive `Disconnected -> Connecting -> Authenticating -> Ready` on
    /// every (re)connect, falling back to `Reconnecting`/backoff on loss,
    /// until cancelled (spec §4.3).
    async fn session_loop(&self) {
        let allow_fallback = self.inner.config.gateway_tls_policy == GatewayTlsPolicy::AllowFallback;
        loop {
            if self.inner.cancel.is_cancelled() {
                break;
            }
            let _ = self.inner.status.send(SessionStatus::Connecting);

            let Some(rest_session) = self.inner.rest_session.lock().await.clone() else {
                warn!("session loop has no rest session, stopping");
                break;
            };
            let login_frame = session::derive_login_frame(rest_session.user_id, &rest_session.authorize);

            let _ = self.inner.status.send(SessionStatus::Authenticating);
            match session::connect_with_fallback(&login_frame, allow_fallback).await {
                Ok((stream, kind)) => {
                    info!(?kind, "gateway session established");
                    let _ = self.inner.status.send(SessionStatus::Ready);
                    self.run_ready(stream).await;
                    if self.inner.cancel.is_cancelled() {
                        break;
                    }
                    let _ = self.inner.status.send(SessionStatus::Reconnecting);
                    tokio::time::sleep(self.inner.config.reconnect_backoff).await;
                }
                Err(err) => {
                    warn!(error = %err, "gateway connect failed, backing off");
                    if self.inner.cancel.is_cancelled() {
                        break;
                    }
                    tokio::time::sleep(self.inner.config.connect_backoff).await;
                }
            }
        }
        let _ = self.inner.status.send(SessionStatus::Disconnected);
    }

    /// Run the reader/writer/heartbeat/tracker tasks for one established
    /// connection until it drops or the client is cancelled.
    async fn run_ready(&self, stream: GatewayStream) {
        let (read_half, write_half) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel::<Vec<u8>>(OUTBOUND_QUEUE_CAPACITY);

        let command_engine = Arc::new(CommandEngine::new(
            outbound_tx.clone(),
            self.inner.config.command_ack_timeout,
            self.inner.config.command_retry_attempts(),
        ));
        let tracker = Arc::new(ControllerTracker::new(self.inner.store.clone(), outbound_tx.clone()));
        *self.inner.command_engine.lock().await = Some(command_engine.clone());
        *self.inner.tracker.lock().await = Some(tracker.clone());

        let child = self.inner.cancel.child_token();
        let handles = vec![
            tokio::spawn(writer_task(write_half, outbound_rx, child.clone())),
            tokio::spawn(heartbeat_task(outbound_tx.clone(), self.inner.config.heartbeat_interval, child.clone())),
            tokio::spawn(tracker_task(tracker.clone(), self.inner.config.tracker_refresh_interval, child.clone())),
        ];

        let active_home = self.active_home().await;
        reader_loop(read_half, outbound_tx, self.inner.store.clone(), command_engine.clone(), tracker, active_home, child.clone())
            .await;

        child.cancel();
        for handle in handles {
            let _ = handle.await;
        }
        command_engine.fail_all_disconnected();
        *self.inner.command_engine.lock().await = None;
        *self.inner.tracker.lock().await = None;
    }
}

async fn writer_task(mut write_half: GatewayWriteHalf, mut outbound_rx: mpsc::Receiver<Vec<u8>>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            frame = outbound_rx.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(err) = write_half.write_all(&frame).await {
                            warn!(error = %err, "gateway write failed");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }
    let _ = write_half.shutdown().await;
}

/// Fires every `interval` while the session is `Ready` (spec §4.3): the
/// dedicated heartbeat opcode is preferred over resending the login frame
/// (spec §9 open question, resolved in DESIGN.md).
async fn heartbeat_task(outbound_tx: mpsc::Sender<Vec<u8>>, interval: std::time::Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if outbound_tx.send(codec::encode_session_heartbeat()).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Refreshes once right after connect, then every `interval` (spec §4.4).
async fn tracker_task(tracker: Arc<ControllerTracker>, interval: std::time::Duration, cancel: CancellationToken) {
    tracker.refresh().await;
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => tracker.refresh().await,
        }
    }
}

/// Reads frames off the wire and dispatches each one; replies to every
/// `0x73` server request directly off the raw bytes rather than only via
/// [`InboundEvent::AckRequired`] (spec §8 invariant 3: *every* `0x73` frame
/// gets exactly one ack, including the ones `codec::decode_frame` already
/// recognizes as a Delta/Sensor/Snapshot and routes elsewhere).
async fn reader_loop(
    mut read_half: GatewayReadHalf,
    outbound_tx: mpsc::Sender<Vec<u8>>,
    store: Arc<DataStore>,
    command_engine: Arc<CommandEngine>,
    tracker: Arc<ControllerTracker>,
    active_home: HomeId,
    cancel: CancellationToken,
) {
    let mut buf = Vec::new();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = read_half.read_some(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!("gateway peer closed the connection");
                        break;
                    }
                    Ok(_) => drain_frames(&mut buf, &outbound_tx, &store, &command_engine, &tracker, &active_home).await,
                    Err(err) => {
                        warn!(error = %err, "gateway read failed");
                        break;
                    }
                }
            }
        }
    }
}

async fn drain_frames(
    buf: &mut Vec<u8>,
    outbound_tx: &mpsc::Sender<Vec<u8>>,
    store: &DataStore,
    command_engine: &CommandEngine,
    tracker: &ControllerTracker,
    active_home: &HomeId,
) {
    loop {
        let Some((consumed, event)) = codec::decode_frame(buf) else { break };
        let frame_type = buf[0];
        if frame_type == 0x73 && consumed >= 11 {
            let response_id = [buf[9], buf[10]];
            if outbound_tx.send(codec::encode_ack(response_id)).await.is_err() {
                buf.drain(..consumed);
                return;
            }
        }
        if let Some(event) = event {
            apply_event(event, store, command_engine, tracker, active_home);
        }
        buf.drain(..consumed);
    }
}

fn apply_event(
    event: InboundEvent,
    store: &DataStore,
    command_engine: &CommandEngine,
    tracker: &ControllerTracker,
    active_home: &HomeId,
) {
    match event {
        InboundEvent::AckRequired { .. } => {}
        InboundEvent::Delta { mesh_id, on, brightness } => {
            store.apply_power_brightness(active_home, mesh_id, on, brightness);
        }
        InboundEvent::Sensor { mesh_id, motion, ambient_light } => {
            store.apply_sensor(active_home, mesh_id, motion, ambient_light);
        }
        InboundEvent::Snapshot { records } | InboundEvent::Batched { records } => {
            for (mesh_id, state) in records {
                store.apply_element_state(active_home, mesh_id, state);
            }
        }
        InboundEvent::Presence { switch_id } => tracker.mark_reachable(active_home, switch_id),
        InboundEvent::CommandAck { sequence } => command_engine.resolve_ack(sequence),
    }
}
