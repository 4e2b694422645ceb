//! Sync engine actor
//!
//! One sequential command loop per document path. User intents, remote
//! notifications, timer expiries, and write results all arrive as
//! [`EngineCommand`]s on a single mpsc queue, so no two state transitions
//! ever execute concurrently for the same controller or session.
//!
//! Writes are dispatched fire-and-forget onto spawned tasks; their
//! results come back through the queue as `WriteFinished`, keeping the
//! loop responsive while a write is in flight.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::state::{FieldView, SessionView, SharedState};
use crate::store::{DocumentStore, StoreError};
use crate::sync::controller::ControllerSet;
use crate::sync::reconcile::Reconciler;
use crate::sync::session::{AiringSession, TickOutcome};
use crate::sync::timers::{TimerKey, TimerPool};
use onair_common::document::{DocumentPatch, FieldPatch, OnAirDocument};
use onair_common::events::{CancelReason, OnAirEvent};
use onair_common::{FieldContent, FieldName};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

const COMMAND_QUEUE_CAPACITY: usize = 64;

/// What an in-flight write was trying to accomplish
#[derive(Debug, Clone)]
pub enum WriteIntent {
    /// A single-field toggle (plus its exclusion force-offs)
    Toggle { field: FieldName, target: bool },
    /// The airing session's combined go-live write
    GoLive { field: FieldName },
    /// Self-healing force-off of an invalid remote activation
    Corrective { field: FieldName },
}

/// Commands processed by the engine loop
#[derive(Debug)]
pub enum EngineCommand {
    /// Local toggle intent
    Toggle {
        field: FieldName,
        target: bool,
        extra: BTreeMap<String, String>,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Begin the countdown-to-air workflow
    StartAiring {
        field: FieldName,
        content: FieldContent,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Abort a running countdown
    CancelAiring { reply: oneshot::Sender<Result<()>> },
    /// Push notification from the document subscription
    RemoteChange(OnAirDocument),
    /// A field's settle window expired
    SettleElapsed(FieldName),
    /// One countdown second elapsed
    CountdownTick,
    /// An in-flight write completed
    WriteFinished {
        intent: WriteIntent,
        result: std::result::Result<(), StoreError>,
    },
}

/// Cloneable handle for submitting intents to the engine
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Request a visibility toggle for one field
    ///
    /// `extra` attributes are pushed alongside the visibility flag so the
    /// remote document is never visible with empty content, even
    /// transiently. Accepted requests resolve immediately; the write
    /// outcome is observed via events.
    pub async fn toggle(
        &self,
        field: FieldName,
        target: bool,
        extra: BTreeMap<String, String>,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Toggle {
            field,
            target,
            extra,
            reply,
        })
        .await?;
        rx.await.map_err(|_| Self::engine_gone())?
    }

    /// Start the countdown-to-air workflow
    pub async fn start_airing(&self, field: FieldName, content: FieldContent) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::StartAiring {
            field,
            content,
            reply,
        })
        .await?;
        rx.await.map_err(|_| Self::engine_gone())?
    }

    /// Cancel a running countdown
    pub async fn cancel_airing(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::CancelAiring { reply }).await?;
        rx.await.map_err(|_| Self::engine_gone())?
    }

    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| Self::engine_gone())
    }

    fn engine_gone() -> Error {
        Error::Internal("sync engine stopped".to_string())
    }
}

/// The engine actor
pub struct SyncEngine<S: DocumentStore> {
    store: Arc<S>,
    path: String,
    config: Config,
    shared: Arc<SharedState>,
    controllers: ControllerSet,
    session: AiringSession,
    reconciler: Reconciler,
    timers: TimerPool<EngineCommand>,
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl<S: DocumentStore> SyncEngine<S> {
    /// Load initial state, subscribe to the document, and spawn the loop
    ///
    /// The subscription lives for the lifetime of the engine; its
    /// notifications are forwarded into the command queue so
    /// reconciliation is serialized with everything else.
    pub async fn start(
        store: Arc<S>,
        config: Config,
        shared: Arc<SharedState>,
    ) -> Result<EngineHandle> {
        let path = config.document_path.clone();
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);

        // Initial load: seed confirmed visibility before any notification
        let initial = store.read(&path).await?.unwrap_or_default();
        let mut controllers = ControllerSet::new();
        for field in FieldName::all() {
            let state = initial.field(field);
            controllers.get_mut(field).seed(&state);
            shared
                .set_field_view(
                    field,
                    FieldView {
                        visible: state.visible,
                        pending: false,
                        content: state.content,
                    },
                )
                .await;
        }
        info!(path = %path, "Initial on-air document loaded");

        // Forward push notifications into the command queue
        let mut subscription = store.subscribe(&path);
        let forward_tx = cmd_tx.clone();
        tokio::spawn(async move {
            while let Some(doc) = subscription.recv().await {
                if forward_tx
                    .send(EngineCommand::RemoteChange(doc))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            debug!("Document subscription closed");
        });

        let engine = Self {
            store,
            path,
            timers: TimerPool::new(cmd_tx.clone()),
            shared,
            controllers,
            session: AiringSession::new(),
            reconciler: Reconciler::new(),
            cmd_tx: cmd_tx.clone(),
            config,
        };
        tokio::spawn(engine.run(cmd_rx));

        Ok(EngineHandle { tx: cmd_tx })
    }

    async fn run(mut self, mut rx: mpsc::Receiver<EngineCommand>) {
        info!("Sync engine started");
        while let Some(command) = rx.recv().await {
            match command {
                EngineCommand::Toggle {
                    field,
                    target,
                    extra,
                    reply,
                } => {
                    let result = self.handle_toggle(field, target, extra).await;
                    let _ = reply.send(result);
                }
                EngineCommand::StartAiring {
                    field,
                    content,
                    reply,
                } => {
                    let result = self.handle_start_airing(field, content).await;
                    let _ = reply.send(result);
                }
                EngineCommand::CancelAiring { reply } => {
                    let result = self.handle_cancel_airing().await;
                    let _ = reply.send(result);
                }
                EngineCommand::RemoteChange(doc) => self.handle_remote_change(doc).await,
                EngineCommand::SettleElapsed(field) => self.handle_settle_elapsed(field).await,
                EngineCommand::CountdownTick => self.handle_countdown_tick().await,
                EngineCommand::WriteFinished { intent, result } => {
                    self.handle_write_finished(intent, result).await
                }
            }
        }
        info!("Sync engine stopped");
    }

    // ------------------------------------------------------------------
    // Local toggle intents
    // ------------------------------------------------------------------

    async fn handle_toggle(
        &mut self,
        field: FieldName,
        target: bool,
        extra: BTreeMap<String, String>,
    ) -> Result<()> {
        let patch = self.controllers.get_mut(field).begin_toggle(target, &extra)?;

        debug!(field = %field, target, "Toggle accepted, dispatching merge-write");
        self.timers.schedule(
            TimerKey::Settle(field),
            self.config.settle_window(),
            EngineCommand::SettleElapsed(field),
        );
        self.dispatch_write(WriteIntent::Toggle { field, target }, patch);

        // Optimistic local view; reverted if the write fails
        let content = self.controllers.get(field).content().clone();
        self.shared
            .set_field_view(
                field,
                FieldView {
                    visible: target,
                    pending: true,
                    content,
                },
            )
            .await;
        self.shared.broadcast_event(OnAirEvent::FieldVisibilityChanged {
            field,
            visible: target,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn handle_settle_elapsed(&mut self, field: FieldName) {
        let ctrl = self.controllers.get_mut(field);
        if let Some(confirmed) = ctrl.settle() {
            let content = ctrl.content().clone();
            debug!(field = %field, confirmed, "Settle window elapsed");
            self.shared
                .set_field_view(
                    field,
                    FieldView {
                        visible: confirmed,
                        pending: false,
                        content,
                    },
                )
                .await;
        }
    }

    // ------------------------------------------------------------------
    // Airing session
    // ------------------------------------------------------------------

    async fn handle_start_airing(&mut self, field: FieldName, content: FieldContent) -> Result<()> {
        self.session
            .start(field, content, self.config.countdown_ticks)?;

        info!(field = %field, ticks = self.config.countdown_ticks, "Countdown to air started");
        self.timers.schedule(
            TimerKey::Countdown,
            self.config.tick_interval(),
            EngineCommand::CountdownTick,
        );
        self.publish_session_view().await;
        self.shared.broadcast_event(OnAirEvent::CountdownStarted {
            field,
            remaining_ticks: self.session.remaining_ticks(),
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn handle_cancel_airing(&mut self) -> Result<()> {
        let field = self.session.cancel()?;
        self.timers.cancel(TimerKey::Countdown);

        info!(field = %field, "Countdown cancelled by operator, no write issued");
        self.publish_session_view().await;
        self.shared.broadcast_event(OnAirEvent::CountdownCancelled {
            field,
            reason: CancelReason::Operator,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn handle_countdown_tick(&mut self) {
        match self.session.tick() {
            TickOutcome::Ignored => {}
            TickOutcome::Continue { remaining } => {
                let field = self.session.target();
                self.timers.schedule(
                    TimerKey::Countdown,
                    self.config.tick_interval(),
                    EngineCommand::CountdownTick,
                );
                self.publish_session_view().await;
                if let Some(field) = field {
                    self.shared.broadcast_event(OnAirEvent::CountdownTick {
                        field,
                        remaining_ticks: remaining,
                        timestamp: chrono::Utc::now(),
                    });
                }
            }
            TickOutcome::Expired { field, content } => {
                info!(field = %field, "Grace period over, going live");
                self.shared.broadcast_event(OnAirEvent::CountdownTick {
                    field,
                    remaining_ticks: 0,
                    timestamp: chrono::Utc::now(),
                });

                // The go-live echo settles like a toggle's own echo
                self.controllers
                    .get_mut(field)
                    .begin_external_settle(true, content.clone());
                self.timers.schedule(
                    TimerKey::Settle(field),
                    self.config.settle_window(),
                    EngineCommand::SettleElapsed(field),
                );

                let patch = AiringSession::go_live_patch(field, &content);
                self.dispatch_write(WriteIntent::GoLive { field }, patch);

                self.shared
                    .set_field_view(
                        field,
                        FieldView {
                            visible: true,
                            pending: true,
                            content,
                        },
                    )
                    .await;
                self.publish_session_view().await;
            }
        }
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    async fn handle_remote_change(&mut self, doc: OnAirDocument) {
        let outcome = self.reconciler.assess(&doc, &self.controllers);
        if outcome.bootstrap {
            debug!("Skipping bootstrap notification");
            return;
        }

        for (field, state) in outcome.adopt {
            // Another operator activating the countdown's field pre-empts it
            if state.visible && self.session.preempt(field) {
                self.timers.cancel(TimerKey::Countdown);
                info!(field = %field, "Countdown pre-empted by remote activation");
                self.publish_session_view().await;
                self.shared.broadcast_event(OnAirEvent::CountdownCancelled {
                    field,
                    reason: CancelReason::Preempted,
                    timestamp: chrono::Utc::now(),
                });
            }

            debug!(field = %field, visible = state.visible, "Adopting remote state");
            self.controllers.get_mut(field).adopt_remote(&state);
            self.shared
                .set_field_view(
                    field,
                    FieldView {
                        visible: state.visible,
                        pending: false,
                        content: state.content,
                    },
                )
                .await;
            self.shared.broadcast_event(OnAirEvent::FieldAdopted {
                field,
                visible: state.visible,
                timestamp: chrono::Utc::now(),
            });
        }

        for field in outcome.correct {
            // Inconsistent remote state: self-heal, log only
            warn!(field = %field, "Remote visible=true with gated content missing, forcing off");
            let patch = DocumentPatch::new().set(field, FieldPatch::visible(false));
            self.dispatch_write(WriteIntent::Corrective { field }, patch);
            self.shared.broadcast_event(OnAirEvent::RemoteCorrected {
                field,
                timestamp: chrono::Utc::now(),
            });
        }

        for (field, content) in outcome.refresh {
            self.controllers.get_mut(field).refresh_content(&content);
            let mut view = self.shared.field_view(field).await;
            view.content = content;
            self.shared.set_field_view(field, view).await;
        }
    }

    // ------------------------------------------------------------------
    // Write results
    // ------------------------------------------------------------------

    async fn handle_write_finished(
        &mut self,
        intent: WriteIntent,
        result: std::result::Result<(), StoreError>,
    ) {
        match (intent, result) {
            (WriteIntent::Toggle { field, .. }, Ok(())) => {
                debug!(field = %field, "Toggle write acknowledged");
            }
            (WriteIntent::Toggle { field, .. }, Err(e)) => {
                warn!(field = %field, error = %e, "Toggle write failed, reverting");
                self.timers.cancel(TimerKey::Settle(field));
                let ctrl = self.controllers.get_mut(field);
                ctrl.revert();
                let (visible, content) = (ctrl.confirmed_visible(), ctrl.content().clone());
                self.shared
                    .set_field_view(
                        field,
                        FieldView {
                            visible,
                            pending: false,
                            content,
                        },
                    )
                    .await;
                self.shared.broadcast_event(OnAirEvent::WriteFailed {
                    field,
                    message: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
            (WriteIntent::GoLive { field }, Ok(())) => {
                if let Some((field, content)) = self.session.write_finished() {
                    info!(field = %field, "Go-live write acknowledged");
                    self.publish_session_view().await;
                    self.shared.broadcast_event(OnAirEvent::WentLive {
                        field,
                        content,
                        timestamp: chrono::Utc::now(),
                    });
                } else {
                    debug!(field = %field, "Go-live acknowledged outside PROCESSING");
                }
            }
            (WriteIntent::GoLive { field }, Err(e)) => {
                // Back to NORMAL regardless; operator is never stuck
                warn!(field = %field, error = %e, "Go-live write failed");
                self.session.write_finished();
                self.timers.cancel(TimerKey::Settle(field));
                let ctrl = self.controllers.get_mut(field);
                ctrl.revert();
                let (visible, content) = (ctrl.confirmed_visible(), ctrl.content().clone());
                self.shared
                    .set_field_view(
                        field,
                        FieldView {
                            visible,
                            pending: false,
                            content,
                        },
                    )
                    .await;
                self.publish_session_view().await;
                self.shared.broadcast_event(OnAirEvent::WriteFailed {
                    field,
                    message: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
            (WriteIntent::Corrective { field }, Ok(())) => {
                debug!(field = %field, "Corrective write acknowledged");
            }
            (WriteIntent::Corrective { field }, Err(e)) => {
                // No retry here; the next notification re-assesses
                warn!(field = %field, error = %e, "Corrective write failed");
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn dispatch_write(&self, intent: WriteIntent, patch: DocumentPatch) {
        let store = self.store.clone();
        let path = self.path.clone();
        let tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            let result = store.write(&path, patch).await;
            let _ = tx.send(EngineCommand::WriteFinished { intent, result }).await;
        });
    }

    async fn publish_session_view(&self) {
        self.shared
            .set_session_view(SessionView {
                phase: self.session.phase(),
                field: self.session.target(),
                remaining_ticks: self.session.remaining_ticks(),
            })
            .await;
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle").finish_non_exhaustive()
    }
}
