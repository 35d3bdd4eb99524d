//! The dispatch pipeline: how an action travels from the window that
//! produced it to every replica that must observe it.
//!
//! Dispatch runs an explicit sequence of named stages,
//! `validate -> forward-if-remote -> apply -> persist -> broadcast`,
//! so ordering and loop prevention are a property of a list, not of
//! middleware registration order.
//!
//! Roles:
//! - A **mirror** (window process) never applies a locally-originated
//!   action. The forward stage ships it to the host and stops the pipeline;
//!   the action is applied only when the host's broadcast replays it back.
//! - The **host** applies every action it sees, persists the settled state,
//!   and fans the same action out to every live window.
//!
//! Replayed envelopes carry [`Delivery::Replay`], which the forward stage
//! passes through untouched. That tag is the loop guard: a replay applied on
//! a mirror is never re-forwarded. Reducers never see the tag.

use dexwatch_protocol::{Action, RootState};
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::store::Store;

/// How an envelope entered this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Originated here, from a local user interaction.
    Local,
    /// Arrived from the host as a confirmed, ordered replay.
    Replay,
}

#[derive(Debug, Clone)]
pub struct ActionEnvelope {
    pub action: Action,
    pub delivery: Delivery,
}

impl ActionEnvelope {
    pub fn local(action: Action) -> Self {
        ActionEnvelope {
            action,
            delivery: Delivery::Local,
        }
    }

    pub fn replay(action: Action) -> Self {
        ActionEnvelope {
            action,
            delivery: Delivery::Replay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    Host,
    Mirror,
}

/// Mirror-side transport: ships a local action to the host.
pub trait ForwardLink: Send {
    fn forward(&mut self, action: &Action) -> Result<()>;
}

/// Host-side transport: replays an applied action to every live window.
/// Unreachable windows are the implementor's concern and never an error.
pub trait BroadcastFanout: Send {
    fn broadcast(&mut self, action: &Action);
}

/// Host-side persistence hook, invoked with the settled state after every
/// apply. Implementations log-and-swallow failures; persistence is
/// best-effort and never rolls back the in-memory state.
pub trait SnapshotSink: Send {
    fn persist(&mut self, state: &RootState);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Whether the action reached this process's store.
    pub applied: bool,
    /// The stage that stopped the pipeline, if any.
    pub stopped_at: Option<&'static str>,
}

enum StageFlow {
    Continue,
    Stop,
}

struct DispatchContext<'a> {
    role: StoreRole,
    store: &'a mut Store,
    forward: Option<&'a mut dyn ForwardLink>,
    fanout: Option<&'a mut dyn BroadcastFanout>,
    persist: Option<&'a mut dyn SnapshotSink>,
    applied: bool,
}

type StageFn = fn(&mut DispatchContext<'_>, &ActionEnvelope) -> StageFlow;

const STAGES: &[(&str, StageFn)] = &[
    ("validate", stage_validate),
    ("forward-if-remote", stage_forward_if_remote),
    ("apply", stage_apply),
    ("persist", stage_persist),
    ("broadcast", stage_broadcast),
];

fn stage_validate(_ctx: &mut DispatchContext<'_>, envelope: &ActionEnvelope) -> StageFlow {
    match envelope.action.validate() {
        Ok(()) => StageFlow::Continue,
        Err(err) => {
            warn!(
                action = envelope.action.kind(),
                code = %err.code,
                message = %err.message,
                "Rejected invalid action"
            );
            StageFlow::Stop
        }
    }
}

fn stage_forward_if_remote(ctx: &mut DispatchContext<'_>, envelope: &ActionEnvelope) -> StageFlow {
    if ctx.role != StoreRole::Mirror || envelope.delivery != Delivery::Local {
        return StageFlow::Continue;
    }

    match ctx.forward.as_mut() {
        Some(link) => {
            if let Err(err) = link.forward(&envelope.action) {
                // The host is the only writer; a lost forward is a lost
                // action, accepted when the host is gone.
                warn!(
                    action = envelope.action.kind(),
                    error = %err,
                    "Failed to forward action to host; action dropped"
                );
            } else {
                debug!(action = envelope.action.kind(), "Forwarded action to host");
            }
        }
        None => {
            error!(
                action = envelope.action.kind(),
                "Mirror store has no host link; action dropped"
            );
        }
    }
    // A mirror never applies its own pre-image; it waits for the replay.
    StageFlow::Stop
}

fn stage_apply(ctx: &mut DispatchContext<'_>, envelope: &ActionEnvelope) -> StageFlow {
    ctx.store.apply(&envelope.action);
    ctx.applied = true;
    StageFlow::Continue
}

fn stage_persist(ctx: &mut DispatchContext<'_>, _envelope: &ActionEnvelope) -> StageFlow {
    if ctx.role == StoreRole::Host {
        if let Some(sink) = ctx.persist.as_mut() {
            sink.persist(ctx.store.state());
        }
    }
    StageFlow::Continue
}

fn stage_broadcast(ctx: &mut DispatchContext<'_>, envelope: &ActionEnvelope) -> StageFlow {
    if ctx.role == StoreRole::Host {
        if let Some(fanout) = ctx.fanout.as_mut() {
            fanout.broadcast(&envelope.action);
        }
    }
    StageFlow::Continue
}

/// A store plus the pipeline wiring for its role. The host process builds
/// one with [`Dispatcher::host`] and attaches fanout and persistence; each
/// window builds one with [`Dispatcher::mirror`] and a link to the host.
pub struct Dispatcher {
    role: StoreRole,
    store: Store,
    forward: Option<Box<dyn ForwardLink>>,
    fanout: Option<Box<dyn BroadcastFanout>>,
    persist: Option<Box<dyn SnapshotSink>>,
}

impl Dispatcher {
    pub fn host(store: Store) -> Self {
        Dispatcher {
            role: StoreRole::Host,
            store,
            forward: None,
            fanout: None,
            persist: None,
        }
    }

    pub fn mirror(store: Store, forward: Box<dyn ForwardLink>) -> Self {
        Dispatcher {
            role: StoreRole::Mirror,
            store,
            forward: Some(forward),
            fanout: None,
            persist: None,
        }
    }

    pub fn with_fanout(mut self, fanout: Box<dyn BroadcastFanout>) -> Self {
        self.fanout = Some(fanout);
        self
    }

    pub fn with_persistence(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.persist = Some(sink);
        self
    }

    pub fn role(&self) -> StoreRole {
        self.role
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn dispatch(&mut self, envelope: ActionEnvelope) -> DispatchOutcome {
        let mut ctx = DispatchContext {
            role: self.role,
            store: &mut self.store,
            forward: self.forward.as_deref_mut(),
            fanout: self.fanout.as_deref_mut(),
            persist: self.persist.as_deref_mut(),
            applied: false,
        };

        for &(name, stage) in STAGES {
            match stage(&mut ctx, &envelope) {
                StageFlow::Continue => {}
                StageFlow::Stop => {
                    return DispatchOutcome {
                        applied: ctx.applied,
                        stopped_at: Some(name),
                    }
                }
            }
        }

        DispatchOutcome {
            applied: ctx.applied,
            stopped_at: None,
        }
    }
}
