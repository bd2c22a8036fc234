//! WeblogStoreActor - in-memory append-only log of weblog events.
//!
//! The actor exclusively owns the event sequence for the lifetime of the
//! session. Append is the only mutation; existing entries are never removed
//! or reordered. Reads reply with point-in-time copies, so a snapshot is
//! taken strictly before or strictly after any append.
//!
//! Consumers that want push delivery register an unbounded channel with
//! `Subscribe`; everyone else re-requests `Snapshot` or polls
//! `EventsSince` on demand.

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tokio::sync::mpsc;

use weblog_types::WeblogEvent;

/// Actor that owns the append-only weblog event log
#[derive(Debug, Default)]
pub struct WeblogStoreActor;

/// State for WeblogStoreActor
#[derive(Default)]
pub struct WeblogStoreState {
    events: Vec<WeblogEvent>,
    subscribers: Vec<mpsc::UnboundedSender<WeblogEvent>>,
}

// ============================================================================
// Messages
// ============================================================================

/// Messages handled by WeblogStoreActor
#[derive(Debug)]
pub enum WeblogStoreMsg {
    /// Append a decoded event at the end of the log. Always succeeds;
    /// replies with the assigned zero-based sequence index.
    Append {
        event: WeblogEvent,
        reply: RpcReplyPort<usize>,
    },
    /// Get a copy of the full log in insertion order.
    Snapshot {
        reply: RpcReplyPort<Vec<WeblogEvent>>,
    },
    /// Get all events with sequence index >= `since`, in insertion order.
    EventsSince {
        since: usize,
        reply: RpcReplyPort<Vec<WeblogEvent>>,
    },
    /// Get the current log length.
    Len { reply: RpcReplyPort<usize> },
    /// Register a channel that receives every event appended from now on.
    Subscribe {
        tx: mpsc::UnboundedSender<WeblogEvent>,
    },
}

#[async_trait]
impl Actor for WeblogStoreActor {
    type Msg = WeblogStoreMsg;
    type State = WeblogStoreState;
    type Arguments = ();

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            actor_id = %myself.get_id(),
            "WeblogStoreActor starting"
        );
        Ok(WeblogStoreState::default())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WeblogStoreMsg::Append { event, reply } => {
                let seq = Self::handle_append(event, state);
                let _ = reply.send(seq);
            }
            WeblogStoreMsg::Snapshot { reply } => {
                let _ = reply.send(state.events.clone());
            }
            WeblogStoreMsg::EventsSince { since, reply } => {
                let suffix = if since < state.events.len() {
                    state.events[since..].to_vec()
                } else {
                    Vec::new()
                };
                let _ = reply.send(suffix);
            }
            WeblogStoreMsg::Len { reply } => {
                let _ = reply.send(state.events.len());
            }
            WeblogStoreMsg::Subscribe { tx } => {
                state.subscribers.push(tx);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::info!(
            actor_id = %myself.get_id(),
            stored_events = state.events.len(),
            "WeblogStoreActor stopped"
        );
        Ok(())
    }
}

impl WeblogStoreActor {
    fn handle_append(event: WeblogEvent, state: &mut WeblogStoreState) -> usize {
        state.events.push(event.clone());
        let seq = state.events.len() - 1;

        // Fan out after the append is applied; drop closed subscribers.
        state.subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        seq
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Error talking to the store actor (mailbox closed or actor stopped).
#[derive(Debug, Clone, thiserror::Error)]
#[error("weblog store unavailable: {0}")]
pub struct StoreUnavailable(String);

/// Owned handle over the store actor.
///
/// Cloneable and cheap to pass around; every component that needs the log
/// receives one of these instead of reaching for process-wide state.
#[derive(Clone)]
pub struct WeblogLog {
    store: ActorRef<WeblogStoreMsg>,
}

impl WeblogLog {
    /// Spawn a fresh store actor and return its handle plus the join handle
    /// tying the actor's lifetime to the session.
    pub async fn spawn() -> Result<(Self, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
        let (store, handle) = Actor::spawn(None, WeblogStoreActor, ()).await?;
        Ok((Self { store }, handle))
    }

    pub fn from_ref(store: ActorRef<WeblogStoreMsg>) -> Self {
        Self { store }
    }

    pub fn actor_ref(&self) -> ActorRef<WeblogStoreMsg> {
        self.store.clone()
    }

    /// Append one decoded event; returns its sequence index.
    pub async fn append(&self, event: WeblogEvent) -> Result<usize, StoreUnavailable> {
        ractor::call!(self.store, |reply| WeblogStoreMsg::Append { event, reply })
            .map_err(|e| StoreUnavailable(e.to_string()))
    }

    /// Copy of the full log in insertion order.
    pub async fn snapshot(&self) -> Result<Vec<WeblogEvent>, StoreUnavailable> {
        ractor::call!(self.store, |reply| WeblogStoreMsg::Snapshot { reply })
            .map_err(|e| StoreUnavailable(e.to_string()))
    }

    /// Events with sequence index >= `since`, for incremental polling.
    pub async fn events_since(&self, since: usize) -> Result<Vec<WeblogEvent>, StoreUnavailable> {
        ractor::call!(self.store, |reply| WeblogStoreMsg::EventsSince {
            since,
            reply
        })
        .map_err(|e| StoreUnavailable(e.to_string()))
    }

    pub async fn len(&self) -> Result<usize, StoreUnavailable> {
        ractor::call!(self.store, |reply| WeblogStoreMsg::Len { reply })
            .map_err(|e| StoreUnavailable(e.to_string()))
    }

    pub async fn is_empty(&self) -> Result<bool, StoreUnavailable> {
        Ok(self.len().await? == 0)
    }

    /// Register for append notifications. Each appended event is delivered
    /// once, in log order, starting from the moment of subscription.
    pub fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<WeblogEvent>, StoreUnavailable> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.store
            .cast(WeblogStoreMsg::Subscribe { tx })
            .map_err(|e| StoreUnavailable(e.to_string()))?;
        Ok(rx)
    }
}

// ============================================================================
// Tests
// ============================================================================
