use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::flight::{self, FlightOutcome};
use super::types::{ConnectionHandle, ConnectionState, ManagerSnapshot};
use crate::config::ConnectionPolicy;
use crate::db::connector::Connector;
use crate::error::ForgeError;
use crate::utils::logging::duration_ms;

pub(super) type CheckoutReply<T> = RpcReplyPort<Result<Checkout<T>, ForgeError>>;

/// What a checkout hands back to the caller side of the manager.
#[derive(Debug)]
pub(super) struct Checkout<T> {
    pub handle: ConnectionHandle<T>,
    /// `true` when the handle came from the cache and has not been pinged
    /// by the current caller yet.
    pub reused: bool,
}

#[derive(Debug)]
pub(super) enum ManagerMessage<T> {
    /// Hand out the cached handle, or join (or start) the connect flight.
    Checkout(CheckoutReply<T>),

    /// A caller saw the handle of this generation fail its reuse ping.
    Invalidate { generation: u64 },

    /// Close and forget the cached handle. An in-flight connect keeps running
    /// for its waiters, and its connection is closed once it settles.
    Reset(RpcReplyPort<()>),

    Snapshot(RpcReplyPort<ManagerSnapshot>),

    /// Sent by the spawned connect flight when it settles.
    FlightComplete(FlightOutcome<T>),
}

enum Slot<T> {
    Uninitialized,
    Connecting {
        waiters: Vec<CheckoutReply<T>>,
        /// Set by a reset that arrived mid-flight.
        discard: bool,
    },
    Ready(ConnectionHandle<T>),
    Failed,
}

pub(super) struct ConnectionActorState<T> {
    slot: Slot<T>,
    generation: u64,
    flights_started: u64,
}

impl<T> ConnectionActorState<T> {
    fn snapshot(&self) -> ManagerSnapshot {
        let (state, connected_since) = match &self.slot {
            Slot::Uninitialized => (ConnectionState::Uninitialized, None),
            Slot::Connecting { .. } => (ConnectionState::Connecting, None),
            Slot::Ready(handle) => (ConnectionState::Ready, Some(handle.created_at())),
            Slot::Failed => (ConnectionState::Failed, None),
        };
        ManagerSnapshot {
            state,
            generation: self.generation,
            flights_started: self.flights_started,
            connected_since,
        }
    }
}

/// Owns the single cached connection. All state transitions happen inside
/// `handle`, so at most one connect flight exists at any time.
pub(super) struct ConnectionActor<C: Connector> {
    pub connector: Arc<C>,
    pub policy: ConnectionPolicy,
}

#[ractor::async_trait]
impl<C: Connector> Actor for ConnectionActor<C> {
    type Msg = ManagerMessage<C::Conn>;
    type State = ConnectionActorState<C::Conn>;
    type Arguments = ();

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(
            connect_attempts = self.policy.connect_attempts,
            connect_timeout_ms = duration_ms(self.policy.connect_timeout),
            retry_delay_ms = duration_ms(self.policy.retry_delay),
            "ConnectionActor initialized"
        );
        Ok(ConnectionActorState {
            slot: Slot::Uninitialized,
            generation: 0,
            flights_started: 0,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ManagerMessage::Checkout(reply) => self.checkout(myself, state, reply),
            ManagerMessage::Invalidate { generation } => self.invalidate(state, generation),
            ManagerMessage::Reset(reply) => {
                self.reset(state).await;
                let _ = reply.send(());
            }
            ManagerMessage::Snapshot(reply) => {
                let _ = reply.send(state.snapshot());
            }
            ManagerMessage::FlightComplete(outcome) => self.flight_complete(state, outcome),
        }
        Ok(())
    }
}

impl<C: Connector> ConnectionActor<C> {
    fn checkout(
        &self,
        myself: ActorRef<ManagerMessage<C::Conn>>,
        state: &mut ConnectionActorState<C::Conn>,
        reply: CheckoutReply<C::Conn>,
    ) {
        let slot = std::mem::replace(&mut state.slot, Slot::Uninitialized);
        state.slot = match slot {
            Slot::Ready(handle) => {
                let _ = reply.send(Ok(Checkout {
                    handle: handle.clone(),
                    reused: true,
                }));
                Slot::Ready(handle)
            }
            Slot::Connecting {
                mut waiters,
                discard,
            } => {
                waiters.push(reply);
                debug!(waiters = waiters.len(), "Joined in-flight connect");
                Slot::Connecting { waiters, discard }
            }
            Slot::Uninitialized | Slot::Failed => {
                state.flights_started += 1;
                self.start_flight(myself);
                Slot::Connecting {
                    waiters: vec![reply],
                    discard: false,
                }
            }
        };
    }

    fn start_flight(&self, myself: ActorRef<ManagerMessage<C::Conn>>) {
        let connector = Arc::clone(&self.connector);
        let policy = self.policy;
        tokio::spawn(async move {
            let outcome = flight::run(connector, policy).await;
            if let Err(e) = myself.cast(ManagerMessage::FlightComplete(outcome)) {
                warn!(error = %e, "ConnectionActor gone before connect flight settled");
            }
        });
    }

    fn flight_complete(
        &self,
        state: &mut ConnectionActorState<C::Conn>,
        outcome: FlightOutcome<C::Conn>,
    ) {
        let (waiters, discard) = match std::mem::replace(&mut state.slot, Slot::Uninitialized) {
            Slot::Connecting { waiters, discard } => (waiters, discard),
            other => {
                // Only one flight runs at a time, so this cannot normally happen.
                warn!("Connect flight settled while no flight was recorded; discarding result");
                if let Ok(conn) = outcome.result {
                    self.close_in_background(conn);
                }
                state.slot = other;
                return;
            }
        };

        match outcome.result {
            Ok(conn) => {
                state.generation += 1;
                let handle = ConnectionHandle::new(conn, outcome.attempts, state.generation);
                info!(
                    generation = state.generation,
                    attempts = outcome.attempts,
                    waiters = waiters.len(),
                    "Record store connection established"
                );
                for waiter in waiters {
                    let _ = waiter.send(Ok(Checkout {
                        handle: handle.clone(),
                        reused: false,
                    }));
                }
                if discard {
                    info!(
                        generation = state.generation,
                        "Manager was reset during connect; closing new connection"
                    );
                    self.close_in_background(handle.into_conn());
                } else {
                    state.slot = Slot::Ready(handle);
                }
            }
            Err(err) => {
                error!(
                    attempts = outcome.attempts,
                    error = %err,
                    waiters = waiters.len(),
                    "Record store unreachable; connect attempts exhausted"
                );
                for waiter in waiters {
                    let _ = waiter.send(Err(ForgeError::ConnectionUnavailable {
                        attempts: outcome.attempts,
                        source: Arc::clone(&err),
                    }));
                }
                state.slot = if discard {
                    Slot::Uninitialized
                } else {
                    Slot::Failed
                };
            }
        }
    }

    fn invalidate(&self, state: &mut ConnectionActorState<C::Conn>, generation: u64) {
        match &state.slot {
            Slot::Ready(handle) if handle.generation() == generation => {}
            _ => {
                debug!(generation, "Ignoring stale invalidation");
                return;
            }
        }
        if let Slot::Ready(handle) = std::mem::replace(&mut state.slot, Slot::Uninitialized) {
            info!(generation, "Discarding cached connection");
            self.close_in_background(handle.into_conn());
        }
    }

    async fn reset(&self, state: &mut ConnectionActorState<C::Conn>) {
        match std::mem::replace(&mut state.slot, Slot::Uninitialized) {
            Slot::Ready(handle) => {
                info!(generation = handle.generation(), "Closing cached connection");
                self.connector.close(handle.into_conn()).await;
            }
            Slot::Connecting { waiters, .. } => {
                debug!(
                    waiters = waiters.len(),
                    "Reset during connect; result will be closed when it settles"
                );
                state.slot = Slot::Connecting {
                    waiters,
                    discard: true,
                };
            }
            Slot::Uninitialized | Slot::Failed => {}
        }
    }

    fn close_in_background(&self, conn: C::Conn) {
        let connector = Arc::clone(&self.connector);
        tokio::spawn(async move {
            connector.close(conn).await;
        });
    }
}
