//! Lazily created, shared record store connection.
//!
//! [`ConnectionManager`] is the caller side; it talks to a [`ConnectionActor`]
//! that owns the cached handle and the single in-flight connect.

mod actor;
mod flight;
mod types;

pub use types::{ConnectionHandle, ConnectionState, HealthReport, ManagerSnapshot};

use ractor::{Actor, ActorRef};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use crate::config::ConnectionPolicy;
use crate::db::connector::Connector;
use crate::error::ForgeError;
use crate::utils::logging::duration_ms;
use actor::{Checkout, ConnectionActor, ManagerMessage};

pub struct ConnectionManager<C: Connector> {
    actor: ActorRef<ManagerMessage<C::Conn>>,
    connector: Arc<C>,
    policy: ConnectionPolicy,
}

impl<C: Connector> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        Self {
            actor: self.actor.clone(),
            connector: Arc::clone(&self.connector),
            policy: self.policy,
        }
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Spawns the owning actor. No connection is opened until the first acquire.
    pub async fn spawn(connector: C, policy: ConnectionPolicy) -> Result<Self, ForgeError> {
        let connector = Arc::new(connector);
        let (actor, _jh) = Actor::spawn(
            None,
            ConnectionActor {
                connector: Arc::clone(&connector),
                policy,
            },
            (),
        )
        .await
        .map_err(|e| ForgeError::RactorError(format!("ConnectionActor spawn failed: {e}")))?;

        Ok(Self {
            actor,
            connector,
            policy,
        })
    }

    pub fn policy(&self) -> ConnectionPolicy {
        self.policy
    }

    /// Returns a live connection, connecting on first use.
    ///
    /// A cached handle is pinged first; if the ping fails or exceeds the reuse
    /// check timeout the handle is discarded and a fresh connect is made. All
    /// concurrent callers share one connect flight.
    pub async fn acquire(&self) -> Result<ConnectionHandle<C::Conn>, ForgeError> {
        let checkout = self.checkout().await?;
        if !checkout.reused {
            return Ok(checkout.handle);
        }

        let handle = checkout.handle;
        let generation = handle.generation();
        match timeout(
            self.policy.reuse_check_timeout,
            self.connector.ping(handle.conn()),
        )
        .await
        {
            Ok(Ok(())) => return Ok(handle),
            Ok(Err(e)) => {
                warn!(
                    generation,
                    error = %e,
                    "Cached connection failed its health check; reconnecting"
                );
            }
            Err(_) => {
                warn!(
                    generation,
                    timeout_ms = duration_ms(self.policy.reuse_check_timeout),
                    "Cached connection health check timed out; reconnecting"
                );
            }
        }

        ractor::cast!(self.actor, ManagerMessage::Invalidate { generation }).map_err(|e| {
            ForgeError::RactorError(format!("ConnectionActor Invalidate cast failed: {e}"))
        })?;

        // Whatever comes back is either freshly verified by the flight or was
        // installed by a concurrent caller after our invalidation.
        Ok(self.checkout().await?.handle)
    }

    /// Acquires a connection and races `op` against `budget`.
    ///
    /// Acquisition failures surface unchanged; only `op` itself is timed. On
    /// timeout the operation is abandoned, not rolled back.
    pub async fn with_connection<T, F, Fut>(
        &self,
        operation: &'static str,
        budget: Duration,
        op: F,
    ) -> Result<T, ForgeError>
    where
        F: FnOnce(C::Conn) -> Fut,
        Fut: Future<Output = Result<T, ForgeError>>,
    {
        let handle = self.acquire().await?;
        let generation = handle.generation();
        let started = Instant::now();

        match timeout(budget, op(handle.into_conn())).await {
            Ok(result) => {
                debug!(
                    operation,
                    generation,
                    elapsed_ms = duration_ms(started.elapsed()),
                    ok = result.is_ok(),
                    "Store operation finished"
                );
                result
            }
            Err(_) => {
                warn!(
                    operation,
                    generation,
                    budget_ms = duration_ms(budget),
                    "Store operation exceeded its budget; abandoning"
                );
                Err(ForgeError::OperationTimeout { operation, budget })
            }
        }
    }

    /// Probes connectivity. Never fails: problems are reported in the result.
    pub async fn health_check(&self) -> HealthReport {
        let started = Instant::now();
        let probe = async {
            let handle = self.acquire().await.map_err(|e| e.to_string())?;
            self.connector.ping(handle.conn()).await.map_err(|e| {
                warn!(error = %e, "Health check ping failed");
                "liveness ping failed".to_string()
            })
        };

        let outcome = match timeout(self.policy.health_check_timeout, probe).await {
            Ok(res) => res,
            Err(_) => Err(format!(
                "health check timed out after {}ms",
                duration_ms(self.policy.health_check_timeout)
            )),
        };

        HealthReport {
            connected: outcome.is_ok(),
            response_time_ms: duration_ms(started.elapsed()),
            error: outcome.err(),
        }
    }

    /// Closes and forgets the cached connection. The next acquire reconnects.
    pub async fn reset(&self) -> Result<(), ForgeError> {
        ractor::call!(self.actor, ManagerMessage::Reset)
            .map_err(|e| ForgeError::RactorError(format!("ConnectionActor Reset RPC failed: {e}")))
    }

    pub async fn snapshot(&self) -> Result<ManagerSnapshot, ForgeError> {
        ractor::call!(self.actor, ManagerMessage::Snapshot).map_err(|e| {
            ForgeError::RactorError(format!("ConnectionActor Snapshot RPC failed: {e}"))
        })
    }

    async fn checkout(&self) -> Result<Checkout<C::Conn>, ForgeError> {
        ractor::call!(self.actor, ManagerMessage::Checkout).map_err(|e| {
            ForgeError::RactorError(format!("ConnectionActor Checkout RPC failed: {e}"))
        })?
    }
}
