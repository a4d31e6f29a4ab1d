//! One connect flight: bounded attempts with a fixed delay. Each attempt is a
//! connect plus a verification ping, both inside the connect timeout.

use backon::{ConstantBuilder, Retryable};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{info, warn};

use crate::config::ConnectionPolicy;
use crate::db::connector::Connector;
use crate::error::{IsRetryable, TransportError};
use crate::utils::logging::duration_ms;

#[derive(Debug)]
pub(super) struct FlightOutcome<T> {
    pub attempts: usize,
    pub result: Result<T, Arc<TransportError>>,
}

pub(super) async fn run<C: Connector>(
    connector: Arc<C>,
    policy: ConnectionPolicy,
) -> FlightOutcome<C::Conn> {
    let attempts = AtomicUsize::new(0);
    let backoff = ConstantBuilder::default()
        .with_delay(policy.retry_delay)
        .with_max_times(policy.connect_attempts.saturating_sub(1));

    let result = {
        let connector = connector.as_ref();
        let attempts = &attempts;
        let policy = &policy;
        (|| async move {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            info!(
                attempt,
                max_attempts = policy.connect_attempts,
                "Connecting to record store"
            );
            connect_once(connector, policy).await
        })
        .retry(backoff)
        .when(|err: &TransportError| err.is_retryable())
        .notify(|err: &TransportError, dur: Duration| {
            warn!(
                error = %err,
                retry_in_ms = duration_ms(dur),
                "Record store connect attempt failed; retrying"
            );
        })
        .await
    };

    FlightOutcome {
        attempts: attempts.into_inner(),
        result: result.map_err(Arc::new),
    }
}

async fn connect_once<C: Connector>(
    connector: &C,
    policy: &ConnectionPolicy,
) -> Result<C::Conn, TransportError> {
    // Connect and verification share one attempt deadline.
    let deadline = Instant::now() + policy.connect_timeout;

    let conn = match timeout_at(deadline, connector.connect()).await {
        Ok(res) => res?,
        Err(_) => {
            return Err(TransportError::TimedOut {
                stage: "connect",
                after: policy.connect_timeout,
            });
        }
    };

    let ping_budget = policy
        .health_check_timeout
        .min(deadline.saturating_duration_since(Instant::now()));
    match timeout(ping_budget, connector.ping(&conn)).await {
        Ok(Ok(())) => Ok(conn),
        Ok(Err(err)) => {
            connector.close(conn).await;
            Err(err)
        }
        Err(_) => {
            connector.close(conn).await;
            Err(TransportError::TimedOut {
                stage: "verification ping",
                after: ping_budget,
            })
        }
    }
}
