use async_trait::async_trait;
use forge404::config::ConnectionPolicy;
use forge404::db::{ConnectionManager, ConnectionState, Connector};
use forge404::error::{ForgeError, TransportError};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectMode {
    Succeed,
    Refuse,
    Hang,
    BadTarget,
}

#[derive(Debug)]
struct FakeState {
    connects: AtomicUsize,
    closes: AtomicUsize,
    pings: AtomicUsize,
    next_id: AtomicU64,
    connect_delay: Mutex<Duration>,
    mode: Mutex<ConnectMode>,
    failing_pings: Mutex<HashSet<u64>>,
    hang_pings: AtomicBool,
}

/// Hands out numbered connections and records every call.
#[derive(Debug, Clone)]
struct FakeConnector {
    state: Arc<FakeState>,
}

impl FakeConnector {
    fn new() -> Self {
        Self {
            state: Arc::new(FakeState {
                connects: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                pings: AtomicUsize::new(0),
                next_id: AtomicU64::new(1),
                connect_delay: Mutex::new(Duration::ZERO),
                mode: Mutex::new(ConnectMode::Succeed),
                failing_pings: Mutex::new(HashSet::new()),
                hang_pings: AtomicBool::new(false),
            }),
        }
    }

    fn set_mode(&self, mode: ConnectMode) {
        *self.state.mode.lock().unwrap() = mode;
    }

    fn set_connect_delay(&self, delay: Duration) {
        *self.state.connect_delay.lock().unwrap() = delay;
    }

    fn fail_pings_for(&self, conn: u64) {
        self.state.failing_pings.lock().unwrap().insert(conn);
    }

    fn hang_pings(&self, hang: bool) {
        self.state.hang_pings.store(hang, Ordering::SeqCst);
    }

    fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Conn = u64;

    async fn connect(&self) -> Result<u64, TransportError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        let delay = *self.state.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let mode = *self.state.mode.lock().unwrap();
        match mode {
            ConnectMode::Succeed => Ok(self.state.next_id.fetch_add(1, Ordering::SeqCst)),
            ConnectMode::Refuse => Err(TransportError::Other("connection refused".into())),
            ConnectMode::Hang => std::future::pending().await,
            ConnectMode::BadTarget => Err(TransportError::InvalidTarget("bogus".into())),
        }
    }

    async fn ping(&self, conn: &u64) -> Result<(), TransportError> {
        self.state.pings.fetch_add(1, Ordering::SeqCst);
        if self.state.hang_pings.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.failing_pings.lock().unwrap().contains(conn) {
            return Err(TransportError::Other(format!("conn {conn} is dead")));
        }
        Ok(())
    }

    async fn close(&self, _conn: u64) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn policy() -> ConnectionPolicy {
    ConnectionPolicy {
        connect_timeout: Duration::from_secs(4),
        connect_attempts: 3,
        retry_delay: Duration::from_secs(2),
        reuse_check_timeout: Duration::from_millis(1500),
        health_check_timeout: Duration::from_secs(2),
    }
}

/// The paused clock jumps straight to timer deadlines, so durations are
/// exact up to millisecond rounding.
fn assert_close(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(10),
        "expected ~{expected:?}, got {actual:?}"
    );
}

async fn manager_with(connector: &FakeConnector) -> ConnectionManager<FakeConnector> {
    ConnectionManager::spawn(connector.clone(), policy())
        .await
        .expect("spawn connection manager")
}

#[tokio::test(start_paused = true)]
async fn concurrent_cold_start_acquires_share_one_connect() {
    let connector = FakeConnector::new();
    connector.set_connect_delay(Duration::from_millis(50));
    let manager = manager_with(&connector).await;

    let results = join_all((0..8).map(|_| manager.acquire())).await;

    assert_eq!(connector.connects(), 1);
    for res in results {
        let handle = res.expect("acquire should succeed");
        assert_eq!(*handle.conn(), 1);
        assert_eq!(handle.generation(), 1);
        assert_eq!(handle.attempts(), 1);
    }

    let snapshot = manager.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ConnectionState::Ready);
    assert_eq!(snapshot.flights_started, 1);
    assert!(snapshot.connected_since.is_some());
}

#[tokio::test(start_paused = true)]
async fn cached_handle_is_reused_while_healthy() {
    let connector = FakeConnector::new();
    let manager = manager_with(&connector).await;

    let first = manager.acquire().await.unwrap();
    let second = manager.acquire().await.unwrap();

    assert_eq!(connector.connects(), 1);
    assert_eq!(first.generation(), second.generation());
    // One verification ping at connect time, one reuse ping.
    assert_eq!(connector.state.pings.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_health_check_on_cached_handle_triggers_fresh_connect() {
    let connector = FakeConnector::new();
    let manager = manager_with(&connector).await;

    let first = manager.acquire().await.unwrap();
    assert_eq!(*first.conn(), 1);

    connector.fail_pings_for(1);
    let second = manager.acquire().await.unwrap();

    assert_eq!(connector.connects(), 2);
    assert_eq!(*second.conn(), 2);
    assert_eq!(second.generation(), 2);

    sleep(Duration::from_millis(10)).await;
    assert_eq!(connector.closes(), 1, "stale connection should be closed");
}

#[tokio::test(start_paused = true)]
async fn slow_reuse_ping_counts_as_failed() {
    let connector = FakeConnector::new();
    let manager = manager_with(&connector).await;
    manager.acquire().await.unwrap();

    connector.hang_pings(true);
    let started = Instant::now();
    let res = manager.acquire().await;

    // The reuse ping times out, then the fresh connect's verification ping
    // hangs as well, so every attempt fails.
    assert!(matches!(
        res,
        Err(ForgeError::ConnectionUnavailable { attempts: 3, .. })
    ));
    assert!(started.elapsed() >= Duration::from_millis(1500));
    assert_eq!(connector.connects(), 4);
}

#[tokio::test(start_paused = true)]
async fn connect_exhaustion_is_bounded() {
    let connector = FakeConnector::new();
    connector.set_mode(ConnectMode::Refuse);
    let manager = manager_with(&connector).await;

    let started = Instant::now();
    let err = manager.acquire().await.unwrap_err();
    let elapsed = started.elapsed();

    match err {
        ForgeError::ConnectionUnavailable { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(source.to_string().contains("connection refused"));
        }
        other => panic!("expected ConnectionUnavailable, got {other:?}"),
    }
    assert_eq!(connector.connects(), 3);
    // Two fixed delays between three immediate failures.
    assert_close(elapsed, Duration::from_secs(4));
    assert!(elapsed <= policy().exhaustion_bound());
}

#[tokio::test(start_paused = true)]
async fn hanging_connects_time_out_within_bound() {
    let connector = FakeConnector::new();
    connector.set_mode(ConnectMode::Hang);
    let manager = manager_with(&connector).await;

    let started = Instant::now();
    let err = manager.acquire().await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(
        err,
        ForgeError::ConnectionUnavailable { attempts: 3, .. }
    ));
    assert_close(elapsed, Duration::from_secs(3 * 4 + 2 * 2));
    assert!(elapsed <= policy().exhaustion_bound());
}

#[tokio::test(start_paused = true)]
async fn verification_ping_shares_the_connect_deadline() {
    let connector = FakeConnector::new();
    connector.set_connect_delay(Duration::from_millis(3900));
    connector.hang_pings(true);
    let manager = manager_with(&connector).await;

    let started = Instant::now();
    let err = manager.acquire().await.unwrap_err();
    let elapsed = started.elapsed();

    match err {
        ForgeError::ConnectionUnavailable { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(
                *source,
                TransportError::TimedOut {
                    stage: "verification ping",
                    ..
                }
            ));
        }
        other => panic!("expected ConnectionUnavailable, got {other:?}"),
    }
    // Each attempt ends at its 4s connect deadline, plus two 2s gaps.
    assert_close(elapsed, Duration::from_secs(16));
    assert!(elapsed <= Duration::from_secs(3 * 2 + 3 * 4));
    assert!(elapsed <= policy().exhaustion_bound());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(connector.closes(), 3, "unverified connections are closed");
}

#[tokio::test(start_paused = true)]
async fn invalid_target_is_not_retried() {
    let connector = FakeConnector::new();
    connector.set_mode(ConnectMode::BadTarget);
    let manager = manager_with(&connector).await;

    let err = manager.acquire().await.unwrap_err();
    assert!(matches!(
        err,
        ForgeError::ConnectionUnavailable { attempts: 1, .. }
    ));
    assert_eq!(connector.connects(), 1);
}

#[tokio::test(start_paused = true)]
async fn failure_is_not_terminal() {
    let connector = FakeConnector::new();
    connector.set_mode(ConnectMode::Refuse);
    let manager = manager_with(&connector).await;

    assert!(manager.acquire().await.is_err());
    assert_eq!(
        manager.snapshot().await.unwrap().state,
        ConnectionState::Failed
    );

    connector.set_mode(ConnectMode::Succeed);
    let handle = manager.acquire().await.expect("next request reconnects");
    assert_eq!(handle.generation(), 1);

    let snapshot = manager.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ConnectionState::Ready);
    assert_eq!(snapshot.flights_started, 2);
}

#[tokio::test(start_paused = true)]
async fn operation_timeout_resolves_at_budget() {
    let connector = FakeConnector::new();
    let manager = manager_with(&connector).await;
    manager.acquire().await.unwrap();

    let started = Instant::now();
    let res: Result<(), ForgeError> = manager
        .with_connection("slow query", Duration::from_secs(3), |_conn| async {
            sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

    match res {
        Err(ForgeError::OperationTimeout { operation, budget }) => {
            assert_eq!(operation, "slow query");
            assert_eq!(budget, Duration::from_secs(3));
        }
        other => panic!("expected OperationTimeout, got {other:?}"),
    }
    assert_close(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn operation_result_and_errors_pass_through() {
    let connector = FakeConnector::new();
    let manager = manager_with(&connector).await;

    let value = manager
        .with_connection("fetch", Duration::from_secs(3), |conn| async move {
            Ok::<_, ForgeError>(conn * 10)
        })
        .await
        .unwrap();
    assert_eq!(value, 10);

    let err = manager
        .with_connection("broken", Duration::from_secs(3), |_conn| async {
            Err::<(), _>(ForgeError::ValidationFailed("nope".into()))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ForgeError::ValidationFailed(_)));
}

#[tokio::test(start_paused = true)]
async fn acquire_failure_is_distinct_from_operation_failure() {
    let connector = FakeConnector::new();
    connector.set_mode(ConnectMode::Refuse);
    let manager = manager_with(&connector).await;

    let ran = Arc::new(AtomicBool::new(false));
    let ran_in_op = Arc::clone(&ran);
    let err = manager
        .with_connection("insert page", Duration::from_secs(6), move |_conn| async move {
            ran_in_op.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ForgeError::ConnectionUnavailable { .. }));
    assert!(!ran.load(Ordering::SeqCst), "operation must not run");
}

#[tokio::test(start_paused = true)]
async fn health_check_reports_connected() {
    let connector = FakeConnector::new();
    let manager = manager_with(&connector).await;

    let report = manager.health_check().await;
    assert!(report.connected);
    assert!(report.error.is_none());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["connected"], true);
    assert!(json["responseTimeMs"].is_u64());
    assert!(json.get("error").is_none());
}

#[tokio::test(start_paused = true)]
async fn health_check_never_fails_and_is_bounded() {
    let connector = FakeConnector::new();
    connector.set_mode(ConnectMode::Hang);
    let manager = manager_with(&connector).await;

    let started = Instant::now();
    let report = manager.health_check().await;

    assert!(!report.connected);
    assert!(report.error.as_deref().unwrap().contains("timed out"));
    assert_close(started.elapsed(), Duration::from_secs(2));
    assert!((2000..2010).contains(&report.response_time_ms));
}

#[tokio::test(start_paused = true)]
async fn reset_closes_and_forces_reconnect() {
    let connector = FakeConnector::new();
    let manager = manager_with(&connector).await;

    manager.acquire().await.unwrap();
    manager.reset().await.unwrap();
    assert_eq!(connector.closes(), 1);
    assert_eq!(
        manager.snapshot().await.unwrap().state,
        ConnectionState::Uninitialized
    );

    let handle = manager.acquire().await.unwrap();
    assert_eq!(connector.connects(), 2);
    assert_eq!(handle.generation(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_failed_reuse_pings_start_one_reconnect() {
    let connector = FakeConnector::new();
    let manager = manager_with(&connector).await;
    let first = manager.acquire().await.unwrap();
    assert_eq!(first.generation(), 1);

    connector.fail_pings_for(1);
    let results = join_all((0..8).map(|_| manager.acquire())).await;

    for res in results {
        let handle = res.expect("reconnect should succeed");
        assert_eq!(*handle.conn(), 2);
        assert_eq!(handle.generation(), 2);
    }
    assert_eq!(connector.connects(), 2);

    let snapshot = manager.snapshot().await.unwrap();
    assert_eq!(snapshot.state, ConnectionState::Ready);
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.flights_started, 2);

    sleep(Duration::from_millis(10)).await;
    assert_eq!(connector.closes(), 1, "later invalidations of gen 1 are stale");
}

#[tokio::test(start_paused = true)]
async fn reset_during_connect_closes_the_settled_connection() {
    let connector = FakeConnector::new();
    connector.set_connect_delay(Duration::from_secs(1));
    let manager = manager_with(&connector).await;

    let pending = tokio::spawn({
        let manager = manager.clone();
        async move { manager.acquire().await }
    });
    sleep(Duration::from_millis(10)).await;
    assert_eq!(
        manager.snapshot().await.unwrap().state,
        ConnectionState::Connecting
    );

    manager.reset().await.unwrap();
    assert_eq!(connector.closes(), 0);

    let handle = pending
        .await
        .unwrap()
        .expect("waiter still gets the flight's connection");
    assert_eq!(*handle.conn(), 1);

    sleep(Duration::from_millis(10)).await;
    assert_eq!(connector.closes(), 1);
    assert_eq!(
        manager.snapshot().await.unwrap().state,
        ConnectionState::Uninitialized
    );

    connector.set_connect_delay(Duration::ZERO);
    let next = manager.acquire().await.unwrap();
    assert_eq!(*next.conn(), 2);
    assert_eq!(connector.connects(), 2);
}
