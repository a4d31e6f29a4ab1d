use chrono::Utc;
use forge404::config::{ConnectionPolicy, StoreBudgets};
use forge404::db::{ConnectionManager, NewPage, PageStore, SqliteConnector};
use forge404::error::ForgeError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

async fn temp_store(tag: &str) -> (PageStore, std::path::PathBuf) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "forge404-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let database_url = format!("sqlite:{}", path.display());
    let policy = ConnectionPolicy::default();
    let connector =
        SqliteConnector::new(&database_url, policy.connect_timeout).expect("valid sqlite url");
    let manager = ConnectionManager::spawn(connector, policy)
        .await
        .expect("spawn connection manager");
    (PageStore::new(manager, StoreBudgets::default()), path)
}

fn page(prompt: &str) -> NewPage {
    NewPage::new(
        prompt,
        format!("<html><body>{prompt}</body></html>"),
        format!("export default function NotFound() {{ return <p>{prompt}</p> }}"),
    )
    .expect("valid page")
}

fn cleanup(path: &std::path::Path) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
    let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));
}

#[tokio::test]
async fn insert_assigns_id_and_creation_time() {
    let (store, path) = temp_store("insert").await;
    let before = Utc::now();

    let saved = store.insert(page("ocean themed")).await.expect("insert");

    assert!(!saved.id.is_empty());
    assert!(saved.created_at >= before);
    assert_eq!(saved.prompt, "ocean themed");

    let found = store
        .find_by_id(&saved.id)
        .await
        .expect("lookup")
        .expect("row exists");
    assert_eq!(found, saved);

    cleanup(&path);
}

#[tokio::test]
async fn list_is_newest_first_and_respects_limit() {
    let (store, path) = temp_store("list").await;

    for prompt in ["first", "second", "third"] {
        store.insert(page(prompt)).await.expect("insert");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let all = store.list_all(None).await.expect("list");
    let prompts: Vec<_> = all.iter().map(|p| p.prompt.as_str()).collect();
    assert_eq!(prompts, ["third", "second", "first"]);

    let limited = store.list_all(Some(2)).await.expect("list limited");
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].prompt, "third");

    // Zero is clamped up to one rather than returning nothing.
    let one = store.list_all(Some(0)).await.expect("list clamped");
    assert_eq!(one.len(), 1);

    cleanup(&path);
}

#[tokio::test]
async fn find_and_delete_unknown_ids() {
    let (store, path) = temp_store("delete").await;

    assert!(store.find_by_id("missing").await.unwrap().is_none());
    assert_eq!(store.delete_by_id("missing").await.unwrap(), 0);

    let saved = store.insert(page("to be removed")).await.unwrap();
    assert_eq!(store.delete_by_id(&saved.id).await.unwrap(), 1);
    assert!(store.find_by_id(&saved.id).await.unwrap().is_none());

    cleanup(&path);
}

#[tokio::test]
async fn health_check_against_real_sqlite() {
    let (store, path) = temp_store("health").await;

    let report = store.health_check().await;
    assert!(report.connected, "unexpected error: {:?}", report.error);
    assert!(report.error.is_none());

    cleanup(&path);
}

#[tokio::test]
async fn unreachable_database_reports_connection_unavailable() {
    // A directory cannot be opened as a database file.
    let dir = std::env::temp_dir();
    let database_url = format!("sqlite:{}", dir.display());
    let policy = ConnectionPolicy {
        connect_attempts: 2,
        retry_delay: Duration::from_millis(10),
        ..ConnectionPolicy::default()
    };
    let connector = SqliteConnector::new(&database_url, policy.connect_timeout).unwrap();
    let manager = ConnectionManager::spawn(connector, policy).await.unwrap();
    let store = PageStore::new(manager, StoreBudgets::default());

    let err = store.list_all(None).await.unwrap_err();
    assert!(matches!(
        err,
        ForgeError::ConnectionUnavailable { attempts: 2, .. }
    ));
}
