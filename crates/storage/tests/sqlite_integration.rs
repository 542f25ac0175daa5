use survey_core::model::SessionId;
use storage::keys::ProgressScope;
use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_kv_round_trip_and_overwrite() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get("missing").await.unwrap(), None);

    repo.set("k", "first").await.unwrap();
    repo.set("k", "second").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("second"));

    repo.remove("k").await.unwrap();
    repo.remove("k").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    let (version, latest) = repo.schema_version().await.unwrap();
    assert_eq!(version, latest);
    assert_eq!(applied, latest);
}

#[tokio::test]
async fn scoped_keys_stay_isolated_in_sqlite_storage() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_scopes?mode=memory&cache=shared")
        .await
        .expect("sqlite storage");

    let session = SessionId::generate();
    let part1 = ProgressScope::new(Some("dance"), Some(1), session);
    let part2 = ProgressScope::new(Some("dance"), Some(2), session);

    storage.kv.set(&part1.position_key(), "3").await.unwrap();
    storage.kv.set(&part2.position_key(), "0").await.unwrap();

    assert_eq!(
        storage.kv.get(&part1.position_key()).await.unwrap().as_deref(),
        Some("3")
    );
    assert_eq!(
        storage.kv.get(&part2.position_key()).await.unwrap().as_deref(),
        Some("0")
    );
    assert_eq!(storage.kv.get(&part1.responses_key()).await.unwrap(), None);
}
