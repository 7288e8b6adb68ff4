//! Server end-to-end tests
//!
//! Full startup path: configuration, store connection and migration, then a
//! real listener queried over HTTP with `reqwest`.

mod common;

use std::sync::Arc;

use casecraft::config::{self, Config, DatabaseBackend};
use casecraft::database;
use casecraft::server::{create_router, AppContext};
use casecraft_db::{ImageStore, SharedStore, SqliteStore};
use common::TestHarness;
use serial_test::serial;

/// Bind a random port, serve `store` and the static root, and fetch `path`.
/// Runs on its own runtime so blocking store clients are only used outside
/// of it.
fn fetch(config: Config, store: SharedStore, path: &str) -> (u16, Vec<u8>) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(AppContext::new(config, store));
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let response = reqwest::get(format!("http://{}{}", addr, path))
            .await
            .unwrap();
        let status = response.status().as_u16();
        let body = response.bytes().await.unwrap().to_vec();
        (status, body)
    })
}

fn image_columns(store: &SqliteStore) -> Vec<String> {
    let conn = store.pool().get().unwrap();
    let mut stmt = conn.prepare("PRAGMA table_info(images)").unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

#[test]
fn startup_scenario_sqlite() {
    let data = tempfile::tempdir().unwrap();
    let site = tempfile::tempdir().unwrap();
    let index = "<!doctype html><title>Case designer</title>";
    std::fs::write(site.path().join("index.html"), index).unwrap();

    let mut config = Config::default();
    config.server.static_dir = site.path().to_path_buf();
    config.database.backend = DatabaseBackend::Sqlite;
    config.database.sqlite_path = data.path().join("casecraft.db");
    config::validate_config(&config).unwrap();

    let (store, report) = database::connect_and_migrate(&config.database).unwrap();
    assert!(report.table_created);

    // Inspect the schema through a second handle on the same file.
    let raw = SqliteStore::open(&config.database.sqlite_path.to_string_lossy(), 1).unwrap();
    assert_eq!(
        image_columns(&raw),
        vec!["id", "created_at", "updated_at", "deleted_at", "filename", "filepath"]
    );

    let created = store.create_image("a.png", "/imgs/a.png").unwrap();
    let found = store.get_image(created.id).unwrap();
    assert_eq!(found.filename, "a.png");
    assert_eq!(found.filepath, "/imgs/a.png");
    assert!(found.deleted_at.is_none());

    let (status, body) = fetch(config, store.clone(), "/index.html");
    assert_eq!(status, 200);
    assert_eq!(body, index.as_bytes());
}

#[test]
fn restart_keeps_records() {
    let data = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.database.backend = DatabaseBackend::Sqlite;
    config.database.sqlite_path = data.path().join("casecraft.db");

    let id = {
        let (store, _) = database::connect_and_migrate(&config.database).unwrap();
        store.create_image("a.png", "/imgs/a.png").unwrap().id
    };

    let (store, report) = database::connect_and_migrate(&config.database).unwrap();
    assert!(report.is_noop());
    assert_eq!(store.get_image(id).unwrap().filename, "a.png");
}

#[tokio::test]
async fn missing_file_over_http_is_404() {
    let (harness, addr) = TestHarness::with_server().await;
    harness.write("index.html", "x");

    let response = reqwest::get(format!("http://{}/nope.js", addr))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "x");
}

#[tokio::test]
async fn store_in_context_is_usable_from_handlers() {
    let harness = TestHarness::new();
    let store = harness.ctx.store.clone();

    let image = tokio::task::spawn_blocking(move || store.create_image("b.png", "/imgs/b.png"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(harness.store.get_image(image.id).unwrap().filename, "b.png");
}

/// Same scenario against PostgreSQL, configured only through the
/// environment. Drops the `images` table of the target database.
#[test]
#[serial]
#[ignore = "requires a running PostgreSQL server"]
fn startup_scenario_postgres_from_env() {
    let site = tempfile::tempdir().unwrap();
    std::fs::write(site.path().join("index.html"), "pg").unwrap();

    let mut config = Config::default();
    config.server.static_dir = site.path().to_path_buf();
    let applied = config::apply_env_overrides(&mut config);
    assert!(applied.contains(&config::ENV_DB_HOST));

    let pg = casecraft_db::PgStore::connect(&config.database.pg_options()).unwrap();
    pg.pool()
        .get()
        .unwrap()
        .batch_execute("DROP TABLE IF EXISTS images")
        .unwrap();

    let (store, report) = database::connect_and_migrate(&config.database).unwrap();
    assert!(report.table_created);
    assert_eq!(store.backend_name(), "postgres");

    let created = store.create_image("a.png", "/imgs/a.png").unwrap();
    assert_eq!(store.get_image(created.id).unwrap().filepath, "/imgs/a.png");

    let (status, body) = fetch(config, Arc::clone(&store), "/index.html");
    assert_eq!(status, 200);
    assert_eq!(body, b"pg");
}
