use std::sync::Arc;
use std::time::Duration;

use netdev_client::{default_scenario, RunSummary, Runner, RunnerConfig};
use netdev_server::{router, serve, ServerConfig};
use netdev_store::LogStore;
use tempfile::tempdir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[tokio::test(flavor = "multi_thread")]
async fn default_scenario_against_live_server() {
    let dir = tempdir().expect("tempdir");
    let config = ServerConfig {
        log_file: dir.path().join("network_devices.log"),
        ..ServerConfig::default()
    };
    let store = Arc::new(LogStore::open(&config.log_file).expect("open store"));
    std::fs::write(&config.log_file, "stale line from a previous run\n").expect("seed log");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, router(Arc::clone(&store), &config), async move {
        let _ = stop_rx.await;
    }));

    let runner = Runner::new(RunnerConfig {
        url: format!("http://{addr}/"),
        delay: Duration::ZERO,
        startup_delay: Duration::ZERO,
        ..RunnerConfig::default()
    })
    .expect("runner");

    let mut out = Vec::new();
    let summary = runner
        .run(&default_scenario(), &mut out)
        .await
        .expect("run scenario");

    drop(runner);
    let _ = stop_tx.send(());
    server.await.expect("server task").expect("server result");

    assert_eq!(
        summary,
        RunSummary {
            completed: 10,
            failed: 0
        }
    );

    let report = String::from_utf8(out).expect("utf-8 report");
    assert_eq!(report.matches("Статус: 201 Created").count(), 5);
    assert_eq!(report.matches("Статус: 200 OK").count(), 5);
    assert!(!report.contains("stale line"));
    assert!(report.contains("Пристрій: AP-Office-01, Тип: Access Point, IP: 192.168.2.10"));
    assert!(report.contains("Лог-файл повністю оновлено, додано 2 записів"));
    assert!(report.contains("Додано 2 нових записів"));

    let log = String::from_utf8(store.read().expect("read log")).expect("utf-8 log");
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("Пристрій: New-Router, Тип: Router, IP: 10.10.10.1, Маршрутизація: OSPF"));
    assert!(lines[1].contains("Пристрій: New-Switch, Тип: Switch, IP: 10.10.10.2, Маршрутизація: Static"));
}
