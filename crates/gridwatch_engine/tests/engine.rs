use std::sync::Once;
use std::time::{Duration, Instant};

use gridwatch_core::{CellResult, Coordinate, GridShape};
use gridwatch_engine::{ConfigSource, EngineConfig, EngineEvent, EngineHandle};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Blocks on the engine channel off the async executor until `pred` matches.
async fn wait_for(
    engine: EngineHandle,
    pred: impl Fn(&EngineEvent) -> bool + Send + 'static,
) -> (EngineHandle, Vec<EngineEvent>) {
    tokio::task::spawn_blocking(move || {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
                let done = pred(&event);
                seen.push(event);
                if done {
                    break;
                }
            }
        }
        (engine, seen)
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn engine_loads_config_polls_and_stops() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"rows":1,"cols":2}"#, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/image"))
        .and(query_param("x", "0"))
        .and(query_param("y", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"img":"eA=="}"#, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/image"))
        .and(query_param("x", "0"))
        .and(query_param("y", "1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let engine = EngineHandle::new(EngineConfig::with_base_url(server.uri())).unwrap();
    engine.load_config(ConfigSource::Remote {
        base_url: server.uri(),
    });
    let (engine, events) =
        wait_for(engine, |e| matches!(e, EngineEvent::ConfigResolved { .. })).await;
    let shape = match events.last() {
        Some(EngineEvent::ConfigResolved { shape }) => *shape,
        other => panic!("expected config, got {other:?}"),
    };
    assert_eq!(shape, GridShape::new(1, 2));

    engine.start_polling(shape);
    let (engine, events) =
        wait_for(engine, |e| matches!(e, EngineEvent::SnapshotPublished(_))).await;
    let snapshot = match events.last() {
        Some(EngineEvent::SnapshotPublished(snapshot)) => snapshot.clone(),
        other => panic!("expected snapshot, got {other:?}"),
    };
    assert_eq!(snapshot.cycle(), 1);
    assert_eq!(
        snapshot.get(Coordinate::new(0, 0)),
        Some(&CellResult::image(b"x".to_vec(), 200))
    );
    assert_eq!(snapshot.get(Coordinate::new(0, 1)), Some(&CellResult::empty()));

    engine.stop_polling();
    let (_engine, events) = wait_for(engine, |e| matches!(e, EngineEvent::PollingStopped)).await;
    assert!(matches!(events.last(), Some(EngineEvent::PollingStopped)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_config_reports_failure() {
    init_logging();
    let server = MockServer::start().await;

    let engine = EngineHandle::new(EngineConfig::with_base_url(server.uri())).unwrap();
    engine.load_config(ConfigSource::Remote {
        base_url: server.uri(),
    });
    let (_engine, events) =
        wait_for(engine, |e| matches!(e, EngineEvent::ConfigFailed { .. })).await;
    assert!(matches!(
        events.last(),
        Some(EngineEvent::ConfigFailed { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_grid_never_polls() {
    init_logging();
    let server = MockServer::start().await;

    let engine = EngineHandle::new(EngineConfig::with_base_url(server.uri())).unwrap();
    engine.start_polling(GridShape::EMPTY);
    let (_engine, events) = wait_for(engine, |e| matches!(e, EngineEvent::PollingStopped)).await;
    assert!(matches!(events.last(), Some(EngineEvent::PollingStopped)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_without_scheduler_is_acknowledged() {
    init_logging();
    let engine = EngineHandle::new(EngineConfig::default()).unwrap();
    engine.stop_polling();
    let (_engine, events) = wait_for(engine, |e| matches!(e, EngineEvent::PollingStopped)).await;
    assert_eq!(events, vec![EngineEvent::PollingStopped]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unusable_base_url_reports_polling_stopped() {
    init_logging();
    let engine = EngineHandle::new(EngineConfig::with_base_url("ftp://tiles.local")).unwrap();
    engine.start_polling(GridShape::new(1, 1));
    let (engine, events) = wait_for(engine, |e| matches!(e, EngineEvent::PollingStopped)).await;
    assert_eq!(events, vec![EngineEvent::PollingStopped]);

    // A later stop is still confirmed.
    engine.stop_polling();
    let (_engine, events) = wait_for(engine, |e| matches!(e, EngineEvent::PollingStopped)).await;
    assert_eq!(events, vec![EngineEvent::PollingStopped]);
}
