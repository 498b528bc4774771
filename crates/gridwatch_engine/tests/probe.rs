use std::net::TcpListener;
use std::sync::Once;
use std::time::Duration;

use gridwatch_core::{CellResult, Coordinate};
use gridwatch_engine::{classify_response, CellProbe, ProbeSettings, ReqwestProbe};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn probe_for(server: &MockServer) -> ReqwestProbe {
    ReqwestProbe::new(ProbeSettings {
        base_url: server.uri(),
        ..ProbeSettings::default()
    })
    .expect("probe")
}

async fn mount_cell(server: &MockServer, x: u32, y: u32, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/image"))
        .and(query_param("x", x.to_string()))
        .and(query_param("y", y.to_string()))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn image_payload_is_decoded() {
    init_logging();
    let server = MockServer::start().await;
    mount_cell(
        &server,
        0,
        0,
        ResponseTemplate::new(200).set_body_raw(r#"{"img":"QUJD"}"#, "application/json"),
    )
    .await;

    let result = probe_for(&server).probe(Coordinate::new(0, 0)).await;
    assert_eq!(
        result,
        CellResult::Image {
            bytes: b"ABC".to_vec(),
            encoding: "image".to_string(),
            http_status: 200,
        }
    );
}

#[tokio::test]
async fn no_content_is_empty() {
    init_logging();
    let server = MockServer::start().await;
    mount_cell(&server, 2, 5, ResponseTemplate::new(204)).await;

    let result = probe_for(&server).probe(Coordinate::new(2, 5)).await;
    assert_eq!(result, CellResult::Empty { http_status: 204 });
}

#[tokio::test]
async fn missing_img_field_is_failure_with_status() {
    init_logging();
    let server = MockServer::start().await;
    mount_cell(
        &server,
        0,
        1,
        ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
    )
    .await;

    let result = probe_for(&server).probe(Coordinate::new(0, 1)).await;
    assert_eq!(
        result,
        CellResult::Failure {
            http_status: Some(200)
        }
    );
}

#[tokio::test]
async fn server_error_with_empty_body_keeps_status() {
    init_logging();
    let server = MockServer::start().await;
    mount_cell(&server, 1, 0, ResponseTemplate::new(500)).await;

    let result = probe_for(&server).probe(Coordinate::new(1, 0)).await;
    assert_eq!(result, CellResult::failure(Some(500)));
}

#[tokio::test]
async fn unmatched_cell_reports_not_found() {
    init_logging();
    let server = MockServer::start().await;

    let result = probe_for(&server).probe(Coordinate::new(9, 9)).await;
    assert_eq!(result, CellResult::failure(Some(404)));
}

#[tokio::test]
async fn connection_refused_is_failure_without_status() {
    init_logging();
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let probe = ReqwestProbe::new(ProbeSettings {
        base_url: format!("http://127.0.0.1:{port}"),
        ..ProbeSettings::default()
    })
    .unwrap();

    let result = probe.probe(Coordinate::new(0, 0)).await;
    assert_eq!(result, CellResult::failure(None));
}

#[tokio::test]
async fn slow_cell_times_out_without_status() {
    init_logging();
    let server = MockServer::start().await;
    mount_cell(
        &server,
        0,
        0,
        ResponseTemplate::new(200)
            .set_delay(Duration::from_millis(500))
            .set_body_raw(r#"{"img":"QUJD"}"#, "application/json"),
    )
    .await;

    let probe = ReqwestProbe::new(ProbeSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ProbeSettings::default()
    })
    .unwrap();

    let result = probe.probe(Coordinate::new(0, 0)).await;
    assert_eq!(result, CellResult::failure(None));
}

#[tokio::test]
async fn oversized_body_is_failure_with_status() {
    init_logging();
    let server = MockServer::start().await;
    mount_cell(
        &server,
        0,
        0,
        ResponseTemplate::new(200).set_body_raw(r#"{"img":"QUJDREVGR0g="}"#, "application/json"),
    )
    .await;

    let probe = ReqwestProbe::new(ProbeSettings {
        base_url: server.uri(),
        max_bytes: 8,
        ..ProbeSettings::default()
    })
    .unwrap();

    let result = probe.probe(Coordinate::new(0, 0)).await;
    assert_eq!(result, CellResult::failure(Some(200)));
}

#[test]
fn no_content_ignores_body() {
    for body in [&b""[..], b"{\"img\":\"QUJD\"}", b"not json"] {
        assert_eq!(classify_response(204, body), Ok(CellResult::empty()));
    }
}

#[test]
fn image_is_accepted_whatever_the_status() {
    assert_eq!(
        classify_response(500, br#"{"img":"eA==","extra":1}"#),
        Ok(CellResult::image(b"x".to_vec(), 500))
    );
}

#[test]
fn null_or_non_string_img_is_unusable() {
    assert!(classify_response(200, br#"{"img":null}"#).is_err());
    assert!(classify_response(200, br#"{"img":42}"#).is_err());
    assert!(classify_response(200, b"[]").is_err());
}
