use chrono::NaiveDate;
use reachstat_common::ReachError;
use reachstat_metrika::{DateRange, MetrikaApi, MetrikaCredentials};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn range() -> DateRange {
    DateRange::default_window(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap())
}

async fn api_for(server: &MockServer) -> MetrikaApi {
    MetrikaApi::new(&server.uri(), MetrikaCredentials::new("tok", 105562414), None).unwrap()
}

async fn mount_status(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetches_rows_with_expected_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stat/v1/data"))
        .and(header("authorization", "OAuth tok"))
        .and(query_param("date1", "2024-01-01"))
        .and(query_param("date2", "2024-01-07"))
        .and(query_param("id", "105562414"))
        .and(query_param("metrics", "ym:s:visits,ym:s:pageviews,ym:s:users"))
        .and(query_param("dimensions", "ym:s:date"))
        .and(query_param("sort", "ym:s:date"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "dimensions": [{ "name": "2024-01-01", "id": null }], "metrics": [10.0, 20.0, 5.0] },
                { "dimensions": [{ "name": "2024-01-02", "id": null }], "metrics": [7.0, 9.0, 6.0] }
            ],
            "total_rows": 2,
            "totals": [17.0, 29.0, 11.0]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = api_for(&server).await.get_report(&range()).await.unwrap();
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[1].pageviews, 9);
    assert_eq!(report.totals().users, 11);
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    mount_status(&server, 401, json!({ "message": "Invalid oauth_token" })).await;
    let err = api_for(&server).await.get_report(&range()).await.unwrap_err();
    assert!(matches!(err, ReachError::Unauthorized));
}

#[tokio::test]
async fn forbidden_maps_to_permission_error() {
    let server = MockServer::start().await;
    mount_status(&server, 403, json!({ "message": "Access denied" })).await;
    let err = api_for(&server).await.get_report(&range()).await.unwrap_err();
    assert!(matches!(err, ReachError::Forbidden));
}

#[tokio::test]
async fn bad_request_carries_embedded_message() {
    let server = MockServer::start().await;
    mount_status(
        &server,
        400,
        json!({
            "errors": [{ "error_type": "invalid_parameter", "message": "Wrong parameter: 'date1'" }],
            "code": 400,
            "message": "Wrong parameter: 'date1'"
        }),
    )
    .await;
    let err = api_for(&server).await.get_report(&range()).await.unwrap_err();
    match err {
        ReachError::BadRequest(msg) => assert_eq!(msg, "Wrong parameter: 'date1'"),
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_request_without_message_uses_default() {
    let server = MockServer::start().await;
    mount_status(&server, 400, json!({})).await;
    let err = api_for(&server).await.get_report(&range()).await.unwrap_err();
    assert!(matches!(err, ReachError::BadRequest(ref m) if m == "malformed request"));
}

#[tokio::test]
async fn other_statuses_are_generic_http_errors() {
    let server = MockServer::start().await;
    mount_status(&server, 500, json!({ "message": "internal" })).await;
    let err = api_for(&server).await.get_report(&range()).await.unwrap_err();
    assert!(matches!(err, ReachError::Http { status: 500, ref message } if message == "internal"));
}

#[tokio::test]
async fn embedded_errors_on_success_are_raised() {
    let server = MockServer::start().await;
    mount_status(
        &server,
        200,
        json!({ "data": [], "errors": [{ "message": "quota exceeded" }] }),
    )
    .await;
    let err = api_for(&server).await.get_report(&range()).await.unwrap_err();
    assert!(matches!(err, ReachError::Api(ref m) if m.contains("quota exceeded")));
}

#[tokio::test]
async fn empty_errors_array_is_fine() {
    let server = MockServer::start().await;
    mount_status(&server, 200, json!({ "data": [], "errors": [] })).await;
    let report = api_for(&server).await.get_report(&range()).await.unwrap();
    assert!(report.is_empty());
}

#[tokio::test]
async fn connection_failure_is_transport_error() {
    let api = MetrikaApi::new("http://127.0.0.1:9", MetrikaCredentials::new("tok", 1), None).unwrap();
    let err = api.get_report(&range()).await.unwrap_err();
    assert!(matches!(err, ReachError::Transport(_)));
}
