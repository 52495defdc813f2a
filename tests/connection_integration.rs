use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value as JsonValue};
use singlestore_data_api::{
    ClientOptions, CompiledStatement, DataApiConfig, DataApiDialect, DataApiError,
    DatabaseConnection, DeserializationConfig, Driver, QueryKind, QueryResult, ResultPlugin, Value,
};

#[derive(Clone)]
struct MockResponse {
    status: StatusCode,
    body: String,
    delay: Duration,
}

impl MockResponse {
    fn json(status: StatusCode, body: JsonValue) -> Self {
        Self::text(status, body.to_string())
    }

    fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::from_millis(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Debug)]
struct CapturedRequest {
    path: &'static str,
    authorization: Option<String>,
    content_type: Option<String>,
    body: JsonValue,
}

#[derive(Clone, Default)]
struct MockState {
    tuples: Arc<Mutex<VecDeque<MockResponse>>>,
    exec: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockState {
    async fn respond(
        &self,
        path: &'static str,
        queue: &Mutex<VecDeque<MockResponse>>,
        headers: HeaderMap,
        body: String,
    ) -> impl IntoResponse {
        let header_value = |name| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        self.requests
            .lock()
            .expect("request log mutex must not be poisoned")
            .push(CapturedRequest {
                path,
                authorization: header_value(header::AUTHORIZATION),
                content_type: header_value(header::CONTENT_TYPE),
                body: serde_json::from_str(&body).unwrap_or(JsonValue::Null),
            });

        let response = queue
            .lock()
            .expect("response queue mutex must not be poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                MockResponse::json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": {"code": 500, "message": format!("no mock response for {path}")}}),
                )
            });

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        (
            response.status,
            [(header::CONTENT_TYPE, "application/json")],
            response.body,
        )
    }
}

async fn tuples_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let queue = Arc::clone(&state.tuples);
    state
        .respond("/api/v2/query/tuples", &queue, headers, body)
        .await
}

async fn exec_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let queue = Arc::clone(&state.exec);
    state.respond("/api/v2/exec", &queue, headers, body).await
}

struct TestServer {
    port: u16,
    state: MockState,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    fn config(&self) -> DataApiConfig {
        DataApiConfig::new("127.0.0.1", "test", "root", "secret").with_port(self.port)
    }

    fn requests(&self) -> Vec<CapturedRequest> {
        self.state
            .requests
            .lock()
            .expect("request log mutex must not be poisoned")
            .clone()
    }
}

async fn spawn_server(tuples: Vec<MockResponse>, exec: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        tuples: Arc::new(Mutex::new(tuples.into())),
        exec: Arc::new(Mutex::new(exec.into())),
        requests: Arc::default(),
    };

    let app = Router::new()
        .route("/api/v2/query/tuples", post(tuples_handler))
        .route("/api/v2/exec", post(exec_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let port = listener.local_addr().expect("must have local addr").port();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer { port, state, task }
}

fn person_tuples_body() -> JsonValue {
    json!({
        "results": [
            {
                "columns": [
                    { "name": "id", "dataType": "BIGINT", "nullable": false },
                    { "name": "first_name", "dataType": "VARCHAR", "nullable": true },
                    { "name": "last_name", "dataType": "VARCHAR", "nullable": true }
                ],
                "rows": [
                    [1, "Jennifer", "Aniston"],
                    [3, "Michael", null]
                ]
            }
        ]
    })
}

fn toy_tuples_body() -> JsonValue {
    json!({
        "results": [
            {
                "columns": [
                    { "name": "name", "dataType": "VARCHAR", "nullable": false },
                    { "name": "price", "dataType": "DECIMAL(10,4)", "nullable": false },
                    { "name": "in_stock", "dataType": "TINYINT", "nullable": false },
                    { "name": "created_at", "dataType": "DATETIME(6)", "nullable": true }
                ],
                "rows": [
                    ["Tennis Ball", "1.9900", 0, "9999-12-31 23:59:59.999999"]
                ]
            }
        ]
    })
}

#[tokio::test]
async fn select_goes_to_tuples_with_envelope_and_basic_auth() {
    let server = spawn_server(
        vec![MockResponse::json(StatusCode::OK, person_tuples_body())],
        vec![],
    )
    .await;
    let connection = DataApiDialect::new(server.config()).driver().connection();

    let result = connection
        .execute_query(&CompiledStatement::select(
            "select * from `person` where `id` > ?",
            [Value::integer(0)],
        ))
        .await
        .expect("query must succeed");

    let rows = result.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("first_name"), Some(&Value::text("Jennifer")));
    assert_eq!(rows[1].get("id"), Some(&Value::integer(3)));
    assert_eq!(rows[1].get("last_name"), Some(&Value::Null));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/api/v2/query/tuples");
    assert_eq!(requests[0].authorization.as_deref(), Some("Basic cm9vdDpzZWNyZXQ="));
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        requests[0].body,
        json!({"sql": "select * from `person` where `id` > ?", "args": [0], "database": "test"})
    );
}

#[tokio::test]
async fn raw_with_select_goes_to_tuples() {
    let body = json!({
        "results": [
            {
                "columns": [{ "name": "1", "dataType": "INT", "nullable": false }],
                "rows": [{ "1": 1 }]
            }
        ]
    });
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, body)], vec![]).await;
    let connection = DataApiDialect::new(server.config()).driver().connection();

    let result = connection
        .execute_query(&CompiledStatement::raw(
            "with zzz as (select 1) select * from zzz",
            (),
        ))
        .await
        .expect("query must succeed");

    assert_eq!(result.rows()[0].get("1"), Some(&Value::integer(1)));
    assert_eq!(server.requests()[0].path, "/api/v2/query/tuples");
}

#[tokio::test]
async fn mutation_goes_to_exec_and_maps_counters() {
    let server = spawn_server(
        vec![],
        vec![MockResponse::json(
            StatusCode::OK,
            json!({"lastInsertId": 42, "rowsAffected": 1}),
        )],
    )
    .await;
    let connection = DataApiDialect::new(server.config()).driver().connection();

    let result = connection
        .execute_query(&CompiledStatement::new(
            QueryKind::Insert,
            "insert into `toy` (`name`, `price`) values (?, ?)",
            [Value::text("Tennis Ball"), Value::float(1.99)],
        ))
        .await
        .expect("insert must succeed");

    assert_eq!(
        result,
        QueryResult::Mutation {
            insert_id: 42,
            num_updated_or_deleted_rows: 1,
        }
    );
    assert!(result.rows().is_empty());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/api/v2/exec");
    assert_eq!(requests[0].body["args"], json!(["Tennis Ball", 1.99]));
}

#[tokio::test]
async fn raw_with_delete_goes_to_exec() {
    let server = spawn_server(
        vec![],
        vec![MockResponse::json(
            StatusCode::OK,
            json!({"lastInsertId": 0, "rowsAffected": 3}),
        )],
    )
    .await;
    let connection = DataApiDialect::new(server.config()).driver().connection();

    let result = connection
        .execute_query(&CompiledStatement::raw(
            "with old as (select id from toy where price < 1) delete from toy where id in (select id from old)",
            (),
        ))
        .await
        .expect("delete must succeed");

    assert_eq!(result.num_updated_or_deleted_rows(), Some(3));
    assert_eq!(server.requests()[0].path, "/api/v2/exec");
}

#[tokio::test]
async fn embedded_tuples_error_uses_api_code() {
    let body = json!({
        "results": [],
        "error": { "code": 1146, "message": "Table 'test.nope' doesn't exist" }
    });
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, body)], vec![]).await;
    let connection = DataApiDialect::new(server.config()).driver().connection();

    let err = connection
        .execute_query(&CompiledStatement::raw("select * from nope", ()))
        .await
        .expect_err("query must fail");

    match err {
        DataApiError::Database {
            status,
            code,
            message,
        } => {
            assert_eq!(status, None);
            assert_eq!(code, 1146);
            assert_eq!(message, "Table 'test.nope' doesn't exist");
        }
        other => panic!("expected database error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_error_with_structured_body() {
    let server = spawn_server(
        vec![],
        vec![MockResponse::json(
            StatusCode::BAD_REQUEST,
            json!({"error": {"code": 1064, "message": "You have an error in your SQL syntax"}}),
        )],
    )
    .await;
    let connection = DataApiDialect::new(server.config()).driver().connection();

    let err = connection
        .execute_query(&CompiledStatement::raw("insert into", ()))
        .await
        .expect_err("exec must fail");

    assert!(matches!(
        err,
        DataApiError::Database {
            status: Some(400),
            code: 1064,
            ..
        }
    ));
}

#[tokio::test]
async fn http_error_without_structured_body_falls_back_to_status() {
    let server = spawn_server(
        vec![MockResponse::text(StatusCode::UNAUTHORIZED, "Access denied")],
        vec![],
    )
    .await;
    let connection = DataApiDialect::new(server.config()).driver().connection();

    let err = connection
        .execute_query(&CompiledStatement::raw("select 1", ()))
        .await
        .expect_err("query must fail");

    match err {
        DataApiError::Database {
            status,
            code,
            message,
        } => {
            assert_eq!(status, Some(401));
            assert_eq!(code, 401);
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("expected database error, got {other:?}"),
    }
}

#[tokio::test]
async fn multiple_statements_never_reach_the_network() {
    let server = spawn_server(vec![], vec![]).await;
    let connection = DataApiDialect::new(server.config()).driver().connection();

    for sql in ["select 1; select 2", "insert into t values (1); delete from t"] {
        let err = connection
            .execute_query(&CompiledStatement::raw(sql, ()))
            .await
            .expect_err("multi-statement query must fail");
        assert!(matches!(err, DataApiError::MultipleStatementsNotSupported));
    }
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn inline_deserialization_applies_configured_coercions() {
    let server = spawn_server(
        vec![MockResponse::json(StatusCode::OK, toy_tuples_body())],
        vec![],
    )
    .await;
    let config = server.config().with_deserialization(
        DeserializationConfig::default()
            .with_native_dates(true)
            .with_tiny_int_as_boolean(true)
            .with_unwrapped_decimals(true),
    );
    let connection = DataApiDialect::new(config).driver().connection();

    let result = connection
        .execute_query(&CompiledStatement::select("select * from `toy`", ()))
        .await
        .expect("query must succeed");

    let row = &result.rows()[0];
    assert_eq!(row.get("name"), Some(&Value::text("Tennis Ball")));
    assert_eq!(row.get("price"), Some(&Value::Float(1.99)));
    assert_eq!(row.get("in_stock"), Some(&Value::Bool(false)));
    let expected = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap()
        + chrono::Duration::milliseconds(999);
    assert_eq!(row.get("created_at"), Some(&Value::DateTime(expected)));
}

#[tokio::test]
async fn plugin_coerces_rows_from_recorded_metadata() {
    let server = spawn_server(
        vec![MockResponse::json(StatusCode::OK, toy_tuples_body())],
        vec![],
    )
    .await;
    let dialect = DataApiDialect::new(server.config());
    let plugin = dialect.deserializer_plugin(
        DeserializationConfig::default()
            .with_tiny_int_as_boolean(true)
            .with_unwrapped_decimals(true),
    );
    let driver = dialect.driver();
    let connection = driver.acquire_connection().await.expect("must acquire");
    let statement = CompiledStatement::select("select * from `toy`", ());

    let raw = connection
        .execute_query(&statement)
        .await
        .expect("query must succeed");
    assert_eq!(raw.rows()[0].get("price"), Some(&Value::text("1.9900")));
    assert_eq!(raw.rows()[0].get("in_stock"), Some(&Value::integer(0)));

    let transformed = plugin
        .transform_result(&statement, raw)
        .expect("plugin must find metadata");
    let row = &transformed.rows()[0];
    assert_eq!(row.get("price"), Some(&Value::Float(1.99)));
    assert_eq!(row.get("in_stock"), Some(&Value::Bool(false)));
    assert_eq!(
        row.get("created_at"),
        Some(&Value::text("9999-12-31 23:59:59.999999"))
    );

    driver.release_connection(connection).await.expect("must release");
    driver.destroy().await.expect("must destroy");
    assert!(dialect.metadata_store().is_empty());
}

#[tokio::test]
async fn plugin_keeps_working_after_a_driver_is_destroyed() {
    let server = spawn_server(
        vec![
            MockResponse::json(StatusCode::OK, toy_tuples_body()),
            MockResponse::json(StatusCode::OK, toy_tuples_body()),
        ],
        vec![],
    )
    .await;
    let dialect = DataApiDialect::new(server.config());
    let plugin = dialect.deserializer_plugin(
        DeserializationConfig::default().with_tiny_int_as_boolean(true),
    );
    let statement = CompiledStatement::select("select * from `toy`", ());

    let first = dialect.driver();
    let raw = first
        .connection()
        .execute_query(&statement)
        .await
        .expect("query must succeed");
    let rows = plugin
        .transform_result(&statement, raw)
        .expect("plugin must find metadata")
        .into_rows();
    assert_eq!(rows[0].get("in_stock"), Some(&Value::Bool(false)));
    first.destroy().await.expect("must destroy");

    let second = dialect.driver();
    let raw = second
        .connection()
        .execute_query(&statement)
        .await
        .expect("query must succeed");
    let rows = plugin
        .transform_result(&statement, raw)
        .expect("metadata must be recorded after destroy")
        .into_rows();
    assert_eq!(rows[0].get("in_stock"), Some(&Value::Bool(false)));
}

#[tokio::test]
async fn zero_dates_do_not_fail_the_query() {
    let body = json!({
        "results": [
            {
                "columns": [
                    { "name": "born_on", "dataType": "DATE", "nullable": false },
                    { "name": "updated_at", "dataType": "DATETIME", "nullable": false }
                ],
                "rows": [
                    ["0000-00-00", "0000-00-00 00:00:00"],
                    ["2023-07-01", "2023-07-01 12:30:45"]
                ]
            }
        ]
    });
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, body)], vec![]).await;
    let config = server
        .config()
        .with_deserialization(DeserializationConfig::default().with_native_dates(true));
    let connection = DataApiDialect::new(config).driver().connection();

    let result = connection
        .execute_query(&CompiledStatement::select("select * from `person`", ()))
        .await
        .expect("query must succeed");

    let rows = result.rows();
    assert_eq!(rows[0].get("born_on"), Some(&Value::text("0000-00-00")));
    assert_eq!(
        rows[0].get("updated_at"),
        Some(&Value::text("0000-00-00 00:00:00"))
    );
    assert_eq!(
        rows[1].get("updated_at"),
        Some(&Value::DateTime(
            Utc.with_ymd_and_hms(2023, 7, 1, 12, 30, 45).unwrap()
        ))
    );
}

#[tokio::test]
async fn exec_body_without_counters_is_a_decode_error() {
    let server = spawn_server(vec![], vec![MockResponse::json(StatusCode::OK, json!({}))]).await;
    let connection = DataApiDialect::new(server.config()).driver().connection();

    let err = connection
        .execute_query(&CompiledStatement::new(
            QueryKind::Insert,
            "insert into `toy` (`name`) values (?)",
            [Value::text("Kite")],
        ))
        .await
        .expect_err("malformed exec body must fail");

    assert!(matches!(err, DataApiError::Decode(_)));
}

#[tokio::test]
async fn request_timeout_surfaces_transport_error() {
    let server = spawn_server(
        vec![],
        vec![MockResponse::json(
            StatusCode::OK,
            json!({"lastInsertId": 1, "rowsAffected": 1}),
        )
        .with_delay(Duration::from_millis(150))],
    )
    .await;
    let config = server.config().with_options(ClientOptions { timeout_ms: 20 });
    let connection = DataApiDialect::new(config).driver().connection();

    let err = connection
        .execute_query(&CompiledStatement::raw("delete from toy", ()))
        .await
        .expect_err("request must timeout");

    match err {
        DataApiError::Transport(inner) => {
            let inner = inner
                .downcast_ref::<reqwest::Error>()
                .expect("default transport must surface reqwest errors");
            assert!(inner.is_timeout());
        }
        other => panic!("expected transport timeout error, got {other:?}"),
    }
}
