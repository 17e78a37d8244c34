#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use percy_webdriver::{Config, PercyClient, PercyError, Result, Viewport, WebDriver};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use url::Url;

pub const DOM_SCRIPT: &str = "window.PercyDOM = { serialize: () => ({ html: document.documentElement.outerHTML }), \
waitForResize: () => { if (!window.resizeCount) { window.addEventListener('resize', () => window.resizeCount++) } window.resizeCount = 0; } }";

pub const PAGE_HTML: &str = "<html><head></head><body>Snapshot Me</body></html>";
pub const PAGE_URL: &str = "http://localhost:8000/";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub body: Value,
}

/// Canned responses for the fake CLI.
#[derive(Debug, Clone)]
pub struct SidecarSetup {
    pub health_status: u16,
    pub health_body: Value,
    pub version: Option<String>,
    pub capture_status: u16,
    pub capture_body: Value,
}

impl SidecarSetup {
    pub fn healthy() -> Self {
        Self {
            health_status: 200,
            health_body: json!({ "success": true }),
            version: Some("1.0.0".to_string()),
            capture_status: 200,
            capture_body: json!({ "success": true }),
        }
    }

    pub fn session_type(mut self, session_type: &str) -> Self {
        self.health_body["type"] = json!(session_type);
        self
    }

    pub fn widths(mut self, widths: Value) -> Self {
        self.health_body["widths"] = widths;
        self
    }

    pub fn config(mut self, config: Value) -> Self {
        self.health_body["config"] = config;
        self
    }

    pub fn version(mut self, version: Option<&str>) -> Self {
        self.version = version.map(str::to_owned);
        self
    }

    pub fn failing_healthcheck(mut self) -> Self {
        self.health_status = 500;
        self.health_body = json!({ "success": false, "error": "test" });
        self
    }

    pub fn capture_response(mut self, status: u16, body: Value) -> Self {
        self.capture_status = status;
        self.capture_body = body;
        self
    }
}

struct SidecarState {
    setup: SidecarSetup,
    requests: Mutex<Vec<Recorded>>,
}

impl SidecarState {
    fn record(&self, path: &str, body: Value) {
        self.requests.lock().unwrap().push(Recorded {
            path: path.to_string(),
            body,
        });
    }

    fn capture_reply(&self) -> Response {
        (
            StatusCode::from_u16(self.setup.capture_status).unwrap(),
            Json(self.setup.capture_body.clone()),
        )
            .into_response()
    }
}

pub struct FakeSidecar {
    pub url: Url,
    state: Arc<SidecarState>,
}

impl FakeSidecar {
    pub async fn start(setup: SidecarSetup) -> Self {
        let state = Arc::new(SidecarState {
            setup,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/percy/healthcheck", get(healthcheck))
            .route("/percy/dom.js", get(dom_script))
            .route("/percy/snapshot", post(snapshot))
            .route("/percy/automateScreenshot", post(automate_screenshot))
            .route("/percy/log", post(log))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{addr}")).unwrap(),
            state,
        }
    }

    pub fn config(&self) -> Config {
        Config::default().with_cli_api(&self.url)
    }

    pub fn client(&self) -> PercyClient {
        PercyClient::new(self.config()).unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub fn bodies(&self, path: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .map(|r| r.body)
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

async fn healthcheck(State(state): State<Arc<SidecarState>>) -> Response {
    state.record("/percy/healthcheck", Value::Null);
    let mut headers = HeaderMap::new();
    if let Some(version) = &state.setup.version {
        headers.insert(
            "x-percy-core-version",
            HeaderValue::from_str(version).unwrap(),
        );
    }
    (
        StatusCode::from_u16(state.setup.health_status).unwrap(),
        headers,
        Json(state.setup.health_body.clone()),
    )
        .into_response()
}

async fn dom_script(State(state): State<Arc<SidecarState>>) -> Response {
    state.record("/percy/dom.js", Value::Null);
    DOM_SCRIPT.into_response()
}

async fn snapshot(State(state): State<Arc<SidecarState>>, Json(body): Json<Value>) -> Response {
    state.record("/percy/snapshot", body);
    state.capture_reply()
}

async fn automate_screenshot(
    State(state): State<Arc<SidecarState>>,
    Json(body): Json<Value>,
) -> Response {
    state.record("/percy/automateScreenshot", body);
    state.capture_reply()
}

async fn log(State(state): State<Arc<SidecarState>>, Json(body): Json<Value>) -> Response {
    state.record("/percy/log", body);
    Json(json!({ "success": true })).into_response()
}

#[derive(Debug)]
pub struct DriverState {
    pub window: Viewport,
    pub resize_count: u64,
    pub scripts: Vec<String>,
    pub window_resizes: Vec<Viewport>,
    pub native_resizes: Vec<Viewport>,
    /// Window width at each serialization.
    pub serialized_at: Vec<u32>,
    /// Time from the latest resize to each serialization.
    pub settle_times: Vec<Duration>,
    pub last_resize_at: Option<Instant>,
    pub remote_calls: usize,
}

/// A scripted browser: keeps a window size and a page-side resize counter.
pub struct MockDriver {
    pub session_id: String,
    pub state: Mutex<DriverState>,
    pub native_resize: bool,
    pub fail_native_resize: bool,
    pub fail_serialize_at: Option<u32>,
    pub ignore_resize_events: bool,
    pub cookies: Value,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            session_id: "Dummy_session_id".to_string(),
            state: Mutex::new(DriverState {
                window: Viewport::new(800, 400),
                resize_count: 0,
                scripts: Vec::new(),
                window_resizes: Vec::new(),
                native_resizes: Vec::new(),
                serialized_at: Vec::new(),
                settle_times: Vec::new(),
                last_resize_at: None,
                remote_calls: 0,
            }),
            native_resize: false,
            fail_native_resize: false,
            fail_serialize_at: None,
            ignore_resize_events: false,
            cookies: json!([{ "name": "foo", "value": "bar", "path": "/", "domain": "localhost" }]),
        }
    }

    pub fn with_native_resize(mut self) -> Self {
        self.native_resize = true;
        self
    }

    /// Advertises native resize but fails every attempt.
    pub fn with_broken_native_resize(mut self) -> Self {
        self.native_resize = true;
        self.fail_native_resize = true;
        self
    }

    /// Resizes the window but the page never counts a resize event.
    pub fn ignoring_resize_events(mut self) -> Self {
        self.ignore_resize_events = true;
        self
    }

    pub fn failing_serialize_at(mut self, width: u32) -> Self {
        self.fail_serialize_at = Some(width);
        self
    }

    pub fn window(&self) -> Viewport {
        self.state.lock().unwrap().window
    }

    pub fn snapshot_state<T>(&self, read: impl FnOnce(&DriverState) -> T) -> T {
        read(&self.state.lock().unwrap())
    }

    fn apply_size(&self, state: &mut DriverState, viewport: Viewport) {
        if state.window != viewport && !self.ignore_resize_events {
            state.resize_count += 1;
        }
        state.window = viewport;
        state.last_resize_at = Some(Instant::now());
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[async_trait]
impl WebDriver for MockDriver {
    fn session_id(&self) -> String {
        self.session_id.clone()
    }

    async fn command_executor_url(&self) -> Result<String> {
        self.state.lock().unwrap().remote_calls += 1;
        Ok("https://hub-cloud.browserstack.com/wd/hub".to_string())
    }

    async fn capabilities(&self) -> Result<Map<String, Value>> {
        self.state.lock().unwrap().remote_calls += 1;
        Ok(object(json!({ "key": "value" })))
    }

    async fn session_capabilities(&self) -> Result<Map<String, Value>> {
        self.state.lock().unwrap().remote_calls += 1;
        Ok(object(json!({ "key": "value", "session_name": "abc" })))
    }

    async fn execute_script(&self, script: &str, _args: Vec<Value>) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.scripts.push(script.to_string());

        if script.starts_with("return PercyDOM.serialize(") {
            let width = state.window.width;
            if self.fail_serialize_at == Some(width) {
                return Err(PercyError::driver(format!("page crashed at {width}")));
            }
            state.serialized_at.push(width);
            if let Some(resized) = state.last_resize_at {
                state.settle_times.push(resized.elapsed());
            }
            return Ok(json!({ "html": PAGE_HTML }));
        }
        if script == "PercyDOM.waitForResize()" {
            state.resize_count = 0;
            return Ok(Value::Null);
        }
        if script == "return window.resizeCount" {
            return Ok(json!(state.resize_count));
        }
        Ok(Value::Null)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(PAGE_URL.to_string())
    }

    async fn cookies(&self) -> Result<Value> {
        Ok(self.cookies.clone())
    }

    async fn window_size(&self) -> Result<Viewport> {
        Ok(self.window())
    }

    async fn set_window_size(&self, viewport: Viewport) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.window_resizes.push(viewport);
        self.apply_size(&mut state, viewport);
        Ok(())
    }

    fn supports_native_resize(&self) -> bool {
        self.native_resize
    }

    async fn native_resize(&self, viewport: Viewport) -> Result<()> {
        if self.fail_native_resize {
            return Err(PercyError::driver("cdp unavailable"));
        }
        let mut state = self.state.lock().unwrap();
        state.native_resizes.push(viewport);
        self.apply_size(&mut state, viewport);
        Ok(())
    }

    fn environment_info(&self) -> String {
        "mock-driver/1.0".to_string()
    }
}
