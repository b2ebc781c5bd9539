#![allow(dead_code)]

use serde_json::Value;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::{Notify, mpsc},
    time::timeout,
};
use types::{
    ConnectionResult, PackageRecord, UpdateCheckResult, WidgetHandle,
    WidgetSize,
};
use widget_provider::{
    connector::Connector,
    host::{WidgetContext, WidgetHost, WidgetUpdateRequest},
};

const RENDER_TIMEOUT: Duration = Duration::from_secs(1);
const QUIET_PERIOD: Duration = Duration::from_millis(100);

pub fn context(id: &str, definition_id: &str, size: WidgetSize) -> WidgetContext {
    WidgetContext {
        id: id.to_string(),
        definition_id: definition_id.to_string(),
        size,
    }
}

pub fn package(name: &str, manager: &str) -> PackageRecord {
    PackageRecord::from(
        format!("{name}|Vendor.{name}|1.0|2.0|{manager}|{manager}").as_str(),
    )
}

pub fn packages(count: usize) -> Vec<PackageRecord> {
    (0..count)
        .map(|i| package(&format!("Package{i}"), "Winget"))
        .collect()
}

/// Name of the flag set in a rendered data payload.
pub fn state_of(data: &Value) -> &'static str {
    for flag in [
        "NoWingetUI",
        "IsLoading",
        "NoUpdatesFound",
        "UpdatesList",
        "ErrorOccurred",
        "UpdatesInCourse",
    ] {
        if data[flag] == Value::Bool(true) {
            return flag;
        }
    }
    panic!("no state flag in {data}");
}

pub struct RecordingHost {
    running: Vec<WidgetContext>,
    sender: mpsc::UnboundedSender<WidgetUpdateRequest>,
}

impl RecordingHost {
    pub fn new(running: Vec<WidgetContext>) -> (Self, Renders) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { running, sender }, Renders { receiver })
    }
}

impl WidgetHost for RecordingHost {
    fn running_widgets(&self) -> Vec<WidgetContext> {
        self.running.clone()
    }

    fn update_widget(&self, request: WidgetUpdateRequest) {
        let _ = self.sender.send(request);
    }
}

pub struct Renders {
    receiver: mpsc::UnboundedReceiver<WidgetUpdateRequest>,
}

impl Renders {
    pub async fn next(&mut self) -> WidgetUpdateRequest {
        timeout(RENDER_TIMEOUT, self.receiver.recv())
            .await
            .expect("timed out waiting for a render")
            .expect("host channel closed")
    }

    /// Next render as (widget id, parsed data).
    pub async fn next_data(&mut self) -> (String, Value) {
        let request = self.next().await;
        let data = serde_json::from_str(&request.data).unwrap();
        (request.widget_id, data)
    }

    pub async fn next_state(&mut self) -> &'static str {
        let (_, data) = self.next_data().await;
        state_of(&data)
    }

    pub async fn assert_quiet(&mut self) {
        if let Ok(Some(request)) = timeout(QUIET_PERIOD, self.receiver.recv()).await {
            panic!("unexpected render {request:?}");
        }
    }
}

#[derive(Default)]
pub struct Script {
    pub connect_fails: AtomicBool,
    /// `None` makes the update check fail.
    pub updates: Mutex<Option<Vec<PackageRecord>>>,
    pub fetch_gate: Mutex<Option<Arc<Notify>>>,
    pub calls: Mutex<Vec<String>>,
}

impl Script {
    pub fn with_updates(updates: Vec<PackageRecord>) -> Arc<Self> {
        let script = Self::default();
        *script.updates.lock().unwrap() = Some(updates);
        Arc::new(script)
    }

    pub fn set_connect_fails(&self, fails: bool) {
        self.connect_fails.store(fails, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub async fn wait_for_call(&self, call: &str) {
        timeout(RENDER_TIMEOUT, async {
            while !self.calls().iter().any(|c| c == call) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("{call} was never called: {:?}", self.calls()));
    }
}

#[derive(Clone)]
pub struct ScriptedConnector(pub Arc<Script>);

impl Connector for ScriptedConnector {
    async fn connect(&self, widget: WidgetHandle) -> ConnectionResult {
        self.0.record("connect");
        let succeeded = !self.0.connect_fails.load(Ordering::SeqCst);
        ConnectionResult { widget, succeeded }
    }

    async fn fetch_updates(&self, widget: WidgetHandle) -> UpdateCheckResult {
        self.0.record("fetch_updates");

        let gate = self.0.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let updates = self.0.updates.lock().unwrap().clone();
        match updates {
            Some(packages) => UpdateCheckResult::succeeded(widget, packages),
            None => UpdateCheckResult::failed(widget),
        }
    }

    fn reset_connection(&self) {
        self.0.record("reset_connection");
    }

    async fn open_unigetui(&self) {
        self.0.record("open_unigetui");
    }

    async fn view_updates(&self) {
        self.0.record("view_updates");
    }

    async fn update_package(&self, package_id: String) {
        self.0.record(format!("update_package:{package_id}"));
    }

    async fn update_all_packages(&self) {
        self.0.record("update_all_packages");
    }
}
