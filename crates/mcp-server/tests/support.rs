//! Shared helpers for the integration tests: a stub Pusher API served on a
//! local port, and a spawned MCP server wired to it over stdio.

// Each test binary pulls in the subset of helpers it needs.
#![allow(dead_code)]

use anyhow::{Context, Result};
use rmcp::model::{CallToolRequestParam, CallToolResult};
use rmcp::service::{RoleClient, RunningService, ServiceError};
use rmcp::transport::TokioChildProcess;
use rmcp::ServiceExt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tiny_http::{Header, Response, Server};
use tokio::process::Command;

pub const TEST_APP_ID: &str = "123456";
pub const TEST_KEY: &str = "test-key";
pub const TEST_SECRET: &str = "test-secret";

pub const REQUIRED_VARS: [&str; 4] = [
    "PUSHER_APP_ID",
    "PUSHER_KEY",
    "PUSHER_SECRET",
    "PUSHER_CLUSTER",
];

/// One request recorded by the stub provider.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    pub fn query(&self) -> &str {
        self.url.split_once('?').map(|(_, query)| query).unwrap_or("")
    }

    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("recorded body is JSON")
    }
}

/// Stub Pusher API bound to a local port. Serves until the test process
/// exits and records every request it sees.
pub struct ProviderStub {
    pub addr: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ProviderStub {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("provider request log poisoned")
            .clone()
    }
}

/// Starts a stub provider; `handler` maps each request to a status code and
/// JSON body.
pub fn start_provider<F>(handler: F) -> ProviderStub
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("bind provider stub");
    let addr = server.server_addr().to_string();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);

    std::thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let recorded = RecordedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                body,
            };
            log.lock()
                .expect("provider request log poisoned")
                .push(recorded.clone());

            let (status, payload) = handler(&recorded);
            let response = Response::from_string(payload)
                .with_status_code(status)
                .with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("static header"),
                );
            let _ = request.respond(response);
        }
    });

    ProviderStub { addr, requests }
}

/// Stub that answers every request with the same status and body.
pub fn static_provider(status: u16, payload: &'static str) -> ProviderStub {
    start_provider(move |_| (status, payload.to_string()))
}

fn server_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pusher-mcp"))
}

/// Command for the MCP server binary wired to a stub provider.
pub fn server_command(provider_addr: &str) -> Command {
    let mut cmd = Command::new(server_bin());
    cmd.env("PUSHER_APP_ID", TEST_APP_ID)
        .env("PUSHER_KEY", TEST_KEY)
        .env("PUSHER_SECRET", TEST_SECRET)
        .env("PUSHER_CLUSTER", "us2")
        .env("PUSHER_HOST", provider_addr)
        .env("PUSHER_USE_TLS", "false")
        .env("RUST_LOG", "warn");
    cmd
}

/// Command for the MCP server binary with every `PUSHER_*` variable removed,
/// for configuration-failure tests. `keep` re-adds selected credentials.
pub fn bare_command(keep: &[(&str, &str)]) -> Command {
    let mut cmd = Command::new(server_bin());
    for name in REQUIRED_VARS {
        cmd.env_remove(name);
    }
    cmd.env_remove("PUSHER_HOST");
    cmd.env_remove("PUSHER_USE_TLS");
    cmd.env("RUST_LOG", "warn");
    for (name, value) in keep {
        cmd.env(name, value);
    }
    cmd
}

pub async fn connect(cmd: Command) -> Result<RunningService<RoleClient, ()>> {
    let transport = TokioChildProcess::new(cmd).context("spawn mcp server")?;
    let service = tokio::time::timeout(Duration::from_secs(10), ().serve(transport))
        .await
        .context("timeout starting MCP server")??;
    Ok(service)
}

/// Calls a tool and returns the raw protocol-level outcome, so tests can
/// distinguish schema rejections (Err) from handler errors (is_error).
pub async fn try_call(
    service: &RunningService<RoleClient, ()>,
    name: &'static str,
    arguments: serde_json::Value,
) -> Result<std::result::Result<CallToolResult, ServiceError>> {
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        service.call_tool(CallToolRequestParam {
            name: name.into(),
            arguments: arguments.as_object().cloned(),
        }),
    )
    .await
    .context("timeout calling tool")?;
    Ok(outcome)
}

/// Calls a tool, failing the test on protocol-level errors.
pub async fn call(
    service: &RunningService<RoleClient, ()>,
    name: &'static str,
    arguments: serde_json::Value,
) -> Result<CallToolResult> {
    let result = try_call(service, name, arguments)
        .await?
        .context("tool call rejected at protocol level")?;
    Ok(result)
}

/// First text block of a tool result.
pub fn first_text(result: &CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|content| content.as_text())
        .map(|text| text.text.clone())
        .unwrap_or_default()
}
