//! Integration tests for the inbound email webhook.
//!
//! Each test spins up an Axum server on a random port and posts real HTTP
//! requests with reqwest, the way a provider webhook would.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::timeout;

use mailhook::adapters::{Adapter, AdapterRegistry, RawPayload};
use mailhook::config::{AppConfig, ServerConfig, SharedConfig};
use mailhook::email::{Email, NormalizedParams};
use mailhook::error::AdapterError;
use mailhook::http::email_routes;
use mailhook::pipeline::InboundPipeline;
use mailhook::processor::{BoxError, Processor, ProcessorRegistry, factory};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Adapter that ignores the request and returns fixed canonical params.
struct OneThatWorks;

impl Adapter for OneThatWorks {
    fn normalize(&self, _raw: &RawPayload) -> Result<NormalizedParams, AdapterError> {
        match json!({ "to": ["tb@example.com"], "from": "tb@example.com", "cc": [] }) {
            serde_json::Value::Object(map) => Ok(map),
            _ => unreachable!(),
        }
    }
}

/// What a processor class saw during a test.
#[derive(Default)]
struct Log {
    built: AtomicUsize,
    emails: Mutex<Vec<Email>>,
    methods: Mutex<Vec<String>>,
}

struct RecordingProcessor {
    log: Arc<Log>,
    email: Email,
}

#[async_trait]
impl Processor for RecordingProcessor {
    fn responds_to(&self, method: &str) -> bool {
        matches!(method, "process" | "perform")
    }

    async fn invoke(&mut self, method: &str) -> Result<(), BoxError> {
        self.log.methods.lock().unwrap().push(method.to_string());
        self.log.emails.lock().unwrap().push(self.email.clone());
        Ok(())
    }
}

async fn register_recording(processors: &ProcessorRegistry, class: &str) -> Arc<Log> {
    let log = Arc::new(Log::default());
    let shared = Arc::clone(&log);
    processors
        .register(
            class,
            factory(move |email| {
                shared.built.fetch_add(1, Ordering::SeqCst);
                RecordingProcessor {
                    log: Arc::clone(&shared),
                    email,
                }
            }),
        )
        .await;
    log
}

struct Server {
    port: u16,
    pipeline: InboundPipeline,
    default_log: Arc<Log>,
}

impl Server {
    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

/// Start a server with `one_that_works` configured and a recording
/// `EmailProcessor`.
async fn start_server() -> Server {
    let adapters = Arc::new(AdapterRegistry::with_builtin());
    adapters.register("one_that_works", Arc::new(OneThatWorks)).await;

    let processors = Arc::new(ProcessorRegistry::new());
    let default_log = register_recording(&processors, "EmailProcessor").await;

    let pipeline = InboundPipeline::new(
        adapters,
        processors,
        SharedConfig::new(AppConfig {
            email_service: "one_that_works".into(),
            ..AppConfig::default()
        }),
    );
    let app = email_routes(pipeline.clone(), &ServerConfig::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    Server {
        port,
        pipeline,
        default_log,
    }
}

fn email_params() -> Vec<(&'static str, &'static str)> {
    vec![
        ("headers", "Received: by 127.0.0.1 with SMTP..."),
        ("to", "thoughtbot <tb@example.com>"),
        ("cc", "CC <cc@example.com>"),
        ("from", "John Doe <someone@example.com>"),
        ("subject", "hello there"),
        ("text", "this is an email message"),
        ("html", "<p>this is an email message</p>"),
        (
            "charsets",
            r#"{"to":"UTF-8","html":"ISO-8859-1","subject":"UTF-8","from":"UTF-8","text":"ISO-8859-1"}"#,
        ),
        ("SPF", "pass"),
    ]
}

async fn post_form(url: String, params: &[(&str, &str)]) -> reqwest::Response {
    reqwest::Client::new()
        .post(url)
        .form(params)
        .send()
        .await
        .expect("request failed")
}

// ── Routing ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn post_v1_is_successful() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let resp = post_form(server.url("/v1/email_processor"), &email_params()).await;

        assert!(resp.status().is_success());
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn post_v2_is_also_successful() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let resp = post_form(server.url("/v2/email_processor"), &email_params()).await;

        assert!(resp.status().is_success());
    })
    .await
    .expect("test timed out");
}

// ── Normalization ───────────────────────────────────────────────────────

#[tokio::test]
async fn email_is_built_from_normalized_params() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let resp = post_form(server.url("/v1/email_processor"), &[("to", "tb@example.com")]).await;
        assert!(resp.status().is_success());

        let emails = server.default_log.emails.lock().unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].to, vec!["tb@example.com"]);
        assert!(emails[0].cc.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn sendgrid_payload_is_normalized() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        server
            .pipeline
            .config()
            .update(|c| c.email_service = "sendgrid".into())
            .await;

        let resp = post_form(server.url("/v1/email_processor"), &email_params()).await;
        assert!(resp.status().is_success());

        let emails = server.default_log.emails.lock().unwrap();
        let email = &emails[0];
        assert_eq!(email.to, vec!["tb@example.com"]);
        assert_eq!(email.cc, vec!["cc@example.com"]);
        assert_eq!(email.from, "someone@example.com");
        assert_eq!(email.subject, "hello there");
        assert_eq!(email.body, "this is an email message");
        assert_eq!(email.vendor_specific["spf"], "pass");
    })
    .await
    .expect("test timed out");
}

// ── Dispatch ────────────────────────────────────────────────────────────

#[tokio::test]
async fn custom_processor_class_is_used() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let my_handler = register_recording(server.pipeline.processors(), "MyHandler").await;
        server
            .pipeline
            .config()
            .update(|c| c.processor.class = Some("MyHandler".into()))
            .await;

        let resp = post_form(server.url("/v1/email_processor"), &email_params()).await;
        assert!(resp.status().is_success());

        assert_eq!(my_handler.built.load(Ordering::SeqCst), 1);
        assert_eq!(*my_handler.methods.lock().unwrap(), vec!["process"]);
        assert_eq!(server.default_log.built.load(Ordering::SeqCst), 0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn custom_processor_method_is_called() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        server
            .pipeline
            .config()
            .update(|c| c.processor.method = Some("perform".into()))
            .await;

        let resp = post_form(server.url("/v1/email_processor"), &email_params()).await;
        assert!(resp.status().is_success());

        assert_eq!(server.default_log.built.load(Ordering::SeqCst), 1);
        assert_eq!(*server.default_log.methods.lock().unwrap(), vec!["perform"]);
    })
    .await
    .expect("test timed out");
}

// ── Failures ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unregistered_adapter_is_a_server_error() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        server
            .pipeline
            .config()
            .update(|c| c.email_service = "not_registered".into())
            .await;

        let resp = post_form(server.url("/v1/email_processor"), &email_params()).await;

        assert!(resp.status().is_server_error());
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("not_registered"));
        assert_eq!(server.default_log.built.load(Ordering::SeqCst), 0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_processor_class_is_a_server_error() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        server
            .pipeline
            .config()
            .update(|c| c.processor.class = Some("Missing".into()))
            .await;

        let resp = post_form(server.url("/v2/email_processor"), &email_params()).await;

        assert!(resp.status().is_server_error());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_recipients_is_a_client_error() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        server
            .pipeline
            .config()
            .update(|c| c.email_service = "postmark".into())
            .await;

        let resp = reqwest::Client::new()
            .post(server.url("/v1/email_processor"))
            .json(&json!({ "Subject": "no recipients at all" }))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_client_error());
        assert_eq!(server.default_log.built.load(Ordering::SeqCst), 0);
    })
    .await
    .expect("test timed out");
}
