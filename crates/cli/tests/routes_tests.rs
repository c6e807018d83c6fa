use std::{fs, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use runny::{AppState, RunnyServer, api_router, webhook_router};
use runny_engine::Dispatcher;
use runny_registry::{CatalogueStore, WebhookRegistry};
use runny_remote::{ExecOptions, RemoteRunner, Script, ScriptedShell};
use runny_template::QuotingMode;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const CATALOGUE: &str = "\
@name List Files
@group Files
ls ${Path:path=/home}

@name echo
echo ${Message=Hello World}
";

struct Fixture {
    _directory: TempDir,
    shell: Arc<ScriptedShell>,
    state: Arc<AppState>,
}

impl Fixture {
    fn new(script: Script, manipulation_allowed: bool) -> Self {
        let directory = tempfile::tempdir().expect("tempdir");
        let catalogue_path = directory.path().join("commands.txt");
        fs::write(&catalogue_path, CATALOGUE).expect("seed catalogue");
        let catalogue = CatalogueStore::open(&catalogue_path, manipulation_allowed).expect("catalogue");
        let webhooks = WebhookRegistry::open(directory.path().join("webhooks.json")).expect("webhooks");
        let shell = Arc::new(ScriptedShell::new(script));
        let runner = RemoteRunner::new(shell.clone(), ExecOptions::default());
        let dispatcher = Dispatcher::new(Arc::new(catalogue), Arc::new(webhooks), runner, QuotingMode::Heuristic);
        let state = Arc::new(AppState::new(
            dispatcher,
            "https://runny.example.com",
            "/webhook",
            CancellationToken::new(),
        ));
        Self {
            _directory: directory,
            shell,
            state,
        }
    }

    fn app(&self) -> Router {
        api_router(Arc::clone(&self.state)).merge(webhook_router(Arc::clone(&self.state)))
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app().oneshot(request).await.expect("response")
    }
}

fn request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(body.into()).expect("request")
}

fn form(method: &str, uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request")
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

const LIST_FILES: &str = "/command/?name=List%20Files&command=ls%20%24%7BPath%3Apath%3D%2Fhome%7D";
const ECHO: &str = "commandName=echo&command=echo%20%24%7BMessage%3DHello%20World%7D";

#[tokio::test]
async fn lists_the_catalogue() {
    let fixture = Fixture::new(Script::new(), true);

    let response = fixture.send(request("GET", "/command/", Body::empty())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let commands: serde_json::Value = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(commands[0]["name"], "List Files");
    assert_eq!(commands[0]["group"], "Files");
    assert_eq!(commands[0]["variables"][0]["type"], "path");
    assert_eq!(commands[1]["variables"][0]["default"], "Hello World");
}

#[tokio::test]
async fn executes_with_json_arguments() {
    let fixture = Fixture::new(Script::new().stdout("bin\netc\n"), true);

    let response = fixture.send(request("POST", LIST_FILES, r#"{"Path":"/tmp/a b"}"#)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "bin\netc\n");
    assert_eq!(fixture.shell.executed(), vec!["ls \"/tmp/a b\"".to_string()]);
}

#[tokio::test]
async fn validation_failures_are_bad_requests() {
    let fixture = Fixture::new(Script::new(), true);

    let response = fixture.send(request("POST", LIST_FILES, r#"{"Path":"../etc"}"#)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Path"));
    assert!(fixture.shell.executed().is_empty());
}

#[tokio::test]
async fn unknown_commands_are_not_found() {
    let fixture = Fixture::new(Script::new(), true);

    let response = fixture.send(request("POST", "/command/?name=ls&command=ls", Body::empty())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Command not found\n");
}

#[tokio::test]
async fn failed_executions_include_partial_output() {
    let fixture = Fixture::new(Script::new().stderr("ls: denied\n").exit_code(2), true);

    let response = fixture.send(request("POST", LIST_FILES, "{}")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_text(response).await,
        "Failed to execute command: Process exited with status 2\nls: denied\n"
    );
}

#[tokio::test]
async fn streaming_emits_chunks_then_exit() {
    let fixture = Fixture::new(Script::new().stdout("10%\r100%\r\n"), true);

    let response = fixture
        .send(request(
            "POST",
            "/command/stream?name=echo&command=echo%20%24%7BMessage%3DHello%20World%7D",
            Body::empty(),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("event: stdout"));
    assert!(text.contains(r#""text":"100%\r\n""#));
    assert!(text.contains("event: exit"));
    assert!(!text.contains("10%"));
}

#[tokio::test]
async fn streaming_validation_fails_before_the_stream_opens() {
    let fixture = Fixture::new(Script::new(), true);

    let response = fixture
        .send(request(
            "POST",
            "/command/stream?name=List%20Files&command=ls%20%24%7BPath%3Apath%3D%2Fhome%7D",
            r#"{"Path":"a/../b"}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn adds_and_removes_commands() {
    let fixture = Fixture::new(Script::new(), true);

    let added = fixture
        .send(form("PUT", "/command/", "commandName=Uptime&groupName=System&command=uptime"))
        .await;
    assert_eq!(added.status(), StatusCode::OK);
    assert!(fixture.state.dispatcher.catalogue().find("Uptime", "uptime").is_some());

    let duplicate = fixture.send(form("PUT", "/command/", "commandName=Uptime&command=uptime%20-p")).await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(duplicate).await, "Command 'Uptime' already exists\n");

    let removed = fixture
        .send(request("DELETE", "/command/?commandName=Uptime&command=uptime", Body::empty()))
        .await;
    assert_eq!(removed.status(), StatusCode::OK);
    assert!(fixture.state.dispatcher.catalogue().find("Uptime", "uptime").is_none());

    let missing = fixture
        .send(request("DELETE", "/command/?commandName=Uptime&command=uptime", Body::empty()))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn manipulation_can_be_disabled() {
    let fixture = Fixture::new(Script::new(), false);

    let allowed = fixture.send(request("GET", "/is-command-manipulation-allowed", Body::empty())).await;
    assert_eq!(body_text(allowed).await, "false");

    let response = fixture.send(form("PUT", "/command/", "commandName=Uptime&command=uptime")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Unauthorized: Command manipulation is disabled\n");
}

#[tokio::test]
async fn webhook_lifecycle() {
    let fixture = Fixture::new(Script::new().stdout("hi\n"), true);

    let created = fixture.send(request("PUT", &format!("/create-webhook/?{ECHO}"), Body::empty())).await;
    assert_eq!(created.status(), StatusCode::OK);
    let url = body_text(created).await;
    let uuid = url
        .strip_prefix("https://runny.example.com/webhook/")
        .expect("webhook url")
        .to_string();

    let again = fixture.send(request("PUT", &format!("/create-webhook/?{ECHO}"), Body::empty())).await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);

    let fetched = fixture.send(request("GET", &format!("/get-webhook/?{ECHO}"), Body::empty())).await;
    assert_eq!(body_text(fetched).await, url);

    let triggered = fixture
        .send(request("GET", &format!("/webhook/{uuid}/?Message=first&Message=second"), Body::empty()))
        .await;
    assert_eq!(triggered.status(), StatusCode::OK);
    assert_eq!(body_text(triggered).await, "hi\n");
    assert_eq!(fixture.shell.executed(), vec!["echo first".to_string()]);

    let deleted = fixture.send(request("DELETE", &format!("/delete-webhook/?{ECHO}"), Body::empty())).await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = fixture.send(request("GET", &format!("/webhook/{uuid}"), Body::empty())).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(gone).await, "Webhook not found\n");
}

#[tokio::test]
async fn webhooks_require_an_existing_command() {
    let fixture = Fixture::new(Script::new(), true);

    let response = fixture
        .send(request("PUT", "/create-webhook/?commandName=nope&command=nope", Body::empty()))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Command 'nope' does not exist\n");
}

#[tokio::test]
async fn updating_a_webhook_keeps_its_uuid() {
    let fixture = Fixture::new(Script::new(), true);
    let entry = fixture
        .state
        .dispatcher
        .webhooks()
        .create("echo", "echo ${Message=Hello World}")
        .expect("webhook");

    let response = fixture
        .send(request(
            "PUT",
            "/update-webhook/?oldCommandName=echo&oldCommand=echo%20%24%7BMessage%3DHello%20World%7D\
             &newCommandName=List%20Files&newCommand=ls%20%24%7BPath%3Apath%3D%2Fhome%7D",
            Body::empty(),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let moved = fixture
        .state
        .dispatcher
        .webhooks()
        .get("List Files", "ls ${Path:path=/home}")
        .expect("moved webhook");
    assert_eq!(moved.uuid, entry.uuid);

    let missing = fixture
        .send(request("PUT", "/update-webhook/?oldCommandName=echo", Body::empty()))
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(missing).await, "Missing old command parameter\n");
}

#[tokio::test]
async fn server_starts_and_stops_on_ephemeral_ports() {
    let fixture = Fixture::new(Script::new(), true);
    let loopback: SocketAddr = "127.0.0.1:0".parse().expect("addr");

    let server = RunnyServer::new(loopback, Some(loopback), Arc::clone(&fixture.state))
        .start()
        .await
        .expect("start");

    assert_ne!(server.api_address().port(), 0);
    assert!(server.webhook_address().is_some());
    server.stop().await.expect("stop");
    assert!(fixture.state.shutdown.is_cancelled());
}
