use std::{collections::HashMap, convert::Infallible, sync::Arc};

use axum::{
    Form, Json,
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures_util::{Stream, stream};
use runny_engine::{Dispatcher, Trigger};
use runny_remote::{OutputChunk, OutputSink};
use runny_types::{Command, NewCommand};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::error::ApiError;
use crate::state::AppState;

/// `name` and `command` identify the catalogue entry to run.
#[derive(Debug, Default, Deserialize)]
pub struct CommandQuery {
    #[serde(default)]
    name: String,
    #[serde(default)]
    command: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    #[serde(default)]
    command_name: String,
    #[serde(default)]
    command: String,
    #[serde(default)]
    keep_webhook: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExitEvent {
    code: u32,
}

#[derive(Debug, Serialize)]
struct ErrorEvent {
    message: String,
}

/// `GET /command/`: the current catalogue snapshot.
pub async fn list_commands(State(state): State<Arc<AppState>>) -> Json<Arc<Vec<Command>>> {
    Json(state.dispatcher.catalogue().snapshot())
}

/// `POST /command/`: run a command and return its combined output.
pub async fn execute_command(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommandQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let trigger = api_trigger(query, &body)?;
    let output = state.dispatcher.execute(&trigger, &state.shutdown.child_token()).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], output).into_response())
}

/// `POST /command/stream`: run a command and stream accumulated output as
/// server-sent events.
///
/// Each `stdout`/`stderr` event carries the full text of that stream so far.
/// The stream ends with an `exit` event on success or an `error` event.
/// Lookup and validation failures are reported as plain HTTP errors before
/// the stream opens. Closing the connection cancels the execution.
pub async fn stream_command(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommandQuery>,
    body: Bytes,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let trigger = api_trigger(query, &body)?;
    state.dispatcher.prepare(&trigger)?;

    let (sender, receiver) = mpsc::unbounded_channel::<Event>();
    let cancel = state.shutdown.child_token();
    let guard = cancel.clone().drop_guard();

    let chunk_sender = sender.clone();
    let sink: Arc<dyn OutputSink> = Arc::new(move |chunk: OutputChunk| {
        if let Some(event) = chunk_event(&chunk) {
            let _ = chunk_sender.send(event);
        }
    });

    let dispatcher: Dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        let result = dispatcher.execute_streaming(&trigger, sink, &cancel).await;
        let event = match result {
            Ok(()) => Event::default().event("exit").json_data(ExitEvent { code: 0 }),
            Err(error) => {
                warn!(error = %error, "streamed command failed");
                Event::default().event("error").json_data(ErrorEvent {
                    message: error.to_string(),
                })
            }
        };
        if let Ok(event) = event {
            let _ = sender.send(event);
        }
    });

    // The guard lives as long as the response stream; dropping it on
    // disconnect cancels the execution.
    let events = stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
        let event = receiver.recv().await?;
        Some((Ok(event), (receiver, guard)))
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// `PUT /command/`: append a command from form fields.
pub async fn add_command(
    State(state): State<Arc<AppState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<&'static str, ApiError> {
    let field = |key: &str| form.get(key).cloned().unwrap_or_default();
    let new = NewCommand {
        command_name: field("commandName"),
        group_name: field("groupName"),
        description: field("description"),
        command: field("command"),
    };
    let added = state.dispatcher.catalogue().add(&new)?;
    info!(command = %added.name, "command added");
    Ok("Command added successfully")
}

/// `DELETE /command/`: remove a command and, unless `keepWebhook=true`, its webhook.
pub async fn delete_command(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<&'static str, ApiError> {
    if query.command_name.is_empty() {
        return Err(ApiError::bad_request("Missing command name parameter"));
    }
    if query.command.is_empty() {
        return Err(ApiError::bad_request("Missing command parameter"));
    }
    let keep_webhook = query.keep_webhook.as_deref() == Some("true");
    state
        .dispatcher
        .remove_command(&query.command_name, &query.command, keep_webhook)?;
    info!(command = %query.command_name, keep_webhook, "command removed");
    Ok("Command deleted successfully")
}

/// `GET /is-command-manipulation-allowed`
pub async fn manipulation_allowed(State(state): State<Arc<AppState>>) -> Json<bool> {
    Json(state.dispatcher.catalogue().manipulation_allowed())
}

/// Build an API trigger from the query and a JSON object body of string
/// arguments. An empty body means no arguments.
fn api_trigger(query: CommandQuery, body: &[u8]) -> Result<Trigger, ApiError> {
    if query.name.is_empty() {
        return Err(ApiError::bad_request("Missing command name parameter"));
    }
    if query.command.is_empty() {
        return Err(ApiError::bad_request("Missing command parameter"));
    }
    let args: HashMap<String, String> = if body.iter().all(u8::is_ascii_whitespace) {
        HashMap::new()
    } else {
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON data"))?
    };
    Ok(Trigger::api(query.name, query.command, args))
}

fn chunk_event(chunk: &OutputChunk) -> Option<Event> {
    Event::default().event(chunk.stream.to_string()).json_data(chunk).ok()
}
