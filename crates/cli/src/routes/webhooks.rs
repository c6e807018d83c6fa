use std::sync::Arc;

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use runny_engine::Trigger;
use runny_registry::webhook_url;
use serde::Deserialize;
use tracing::info;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookQuery {
    #[serde(default)]
    command_name: String,
    #[serde(default)]
    command: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebhookQuery {
    #[serde(default)]
    old_command_name: String,
    #[serde(default)]
    old_command: String,
    #[serde(default)]
    new_command_name: String,
    #[serde(default)]
    new_command: String,
}

impl WebhookQuery {
    fn require(&self) -> Result<(&str, &str), ApiError> {
        if self.command_name.is_empty() {
            return Err(ApiError::bad_request("Missing command name parameter"));
        }
        if self.command.is_empty() {
            return Err(ApiError::bad_request("Missing command parameter"));
        }
        Ok((&self.command_name, &self.command))
    }
}

/// `PUT /create-webhook/`: create a webhook for an existing command and
/// return its URL.
pub async fn create_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookQuery>,
) -> Result<String, ApiError> {
    let (name, command) = query.require()?;
    if state.dispatcher.catalogue().find(name, command).is_none() {
        return Err(ApiError::not_found(format!("Command '{name}' does not exist")));
    }
    let entry = state.dispatcher.webhooks().create(name, command)?;
    Ok(webhook_url(&state.domain, &state.webhook_route, &entry.uuid)?)
}

/// `PUT /update-webhook/`: retarget a webhook, keeping its UUID.
pub async fn update_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UpdateWebhookQuery>,
) -> Result<StatusCode, ApiError> {
    let required = [
        (&query.old_command_name, "Missing old command name parameter"),
        (&query.old_command, "Missing old command parameter"),
        (&query.new_command_name, "Missing new command name parameter"),
        (&query.new_command, "Missing new command parameter"),
    ];
    if let Some((_, message)) = required.iter().find(|(value, _)| value.is_empty()) {
        return Err(ApiError::bad_request(*message));
    }
    state.dispatcher.webhooks().update(
        &query.old_command_name,
        &query.old_command,
        &query.new_command_name,
        &query.new_command,
    )?;
    Ok(StatusCode::OK)
}

/// `DELETE /delete-webhook/`: deleting a missing webhook succeeds.
pub async fn delete_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookQuery>,
) -> Result<StatusCode, ApiError> {
    let (name, command) = query.require()?;
    state.dispatcher.webhooks().delete(name, command)?;
    Ok(StatusCode::OK)
}

/// `GET /get-webhook/`: the URL of a command's webhook.
pub async fn get_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookQuery>,
) -> Result<String, ApiError> {
    let (name, command) = query.require()?;
    let entry = state
        .dispatcher
        .webhooks()
        .get(name, command)
        .ok_or_else(|| ApiError::not_found("Webhook not found"))?;
    Ok(webhook_url(&state.domain, &state.webhook_route, &entry.uuid)?)
}

/// `GET {route}/{uuid}`: run the webhook's command with query arguments.
pub async fn trigger_webhook(
    State(state): State<Arc<AppState>>,
    Path(uuid): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let pairs = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .collect::<Vec<_>>();
    info!(uuid = %uuid, arguments = pairs.len(), "webhook triggered");
    let trigger = Trigger::webhook(uuid, pairs);
    let output = state.dispatcher.execute(&trigger, &state.shutdown.child_token()).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], output).into_response())
}
