//! Listener lifecycle.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    config::Config,
    routes::{api_router, webhook_router},
    state::AppState,
};

/// Addresses for the API listener and, optionally, a separate webhook listener.
#[derive(Debug, Clone)]
pub struct RunnyServer {
    api_address: SocketAddr,
    webhook_address: Option<SocketAddr>,
    state: Arc<AppState>,
}

impl RunnyServer {
    pub fn new(api_address: SocketAddr, webhook_address: Option<SocketAddr>, state: Arc<AppState>) -> Self {
        Self {
            api_address,
            webhook_address,
            state,
        }
    }

    pub fn from_config(config: &Config, state: Arc<AppState>) -> Self {
        let api_address = SocketAddr::new(config.bind, config.port);
        let webhook_address = config
            .separate_webhook_listener()
            .then(|| SocketAddr::new(config.bind, config.webhook_port()));
        if !is_loopback(config.bind) {
            warn!(bind = %config.bind, "listening on a non-loopback address; put an authenticating proxy in front");
        }
        Self::new(api_address, webhook_address, state)
    }

    /// Bind the listeners and serve until the state's shutdown token fires.
    pub async fn start(self) -> Result<RunningServer> {
        let shutdown = self.state.shutdown.clone();
        let api = api_router(Arc::clone(&self.state));
        let webhooks = webhook_router(Arc::clone(&self.state));

        let mut handles = Vec::with_capacity(2);
        let api_routes = match self.webhook_address {
            Some(_) => api,
            None => api.merge(webhooks.clone()),
        };
        let (api_address, handle) = serve(self.api_address, api_routes, shutdown.child_token()).await?;
        info!(address = %api_address, "api listening");
        handles.push(handle);

        let webhook_address = match self.webhook_address {
            Some(address) => {
                let (bound, handle) = serve(address, webhooks, shutdown.child_token()).await?;
                info!(address = %bound, route = %self.state.webhook_route, "webhooks listening");
                handles.push(handle);
                Some(bound)
            }
            None => None,
        };

        Ok(RunningServer {
            api_address,
            webhook_address,
            cancellation_token: shutdown,
            handles,
        })
    }
}

/// Runtime handle for the running listeners.
#[derive(Debug)]
pub struct RunningServer {
    api_address: SocketAddr,
    webhook_address: Option<SocketAddr>,
    cancellation_token: CancellationToken,
    handles: Vec<JoinHandle<Result<()>>>,
}

impl RunningServer {
    pub fn api_address(&self) -> SocketAddr {
        self.api_address
    }

    /// Bound webhook address when webhooks have their own listener.
    pub fn webhook_address(&self) -> Option<SocketAddr> {
        self.webhook_address
    }

    /// Cancel in-flight executions, stop accepting connections and wait for
    /// the listeners to drain.
    pub async fn stop(self) -> Result<()> {
        self.cancellation_token.cancel();
        for handle in self.handles {
            handle
                .await
                .map_err(|error| anyhow!("server task failed: {error}"))??;
        }
        info!("listeners stopped");
        Ok(())
    }
}

async fn serve(
    address: SocketAddr,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("binding {address}"))?;
    let bound = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
            })
            .await
            .with_context(|| format!("serving {bound}"))
    });
    Ok((bound, handle))
}

fn is_loopback(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(ip) => ip.is_loopback(),
        IpAddr::V6(ip) => ip.is_loopback(),
    }
}
