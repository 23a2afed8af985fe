//! Orchestrator REST client
//!
//! Snapshot fetches plus the three outbound commands: cancel, confirm,
//! and per-call command. Commands are fire-and-forget from the
//! projector's perspective; a rejection surfaces to the caller and is
//! never retried here (retrying a booking confirmation is unsafe
//! without idempotency guarantees from the backend).

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use callwatch_common::config::ClientConfig;
use callwatch_common::snapshot::CampaignSnapshot;
use callwatch_common::{Error, Result};

const USER_AGENT: &str = concat!("callwatch/", env!("CARGO_PKG_VERSION"));

/// Command for an in-flight call.
#[derive(Debug, Clone)]
pub enum CallCommand {
    /// Feed the agent a mid-call instruction
    Instruct { message: String },
    /// Hang up the call
    Disconnect,
}

#[derive(Serialize)]
struct CommandBody<'a> {
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// Campaign REST API client
pub struct CampaignApi {
    http_client: reqwest::Client,
    base_url: String,
}

impl CampaignApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url: config.api_url.clone(),
        })
    }

    /// Fetch the full campaign aggregate, used for initial load and
    /// reconnect reconciliation.
    pub async fn fetch_snapshot(&self, group_id: &str) -> Result<CampaignSnapshot> {
        let url = format!("{}/campaign/{}", self.base_url, group_id);
        debug!(%group_id, %url, "fetching campaign snapshot");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("campaign group {}", group_id)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::CommandRejected {
                status: status.as_u16(),
                body,
            });
        }

        let snapshot: CampaignSnapshot = response.json().await?;
        debug!(
            %group_id,
            calls = snapshot.calls.len(),
            providers = snapshot.providers.len(),
            "snapshot fetched"
        );
        Ok(snapshot)
    }

    /// Request campaign cancellation. Acknowledgement only; late
    /// terminal events for in-flight calls keep arriving afterwards.
    pub async fn cancel(&self, group_id: &str) -> Result<()> {
        let url = format!("{}/campaign/{}/cancel", self.base_url, group_id);
        info!(%group_id, "requesting campaign cancellation");
        self.post_command(&url, None::<&()>).await
    }

    /// Confirm the booking with a specific provider.
    pub async fn confirm(&self, group_id: &str, provider_id: &str) -> Result<()> {
        let url = format!(
            "{}/campaign/{}/confirm/{}",
            self.base_url, group_id, provider_id
        );
        info!(%group_id, %provider_id, "confirming booking");
        self.post_command(&url, None::<&()>).await
    }

    /// Send a command to an in-flight call.
    pub async fn call_command(
        &self,
        group_id: &str,
        provider_id: &str,
        command: &CallCommand,
    ) -> Result<()> {
        let url = format!(
            "{}/campaign/{}/call/{}/command",
            self.base_url, group_id, provider_id
        );
        let body = match command {
            CallCommand::Instruct { message } => CommandBody {
                action: "instruct",
                message: Some(message),
            },
            CallCommand::Disconnect => CommandBody {
                action: "disconnect",
                message: None,
            },
        };
        info!(%group_id, %provider_id, action = body.action, "sending call command");
        self.post_command(&url, Some(&body)).await
    }

    async fn post_command<B: Serialize>(&self, url: &str, body: Option<&B>) -> Result<()> {
        let mut request = self.http_client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::CommandRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
