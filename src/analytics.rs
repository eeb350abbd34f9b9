//! Lead event forwarding to the Meta Conversions API.
//!
//! Forwarding is best effort. Each event is sent from its own task; the
//! handler waits for that task before answering but never looks at its
//! outcome. Failures are logged and counted, nothing more.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::metrics::ANALYTICS_FAILURES;
use crate::rate_limit::UNKNOWN_CLIENT;

pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v21.0";
pub const DEFAULT_EVENT_SOURCE_URL: &str = "https://kizento.com";

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub pixel_id: String,
    pub access_token: String,
    pub api_base: String,
    pub event_source_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("collector returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for AnalyticsError {
    fn from(err: reqwest::Error) -> Self {
        // the URL carries the access token
        AnalyticsError::Transport(err.without_url())
    }
}

// sha256 hex of the normalized address, the only form of the email that leaves the server
pub fn hash_email(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase());
    format!("{:x}", hasher.finalize())
}

// "lead_<unix millis>_<7 random chars>"
pub fn new_event_id(now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("lead_{}_{}", now.timestamp_millis(), &random[..7])
}

#[derive(Debug, Clone, Serialize)]
pub struct UserData {
    pub em: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip_address: Option<String>,
    pub client_user_agent: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadEvent {
    pub event_name: &'static str,
    pub event_time: i64,
    pub event_id: String,
    pub action_source: &'static str,
    pub event_source_url: String,
    pub user_data: UserData,
}

impl LeadEvent {
    pub fn new(
        email: &str,
        client_ip: &str,
        user_agent: &str,
        event_source_url: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let client_ip_address = (client_ip != UNKNOWN_CLIENT).then(|| client_ip.to_string());

        Self {
            event_name: "Lead",
            event_time: now.timestamp(),
            event_id: new_event_id(now),
            action_source: "website",
            event_source_url: event_source_url.to_string(),
            user_data: UserData {
                em: vec![hash_email(email)],
                client_ip_address,
                client_user_agent: user_agent.to_string(),
            },
        }
    }
}

// request body: the API takes a batch
#[derive(Debug, Serialize)]
struct EventBatch<'a> {
    data: [&'a LeadEvent; 1],
}

#[derive(Clone)]
pub struct AnalyticsForwarder {
    client: reqwest::Client,
    config: Option<AnalyticsConfig>,
}

impl AnalyticsForwarder {
    pub fn new(client: reqwest::Client, config: Option<AnalyticsConfig>) -> Self {
        Self { client, config }
    }

    pub fn disabled() -> Self {
        Self::new(reqwest::Client::new(), None)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send one lead event. Returns `Ok(())` without doing anything when disabled.
    pub async fn send_lead(&self, event: &LeadEvent) -> Result<(), AnalyticsError> {
        let Some(config) = &self.config else {
            return Ok(());
        };

        let url = format!(
            "{}/{}/events?access_token={}",
            config.api_base.trim_end_matches('/'),
            config.pixel_id,
            config.access_token
        );

        let response = self
            .client
            .post(url)
            .json(&EventBatch { data: [event] })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyticsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Spawn delivery of a lead event for a freshly inserted email.
    ///
    /// Returns `None` when forwarding is disabled. The task logs its own
    /// failure; the join handle only tells the caller when it is done.
    pub fn dispatch(&self, email: &str, client_ip: &str, user_agent: &str) -> Option<JoinHandle<()>> {
        let config = self.config.as_ref()?;
        let event = LeadEvent::new(
            email,
            client_ip,
            user_agent,
            &config.event_source_url,
            Utc::now(),
        );
        let forwarder = self.clone();

        Some(tokio::spawn(async move {
            match forwarder.send_lead(&event).await {
                Ok(()) => tracing::debug!(event_id = %event.event_id, "lead event delivered"),
                Err(e) => {
                    ANALYTICS_FAILURES.inc();
                    tracing::warn!(event_id = %event.event_id, error = %e, "lead event not delivered");
                }
            }
        }))
    }
}
