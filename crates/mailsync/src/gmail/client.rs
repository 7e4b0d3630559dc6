//! Gmail API HTTP client
//!
//! Lists unread inbox messages, fetches them in full and clears their
//! `UNREAD` label. Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::Arc;
use url::Url;

use super::api::{GmailMessage, ListMessagesResponse, ModifyMessageRequest};
use super::normalize_message;
use crate::error::SyncError;
use crate::google::{self, ApiError, GoogleAuth};
use crate::models::{MessageId, MessageRecord};
use crate::retry::RetryPolicy;
use crate::sync::MessageSource;

/// Label IDs used by Gmail
mod labels {
    pub const INBOX: &str = "INBOX";
    pub const UNREAD: &str = "UNREAD";
}

/// Gmail API client
pub struct GmailClient {
    auth: Arc<GoogleAuth>,
    retry: RetryPolicy,
}

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Create a new Gmail client
    pub fn new(auth: Arc<GoogleAuth>, retry: RetryPolicy) -> Self {
        Self { auth, retry }
    }

    fn access_token(&self) -> Result<String> {
        self.auth
            .get_access_token()
            .map_err(|e| ApiError::Auth(e).into())
    }

    /// List unread message IDs in the inbox, newest first
    ///
    /// # Arguments
    /// * `max_results` - Maximum number of messages to return (1-500)
    pub fn list_unread(&self, max_results: usize) -> Result<ListMessagesResponse> {
        let access_token = self.access_token()?;

        let mut url = Url::parse(&format!("{}/users/me/messages", Self::BASE_URL))
            .context("Invalid Gmail list URL")?;
        url.query_pairs_mut()
            .append_pair("labelIds", labels::INBOX)
            .append_pair("q", "is:unread")
            .append_pair("maxResults", &max_results.clamp(1, 500).to_string());

        let mut response = ureq::get(url.as_str())
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .map_err(|e| ApiError::from_ureq("gmail.messages.list", e))
            .context("Failed to send list messages request")?;

        let list: ListMessagesResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse list messages response")?;

        Ok(list)
    }

    /// Get full message details by ID
    pub fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        let access_token = self.access_token()?;

        let url = format!(
            "{}/users/me/messages/{}?format=full",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );

        let mut response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .map_err(|e| ApiError::from_ureq("gmail.messages.get", e))
            .context("Failed to send get message request")?;

        let message: GmailMessage = response
            .body_mut()
            .read_json()
            .context("Failed to parse message response")?;

        Ok(message)
    }

    /// Mark a message as read by removing its UNREAD label
    ///
    /// Removing a label the message no longer has is accepted by Gmail, so
    /// repeating this call is harmless.
    pub fn mark_read(&self, id: &MessageId) -> Result<()> {
        let access_token = self.access_token()?;

        let url = format!(
            "{}/users/me/messages/{}/modify",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );

        ureq::post(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .send_json(ModifyMessageRequest {
                remove_label_ids: &[labels::UNREAD],
            })
            .map_err(|e| ApiError::from_ureq("gmail.messages.modify", e))
            .context("Failed to send modify message request")?;

        debug!("Marked message {} as read", id);
        Ok(())
    }
}

impl MessageSource for GmailClient {
    fn list_unread_ids(&self, limit: usize) -> Result<Vec<MessageId>, SyncError> {
        let list = self
            .retry
            .run(|| self.list_unread(limit), google::is_transient)
            .map_err(SyncError::SourceUnavailable)?;

        let ids: Vec<MessageId> = list
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| MessageId::new(m.id))
            .collect();

        info!(
            "Fetched {} unread message IDs (estimate {})",
            ids.len(),
            list.result_size_estimate.unwrap_or(0)
        );
        Ok(ids)
    }

    fn fetch_and_parse(&self, id: &MessageId) -> Result<MessageRecord, SyncError> {
        let message = self
            .retry
            .run(|| self.get_message(id), google::is_transient)
            .map_err(|e| {
                // Connectivity and credential problems affect every message
                if google::is_service_failure(&e) {
                    SyncError::SourceUnavailable(e)
                } else {
                    SyncError::MessageFetch {
                        id: id.clone(),
                        source: e,
                    }
                }
            })?;

        normalize_message(message).map_err(|source| SyncError::MessageFetch {
            id: id.clone(),
            source,
        })
    }

    fn mark_processed(&self, id: &MessageId) -> Result<(), SyncError> {
        self.retry
            .run(|| self.mark_read(id), google::is_transient)
            .map_err(|source| SyncError::MarkProcessed {
                id: id.clone(),
                source,
            })
    }
}
