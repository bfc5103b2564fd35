//! Live session details and the credentials handed out for it

use crate::utils::PreconditionViolation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an encoder should push and where viewers can watch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamCredentials {
    /// Secret key identifying the stream
    pub stream_key: String,

    /// `<ingest base>/<stream key>`
    pub ingest_url: String,

    /// Public share link, when a watch base is configured
    pub watch_url: Option<String>,
}

impl StreamCredentials {
    /// Mint a fresh stream key
    pub fn mint(ingest_base_url: &str, watch_base_url: Option<&str>) -> Self {
        let stream_key = Uuid::new_v4().to_string();
        let ingest_url = format!("{}/{}", ingest_base_url.trim_end_matches('/'), stream_key);
        let watch_url = watch_base_url.map(|base| {
            format!(
                "{}/watch?key={}",
                base.trim_end_matches('/'),
                urlencoding::encode(&stream_key)
            )
        });

        Self {
            stream_key,
            ingest_url,
            watch_url,
        }
    }
}

/// Title and category entered for a live session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveDetails {
    pub title: String,
    pub category: Option<String>,
}

impl LiveDetails {
    /// Trim both fields. The title is required; a blank category is none.
    pub fn parse(title: &str, category: &str) -> Result<Self, PreconditionViolation> {
        let title = title.trim();
        if title.is_empty() {
            return Err(PreconditionViolation::EmptyTitle);
        }
        let category = category.trim();

        Ok(Self {
            title: title.to_string(),
            category: (!category.is_empty()).then(|| category.to_string()),
        })
    }
}

/// An active live session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    pub title: String,
    pub category: Option<String>,
    pub credentials: StreamCredentials,
    pub started_at: DateTime<Utc>,
}

impl LiveSession {
    /// Begin a session now with already validated details
    pub fn start(details: LiveDetails, credentials: StreamCredentials) -> Self {
        Self {
            title: details.title,
            category: details.category,
            credentials,
            started_at: Utc::now(),
        }
    }
}
