//! HTTP transport to the peer service

use crate::config::PeerConfig;
use crate::error::PeerError;
use crate::transport::PeerTransport;
use crate::wire::{endpoint, Deletion};
use async_trait::async_trait;
use csync_model::{ProjectConditionTree, ProjectId};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// JSON-over-HTTP client for one peer
#[derive(Debug, Clone)]
pub struct HttpPeer {
    client: Client,
    base: Url,
}

/// Parse a peer base URL, normalizing it to end in `/`
///
/// # Errors
/// Returns error if `raw` is not an absolute URL that can carry a path
pub fn parse_base_url(raw: &str) -> Result<Url, PeerError> {
    let invalid = |reason: String| PeerError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let mut base = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("not a base url".to_string()));
    }
    // Relative joins only keep the last path segment with a trailing slash.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn check_status(path: &str, response: &Response) -> Result<(), PeerError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(PeerError::Status {
            endpoint: path.to_string(),
            status: status.as_u16(),
        })
    }
}

impl HttpPeer {
    /// Create new client from configuration
    ///
    /// # Errors
    /// Returns error if the base URL does not parse or the client cannot be
    /// built
    pub fn new(config: &PeerConfig) -> Result<Self, PeerError> {
        let base = parse_base_url(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|source| PeerError::Transport {
                endpoint: base.to_string(),
                source,
            })?;

        Ok(Self { client, base })
    }

    /// Base URL requests are resolved against
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, PeerError> {
        self.base.join(path).map_err(|e| PeerError::InvalidUrl {
            url: format!("{}{path}", self.base),
            reason: e.to_string(),
        })
    }

    async fn post_json<B>(&self, path: &str, body: &B) -> Result<(), PeerError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path)?;
        debug!(endpoint = path, "posting to peer");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| PeerError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        check_status(path, &response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PeerError> {
        let url = self.url(path)?;
        debug!(endpoint = path, "fetching from peer");

        let transport = |source| PeerError::Transport {
            endpoint: path.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        check_status(path, &response)?;
        response.json::<T>().await.map_err(transport)
    }
}

#[async_trait]
impl PeerTransport for HttpPeer {
    async fn push_changes(&self, trees: Vec<ProjectConditionTree>) -> Result<(), PeerError> {
        self.post_json(endpoint::CONDITIONS_CHANGED, &trees).await
    }

    async fn push_deletion(&self, deletion: Deletion) -> Result<(), PeerError> {
        let path = deletion.endpoint();
        match &deletion {
            Deletion::Conditions(body) => self.post_json(path, body).await,
            Deletion::Documents(body) => self.post_json(path, body).await,
            Deletion::Pages(body) => self.post_json(path, body).await,
            Deletion::Zones(body) => self.post_json(path, body).await,
        }
    }

    async fn fetch_project_ids(&self) -> Result<Vec<ProjectId>, PeerError> {
        self.get_json(endpoint::PROJECTS).await
    }

    async fn fetch_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectConditionTree>, PeerError> {
        self.get_json(&endpoint::project_conditions(project_id)).await
    }
}
