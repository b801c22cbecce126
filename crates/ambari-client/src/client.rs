//! `reqwest` implementation of [`AmbariApi`].

use ambari_core::{Error, ProviderConfig, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::AmbariApi;
use crate::types::{Cluster, Privilege, PrivilegeFilter, PrivilegeList};

/// Header Ambari requires on every mutating request.
pub const REQUESTED_BY_HEADER: &str = "X-Requested-By";
pub const REQUESTED_BY_VALUE: &str = "ambari";

/// Authenticated Ambari REST client. Cheap to clone; share one per
/// provider configuration.
#[derive(Clone)]
pub struct AmbariClient {
    http: reqwest::Client,
    base_url: Url,
    login: String,
    password: String,
}

impl AmbariClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| Error::Config(format!("Invalid api_url {}: {}", config.api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "api_url {} cannot be used as a base URL",
                config.api_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(REQUESTED_BY_HEADER, HeaderValue::from_static(REQUESTED_BY_VALUE));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            login: config.login.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL joined with percent-encoded path segments. Empty, `.` and
    /// `..` segments would be collapsed by URL normalisation and address a
    /// different resource, so they are rejected.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| matches!(**s, "" | "." | ".."))
        {
            return Err(Error::Validation(format!(
                "`{}` cannot be used as a resource name",
                bad
            )));
        }

        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .basic_auth(&self.login, Some(&self.password))
    }

    /// Send a request, mapping 404 to `Error::NotFound(target)` and other
    /// non-success statuses to `Error::Http`.
    async fn execute(&self, request: RequestBuilder, target: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(target.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn cluster_target(name: &str) -> String {
        format!("cluster {}", name)
    }

    fn privilege_target(cluster: &str, id: i64) -> String {
        format!("privilege {} on cluster {}", id, cluster)
    }
}

/// Decode a response body, treating an empty body as `None`.
async fn decode_optional<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let body = response
        .text()
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;
    parse_optional(&body)
}

fn parse_optional<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(body)?))
}

/// Fold the not-found sentinel into `None`.
fn found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl AmbariApi for AmbariClient {
    async fn create_cluster(&self, cluster: &Cluster) -> Result<Option<Cluster>> {
        let url = self.endpoint(&["clusters"])?;
        let target = Self::cluster_target(&cluster.cluster.cluster_name);
        let response = self
            .execute(self.request(Method::POST, url).json(cluster), &target)
            .await?;
        decode_optional(response).await
    }

    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        let url = self.endpoint(&["clusters", name])?;
        let response = found(
            self.execute(self.request(Method::GET, url), &Self::cluster_target(name))
                .await,
        )?;
        match response {
            Some(response) => decode_optional(response).await,
            None => Ok(None),
        }
    }

    async fn update_cluster(&self, old_name: &str, cluster: &Cluster) -> Result<Option<Cluster>> {
        let url = self.endpoint(&["clusters", old_name])?;
        let response = self
            .execute(
                self.request(Method::PUT, url).json(cluster),
                &Self::cluster_target(old_name),
            )
            .await?;
        decode_optional(response).await
    }

    async fn delete_cluster(&self, name: &str) -> Result<()> {
        let url = self.endpoint(&["clusters", name])?;
        self.execute(self.request(Method::DELETE, url), &Self::cluster_target(name))
            .await?;
        Ok(())
    }

    async fn create_privilege(&self, cluster: &str, privilege: &Privilege) -> Result<()> {
        let url = self.endpoint(&["clusters", cluster, "privileges"])?;
        self.execute(
            self.request(Method::POST, url).json(privilege),
            &Self::cluster_target(cluster),
        )
        .await?;
        Ok(())
    }

    async fn list_privileges(
        &self,
        cluster: &str,
        filter: &PrivilegeFilter,
    ) -> Result<Vec<Privilege>> {
        let url = self.endpoint(&["clusters", cluster, "privileges"])?;
        let response = self
            .execute(
                self.request(Method::GET, url).query(&filter.query_pairs()),
                &Self::cluster_target(cluster),
            )
            .await?;
        let list: Option<PrivilegeList> = decode_optional(response).await?;
        Ok(list.map(PrivilegeList::into_items).unwrap_or_default())
    }

    async fn get_privilege(&self, cluster: &str, id: i64) -> Result<Option<Privilege>> {
        let url = self.endpoint(&["clusters", cluster, "privileges", &id.to_string()])?;
        let response = found(
            self.execute(
                self.request(Method::GET, url),
                &Self::privilege_target(cluster, id),
            )
            .await,
        )?;
        match response {
            Some(response) => decode_optional(response).await,
            None => Ok(None),
        }
    }

    async fn update_privilege(
        &self,
        cluster: &str,
        id: i64,
        privilege: &Privilege,
    ) -> Result<()> {
        let url = self.endpoint(&["clusters", cluster, "privileges", &id.to_string()])?;
        self.execute(
            self.request(Method::PUT, url).json(privilege),
            &Self::privilege_target(cluster, id),
        )
        .await?;
        Ok(())
    }

    async fn delete_privilege(&self, cluster: &str, id: i64) -> Result<()> {
        let url = self.endpoint(&["clusters", cluster, "privileges", &id.to_string()])?;
        self.execute(
            self.request(Method::DELETE, url),
            &Self::privilege_target(cluster, id),
        )
        .await?;
        Ok(())
    }
}
