use crate::config::GerritConfig;
use crate::gerrit::api::{BranchInfo, ChangeInfo};
use crate::gerrit::client::{GerritClient, GerritError, strip_xssi_prefix};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gerrit REST client using HTTP basic authentication against the `/a/` API
pub struct RestGerritClient {
    base_url: Option<String>,
    username: String,
    password: Option<String>,
    http_client: Client,
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for RestGerritClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestGerritClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

impl RestGerritClient {
    /// Build a client from the `[gerrit]` config section
    ///
    /// A missing host is not an error here; every request then fails with
    /// [`GerritError::HostNotConfigured`].
    pub fn new(config: &GerritConfig) -> Result<Self, GerritError> {
        Self::build(
            config.rest_base_url(),
            config.username.clone(),
            config.http_password(),
        )
    }

    /// Build a client for an explicit API root such as `http://host:8080/a/`
    pub fn with_base_url(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Result<Self, GerritError> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self::build(Some(base_url), username.into(), password)
    }

    fn build(
        base_url: Option<String>,
        username: String,
        password: Option<String>,
    ) -> Result<Self, GerritError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            base_url,
            username,
            password,
            http_client,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GerritError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(GerritError::HostNotConfigured)?;
        let url = format!("{}{}", base_url, path);
        debug!("GET {} {:?}", url, query);

        let mut request = self
            .http_client
            .get(&url)
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, self.password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GerritError::ApiError {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        Ok(serde_json::from_str(strip_xssi_prefix(&body))?)
    }
}

#[async_trait]
impl GerritClient for RestGerritClient {
    async fn open_changes(
        &self,
        project: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ChangeInfo>, GerritError> {
        let mut query = vec![("q", format!("status:open project:{}", project))];
        if let Some(limit) = limit {
            query.push(("n", limit.to_string()));
        }
        self.get("changes/", &query).await
    }

    async fn change_with_current_revision(&self, change: u64) -> Result<ChangeInfo, GerritError> {
        let query = [
            ("q", change.to_string()),
            ("o", "CURRENT_REVISION".to_string()),
        ];
        let changes: Vec<ChangeInfo> = self.get("changes/", &query).await?;
        changes
            .into_iter()
            .next()
            .ok_or_else(|| GerritError::InvalidResponse(format!("No change found for {}", change)))
    }

    async fn branches(&self, project: &str) -> Result<Vec<BranchInfo>, GerritError> {
        let path = format!("projects/{}/branches/", urlencoding::encode(project));
        self.get(&path, &[]).await
    }

    async fn review(&self, change_id: &str, revision: &str) -> Result<ChangeInfo, GerritError> {
        let path = format!(
            "changes/{}/revisions/{}/review",
            urlencoding::encode(change_id),
            urlencoding::encode(revision)
        );
        self.get(&path, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RestGerritClient {
        RestGerritClient::with_base_url(
            format!("{}/a/", server.uri()),
            "jdoe",
            Some("secret".to_string()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_changes_strips_guard_and_authenticates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/changes/"))
            .and(query_param("q", "status:open project:demo"))
            .and(query_param("n", "5"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                ")]}'\n[{\"_number\": 12345, \"subject\": \"Fix it\", \"change_id\": \"I01\"}]",
            ))
            .mount(&server)
            .await;

        let changes = client(&server).open_changes("demo", Some(5)).await.unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].number, 12345);
        assert_eq!(changes[0].subject, "Fix it");
    }

    #[tokio::test]
    async fn test_change_with_current_revision() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/changes/"))
            .and(query_param("q", "12345"))
            .and(query_param("o", "CURRENT_REVISION"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                ")]}'\n[{\"_number\": 12345, \"current_revision\": \"abc\", \"revisions\": {\"abc\": {\"_number\": 4}}}]",
            ))
            .mount(&server)
            .await;

        let change = client(&server).change_with_current_revision(12345).await.unwrap();
        assert_eq!(change.current_patch_set(), Some(4));
    }

    #[tokio::test]
    async fn test_branches_encode_project() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/projects/platform%2Fcore/branches/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                ")]}'\n[{\"ref\": \"HEAD\"}, {\"ref\": \"refs/heads/main\", \"revision\": \"abc\"}]",
            ))
            .mount(&server)
            .await;

        let branches = client(&server).branches("platform/core").await.unwrap();
        let heads: Vec<_> = branches.iter().filter_map(|b| b.head_name()).collect();
        assert_eq!(heads, vec!["main"]);
    }

    #[tokio::test]
    async fn test_review() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/changes/platform%2Fcore~main~I01/revisions/abc/review"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                ")]}'\n{\"project\": \"demo\", \"branch\": \"main\", \"_number\": 7, \"current_revision\": \"abc\", \"revisions\": {\"abc\": {\"_number\": 2}}}",
            ))
            .mount(&server)
            .await;

        let review = client(&server).review("platform/core~main~I01", "abc").await.unwrap();
        assert_eq!(review.project, "demo");
        assert_eq!(review.current_patch_set(), Some(2));
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let result = client(&server).branches("demo").await;
        match result {
            Err(GerritError::ApiError { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Unauthorized");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(")]}'\nnot json"))
            .mount(&server)
            .await;

        let result = client(&server).open_changes("demo", None).await;
        assert!(matches!(result, Err(GerritError::JsonError(_))));
    }

    #[tokio::test]
    async fn test_host_not_configured() {
        let config = crate::config::Config::default_config();
        let client = RestGerritClient::new(&config.gerrit).unwrap();

        let result = client.open_changes("demo", None).await;
        assert!(matches!(result, Err(GerritError::HostNotConfigured)));
    }
}
