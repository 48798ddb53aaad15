//! GitLab merge requests through the REST API.

use super::{OpenRequest, ProviderError, ProviderKind, RequestProvider};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, info_span, Instrument};

/// Default API root for gitlab.com.
const GITLAB_API_URL: &str = "https://gitlab.com/api/v4";

/// `error_description` GitLab sends for an expired token.
const TOKEN_EXPIRED_DESCRIPTION: &str =
    "Token is expired. You can either do re-authorization or token refresh.";

/// Results per page for list endpoints.
const RESULTS_PER_PAGE: &str = "100";

/// Authenticated GitLab client.
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitLabClient {
    /// Builds a client for gitlab.com.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(token: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(token, GITLAB_API_URL)
    }

    /// Builds a client for a custom API root (e.g. a self-hosted instance).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pro/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// URL of a project-scoped endpoint.
    fn project_url(&self, project_path: &str, endpoint: &str) -> String {
        format!(
            "{}/projects/{}/{endpoint}",
            self.base_url,
            encode_project_path(project_path)
        )
    }

    /// Sends an authenticated GET, returning the body and the next page number.
    async fn fetch(
        &self,
        url: &str,
        query: &[(&str, &str)],
        project: &str,
    ) -> Result<(String, Option<String>), ProviderError> {
        debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let next = next_page(response.headers());
        let body = response.text().await?;
        check_status(status, &body, project)?;

        Ok((body, next))
    }

    /// Sends an authenticated GET and decodes a successful JSON body.
    async fn api_get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        project: &str,
    ) -> Result<T, ProviderError> {
        let (body, _) = self.fetch(url, query, project).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Decodes every page of a list endpoint, following `X-Next-Page`.
    async fn api_get_all<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        project: &str,
    ) -> Result<Vec<T>, ProviderError> {
        let mut items = Vec::new();
        let mut page = String::from("1");

        loop {
            let (body, next) = {
                let mut paged = query.to_vec();
                paged.push(("per_page", RESULTS_PER_PAGE));
                paged.push(("page", page.as_str()));
                self.fetch(url, &paged, project).await?
            };

            let batch: Vec<T> = serde_json::from_str(&body)?;
            items.extend(batch);

            match next {
                Some(next) => page = next,
                None => return Ok(items),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct MergeRequestResponse {
    iid: u64,
    title: String,
    state: String,
    source_branch: String,
    web_url: String,
}

impl From<MergeRequestResponse> for OpenRequest {
    fn from(mr: MergeRequestResponse) -> Self {
        Self {
            title: mr.title,
            number: mr.iid,
            state: mr.state,
            source_branch: mr.source_branch,
            web_url: mr.web_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
}

#[async_trait]
impl RequestProvider for GitLabClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    async fn verify_user(&self) -> Result<u64, ProviderError> {
        let url = format!("{}/user", self.base_url);
        let user: UserResponse = self.api_get(&url, &[], "user").await?;
        Ok(user.id)
    }

    async fn requests_for_branch(
        &self,
        project_path: &str,
        branch: &str,
    ) -> Result<Vec<OpenRequest>, ProviderError> {
        let span = info_span!("gitlab_merge_requests", project = %project_path, branch = %branch);

        async {
            info!("Looking up merge requests for branch");
            let url = self.project_url(project_path, "merge_requests");
            let query = [("state", "opened"), ("source_branch", branch)];
            let mrs: Vec<MergeRequestResponse> =
                self.api_get_all(&url, &query, project_path).await?;
            Ok(mrs.into_iter().map(OpenRequest::from).collect())
        }
        .instrument(span)
        .await
    }

    async fn list_open_requests(&self, project_path: &str) -> Result<Vec<OpenRequest>, ProviderError> {
        let span = info_span!("gitlab_list_merge_requests", project = %project_path);

        async {
            info!("Listing open merge requests");
            let url = self.project_url(project_path, "merge_requests");
            let query = [("state", "opened")];
            let mrs: Vec<MergeRequestResponse> =
                self.api_get_all(&url, &query, project_path).await?;
            debug!(count = mrs.len(), "Fetched merge requests");
            Ok(mrs.into_iter().map(OpenRequest::from).collect())
        }
        .instrument(span)
        .await
    }

    async fn list_remote_branches(&self, project_path: &str) -> Result<Vec<String>, ProviderError> {
        info!(project = %project_path, "Listing remote branches");
        let url = self.project_url(project_path, "repository/branches");
        let branches: Vec<BranchResponse> = self.api_get_all(&url, &[], project_path).await?;
        debug!(count = branches.len(), "Fetched branches");
        Ok(branches.into_iter().map(|branch| branch.name).collect())
    }
}

/// Encodes "group/sub/project" as a single path segment.
fn encode_project_path(project_path: &str) -> String {
    url::form_urlencoded::byte_serialize(project_path.as_bytes()).collect()
}

/// Page number from `X-Next-Page`; GitLab sends it empty on the last page.
fn next_page(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-next-page")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Maps a GitLab status code onto a provider error.
fn check_status(status: StatusCode, body: &str, project: &str) -> Result<(), ProviderError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED => {
            if is_token_expired(body) {
                Err(ProviderError::TokenExpired)
            } else {
                Err(ProviderError::Unauthorized)
            }
        }
        StatusCode::NOT_FOUND => Err(ProviderError::NotFound {
            project: project.to_string(),
        }),
        s => Err(ProviderError::UnknownStatus {
            status: s.as_u16(),
            body: body.to_string(),
        }),
    }
}

fn is_token_expired(body: &str) -> bool {
    #[derive(Deserialize)]
    struct ErrorBody {
        error_description: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|error| error.error_description)
        .is_some_and(|description| description == TOKEN_EXPIRED_DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `pages` as a paginated JSON list on a local port.
    ///
    /// Returns the API root to pass to [`GitLabClient::with_base_url`].
    async fn serve_pages(pages: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    let read = socket.read(&mut buffer).await.unwrap();
                    if read == 0 {
                        break;
                    }
                    request.extend_from_slice(&buffer[..read]);
                }

                let request = String::from_utf8_lossy(&request);
                let page: usize = request
                    .split(&['?', '&', ' '][..])
                    .find_map(|part| part.strip_prefix("page="))
                    .and_then(|number| number.parse().ok())
                    .unwrap_or(1);
                let body = &pages[page - 1];
                let next = if page < pages.len() {
                    (page + 1).to_string()
                } else {
                    String::new()
                };

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nX-Next-Page: {next}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
            }
        });

        format!("http://{address}/api/v4")
    }

    fn branch_page(names: impl Iterator<Item = String>) -> String {
        let branches: Vec<String> = names.map(|name| format!(r#"{{"name":"{name}"}}"#)).collect();
        format!("[{}]", branches.join(","))
    }

    #[tokio::test]
    async fn lists_branches_beyond_first_page() {
        let first = branch_page((0..100).map(|i| format!("branch-{i}")));
        let second = branch_page(["fix-1".to_string()].into_iter());
        let base_url = serve_pages(vec![first, second]).await;
        let client = GitLabClient::with_base_url("token", &base_url).unwrap();

        let branches = client.list_remote_branches("acme/widgets").await.unwrap();

        assert_eq!(branches.len(), 101);
        assert!(branches.iter().any(|name| name == "fix-1"));
    }

    #[tokio::test]
    async fn lists_merge_requests_from_every_page() {
        let merge_request = |iid: u64| {
            format!(
                r#"{{"iid":{iid},"title":"Change {iid}","state":"opened","source_branch":"b{iid}","web_url":"https://gitlab.com/acme/widgets/-/merge_requests/{iid}"}}"#
            )
        };
        let first = format!("[{},{}]", merge_request(1), merge_request(2));
        let second = format!("[{}]", merge_request(3));
        let base_url = serve_pages(vec![first, second]).await;
        let client = GitLabClient::with_base_url("token", &base_url).unwrap();

        let requests = client.list_open_requests("acme/widgets").await.unwrap();

        let numbers: Vec<u64> = requests.iter().map(|request| request.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn reads_next_page_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_page(&headers), None);

        headers.insert("x-next-page", HeaderValue::from_static(""));
        assert_eq!(next_page(&headers), None);

        headers.insert("x-next-page", HeaderValue::from_static("3"));
        assert_eq!(next_page(&headers), Some("3".to_string()));
    }

    #[test]
    fn encodes_nested_project_path() {
        assert_eq!(encode_project_path("group/sub/project"), "group%2Fsub%2Fproject");
    }

    #[test]
    fn builds_project_url() {
        let client = GitLabClient::with_base_url("token", "https://gitlab.example.com/api/v4/")
            .unwrap();
        assert_eq!(
            client.project_url("acme/widgets", "merge_requests"),
            "https://gitlab.example.com/api/v4/projects/acme%2Fwidgets/merge_requests"
        );
    }

    #[test]
    fn detects_expired_token() {
        let body = format!(
            r#"{{"error":"invalid_token","error_description":"{TOKEN_EXPIRED_DESCRIPTION}"}}"#
        );
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, &body, "acme/widgets"),
            Err(ProviderError::TokenExpired)
        ));
    }

    #[test]
    fn plain_unauthorized() {
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, r#"{"message":"401 Unauthorized"}"#, "a/b"),
            Err(ProviderError::Unauthorized)
        ));
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, "not json", "a/b"),
            Err(ProviderError::Unauthorized)
        ));
    }

    #[test]
    fn maps_not_found_and_unknown() {
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, "", "acme/widgets"),
            Err(ProviderError::NotFound { project }) if project == "acme/widgets"
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY, "oops", "acme/widgets"),
            Err(ProviderError::UnknownStatus { status: 502, .. })
        ));
        assert!(check_status(StatusCode::OK, "[]", "acme/widgets").is_ok());
    }

    #[test]
    fn decodes_merge_request() {
        let mrs: Vec<MergeRequestResponse> = serde_json::from_str(
            r#"[{
                "id": 901,
                "iid": 7,
                "title": "Fix widget alignment",
                "state": "opened",
                "source_branch": "fix-1",
                "target_branch": "main",
                "web_url": "https://gitlab.com/acme/widgets/-/merge_requests/7"
            }]"#,
        )
        .unwrap();

        let request = OpenRequest::from(mrs.into_iter().next().unwrap());
        assert_eq!(request.number, 7);
        assert_eq!(request.source_branch, "fix-1");
        assert!(request.is_open());
        assert_eq!(
            request.web_url,
            "https://gitlab.com/acme/widgets/-/merge_requests/7"
        );
    }
}
