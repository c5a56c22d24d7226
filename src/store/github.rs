//! GitHub content store
//!
//! - contents API: document read (base64 + blob sha) and CAS write
//! - git refs API: branch tip lookup and branch creation
//! - pulls API: review requests
//!
//! The blob sha is the version token. The contents API's entity tag is
//! kept alongside it for `If-None-Match` revalidation.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, ETAG, IF_NONE_MATCH};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    CommitterIdentity, ContentStore, FetchOutcome, PutReceipt, PutRequest, ReviewRequest,
};
use crate::errors::{CatalogError, CatalogResult, CommitStep};
use crate::model::{Revision, VersionToken};

const GITHUB_JSON: &str = "application/vnd.github+json";

/// `owner/repo` identity of the backing repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        match raw.trim().split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(CatalogError::Config(format!(
                "repository must look like 'owner/repo' (got '{}')",
                raw
            ))),
        }
    }
}

/// [`ContentStore`] backed by the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubStore {
    client: Client,
    api_base: String,
    coordinates: RepoCoordinates,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: Option<ShaRef>,
    commit: Option<ShaRef>,
}

#[derive(Debug, Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ShaRef,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<&'a CommitterIdentity>,
}

impl GitHubStore {
    pub fn new(
        api_base: impl Into<String>,
        coordinates: RepoCoordinates,
        token: Option<String>,
    ) -> CatalogResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("catalogd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            coordinates,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn repo_url(&self, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.coordinates.owner, self.coordinates.repo, rest
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(ACCEPT, GITHUB_JSON);
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("token {}", token)),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder, step: CommitStep) -> CatalogResult<Response> {
        builder.send().await.map_err(|e| {
            CatalogError::upstream(step, e.status().map(|s| s.as_u16()), e.to_string())
        })
    }

    /// Turns a non-success response into an upstream error carrying the body.
    async fn ensure_success(response: Response, step: CommitStep) -> CatalogResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        Err(CatalogError::upstream(step, Some(status.as_u16()), detail))
    }

    async fn json<T: for<'de> Deserialize<'de>>(
        response: Response,
        step: CommitStep,
    ) -> CatalogResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::upstream(step, None, format!("unexpected response: {}", e)))
    }

    /// Files over the contents API's inline limit come back without a body.
    async fn download(&self, url: &str) -> CatalogResult<Vec<u8>> {
        let request = self.authorized(self.client.get(url));
        let response = Self::send(request, CommitStep::FetchDocument).await?;
        let response = Self::ensure_success(response, CommitStep::FetchDocument).await?;
        let bytes = response.bytes().await.map_err(|e| {
            CatalogError::upstream(CommitStep::FetchDocument, None, e.to_string())
        })?;
        Ok(bytes.to_vec())
    }
}

/// 422 bodies that mean the supplied blob sha is no longer current.
fn is_sha_mismatch(body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    body.contains("does not match") || (body.contains("sha") && body.contains("wasn't supplied"))
}

#[async_trait]
impl ContentStore for GitHubStore {
    async fn fetch(
        &self,
        branch: &str,
        path: &str,
        known: Option<&Revision>,
    ) -> CatalogResult<FetchOutcome> {
        let step = CommitStep::FetchDocument;
        let mut request = self
            .authorized(self.client.get(self.repo_url(&format!("contents/{}", path))))
            .query(&[("ref", branch)]);
        if let Some(etag) = known.and_then(|k| k.etag.as_deref()) {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = Self::send(request, step).await?;
        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        let response = Self::ensure_success(response, step).await?;
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: ContentsResponse = Self::json(response, step).await?;

        let bytes = match body.encoding.as_deref() {
            Some("base64") if !body.content.is_empty() => {
                let packed: String = body.content.split_whitespace().collect();
                STANDARD
                    .decode(packed)
                    .map_err(|e| CatalogError::Decode(format!("base64 content: {}", e)))?
            }
            _ => match &body.download_url {
                Some(url) => self.download(url).await?,
                None => Vec::new(),
            },
        };

        Ok(FetchOutcome::Fetched {
            bytes,
            revision: Revision::new(VersionToken::new(body.sha)).with_etag(etag),
        })
    }

    async fn put(&self, request: PutRequest) -> CatalogResult<PutReceipt> {
        let step = CommitStep::WriteDocument;
        let body = PutBody {
            message: &request.message,
            content: STANDARD.encode(&request.content),
            sha: request.expected.as_str(),
            branch: &request.branch,
            committer: request.committer.as_ref(),
        };
        let builder = self
            .authorized(
                self.client
                    .put(self.repo_url(&format!("contents/{}", request.path))),
            )
            .json(&body);

        let response = Self::send(builder, step).await?;
        match response.status() {
            StatusCode::CONFLICT => return Err(CatalogError::Conflict { step }),
            StatusCode::UNPROCESSABLE_ENTITY => {
                let detail = response.text().await.unwrap_or_default();
                if is_sha_mismatch(&detail) {
                    return Err(CatalogError::Conflict { step });
                }
                return Err(CatalogError::upstream(step, Some(422), detail));
            }
            _ => {}
        }
        let response = Self::ensure_success(response, step).await?;
        let receipt: PutResponse = Self::json(response, step).await?;

        let version = receipt
            .content
            .map(|c| VersionToken::new(c.sha))
            .unwrap_or_else(|| VersionToken::from_content(&request.content));
        Ok(PutReceipt {
            commit: receipt.commit.map(|c| c.sha),
            version,
        })
    }

    async fn branch_tip(&self, branch: &str) -> CatalogResult<String> {
        let step = CommitStep::ResolveTip;
        let request = self.authorized(
            self.client
                .get(self.repo_url(&format!("git/ref/heads/{}", branch))),
        );
        let response = Self::send(request, step).await?;
        let response = Self::ensure_success(response, step).await?;
        let reference: RefResponse = Self::json(response, step).await?;
        Ok(reference.object.sha)
    }

    async fn create_branch(&self, name: &str, from: &str) -> CatalogResult<()> {
        let step = CommitStep::CreateBranch;
        let request = self
            .authorized(self.client.post(self.repo_url("git/refs")))
            .json(&json!({ "ref": format!("refs/heads/{}", name), "sha": from }));
        let response = Self::send(request, step).await?;
        Self::ensure_success(response, step).await?;
        Ok(())
    }

    async fn open_review(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> CatalogResult<ReviewRequest> {
        let step = CommitStep::OpenReview;
        let request = self
            .authorized(self.client.post(self.repo_url("pulls")))
            .json(&json!({ "title": title, "head": head, "base": base, "body": body }));
        let response = Self::send(request, step).await?;
        let response = Self::ensure_success(response, step).await?;
        let pull: PullResponse = Self::json(response, step).await?;
        Ok(ReviewRequest {
            number: pull.number,
            url: pull.html_url,
        })
    }
}
