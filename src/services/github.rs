// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub API client for repository metadata and OAuth.
//!
//! Handles:
//! - OAuth code exchange and profile lookup
//! - Repository search across all pages of the user's repositories
//! - Repository detail with commit statistics
//! - Concurrent multi-repository fetches with per-repository failures

use std::sync::LazyLock;
use std::time::Duration;

use futures_util::future::join_all;
use regex::Regex;
use reqwest::header::{ACCEPT, LINK};
use serde::Deserialize;

use crate::config::{Config, OAUTH_CALLBACK_URL, OAUTH_SCOPE};
use crate::db::SqliteDb;
use crate::error::AppError;
use crate::models::{
    AggregateReport, GitHubProfile, GithubStats, RepoDetail, RepoFailure, RepoSummary,
};
use crate::services::auth::{AuthState, AuthStatus, AuthStore};

const USER_AGENT: &str = concat!("project-tracker/", env!("CARGO_PKG_VERSION"));

/// Page size for listing the user's repositories.
pub const REPO_PAGE_SIZE: usize = 100;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

static REPO_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([^/?#]+)/([^/?#]+)").expect("valid regex"));

/// Low-level GitHub HTTP client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
}

impl GitHubClient {
    /// Create a client; `timeout` bounds every request.
    pub fn new(api_url: &str, oauth_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            oauth_url: oauth_url.trim_end_matches('/').to_string(),
        })
    }

    /// Consent-screen URL for the given OAuth client.
    pub fn authorize_url(&self, client_id: &str) -> String {
        format!(
            "{}/login/oauth/authorize?client_id={}&redirect_uri={}&scope={}",
            self.oauth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(OAUTH_CALLBACK_URL),
            urlencoding::encode(OAUTH_SCOPE),
        )
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<String, AppError> {
        let body = serde_json::json!({
            "client_id": client_id,
            "client_secret": client_secret,
            "code": code,
            "redirect_uri": OAUTH_CALLBACK_URL,
        });

        let response = self
            .http
            .post(format!("{}/login/oauth/access_token", self.oauth_url))
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        let token: TokenExchangeResponse = self.check_response_json(response).await?;

        if let Some(error) = token.error {
            tracing::warn!(error = %error, "GitHub rejected the authorization code");
            return Err(AppError::AuthorizationRejected(
                token.error_description.unwrap_or(error),
            ));
        }

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::AuthorizationRejected("No access token received".to_string()))
    }

    /// Get the authenticated user's profile.
    pub async fn get_user(&self, access_token: &str) -> Result<GitHubUser, AppError> {
        let url = format!("{}/user", self.api_url);
        let response = self
            .get(&url, Some(access_token))
            .send()
            .await
            .map_err(AppError::from_reqwest)?;
        self.check_response_json(response).await
    }

    /// One page of repositories the user owns or collaborates on.
    pub async fn list_repos_page(
        &self,
        access_token: &str,
        page: u32,
    ) -> Result<Vec<GitHubRepo>, AppError> {
        let url = format!("{}/user/repos", self.api_url);
        let response = self
            .get(&url, Some(access_token))
            .query(&[
                ("per_page", REPO_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
                ("sort", "updated".to_string()),
                ("affiliation", "owner,collaborator".to_string()),
            ])
            .send()
            .await
            .map_err(AppError::from_reqwest)?;
        self.check_response_json(response).await
    }

    /// Get repository metadata; anonymous when `access_token` is `None`.
    pub async fn get_repo(
        &self,
        access_token: Option<&str>,
        owner: &str,
        repo: &str,
    ) -> Result<GitHubRepo, AppError> {
        let url = format!(
            "{}/repos/{}/{}",
            self.api_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        let response = self
            .get(&url, access_token)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;
        self.check_response_json(response).await
    }

    /// One commit per page on `branch`, optionally at a given page.
    pub async fn list_commits(
        &self,
        access_token: Option<&str>,
        owner: &str,
        repo: &str,
        branch: &str,
        page: Option<u32>,
    ) -> Result<CommitPage, AppError> {
        let url = format!(
            "{}/repos/{}/{}/commits",
            self.api_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );

        let mut query = vec![("per_page", "1".to_string()), ("sha", branch.to_string())];
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }

        let response = self
            .get(&url, access_token)
            .query(&query)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        let last_page = response
            .headers()
            .get(LINK)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_last_page);

        let commits = self.check_response_json(response).await?;
        Ok(CommitPage { commits, last_page })
    }

    fn get(&self, url: &str, access_token: Option<&str>) -> reqwest::RequestBuilder {
        let request = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check response status and parse the JSON body.
    ///
    /// Non-2xx responses keep the status code and GitHub's `message`.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GitHubErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                });

            if status.as_u16() == 403 || status.as_u16() == 429 {
                tracing::warn!(status = %status, "GitHub rate limit or permission error");
            }

            return Err(AppError::RemoteApi {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(AppError::from_reqwest)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

/// User from `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

impl From<GitHubUser> for GitHubProfile {
    fn from(user: GitHubUser) -> Self {
        GitHubProfile {
            login: user.login,
            name: user.name,
            avatar_url: user.avatar_url,
            email: user.email,
        }
    }
}

/// Repository from `GET /repos/{owner}/{repo}` and `GET /user/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub description: Option<String>,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub open_issues_count: u32,
    pub language: Option<String>,
    pub default_branch: String,
    pub updated_at: String,
    pub html_url: String,
    pub private: bool,
}

impl From<GitHubRepo> for RepoSummary {
    fn from(repo: GitHubRepo) -> Self {
        RepoSummary {
            full_name: full_name_from_url(&repo.html_url),
            name: repo.name,
            description: repo.description,
            url: repo.html_url,
            private: repo.private,
            language: repo.language,
            stars: repo.stargazers_count,
            updated_at: repo.updated_at,
        }
    }
}

/// Commit from `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommit {
    commit: GitCommitData,
}

#[derive(Debug, Clone, Deserialize)]
struct GitCommitData {
    author: Option<GitActor>,
    committer: Option<GitActor>,
}

#[derive(Debug, Clone, Deserialize)]
struct GitActor {
    date: Option<String>,
}

impl GitHubCommit {
    /// Author date, falling back to the committer date.
    pub fn date(&self) -> Option<&str> {
        self.commit
            .author
            .as_ref()
            .and_then(|a| a.date.as_deref())
            .or_else(|| self.commit.committer.as_ref().and_then(|c| c.date.as_deref()))
    }
}

/// A page of commits plus the `rel="last"` page number, if paginated.
#[derive(Debug, Clone)]
pub struct CommitPage {
    pub commits: Vec<GitHubCommit>,
    pub last_page: Option<u32>,
}

/// Commit history summary for one branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitStats {
    pub commit_count: u32,
    pub first_commit: Option<String>,
    pub last_commit: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// GitHubService - High-level service backed by the stored authorization
// ─────────────────────────────────────────────────────────────────────────────

/// GitHub operations on behalf of the (single) local user.
#[derive(Clone)]
pub struct GitHubService {
    client: GitHubClient,
    auth: AuthStore,
    config: Config,
}

impl GitHubService {
    pub fn new(config: &Config, db: SqliteDb) -> Result<Self, AppError> {
        Ok(Self {
            client: GitHubClient::new(
                &config.github_api_url,
                &config.github_oauth_url,
                config.http_timeout,
            )?,
            auth: AuthStore::new(db),
            config: config.clone(),
        })
    }

    // ─── Authorization ───────────────────────────────────────────────────────

    /// URL of GitHub's consent screen.
    pub fn authorization_url(&self) -> Result<String, AppError> {
        let client_id = self.config.github_client_id.as_deref().ok_or_else(|| {
            AppError::Config(
                "GitHub OAuth is not configured. Please set GITHUB_CLIENT_ID environment variable."
                    .to_string(),
            )
        })?;
        Ok(self.client.authorize_url(client_id))
    }

    /// Exchange `code`, look up the user, and store the authorization.
    pub async fn handle_oauth_callback(&self, code: &str) -> Result<GitHubProfile, AppError> {
        let (client_id, client_secret) = self.config.oauth_credentials()?;

        tracing::info!("Exchanging authorization code for token");
        let access_token = self
            .client
            .exchange_code(client_id, client_secret, code)
            .await?;

        let profile = GitHubProfile::from(self.client.get_user(&access_token).await?);
        self.auth.save(&access_token, &profile).await?;

        tracing::info!(login = %profile.login, "OAuth successful, token and profile stored");
        Ok(profile)
    }

    pub async fn auth_state(&self) -> Result<AuthState, AppError> {
        self.auth.load().await
    }

    pub async fn status(&self) -> Result<AuthStatus, AppError> {
        Ok(self.auth.load().await?.status())
    }

    /// Remove the stored authorization. Idempotent.
    pub async fn disconnect(&self) -> Result<(), AppError> {
        self.auth.clear().await
    }

    // ─── Repository Metadata ─────────────────────────────────────────────────

    /// All of the user's repositories whose name or description contains
    /// `query` (case-insensitive). Requires a stored token.
    pub async fn search_repositories(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<RepoSummary>, AppError> {
        let token = self
            .auth
            .access_token()
            .await?
            .ok_or(AppError::Unauthenticated)?;

        let mut repos = Vec::new();
        let mut page = 1u32;
        loop {
            let batch = self.client.list_repos_page(&token, page).await?;
            let done = batch.len() < REPO_PAGE_SIZE;
            repos.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        tracing::debug!(total = repos.len(), pages = page, "Fetched user repositories");

        Ok(filter_repos(repos, query)
            .into_iter()
            .map(RepoSummary::from)
            .collect())
    }

    /// Metadata and commit statistics for one repository URL.
    pub async fn fetch_repository(&self, url: &str) -> Result<RepoDetail, AppError> {
        let token = self.auth.access_token().await?;
        self.fetch_repository_with(url, token.as_deref()).await
    }

    /// Fetch several repositories concurrently and aggregate the successes.
    ///
    /// A failing repository is reported in `failures` and never affects the
    /// others.
    pub async fn fetch_repositories(&self, urls: &[String]) -> Result<AggregateReport, AppError> {
        let token = self.auth.access_token().await?;
        let token = token.as_deref();

        let results = join_all(urls.iter().map(|url| async move {
            (url, self.fetch_repository_with(url, token).await)
        }))
        .await;

        let mut repositories = Vec::new();
        let mut failures = Vec::new();
        let mut saw_not_found = false;

        for (url, result) in results {
            match result {
                Ok(detail) => repositories.push(detail),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Repository fetch failed");
                    saw_not_found |= e.is_remote_not_found();
                    failures.push(RepoFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(AggregateReport {
            stats: GithubStats::from_repositories(&repositories),
            partial: !failures.is_empty() && !repositories.is_empty(),
            maybe_private: saw_not_found && token.is_none(),
            repositories,
            failures,
        })
    }

    async fn fetch_repository_with(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<RepoDetail, AppError> {
        let (owner, name) = parse_repo_url(url)?;

        tracing::debug!(
            owner = %owner,
            repo = %name,
            authenticated = token.is_some(),
            "Fetching repository"
        );

        let repo = self.client.get_repo(token, &owner, &name).await?;
        let stats = self
            .estimate_commit_stats(token, &owner, &name, &repo.default_branch)
            .await?;

        Ok(RepoDetail {
            name: repo.name,
            description: repo.description,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            open_issues: repo.open_issues_count,
            language: repo.language,
            default_branch: repo.default_branch,
            first_commit: stats.first_commit,
            last_commit: stats.last_commit.or(Some(repo.updated_at)),
            commit_count: stats.commit_count,
            url: repo.html_url,
            private: repo.private,
        })
    }

    /// Commit count and first/last commit dates on `branch`.
    ///
    /// Requests one commit per page: the `rel="last"` page number is the
    /// commit count and that page holds the oldest commit. Without
    /// pagination the single page is the whole history. GitHub refusing the
    /// listing (e.g. an empty repository) yields empty stats.
    pub async fn estimate_commit_stats(
        &self,
        token: Option<&str>,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<CommitStats, AppError> {
        let head = match self.client.list_commits(token, owner, repo, branch, None).await {
            Ok(page) => page,
            Err(e @ AppError::RemoteApi { .. }) => {
                tracing::info!(owner, repo, error = %e, "Commit history unavailable");
                return Ok(CommitStats::default());
            }
            Err(e) => return Err(e),
        };

        let latest = head.commits.first().and_then(|c| c.date()).map(str::to_string);

        match head.last_page {
            Some(last_page) if last_page > 1 => {
                let oldest = match self
                    .client
                    .list_commits(token, owner, repo, branch, Some(last_page))
                    .await
                {
                    Ok(page) => page.commits.first().and_then(|c| c.date()).map(str::to_string),
                    Err(AppError::RemoteApi { status, .. }) => {
                        tracing::info!(owner, repo, status, "Oldest commit page unavailable");
                        None
                    }
                    Err(e) => return Err(e),
                };

                Ok(CommitStats {
                    commit_count: last_page,
                    first_commit: oldest,
                    last_commit: latest,
                })
            }
            _ => Ok(CommitStats {
                commit_count: head.commits.len() as u32,
                first_commit: latest.clone(),
                last_commit: latest,
            }),
        }
    }
}

/// Extract `(owner, repo)` from a GitHub repository URL.
pub fn parse_repo_url(url: &str) -> Result<(String, String), AppError> {
    let invalid = || AppError::InvalidUrl(url.to_string());

    let captures = REPO_URL_RE.captures(url).ok_or_else(invalid)?;
    let owner = captures[1].to_string();
    let repo = captures[2].trim_end_matches(".git").to_string();

    if repo.is_empty() {
        return Err(invalid());
    }
    Ok((owner, repo))
}

/// Page number of the `rel="last"` entry of a `Link` header.
pub fn parse_last_page(link: &str) -> Option<u32> {
    link.split(',')
        .find(|entry| entry.contains("rel=\"last\""))
        .and_then(|entry| {
            let start = entry.find('<')? + 1;
            let end = entry[start..].find('>')? + start;
            let target = &entry[start..end];
            let query = target.split_once('?')?.1;
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
}

/// `owner/name` from the last two path segments of a repository URL.
fn full_name_from_url(html_url: &str) -> String {
    let mut segments = html_url.trim_end_matches('/').rsplit('/');
    match (segments.next(), segments.next()) {
        (Some(name), Some(owner)) => format!("{}/{}", owner, name),
        _ => html_url.to_string(),
    }
}

/// Keep repositories whose name or description contains the trimmed,
/// lowercased query. A blank query keeps everything.
fn filter_repos(repos: Vec<GitHubRepo>, query: Option<&str>) -> Vec<GitHubRepo> {
    let needle = match query.map(|q| q.trim().to_lowercase()) {
        Some(q) if !q.is_empty() => q,
        _ => return repos,
    };

    repos
        .into_iter()
        .filter(|repo| {
            repo.name.to_lowercase().contains(&needle)
                || repo
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}
