// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub REST client implementation.

use std::path::Path;

use futures::StreamExt;
use pushdeploy_common_core::ProjectRef;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument, trace};

use crate::config::GithubConfig;
use crate::error::GithubError;
use crate::types::{
	ApiMessage, Hook, HookRequest, HookRequestConfig, Release, RepositoryInfo, Tag, User,
};

const ACCEPT: &str = "application/vnd.github.v3+json";
const PER_PAGE: usize = 100;

/// Client for the subset of the GitHub API used by deployments.
#[derive(Debug, Clone)]
pub struct GithubClient {
	http_client: Client,
	config: GithubConfig,
}

/// Percent-encode each `/`-separated segment of a ref, keeping the slashes.
pub fn encode_ref(git_ref: &str) -> String {
	git_ref
		.split('/')
		.map(|segment| urlencoding::encode(segment).into_owned())
		.collect::<Vec<_>>()
		.join("/")
}

fn map_send_error(e: reqwest::Error) -> GithubError {
	if e.is_timeout() {
		error!("Request timed out");
		return GithubError::Timeout;
	}
	error!(error = %e, "Network error during GitHub request");
	GithubError::Network(e)
}

/// Turn a non-success response into the matching error.
async fn error_for_response(response: Response) -> GithubError {
	let status = response.status().as_u16();
	let body = response.text().await.unwrap_or_default();
	let message = serde_json::from_str::<ApiMessage>(&body)
		.map(|m| m.message)
		.unwrap_or(body);

	match status {
		401 => {
			error!(status, "GitHub rejected the token");
			GithubError::Unauthorized
		}
		429 => {
			error!(status, "GitHub rate limit exceeded");
			GithubError::RateLimited
		}
		403 if message.to_lowercase().contains("rate limit") => {
			error!(status, "GitHub rate limit exceeded");
			GithubError::RateLimited
		}
		_ => {
			error!(status, message = %message, "GitHub API error");
			GithubError::api_error(status, message)
		}
	}
}

impl GithubClient {
	pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
		let http_client = pushdeploy_common_http::builder()
			.build()
			.map_err(GithubError::Network)?;
		Ok(Self {
			http_client,
			config,
		})
	}

	pub fn config(&self) -> &GithubConfig {
		&self.config
	}

	fn repo_url(&self, project: &ProjectRef, suffix: &str) -> String {
		format!(
			"{}/repos/{}/{}{}",
			self.config.base_url(),
			urlencoding::encode(project.owner()),
			urlencoding::encode(project.name()),
			suffix
		)
	}

	fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, GithubError> {
		let token = self.config.token().ok_or(GithubError::MissingToken)?;
		Ok(self
			.http_client
			.request(method, url)
			.bearer_auth(token)
			.header(reqwest::header::ACCEPT, ACCEPT)
			.timeout(self.config.request_timeout()))
	}

	async fn send(&self, request: RequestBuilder) -> Result<Response, GithubError> {
		let response = request.send().await.map_err(map_send_error)?;
		let status = response.status();
		debug!(status = %status, "Received response from GitHub");

		if !status.is_success() {
			return Err(error_for_response(response).await);
		}
		Ok(response)
	}

	async fn json<T: DeserializeOwned>(response: Response) -> Result<T, GithubError> {
		let body = response.text().await.map_err(map_send_error)?;
		trace!(body = %body, "Response body");
		serde_json::from_str(&body).map_err(|e| {
			error!(error = %e, "Failed to parse GitHub response");
			GithubError::InvalidResponse(format!("JSON parse error: {e}"))
		})
	}

	async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GithubError> {
		let response = self.send(self.request(Method::GET, url)?).await?;
		Self::json(response).await
	}

	/// Follow `page` until GitHub returns a short page.
	async fn get_all_pages<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, GithubError> {
		let separator = if url.contains('?') { '&' } else { '?' };
		let mut items = Vec::new();
		let mut page = 1;

		loop {
			let batch: Vec<T> = self
				.get_json(&format!("{url}{separator}page={page}&per_page={PER_PAGE}"))
				.await?;
			let count = batch.len();
			items.extend(batch);
			debug!(page, count, "Fetched page");

			if count < PER_PAGE {
				break;
			}
			page += 1;
		}

		Ok(items)
	}

	/// Fetch project metadata.
	#[instrument(skip(self, project), fields(project = %project))]
	pub async fn get_repository(&self, project: &ProjectRef) -> Result<RepositoryInfo, GithubError> {
		self.get_json(&self.repo_url(project, "")).await
	}

	/// Stream the zipball for `git_ref` into a fresh file under `dir`.
	///
	/// The returned [`TempPath`] deletes the file when dropped. Downloads larger
	/// than `max_bytes` are abandoned.
	#[instrument(skip(self, project, git_ref, dir), fields(project = %project, git_ref = %git_ref))]
	pub async fn download_archive(
		&self,
		project: &ProjectRef,
		git_ref: &str,
		dir: &Path,
		max_bytes: u64,
	) -> Result<TempPath, GithubError> {
		let url = self.repo_url(project, &format!("/zipball/{}", encode_ref(git_ref)));
		let request = self
			.request(Method::GET, &url)?
			.timeout(self.config.download_timeout());

		let response = request.send().await.map_err(map_send_error)?;
		let status = response.status();
		if status != StatusCode::OK {
			if status.is_success() {
				return Err(GithubError::api_error(
					status.as_u16(),
					format!("unexpected status {status} for archive download"),
				));
			}
			return Err(error_for_response(response).await);
		}

		let (file, path) = tempfile::Builder::new()
			.prefix("pushdeploy-")
			.suffix(".zip")
			.tempfile_in(dir)?
			.into_parts();
		let mut file = tokio::fs::File::from_std(file);

		let mut written: u64 = 0;
		let mut stream = response.bytes_stream();
		while let Some(chunk) = stream.next().await {
			let chunk = chunk.map_err(map_send_error)?;
			written += chunk.len() as u64;
			if written > max_bytes {
				error!(limit = max_bytes, "Archive download exceeds size limit");
				return Err(GithubError::DownloadTooLarge { limit: max_bytes });
			}
			file.write_all(&chunk).await?;
		}
		file.flush().await?;

		if written == 0 {
			error!("Archive download returned an empty body");
			return Err(GithubError::EmptyBody);
		}

		info!(bytes = written, path = %path.display(), "Downloaded archive");
		Ok(path)
	}

	/// Every webhook registered on a project, across all pages.
	#[instrument(skip(self, project), fields(project = %project))]
	pub async fn list_hooks(&self, project: &ProjectRef) -> Result<Vec<Hook>, GithubError> {
		self.get_all_pages(&self.repo_url(project, "/hooks")).await
	}

	/// Register a new `web` hook.
	#[instrument(skip(self, project, secret), fields(project = %project))]
	pub async fn create_hook(
		&self,
		project: &ProjectRef,
		callback_url: &str,
		secret: &str,
		events: &[&str],
	) -> Result<Hook, GithubError> {
		let body = hook_request(callback_url, secret, events);
		let request = self
			.request(Method::POST, &self.repo_url(project, "/hooks"))?
			.json(&body);
		Self::json(self.send(request).await?).await
	}

	/// Update an existing hook to the desired state.
	#[instrument(skip(self, project, secret), fields(project = %project))]
	pub async fn update_hook(
		&self,
		project: &ProjectRef,
		hook_id: u64,
		callback_url: &str,
		secret: &str,
		events: &[&str],
	) -> Result<Hook, GithubError> {
		let body = hook_request(callback_url, secret, events);
		let request = self
			.request(Method::PATCH, &self.repo_url(project, &format!("/hooks/{hook_id}")))?
			.json(&body);
		Self::json(self.send(request).await?).await
	}

	#[instrument(skip(self, project), fields(project = %project))]
	pub async fn delete_hook(&self, project: &ProjectRef, hook_id: u64) -> Result<(), GithubError> {
		let request = self.request(
			Method::DELETE,
			&self.repo_url(project, &format!("/hooks/{hook_id}")),
		)?;
		self.send(request).await?;
		Ok(())
	}

	/// The latest published release, or `None` when the project has none.
	#[instrument(skip(self, project), fields(project = %project))]
	pub async fn latest_release(&self, project: &ProjectRef) -> Result<Option<Release>, GithubError> {
		match self
			.get_json(&self.repo_url(project, "/releases/latest"))
			.await
		{
			Ok(release) => Ok(Some(release)),
			Err(e) if e.is_not_found() => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Tags, newest first as GitHub orders them.
	#[instrument(skip(self, project), fields(project = %project))]
	pub async fn list_tags(&self, project: &ProjectRef) -> Result<Vec<Tag>, GithubError> {
		self.get_json(&self.repo_url(project, "/tags")).await
	}

	/// Latest release tag, falling back to the newest tag.
	#[instrument(skip(self, project), fields(project = %project))]
	pub async fn latest_version(&self, project: &ProjectRef) -> Result<Option<String>, GithubError> {
		if let Some(release) = self.latest_release(project).await? {
			return Ok(Some(release.tag_name));
		}
		let tags = self.list_tags(project).await?;
		Ok(tags.into_iter().next().map(|t| t.name))
	}

	/// Every repository visible to the token, most recently updated first.
	#[instrument(skip(self))]
	pub async fn list_user_repositories(&self) -> Result<Vec<RepositoryInfo>, GithubError> {
		self.get_all_pages(&format!("{}/user/repos?sort=updated", self.config.base_url()))
			.await
	}

	/// The account the token belongs to.
	#[instrument(skip(self))]
	pub async fn current_user(&self) -> Result<User, GithubError> {
		self.get_json(&format!("{}/user", self.config.base_url())).await
	}
}

fn hook_request<'a>(callback_url: &'a str, secret: &'a str, events: &'a [&'a str]) -> HookRequest<'a> {
	HookRequest {
		name: "web",
		active: true,
		events,
		config: HookRequestConfig {
			url: callback_url,
			content_type: "json",
			secret,
			insecure_ssl: "0",
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_encode_ref_keeps_slashes() {
		assert_eq!(encode_ref("main"), "main");
		assert_eq!(encode_ref("feature/new thing"), "feature/new%20thing");
		assert_eq!(encode_ref("v1.0.0"), "v1.0.0");
		assert_eq!(encode_ref("fix#12"), "fix%2312");
	}

	#[test]
	fn test_repo_url() {
		let client = GithubClient::new(GithubConfig::new()).unwrap();
		let project = ProjectRef::parse("acme/widget").unwrap();
		assert_eq!(
			client.repo_url(&project, "/hooks"),
			"https://api.github.com/repos/acme/widget/hooks"
		);
	}

	#[tokio::test]
	async fn test_missing_token_fails_before_network() {
		let client = GithubClient::new(GithubConfig::new()).unwrap();
		let project = ProjectRef::parse("acme/widget").unwrap();
		let err = client.get_repository(&project).await.unwrap_err();
		assert!(matches!(err, GithubError::MissingToken));
	}

	proptest! {
		/// Encoding never drops or adds path segments.
		#[test]
		fn prop_encode_ref_preserves_segments(segments in proptest::collection::vec("[^/]{1,12}", 1..5)) {
			let raw = segments.join("/");
			let encoded = encode_ref(&raw);
			prop_assert_eq!(encoded.split('/').count(), segments.len());
			for (enc, orig) in encoded.split('/').zip(segments.iter()) {
				prop_assert_eq!(urlencoding::decode(enc).unwrap().into_owned(), orig.clone());
			}
		}
	}
}
