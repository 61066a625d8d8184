// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! End-to-end webhook handling against a mock GitHub API.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pushdeploy_archive::ArchiveLimits;
use pushdeploy_common_core::{CanonicalName, ComponentType, ProjectRef, RepositoryConfig};
use pushdeploy_common_secret::SecretString;
use pushdeploy_common_webhook::{compute_signature_header, SIGNATURE_HEADER};
use pushdeploy_github::{GithubClient, GithubConfig};
use pushdeploy_install::Installer;
use pushdeploy_server::{
	create_router, AdmissionGate, AppState, DeployPipeline, InMemoryRateLimiter,
	RepositoryRegistry,
};
use pushdeploy_server_config::WEBHOOK_PATH;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "webhook-secret";

struct Harness {
	_dir: TempDir,
	plugins_dir: PathBuf,
	temp_dir: PathBuf,
	data_dir: PathBuf,
	installer: Arc<Installer>,
	pipeline: DeployPipeline,
	router: Router,
	github: MockServer,
}

fn widget() -> RepositoryConfig {
	RepositoryConfig {
		project: ProjectRef::parse("acme/widget").unwrap(),
		component_type: ComponentType::Plugin,
		canonical_name: CanonicalName::parse("widget").unwrap(),
	}
}

async fn harness_with_limit(rate_limit: u32) -> Harness {
	let github = MockServer::start().await;
	let dir = tempfile::tempdir().unwrap();
	let plugins_dir = dir.path().join("plugins");
	let temp_dir = dir.path().join("tmp");

	let client = GithubClient::new(
		GithubConfig::new()
			.with_token("ghp_test")
			.with_base_url(&github.uri())
			.unwrap(),
	)
	.unwrap();
	let installer = Arc::new(Installer::new(
		plugins_dir.clone(),
		dir.path().join("themes"),
		&dir.path().join("data"),
	));
	let pipeline = DeployPipeline::new(
		client,
		Arc::clone(&installer),
		ArchiveLimits::default(),
		temp_dir.clone(),
	);
	let gate = AdmissionGate::new(
		Arc::new(InMemoryRateLimiter::new(rate_limit, Duration::from_secs(60))),
		Some(SecretString::from(SECRET)),
	);
	let registry = Arc::new(RepositoryRegistry::new(vec![widget()]));
	let router = create_router(AppState::new(gate, registry, pipeline.clone()));

	Harness {
		data_dir: dir.path().join("data"),
		_dir: dir,
		plugins_dir,
		temp_dir,
		installer,
		pipeline,
		router,
		github,
	}
}

async fn harness() -> Harness {
	harness_with_limit(100).await
}

fn zipball(entries: &[(&str, &str)]) -> Vec<u8> {
	let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
	let options = zip::write::SimpleFileOptions::default();
	for (name, contents) in entries {
		zip.start_file(format!("acme-widget-3f2a9c1/{name}"), options)
			.unwrap();
		zip.write_all(contents.as_bytes()).unwrap();
	}
	zip.finish().unwrap().into_inner()
}

fn plugin_zip(version: &str) -> Vec<u8> {
	let header = format!("<?php\n/*\nPlugin Name: Widget\nVersion: {version}\n*/\n");
	zipball(&[("widget.php", header.as_str()), ("includes/core.php", "<?php // core")])
}

async fn mount_zipball(server: &MockServer, git_ref: &str, body: Vec<u8>) {
	Mock::given(method("GET"))
		.and(path(format!("/repos/acme/widget/zipball/{git_ref}")))
		.respond_with(
			ResponseTemplate::new(200)
				.insert_header("content-type", "application/zip")
				.set_body_bytes(body),
		)
		.mount(server)
		.await;
}

fn signed(event: &str, body: &Value) -> Request<Body> {
	let body = body.to_string();
	Request::builder()
		.method("POST")
		.uri(WEBHOOK_PATH)
		.header("content-type", "application/json")
		.header("X-GitHub-Event", event)
		.header(SIGNATURE_HEADER, compute_signature_header(SECRET, body.as_bytes()))
		.body(Body::from(body))
		.unwrap()
}

fn push(full_name: &str, git_ref: &str) -> Value {
	json!({
		"ref": format!("refs/heads/{git_ref}"),
		"repository": {"full_name": full_name},
		"commits": [{"id": "3f2a9c1"}]
	})
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
	let response = router.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let body = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	(status, body.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
	let (status, body) = send(router, request).await;
	(status, serde_json::from_slice(&body).unwrap())
}

fn dir_is_empty(path: &Path) -> bool {
	match std::fs::read_dir(path) {
		Ok(mut entries) => entries.next().is_none(),
		Err(_) => true,
	}
}

#[tokio::test]
async fn test_health() {
	let h = harness().await;
	let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
	let (status, body) = send_json(&h.router, request).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "ok");
	assert_eq!(body["repositories"], 1);
}

#[tokio::test]
async fn test_bad_signature_rejected_with_empty_body() {
	let h = harness().await;
	let mut request = signed("push", &push("acme/widget", "main"));
	request.headers_mut().insert(
		SIGNATURE_HEADER,
		compute_signature_header("wrong-secret", b"{}").parse().unwrap(),
	);
	let (status, body) = send(&h.router, request).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert!(body.is_empty());
	assert!(dir_is_empty(&h.plugins_dir));
}

#[tokio::test]
async fn test_missing_signature_rejected() {
	let h = harness().await;
	let mut request = signed("ping", &json!({}));
	request.headers_mut().remove(SIGNATURE_HEADER);
	let (status, body) = send(&h.router, request).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert!(body.is_empty());
}

#[tokio::test]
async fn test_rate_limit_rejects_eleventh_delivery() {
	let h = harness_with_limit(10).await;
	for _ in 0..10 {
		let (status, _) = send(&h.router, signed("ping", &json!({"zen": "hi"}))).await;
		assert_eq!(status, StatusCode::OK);
	}
	let (status, body) = send(&h.router, signed("ping", &json!({"zen": "hi"}))).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert!(body.is_empty());
}

#[tokio::test]
async fn test_ping() {
	let h = harness().await;
	let (status, body) = send_json(
		&h.router,
		signed("ping", &json!({"repository": {"full_name": "acme/widget"}})),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["message"], "Ping received");
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
	let h = harness().await;
	let body = "{not json";
	let request = Request::builder()
		.method("POST")
		.uri(WEBHOOK_PATH)
		.header("X-GitHub-Event", "push")
		.header(SIGNATURE_HEADER, compute_signature_header(SECRET, body.as_bytes()))
		.body(Body::from(body))
		.unwrap();
	let (status, _) = send(&h.router, request).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unconfigured_repository_is_noop() {
	let h = harness().await;
	let (status, body) = send_json(&h.router, signed("push", &push("acme/unrelated", "main"))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["message"], "Repository not configured");
	assert!(dir_is_empty(&h.plugins_dir));
	assert!(h.github.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unsupported_event_is_noop() {
	let h = harness().await;
	let (status, body) = send_json(&h.router, signed("issues", &json!({"action": "opened"}))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["message"], "Event not supported");
}

#[tokio::test]
async fn test_push_deploys_branch() {
	let h = harness().await;
	mount_zipball(&h.github, "main", plugin_zip("1.2.3")).await;

	let (status, body) = send_json(&h.router, signed("push", &push("acme/widget", "main"))).await;
	assert_eq!(status, StatusCode::OK, "{body}");
	assert_eq!(body["repository"], "acme/widget");
	assert_eq!(body["ref"], "main");

	let target = h.plugins_dir.join("widget");
	assert!(target.join("widget.php").is_file());
	assert!(target.join("includes/core.php").is_file());
	assert!(!target.join("acme-widget-3f2a9c1").exists());
	assert_eq!(h.installer.current_version(&widget()).as_deref(), Some("1.2.3"));
	assert!(dir_is_empty(&h.temp_dir), "temporary files left behind");
}

#[tokio::test]
async fn test_deploy_waits_for_lease_held_by_another_installer() {
	let h = harness().await;
	mount_zipball(&h.github, "main", plugin_zip("1.2.3")).await;

	let cli = Installer::new(h.plugins_dir.clone(), h.plugins_dir.with_file_name("themes"), &h.data_dir);
	let held = cli.leases().acquire(&widget().canonical_name).await.unwrap();

	let router = h.router.clone();
	let delivery = tokio::spawn(async move { send(&router, signed("push", &push("acme/widget", "main"))).await });
	tokio::time::sleep(Duration::from_millis(200)).await;
	assert!(!delivery.is_finished());
	assert!(!h.plugins_dir.join("widget").exists());

	drop(held);
	let (status, _) = tokio::time::timeout(Duration::from_secs(10), delivery)
		.await
		.unwrap()
		.unwrap();
	assert_eq!(status, StatusCode::OK);
	assert!(h.plugins_dir.join("widget/widget.php").is_file());
}

#[tokio::test]
async fn test_uninstall_removes_deployed_tree() {
	let h = harness().await;
	mount_zipball(&h.github, "main", plugin_zip("1.2.3")).await;
	let (status, _) = send(&h.router, signed("push", &push("acme/widget", "main"))).await;
	assert_eq!(status, StatusCode::OK);

	assert!(h.pipeline.uninstall(&widget()).await.unwrap());
	assert!(!h.plugins_dir.join("widget").exists());
	assert!(!h.pipeline.uninstall(&widget()).await.unwrap());
}

#[tokio::test]
async fn test_deleted_branch_push_is_noop() {
	let h = harness().await;
	let mut payload = push("acme/widget", "old");
	payload["deleted"] = json!(true);
	let (status, _) = send(&h.router, signed("push", &payload)).await;
	assert_eq!(status, StatusCode::OK);
	assert!(dir_is_empty(&h.plugins_dir));
}

#[tokio::test]
async fn test_published_release_deploys_tag() {
	let h = harness().await;
	mount_zipball(&h.github, "v2.0.0", plugin_zip("2.0.0")).await;

	let payload = json!({
		"action": "published",
		"release": {"tag_name": "v2.0.0"},
		"repository": {"full_name": "acme/widget"}
	});
	let (status, body) = send_json(&h.router, signed("release", &payload)).await;
	assert_eq!(status, StatusCode::OK, "{body}");
	assert_eq!(body["tag"], "v2.0.0");
	assert_eq!(h.installer.current_version(&widget()).as_deref(), Some("2.0.0"));
}

#[tokio::test]
async fn test_unpublished_release_is_noop() {
	let h = harness().await;
	let payload = json!({
		"action": "created",
		"release": {"tag_name": "v2.0.0"},
		"repository": {"full_name": "acme/widget"}
	});
	let (status, body) = send_json(&h.router, signed("release", &payload)).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["message"], "Release action ignored");
	assert!(dir_is_empty(&h.plugins_dir));
	assert!(h.github.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_redeploy_is_idempotent() {
	let h = harness().await;
	mount_zipball(&h.github, "main", plugin_zip("1.2.3")).await;

	let (status, _) = send(&h.router, signed("push", &push("acme/widget", "main"))).await;
	assert_eq!(status, StatusCode::OK);
	let first = std::fs::read(h.plugins_dir.join("widget/widget.php")).unwrap();

	let (status, _) = send(&h.router, signed("push", &push("acme/widget", "main"))).await;
	assert_eq!(status, StatusCode::OK);
	let second = std::fs::read(h.plugins_dir.join("widget/widget.php")).unwrap();

	assert_eq!(first, second);
	let mut names: Vec<_> = std::fs::read_dir(&h.plugins_dir)
		.unwrap()
		.map(|e| e.unwrap().file_name())
		.collect();
	names.sort();
	assert_eq!(names, vec![std::ffi::OsString::from("widget")]);
}

#[tokio::test]
async fn test_denied_file_leaves_previous_version() {
	let h = harness().await;
	mount_zipball(&h.github, "main", plugin_zip("1.2.3")).await;
	let bad = zipball(&[
		("widget.php", "<?php\n/*\nVersion: 9.9.9\n*/\n"),
		("tools/setup.exe", "MZ"),
	]);
	mount_zipball(&h.github, "evil", bad).await;

	let (status, _) = send(&h.router, signed("push", &push("acme/widget", "main"))).await;
	assert_eq!(status, StatusCode::OK);

	let (status, body) = send_json(&h.router, signed("push", &push("acme/widget", "evil"))).await;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body["message"].as_str().unwrap().contains("setup.exe"), "{body}");
	assert_eq!(h.installer.current_version(&widget()).as_deref(), Some("1.2.3"));
	assert!(!h.plugins_dir.join("widget/tools").exists());
	assert!(dir_is_empty(&h.temp_dir), "temporary files left behind");
}

#[tokio::test]
async fn test_github_error_surfaces_as_500() {
	let h = harness().await;
	Mock::given(method("GET"))
		.and(path("/repos/acme/widget/zipball/main"))
		.respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
		.mount(&h.github)
		.await;

	let (status, body) = send_json(&h.router, signed("push", &push("acme/widget", "main"))).await;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body["message"].as_str().unwrap().contains("Not Found"), "{body}");
	assert!(dir_is_empty(&h.plugins_dir));
}
