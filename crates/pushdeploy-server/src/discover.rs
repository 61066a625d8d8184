// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Picking plugin and theme candidates out of the user's GitHub projects.

use std::path::Path;

use pushdeploy_common_core::ComponentType;
use pushdeploy_github::RepositoryInfo;
use pushdeploy_install::Installer;
use serde::Serialize;

const NAME_KEYWORDS: [&str; 6] = ["wp-", "wordpress", "plugin", "theme", "wp-plugin", "wp-theme"];
const DESCRIPTION_KEYWORDS: [&str; 5] = [
	"wordpress",
	"wp plugin",
	"wp theme",
	"wordpress plugin",
	"wordpress theme",
];
const TOPIC_KEYWORDS: [&str; 5] = ["wordpress", "wp-plugin", "wp-theme", "plugin", "theme"];
const STRIPPED_PREFIXES: [&str; 4] = ["wp-", "wordpress-", "plugin-", "theme-"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
	pub full_name: String,
	pub suggested_name: String,
	/// Set when `suggested_name` matches a plugin or theme already on disk.
	pub existing: Option<ComponentType>,
	pub description: Option<String>,
	pub default_branch: String,
}

/// Whether a project looks like something this tool can deploy.
pub fn is_candidate(repo: &RepositoryInfo) -> bool {
	let name = repo.name.to_lowercase();
	if NAME_KEYWORDS.iter().any(|k| name.contains(k)) {
		return true;
	}

	if let Some(description) = &repo.description {
		let description = description.to_lowercase();
		if DESCRIPTION_KEYWORDS.iter().any(|k| description.contains(k)) {
			return true;
		}
	}

	if repo
		.topics
		.iter()
		.any(|topic| TOPIC_KEYWORDS.contains(&topic.to_lowercase().as_str()))
	{
		return true;
	}

	repo.language
		.as_deref()
		.is_some_and(|lang| lang.eq_ignore_ascii_case("php"))
}

/// Directory name suggested for a project name.
///
/// `WP-My_Plugin Name` becomes `my-plugin-name`. May be empty when nothing
/// usable remains.
pub fn suggest_canonical_name(repo_name: &str) -> String {
	let name = strip_known_prefix(repo_name);
	let mut out = String::with_capacity(name.len());
	for c in name.to_lowercase().chars() {
		let c = if c == '_' || c.is_whitespace() { '-' } else { c };
		if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
			continue;
		}
		if c == '-' && out.ends_with('-') {
			continue;
		}
		out.push(c);
	}

	out.trim_matches('-').to_string()
}

/// Drop the first of `wp-`, `wordpress-`, `plugin-` or `theme-` found at
/// the start, ignoring case.
fn strip_known_prefix(name: &str) -> &str {
	STRIPPED_PREFIXES
		.iter()
		.find_map(|prefix| {
			name.get(..prefix.len())
				.filter(|head| head.eq_ignore_ascii_case(prefix))
				.map(|_| &name[prefix.len()..])
		})
		.unwrap_or(name)
}

/// Names to try, best first: the suggestion, the suggestion after a second
/// prefix strip, then the last dash-separated segment. Empty names and
/// duplicates are dropped.
pub fn name_alternatives(repo_name: &str) -> Vec<String> {
	let mut names = vec![
		suggest_canonical_name(repo_name),
		suggest_canonical_name(strip_known_prefix(repo_name)),
	];
	if let Some((_, last)) = repo_name.rsplit_once('-') {
		names.push(suggest_canonical_name(last));
	}

	let mut out: Vec<String> = Vec::with_capacity(names.len());
	for name in names {
		if !name.is_empty() && !out.contains(&name) {
			out.push(name);
		}
	}
	out
}

/// Whether `name` is already installed under `root`: a plugin needs
/// `<root>/<name>/<name>.php`, a theme only the directory.
fn exists_on_disk(root: &Path, component_type: ComponentType, name: &str) -> bool {
	let dir = root.join(name);
	match component_type {
		ComponentType::Plugin => dir.join(format!("{name}.php")).is_file(),
		ComponentType::Theme => dir.is_dir(),
	}
}

/// First alternative already present under `root`.
pub fn existing_name(repo_name: &str, component_type: ComponentType, root: &Path) -> Option<String> {
	name_alternatives(repo_name)
		.into_iter()
		.find(|name| exists_on_disk(root, component_type, name))
}

/// Suggest a name for `repo_name`, preferring a plugin then a theme that is
/// already installed.
pub fn suggest_for(repo_name: &str, installer: &Installer) -> (String, Option<ComponentType>) {
	[ComponentType::Plugin, ComponentType::Theme]
		.into_iter()
		.find_map(|component_type| {
			existing_name(repo_name, component_type, installer.root_for(component_type))
				.map(|name| (name, Some(component_type)))
		})
		.unwrap_or_else(|| (suggest_canonical_name(repo_name), None))
}

pub fn candidates(repos: &[RepositoryInfo], installer: &Installer) -> Vec<Candidate> {
	repos
		.iter()
		.filter(|repo| is_candidate(repo))
		.map(|repo| {
			let (suggested_name, existing) = suggest_for(&repo.name, installer);
			Candidate {
				full_name: repo.full_name.clone(),
				suggested_name,
				existing,
				description: repo.description.clone(),
				default_branch: repo.default_branch.clone(),
			}
		})
		.collect()
}
