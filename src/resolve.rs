// ABOUTME: Resolves which group of a project is currently inactive.
// ABOUTME: Static config value, info-URL YAML lookup, or raw-text URL fetch.

use crate::config::Project;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("project '{0}' has neither 'inactive' nor 'info' configured")]
    Unconfigured(String),

    #[error("GET {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} returned content type '{content_type}', expected text/yaml")]
    ContentType { url: String, content_type: String },

    #[error("info document at {url} is not valid YAML: {reason}")]
    InvalidYaml { url: String, reason: String },

    #[error("info document at {url} has no 'tail' field")]
    MissingTail { url: String },

    #[error("project '{project}' has {count} groups; flipping requires exactly two")]
    NotTwoGroups { project: String, count: usize },
}

/// How a project's inactive group is determined. `info` wins over
/// `inactive`; an `inactive` value with an http(s) scheme is fetched,
/// anything else is taken verbatim as a group name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolver {
    Static(String),
    InfoUrl(String),
    InactiveUrl(String),
}

#[derive(Debug, Deserialize)]
struct InfoDoc {
    tail: Option<String>,
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl Resolver {
    pub fn for_project(name: &str, project: &Project) -> Result<Self, ResolverError> {
        if let Some(info) = &project.info {
            return Ok(Resolver::InfoUrl(info.clone()));
        }
        match &project.inactive {
            Some(value) if is_url(value) => Ok(Resolver::InactiveUrl(value.clone())),
            Some(value) => Ok(Resolver::Static(value.clone())),
            None => Err(ResolverError::Unconfigured(name.to_string())),
        }
    }

    /// Produce the name of the group to deploy into.
    pub async fn resolve(&self, timeout: Duration) -> Result<String, ResolverError> {
        match self {
            Resolver::Static(group) => Ok(group.clone()),
            Resolver::InfoUrl(url) => {
                let body = fetch(url, timeout, true).await?;
                let doc: InfoDoc =
                    serde_yaml::from_str(&body).map_err(|e| ResolverError::InvalidYaml {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;
                doc.tail
                    .ok_or_else(|| ResolverError::MissingTail { url: url.clone() })
            }
            Resolver::InactiveUrl(url) => {
                let body = fetch(url, timeout, false).await?;
                Ok(body.trim().to_string())
            }
        }
    }
}

async fn fetch(url: &str, timeout: Duration, want_yaml: bool) -> Result<String, ResolverError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ResolverError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| ResolverError::Http {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ResolverError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if want_yaml {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let essence = content_type.split(';').next().unwrap_or("").trim();
        if essence != "text/yaml" {
            return Err(ResolverError::ContentType {
                url: url.to_string(),
                content_type,
            });
        }
    }

    response.text().await.map_err(|e| ResolverError::Http {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// For `restart --active`: the group that is NOT `inactive_group`.
/// Only defined for projects with exactly two groups.
pub fn other_group(
    name: &str,
    project: &Project,
    inactive_group: &str,
) -> Result<String, ResolverError> {
    if project.groups.len() != 2 {
        return Err(ResolverError::NotTwoGroups {
            project: name.to_string(),
            count: project.groups.len(),
        });
    }
    project
        .groups
        .keys()
        .find(|g| g.as_str() != inactive_group)
        .cloned()
        .ok_or_else(|| ResolverError::NotTwoGroups {
            project: name.to_string(),
            count: project.groups.len(),
        })
}
