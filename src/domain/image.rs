//! Container image reference parsing
//!
//! Splits an image string such as `alpine:3.10.2` or
//! `core.harbor.domain/library/nginx@sha256:d20a...` into registry server,
//! repository path and tag or digest, applying the Docker Hub naming
//! conventions (implicit `index.docker.io` server, implicit `library/`
//! namespace for official images).

use crate::application::errors::{Error, Result};

/// Registry server substituted when an image reference carries no domain.
pub const DEFAULT_REGISTRY_SERVER: &str = "index.docker.io";

const DOCKER_IO_ALIAS: &str = "docker.io";
const OFFICIAL_IMAGE_NAMESPACE: &str = "library";

/// A parsed container image reference.
///
/// At most one of `tag` and `digest` is consumed by downstream code; when an
/// input carries both, the digest pins the artifact and wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, e.g. `index.docker.io` or `core.harbor.domain`.
    pub server: String,
    /// Repository path within the registry, e.g. `library/alpine`.
    pub repository: String,
    /// Tag, when the input referenced one.
    pub tag: Option<String>,
    /// Content digest (`<algorithm>:<hex>`), when the input referenced one.
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parses `input` into its registry/repository/tag-or-digest parts.
    ///
    /// Fails with [`Error::ReferenceParse`] carrying the original string when
    /// the input is empty or malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let fail = || Error::ReferenceParse {
            reference: input.to_string(),
        };

        if input.is_empty() {
            return Err(fail());
        }

        let (remainder, digest) = match input.split_once('@') {
            Some((remainder, digest)) => {
                if !is_valid_digest(digest) {
                    return Err(fail());
                }
                (remainder, Some(digest.to_string()))
            }
            None => (input, None),
        };

        // The leading path segment is a registry domain only when it looks
        // like a host: contains a dot or a port, or is the literal localhost.
        let (domain, name_and_tag) = match remainder.split_once('/') {
            Some((first, rest)) if looks_like_domain(first) => (Some(first), rest),
            _ => (None, remainder),
        };

        let (name, tag) = match name_and_tag.rsplit_once(':') {
            Some((name, tag)) => {
                if !is_valid_tag(tag) {
                    return Err(fail());
                }
                (name, Some(tag.to_string()))
            }
            None => (name_and_tag, None),
        };

        if name.is_empty() || !is_valid_repository(name) {
            return Err(fail());
        }

        let (server, repository) = match domain {
            Some(DOCKER_IO_ALIAS) | None => {
                let repository = if name.contains('/') {
                    name.to_string()
                } else {
                    format!("{OFFICIAL_IMAGE_NAMESPACE}/{name}")
                };
                (DEFAULT_REGISTRY_SERVER.to_string(), repository)
            }
            Some(domain) => (domain.to_string(), name.to_string()),
        };

        Ok(Self {
            server,
            repository,
            tag,
            digest,
        })
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.server, self.repository)?;
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")
        } else if let Some(tag) = &self.tag {
            write!(f, ":{tag}")
        } else {
            Ok(())
        }
    }
}

fn looks_like_domain(segment: &str) -> bool {
    !segment.is_empty()
        && (segment.contains('.') || segment.contains(':') || segment == "localhost")
}

fn is_valid_repository(name: &str) -> bool {
    name.split('/').all(|segment| {
        !segment.is_empty()
            && segment.chars().all(|c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
            })
    })
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag.len() <= 128
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn is_valid_digest(digest: &str) -> bool {
    match digest.split_once(':') {
        Some((algorithm, hex)) => {
            !algorithm.is_empty()
                && algorithm.chars().all(|c| c.is_ascii_alphanumeric())
                && !hex.is_empty()
                && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}
