// ABOUTME: Container image names with exact, ranged, or wildcard tags.
// ABOUTME: Parses registry/name:tag and answers containment and version ordering.

use semver::{Version, VersionReq};
use std::fmt;
use thiserror::Error;

/// The tag every range and wildcard treats as its moving head.
pub const LATEST: &str = "latest";

/// Tag that matches every version of a repository.
pub const WILDCARD: &str = "*";

const DOCKER_HUB_ALIASES: [&str; 3] = ["docker.io", "index.docker.io", "registry-1.docker.io"];

#[derive(Debug, Error)]
pub enum ParseImageNameError {
    #[error("image name cannot be empty")]
    Empty,

    #[error("invalid character in image name: {0:?}")]
    InvalidChar(char),

    #[error("invalid image name format: {0}")]
    InvalidFormat(String),
}

/// What the tag of an [`ImageName`] asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagConstraint {
    /// A literal tag such as `1.2.3` or `latest`.
    Exact,
    /// A semantic version range such as `~1.x` or `>=1.2 <2`.
    Range(VersionReq),
    /// The `*` wildcard, any tag of the repository.
    All,
}

impl TagConstraint {
    /// Tags that do not read as a valid range are literal.
    fn classify(tag: &str) -> Self {
        if tag == WILDCARD {
            return TagConstraint::All;
        }
        if parse_version(tag).is_some() || !looks_like_range(tag) {
            return TagConstraint::Exact;
        }
        match VersionReq::parse(&normalize_range(tag)) {
            Ok(req) => TagConstraint::Range(req),
            Err(_) => TagConstraint::Exact,
        }
    }
}

/// An immutable image name: optional registry, repository name, and tag.
///
/// Resolution never mutates a name; [`ImageName::with_tag`] builds the
/// concrete result instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    registry: Option<String>,
    name: String,
    tag: String,
    constraint: TagConstraint,
}

impl ImageName {
    pub fn parse(input: &str) -> Result<Self, ParseImageNameError> {
        let (registry, name, tag) = split_reference(input)?;
        let constraint = TagConstraint::classify(&tag);
        Ok(Self {
            registry,
            name,
            tag,
            constraint,
        })
    }

    /// Parse a name that came from a listing; its tag is always taken literally.
    pub fn parse_concrete(input: &str) -> Result<Self, ParseImageNameError> {
        let (registry, name, tag) = split_reference(input)?;
        Ok(Self {
            registry,
            name,
            tag,
            constraint: TagConstraint::Exact,
        })
    }

    /// Same repository with a literal tag. Used to build resolution results
    /// and registry candidates.
    pub fn with_tag(&self, tag: impl Into<String>) -> Self {
        Self {
            registry: self.registry.clone(),
            name: self.name.clone(),
            tag: tag.into(),
            constraint: TagConstraint::Exact,
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn constraint(&self) -> &TagConstraint {
        &self.constraint
    }

    /// `registry/name`, or just `name` when no registry was given.
    pub fn name_with_registry(&self) -> String {
        match &self.registry {
            Some(registry) => format!("{}/{}", registry, self.name),
            None => self.name.clone(),
        }
    }

    /// True for names without a registry or with one of Docker Hub's hosts.
    pub fn is_docker_hub(&self) -> bool {
        self.registry
            .as_deref()
            .is_none_or(|r| DOCKER_HUB_ALIASES.iter().any(|alias| *alias == r))
    }

    pub fn has_version_range(&self) -> bool {
        matches!(self.constraint, TagConstraint::Range(_))
    }

    pub fn is_all(&self) -> bool {
        self.constraint == TagConstraint::All
    }

    /// True when the tag must be resolved against candidates before pulling.
    pub fn needs_resolution(&self) -> bool {
        self.has_version_range() || self.is_all()
    }

    pub fn is_latest(&self) -> bool {
        self.tag == LATEST
    }

    pub fn has_version(&self) -> bool {
        self.tag_as_version().is_some()
    }

    pub fn tag_as_version(&self) -> Option<Version> {
        match self.constraint {
            TagConstraint::Exact => parse_version(&self.tag),
            _ => None,
        }
    }

    /// Whether two names point at the same repository. Docker Hub aliases
    /// and the implicit `library/` namespace compare equal.
    pub fn same_repository(&self, other: &ImageName) -> bool {
        let this = canonical_repository(self.registry(), &self.name);
        let that = canonical_repository(other.registry(), &other.name);
        this == that
    }

    /// Whether `other`'s tag satisfies this name's constraint.
    pub fn contains(&self, other: &ImageName) -> bool {
        if !self.same_repository(other) {
            return false;
        }
        match &self.constraint {
            TagConstraint::All => true,
            TagConstraint::Range(req) => {
                other.is_latest() || other.tag_as_version().is_some_and(|v| req.matches(&v))
            }
            TagConstraint::Exact => self.tag == other.tag,
        }
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}:{}", self.name, self.tag)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '-' | '_')
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '.' | '-' | '_' | '+' | '~' | '^' | '<' | '>' | '=' | '*' | ',' | ' ')
}

/// Split `[registry/]name[:tag]`, defaulting the tag to `latest`.
fn split_reference(input: &str) -> Result<(Option<String>, String, String), ParseImageNameError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseImageNameError::Empty);
    }

    // The tag separator is the last colon not followed by a path segment,
    // so registry ports (localhost:5000/app) stay part of the name.
    let (repository, tag) = match input.rsplit_once(':') {
        Some((before, after)) if !after.contains('/') => (before, Some(after)),
        _ => (input, None),
    };

    if let Some(c) = repository.chars().find(|c| !is_name_char(*c)) {
        return Err(ParseImageNameError::InvalidChar(c));
    }

    let tag = match tag {
        Some("") => return Err(ParseImageNameError::InvalidFormat(input.to_string())),
        Some(tag) => {
            if let Some(c) = tag.chars().find(|c| !is_tag_char(*c)) {
                return Err(ParseImageNameError::InvalidChar(c));
            }
            tag.trim().to_string()
        }
        None => LATEST.to_string(),
    };

    let (registry, name) = parse_registry_and_name(repository)?;
    Ok((registry, name, tag))
}

fn parse_registry_and_name(input: &str) -> Result<(Option<String>, String), ParseImageNameError> {
    if input.is_empty() || input.starts_with('/') || input.ends_with('/') || input.contains("//") {
        return Err(ParseImageNameError::InvalidFormat(input.to_string()));
    }

    // A registry is present if the first component contains a dot or colon,
    // or is "localhost"
    match input.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            Ok((Some(first.to_string()), rest.to_string()))
        }
        _ if input.contains(':') => Err(ParseImageNameError::InvalidFormat(input.to_string())),
        _ => Ok((None, input.to_string())),
    }
}

fn canonical_repository<'a>(registry: Option<&'a str>, name: &'a str) -> (Option<&'a str>, &'a str) {
    match registry {
        Some(r) if !DOCKER_HUB_ALIASES.iter().any(|alias| *alias == r) => (Some(r), name),
        _ => (None, name.strip_prefix("library/").unwrap_or(name)),
    }
}

/// Parse a tag as a semantic version, accepting a `v` prefix and
/// missing minor or patch components (`v1.2` is `1.2.0`).
pub fn parse_version(tag: &str) -> Option<Version> {
    let tag = tag.strip_prefix('v').unwrap_or(tag);
    if let Ok(version) = Version::parse(tag) {
        return Some(version);
    }

    let split = tag.find(['-', '+']).unwrap_or(tag.len());
    let (core, suffix) = tag.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 2
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let padded = format!("{}{}{}", core, ".0".repeat(3 - parts.len()), suffix);
    Version::parse(&padded).ok()
}

/// Operators, separators, or `x` components after a numeric major (`1.x`).
fn looks_like_range(tag: &str) -> bool {
    if tag.starts_with(['~', '^', '<', '>', '=']) || tag.contains(['*', ',', ' ']) {
        return true;
    }
    let mut parts = tag.strip_prefix('v').unwrap_or(tag).split('.');
    let numeric_major = parts
        .next()
        .is_some_and(|major| !major.is_empty() && major.bytes().all(|b| b.is_ascii_digit()));
    numeric_major && parts.any(|part| part == "x" || part == "X")
}

/// Rewrite range syntax into the comma-separated form `VersionReq` accepts:
/// `x` wildcards become `*`, wildcards after an operator are dropped
/// (`~1.x` is `~1`), and whitespace-separated comparators get commas.
fn normalize_range(tag: &str) -> String {
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op = String::new();

    for token in tag.split([',', ' ']).filter(|t| !t.is_empty()) {
        if token.chars().all(is_operator_char) {
            pending_op.push_str(token);
            continue;
        }
        let token = format!("{}{}", pending_op, token);
        pending_op.clear();
        comparators.push(normalize_comparator(&token));
    }

    comparators.join(", ")
}

fn normalize_comparator(comparator: &str) -> String {
    let op_len = comparator
        .find(|c: char| !is_operator_char(c))
        .unwrap_or(comparator.len());
    let (op, version) = comparator.split_at(op_len);
    let version = version.strip_prefix('v').unwrap_or(version);

    let parts: Vec<&str> = version
        .split('.')
        .map(|p| if p == "x" || p == "X" { "*" } else { p })
        .collect();

    if op.is_empty() {
        return parts.join(".");
    }

    let kept: Vec<&str> = parts.into_iter().take_while(|p| *p != "*").collect();
    if kept.is_empty() {
        return WILDCARD.to_string();
    }
    format!("{}{}", op, kept.join("."))
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '~' | '^' | '<' | '>' | '=')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_tilde_wildcard() {
        assert_eq!(normalize_range("~1.x"), "~1");
        assert_eq!(normalize_range("1.2.x"), "1.2.*");
    }

    #[test]
    fn normalizes_space_separated_comparators() {
        assert_eq!(normalize_range(">=1.2 <2"), ">=1.2, <2");
        assert_eq!(normalize_range(">= 1.2, < 2"), ">=1.2, <2");
    }

    #[test]
    fn pads_short_versions() {
        assert_eq!(parse_version("1"), Some(Version::new(1, 0, 0)));
        assert_eq!(parse_version("v1.2"), Some(Version::new(1, 2, 0)));
        assert_eq!(parse_version("1.2-rc1").map(|v| v.pre.to_string()), Some("rc1".to_string()));
    }

    #[test]
    fn rejects_non_versions() {
        assert_eq!(parse_version("latest"), None);
        assert_eq!(parse_version("1.2.3.4"), None);
        assert_eq!(parse_version("alpine3.18"), None);
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn plain_words_are_not_ranges() {
        assert!(!looks_like_range("xenial"));
        assert!(!looks_like_range("latest"));
        assert!(!looks_like_range("x"));
        assert!(!looks_like_range("release.x"));
        assert!(looks_like_range("1.x"));
        assert!(looks_like_range("v2.X"));
        assert!(looks_like_range("^2"));
    }
}
