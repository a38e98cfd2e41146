// ABOUTME: Registry v2 HTTP client for listing repository tags.
// ABOUTME: Handles bearer-token challenges and Link header pagination.

use super::{RegistryError, TagRegistry};
use crate::runtime::RegistryAuth;
use crate::types::ImageName;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{LINK, WWW_AUTHENTICATE};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace};

const DOCKER_HUB_REGISTRY: &str = "https://registry-1.docker.io";

/// Tags requested per page.
const PAGE_SIZE: u32 = 1000;

/// Client for an OCI distribution (Registry v2) endpoint.
pub struct RegistryClient {
    client: reqwest::Client,
    auth: Option<RegistryAuth>,
}

impl RegistryClient {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tagpull/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(RegistryError::Client)?;

        Ok(Self { client, auth: None })
    }

    /// Use credentials when the registry asks for them.
    pub fn with_auth(mut self, auth: Option<RegistryAuth>) -> Self {
        self.auth = auth;
        self
    }

    async fn send(
        &self,
        url: &str,
        credential: &Credential,
    ) -> Result<reqwest::Response, RegistryError> {
        let mut request = self.client.get(url);
        match credential {
            Credential::Anonymous => {}
            Credential::Basic => {
                if let Some(ref auth) = self.auth {
                    request = request.basic_auth(&auth.username, Some(&auth.password));
                }
            }
            Credential::Bearer(token) => request = request.bearer_auth(token),
        }

        request.send().await.map_err(|source| RegistryError::Request {
            url: url.to_string(),
            source,
        })
    }

    /// Answer a 401 challenge with the credential the registry asked for.
    async fn authorize(
        &self,
        url: &str,
        response: &reqwest::Response,
    ) -> Result<Credential, RegistryError> {
        let header = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| RegistryError::Unauthorized {
                url: url.to_string(),
            })?;

        match Challenge::parse(header)? {
            Challenge::Basic if self.auth.is_some() => Ok(Credential::Basic),
            Challenge::Basic => Err(RegistryError::Unauthorized {
                url: url.to_string(),
            }),
            Challenge::Bearer {
                realm,
                service,
                scope,
            } => self
                .fetch_token(&realm, service.as_deref(), scope.as_deref())
                .await
                .map(Credential::Bearer),
        }
    }

    async fn fetch_token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: Option<&str>,
    ) -> Result<String, RegistryError> {
        let mut params = Vec::new();
        if let Some(service) = service {
            params.push(format!("service={}", urlencoding::encode(service)));
        }
        if let Some(scope) = scope {
            params.push(format!("scope={}", urlencoding::encode(scope)));
        }

        let mut url = realm.to_string();
        if !params.is_empty() {
            url.push(if realm.contains('?') { '&' } else { '?' });
            url.push_str(&params.join("&"));
        }

        debug!(realm, "requesting registry token");
        let credential = if self.auth.is_some() {
            Credential::Basic
        } else {
            Credential::Anonymous
        };
        let response = self.send(&url, &credential).await?;

        if !response.status().is_success() {
            return Err(status_error(&url, response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|source| RegistryError::Decode {
                url: url.clone(),
                source,
            })?;

        token
            .token
            .or(token.access_token)
            .filter(|t| !t.is_empty())
            .ok_or(RegistryError::Unauthorized { url })
    }
}

#[async_trait]
impl TagRegistry for RegistryClient {
    async fn list_tags(&self, image: &ImageName) -> Result<Vec<String>, RegistryError> {
        let endpoint = Endpoint::for_image(image);
        let mut url = endpoint.tags_url();
        let mut credential = Credential::Anonymous;
        let mut tags = Vec::new();

        loop {
            debug!(url = %url, "listing registry tags");

            let mut response = self.send(&url, &credential).await?;
            if response.status() == StatusCode::UNAUTHORIZED
                && matches!(credential, Credential::Anonymous)
            {
                credential = self.authorize(&url, &response).await?;
                response = self.send(&url, &credential).await?;
            }

            if matches!(
                response.status(),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            ) {
                return Err(RegistryError::Unauthorized { url });
            }
            if !response.status().is_success() {
                return Err(status_error(&url, response).await);
            }

            let next_url = response
                .headers()
                .get(LINK)
                .and_then(|h| h.to_str().ok())
                .and_then(|link| parse_link_header(link, &endpoint.base));

            let page: TagsResponse =
                response
                    .json()
                    .await
                    .map_err(|source| RegistryError::Decode {
                        url: url.clone(),
                        source,
                    })?;
            tags.extend(page.tags.unwrap_or_default());

            match next_url {
                Some(next) => url = next,
                None => break,
            }
        }

        trace!(count = tags.len(), image = %image, "registry tags listed");
        Ok(tags)
    }
}

async fn status_error(url: &str, response: reqwest::Response) -> RegistryError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    RegistryError::Status {
        url: url.to_string(),
        status,
        body: if body.is_empty() {
            "(no response body)".to_string()
        } else {
            body
        },
    }
}

enum Credential {
    Anonymous,
    Basic,
    Bearer(String),
}

/// Where a repository's tags live.
#[derive(Debug, PartialEq, Eq)]
struct Endpoint {
    base: String,
    repository: String,
}

impl Endpoint {
    fn for_image(image: &ImageName) -> Self {
        match image.registry() {
            Some(host) if !image.is_docker_hub() => {
                let scheme = if is_loopback(host) { "http" } else { "https" };
                Endpoint {
                    base: format!("{}://{}", scheme, host),
                    repository: image.name().to_string(),
                }
            }
            _ => {
                // Official images live under the implicit library/ namespace
                let repository = if image.name().contains('/') {
                    image.name().to_string()
                } else {
                    format!("library/{}", image.name())
                };
                Endpoint {
                    base: DOCKER_HUB_REGISTRY.to_string(),
                    repository,
                }
            }
        }
    }

    fn tags_url(&self) -> String {
        format!(
            "{}/v2/{}/tags/list?n={}",
            self.base, self.repository, PAGE_SIZE
        )
    }
}

fn is_loopback(host: &str) -> bool {
    let hostname = host.rsplit_once(':').map_or(host, |(name, _)| name);
    matches!(hostname, "localhost" | "127.0.0.1" | "[::1]")
}

/// A parsed `WWW-Authenticate` header.
#[derive(Debug, PartialEq, Eq)]
enum Challenge {
    Basic,
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
}

impl Challenge {
    fn parse(header: &str) -> Result<Self, RegistryError> {
        let header = header.trim();
        let (scheme, params) = header.split_once(' ').unwrap_or((header, ""));

        if scheme.eq_ignore_ascii_case("basic") {
            return Ok(Challenge::Basic);
        }
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(RegistryError::InvalidChallenge(header.to_string()));
        }

        let mut params = parse_challenge_params(params);
        let realm = params
            .remove("realm")
            .ok_or_else(|| RegistryError::InvalidChallenge(header.to_string()))?;

        Ok(Challenge::Bearer {
            realm,
            service: params.remove("service"),
            scope: params.remove("scope"),
        })
    }
}

/// Split `key="value",key=value` pairs. Quoted values may contain commas.
fn parse_challenge_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut rest = input.trim();

    while let Some((key, after)) = rest.split_once('=') {
        let key = key.trim_matches([',', ' ']).to_ascii_lowercase();
        let (value, remaining) = match after.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            },
            None => match after.find(',') {
                Some(end) => (&after[..end], &after[end..]),
                None => (after, ""),
            },
        };
        params.insert(key, value.to_string());
        rest = remaining.trim_start_matches([',', ' ']);
    }

    params
}

/// Parse Link header for pagination
/// Format: </v2/repo/tags/list?n=100&last=tag>; rel="next"
fn parse_link_header(link: &str, base: &str) -> Option<String> {
    link.split(',')
        .map(str::trim)
        .filter(|part| part.contains("rel=\"next\""))
        .find_map(|part| {
            let start = part.find('<')?;
            let end = part.find('>')?;
            let url = part.get(start + 1..end)?;
            // URL might be relative, make it absolute
            if url.starts_with('/') {
                Some(format!("{}{}", base, url))
            } else {
                Some(url.to_string())
            }
        })
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}
