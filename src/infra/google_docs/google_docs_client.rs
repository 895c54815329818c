// =============================================================================
// GOOGLE DOCS CLIENT
// =============================================================================
//
// Implements the core `DocumentService` port against the Google Docs REST API:
// - `documents.get` for snapshots
// - `documents.batchUpdate` for submitting operation batches
//
// **Authentication Options:**
//
// 1. **Pre-issued access token:**
//    - Obtained elsewhere (e.g. an OAuth consent flow) with the
//      `https://www.googleapis.com/auth/documents` scope
//    - `GOOGLE_ACCESS_TOKEN` - the bearer token
//
// 2. **Service Account:**
//    - Share the target document with the service account email as an Editor
//    - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to the JSON key file
//      OR
//    - `GOOGLE_SERVICE_ACCOUNT_JSON` - The JSON content directly
//
// The access token wins when both are set.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use super::requests::encode_batch;
use crate::core::docs::{DocsError, DocumentService, DocumentSnapshot, Operation};

const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";
const DOCS_SCOPE: &str = "https://www.googleapis.com/auth/documents";

// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// Where to exchange the signed JWT for an access token.
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    /// Max 1 hour after `iat`.
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Exchanges service account credentials for short-lived access tokens.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceAccountAuth {
    pub async fn from_file(path: &str) -> Result<Self, DocsError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DocsError::Auth(format!("Cannot read key file {}: {}", path, e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, DocsError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| DocsError::Auth(format!("Invalid service account JSON: {}", e)))?;
        Ok(Self {
            credentials,
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Gets a valid access token, refreshing it a minute before expiry.
    pub async fn get_access_token(&self) -> Result<String, DocsError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + Duration::from_secs(60) {
                    return Ok(token.token.clone());
                }
            }
        }

        let (token, lifetime) = self.fetch_new_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(CachedToken {
                token: token.clone(),
                expires_at: SystemTime::now() + lifetime,
            });
        }

        Ok(token)
    }

    async fn fetch_new_token(&self) -> Result<(String, Duration), DocsError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DocsError::Auth(e.to_string()))?
            .as_secs();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: DOCS_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| DocsError::Auth(format!("Invalid private key: {}", e)))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| DocsError::Auth(format!("Failed to sign JWT: {}", e)))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| DocsError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocsError::Auth(format!(
                "Token exchange failed ({}): {}",
                status, text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DocsError::Auth(e.to_string()))?;
        // Refresh a little early rather than trusting the full lifetime.
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600).saturating_sub(300));
        tracing::debug!(
            service_account = %self.credentials.client_email,
            lifetime_secs = lifetime.as_secs(),
            "Fetched Google access token"
        );

        Ok((token.access_token, lifetime))
    }
}

/// Where bearer tokens come from.
pub enum TokenSource {
    Static(String),
    ServiceAccount(ServiceAccountAuth),
}

impl TokenSource {
    /// Reads `GOOGLE_ACCESS_TOKEN`, then `GOOGLE_SERVICE_ACCOUNT_KEY`, then
    /// `GOOGLE_SERVICE_ACCOUNT_JSON`.
    pub async fn from_env() -> Result<Self, DocsError> {
        if let Ok(token) = std::env::var("GOOGLE_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                return Ok(Self::Static(token.trim().to_string()));
            }
        }

        if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            return Ok(Self::ServiceAccount(
                ServiceAccountAuth::from_file(&path).await?,
            ));
        }

        if let Ok(json) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            return Ok(Self::ServiceAccount(ServiceAccountAuth::from_json(&json)?));
        }

        Err(DocsError::Auth(
            "Set GOOGLE_ACCESS_TOKEN, GOOGLE_SERVICE_ACCOUNT_KEY or GOOGLE_SERVICE_ACCOUNT_JSON."
                .to_string(),
        ))
    }

    pub async fn access_token(&self) -> Result<String, DocsError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::ServiceAccount(auth) => auth.get_access_token().await,
        }
    }
}

// =============================================================================
// GOOGLE DOCS CLIENT
// =============================================================================

pub struct GoogleDocsClient {
    client: Client,
    auth: TokenSource,
    base_url: String,
}

impl GoogleDocsClient {
    pub fn new(auth: TokenSource) -> Self {
        Self {
            client: Client::new(),
            auth,
            base_url: DOCS_API_BASE.to_string(),
        }
    }

    pub async fn from_env() -> Result<Self, DocsError> {
        let auth = TokenSource::from_env().await?;
        if let TokenSource::ServiceAccount(sa) = &auth {
            tracing::info!(
                "Using service account {}; the document must be shared with it as an editor",
                sa.client_email()
            );
        }
        Ok(Self::new(auth))
    }

    /// Extracts the document ID from a Google Docs URL, or accepts a bare ID.
    pub fn extract_doc_id(url_or_id: &str) -> Option<String> {
        let url_or_id = url_or_id.trim();
        if url_or_id.contains("docs.google.com") {
            if let Some(start) = url_or_id.find("/document/d/") {
                let after_d = &url_or_id[start + 12..];
                let end = after_d
                    .find(|c| c == '/' || c == '?' || c == '#')
                    .unwrap_or(after_d.len());
                let id = &after_d[..end];
                if !id.is_empty() {
                    return Some(id.to_string());
                }
            }
        } else if !url_or_id.is_empty() && !url_or_id.contains('/') && !url_or_id.contains(' ') {
            return Some(url_or_id.to_string());
        }
        None
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DocsError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Err(DocsError::Api {
            status: status.as_u16(),
            message: text,
        })
    }
}

#[async_trait]
impl DocumentService for GoogleDocsClient {
    async fn submit_batch(
        &self,
        document_id: &str,
        operations: &[Operation],
    ) -> Result<(), DocsError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/documents/{}:batchUpdate", self.base_url, document_id);

        tracing::debug!(
            document_id,
            operations = operations.len(),
            "POST documents.batchUpdate"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&encode_batch(operations))
            .send()
            .await
            .map_err(|e| DocsError::Transport(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn get_snapshot(&self, document_id: &str) -> Result<DocumentSnapshot, DocsError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/documents/{}", self.base_url, document_id);

        tracing::debug!(document_id, "GET documents.get");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| DocsError::Transport(e.to_string()))?;

        let response = Self::check(response).await?;
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DocsError::Snapshot(e.to_string()))?;

        DocumentSnapshot::from_json(value).map_err(|e| DocsError::Snapshot(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_doc_id_from_url() {
        let url = "https://docs.google.com/document/d/1abc123xyz/edit";
        assert_eq!(
            GoogleDocsClient::extract_doc_id(url),
            Some("1abc123xyz".to_string())
        );

        let url = "https://docs.google.com/document/d/1abc123xyz?usp=sharing";
        assert_eq!(
            GoogleDocsClient::extract_doc_id(url),
            Some("1abc123xyz".to_string())
        );
    }

    #[test]
    fn test_extract_doc_id_from_id() {
        assert_eq!(
            GoogleDocsClient::extract_doc_id(" 1abc123xyz "),
            Some("1abc123xyz".to_string())
        );
        assert_eq!(GoogleDocsClient::extract_doc_id("not/an/id"), None);
        assert_eq!(GoogleDocsClient::extract_doc_id(""), None);
    }

    #[test]
    fn test_invalid_service_account_json() {
        let result = ServiceAccountAuth::from_json("{}");
        assert!(matches!(result, Err(DocsError::Auth(_))));
    }

    #[tokio::test]
    async fn test_static_token_source() {
        let source = TokenSource::Static("ya29.token".to_string());
        assert_eq!(source.access_token().await.unwrap(), "ya29.token");
    }
}
