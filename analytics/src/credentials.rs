//! Credential lifecycle: load, refresh, consent, persist.
//!
//! A run needs exactly one [`Credential`]. [`CredentialStore::acquire`] decides how to get it:
//!
//! 1. a token file that parses and is still valid is used as-is
//! 2. an expired token with a refresh token is refreshed
//! 3. otherwise the user goes through the consent flow, using a client-secret file that is
//!    either configured, discovered next to the working directory, or asked for
//!
//! Whatever was refreshed or newly obtained is written back to the token file.

use crate::Error;
use crate::oauth::OAuthManager;
use crate::prompt::Prompt;
use eyre::Context;
use jiff::{SignedDuration, Timestamp};
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Google's token endpoint, used when a client-secret file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google's consent endpoint, used when a client-secret file does not name one.
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Tokens this close to expiry are treated as already expired.
const CLOCK_SKEW: SignedDuration = SignedDuration::from_secs(10);

/// An OAuth2 credential together with what is needed to refresh it.
///
/// Serializes to the "authorized user" JSON document Google's client libraries use, so token
/// files can be shared with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// When the access token stops working. `None` means unknown, which is treated as valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Timestamp>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl Credential {
    /// Parses a token file's contents, restricted to `scopes`.
    ///
    /// A credential whose recorded grant does not cover every requested scope is rejected, since
    /// the API would refuse it anyway.
    pub fn from_json(json: &str, scopes: &[String]) -> eyre::Result<Self> {
        let mut credential: Self = serde_json::from_str(json).context("parse token JSON")?;
        if !credential.scopes.is_empty() {
            if let Some(missing) = scopes.iter().find(|s| !credential.scopes.contains(*s)) {
                eyre::bail!("stored credential was not granted scope {missing}");
            }
        }
        credential.scopes = scopes.to_vec();
        Ok(credential)
    }

    /// Builds a credential from a fresh token-endpoint response.
    fn from_token_response(
        token: &BasicTokenResponse,
        oauth: &ClientSecrets,
        requested: &[String],
    ) -> Self {
        let scopes = match token.scopes() {
            Some(granted) => granted.iter().map(|s| s.to_string()).collect(),
            None => requested.to_vec(),
        };
        Self {
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            token_uri: oauth.token_uri.clone(),
            client_id: oauth.client_id.clone(),
            client_secret: oauth.client_secret.clone(),
            scopes,
            expiry: expiry_of(token),
        }
    }

    /// Whether the access token can still be used at `now`.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        !self.is_expired_at(now)
    }

    /// Whether the access token has expired (or is about to) at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        match self.expiry {
            Some(expiry) => expiry.duration_since(now) <= CLOCK_SKEW,
            None => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Timestamp::now())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// Refreshes this credential in place, preserving the refresh token.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - the credential was refreshed
    /// * `Ok(false)` - there is no refresh token, or the server rejected it
    /// * `Err(_)` - network or other error occurred
    pub async fn refresh(&mut self) -> eyre::Result<bool> {
        let Some(refresh_token) = self.refresh_token.clone() else {
            tracing::warn!("no refresh token available, cannot refresh");
            return Ok(false);
        };
        let oauth = OAuthManager::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            None,
            self.token_uri.clone(),
        )?;
        let Some(new_token) = oauth
            .refresh_token(&refresh_token)
            .await
            .context("refresh OAuth token")?
        else {
            return Ok(false);
        };

        self.access_token = new_token.access_token().secret().clone();
        // If the new token doesn't have a refresh token, keep the original one
        if let Some(rotated) = new_token.refresh_token() {
            tracing::debug!("new token includes refresh token");
            self.refresh_token = Some(rotated.secret().clone());
        }
        self.expiry = expiry_of(&new_token);
        Ok(true)
    }

    /// Writes this credential to `path`, replacing whatever was there.
    pub async fn save(&self, path: &Path) -> eyre::Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize credential")?;
        tokio::fs::write(path, json)
            .await
            .wrap_err_with(|| Error::Config(format!("write token file {}", path.display())))
    }
}

fn expiry_of(token: &BasicTokenResponse) -> Option<Timestamp> {
    let expires_in = token.expires_in()?;
    let expires_in = SignedDuration::try_from(expires_in).ok()?;
    Timestamp::now().checked_add(expires_in).ok()
}

/// The OAuth client an installed application authenticates as.
///
/// Parsed from the client-secret JSON file downloaded from the Google Cloud console, which
/// wraps these fields in an `installed` (desktop app) or `web` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClientSecretsFile {
    Installed(ClientSecrets),
    Web(ClientSecrets),
}

impl ClientSecrets {
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(json).context("parse client secrets JSON")?;
        Ok(match file {
            ClientSecretsFile::Installed(secrets) | ClientSecretsFile::Web(secrets) => secrets,
        })
    }

    pub async fn load(path: &Path) -> eyre::Result<Self> {
        let json = tokio::fs::read_to_string(path).await.wrap_err_with(|| {
            Error::Config(format!("read client secrets file {}", path.display()))
        })?;
        Self::from_json(&json).wrap_err_with(|| {
            Error::Config(format!(
                "{} is not an OAuth client secrets file",
                path.display()
            ))
        })
    }

    fn oauth_manager(&self) -> eyre::Result<OAuthManager> {
        OAuthManager::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            Some(self.auth_uri.clone()),
            self.token_uri.clone(),
        )
    }
}

/// Looks for a client-secret file near `dir`.
///
/// Candidates are tried in this order, first hit wins:
/// 1. `client_secret*.json` in `dir`
/// 2. `client_secret*.json` in the parent of `dir`
/// 3. any other `*.json` in `dir`, except `token_file`
///
/// Within one step, files are taken in name order.
pub fn find_client_secrets(dir: &Path, token_file: &Path) -> Option<PathBuf> {
    let is_secret = |name: &str| name.starts_with("client_secret") && name.ends_with(".json");
    let token_name = token_file.file_name();

    if let Some(hit) = first_match(dir, |name| is_secret(name)) {
        return Some(hit);
    }
    if let Some(hit) = dir.parent().and_then(|up| first_match(up, |name| is_secret(name))) {
        return Some(hit);
    }
    first_match(dir, |name| {
        name.ends_with(".json") && token_name.is_none_or(|t| t != name)
    })
}

fn first_match(dir: &Path, accept: impl Fn(&str) -> bool) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "cannot list directory");
            return None;
        }
    };
    let mut hits: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter(|entry| entry.file_name().to_str().is_some_and(&accept))
        .map(|entry| entry.path())
        .collect();
    hits.sort();
    hits.into_iter().next()
}

/// Where credentials live and how to obtain new ones.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    /// The token file, read at startup and rewritten after a refresh or consent.
    pub token_path: PathBuf,
    /// Scopes the credential must carry.
    pub scopes: Vec<String>,
    /// An explicit client-secret file; skips discovery.
    pub client_secrets: Option<PathBuf>,
    /// Where client-secret discovery starts.
    pub search_dir: PathBuf,
}

impl CredentialStore {
    /// Produces a usable credential, persisting it if it changed.
    ///
    /// Prompts through `prompter` only when no client-secret file can be found, and tells the
    /// user on `out` which file was used and where the token went. Any failure is fatal to the
    /// run; nothing here retries.
    #[tracing::instrument(skip_all, fields(token_path = %self.token_path.display()))]
    pub async fn acquire(
        &self,
        prompter: &mut dyn Prompt,
        out: &mut dyn Write,
    ) -> eyre::Result<Credential> {
        let stored = self.load().await;

        if let Some(credential) = &stored {
            if credential.is_valid() {
                tracing::debug!("stored credential is still valid");
                return Ok(credential.clone());
            }
        }

        let mut refreshed = None;
        if let Some(mut credential) = stored {
            if credential.is_expired() && credential.refresh_token.is_some() {
                tracing::info!("stored credential expired, refreshing");
                if credential.refresh().await? {
                    refreshed = Some(credential);
                } else {
                    tracing::warn!("token refresh failed, getting new token via full OAuth");
                }
            }
        }

        let credential = match refreshed {
            Some(credential) => credential,
            None => self.consent(prompter, out).await?,
        };

        credential.save(&self.token_path).await?;
        writeln!(out, "Credentials saved to {}", self.token_path.display())?;
        Ok(credential)
    }

    /// Reads the token file, if any. An unreadable or unparseable file counts as absent.
    async fn load(&self) -> Option<Credential> {
        let json = match tokio::fs::read_to_string(&self.token_path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, "error loading existing credentials");
                return None;
            }
        };
        match Credential::from_json(&json, &self.scopes) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "error loading existing credentials");
                None
            }
        }
    }

    async fn consent(
        &self,
        prompter: &mut dyn Prompt,
        out: &mut dyn Write,
    ) -> eyre::Result<Credential> {
        let path = self.locate_client_secrets(prompter, out)?;
        let secrets = ClientSecrets::load(&path).await?;
        let oauth = secrets.oauth_manager()?;
        let token = oauth
            .authenticate(&self.scopes)
            .await
            .context("authorize user to YouTube")?;
        Ok(Credential::from_token_response(&token, &secrets, &self.scopes))
    }

    fn locate_client_secrets(
        &self,
        prompter: &mut dyn Prompt,
        out: &mut dyn Write,
    ) -> eyre::Result<PathBuf> {
        let path = match &self.client_secrets {
            Some(path) => path.clone(),
            None => match find_client_secrets(&self.search_dir, &self.token_path) {
                Some(found) => {
                    writeln!(out, "Found client secrets file: {}", found.display())?;
                    found
                }
                None => PathBuf::from(
                    prompter.ask("Enter path to your OAuth client secrets JSON file: ")?,
                ),
            },
        };
        if !path.is_file() {
            return Err(Error::Config(format!("File {} not found!", path.display())).into());
        }
        Ok(path)
    }
}
