//! OAuth 2.0 exchanges with Google's authorization server.
//!
//! This module runs the two network-facing halves of the credential lifecycle: the interactive
//! consent flow (browser + local redirect listener) and the refresh-token exchange. Deciding
//! *when* to run either is left to [`crate::credentials`].

use crate::Error;
use eyre::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, body};
use oauth2::basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, Scope, TokenUrl, reqwest,
};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const OAUTH_DONE: &str = include_str!("../oauth_success.html");

/// How long the redirect listener keeps the browser connection open to deliver the
/// confirmation page after the authorization code has arrived.
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

/// Performs OAuth exchanges on behalf of one OAuth client.
#[derive(Debug, Clone)]
pub(crate) struct OAuthManager {
    client_id: String,
    client_secret: Option<String>,
    /// Only needed for the consent flow; a refresh works without it.
    auth_uri: Option<String>,
    token_uri: String,
    http: reqwest::Client,
}

impl OAuthManager {
    pub(crate) fn new(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        auth_uri: Option<String>,
        token_uri: impl Into<String>,
    ) -> eyre::Result<Self> {
        let http = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")?;
        Ok(Self {
            client_id: client_id.into(),
            client_secret,
            auth_uri,
            token_uri: token_uri.into(),
            http,
        })
    }

    fn token_url(&self) -> eyre::Result<TokenUrl> {
        TokenUrl::new(self.token_uri.clone())
            .wrap_err_with(|| Error::Config(format!("invalid token endpoint {}", self.token_uri)))
    }

    /// Runs the interactive consent flow and exchanges the resulting code for a token.
    ///
    /// The flow:
    /// 1. binds a redirect listener on a random localhost port
    /// 2. opens the user's browser on the consent page (the URL is printed too, in case no
    ///    browser can be opened)
    /// 3. waits for the redirect carrying the authorization code
    /// 4. exchanges the code (with its PKCE verifier) for a token
    ///
    /// The listener is torn down when this returns, whether or not the flow succeeded.
    #[tracing::instrument(skip(self))]
    pub(crate) async fn authenticate(&self, scopes: &[String]) -> eyre::Result<BasicTokenResponse> {
        let auth_uri = self.auth_uri.clone().ok_or_else(|| {
            Error::Config("client secrets do not name an authorization endpoint".to_string())
        })?;
        let auth_url = AuthUrl::new(auth_uri.clone())
            .wrap_err_with(|| Error::Config(format!("invalid authorization endpoint {auth_uri}")))?;

        let csrf = CsrfToken::new_random();
        let listener = RedirectListener::bind(csrf.clone(), OAUTH_DONE)
            .await
            .context("set up redirect endpoint")?;

        let mut client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(self.token_url()?)
            .set_redirect_uri(listener.url().clone());
        if let Some(secret) = &self.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (consent_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf)
            .add_scopes(scopes.iter().cloned().map(Scope::new))
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %consent_url, "asking user to follow OAuth flow");
        eprintln!("Please visit this URL to authorize this application: {consent_url}");
        if let Err(e) = webbrowser::open(consent_url.as_str()) {
            tracing::warn!(error = %e, "could not open browser, waiting for manual authorization");
        }

        let authorization_code = listener
            .authorization_code()
            .await
            .context("await user authorization code")?;

        let token = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http)
            .await
            .wrap_err(Error::Auth(
                "exchange authorization code for access token".to_string(),
            ))?;

        Ok(token)
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(new_token))` - refresh succeeded
    /// * `Ok(None)` - the authorization server no longer honors the refresh token
    ///   (`invalid_grant`), so the user has to consent again
    /// * `Err(_)` - network or other error during the exchange
    ///
    /// The returned token frequently lacks a refresh token of its own; callers should keep the
    /// one they already have in that case.
    #[tracing::instrument(skip_all)]
    pub(crate) async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        tracing::debug!("attempting to refresh OAuth token");

        let mut client =
            BasicClient::new(ClientId::new(self.client_id.clone())).set_token_uri(self.token_url()?);
        if let Some(secret) = &self.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }

        match client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
        {
            Ok(new_token) => {
                tracing::debug!("successfully refreshed OAuth token");
                Ok(Some(new_token))
            }
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref sr))
                if matches!(sr.error(), BasicErrorResponseType::InvalidGrant) =>
            {
                tracing::warn!("OAuth refresh token considered invalid grant: {}", e);
                Ok(None)
            }
            Err(e) => Err(e).wrap_err(Error::Auth("exchange refresh token".to_string())),
        }
    }
}

/// A short-lived HTTP listener on localhost that receives the consent redirect.
///
/// The server task is aborted when the listener is dropped, so the port never outlives the
/// consent flow.
#[derive(Debug)]
pub(crate) struct RedirectListener {
    url: RedirectUrl,
    outcome: oneshot::Receiver<eyre::Result<AuthorizationCode>>,
    server: JoinHandle<()>,
}

impl RedirectListener {
    /// Binds to a random localhost port and starts waiting for exactly one redirect.
    ///
    /// `csrf` is the `state` value the redirect must carry; `done_html` is the page shown to the
    /// user once the authorization code has been received.
    pub(crate) async fn bind(csrf: CsrfToken, done_html: &'static str) -> eyre::Result<Self> {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;
        let (tx, rx) = oneshot::channel();
        let server = tokio::spawn(async move {
            let r = async move {
                let (conn, _) = socket.accept().await.context("accept")?;
                let conn = hyper_util::rt::TokioIo::new(conn);
                let (got, mut gotten) = mpsc::channel(1);
                let service = service_fn(move |req: Request<body::Incoming>| {
                    let csrf = csrf.clone();
                    let got = got.clone();
                    async move {
                        let outcome = parse_callback(req.uri().query().unwrap_or(""), &csrf);
                        let response = match &outcome {
                            Ok(_) => Response::new(Full::<Bytes>::from(done_html)),
                            Err(reason) => {
                                let mut response = Response::new(Full::<Bytes>::from(format!(
                                    "Authorization failed: {reason}"
                                )));
                                *response.status_mut() = StatusCode::BAD_REQUEST;
                                response
                            }
                        };
                        // only the first callback matters; later ones find the receiver gone
                        let _ = got.send(outcome).await;
                        Ok::<_, Infallible>(response)
                    }
                });
                let mut serve = std::pin::pin!(
                    hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
                );

                tokio::select! {
                    exit = &mut serve => {
                        if let Err(e) = exit {
                            Err(e).context("redirect server got bad request")
                        } else {
                            eyre::bail!("redirect server exit prematurely");
                        }
                    }
                    outcome = gotten.recv() => {
                        serve.as_mut().graceful_shutdown();
                        // let the confirmation page reach the browser
                        let _ = tokio::time::timeout(RESPONSE_GRACE, serve).await;
                        let outcome = outcome
                            .ok_or_else(|| eyre::eyre!("redirect service dropped without a result"))?;
                        outcome.map_err(|reason| eyre::Report::new(Error::Auth(reason)))
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok(Self {
            url,
            outcome: rx,
            server,
        })
    }

    pub(crate) fn url(&self) -> &RedirectUrl {
        &self.url
    }

    /// Waits for the redirect and returns the authorization code it carried.
    pub(crate) async fn authorization_code(mut self) -> eyre::Result<AuthorizationCode> {
        (&mut self.outcome)
            .await
            .context("redirect future dropped prematurely")?
    }
}

impl Drop for RedirectListener {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Extracts the authorization code from the redirect's query string.
///
/// The `state` parameter must match `csrf`. An `error` parameter means the user (or the
/// server) declined the request.
fn parse_callback(query: &str, csrf: &CsrfToken) -> Result<AuthorizationCode, String> {
    let mut presented_state = None;
    let mut presented_code = None;
    let mut presented_error = None;
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        match &*k {
            "state" => presented_state = Some(v),
            "code" => presented_code = Some(v),
            "error" => presented_error = Some(v),
            _ => {}
        }
    }
    if presented_state.as_deref() != Some(csrf.secret().as_str()) {
        return Err("invalid csrf token".to_string());
    }
    if let Some(error) = presented_error {
        return Err(format!("consent was not granted ({error})"));
    }
    let Some(code) = presented_code else {
        return Err("no authorization code found".to_string());
    };
    Ok(AuthorizationCode::new(code.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubServer;
    use pretty_assertions::assert_eq;

    #[test]
    fn callback_with_matching_state_yields_code() {
        let csrf = CsrfToken::new("s3cr3t".to_string());
        let code = parse_callback("state=s3cr3t&code=4%2Fabc&scope=x", &csrf).unwrap();
        assert_eq!(code.secret(), "4/abc");
    }

    #[test]
    fn callback_with_wrong_state_is_rejected() {
        let csrf = CsrfToken::new("s3cr3t".to_string());
        let err = parse_callback("state=other&code=abc", &csrf).unwrap_err();
        assert_eq!(err, "invalid csrf token");
    }

    #[test]
    fn callback_with_error_is_rejected() {
        let csrf = CsrfToken::new("s3cr3t".to_string());
        let err = parse_callback("state=s3cr3t&error=access_denied", &csrf).unwrap_err();
        assert!(err.contains("access_denied"), "{err}");
    }

    #[test]
    fn callback_without_code_is_rejected() {
        let csrf = CsrfToken::new("s3cr3t".to_string());
        let err = parse_callback("state=s3cr3t", &csrf).unwrap_err();
        assert_eq!(err, "no authorization code found");
    }

    #[tokio::test]
    async fn redirect_listener_delivers_code() {
        let csrf = CsrfToken::new("xyz".to_string());
        let listener = RedirectListener::bind(csrf, "done").await.unwrap();
        let url = format!("{}/?state=xyz&code=the-code", listener.url().as_str());

        let browser = tokio::spawn(async move { ::reqwest::get(url).await?.text().await });
        let code = listener.authorization_code().await.unwrap();
        assert_eq!(code.secret(), "the-code");
        assert_eq!(browser.await.unwrap().unwrap(), "done");
    }

    #[tokio::test]
    async fn redirect_listener_reports_declined_consent() {
        let csrf = CsrfToken::new("xyz".to_string());
        let listener = RedirectListener::bind(csrf, "done").await.unwrap();
        let url = format!("{}/?state=xyz&error=access_denied", listener.url().as_str());

        let browser = tokio::spawn(async move { ::reqwest::get(url).await });
        let err = listener.authorization_code().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Auth(_))));
        let response = browser.await.unwrap().unwrap();
        assert_eq!(response.status(), ::reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn refresh_returns_new_token() {
        let server = StubServer::start(vec![(
            "/token",
            200,
            serde_json::json!({
                "access_token": "fresh",
                "token_type": "Bearer",
                "expires_in": 3599
            }),
        )])
        .await;
        let oauth = OAuthManager::new(
            "client",
            Some("secret".to_string()),
            None,
            server.url("/token"),
        )
        .unwrap();

        let token = oauth.refresh_token("r1").await.unwrap().unwrap();
        assert_eq!(
            oauth2::TokenResponse::access_token(&token).secret(),
            "fresh"
        );
        assert_eq!(server.requests(), vec!["POST /token".to_string()]);
    }

    #[tokio::test]
    async fn refresh_with_revoked_grant_is_none() {
        let server = StubServer::start(vec![(
            "/token",
            400,
            serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            }),
        )])
        .await;
        let oauth = OAuthManager::new("client", None, None, server.url("/token")).unwrap();

        assert!(oauth.refresh_token("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_server_failure_is_auth_error() {
        let server = StubServer::start(vec![(
            "/token",
            500,
            serde_json::json!({"error": "internal_failure"}),
        )])
        .await;
        let oauth = OAuthManager::new("client", None, None, server.url("/token")).unwrap();

        let err = oauth.refresh_token("r1").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Auth(_))));
    }
}
