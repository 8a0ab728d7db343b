use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use early::Early;
use reqwest::header::{COOKIE, REFERER, SET_COOKIE};
use tracing::{info, trace, warn};

use crate::config::RouterSettings;
use crate::parse;
use crate::payload::BlockPayload;
use crate::router::{Client, ConnectionSample, Router};
use crate::token::{AsusToken, TokenStore};

/// Client for the ASUS stock firmware's administrative interface. Calls are
/// blocking, single-attempt round trips; a caller that hits a stale session
/// should `login()` and retry (see the status command in `main.rs`).
///
/// Not safe to share across threads without external synchronization: a
/// `login()` replaces the token other calls read.
#[derive(Debug)]
pub struct AsusRouter {
    http_client: reqwest::blocking::Client,
    login_url: String,
    login_referer: String,
    client_list_url: String,
    status_url: String,
    apply_url: String,
    username: String,
    password: String,
    token: AsusToken,
    token_store: TokenStore,
}

impl AsusRouter {
    pub fn new(settings: &RouterSettings) -> Result<Self> {
        let router = Early::new("http", &settings.host);
        let token_store = TokenStore::in_home_dir()?;
        let token = token_store.load()?;
        let http_client = reqwest::blocking::Client::builder()
            .build()
            .context("Failed to build http client")?;

        Ok(AsusRouter {
            login_url: router.clone().path("login.cgi").build(),
            login_referer: router.clone().path("Main_Login.asp").build(),
            client_list_url: router.clone().path("update_clients.asp").build(),
            status_url: router.clone().path("Main_WStatus_Content.asp").build(),
            apply_url: router.path("start_apply2.htm").build(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            token,
            token_store,
            http_client,
        })
    }

    /// Authenticates against the router and persists the new session token.
    /// Bad credentials do not error: the router answers with an empty
    /// `Set-Cookie`, which leaves the token empty.
    pub fn login(&mut self) -> Result<()> {
        info!("Logging in on: {}", self.login_url);
        let response = self
            .http_client
            .post(&self.login_url)
            .header(REFERER, &self.login_referer)
            .form(&[("login_authorization", self.credentials_b64())])
            .send()
            .context("Login request to router failed")?;

        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok());
        self.token = AsusToken::from_set_cookie(set_cookie);
        if !self.token.is_authenticated() {
            warn!("Login failed, router sent no session cookie");
            return Ok(());
        }
        self.token_store
            .save(&self.token)
            .context("Failed to persist session token")?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_authenticated()
    }

    fn credentials_b64(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.password))
    }

    fn cookie_header(&self) -> String {
        format!("asus_token={}", self.token.as_str())
    }
}

impl Router for AsusRouter {
    fn connected_clients(&self) -> Result<Vec<Client>> {
        info!("Getting connected clients from: {}", self.client_list_url);
        // This endpoint answers without a session cookie.
        let raw = self
            .http_client
            .get(&self.client_list_url)
            .send()
            .context("Client list request failed")?
            .error_for_status()?
            .text()?;
        trace!("Client list blob: {raw}");
        Ok(parse::parse_clients(&raw))
    }

    fn client_connection_statuses(&self) -> Result<Vec<ConnectionSample>> {
        info!("Getting connection statuses from: {}", self.status_url);
        let html = self
            .http_client
            .get(&self.status_url)
            .header(COOKIE, self.cookie_header())
            .send()
            .context("Connection status request failed")?
            .error_for_status()?
            .text()?;
        Ok(parse::parse_connection_status_page(&html))
    }

    fn block_clients(&self, macs: &[String]) -> Result<String> {
        info!("Applying block list of {} clients", macs.len());
        let ack = self
            .http_client
            .post(&self.apply_url)
            .header(COOKIE, self.cookie_header())
            .form(&BlockPayload::for_macs(macs))
            .send()
            .context("Block request failed")?
            .error_for_status()?
            .text()?;
        // The router acknowledges with a page this system does not interpret.
        Ok(ack)
    }

    fn unblock_all_clients(&self) -> Result<String> {
        self.block_clients(&[])
    }
}
