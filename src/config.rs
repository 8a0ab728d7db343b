use anyhow::{anyhow, Context, Result};
use netrc_rs::Netrc;
use serde::Deserialize;

pub const USERNAME_ENV_VAR: &str = "ASUS_API_USERNAME";
pub const PASSWORD_ENV_VAR: &str = "ASUS_API_PASSWORD";

#[derive(Deserialize)]
pub struct Config {
    pub router: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Fully resolved settings handed to the router client. Credential lookup
/// happens here, before construction, never inside the client.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub host: String,
    pub username: String,
    pub password: String,
}

pub fn get_config() -> Result<Config> {
    let config = std::fs::read_to_string("config.dhall").context("Unable to read config.dhall")?;
    let config = serde_dhall::from_str(&config)
        .parse()
        .context("Failed to parse config.dhall")?;
    Ok(config)
}

impl Config {
    /// Environment variables take precedence over `config.dhall`; a password
    /// found in neither is looked up in `~/.netrc` under the router's host.
    pub fn router_settings(&self) -> Result<RouterSettings> {
        let username = resolve(std::env::var(USERNAME_ENV_VAR).ok(), self.username.as_ref())
            .ok_or_else(|| {
                anyhow!("No username in {USERNAME_ENV_VAR} or config.dhall")
            })?;
        let password = match resolve(std::env::var(PASSWORD_ENV_VAR).ok(), self.password.as_ref()) {
            Some(password) => password,
            None => netrc_password(&self.router)
                .with_context(|| format!("Failed to get password for {}", self.router))?,
        };
        Ok(RouterSettings {
            host: self.router.clone(),
            username,
            password,
        })
    }
}

fn resolve(from_env: Option<String>, from_config: Option<&String>) -> Option<String> {
    from_env.or_else(|| from_config.cloned())
}

fn netrc_password(machine: &str) -> Result<String> {
    let home = home::home_dir().ok_or_else(|| anyhow!("Unable to find home dir"))?;
    let netrc = std::fs::read_to_string(home.join(".netrc")).context("Unable to read .netrc")?;
    let netrc = Netrc::parse(netrc, false).map_err(|e| anyhow!("unable to parse .netrc: {e}"))?;
    let password = netrc
        .machines
        .into_iter()
        .find(|m| m.name == Some(machine.into()))
        .ok_or_else(|| anyhow!("Could not find {machine} in .netrc"))?
        .password
        .ok_or_else(|| anyhow!("No password for {machine} in .netrc"))?;
    Ok(password)
}
