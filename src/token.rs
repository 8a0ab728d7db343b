use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

/// Opaque session credential handed out by the router's login endpoint.
/// An empty token means "not authenticated".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AsusToken(String);

impl AsusToken {
    pub fn new(value: &str) -> Self {
        AsusToken(value.trim().to_owned())
    }

    pub fn empty() -> Self {
        AsusToken(String::new())
    }

    /// Pulls the token value out of a `Set-Cookie` header such as
    /// `asus_token=1070711480134875637378320976216; HttpOnly;`. A missing or
    /// empty header yields an empty token rather than an error; the router
    /// only ever sends a single cookie on this endpoint.
    pub fn from_set_cookie(header: Option<&str>) -> Self {
        let value = header
            .and_then(|h| h.split(';').next())
            .and_then(|pair| pair.split_once('='))
            .map(|(_, value)| value)
            .unwrap_or_default();
        AsusToken::new(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_authenticated(&self) -> bool {
        !self.0.is_empty()
    }
}

/// Owns the on-disk location of the session token, a single-line file in the
/// user's home directory.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    const TOKEN_FILE_NAME: &'static str = "asus_token";

    pub fn in_home_dir() -> Result<Self> {
        let home = home::home_dir().ok_or_else(|| anyhow!("Unable to find home dir"))?;
        Ok(TokenStore {
            path: home.join(Self::TOKEN_FILE_NAME),
        })
    }

    pub fn at_path(path: &Path) -> Self {
        TokenStore {
            path: path.to_owned(),
        }
    }

    /// Missing file is a normal state (never logged in on this machine) and
    /// yields an empty token; any other read failure propagates.
    pub fn load(&self) -> Result<AsusToken> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(AsusToken::new(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No token file at {}", self.path.display());
                Ok(AsusToken::empty())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    pub fn save(&self, token: &AsusToken) -> Result<()> {
        std::fs::write(&self.path, token.as_str())
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
