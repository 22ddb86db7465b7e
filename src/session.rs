// Session state for one run: the base URL, fixed at startup, and the
// token obtained by logging in. Only a successful login sets the token.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    base_url: String,
    token: Option<String>,
}

impl Session {
    /// A fresh, unauthenticated session.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Establish the base URL from the config, falling back to asking the
    /// operator. Tokens persisted by earlier runs are never picked up.
    pub fn load<F>(config: &ClientConfig, prompt: F) -> anyhow::Result<Self>
    where
        F: FnOnce() -> anyhow::Result<String>,
    {
        let base_url = match &config.webservice {
            Some(url) => url.clone(),
            None => {
                println!("No base URL configured.");
                prompt()?.trim().to_string()
            }
        };
        info!(base_url = %base_url, "session started");
        Ok(Self::new(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of `path` under the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn require_token(&self) -> CommandResult<&str> {
        self.token().ok_or(CommandError::NotAuthenticated)
    }
}

/// Name of the per-user config file written after login.
pub fn user_config_path(dir: &Path, username: &str) -> PathBuf {
    dir.join(format!("blueseave-{username}-config.ini"))
}

/// Write `webservice` and `token` into the per-user config file under
/// `dir`, replacing any previous content.
pub fn persist(dir: &Path, username: &str, base_url: &str, token: &str) -> io::Result<PathBuf> {
    let path = user_config_path(dir, username);
    let mut file = File::create(&path)?;
    writeln!(file, "[client]")?;
    writeln!(file, "webservice = {}", escape_ini(base_url))?;
    writeln!(file, "token = {}", escape_ini(token))?;
    file.flush()?;
    info!(path = %path.display(), "session token saved");
    Ok(path)
}

/// Escape a value for an INI reader that unescapes backslash sequences
/// and treats `;` and `#` as comment markers.
fn escape_ini(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ';' => out.push_str("\\;"),
            '#' => out.push_str("\\#"),
            c => out.push(c),
        }
    }
    out
}
