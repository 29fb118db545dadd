// Host application.
// `RestApp` is the seam between command handlers and everything that
// talks to the network or owns long-lived state. Handlers only ever see
// `&mut impl RestApp`, which keeps them testable with an in-memory fake.
// `App` is the real implementation: it owns the current session, caches
// it on disk between runs and uses `ApiClient` for HTTP.

use crate::api::{ApiClient, Auth};
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::session::{ClientSession, LoginArgs};
use crate::ui;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extra request headers, name to value.
pub type HeaderSet = BTreeMap<String, String>;

pub const BIOS_PASSWORD_HEADER: &str = "x-hprestfulapi-authtoken";
pub const PROVIDER_ID_HEADER: &str = "x-chrp-ris-provider-id";

/// Everything a PUT dispatch needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutRequest {
    pub path: String,
    pub body: Value,
    pub verbose: bool,
    pub session_id: Option<String>,
    /// Pre-resolved base url, used together with `session_id`.
    pub url: Option<String>,
    pub headers: HeaderSet,
    pub want_response: bool,
    pub silent: bool,
    pub bios_password: Option<String>,
    pub service: bool,
    pub provider_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub text: String,
    pub response_requested: bool,
}

/// Operations command handlers need from the host application.
pub trait RestApp {
    /// The active session, or `CliError::NoCurrentSession`.
    fn current_session(&mut self) -> CliResult<&mut ClientSession>;

    /// Store a second-factor (BIOS) password for later requests.
    fn set_secondary_password(&mut self, password: &str) -> CliResult<()>;

    fn config(&self) -> &Config;

    /// Tell the user a local login is being attempted.
    fn local_login_notice(&mut self);

    /// Establish a new session. `skip_build` skips building derived state
    /// after authenticating.
    fn login(&mut self, args: &LoginArgs, skip_build: bool) -> Result<()>;

    /// Issue one PUT. Returns an outcome only when a response was wanted.
    fn put(&mut self, request: PutRequest) -> Result<Option<DispatchOutcome>>;

    /// GET a resource with the current session.
    fn get(&mut self, path: &str) -> Result<Value>;

    /// End the current session. Returns false when there was none.
    fn logout(&mut self) -> Result<bool>;
}

pub struct App {
    config: Config,
    api: ApiClient,
    session: Option<ClientSession>,
    cache_path: PathBuf,
}

impl App {
    /// Build the application from configuration, picking up a cached
    /// session from a previous run when there is one.
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new()?;
        let cache_path = config.session_cache_path();
        let session = match load_session(&cache_path) {
            Ok(session) => session,
            Err(e) => {
                warn!("Ignoring unreadable session cache {}: {e:#}", cache_path.display());
                None
            }
        };
        Ok(App {
            config,
            api,
            session,
            cache_path,
        })
    }

    fn session_auth(session: &ClientSession) -> Auth {
        match (&session.token, session.username(), session.password()) {
            (Some(token), _, _) => Auth::Token(token.clone()),
            (None, Some(user), Some(password)) => Auth::Basic {
                username: user.to_string(),
                password: password.to_string(),
            },
            _ => Auth::None,
        }
    }
}

impl RestApp for App {
    fn current_session(&mut self) -> CliResult<&mut ClientSession> {
        self.session.as_mut().ok_or(CliError::NoCurrentSession)
    }

    fn set_secondary_password(&mut self, password: &str) -> CliResult<()> {
        if password.is_empty() {
            return Err(CliError::SecondaryAuthRejected(
                "the password is empty".to_string(),
            ));
        }
        let session = self.session.as_mut().ok_or_else(|| {
            CliError::SecondaryAuthRejected("there is no active session".to_string())
        })?;
        session.bios_password = Some(password.to_string());
        Ok(())
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn local_login_notice(&mut self) {
        ui::local_login_notice();
    }

    fn login(&mut self, args: &LoginArgs, skip_build: bool) -> Result<()> {
        let Some(url) = args.url.as_deref() else {
            anyhow::bail!("Local login is not available; supply --url or configure a url");
        };
        let url = normalize_url(url);
        let Some(username) = args.username.as_deref() else {
            anyhow::bail!("A username is required to log in to {url}");
        };
        let password = match args.password.as_deref() {
            Some(password) => password.to_string(),
            None if std::io::stdin().is_terminal() => ui::prompt_password(username)?,
            None => anyhow::bail!("A password is required to log in to {url}"),
        };

        let tokens = self.api.login(&url, username, &password)?;

        let mut session = ClientSession::new(&url);
        session.set_username(username);
        session.set_password(&password);
        session.token = Some(tokens.token);
        session.location = tokens.location;
        session.include_logs = args.include_logs;
        if let Some(path) = &args.path {
            session.starting_path = path.clone();
        }

        if !skip_build {
            let root = self
                .api
                .get(&url, &session.starting_path, &Self::session_auth(&session))
                .with_context(|| format!("Unable to read {}", session.starting_path))?;
            let root_type = root
                .get("@odata.type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("untyped");
            debug!(
                "Connected to {url}, starting path {} is {root_type}",
                session.starting_path
            );
        }

        persist_session(&self.cache_path, &session)?;
        self.session = Some(session);
        Ok(())
    }

    fn put(&mut self, request: PutRequest) -> Result<Option<DispatchOutcome>> {
        let base_url = match (&request.url, &self.session) {
            (Some(url), _) => url.clone(),
            (None, Some(session)) => session.url.clone(),
            (None, None) => anyhow::bail!("No URL available for the request; log in first"),
        };

        let auth = match (&request.session_id, &self.session) {
            (Some(id), _) => Auth::Token(id.clone()),
            (None, Some(session)) => Self::session_auth(session),
            (None, None) => match (&request.username, &request.password) {
                (Some(username), Some(password)) => Auth::Basic {
                    username: username.clone(),
                    password: password.clone(),
                },
                _ => Auth::None,
            },
        };

        let mut headers = HeaderMap::new();
        let bios_password = request.bios_password.clone().or_else(|| {
            self.session
                .as_ref()
                .and_then(|s| s.bios_password.clone())
        });
        if let Some(bios) = bios_password {
            headers.insert(
                HeaderName::from_static(BIOS_PASSWORD_HEADER),
                HeaderValue::from_str(&hash_bios_password(&bios))?,
            );
        }
        if let Some(provider) = &request.provider_id {
            headers.insert(
                HeaderName::from_static(PROVIDER_ID_HEADER),
                HeaderValue::from_str(provider).context("Invalid provider id")?,
            );
        }
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name '{name}'"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header '{name}'"))?;
            headers.insert(name, value);
        }

        if request.verbose {
            debug!(path = %request.path, body = %request.body, "PUT");
        }

        let spinner = (!request.silent).then(|| ui::spinner("Sending PUT request..."));
        let result = self
            .api
            .put(&base_url, &request.path, &request.body, &auth, headers);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        let response = result?;

        if !request.silent {
            ui::report_status(response.status, &response.text, request.verbose && !request.service);
        }

        Ok(request.want_response.then(|| DispatchOutcome {
            status: response.status,
            headers: response.headers,
            text: response.text,
            response_requested: true,
        }))
    }

    fn get(&mut self, path: &str) -> Result<Value> {
        let Some(session) = &self.session else {
            anyhow::bail!("Not logged in");
        };
        self.api.get(&session.url, path, &Self::session_auth(session))
    }

    fn logout(&mut self) -> Result<bool> {
        let Some(session) = self.session.take() else {
            return Ok(false);
        };
        if let (Some(location), Some(token)) = (&session.location, &session.token) {
            if let Err(e) = self.api.logout(&session.url, location, token) {
                warn!("Unable to delete session on {}: {e:#}", session.url);
            }
        }
        match std::fs::remove_file(&self.cache_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Unable to remove {}", self.cache_path.display())
                })
            }
        }
        Ok(true)
    }
}

/// Add `https://` when the url carries no scheme.
pub fn normalize_url(url: &str) -> String {
    if url.contains("://") {
        url.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", url.trim_end_matches('/'))
    }
}

/// BIOS passwords travel as the upper-case hex SHA-256 of the password.
pub fn hash_bios_password(password: &str) -> String {
    hex::encode_upper(Sha256::digest(password.as_bytes()))
}

/// Persist the session into the cache file.
fn persist_session(path: &Path, session: &ClientSession) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Unable to create {}", dir.display()))?;
    }
    let data = serde_json::to_string_pretty(session)?;
    write_private(path, data.as_bytes())
        .with_context(|| format!("Unable to write {}", path.display()))?;
    Ok(())
}

/// The cache holds a bearer token: owner read/write only.
#[cfg(unix)]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(data)
}

#[cfg(not(unix))]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, data)
}

/// Load the session from the cache file, if one was saved.
fn load_session(path: &Path) -> Result<Option<ClientSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    let session = serde_json::from_str(&data).context("Parsing session cache")?;
    Ok(Some(session))
}
