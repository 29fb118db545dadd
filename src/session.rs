// Session resolution.
// Before any privileged operation a command has to make sure there is an
// authenticated session. The credentials can come from three places, in
// this order: an existing session (topped up with explicit flags), the
// explicit flags alone, or the persisted configuration. Picking between
// them is a pure decision (`plan_login`); applying the decision to the
// host application is `SessionResolver`'s job.

use crate::app::RestApp;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Starting point for crawls when a login does not name one.
pub const DEFAULT_STARTING_PATH: &str = "/redfish/v1/";

/// An established, authenticated connection.
///
/// Owned by the host application and cached between invocations. The
/// password fields are never written to the cache.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ClientSession {
    pub url: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(skip)]
    password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(skip)]
    pub bios_password: Option<String>,
    #[serde(default = "default_starting_path")]
    pub starting_path: String,
    #[serde(default)]
    pub include_logs: bool,
}

fn default_starting_path() -> String {
    DEFAULT_STARTING_PATH.to_string()
}

impl ClientSession {
    pub fn new(url: &str) -> Self {
        ClientSession {
            url: url.to_string(),
            starting_path: default_starting_path(),
            ..Default::default()
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn set_username(&mut self, username: &str) {
        self.username = Some(username.to_string());
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = Some(password.to_string());
    }

    fn credentials(&self) -> SessionCredentials {
        SessionCredentials {
            has_username: self.username.as_deref().is_some_and(|u| !u.is_empty()),
            has_password: self.password.as_deref().is_some_and(|p| !p.is_empty()),
        }
    }
}

impl fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("has_password", &self.password.is_some())
            .field("has_token", &self.token.is_some())
            .field("location", &self.location)
            .field("starting_path", &self.starting_path)
            .field("include_logs", &self.include_logs)
            .finish()
    }
}

/// What the resolver needs to know about an existing session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    pub has_username: bool,
    pub has_password: bool,
}

/// Connection flags as given on the command line. Empty strings count as
/// not given.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub bios_password: Option<String>,
    pub include_logs: bool,
    pub path: Option<String>,
}

impl ConnectionOptions {
    pub fn url(&self) -> Option<&str> {
        given(&self.url)
    }

    pub fn user(&self) -> Option<&str> {
        given(&self.user)
    }

    pub fn password(&self) -> Option<&str> {
        given(&self.password)
    }

    pub fn bios_password(&self) -> Option<&str> {
        given(&self.bios_password)
    }

    /// True when any of url, user or password was passed explicitly.
    pub fn has_explicit_connection(&self) -> bool {
        self.url().is_some() || self.user().is_some() || self.password().is_some()
    }
}

fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Arguments handed to the login collaborator.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginArgs {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub include_logs: bool,
    pub path: Option<String>,
}

impl LoginArgs {
    pub fn is_empty(&self) -> bool {
        self.to_command_line().is_empty()
    }

    /// The same arguments as a login command line, in fixed order:
    /// url, `-u user`, `-p password`, `--includelogs`, `--path P`.
    pub fn to_command_line(&self) -> Vec<String> {
        let mut line = Vec::new();
        if let Some(url) = &self.url {
            line.push(url.clone());
        }
        if let Some(user) = &self.username {
            line.extend(["-u".to_string(), user.clone()]);
        }
        if let Some(password) = &self.password {
            line.extend(["-p".to_string(), password.clone()]);
        }
        if self.include_logs {
            line.push("--includelogs".to_string());
        }
        if let Some(path) = &self.path {
            line.extend(["--path".to_string(), path.clone()]);
        }
        line
    }
}

impl fmt::Debug for LoginArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginArgs")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("include_logs", &self.include_logs)
            .field("path", &self.path)
            .finish()
    }
}

/// Outcome of the credential precedence decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPlan {
    /// A session exists. Fill in the credentials it lacks and push the
    /// secondary password, if any. No login.
    Reuse {
        username: Option<String>,
        password: Option<String>,
        secondary_password: Option<String>,
    },
    /// No session. Log in with these arguments. `local` is set when
    /// neither flags nor configuration supplied anything.
    Login { args: LoginArgs, local: bool },
}

impl SessionPlan {
    pub fn requires_login(&self) -> bool {
        matches!(self, SessionPlan::Login { .. })
    }

    pub fn login_args(&self) -> Option<&LoginArgs> {
        match self {
            SessionPlan::Login { args, .. } => Some(args),
            SessionPlan::Reuse { .. } => None,
        }
    }
}

/// Decide how to obtain a session.
///
/// `existing` describes the current session, or is `None` when there is
/// none. `augment` controls whether the include-logs and starting-path
/// options are forwarded to the login.
pub fn plan_login(
    options: &ConnectionOptions,
    existing: Option<SessionCredentials>,
    config: &Config,
    augment: bool,
) -> SessionPlan {
    if let Some(current) = existing {
        // An existing session wins over partial credentials.
        let (mut username, mut password) = (None, None);
        if let (Some(user), Some(pass)) = (options.user(), options.password()) {
            if !current.has_username {
                username = Some(user.to_string());
            }
            if !current.has_password {
                password = Some(pass.to_string());
            }
        }
        return SessionPlan::Reuse {
            username,
            password,
            secondary_password: options.bios_password().map(str::to_string),
        };
    }

    let mut args = if options.has_explicit_connection() {
        LoginArgs {
            url: options.url().map(str::to_string),
            username: options.user().map(str::to_string),
            password: options.password().map(str::to_string),
            ..Default::default()
        }
    } else {
        LoginArgs {
            url: config.url().map(str::to_string),
            username: config.username().map(str::to_string),
            password: config.password().map(str::to_string),
            ..Default::default()
        }
    };
    let local = args.is_empty();

    if augment {
        args.include_logs = options.include_logs;
        args.path = given(&options.path).map(str::to_string);
    }

    SessionPlan::Login { args, local }
}

/// Applies `plan_login` to the host application.
#[derive(Debug, Clone, Copy)]
pub struct SessionResolver {
    augment: bool,
    skip_build: bool,
}

impl SessionResolver {
    /// Resolver for commands that read data: forwards include-logs and
    /// starting path, and lets the login build its derived state.
    pub fn full() -> Self {
        SessionResolver {
            augment: true,
            skip_build: false,
        }
    }

    /// Resolver for raw requests: only url, user and password are
    /// forwarded and the login skips building derived state.
    pub fn lightweight() -> Self {
        SessionResolver {
            augment: false,
            skip_build: true,
        }
    }

    /// Work out what has to happen without changing anything.
    pub fn resolve<A: RestApp + ?Sized>(
        &self,
        app: &mut A,
        options: &ConnectionOptions,
    ) -> CliResult<SessionPlan> {
        let existing = match app.current_session() {
            Ok(session) => Some(session.credentials()),
            Err(CliError::NoCurrentSession) => None,
            Err(e) => return Err(e),
        };
        Ok(plan_login(options, existing, app.config(), self.augment))
    }

    /// Resolve and carry out the plan. Returns the plan that was applied.
    pub fn run<A: RestApp + ?Sized>(
        &self,
        app: &mut A,
        options: &ConnectionOptions,
    ) -> CliResult<SessionPlan> {
        let plan = self.resolve(app, options)?;
        match &plan {
            SessionPlan::Reuse {
                username,
                password,
                secondary_password,
            } => {
                if username.is_some() || password.is_some() {
                    let session = app.current_session()?;
                    if let Some(username) = username {
                        debug!("Adding username to the current session");
                        session.set_username(username);
                    }
                    if let Some(password) = password {
                        debug!("Adding password to the current session");
                        session.set_password(password);
                    }
                }
                if let Some(secondary) = secondary_password {
                    app.set_secondary_password(secondary)?;
                }
            }
            SessionPlan::Login { args, local } => {
                if *local {
                    app.local_login_notice();
                }
                info!(?args, skip_build = self.skip_build, "Logging in");
                app.login(args, self.skip_build)?;
            }
        }
        Ok(plan)
    }
}
