// In-memory host application that records every collaborator call.

#![allow(dead_code)]

use redfish_cli::config::Config;
use redfish_cli::session::{ClientSession, LoginArgs};
use redfish_cli::{CliError, CliResult, DispatchOutcome, PutRequest, RestApp};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;

#[derive(Default)]
pub struct FakeApp {
    pub config: Config,
    pub session: Option<ClientSession>,
    pub logins: Vec<(LoginArgs, bool)>,
    pub puts: Vec<PutRequest>,
    pub gets: Vec<String>,
    pub secondary_passwords: Vec<String>,
    pub reject_secondary: bool,
    pub fail_login: bool,
    pub local_login_notices: usize,
    pub resources: HashMap<String, Value>,
    pub response: DispatchOutcome,
}

impl FakeApp {
    pub fn new() -> Self {
        FakeApp {
            response: DispatchOutcome {
                status: 200,
                headers: BTreeMap::from([("X".to_string(), "1".to_string())]),
                text: "ok".to_string(),
                response_requested: true,
            },
            ..Default::default()
        }
    }

    pub fn with_session(mut self, username: Option<&str>, password: Option<&str>) -> Self {
        let mut session = ClientSession::new("https://bmc.lab");
        session.token = Some("token".to_string());
        if let Some(username) = username {
            session.set_username(username);
        }
        if let Some(password) = password {
            session.set_password(password);
        }
        self.session = Some(session);
        self
    }

    pub fn with_config(mut self, url: &str, username: &str, password: &str) -> Self {
        self.config = Config {
            url: Some(url.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            cache_dir: None,
        };
        self
    }

    pub fn network_calls(&self) -> usize {
        self.logins.len() + self.puts.len() + self.gets.len()
    }
}

impl RestApp for FakeApp {
    fn current_session(&mut self) -> CliResult<&mut ClientSession> {
        self.session.as_mut().ok_or(CliError::NoCurrentSession)
    }

    fn set_secondary_password(&mut self, password: &str) -> CliResult<()> {
        if self.reject_secondary {
            return Err(CliError::SecondaryAuthRejected("rejected".to_string()));
        }
        self.secondary_passwords.push(password.to_string());
        Ok(())
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn local_login_notice(&mut self) {
        self.local_login_notices += 1;
    }

    fn login(&mut self, args: &LoginArgs, skip_build: bool) -> anyhow::Result<()> {
        self.logins.push((args.clone(), skip_build));
        if self.fail_login {
            anyhow::bail!("Login failed: 401 Unauthorized");
        }
        let mut session = ClientSession::new(args.url.as_deref().unwrap_or("https://localhost"));
        session.token = Some("new-token".to_string());
        session.include_logs = args.include_logs;
        if let Some(path) = &args.path {
            session.starting_path = path.clone();
        }
        self.session = Some(session);
        Ok(())
    }

    fn put(&mut self, request: PutRequest) -> anyhow::Result<Option<DispatchOutcome>> {
        let want = request.want_response;
        self.puts.push(request);
        Ok(want.then(|| self.response.clone()))
    }

    fn get(&mut self, path: &str) -> anyhow::Result<Value> {
        self.gets.push(path.to_string());
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("GET {path} failed: 404 Not Found"))
    }

    fn logout(&mut self) -> anyhow::Result<bool> {
        Ok(self.session.take().is_some())
    }
}

/// Write `contents` to a fresh instruction file. Keep the directory alive
/// for as long as the file is needed.
pub fn instruction_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("instruction.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}
