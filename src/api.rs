// API client module: a small blocking HTTP client for Redfish services.
// It knows how to open and close a session and how to GET and PUT
// resources. It holds no session state itself; callers pass the base url
// and the credentials to use on every call.

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

const SESSIONS_PATH: &str = "/redfish/v1/SessionService/Sessions/";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// How a request authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Token(String),
    Basic { username: String, password: String },
    None,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Token(_) => write!(f, "Auth::Token"),
            Auth::Basic { username, .. } => write!(f, "Auth::Basic({username})"),
            Auth::None => write!(f, "Auth::None"),
        }
    }
}

/// Session login request payload.
#[derive(Serialize)]
struct SessionRequest<'a> {
    #[serde(rename = "UserName")]
    user_name: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
}

/// What a successful session login hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub token: String,
    /// Session resource, used to delete the session on logout.
    pub location: Option<String>,
}

/// A response body with its status and headers.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub text: String,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// BMCs usually present self-signed certificates, so certificate
    /// validation is off.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient { client })
    }

    /// Create a Redfish session and return its token.
    pub fn login(&self, base_url: &str, username: &str, password: &str) -> Result<SessionTokens> {
        let url = join_url(base_url, SESSIONS_PATH);
        let res = self
            .client
            .post(&url)
            .json(&SessionRequest {
                user_name: username,
                password,
            })
            .send()
            .with_context(|| format!("Failed to send login request to {base_url}"))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_default();
            anyhow::bail!("Login failed: {} - {}", status, txt);
        }
        let header = |name: &str| {
            res.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let token = header(AUTH_TOKEN_HEADER)
            .context("Login response did not include an X-Auth-Token header")?;
        Ok(SessionTokens {
            token,
            location: header("location"),
        })
    }

    /// Delete a session created by `login`.
    pub fn logout(&self, base_url: &str, location: &str, token: &str) -> Result<()> {
        let url = join_url(base_url, location);
        let res = self
            .client
            .delete(&url)
            .header(AUTH_TOKEN_HEADER, token)
            .send()
            .context("Failed to send logout request")?;
        if !res.status().is_success() {
            anyhow::bail!("Logout failed: {}", res.status());
        }
        Ok(())
    }

    /// GET a resource and parse it as JSON.
    pub fn get(&self, base_url: &str, path: &str, auth: &Auth) -> Result<Value> {
        let url = join_url(base_url, path);
        let res = authenticate(self.client.get(&url), auth)
            .send()
            .with_context(|| format!("Failed to send GET {path}"))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_default();
            anyhow::bail!("GET {} failed: {} - {}", path, status, txt);
        }
        res.json().with_context(|| format!("Parsing response of GET {path}"))
    }

    /// PUT a JSON body. Error statuses are returned, not raised, so the
    /// caller can show whatever the service said.
    pub fn put(
        &self,
        base_url: &str,
        path: &str,
        body: &Value,
        auth: &Auth,
        headers: HeaderMap,
    ) -> Result<RawResponse> {
        let url = join_url(base_url, path);
        let res = authenticate(self.client.put(&url), auth)
            .headers(headers)
            .json(body)
            .send()
            .with_context(|| format!("Failed to send PUT {path}"))?;
        let status = res.status().as_u16();
        let headers = res
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let text = res.text().context("Reading PUT response body")?;
        Ok(RawResponse {
            status,
            headers,
            text,
        })
    }
}

fn authenticate(req: RequestBuilder, auth: &Auth) -> RequestBuilder {
    match auth {
        Auth::Token(token) => req.header(AUTH_TOKEN_HEADER, token),
        Auth::Basic { username, password } => req.basic_auth(username, Some(password)),
        Auth::None => req,
    }
}

/// Join a base url and a resource path. Absolute urls pass through.
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
