// Raw PUT: send one request whose path and body come verbatim from a JSON
// file. Every validation step runs before anything touches the network,
// so a bad file or a bad --headers value never leaves a half-done login
// or request behind.

use crate::app::{DispatchOutcome, HeaderSet, PutRequest, RestApp};
use crate::cli::RawPutOptions;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::session::{ConnectionOptions, SessionResolver};
use crate::ui;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use std::io::Write;
use tracing::debug;

const SECURE_SCHEME: &str = "https://";

/// The `path` and `body` of an input file.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInstruction {
    pub path: String,
    pub body: Value,
}

impl From<&RawPutOptions> for ConnectionOptions {
    fn from(options: &RawPutOptions) -> Self {
        ConnectionOptions {
            url: options.url.clone(),
            user: options.user.clone(),
            password: options.password.clone(),
            bios_password: options.biospassword.clone(),
            ..Default::default()
        }
    }
}

/// Pick the single input file out of the positional arguments and parse
/// it as JSON. Returns the file name with the document.
pub fn read_input_file(files: &[String]) -> CliResult<(&str, Value)> {
    let file = match files {
        [file] => file.as_str(),
        [] => {
            return Err(CliError::InvalidCommandLine(
                "Missing raw put file input argument.".to_string(),
            ))
        }
        _ => {
            return Err(CliError::InvalidCommandLine(
                "Raw put only takes 1 argument.".to_string(),
            ))
        }
    };
    let contents =
        std::fs::read_to_string(file).map_err(|e| CliError::InvalidFileInput(format!("{file}: {e}")))?;
    let document =
        serde_json::from_str(&contents).map_err(|e| CliError::InvalidFileInput(format!("{file}: {e}")))?;
    Ok((file, document))
}

/// Parse `NAME:VALUE,NAME:VALUE`. Later duplicates win. Names and values
/// must be valid on the wire.
pub fn parse_headers(raw: &str) -> CliResult<HeaderSet> {
    let mut headers = HeaderSet::new();
    for item in raw.split(',') {
        match item.split_once(':') {
            Some((name, value))
                if !value.contains(':')
                    && HeaderName::from_bytes(name.as_bytes()).is_ok()
                    && HeaderValue::from_str(value).is_ok() =>
            {
                headers.insert(name.to_string(), value.to_string());
            }
            _ => return Err(CliError::InvalidHeaderFormat(item.to_string())),
        }
    }
    Ok(headers)
}

/// Check that the document carries a string `path` and a `body`.
pub fn validate_instruction(file: &str, mut document: Value) -> CliResult<RequestInstruction> {
    let path = document.get("path").and_then(Value::as_str).map(str::to_string);
    let body = document.get_mut("body").map(Value::take);
    match (path, body) {
        (Some(path), Some(body)) => Ok(RequestInstruction { path, body }),
        _ => Err(CliError::InvalidFileFormatting(format!(
            "Input file '{file}' was not formatted properly."
        ))),
    }
}

/// Target url for the session id shortcut: the explicit url when any
/// connection flag was given, the configured one otherwise, always with
/// the secure scheme.
pub fn session_id_url(options: &ConnectionOptions, config: &Config) -> Option<String> {
    let url = if options.has_explicit_connection() {
        options.url()
    } else {
        config.url()
    }?;
    let secure = url
        .get(..SECURE_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(SECURE_SCHEME));
    if secure {
        Some(url.to_string())
    } else {
        Some(format!("{SECURE_SCHEME}{url}"))
    }
}

/// Validate the input, make sure there is a session, and send the PUT.
pub fn execute<A: RestApp + ?Sized>(
    app: &mut A,
    options: &RawPutOptions,
    verbose: bool,
) -> CliResult<Option<DispatchOutcome>> {
    let (file, document) = read_input_file(&options.files)?;
    let headers = match options.headers.as_deref() {
        Some(raw) => parse_headers(raw)?,
        None => HeaderSet::new(),
    };
    let instruction = validate_instruction(file, document)?;

    let connection = ConnectionOptions::from(options);
    let session_id = options.sessionid.clone().filter(|id| !id.is_empty());
    let url = if session_id.is_some() {
        let url = session_id_url(&connection, app.config());
        debug!(?url, "Using session id instead of logging in");
        url
    } else {
        SessionResolver::lightweight().run(app, &connection)?;
        None
    };

    let want_response = options.response || options.getheaders;
    let request = PutRequest {
        path: instruction.path,
        body: instruction.body,
        verbose,
        session_id,
        url,
        headers,
        want_response,
        silent: options.silent,
        bios_password: connection.bios_password().map(str::to_string),
        service: options.service,
        provider_id: options.providerid.clone(),
        username: options.user.clone(),
        password: options.password.clone(),
    };
    Ok(app.put(request)?)
}

/// `rawput` command: execute and print whatever was asked for.
pub fn run<A: RestApp + ?Sized>(
    app: &mut A,
    options: &RawPutOptions,
    verbose: bool,
    out: &mut impl Write,
) -> CliResult<()> {
    if let Some(outcome) = execute(app, options, verbose)? {
        ui::render_outcome(out, &outcome, options.getheaders, options.response)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn headers_parse_into_map() {
        let headers = parse_headers("A:1,B:2").unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["A"], "1");
        assert_eq!(headers["B"], "2");
    }

    #[test]
    fn header_values_may_be_empty() {
        let headers = parse_headers("If-Match:").unwrap();
        assert_eq!(headers["If-Match"], "");
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for raw in ["A:1,Bbad", "", "A:1,", ":1", "A:1:2", "A:1, B:2", "Bad Name:1", "A:line\nbreak"] {
            let err = parse_headers(raw).unwrap_err();
            assert!(
                matches!(err, CliError::InvalidHeaderFormat(_)),
                "{raw:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn instruction_needs_path_and_body() {
        let ok = validate_instruction("f.json", json!({"path": "/x", "body": {"k": "v"}, "extra": 1}))
            .unwrap();
        assert_eq!(ok.path, "/x");
        assert_eq!(ok.body, json!({"k": "v"}));

        for doc in [
            json!({"body": {}}),
            json!({"path": "/x"}),
            json!({"path": 7, "body": {}}),
            json!([1, 2]),
        ] {
            let err = validate_instruction("f.json", doc).unwrap_err();
            assert_eq!(err.to_string(), "Input file 'f.json' was not formatted properly.");
        }
    }

    #[test]
    fn null_body_is_still_a_body() {
        let ok = validate_instruction("f.json", json!({"path": "/x", "body": null})).unwrap();
        assert_eq!(ok.body, Value::Null);
    }

    #[test]
    fn file_count_is_checked_first() {
        let err = read_input_file(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Missing raw put file input argument.");

        // Neither file exists, so reaching a read would give a file error.
        let err = read_input_file(&["a.json".to_string(), "b.json".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::InvalidCommandLine(_)));
    }

    #[test]
    fn unreadable_file_is_file_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json").display().to_string();
        let err = read_input_file(&[missing]).unwrap_err();
        assert!(matches!(err, CliError::InvalidFileInput(_)));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ path: ").unwrap();
        let err = read_input_file(&[bad.display().to_string()]).unwrap_err();
        assert!(matches!(err, CliError::InvalidFileInput(_)));
    }

    #[test]
    fn session_id_url_precedence() {
        let config = Config {
            url: Some("config.bmc".to_string()),
            ..Default::default()
        };

        let explicit = ConnectionOptions {
            url: Some("host.example".to_string()),
            ..Default::default()
        };
        assert_eq!(
            session_id_url(&explicit, &config).as_deref(),
            Some("https://host.example")
        );

        let none = ConnectionOptions::default();
        assert_eq!(
            session_id_url(&none, &config).as_deref(),
            Some("https://config.bmc")
        );

        // An explicit user without url means no url, not the configured one.
        let user_only = ConnectionOptions {
            user: Some("admin".to_string()),
            ..Default::default()
        };
        assert_eq!(session_id_url(&user_only, &config), None);

        let secure = ConnectionOptions {
            url: Some("https://host.example".to_string()),
            ..Default::default()
        };
        assert_eq!(
            session_id_url(&secure, &Config::default()).as_deref(),
            Some("https://host.example")
        );

        let upper = ConnectionOptions {
            url: Some("HTTPS://host.example".to_string()),
            ..Default::default()
        };
        assert_eq!(
            session_id_url(&upper, &Config::default()).as_deref(),
            Some("HTTPS://host.example")
        );
    }
}
