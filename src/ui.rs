// UI layer: everything the user sees.
// Requested response content goes to the writer the caller hands in
// (stdout in the binary). Progress, status lines and diagnostics go to
// stderr so they never mix with content a script may be capturing.

use crate::app::DispatchOutcome;
use anyhow::Result;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::io::Write;
use std::time::Duration;

/// Write the parts of a dispatch response the caller asked for: the
/// header map as JSON first, then the raw body.
pub fn render_outcome(
    out: &mut impl Write,
    outcome: &DispatchOutcome,
    show_headers: bool,
    show_body: bool,
) -> std::io::Result<()> {
    if !outcome.response_requested {
        return Ok(());
    }
    if show_headers {
        writeln!(out, "{}", serde_json::to_string(&outcome.headers)?)?;
    }
    if show_body {
        write!(out, "{}", outcome.text)?;
    }
    out.flush()
}

/// Print the `types` listing.
pub fn print_types(out: &mut impl Write, types: &[String]) -> std::io::Result<()> {
    writeln!(out, "Type options:")?;
    for item in types {
        writeln!(out, "{item}")?;
    }
    Ok(())
}

/// Shown when neither flags nor configuration supplied connection details.
pub fn local_login_notice() {
    eprintln!("Local login initiated...");
}

/// Ask for a password without echoing it.
pub fn prompt_password(username: &str) -> Result<String> {
    let password = Password::new()
        .with_prompt(format!("Password for {username}"))
        .interact()?;
    Ok(password)
}

/// A spinner on stderr, ticking until the caller finishes it.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Echo the outcome of a request in human-readable form.
pub fn report_status(status: u16, body: &str, detailed: bool) {
    if (200..300).contains(&status) {
        eprintln!("The operation completed successfully.");
    } else {
        eprintln!("The request failed with status {status}.");
    }
    if detailed {
        for message in extended_messages(body) {
            eprintln!("  {message}");
        }
    }
}

/// Collect the `@Message.ExtendedInfo` entries of a Redfish response.
pub fn extended_messages(body: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };
    let info = value
        .get("error")
        .and_then(|e| e.get("@Message.ExtendedInfo"))
        .or_else(|| value.get("@Message.ExtendedInfo"))
        .and_then(Value::as_array);
    info.map(|entries| {
        entries
            .iter()
            .filter_map(|entry| {
                let id = entry.get("MessageId").and_then(Value::as_str);
                let text = entry.get("Message").and_then(Value::as_str);
                match (id, text) {
                    (Some(id), Some(text)) => Some(format!("{id}: {text}")),
                    (Some(id), None) => Some(id.to_string()),
                    (None, Some(text)) => Some(text.to_string()),
                    (None, None) => None,
                }
            })
            .collect()
    })
    .unwrap_or_default()
}
