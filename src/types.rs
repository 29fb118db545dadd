// `types` command: list the resource types a logged in service exposes.
// Types are gathered by walking `@odata.id` links from the session's
// starting path. Log services are only visited when logs were included at
// login, since they can be very large.

use crate::app::RestApp;
use crate::cli::TypesOptions;
use crate::error::{CliError, CliResult};
use crate::session::{ConnectionOptions, SessionResolver};
use crate::ui;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::io::Write;
use tracing::{debug, warn};

/// Upper bound on resources fetched in one crawl.
const MAX_RESOURCES: usize = 5000;

impl From<&TypesOptions> for ConnectionOptions {
    fn from(options: &TypesOptions) -> Self {
        ConnectionOptions {
            url: options.url.clone(),
            user: options.user.clone(),
            password: options.password.clone(),
            bios_password: None,
            include_logs: options.includelogs,
            path: options.path.clone(),
        }
    }
}

pub fn run<A: RestApp + ?Sized>(
    app: &mut A,
    options: &TypesOptions,
    out: &mut impl Write,
) -> CliResult<()> {
    let types = collect(app, options)?;
    ui::print_types(out, &types)?;
    Ok(())
}

/// Log in when needed and return the sorted, distinct type names.
pub fn collect<A: RestApp + ?Sized>(app: &mut A, options: &TypesOptions) -> CliResult<Vec<String>> {
    if !options.args.is_empty() {
        return Err(CliError::InvalidCommandLine(
            "The 'types' command does not take any arguments.".to_string(),
        ));
    }
    SessionResolver::full().run(app, &ConnectionOptions::from(options))?;

    let (start, include_logs) = {
        let session = app.current_session()?;
        (session.starting_path.clone(), session.include_logs)
    };
    let found = crawl(app, &start, include_logs);
    Ok(found
        .into_iter()
        .map(|t| if options.fulltypes { t } else { simplify_type(&t) })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect())
}

/// Breadth-first walk from `start`, returning every `@odata.type` seen.
/// Resources that fail to load are skipped with a warning.
pub fn crawl<A: RestApp + ?Sized>(app: &mut A, start: &str, include_logs: bool) -> BTreeSet<String> {
    let mut types = BTreeSet::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([start.to_string()]);

    while let Some(path) = queue.pop_front() {
        if !visited.insert(canonical(&path)) {
            continue;
        }
        if visited.len() > MAX_RESOURCES {
            warn!("Stopping after {MAX_RESOURCES} resources");
            break;
        }
        let document = match app.get(&path) {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping {path}: {e:#}");
                continue;
            }
        };
        let mut links = Vec::new();
        gather(&document, &mut types, &mut links);
        for link in links {
            if should_follow(&link, include_logs) && !visited.contains(&canonical(&link)) {
                queue.push_back(link);
            }
        }
    }
    debug!("Visited {} resources, found {} types", visited.len(), types.len());
    types
}

fn gather(value: &Value, types: &mut BTreeSet<String>, links: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(t) = map.get("@odata.type").and_then(Value::as_str) {
                types.insert(t.to_string());
            }
            if let Some(id) = map.get("@odata.id").and_then(Value::as_str) {
                links.push(id.to_string());
            }
            for (key, child) in map {
                if key != "@odata.id" && key != "@odata.type" {
                    gather(child, types, links);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                gather(item, types, links);
            }
        }
        _ => {}
    }
}

fn should_follow(link: &str, include_logs: bool) -> bool {
    if !link.starts_with("/redfish/") || link.contains('#') {
        return false;
    }
    if link.contains("/JsonSchemas") {
        return false;
    }
    include_logs || !link.contains("/LogServices")
}

fn canonical(path: &str) -> String {
    path.trim_end_matches('/').to_ascii_lowercase()
}

/// `#Bios.v1_0_0.Bios` becomes `Bios.v1_0_0`.
pub fn simplify_type(full: &str) -> String {
    let name = full.trim_start_matches('#');
    match name.rsplit_once('.') {
        Some((versioned, _)) if versioned.contains('.') => versioned.to_string(),
        _ => name.to_string(),
    }
}
