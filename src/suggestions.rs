//! # Error Suggestions
//!
//! Helpers that turn failures into CLI errors which say what went wrong AND
//! how to fix it, as `hint:` lines under the message.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use deploy_local::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::io;
use std::path::Path;

use crate::config::ENV_PREFIX;
use crate::defaults::CONFIG_FILE_NAME;
use crate::error::Error;

/// Top-level keys accepted in the config file
const CONFIG_KEYS: [&str; 10] = [
    "deploy_path",
    "repository",
    "branch",
    "tag",
    "keep_releases",
    "timeout",
    "git_cache",
    "bin",
    "install",
    "env_vars",
];

/// Generate an error for when an explicitly given config file is missing.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a {CONFIG_FILE_NAME} file in the working directory\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set the {ENV_PREFIX}CONFIG environment variable",
        path = path.display()
    )
}

/// Generate an error for an unknown key in the config file.
///
/// Suggests the closest valid key when there is one.
pub fn unknown_config_key(key: &str) -> anyhow::Error {
    let did_you_mean = find_similar(key, &CONFIG_KEYS)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown configuration key: {key}{did_you_mean}\n\n\
         Valid keys are: {keys}",
        keys = CONFIG_KEYS.join(", ")
    )
}

/// Convert a library error into a CLI error, adding hints for failures
/// users can act on.
pub fn explain(error: Error) -> anyhow::Error {
    let hint = match &error {
        Error::AllocationExhausted { .. } => Some(
            "hint: Every name for this second is taken; wait a second and retry\n\
             hint: Run 'deploy-local cleanup' to remove old releases"
                .to_string(),
        ),
        Error::CommandTimeout { .. } => Some(format!(
            "hint: Raise 'timeout' in {CONFIG_FILE_NAME} or set {ENV_PREFIX}TIMEOUT"
        )),
        Error::Filesystem { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
            Some(
                "hint: Check that the deploy path is writable by the current user\n\
                 hint: Use --deploy-path to deploy somewhere else"
                    .to_string(),
            )
        }
        Error::Yaml(yaml) => {
            if let Some(key) = unknown_field(&yaml.to_string()) {
                return unknown_config_key(&key);
            }
            None
        }
        _ => None,
    };

    match hint {
        Some(hint) => anyhow::anyhow!("{error}\n\n{hint}"),
        None => anyhow::Error::new(error),
    }
}

/// Extract `x` from a serde "unknown field `x`" message.
fn unknown_field(message: &str) -> Option<String> {
    let rest = message.split("unknown field `").nth(1)?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (previous[j + 1] + 1)
                .min(row[j] + 1)
                .min(previous[j] + cost);
        }
        previous = row;
    }
    previous[b.len()]
}
