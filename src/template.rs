//! `{{name}}` placeholder substitution.
//!
//! Commands and paths in the configuration may reference run variables such
//! as `{{release_path}}` or `{{deploy_path}}`. Rendering is a pure function
//! of the template text and a lookup; resolving the variables themselves is
//! the job of [`crate::vars::Variables`].

use regex::Regex;

use crate::error::{Error, Result};

const PLACEHOLDER: &str = r"\{\{\s*([A-Za-z0-9_./-]+)\s*\}\}";

/// Names of all placeholders in `template`, in order of first appearance.
pub fn placeholders(template: &str) -> Result<Vec<String>> {
    let regex = Regex::new(PLACEHOLDER)?;
    let mut names: Vec<String> = Vec::new();
    for caps in regex.captures_iter(template) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Replace every `{{name}}` in `template` with `lookup(name)`.
///
/// An unknown name fails with [`Error::Template`] naming the variable.
/// Substituted values are not scanned again.
pub fn render<F>(template: &str, mut lookup: F) -> Result<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let regex = Regex::new(PLACEHOLDER)?;
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in regex.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let name = &caps[1];
        let value = lookup(name).ok_or_else(|| Error::Template {
            message: format!("Undefined variable in '{}'", template),
            variable: Some(name.to_string()),
        })?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(&value);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}
