//! Run-scoped variable store
//!
//! Values such as the git binary path, the git-cache decision or the path of
//! the release being prepared are computed at most once per run. The store is
//! an explicit map owned by the deploy context; a value is either seeded up
//! front with [`Variables::set`] or produced on first read by the provider
//! given to [`Variables::get_or_resolve`].

use std::collections::BTreeMap;

use crate::error::Result;
use crate::template;

/// Variable names shared between the pipeline stages and templates.
pub mod names {
    pub const DEPLOY_PATH: &str = "deploy_path";
    pub const RELEASE_PATH: &str = "release_path";
    pub const REPOSITORY: &str = "repository";
    pub const BRANCH: &str = "branch";
    pub const TAG: &str = "tag";
    pub const ENV_VARS: &str = "env_vars";
    pub const GIT_BIN: &str = "local_bin/git";
    pub const GIT_CACHE: &str = "local_git_cache";

    /// Every name an `install` template may use.
    pub const INSTALL: [&str; 8] = [
        DEPLOY_PATH,
        RELEASE_PATH,
        REPOSITORY,
        BRANCH,
        TAG,
        ENV_VARS,
        GIT_BIN,
        GIT_CACHE,
    ];
}

/// Memoized name → value map for one deploy run.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Get a value without resolving it
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Drop a value so the next `get_or_resolve` recomputes it
    pub fn forget(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Get a value, or compute and remember it if not present.
    ///
    /// A failing provider leaves the name unset.
    pub fn get_or_resolve<F>(&mut self, name: &str, provider: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }

        let value = provider()?;
        self.values.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Boolean flavour of [`get_or_resolve`](Self::get_or_resolve); stored
    /// as `"true"`/`"false"`.
    pub fn get_or_resolve_flag<F>(&mut self, name: &str, provider: F) -> Result<bool>
    where
        F: FnOnce() -> Result<bool>,
    {
        let value = self.get_or_resolve(name, || provider().map(|b| b.to_string()))?;
        Ok(value == "true")
    }

    /// Render `{{name}}` placeholders against the values currently set.
    pub fn render(&self, template: &str) -> Result<String> {
        template::render(template, |name| self.values.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;

    #[test]
    fn test_new_store_is_empty() {
        let vars = Variables::new();
        assert_eq!(vars.get("deploy_path"), None);
        assert!(vars.render("{{deploy_path}}").is_err());
    }

    #[test]
    fn test_get_or_resolve_runs_provider_once() {
        let mut vars = Variables::new();
        let calls = Cell::new(0);

        let first = vars
            .get_or_resolve(names::GIT_BIN, || {
                calls.set(calls.get() + 1);
                Ok("/usr/bin/git".to_string())
            })
            .unwrap();
        let second = vars
            .get_or_resolve(names::GIT_BIN, || {
                calls.set(calls.get() + 1);
                Ok("/opt/git".to_string())
            })
            .unwrap();

        assert_eq!(first, "/usr/bin/git");
        assert_eq!(second, "/usr/bin/git");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_get_or_resolve_prefers_seeded_value() {
        let mut vars = Variables::new();
        vars.set(names::GIT_BIN, "/custom/git");
        let value = vars
            .get_or_resolve(names::GIT_BIN, || panic!("provider must not run"))
            .unwrap();
        assert_eq!(value, "/custom/git");
    }

    #[test]
    fn test_failed_provider_is_not_memoized() {
        let mut vars = Variables::new();
        let result = vars.get_or_resolve("x", || Err(Error::config("nope")));
        assert!(result.is_err());
        assert_eq!(vars.get("x"), None);

        let value = vars.get_or_resolve("x", || Ok("ok".to_string())).unwrap();
        assert_eq!(value, "ok");
    }

    #[test]
    fn test_flag_round_trip() {
        let mut vars = Variables::new();
        assert!(vars.get_or_resolve_flag(names::GIT_CACHE, || Ok(true)).unwrap());
        assert_eq!(vars.get(names::GIT_CACHE), Some("true"));
        assert!(vars.get_or_resolve_flag(names::GIT_CACHE, || Ok(false)).unwrap());
    }

    #[test]
    fn test_forget_forces_recompute() {
        let mut vars = Variables::new();
        vars.set(names::RELEASE_PATH, "/a");
        assert_eq!(vars.forget(names::RELEASE_PATH).as_deref(), Some("/a"));
        let value = vars
            .get_or_resolve(names::RELEASE_PATH, || Ok("/b".to_string()))
            .unwrap();
        assert_eq!(value, "/b");
    }

    #[test]
    fn test_render_uses_current_values() {
        let mut vars = Variables::new();
        vars.set(names::DEPLOY_PATH, "/tmp/deployer");
        assert_eq!(vars.render("ls {{deploy_path}}/releases").unwrap(), "ls /tmp/deployer/releases");
        assert!(vars.render("cd {{release_path}}").is_err());
    }
}
