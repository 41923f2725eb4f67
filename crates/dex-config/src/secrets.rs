//! Runtime secret resolution.
//!
//! Config stores env var NAMES only. Binaries resolve them once at startup
//! and pass [`ResolvedSecrets`] into constructors. `Debug` redacts values.

use crate::AppConfig;

#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    /// Postgres URL. `None` when the named env var is absent or empty.
    pub database_url: Option<String>,
    /// The env var the URL was read from (safe to log).
    pub database_url_env: String,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "<REDACTED>"),
            )
            .field("database_url_env", &self.database_url_env)
            .finish()
    }
}

/// Resolve from the process environment.
pub fn resolve_secrets(cfg: &AppConfig) -> ResolvedSecrets {
    resolve_secrets_with(cfg, |name| std::env::var(name).ok())
}

/// Resolve through `lookup` (tests pass a closure over a map).
pub fn resolve_secrets_with<F>(cfg: &AppConfig, lookup: F) -> ResolvedSecrets
where
    F: Fn(&str) -> Option<String>,
{
    let name = cfg.store.database_url_env.trim().to_string();
    let database_url = lookup(&name).filter(|v| !v.trim().is_empty());
    ResolvedSecrets {
        database_url,
        database_url_env: name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_url() {
        let cfg = AppConfig::default();
        let s = resolve_secrets_with(&cfg, |_| Some("postgres://u:hunter2@db/dex".into()));
        let dbg = format!("{s:?}");
        assert!(dbg.contains("<REDACTED>"));
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("DEX_DATABASE_URL"));
    }

    #[test]
    fn empty_value_counts_as_absent() {
        let cfg = AppConfig::default();
        let s = resolve_secrets_with(&cfg, |_| Some("   ".into()));
        assert!(s.database_url.is_none());
    }
}
