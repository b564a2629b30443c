//! `figment`-backed loading of [`SchemaOptions`].

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use orm_schema::SchemaOptions;

/// Prefix recognized for environment overrides, e.g. `ORM_STRICT=false` or
/// `ORM_DEFAULTS__MUTATION_MAX_ROWS=8192` (double underscore descends into
/// the `defaults` sub-table, matching `figment::providers::Env::split`'s
/// nested-key convention).
pub const ENV_PREFIX: &str = "ORM_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load ORM schema options: {0}")]
    Figment(#[from] figment::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Builds [`SchemaOptions`] from, in increasing precedence: the compiled
/// defaults, an optional TOML file, and `ORM_`-prefixed environment
/// variables. `toml_path` need not exist — a missing file simply
/// contributes nothing.
pub fn load_schema_options(toml_path: Option<&Path>) -> Result<SchemaOptions> {
    let mut figment = Figment::from(Serialized::defaults(SchemaOptions::default()));
    if let Some(path) = toml_path {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
    Ok(figment.extract()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let opts = load_schema_options(Some(Path::new("/nonexistent/orm.toml"))).unwrap();
        assert_eq!(opts, SchemaOptions::default());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orm.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "strict = false").unwrap();
        writeln!(file, "[defaults]").unwrap();
        writeln!(file, "mutation_max_rows = 10").unwrap();
        drop(file);

        let opts = load_schema_options(Some(&path)).unwrap();
        assert!(!opts.strict);
        assert_eq!(opts.defaults.mutation_max_rows, 10);
        // Untouched fields keep their compiled defaults.
        assert_eq!(opts.defaults.mutation_batch_size, 64);
    }

    #[test]
    fn env_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orm.toml");
        std::fs::write(&path, "strict = false\n").unwrap();

        std::env::set_var("ORM_STRICT", "true");
        let opts = load_schema_options(Some(&path)).unwrap();
        std::env::remove_var("ORM_STRICT");
        assert!(opts.strict);
    }
}
