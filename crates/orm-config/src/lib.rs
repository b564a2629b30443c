//! Loads [`orm_schema::SchemaOptions`] from TOML plus environment
//! overrides. `SchemaOptions` is a `serde`-deserializable struct loaded
//! through `figment`, the same way a defaulted config struct is merged
//! from a file and overridable by environment elsewhere in this
//! workspace. Here there is no on-disk directory-discovery step
//! (`SchemaOptions` has no project-root-style directory to search for)
//! — just a single optional TOML file plus `ORM_`-prefixed env vars.

pub mod loader;

pub use loader::{load_schema_options, ConfigError, ENV_PREFIX};
