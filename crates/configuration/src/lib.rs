use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{DatabaseSettings, LogLevel, LoggingSettings, ServerSettings, Settings};
pub use telemetry::init_tracing;

/// Environment variables override file values, e.g. `LUNCHLY__SERVER__PORT=8080`.
const ENV_PREFIX: &str = "LUNCHLY";
const ENV_SEPARATOR: &str = "__";

/// Loads the application configuration from an optional `lunchly.toml` in the
/// working directory and `LUNCHLY__*` environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `lunchly.toml`, if any.
        .add_source(config::File::with_name("lunchly").required(false));
    finish(builder, environment())
}

/// Same as [`load_config`] but with an explicit configuration file, which must exist.
pub fn load_config_from(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder().add_source(config::File::from(path));
    finish(builder, environment())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

// The environment source is added last so it overrides the file.
fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    environment: config::Environment,
) -> Result<Settings, ConfigError> {
    let config = builder.add_source(environment).build()?;

    let settings = config.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat, Map};

    fn parse(toml: &str) -> Result<Settings, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    fn parse_with_env(toml: &str, vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: Map<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        finish(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
            environment().source(Some(vars)),
        )
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = parse("").unwrap();
        assert_eq!(settings.database.max_connections, 10);
        assert!(settings.database.run_migrations);
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.logging.level, LogLevel::Info);
        assert!(settings.logging.directory.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let settings = parse(
            r#"
            [database]
            url = "postgres://localhost/lunchly"

            [server]
            port = 8080

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.database.connection_url().unwrap(),
            "postgres://localhost/lunchly"
        );
        assert_eq!(settings.database.acquire_timeout_secs, 5);
        assert_eq!(settings.server.socket_addr().unwrap().port(), 8080);
        assert_eq!(settings.logging.level, LogLevel::Debug);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let err = parse("[database]\nmax_connections = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unparseable_host_is_rejected() {
        let err = parse("[server]\nhost = \"not an address\"").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_log_level_fails_to_load() {
        let err = parse("[logging]\nlevel = \"loud\"").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn log_level_maps_to_tracing_level() {
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
    }

    #[test]
    fn environment_overrides_file_values() {
        let settings = parse_with_env(
            "[server]\nport = 8080\nhost = \"127.0.0.1\"\n[database]\nmax_connections = 4",
            &[
                ("LUNCHLY__SERVER__PORT", "9090"),
                ("LUNCHLY__DATABASE__RUN_MIGRATIONS", "false"),
                ("LUNCHLY__LOGGING__LEVEL", "warn"),
            ],
        )
        .unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.database.max_connections, 4);
        assert!(!settings.database.run_migrations);
        assert_eq!(settings.logging.level, LogLevel::Warn);
    }

    #[test]
    fn unprefixed_variables_are_ignored() {
        let settings = parse_with_env("", &[("SERVER__PORT", "9090")]).unwrap();
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn ipv6_host_from_file_is_accepted() {
        let settings = parse("[server]\nhost = \"::\"").unwrap();
        assert!(settings.server.socket_addr().unwrap().is_ipv6());
    }
}
