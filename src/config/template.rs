//! Configuration template generation

use crate::utils::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Commented template describing every option
pub fn commented_config_template() -> &'static str {
    r#"# Signal Receiver Configuration
# Every key is optional; missing keys fall back to the values shown.
# Environment variables REDIS_URL and PORT override the file.

# Log level or filter directive (SIGNAL_RECEIVER_LOG overrides it)
log_level = "info"

[server]
# Interface to bind
host = "0.0.0.0"

# Port to listen on
port = 5000

[store]
# Redis connection string. Without it the service still starts, but every
# webhook is answered with 500 STORE_UNAVAILABLE.
# url = "redis://127.0.0.1:6379"

# Milliseconds allowed for each connection attempt
connect_timeout_ms = 5000

# Milliseconds allowed for one batched write
write_timeout_ms = 2000

[ingest]
# Entries whose value is not a string (numbers, null, objects):
#   "reject" - answer 400 MALFORMED_JSON and write nothing
#   "skip"   - drop the entry, log it, write the rest
non_string_values = "reject"
"#
}

/// Generate a configuration file with comments explaining each field
pub fn generate_commented_config_template<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, commented_config_template())
        .map_err(|e| Error::ConfigError(format!("Failed to write {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn commented_template_parses_to_defaults() {
        let parsed: Config = toml::from_str(commented_config_template()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn generate_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("signal-receiver.toml");
        generate_commented_config_template(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
