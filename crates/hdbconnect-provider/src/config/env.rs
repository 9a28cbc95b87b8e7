//! Environment variable loading for configuration

use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::builder::ConfigBuilder;
use crate::Result;

/// Environment variable names
mod vars {
    pub const URL: &str = "HANA_PROVIDER_URL";
    pub const USER: &str = "HANA_PROVIDER_USER";
    pub const PASSWORD: &str = "HANA_PROVIDER_PASSWORD";
    pub const POOL_SIZE: &str = "HANA_PROVIDER_POOL_SIZE";
    pub const POOL_WAIT_SECS: &str = "HANA_PROVIDER_POOL_WAIT_SECS";
    pub const QUERY_TIMEOUT_SECS: &str = "HANA_PROVIDER_QUERY_TIMEOUT_SECS";
    pub const CONNECTIONS_FILE: &str = "HANA_PROVIDER_CONNECTIONS_FILE";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const JSON_LOGS: &str = "HANA_PROVIDER_JSON_LOGS";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Ok(url_str) = env::var(vars::URL) {
        let mut url = Url::parse(&url_str)
            .map_err(|e| crate::Error::Config(format!("Invalid {}: {}", vars::URL, e)))?;

        // Optionally override user/password from separate env vars
        if let Ok(user) = env::var(vars::USER) {
            url.set_username(&user)
                .map_err(|()| crate::Error::Config("Failed to set username in URL".into()))?;
        }
        if let Ok(password) = env::var(vars::PASSWORD) {
            url.set_password(Some(&password))
                .map_err(|()| crate::Error::Config("Failed to set password in URL".into()))?;
        }

        builder = builder.connection_url(url);
    }

    if let Ok(size_str) = env::var(vars::POOL_SIZE)
        && let Ok(size) = size_str.parse::<usize>()
        && let Some(nz) = NonZeroUsize::new(size)
    {
        builder = builder.pool_size(nz);
    }

    if let Ok(wait_str) = env::var(vars::POOL_WAIT_SECS)
        && let Ok(secs) = wait_str.parse::<u64>()
    {
        builder = builder.pool_wait_timeout(Duration::from_secs(secs));
    }

    if let Ok(timeout_str) = env::var(vars::QUERY_TIMEOUT_SECS)
        && let Ok(secs) = timeout_str.parse::<u64>()
    {
        builder = builder.query_timeout(Duration::from_secs(secs));
    }

    if let Ok(path) = env::var(vars::CONNECTIONS_FILE)
        && !path.is_empty()
    {
        builder = builder.connections_file(PathBuf::from(path));
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
