//! Blocking HTTP client shared by the fetcher and the plugin directory lookup.

use reqwest::blocking::Client;

use govpress_config::HttpConfig;

use crate::error::{BuildError, BuildResult};

/// Blocking client shared by metadata lookups and downloads.
///
/// # Errors
///
/// Returns [`BuildError::HttpClient`] when the TLS backend cannot be initialised.
pub fn build_client(config: &HttpConfig) -> BuildResult<Client> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.connect_timeout())
        .timeout(config.timeout())
        .build()
        .map_err(|source| BuildError::HttpClient { source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_a_client() {
        assert!(build_client(&HttpConfig::default()).is_ok());
    }
}
