use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// How long a rendered front page is served from cache, in seconds
    #[serde(default = "default_page_cache_ttl_secs")]
    pub page_cache_ttl_secs: u64,
    /// Default number of digests shown on the archive page
    #[serde(default = "default_archive_limit")]
    pub archive_limit: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_page_cache_ttl_secs() -> u64 {
    300
}

fn default_archive_limit() -> usize {
    7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            page_cache_ttl_secs: default_page_cache_ttl_secs(),
            archive_limit: default_archive_limit(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

/// Credentials and endpoint for the hosted store, sourced from the process
/// environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub anon_key: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout_secs: 30,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| anyhow::anyhow!("SUPABASE_URL is not set"))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| anyhow::anyhow!("SUPABASE_ANON_KEY is not set"))?;
        Ok(Self::new(url, anon_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.page_cache_ttl_secs, 300);
        assert_eq!(config.archive_limit, 7);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
            bind_addr = "127.0.0.1:8080"
            page_cache_ttl_secs = 60
            archive_limit = 14
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.page_cache_ttl_secs, 60);
        assert_eq!(config.archive_limit, 14);
    }

    #[test]
    fn test_load_config_with_defaults_applied() {
        let content = r#"
            bind_addr = "0.0.0.0:9000"
        "#;

        let config = Config::from_str(content).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.page_cache_ttl_secs, 300); // Default value
        assert_eq!(config.archive_limit, 7); // Default value
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let content = "this is not valid toml {{{";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());
        assert!(result.is_err());
    }

    mod store_config_tests {
        use super::*;

        #[test]
        fn test_store_config_new() {
            let config = StoreConfig::new("https://example.supabase.co", "anon-key");
            assert_eq!(config.url, "https://example.supabase.co");
            assert_eq!(config.anon_key, "anon-key");
            assert_eq!(config.timeout_secs, 30);
        }
    }
}
