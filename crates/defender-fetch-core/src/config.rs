//! Configuration management for defender-fetch
//!
//! Configuration is read once from a YAML file, overlaid with `DEFENDER_`
//! environment variables, validated, and then passed by reference to every
//! component. Nothing mutates it after [`Config::load`] returns.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::models::Credentials;

/// Prefix for environment variable overrides, e.g. `DEFENDER_APP_SECRET`
pub const ENV_PREFIX: &str = "DEFENDER";

/// Main configuration struct
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the dated alert files and `defender.log`
    pub filepath: String,

    /// Azure AD tenant
    pub tenant_id: String,

    /// Application (client) id
    pub app_id: String,

    /// Application secret
    #[serde(skip_serializing)]
    pub app_secret: String,

    /// Resource the token is requested for
    pub resource_app_id_uri: String,

    /// Signed duration added to now to get the alert threshold, e.g. `-24h`
    pub timerange: String,

    /// Remote endpoints
    pub endpoints: EndpointsConfig,

    /// HTTP client configuration
    pub http: HttpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from a YAML file plus `DEFENDER_` environment overrides, then validate.
    ///
    /// Nested keys use a double underscore: `DEFENDER_HTTP__TIMEOUT=10s`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;

        Self::from_settings(settings)
    }

    /// Parse a YAML document without consulting the environment.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .map_err(|e| Error::config(e.to_string()))?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: config::Config) -> Result<Self> {
        let mut config: Self = settings
            .clone()
            .try_deserialize()
            .map_err(|e| Error::config(format!("failed to deserialize configuration: {e}")))?;

        let camel_case: CamelCaseKeys = settings
            .try_deserialize()
            .map_err(|e| Error::config(format!("failed to deserialize configuration: {e}")))?;
        camel_case.fill(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Check that every required field is present and non-blank.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (&self.app_id, "App ID"),
            (&self.app_secret, "App Secret"),
            (&self.filepath, "File Path"),
            (&self.tenant_id, "Tenant ID"),
            (&self.timerange, "Time Range"),
            (&self.resource_app_id_uri, "Resource App ID URI"),
        ];

        for (value, name) in required {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{name} was not found")));
            }
        }

        self.endpoints.authority_url()?;
        self.endpoints.api_url()?;

        if self.http.timeout.is_zero() {
            return Err(Error::config("http.timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Credentials for the client-credentials grant
    pub fn credentials(&self) -> Credentials {
        Credentials {
            tenant_id: self.tenant_id.clone(),
            app_id: self.app_id.clone(),
            app_secret: self.app_secret.clone(),
            resource_app_id_uri: self.resource_app_id_uri.clone(),
        }
    }

    /// Output directory
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.filepath)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("filepath", &self.filepath)
            .field("tenant_id", &self.tenant_id)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("resource_app_id_uri", &self.resource_app_id_uri)
            .field("timerange", &self.timerange)
            .field("endpoints", &self.endpoints)
            .field("http", &self.http)
            .field("logging", &self.logging)
            .finish()
    }
}

/// camelCase spellings used by existing `config.yaml` files.
///
/// Read separately so that `tenantId` in the file and `DEFENDER_TENANT_ID` in
/// the environment do not collide as duplicate fields; snake_case wins.
#[derive(Default, Deserialize)]
#[serde(default)]
struct CamelCaseKeys {
    #[serde(rename = "tenantId", alias = "tenantid")]
    tenant_id: Option<String>,
    #[serde(rename = "appId", alias = "appid")]
    app_id: Option<String>,
    #[serde(rename = "appSecret", alias = "appsecret")]
    app_secret: Option<String>,
    #[serde(rename = "resourceAppIdUri", alias = "resourceappiduri")]
    resource_app_id_uri: Option<String>,
}

impl CamelCaseKeys {
    fn fill(self, config: &mut Config) {
        fill_blank(&mut config.tenant_id, self.tenant_id);
        fill_blank(&mut config.app_id, self.app_id);
        fill_blank(&mut config.app_secret, self.app_secret);
        fill_blank(&mut config.resource_app_id_uri, self.resource_app_id_uri);
    }
}

fn fill_blank(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        if target.trim().is_empty() {
            *target = value;
        }
    }
}

/// Remote endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// OAuth2 authority; the token URL is `{authority}/{tenant_id}/oauth2/token`
    pub authority: String,
    /// Alerts API base; alerts are read from `{api}/api/alerts`
    pub api: String,
}

impl EndpointsConfig {
    /// Parsed authority URL
    pub fn authority_url(&self) -> Result<Url> {
        parse_base_url("endpoints.authority", &self.authority)
    }

    /// Parsed alerts API base URL
    pub fn api_url(&self) -> Result<Url> {
        parse_base_url("endpoints.api", &self.api)
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            authority: "https://login.windows.net".to_string(),
            api: "https://api.securitycenter.microsoft.com".to_string(),
        }
    }
}

fn parse_base_url(key: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::config(format!("{key} '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::config(format!("{key} '{raw}' is not a base URL")));
    }
    Ok(url)
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FULL: &str = r#"
filepath: /var/lib/defender
tenant_id: tenant-1
app_id: app-1
app_secret: s3cret
resource_app_id_uri: https://api.securitycenter.microsoft.com
timerange: -24h
"#;

    #[test]
    fn test_parse_full_config_with_defaults() {
        let config = Config::from_yaml_str(FULL).unwrap();

        assert_eq!(config.filepath, "/var/lib/defender");
        assert_eq!(config.tenant_id, "tenant-1");
        assert_eq!(config.timerange, "-24h");
        assert_eq!(config.endpoints.authority, "https://login.windows.net");
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_optional_sections_override_defaults() {
        let yaml = format!(
            "{FULL}endpoints:\n  api: http://127.0.0.1:9000\nhttp:\n  timeout: 5s\nlogging:\n  level: debug\n"
        );
        let config = Config::from_yaml_str(&yaml).unwrap();

        assert_eq!(config.endpoints.api, "http://127.0.0.1:9000");
        assert_eq!(config.endpoints.authority, "https://login.windows.net");
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_camel_case_keys_are_accepted() {
        let yaml = r"
filepath: /var/lib/defender
tenantId: contoso
appId: app-id
appSecret: app-secret
resourceAppIdUri: https://api.securitycenter.microsoft.com
timerange: -24h
";
        let config = Config::from_yaml_str(yaml).unwrap();

        assert_eq!(config.tenant_id, "contoso");
        assert_eq!(config.app_id, "app-id");
        assert_eq!(config.app_secret, "app-secret");
        assert_eq!(config.resource_app_id_uri, "https://api.securitycenter.microsoft.com");
    }

    #[test]
    fn test_snake_case_key_wins_over_camel_case() {
        let yaml = FULL.replace("tenant_id: tenant-1", "tenant_id: tenant-1\ntenantId: other");
        let config = Config::from_yaml_str(&yaml).unwrap();

        assert_eq!(config.tenant_id, "tenant-1");
    }

    #[test]
    fn test_env_override_on_camel_case_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "filepath: /tmp\ntenantId: contoso\nappId: app-id\nappSecret: from-file\nresourceAppIdUri: https://api.securitycenter.microsoft.com\ntimerange: -24h\n",
        )
        .unwrap();

        std::env::set_var("DEFENDER_APP_SECRET", "from-env");
        let config = Config::load(&path);
        std::env::remove_var("DEFENDER_APP_SECRET");

        let config = config.unwrap();
        assert_eq!(config.tenant_id, "contoso");
        assert_eq!(config.app_secret, "from-env");
    }

    #[test]
    fn test_missing_field_is_named() {
        let yaml = FULL.replace("app_secret: s3cret\n", "");
        let err = Config::from_yaml_str(&yaml).unwrap_err();

        assert!(matches!(err, Error::Config(ref msg) if msg == "App Secret was not found"));
    }

    #[test]
    fn test_blank_field_is_rejected() {
        let yaml = FULL.replace("tenant_id: tenant-1", "tenant_id: \"   \"");
        let err = Config::from_yaml_str(&yaml).unwrap_err();

        assert!(matches!(err, Error::Config(ref msg) if msg == "Tenant ID was not found"));
    }

    #[test]
    fn test_bad_endpoint_is_rejected() {
        let yaml = format!("{FULL}endpoints:\n  authority: not a url\n");
        assert!(matches!(Config::from_yaml_str(&yaml), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, FULL).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.app_id, "app-1");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::from_yaml_str(FULL).unwrap();
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
