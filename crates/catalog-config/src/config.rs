// crates/catalog-config/src/config.rs
// ============================================================================
// Module: Product Catalog Configuration
// Description: Configuration loading and validation for the catalog service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path
//! limits. Missing or invalid configuration fails closed. Every field maps
//! to one of the deployment variables of the service contract; defaults
//! match the production deployment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "product-catalog.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "PRODUCT_CATALOG_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum accepted bulk import batch size.
pub(crate) const MIN_BULK_IMPORT_BATCH_SIZE: u32 = 1;
/// Maximum accepted bulk import batch size.
pub(crate) const MAX_BULK_IMPORT_BATCH_SIZE: u32 = 10_000;
/// Default bulk import batch size.
pub(crate) const DEFAULT_BULK_IMPORT_BATCH_SIZE: u32 = 100;
/// Minimum outbound HTTP timeout in milliseconds.
pub(crate) const MIN_OUTBOUND_HTTP_TIMEOUT_MS: u64 = 100;
/// Maximum outbound HTTP timeout in milliseconds.
pub(crate) const MAX_OUTBOUND_HTTP_TIMEOUT_MS: u64 = 60_000;
/// Default outbound HTTP timeout in milliseconds.
pub(crate) const DEFAULT_OUTBOUND_HTTP_TIMEOUT_MS: u64 = 5_000;
/// Default broker prefetch window.
pub(crate) const DEFAULT_BROKER_PREFETCH: u32 = 10;
/// Maximum broker prefetch window.
pub(crate) const MAX_BROKER_PREFETCH: u32 = 1_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by configuration loading and validation.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing failed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Validation rejected the configuration.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Product catalog service configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Service identity.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Document store connection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Pub/sub broker wiring.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Logging and tracing.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Operational limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl CatalogConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.validate()?;
        self.store.validate()?;
        self.broker.validate()?;
        self.observability.validate()?;
        self.limits.validate()?;
        Ok(())
    }
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name used in logs and envelopes.
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Deployed service version.
    #[serde(default = "default_service_version")]
    pub version: String,
    /// Deployment environment (e.g. development, production).
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Validates service identity fields.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("service name must not be empty".to_string()));
        }
        if self.environment.trim().is_empty() {
            return Err(ConfigError::Invalid("environment must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
            environment: default_environment(),
        }
    }
}

/// Document store connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store host.
    #[serde(default = "default_store_host")]
    pub host: String,
    /// Store port.
    #[serde(default = "default_store_port")]
    pub port: u16,
    /// Database name.
    #[serde(default = "default_store_db")]
    pub database: String,
    /// Optional user name.
    #[serde(default)]
    pub user: Option<String>,
    /// Optional password.
    #[serde(default)]
    pub password: Option<String>,
    /// Optional authentication source database.
    #[serde(default)]
    pub auth_source: Option<String>,
    /// File path for the embedded store backend.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl StoreConfig {
    /// Validates store connection fields.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("store host must not be empty".to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::Invalid("store database must not be empty".to_string()));
        }
        if self.password.is_some() && self.user.is_none() {
            return Err(ConfigError::Invalid(
                "store password requires a store user".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_store_host(),
            port: default_store_port(),
            database: default_store_db(),
            user: None,
            password: None,
            auth_source: None,
            path: default_store_path(),
        }
    }
}

/// Pub/sub broker configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    /// Broker endpoint.
    #[serde(default = "default_broker_endpoint")]
    pub endpoint: String,
    /// Pub/sub component name.
    #[serde(default = "default_pubsub_name")]
    pub pubsub_name: String,
    /// Application identifier registered with the broker.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Consumer prefetch window.
    #[serde(default = "default_prefetch")]
    pub prefetch: u32,
}

impl BrokerConfig {
    /// Validates broker wiring fields.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("broker endpoint must not be empty".to_string()));
        }
        if self.pubsub_name.trim().is_empty() {
            return Err(ConfigError::Invalid("broker pubsub name must not be empty".to_string()));
        }
        if self.prefetch == 0 || self.prefetch > MAX_BROKER_PREFETCH {
            return Err(ConfigError::Invalid(format!(
                "broker prefetch out of range: {} (1..={MAX_BROKER_PREFETCH})",
                self.prefetch
            )));
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_broker_endpoint(),
            pubsub_name: default_pubsub_name(),
            app_id: default_app_id(),
            prefetch: default_prefetch(),
        }
    }
}

/// Log output format.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable console output.
    #[default]
    Console,
    /// Structured JSON output.
    Json,
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Enables OpenTelemetry export.
    #[serde(default)]
    pub enable_tracing: bool,
    /// OTLP exporter endpoint; required when tracing is enabled.
    #[serde(default)]
    pub otel_endpoint: Option<String>,
    /// Log level filter (e.g. `info`, `debug`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl ObservabilityConfig {
    /// Validates observability fields.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enable_tracing && self.otel_endpoint.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Invalid(
                "enable_tracing requires an otel_endpoint".to_string(),
            ));
        }
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level: {}",
                self.log_level
            )));
        }
        Ok(())
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_tracing: false,
            otel_endpoint: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Operational limit configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Rows per bulk import batch.
    #[serde(default = "default_bulk_import_batch_size")]
    pub bulk_import_batch_size: u32,
    /// Deadline for outbound HTTP calls in milliseconds.
    #[serde(default = "default_outbound_http_timeout_ms")]
    pub outbound_http_timeout_ms: u64,
}

impl LimitsConfig {
    /// Validates limit ranges.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BULK_IMPORT_BATCH_SIZE..=MAX_BULK_IMPORT_BATCH_SIZE)
            .contains(&self.bulk_import_batch_size)
        {
            return Err(ConfigError::Invalid(format!(
                "bulk_import_batch_size out of range: {} ({MIN_BULK_IMPORT_BATCH_SIZE}..={MAX_BULK_IMPORT_BATCH_SIZE})",
                self.bulk_import_batch_size
            )));
        }
        if !(MIN_OUTBOUND_HTTP_TIMEOUT_MS..=MAX_OUTBOUND_HTTP_TIMEOUT_MS)
            .contains(&self.outbound_http_timeout_ms)
        {
            return Err(ConfigError::Invalid(format!(
                "outbound_http_timeout_ms out of range: {} ({MIN_OUTBOUND_HTTP_TIMEOUT_MS}..={MAX_OUTBOUND_HTTP_TIMEOUT_MS})",
                self.outbound_http_timeout_ms
            )));
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            bulk_import_batch_size: default_bulk_import_batch_size(),
            outbound_http_timeout_ms: default_outbound_http_timeout_ms(),
        }
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default service name.
fn default_service_name() -> String {
    "product-service".to_string()
}

/// Returns the default service version.
fn default_service_version() -> String {
    "0.1.0".to_string()
}

/// Returns the default environment.
fn default_environment() -> String {
    "development".to_string()
}

/// Returns the default store host.
fn default_store_host() -> String {
    "localhost".to_string()
}

/// Returns the default store port.
const fn default_store_port() -> u16 {
    27_017
}

/// Returns the default database name.
fn default_store_db() -> String {
    "product_catalog".to_string()
}

/// Returns the default embedded store path.
fn default_store_path() -> PathBuf {
    PathBuf::from("product-catalog.db")
}

/// Returns the default broker endpoint.
fn default_broker_endpoint() -> String {
    "http://localhost:3500".to_string()
}

/// Returns the default pub/sub component name.
fn default_pubsub_name() -> String {
    "aioutlet-pubsub".to_string()
}

/// Returns the default application identifier.
fn default_app_id() -> String {
    "product-service".to_string()
}

/// Returns the default prefetch window.
const fn default_prefetch() -> u32 {
    DEFAULT_BROKER_PREFETCH
}

/// Returns the default log level.
fn default_log_level() -> String {
    "info".to_string()
}

/// Returns the default bulk import batch size.
const fn default_bulk_import_batch_size() -> u32 {
    DEFAULT_BULK_IMPORT_BATCH_SIZE
}

/// Returns the default outbound HTTP timeout.
const fn default_outbound_http_timeout_ms() -> u64 {
    DEFAULT_OUTBOUND_HTTP_TIMEOUT_MS
}

// ============================================================================
// SECTION: Path Resolution
// ============================================================================

/// Resolves the configuration path from the argument or environment.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR)
        && !env_path.trim().is_empty()
    {
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates path length limits before touching the filesystem.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let rendered = path.to_string_lossy();
    if rendered.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}
