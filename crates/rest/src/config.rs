//! Server configuration for the JSON:API engine.
//!
//! This module provides configuration types for the REST server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ARBOR_SERVER_PORT` | 8080 | Server port |
//! | `ARBOR_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `ARBOR_LOG_LEVEL` | info | Log level |
//! | `ARBOR_MAX_BODY_SIZE` | 1048576 | Max request body (bytes) |
//! | `ARBOR_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `ARBOR_ENABLE_CORS` | true | Enable CORS |
//! | `ARBOR_CORS_ORIGINS` | * | Allowed origins |
//! | `ARBOR_CORS_METHODS` | GET,POST,PATCH,DELETE,OPTIONS | Allowed methods |
//! | `ARBOR_CORS_HEADERS` | Content-Type,Accept,Authorization | Allowed headers |
//! | `ARBOR_BASE_URL` | http://localhost:8080 | Server base URL |
//! | `ARBOR_NAMESPACE` | /api/v1 | Path prefix the API is mounted under |
//! | `ARBOR_CONTENT_TYPE` | application/vnd.api+json | Response content type |
//! | `ARBOR_DEFAULT_PAGE_SIZE` | 10 | Page size when none is requested |
//! | `ARBOR_MAX_PAGE_SIZE` | 100 | Hard cap on requested page sizes |
//! | `ARBOR_RELATIONSHIP_LINKS` | true | Emit relationship link objects |
//! | `ARBOR_OPTIMIZE_RELATIONSHIPS` | false | Omit linkage for non-included paths |
//!
//! # Example
//!
//! ```rust
//! use arbor_rest::ServerConfig;
//!
//! // Create from environment
//! let config = ServerConfig::from_env();
//!
//! // Or create programmatically
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     enable_cors: true,
//!     ..Default::default()
//! };
//! ```

use clap::Parser;

/// Server configuration for the JSON:API engine.
///
/// This struct can be constructed from environment variables using
/// [`ServerConfig::from_env`], from command line arguments using
/// [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "arbor-server")]
#[command(about = "Arbor JSON:API Server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "ARBOR_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "ARBOR_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "ARBOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "ARBOR_MAX_BODY_SIZE", default_value = "1048576")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "ARBOR_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "ARBOR_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "ARBOR_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(
        long,
        env = "ARBOR_CORS_METHODS",
        default_value = "GET,POST,PATCH,DELETE,OPTIONS"
    )]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "ARBOR_CORS_HEADERS",
        default_value = "Content-Type,Accept,Authorization"
    )]
    pub cors_headers: String,

    /// Base URL for the server (used in document links).
    #[arg(long, env = "ARBOR_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Path prefix the API is mounted under.
    #[arg(long, env = "ARBOR_NAMESPACE", default_value = "/api/v1")]
    pub namespace: String,

    /// Content type stamped on JSON:API responses.
    #[arg(long, env = "ARBOR_CONTENT_TYPE", default_value = "application/vnd.api+json")]
    pub content_type: String,

    /// Page size applied when a request does not ask for one.
    #[arg(long, env = "ARBOR_DEFAULT_PAGE_SIZE", default_value = "10")]
    pub default_page_size: u64,

    /// Hard cap on requested page sizes.
    #[arg(long, env = "ARBOR_MAX_PAGE_SIZE", default_value = "100")]
    pub max_page_size: u64,

    /// Emit relationship link objects for routed types.
    #[arg(long, env = "ARBOR_RELATIONSHIP_LINKS", default_value = "true")]
    pub relationship_links: bool,

    /// Omit relationship linkage data for paths that were not included.
    #[arg(long, env = "ARBOR_OPTIMIZE_RELATIONSHIPS", default_value = "false")]
    pub optimize_relationships: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,PATCH,DELETE,OPTIONS".to_string(),
            cors_headers: "Content-Type,Accept,Authorization".to_string(),
            base_url: "http://localhost:8080".to_string(),
            namespace: "/api/v1".to_string(),
            content_type: "application/vnd.api+json".to_string(),
            default_page_size: 10,
            max_page_size: 100,
            relationship_links: true,
            optimize_relationships: false,
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables without
    /// requiring command line arguments.
    pub fn from_env() -> Self {
        // Try to parse from environment, falling back to defaults
        Self::try_parse().unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the base URL joined with the API namespace.
    pub fn api_base(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let namespace = self.namespace.trim_end_matches('/');
        if namespace.is_empty() {
            base.to_string()
        } else {
            format!("{}{}", base, namespace)
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if !self.namespace.is_empty() && !self.namespace.starts_with('/') {
            errors.push("Namespace must start with '/'".to_string());
        }

        if self.content_type.is_empty() {
            errors.push("Content type cannot be empty".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0 and disables features that might interfere
    /// with tests.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            max_body_size: 1024 * 1024,
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            cors_origins: "*".to_string(),
            cors_methods: "*".to_string(),
            cors_headers: "*".to_string(),
            base_url: "http://localhost:8080".to_string(),
            namespace: "/api/v1".to_string(),
            content_type: "application/vnd.api+json".to_string(),
            default_page_size: 10,
            max_page_size: 50,
            relationship_links: true,
            optimize_relationships: false,
        }
    }
}
