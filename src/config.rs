//! Configuration for the todo server
//!
//! Sensible defaults, every value overridable from the environment.

use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins (empty = allow all)
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    /// Preflight cache lifetime in seconds
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec!["Content-Type".to_string(), "X-Request-ID".to_string()],
            allow_credentials: false,
            max_age_seconds: 86400,
        }
    }
}

impl CorsConfig {
    /// Load from `TODO_CORS_*` variables. Warns in production when every
    /// origin is allowed.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origins) = env::var("TODO_CORS_ORIGINS") {
            config.allowed_origins = split_list(&origins, |s| s.to_string());
        }

        if let Ok(methods) = env::var("TODO_CORS_METHODS") {
            config.allowed_methods = split_list(&methods, |s| s.to_uppercase());
        }

        if let Ok(headers) = env::var("TODO_CORS_HEADERS") {
            config.allowed_headers = split_list(&headers, |s| s.to_string());
        }

        if let Ok(val) = env::var("TODO_CORS_CREDENTIALS") {
            config.allow_credentials = parse_flag(&val);
        }

        if let Ok(val) = env::var("TODO_CORS_MAX_AGE") {
            if let Ok(n) = val.parse() {
                config.max_age_seconds = n;
            }
        }

        if is_production_env() && config.allowed_origins.is_empty() {
            tracing::warn!("CORS allows all origins in production. Set TODO_CORS_ORIGINS.");
        }

        config
    }

    pub fn is_restricted(&self) -> bool {
        !self.allowed_origins.is_empty()
    }

    /// Convert to a tower-http `CorsLayer`
    pub fn to_layer(&self) -> tower_http::cors::CorsLayer {
        use tower_http::cors::{AllowOrigin, Any, CorsLayer};

        let mut layer = CorsLayer::new();

        if self.allowed_origins.is_empty() {
            layer = layer.allow_origin(Any);
        } else {
            let mut valid = Vec::new();
            for origin in &self.allowed_origins {
                match origin.parse::<axum::http::HeaderValue>() {
                    Ok(value) => valid.push(value),
                    Err(_) => tracing::warn!(origin = %origin, "CORS: invalid origin skipped"),
                }
            }

            if valid.is_empty() {
                // Never widen a misconfigured allow-list to "any".
                tracing::error!(
                    configured = self.allowed_origins.len(),
                    "CORS: no configured origin parsed, rejecting cross-origin requests"
                );
            }
            layer = layer.allow_origin(AllowOrigin::list(valid));
        }

        let methods: Vec<axum::http::Method> = self
            .allowed_methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();
        layer = if methods.is_empty() {
            layer.allow_methods(Any)
        } else {
            layer.allow_methods(methods)
        };

        let headers: Vec<axum::http::HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        layer = if headers.is_empty() {
            layer.allow_headers(Any)
        } else {
            layer.allow_headers(headers)
        };

        // tower-http rejects credentials combined with wildcard rules
        if self.allow_credentials && self.is_restricted() {
            layer = layer.allow_credentials(true);
        } else if self.allow_credentials {
            tracing::warn!("CORS: credentials need explicit origins, ignoring TODO_CORS_CREDENTIALS");
        }

        layer.max_age(std::time::Duration::from_secs(self.max_age_seconds))
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("TODO_LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Server configuration loaded from environment with defaults
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: 127.0.0.1)
    pub host: String,

    /// Server port (default: 3030)
    pub port: u16,

    /// RocksDB directory for session data (default: ./todo_session_data)
    pub storage_path: PathBuf,

    /// Maximum concurrent requests (default: 200)
    pub max_concurrent_requests: usize,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,

    /// Name of the cookie carrying the session id (default: todo_session)
    pub session_cookie: String,

    /// Zone for reading zone-less due dates and rendering timestamps
    /// (default: America/Chicago)
    pub timezone: Tz,

    /// Idle seconds before a session is discarded; 0 keeps sessions forever
    /// (default: 1440)
    pub session_ttl_secs: u64,

    /// Seconds between expired-session sweeps (default: 300)
    pub maintenance_interval_secs: u64,

    pub is_production: bool,

    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            storage_path: PathBuf::from("./todo_session_data"),
            max_concurrent_requests: 200,
            request_timeout_secs: 30,
            session_cookie: "todo_session".to_string(),
            timezone: chrono_tz::America::Chicago,
            session_ttl_secs: 1440,
            maintenance_interval_secs: 300,
            is_production: false,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    #[allow(clippy::field_reassign_with_default)]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.is_production = is_production_env();

        if let Ok(val) = env::var("TODO_HOST") {
            config.host = val;
        }

        if let Ok(val) = env::var("TODO_PORT") {
            match val.parse() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!(value = %val, "Ignoring invalid TODO_PORT"),
            }
        }

        if let Ok(val) = env::var("TODO_STORAGE_PATH") {
            config.storage_path = PathBuf::from(val);
        }

        if let Ok(val) = env::var("TODO_MAX_CONCURRENT") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_concurrent_requests = n.max(1);
            }
        }

        if let Ok(val) = env::var("TODO_REQUEST_TIMEOUT") {
            if let Ok(n) = val.parse::<u64>() {
                config.request_timeout_secs = n.max(1);
            }
        }

        if let Ok(val) = env::var("TODO_SESSION_COOKIE") {
            let val = val.trim();
            if is_cookie_name(val) {
                config.session_cookie = val.to_string();
            } else {
                tracing::warn!(value = %val, "Ignoring invalid TODO_SESSION_COOKIE");
            }
        }

        if let Ok(val) = env::var("TODO_TIMEZONE") {
            match val.trim().parse::<Tz>() {
                Ok(tz) => config.timezone = tz,
                Err(_) => tracing::warn!(value = %val, "Ignoring unknown TODO_TIMEZONE"),
            }
        }

        if let Ok(val) = env::var("TODO_SESSION_TTL") {
            if let Ok(n) = val.parse::<u64>() {
                config.session_ttl_secs = n;
            }
        }

        if let Ok(val) = env::var("TODO_MAINTENANCE_INTERVAL") {
            if let Ok(n) = val.parse::<u64>() {
                config.maintenance_interval_secs = n.max(1);
            }
        }

        config.cors = CorsConfig::from_env();

        config
    }

    /// Session idle lifetime, `None` when sessions never expire
    pub fn session_ttl(&self) -> Option<Duration> {
        (self.session_ttl_secs > 0).then(|| Duration::from_secs(self.session_ttl_secs))
    }

    /// Socket address string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Directory holding the session database
    pub fn sessions_path(&self) -> PathBuf {
        self.storage_path.join("sessions")
    }

    /// Log the resolved configuration
    pub fn log(&self) {
        info!("Configuration:");
        info!(
            "   Mode: {}",
            if self.is_production {
                "PRODUCTION"
            } else {
                "Development"
            }
        );
        info!("   Bind: {}", self.bind_addr());
        info!("   Storage: {:?}", self.storage_path);
        info!("   Session cookie: {}", self.session_cookie);
        info!("   Timezone: {}", self.timezone);
        match self.session_ttl() {
            Some(ttl) => info!(
                "   Session TTL: {}s (sweep every {}s)",
                ttl.as_secs(),
                self.maintenance_interval_secs
            ),
            None => info!("   Session TTL: disabled"),
        }
        info!("   Max concurrent: {}", self.max_concurrent_requests);
        info!("   Request timeout: {}s", self.request_timeout_secs);
        if self.cors.is_restricted() {
            info!("   CORS origins: {:?}", self.cors.allowed_origins);
        } else {
            info!("   CORS: Permissive (all origins allowed)");
        }
    }
}

/// Environment variable documentation
pub fn print_env_help() {
    println!("todo-json configuration environment variables:");
    println!();
    println!("  TODO_ENV               - Set to 'production' or 'prod' for production mode");
    println!("  TODO_HOST              - Bind address (default: 127.0.0.1)");
    println!("  TODO_PORT              - Server port (default: 3030)");
    println!("  TODO_STORAGE_PATH      - Storage directory (default: ./todo_session_data)");
    println!("  TODO_MAX_CONCURRENT    - Max concurrent requests (default: 200)");
    println!("  TODO_REQUEST_TIMEOUT   - Request timeout in seconds (default: 30)");
    println!("  TODO_SESSION_COOKIE    - Session cookie name (default: todo_session)");
    println!("  TODO_TIMEZONE          - IANA zone for due dates and timestamps (default: America/Chicago)");
    println!("  TODO_SESSION_TTL       - Idle seconds before a session expires, 0 = never (default: 1440)");
    println!("  TODO_MAINTENANCE_INTERVAL - Seconds between expired-session sweeps (default: 300)");
    println!();
    println!("CORS Configuration:");
    println!("  TODO_CORS_ORIGINS      - Comma-separated allowed origins (default: all)");
    println!("  TODO_CORS_METHODS      - Comma-separated allowed methods (default: GET,POST,OPTIONS)");
    println!("  TODO_CORS_HEADERS      - Comma-separated allowed headers (default: Content-Type,X-Request-ID)");
    println!("  TODO_CORS_CREDENTIALS  - Allow credentials true/false (default: false)");
    println!("  TODO_CORS_MAX_AGE      - Preflight cache seconds (default: 86400)");
    println!();
    println!("  RUST_LOG               - Log level (e.g., info, debug, trace)");
    println!("  TODO_LOG_FORMAT        - 'json' for JSON log lines (default: text)");
    println!();
}

fn is_production_env() -> bool {
    env::var("TODO_ENV")
        .map(|v| {
            let v = v.to_lowercase();
            v == "production" || v == "prod"
        })
        .unwrap_or(false)
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

fn split_list(raw: &str, map: impl Fn(&str) -> String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(map)
        .collect()
}

/// RFC 6265 cookie-name token characters
fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
