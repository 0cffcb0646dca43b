//! Layered server configuration.
//!
//! Precedence, lowest first: compiled defaults, YAML file, `PORT`,
//! `CALC__*` environment variables, command-line overrides.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use calc_auth::SessionConfig;
use calculator::{CalculatorConfig, StorageConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "CALC__";
pub const EMULATOR_HOST_VAR: &str = "FIRESTORE_EMULATOR_HOST";

/// The Firestore emulator accepts this token as an administrator credential.
const EMULATOR_ACCESS_TOKEN: &str = "owner";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub auth: SessionConfig,
    #[serde(default)]
    pub calculator: CalculatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `calculator=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_owned()],
            allowed_methods: vec!["GET".to_owned(), "POST".to_owned(), "OPTIONS".to_owned()],
            allowed_headers: vec!["Content-Type".to_owned(), "Authorization".to_owned()],
        }
    }
}

/// Values taken from the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub verbose: u8,
}

impl AppConfig {
    /// Figment with every source except the command line.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load from defaults, the optional YAML file and the environment.
    ///
    /// # Errors
    /// Returns an error if a source cannot be read or does not match the schema.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config: AppConfig = Self::figment(path)
            .extract()
            .context("failed to load configuration")?;
        config.apply_emulator_host(std::env::var(EMULATOR_HOST_VAR).ok().as_deref());
        Ok(config)
    }

    pub fn apply_cli_overrides(&mut self, cli: CliOverrides) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        match cli.verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
    }

    /// Point the Firestore backend at a local emulator (`host:port`).
    pub fn apply_emulator_host(&mut self, host: Option<&str>) {
        let Some(host) = host.filter(|h| !h.is_empty()) else {
            return;
        };
        if let StorageConfig::Firestore(fs) = &mut self.calculator.storage {
            fs.base_url = format!("http://{host}");
            if fs.access_token.is_none() {
                fs.access_token = Some(EMULATOR_ACCESS_TOKEN.to_owned().into());
            }
        }
    }

    /// # Errors
    /// Returns an error if the listen address or session settings are invalid.
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        self.auth.validate().context("invalid auth section")?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if `server.host` is not an IP address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip = self
            .server
            .host
            .parse()
            .with_context(|| format!("invalid server.host '{}'", self.server.host))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Effective configuration as YAML, with secrets redacted.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("failed to render configuration")
    }
}
