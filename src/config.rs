use std::{fmt, net::IpAddr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{ClientOptions, DataApiError, DeserializationConfig, ReqwestTransport, Result, Transport};

pub const ENV_HOSTNAME: &str = "SINGLESTORE_DATA_API_HOSTNAME";
pub const ENV_PORT: &str = "SINGLESTORE_DATA_API_PORT";
pub const ENV_DATABASE: &str = "SINGLESTORE_DATA_API_DATABASE";
pub const ENV_USERNAME: &str = "SINGLESTORE_DATA_API_USERNAME";
pub const ENV_PASSWORD: &str = "SINGLESTORE_DATA_API_PASSWORD";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// `http` for local and loopback hosts, `https` for everything else.
    pub fn for_hostname(hostname: &str) -> Self {
        if is_local_hostname(hostname) {
            Self::Http
        } else {
            Self::Https
        }
    }
}

fn is_local_hostname(hostname: &str) -> bool {
    if hostname.starts_with("localhost") {
        return true;
    }
    let host = hostname.trim_start_matches('[').trim_end_matches(']');
    host.parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback() || ip.is_unspecified())
}

/// Connection settings that can be loaded from a file.
#[derive(Clone, Deserialize)]
pub struct ConnectionSettings {
    pub hostname: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub database: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub scheme: Option<Scheme>,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Configuration of a [`DataApiDialect`](crate::DataApiDialect).
#[derive(Clone)]
pub struct DataApiConfig {
    pub settings: ConnectionSettings,
    pub options: ClientOptions,
    /// Inline result coercion; `None` returns values as-is.
    pub deserialization: Option<DeserializationConfig>,
    transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for DataApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataApiConfig")
            .field("settings", &self.settings)
            .field("options", &self.options)
            .field("deserialization", &self.deserialization)
            .field("transport", &self.transport)
            .finish()
    }
}

impl DataApiConfig {
    pub fn new(
        hostname: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::from_settings(ConnectionSettings {
            hostname: hostname.into(),
            port: None,
            database: database.into(),
            username: username.into(),
            password: password.into(),
            scheme: None,
        })
    }

    pub fn from_settings(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            options: ClientOptions::default(),
            deserialization: None,
            transport: None,
        }
    }

    /// Creates a configuration from environment variables.
    ///
    /// Reads:
    /// - `SINGLESTORE_DATA_API_HOSTNAME`
    /// - `SINGLESTORE_DATA_API_PORT` (optional)
    /// - `SINGLESTORE_DATA_API_DATABASE`
    /// - `SINGLESTORE_DATA_API_USERNAME`
    /// - `SINGLESTORE_DATA_API_PASSWORD`
    ///
    /// Returns an error if a required variable is missing or empty.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var(ENV_PORT) {
            Ok(port) if !port.trim().is_empty() => Some(port.trim().parse::<u16>().map_err(
                |err| DataApiError::Config(format!("{ENV_PORT} is not a valid port: {err}")),
            )?),
            _ => None,
        };

        let settings = ConnectionSettings {
            hostname: required_env(ENV_HOSTNAME)?,
            port,
            database: required_env(ENV_DATABASE)?,
            username: required_env(ENV_USERNAME)?,
            password: required_env(ENV_PASSWORD)?,
            scheme: None,
        };
        Ok(Self::from_settings(settings))
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.settings.port = Some(port);
        self
    }

    /// Overrides the scheme otherwise derived from the hostname.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.settings.scheme = Some(scheme);
        self
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_deserialization(mut self, deserialization: DeserializationConfig) -> Self {
        self.deserialization = Some(deserialization);
        self
    }

    /// Replaces the default `reqwest` transport.
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.settings
            .scheme
            .unwrap_or_else(|| Scheme::for_hostname(&self.settings.hostname))
    }

    /// `{scheme}://{hostname}[:{port}]`
    pub fn base_url(&self) -> String {
        let scheme = self.scheme().as_str();
        let hostname = self.settings.hostname.trim_end_matches('/');
        match self.settings.port {
            Some(port) => format!("{scheme}://{hostname}:{port}"),
            None => format!("{scheme}://{hostname}"),
        }
    }

    /// Rejects settings that cannot form a request.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("hostname", &self.settings.hostname),
            ("database", &self.settings.database),
            ("username", &self.settings.username),
            ("password", &self.settings.password),
        ] {
            if value.trim().is_empty() {
                return Err(DataApiError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(ReqwestTransport::new(&self.options)),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn required_env(name: &str) -> Result<String> {
    let value = std::env::var(name)
        .map_err(|_| DataApiError::Config(format!("missing {name} environment variable")))?;
    if value.trim().is_empty() {
        return Err(DataApiError::Config(format!("{name} is set but empty")));
    }
    Ok(value)
}
