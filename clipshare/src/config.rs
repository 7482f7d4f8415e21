// SPDX-License-Identifier: GPL-2.0-or-later
/// Defines the configuration file format for clipshare.
use std::{
    fmt::Display,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::Error;

const DB_NAME: &str = "clipshare.sqlite";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// The data directory where the clip database is stored
    pub data_directory: PathBuf,
    /// The HTTP server configution options
    #[serde(default)]
    pub http_api: HttpApi,
    /// Database connection options
    #[serde(default)]
    pub store: Store,
    /// Limits and housekeeping for clips
    #[serde(default)]
    pub clips: Clips,
    /// Cost parameters for hashing clip passwords
    #[serde(default)]
    pub password: Password,
}

impl Config {
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.data_directory.join(DB_NAME).display())
    }

    /// Check the values serde can't check for us.
    pub fn validate(&self) -> Result<(), Error> {
        if self.store.max_connections == 0 {
            return Err(Error::ConfigValueError(
                "'store.max_connections' must be at least 1".into(),
            ));
        }
        if self.clips.max_content_bytes == 0 {
            return Err(Error::ConfigValueError(
                "'clips.max_content_bytes' must be at least 1".into(),
            ));
        }
        if self.http_api.tls_certificate.is_some() != self.http_api.tls_key.is_some() {
            return Err(Error::ConfigValueError(
                "'tls_certificate' and 'tls_key' must both be set or neither should be set."
                    .into(),
            ));
        }
        self.password.params()?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HttpApi {
    /// The address the HTTP API listens on.
    pub url: SocketAddr,
    /// The path to an x509 certificate the server should use for HTTPS.
    pub tls_certificate: Option<PathBuf>,
    /// The path to the key for the given certificate.
    pub tls_key: Option<PathBuf>,
}

impl Default for HttpApi {
    fn default() -> Self {
        HttpApi {
            url: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080),
            tls_certificate: None,
            tls_key: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Store {
    /// How long, in seconds, a database call may wait for a connection or a lock.
    pub timeout_secs: u64,
    /// Size of the database connection pool.
    pub max_connections: u32,
}

impl Store {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Store {
    fn default() -> Self {
        Store {
            timeout_secs: 5,
            max_connections: 8,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Clips {
    /// The largest clip, in bytes, the service accepts.
    pub max_content_bytes: usize,
    /// Seconds between sweeps that delete expired clips; 0 disables the sweep.
    pub purge_interval_secs: u64,
}

impl Default for Clips {
    fn default() -> Self {
        Clips {
            max_content_bytes: 1024 * 1024,
            purge_interval_secs: 60 * 15,
        }
    }
}

/// Argon2id cost parameters used when hashing new passwords. Existing hashes carry their
/// own parameters, so changing these doesn't invalidate stored clips.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Password {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Password {
    pub fn params(&self) -> Result<argon2::Params, Error> {
        argon2::Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| Error::ConfigValueError(format!("invalid password parameters: {e}")))
    }
}

impl Default for Password {
    fn default() -> Self {
        Password {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_directory: PathBuf::from(r"/var/lib/clipshare/"),
            http_api: Default::default(),
            store: Default::default(),
            clips: Default::default(),
            password: Default::default(),
        }
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            toml::ser::to_string_pretty(&self).unwrap_or_default()
        )
    }
}

/// Load a [`Config`] instance from the given path.
pub fn load_config(path: &str) -> Result<Config, Error> {
    let path = PathBuf::from(path);
    let config_string = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&config_string).map_err(|err| {
        println!("Example config format:\n\n{}", Config::default());
        err
    })?;
    config.validate()?;
    Ok(config)
}
