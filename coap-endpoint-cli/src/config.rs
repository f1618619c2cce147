// Copyright 2019 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Loads the configuration driving the endpoint binary: an optional JSON5
//! file, overridden by a handful of command-line flags (§4.13).

use clap::Parser;
use coap_endpoint::consts::{DEFAULT_PORT_COAP_UDP, DEFAULT_WELLKNOWN_URI};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
struct Cli {
    /// Path to a JSON5 config file. Flags below take precedence over its values.
    #[arg(long)]
    config: Option<String>,

    /// Address to bind the CoAP UDP socket to.
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Resource-discovery path served for GET requests to this URI.
    #[arg(long)]
    wellknown_uri: Option<String>,

    /// Log level: error, warn, info, debug, or trace.
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[derive(Deserialize, Debug, Copy, Clone, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn as_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT_COAP_UDP))
}

fn default_wellknown_uri() -> String {
    DEFAULT_WELLKNOWN_URI.to_string()
}

/// The fully resolved configuration used to build an [`coap_endpoint::EndpointContext`].
#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_wellknown_uri")]
    pub wellknown_uri: String,

    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: default_listen(),
            wellknown_uri: default_wellknown_uri(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Parses command-line flags, loads `--config` if given, then lets the
    /// flags override whatever the file specified.
    pub fn load() -> anyhow::Result<Config> {
        let cli = Cli::parse();

        let mut config = match &cli.config {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                serde_json5::from_str(&text)?
            }
            None => Config::default(),
        };

        if let Some(listen) = cli.listen {
            config.listen = listen;
        }
        if let Some(wellknown_uri) = cli.wellknown_uri {
            config.wellknown_uri = wellknown_uri;
        }
        if let Some(log_level) = cli.log_level {
            config.log_level = log_level;
        }

        Ok(config)
    }
}
