use anyhow::{Result, anyhow};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::namespace_gate::NamespaceGate;

pub const DEFAULT_WEBHOOK_PATH: &str = "/validate";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub webhook_path: String,
    /// Namespaces whose requests are accepted without evaluation. `None`
    /// keeps the default list.
    pub ignored_namespaces: Option<BTreeSet<String>>,
    pub max_body_size: usize,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let tls_config = tls_config(matches)?;
        let webhook_path = webhook_path(matches)?;

        let ignored_namespaces = matches
            .get_many::<String>("ignore-namespace")
            .map(|namespaces| namespaces.cloned().collect::<BTreeSet<String>>());
        let max_body_size = matches
            .get_one::<usize>("max-body-size")
            .copied()
            .ok_or_else(|| anyhow!("max-body-size should always be set"))?;

        let log_level = required_string(matches, "log-level")?;
        let log_fmt = required_string(matches, "log-fmt")?;
        let log_no_color = matches.get_flag("log-no-color");

        Ok(Self {
            addr,
            tls_config,
            webhook_path,
            ignored_namespaces,
            max_body_size,
            log_level,
            log_fmt,
            log_no_color,
        })
    }

    /// Build the namespace gate described by the configuration.
    pub fn namespace_gate(&self) -> NamespaceGate {
        match &self.ignored_namespaces {
            Some(namespaces) => NamespaceGate::ignoring(namespaces.iter().cloned()),
            None => NamespaceGate::default(),
        }
    }
}

fn required_string(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| anyhow!("{id} should always be set, there's a default value"))
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        required_string(matches, "address")?,
        required_string(matches, "port")?
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_config(matches: &ArgMatches) -> Result<Option<TlsConfig>> {
    let cert_file = required_string(matches, "cert-file")?;
    let key_file = required_string(matches, "key-file")?;
    if cert_file.is_empty() != key_file.is_empty() {
        return Err(anyhow!(
            "error parsing arguments: either both --cert-file and --key-file must be provided, or neither"
        ));
    }

    if cert_file.is_empty() {
        Ok(None)
    } else {
        Ok(Some(TlsConfig {
            cert_file: PathBuf::from(cert_file),
            key_file: PathBuf::from(key_file),
        }))
    }
}

fn webhook_path(matches: &ArgMatches) -> Result<String> {
    let path = required_string(matches, "webhook-path")?;
    if !path.starts_with('/') {
        return Err(anyhow!(
            "error parsing arguments: --webhook-path must start with '/', got {path:?}"
        ));
    }
    Ok(path)
}
