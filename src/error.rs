use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Batch-level failures. Anything that goes wrong for a single target is a
/// [`ProbeError`] and stays on that target's timer instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No URIs provided.")]
    NoTargets,

    #[error("unable to read config file {path}")]
    ConfigFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}")]
    ConfigFileParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unable to build TLS connector")]
    Tls(#[from] native_tls::Error),
}

/// Transport level failure of one probe.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid URI {uri}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {0}, expected http or https")]
    UnsupportedScheme(String),

    #[error("no host in {0}")]
    MissingHost(String),

    #[error("unable to resolve {host}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to resolve {host}")]
    Lookup {
        host: String,
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },

    #[error("{0} resolved to no address")]
    NoAddress(String),

    #[error("unable to connect to {host}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {host} failed")]
    Tls {
        host: String,
        #[source]
        source: native_tls::Error,
    },

    #[error("invalid request")]
    Request(#[from] hyper::http::Error),

    #[error("HTTP exchange failed")]
    Http(#[from] hyper::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
