use std::net::SocketAddr;
use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::Request;
use hyper::body::Bytes;
use hyper::header::{HOST, USER_AGENT};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_native_tls::TlsConnector as TokioTlsConnector;
use url::{Host, Position, Url};

use super::prelude::*;
use super::report;
use crate::config::model::ProbeOptions;
use crate::error::{Error, ProbeError};

/// Setup a TLS connector for HTTPS targets. Certificates are verified.
pub fn setup_tls_connector() -> Result<TokioTlsConnector, native_tls::Error> {
    let connector = native_tls::TlsConnector::builder().build()?;
    Ok(TokioTlsConnector::from(connector))
}

/// Performs single timed GET requests. Cheap to share between tasks.
#[derive(Clone)]
pub struct Prober {
    user_agent: String,
    timeout: Duration,
    tls: TokioTlsConnector,
    resolver: Resolver,
}

impl Prober {
    pub fn new(options: &ProbeOptions) -> Result<Self, Error> {
        Ok(Self {
            user_agent: options.user_agent.clone(),
            timeout: options.timeout,
            tls: setup_tls_connector()?,
            resolver: Resolver::new(&options.dns_hosts),
        })
    }

    /// Probes `uri` once. Never fails: transport errors end up on the
    /// returned timer, HTTP errors and redirects are logged.
    pub async fn probe(&self, name: &str, uri: &str) -> PhaseTimer {
        let timer = PhaseTimer::new();
        timer.start(name, uri);

        let result = match tokio::time::timeout(self.timeout, self.fetch(uri, &timer)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };
        if let Err(err) = result {
            timer.fail(report(&err));
        }

        let snapshot = timer.snapshot();
        Outcome::classify(&snapshot).log(&snapshot);
        timer
    }

    async fn fetch(&self, uri: &str, timer: &PhaseTimer) -> Result<(), ProbeError> {
        let url = Url::parse(uri).map_err(|source| ProbeError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;
        let https = match url.scheme() {
            "http" => false,
            "https" => true,
            other => return Err(ProbeError::UnsupportedScheme(other.to_string())),
        };
        let host = url
            .host()
            .ok_or_else(|| ProbeError::MissingHost(uri.to_string()))?;
        let port = url
            .port_or_known_default()
            .unwrap_or(if https { 443 } else { 80 });

        let (addrs, server_name) = match host {
            Host::Ipv4(ip) => (vec![SocketAddr::new(ip.into(), port)], ip.to_string()),
            Host::Ipv6(ip) => (vec![SocketAddr::new(ip.into(), port)], ip.to_string()),
            Host::Domain(domain) => {
                timer.dns_start();
                let addrs = self.resolver.lookup(domain, port).await?;
                timer.dns_done();
                (addrs, domain.to_string())
            }
        };

        let tcp = connect(&addrs, &server_name).await?;
        timer.connect_done();

        let stream: Box<dyn Io> = if https {
            let tls = self
                .tls
                .connect(&server_name, tcp)
                .await
                .map_err(|source| ProbeError::Tls {
                    host: server_name.clone(),
                    source,
                })?;
            Box::new(tls)
        } else {
            Box::new(tcp)
        };

        let io = TokioIo::new(TimedStream::new(stream, timer.clone()));
        let (mut sender, connection) = hyper::client::conn::http1::handshake(io).await?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                log::debug!("Connection closed with error: {err}");
            }
        });

        let authority = match url.port() {
            Some(port) => format!("{}:{port}", url.host_str().unwrap_or_default()),
            None => url.host_str().unwrap_or_default().to_string(),
        };
        let request = Request::get(&url[Position::BeforePath..Position::AfterQuery])
            .header(HOST, authority)
            .header(USER_AGENT, &self.user_agent)
            .body(Empty::<Bytes>::new())?;

        // Resolves as soon as the headers are in, the body is still pending
        let response = sender.send_request(request).await?;
        let status = response.status().as_u16();

        let mut body = response.into_body();
        let mut size = 0;
        while let Some(frame) = body.frame().await {
            if let Some(data) = frame?.data_ref() {
                size += data.len();
            }
        }
        timer.set_body_size(size);
        timer.finish(status);

        Ok(())
    }
}

/// Connects to the first reachable address.
async fn connect(addrs: &[SocketAddr], host: &str) -> Result<TcpStream, ProbeError> {
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                log::debug!("Unable to connect to {addr}: {err}");
                last_err = Some(err);
            }
        }
    }

    Err(match last_err {
        Some(source) => ProbeError::Connect {
            host: host.to_string(),
            source,
        },
        None => ProbeError::NoAddress(host.to_string()),
    })
}
