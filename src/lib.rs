//! Munin plugin timing the phases of HTTP requests: DNS resolution, TCP
//! connect, request send, server wait and body receive.
//!
//! [`scheduler::run_all`] probes every target concurrently and
//! [`munin::format_multigraph`] renders the batch for munin.

pub mod config;
pub mod error;
pub mod http_probe;
pub mod munin;
pub mod scheduler;

pub use error::{Error, ProbeError};
