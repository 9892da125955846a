use super::timer::TimingSnapshot;

/// How a finished probe turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// 3xx answered and deliberately not followed. Timings are valid.
    RedirectNotFollowed,
    /// 4xx/5xx. The probing itself worked, timings are valid.
    HttpError,
    /// Nothing usable came back: DNS, connect, TLS, timeout...
    TransportError,
}

impl Outcome {
    pub fn classify(snapshot: &TimingSnapshot) -> Self {
        if snapshot.error.is_some() {
            Outcome::TransportError
        } else if snapshot.status_code >= 400 {
            Outcome::HttpError
        } else if snapshot.is_redirect() {
            Outcome::RedirectNotFollowed
        } else {
            Outcome::Success
        }
    }

    /// Logs the outcome once on the diagnostic stream.
    pub fn log(self, snapshot: &TimingSnapshot) {
        match self {
            Outcome::Success => log::debug!(
                "[{}] {} answered {} ({} bytes)",
                snapshot.name,
                snapshot.uri,
                snapshot.status_code,
                snapshot.body_size
            ),
            Outcome::RedirectNotFollowed => {
                log::warn!("Not following redirection given by {}", snapshot.uri)
            }
            Outcome::HttpError => log::warn!(
                "Got a {}, unable to fetch {}",
                snapshot.status_code,
                snapshot.uri
            ),
            Outcome::TransportError => log::warn!(
                "[{}] {}: {}",
                snapshot.name,
                snapshot.uri,
                snapshot.error.as_deref().unwrap_or_default()
            ),
        }
    }
}
