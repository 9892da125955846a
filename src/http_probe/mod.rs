pub mod probe;
pub mod resolver;
pub mod result;
pub mod stream;
pub mod timer;

pub mod prelude {
    pub use super::probe::Prober;
    pub use super::resolver::Resolver;
    pub use super::result::Outcome;
    pub use super::stream::{Io, TimedStream};
    pub use super::timer::{PhaseDurations, PhaseTimer, TimingSnapshot};
}

use std::fmt::Write;

/// Renders an error with its whole `source()` chain on one line.
pub fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::error::ProbeError;

    #[test]
    fn test_report_walks_sources() {
        let err = ProbeError::Connect {
            host: "example.com".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(report(&err), "unable to connect to example.com: refused");
    }
}
