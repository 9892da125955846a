use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::config::model::{ProbeOptions, Targets};
use crate::error::Error;
use crate::http_probe::prelude::*;

/// Upper bound (exclusive) of the random delay before each probe.
pub const MAX_JITTER_MS: u64 = 2000;

/// Fan-in side of a batch: yields exactly one [`PhaseTimer`] per target.
pub struct CompletionQueue {
    receiver: mpsc::Receiver<PhaseTimer>,
    expected: usize,
}

impl CompletionQueue {
    /// Number of timers still to be received.
    pub fn len(&self) -> usize {
        self.expected
    }

    pub fn is_empty(&self) -> bool {
        self.expected == 0
    }

    /// Receives the next finished probe, in completion order.
    /// Returns `None` once every target has been delivered.
    pub async fn next(&mut self) -> Option<PhaseTimer> {
        if self.expected == 0 {
            return None;
        }
        let timer = self.receiver.recv().await;
        match timer {
            Some(_) => self.expected -= 1,
            None => {
                log::error!("{} probe(s) vanished before reporting", self.expected);
                self.expected = 0;
            }
        }
        timer
    }

    /// Receives every remaining timer.
    pub async fn drain(mut self) -> Vec<PhaseTimer> {
        let mut batch = Vec::with_capacity(self.expected);
        while let Some(timer) = self.next().await {
            batch.push(timer);
        }
        batch
    }
}

/// Launches one probe per target, all in parallel, and hands back the queue
/// their results arrive on. One target failing never affects the others.
pub fn run_all(targets: &Targets, options: &ProbeOptions) -> Result<CompletionQueue, Error> {
    if targets.is_empty() {
        return Err(Error::NoTargets);
    }

    let prober = Arc::new(Prober::new(options)?);
    let (sender, receiver) = mpsc::channel(targets.len());

    for (name, uri) in targets {
        let prober = prober.clone();
        let sender = sender.clone();
        let name = name.clone();
        let uri = uri.clone();
        let random_delay = options.random_delay_enabled;

        tokio::spawn(async move {
            // Avoid sending all requests at the exact same time
            if random_delay {
                sleep(jitter()).await;
            }

            let timer = prober.probe(&name, &uri).await;
            if sender.send(timer).await.is_err() {
                log::debug!("[{name}] Completion queue dropped before the probe finished");
            }
        });
    }

    Ok(CompletionQueue {
        receiver,
        expected: targets.len(),
    })
}

fn jitter() -> Duration {
    Duration::from_millis(rand::random_range(0..MAX_JITTER_MS))
}
