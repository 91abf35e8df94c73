//! Config Hot-Reload — Republish Wallets When config.toml Changes
//!
//! The file is read once per poll. Its digest is compared against the
//! last accepted and the last rejected contents, so an unchanged file
//! costs one read and a broken file is reported once, not every tick.
//! Accepted configs go out on a `tokio::sync::watch` channel.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::AppConfig;
use super::loader::parse_config;

/// Outcome of one poll of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Same contents as the accepted or the last rejected version.
    Unchanged,
    /// New contents parsed, validated and broadcast.
    Reloaded,
    /// New contents failed to parse or validate; current config kept.
    Rejected,
    /// The file could not be read.
    Unreadable,
}

/// Polls config.toml and broadcasts each new valid config.
pub struct ConfigWatcher {
    config_path: String,
    interval: Duration,
    config_tx: watch::Sender<AppConfig>,
    accepted: Option<u64>,
    rejected: Option<u64>,
}

impl ConfigWatcher {
    /// The receiver starts out holding `initial_config`.
    pub fn new(config_path: &str, initial_config: AppConfig) -> (Self, watch::Receiver<AppConfig>) {
        let interval = Duration::from_secs(initial_config.service.reload_interval_secs);
        let (config_tx, config_rx) = watch::channel(initial_config);

        let watcher = Self {
            config_path: config_path.to_string(),
            interval,
            config_tx,
            accepted: None,
            rejected: None,
        };

        (watcher, config_rx)
    }

    #[instrument(skip(self, shutdown_rx), fields(path = %self.config_path))]
    pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        // Whatever is on disk now is what the binary started from
        if let Some((digest, _)) = self.read().await {
            self.accepted = Some(digest);
        }

        let mut ticker = self.ticker();
        info!(interval_secs = self.interval.as_secs(), "Config watcher started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Config watcher shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let before = self.interval;
                    if self.poll().await == ReloadOutcome::Reloaded && self.interval != before {
                        info!(interval_secs = self.interval.as_secs(), "Reload interval changed");
                        ticker = self.ticker();
                    }
                }
            }
        }
    }

    /// Read the file once and broadcast it if it holds a new valid config.
    pub async fn poll(&mut self) -> ReloadOutcome {
        let Some((digest, content)) = self.read().await else {
            return ReloadOutcome::Unreadable;
        };

        if Some(digest) == self.accepted || Some(digest) == self.rejected {
            debug!("Config unchanged");
            return ReloadOutcome::Unchanged;
        }

        match parse_config(&content) {
            Ok(config) => {
                self.accepted = Some(digest);
                self.rejected = None;
                self.interval = Duration::from_secs(config.service.reload_interval_secs);
                if self.config_tx.send(config).is_err() {
                    warn!("Config receiver dropped, reload not delivered");
                } else {
                    info!("Config reloaded");
                }
                ReloadOutcome::Reloaded
            }
            Err(e) => {
                self.rejected = Some(digest);
                warn!(error = %e, "Reloaded config rejected, keeping current");
                ReloadOutcome::Rejected
            }
        }
    }

    fn ticker(&self) -> tokio::time::Interval {
        let start = tokio::time::Instant::now() + self.interval;
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    async fn read(&self) -> Option<(u64, String)> {
        match tokio::fs::read_to_string(&self.config_path).await {
            Ok(content) => {
                let mut hasher = DefaultHasher::new();
                content.hash(&mut hasher);
                Some((hasher.finish(), content))
            }
            Err(e) => {
                warn!(error = %e, "Config file unreadable");
                None
            }
        }
    }
}
