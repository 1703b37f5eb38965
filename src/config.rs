//! Tunables of the subscription and funding loops.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_poll_interval() -> Duration {
    Duration::from_secs(4)
}

fn default_event_buffer() -> usize {
    3
}

fn default_funding_max_iters() -> usize {
    30
}

fn default_funding_poll_interval() -> Duration {
    Duration::from_secs(2)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Time between two queries of a polling subscription.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
    /// Capacity of a subscription's event channel. At least 1 is used.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// How often the funder and a secondary adjudicator check the channel
    /// before giving up.
    #[serde(default = "default_funding_max_iters")]
    pub funding_max_iters: usize,
    /// Time between two checks of the funder.
    #[serde(default = "default_funding_poll_interval")]
    pub funding_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            event_buffer: default_event_buffer(),
            funding_max_iters: default_funding_max_iters(),
            funding_poll_interval: default_funding_poll_interval(),
        }
    }
}

impl Config {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    pub fn with_funding_max_iters(mut self, iters: usize) -> Self {
        self.funding_max_iters = iters;
        self
    }

    pub fn with_funding_poll_interval(mut self, interval: Duration) -> Self {
        self.funding_poll_interval = interval;
        self
    }
}
