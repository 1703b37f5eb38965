//! Observes a single channel by polling the contract.
//!
//! A [PollingSubscription] spawns a task that fetches the channel at a fixed
//! interval and compares its [Control] with the previous snapshot. The first
//! change that yields an event is delivered and the task finishes. A backwards
//! transition is delivered on a separate error channel instead.

use std::{sync::Arc, time::Duration};

use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, error, warn};

use crate::{
    client::{ContractBackend, ContractClient},
    config::Config,
    error::{Error, Result},
    event::{diff, Event, TransitionError},
    scval::ScVal,
    wire::{Channel, ChannelId, Control},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    Running,
    Finished,
}

/// When a registered state may be concluded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Timeout {
    /// Already passed.
    Elapsed,
    /// Passes once the ledger time reaches `expires_at` (seconds).
    Ledger { expires_at: u64 },
}

impl Timeout {
    fn for_channel(channel: &Channel) -> Self {
        Timeout::Ledger {
            expires_at: channel
                .control
                .timestamp
                .saturating_add(channel.params.challenge_duration),
        }
    }

    pub fn is_elapsed(&self, now: u64) -> bool {
        match self {
            Timeout::Elapsed => true,
            Timeout::Ledger { expires_at } => now >= *expires_at,
        }
    }
}

/// What the channel protocol learns from a subscription.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdjudicatorEvent {
    /// A state was registered in a dispute.
    Registered {
        channel_id: ChannelId,
        version: u64,
        timeout: Timeout,
    },
    /// The channel was closed and can be withdrawn from.
    Concluded {
        channel_id: ChannelId,
        version: u64,
        timeout: Timeout,
    },
}

impl AdjudicatorEvent {
    /// Maps the contract events the protocol reacts to, others yield `None`.
    pub fn from_event(event: &Event) -> Option<Self> {
        let channel = event.channel();
        match event {
            Event::Dispute(_) => Some(AdjudicatorEvent::Registered {
                channel_id: channel.id(),
                version: channel.state.version,
                timeout: Timeout::for_channel(channel),
            }),
            Event::Closed(_) | Event::ForceClosed(_) => Some(AdjudicatorEvent::Concluded {
                channel_id: channel.id(),
                version: channel.state.version,
                timeout: Timeout::Elapsed,
            }),
            _ => None,
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        match self {
            AdjudicatorEvent::Registered { channel_id, .. }
            | AdjudicatorEvent::Concluded { channel_id, .. } => *channel_id,
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            AdjudicatorEvent::Registered { version, .. }
            | AdjudicatorEvent::Concluded { version, .. } => *version,
        }
    }

    pub fn timeout(&self) -> Timeout {
        match self {
            AdjudicatorEvent::Registered { timeout, .. }
            | AdjudicatorEvent::Concluded { timeout, .. } => *timeout,
        }
    }
}

/// Resolves once `rx` holds `true`. A dropped sender resolves if
/// `stop_on_drop` is set and never resolves otherwise.
async fn signalled(rx: &mut watch::Receiver<bool>, stop_on_drop: bool) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            if stop_on_drop {
                return;
            }
            std::future::pending::<()>().await;
        }
    }
}

/// Resolves once cancellation is requested. Dropping the sender is not a
/// cancellation.
pub(crate) async fn cancelled(rx: &mut watch::Receiver<bool>) {
    signalled(rx, false).await
}

struct Poller<B: ContractBackend> {
    client: Arc<ContractClient<B>>,
    channel_id: ChannelId,
    args: Vec<ScVal>,
    interval: Duration,
    events: mpsc::Sender<Event>,
    errors: mpsc::Sender<TransitionError>,
    cancel: watch::Receiver<bool>,
    close: watch::Receiver<bool>,
}

impl<B: ContractBackend> Poller<B> {
    async fn run(mut self) {
        let mut previous = Control::default();
        loop {
            tokio::select! {
                biased;
                _ = signalled(&mut self.cancel, false) => {
                    debug!(channel = ?self.channel_id, "subscription cancelled");
                    return;
                }
                _ = signalled(&mut self.close, true) => {
                    debug!(channel = ?self.channel_id, "subscription closed");
                    return;
                }
                _ = sleep(self.interval) => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = signalled(&mut self.cancel, false) => return,
                _ = signalled(&mut self.close, true) => return,
                fetched = self.client.fetch_channel_with_args(self.channel_id, self.args.clone()) => fetched,
            };
            let channel = match fetched {
                Ok(channel) => channel,
                Err(e) => {
                    warn!(channel = ?self.channel_id, error = %e, "fetching channel failed, retrying");
                    continue;
                }
            };

            match diff(&previous, &channel.control) {
                Ok(None) => {
                    debug!(channel = ?self.channel_id, control = ?channel.control, "no change");
                    previous = channel.control;
                }
                Ok(Some(change)) => {
                    let event = change.into_event(channel);
                    debug!(channel = ?self.channel_id, kind = ?event.kind(), "channel event");
                    // The receiver may be gone already, we are done either way.
                    let _ = self.events.send(event).await;
                    return;
                }
                Err(e) => {
                    error!(channel = ?self.channel_id, error = %e, "invalid control transition");
                    let _ = self.errors.send(e).await;
                    return;
                }
            }
        }
    }
}

/// Delivers the next change of one channel, see the [module docs][self].
#[derive(Debug)]
pub struct PollingSubscription {
    channel_id: ChannelId,
    events: mpsc::Receiver<Event>,
    errors: mpsc::Receiver<TransitionError>,
    close_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    closed: bool,
    err: Option<TransitionError>,
}

impl PollingSubscription {
    /// Spawns the polling task on the current tokio runtime. Setting `cancel`
    /// to `true` stops it. Fails with [Error::NoRuntime] outside a runtime.
    pub fn new<B: ContractBackend + 'static>(
        client: Arc<ContractClient<B>>,
        channel_id: ChannelId,
        cancel: watch::Receiver<bool>,
        config: &Config,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let (events_tx, events) = mpsc::channel(config.event_buffer.max(1));
        let (errors_tx, errors) = mpsc::channel(1);
        let (close_tx, close) = watch::channel(false);

        let poller = Poller {
            client,
            channel_id,
            args: ContractClient::<B>::get_channel_args(channel_id),
            interval: config.poll_interval,
            events: events_tx,
            errors: errors_tx,
            cancel,
            close,
        };
        let task = runtime.spawn(poller.run());

        Ok(Self {
            channel_id,
            events,
            errors,
            close_tx,
            task: Some(task),
            closed: false,
            err: None,
        })
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn state(&self) -> SubscriptionState {
        let finished = self.task.as_ref().map_or(true, |task| task.is_finished());
        if self.closed || finished {
            SubscriptionState::Finished
        } else {
            SubscriptionState::Running
        }
    }

    /// The next raw event, `None` once the subscription finished without one.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Waits for the error that ended the subscription, `None` if it ended
    /// without one.
    pub async fn next_error(&mut self) -> Option<TransitionError> {
        if self.err.is_none() {
            self.err = self.errors.recv().await;
        }
        self.err
    }

    /// The error that ended the subscription, if one was delivered already.
    pub fn err(&mut self) -> Option<TransitionError> {
        if self.err.is_none() {
            self.err = self.errors.try_recv().ok();
        }
        self.err
    }

    /// The next event the channel protocol reacts to. Marks the subscription
    /// closed once one was returned.
    pub async fn next(&mut self) -> Option<AdjudicatorEvent> {
        if self.closed {
            return None;
        }
        let event = self.events.recv().await?;
        let mapped = AdjudicatorEvent::from_event(&event)?;
        self.closed = true;
        Some(mapped)
    }

    /// Stops the polling task.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::SubscriptionClosed);
        }
        self.closed = true;
        // Fails only if the task already finished.
        let _ = self.close_tx.send(true);
        Ok(())
    }

    /// Waits for the polling task to finish.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(channel = ?self.channel_id, error = %e, "subscription task failed");
            }
        }
    }
}

impl Drop for PollingSubscription {
    fn drop(&mut self) {
        let _ = self.close_tx.send(true);
    }
}
