//! Registers, concludes and withdraws from channels on-chain.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::watch, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    client::{ContractBackend, ContractClient},
    config::Config,
    error::{Error, Result},
    event::EventKind,
    messages::AdjudicatorReq,
    subscription::{cancelled, PollingSubscription},
    wire::{Channel, ChannelId},
};

#[async_trait]
pub trait Adjudicator: Send + Sync {
    type Subscription;

    /// Registers the state of `req` in a dispute.
    async fn register(&self, req: AdjudicatorReq) -> Result<()>;

    /// Concludes the channel if needed and pays out the requesting party.
    async fn withdraw(&self, req: AdjudicatorReq, cancel: watch::Receiver<bool>) -> Result<()>;

    /// Progresses an app channel on-chain.
    async fn progress(&self, req: AdjudicatorReq) -> Result<()>;

    /// Observes `channel_id` until it is disputed or concluded.
    fn subscribe(
        &self,
        channel_id: ChannelId,
        cancel: watch::Receiver<bool>,
    ) -> Result<Self::Subscription>;
}

#[derive(Debug)]
pub struct ContractAdjudicator<B: ContractBackend> {
    client: Arc<ContractClient<B>>,
    config: Config,
}

impl<B: ContractBackend> ContractAdjudicator<B> {
    pub fn new(client: Arc<ContractClient<B>>, config: Config) -> Self {
        Self { client, config }
    }

    /// Gives the other party `funding_max_iters` polls to conclude the
    /// channel. Fetch errors keep the last snapshot. `None` if the channel is
    /// gone, which the contract only does once it is settled.
    async fn wait_for_close(
        &self,
        mut channel: Channel,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Option<Channel>> {
        let channel_id = channel.id();
        let args = ContractClient::<B>::get_channel_args(channel_id);
        for _ in 0..self.config.funding_max_iters {
            if channel.control.closed {
                break;
            }
            tokio::select! {
                biased;
                _ = cancelled(cancel) => return Err(Error::Cancelled),
                _ = sleep(self.config.funding_poll_interval) => {}
            }
            match self.client.fetch_channel_with_args(channel_id, args.clone()).await {
                Ok(fetched) => channel = fetched,
                Err(Error::ChannelNotFound(_)) => return Ok(None),
                Err(e) => {
                    warn!(channel = ?channel_id, error = %e, "fetching channel failed, retrying");
                }
            }
        }
        Ok(Some(channel))
    }

    /// Closes the channel with the state of `req`, waiting for the timeout if
    /// the state is not final.
    async fn conclude(&self, req: &AdjudicatorReq) -> Result<Channel> {
        let state = &req.tx.state;
        let events = if state.finalized {
            info!(channel = ?state.channel_id, version = state.version, "closing channel");
            self.client.close(state, &req.tx.sigs).await?
        } else {
            info!(channel = ?state.channel_id, "force closing channel");
            self.client.force_close(state.channel_id).await?
        };
        match events
            .iter()
            .find(|e| matches!(e.kind(), EventKind::Closed | EventKind::ForceClosed))
        {
            Some(event) => Ok(*event.channel()),
            None => self.client.fetch_channel(state.channel_id).await,
        }
    }
}

#[async_trait]
impl<B: ContractBackend + 'static> Adjudicator for ContractAdjudicator<B> {
    type Subscription = PollingSubscription;

    async fn register(&self, req: AdjudicatorReq) -> Result<()> {
        req.tx.verify(&req.params)?;
        let state = &req.tx.state;
        let channel = self.client.fetch_channel(state.channel_id).await?;
        if channel.control.disputed && channel.state.version >= state.version {
            debug!(
                channel = ?state.channel_id,
                registered = channel.state.version,
                version = state.version,
                "newer or equal state already registered"
            );
            return Ok(());
        }
        info!(channel = ?state.channel_id, version = state.version, "registering state");
        self.client.dispute(state, &req.tx.sigs).await?;
        Ok(())
    }

    async fn withdraw(
        &self,
        req: AdjudicatorReq,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<()> {
        let channel_id = req.tx.state.channel_id;
        let mut channel = match self.client.fetch_channel(channel_id).await {
            Ok(channel) => channel,
            Err(Error::ChannelNotFound(_)) => {
                debug!(channel = ?channel_id, "channel already settled");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if req.secondary {
            match self.wait_for_close(channel, &mut cancel).await? {
                Some(fetched) => channel = fetched,
                None => {
                    debug!(channel = ?channel_id, "channel settled by the other party");
                    return Ok(());
                }
            }
        }
        if !channel.control.closed {
            channel = self.conclude(&req).await?;
        }

        let party = req.party;
        if channel.control.withdrawn(party) || channel.state.balances.balance(party) == 0 {
            debug!(channel = ?channel_id, ?party, "nothing to withdraw");
            return Ok(());
        }
        info!(channel = ?channel_id, ?party, "withdrawing");
        self.client.withdraw(channel_id, party).await?;
        Ok(())
    }

    async fn progress(&self, _req: AdjudicatorReq) -> Result<()> {
        Err(Error::Unsupported("progress"))
    }

    fn subscribe(
        &self,
        channel_id: ChannelId,
        cancel: watch::Receiver<bool>,
    ) -> Result<Self::Subscription> {
        PollingSubscription::new(self.client.clone(), channel_id, cancel, &self.config)
    }
}
