//! Opens and funds ledger channels.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::watch, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    client::{ContractBackend, ContractClient},
    config::Config,
    error::{Error, Result},
    messages::LedgerChannelFundingRequest,
    subscription::cancelled,
    wire::{Channel, ChannelId, Party},
};

#[async_trait]
pub trait Funder: Send + Sync {
    /// Returns once the channel is funded by both parties. Setting `cancel`
    /// to `true` aborts with [Error::Cancelled].
    async fn fund(
        &self,
        req: LedgerChannelFundingRequest,
        cancel: watch::Receiver<bool>,
    ) -> Result<()>;
}

/// Funds channels through the channel contract.
///
/// Party A opens the channel, party B waits for it to appear. Both then
/// deposit and wait for the other party.
#[derive(Debug)]
pub struct ContractFunder<B: ContractBackend> {
    client: Arc<ContractClient<B>>,
    config: Config,
}

impl<B: ContractBackend> ContractFunder<B> {
    pub fn new(client: Arc<ContractClient<B>>, config: Config) -> Self {
        Self { client, config }
    }

    /// Polls the channel until `done` holds, at most `funding_max_iters`
    /// times. Fetch errors count as not done.
    async fn poll_until(
        &self,
        channel_id: ChannelId,
        cancel: &mut watch::Receiver<bool>,
        done: impl Fn(&Channel) -> bool,
    ) -> Result<Option<Channel>> {
        let args = ContractClient::<B>::get_channel_args(channel_id);
        for _ in 0..self.config.funding_max_iters {
            tokio::select! {
                biased;
                _ = cancelled(cancel) => return Err(Error::Cancelled),
                fetched = self.client.fetch_channel_with_args(channel_id, args.clone()) => match fetched {
                    Ok(channel) if done(&channel) => return Ok(Some(channel)),
                    Ok(_) => {}
                    Err(e) => debug!(channel = ?channel_id, error = %e, "channel not available yet"),
                },
            }
            tokio::select! {
                biased;
                _ = cancelled(cancel) => return Err(Error::Cancelled),
                _ = sleep(self.config.funding_poll_interval) => {}
            }
        }
        Ok(None)
    }

    async fn open(
        &self,
        req: &LedgerChannelFundingRequest,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Channel> {
        let channel_id = req.state.channel_id;
        if req.party == Party::A {
            info!(channel = ?channel_id, "opening channel");
            let events = tokio::select! {
                biased;
                _ = cancelled(cancel) => return Err(Error::Cancelled),
                events = self.client.open(&req.params, &req.state) => events?,
            };
            if let Some(opened) = events.first() {
                return Ok(*opened.channel());
            }
        }
        self.poll_until(channel_id, cancel, |_| true)
            .await?
            .ok_or(Error::ChannelNotOpened(channel_id))
    }
}

#[async_trait]
impl<B: ContractBackend> Funder for ContractFunder<B> {
    async fn fund(
        &self,
        req: LedgerChannelFundingRequest,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<()> {
        let channel_id = req.state.channel_id;
        let channel = self.open(&req, &mut cancel).await?;

        if channel.control.funded(req.party) {
            debug!(channel = ?channel_id, party = ?req.party, "nothing to deposit");
        } else {
            info!(channel = ?channel_id, party = ?req.party, "depositing");
            tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => return Err(Error::Cancelled),
                events = self.client.fund(channel_id, req.party) => { events?; }
            }
        }

        if self
            .poll_until(channel_id, &mut cancel, |c| c.control.is_funded())
            .await?
            .is_some()
        {
            info!(channel = ?channel_id, "channel funded");
            return Ok(());
        }

        warn!(channel = ?channel_id, "funding timed out, aborting");
        if let Err(e) = self.client.abort_funding(channel_id).await {
            warn!(channel = ?channel_id, error = %e, "aborting funding failed");
        }
        Err(Error::FundingTimeout(channel_id))
    }
}
