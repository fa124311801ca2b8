//! # Coordinator
//!
//! Service-owned handle that ties the [`MessageBuilder`], the milestone cache
//! and the durable store together.
//!
//! Issued milestones go into the cache right after they are sealed. When the
//! cache cannot persist an eviction batch, the coordinator halts through its
//! [`IssuanceSupervisor`] and every later issuance fails with
//! [`Error::Halted`](crate::Error::Halted). The milestone whose insertion
//! triggered the failed eviction is already sealed and cached, so it comes
//! back inside [`Error::Unpersisted`](crate::Error::Unpersisted) for the
//! driver to broadcast. [`Coordinator::shutdown`] flushes
//! the cache to the store and halts issuance for good.

mod supervisor;

pub use supervisor::IssuanceSupervisor;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::builder::MessageBuilder;
use crate::cache::{Bundle, CacheStats, MilestoneCache, MilestoneStore};
use crate::config::CoordinatorConfig;
use crate::error::Error;
use crate::message::{MerkleRoot, MessageId, MilestoneIndex, Receipt, SealedMessage};
use crate::pow::ProofOfWork;
use crate::signing::{RetryMetrics, SignerProvider};

pub struct Coordinator<S: MilestoneStore> {
    builder: MessageBuilder,
    cache: Arc<MilestoneCache<Arc<S>>>,
    store: Arc<S>,
    supervisor: IssuanceSupervisor,
}

impl<S: MilestoneStore> Coordinator<S> {
    pub fn new(
        config: CoordinatorConfig,
        signer_provider: Arc<dyn SignerProvider>,
        pow: Arc<dyn ProofOfWork>,
        store: Arc<S>,
    ) -> Result<Self, Error> {
        config.validate().map_err(crate::config::ConfigError::Invalid)?;

        let cache = MilestoneCache::new(config.cache.clone(), Arc::clone(&store))?;
        let builder = MessageBuilder::new(&config, signer_provider, pow);

        info!(
            network_id = config.network_id,
            cache_size = config.cache.size,
            eviction_size = config.cache.eviction_size,
            "coordinator initialized"
        );

        Ok(Self {
            builder,
            cache: Arc::new(cache),
            store,
            supervisor: IssuanceSupervisor::new(),
        })
    }

    /// Build a checkpoint. Checkpoints are not cached.
    pub async fn issue_checkpoint(&self, parents: Vec<MessageId>) -> Result<SealedMessage, Error> {
        self.supervisor.ensure_running()?;
        Ok(self.builder.create_checkpoint(parents).await?)
    }

    /// Build a milestone and insert it into the cache.
    ///
    /// `index` must be greater than every index issued before. If the cache
    /// fails to persist an eviction batch, issuance halts and the new bundle
    /// is returned inside [`Error::Unpersisted`].
    pub async fn issue_milestone(
        &self,
        index: MilestoneIndex,
        parents: Vec<MessageId>,
        receipt: Option<Receipt>,
        inclusion_merkle_root: MerkleRoot,
    ) -> Result<Bundle, Error> {
        self.supervisor.ensure_running()?;

        let sealed = self
            .builder
            .create_milestone(index, parents, receipt, inclusion_merkle_root)
            .await?;
        let bundle = Bundle::from_milestone(sealed)?;

        if let Err(source) = self.cache.put(index, bundle.clone()) {
            let err = Error::Unpersisted {
                bundle: Box::new(bundle),
                source,
            };
            return self.supervisor.observe(Err(err));
        }

        debug!(%index, id = %bundle.message_id(), "milestone cached");
        Ok(bundle)
    }

    /// Drop a cached milestone without storing it
    pub fn invalidate_milestone(&self, index: MilestoneIndex) -> Option<Bundle> {
        let discarded = self.cache.discard_without_persist(&index);
        if discarded.is_some() {
            debug!(%index, "milestone discarded from cache");
        }
        discarded
    }

    /// Look up a milestone in the cache, then in the store
    pub fn milestone(&self, index: MilestoneIndex) -> Result<Option<Bundle>, Error> {
        if let Some(bundle) = self.cache.get(&index) {
            return Ok(Some(bundle));
        }
        Ok(self.store.load_milestone(index)?)
    }

    /// Flush every cached milestone to the store and stop issuance.
    ///
    /// Returns the number of flushed milestones.
    pub fn shutdown(&self) -> Result<usize, Error> {
        let flushed = self.supervisor.observe(self.cache.flush_all().map_err(Error::from))?;
        self.supervisor.halt("coordinator shut down");
        info!(flushed, "coordinator shut down");
        Ok(flushed)
    }

    pub fn is_halted(&self) -> bool {
        self.supervisor.is_halted()
    }

    /// Receiver that changes when issuance halts
    pub fn subscribe_halt(&self) -> watch::Receiver<Option<String>> {
        self.supervisor.subscribe()
    }

    pub fn cache(&self) -> &Arc<MilestoneCache<Arc<S>>> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn retry_metrics(&self) -> RetryMetrics {
        self.builder.retry_metrics()
    }
}
