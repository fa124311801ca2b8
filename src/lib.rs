pub mod builder;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod logging;
pub mod message;
pub mod pow;
pub mod signing;

// Re-exports
pub use builder::{IssuanceError, IssuanceStage, MessageBuilder};
pub use cache::{Bundle, CacheConfig, MilestoneCache, MilestoneStore, WriteBackCache};
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, IssuanceSupervisor};
pub use message::{MessageId, MilestoneIndex, SealedMessage};
pub use pow::{PowContext, ProofOfWork};
pub use signing::{SignerProvider, SigningRetrier};

// Core types
pub type Result<T> = std::result::Result<T, Error>;
pub use error::Error;

pub mod error;
