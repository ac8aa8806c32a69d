//! Fan-out messaging topology on SNS and SQS
//!
//! This crate creates topics, attaches subscriber queues that only accept
//! messages from their topic, and publishes onto topics. The caller's account
//! id, needed for every ARN, is resolved once per [`Provisioner`] and cached.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]
#![allow(clippy::result_large_err)]

/// ARN construction
pub mod arn;
/// AWS backend
pub mod aws;
/// Backend seam
pub mod backend;
/// Provisioner configuration
pub mod config;
/// Error types
pub mod error;
/// Caller account resolution
pub mod identity;
/// In-memory backend for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
/// Queue access policies
pub mod policy;
/// Provisioning service
pub mod provisioner;
/// Identifier types
pub mod types;

pub use arn::{build_arn, ResourceType};
pub use backend::{MessagingBackend, QueueAttributes, SubscribeRequest, SubscriptionSummary};
pub use config::{ProvisionerConfig, StaticCredentials, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_REGION};
pub use error::{BackendError, BackendResult, MessagingError, MessagingResult};
pub use identity::IdentityResolver;
pub use policy::build_queue_access_policy;
pub use provisioner::Provisioner;
pub use types::{
    AccessKey, AccountId, ProvisionedQueue, QueueName, Region, SecretKey, SubscribedQueue, Topic,
};
