//! Backend seam for the pub/sub, queue and identity services

use crate::error::BackendResult;

/// Attributes a queue is created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAttributes {
    /// Delivery delay in seconds
    pub delay_seconds: u32,
    /// Visibility timeout in seconds
    pub visibility_timeout_seconds: u32,
    /// Access policy document
    pub policy: String,
}

impl QueueAttributes {
    /// Delivery delay of subscriber queues
    pub const SUBSCRIBER_DELAY_SECONDS: u32 = 0;
    /// Visibility timeout of subscriber queues (2 minutes)
    pub const SUBSCRIBER_VISIBILITY_TIMEOUT_SECONDS: u32 = 120;

    /// Attributes of a subscriber queue guarded by `policy`
    #[must_use]
    pub const fn subscriber(policy: String) -> Self {
        Self {
            delay_seconds: Self::SUBSCRIBER_DELAY_SECONDS,
            visibility_timeout_seconds: Self::SUBSCRIBER_VISIBILITY_TIMEOUT_SECONDS,
            policy,
        }
    }
}

/// Request to subscribe an endpoint to a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    /// ARN of the topic
    pub topic_arn: String,
    /// Delivery protocol, e.g. `sqs`
    pub protocol: String,
    /// ARN of the receiving endpoint
    pub endpoint: String,
    /// Deliver the raw message body instead of a notification envelope
    pub raw_message_delivery: bool,
}

/// One subscription of a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSummary {
    /// ARN of the subscription
    pub subscription_arn: String,
    /// ARN of the receiving endpoint
    pub endpoint: String,
    /// Delivery protocol
    pub protocol: String,
}

/// Operations of the managed messaging backend
///
/// Implemented by [`crate::aws::AwsBackend`] for AWS and by the in-memory
/// double in `mock` for tests.
#[async_trait::async_trait]
pub trait MessagingBackend: Send + Sync {
    /// Creates a topic and returns its ARN
    async fn create_topic(&self, name: &str) -> BackendResult<String>;

    /// Creates a queue and returns its URL
    async fn create_queue(&self, name: &str, attributes: &QueueAttributes)
        -> BackendResult<String>;

    /// Subscribes an endpoint to a topic and returns the subscription ARN
    async fn subscribe(&self, request: &SubscribeRequest) -> BackendResult<String>;

    /// Publishes a message on a topic and returns the message id
    async fn publish(&self, topic_arn: &str, message: String) -> BackendResult<String>;

    /// Returns the ARN of the identity the backend authenticates the caller as
    async fn caller_identity_arn(&self) -> BackendResult<String>;

    /// Lists all subscriptions of a topic
    async fn list_subscriptions_by_topic(
        &self,
        topic_arn: &str,
    ) -> BackendResult<Vec<SubscriptionSummary>>;
}
