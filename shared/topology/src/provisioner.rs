//! Provisioning of the topic → queue → subscription pipeline
//!
//! A pipeline moves through `topic created → queue created → subscribed`.
//! Every edge is a separate backend call, nothing is retried and nothing is
//! rolled back. A failed edge leaves the topology as it was after the last
//! successful one.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, instrument, warn};

use crate::{
    arn::{build_arn, ResourceType},
    aws::AwsBackend,
    backend::{MessagingBackend, QueueAttributes, SubscribeRequest, SubscriptionSummary},
    config::ProvisionerConfig,
    error::{BackendResult, MessagingError, MessagingResult},
    identity::IdentityResolver,
    policy::build_queue_access_policy,
    types::{AccountId, ProvisionedQueue, QueueName, Region, SubscribedQueue, Topic},
};

/// Orchestrates topic creation, subscriber queues and publishing
pub struct Provisioner {
    backend: Arc<dyn MessagingBackend>,
    region: Region,
    identity: IdentityResolver,
    max_payload_bytes: usize,
}

impl Provisioner {
    /// Creates a provisioner on top of an existing backend
    ///
    /// # Arguments
    ///
    /// * `backend` - Backend all calls go to
    /// * `region` - Region used when building ARNs
    /// * `max_payload_bytes` - Largest payload `publish` accepts
    #[must_use]
    pub fn new(
        backend: Arc<dyn MessagingBackend>,
        region: Region,
        max_payload_bytes: usize,
    ) -> Self {
        Self {
            backend,
            region,
            identity: IdentityResolver::new(),
            max_payload_bytes,
        }
    }

    /// Creates a provisioner talking to AWS
    ///
    /// Static credentials in `config` are handed to the SDK credentials
    /// provider and not kept by the provisioner.
    pub async fn connect(config: ProvisionerConfig) -> Self {
        let ProvisionerConfig {
            region,
            credentials,
            endpoint_url,
            max_payload_bytes,
        } = config;

        let backend = AwsBackend::connect(&region, credentials, endpoint_url.as_deref()).await;
        info!(region = %region, "Connected messaging backend");

        Self::new(Arc::new(backend), region, max_payload_bytes)
    }

    /// Region resources are created in
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// Largest payload `publish` accepts, in bytes
    #[must_use]
    pub const fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Returns the caller's account id, resolving it on first use
    ///
    /// # Errors
    ///
    /// Returns `MessagingError` if the account cannot be resolved
    pub async fn account_id(&self) -> MessagingResult<AccountId> {
        self.identity.resolve(self.backend.as_ref()).await
    }

    /// Builds the ARN of a resource owned by the caller's account
    ///
    /// # Errors
    ///
    /// Returns `MessagingError` if the account cannot be resolved
    pub async fn arn(&self, resource: ResourceType, name: &str) -> MessagingResult<String> {
        let account = self.account_id().await?;
        Ok(build_arn(resource, &self.region, &account, name))
    }

    /// Builds the access policy letting `topic` deliver into `queue`
    ///
    /// # Errors
    ///
    /// Returns `MessagingError` if the account cannot be resolved
    pub async fn queue_access_policy(
        &self,
        topic: &Topic,
        queue: &QueueName,
    ) -> MessagingResult<String> {
        let topic_arn = self.arn(ResourceType::Sns, topic.as_str()).await?;
        let queue_arn = self.arn(ResourceType::Sqs, queue.as_str()).await?;
        Ok(build_queue_access_policy(&topic_arn, &queue_arn))
    }

    /// Creates a topic and returns its ARN
    ///
    /// Repeating the call for an existing topic is left to the backend, which
    /// returns the existing ARN.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::Backend` if topic creation fails
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn create_topic(&self, topic: &Topic) -> MessagingResult<String> {
        let topic_arn = self.backend.create_topic(topic.as_str()).await?;
        info!(topic_arn = %topic_arn, "Created topic");
        Ok(topic_arn)
    }

    /// Creates a queue and subscribes it to `topic`
    ///
    /// The queue is created with no delivery delay, a 120 second visibility
    /// timeout and a policy that only admits messages from `topic`. It is then
    /// subscribed with raw message delivery.
    ///
    /// Queue creation is idempotent at the backend. Subscriptions are not
    /// deduplicated, calling this twice for the same pair may leave two
    /// subscriptions.
    ///
    /// # Errors
    ///
    /// * `MessagingError::Backend` if the account cannot be resolved or queue
    ///   creation fails. Nothing was created.
    /// * `MessagingError::PartialProvisioning` if the queue was created but the
    ///   subscription failed. The queue is not removed.
    #[instrument(skip_all, fields(topic = %topic, queue = %queue_name))]
    pub async fn create_subscriber_queue(
        &self,
        topic: &Topic,
        queue_name: &QueueName,
    ) -> MessagingResult<SubscribedQueue> {
        let topic_arn = self.arn(ResourceType::Sns, topic.as_str()).await?;
        let queue_arn = self.arn(ResourceType::Sqs, queue_name.as_str()).await?;
        let attributes =
            QueueAttributes::subscriber(build_queue_access_policy(&topic_arn, &queue_arn));

        let queue_url = self
            .backend
            .create_queue(queue_name.as_str(), &attributes)
            .await?;
        info!(queue_url = %queue_url, "Created subscriber queue");

        let queue = ProvisionedQueue {
            name: queue_name.clone(),
            url: queue_url,
            arn: queue_arn,
        };

        match self.subscribe_arn(&topic_arn, &queue).await {
            Ok(subscription_arn) => Ok(SubscribedQueue {
                queue,
                topic_arn,
                subscription_arn,
            }),
            Err(source) => {
                warn!(
                    queue_url = %queue.url,
                    "Queue created but subscription failed: {}", source
                );
                Err(MessagingError::PartialProvisioning {
                    queue,
                    topic_arn,
                    source,
                })
            }
        }
    }

    /// Subscribes an already existing queue to `topic`
    ///
    /// Completes a pipeline left behind by
    /// `MessagingError::PartialProvisioning`.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::Backend` if the account cannot be resolved or
    /// the subscription fails
    #[instrument(skip_all, fields(topic = %topic, queue = %queue.name))]
    pub async fn subscribe_queue(
        &self,
        topic: &Topic,
        queue: &ProvisionedQueue,
    ) -> MessagingResult<String> {
        let topic_arn = self.arn(ResourceType::Sns, topic.as_str()).await?;
        Ok(self.subscribe_arn(&topic_arn, queue).await?)
    }

    async fn subscribe_arn(
        &self,
        topic_arn: &str,
        queue: &ProvisionedQueue,
    ) -> BackendResult<String> {
        let request = SubscribeRequest {
            topic_arn: topic_arn.to_string(),
            protocol: ResourceType::Sqs.to_string(),
            endpoint: queue.arn.clone(),
            raw_message_delivery: true,
        };

        let subscription_arn = self.backend.subscribe(&request).await?;
        info!(subscription_arn = %subscription_arn, "Subscribed queue to topic");
        Ok(subscription_arn)
    }

    /// Publishes a payload on `topic` and returns the message id
    ///
    /// The payload is read fully into memory, bounded by
    /// [`Self::max_payload_bytes`]. A payload of exactly the maximum size is
    /// accepted.
    ///
    /// # Errors
    ///
    /// * `MessagingError::PayloadTooLarge` if the payload exceeds the maximum
    /// * `MessagingError::InvalidPayload` if the payload is not UTF-8
    /// * `MessagingError::PayloadRead` if reading the payload fails
    /// * `MessagingError::Backend` if the account cannot be resolved or the
    ///   publish fails
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn publish<R>(&self, topic: &Topic, payload: R) -> MessagingResult<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        let message = self.read_payload(payload).await?;
        let topic_arn = self.arn(ResourceType::Sns, topic.as_str()).await?;

        let message_id = self.backend.publish(&topic_arn, message).await?;
        info!(message_id = %message_id, "Published message");
        Ok(message_id)
    }

    async fn read_payload<R>(&self, payload: R) -> MessagingResult<String>
    where
        R: AsyncRead + Unpin + Send,
    {
        let limit = self.max_payload_bytes;
        // One byte past the limit is enough to tell an oversized payload apart
        let read_bound = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);

        let mut buffer = Vec::new();
        payload.take(read_bound).read_to_end(&mut buffer).await?;

        if buffer.len() > limit {
            warn!(limit, "Rejected oversized payload");
            return Err(MessagingError::PayloadTooLarge { limit });
        }

        Ok(String::from_utf8(buffer)?)
    }

    /// Lists the subscriptions of `topic`
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::Backend` if the account cannot be resolved or
    /// the listing fails
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn list_subscriptions(
        &self,
        topic: &Topic,
    ) -> MessagingResult<Vec<SubscriptionSummary>> {
        let topic_arn = self.arn(ResourceType::Sns, topic.as_str()).await?;
        Ok(self.backend.list_subscriptions_by_topic(&topic_arn).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::InMemoryBackend;
    use pretty_assertions::assert_eq;

    fn provisioner(max_payload_bytes: usize) -> (Arc<InMemoryBackend>, Provisioner) {
        let region = Region::from("ap-south-1");
        let backend = Arc::new(InMemoryBackend::new(region.clone(), "123456789012"));
        let provisioner = Provisioner::new(backend.clone(), region, max_payload_bytes);
        (backend, provisioner)
    }

    #[tokio::test]
    async fn test_arn_resolves_account_first() {
        let (backend, provisioner) = provisioner(16);
        assert_eq!(backend.identity_calls(), 0);

        let arn = provisioner
            .arn(ResourceType::Sqs, "billing")
            .await
            .expect("arn");

        assert_eq!(arn, "arn:aws:sqs:ap-south-1:123456789012:billing");
        assert_eq!(backend.identity_calls(), 1);
    }

    #[tokio::test]
    async fn test_queue_access_policy_uses_derived_arns() {
        let (_, provisioner) = provisioner(16);

        let policy = provisioner
            .queue_access_policy(&Topic::from("orders"), &QueueName::from("billing"))
            .await
            .expect("policy");

        assert_eq!(
            policy,
            build_queue_access_policy(
                "arn:aws:sns:ap-south-1:123456789012:orders",
                "arn:aws:sqs:ap-south-1:123456789012:billing"
            )
        );
    }

    #[tokio::test]
    async fn test_subscriber_queue_attributes() {
        let (backend, provisioner) = provisioner(16);
        let topic = Topic::from("orders");
        provisioner.create_topic(&topic).await.expect("topic");

        provisioner
            .create_subscriber_queue(&topic, &QueueName::from("billing"))
            .await
            .expect("subscriber queue");

        let attributes = backend.queue_attributes("billing").expect("queue exists");
        assert_eq!(attributes.delay_seconds, 0);
        assert_eq!(attributes.visibility_timeout_seconds, 120);
        assert!(attributes
            .policy
            .contains("arn:aws:sns:ap-south-1:123456789012:orders"));
    }

    #[tokio::test]
    async fn test_read_payload_rejects_invalid_utf8() {
        let (_, provisioner) = provisioner(16);

        let err = provisioner
            .read_payload(&[0xff_u8, 0xfe, 0xfd][..])
            .await
            .unwrap_err();

        assert!(matches!(err, MessagingError::InvalidPayload(_)));
    }
}
