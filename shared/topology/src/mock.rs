//! In-memory messaging backend for tests
//!
//! Mimics the backend behaviors the provisioning flow depends on: idempotent
//! topic and queue creation, non-deduplicated subscriptions and sequential
//! message ids (`mid-1`, `mid-2`, ...). Failures can be injected per
//! operation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{
    arn::{build_arn, ResourceType},
    backend::{MessagingBackend, QueueAttributes, SubscribeRequest, SubscriptionSummary},
    error::{BackendError, BackendResult},
    types::{AccountId, Region},
};

/// A message accepted by [`InMemoryBackend::publish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Id assigned to the message
    pub message_id: String,
    /// ARN of the topic it was published on
    pub topic_arn: String,
    /// Message body
    pub body: String,
}

#[derive(Debug, Default)]
struct State {
    topics: BTreeMap<String, String>,
    queues: BTreeMap<String, QueueAttributes>,
    subscriptions: Vec<(String, SubscriptionSummary)>,
    subscribe_requests: Vec<SubscribeRequest>,
    published: Vec<PublishedMessage>,
    queue_creations: usize,
    failing_identity_calls: usize,
    failing_subscriptions: usize,
}

/// In-memory [`MessagingBackend`]
#[derive(Debug)]
pub struct InMemoryBackend {
    region: Region,
    account: AccountId,
    identity_arn: String,
    identity_delay: Option<Duration>,
    identity_calls: AtomicUsize,
    state: Mutex<State>,
}

impl InMemoryBackend {
    /// Creates a backend owned by `account` in `region`
    #[must_use]
    pub fn new(region: Region, account: impl Into<String>) -> Self {
        let account = AccountId::new(account);
        let identity_arn = format!("arn:aws:iam::{account}:user/provisioner");

        Self {
            region,
            account,
            identity_arn,
            identity_delay: None,
            identity_calls: AtomicUsize::new(0),
            state: Mutex::new(State::default()),
        }
    }

    /// Overrides the identity ARN returned by `caller_identity_arn`
    #[must_use]
    pub fn with_identity_arn(mut self, identity_arn: impl Into<String>) -> Self {
        self.identity_arn = identity_arn.into();
        self
    }

    /// Delays every identity call, widening the window for concurrent callers
    #[must_use]
    pub const fn with_identity_delay(mut self, delay: Duration) -> Self {
        self.identity_delay = Some(delay);
        self
    }

    /// Makes the next `count` identity calls fail
    pub fn fail_identity_calls(&self, count: usize) {
        self.state().failing_identity_calls = count;
    }

    /// Makes the next `count` subscribe calls fail
    pub fn fail_subscriptions(&self, count: usize) {
        self.state().failing_subscriptions = count;
    }

    /// Number of identity calls received
    #[must_use]
    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }

    /// Number of successful queue creation calls, repeated ones included
    #[must_use]
    pub fn queue_creations(&self) -> usize {
        self.state().queue_creations
    }

    /// Number of distinct queues
    #[must_use]
    pub fn queue_count(&self) -> usize {
        self.state().queues.len()
    }

    /// Attributes a queue was created with
    #[must_use]
    pub fn queue_attributes(&self, name: &str) -> Option<QueueAttributes> {
        self.state().queues.get(name).cloned()
    }

    /// Accepted subscribe requests, in call order
    #[must_use]
    pub fn subscribe_requests(&self) -> Vec<SubscribeRequest> {
        self.state().subscribe_requests.clone()
    }

    /// All messages published so far
    #[must_use]
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state().published.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn queue_url(&self, name: &str) -> String {
        format!(
            "https://sqs.{}.amazonaws.com/{}/{name}",
            self.region, self.account
        )
    }
}

#[async_trait::async_trait]
impl MessagingBackend for InMemoryBackend {
    async fn create_topic(&self, name: &str) -> BackendResult<String> {
        let arn = build_arn(ResourceType::Sns, &self.region, &self.account, name);
        let topic_arn = self
            .state()
            .topics
            .entry(name.to_string())
            .or_insert(arn)
            .clone();
        Ok(topic_arn)
    }

    async fn create_queue(
        &self,
        name: &str,
        attributes: &QueueAttributes,
    ) -> BackendResult<String> {
        let mut state = self.state();
        if let Some(existing) = state.queues.get(name) {
            if existing != attributes {
                return Err(BackendError::Rejected {
                    operation: "CreateQueue",
                    reason: format!("QueueAlreadyExists: {name} exists with different attributes"),
                });
            }
        } else {
            state.queues.insert(name.to_string(), attributes.clone());
        }
        state.queue_creations += 1;
        drop(state);

        Ok(self.queue_url(name))
    }

    async fn subscribe(&self, request: &SubscribeRequest) -> BackendResult<String> {
        let mut state = self.state();
        if state.failing_subscriptions > 0 {
            state.failing_subscriptions -= 1;
            return Err(BackendError::Rejected {
                operation: "Subscribe",
                reason: "AuthorizationError: injected failure".to_string(),
            });
        }
        if !state.topics.values().any(|arn| arn == &request.topic_arn) {
            return Err(BackendError::Rejected {
                operation: "Subscribe",
                reason: format!("NotFound: Topic does not exist: {}", request.topic_arn),
            });
        }

        let subscription_arn = format!("{}:sub-{}", request.topic_arn, state.subscriptions.len() + 1);
        state.subscriptions.push((
            request.topic_arn.clone(),
            SubscriptionSummary {
                subscription_arn: subscription_arn.clone(),
                endpoint: request.endpoint.clone(),
                protocol: request.protocol.clone(),
            },
        ));
        state.subscribe_requests.push(request.clone());

        Ok(subscription_arn)
    }

    async fn publish(&self, topic_arn: &str, message: String) -> BackendResult<String> {
        let mut state = self.state();
        if !state.topics.values().any(|arn| arn == topic_arn) {
            return Err(BackendError::Rejected {
                operation: "Publish",
                reason: format!("NotFound: Topic does not exist: {topic_arn}"),
            });
        }

        let message_id = format!("mid-{}", state.published.len() + 1);
        state.published.push(PublishedMessage {
            message_id: message_id.clone(),
            topic_arn: topic_arn.to_string(),
            body: message,
        });

        Ok(message_id)
    }

    async fn caller_identity_arn(&self) -> BackendResult<String> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.identity_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.failing_identity_calls > 0 {
            state.failing_identity_calls -= 1;
            return Err(BackendError::Rejected {
                operation: "GetCallerIdentity",
                reason: "ExpiredToken: injected failure".to_string(),
            });
        }

        Ok(self.identity_arn.clone())
    }

    async fn list_subscriptions_by_topic(
        &self,
        topic_arn: &str,
    ) -> BackendResult<Vec<SubscriptionSummary>> {
        let state = self.state();
        if !state.topics.values().any(|arn| arn == topic_arn) {
            return Err(BackendError::Rejected {
                operation: "ListSubscriptionsByTopic",
                reason: format!("NotFound: Topic does not exist: {topic_arn}"),
            });
        }

        Ok(state
            .subscriptions
            .iter()
            .filter(|(topic, _)| topic == topic_arn)
            .map(|(_, subscription)| subscription.clone())
            .collect())
    }
}
