//! AWS implementation of the messaging backend
//!
//! Topics live in SNS, subscriber queues in SQS and the caller identity comes
//! from STS. All three clients share one SDK config.

use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_sns::{types::Subscription, Client as SnsClient};
use aws_sdk_sqs::{types::QueueAttributeName, Client as SqsClient};
use aws_sdk_sts::Client as StsClient;
use tracing::warn;

use crate::{
    backend::{MessagingBackend, QueueAttributes, SubscribeRequest, SubscriptionSummary},
    config::StaticCredentials,
    error::{BackendError, BackendResult},
    types::Region,
};

/// Name reported by the static credentials provider
const STATIC_CREDENTIALS_PROVIDER: &str = "provisioner-static";

/// Maximum attempts per SDK call, initial one included
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff between SDK retries
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

/// Timeout of a single SDK operation, retries included
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

impl StaticCredentials {
    /// Converts into SDK credentials, consuming the secret
    fn into_sdk_credentials(self) -> Credentials {
        Credentials::new(
            self.access_key.into_inner(),
            self.secret_key.expose(),
            None,
            None,
            STATIC_CREDENTIALS_PROVIDER,
        )
    }
}

/// Converts one listed subscription, keeping entries that lack an ARN
fn summarize(subscription: &Subscription) -> SubscriptionSummary {
    let subscription_arn = subscription.subscription_arn().unwrap_or_default();
    if subscription_arn.is_empty() {
        warn!(
            endpoint = subscription.endpoint().unwrap_or_default(),
            "Listed subscription has no ARN"
        );
    }

    SubscriptionSummary {
        subscription_arn: subscription_arn.to_string(),
        endpoint: subscription.endpoint().unwrap_or_default().to_string(),
        protocol: subscription.protocol().unwrap_or_default().to_string(),
    }
}

/// Messaging backend backed by SNS, SQS and STS
#[derive(Debug, Clone)]
pub struct AwsBackend {
    sns_client: SnsClient,
    sqs_client: SqsClient,
    sts_client: StsClient,
}

impl AwsBackend {
    /// Loads SDK configuration and creates the service clients
    ///
    /// # Arguments
    ///
    /// * `region` - Region for all three services
    /// * `credentials` - Static credentials, moved into the SDK credentials
    ///   provider. The default credential chain is used when `None`.
    /// * `endpoint_url` - Optional endpoint override, e.g. `LocalStack`
    pub async fn connect(
        region: &Region,
        credentials: Option<StaticCredentials>,
        endpoint_url: Option<&str>,
    ) -> Self {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(MAX_ATTEMPTS)
            .with_initial_backoff(INITIAL_BACKOFF);

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(OPERATION_TIMEOUT)
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(credentials) = credentials {
            loader = loader.credentials_provider(credentials.into_sdk_credentials());
        }

        if let Some(endpoint_url) = endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        Self::from_config(&loader.load().await)
    }

    /// Creates the service clients from an already loaded SDK config
    #[must_use]
    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            sns_client: SnsClient::new(config),
            sqs_client: SqsClient::new(config),
            sts_client: StsClient::new(config),
        }
    }
}

#[async_trait::async_trait]
impl MessagingBackend for AwsBackend {
    async fn create_topic(&self, name: &str) -> BackendResult<String> {
        let output = self
            .sns_client
            .create_topic()
            .name(name)
            .send()
            .await?;

        output
            .topic_arn()
            .map(ToString::to_string)
            .ok_or(BackendError::MissingField {
                operation: "CreateTopic",
                field: "TopicArn",
            })
    }

    async fn create_queue(
        &self,
        name: &str,
        attributes: &QueueAttributes,
    ) -> BackendResult<String> {
        let output = self
            .sqs_client
            .create_queue()
            .queue_name(name)
            .attributes(
                QueueAttributeName::DelaySeconds,
                attributes.delay_seconds.to_string(),
            )
            .attributes(
                QueueAttributeName::VisibilityTimeout,
                attributes.visibility_timeout_seconds.to_string(),
            )
            .attributes(QueueAttributeName::Policy, &attributes.policy)
            .send()
            .await?;

        output
            .queue_url()
            .map(ToString::to_string)
            .ok_or(BackendError::MissingField {
                operation: "CreateQueue",
                field: "QueueUrl",
            })
    }

    async fn subscribe(&self, request: &SubscribeRequest) -> BackendResult<String> {
        let output = self
            .sns_client
            .subscribe()
            .topic_arn(&request.topic_arn)
            .protocol(&request.protocol)
            .endpoint(&request.endpoint)
            .attributes(
                "RawMessageDelivery",
                request.raw_message_delivery.to_string(),
            )
            .return_subscription_arn(true)
            .send()
            .await?;

        output
            .subscription_arn()
            .map(ToString::to_string)
            .ok_or(BackendError::MissingField {
                operation: "Subscribe",
                field: "SubscriptionArn",
            })
    }

    async fn publish(&self, topic_arn: &str, message: String) -> BackendResult<String> {
        let output = self
            .sns_client
            .publish()
            .topic_arn(topic_arn)
            .message(message)
            .send()
            .await?;

        output
            .message_id()
            .map(ToString::to_string)
            .ok_or(BackendError::MissingField {
                operation: "Publish",
                field: "MessageId",
            })
    }

    async fn caller_identity_arn(&self) -> BackendResult<String> {
        let output = self
            .sts_client
            .get_caller_identity()
            .send()
            .await?;

        output
            .arn()
            .map(ToString::to_string)
            .ok_or(BackendError::MissingField {
                operation: "GetCallerIdentity",
                field: "Arn",
            })
    }

    async fn list_subscriptions_by_topic(
        &self,
        topic_arn: &str,
    ) -> BackendResult<Vec<SubscriptionSummary>> {
        let mut subscriptions = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .sns_client
                .list_subscriptions_by_topic()
                .topic_arn(topic_arn)
                .set_next_token(next_token.take())
                .send()
                .await?;

            subscriptions.extend(output.subscriptions().iter().map(summarize));

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(subscriptions)
    }
}
