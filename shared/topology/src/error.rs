use std::string::FromUtf8Error;

use aws_sdk_sns::error::SdkError;
use aws_sdk_sns::operation::create_topic::CreateTopicError;
use aws_sdk_sns::operation::list_subscriptions_by_topic::ListSubscriptionsByTopicError;
use aws_sdk_sns::operation::publish::PublishError;
use aws_sdk_sns::operation::subscribe::SubscribeError;
use aws_sdk_sqs::error::SdkError as SqsSdkError;
use aws_sdk_sqs::operation::create_queue::CreateQueueError;
use aws_sdk_sts::error::SdkError as StsSdkError;
use aws_sdk_sts::operation::get_caller_identity::GetCallerIdentityError;
use thiserror::Error;

use crate::types::ProvisionedQueue;

/// Result type alias for backend calls
pub type BackendResult<T> = Result<T, BackendError>;

/// Result type alias for provisioning operations
pub type MessagingResult<T> = Result<T, MessagingError>;

/// Failures returned by the SNS, SQS and STS backend calls
#[derive(Error, Debug)]
pub enum BackendError {
    /// Error creating a topic
    #[error("Failed to create topic")]
    CreateTopic(#[from] SdkError<CreateTopicError>),

    /// Error creating a queue
    #[error("Failed to create queue")]
    CreateQueue(#[from] SqsSdkError<CreateQueueError>),

    /// Error subscribing an endpoint to a topic
    #[error("Failed to subscribe to topic")]
    Subscribe(#[from] SdkError<SubscribeError>),

    /// Error publishing a message on a topic
    #[error("Failed to publish message")]
    Publish(#[from] SdkError<PublishError>),

    /// Error fetching the caller identity
    #[error("Failed to get caller identity")]
    GetCallerIdentity(#[from] StsSdkError<GetCallerIdentityError>),

    /// Error listing the subscriptions of a topic
    #[error("Failed to list subscriptions")]
    ListSubscriptions(#[from] SdkError<ListSubscriptionsByTopicError>),

    /// A backend without SDK errors refused the request
    #[error("{operation} rejected: {reason}")]
    Rejected {
        /// Backend operation that was refused
        operation: &'static str,
        /// Reason given by the backend
        reason: String,
    },

    /// A successful response lacked a field the caller needs
    #[error("{operation} response is missing {field}")]
    MissingField {
        /// Backend operation that returned the response
        operation: &'static str,
        /// Name of the missing field
        field: &'static str,
    },
}

impl BackendError {
    /// Checks if this error represents an upstream (5xx) error
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        match self {
            Self::CreateTopic(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::CreateQueue(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::Subscribe(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::Publish(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::GetCallerIdentity(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::ListSubscriptions(sdk_err) => Self::check_sdk_error_status(sdk_err),
            Self::Rejected { .. } | Self::MissingField { .. } => false,
        }
    }

    fn check_sdk_error_status<E>(sdk_err: &SdkError<E>) -> bool {
        if let SdkError::ServiceError(err) = sdk_err {
            return err.raw().status().as_u16() >= 500;
        }
        false
    }
}

/// Errors surfaced by the provisioning service
#[derive(Error, Debug)]
pub enum MessagingError {
    /// A backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The caller identity ARN does not carry an account segment
    #[error("Malformed caller identity: {descriptor}")]
    MalformedIdentity {
        /// The identity ARN as returned by the backend
        descriptor: String,
    },

    /// The queue was created but subscribing it to the topic failed
    ///
    /// No rollback happens. The queue is left in place and can be subscribed
    /// again with `Provisioner::subscribe_queue`.
    #[error("Queue {queue} was created but subscribing it to {topic_arn} failed: {source}")]
    PartialProvisioning {
        /// The queue that now exists
        queue: ProvisionedQueue,
        /// ARN of the topic the subscription targeted
        topic_arn: String,
        /// The subscription failure
        #[source]
        source: BackendError,
    },

    /// The payload is larger than the configured maximum
    #[error("Payload exceeds the maximum size of {limit} bytes")]
    PayloadTooLarge {
        /// Configured maximum payload size in bytes
        limit: usize,
    },

    /// The payload is not valid UTF-8
    #[error("Payload is not valid UTF-8: {0}")]
    InvalidPayload(#[from] FromUtf8Error),

    /// Reading the payload failed
    #[error("Failed to read payload: {0}")]
    PayloadRead(#[from] std::io::Error),
}

impl MessagingError {
    /// Returns the queue left behind by a partially provisioned subscriber, if any
    #[must_use]
    pub const fn orphaned_queue(&self) -> Option<&ProvisionedQueue> {
        match self {
            Self::PartialProvisioning { queue, .. } => Some(queue),
            _ => None,
        }
    }
}
