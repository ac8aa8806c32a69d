use std::fmt;

/// Declares a string newtype used as a typed identifier
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw string value
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the underlying string slice
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the owned string
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_identifier!(
    /// Name of a pub/sub topic messages are published on
    Topic
);

string_identifier!(
    /// Name of a subscriber queue attached to a topic
    QueueName
);

string_identifier!(
    /// AWS account number embedded in resource ARNs
    AccountId
);

string_identifier!(
    /// AWS region the topology lives in
    Region
);

string_identifier!(
    /// Static AWS access key id
    AccessKey
);

/// Static AWS secret access key
///
/// Has no `Display` impl and a redacted `Debug` impl. The only way to read the
/// value is [`SecretKey::expose`], which consumes it.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wraps a raw secret
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Hands the secret over to its final owner
    #[must_use]
    pub fn expose(self) -> String {
        self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A queue that exists at the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedQueue {
    /// Queue name
    pub name: QueueName,
    /// Queue URL returned by the backend
    pub url: String,
    /// Queue ARN
    pub arn: String,
}

impl fmt::Display for ProvisionedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

/// A queue that exists and is subscribed to a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribedQueue {
    /// The queue itself
    pub queue: ProvisionedQueue,
    /// ARN of the topic the queue is subscribed to
    pub topic_arn: String,
    /// ARN of the subscription binding the queue to the topic
    pub subscription_arn: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display_is_raw_value() {
        let topic = Topic::from("orders");
        assert_eq!(topic.to_string(), "orders");
        assert_eq!(topic.as_str(), "orders");
        assert_eq!(Region::new("eu-west-1").into_inner(), "eu-west-1");
    }

    #[test]
    fn test_secret_key_debug_is_redacted() {
        let secret = SecretKey::new("wJalrXUtnFEMI/K7MDENG");
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("wJalrXUtnFEMI"));
        assert_eq!(secret.expose(), "wJalrXUtnFEMI/K7MDENG");
    }

    #[test]
    fn test_provisioned_queue_display() {
        let queue = ProvisionedQueue {
            name: QueueName::from("billing"),
            url: "http://localhost:4566/000000000000/billing".to_string(),
            arn: "arn:aws:sqs:ap-south-1:000000000000:billing".to_string(),
        };
        assert_eq!(
            queue.to_string(),
            "billing (http://localhost:4566/000000000000/billing)"
        );
    }
}
