//! Command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use topology::{AccessKey, ProvisionerConfig, QueueName, Region, SecretKey, Topic};
use tracing::warn;

use crate::types::Environment;

/// Provision SNS topics with SQS subscriber queues and publish onto them
///
/// Talks to AWS unless an endpoint is given. `APP_ENV=development` points
/// every call at `LocalStack` on `http://localhost:4566`.
#[derive(Debug, Parser)]
#[command(name = "provisioner", version, about)]
pub struct Cli {
    /// AWS region, defaults to ap-south-1
    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    /// Static access key id, used together with --secret-key
    #[arg(long, env = "AWS_ACCESS_KEY_ID", global = true)]
    pub access_key: Option<String>,

    /// Static secret access key, used together with --access-key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true, global = true)]
    pub secret_key: Option<SecretKey>,

    /// Endpoint override, defaults to LocalStack when APP_ENV=development
    #[arg(long, env = "AWS_ENDPOINT_URL", global = true)]
    pub endpoint_url: Option<String>,

    /// Largest payload `publish` accepts, in bytes
    #[arg(long, env = "MAX_PAYLOAD_BYTES", global = true)]
    pub max_payload_bytes: Option<usize>,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed on the command line
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the account id of the current credentials
    Whoami,

    /// Create a topic and print its ARN
    CreateTopic {
        /// Topic name
        #[arg(long)]
        topic: Topic,
    },

    /// Create a queue subscribed to a topic
    CreateQueue {
        /// Topic the queue subscribes to
        #[arg(long)]
        topic: Topic,
        /// Queue name
        #[arg(long)]
        queue: QueueName,
    },

    /// Publish a message on a topic and print its id
    ///
    /// Reads the message from stdin when neither --message nor --file is set.
    Publish {
        /// Topic to publish on
        #[arg(long)]
        topic: Topic,
        /// Message body
        #[arg(long, conflicts_with = "file")]
        message: Option<String>,
        /// File holding the message body
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List the subscriptions of a topic
    ListSubscriptions {
        /// Topic name
        #[arg(long)]
        topic: Topic,
    },

    /// Create a topic, subscribe two queues, publish and list subscriptions
    Demo {
        /// Topic name
        #[arg(long, default_value = "test_topic")]
        topic: Topic,
    },
}

impl Cli {
    /// Splits the parsed arguments into provisioner configuration and command
    ///
    /// The explicit endpoint wins over the environment's override. Static
    /// credentials are only used when both halves are present.
    #[must_use]
    pub fn into_parts(self, environment: &Environment) -> (ProvisionerConfig, Command) {
        let mut config = ProvisionerConfig::default();

        if let Some(region) = self.region {
            config = config.with_region(Region::from(region));
        }

        match (self.access_key, self.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                config = config.with_credentials(AccessKey::from(access_key), secret_key);
            }
            (None, None) => {}
            _ => warn!("Ignoring incomplete static credentials, both keys are required"),
        }

        if let Some(endpoint_url) = self
            .endpoint_url
            .as_deref()
            .or_else(|| environment.override_aws_endpoint_url())
        {
            config = config.with_endpoint_url(endpoint_url);
        }

        if let Some(max_payload_bytes) = self.max_payload_bytes {
            config = config.with_max_payload_bytes(max_payload_bytes);
        }

        (config, self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("provisioner").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    fn clear_env() {
        for var in [
            "AWS_REGION",
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "AWS_ENDPOINT_URL",
            "MAX_PAYLOAD_BYTES",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_in_development() {
        clear_env();
        let (config, command) = parse(&["whoami"]).into_parts(&Environment::Development);

        assert_eq!(command, Command::Whoami);
        assert_eq!(config.region.as_str(), topology::DEFAULT_REGION);
        assert!(config.credentials.is_none());
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.max_payload_bytes, topology::DEFAULT_MAX_PAYLOAD_BYTES);
    }

    #[test]
    #[serial]
    fn test_production_uses_default_endpoints() {
        clear_env();
        let (config, _) = parse(&["whoami"]).into_parts(&Environment::Production);

        assert!(config.endpoint_url.is_none());
    }

    #[test]
    #[serial]
    fn test_explicit_options() {
        clear_env();
        let cli = parse(&[
            "--region",
            "eu-west-1",
            "--access-key",
            "AKIDEXAMPLE",
            "--secret-key",
            "secret",
            "--endpoint-url",
            "http://127.0.0.1:4566",
            "--max-payload-bytes",
            "1024",
            "create-queue",
            "--topic",
            "orders",
            "--queue",
            "billing",
        ]);
        let (config, command) = cli.into_parts(&Environment::Development);

        assert_eq!(
            command,
            Command::CreateQueue {
                topic: Topic::from("orders"),
                queue: QueueName::from("billing"),
            }
        );
        assert_eq!(config.region.as_str(), "eu-west-1");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://127.0.0.1:4566"));
        assert_eq!(config.max_payload_bytes, 1024);
        let credentials = config.credentials.expect("credentials should be set");
        assert_eq!(credentials.access_key.as_str(), "AKIDEXAMPLE");
    }

    #[test]
    #[serial]
    fn test_incomplete_credentials_are_ignored() {
        clear_env();
        let (config, _) =
            parse(&["--access-key", "AKIDEXAMPLE", "whoami"]).into_parts(&Environment::Production);

        assert!(config.credentials.is_none());
    }

    #[test]
    #[serial]
    fn test_publish_message_conflicts_with_file() {
        clear_env();
        let result = Cli::try_parse_from([
            "provisioner",
            "publish",
            "--topic",
            "orders",
            "--message",
            "hello",
            "--file",
            "payload.json",
        ]);

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_demo_default_topic() {
        clear_env();
        let (_, command) = parse(&["demo"]).into_parts(&Environment::Development);

        assert_eq!(
            command,
            Command::Demo {
                topic: Topic::from("test_topic")
            }
        );
    }
}
