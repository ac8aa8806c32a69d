//! Command execution

use std::io::Write;

use anyhow::Context;
use topology::{MessagingError, Provisioner, QueueName, Topic};
use tracing::{error, info};

use crate::cli::Command;

/// Queues the demo attaches to its topic. `queue_1` is provisioned twice on
/// purpose, showing that the second subscription is not deduplicated.
const DEMO_QUEUES: [&str; 3] = ["queue_1", "queue_1", "queue_2"];

/// Message the demo publishes
const DEMO_MESSAGE: &str = "hello world";

/// Runs a command, writing its results to `out`
///
/// # Errors
///
/// Returns the first error of the underlying provisioning operation
pub async fn run<W: Write + Send>(
    provisioner: &Provisioner,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::Whoami => {
            let account = provisioner.account_id().await?;
            writeln!(out, "{account}")?;
        }
        Command::CreateTopic { topic } => {
            let topic_arn = provisioner.create_topic(&topic).await?;
            writeln!(out, "{topic_arn}")?;
        }
        Command::CreateQueue { topic, queue } => {
            create_queue(provisioner, &topic, &queue, out).await?;
        }
        Command::Publish {
            topic,
            message,
            file,
        } => {
            let message_id = match (message, file) {
                (Some(message), _) => provisioner.publish(&topic, message.as_bytes()).await?,
                (None, Some(path)) => {
                    let file = tokio::fs::File::open(&path)
                        .await
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    provisioner.publish(&topic, file).await?
                }
                (None, None) => provisioner.publish(&topic, tokio::io::stdin()).await?,
            };
            writeln!(out, "{message_id}")?;
        }
        Command::ListSubscriptions { topic } => {
            list_subscriptions(provisioner, &topic, out).await?;
        }
        Command::Demo { topic } => demo(provisioner, &topic, out).await?,
    }

    Ok(())
}

async fn create_queue<W: Write + Send>(
    provisioner: &Provisioner,
    topic: &Topic,
    queue: &QueueName,
    out: &mut W,
) -> anyhow::Result<()> {
    match provisioner.create_subscriber_queue(topic, queue).await {
        Ok(subscribed) => {
            writeln!(out, "queue_url\t{}", subscribed.queue.url)?;
            writeln!(out, "subscription_arn\t{}", subscribed.subscription_arn)?;
            Ok(())
        }
        Err(MessagingError::PartialProvisioning {
            queue: orphan,
            topic_arn,
            source,
        }) => {
            error!(
                queue_url = %orphan.url,
                upstream = source.is_upstream_error(),
                "Queue exists without a subscription, rerun create-queue or remove it"
            );
            Err(MessagingError::PartialProvisioning {
                queue: orphan,
                topic_arn,
                source,
            }
            .into())
        }
        Err(err) => Err(err.into()),
    }
}

async fn list_subscriptions<W: Write + Send>(
    provisioner: &Provisioner,
    topic: &Topic,
    out: &mut W,
) -> anyhow::Result<()> {
    for subscription in provisioner.list_subscriptions(topic).await? {
        writeln!(
            out,
            "{}\t{}\t{}",
            subscription.subscription_arn, subscription.protocol, subscription.endpoint
        )?;
    }
    Ok(())
}

async fn demo<W: Write + Send>(
    provisioner: &Provisioner,
    topic: &Topic,
    out: &mut W,
) -> anyhow::Result<()> {
    let topic_arn = provisioner.create_topic(topic).await?;
    info!(topic_arn = %topic_arn, "Demo topic ready");

    for queue in DEMO_QUEUES {
        provisioner
            .create_subscriber_queue(topic, &QueueName::from(queue))
            .await
            .with_context(|| format!("Failed to provision {queue}"))?;
    }

    let message_id = provisioner
        .publish(topic, DEMO_MESSAGE.as_bytes())
        .await
        .context("Failed to publish demo message")?;
    writeln!(out, "message_id\t{message_id}")?;

    writeln!(out, "subscriptions")?;
    list_subscriptions(provisioner, topic, out).await
}
