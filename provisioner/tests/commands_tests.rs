//! Integration tests for command execution against the in-memory backend

use std::io::Write;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use provisioner::{cli::Command, commands};
use topology::{mock::InMemoryBackend, MessagingError, Provisioner, QueueName, Region, Topic};

const TEST_REGION: &str = "ap-south-1";
const TEST_ACCOUNT: &str = "123456789012";

fn setup(max_payload_bytes: usize) -> (Arc<InMemoryBackend>, Provisioner) {
    let backend = Arc::new(InMemoryBackend::new(
        Region::from(TEST_REGION),
        TEST_ACCOUNT,
    ));
    let provisioner = Provisioner::new(
        backend.clone(),
        Region::from(TEST_REGION),
        max_payload_bytes,
    );
    (backend, provisioner)
}

async fn run(provisioner: &Provisioner, command: Command) -> anyhow::Result<String> {
    let mut out = Vec::new();
    commands::run(provisioner, command, &mut out).await?;
    Ok(String::from_utf8(out).expect("output should be UTF-8"))
}

#[tokio::test]
async fn test_whoami_prints_account() {
    let (_, provisioner) = setup(1024);

    let output = run(&provisioner, Command::Whoami).await.expect("whoami");

    assert_eq!(output, "123456789012\n");
}

#[tokio::test]
async fn test_create_topic_prints_arn() {
    let (_, provisioner) = setup(1024);

    let output = run(
        &provisioner,
        Command::CreateTopic {
            topic: Topic::from("orders"),
        },
    )
    .await
    .expect("create-topic");

    assert_eq!(output, "arn:aws:sns:ap-south-1:123456789012:orders\n");
}

#[tokio::test]
async fn test_create_queue_prints_url_and_subscription() {
    let (_, provisioner) = setup(1024);
    let topic = Topic::from("orders");
    provisioner.create_topic(&topic).await.expect("topic");

    let output = run(
        &provisioner,
        Command::CreateQueue {
            topic,
            queue: QueueName::from("billing"),
        },
    )
    .await
    .expect("create-queue");

    assert_eq!(
        output,
        "queue_url\thttps://sqs.ap-south-1.amazonaws.com/123456789012/billing\n\
         subscription_arn\tarn:aws:sns:ap-south-1:123456789012:orders:sub-1\n"
    );
}

#[tokio::test]
async fn test_create_queue_surfaces_partial_provisioning() {
    let (backend, provisioner) = setup(1024);
    let topic = Topic::from("orders");
    provisioner.create_topic(&topic).await.expect("topic");
    backend.fail_subscriptions(1);

    let err = run(
        &provisioner,
        Command::CreateQueue {
            topic,
            queue: QueueName::from("billing"),
        },
    )
    .await
    .unwrap_err();

    let err = err
        .downcast_ref::<MessagingError>()
        .expect("provisioning error");
    assert!(matches!(err, MessagingError::PartialProvisioning { .. }));
    assert_eq!(backend.queue_count(), 1);
}

#[tokio::test]
async fn test_publish_message_prints_id() {
    let (backend, provisioner) = setup(1024);
    let topic = Topic::from("orders");
    provisioner.create_topic(&topic).await.expect("topic");

    let output = run(
        &provisioner,
        Command::Publish {
            topic,
            message: Some("invoice-42".to_string()),
            file: None,
        },
    )
    .await
    .expect("publish");

    assert_eq!(output, "mid-1\n");
    assert_eq!(backend.published()[0].body, "invoice-42");
}

#[tokio::test]
async fn test_publish_from_file() {
    let (backend, provisioner) = setup(1024);
    let topic = Topic::from("orders");
    provisioner.create_topic(&topic).await.expect("topic");

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{{\"invoice\":42}}").expect("write payload");

    let output = run(
        &provisioner,
        Command::Publish {
            topic,
            message: None,
            file: Some(file.path().to_path_buf()),
        },
    )
    .await
    .expect("publish");

    assert_eq!(output, "mid-1\n");
    assert_eq!(backend.published()[0].body, "{\"invoice\":42}");
}

#[tokio::test]
async fn test_publish_oversized_file_is_rejected() {
    let (backend, provisioner) = setup(8);
    let topic = Topic::from("orders");
    provisioner.create_topic(&topic).await.expect("topic");

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "123456789").expect("write payload");

    let err = run(
        &provisioner,
        Command::Publish {
            topic,
            message: None,
            file: Some(file.path().to_path_buf()),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MessagingError>(),
        Some(MessagingError::PayloadTooLarge { limit: 8 })
    ));
    assert!(backend.published().is_empty());
}

#[tokio::test]
async fn test_demo_flow() {
    let (backend, provisioner) = setup(1024);

    let output = run(
        &provisioner,
        Command::Demo {
            topic: Topic::from("test_topic"),
        },
    )
    .await
    .expect("demo");

    let topic_arn = "arn:aws:sns:ap-south-1:123456789012:test_topic";
    let expected = format!(
        "message_id\tmid-1\n\
         subscriptions\n\
         {topic_arn}:sub-1\tsqs\tarn:aws:sqs:ap-south-1:123456789012:queue_1\n\
         {topic_arn}:sub-2\tsqs\tarn:aws:sqs:ap-south-1:123456789012:queue_1\n\
         {topic_arn}:sub-3\tsqs\tarn:aws:sqs:ap-south-1:123456789012:queue_2\n"
    );
    assert_eq!(output, expected);
    assert_eq!(backend.queue_count(), 2);
    assert_eq!(backend.published()[0].body, "hello world");
}
