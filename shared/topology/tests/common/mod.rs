//! Shared setup for provisioning tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use topology::{mock::InMemoryBackend, Provisioner, Region};

pub const TEST_REGION: &str = "ap-south-1";
pub const TEST_ACCOUNT: &str = "123456789012";

/// Provisioner wired to an in-memory backend the test can inspect
pub struct TestContext {
    pub backend: Arc<InMemoryBackend>,
    pub provisioner: Arc<Provisioner>,
}

impl TestContext {
    /// Creates a context with the default payload limit
    pub fn new() -> Self {
        Self::with_max_payload_bytes(topology::DEFAULT_MAX_PAYLOAD_BYTES)
    }

    /// Creates a context with a custom payload limit
    pub fn with_max_payload_bytes(max_payload_bytes: usize) -> Self {
        Self::from_backend(
            InMemoryBackend::new(Region::from(TEST_REGION), TEST_ACCOUNT),
            max_payload_bytes,
        )
    }

    /// Creates a context whose identity calls take `delay`
    pub fn with_identity_delay(delay: Duration) -> Self {
        Self::from_backend(
            InMemoryBackend::new(Region::from(TEST_REGION), TEST_ACCOUNT)
                .with_identity_delay(delay),
            topology::DEFAULT_MAX_PAYLOAD_BYTES,
        )
    }

    /// Wraps an already configured backend
    pub fn from_backend(backend: InMemoryBackend, max_payload_bytes: usize) -> Self {
        let backend = Arc::new(backend);
        let provisioner = Arc::new(Provisioner::new(
            backend.clone(),
            Region::from(TEST_REGION),
            max_payload_bytes,
        ));

        Self {
            backend,
            provisioner,
        }
    }
}

/// ARN of a topic in the test account
pub fn topic_arn(name: &str) -> String {
    format!("arn:aws:sns:{TEST_REGION}:{TEST_ACCOUNT}:{name}")
}

/// ARN of a queue in the test account
pub fn queue_arn(name: &str) -> String {
    format!("arn:aws:sqs:{TEST_REGION}:{TEST_ACCOUNT}:{name}")
}
