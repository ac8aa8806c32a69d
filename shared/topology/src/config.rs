use crate::types::{AccessKey, Region, SecretKey};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "ap-south-1";

/// Largest payload `Provisioner::publish` accepts by default (the SNS message limit)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 256 * 1024;

/// Static access key / secret key pair
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    /// Access key id
    pub access_key: AccessKey,
    /// Secret access key
    pub secret_key: SecretKey,
}

/// Configuration for a [`crate::Provisioner`]
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Region topics and queues are created in
    pub region: Region,
    /// Static credentials. The SDK default credential chain is used when `None`.
    pub credentials: Option<StaticCredentials>,
    /// Endpoint override, e.g. `LocalStack`
    pub endpoint_url: Option<String>,
    /// Maximum accepted payload size for publish, in bytes
    pub max_payload_bytes: usize,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            region: Region::from(DEFAULT_REGION),
            credentials: None,
            endpoint_url: None,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl ProvisionerConfig {
    /// Sets the region
    #[must_use]
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Sets static credentials
    #[must_use]
    pub fn with_credentials(mut self, access_key: AccessKey, secret_key: SecretKey) -> Self {
        self.credentials = Some(StaticCredentials {
            access_key,
            secret_key,
        });
        self
    }

    /// Sets an endpoint override
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Sets the maximum payload size
    #[must_use]
    pub const fn with_max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.max_payload_bytes = max_payload_bytes;
        self
    }
}
