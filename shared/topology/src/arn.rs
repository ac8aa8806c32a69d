//! ARN construction for topics and queues

use strum::Display;

use crate::types::{AccountId, Region};

/// ARN partition. Fixed, not configurable.
pub const PARTITION: &str = "aws";

/// Resource types the topology addresses by ARN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceType {
    /// SNS topic
    Sns,
    /// SQS queue
    Sqs,
}

/// Builds a fully-qualified ARN
///
/// The result is exactly `arn:aws:{resource}:{region}:{account}:{name}`.
/// `name` is used verbatim, callers must pass an already valid resource name.
#[must_use]
pub fn build_arn(resource: ResourceType, region: &Region, account: &AccountId, name: &str) -> String {
    format!("arn:{PARTITION}:{resource}:{region}:{account}:{name}")
}
