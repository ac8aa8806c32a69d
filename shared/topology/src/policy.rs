//! Queue access policies
//!
//! A subscriber queue only accepts `sqs:SendMessage` from requests whose
//! `aws:SourceArn` is the topic it is subscribed to. Spoofing of the source
//! ARN is prevented by the backend's request authentication, not here.

use serde_json::json;

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement id of the topic-to-queue grant
pub const STATEMENT_SID: &str = "AllowSNSPublishToQueue";

/// Builds the access policy document for a subscriber queue
///
/// Grants `sqs:SendMessage` on `queue_arn` to any principal, conditioned on
/// the request's source ARN being exactly `topic_arn`.
#[must_use]
pub fn build_queue_access_policy(topic_arn: &str, queue_arn: &str) -> String {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Sid": STATEMENT_SID,
                "Effect": "Allow",
                "Principal": {
                    "AWS": "*"
                },
                "Action": "sqs:SendMessage",
                "Resource": queue_arn,
                "Condition": {
                    "ArnEquals": {
                        "aws:SourceArn": topic_arn
                    }
                }
            }
        ]
    })
    .to_string()
}
