use std::time::Duration;

use serde::Deserialize;

use crate::annotation::ParseProps;

pub const DEFAULT_WAIT_SECONDS: u64 = 300;
pub const DEFAULT_CAPACITY_UNITS: i64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    #[default]
    Provisioned,
    PayPerRequest,
}

impl From<BillingMode> for aws_sdk_dynamodb::types::BillingMode {
    fn from(mode: BillingMode) -> Self {
        match mode {
            BillingMode::Provisioned => Self::Provisioned,
            BillingMode::PayPerRequest => Self::PayPerRequest,
        }
    }
}

/// Repository settings. Every key is optional when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Store fields that carry no `#[ddb]` annotation.
    pub allow_untagged_fields: bool,
    /// Lower-case the first character of untagged field names, and of the
    /// version and TTL column names.
    pub lowercase_untagged_fields: bool,
    pub billing_mode: BillingMode,
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
    /// Upper bound for waiting on a new table to become active.
    pub wait_seconds: u64,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            allow_untagged_fields: true,
            lowercase_untagged_fields: true,
            billing_mode: BillingMode::default(),
            read_capacity_units: DEFAULT_CAPACITY_UNITS,
            write_capacity_units: DEFAULT_CAPACITY_UNITS,
            wait_seconds: DEFAULT_WAIT_SECONDS,
        }
    }
}

impl RepoConfig {
    pub fn wait_duration(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }

    pub fn with_allow_untagged_fields(mut self, allow: bool) -> Self {
        self.allow_untagged_fields = allow;
        self
    }

    pub fn with_lowercase_untagged_fields(mut self, lowercase: bool) -> Self {
        self.lowercase_untagged_fields = lowercase;
        self
    }

    pub fn with_billing_mode(mut self, mode: BillingMode) -> Self {
        self.billing_mode = mode;
        self
    }
}

impl ParseProps for RepoConfig {
    fn allow_untagged_fields(&self) -> bool {
        self.allow_untagged_fields
    }

    fn lowercase_untagged_fields(&self) -> bool {
        self.lowercase_untagged_fields
    }
}
