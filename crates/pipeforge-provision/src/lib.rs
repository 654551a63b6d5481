//! Idempotent provisioning of pipeline rules on the rule-management API.
//!
//! The API itself has no "upsert by name"; [`RuleProvisioner`] emulates it
//! by listing, deleting any same-named rule, and creating a fresh one.

pub mod api;
pub mod errors;
pub mod fixtures;
pub mod http;
pub mod memory;
pub mod provisioner;

pub use api::RuleApi;
pub use errors::{ProvisionError, RuleKind};
pub use fixtures::FixtureDir;
pub use http::{DEFAULT_API_URL, HttpRuleApi, describe_error_body};
pub use memory::MemoryRuleApi;
pub use provisioner::{
    LookupPolicy, ProvisionReport, ProvisionedRule, Replacement, RuleProvisioner,
};
