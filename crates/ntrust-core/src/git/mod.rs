//! Git operations for inferring the trust target.
//!
//! This module provides:
//! - Repository root discovery with a soft fallback to the working directory
//! - Default remote lookup
//! - Remote URL parsing into provider and `owner/name` identity

mod remote;
mod repo;

pub use remote::{infer_provider_from_remote, parse_repo_from_remote, validate_repo_identity};
pub use repo::{default_remote_url, resolve_repo_root};
