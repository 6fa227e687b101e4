//! Azure Resource Manager REST client
//!
//! [`ArmClient`] handles authentication, retries and long-running operations. The
//! service modules add typed operations for each resource type this provider manages,
//! reached through accessors such as `client.network().dns_resolvers()`.

pub mod auth;
pub mod client;
pub mod common;
pub mod error;
pub mod lro;
pub mod pool;

pub mod devops_infrastructure;
pub mod dynatrace;
pub mod kubernetes_configuration;
pub mod network;
pub mod service_linker;
pub mod web;

#[cfg(test)]
mod test_helpers;

pub use auth::{ClientSecretCredential, TokenCredential};
pub use client::{ArmClient, RawResponse, RetryConfig};
pub use error::ApiError;
