//! Long-running operations
//!
//! ARM reports an asynchronous mutation in one of three ways: an `Azure-AsyncOperation`
//! header naming an operation status document, a `Location` header on a 202 that answers
//! 202 until the operation is over, or a non-terminal `provisioningState` on the resource
//! itself. [`ArmPoller`] follows whichever the response used.

use async_trait::async_trait;
use serde::Deserialize;
use tfsdk::{Completion, Context, PollResult, PollerType, PollingStatus, RemoteError};

use super::client::{ArmClient, RawResponse};
use super::common::{provisioning_state, ArmErrorDetail, ProvisioningState};

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const LOCATION: &str = "location";

#[derive(Debug, Clone, PartialEq)]
pub enum PollTarget {
    AsyncOperation(String),
    Location(String),
    ProvisioningState(String),
}

pub struct ArmPoller {
    client: ArmClient,
    target: PollTarget,
}

impl ArmPoller {
    pub fn new(client: ArmClient, target: PollTarget) -> Self {
        Self { client, target }
    }

    pub fn target(&self) -> &PollTarget {
        &self.target
    }
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<ArmErrorDetail>,
}

fn failure_message(error: Option<ArmErrorDetail>) -> String {
    match error {
        Some(detail) if !detail.code.is_empty() => format!("{}: {}", detail.code, detail.message),
        Some(detail) => detail.message,
        None => String::new(),
    }
}

#[async_trait]
impl PollerType for ArmPoller {
    async fn poll(&self, _ctx: &Context) -> Result<PollResult, RemoteError> {
        match &self.target {
            PollTarget::AsyncOperation(url) => {
                let response = self.client.get_url(url).await?;
                let operation: OperationStatus = response.json()?;
                let state = ProvisioningState::from(operation.status);
                Ok(match state {
                    ProvisioningState::Succeeded => PollResult::succeeded(),
                    ProvisioningState::Failed => {
                        PollResult::failed(PollingStatus::Failed, failure_message(operation.error))
                    }
                    ProvisioningState::Canceled => PollResult::failed(
                        PollingStatus::Cancelled,
                        failure_message(operation.error),
                    ),
                    _ => PollResult::in_progress(response.retry_after()),
                })
            }
            PollTarget::Location(url) => {
                let response = self.client.get_url(url).await?;
                if response.status == 202 {
                    Ok(PollResult::in_progress(response.retry_after()))
                } else {
                    Ok(PollResult::succeeded())
                }
            }
            PollTarget::ProvisioningState(url) => {
                let response = self.client.get_url(url).await?;
                Ok(match provisioning_state(&response.value()) {
                    None | Some(ProvisioningState::Succeeded) => PollResult::succeeded(),
                    Some(ProvisioningState::Failed) => PollResult::failed(
                        PollingStatus::Failed,
                        "the resource finished provisioning in the Failed state",
                    ),
                    Some(ProvisioningState::Canceled) => PollResult::failed(
                        PollingStatus::Cancelled,
                        "provisioning of the resource was canceled",
                    ),
                    Some(_) => PollResult::in_progress(response.retry_after()),
                })
            }
        }
    }
}

fn poll(client: &ArmClient, target: PollTarget) -> Completion {
    tracing::debug!(target = ?target, "following long running operation");
    Completion::Poll(Box::new(ArmPoller::new(client.clone(), target)))
}

/// How a PUT or PATCH completes. `resource_url` is polled when only the body says the
/// resource is still provisioning.
pub fn write_completion(client: &ArmClient, response: &RawResponse, resource_url: &str) -> Completion {
    if let Some(url) = response.header(AZURE_ASYNC_OPERATION) {
        return poll(client, PollTarget::AsyncOperation(url.to_string()));
    }
    if response.status == 202 {
        if let Some(url) = response.header(LOCATION) {
            return poll(client, PollTarget::Location(url.to_string()));
        }
    }
    match provisioning_state(&response.value()) {
        Some(state) if state != ProvisioningState::Succeeded => {
            poll(client, PollTarget::ProvisioningState(resource_url.to_string()))
        }
        _ => Completion::Done,
    }
}

/// How a DELETE completes. An accepted delete without anything to poll completes once
/// the resource can no longer be read.
pub fn delete_completion(client: &ArmClient, response: &RawResponse) -> Completion {
    if let Some(url) = response.header(AZURE_ASYNC_OPERATION) {
        return poll(client, PollTarget::AsyncOperation(url.to_string()));
    }
    match (response.status, response.header(LOCATION)) {
        (202, Some(url)) => poll(client, PollTarget::Location(url.to_string())),
        (202, None) => Completion::WaitForGone,
        _ => Completion::Done,
    }
}
