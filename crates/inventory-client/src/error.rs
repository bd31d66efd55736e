//! Backend client errors

use thiserror::Error;

/// Errors that can occur when talking to the resource backend
#[derive(Debug, Error)]
pub enum ClientError {
    /// Resource not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected because of a conflicting change (HTTP 409)
    ///
    /// Covers both stale resource versions on update and already-existing
    /// objects on create.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other Kubernetes API or transport error
    #[error("Kubernetes error: {0}")]
    Kube(#[source] kube::Error),

    /// The call context was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// The call context deadline expired
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Invalid request (e.g., object without a namespace or name)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Whether retrying the whole reconciliation pass may succeed.
    ///
    /// `NotFound` and `InvalidRequest` describe the request itself and will
    /// not change on retry without a change in observed state.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Conflict(_)
                | ClientError::Cancelled
                | ClientError::DeadlineExceeded
                | ClientError::Kube(_)
        )
    }

    /// Whether the backend reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<kube::Error> for ClientError {
    fn from(err: kube::Error) -> Self {
        if let kube::Error::Api(response) = &err {
            match response.code {
                404 => return ClientError::NotFound(response.message.clone()),
                409 => return ClientError::Conflict(response.message.clone()),
                _ => {}
            }
        }
        ClientError::Kube(err)
    }
}
