pub mod client;
pub mod types;

pub use client::TransmissionClient;
pub use types::{RpcRequest, RpcResponse};

use crate::error::StageResult;
use async_trait::async_trait;

/// The remote-call boundary consumed by the submission pipeline.
///
/// An RPC call that reaches the server and comes back with a failure in the
/// envelope is still `Ok` - the envelope is delivered verbatim to whoever
/// asked. `Err` means the call itself could not complete (transport failure,
/// HTTP-level error, unparseable body).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: RpcRequest) -> StageResult<RpcResponse>;
}
