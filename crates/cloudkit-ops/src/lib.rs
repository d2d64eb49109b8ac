#![doc = r#"
Cancellable CloudKit web-service operations.

Operation mapping:

| Operation | Request | Result |
| --- | --- | --- |
| `RegisterTokenOperation` | `POST /device/1/{container}/{env}/tokens/register` | `Option<PushTokenInfo>` |
| `CreateTokenOperation` | `POST /device/1/{container}/{env}/tokens/create` | `Option<PushTokenInfo>` |
| `AcceptSharesOperation` | `POST /database/1/{container}/{env}/{scope}/records/accept` | one `ShareMetadata` item per result, `()` overall |

Implementation notes:
- Every operation sends exactly one request through a `Transport`.
- Cancellation never aborts an in-flight request; the response is ignored and
  the outcome is `Completion::Cancelled`.
- Per-item results are delivered before the typed completion, which is
  delivered before the generic finish hook, all on the operation's
  `CallbackQueue`.
"#]

pub mod callback;
pub mod config;
pub mod container;
pub mod error;
pub mod http;
pub mod operation;
pub mod operations;
pub mod testing;
pub mod transport;

pub use callback::CallbackQueue;
pub use config::{
    ApiTokenAuth, AuthContext, CloudConfig, ConfigError, ContainerConfig, Environment,
    ServerToServerKey,
};
pub use container::Container;
pub use error::{OperationError, ServerError, TransportError};
pub use http::{DEFAULT_CLOUDKIT_BASE_URL, ReqwestTransport, RequestSigner, SigningRequest};
pub use operation::{Completion, Operation, OperationHandle, OperationState, RemoteOperation};
pub use operations::{
    AcceptSharesOperation, CreateTokenOperation, PushTokenInfo, RegisterTokenOperation,
    ShareMetadata, ShortGuid,
};
pub use testing::MockTransport;
pub use transport::{DatabaseScope, Endpoint, Method, ServerType, Transport, TransportRequest};
