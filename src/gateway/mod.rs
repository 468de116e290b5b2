pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpGateway;
pub use traits::RemoteGateway;
pub use types::{AssistantTurnRequest, AssistantTurnResponse, GatewayError};
