pub mod accept_shares;
pub mod create_token;
pub mod register_token;
pub mod token;

pub use accept_shares::{AcceptSharesOperation, ShareMetadata, ShortGuid};
pub use create_token::CreateTokenOperation;
pub use register_token::RegisterTokenOperation;
pub use token::PushTokenInfo;
