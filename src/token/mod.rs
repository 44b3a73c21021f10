//! Token Module
//!
//! Session-token lifecycle: persisted visitor identity, claim-based expiry
//! and issuance against the token endpoint.

mod claims;
mod storage;
mod store;

pub use claims::{is_expired, parse_expiry, TokenExpiry};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, SharedStorage};
pub use store::{TokenStore, TOKEN_KEY, VISITOR_ID_KEY};
