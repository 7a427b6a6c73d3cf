//! Security context acquisition: gateway boundary, token cache and the
//! single-flight provider.

pub mod cache;
pub mod gateway;
pub mod provider;

pub use cache::{MemoryTokenCache, TokenCache};
pub use gateway::{GatewayToken, SecurityGateway};
pub use provider::{Principal, SecurityContext, SecurityContextProvider, DEFAULT_CACHE_KEY};
