//! Service-to-service OAuth
//!
//! Client-credentials tokens the relay swaps in before requests leave
//! the gateway.

mod client;
mod token;

pub use client::{OAuthClientConfig, OAuthClientManager, ServiceTokenProvider};
pub use token::{ServiceToken, TokenResponse};
