//! BookCity Client - typed HTTP client for the BookCity API
//!
//! Two transports implement [`HttpClient`]: [`NetworkHttpClient`] talks to a
//! running server over reqwest, [`OneshotHttpClient`] calls an axum `Router`
//! in-process. [`BookCityClient`] layers the typed API on top of either, and
//! [`Cart`] keeps the local basket that becomes a checkout request.

pub mod api;
pub mod cart;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;

pub use api::BookCityClient;
pub use cart::{Cart, CartItem};
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::{ClientError, ClientResult};
pub use self::http::{HttpClient, NetworkHttpClient, OneshotHttpClient};

// Re-export shared types for convenience
pub use shared::client::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
pub use shared::error::ApiResponse;
