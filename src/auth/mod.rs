// Authentication module
// JWT login, logout, token refresh and current-user lookup behind an injected identity provider

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod provider;
pub mod repository;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{login_handler, logout_handler, me_handler, refresh_handler};
pub use models::{AccessToken, Credentials, LoginRequest, TokenResponse, User, UserResponse};
pub use provider::{AuthSession, IdentityProvider, JwtIdentityProvider, SharedIdentityProvider};
pub use repository::{
    InMemoryTokenDenylist, InMemoryUserStore, PgTokenDenylist, PgUserStore, TokenDenylist, UserStore,
};
pub use token::TokenService;
