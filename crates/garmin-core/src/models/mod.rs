// ABOUTME: Credential, token, and session models shared by the client crates
// ABOUTME: Re-exports the persisted forms used by token export/import and session restore

mod credentials;
mod session;
mod tokens;

pub use credentials::Credentials;
pub use session::{GarminTokens, Session, SessionEvent, SessionState};
pub use tokens::{ConsumerCredentials, OAuth1Token, OAuth2Token, OAuth2TokenResponse};
