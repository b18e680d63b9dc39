pub mod oauth2;
pub mod token_state;

pub use oauth2::OAuth2Auth;
pub use token_state::TokenState;
