pub mod auth;
pub mod protected;
pub mod system;
pub mod users;

pub use self::auth::model::TokenResponse;
pub use self::users::model::UserSummary;
