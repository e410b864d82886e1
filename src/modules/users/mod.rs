pub mod model;
pub mod repository;

pub use model::{UserRecord, UserSummary};
pub use repository::{DuplicateUser, UserRepository};
