mod client;
mod errors;
mod query;
pub mod types;
pub mod user_agent;
pub mod xml;
pub use self::client::Client;
pub use self::errors::Error;
pub use self::query::{FilterKey, Query, QueryCommon, RepositoryQuery};
