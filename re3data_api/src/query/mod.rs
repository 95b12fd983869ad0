mod common;
pub use self::common::{Query, QueryCommon};

mod filter;
pub use self::filter::FilterKey;

mod repository;
pub use self::repository::RepositoryQuery;
