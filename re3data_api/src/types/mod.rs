mod link;
pub use self::link::{parse_listing, RepositoryLink};
