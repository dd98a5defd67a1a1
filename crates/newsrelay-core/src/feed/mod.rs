mod fetcher;
mod filter;
mod models;
mod parser;

pub(crate) use fetcher::read_capped;
pub use fetcher::{FeedClient, FeedFetcher};
pub use filter::should_skip;
pub use models::{Article, Item, NewArticle, NewSource, Source};
pub use parser::parse_items;
