pub mod clean;
pub mod config;
pub mod error;
pub mod extract;
pub mod features;
pub mod fetch;
pub mod frame;
pub mod http_client;
pub mod merge;
pub mod model;
pub mod page_cache;
pub mod pipeline;
pub mod scrape;
pub mod store;
