pub mod catalog;
pub mod config;
pub mod entities;
pub mod extractor;
pub mod feed;
pub mod fetcher;
pub mod query;
pub mod sync;
