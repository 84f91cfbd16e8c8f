pub mod config;
pub mod entities;
pub mod extractor;
pub mod fetcher;
pub mod insights;
pub mod pipeline;
pub mod repositories;
