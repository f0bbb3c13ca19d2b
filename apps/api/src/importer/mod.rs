//! Import pipeline: fetch a job posting, have the model extract fields, persist.

pub mod fetcher;
pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;
