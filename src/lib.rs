pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod tokenizer;
