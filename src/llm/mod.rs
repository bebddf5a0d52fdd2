pub mod client;

pub use client::{LlmClient, LlmError, Sampling};
