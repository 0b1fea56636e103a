mod client;
mod types;

pub use client::{RetryConfig, TelegramClient, UpdateBatch};
