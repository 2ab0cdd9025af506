//! VK API integration: wall-post likes and liker demographics.
//!
//! [`client::VkApi`] wraps `https://api.vk.com/method/<name>` calls,
//! [`analyzer::PostAnalyzer`] drives the likes → users → statistics pipeline,
//! and [`stats`] holds the fixed age/sex buckets.
pub mod analyzer;
pub mod client;
pub mod post;
pub mod stats;
pub mod types;

pub use analyzer::{Analysis, Collected, PostAnalyzer};
pub use client::VkApi;
pub use post::PostRef;
pub use stats::{Statistics, build_statistics, print_statistics, render_statistics};
