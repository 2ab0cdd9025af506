//! Social network clients and post analytics.
//!
//! Only the VK pipeline exists today: collect everyone who liked a wall post,
//! look up their profiles in batches and tally them by age group and sex.
//! Requests go out one at a time; [`pacing`] decides how long to wait between them.
pub mod pacing;
pub mod vk;
