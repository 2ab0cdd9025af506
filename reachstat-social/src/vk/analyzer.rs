//! Likes → users → statistics pipeline for one wall post.
use crate::pacing::Pacer;
use crate::vk::client::VkApi;
use crate::vk::post::PostRef;
use crate::vk::stats::{Statistics, build_statistics};
use crate::vk::types::{LikesPage, UserInfo};
use chrono::{Datelike, Local};
use reachstat_common::{ReachError, Result};
use std::borrow::Cow;

/// `likes.getList` page size; a shorter page is the last one.
pub const LIKES_PAGE_SIZE: usize = 100;
/// Most ids `users.get` accepts in one call.
pub const USERS_BATCH_SIZE: usize = 1000;

/// Items gathered over several requests, plus the requests that failed.
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub failures: Vec<ReachError>,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Analysis {
    /// `None` when no likers were collected.
    pub statistics: Option<Statistics>,
    pub likers: usize,
    pub users: usize,
    /// Requests that failed along the way; the statistics cover what was fetched.
    pub failures: Vec<ReachError>,
}

pub struct PostAnalyzer {
    api: VkApi,
    post: PostRef,
    pacer: Box<dyn Pacer>,
}

impl PostAnalyzer {
    /// Parses `post_url` up front; a malformed link fails here, before any request.
    pub fn new(api: VkApi, post_url: &str, pacer: Box<dyn Pacer>) -> Result<Self> {
        let post = PostRef::parse(post_url)?;
        Ok(Self { api, post, pacer })
    }

    pub fn post(&self) -> PostRef {
        self.post
    }

    /// Page through everyone who liked the post.
    ///
    /// Stops after a short or empty page, or at the first failed request; ids
    /// collected before a failure are kept.
    pub async fn get_likers(&mut self) -> Collected<i64> {
        let mut out = Collected::default();
        let mut offset = 0usize;
        let owner_id = self.post.owner_id.to_string();
        let item_id = self.post.post_id.to_string();

        loop {
            self.pacer.pace().await;
            let params = vec![
                ("type", Cow::Borrowed("post")),
                ("owner_id", Cow::Borrowed(owner_id.as_str())),
                ("item_id", Cow::Borrowed(item_id.as_str())),
                ("offset", Cow::Owned(offset.to_string())),
                ("count", Cow::Owned(LIKES_PAGE_SIZE.to_string())),
                ("filter", Cow::Borrowed("likes")),
            ];
            let page: LikesPage = match self.api.call("likes.getList", params).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(post = %self.post, offset, error = %err, "vk.likes.page_failed");
                    out.failures.push(err);
                    break;
                }
            };

            let received = page.items.len();
            tracing::debug!(post = %self.post, offset, received, total = page.count, "vk.likes.page");
            out.items.extend(page.items);
            if received < LIKES_PAGE_SIZE {
                break;
            }
            offset += LIKES_PAGE_SIZE;
        }

        tracing::info!(post = %self.post, likers = out.items.len(), "vk.likes.collected");
        out
    }

    /// Look up sex and birth date for `ids`, [`USERS_BATCH_SIZE`] at a time.
    ///
    /// Results keep chunk order. A failed chunk is recorded and skipped.
    pub async fn get_users_info(&mut self, ids: &[i64]) -> Collected<UserInfo> {
        let mut out = Collected::default();
        for (index, chunk) in ids.chunks(USERS_BATCH_SIZE).enumerate() {
            self.pacer.pace().await;
            let user_ids = chunk
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let params = vec![
                ("user_ids", Cow::Owned(user_ids)),
                ("fields", Cow::Borrowed("sex,bdate")),
            ];
            match self.api.call::<Vec<UserInfo>>("users.get", params).await {
                Ok(users) => {
                    tracing::debug!(chunk = index, requested = chunk.len(), received = users.len(), "vk.users.chunk");
                    out.items.extend(users);
                }
                Err(err) => {
                    tracing::warn!(chunk = index, requested = chunk.len(), error = %err, "vk.users.chunk_failed");
                    out.failures.push(err);
                }
            }
        }
        out
    }

    /// Run the whole pipeline.
    ///
    /// Request failures never abort the run; they are carried in
    /// [`Analysis::failures`]. Without any likers there are no statistics,
    /// whether the post has none or the first likes request failed.
    pub async fn run_analysis(&mut self) -> Analysis {
        tracing::info!(post = %self.post, "vk.analysis.start");
        let likers = self.get_likers().await;
        let mut failures = likers.failures;
        if likers.items.is_empty() {
            tracing::info!(post = %self.post, failures = failures.len(), "vk.analysis.no_likers");
            return Analysis {
                statistics: None,
                likers: 0,
                users: 0,
                failures,
            };
        }

        let users = self.get_users_info(&likers.items).await;
        failures.extend(users.failures);

        let statistics = build_statistics(self.post.post_id, &users.items, Local::now().year());
        tracing::info!(
            post = %self.post,
            likers = likers.items.len(),
            users = users.items.len(),
            failures = failures.len(),
            "vk.analysis.done"
        );
        Analysis {
            statistics: Some(statistics),
            likers: likers.items.len(),
            users: users.items.len(),
            failures,
        }
    }
}
