use reachstat_common::{ReachError, Result};
use std::fmt;

const WALL_MARKER: &str = "wall";

/// A wall post: `owner_id` is negative for communities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostRef {
    pub owner_id: i64,
    pub post_id: i64,
}

impl PostRef {
    /// Parse `https://vk.com/wall-84648738_222312` style links.
    ///
    /// Everything after the last `wall` must be `<owner>_<post>`. Input without
    /// the marker is treated as the bare `<owner>_<post>` pair.
    ///
    /// ```
    /// use reachstat_social::vk::PostRef;
    ///
    /// let post = PostRef::parse("https://vk.com/wall-84648738_222312").unwrap();
    /// assert_eq!(post.owner_id, -84648738);
    /// assert_eq!(post.post_id, 222312);
    /// ```
    pub fn parse(url: &str) -> Result<Self> {
        let tail = url.rsplit(WALL_MARKER).next().unwrap_or(url);
        let invalid = || ReachError::Validation(format!("invalid post URL: {url}"));

        let mut parts = tail.split('_');
        let (Some(owner), Some(post), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };
        let owner_id = owner.trim().parse::<i64>().map_err(|_| invalid())?;
        let post_id = post.trim().parse::<i64>().map_err(|_| invalid())?;
        Ok(Self { owner_id, post_id })
    }
}

impl fmt::Display for PostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.owner_id, self.post_id)
    }
}
