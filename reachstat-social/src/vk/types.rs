use serde::{Deserialize, Serialize};

/// Every VK method answers with either `response` or `error`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub response: Option<T>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
}

/// `likes.getList` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikesPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub items: Vec<i64>,
}

/// One `users.get` entry with the `sex` and `bdate` fields requested.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    #[serde(default)]
    pub sex: Sex,
    /// `D.M.YYYY`, `D.M`, or absent depending on the user's privacy settings.
    #[serde(default)]
    pub bdate: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<i64>", rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Unknown,
    Female,
    Male,
}

impl From<i64> for Sex {
    fn from(code: i64) -> Self {
        match code {
            2 => Sex::Male,
            1 => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

impl From<Option<i64>> for Sex {
    fn from(code: Option<i64>) -> Self {
        code.map_or(Sex::Unknown, Sex::from)
    }
}
