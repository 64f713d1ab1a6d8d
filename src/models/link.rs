use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShortLink {
    pub id: i64,
    pub code: String,
    pub destination: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    /// Fully qualified short URL
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLinkRequest {
    pub url: String,
}

/// Resolution info returned by the link lookup endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkData {
    pub code: String,
    pub url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<ShortLink> for LinkData {
    fn from(link: ShortLink) -> Self {
        Self {
            code: link.code,
            url: link.destination,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}
