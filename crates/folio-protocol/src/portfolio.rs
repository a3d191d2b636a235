use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::Pagination;

/// A portfolio entry (blog-style article)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub title: String,
    pub category: String,
    pub content: String,
    /// `data:` URL materialized from the stored Base64 payload
    pub image: Option<String>,
    pub author: Option<String>,
    pub read_time: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/portfolios` and `PUT /api/portfolios/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewPortfolio {
    pub title: String,
    pub category: String,
    pub content: String,
    /// Base64 `data:` URL; required on create, optional on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub name: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/portfolios/{id}/comments`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewComment {
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub success: bool,
    pub comment: Comment,
}

/// Paginated portfolio listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPage {
    pub portfolios: Vec<Portfolio>,
    pub pagination: Pagination,
}

/// Either listing form the API has served.
///
/// Older deployments return a bare array; clients must accept both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortfolioListing {
    Paged(PortfolioPage),
    Legacy(Vec<Portfolio>),
}

impl PortfolioListing {
    pub fn into_page(self) -> PortfolioPage {
        match self {
            PortfolioListing::Paged(page) => page,
            PortfolioListing::Legacy(portfolios) => PortfolioPage {
                pagination: Pagination::single_page(portfolios.len()),
                portfolios,
            },
        }
    }
}
