use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::Pagination;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub demo_link: Option<String>,
    pub github_link: Option<String>,
    #[serde(default)]
    pub tech: Vec<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/projects` and `PUT /api/projects/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewProject {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_link: Option<String>,
    #[serde(default)]
    pub tech: Vec<String>,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPage {
    pub projects: Vec<Project>,
    pub pagination: Pagination,
}

/// Paginated or legacy bare-array project listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectListing {
    Paged(ProjectPage),
    Legacy(Vec<Project>),
}

impl ProjectListing {
    pub fn into_page(self) -> ProjectPage {
        match self {
            ProjectListing::Paged(page) => page,
            ProjectListing::Legacy(projects) => ProjectPage {
                pagination: Pagination::single_page(projects.len()),
                projects,
            },
        }
    }
}
