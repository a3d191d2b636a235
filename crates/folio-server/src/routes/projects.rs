use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use folio_protocol::{DeleteResponse, NewProject, Pagination, Project, ProjectPage};
use tracing::info;

use super::{optional, required, ListParams};
use crate::auth::AuthUser;
use crate::error::{AppError, AppJson};
use crate::image;
use crate::state::AppState;
use crate::store::{new_id, ProjectRecord};

fn not_found() -> AppError {
    AppError::NotFound("Project not found".into())
}

/// Trimmed, de-blanked technology tags
fn clean_tech(tech: &[String]) -> Vec<String> {
    tech.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<ProjectPage> {
    let (page, limit) = (params.page(), params.limit());
    let category = params.category();

    let result = state
        .store
        .projects
        .page(
            |p| category.map_or(true, |c| p.category.eq_ignore_ascii_case(c)),
            page,
            limit,
        )
        .await;

    Json(ProjectPage {
        projects: result.items.iter().map(ProjectRecord::to_api).collect(),
        pagination: Pagination::new(page, limit, result.total),
    })
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, AppError> {
    let record = state.store.projects.get(&id).await.ok_or_else(not_found)?;
    Ok(Json(record.to_api()))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(body): AppJson<NewProject>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let record = ProjectRecord {
        id: new_id(),
        title: required(&body.title)?,
        description: required(&body.description)?,
        category: required(&body.category)?,
        image: image::parse_optional(body.image.as_deref())?,
        demo_link: optional(body.demo_link.as_deref()),
        github_link: optional(body.github_link.as_deref()),
        tech: clean_tech(&body.tech),
        created_at: Utc::now(),
    };
    state
        .store
        .projects
        .insert(record.id.clone(), record.clone())
        .await;

    info!(id = %record.id, user = %user.id, "Created project");
    Ok((StatusCode::CREATED, Json(record.to_api())))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<NewProject>,
) -> Result<Json<Project>, AppError> {
    let title = required(&body.title)?;
    let description = required(&body.description)?;
    let category = required(&body.category)?;
    let image = image::parse_optional(body.image.as_deref())?;

    let record = state
        .store
        .projects
        .update(&id, |p| {
            p.title = title;
            p.description = description;
            p.category = category;
            if image.is_some() {
                p.image = image;
            }
            p.demo_link = optional(body.demo_link.as_deref());
            p.github_link = optional(body.github_link.as_deref());
            p.tech = clean_tech(&body.tech);
        })
        .await
        .ok_or_else(not_found)?;

    info!(id = %id, user = %user.id, "Updated project");
    Ok(Json(record.to_api()))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state
        .store
        .projects
        .remove(&id)
        .await
        .ok_or_else(not_found)?;

    info!(id = %id, user = %user.id, "Deleted project");
    Ok(Json(DeleteResponse { success: true, id }))
}
