use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use folio_protocol::{
    Comment, CommentResponse, DeleteResponse, NewComment, NewPortfolio, Pagination, Portfolio,
    PortfolioPage,
};
use tracing::info;

use super::{optional, required, ListParams};
use crate::auth::{AuthUser, MaybeUser};
use crate::constants::MAX_COMMENT_LENGTH;
use crate::error::{AppError, AppJson};
use crate::image::{self, StoredImage};
use crate::state::AppState;
use crate::store::{new_id, PortfolioRecord};

fn not_found() -> AppError {
    AppError::NotFound("Portfolio not found".into())
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<PortfolioPage> {
    let (page, limit) = (params.page(), params.limit());
    let category = params.category();

    let result = state
        .store
        .portfolios
        .page(
            |p| category.map_or(true, |c| p.category.eq_ignore_ascii_case(c)),
            page,
            limit,
        )
        .await;

    Json(PortfolioPage {
        portfolios: result.items.iter().map(PortfolioRecord::to_api).collect(),
        pagination: Pagination::new(page, limit, result.total),
    })
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Portfolio>, AppError> {
    let record = state.store.portfolios.get(&id).await.ok_or_else(not_found)?;
    Ok(Json(record.to_api()))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(body): AppJson<NewPortfolio>,
) -> Result<(StatusCode, Json<Portfolio>), AppError> {
    let title = required(&body.title)?;
    let category = required(&body.category)?;
    let content = required(&body.content)?;
    let image = body
        .image
        .as_deref()
        .filter(|i| !i.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Please enter all fields".into()))?;
    let image = StoredImage::from_data_url(image)?;

    let record = PortfolioRecord {
        id: new_id(),
        title,
        category,
        content,
        image: Some(image),
        author: optional(body.author.as_deref()),
        read_time: optional(body.read_time.as_deref()),
        comments: Vec::new(),
        created_at: Utc::now(),
    };
    state
        .store
        .portfolios
        .insert(record.id.clone(), record.clone())
        .await;

    info!(id = %record.id, user = %user.id, "Created portfolio");
    Ok((StatusCode::CREATED, Json(record.to_api())))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<NewPortfolio>,
) -> Result<Json<Portfolio>, AppError> {
    let title = required(&body.title)?;
    let category = required(&body.category)?;
    let content = required(&body.content)?;
    // Absent image keeps the current one
    let image = image::parse_optional(body.image.as_deref())?;

    let record = state
        .store
        .portfolios
        .update(&id, |p| {
            p.title = title;
            p.category = category;
            p.content = content;
            if image.is_some() {
                p.image = image;
            }
            p.author = optional(body.author.as_deref());
            p.read_time = optional(body.read_time.as_deref());
        })
        .await
        .ok_or_else(not_found)?;

    info!(id = %id, user = %user.id, "Updated portfolio");
    Ok(Json(record.to_api()))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state
        .store
        .portfolios
        .remove(&id)
        .await
        .ok_or_else(not_found)?;

    info!(id = %id, user = %user.id, "Deleted portfolio");
    Ok(Json(DeleteResponse { success: true, id }))
}

/// Comments are open to anyone; a signed-in commenter may omit their name
pub async fn add_comment(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<NewComment>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let name = match (required(&body.name), viewer) {
        (Ok(name), _) => name,
        (Err(_), Some(principal)) => principal.email,
        (Err(e), None) => return Err(e),
    };
    let text = required(&body.comment)?;
    if text.chars().count() > MAX_COMMENT_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Comment must be at most {MAX_COMMENT_LENGTH} characters"
        )));
    }

    let comment = Comment {
        id: new_id(),
        name,
        comment: text,
        created_at: Utc::now(),
    };
    let stored = comment.clone();
    state
        .store
        .portfolios
        .update(&id, move |p| p.comments.push(stored))
        .await
        .ok_or_else(not_found)?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            success: true,
            comment,
        }),
    ))
}
