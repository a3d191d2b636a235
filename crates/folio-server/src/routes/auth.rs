use axum::extract::State;
use axum::Json;
use folio_protocol::{LoginRequest, LoginResponse, Principal};
use tracing::info;

use crate::auth::{verify_password, AuthUser};
use crate::error::{AppError, AppJson};
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest("Please enter all fields".into()));
    }

    // Unknown email and wrong password are indistinguishable to the caller
    let user = state
        .store
        .find_user_by_email(&body.email)
        .await
        .filter(|u| verify_password(&body.password, &u.password_hash))
        .ok_or_else(|| AppError::BadRequest("Invalid credentials".into()))?;

    let token = state
        .jwt
        .issue(&user.principal(), state.clock.now_epoch_secs())?;

    info!(user = %user.id, "User logged in");
    Ok(Json(LoginResponse { token }))
}

pub async fn me(AuthUser(principal): AuthUser) -> Json<Principal> {
    Json(principal)
}
