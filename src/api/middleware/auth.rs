use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    domain::{Account, AccountRole},
    error::AppError,
    repository::AccountRepository,
};

#[derive(Clone)]
pub struct CurrentUser {
    pub account: Account,
}

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let account = authenticate(&state, &jar).await?;

    request.extensions_mut().insert(CurrentUser { account });

    Ok(next.run(request).await)
}

pub async fn require_tutor(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let account = authenticate(&state, &jar).await?;

    if account.role != AccountRole::Tutor {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(CurrentUser { account });

    Ok(next.run(request).await)
}

async fn authenticate(state: &AppState, jar: &CookieJar) -> Result<Account, AppError> {
    let session_cookie = jar.get("session").ok_or(AppError::Unauthorized)?;

    let session = state
        .service_context
        .auth_service
        .validate_session(session_cookie.value())
        .await?
        .ok_or(AppError::Unauthorized)?;

    state
        .service_context
        .account_repo
        .find_by_id(session.account_id)
        .await?
        .ok_or(AppError::Unauthorized)
}
