use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures_util::stream::Stream;
use tokio::sync::broadcast;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::Result,
    service::{AmountOwed, TuteeBalance},
};

/// Current balance for the signed-in account. Dashboards poll this.
pub async fn owed(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<AmountOwed>> {
    let owed = state
        .service_context
        .billing_service
        .amount_owed_for_user(&user.account.email)
        .await?;

    Ok(Json(owed))
}

/// Push variant of `owed`: one SSE event with the current balance on
/// connect, then a fresh figure after every ledger change. Dashboards
/// that would rather not poll subscribe here; both paths run the same
/// aggregation query.
pub async fn owed_stream(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let billing = state.service_context.billing_service.clone();
    let changes = state.service_context.booking_service.subscribe();
    let email = user.account.email.clone();

    let initial = billing.amount_owed_for_user(&email).await.ok();

    let stream = futures_util::stream::unfold(
        (changes, billing, email, initial),
        |(mut changes, billing, email, pending)| async move {
            if let Some(owed) = pending {
                let event = balance_event(&owed);
                return Some((Ok(event), (changes, billing, email, None)));
            }

            loop {
                match changes.recv().await {
                    // A lagged subscriber just re-reads current state.
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if let Ok(owed) = billing.amount_owed_for_user(&email).await {
                            let event = balance_event(&owed);
                            return Some((Ok(event), (changes, billing, email, None)));
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn balance_event(owed: &AmountOwed) -> Event {
    Event::default()
        .event("balance")
        .json_data(owed)
        .unwrap_or_else(|_| Event::default().event("balance"))
}

/// Operator summary: every tutee with confirmed bookings, sorted by
/// amount owed descending.
pub async fn tutee_balances(
    State(state): State<AppState>,
) -> Result<Json<Vec<TuteeBalance>>> {
    let balances = state
        .service_context
        .billing_service
        .amount_owed_for_all_users()
        .await?;

    Ok(Json(balances))
}
