//! Stock & draft consistency guard
//!
//! Runs before any cart mutation and before a new checkout session: a cart
//! may back at most one live payment attempt, so any superseded draft order
//! is cancelled first. A stale draft that got paid after the cart changed
//! would otherwise ship the wrong basket.

use shared::models::order::{OrderStatus, PaymentMethod};

use crate::checkout::CheckoutError;
use crate::core::ServerState;
use crate::db::repository::{CartRepository, OrderRepository};

/// Cancel the draft order linked to the user's cart, if any: expire-check
/// then cancel the external session, delete the draft, clear the link.
pub async fn cancel_superseded_draft(state: &ServerState, user: &str) -> Result<(), CheckoutError> {
    let cart_repo = CartRepository::new(state.get_db());
    let Some(cart) = cart_repo.find(user).await? else {
        return Ok(());
    };
    let Some(draft_id) = cart.draft_order else {
        return Ok(());
    };

    let order_repo = OrderRepository::new(state.get_db());
    if let Some(draft) = order_repo.find_by_id(&draft_id).await? {
        if draft.status == OrderStatus::Draft {
            if draft.billing.payment_method == PaymentMethod::Card
                && let Some(session_id) = &draft.billing.session_id
            {
                // Expiry check first: cancelling an already-closed session
                // errors on the provider side
                match state.services.billing.is_session_expired(session_id).await {
                    Ok(true) => {}
                    Ok(false) => {
                        if let Err(e) = state.services.billing.cancel_session(session_id).await {
                            tracing::warn!(session = session_id, error = %e,
                                "Failed to cancel superseded payment session");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(session = session_id, error = %e,
                            "Could not check payment session expiry");
                    }
                }
            }
            order_repo.delete(&draft_id).await?;
            tracing::info!(order = draft.reference, user = user, "Superseded draft cancelled");
        }
        // A linked order that already left DRAFT was paid meanwhile; the
        // link is stale but the order must stay
    }

    cart_repo.clear_draft(user).await?;
    Ok(())
}
