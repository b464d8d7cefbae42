//! Application state for Axum handlers.

use crosscut_core::Mediator;

/// Application state shared across all HTTP handlers.
///
/// Holds the [`Mediator`] handlers dispatch through. Applications that need
/// more shared state wrap this in their own struct and implement
/// `FromRef`.
///
/// # Examples
///
/// ```ignore
/// use axum::{extract::State, Json};
/// use crosscut_web::{AppState, WebResult};
///
/// async fn place_order(
///     State(state): State<AppState>,
///     Json(body): Json<PlaceOrderBody>,
/// ) -> WebResult<Json<OrderPlaced>> {
///     let placed = state
///         .mediator
///         .send(PlaceOrder::from(body), &CancellationToken::new())
///         .await?
///         .into_result()?;
///     Ok(Json(placed))
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AppState {
    /// Request dispatcher
    pub mediator: Mediator,
}

impl AppState {
    /// Create application state around `mediator`.
    #[must_use]
    pub const fn new(mediator: Mediator) -> Self {
        Self { mediator }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        // Ensure AppState implements Clone (required for Axum)
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_clones_share_registry() {
        let state = AppState::new(Mediator::builder().build().unwrap());
        let clone = state.clone();
        assert_eq!(format!("{:?}", clone.mediator), format!("{:?}", state.mediator));
    }
}
