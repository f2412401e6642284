use axum::Router;

use crate::state::AppState;

pub mod aggregator;
mod dto;
pub mod handlers;
pub mod ledger;
pub mod model;

pub fn router() -> Router<AppState> {
    handlers::review_routes()
}
