use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod model;

pub fn router() -> Router<AppState> {
    handlers::user_routes().merge(handlers::artisan_routes())
}
