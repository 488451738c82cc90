use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod handlers;
pub mod normalize;
pub mod types;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
