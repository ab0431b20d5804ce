use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::auth::authenticate;
use crate::state::AppState;

use super::controller::{get_me, login_user, logout_user};

/// `/me` sits behind the gate; login and logout are public.
pub fn init_auth_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(state, authenticate))
        .route("/login", post(login_user))
        .route("/logout", post(logout_user))
}
