//! API routes

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::extractors::AppState;
use crate::handlers::{auth, backgrounds, billing, contact, content, uploads};

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/classes", classes_router())
        .nest("/units", units_router())
        .nest("/posts", posts_router())
        .nest("/auth", auth_router())
        .nest("/billing", billing_router())
        .route("/uploads/:id", delete(uploads::delete_upload))
        .route("/backgrounds", get(backgrounds::pick_backgrounds))
        .route("/contact", post(contact::send_contact))
        .route("/webhook/stripe", post(billing::stripe_webhook))
}

fn classes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(content::list_classes))
        .route("/", post(content::create_class))
        .route("/:id", get(content::get_class))
        .route("/:id", put(content::update_class))
        .route("/:id", delete(content::delete_class))
}

fn units_router() -> Router<AppState> {
    Router::new()
        .route("/", get(content::list_units))
        .route("/", post(content::create_unit))
        .route("/mine", get(content::my_units))
        .route("/by-class/:id", get(content::units_by_class))
        .route("/:id", get(content::get_unit))
        .route("/:id", put(content::update_unit))
        .route("/:id", delete(content::delete_unit))
}

fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(content::list_posts))
        .route("/", post(content::create_post))
        .route("/regions", get(content::region_posts))
        .route("/:id", get(content::get_post))
        .route("/:id", put(content::update_post))
        .route("/:id", delete(content::delete_post))
}

fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/me", get(auth::me))
}

fn billing_router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(billing::create_checkout))
        .route("/cancel", post(billing::cancel_subscription))
}
