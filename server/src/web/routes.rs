// server/src/web/routes.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::{
  admin_product_handlers, auth_handlers, favorite_handlers, inquiry_handlers, order_handlers, product_handlers,
  review_handlers, user_handlers,
};

/// Reports whether the database answers.
async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  match sqlx::query("SELECT 1").execute(&app_state.db_pool).await {
    Ok(_) => HttpResponse::Ok().json(json!({ "status": "ok" })),
    Err(e) => {
      tracing::error!(error = %e, "Health check could not reach the database.");
      HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" }))
    }
  }
}

const INVALID_REQUEST_DATA: &str = "Invalid request data";

/// Bodies that fail to deserialize get the same `{"error": ..}` shape as every other rejection.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req| {
    tracing::debug!(error = %err, "Rejecting unreadable JSON body.");
    AppError::Validation(INVALID_REQUEST_DATA.to_string()).into()
  })
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.app_data(json_config());
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .route("/home", web::get().to(product_handlers::home_handler))
      .service(
        web::scope("/auth")
          .route("/login", web::post().to(auth_handlers::login_handler))
          .route("/logout", web::post().to(auth_handlers::logout_handler)),
      )
      .service(
        web::scope("/users")
          .route("", web::post().to(user_handlers::register_handler))
          .route("", web::put().to(user_handlers::update_profile_handler))
          .route("/me", web::get().to(user_handlers::me_handler))
          .route("/password", web::put().to(user_handlers::change_password_handler)),
      )
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(admin_product_handlers::create_product_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
          .route("/{product_id}", web::put().to(admin_product_handlers::update_product_handler))
          .route("/{product_id}", web::delete().to(admin_product_handlers::delete_product_handler))
          .route("/{product_id}/reviews", web::get().to(review_handlers::list_reviews_handler))
          .route("/{product_id}/reviews", web::post().to(review_handlers::create_review_handler)),
      )
      .service(
        web::scope("/favorites")
          .route("", web::get().to(favorite_handlers::list_favorites_handler))
          .route("", web::post().to(favorite_handlers::add_favorite_handler))
          .route("/{product_id}", web::get().to(favorite_handlers::favorite_status_handler))
          .route("/{product_id}", web::delete().to(favorite_handlers::remove_favorite_handler)),
      )
      .service(
        web::scope("/inquiries")
          .route("", web::post().to(inquiry_handlers::create_inquiry_handler))
          .route("", web::get().to(inquiry_handlers::list_inquiries_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/checkout", web::post().to(order_handlers::checkout_handler))
          .route("/webhook", web::post().to(order_handlers::webhook_handler)),
      ),
  );
}
