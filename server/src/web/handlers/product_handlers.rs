// server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::{Product, ProductListing};
use crate::state::AppState;
use crate::web::pagination::{PageQuery, PageWindow, Pagination, PRODUCTS_PER_PAGE};

pub(crate) const PRODUCT_COLUMNS: &str =
  "p.id, p.name, p.description, p.price, p.stock, p.image_url, p.sales_count, p.is_featured, p.created_at, p.updated_at";

const REVIEW_STATS: &str =
  "COALESCE(ROUND(AVG(r.score)::numeric, 1), 0)::FLOAT8 AS review_avg, COUNT(r.id) AS review_count";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ProductSort {
  #[default]
  #[serde(rename = "new")]
  Newest,
  #[serde(rename = "priceAsc")]
  PriceAsc,
}

impl ProductSort {
  fn order_by(&self) -> &'static str {
    match self {
      ProductSort::Newest => "p.created_at DESC, p.id DESC",
      ProductSort::PriceAsc => "p.price ASC, p.id ASC",
    }
  }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
  pub page: Option<i64>,
  pub per_page: Option<i64>,
  #[serde(default)]
  pub sort: ProductSort,
  pub keyword: Option<String>,
}

/// `%keyword%` with LIKE wildcards in the keyword escaped; `None` for a blank keyword.
fn keyword_pattern(keyword: Option<&str>) -> Option<String> {
  let keyword = keyword.map(str::trim).filter(|k| !k.is_empty())?;
  let escaped = keyword.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
  Some(format!("%{escaped}%"))
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let query = query.into_inner();
  let window = PageWindow::resolve(
    PageQuery {
      page: query.page,
      per_page: query.per_page,
    },
    PRODUCTS_PER_PAGE,
  );
  let pattern = keyword_pattern(query.keyword.as_deref());
  const FILTER: &str = "($1::TEXT IS NULL OR p.name ILIKE $1 OR p.description ILIKE $1)";

  let list_sql = format!(
    "SELECT {PRODUCT_COLUMNS}, {REVIEW_STATS} FROM products p LEFT JOIN reviews r ON r.product_id = p.id \
     WHERE {FILTER} GROUP BY p.id ORDER BY {} LIMIT $2 OFFSET $3",
    query.sort.order_by()
  );
  let count_sql = format!("SELECT COUNT(*) FROM products p WHERE {FILTER}");

  let list = sqlx::query_as::<_, ProductListing>(&list_sql)
    .bind(&pattern)
    .bind(window.per_page)
    .bind(window.offset())
    .fetch_all(&app_state.db_pool);
  let count = sqlx::query_scalar::<_, i64>(&count_sql)
    .bind(&pattern)
    .fetch_one(&app_state.db_pool);

  let (products, total_items) = tokio::try_join!(list, count)?;
  info!(count = products.len(), total_items, "Products listed.");

  Ok(HttpResponse::Ok().json(json!({
    "products": products,
    "pagination": Pagination::new(window, total_items),
  })))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();

  let product: Option<Product> = sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"))
    .bind(product_id)
    .fetch_optional(&app_state.db_pool)
    .await?;

  match product {
    Some(product) => Ok(HttpResponse::Ok().json(product)),
    None => {
      warn!("Product not found.");
      Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
    }
  }
}

/// Landing page aggregate, fetched concurrently: `featured` holds the top sellers,
/// `bestSellers` a random pick of products flagged as featured. Any failing query
/// fails the page.
#[instrument(name = "handler::home", skip(app_state))]
pub async fn home_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let featured_sql = format!(
    "SELECT {PRODUCT_COLUMNS}, {REVIEW_STATS} FROM products p LEFT JOIN reviews r ON r.product_id = p.id \
     GROUP BY p.id ORDER BY p.sales_count DESC, p.id ASC LIMIT 3"
  );
  let new_arrivals_sql = format!(
    "SELECT {PRODUCT_COLUMNS}, {REVIEW_STATS} FROM products p LEFT JOIN reviews r ON r.product_id = p.id \
     GROUP BY p.id ORDER BY p.created_at DESC, p.id DESC LIMIT 4"
  );
  let best_sellers_sql = format!(
    "SELECT {PRODUCT_COLUMNS}, {REVIEW_STATS} FROM products p LEFT JOIN reviews r ON r.product_id = p.id \
     WHERE p.is_featured GROUP BY p.id ORDER BY RANDOM() LIMIT 4"
  );

  let featured = sqlx::query_as::<_, ProductListing>(&featured_sql).fetch_all(&app_state.db_pool);
  let new_arrivals = sqlx::query_as::<_, ProductListing>(&new_arrivals_sql).fetch_all(&app_state.db_pool);
  let best_sellers = sqlx::query_as::<_, ProductListing>(&best_sellers_sql).fetch_all(&app_state.db_pool);

  let (featured, new_arrivals, best_sellers) = tokio::try_join!(featured, new_arrivals, best_sellers)?;

  Ok(HttpResponse::Ok().json(json!({
    "featured": featured,
    "newArrivals": new_arrivals,
    "bestSellers": best_sellers,
  })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keyword_pattern_escapes_wildcards() {
    assert_eq!(keyword_pattern(Some("  mug ")), Some("%mug%".to_string()));
    assert_eq!(keyword_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
    assert_eq!(keyword_pattern(Some("   ")), None);
    assert_eq!(keyword_pattern(None), None);
  }

  #[test]
  fn sort_defaults_to_newest() {
    let q: ListProductsQuery = serde_json::from_str("{}").unwrap();
    assert_eq!(q.sort, ProductSort::Newest);
    let q: ListProductsQuery = serde_json::from_str(r#"{"sort":"priceAsc","perPage":8}"#).unwrap();
    assert_eq!(q.sort, ProductSort::PriceAsc);
    assert_eq!(q.per_page, Some(8));
  }
}
