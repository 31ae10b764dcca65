pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::{CatalogService, OrderService};
use errors::AppError;
use handlers::{categories, customers, orders, products};
use infrastructure::DieselGateway;
use openapi::ApiDoc;

pub use config::{DatabaseConfig, Settings};
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type MigrationError = Box<dyn std::error::Error + Send + Sync>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    if !applied.is_empty() {
        log::info!("applied {} database migration(s)", applied.len());
    }
    Ok(())
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// One gateway is built from the pool and shared by both services for the
/// lifetime of the server. The caller is responsible for `.await`-ing (or
/// `tokio::spawn`-ing) the returned server.
pub fn build_server(
    pool: DbPool,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let gateway = DieselGateway::new(pool);
    let order_service = web::Data::new(OrderService::new(gateway.clone()));
    let catalog_service = web::Data::new(CatalogService::new(gateway));
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(order_service.clone())
            .app_data(catalog_service.clone())
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| AppError::from_json_error(err).into()),
            )
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(orders::place_order))
                    .route("", web::get().to(orders::list_orders))
                    .route("/{id}", web::get().to(orders::get_order)),
            )
            .service(
                web::scope("/products")
                    .route("", web::post().to(products::create_product))
                    .route("", web::get().to(products::list_products))
                    .route("/{id}", web::get().to(products::get_product))
                    .route("/{id}", web::patch().to(products::update_product))
                    .route("/{id}/stock", web::put().to(products::set_stock))
                    .route(
                        "/{id}/categories/{category_id}",
                        web::post().to(products::assign_category),
                    ),
            )
            .service(
                web::scope("/categories")
                    .route("", web::post().to(categories::create_category))
                    .route("", web::get().to(categories::list_categories)),
            )
            .service(
                web::scope("/customers")
                    .route("", web::post().to(customers::create_customer))
                    .route("", web::get().to(customers::list_customers))
                    .route("/{id}", web::get().to(customers::get_customer))
                    .route("/{id}", web::patch().to(customers::update_customer)),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
