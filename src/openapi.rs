use utoipa::OpenApi;

use crate::domain::errors::FieldError;
use crate::handlers::{categories, customers, orders, products};

#[derive(OpenApi)]
#[openapi(
    info(title = "Order administration API"),
    paths(
        orders::place_order,
        orders::get_order,
        orders::list_orders,
        products::create_product,
        products::get_product,
        products::list_products,
        products::update_product,
        products::set_stock,
        products::assign_category,
        categories::create_category,
        categories::list_categories,
        customers::create_customer,
        customers::get_customer,
        customers::list_customers,
        customers::update_customer,
    ),
    components(schemas(FieldError)),
    tags(
        (name = "orders", description = "Order placement and lookup"),
        (name = "products", description = "Product catalog and stock"),
        (name = "categories", description = "Product categories"),
        (name = "customers", description = "Customer records"),
    )
)]
pub struct ApiDoc;
