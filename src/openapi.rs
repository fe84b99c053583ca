use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Jade Commerce API",
        version = "0.1.0",
        description = r#"
Backend API for the Jade Commerce store.

Users, products, shopping carts and orders over a relational database.
Protected routes take a JWT bearer token obtained from `POST /auth/login`:

```
Authorization: Bearer <token>
```
"#
    ),
    paths(
        // Auth
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        // Users
        crate::handlers::users::get_all_users,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::add_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::add_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        // Cart
        crate::handlers::carts::add_to_cart,
        crate::handlers::carts::update_cart,
        crate::handlers::carts::delete_from_cart,
        crate::handlers::carts::clear_cart,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::select_cart_items,
        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::auth::LoginRequest,
        crate::handlers::auth::LoginResponse,
        crate::handlers::users::CreateUserRequest,
        crate::handlers::users::UpdateUserRequest,
        crate::handlers::users::UserResponse,
        crate::handlers::products::CreateProductRequest,
        crate::handlers::products::UpdateProductRequest,
        crate::handlers::products::ProductResponse,
        crate::handlers::carts::CartLineRequest,
        crate::handlers::carts::RemoveCartLineRequest,
        crate::handlers::carts::SelectItemsRequest,
        crate::handlers::carts::SelectedItemResponse,
        crate::handlers::orders::OrderLineRequest,
        crate::handlers::orders::CreateOrderRequest,
        crate::handlers::orders::UpdateOrderStatusRequest,
        crate::handlers::orders::OrderItemResponse,
        crate::handlers::orders::OrderResponse,
    )),
    tags(
        (name = "jade-commerce", description = "Users, products, carts and orders")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
