//! Minimal switchboard example — JSON CRUD-style endpoints.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/products/notebook
//!   curl http://localhost:3000/products/notebook?currency=eur
//!   curl -X POST http://localhost:3000/products \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"Notebook","slug":"notebook","price":4000}'
//!   curl -X DELETE http://localhost:3000/products/notebook
//!   curl -X DELETE http://localhost:3000/products/notebook -H 'x-api-key: letmein'

use switchboard::{middleware, Error, Method, Request, Response, Router, Server, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .with(middleware::log)
        .with(middleware::json_body)
        .get("/products/:slug", get_product)
        .post("/products", create_product)
        .on_with(
            Method::Delete,
            "/products/:slug",
            delete_product,
            vec![middleware::boxed(require_api_key)],
        );

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /products/:slug
//
// The matcher bound `slug` before we ran; raising Error::new(404, ..) here
// would come out as application/problem+json.
async fn get_product(req: Request) -> Result<Response, Error> {
    let slug = req
        .param("slug")
        .ok_or_else(|| Error::new(StatusCode::NOT_FOUND, "product not found"))?;
    let currency = req.query("currency").unwrap_or("usd");

    // Real app: look the product up in your store of choice.
    Ok(Response::json(&serde_json::json!({
        "slug": slug,
        "name": "Notebook",
        "price": 4000,
        "currency": currency,
    })))
}

// POST /products
//
// req.body() is already parsed — json_body ran on the way in.
async fn create_product(req: Request) -> Result<Response, Error> {
    let name = req.body()["name"]
        .as_str()
        .ok_or_else(|| Error::new(StatusCode::BAD_REQUEST, "missing field `name`"))?;
    let slug = req.body()["slug"]
        .as_str()
        .ok_or_else(|| Error::new(StatusCode::BAD_REQUEST, "missing field `slug`"))?;

    Ok(Response::json(&serde_json::json!({ "name": name, "slug": slug }))
        .with_status(StatusCode::CREATED)
        .header("location", &format!("/products/{slug}")))
}

// DELETE /products/:slug → 204, gated by the route-scoped middleware below.
async fn delete_product(_req: Request) -> Result<Response, Error> {
    Ok(Response::status(StatusCode::NO_CONTENT))
}

// Route-scoped middleware: runs after the route matched, before its
// handler, and only for the routes that list it.
async fn require_api_key(req: Request) -> Result<Request, Error> {
    match req.header("x-api-key") {
        Some("letmein") => Ok(req),
        _ => Err(Error::new(StatusCode::UNAUTHORIZED, "missing or bad api key")),
    }
}
