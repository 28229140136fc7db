use axum::response::Html;

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Landing page with the upload form")),
    tag = "pages"
)]
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

#[utoipa::path(
    get,
    path = "/about",
    responses((status = 200, description = "About page")),
    tag = "pages"
)]
pub async fn about() -> Html<&'static str> {
    Html(include_str!("../../static/about.html"))
}
