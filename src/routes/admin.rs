use actix_web::{http::header::ContentType, web, HttpResponse};

use crate::metrics::ApiMetrics;

/// GET /admin/metrics
pub async fn metrics(metrics: web::Data<ApiMetrics>) -> HttpResponse {
    let body = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        metrics.hits()
    );

    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

/// POST /admin/reset
pub async fn reset(metrics: web::Data<ApiMetrics>) -> HttpResponse {
    metrics.reset();
    tracing::info!("File server hit counter reset");

    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body("Metrics reset")
}
