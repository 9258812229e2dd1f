use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::draw::draw,
        handlers::lottery::get_prize_levels,
        handlers::lottery::get_draw_records,
        handlers::lottery::get_available_users,
        handlers::lottery::get_user_stats,
        handlers::lottery::get_my_prize,
        handlers::health::health,
    ),
    components(
        schemas(
            DrawMode,
            DrawRequest,
            DrawRecordResponse,
            DrawRecordPage,
            UserSummary,
            PrizeLevelSummary,
            PrizeSummary,
            PrizeLevelWithStock,
            UserStatsResponse,
            Role,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "draw", description = "Draw execution API (admin)"),
        (name = "lottery", description = "Public lottery screen API"),
        (name = "health", description = "Liveness probe"),
    ),
    info(
        title = "Lottery Backend API",
        version = "1.0.0",
        description = "Multi-tenant lottery draw engine REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_draw_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/draw"));
        assert!(doc.paths.paths.contains_key("/public/my-prize"));
        let schemes = doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}
