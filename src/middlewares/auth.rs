use crate::error::AppError;
use crate::models::Principal;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            // 完全匹配的公开路径
            exact_paths: vec![
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
                "/api/v1/health",
            ],
            // 前缀匹配的公开路径（抽奖大屏的只读接口）
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/v1/public/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// Bearer 令牌鉴权，通过后把 [`Principal`] 放进请求扩展
pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        if self.public_paths.is_public_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        let principal = self
            .jwt_service
            .verify_access_token(token)
            .and_then(|claims| claims.into_principal());

        match principal {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(e) => {
                log::warn!("Rejected access token on {}: {e}", req.path());
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

/// 取出中间件注入的调用方身份
pub fn current_principal(req: &HttpRequest) -> Option<Principal> {
    req.extensions().get::<Principal>().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use actix_web::http::StatusCode;
    use actix_web::test::{TestRequest, call_and_read_body, init_service, try_call_service};
    use actix_web::{App, HttpResponse, web};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match current_principal(&req) {
            Some(p) => HttpResponse::Ok().body(p.id.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    #[test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/api/v1/health"));
        assert!(paths.is_public_path("/api/v1/public/prize-levels"));
        assert!(paths.is_public_path("/swagger-ui/index.html"));
        assert!(!paths.is_public_path("/api/v1/draw"));
        assert!(!paths.is_public_path("/api/v1/healthz"));
    }

    #[actix_web::test]
    async fn test_middleware_injects_principal() {
        let jwt = JwtService::new("test-secret", 3600);
        let token = jwt
            .generate_access_token(&Principal::new(42, Some(1), Role::Admin))
            .unwrap();

        let app = init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt.clone()))
                .route("/api/v1/draw", web::post().to(whoami))
                .route("/api/v1/public/ping", web::get().to(whoami)),
        )
        .await;

        let req = TestRequest::post()
            .uri("/api/v1/draw")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"42"));

        let req = TestRequest::get().uri("/api/v1/public/ping").to_request();
        let body = call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"anonymous"));
    }

    #[actix_web::test]
    async fn test_middleware_rejects_bad_tokens() {
        let jwt = JwtService::new("test-secret", 3600);
        let forged = JwtService::new("other-secret", 3600)
            .generate_access_token(&Principal::new(1, None, Role::SuperAdmin))
            .unwrap();

        let app = init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt))
                .route("/api/v1/draw", web::post().to(whoami)),
        )
        .await;

        let req = TestRequest::post().uri("/api/v1/draw").to_request();
        let err = try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::post()
            .uri("/api/v1/draw")
            .insert_header(("Authorization", format!("Bearer {forged}")))
            .to_request();
        let err = try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }
}
