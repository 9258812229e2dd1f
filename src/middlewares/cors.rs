use actix_cors::Cors;

/// 抽奖大屏和管理后台可能部署在不同域名下，放开来源限制
pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| true)
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
