use crate::{
    api::{attendance, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        // only fails on a zero period or burst
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = build_limiter(config.rate_login_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            // /me
            .service(web::resource("/me").route(web::get().to(user::get_me)))
            .service(
                web::scope("/users")
                    // /users/{user_id}
                    .service(web::resource("/{user_id}").route(web::get().to(user::get_user)))
                    // /users/{user_id}/reports
                    .service(
                        web::resource("/{user_id}/reports")
                            .route(web::get().to(user::list_direct_reports)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("").route(web::put().to(attendance::upsert_attendance)),
                    )
                    // /attendance/team, registered before /{user_id}
                    .service(
                        web::resource("/team").route(web::get().to(attendance::team_attendance)),
                    )
                    // /attendance/{user_id}
                    .service(
                        web::resource("/{user_id}")
                            .route(web::get().to(attendance::list_user_attendance)),
                    )
                    // /attendance/{user_id}/{year}/{month}
                    .service(
                        web::resource("/{user_id}/{year}/{month}")
                            .route(web::get().to(attendance::get_month_attendance)),
                    ),
            ),
    );
}
