use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/course", course_routes())
        .nest("/judgings", judging_routes())
}

fn course_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::standings::get_standings))
}

fn judging_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::judging::get_judging))
        .routes(routes!(handlers::judging::verify_judging))
}
