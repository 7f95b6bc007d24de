//! League, tournament and team routes; all require a `user` token

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::competition;
use crate::state::AppState;

pub fn competition_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/user/leagues",
            get(competition::list_leagues).post(competition::create_league),
        )
        .route("/user/leagues/join", post(competition::join_league))
        .route("/user/league/team", post(competition::create_league_team))
        .route(
            "/user/tournament",
            get(competition::list_tournaments).post(competition::create_tournament),
        )
        .route("/user/tournament/teamA", post(competition::create_team_a))
        .route("/user/tournament/teamB", post(competition::create_team_b))
        .route("/user/tournament/join", post(competition::join_tournament))
}
