//! League, tournament and team handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use validator::Validate;

use super::AuthenticatedUser;
use crate::error::ApiResult;
use crate::models::{
    CreateCompetitionRequest, CreateLeagueTeamRequest, CreateTournamentTeamRequest, DataResponse,
    JoinLeagueRequest, JoinLeagueResponse, JoinTournamentRequest, JoinTournamentResponse, League,
    LeagueTeam, LeagueView, NewTeam, Tournament, TournamentSide, TournamentTeam, TournamentView,
};
use crate::state::AppState;

/// POST /user/leagues - Create a league
pub async fn create_league(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    payload: Result<Json<CreateCompetitionRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<League>>> {
    let Json(req) = payload?;
    req.validate()?;

    let league = state.competition_service.create_league(req.into()).await?;

    Ok(Json(DataResponse::new("league created successfully", league)))
}

/// GET /user/leagues - All leagues with their teams
pub async fn list_leagues(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<Json<DataResponse<Vec<LeagueView>>>> {
    let leagues = state.competition_service.list_leagues().await?;

    Ok(Json(DataResponse::new("fetched leagues successfully", leagues)))
}

/// POST /user/league/team - Register a team in a league
pub async fn create_league_team(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<CreateLeagueTeamRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<LeagueTeam>>> {
    let Json(req) = payload?;
    req.validate()?;

    let team = state
        .competition_service
        .create_league_team(NewTeam {
            name: req.name,
            player_id: req.player_id.unwrap_or(user.user_id),
            score: req.score,
            parent_id: req.league_id,
        })
        .await?;

    Ok(Json(DataResponse::new("team created successfully", team)))
}

/// POST /user/leagues/join - Join a league as the authenticated user
pub async fn join_league(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<JoinLeagueRequest>, JsonRejection>,
) -> ApiResult<Json<JoinLeagueResponse>> {
    let Json(req) = payload?;

    let joined = state
        .competition_service
        .join_league(user.user_id, req.league_id)
        .await?;

    let message = if joined.newly_joined {
        "You joined this league"
    } else {
        "You have already joined this league"
    };

    Ok(Json(JoinLeagueResponse {
        message: message.to_string(),
        league_details: joined.details,
    }))
}

/// POST /user/tournament - Create a tournament
pub async fn create_tournament(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    payload: Result<Json<CreateCompetitionRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<Tournament>>> {
    let Json(req) = payload?;
    req.validate()?;

    let tournament = state
        .competition_service
        .create_tournament(req.into())
        .await?;

    Ok(Json(DataResponse::new(
        "tournament created successfully",
        tournament,
    )))
}

/// GET /user/tournament - All tournaments with both sides' teams
pub async fn list_tournaments(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<Json<DataResponse<Vec<TournamentView>>>> {
    let tournaments = state.competition_service.list_tournaments().await?;

    Ok(Json(DataResponse::new(
        "fetched tournaments successfully",
        tournaments,
    )))
}

/// POST /user/tournament/teamA
pub async fn create_team_a(
    state: State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<CreateTournamentTeamRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<TournamentTeam>>> {
    create_tournament_team(state, user, TournamentSide::A, payload).await
}

/// POST /user/tournament/teamB
pub async fn create_team_b(
    state: State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<CreateTournamentTeamRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<TournamentTeam>>> {
    create_tournament_team(state, user, TournamentSide::B, payload).await
}

async fn create_tournament_team(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    side: TournamentSide,
    payload: Result<Json<CreateTournamentTeamRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<TournamentTeam>>> {
    let Json(req) = payload?;
    req.validate()?;

    let team = state
        .competition_service
        .create_tournament_team(
            side,
            NewTeam {
                name: req.name,
                player_id: req.player_id.unwrap_or(user.user_id),
                score: req.score,
                parent_id: req.tournament_id,
            },
        )
        .await?;

    Ok(Json(DataResponse::new("team created successfully", team)))
}

/// POST /user/tournament/join - Join a tournament as the authenticated user
pub async fn join_tournament(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<JoinTournamentRequest>, JsonRejection>,
) -> ApiResult<Json<JoinTournamentResponse>> {
    let Json(req) = payload?;

    let joined = state
        .competition_service
        .join_tournament(user.user_id, req.tournament_id)
        .await?;

    let message = if joined.newly_joined {
        "You joined this tournament"
    } else {
        "You have already joined this tournament"
    };

    Ok(Json(JoinTournamentResponse {
        message: message.to_string(),
        tournament_info: joined.details,
    }))
}
