//! League, tournament and team models and their request/response DTOs

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

/// League with a prize pool; teams register into it
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct League {
    pub league_id: i64,
    pub name: String,
    pub prize_pool: f64,
    pub start_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeagueTeam {
    pub team_id: i64,
    pub name: String,
    pub player_id: i64,
    pub score: f64,
    pub league_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Tournament played between a side A and a side B
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tournament {
    pub tournament_id: i64,
    pub name: String,
    pub prize_pool: f64,
    pub start_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TournamentTeam {
    pub team_id: i64,
    pub name: String,
    pub player_id: i64,
    pub score: f64,
    pub tournament_id: i64,
    /// `"A"` or `"B"`, see [`TournamentSide`]
    pub side: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentSide {
    A,
    B,
}

impl TournamentSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentSide::A => "A",
            TournamentSide::B => "B",
        }
    }
}

/// Fields of a league or tournament to be created
#[derive(Debug, Clone)]
pub struct NewCompetition {
    pub name: String,
    pub prize_pool: f64,
    pub start_time: DateTime<Utc>,
}

/// Team to be registered; `parent_id` is the league or tournament
#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    pub player_id: i64,
    pub score: f64,
    pub parent_id: i64,
}

/// Body of `POST /user/leagues` and `POST /user/tournament`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompetitionRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "prize_pool must not be negative"))]
    pub prize_pool: f64,
    pub start_time: DateTime<Utc>,
}

impl From<CreateCompetitionRequest> for NewCompetition {
    fn from(req: CreateCompetitionRequest) -> Self {
        Self {
            name: req.name,
            prize_pool: req.prize_pool,
            start_time: req.start_time,
        }
    }
}

/// Body of `POST /user/league/team`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLeagueTeamRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    /// Defaults to the caller
    pub player_id: Option<i64>,
    #[serde(default)]
    pub score: f64,
    pub league_id: i64,
}

/// Body of `POST /user/tournament/teamA` and `/teamB`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTournamentTeamRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    /// Defaults to the caller
    pub player_id: Option<i64>,
    #[serde(default)]
    pub score: f64,
    pub tournament_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct JoinLeagueRequest {
    pub league_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct JoinTournamentRequest {
    pub tournament_id: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TeamSummary {
    pub team_id: i64,
    pub team_name: String,
    pub score: f64,
}

impl From<&LeagueTeam> for TeamSummary {
    fn from(team: &LeagueTeam) -> Self {
        Self {
            team_id: team.team_id,
            team_name: team.name.clone(),
            score: team.score,
        }
    }
}

impl From<&TournamentTeam> for TeamSummary {
    fn from(team: &TournamentTeam) -> Self {
        Self {
            team_id: team.team_id,
            team_name: team.name.clone(),
            score: team.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueView {
    pub league_id: i64,
    pub league_name: String,
    pub start_time: DateTime<Utc>,
    pub prize_pool: f64,
    pub teams: Vec<TeamSummary>,
}

impl LeagueView {
    /// Build the view from a league and any teams; teams of other leagues are skipped
    pub fn new(league: League, teams: &[LeagueTeam]) -> Self {
        Self {
            league_id: league.league_id,
            teams: teams
                .iter()
                .filter(|t| t.league_id == league.league_id)
                .map(TeamSummary::from)
                .collect(),
            league_name: league.name,
            start_time: league.start_time,
            prize_pool: league.prize_pool,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TournamentView {
    pub tournament_id: i64,
    pub tournament_name: String,
    pub start_time: DateTime<Utc>,
    pub prize_pool: f64,
    pub team_a: Vec<TeamSummary>,
    pub team_b: Vec<TeamSummary>,
}

impl TournamentView {
    pub fn new(tournament: Tournament, teams: &[TournamentTeam]) -> Self {
        let side = |side: TournamentSide| -> Vec<TeamSummary> {
            teams
                .iter()
                .filter(|t| t.tournament_id == tournament.tournament_id && t.side == side.as_str())
                .map(TeamSummary::from)
                .collect()
        };

        Self {
            tournament_id: tournament.tournament_id,
            team_a: side(TournamentSide::A),
            team_b: side(TournamentSide::B),
            tournament_name: tournament.name,
            start_time: tournament.start_time,
            prize_pool: tournament.prize_pool,
        }
    }
}

/// Acknowledgement carrying the affected resource(s)
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JoinLeagueResponse {
    pub message: String,
    pub league_details: LeagueView,
}

#[derive(Debug, Serialize)]
pub struct JoinTournamentResponse {
    pub message: String,
    pub tournament_info: TournamentView,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn league_team(team_id: i64, league_id: i64) -> LeagueTeam {
        LeagueTeam {
            team_id,
            name: format!("team-{}", team_id),
            player_id: 1,
            score: 10.0,
            league_id,
            created_at: Utc::now(),
        }
    }

    fn tournament_team(team_id: i64, side: TournamentSide) -> TournamentTeam {
        TournamentTeam {
            team_id,
            name: format!("team-{}", team_id),
            player_id: 1,
            score: 0.0,
            tournament_id: 3,
            side: side.as_str().to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_league_view_keeps_only_its_teams() {
        let now = Utc::now();
        let league = League {
            league_id: 1,
            name: "Spring Cup".to_string(),
            prize_pool: 500.0,
            start_time: now,
            created_at: now,
        };
        let view = LeagueView::new(league, &[league_team(1, 1), league_team(2, 2), league_team(3, 1)]);

        assert_eq!(view.league_name, "Spring Cup");
        let ids: Vec<i64> = view.teams.iter().map(|t| t.team_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_tournament_view_splits_sides() {
        let now = Utc::now();
        let tournament = Tournament {
            tournament_id: 3,
            name: "Finals".to_string(),
            prize_pool: 1000.0,
            start_time: now,
            created_at: now,
        };
        let teams = [
            tournament_team(1, TournamentSide::A),
            tournament_team(2, TournamentSide::B),
            tournament_team(3, TournamentSide::A),
        ];
        let view = TournamentView::new(tournament, &teams);

        assert_eq!(view.team_a.len(), 2);
        assert_eq!(view.team_b.len(), 1);
        assert_eq!(view.team_b[0].team_id, 2);
    }

    #[test]
    fn test_create_competition_rejects_negative_prize_pool() {
        let req = CreateCompetitionRequest {
            name: "Spring Cup".to_string(),
            prize_pool: -1.0,
            start_time: Utc::now(),
        };
        assert!(req.validate().is_err());

        let req = CreateCompetitionRequest {
            prize_pool: 0.0,
            ..req
        };
        assert!(req.validate().is_ok());
    }
}
