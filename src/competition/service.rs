//! Competition service
//!
//! League and tournament creation, listing with teams, team registration and
//! joining. Players referenced by a team must be registered users.

use std::sync::Arc;
use thiserror::Error;

use crate::auth::CredentialStore;
use crate::db::StoreError;
use crate::models::{
    League, LeagueTeam, LeagueView, NewCompetition, NewTeam, Tournament, TournamentSide,
    TournamentTeam, TournamentView,
};

use super::store::CompetitionStore;

#[derive(Error, Debug)]
pub enum CompetitionError {
    #[error("league not found")]
    LeagueNotFound,

    #[error("tournament not found")]
    TournamentNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("this {0} already exists, please create a different {0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Store(StoreError),
}

/// A join either records a new membership or finds an existing one
#[derive(Debug)]
pub struct Joined<T> {
    pub newly_joined: bool,
    pub details: T,
}

pub struct CompetitionService {
    store: Arc<dyn CompetitionStore>,
    users: Arc<dyn CredentialStore>,
}

impl CompetitionService {
    pub fn new(store: Arc<dyn CompetitionStore>, users: Arc<dyn CredentialStore>) -> Self {
        Self { store, users }
    }

    pub async fn create_league(&self, league: NewCompetition) -> Result<League, CompetitionError> {
        let created = self
            .store
            .create_league(&league)
            .await
            .map_err(|e| conflict_or_store(e, "league"))?;

        tracing::info!(league_id = created.league_id, name = %created.name, "League created");

        Ok(created)
    }

    pub async fn list_leagues(&self) -> Result<Vec<LeagueView>, CompetitionError> {
        let leagues = self.store.list_leagues().await.map_err(CompetitionError::Store)?;
        let ids: Vec<i64> = leagues.iter().map(|l| l.league_id).collect();
        let teams = self
            .store
            .league_teams(&ids)
            .await
            .map_err(CompetitionError::Store)?;

        Ok(leagues
            .into_iter()
            .map(|league| LeagueView::new(league, &teams))
            .collect())
    }

    /// Register a team for `team.parent_id`; the player must exist, then the league
    pub async fn create_league_team(&self, team: NewTeam) -> Result<LeagueTeam, CompetitionError> {
        self.ensure_user(team.player_id).await?;
        if self
            .store
            .find_league(team.parent_id)
            .await
            .map_err(CompetitionError::Store)?
            .is_none()
        {
            return Err(CompetitionError::LeagueNotFound);
        }

        let created = self
            .store
            .create_league_team(&team)
            .await
            .map_err(|e| match e {
                StoreError::Missing => CompetitionError::LeagueNotFound,
                e => conflict_or_store(e, "team"),
            })?;

        tracing::info!(team_id = created.team_id, league_id = created.league_id, "League team created");

        Ok(created)
    }

    pub async fn join_league(
        &self,
        user_id: i64,
        league_id: i64,
    ) -> Result<Joined<LeagueView>, CompetitionError> {
        let league = self
            .store
            .find_league(league_id)
            .await
            .map_err(CompetitionError::Store)?
            .ok_or(CompetitionError::LeagueNotFound)?;
        self.ensure_user(user_id).await?;

        let newly_joined = self
            .store
            .join_league(league_id, user_id)
            .await
            .map_err(|e| match e {
                StoreError::Missing => CompetitionError::LeagueNotFound,
                e => CompetitionError::Store(e),
            })?;
        let teams = self
            .store
            .league_teams(&[league_id])
            .await
            .map_err(CompetitionError::Store)?;

        if newly_joined {
            tracing::info!(user_id, league_id, "User joined league");
        }

        Ok(Joined {
            newly_joined,
            details: LeagueView::new(league, &teams),
        })
    }

    pub async fn create_tournament(
        &self,
        tournament: NewCompetition,
    ) -> Result<Tournament, CompetitionError> {
        let created = self
            .store
            .create_tournament(&tournament)
            .await
            .map_err(|e| conflict_or_store(e, "tournament"))?;

        tracing::info!(tournament_id = created.tournament_id, name = %created.name, "Tournament created");

        Ok(created)
    }

    pub async fn list_tournaments(&self) -> Result<Vec<TournamentView>, CompetitionError> {
        let tournaments = self
            .store
            .list_tournaments()
            .await
            .map_err(CompetitionError::Store)?;
        let ids: Vec<i64> = tournaments.iter().map(|t| t.tournament_id).collect();
        let teams = self
            .store
            .tournament_teams(&ids)
            .await
            .map_err(CompetitionError::Store)?;

        Ok(tournaments
            .into_iter()
            .map(|tournament| TournamentView::new(tournament, &teams))
            .collect())
    }

    /// Register a team on one side of a tournament; the tournament must exist, then the player
    pub async fn create_tournament_team(
        &self,
        side: TournamentSide,
        team: NewTeam,
    ) -> Result<TournamentTeam, CompetitionError> {
        if self
            .store
            .find_tournament(team.parent_id)
            .await
            .map_err(CompetitionError::Store)?
            .is_none()
        {
            return Err(CompetitionError::TournamentNotFound);
        }
        self.ensure_user(team.player_id).await?;

        let created = self
            .store
            .create_tournament_team(side, &team)
            .await
            .map_err(|e| match e {
                StoreError::Missing => CompetitionError::TournamentNotFound,
                e => conflict_or_store(e, "team"),
            })?;

        tracing::info!(
            team_id = created.team_id,
            tournament_id = created.tournament_id,
            side = side.as_str(),
            "Tournament team created"
        );

        Ok(created)
    }

    pub async fn join_tournament(
        &self,
        user_id: i64,
        tournament_id: i64,
    ) -> Result<Joined<TournamentView>, CompetitionError> {
        let tournament = self
            .store
            .find_tournament(tournament_id)
            .await
            .map_err(CompetitionError::Store)?
            .ok_or(CompetitionError::TournamentNotFound)?;
        self.ensure_user(user_id).await?;

        let newly_joined = self
            .store
            .join_tournament(tournament_id, user_id)
            .await
            .map_err(|e| match e {
                StoreError::Missing => CompetitionError::TournamentNotFound,
                e => CompetitionError::Store(e),
            })?;
        let teams = self
            .store
            .tournament_teams(&[tournament_id])
            .await
            .map_err(CompetitionError::Store)?;

        if newly_joined {
            tracing::info!(user_id, tournament_id, "User joined tournament");
        }

        Ok(Joined {
            newly_joined,
            details: TournamentView::new(tournament, &teams),
        })
    }

    async fn ensure_user(&self, user_id: i64) -> Result<(), CompetitionError> {
        self.users
            .find_user_by_id(user_id)
            .await
            .map_err(CompetitionError::Store)?
            .map(|_| ())
            .ok_or(CompetitionError::UserNotFound)
    }
}

fn conflict_or_store(err: StoreError, what: &'static str) -> CompetitionError {
    match err {
        StoreError::Duplicate => CompetitionError::Conflict(what),
        e => CompetitionError::Store(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryCredentialStore;
    use crate::competition::InMemoryCompetitionStore;
    use crate::models::NewUser;
    use chrono::Utc;

    async fn setup() -> (CompetitionService, i64) {
        let users = InMemoryCredentialStore::new();
        let player = users
            .complete_signup(&NewUser {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                phone: String::new(),
                password_hash: "$2b$04$hash".to_string(),
            })
            .await
            .unwrap();
        let service =
            CompetitionService::new(Arc::new(InMemoryCompetitionStore::new()), Arc::new(users));
        (service, player.user_id)
    }

    fn competition(name: &str) -> NewCompetition {
        NewCompetition {
            name: name.to_string(),
            prize_pool: 1000.0,
            start_time: Utc::now(),
        }
    }

    fn team(name: &str, player_id: i64, parent_id: i64) -> NewTeam {
        NewTeam {
            name: name.to_string(),
            player_id,
            score: 12.5,
            parent_id,
        }
    }

    #[tokio::test]
    async fn test_duplicate_league_conflicts() {
        let (service, _) = setup().await;
        service.create_league(competition("Spring Cup")).await.unwrap();

        let err = service.create_league(competition("Spring Cup")).await.unwrap_err();
        assert!(matches!(err, CompetitionError::Conflict("league")));
        assert_eq!(
            err.to_string(),
            "this league already exists, please create a different league"
        );
    }

    #[tokio::test]
    async fn test_league_team_checks_player_then_league() {
        let (service, player) = setup().await;
        let league = service.create_league(competition("Spring Cup")).await.unwrap();

        assert!(matches!(
            service.create_league_team(team("Owls", 999, 999)).await,
            Err(CompetitionError::UserNotFound)
        ));
        assert!(matches!(
            service.create_league_team(team("Owls", player, 999)).await,
            Err(CompetitionError::LeagueNotFound)
        ));

        service
            .create_league_team(team("Owls", player, league.league_id))
            .await
            .unwrap();
        assert!(matches!(
            service
                .create_league_team(team("Owls", player, league.league_id))
                .await,
            Err(CompetitionError::Conflict("team"))
        ));
    }

    #[tokio::test]
    async fn test_list_leagues_includes_teams() {
        let (service, player) = setup().await;
        let league = service.create_league(competition("Spring Cup")).await.unwrap();
        service.create_league(competition("Autumn Cup")).await.unwrap();
        service
            .create_league_team(team("Owls", player, league.league_id))
            .await
            .unwrap();

        let views = service.list_leagues().await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].teams.len(), 1);
        assert_eq!(views[0].teams[0].team_name, "Owls");
        assert_eq!(views[0].teams[0].score, 12.5);
        assert!(views[1].teams.is_empty());
    }

    #[tokio::test]
    async fn test_join_league_records_membership_once() {
        let (service, player) = setup().await;
        let league = service.create_league(competition("Spring Cup")).await.unwrap();

        let first = service.join_league(player, league.league_id).await.unwrap();
        assert!(first.newly_joined);
        assert_eq!(first.details.league_name, "Spring Cup");

        let second = service.join_league(player, league.league_id).await.unwrap();
        assert!(!second.newly_joined);

        assert!(matches!(
            service.join_league(player, 999).await,
            Err(CompetitionError::LeagueNotFound)
        ));
        assert!(matches!(
            service.join_league(999, league.league_id).await,
            Err(CompetitionError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_tournament_teams_by_side() {
        let (service, player) = setup().await;
        let finals = service.create_tournament(competition("Finals")).await.unwrap();

        assert!(matches!(
            service
                .create_tournament_team(TournamentSide::A, team("Owls", player, 999))
                .await,
            Err(CompetitionError::TournamentNotFound)
        ));
        assert!(matches!(
            service
                .create_tournament_team(TournamentSide::A, team("Owls", 999, finals.tournament_id))
                .await,
            Err(CompetitionError::UserNotFound)
        ));

        service
            .create_tournament_team(TournamentSide::A, team("Owls", player, finals.tournament_id))
            .await
            .unwrap();
        service
            .create_tournament_team(TournamentSide::B, team("Foxes", player, finals.tournament_id))
            .await
            .unwrap();

        let joined = service
            .join_tournament(player, finals.tournament_id)
            .await
            .unwrap();
        assert!(joined.newly_joined);
        assert_eq!(joined.details.team_a[0].team_name, "Owls");
        assert_eq!(joined.details.team_b[0].team_name, "Foxes");

        let views = service.list_tournaments().await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].team_a.len(), 1);
        assert_eq!(views[0].team_b.len(), 1);
    }
}
