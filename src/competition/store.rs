//! Competition store
//!
//! Leagues, tournaments, their teams and memberships. League names, tournament
//! names, league team names and tournament team names per side are unique.

use axum::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::StoreError;
use crate::models::{
    League, LeagueTeam, NewCompetition, NewTeam, Tournament, TournamentSide, TournamentTeam,
};

#[async_trait]
pub trait CompetitionStore: Send + Sync {
    /// Fails with `Duplicate` if the name is taken
    async fn create_league(&self, league: &NewCompetition) -> Result<League, StoreError>;

    async fn find_league(&self, league_id: i64) -> Result<Option<League>, StoreError>;

    /// All leagues, oldest first
    async fn list_leagues(&self) -> Result<Vec<League>, StoreError>;

    /// Teams of the given leagues, ordered by id
    async fn league_teams(&self, league_ids: &[i64]) -> Result<Vec<LeagueTeam>, StoreError>;

    /// Fails with `Duplicate` if a league team with the name exists
    async fn create_league_team(&self, team: &NewTeam) -> Result<LeagueTeam, StoreError>;

    /// Record membership; `false` if the user had already joined
    async fn join_league(&self, league_id: i64, user_id: i64) -> Result<bool, StoreError>;

    async fn create_tournament(&self, tournament: &NewCompetition)
        -> Result<Tournament, StoreError>;

    async fn find_tournament(&self, tournament_id: i64) -> Result<Option<Tournament>, StoreError>;

    async fn list_tournaments(&self) -> Result<Vec<Tournament>, StoreError>;

    async fn tournament_teams(
        &self,
        tournament_ids: &[i64],
    ) -> Result<Vec<TournamentTeam>, StoreError>;

    /// Fails with `Duplicate` if the side already has a team with the name
    async fn create_tournament_team(
        &self,
        side: TournamentSide,
        team: &NewTeam,
    ) -> Result<TournamentTeam, StoreError>;

    async fn join_tournament(&self, tournament_id: i64, user_id: i64) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed competition store
#[derive(Clone)]
pub struct PgCompetitionStore {
    db_pool: PgPool,
}

impl PgCompetitionStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CompetitionStore for PgCompetitionStore {
    async fn create_league(&self, league: &NewCompetition) -> Result<League, StoreError> {
        let created: League = sqlx::query_as(
            r#"
            INSERT INTO leagues (name, prize_pool, start_time)
            VALUES ($1, $2, $3)
            RETURNING league_id, name, prize_pool, start_time, created_at
            "#,
        )
        .bind(&league.name)
        .bind(league.prize_pool)
        .bind(league.start_time)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(created)
    }

    async fn find_league(&self, league_id: i64) -> Result<Option<League>, StoreError> {
        let league: Option<League> = sqlx::query_as(
            r#"
            SELECT league_id, name, prize_pool, start_time, created_at
            FROM leagues
            WHERE league_id = $1
            "#,
        )
        .bind(league_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(league)
    }

    async fn list_leagues(&self) -> Result<Vec<League>, StoreError> {
        let leagues: Vec<League> = sqlx::query_as(
            r#"
            SELECT league_id, name, prize_pool, start_time, created_at
            FROM leagues
            ORDER BY league_id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(leagues)
    }

    async fn league_teams(&self, league_ids: &[i64]) -> Result<Vec<LeagueTeam>, StoreError> {
        let teams: Vec<LeagueTeam> = sqlx::query_as(
            r#"
            SELECT team_id, name, player_id, score, league_id, created_at
            FROM league_teams
            WHERE league_id = ANY($1)
            ORDER BY team_id
            "#,
        )
        .bind(league_ids)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(teams)
    }

    async fn create_league_team(&self, team: &NewTeam) -> Result<LeagueTeam, StoreError> {
        let created: LeagueTeam = sqlx::query_as(
            r#"
            INSERT INTO league_teams (name, player_id, score, league_id)
            VALUES ($1, $2, $3, $4)
            RETURNING team_id, name, player_id, score, league_id, created_at
            "#,
        )
        .bind(&team.name)
        .bind(team.player_id)
        .bind(team.score)
        .bind(team.parent_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(created)
    }

    async fn join_league(&self, league_id: i64, user_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO league_members (league_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (league_id, user_id) DO NOTHING
            "#,
        )
        .bind(league_id)
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn create_tournament(
        &self,
        tournament: &NewCompetition,
    ) -> Result<Tournament, StoreError> {
        let created: Tournament = sqlx::query_as(
            r#"
            INSERT INTO tournaments (name, prize_pool, start_time)
            VALUES ($1, $2, $3)
            RETURNING tournament_id, name, prize_pool, start_time, created_at
            "#,
        )
        .bind(&tournament.name)
        .bind(tournament.prize_pool)
        .bind(tournament.start_time)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(created)
    }

    async fn find_tournament(&self, tournament_id: i64) -> Result<Option<Tournament>, StoreError> {
        let tournament: Option<Tournament> = sqlx::query_as(
            r#"
            SELECT tournament_id, name, prize_pool, start_time, created_at
            FROM tournaments
            WHERE tournament_id = $1
            "#,
        )
        .bind(tournament_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(tournament)
    }

    async fn list_tournaments(&self) -> Result<Vec<Tournament>, StoreError> {
        let tournaments: Vec<Tournament> = sqlx::query_as(
            r#"
            SELECT tournament_id, name, prize_pool, start_time, created_at
            FROM tournaments
            ORDER BY tournament_id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(tournaments)
    }

    async fn tournament_teams(
        &self,
        tournament_ids: &[i64],
    ) -> Result<Vec<TournamentTeam>, StoreError> {
        let teams: Vec<TournamentTeam> = sqlx::query_as(
            r#"
            SELECT team_id, name, player_id, score, tournament_id, side, created_at
            FROM tournament_teams
            WHERE tournament_id = ANY($1)
            ORDER BY team_id
            "#,
        )
        .bind(tournament_ids)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(teams)
    }

    async fn create_tournament_team(
        &self,
        side: TournamentSide,
        team: &NewTeam,
    ) -> Result<TournamentTeam, StoreError> {
        let created: TournamentTeam = sqlx::query_as(
            r#"
            INSERT INTO tournament_teams (name, player_id, score, tournament_id, side)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING team_id, name, player_id, score, tournament_id, side, created_at
            "#,
        )
        .bind(&team.name)
        .bind(team.player_id)
        .bind(team.score)
        .bind(team.parent_id)
        .bind(side.as_str())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(created)
    }

    async fn join_tournament(&self, tournament_id: i64, user_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO tournament_members (tournament_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (tournament_id, user_id) DO NOTHING
            "#,
        )
        .bind(tournament_id)
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[derive(Default)]
struct CompetitionTables {
    leagues: BTreeMap<i64, League>,
    league_teams: BTreeMap<i64, LeagueTeam>,
    league_members: HashSet<(i64, i64)>,
    tournaments: BTreeMap<i64, Tournament>,
    tournament_teams: BTreeMap<i64, TournamentTeam>,
    tournament_members: HashSet<(i64, i64)>,
    next_id: i64,
}

impl CompetitionTables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process competition store with the database's uniqueness rules
#[derive(Clone, Default)]
pub struct InMemoryCompetitionStore {
    tables: Arc<RwLock<CompetitionTables>>,
}

impl InMemoryCompetitionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompetitionStore for InMemoryCompetitionStore {
    async fn create_league(&self, league: &NewCompetition) -> Result<League, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.leagues.values().any(|l| l.name == league.name) {
            return Err(StoreError::Duplicate);
        }

        let created = League {
            league_id: tables.next_id(),
            name: league.name.clone(),
            prize_pool: league.prize_pool,
            start_time: league.start_time,
            created_at: Utc::now(),
        };
        tables.leagues.insert(created.league_id, created.clone());
        Ok(created)
    }

    async fn find_league(&self, league_id: i64) -> Result<Option<League>, StoreError> {
        Ok(self.tables.read().await.leagues.get(&league_id).cloned())
    }

    async fn list_leagues(&self) -> Result<Vec<League>, StoreError> {
        Ok(self.tables.read().await.leagues.values().cloned().collect())
    }

    async fn league_teams(&self, league_ids: &[i64]) -> Result<Vec<LeagueTeam>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .league_teams
            .values()
            .filter(|t| league_ids.contains(&t.league_id))
            .cloned()
            .collect())
    }

    async fn create_league_team(&self, team: &NewTeam) -> Result<LeagueTeam, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.leagues.contains_key(&team.parent_id) {
            return Err(StoreError::Missing);
        }
        if tables.league_teams.values().any(|t| t.name == team.name) {
            return Err(StoreError::Duplicate);
        }

        let created = LeagueTeam {
            team_id: tables.next_id(),
            name: team.name.clone(),
            player_id: team.player_id,
            score: team.score,
            league_id: team.parent_id,
            created_at: Utc::now(),
        };
        tables.league_teams.insert(created.team_id, created.clone());
        Ok(created)
    }

    async fn join_league(&self, league_id: i64, user_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.leagues.contains_key(&league_id) {
            return Err(StoreError::Missing);
        }
        Ok(tables.league_members.insert((league_id, user_id)))
    }

    async fn create_tournament(
        &self,
        tournament: &NewCompetition,
    ) -> Result<Tournament, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.tournaments.values().any(|t| t.name == tournament.name) {
            return Err(StoreError::Duplicate);
        }

        let created = Tournament {
            tournament_id: tables.next_id(),
            name: tournament.name.clone(),
            prize_pool: tournament.prize_pool,
            start_time: tournament.start_time,
            created_at: Utc::now(),
        };
        tables
            .tournaments
            .insert(created.tournament_id, created.clone());
        Ok(created)
    }

    async fn find_tournament(&self, tournament_id: i64) -> Result<Option<Tournament>, StoreError> {
        Ok(self.tables.read().await.tournaments.get(&tournament_id).cloned())
    }

    async fn list_tournaments(&self) -> Result<Vec<Tournament>, StoreError> {
        Ok(self.tables.read().await.tournaments.values().cloned().collect())
    }

    async fn tournament_teams(
        &self,
        tournament_ids: &[i64],
    ) -> Result<Vec<TournamentTeam>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tournament_teams
            .values()
            .filter(|t| tournament_ids.contains(&t.tournament_id))
            .cloned()
            .collect())
    }

    async fn create_tournament_team(
        &self,
        side: TournamentSide,
        team: &NewTeam,
    ) -> Result<TournamentTeam, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.tournaments.contains_key(&team.parent_id) {
            return Err(StoreError::Missing);
        }
        if tables
            .tournament_teams
            .values()
            .any(|t| t.side == side.as_str() && t.name == team.name)
        {
            return Err(StoreError::Duplicate);
        }

        let created = TournamentTeam {
            team_id: tables.next_id(),
            name: team.name.clone(),
            player_id: team.player_id,
            score: team.score,
            tournament_id: team.parent_id,
            side: side.as_str().to_string(),
            created_at: Utc::now(),
        };
        tables
            .tournament_teams
            .insert(created.team_id, created.clone());
        Ok(created)
    }

    async fn join_tournament(&self, tournament_id: i64, user_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.tournaments.contains_key(&tournament_id) {
            return Err(StoreError::Missing);
        }
        Ok(tables.tournament_members.insert((tournament_id, user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competition(name: &str) -> NewCompetition {
        NewCompetition {
            name: name.to_string(),
            prize_pool: 250.0,
            start_time: Utc::now(),
        }
    }

    fn team(name: &str, parent_id: i64) -> NewTeam {
        NewTeam {
            name: name.to_string(),
            player_id: 1,
            score: 0.0,
            parent_id,
        }
    }

    #[tokio::test]
    async fn test_league_names_unique() {
        let store = InMemoryCompetitionStore::new();
        store.create_league(&competition("Spring Cup")).await.unwrap();

        let result = store.create_league(&competition("Spring Cup")).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
        assert_eq!(store.list_leagues().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_league_teams_filtered_by_league() {
        let store = InMemoryCompetitionStore::new();
        let spring = store.create_league(&competition("Spring Cup")).await.unwrap();
        let autumn = store.create_league(&competition("Autumn Cup")).await.unwrap();
        store.create_league_team(&team("Owls", spring.league_id)).await.unwrap();
        store.create_league_team(&team("Foxes", autumn.league_id)).await.unwrap();

        let teams = store.league_teams(&[spring.league_id]).await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "Owls");

        let dup = store.create_league_team(&team("Owls", autumn.league_id)).await;
        assert!(matches!(dup, Err(StoreError::Duplicate)));
    }

    #[tokio::test]
    async fn test_join_league_is_idempotent() {
        let store = InMemoryCompetitionStore::new();
        let league = store.create_league(&competition("Spring Cup")).await.unwrap();

        assert!(store.join_league(league.league_id, 7).await.unwrap());
        assert!(!store.join_league(league.league_id, 7).await.unwrap());
        assert!(matches!(
            store.join_league(999, 7).await,
            Err(StoreError::Missing)
        ));
    }

    #[tokio::test]
    async fn test_tournament_team_names_unique_per_side() {
        let store = InMemoryCompetitionStore::new();
        let finals = store.create_tournament(&competition("Finals")).await.unwrap();

        store
            .create_tournament_team(TournamentSide::A, &team("Owls", finals.tournament_id))
            .await
            .unwrap();
        store
            .create_tournament_team(TournamentSide::B, &team("Owls", finals.tournament_id))
            .await
            .unwrap();

        let dup = store
            .create_tournament_team(TournamentSide::A, &team("Owls", finals.tournament_id))
            .await;
        assert!(matches!(dup, Err(StoreError::Duplicate)));

        let teams = store.tournament_teams(&[finals.tournament_id]).await.unwrap();
        assert_eq!(teams.len(), 2);
    }
}
