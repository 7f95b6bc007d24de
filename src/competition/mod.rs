//! Leagues, tournaments and teams
//!
//! Every operation here runs behind the `user` token gate.

mod service;
mod store;

pub use service::{CompetitionError, CompetitionService, Joined};
pub use store::{CompetitionStore, InMemoryCompetitionStore, PgCompetitionStore};
