//! SQLite implementation of the PlayerRepository.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AccountId, PlayerRecord};
use crate::domain::ports::PlayerRepository;

use super::{format_datetime, parse_account_id, parse_datetime, parse_optional_datetime};

const PLAYER_COLUMNS: &str = "id, username, hidden, account_created_at, last_battle_at, site_karma, \
     performance_rating, teamplay_rating, courtesy_rating, created_at, updated_at";

/// Ids bound per `find_many` statement, below SQLite's host parameter limit.
const FIND_MANY_CHUNK: usize = 500;

pub struct SqlitePlayerRepository {
    pool: SqlitePool,
}

impl SqlitePlayerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerRepository for SqlitePlayerRepository {
    async fn find(&self, id: AccountId) -> DomainResult<Option<PlayerRecord>> {
        let row: Option<PlayerRow> = sqlx::query_as(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?"))
            .bind(i64::from(id))
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert(&self, record: &PlayerRecord) -> DomainResult<()> {
        let result = sqlx::query(
            r#"INSERT INTO players (id, username, hidden, account_created_at, last_battle_at, site_karma,
                   performance_rating, teamplay_rating, courtesy_rating, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(i64::from(record.id))
        .bind(&record.username)
        .bind(record.hidden)
        .bind(record.account_created_at.map(format_datetime))
        .bind(record.last_battle_at.map(format_datetime))
        .bind(record.site_karma)
        .bind(record.performance_rating)
        .bind(record.teamplay_rating)
        .bind(record.courtesy_rating)
        .bind(format_datetime(record.created_at))
        .bind(format_datetime(record.updated_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::PlayerExists(record.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, record: &PlayerRecord) -> DomainResult<()> {
        let updated_at = format_datetime(record.updated_at);
        let result = sqlx::query(
            r#"UPDATE players SET username = ?, hidden = ?, account_created_at = ?, last_battle_at = ?,
                   site_karma = ?, performance_rating = ?, teamplay_rating = ?, courtesy_rating = ?,
                   updated_at = ?
               WHERE id = ? AND updated_at <= ?"#
        )
        .bind(&record.username)
        .bind(record.hidden)
        .bind(record.account_created_at.map(format_datetime))
        .bind(record.last_battle_at.map(format_datetime))
        .bind(record.site_karma)
        .bind(record.performance_rating)
        .bind(record.teamplay_rating)
        .bind(record.courtesy_rating)
        .bind(&updated_at)
        .bind(i64::from(record.id))
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM players WHERE id = ?)")
            .bind(i64::from(record.id))
            .fetch_one(&self.pool)
            .await?;

        if !exists {
            return Err(DomainError::PlayerNotFound(record.id));
        }

        // A newer synchronization already landed
        tracing::debug!(account_id = record.id, updated_at = %updated_at, "Discarded older player update");
        Ok(())
    }

    async fn find_many(&self, ids: &[AccountId]) -> DomainResult<Vec<PlayerRecord>> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut records = Vec::new();
        for chunk in ids.chunks(FIND_MANY_CHUNK) {
            let mut query: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new(format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id IN ("));
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(i64::from(*id));
            }
            separated.push_unseparated(") ORDER BY id");

            let rows: Vec<PlayerRow> = query.build_query_as().fetch_all(&self.pool).await?;
            for row in rows {
                records.push(row.try_into()?);
            }
        }

        Ok(records)
    }
}

#[derive(sqlx::FromRow)]
struct PlayerRow {
    id: i64,
    username: String,
    hidden: bool,
    account_created_at: Option<String>,
    last_battle_at: Option<String>,
    site_karma: i32,
    performance_rating: i32,
    teamplay_rating: i32,
    courtesy_rating: i32,
    created_at: String,
    updated_at: String,
}

impl TryFrom<PlayerRow> for PlayerRecord {
    type Error = DomainError;

    fn try_from(row: PlayerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_account_id(row.id)?,
            username: row.username,
            hidden: row.hidden,
            account_created_at: parse_optional_datetime(row.account_created_at)?,
            last_battle_at: parse_optional_datetime(row.last_battle_at)?,
            site_karma: row.site_karma,
            performance_rating: row.performance_rating,
            teamplay_rating: row.teamplay_rating,
            courtesy_rating: row.courtesy_rating,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
