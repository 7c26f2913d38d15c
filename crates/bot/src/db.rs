//! Database operations for the bot
//!
//! Handles all database queries needed by the wizard, menus and deep links.
//! Multi-row writes (commit, join, delete) run inside a single transaction.

use chrono::{DateTime, Utc};
use invevent_core::models::{Connection, Event, EventState, NewEvent, User};
use invevent_core::visibility::{self, can_view};
use invevent_core::{EventId, TelegramId};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

/// Bot database handle
#[derive(Clone)]
pub struct BotDb {
    pool: SqlitePool,
}

impl BotDb {
    /// Create a new database handle
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the user or refresh their name and handle
    pub async fn upsert_user(&self, user: &User) -> Result<(), sqlx::Error> {
        upsert_user(&self.pool, user).await
    }

    pub async fn get_user(&self, id: TelegramId) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, first_name, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Persist a new event and its owner in one transaction
    pub async fn create_event(&self, owner: &User, new: &NewEvent) -> Result<Event, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        upsert_user(&mut *tx, owner).await?;

        let (latitude, longitude) = match new.coordinates {
            Some(point) => (Some(point.latitude), Some(point.longitude)),
            None => (None, None),
        };

        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                id, owner_id, title, description, occurs_at, latitude, longitude,
                address, visibility, tags, state, photo_file_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'Active', $11, $12)
            RETURNING *
            "#,
        )
        .bind(EventId::new())
        .bind(owner.id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.occurs_at)
        .bind(latitude)
        .bind(longitude)
        .bind(&new.address)
        .bind(new.visibility)
        .bind(&new.tags)
        .bind(&new.photo_file_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(event)
    }

    /// Get a specific event by ID, in any state
    pub async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Join an event and befriend its owner
    ///
    /// Returns `false` when the user was already a participant. The
    /// friendship edges are upserted either way.
    pub async fn join_event(&self, event: &Event, user_id: TelegramId) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO participations (event_id, user_id, joined_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id, user_id) DO NOTHING
            "#,
        )
        .bind(event.id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        befriend_tx(&mut tx, user_id, event.owner_id).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    /// Upsert both directed edges between two users
    pub async fn befriend(&self, a: TelegramId, b: TelegramId) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        befriend_tx(&mut tx, a, b).await?;
        tx.commit().await
    }

    /// Returns `false` when the user was not a participant
    pub async fn leave_event(&self, event_id: EventId, user_id: TelegramId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM participations WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_participant(&self, event_id: EventId, user_id: TelegramId) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM participations WHERE event_id = $1 AND user_id = $2) AS present",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_get("present")
    }

    pub async fn count_participants(&self, event_id: EventId) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM participations WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;
        row.try_get("n")
    }

    /// Mark an active event deleted and drop its participations
    ///
    /// Only the owner's request has an effect. Returns whether the event was
    /// deleted.
    pub async fn delete_event(&self, event_id: EventId, owner_id: TelegramId) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(event) = event else {
            tx.rollback().await?;
            return Ok(false);
        };
        if event.owner_id != owner_id || !event.state.can_transition_to(EventState::Deleted) {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE events SET state = $1 WHERE id = $2")
            .bind(EventState::Deleted)
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM participations WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Active events owned by the user
    pub async fn owned_events(&self, owner_id: TelegramId) -> Result<Vec<Event>, sqlx::Error> {
        let mut events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE owner_id = $1 AND state = 'Active'",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        visibility::sort_by_time(&mut events);
        Ok(events)
    }

    /// Active events the user participates in
    pub async fn joined_events(&self, user_id: TelegramId) -> Result<Vec<Event>, sqlx::Error> {
        let mut events = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.*
            FROM events e
            JOIN participations p ON p.event_id = e.id
            WHERE p.user_id = $1 AND e.state = 'Active'
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        visibility::sort_by_time(&mut events);
        Ok(events)
    }

    /// Owned and joined events, de-duplicated, soonest first
    pub async fn my_events(&self, user_id: TelegramId) -> Result<Vec<Event>, sqlx::Error> {
        let owned = self.owned_events(user_id).await?;
        let joined = self.joined_events(user_id).await?;
        Ok(visibility::merge_my_events(owned, joined))
    }

    /// Active events of everyone the viewer follows, any visibility
    pub async fn friends_events(&self, viewer: TelegramId) -> Result<Vec<Event>, sqlx::Error> {
        let mut events = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.*
            FROM events e
            JOIN friendships f ON f.followee_id = e.owner_id
            WHERE f.follower_id = $1 AND e.state = 'Active'
            "#,
        )
        .bind(viewer)
        .fetch_all(&self.pool)
        .await?;
        visibility::sort_by_time(&mut events);
        Ok(events)
    }

    pub async fn public_events(&self) -> Result<Vec<Event>, sqlx::Error> {
        let mut events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE visibility = 'Public' AND state = 'Active'",
        )
        .fetch_all(&self.pool)
        .await?;
        visibility::sort_by_time(&mut events);
        Ok(events)
    }

    /// Every active event the viewer is allowed to see
    pub async fn visible_events(&self, viewer: TelegramId) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT e.*
            FROM events e
            WHERE e.state = 'Active'
              AND (
                e.visibility = 'Public'
                OR e.owner_id = $1
                OR EXISTS (
                    SELECT 1 FROM friendships f
                    WHERE f.follower_id = $1 AND f.followee_id = e.owner_id
                )
              )
            "#,
        )
        .bind(viewer)
        .fetch_all(&self.pool)
        .await
    }

    /// Active events of `owner` that `viewer` may see
    pub async fn events_of_owner(&self, owner: TelegramId, viewer: TelegramId) -> Result<Vec<Event>, sqlx::Error> {
        let follows_owner = self.follows(viewer, owner).await?;
        let events = self.owned_events(owner).await?;
        Ok(events
            .into_iter()
            .filter(|e| can_view(e, viewer, follows_owner))
            .collect())
    }

    /// Whether the `follower -> followee` edge exists
    pub async fn follows(&self, follower: TelegramId, followee: TelegramId) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM friendships WHERE follower_id = $1 AND followee_id = $2) AS present",
        )
        .bind(follower)
        .bind(followee)
        .fetch_one(&self.pool)
        .await?;
        row.try_get("present")
    }

    /// Users following `user`
    pub async fn followers(&self, user: TelegramId) -> Result<Vec<Connection>, sqlx::Error> {
        sqlx::query_as::<_, Connection>(
            r#"
            SELECT u.id, u.first_name, u.username,
                   (SELECT COUNT(*) FROM events e
                    WHERE e.owner_id = u.id AND e.state = 'Active') AS active_events
            FROM friendships f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followee_id = $1
            ORDER BY u.first_name, u.id
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
    }

    /// Users `user` follows
    pub async fn followed(&self, user: TelegramId) -> Result<Vec<Connection>, sqlx::Error> {
        sqlx::query_as::<_, Connection>(
            r#"
            SELECT u.id, u.first_name, u.username,
                   (SELECT COUNT(*) FROM events e
                    WHERE e.owner_id = u.id AND e.state = 'Active') AS active_events
            FROM friendships f
            JOIN users u ON u.id = f.followee_id
            WHERE f.follower_id = $1
            ORDER BY u.first_name, u.id
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
    }

    /// Remove the `follower -> followee` edge
    pub async fn unfollow(&self, follower: TelegramId, followee: TelegramId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM friendships WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower)
            .bind(followee)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove both edges between two users, returning how many existed
    pub async fn unfriend(&self, a: TelegramId, b: TelegramId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE (follower_id = $1 AND followee_id = $2)
               OR (follower_id = $2 AND followee_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move active events that started before `cutoff` to Past
    pub async fn expire_past_events(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        // Compared in Rust: rows written by older tools may hold naive timestamps
        let active = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE state = 'Active'")
            .fetch_all(&self.pool)
            .await?;

        let mut expired = 0;
        let finished = active
            .into_iter()
            .filter(|e| e.occurs_at < cutoff && e.state.can_transition_to(EventState::Past));
        for event in finished {
            expired += sqlx::query("UPDATE events SET state = $1 WHERE id = $2 AND state = $3")
                .bind(EventState::Past)
                .bind(event.id)
                .bind(EventState::Active)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }
        Ok(expired)
    }
}

async fn upsert_user<'e, E>(executor: E, user: &User) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO users (id, first_name, username)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET
            first_name = excluded.first_name,
            username = excluded.username
        "#,
    )
    .bind(user.id)
    .bind(&user.first_name)
    .bind(&user.username)
    .execute(executor)
    .await?;
    Ok(())
}

async fn befriend_tx(
    tx: &mut Transaction<'_, Sqlite>,
    a: TelegramId,
    b: TelegramId,
) -> Result<(), sqlx::Error> {
    if a == b {
        return Ok(());
    }
    let now = Utc::now();
    for (follower, followee) in [(a, b), (b, a)] {
        sqlx::query(
            r#"
            INSERT INTO friendships (follower_id, followee_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            "#,
        )
        .bind(follower)
        .bind(followee)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
