//! Background task moving finished events to Past

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use invevent_core::timezone::start_of_day;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::db::BotDb;

/// Expire events every `interval` until `shutdown` is cancelled
pub async fn run(db: BotDb, interval: Duration, shutdown: CancellationToken) {
    info!("Starting event sweeper: interval={}s", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Event sweeper received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = sweep_once(&db, Utc::now()).await {
                    error!("Failed to expire past events: {}", e);
                }
            }
        }
    }
}

/// Events stay active for the whole UTC day they happen on
pub async fn sweep_once(db: &BotDb, now: DateTime<Utc>) -> Result<u64> {
    let expired = db.expire_past_events(start_of_day(now)).await?;
    if expired > 0 {
        info!("Moved {} event(s) to Past", expired);
    }
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use invevent_core::geo::Coordinates;
    use invevent_core::models::{EventState, EventVisibility, NewEvent, User};
    use invevent_shared::bootstrap::init_memory_db;

    #[tokio::test]
    async fn test_events_expire_after_their_day() {
        let db = BotDb::new(init_memory_db().await.unwrap());
        let owner = User {
            id: 1,
            first_name: "Alice".to_string(),
            username: None,
        };
        let event = db
            .create_event(
                &owner,
                &NewEvent {
                    owner_id: owner.id,
                    title: "Brunch".to_string(),
                    description: String::new(),
                    occurs_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
                    coordinates: Some(Coordinates::new(55.75, 37.61)),
                    address: None,
                    visibility: EventVisibility::Public,
                    tags: "Food".to_string(),
                    photo_file_id: None,
                },
            )
            .await
            .unwrap();

        let same_evening = Utc.with_ymd_and_hms(2025, 6, 1, 22, 0, 0).unwrap();
        assert_eq!(sweep_once(&db, same_evening).await.unwrap(), 0);

        let next_day = Utc.with_ymd_and_hms(2025, 6, 2, 0, 5, 0).unwrap();
        assert_eq!(sweep_once(&db, next_day).await.unwrap(), 1);
        let loaded = db.get_event(event.id).await.unwrap().unwrap();
        assert_eq!(loaded.state, EventState::Past);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let db = BotDb::new(init_memory_db().await.unwrap());
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run(db, Duration::from_secs(3600), shutdown.clone()));
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
