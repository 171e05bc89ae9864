//! Background subscriber that mirrors every event into the tracing log.

use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

pub struct EventLogger;

impl EventLogger {
    /// Run until the bus is dropped.
    pub async fn run(mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        event_type = %event.event_type,
                        club_id = ?event.club_id,
                        entity_type = ?event.source_entity_type,
                        entity_id = ?event.source_entity_id,
                        actor = ?event.actor_user_id,
                        payload = %event.payload,
                        "Lifecycle event",
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event logger shutting down");
                    break;
                }
            }
        }
    }
}
