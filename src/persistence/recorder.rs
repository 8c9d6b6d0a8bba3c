//! Background tasks that feed and trim the event log.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::EventSink;
use super::postgres::PostgresEventLog;
use crate::domain::EventBus;

/// Subscribes to the bus and appends every event to `sink` until the bus
/// closes. Write failures are logged and skipped; the live system never
/// waits on the log.
pub fn spawn_event_recorder(bus: &EventBus, sink: Arc<dyn EventSink>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = sink.append(&event).await {
                        tracing::warn!(
                            event_type = event.event_type_str(),
                            error = %e,
                            "failed to record event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event recorder lagged; events dropped from log");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("event recorder stopped");
    })
}

/// Deletes events older than `after_days` every `every`.
pub fn spawn_cleanup(log: PostgresEventLog, after_days: u64, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match log.delete_older_than(after_days).await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, after_days, "event log cleaned up"),
                Err(e) => tracing::warn!(error = %e, "event log cleanup failed"),
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    use crate::domain::{DomainEvent, UserId};
    use crate::error::GatewayError;

    #[derive(Debug, Default)]
    struct MemorySink {
        rows: Mutex<Vec<&'static str>>,
        fail_first: Mutex<bool>,
    }

    #[async_trait]
    impl EventSink for MemorySink {
        async fn append(&self, event: &DomainEvent) -> Result<i64, GatewayError> {
            let mut fail = self.fail_first.lock().await;
            if *fail {
                *fail = false;
                return Err(GatewayError::PersistenceError("connection reset".to_string()));
            }
            let mut rows = self.rows.lock().await;
            rows.push(event.event_type_str());
            Ok(i64::try_from(rows.len()).unwrap_or(i64::MAX))
        }
    }

    fn registered() -> DomainEvent {
        DomainEvent::UserRegistered {
            user_id: UserId::new(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn records_events_and_survives_write_failures() {
        let bus = EventBus::new(16);
        let sink = Arc::new(MemorySink {
            fail_first: Mutex::new(true),
            ..MemorySink::default()
        });
        let handle = spawn_event_recorder(&bus, Arc::clone(&sink) as Arc<dyn EventSink>);

        for _ in 0..3 {
            let _ = bus.publish(registered());
        }
        drop(bus);

        let Ok(joined) = tokio::time::timeout(Duration::from_secs(2), handle).await else {
            panic!("recorder did not stop after the bus closed");
        };
        assert!(joined.is_ok());
        assert_eq!(*sink.rows.lock().await, vec!["user_registered"; 2]);
    }
}
