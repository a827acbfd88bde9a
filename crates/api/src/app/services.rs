use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::Utc;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use firefleet_auth::Hs256Jwt;
use firefleet_core::UserId;
use firefleet_core::model::{
    Assignment, Fault, FaultType, NewNotification, Notification, Request, Role, Service, Station,
    User, Vehicle,
};
use firefleet_store::{Collection, InMemoryCollection, Query, StoreResult};

use crate::app::errors::ApiResult;

/// Capacity of the realtime notification channel. Slow subscribers lose the
/// oldest messages; the persisted notification list stays authoritative.
const REALTIME_CAPACITY: usize = 256;

/// One handle per document collection.
#[derive(Clone)]
pub struct Collections {
    pub users: Arc<dyn Collection<User>>,
    pub stations: Arc<dyn Collection<Station>>,
    pub vehicles: Arc<dyn Collection<Vehicle>>,
    pub services: Arc<dyn Collection<Service>>,
    pub fault_types: Arc<dyn Collection<FaultType>>,
    pub faults: Arc<dyn Collection<Fault>>,
    pub assignments: Arc<dyn Collection<Assignment>>,
    pub requests: Arc<dyn Collection<Request>>,
    pub notifications: Arc<dyn Collection<Notification>>,
}

impl Collections {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryCollection::new()),
            stations: Arc::new(InMemoryCollection::new()),
            vehicles: Arc::new(InMemoryCollection::new()),
            services: Arc::new(InMemoryCollection::new()),
            fault_types: Arc::new(InMemoryCollection::new()),
            faults: Arc::new(InMemoryCollection::new()),
            assignments: Arc::new(InMemoryCollection::new()),
            requests: Arc::new(InMemoryCollection::new()),
            notifications: Arc::new(InMemoryCollection::new()),
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        use firefleet_store::PostgresCollection;

        Self {
            users: Arc::new(PostgresCollection::new(pool.clone())),
            stations: Arc::new(PostgresCollection::new(pool.clone())),
            vehicles: Arc::new(PostgresCollection::new(pool.clone())),
            services: Arc::new(PostgresCollection::new(pool.clone())),
            fault_types: Arc::new(PostgresCollection::new(pool.clone())),
            faults: Arc::new(PostgresCollection::new(pool.clone())),
            assignments: Arc::new(PostgresCollection::new(pool.clone())),
            requests: Arc::new(PostgresCollection::new(pool.clone())),
            notifications: Arc::new(PostgresCollection::new(pool)),
        }
    }

    /// Empty every collection.
    pub async fn clear_all(&self) -> StoreResult<()> {
        self.users.clear().await?;
        self.stations.clear().await?;
        self.vehicles.clear().await?;
        self.services.clear().await?;
        self.fault_types.clear().await?;
        self.faults.clear().await?;
        self.assignments.clear().await?;
        self.requests.clear().await?;
        self.notifications.clear().await?;
        Ok(())
    }
}

/// Shared application state handed to every handler.
pub struct AppServices {
    pub db: Collections,
    pub jwt: Arc<Hs256Jwt>,
    manager_registration_code: Option<String>,
    realtime_tx: broadcast::Sender<Notification>,
}

impl AppServices {
    pub fn new(db: Collections, jwt: Arc<Hs256Jwt>, manager_registration_code: Option<String>) -> Self {
        let (realtime_tx, _rx) = broadcast::channel(REALTIME_CAPACITY);
        Self {
            db,
            jwt,
            manager_registration_code: manager_registration_code.filter(|c| !c.trim().is_empty()),
            realtime_tx,
        }
    }

    pub fn manager_registration_code(&self) -> Option<&str> {
        self.manager_registration_code.as_deref()
    }

    pub fn realtime_tx(&self) -> broadcast::Sender<Notification> {
        self.realtime_tx.clone()
    }

    /// Persist a notification for one user and push it to live streams.
    pub async fn notify(&self, user_id: UserId, notification: &NewNotification) -> ApiResult<()> {
        let stored = self
            .db
            .notifications
            .insert(notification.to_user(user_id, Utc::now()))
            .await?;
        // No live subscribers is not an error.
        let _ = self.realtime_tx.send(stored);
        Ok(())
    }

    /// Notify every manager account.
    pub async fn notify_managers(&self, notification: &NewNotification) -> ApiResult<usize> {
        let managers = self
            .db
            .users
            .find(&Query::all().filter(|u: &User| u.role == Role::Manager))
            .await?;
        for manager in &managers {
            self.notify(manager.id, notification).await?;
        }
        Ok(managers.len())
    }
}

/// SSE stream of notifications created for `user_id` after subscription.
pub fn notification_sse_stream(
    services: Arc<AppServices>,
    user_id: UserId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(n) if n.user_id == user_id => {
            let data = serde_json::to_string(&n).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event("notification").data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
