//! Notification emitter trait and record-backed implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::EntityId;
use domain::{Audience, DomainError, Notification, Repository};
use record_store::RecordStore;
use thiserror::Error;

/// Errors a notification channel can produce.
///
/// These never propagate past the emitting call site: a failed emission is
/// logged and swallowed.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The downstream channel could not be reached.
    #[error("Notification channel unavailable")]
    ChannelUnavailable,

    /// Writing the notification record failed.
    #[error("Notification store error: {0}")]
    Store(#[from] DomainError),
}

/// Fire-and-forget announcement of a state transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Emits one notification.
    async fn emit(&self, notification: Notification) -> Result<(), NotifyError>;

    /// Emits a notification, catching and logging any failure.
    ///
    /// This is the only entry point the coordinators use: a notification
    /// failure must never fail or roll back the transition that triggered it.
    async fn emit_best_effort(&self, notification: Notification) {
        let kind = notification.notification_kind();
        match self.emit(notification).await {
            Ok(()) => {
                metrics::counter!("notifications_emitted_total").increment(1);
            }
            Err(e) => {
                metrics::counter!("notifications_failed_total").increment(1);
                tracing::warn!(kind = %kind, error = %e, "notification emission failed");
            }
        }
    }
}

/// Notifier that writes Notification records to the store.
///
/// Actual delivery (SMS/WhatsApp/email) is a downstream consumer of those
/// records. `set_fail_on_emit` simulates an unreachable channel in tests.
pub struct RecordNotifier<S: RecordStore> {
    notifications: Repository<S, Notification>,
    fail_on_emit: Arc<AtomicBool>,
}

impl<S: RecordStore + Clone> Clone for RecordNotifier<S> {
    fn clone(&self) -> Self {
        Self {
            notifications: self.notifications.clone(),
            fail_on_emit: self.fail_on_emit.clone(),
        }
    }
}

impl<S: RecordStore> RecordNotifier<S> {
    /// Creates a new record-backed notifier.
    pub fn new(store: S) -> Self {
        Self {
            notifications: Repository::new(store),
            fail_on_emit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Configures the notifier to fail on emit, simulating an unreachable
    /// channel.
    pub fn set_fail_on_emit(&self, fail: bool) {
        self.fail_on_emit.store(fail, Ordering::SeqCst);
    }

    /// Returns all notifications for an audience, oldest first.
    pub async fn list_for_audience(
        &self,
        audience: Audience,
    ) -> Result<Vec<Notification>, DomainError> {
        let mut notifications: Vec<_> = self
            .notifications
            .list()
            .await?
            .into_iter()
            .filter(|n| n.audience() == audience)
            .collect();
        notifications.sort_by_key(|n| n.created_at());
        Ok(notifications)
    }

    /// Returns the number of stored notifications.
    pub async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.notifications.list().await?.len())
    }

    /// Flags a notification as read.
    pub async fn mark_read(&self, id: EntityId) -> Result<Notification, DomainError> {
        self.notifications
            .try_update(id, |n| {
                n.mark_read();
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl<S: RecordStore> Notifier for RecordNotifier<S> {
    async fn emit(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.fail_on_emit.load(Ordering::SeqCst) {
            return Err(NotifyError::ChannelUnavailable);
        }

        let mut notification = notification;
        self.notifications.insert(&mut notification).await?;
        Ok(())
    }
}
