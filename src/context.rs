//! Per-rule review context and cooperative cancellation.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering}
    },
    time::Duration
};

use tokio::sync::Notify;

use crate::{database::LiveDatabase, rule::Rule};

/// Cooperative cancellation token shared by every check of one review.
///
/// Cancelling aborts in-flight diagnostic queries; static checks are
/// CPU-bound and finish on their own.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify:    Notify
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Everything one advisor needs to check one script.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub rule:          &'a Rule,
    pub charset:       &'a str,
    pub collation:     &'a str,
    /// Live connection for dynamic checks, if the caller supplied one
    pub database:      Option<&'a dyn LiveDatabase>,
    pub cancel:        &'a CancellationToken,
    /// Upper bound for each diagnostic query
    pub query_timeout: Option<Duration>
}

impl<'a> Context<'a> {
    /// Context without a live database, charset or collation.
    pub fn offline(rule: &'a Rule, cancel: &'a CancellationToken) -> Self {
        Self {
            rule,
            charset:   "",
            collation: "",
            database:  None,
            cancel,
            query_timeout: None
        }
    }

    pub fn with_database(mut self, database: &'a dyn LiveDatabase) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("rule", &self.rule.rule_type)
            .field("charset", &self.charset)
            .field("collation", &self.collation)
            .field("database", &self.database.is_some())
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}
