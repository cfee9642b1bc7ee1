//! New search term notifications.
//!
//! `NotifyOnCreate` is registered on the search term store and hands newly
//! created terms to a `Dispatch`. `BackgroundDispatcher` runs the notifier on
//! the tokio runtime without making the saver wait for it.
#![allow(clippy::future_not_send)]

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result, bail};
use moviesearch_db::{SearchTerm, SearchTermObserver};
use reqwest::Client;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use url::Url;

/// Delivers a notification for one new search term.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    /// Sends the notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered.
    async fn notify_new_search_term(&self, term: &str) -> Result<()>;
}

/// Schedules a notification and returns immediately.
pub trait Dispatch: Send + Sync {
    /// Hands `term` off for asynchronous notification.
    fn dispatch(&self, term: &str);
}

impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    fn dispatch(&self, term: &str) {
        (**self).dispatch(term);
    }
}

// --- Observer ---

/// Store observer that dispatches a notification for newly created terms only.
#[derive(Debug)]
pub struct NotifyOnCreate<D> {
    dispatcher: D,
}

impl<D: Dispatch> NotifyOnCreate<D> {
    /// Wraps a dispatcher.
    pub const fn new(dispatcher: D) -> Self {
        Self { dispatcher }
    }
}

impl<D: Dispatch> SearchTermObserver for NotifyOnCreate<D> {
    fn search_term_saved(&self, term: &SearchTerm, created: bool) {
        if created {
            self.dispatcher.dispatch(&term.term);
        }
    }
}

// --- Dispatcher ---

/// Runs notifications as spawned tokio tasks.
///
/// Failures are logged inside the task and never reach the caller of `dispatch`.
#[derive(Debug)]
pub struct BackgroundDispatcher<N> {
    notifier: Arc<N>,
    runtime: Handle,
    tasks: Mutex<JoinSet<()>>,
}

impl<N: Notifier + Sync + 'static> BackgroundDispatcher<N> {
    /// Creates a dispatcher bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if called outside a tokio runtime.
    pub fn new(notifier: N) -> Result<Self> {
        let runtime = Handle::try_current().context("background dispatch requires a tokio runtime")?;
        Ok(Self {
            notifier: Arc::new(notifier),
            runtime,
            tasks: Mutex::new(JoinSet::new()),
        })
    }

    /// Waits for every dispatched notification to finish.
    pub async fn shutdown(&self) {
        let mut tasks = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Notification task panicked or was cancelled");
            }
        }
    }
}

impl<N: Notifier + Sync + 'static> Dispatch for BackgroundDispatcher<N> {
    fn dispatch(&self, term: &str) {
        let notifier = Arc::clone(&self.notifier);
        let term = String::from(term);
        tracing::debug!(term = %term, "Dispatching new search term notification");

        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .spawn_on(
                async move {
                    let result = Notifier::notify_new_search_term(notifier.as_ref(), &term).await;
                    if let Err(e) = result {
                        tracing::warn!(term = %term, error = ?e, "Notification failed");
                    }
                },
                &self.runtime,
            );
    }
}

// --- Notifiers ---

/// Logs new search terms.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify_new_search_term(&self, term: &str) -> Result<()> {
        tracing::info!(term, "New search term");
        Ok(())
    }
}

/// JSON body posted by `WebhookNotifier`.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    term: &'a str,
}

/// POSTs new search terms to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http_client: Client,
    url: Url,
}

impl WebhookNotifier {
    /// Creates a notifier posting to `url`.
    pub fn new(url: Url, http_client: Client) -> Self {
        Self { http_client, url }
    }
}

impl Notifier for WebhookNotifier {
    async fn notify_new_search_term(&self, term: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url.clone())
            .json(&WebhookPayload { term })
            .send()
            .await
            .with_context(|| format!("webhook request failed: {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("webhook returned HTTP {status}: {}", self.url);
        }
        tracing::debug!(term, url = %self.url, "Webhook notified");
        Ok(())
    }
}

/// Notifier selected from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredNotifier {
    /// Log only.
    Log(LogNotifier),
    /// Post to a webhook.
    Webhook(WebhookNotifier),
}

impl Notifier for ConfiguredNotifier {
    async fn notify_new_search_term(&self, term: &str) -> Result<()> {
        match self {
            Self::Log(n) => Notifier::notify_new_search_term(n, term).await,
            Self::Webhook(n) => Notifier::notify_new_search_term(n, term).await,
        }
    }
}
