//! # Start Gate
//!
//! Entry point for every inbound `/start`. Runs, in order: language resolution,
//! the subscription guard and registry upsert (both skipped for allow-listed
//! users), then the payload router. The whole run is wrapped by the retry
//! policy and is the single boundary where errors are logged and swallowed.

use std::sync::Arc;

use crate::application::payload::{Flow, extract_payload};
use crate::application::retry::RetryPolicy;
use crate::application::router::PayloadRouter;
use crate::domain::config::GatePolicy;
use crate::domain::error::GateError;
use crate::domain::traits::{
    AllowList, Clock, ContentResolver, GrantStore, LinkShortener, MembershipGuard,
    PasswordUnlocker, Transport, Translator, UserRegistry,
};
use crate::domain::types::{InboundEvent, Membership, UserDefaults};

/// Everything the gate calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    /// `None` when persistent storage is not configured.
    pub registry: Option<Arc<dyn UserRegistry>>,
    pub grants: Arc<dyn GrantStore>,
    pub membership: Arc<dyn MembershipGuard>,
    pub translator: Arc<dyn Translator>,
    pub shortener: Arc<dyn LinkShortener>,
    pub resolver: Arc<dyn ContentResolver>,
    pub password: Arc<dyn PasswordUnlocker>,
    pub allow_list: Arc<dyn AllowList>,
    pub clock: Arc<dyn Clock>,
}

/// How handling of one event ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a `/start` in a private chat.
    Ignored,
    /// The subscription guard stopped the request.
    Stopped,
    Routed(Flow),
    /// An error was logged and swallowed.
    Failed,
}

#[derive(Clone)]
pub struct StartGate {
    policy: Arc<GatePolicy>,
    deps: Arc<Collaborators>,
    router: Arc<PayloadRouter>,
    retry: RetryPolicy,
}

impl StartGate {
    pub fn new(policy: GatePolicy, deps: Collaborators, retry: RetryPolicy) -> Self {
        let policy = Arc::new(policy);
        let deps = Arc::new(deps);
        let router = Arc::new(PayloadRouter::new(policy.clone(), deps.clone()));
        Self {
            policy,
            deps,
            router,
            retry,
        }
    }

    /// Handles one inbound event. Never fails: errors are logged here.
    pub async fn handle(&self, event: InboundEvent) -> Outcome {
        if !event.is_start_command() {
            return Outcome::Ignored;
        }

        let user = event.user_id;
        let gate = self;
        let event = &event;
        match self
            .retry
            .execute_with_retry(move || gate.handle_once(event), user)
            .await
        {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!(user_id = %user, error = %error, "Failed to handle /start");
                Outcome::Failed
            }
        }
    }

    /// One complete, restartable run over an event.
    async fn handle_once(&self, event: &InboundEvent) -> Result<Outcome, GateError> {
        let user = event.user_id;
        let lang = self.resolve_language(event).await;

        if !self.deps.allow_list.contains(user) {
            let payload = extract_payload(&event.raw_text);
            if self.deps.membership.enforce(user, payload, &lang).await? == Membership::Stop {
                tracing::debug!(user_id = %user, "Stopped by subscription guard");
                return Ok(Outcome::Stopped);
            }

            if let Some(registry) = &self.deps.registry {
                let defaults = UserDefaults { lang: lang.clone() };
                if !registry.upsert(user, &defaults).await? {
                    tracing::info!(user_id = %user, lang = %lang, "Registered new user");
                }
            }
        }

        let flow = self.router.route(event, &lang).await?;
        Ok(Outcome::Routed(flow))
    }

    /// Stored preference, then the client's language, then the default.
    async fn resolve_language(&self, event: &InboundEvent) -> String {
        if let Some(registry) = &self.deps.registry {
            match registry.language(event.user_id).await {
                Ok(Some(lang)) => return lang,
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(user_id = %event.user_id, error = %error, "Language lookup failed");
                }
            }
        }
        event
            .language_hint
            .as_deref()
            .and_then(normalize_language)
            .unwrap_or_else(|| self.policy.default_language.clone())
    }
}

/// `"en-US"` -> `"en"`. Empty hints are ignored.
fn normalize_language(hint: &str) -> Option<String> {
    let primary = hint.split(['-', '_']).next()?.trim();
    if primary.is_empty() {
        None
    } else {
        Some(primary.to_ascii_lowercase())
    }
}
