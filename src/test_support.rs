//! Recording fakes for every gate collaborator, plus a `Harness` wiring them together.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::gate::{Collaborators, StartGate};
use crate::application::grants::MemoryGrantStore;
use crate::application::retry::RetryPolicy;
use crate::domain::config::GatePolicy;
use crate::domain::error::{DecodeError, GateError};
use crate::domain::traits::{
    Clock, ContentResolver, LinkShortener, MembershipGuard, PasswordUnlocker, Transport,
    Translator, UserRegistry,
};
use crate::domain::types::{
    Button, Content, InboundEvent, Membership, MessageRef, OutgoingMessage, PeerKind, Translated,
    UserDefaults, UserId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send(UserId, OutgoingMessage),
    Delete(UserId, MessageRef),
    Deliver(UserId, Content),
}

/// Records successful calls. Queued failures are consumed by the next matching send.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    send_failures: Mutex<VecDeque<(Option<UserId>, GateError)>>,
    next_id: AtomicUsize,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send(_, msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn fail_next_send(&self, error: GateError) {
        self.send_failures.lock().unwrap().push_back((None, error));
    }

    pub fn fail_send_for(&self, user: UserId, error: GateError) {
        self.send_failures.lock().unwrap().push_back((Some(user), error));
    }

    fn take_failure(&self, user: UserId) -> Option<GateError> {
        let mut failures = self.send_failures.lock().unwrap();
        let idx = failures
            .iter()
            .position(|(target, _)| target.is_none_or(|t| t == user))?;
        failures.remove(idx).map(|(_, error)| error)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, user: UserId, message: OutgoingMessage) -> Result<MessageRef, GateError> {
        if let Some(error) = self.take_failure(user) {
            return Err(error);
        }
        self.calls.lock().unwrap().push(Call::Send(user, message));
        Ok(MessageRef(1_000 + self.next_id.fetch_add(1, Ordering::SeqCst) as i32))
    }

    async fn delete(&self, user: UserId, message: MessageRef) -> Result<(), GateError> {
        self.calls.lock().unwrap().push(Call::Delete(user, message));
        Ok(())
    }

    async fn deliver(&self, user: UserId, content: &Content) -> Result<(), GateError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Deliver(user, content.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRegistry {
    users: tokio::sync::Mutex<HashMap<UserId, String>>,
}

impl MemoryRegistry {
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn lang(&self, user: UserId) -> Option<String> {
        self.users.lock().await.get(&user).cloned()
    }
}

#[async_trait]
impl UserRegistry for MemoryRegistry {
    async fn upsert(&self, user: UserId, defaults: &UserDefaults) -> Result<bool, GateError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user) {
            return Ok(true);
        }
        users.insert(user, defaults.lang.clone());
        Ok(false)
    }

    async fn language(&self, user: UserId) -> Result<Option<String>, GateError> {
        Ok(self.lang(user).await)
    }
}

#[derive(Default)]
pub struct FakeGuard {
    stop: AtomicBool,
    payloads: Mutex<Vec<String>>,
}

impl FakeGuard {
    pub fn stop_everyone(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MembershipGuard for FakeGuard {
    async fn enforce(
        &self,
        _user: UserId,
        payload: &str,
        _lang: &str,
    ) -> Result<Membership, GateError> {
        self.payloads.lock().unwrap().push(payload.to_string());
        if self.stop.load(Ordering::SeqCst) {
            Ok(Membership::Stop)
        } else {
            Ok(Membership::Proceed)
        }
    }
}

/// Answers `"<key>@<lang>"` with a fixed number of buttons per button key.
#[derive(Default)]
pub struct EchoTranslator {
    calls: AtomicUsize,
}

impl EchoTranslator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for EchoTranslator {
    async fn resolve(
        &self,
        key: &str,
        button_key: Option<&str>,
        lang: &str,
    ) -> Result<Translated, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let count = match button_key {
            Some("help.0.button") => 3,
            Some(_) => 2,
            None => 0,
        };
        let buttons = (0..count)
            .map(|i| Button::url(format!("{}#{i}", button_key.unwrap_or_default()), format!("https://example.com/{i}")))
            .collect();
        Ok(Translated {
            text: format!("{key}@{lang}"),
            buttons,
        })
    }
}

#[derive(Default)]
pub struct PrefixShortener {
    calls: AtomicUsize,
}

impl PrefixShortener {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkShortener for PrefixShortener {
    async fn shorten(&self, url: &str) -> Result<String, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("short:{url}"))
    }
}

enum ResolverMode {
    Found,
    NotFound,
    Notified,
    Fail(GateError),
}

/// Resolves every code to a copy of a message in chat `-100`.
pub struct FakeResolver {
    mode: Mutex<ResolverMode>,
    calls: AtomicUsize,
}

impl Default for FakeResolver {
    fn default() -> Self {
        Self {
            mode: Mutex::new(ResolverMode::Found),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeResolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reject_with_not_found(&self) {
        *self.mode.lock().unwrap() = ResolverMode::NotFound;
    }

    pub fn notify_instead(&self) {
        *self.mode.lock().unwrap() = ResolverMode::Notified;
    }

    /// Fails once with `error`, then resolves normally.
    pub fn fail_with(&self, error: GateError) {
        *self.mode.lock().unwrap() = ResolverMode::Fail(error);
    }
}

#[async_trait]
impl ContentResolver for FakeResolver {
    async fn decode(
        &self,
        code: &str,
        _user: UserId,
        _reply_to: MessageRef,
    ) -> Result<Content, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut mode = self.mode.lock().unwrap();
        match std::mem::replace(&mut *mode, ResolverMode::Found) {
            ResolverMode::Found => Ok(Content::Copy {
                from_chat: -100,
                message: MessageRef(code.len() as i32),
            }),
            ResolverMode::NotFound => {
                *mode = ResolverMode::NotFound;
                Err(DecodeError::NotFound(code.to_string()))
            }
            ResolverMode::Notified => {
                *mode = ResolverMode::Notified;
                Err(DecodeError::Notified)
            }
            ResolverMode::Fail(error) => Err(DecodeError::Gate(error)),
        }
    }
}

#[derive(Default)]
pub struct RecordingUnlocker {
    payloads: Mutex<Vec<String>>,
}

impl RecordingUnlocker {
    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PasswordUnlocker for RecordingUnlocker {
    async fn unlock(&self, _user: UserId, payload: &str, _lang: &str) -> Result<(), GateError> {
        self.payloads.lock().unwrap().push(payload.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Fakes plus policy for one test. Every `gate()` shares the same fakes.
pub struct Harness {
    pub transport: Arc<RecordingTransport>,
    pub registry: Arc<MemoryRegistry>,
    pub grants: Arc<MemoryGrantStore>,
    pub membership: Arc<FakeGuard>,
    pub translator: Arc<EchoTranslator>,
    pub shortener: Arc<PrefixShortener>,
    pub resolver: Arc<FakeResolver>,
    pub password: Arc<RecordingUnlocker>,
    pub clock: Arc<FixedClock>,
    allow: HashSet<UserId>,
    storage: bool,
    policy: GatePolicy,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            transport: Arc::default(),
            registry: Arc::default(),
            grants: Arc::new(MemoryGrantStore::new(None)),
            membership: Arc::default(),
            translator: Arc::default(),
            shortener: Arc::default(),
            resolver: Arc::default(),
            password: Arc::default(),
            clock: Arc::default(),
            allow: HashSet::new(),
            storage: false,
            policy: GatePolicy {
                bot_username: "FileBot".into(),
                link_base: "https://telegram.dog".into(),
                welcome_media: None,
                token_window: None,
                default_language: "en".into(),
            },
        }
    }

    pub fn with_expiration_hours(mut self, hours: u64) -> Self {
        self.policy.token_window = Some(Duration::from_secs(hours * 3600));
        self.grants = Arc::new(MemoryGrantStore::new(self.policy.token_window_ms()));
        self
    }

    pub fn with_welcome_media(mut self, media: &str) -> Self {
        self.policy.welcome_media = Some(media.to_string());
        self
    }

    pub fn with_storage(mut self) -> Self {
        self.storage = true;
        self
    }

    pub fn allow(mut self, user: UserId) -> Self {
        self.allow.insert(user);
        self
    }

    pub fn at(self, now_ms: i64) -> Self {
        self.clock.set(now_ms);
        self
    }

    pub fn policy(&self) -> GatePolicy {
        self.policy.clone()
    }

    pub fn deps(&self) -> Collaborators {
        Collaborators {
            transport: self.transport.clone(),
            registry: self
                .storage
                .then(|| self.registry.clone() as Arc<dyn UserRegistry>),
            grants: self.grants.clone(),
            membership: self.membership.clone(),
            translator: self.translator.clone(),
            shortener: self.shortener.clone(),
            resolver: self.resolver.clone(),
            password: self.password.clone(),
            allow_list: Arc::new(self.allow.clone()),
            clock: self.clock.clone(),
        }
    }

    pub fn gate(&self) -> StartGate {
        StartGate::new(self.policy(), self.deps(), RetryPolicy::default())
    }

    /// A `/start` style event from user 100, message 1, in a private chat.
    pub fn event(&self, text: &str) -> InboundEvent {
        InboundEvent {
            user_id: UserId(100),
            message: MessageRef(1),
            raw_text: text.to_string(),
            is_outgoing: false,
            peer_kind: PeerKind::Direct,
            language_hint: None,
        }
    }

    pub async fn has_grant(&self, user: UserId) -> bool {
        self.grants.get(user).await.is_some()
    }

    pub async fn grant_issued_at(&self, user: UserId) -> Option<i64> {
        self.grants.get(user).await.map(|grant| grant.issued_at_ms)
    }
}
