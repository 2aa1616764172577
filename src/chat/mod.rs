//! Optional chat with the pet and its effect on the needs.
//!
//! Requests run on a worker thread; results come back over a channel that the
//! frame loop polls, so the pet state is only ever touched from the loop.

pub mod openai;

pub use openai::OpenAiChat;

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::pet::{PetState, StatDelta};
use crate::sentiment::{self, Sentiment};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You are a friendly, concise pet character. Keep responses short.";

/// Per-unit-of-sentiment change rates. Losses are applied with the (negative)
/// score, so they are configured as positive numbers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SentimentGains {
    pub fun_gain: f64,
    pub fun_loss: f64,
    pub energy_gain: f64,
    pub energy_loss: f64,
    pub hygiene_gain: f64,
    pub hygiene_loss: f64,
}

impl Default for SentimentGains {
    fn default() -> Self {
        Self {
            fun_gain: 0.25,
            fun_loss: 0.25,
            energy_gain: 0.05,
            energy_loss: 0.05,
            hygiene_gain: 0.0,
            hygiene_loss: 0.0,
        }
    }
}

impl SentimentGains {
    pub fn deltas(&self, score: f64) -> StatDelta {
        let (fun, energy, hygiene) = if score > 0.0 {
            (self.fun_gain, self.energy_gain, self.hygiene_gain)
        } else if score < 0.0 {
            (self.fun_loss, self.energy_loss, self.hygiene_loss)
        } else {
            return StatDelta::default();
        };
        StatDelta {
            hunger: 0.0,
            energy: score * energy,
            fun: score * fun,
            hygiene: score * hygiene,
        }
    }
}

/// Score a finished exchange and push the result into the pet.
pub fn apply_exchange(
    state: &mut PetState,
    user_text: &str,
    reply_text: &str,
    gains: &SentimentGains,
) -> Sentiment {
    let sentiment = sentiment::score(&format!("{user_text}\n{reply_text}"));
    let delta = gains.deltas(sentiment.score);
    if !delta.is_zero() {
        state.nudge(delta);
    }
    debug!(score = sentiment.score, label = %sentiment.label, "chat sentiment applied");
    sentiment
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

pub trait ChatBackend: Send + Sync {
    fn is_ready(&self) -> bool;

    fn reply(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

/// Stand-in used when chat is switched off or cannot be configured.
pub struct DisabledChat;

impl ChatBackend for DisabledChat {
    fn is_ready(&self) -> bool {
        false
    }

    fn reply(&self, _messages: &[ChatMessage]) -> Result<String, ChatError> {
        Err(ChatError::Disabled)
    }
}

pub fn backend_from_config(cfg: &ChatConfig) -> Arc<dyn ChatBackend> {
    if !cfg.enabled {
        info!("chat disabled by configuration");
        return Arc::new(DisabledChat);
    }
    let Some(key) = cfg.api_key.clone() else {
        warn!("OPENAI_API_KEY not set; chat disabled");
        return Arc::new(DisabledChat);
    };
    match OpenAiChat::new(cfg, key) {
        Ok(client) => {
            info!(model = %cfg.model, url = %cfg.completions_url(), "chat enabled");
            Arc::new(client)
        }
        Err(err) => {
            warn!("could not build chat client ({err}); chat disabled");
            Arc::new(DisabledChat)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Busy,
    Disabled,
}

/// A completed (or failed) round trip.
#[derive(Debug)]
pub struct Exchange {
    pub user_text: String,
    pub reply: Result<String, ChatError>,
}

struct Pending {
    user_text: String,
    rx: Receiver<Result<String, ChatError>>,
}

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    history: VecDeque<ChatMessage>,
    max_history: usize,
    pending: Option<Pending>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, max_history: usize) -> Self {
        Self {
            backend,
            history: VecDeque::new(),
            max_history: max_history.max(1),
            pending: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.backend.is_ready()
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history.iter()
    }

    fn push(&mut self, msg: ChatMessage) {
        self.history.push_back(msg);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    /// Start a request in the background. At most one is in flight.
    pub fn send(&mut self, user_text: &str) -> SendOutcome {
        if !self.backend.is_ready() {
            return SendOutcome::Disabled;
        }
        if self.pending.is_some() {
            return SendOutcome::Busy;
        }
        let user_text = user_text.trim().to_string();
        self.push(ChatMessage::new(Role::User, user_text.clone()));

        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(ChatMessage::new(Role::System, SYSTEM_PROMPT));
        messages.extend(self.history.iter().cloned());

        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        thread::spawn(move || {
            // The receiver may be gone if the app quit meanwhile.
            let _ = tx.send(backend.reply(&messages));
        });
        debug!(chars = user_text.len(), "chat request sent");
        self.pending = Some(Pending { user_text, rx });
        SendOutcome::Sent
    }

    /// Non-blocking; call once per frame.
    pub fn poll(&mut self) -> Option<Exchange> {
        let pending = self.pending.as_ref()?;
        let reply = match pending.rx.try_recv() {
            Ok(reply) => reply,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(ChatError::WorkerGone),
        };
        let user_text = self.pending.take().map(|p| p.user_text).unwrap_or_default();
        match &reply {
            Ok(text) => self.push(ChatMessage::new(Role::Assistant, text.clone())),
            Err(err) => warn!("chat request failed: {err}"),
        }
        Some(Exchange { user_text, reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appearance::Appearance;
    use crate::pet::Needs;
    use std::time::{Duration, Instant};

    struct Canned(&'static str);

    impl ChatBackend for Canned {
        fn is_ready(&self) -> bool {
            true
        }
        fn reply(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
            assert_eq!(messages[0].role, Role::System);
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl ChatBackend for Failing {
        fn is_ready(&self) -> bool {
            true
        }
        fn reply(&self, _messages: &[ChatMessage]) -> Result<String, ChatError> {
            Err(ChatError::EmptyReply)
        }
    }

    fn wait_for(session: &mut ChatSession) -> Exchange {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(ex) = session.poll() {
                return ex;
            }
            assert!(Instant::now() < deadline, "chat worker never answered");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn positive_score_uses_gain_rates() {
        let gains = SentimentGains::default();
        let d = gains.deltas(0.5);
        assert_eq!(d.fun, 0.125);
        assert_eq!(d.energy, 0.025);
        assert_eq!(d.hygiene, 0.0);
        assert_eq!(d.hunger, 0.0);
    }

    #[test]
    fn negative_score_uses_loss_rates() {
        let gains = SentimentGains {
            fun_loss: 0.5,
            ..SentimentGains::default()
        };
        let d = gains.deltas(-1.0);
        assert_eq!(d.fun, -0.5);
        assert_eq!(d.energy, -0.05);
        assert!(gains.deltas(0.0).is_zero());
    }

    #[test]
    fn exchange_moves_fun() {
        let mut st = PetState::from_parts(
            Needs {
                fun: 0.5,
                ..Needs::default()
            },
            false,
            None,
            0.0,
            Appearance::default(),
        );
        // love, great, fun vs sad => 0.5
        let s = apply_exchange(
            &mut st,
            "love this great fun",
            "but I am sad",
            &SentimentGains::default(),
        );
        assert_eq!(s.score, 0.5);
        assert!((st.fun() - 0.625).abs() < 1e-12);
    }

    #[test]
    fn exchange_on_dead_pet_changes_nothing() {
        let mut st = PetState::from_parts(
            Needs::default(),
            false,
            Some("Starved".into()),
            0.0,
            Appearance::default(),
        );
        apply_exchange(&mut st, "love", "yay", &SentimentGains::default());
        assert_eq!(st.needs(), Needs::default());
    }

    #[test]
    fn disabled_session_refuses() {
        let mut session = ChatSession::new(Arc::new(DisabledChat), 6);
        assert!(!session.is_ready());
        assert_eq!(session.send("hi"), SendOutcome::Disabled);
        assert!(session.poll().is_none());
        assert_eq!(session.history().count(), 0);
    }

    #[test]
    fn reply_arrives_through_poll() {
        let mut session = ChatSession::new(Arc::new(Canned("Yay, thanks!")), 6);
        assert_eq!(session.send("  hello pet "), SendOutcome::Sent);
        assert_eq!(session.send("again"), SendOutcome::Busy);
        let ex = wait_for(&mut session);
        assert_eq!(ex.user_text, "hello pet");
        assert_eq!(ex.reply.expect("reply"), "Yay, thanks!");
        assert!(!session.is_waiting());
        let roles: Vec<Role> = session.history().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn failure_is_reported_not_recorded() {
        let mut session = ChatSession::new(Arc::new(Failing), 6);
        session.send("hello");
        let ex = wait_for(&mut session);
        assert!(ex.reply.is_err());
        assert_eq!(session.history().count(), 1);
    }

    #[test]
    fn history_is_capped() {
        let mut session = ChatSession::new(Arc::new(Canned("ok")), 3);
        for i in 0..4 {
            session.send(&format!("msg {i}"));
            wait_for(&mut session);
        }
        let kept: Vec<String> = session.history().map(|m| m.content.clone()).collect();
        assert_eq!(kept, vec!["ok", "msg 3", "ok"]);
    }
}
