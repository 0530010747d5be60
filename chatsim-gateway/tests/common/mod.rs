//! Scripted backends for driving the gateway without network access.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chatsim_core::{Character, CharacterInfo, GenerationSettings, Language, ProviderKind};
use chatsim_gateway::providers::{
    CharacterResolver, ChatMessage, Provider, ProviderError, resolve_with,
};
use chatsim_gateway::{AppState, Orchestrator, ProviderSet};

/// A backend that answers completions from a queue of canned replies.
///
/// Resolution goes through [`resolve_with`], like the DeepSeek client.
pub struct ScriptedBackend {
    kind: ProviderKind,
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(kind: ProviderKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn reply(&self, text: impl Into<String>) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(&self, status: u16, body: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(ProviderError::UpstreamRequestFailed {
                status,
                body: body.to_string(),
            }));
        self
    }

    /// User prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedBackend {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        if let Some(last) = messages.last() {
            self.prompts.lock().unwrap().push(last.content.clone());
        }
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ProviderError::MalformedResponse(
                "no scripted reply left".to_string(),
            ))
        })
    }
}

#[async_trait::async_trait]
impl CharacterResolver for ScriptedBackend {
    async fn resolve_characters(
        &self,
        characters: &[Character],
        language: Language,
    ) -> Result<Vec<CharacterInfo>, ProviderError> {
        resolve_with(self, "scripted-resolver", characters, language).await
    }
}

pub struct Harness {
    pub primary: Arc<ScriptedBackend>,
    pub secondary: Arc<ScriptedBackend>,
    pub tertiary: Arc<ScriptedBackend>,
    pub state: Arc<AppState>,
}

/// Wire three scripted backends into an app state; the primary also resolves.
pub fn harness(language: Language) -> Harness {
    let primary = ScriptedBackend::new(ProviderKind::Primary);
    let secondary = ScriptedBackend::new(ProviderKind::Secondary);
    let tertiary = ScriptedBackend::new(ProviderKind::Tertiary);

    let orchestrator = Orchestrator::new(
        primary.clone(),
        ProviderSet {
            primary: primary.clone(),
            secondary: secondary.clone(),
            tertiary: tertiary.clone(),
        },
        GenerationSettings::default(),
        language,
    );

    Harness {
        primary,
        secondary,
        tertiary,
        state: Arc::new(AppState::new(orchestrator)),
    }
}

pub fn profiles_reply(names: &[&str]) -> String {
    let profiles: Vec<serde_json::Value> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "name": name,
                "description": format!("{name} is well known."),
                "story": [format!("{name} once did something memorable.")],
            })
        })
        .collect();
    format!(
        "```json\n{}\n```",
        serde_json::to_string_pretty(&profiles).unwrap()
    )
}

pub fn turns_reply(names: &[&str], count: usize) -> String {
    let turns: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "name": names[i % names.len()],
                "content": format!("turn {}", i + 1),
            })
        })
        .collect();
    format!(
        "Sure! Here's the conversation:\n{}\nHope you enjoy it.",
        serde_json::Value::from(turns)
    )
}
