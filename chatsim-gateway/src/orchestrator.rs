//! Two-stage generation pipeline: resolve characters, then generate the
//! conversation with the selected provider.
//!
//! Any stage failure aborts the request; nothing is retried and no partial
//! conversation is returned.

use std::sync::Arc;

use chatsim_core::{
    Character, Config, Conversation, ConversationTurn, GenerateRequest, GenerationSettings,
    Language, Message, ProviderKind, RESOLVER_PROVIDER, locale,
};
use chrono::{DateTime, Utc};
use tracing::{Instrument, error, info, info_span};

use crate::providers::claude::ClaudeClient;
use crate::providers::deepseek::DeepSeekClient;
use crate::providers::gemini::GeminiClient;
use crate::providers::{CharacterResolver, Provider, ProviderError};

// The DeepSeek client is the only `CharacterResolver`.
const _: () = assert!(matches!(RESOLVER_PROVIDER, ProviderKind::Primary));

/// The error crossing the request/response boundary.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The request itself is unusable; nothing was sent upstream.
    #[error("{0}")]
    InvalidRequest(String),
    /// A pipeline stage failed. `message` is safe to show to end users.
    #[error("{message}")]
    GenerationFailed {
        message: String,
        #[source]
        source: ProviderError,
    },
}

impl GenerateError {
    /// Text for the caller's error body.
    pub fn user_message(&self) -> &str {
        match self {
            GenerateError::InvalidRequest(message) => message,
            GenerateError::GenerationFailed { message, .. } => message,
        }
    }
}

/// One conversation provider per [`ProviderKind`].
#[derive(Clone)]
pub struct ProviderSet {
    pub primary: Arc<dyn Provider>,
    pub secondary: Arc<dyn Provider>,
    pub tertiary: Arc<dyn Provider>,
}

impl ProviderSet {
    pub fn get(&self, kind: ProviderKind) -> &Arc<dyn Provider> {
        match kind {
            ProviderKind::Primary => &self.primary,
            ProviderKind::Secondary => &self.secondary,
            ProviderKind::Tertiary => &self.tertiary,
        }
    }
}

/// Drives a generation request through both stages.
#[derive(Clone)]
pub struct Orchestrator {
    resolver: Arc<dyn CharacterResolver>,
    providers: ProviderSet,
    generation: GenerationSettings,
    language: Language,
}

impl Orchestrator {
    pub fn new(
        resolver: Arc<dyn CharacterResolver>,
        providers: ProviderSet,
        generation: GenerationSettings,
        language: Language,
    ) -> Self {
        Self {
            resolver,
            providers,
            generation,
            language,
        }
    }

    /// Build the three provider clients from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let generation = &config.settings.generation;
        let dump_queries = config.dump_queries();

        let primary = Arc::new(
            DeepSeekClient::new(&config.providers.primary, generation.temperature)?
                .with_dump_queries(dump_queries),
        );
        let secondary = ClaudeClient::new(
            &config.providers.secondary,
            generation.temperature,
            generation.max_tokens,
        )?
        .with_dump_queries(dump_queries);
        let tertiary = GeminiClient::new(
            &config.providers.tertiary,
            generation.temperature,
            generation.max_tokens,
        )?
        .with_dump_queries(dump_queries);

        let providers = ProviderSet {
            primary: primary.clone(),
            secondary: Arc::new(secondary),
            tertiary: Arc::new(tertiary),
        };

        Ok(Self::new(
            primary,
            providers,
            generation.clone(),
            config.language(),
        ))
    }

    /// Validate an inbound request and run it.
    pub async fn handle(&self, request: GenerateRequest) -> Result<Conversation, GenerateError> {
        self.validate(&request)?;
        let rounds = request.rounds.unwrap_or(self.generation.default_rounds);
        self.generate(&request.characters, rounds, request.provider())
            .await
    }

    fn validate(&self, request: &GenerateRequest) -> Result<(), GenerateError> {
        let count = request.characters.len();
        let (min, max) = (self.generation.min_characters, self.generation.max_characters);
        if count < min || count > max {
            return Err(GenerateError::InvalidRequest(format!(
                "expected between {min} and {max} characters, got {count}"
            )));
        }
        if request.characters.iter().any(|c| c.name.trim().is_empty()) {
            return Err(GenerateError::InvalidRequest(
                "character names must not be empty".to_string(),
            ));
        }
        if request.rounds == Some(0) {
            return Err(GenerateError::InvalidRequest(
                "rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve `characters` with the resolver provider, then generate the
    /// conversation with `provider`.
    pub async fn generate(
        &self,
        characters: &[Character],
        rounds: u32,
        provider: ProviderKind,
    ) -> Result<Conversation, GenerateError> {
        let request_id = uuid::Uuid::new_v4();
        let span = info_span!("generate", %request_id, %provider);

        async move {
            self.run(characters, rounds, provider).await.map_err(|source| {
                error!(error = %source, details = ?source, "Error generating conversation");
                self.failure(source)
            })
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        characters: &[Character],
        rounds: u32,
        provider: ProviderKind,
    ) -> Result<Conversation, ProviderError> {
        info!(
            characters = characters.len(),
            rounds,
            resolver = %RESOLVER_PROVIDER,
            "Fetching character details"
        );
        let infos = self.resolver.resolve_characters(characters, self.language).await?;
        info!(resolved = infos.len(), "Character details fetched");

        let generator = self.providers.get(provider);
        info!(model = generator.model(), "Generating conversation");
        let turns = generator
            .generate_conversation(&infos, rounds, self.language)
            .await?;

        let conversation = annotate(turns, Utc::now);
        info!(messages = conversation.len(), "Conversation generated");
        Ok(conversation)
    }

    fn failure(&self, source: ProviderError) -> GenerateError {
        let message = match &source {
            ProviderError::CharacterNotFound { name } => {
                locale::character_not_found(self.language, name)
            }
            _ => locale::generation_failed(self.language),
        };
        GenerateError::GenerationFailed { message, source }
    }
}

/// Number turns from 1 and stamp them, keeping timestamps non-decreasing
/// even if the clock steps back.
pub fn annotate<F>(turns: Vec<ConversationTurn>, mut clock: F) -> Conversation
where
    F: FnMut() -> DateTime<Utc>,
{
    let mut latest: Option<DateTime<Utc>> = None;
    let messages = turns
        .into_iter()
        .enumerate()
        .map(|(index, turn)| {
            let now = clock();
            let at = match latest {
                Some(prev) if prev > now => prev,
                _ => now,
            };
            latest = Some(at);
            Message::from_turn(index + 1, turn, at)
        })
        .collect();

    Conversation { messages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chatsim_core::CharacterInfo;
    use chrono::{Duration, TimeZone};

    use crate::providers::ChatMessage;

    /// Resolver that echoes characters back as known, or fails.
    struct FakeResolver {
        failure: Option<fn() -> ProviderError>,
        calls: Mutex<usize>,
    }

    impl FakeResolver {
        fn ok() -> Self {
            Self {
                failure: None,
                calls: Mutex::new(0),
            }
        }

        fn failing(failure: fn() -> ProviderError) -> Self {
            Self {
                failure: Some(failure),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl CharacterResolver for FakeResolver {
        async fn resolve_characters(
            &self,
            characters: &[Character],
            _language: Language,
        ) -> Result<Vec<CharacterInfo>, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            if let Some(failure) = self.failure {
                return Err(failure());
            }
            Ok(characters
                .iter()
                .map(|c| CharacterInfo {
                    name: c.name.clone(),
                    description: format!("about {}", c.name),
                    story: vec![],
                })
                .collect())
        }
    }

    /// Provider answering every completion with a fixed text.
    struct FakeProvider {
        kind: ProviderKind,
        reply: Result<String, u16>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn replying(kind: ProviderKind, reply: impl Into<String>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply: Ok(reply.into()),
                calls: Mutex::new(vec![]),
            })
        }

        fn failing(kind: ProviderKind, status: u16) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply: Err(status),
                calls: Mutex::new(vec![]),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl Provider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn model(&self) -> &str {
            "fake-model"
        }

        async fn complete(
            &self,
            _model: &str,
            messages: &[ChatMessage],
        ) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push(messages.last().map(|m| m.content.clone()).unwrap_or_default());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(ProviderError::UpstreamRequestFailed {
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn turns_json(count: usize) -> String {
        let turns: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "name": if i % 2 == 0 { "A" } else { "B" },
                    "content": format!("line {}", i + 1),
                })
            })
            .collect();
        format!("Here is the chat: {}", serde_json::Value::from(turns))
    }

    struct Fixture {
        resolver: Arc<FakeResolver>,
        primary: Arc<FakeProvider>,
        secondary: Arc<FakeProvider>,
        tertiary: Arc<FakeProvider>,
        orchestrator: Orchestrator,
    }

    fn fixture(resolver: FakeResolver, turns: usize, language: Language) -> Fixture {
        let resolver = Arc::new(resolver);
        let primary = FakeProvider::replying(ProviderKind::Primary, turns_json(turns));
        let secondary = FakeProvider::replying(ProviderKind::Secondary, turns_json(turns));
        let tertiary = FakeProvider::failing(ProviderKind::Tertiary, 503);

        let orchestrator = Orchestrator::new(
            resolver.clone(),
            ProviderSet {
                primary: primary.clone(),
                secondary: secondary.clone(),
                tertiary: tertiary.clone(),
            },
            GenerationSettings::default(),
            language,
        );

        Fixture {
            resolver,
            primary,
            secondary,
            tertiary,
            orchestrator,
        }
    }

    fn two_characters() -> Vec<Character> {
        vec![Character::new("A"), Character::new("B")]
    }

    #[tokio::test]
    async fn test_generate_annotates_every_turn() {
        let f = fixture(FakeResolver::ok(), 12, Language::En);

        let conversation = f
            .orchestrator
            .generate(&two_characters(), 10, ProviderKind::Primary)
            .await
            .unwrap();

        assert_eq!(conversation.len(), 12);
        assert_eq!(conversation.messages[0].id, "1");
        assert_eq!(conversation.messages[11].id, "12");
        assert_eq!(conversation.messages[11].content, "line 12");
        for (index, message) in conversation.messages.iter().enumerate() {
            assert_eq!(message.id, (index + 1).to_string());
        }
        for pair in conversation.messages.windows(2) {
            let a = DateTime::parse_from_rfc3339(&pair[0].timestamp).unwrap();
            let b = DateTime::parse_from_rfc3339(&pair[1].timestamp).unwrap();
            assert!(a <= b);
        }
    }

    #[tokio::test]
    async fn test_fewer_turns_than_rounds_are_trusted() {
        let f = fixture(FakeResolver::ok(), 3, Language::En);

        let conversation = f
            .orchestrator
            .generate(&two_characters(), 20, ProviderKind::Primary)
            .await
            .unwrap();

        assert_eq!(conversation.len(), 3);
    }

    #[tokio::test]
    async fn test_resolver_is_used_for_every_provider() {
        let f = fixture(FakeResolver::ok(), 4, Language::En);

        f.orchestrator
            .generate(&two_characters(), 10, ProviderKind::Secondary)
            .await
            .unwrap();

        assert_eq!(*f.resolver.calls.lock().unwrap(), 1);
        assert_eq!(f.secondary.call_count(), 1);
        assert_eq!(f.primary.call_count(), 0);

        let prompt = f.secondary.calls.lock().unwrap()[0].clone();
        assert!(prompt.contains("at least 10 turns"));
        assert!(prompt.contains("about B"));
    }

    #[tokio::test]
    async fn test_prompts_follow_configured_language() {
        let f = fixture(FakeResolver::ok(), 2, Language::Zh);

        f.orchestrator
            .generate(&two_characters(), 8, ProviderKind::Secondary)
            .await
            .unwrap();

        let prompt = f.secondary.calls.lock().unwrap()[0].clone();
        assert!(prompt.contains("不少于8轮"));
        assert!(prompt.contains("第2个人的信息是"));
    }

    #[tokio::test]
    async fn test_unknown_model_name_uses_primary() {
        let f = fixture(FakeResolver::ok(), 2, Language::En);

        let request = GenerateRequest {
            characters: two_characters(),
            rounds: Some(10),
            model: Some("unknown-provider".to_string()),
        };
        let conversation = f.orchestrator.handle(request).await.unwrap();

        assert_eq!(conversation.len(), 2);
        assert_eq!(f.primary.call_count(), 1);
        assert_eq!(f.secondary.call_count(), 0);
        assert_eq!(f.tertiary.call_count(), 0);
    }

    #[tokio::test]
    async fn test_character_not_found_message_is_preserved() {
        let f = fixture(
            FakeResolver::failing(|| ProviderError::CharacterNotFound {
                name: "Nobody".to_string(),
            }),
            2,
            Language::Zh,
        );

        let err = f
            .orchestrator
            .generate(&two_characters(), 10, ProviderKind::Primary)
            .await
            .unwrap_err();

        assert_eq!(
            err.user_message(),
            "没有找到Nobody这个人的信息，请换一个人试试"
        );
        assert!(matches!(
            err,
            GenerateError::GenerationFailed {
                source: ProviderError::CharacterNotFound { .. },
                ..
            }
        ));
        // The pipeline stops after the failed stage
        assert_eq!(f.primary.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_generic() {
        let f = fixture(FakeResolver::ok(), 2, Language::En);

        let err = f
            .orchestrator
            .generate(&two_characters(), 10, ProviderKind::Tertiary)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Failed to generate conversation");
        assert!(matches!(
            err,
            GenerateError::GenerationFailed {
                source: ProviderError::UpstreamRequestFailed { status: 503, .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_malformed_completion_is_generic() {
        let resolver = Arc::new(FakeResolver::ok());
        let broken = FakeProvider::replying(ProviderKind::Primary, "I'd rather not.");
        let orchestrator = Orchestrator::new(
            resolver,
            ProviderSet {
                primary: broken.clone(),
                secondary: broken.clone(),
                tertiary: broken,
            },
            GenerationSettings::default(),
            Language::Zh,
        );

        let err = orchestrator
            .generate(&two_characters(), 10, ProviderKind::Primary)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "生成对话失败");
        assert!(matches!(
            err,
            GenerateError::GenerationFailed {
                source: ProviderError::MalformedResponse(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_handle_validates_request() {
        let f = fixture(FakeResolver::ok(), 2, Language::En);

        let too_few = GenerateRequest {
            characters: vec![Character::new("A")],
            rounds: None,
            model: None,
        };
        let too_many = GenerateRequest {
            characters: ["A", "B", "C", "D", "E"].map(Character::new).to_vec(),
            rounds: None,
            model: None,
        };
        let blank_name = GenerateRequest {
            characters: vec![Character::new("A"), Character::new("  ")],
            rounds: None,
            model: None,
        };
        let zero_rounds = GenerateRequest {
            characters: two_characters(),
            rounds: Some(0),
            model: None,
        };

        for request in [too_few, too_many, blank_name, zero_rounds] {
            let err = f.orchestrator.handle(request).await.unwrap_err();
            assert!(matches!(err, GenerateError::InvalidRequest(_)));
        }
        assert_eq!(*f.resolver.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_handle_uses_default_rounds() {
        let f = fixture(FakeResolver::ok(), 2, Language::En);

        let request = GenerateRequest {
            characters: two_characters(),
            rounds: None,
            model: Some("secondary".to_string()),
        };
        f.orchestrator.handle(request).await.unwrap();

        let prompt = f.secondary.calls.lock().unwrap()[0].clone();
        assert!(prompt.contains("at least 10 turns"));
    }

    #[test]
    fn test_annotate_clamps_backwards_clock() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut ticks = vec![
            start,
            start - Duration::seconds(5),
            start + Duration::seconds(1),
        ]
        .into_iter();

        let turns = ["x", "y", "z"]
            .map(|c| ConversationTurn {
                name: "A".to_string(),
                content: c.to_string(),
            })
            .to_vec();
        let conversation = annotate(turns, || ticks.next().unwrap());

        assert_eq!(conversation.messages[0].timestamp, "2025-06-01T12:00:00.000Z");
        assert_eq!(conversation.messages[1].timestamp, "2025-06-01T12:00:00.000Z");
        assert_eq!(conversation.messages[2].timestamp, "2025-06-01T12:00:01.000Z");
        assert_eq!(conversation.messages[2].id, "3");
    }

    #[test]
    fn test_annotate_empty() {
        let conversation = annotate(vec![], Utc::now);
        assert!(conversation.is_empty());
    }
}
