use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domain::{
    ports::{ChatCompletionClient, ClientFactory, ConfigSource},
    ChatError, ChatRequest, Credential, InitError, PersonaPrompt, Result,
};

pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_CREDENTIAL_KEY: &str = "OPEN_API_KEY";

/// Everything a [`ChatService`] is built from besides the credential itself.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub persona: PersonaPrompt,
    pub model: String,
    pub credential_key: String,
}

impl ChatSettings {
    pub fn new(persona: PersonaPrompt) -> Self {
        Self {
            persona,
            model: DEFAULT_MODEL.to_string(),
            credential_key: DEFAULT_CREDENTIAL_KEY.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = key.into();
        self
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::new(PersonaPrompt::rapbot())
    }
}

pub struct ChatService {
    client: Arc<dyn ChatCompletionClient>,
    persona: PersonaPrompt,
    model: String,
}

impl ChatService {
    /// Validates `provided` against the expected key in `config`, then connects.
    ///
    /// Checks run in order and the first failure wins: expected key present,
    /// candidate present, candidate equal to expected.
    #[instrument(
        skip_all,
        fields(persona = %settings.persona.name(), key = %settings.credential_key)
    )]
    pub fn construct(
        settings: ChatSettings,
        config: &dyn ConfigSource,
        provided: Option<&str>,
        factory: &dyn ClientFactory,
    ) -> std::result::Result<Self, InitError> {
        let expected = config
            .get(&settings.credential_key)
            .map(Credential::new)
            .ok_or_else(|| ChatError::env_not_set(&settings.credential_key))?;

        let provided = provided.ok_or(ChatError::MissingApiKey)?;

        if !expected.matches(provided) {
            warn!("provided API key does not match configuration");
            return Err(ChatError::InvalidApiKey);
        }

        let client = factory.connect(&Credential::new(provided))?;
        debug!(model = %settings.model, "chat service ready");

        Ok(Self {
            client,
            persona: settings.persona,
            model: settings.model,
        })
    }

    /// Sends the persona instruction and `text` verbatim and returns the first choice's content.
    ///
    /// Empty `text` is sent as-is.
    #[instrument(
        skip(self, text),
        fields(persona = %self.persona.name(), model = %self.model, len = text.len())
    )]
    pub async fn respond(&self, text: &str) -> Result<String> {
        let request = ChatRequest::for_persona(&self.model, &self.persona, text);

        let completion = self.client.complete(&request).await.map_err(|e| {
            warn!(error = %e, "chat completion failed");
            ChatError::from(e)
        })?;

        completion
            .into_first_content()
            .ok_or(ChatError::NoResponseContent)
    }

    pub fn persona(&self) -> &PersonaPrompt {
        &self.persona
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("persona", &self.persona.name())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatCompletion, ChatRole, Choice, UpstreamError};
    use crate::infrastructure::config::MapConfigSource;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    type Reply = fn(&ChatRequest) -> std::result::Result<ChatCompletion, UpstreamError>;

    struct ScriptedClient {
        reply: Reply,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatCompletionClient for ScriptedClient {
        async fn complete(
            &self,
            request: &ChatRequest,
        ) -> std::result::Result<ChatCompletion, UpstreamError> {
            self.seen.lock().unwrap().push(request.clone());
            (self.reply)(request)
        }
    }

    struct StubFactory {
        client: Arc<ScriptedClient>,
        tokens: Mutex<Vec<String>>,
    }

    impl StubFactory {
        fn new(client: Arc<ScriptedClient>) -> Self {
            Self {
                client,
                tokens: Mutex::new(Vec::new()),
            }
        }
    }

    impl ClientFactory for StubFactory {
        fn connect(
            &self,
            credential: &Credential,
        ) -> std::result::Result<Arc<dyn ChatCompletionClient>, ChatError> {
            self.tokens.lock().unwrap().push(credential.expose().to_string());
            Ok(self.client.clone())
        }
    }

    fn yo(_: &ChatRequest) -> std::result::Result<ChatCompletion, UpstreamError> {
        Ok(ChatCompletion::with_reply("Yo yo yo!"))
    }

    fn echo(request: &ChatRequest) -> std::result::Result<ChatCompletion, UpstreamError> {
        Ok(ChatCompletion::with_reply(request.user_message().unwrap_or_default()))
    }

    fn no_choices(_: &ChatRequest) -> std::result::Result<ChatCompletion, UpstreamError> {
        Ok(ChatCompletion::default())
    }

    fn empty_choice(_: &ChatRequest) -> std::result::Result<ChatCompletion, UpstreamError> {
        Ok(ChatCompletion::new(vec![Choice::empty()]))
    }

    fn unreachable_host(_: &ChatRequest) -> std::result::Result<ChatCompletion, UpstreamError> {
        Err(UpstreamError::msg("error sending request: connection refused"))
    }

    fn config_with(key: &str) -> MapConfigSource {
        MapConfigSource::default().with(DEFAULT_CREDENTIAL_KEY, key)
    }

    fn service(reply: Reply) -> (ChatService, Arc<ScriptedClient>) {
        let client = ScriptedClient::new(reply);
        let factory = StubFactory::new(client.clone());
        let service = ChatService::construct(
            ChatSettings::default(),
            &config_with("abc"),
            Some("abc"),
            &factory,
        )
        .unwrap();
        (service, client)
    }

    #[test]
    fn test_construct_without_expected_key() {
        let factory = StubFactory::new(ScriptedClient::new(yo));
        let err = ChatService::construct(
            ChatSettings::default(),
            &MapConfigSource::default(),
            Some("anything"),
            &factory,
        )
        .unwrap_err();

        assert!(
            matches!(err, ChatError::EnvironmentVariableNotSet { ref key } if key == "OPEN_API_KEY")
        );
        assert!(factory.tokens.lock().unwrap().is_empty());
    }

    #[test]
    fn test_construct_env_check_comes_first() {
        let factory = StubFactory::new(ScriptedClient::new(yo));
        let err = ChatService::construct(
            ChatSettings::default(),
            &MapConfigSource::default(),
            None,
            &factory,
        )
        .unwrap_err();
        assert!(matches!(err, ChatError::EnvironmentVariableNotSet { .. }));
    }

    #[test]
    fn test_construct_missing_candidate() {
        let factory = StubFactory::new(ScriptedClient::new(yo));
        let err =
            ChatService::construct(ChatSettings::default(), &config_with("abc"), None, &factory)
                .unwrap_err();
        assert!(matches!(err, ChatError::MissingApiKey));
    }

    #[test]
    fn test_construct_mismatched_candidate() {
        let factory = StubFactory::new(ScriptedClient::new(yo));
        for candidate in ["xyz", "ABC", "abc ", ""] {
            let err = ChatService::construct(
                ChatSettings::default(),
                &config_with("abc"),
                Some(candidate),
                &factory,
            )
            .unwrap_err();
            assert!(matches!(err, ChatError::InvalidApiKey), "candidate {candidate:?}");
        }
        assert!(factory.tokens.lock().unwrap().is_empty());
    }

    #[test]
    fn test_construct_outcome_for_every_key_combination() {
        let expected_keys = [None, Some("abc"), Some("")];
        let candidates = [None, Some("abc"), Some("xyz"), Some("ABC"), Some("")];

        for expected in expected_keys {
            for candidate in candidates {
                let mut config = MapConfigSource::default();
                if let Some(key) = expected {
                    config = config.with(DEFAULT_CREDENTIAL_KEY, key);
                }
                let factory = StubFactory::new(ScriptedClient::new(yo));

                let outcome =
                    ChatService::construct(ChatSettings::default(), &config, candidate, &factory)
                        .map(|_| ())
                        .map_err(|e| e.kind());

                let want = match (expected, candidate) {
                    (None, _) => Err("environment_variable_not_set"),
                    (Some(_), None) => Err("missing_api_key"),
                    (Some(e), Some(c)) if e == c => Ok(()),
                    (Some(_), Some(_)) => Err("invalid_api_key"),
                };

                assert_eq!(outcome, want, "expected {expected:?}, candidate {candidate:?}");

                let connected = factory.tokens.lock().unwrap().clone();
                match want {
                    Ok(()) => assert_eq!(connected, vec![candidate.unwrap().to_string()]),
                    Err(_) => assert!(connected.is_empty()),
                }
            }
        }
    }

    #[test]
    fn test_construct_uses_custom_key_and_passes_token() {
        let factory = StubFactory::new(ScriptedClient::new(yo));
        let config = MapConfigSource::default().with("OTHER_KEY", "s3cret");
        let settings = ChatSettings::default()
            .with_credential_key("OTHER_KEY")
            .with_model("gpt-4o");

        let service = ChatService::construct(settings, &config, Some("s3cret"), &factory).unwrap();

        assert_eq!(service.model(), "gpt-4o");
        assert_eq!(*factory.tokens.lock().unwrap(), vec!["s3cret".to_string()]);
    }

    #[tokio::test]
    async fn test_respond_returns_first_choice() {
        let (service, _) = service(yo);
        assert_eq!(service.respond("hi").await.unwrap(), "Yo yo yo!");
    }

    #[tokio::test]
    async fn test_respond_does_not_modify_reply() {
        let (service, _) = service(echo);
        let reply = service.respond("  spaced out \n").await.unwrap();
        assert_eq!(reply, "  spaced out \n");
    }

    #[tokio::test]
    async fn test_respond_without_choices() {
        let (service, _) = service(no_choices);
        let err = service.respond("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::NoResponseContent));
    }

    #[tokio::test]
    async fn test_respond_with_empty_choice() {
        let (service, _) = service(empty_choice);
        let err = service.respond("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::NoResponseContent));
    }

    #[tokio::test]
    async fn test_respond_surfaces_transport_error_message() {
        let (service, _) = service(unreachable_host);
        let err = service.respond("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Upstream(_)));
        assert_eq!(err.to_string(), "error sending request: connection refused");
    }

    #[tokio::test]
    async fn test_request_shape() {
        let (service, client) = service(yo);
        service.respond("drop a verse").await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[0].content, PersonaPrompt::rapbot().prompt());
        assert_eq!(request.messages[1].role, ChatRole::User);
        assert_eq!(request.messages[1].content, "drop a verse");
    }

    #[tokio::test]
    async fn test_empty_input_is_still_sent() {
        let (service, client) = service(yo);
        assert_eq!(service.respond("").await.unwrap(), "Yo yo yo!");
        assert_eq!(client.requests()[0].user_message(), Some(""));
    }

    #[tokio::test]
    async fn test_overlapping_calls_resolve_independently() {
        struct SlowClient;

        #[async_trait]
        impl ChatCompletionClient for SlowClient {
            async fn complete(
                &self,
                request: &ChatRequest,
            ) -> std::result::Result<ChatCompletion, UpstreamError> {
                match request.user_message() {
                    Some("fail") => {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Err(UpstreamError::msg("status 500"))
                    }
                    Some(text) => {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(ChatCompletion::with_reply(format!("re: {text}")))
                    }
                    None => Ok(ChatCompletion::default()),
                }
            }
        }

        struct SlowFactory;

        impl ClientFactory for SlowFactory {
            fn connect(
                &self,
                _: &Credential,
            ) -> std::result::Result<Arc<dyn ChatCompletionClient>, ChatError> {
                Ok(Arc::new(SlowClient))
            }
        }

        let service = ChatService::construct(
            ChatSettings::default(),
            &config_with("abc"),
            Some("abc"),
            &SlowFactory,
        )
        .unwrap();

        let (ok, failed) = futures::join!(service.respond("hello"), service.respond("fail"));

        assert_eq!(ok.unwrap(), "re: hello");
        assert_eq!(failed.unwrap_err().to_string(), "status 500");
    }
}
