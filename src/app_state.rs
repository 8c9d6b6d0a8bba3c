//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::{EnginePolicy, GatewayConfig};
use crate::domain::{ConversationStore, EventBus, SwipeLedger, UserDirectory};
use crate::moderation::{AllowAllModerator, ContentFilter, ContentModerator, HttpModerator};
use crate::service::{
    ChatService, MatchEngine, ModerationGate, ProfileService, StrikeLedger, SuggestionService,
    SwipeService,
};
use crate::suggestion::{HttpSuggester, InterestTips, SuggestionGenerator};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registration, profiles and the discovery deck.
    pub profile_service: Arc<ProfileService>,
    /// Swipe admission and matching.
    pub swipe_service: Arc<SwipeService>,
    /// Conversation reads, read receipts and deletions.
    pub chat_service: Arc<ChatService>,
    /// Outgoing message moderation.
    pub moderation_gate: Arc<ModerationGate>,
    /// Strike counts and bans.
    pub strike_ledger: Arc<StrikeLedger>,
    /// Conversation tips.
    pub suggestion_service: Arc<SuggestionService>,
    /// Event bus for WebSocket subscriptions and the event log.
    pub event_bus: EventBus,
    /// Effective policy, reported by `/config/policy`.
    pub policy: Arc<EnginePolicy>,
}

impl AppState {
    /// Wires the stores and services around the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns the regex error if a banned-content pattern does not compile.
    pub fn new(
        policy: EnginePolicy,
        event_bus: EventBus,
        moderator: Arc<dyn ContentModerator>,
        generator: Arc<dyn SuggestionGenerator>,
    ) -> Result<Self, regex::Error> {
        let filter = ContentFilter::new(&policy.banned_patterns)?;

        let directory = Arc::new(UserDirectory::new());
        let conversations = Arc::new(ConversationStore::new(policy.max_message_chars));
        let match_engine = Arc::new(MatchEngine::new(
            Arc::clone(&directory),
            Arc::clone(&conversations),
            event_bus.clone(),
        ));

        let swipe_service = SwipeService::new(
            Arc::clone(&directory),
            Arc::new(SwipeLedger::new()),
            match_engine,
            event_bus.clone(),
            policy.swipe_cooldown,
        );
        let profile_service = ProfileService::new(
            Arc::clone(&directory),
            swipe_service.clone(),
            event_bus.clone(),
        );
        let chat_service = ChatService::new(
            Arc::clone(&conversations),
            Arc::clone(&directory),
            event_bus.clone(),
        );
        let strike_ledger = StrikeLedger::new(
            Arc::clone(&directory),
            event_bus.clone(),
            policy.ban_threshold,
        );
        let moderation_gate = ModerationGate::new(
            Arc::clone(&directory),
            chat_service.clone(),
            strike_ledger.clone(),
            moderator,
            filter,
            event_bus.clone(),
            policy.moderation_timeout,
        );
        let suggestion_service = SuggestionService::new(
            generator,
            chat_service.clone(),
            directory,
            policy.suggestion_timeout,
        );

        Ok(Self {
            profile_service: Arc::new(profile_service),
            swipe_service: Arc::new(swipe_service),
            chat_service: Arc::new(chat_service),
            moderation_gate: Arc::new(moderation_gate),
            strike_ledger: Arc::new(strike_ledger),
            suggestion_service: Arc::new(suggestion_service),
            event_bus,
            policy: Arc::new(policy),
        })
    }

    /// Builds the state from configuration, choosing HTTP collaborators
    /// when their URLs are set and local fallbacks otherwise.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built or a pattern is invalid.
    pub fn from_config(config: &GatewayConfig, event_bus: EventBus) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;

        let moderator: Arc<dyn ContentModerator> = match &config.moderation_url {
            Some(url) => {
                tracing::info!(url, "using external content moderation");
                Arc::new(HttpModerator::new(client.clone(), url.clone()))
            }
            None => {
                tracing::warn!("MODERATION_URL not set; only the pattern pre-check applies");
                Arc::new(AllowAllModerator)
            }
        };

        let generator: Arc<dyn SuggestionGenerator> = match &config.suggestion_url {
            Some(url) => {
                tracing::info!(url, "using external suggestion generator");
                Arc::new(HttpSuggester::new(client, url.clone()))
            }
            None => Arc::new(InterestTips),
        };

        Ok(Self::new(
            config.policy.clone(),
            event_bus,
            moderator,
            generator,
        )?)
    }
}
