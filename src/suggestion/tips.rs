//! Local, deterministic conversation tips.

use async_trait::async_trait;

use super::{Speaker, SuggestionContext, SuggestionError, SuggestionGenerator};

/// Builds tips from shared interests and the shape of the transcript.
/// Used as the fallback when the AI generator is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterestTips;

impl InterestTips {
    /// Produces a tip synchronously; never fails.
    #[must_use]
    pub fn tip(context: &SuggestionContext) -> String {
        let name = if context.their_name.trim().is_empty() {
            "them"
        } else {
            context.their_name.trim()
        };

        match context.recent.last() {
            None => {
                if let Some(shared) = context.shared_interests.first() {
                    format!("You both like {shared}. Ask {name} how they got into it.")
                } else if let Some(interest) = context.their_interests.first() {
                    format!("{name} is into {interest}. Ask what they love about it.")
                } else if context.their_bio.as_deref().is_some_and(|b| !b.trim().is_empty()) {
                    format!("Pick something from {name}'s bio and ask a follow-up question.")
                } else {
                    format!("Say hi to {name} and ask how their week is going.")
                }
            }
            Some(last) if last.speaker == Speaker::Them && last.text.trim_end().ends_with('?') => {
                format!("{name} asked you a question. Answer it, then ask one back.")
            }
            Some(last) if last.speaker == Speaker::Me => {
                format!("Give {name} a moment to reply before sending more.")
            }
            Some(_) => match context.shared_interests.first() {
                Some(shared) => format!("Keep it going: bring up {shared}, you both enjoy it."),
                None => format!("Ask {name} an open question about their plans this weekend."),
            },
        }
    }
}

#[async_trait]
impl SuggestionGenerator for InterestTips {
    async fn generate(&self, context: &SuggestionContext) -> Result<String, SuggestionError> {
        Ok(Self::tip(context))
    }
}
