use std::sync::Arc;

use rand::Rng;
use roast_llm::{LLMClient, LLMProvider, LLMService};
use serde::Serialize;

use crate::{
    config::OpenAIConfig,
    content_filter,
    error::ApiError,
    prompts::roast_prompt::{RoastPrompt, RoastTier, Tone},
};

const EMPTY_COMPLETION_TEXT: &str = "Probeer opnieuw.";
pub const FREE_FALLBACK_NOTE: &str = "offline fallback (geen OpenAI key)";
pub const PREMIUM_FALLBACK_NOTE: &str = "offline fallback";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoastResponse {
    pub roast: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn fallback_roasts(target: &str) -> [String; 3] {
    [
        format!("{target} lijkt op een update die altijd op het slechtste moment verschijnt."),
        format!("{target} is zo traag dat buffering medelijden krijgt."),
        format!("{target} heeft meer excuses dan een slechte Wi‑Fi verbinding."),
    ]
}

pub fn premium_fallback_roast(target: &str) -> String {
    format!("Premium demo: {target} is zo uniek dat zelfs autocorrect het niet begrijpt.")
}

/// Rejects blank targets and runs the rest through the content filter. The
/// target is returned as sent; whitespace only matters for the blank check.
pub fn validate_target(target: &str) -> Result<&str, ApiError> {
    if target.trim().is_empty() {
        return Err(ApiError::MissingTarget);
    }

    let check = content_filter::check(target);
    if check.blocked {
        tracing::info!("Rejected target ({:?})", check.reason);
        return Err(ApiError::TargetBlocked);
    }

    Ok(target)
}

#[derive(Clone)]
pub struct RoastService {
    llm: Option<Arc<dyn LLMService + Send + Sync>>,
}

impl RoastService {
    pub fn new(llm: Option<Arc<dyn LLMService + Send + Sync>>) -> Self {
        Self { llm }
    }

    pub fn from_config(config: &OpenAIConfig) -> Self {
        let llm = config.api_key.clone().map(|api_key| {
            let client = LLMClient::new(
                LLMProvider::OpenAI {
                    api_key,
                    model: config.model.clone(),
                },
                Some(config.client_config()),
            );
            Arc::new(client) as Arc<dyn LLMService + Send + Sync>
        });

        Self::new(llm)
    }

    pub fn is_offline(&self) -> bool {
        self.llm.is_none()
    }

    /// Expects a target that already passed [`validate_target`].
    pub async fn generate(
        &self,
        tier: RoastTier,
        target: &str,
        tone: Tone,
    ) -> Result<RoastResponse, ApiError> {
        let Some(llm) = &self.llm else {
            return Ok(Self::fallback(tier, target));
        };

        let request = RoastPrompt::get_request(tier, target, tone);
        let text = llm.execute_prompt(&request).await.map_err(|e| {
            tracing::error!("Error generating {:?} roast: {:#}", tier, e);
            ApiError::Generation(match tier {
                RoastTier::Free => "Er ging iets mis bij het genereren.",
                RoastTier::Premium => "Fout bij premium generatie.",
            })
        })?;

        let text = if text.is_empty() {
            EMPTY_COMPLETION_TEXT.to_string()
        } else {
            text
        };

        let check = content_filter::check(&text);
        if check.blocked {
            tracing::warn!("Generated {:?} roast blocked ({:?})", tier, check.reason);
            return Err(ApiError::OutputBlocked(match tier {
                RoastTier::Free => "Gegenereerde tekst werd geblokkeerd door veiligheidssysteem.",
                RoastTier::Premium => "Gegenereerde tekst werd geblokkeerd.",
            }));
        }

        Ok(RoastResponse {
            roast: text,
            note: None,
        })
    }

    fn fallback(tier: RoastTier, target: &str) -> RoastResponse {
        match tier {
            RoastTier::Free => {
                let options = fallback_roasts(target);
                let index = rand::rng().random_range(0..options.len());
                RoastResponse {
                    roast: options[index].clone(),
                    note: Some(FREE_FALLBACK_NOTE.to_string()),
                }
            }
            RoastTier::Premium => RoastResponse {
                roast: premium_fallback_roast(target),
                note: Some(PREMIUM_FALLBACK_NOTE.to_string()),
            },
        }
    }
}
