use std::fmt;

use roast_llm::CompletionRequest;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoastTier {
    Free,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Speels,
    Scherp,
    Absurd,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tone::Speels => "speels",
            Tone::Scherp => "scherp",
            Tone::Absurd => "absurd",
        };
        write!(f, "{}", label)
    }
}

pub struct RoastPrompt;

impl RoastPrompt {
    pub fn get_system_prompt(tier: RoastTier) -> &'static str {
        match tier {
            RoastTier::Free => "You are a witty comedian that creates short, humorous roasts that are sharp but not hateful or violent.",
            RoastTier::Premium => "You are a top-tier comedy writer producing viral, concise roasts suitable for social media.",
        }
    }

    /// (max tokens, temperature)
    pub fn get_sampling(tier: RoastTier) -> (u32, f32) {
        match tier {
            RoastTier::Free => (120, 0.85),
            RoastTier::Premium => (220, 0.95),
        }
    }

    pub fn get_prompt(tier: RoastTier, target: &str, tone: Tone) -> String {
        match tier {
            RoastTier::Free => format!(
                r#"Je taak: schrijf een humoristische roast van 1-3 korte zinnen gericht op de volgende target.
Regels:
- Geen aanvallen op beschermde groepen (ras, religie, gender, seksuele geaardheid, handicap, nationaliteit).
- Geen oproep tot geweld of bedreigingen.
- Max 280 tekens.
- Tone: {tone}.
Target: "{target}"
Schrijf enkel de roast."#
            ),
            RoastTier::Premium => format!(
                r#"Je taak: schrijf een zeer scherpe, creatieve en virale roast van 1-4 zinnen.
Regels:
- Geen aanvallen op beschermde groepen.
- Geen oproep tot geweld of bedreigingen.
- Max 400 tekens.
- Gebruik humor, pop-culture referenties en korte punchlines.
- Maak het geschikt om als TikTok caption of viral tweet te delen.
Tone: {tone}.
Target: "{target}"
Schrijf enkel de roast, klaar voor social sharing."#
            ),
        }
    }

    pub fn get_request(tier: RoastTier, target: &str, tone: Tone) -> CompletionRequest {
        let (max_tokens, temperature) = Self::get_sampling(tier);

        CompletionRequest {
            system_prompt: Self::get_system_prompt(tier).to_string(),
            prompt: Self::get_prompt(tier, target, tone),
            max_tokens,
            temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_request_uses_short_budget() {
        let request = RoastPrompt::get_request(RoastTier::Free, "mijn laptop", Tone::Scherp);

        assert_eq!(request.max_tokens, 120);
        assert_eq!(request.temperature, 0.85);
        assert!(request.prompt.contains("Target: \"mijn laptop\""));
        assert!(request.prompt.contains("Tone: scherp."));
        assert!(request.prompt.contains("Max 280 tekens."));
    }

    #[test]
    fn premium_request_asks_for_viral_output() {
        let request = RoastPrompt::get_request(RoastTier::Premium, "maandag", Tone::Absurd);

        assert_eq!(request.max_tokens, 220);
        assert_eq!(request.temperature, 0.95);
        assert!(request.prompt.contains("TikTok caption"));
        assert!(request.prompt.contains("Max 400 tekens."));
        assert!(request.system_prompt.contains("viral"));
    }

    #[test]
    fn tone_labels_deserialize_lowercase() {
        let tone: Tone = serde_json::from_str("\"scherp\"").unwrap();
        assert_eq!(tone, Tone::Scherp);
        assert!(serde_json::from_str::<Tone>("\"boos\"").is_err());
    }
}
