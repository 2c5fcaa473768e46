//! The recipe card - the unit of output of the ingestion ladder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Card schema version emitted by this library.
pub const CARD_VERSION: &str = "1.0";

/// A structured recipe card produced from a single post URL.
///
/// Constructed empty at the start of a request and mutated in place as
/// ladder stages succeed. Nothing is mutated after the response is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCard {
    /// Card schema version
    pub version: String,

    /// Where this card came from
    pub source: CardSource,

    /// Recipe title (usually the post title)
    pub title: Option<String>,

    /// Post description or caption
    pub description: Option<String>,

    /// Representative image (thumbnail or og:image)
    pub image_url: Option<String>,

    pub prep_time_minutes: Option<u32>,
    pub cook_time_minutes: Option<u32>,
    pub total_time_minutes: Option<u32>,

    /// Yield as written ("4 servings", "12 cookies")
    pub servings: Option<String>,

    /// Cooking instructions, or a link-only marker when none were found
    pub instructions: Instructions,

    /// Extracted ingredients, in display order
    pub ingredients: Vec<Ingredient>,

    /// How this card was produced
    pub extraction: ExtractionMeta,
}

impl RecipeCard {
    /// Create an empty card for a request.
    pub fn new(url: impl Into<String>, platform: Platform) -> Self {
        Self {
            version: CARD_VERSION.to_string(),
            source: CardSource {
                url: url.into(),
                platform,
                creator: None,
            },
            title: None,
            description: None,
            image_url: None,
            prep_time_minutes: None,
            cook_time_minutes: None,
            total_time_minutes: None,
            servings: None,
            instructions: Instructions::link_only(),
            ingredients: Vec::new(),
            extraction: ExtractionMeta::empty(),
        }
    }

    /// Arithmetic mean of surviving ingredient confidences.
    ///
    /// Zero when the card has no ingredients; such a card must not be
    /// returned as a final success.
    pub fn mean_confidence(&self) -> f32 {
        if self.ingredients.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.ingredients.iter().map(|i| i.confidence).sum();
        sum / self.ingredients.len() as f32
    }

    /// Recompute `extraction.confidence` from the current ingredient list.
    pub fn recompute_confidence(&mut self) {
        self.extraction.confidence = self.mean_confidence();
    }

    /// Whether instruction steps were produced (as opposed to link-only).
    pub fn has_steps(&self) -> bool {
        self.instructions.kind == InstructionsKind::Steps && !self.instructions.steps.is_empty()
    }

    /// Assign `sort_order` by current position.
    pub fn assign_sort_order(&mut self) {
        for (i, ingredient) in self.ingredients.iter_mut().enumerate() {
            ingredient.sort_order = i as u32;
        }
    }
}

/// Source attribution for a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSource {
    /// Normalized post URL
    pub url: String,

    pub platform: Platform,

    /// Post creator, when metadata acquisition found one
    pub creator: Option<Creator>,
}

/// Creator identity as reported by the source platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Creator {
    pub handle: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

/// Cooking instructions for a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructions {
    #[serde(rename = "type")]
    pub kind: InstructionsKind,

    /// Ordered steps; empty for link-only cards
    #[serde(default)]
    pub steps: Vec<InstructionStep>,
}

impl Instructions {
    /// No usable instructions were extracted; the client links to the post.
    pub fn link_only() -> Self {
        Self {
            kind: InstructionsKind::LinkOnly,
            steps: Vec::new(),
        }
    }

    /// Build step instructions from plain text lines.
    pub fn from_steps(steps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            kind: InstructionsKind::Steps,
            steps: steps
                .into_iter()
                .map(|s| InstructionStep { text: s.into() })
                .collect(),
        }
    }

    /// Total character length of all step text.
    pub fn text_len(&self) -> usize {
        self.steps.iter().map(|s| s.text.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionsKind {
    /// No instructions extracted; client shows a link to the source post
    LinkOnly,
    /// Ordered instruction steps
    Steps,
}

/// A single instruction step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionStep {
    pub text: String,
}

/// One extracted ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Name as extracted from the source
    pub name: String,

    /// Lowercased, punctuation-stripped name used for dedup and matching
    pub normalized_name: String,

    /// Canonical catalog entry, set during finalization
    pub canonical_item_id: Option<String>,

    pub amount: Option<f32>,
    pub unit: Option<String>,

    /// Preparation note ("minced", "room temperature")
    pub preparation: Option<String>,

    /// Extraction confidence in [0, 1]
    pub confidence: f32,

    pub provenance: Provenance,

    /// Display position within the card
    pub sort_order: u32,

    #[serde(default)]
    pub is_optional: bool,

    /// Literal substring of source text supporting this ingredient.
    /// Required for model-derived ingredients.
    pub evidence_phrase: Option<String>,

    /// Which acquisition stage supplied the text or frames
    pub evidence_source: Option<EvidenceSource>,

    /// Score of the harvested comment this ingredient came from
    pub comment_score: Option<i32>,
}

impl Ingredient {
    /// Create an ingredient with derived `normalized_name` and defaults.
    pub fn new(name: impl Into<String>, provenance: Provenance) -> Self {
        let name = name.into();
        Self {
            normalized_name: normalize_ingredient_name(&name),
            name,
            canonical_item_id: None,
            amount: None,
            unit: None,
            preparation: None,
            confidence: 1.0,
            provenance,
            sort_order: 0,
            is_optional: false,
            evidence_phrase: None,
            evidence_source: None,
            comment_score: None,
        }
    }

    pub fn with_amount(mut self, amount: f32, unit: Option<String>) -> Self {
        self.amount = Some(amount);
        self.unit = unit;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_evidence(
        mut self,
        phrase: impl Into<String>,
        source: EvidenceSource,
    ) -> Self {
        self.evidence_phrase = Some(phrase.into());
        self.evidence_source = Some(source);
        self
    }
}

/// How an ingredient entered the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Machine-readable markup authored by the creator (schema.org)
    CreatorStructured,
    /// Proposed by a model and validated against source evidence
    DetectedByModel,
    /// Extracted from a harvested comment
    CommentSourced,
}

/// Which acquisition stage supplied the evidence for an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    Description,
    Comments,
    Transcript,
    Vision,
    Asr,
    PageMarkup,
    BlogPage,
}

/// Extraction method recorded on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Machine-readable recipe markup read directly from the page
    SchemaOrg,
    /// Language model over description/transcript text
    LlmText,
    /// Language model over a harvested comment
    CommentText,
    /// Vision model over video content
    Vision,
    /// Vision cross-validated with transcript and ASR
    VisionAsr,
    /// Followed an outbound link to a full recipe page
    BlogLink,
    /// Nothing extracted; card carries metadata only
    MetadataOnly,
}

/// Metadata about how a card was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMeta {
    pub method: ExtractionMethod,

    /// Mean of surviving ingredient confidences, in [0, 1]
    pub confidence: f32,

    /// Version tag of the extractor that produced this card
    pub extractor_version: String,

    pub extracted_at: DateTime<Utc>,

    /// Total spend for this card in minor currency units
    pub cost_cents: u32,

    /// Primary evidence source for the ingredient list
    pub evidence_source: Option<EvidenceSource>,

    /// All acquisition stages that contributed content
    #[serde(default)]
    pub sources: Vec<EvidenceSource>,

    /// Cross-source amount/unit disagreements, retained rather than
    /// silently resolved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<IngredientConflict>,
}

impl ExtractionMeta {
    /// Placeholder metadata for a card no stage has touched yet.
    pub fn empty() -> Self {
        Self {
            method: ExtractionMethod::MetadataOnly,
            confidence: 0.0,
            extractor_version: String::new(),
            extracted_at: Utc::now(),
            cost_cents: 0,
            evidence_source: None,
            sources: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// Record a contributing evidence source exactly once.
    pub fn add_source(&mut self, source: EvidenceSource) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }
}

/// Two sources disagreeing about the same ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientConflict {
    pub normalized_name: String,
    pub claims: Vec<ConflictClaim>,
}

/// One side of an ingredient conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictClaim {
    pub source: EvidenceSource,
    pub amount: Option<f32>,
    pub unit: Option<String>,
}

/// Normalize an ingredient name for dedup and catalog matching:
/// lowercase, punctuation stripped, whitespace collapsed.
pub fn normalize_ingredient_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_space = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ingredient_name() {
        assert_eq!(normalize_ingredient_name("Extra-Virgin Olive Oil"), "extra virgin olive oil");
        assert_eq!(normalize_ingredient_name("  Garlic,  minced "), "garlic minced");
        assert_eq!(normalize_ingredient_name("EGGS"), "eggs");
    }

    #[test]
    fn test_mean_confidence_empty_is_zero() {
        let card = RecipeCard::new("https://example.com", Platform::Web);
        assert_eq!(card.mean_confidence(), 0.0);
    }

    #[test]
    fn test_mean_confidence() {
        let mut card = RecipeCard::new("https://example.com", Platform::Web);
        card.ingredients.push(
            Ingredient::new("flour", Provenance::DetectedByModel).with_confidence(0.8),
        );
        card.ingredients.push(
            Ingredient::new("sugar", Provenance::DetectedByModel).with_confidence(0.6),
        );
        card.recompute_confidence();
        assert!((card.extraction.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_instructions_serde_tag() {
        let json = serde_json::to_value(Instructions::link_only()).unwrap();
        assert_eq!(json["type"], "link_only");

        let json = serde_json::to_value(Instructions::from_steps(["Mix.", "Bake."])).unwrap();
        assert_eq!(json["type"], "steps");
        assert_eq!(json["steps"][1]["text"], "Bake.");
    }

    #[test]
    fn test_assign_sort_order() {
        let mut card = RecipeCard::new("https://example.com", Platform::Web);
        card.ingredients = vec![
            Ingredient::new("a", Provenance::DetectedByModel),
            Ingredient::new("b", Provenance::DetectedByModel),
        ];
        card.assign_sort_order();
        assert_eq!(card.ingredients[0].sort_order, 0);
        assert_eq!(card.ingredients[1].sort_order, 1);
    }
}
