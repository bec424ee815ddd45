use serde::{Deserialize, Serialize};

pub const MIN_WEIGHT: f64 = 0.2;
pub const MAX_WEIGHT: f64 = 2.0;
pub const DEFAULT_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Subject,
    Scene,
    Style,
    Composition,
    Lighting,
    Camera,
    Mood,
    Materials,
    Color,
    PostProcess,
    /// Never rendered into the positive prompt.
    Negative,
}

/// Target image model. Each one picks a weight syntax and a trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetModel {
    #[default]
    Midjourney,
    Sdxl,
    Flux,
    Dalle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightSyntax {
    /// `(text:1.3)`
    Numeric,
    /// No native syntax; emphasis by repeating the fragment.
    Repetition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailer {
    /// `--ar 16:9 --s 250 ...`
    CliModifiers,
    /// `\n\nNegative prompt: ...`
    NegativePrompt,
    /// Plain sentence-style prompt.
    None,
}

impl TargetModel {
    pub fn weight_syntax(self) -> WeightSyntax {
        match self {
            TargetModel::Sdxl | TargetModel::Flux => WeightSyntax::Numeric,
            TargetModel::Midjourney | TargetModel::Dalle => WeightSyntax::Repetition,
        }
    }

    pub fn trailer(self) -> Trailer {
        match self {
            TargetModel::Midjourney => Trailer::CliModifiers,
            TargetModel::Sdxl | TargetModel::Flux => Trailer::NegativePrompt,
            TargetModel::Dalle => Trailer::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptFragment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, alias = "value")]
    pub text: String,
    pub category: Category,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

impl PromptFragment {
    /// `None` when the weight is neutral (1) or unusable, meaning the text
    /// renders unchanged.
    pub fn emphasis(&self) -> Option<f64> {
        let w = self.weight;
        if !w.is_finite() || w <= 0.0 || (w - DEFAULT_WEIGHT).abs() < f64::EPSILON {
            None
        } else {
            Some(w)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylize: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

/// The unit of save/load. Fragment order is render order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptDocument {
    #[serde(default)]
    pub subject: String,
    #[serde(default, alias = "blocks")]
    pub fragments: Vec<PromptFragment>,
    #[serde(default)]
    pub negative: String,
    #[serde(default)]
    pub model: TargetModel,
    #[serde(default)]
    pub params: RenderParams,
}

impl PromptDocument {
    pub fn has_category(&self, category: Category) -> bool {
        self.fragments.iter().any(|f| f.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_take_defaults() {
        let doc: PromptDocument = serde_json::from_value(json!({})).unwrap();
        assert_eq!(doc, PromptDocument::default());
        assert_eq!(doc.model, TargetModel::Midjourney);
    }

    #[test]
    fn test_fragment_weight_defaults_to_one() {
        let f: PromptFragment =
            serde_json::from_value(json!({"text": "fog", "category": "scene"})).unwrap();
        assert_eq!(f.weight, 1.0);
        assert_eq!(f.emphasis(), None);
    }

    #[test]
    fn test_value_and_blocks_aliases() {
        let doc: PromptDocument = serde_json::from_value(json!({
            "subject": "a volcano",
            "blocks": [{"id": "b1", "label": "Fog", "value": "dense fog", "category": "scene"}],
            "model": "sdxl"
        }))
        .unwrap();
        assert_eq!(doc.fragments.len(), 1);
        assert_eq!(doc.fragments[0].text, "dense fog");
        assert_eq!(doc.model, TargetModel::Sdxl);
    }

    #[test]
    fn test_unusable_weights_are_neutral() {
        let mut f = PromptFragment {
            id: "x".into(),
            label: "x".into(),
            text: "x".into(),
            category: Category::Style,
            weight: 0.0,
        };
        assert_eq!(f.emphasis(), None);
        f.weight = f64::NAN;
        assert_eq!(f.emphasis(), None);
        f.weight = 1.2;
        assert_eq!(f.emphasis(), Some(1.2));
    }

    #[test]
    fn test_style_families() {
        assert_eq!(TargetModel::Sdxl.weight_syntax(), WeightSyntax::Numeric);
        assert_eq!(TargetModel::Flux.trailer(), Trailer::NegativePrompt);
        assert_eq!(TargetModel::Midjourney.trailer(), Trailer::CliModifiers);
        assert_eq!(TargetModel::Dalle.weight_syntax(), WeightSyntax::Repetition);
        assert_eq!(TargetModel::Dalle.trailer(), Trailer::None);
    }
}
