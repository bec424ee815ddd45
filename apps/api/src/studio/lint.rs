//! Heuristic prompt checks. Findings come back in rule order, not sorted by
//! severity, and are recomputed from scratch on every call.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::studio::compiler::compile;
use crate::studio::document::{Category, PromptDocument, TargetModel};

const REDUNDANCY_THRESHOLD: usize = 3;
const MAX_LISTED_REDUNDANCIES: usize = 4;
const PLAIN_SENTENCE_MAX_CHARS: usize = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintFinding {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl LintFinding {
    fn new(severity: Severity, code: &str, message: impl Into<String>, hint: &str) -> Self {
        Self {
            severity,
            code: code.to_string(),
            message: message.into(),
            hint: Some(hint.to_string()),
        }
    }
}

struct Contradiction {
    a: Regex,
    b: Regex,
    message: &'static str,
}

static CONTRADICTIONS: Lazy<Vec<Contradiction>> = Lazy::new(|| {
    [
        (
            r"black\s*and\s*white|monochrome|noir",
            r"vibrant|neon|pastel|colorful",
            "Color contradiction: monochrome/noir with vibrant/pastel cues.",
        ),
        (
            r"macro|extreme\s*close\s*up",
            r"wide\s*shot|panoramic|aerial|drone",
            "Camera contradiction: macro/close-up with wide/drone cues.",
        ),
        (
            r"minimal|minimalist",
            r"ornate|baroque|maximal",
            "Style contradiction: minimal with ornate/maximal cues.",
        ),
    ]
    .into_iter()
    .map(|(a, b, message)| Contradiction {
        a: Regex::new(a).expect("Invalid contradiction pattern"),
        b: Regex::new(b).expect("Invalid contradiction pattern"),
        message,
    })
    .collect()
});

static PHRASE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\n]+").expect("Invalid separator regex"));

pub fn lint(doc: &PromptDocument) -> Vec<LintFinding> {
    let mut findings = Vec::new();
    let text = compile(doc);

    if doc.subject.trim().is_empty() {
        findings.push(LintFinding::new(
            Severity::Error,
            "NO_SUBJECT",
            "Missing subject.",
            "Describe the main subject in one clear sentence.",
        ));
    }

    if !doc.has_category(Category::Camera) {
        findings.push(LintFinding::new(
            Severity::Warning,
            "NO_CAMERA",
            "No camera/view cues.",
            "Add lens/shot type (wide, 35mm, macro, aerial, etc.).",
        ));
    }

    if !doc.has_category(Category::Lighting) {
        findings.push(LintFinding::new(
            Severity::Warning,
            "NO_LIGHTING",
            "No lighting cues.",
            "Add lighting like golden hour, cinematic, volumetric, softbox.",
        ));
    }

    let normalized = text.to_lowercase();

    let redundant = repeated_phrases(&normalized);
    if !redundant.is_empty() {
        let listed: Vec<&str> = redundant
            .iter()
            .take(MAX_LISTED_REDUNDANCIES)
            .map(String::as_str)
            .collect();
        findings.push(LintFinding::new(
            Severity::Warning,
            "REDUNDANT",
            format!("Repeated phrases: {}", listed.join(", ")),
            "Remove duplicates; emphasize with weighting instead.",
        ));
    }

    for c in CONTRADICTIONS.iter() {
        if c.a.is_match(&normalized) && c.b.is_match(&normalized) {
            findings.push(LintFinding::new(
                Severity::Warning,
                "CONTRADICTION",
                c.message,
                "Pick one direction, or clarify which part each cue applies to.",
            ));
        }
    }

    if doc.model == TargetModel::Dalle && text.chars().count() > PLAIN_SENTENCE_MAX_CHARS {
        findings.push(LintFinding::new(
            Severity::Warning,
            "TOO_LONG",
            "Prompt is very long for sentence-style prompting.",
            "Reduce to the most important details (subject, setting, style, lighting, camera).",
        ));
    }

    findings
}

/// Phrases occurring at least three times, in first-seen order.
fn repeated_phrases(normalized: &str) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for phrase in PHRASE_SEPARATOR
        .split(normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let count = counts.entry(phrase).or_insert(0);
        if *count == 0 {
            order.push(phrase);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|p| counts[p] >= REDUNDANCY_THRESHOLD)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::document::{PromptFragment, RenderParams};

    fn fragment(text: &str, category: Category) -> PromptFragment {
        PromptFragment {
            id: format!("f-{text}"),
            label: text.to_string(),
            text: text.to_string(),
            category,
            weight: 1.0,
        }
    }

    fn doc(subject: &str, model: TargetModel, fragments: Vec<PromptFragment>) -> PromptDocument {
        PromptDocument {
            subject: subject.to_string(),
            fragments,
            negative: String::new(),
            model,
            params: RenderParams::default(),
        }
    }

    fn codes(findings: &[LintFinding]) -> Vec<&str> {
        findings.iter().map(|f| f.code.as_str()).collect()
    }

    #[test]
    fn test_empty_document_reports_subject_camera_lighting_in_order() {
        let findings = lint(&doc("", TargetModel::Midjourney, vec![]));
        assert_eq!(codes(&findings), vec!["NO_SUBJECT", "NO_CAMERA", "NO_LIGHTING"]);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[1].severity, Severity::Warning);
        assert_eq!(findings[2].severity, Severity::Warning);
    }

    #[test]
    fn test_complete_document_is_clean() {
        let d = doc(
            "a lighthouse on a cliff",
            TargetModel::Sdxl,
            vec![
                fragment("35mm lens", Category::Camera),
                fragment("golden hour sunlight", Category::Lighting),
            ],
        );
        assert!(lint(&d).is_empty());
    }

    #[test]
    fn test_camera_fragment_counts_even_when_empty() {
        let d = doc(
            "a fox",
            TargetModel::Sdxl,
            vec![
                fragment("", Category::Camera),
                fragment("softbox studio lighting", Category::Lighting),
            ],
        );
        assert!(lint(&d).is_empty());
    }

    #[test]
    fn test_redundant_phrase_reported_once() {
        let d = doc(
            "a canyon",
            TargetModel::Sdxl,
            vec![
                fragment("golden hour", Category::Lighting),
                fragment("Golden Hour", Category::Mood),
                fragment("golden hour ", Category::Color),
                fragment("wide angle lens", Category::Camera),
            ],
        );
        let findings = lint(&d);
        let redundant: Vec<_> = findings.iter().filter(|f| f.code == "REDUNDANT").collect();
        assert_eq!(redundant.len(), 1);
        assert_eq!(redundant[0].message, "Repeated phrases: golden hour");
    }

    #[test]
    fn test_repetition_weighting_can_trigger_redundancy() {
        let mut heavy = fragment("lava glow", Category::Lighting);
        heavy.weight = 3.0;
        let d = doc(
            "a volcano",
            TargetModel::Midjourney,
            vec![heavy, fragment("macro shot", Category::Camera)],
        );
        assert!(codes(&lint(&d)).contains(&"REDUNDANT"));
    }

    #[test]
    fn test_redundancy_lists_at_most_four_phrases() {
        let mut fragments = Vec::new();
        for phrase in ["a", "b", "c", "d", "e"] {
            for _ in 0..3 {
                fragments.push(fragment(phrase, Category::Style));
            }
        }
        fragments.push(fragment("35mm", Category::Camera));
        fragments.push(fragment("rim light", Category::Lighting));
        let findings = lint(&doc("x", TargetModel::Dalle, fragments));
        let redundant = findings.iter().find(|f| f.code == "REDUNDANT").unwrap();
        assert_eq!(redundant.message, "Repeated phrases: a, b, c, d");
    }

    #[test]
    fn test_two_occurrences_are_not_redundant() {
        let d = doc(
            "mist, mist",
            TargetModel::Dalle,
            vec![
                fragment("35mm", Category::Camera),
                fragment("rim light", Category::Lighting),
            ],
        );
        assert!(lint(&d).is_empty());
    }

    #[test]
    fn test_contradictions_one_finding_per_pair() {
        let d = doc(
            "a minimalist temple",
            TargetModel::Sdxl,
            vec![
                fragment("black and white", Category::Color),
                fragment("neon rim lighting", Category::Lighting),
                fragment("macro shot", Category::Camera),
                fragment("drone aerial view", Category::Camera),
                fragment("baroque painting", Category::Style),
            ],
        );
        let findings = lint(&d);
        let contradictions: Vec<&str> = findings
            .iter()
            .filter(|f| f.code == "CONTRADICTION")
            .map(|f| f.message.as_str())
            .collect();
        assert_eq!(contradictions.len(), 3);
        assert!(contradictions[0].starts_with("Color"));
        assert!(contradictions[1].starts_with("Camera"));
        assert!(contradictions[2].starts_with("Style"));
    }

    #[test]
    fn test_negative_text_does_not_trigger_contradictions_for_cli_model() {
        let mut d = doc(
            "a monochrome street",
            TargetModel::Midjourney,
            vec![
                fragment("35mm lens", Category::Camera),
                fragment("overcast light", Category::Lighting),
            ],
        );
        d.negative = "vibrant colors".to_string();
        assert!(lint(&d).is_empty());
    }

    #[test]
    fn test_too_long_only_for_plain_sentence_model() {
        let long_subject = "x".repeat(950);
        let fragments = vec![
            fragment("35mm lens", Category::Camera),
            fragment("overcast light", Category::Lighting),
        ];
        let dalle = lint(&doc(&long_subject, TargetModel::Dalle, fragments.clone()));
        assert_eq!(codes(&dalle), vec!["TOO_LONG"]);

        let sdxl = lint(&doc(&long_subject, TargetModel::Sdxl, fragments));
        assert!(sdxl.is_empty());
    }

    #[test]
    fn test_lint_does_not_mutate_document() {
        let d = doc("", TargetModel::Flux, vec![fragment("fog", Category::Scene)]);
        let before = d.clone();
        let _ = lint(&d);
        assert_eq!(d, before);
        assert_eq!(lint(&d), lint(&d));
    }
}
