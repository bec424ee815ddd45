//! Prompt compiler: `PromptDocument` → model-specific prompt text.
//!
//! Pure and total. The same document always yields the same string, which
//! the lint engine relies on when it recompiles.

use crate::studio::document::{
    Category, PromptDocument, RenderParams, Trailer, WeightSyntax, MAX_WEIGHT, MIN_WEIGHT,
};

const MAX_REPEATS: f64 = 3.0;

pub fn compile(doc: &PromptDocument) -> String {
    let mut parts: Vec<String> = Vec::new();

    let subject = doc.subject.trim();
    if !subject.is_empty() {
        parts.push(subject.to_string());
    }

    let syntax = doc.model.weight_syntax();
    for fragment in doc
        .fragments
        .iter()
        .filter(|f| f.category != Category::Negative)
    {
        let text = fragment.text.trim();
        if text.is_empty() {
            continue;
        }
        match fragment.emphasis() {
            None => parts.push(text.to_string()),
            Some(weight) => push_weighted(&mut parts, text, weight, syntax),
        }
    }

    let base = parts.join(", ");

    match doc.model.trailer() {
        Trailer::CliModifiers => {
            let modifiers = cli_modifiers(&doc.params);
            match (base.is_empty(), modifiers.is_empty()) {
                (_, true) => base,
                (true, false) => modifiers,
                (false, false) => format!("{base} {modifiers}"),
            }
        }
        Trailer::NegativePrompt => {
            let negative = doc.negative.trim();
            if negative.is_empty() {
                base
            } else {
                format!("{base}\n\nNegative prompt: {negative}")
            }
        }
        Trailer::None => base,
    }
}

fn push_weighted(parts: &mut Vec<String>, text: &str, weight: f64, syntax: WeightSyntax) {
    match syntax {
        WeightSyntax::Numeric => {
            let w = (weight.clamp(MIN_WEIGHT, MAX_WEIGHT) * 100.0).round() / 100.0;
            parts.push(format!("({text}:{w})"));
        }
        WeightSyntax::Repetition => {
            let repeats = weight.clamp(1.0, MAX_REPEATS).round() as usize;
            parts.extend((0..repeats).map(|_| text.to_string()));
        }
    }
}

/// Present-only `--ar/--s/--q/--seed` tokens, space-joined.
fn cli_modifiers(params: &RenderParams) -> String {
    let mut tokens = Vec::new();
    if let Some(aspect) = params.aspect.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        tokens.push(format!("--ar {aspect}"));
    }
    if let Some(stylize) = params.stylize.filter(|v| v.is_finite()) {
        tokens.push(format!("--s {stylize}"));
    }
    if let Some(quality) = params.quality.filter(|v| v.is_finite()) {
        tokens.push(format!("--q {quality}"));
    }
    if let Some(seed) = params.seed.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        tokens.push(format!("--seed {seed}"));
    }
    tokens.join(" ")
}
