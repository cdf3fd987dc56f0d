//! Degraded results: the offline stub and the local keyword heuristic
//!
//! Neither path performs I/O. The heuristic is a pure function of the
//! normalized ingredient list, so it can stand in for the remote service
//! when that service is persistently unavailable.

use regex::Regex;
use std::sync::LazyLock;

use crate::{AnalysisResult, NormalizedRequest};

/// Neutral starting score for the heuristic
pub const BASELINE_SCORE: f64 = 60.0;
/// Subtracted once per concerning keyword present
pub const CONCERN_PENALTY: f64 = 12.0;
/// Added once per favorable keyword present
pub const FAVORABLE_BONUS: f64 = 8.0;
/// Upper bound on `concerns` and `suggestions` length
pub const MAX_LIST_LEN: usize = 6;

pub const OFFLINE_SUMMARY: &str =
    "Offline mode: live nutrition analysis is disabled because no inference credential is configured.";
pub const HEURISTIC_SUMMARY: &str =
    "This is an estimate based on ingredient keywords because the analysis service is temporarily unavailable.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Concerning,
    Favorable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Vegetable,
    WholeGrain,
    RichDairy,
    Other,
}

struct KeywordRule {
    pattern: &'static str,
    kind: Kind,
    group: Group,
    message: &'static str,
}

const fn concern(pattern: &'static str, group: Group, message: &'static str) -> KeywordRule {
    KeywordRule { pattern, kind: Kind::Concerning, group, message }
}

const fn favor(pattern: &'static str, group: Group, message: &'static str) -> KeywordRule {
    KeywordRule { pattern, kind: Kind::Favorable, group, message }
}

const RULES: &[KeywordRule] = &[
    concern("bacon", Group::Other, "Bacon is high in saturated fat and sodium."),
    concern("sausages?", Group::Other, "Sausage is a processed meat high in sodium and saturated fat."),
    concern("(?:heavy |whipping |sour )?cream", Group::RichDairy, "Cream adds a lot of saturated fat."),
    concern("butter", Group::RichDairy, "Butter is high in saturated fat."),
    concern("lard|shortening", Group::Other, "Lard and shortening are concentrated saturated fats."),
    concern("margarine", Group::Other, "Margarine can contain trans fats."),
    concern("(?:brown |powdered |white )?sugar", Group::Other, "Added sugar raises the glycemic load."),
    concern("(?:corn |maple )?syrup", Group::Other, "Syrups are concentrated added sugar."),
    concern("salt", Group::Other, "Added salt increases sodium."),
    concern("fried", Group::Other, "Fried ingredients add fat and calories."),
    concern("mayonnaise|mayo", Group::Other, "Mayonnaise is calorie-dense and high in fat."),
    favor("broccoli", Group::Vegetable, "Broccoli adds fiber and vitamin C; keep it generous."),
    favor("spinach|kale", Group::Vegetable, "Leafy greens add iron and folate; consider doubling them."),
    favor("carrots?", Group::Vegetable, "Carrots contribute fiber and beta-carotene."),
    favor("tomato(?:es)?", Group::Vegetable, "Tomatoes add vitamin C and lycopene."),
    favor("peppers?|zucchini|onions?", Group::Vegetable, "Vegetables add volume and fiber for few calories."),
    favor("olive oil", Group::Other, "Olive oil is a good source of unsaturated fat; use it in place of butter."),
    favor("salmon|sardines?|mackerel", Group::Other, "Oily fish supplies omega-3 fatty acids."),
    favor("chicken breast|turkey breast", Group::Other, "Lean poultry is a good low-fat protein."),
    favor("lentils?|chickpeas?|beans", Group::Other, "Legumes add plant protein and fiber."),
    favor("quinoa|oats|brown rice|whole wheat|whole grain|barley", Group::WholeGrain, "Whole grains add fiber and slow-release energy."),
];

struct CompiledRule {
    regex: Regex,
    rule: &'static KeywordRule,
}

static COMPILED: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .filter_map(|rule| {
            Regex::new(&format!(r"\b(?:{})\b", rule.pattern))
                .ok()
                .map(|regex| CompiledRule { regex, rule })
        })
        .collect()
});

/// Canned result used when no credential is configured
pub fn offline_stub() -> AnalysisResult {
    AnalysisResult {
        summary: OFFLINE_SUMMARY.to_string(),
        score: 50.0,
        concerns: vec!["Live analysis is unavailable in offline mode.".to_string()],
        suggestions: vec!["Set GEMINI_API_KEY to enable ingredient-level analysis.".to_string()],
    }
}

/// Local estimate derived from the ingredient list alone
pub fn heuristic_analysis(request: &NormalizedRequest) -> AnalysisResult {
    let text = request.ingredients().join("\n").to_lowercase();

    let mut score = BASELINE_SCORE;
    let mut concerns = Vec::new();
    let mut suggestions = Vec::new();
    let mut has_vegetable = false;
    let mut has_whole_grain = false;
    let mut has_rich_dairy = false;

    for compiled in COMPILED.iter() {
        if !compiled.regex.is_match(&text) {
            continue;
        }
        let rule = compiled.rule;
        match rule.kind {
            Kind::Concerning => {
                score -= CONCERN_PENALTY;
                concerns.push(rule.message.to_string());
            }
            Kind::Favorable => {
                score += FAVORABLE_BONUS;
                suggestions.push(rule.message.to_string());
            }
        }
        match rule.group {
            Group::Vegetable => has_vegetable = true,
            Group::WholeGrain => has_whole_grain = true,
            Group::RichDairy => has_rich_dairy = true,
            Group::Other => {}
        }
    }

    if !has_vegetable {
        suggestions.push("Add a portion of vegetables for fiber and micronutrients.".to_string());
    }
    if !has_whole_grain {
        suggestions.push("Prefer whole-grain versions of any starches.".to_string());
    }
    if has_rich_dairy {
        suggestions.push("Swap cream or butter for olive oil or Greek yogurt.".to_string());
    }

    AnalysisResult {
        summary: HEURISTIC_SUMMARY.to_string(),
        score: score.clamp(0.0, 100.0),
        concerns: dedup_and_cap(concerns),
        suggestions: dedup_and_cap(suggestions),
    }
}

/// Keep first occurrences in order, at most `MAX_LIST_LEN`
fn dedup_and_cap(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_LIST_LEN);
    for item in items {
        if out.len() == MAX_LIST_LEN {
            break;
        }
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
