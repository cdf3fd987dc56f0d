//! Ingredient normalization and the request/response envelope
//!
//! Callers send ingredients either as plain strings or as records with a
//! name, an optional quantity and an optional unit. Everything downstream
//! works on the rendered description strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{AnalysisResult, Error, Result};

/// A structured ingredient line
///
/// Deserialization is lenient: `name` wins over `ingredientName`, a quantity
/// may be a number or a numeric string, and fields of the wrong type are
/// ignored rather than rejecting the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct IngredientDescriptor {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

impl From<Map<String, Value>> for IngredientDescriptor {
    fn from(fields: Map<String, Value>) -> Self {
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            name: text("name").or_else(|| text("ingredientName")),
            quantity: fields.get("quantity").and_then(lenient_quantity),
            unit: text("unit"),
        }
    }
}

fn lenient_quantity(value: &Value) -> Option<f64> {
    let quantity = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    quantity.filter(|q| q.is_finite())
}

impl IngredientDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            quantity: None,
            unit: None,
        }
    }

    pub fn with_quantity(mut self, quantity: f64, unit: Option<&str>) -> Self {
        self.quantity = Some(quantity);
        self.unit = unit.map(str::to_string);
        self
    }

    /// Render as `"<quantity> <unit> <name>"`, or `None` without a usable name
    pub fn describe(&self) -> Option<String> {
        let name = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;

        let mut parts: Vec<String> = Vec::with_capacity(3);
        if let Some(quantity) = self.quantity.filter(|q| q.is_finite()) {
            parts.push(quantity.to_string());
        }
        if let Some(unit) = self.unit.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            parts.push(unit.to_string());
        }
        parts.push(name.to_string());

        Some(parts.join(" "))
    }
}

/// One element of the inbound `ingredients` array
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IngredientInput {
    Text(String),
    Record(IngredientDescriptor),
    /// Numbers, nulls, arrays: tolerated on the wire, dropped on normalization
    Malformed(Value),
}

impl<'de> Deserialize<'de> for IngredientInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => IngredientInput::Text(text),
            Value::Object(fields) => IngredientInput::Record(fields.into()),
            other => IngredientInput::Malformed(other),
        })
    }
}

impl IngredientInput {
    fn describe(&self) -> Option<String> {
        match self {
            IngredientInput::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            IngredientInput::Record(record) => record.describe(),
            IngredientInput::Malformed(_) => None,
        }
    }
}

impl From<&str> for IngredientInput {
    fn from(text: &str) -> Self {
        IngredientInput::Text(text.to_string())
    }
}

impl From<IngredientDescriptor> for IngredientInput {
    fn from(record: IngredientDescriptor) -> Self {
        IngredientInput::Record(record)
    }
}

/// Convert caller input into ordered, trimmed, non-empty descriptions.
///
/// Entries without a usable name are dropped. An empty result is the
/// caller's problem; see [`NormalizedRequest::new`].
pub fn normalize_ingredients(inputs: &[IngredientInput]) -> Vec<String> {
    inputs.iter().filter_map(IngredientInput::describe).collect()
}

/// Ordered, non-empty list of ingredient descriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRequest {
    ingredients: Vec<String>,
}

impl NormalizedRequest {
    pub fn new(ingredients: Vec<String>) -> Result<Self> {
        let ingredients: Vec<String> = ingredients
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();

        if ingredients.is_empty() {
            return Err(Error::CallerInputInvalid(
                "at least one ingredient with a name is required".to_string(),
            ));
        }

        Ok(Self { ingredients })
    }

    pub fn from_inputs(inputs: &[IngredientInput]) -> Result<Self> {
        Self::new(normalize_ingredients(inputs))
    }

    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }
}

impl fmt::Display for NormalizedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ingredients.join(", "))
    }
}

/// Inbound body: `{ "ingredients": [...] }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientInput>>,
}

impl AnalyzeRequest {
    /// Parse a raw JSON body
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::CallerInputInvalid(format!("request body is not valid JSON: {}", e)))
    }

    /// Validate into a normalized request before the client is invoked
    pub fn normalize(&self) -> Result<NormalizedRequest> {
        match &self.ingredients {
            Some(inputs) => NormalizedRequest::from_inputs(inputs),
            None => Err(Error::CallerInputInvalid(
                "missing `ingredients` field".to_string(),
            )),
        }
    }
}

/// Outbound body: `{ "analysis": {...} }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<IngredientInput> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_mixed_inputs_render_in_order() {
        let inputs = parse(
            r#"[
                "  2 eggs ",
                {"name": "flour", "quantity": 1.5, "unit": "cup"},
                {"ingredientName": "salt", "quantity": 1, "unit": " tsp "},
                {"name": "pepper", "unit": ""},
                {"quantity": 3, "unit": "g"},
                {"name": "   "},
                "",
                42,
                null
            ]"#,
        );

        assert_eq!(
            normalize_ingredients(&inputs),
            vec!["2 eggs", "1.5 cup flour", "1 tsp salt", "pepper"]
        );
    }

    #[test]
    fn test_string_quantity_and_duplicate_names_keep_the_record() {
        let inputs = parse(
            r#"[
                {"name": "flour", "quantity": "2", "unit": "cup"},
                {"name": "salt", "ingredientName": "sea salt"},
                {"ingredientName": "sugar", "quantity": "a pinch"},
                {"name": 7, "ingredientName": "yeast", "quantity": [1], "unit": 5}
            ]"#,
        );

        assert_eq!(
            normalize_ingredients(&inputs),
            vec!["2 cup flour", "salt", "sugar", "yeast"]
        );
    }

    #[test]
    fn test_non_object_values_are_malformed() {
        let inputs = parse(r#"[["salt"], 3, true]"#);
        assert!(inputs.iter().all(|i| matches!(i, IngredientInput::Malformed(_))));
        assert!(normalize_ingredients(&inputs).is_empty());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = parse(r#"["basil", {"name": "tomato", "quantity": 4}, "mozzarella"]"#);
        let once = normalize_ingredients(&inputs);
        let again: Vec<IngredientInput> = once.iter().map(|s| s.as_str().into()).collect();
        assert_eq!(normalize_ingredients(&again), once);
    }

    #[test]
    fn test_descriptor_without_unit() {
        let d = IngredientDescriptor::named("onion").with_quantity(2.0, None);
        assert_eq!(d.describe().as_deref(), Some("2 onion"));
    }

    #[test]
    fn test_empty_request_is_caller_error() {
        let err = NormalizedRequest::from_inputs(&parse(r#"["  ", {"unit": "g"}]"#)).unwrap_err();
        assert!(matches!(err, Error::CallerInputInvalid(_)));
    }

    #[test]
    fn test_envelope_requires_ingredients_field() {
        let req = AnalyzeRequest::from_json(r#"{"title": "soup"}"#).unwrap();
        assert!(matches!(req.normalize(), Err(Error::CallerInputInvalid(_))));

        let req = AnalyzeRequest::from_json(r#"{"ingredients": []}"#).unwrap();
        assert!(matches!(req.normalize(), Err(Error::CallerInputInvalid(_))));

        let req = AnalyzeRequest::from_json(r#"{"ingredients": ["rice", {"name": "beans"}]}"#).unwrap();
        assert_eq!(req.normalize().unwrap().ingredients(), ["rice", "beans"]);
    }

    #[test]
    fn test_malformed_body_is_caller_error() {
        assert!(matches!(
            AnalyzeRequest::from_json("{ingredients"),
            Err(Error::CallerInputInvalid(_))
        ));
    }
}
