//! Prompt and output schema rendering

use serde_json::{Value, json};

use crate::NormalizedRequest;

/// Keys every analysis reply must carry, in prompt order
pub const REQUIRED_KEYS: [&str; 4] = ["summary", "score", "concerns", "suggestions"];

/// Renders the instruction payload sent to the inference service
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the prompt for a normalized ingredient list.
    ///
    /// Output depends only on the ingredient list, so identical input always
    /// yields a byte-identical prompt.
    pub fn build(&self, request: &NormalizedRequest) -> String {
        let mut prompt = String::from(
            "You are a nutrition analyst. Assess the overall nutritional quality of a recipe \
             based only on its ingredient list.\n\
             \n\
             Respond with a single JSON object and nothing else. It must contain exactly these keys:\n\
             - \"summary\": string, one or two sentences describing the recipe's nutritional profile\n\
             - \"score\": number from 0 (very poor) to 100 (excellent)\n\
             - \"concerns\": array of strings, specific nutritional concerns (may be empty)\n\
             - \"suggestions\": array of strings, concrete ingredient swaps or additions (may be empty)\n\
             \n\
             Ingredients:\n",
        );

        for (i, ingredient) in request.ingredients().iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, ingredient));
        }

        prompt
    }

    /// Minimal schema for structured replies: the four keys, correctly typed
    pub fn output_schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "summary": { "type": "STRING" },
                "score": { "type": "NUMBER" },
                "concerns": { "type": "ARRAY", "items": { "type": "STRING" } },
                "suggestions": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": REQUIRED_KEYS,
            "propertyOrdering": REQUIRED_KEYS
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_yaml_snapshot;

    fn request(items: &[&str]) -> NormalizedRequest {
        NormalizedRequest::new(items.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let builder = PromptBuilder::new();
        let req = request(&["1 cup rice", "2 eggs"]);
        assert_eq!(builder.build(&req), builder.build(&req.clone()));
    }

    #[test]
    fn test_prompt_lists_ingredients_in_order() {
        let prompt = PromptBuilder::new().build(&request(&["200 g salmon", "broccoli", "olive oil"]));
        assert!(prompt.ends_with("Ingredients:\n1. 200 g salmon\n2. broccoli\n3. olive oil\n"));
        for key in REQUIRED_KEYS {
            assert!(prompt.contains(&format!("\"{}\"", key)));
        }
    }

    #[test]
    fn test_output_schema_snapshot() {
        let schema = PromptBuilder::new().output_schema();
        assert_yaml_snapshot!(schema["required"], @r###"
        ---
        - summary
        - score
        - concerns
        - suggestions
        "###);
    }
}
