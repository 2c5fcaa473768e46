//! Schema.org recipe markup reader (JSON-LD).
//!
//! Fetches the page, pulls every `application/ld+json` script block, and
//! walks them for a `Recipe` node, including `@graph` containers and
//! top-level arrays. Also exposes the page's visible text for model
//! cleanup when markup is missing.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::security::UrlValidator;
use crate::sources::decode_entities;
use crate::traits::markup::MarkupSource;
use crate::types::metadata::StructuredRecipe;

/// Page text beyond this length adds cost without adding recipe.
const MAX_PAGE_TEXT: usize = 20_000;

pub struct HttpMarkupSource {
    client: reqwest::Client,
    validator: UrlValidator,
    user_agent: String,
}

impl Default for HttpMarkupSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpMarkupSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            validator: UrlValidator::new(),
            user_agent: "CookCardBot/1.0".to_string(),
        }
    }

    async fn fetch_html(&self, url: &str) -> FetchResult<String> {
        self.validator.validate(url)?;

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))
    }
}

fn ld_json_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(
            r#"(?si)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
        )
        .unwrap()
    })
}

/// Find the first schema.org Recipe node in the page's JSON-LD blocks.
pub fn find_recipe_node(html: &str) -> Option<Value> {
    for captures in ld_json_re().captures_iter(html) {
        let Ok(value) = serde_json::from_str::<Value>(captures[1].trim()) else {
            continue;
        };
        if let Some(recipe) = search_recipe(&value) {
            return Some(recipe.clone());
        }
    }
    None
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Recipe",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Recipe")),
        _ => false,
    }
}

fn search_recipe(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(_) => {
            if is_recipe_type(value) {
                return Some(value);
            }
            if let Some(graph) = value.get("@graph") {
                return search_recipe(graph);
            }
            None
        }
        Value::Array(items) => items.iter().find_map(search_recipe),
        _ => None,
    }
}

fn string_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(decode_entities(s.trim())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// schema.org `image` can be a string, an object, or an array of either.
fn image_of(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => string_of(value),
        Value::Object(map) => map.get("url").and_then(string_of),
        Value::Array(items) => items.iter().find_map(image_of),
        _ => None,
    }
}

/// Instruction entries can be plain strings, HowToStep objects, or
/// HowToSection objects wrapping more steps.
fn collect_instructions(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(_) => {
            if let Some(text) = string_of(value) {
                out.push(text);
            }
        }
        Value::Object(map) => {
            if let Some(items) = map.get("itemListElement") {
                collect_instructions(items, out);
            } else if let Some(text) = map.get("text").and_then(string_of) {
                out.push(text);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_instructions(item, out);
            }
        }
        _ => {}
    }
}

fn author_of(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => string_of(value),
        Value::Object(map) => map.get("name").and_then(string_of),
        Value::Array(items) => items.iter().find_map(author_of),
        _ => None,
    }
}

/// Parse an ISO-8601 duration (`PT1H30M`, `PT45M`, `PT90S`) to minutes.
pub fn parse_iso8601_minutes(value: &str) -> Option<u32> {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        regex::Regex::new(r"^P(?:(\d+)D)?T?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").unwrap()
    });
    let captures = re.captures(value.trim())?;

    let days: u32 = captures.get(1).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let hours: u32 = captures.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let minutes: u32 = captures.get(3).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let seconds: u32 = captures.get(4).map_or(0, |m| m.as_str().parse().unwrap_or(0));

    let total = days * 24 * 60 + hours * 60 + minutes + seconds.div_ceil(60);
    (total > 0).then_some(total)
}

/// Map a Recipe JSON-LD node onto [`StructuredRecipe`].
pub fn recipe_from_node(node: &Value) -> StructuredRecipe {
    let ingredients = node
        .get("recipeIngredient")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(string_of).collect())
        .unwrap_or_default();

    let mut instructions = Vec::new();
    if let Some(value) = node.get("recipeInstructions") {
        collect_instructions(value, &mut instructions);
    }

    let servings = match node.get("recipeYield") {
        Some(Value::Array(items)) => items.first().and_then(string_of),
        Some(value) => string_of(value),
        None => None,
    };

    StructuredRecipe {
        title: node.get("name").and_then(string_of),
        description: node.get("description").and_then(string_of),
        image_url: node.get("image").and_then(image_of),
        author: node.get("author").and_then(author_of),
        ingredients,
        instructions,
        prep_time_minutes: node
            .get("prepTime")
            .and_then(Value::as_str)
            .and_then(parse_iso8601_minutes),
        cook_time_minutes: node
            .get("cookTime")
            .and_then(Value::as_str)
            .and_then(parse_iso8601_minutes),
        total_time_minutes: node
            .get("totalTime")
            .and_then(Value::as_str)
            .and_then(parse_iso8601_minutes),
        servings,
    }
}

/// Strip tags and collapse whitespace to recover visible page text.
pub fn visible_text(html: &str) -> String {
    static SCRIPT_RE: OnceLock<regex::Regex> = OnceLock::new();
    static TAG_RE: OnceLock<regex::Regex> = OnceLock::new();

    let script_re = SCRIPT_RE
        .get_or_init(|| regex::Regex::new(r"(?si)<(script|style)[^>]*>.*?</(script|style)>").unwrap());
    let tag_re = TAG_RE.get_or_init(|| regex::Regex::new(r"<[^>]+>").unwrap());

    let without_scripts = script_re.replace_all(html, " ");
    let without_tags = tag_re.replace_all(&without_scripts, " ");
    let decoded = decode_entities(&without_tags);

    let mut text = String::with_capacity(decoded.len().min(MAX_PAGE_TEXT));
    let mut last_space = true;
    for c in decoded.chars() {
        if text.len() >= MAX_PAGE_TEXT {
            break;
        }
        if c.is_whitespace() {
            if !last_space {
                text.push(' ');
                last_space = true;
            }
        } else {
            text.push(c);
            last_space = false;
        }
    }
    text.trim_end().to_string()
}

#[async_trait]
impl MarkupSource for HttpMarkupSource {
    async fn recipe_markup(&self, url: &str) -> FetchResult<Option<StructuredRecipe>> {
        let html = self.fetch_html(url).await?;
        Ok(find_recipe_node(&html).map(|node| recipe_from_node(&node)))
    }

    async fn page_text(&self, url: &str) -> FetchResult<String> {
        let html = self.fetch_html(url).await?;
        Ok(visible_text(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html><head>
    <script type="application/ld+json">
    {
      "@context": "https://schema.org",
      "@graph": [
        {"@type": "WebSite", "name": "Blog"},
        {
          "@type": "Recipe",
          "name": "Weeknight Carbonara",
          "description": "Fast and silky.",
          "image": ["https://cdn.example/c.jpg"],
          "author": {"@type": "Person", "name": "Dana Cook"},
          "recipeIngredient": ["200g spaghetti", "2 eggs", "50g pecorino"],
          "recipeInstructions": [
            {"@type": "HowToStep", "text": "Boil the pasta."},
            {"@type": "HowToStep", "text": "Whisk eggs with cheese."}
          ],
          "prepTime": "PT10M",
          "cookTime": "PT15M",
          "totalTime": "PT25M",
          "recipeYield": "2 servings"
        }
      ]
    }
    </script>
    </head><body><p>Hello</p></body></html>
    "#;

    #[test]
    fn test_finds_recipe_in_graph() {
        let node = find_recipe_node(PAGE).unwrap();
        let recipe = recipe_from_node(&node);

        assert_eq!(recipe.title.as_deref(), Some("Weeknight Carbonara"));
        assert_eq!(recipe.ingredients.len(), 3);
        assert_eq!(recipe.instructions.len(), 2);
        assert_eq!(recipe.author.as_deref(), Some("Dana Cook"));
        assert_eq!(recipe.image_url.as_deref(), Some("https://cdn.example/c.jpg"));
        assert_eq!(recipe.prep_time_minutes, Some(10));
        assert_eq!(recipe.total_time_minutes, Some(25));
        assert_eq!(recipe.servings.as_deref(), Some("2 servings"));
    }

    #[test]
    fn test_no_markup() {
        assert!(find_recipe_node("<html><body>plain page</body></html>").is_none());
    }

    #[test]
    fn test_string_instructions() {
        let node: Value = serde_json::json!({
            "@type": "Recipe",
            "name": "Toast",
            "recipeIngredient": ["bread"],
            "recipeInstructions": "Toast the bread until golden."
        });
        let recipe = recipe_from_node(&node);
        assert_eq!(recipe.instructions, vec!["Toast the bread until golden."]);
    }

    #[test]
    fn test_iso8601_durations() {
        assert_eq!(parse_iso8601_minutes("PT45M"), Some(45));
        assert_eq!(parse_iso8601_minutes("PT1H30M"), Some(90));
        assert_eq!(parse_iso8601_minutes("PT90S"), Some(2));
        assert_eq!(parse_iso8601_minutes("P1DT2H"), Some(26 * 60));
        assert_eq!(parse_iso8601_minutes("nonsense"), None);
    }

    #[test]
    fn test_visible_text_strips_scripts_and_tags() {
        let html = "<html><script>var x = 1;</script><body><h1>Title</h1>\
                    <p>Two  cups   flour</p></body></html>";
        assert_eq!(visible_text(html), "Title Two cups flour");
    }
}
