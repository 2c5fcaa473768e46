//! Recipe-likeness signals over raw text.
//!
//! These heuristics gate spend: the language model is only invoked when
//! the assembled text actually looks like it contains a recipe, and
//! structured markup is only trusted when its ingredient lines look like
//! real ingredients rather than placeholders.

use std::sync::OnceLock;

use regex::Regex;

/// Measurement tokens that mark a line as quantitative.
const UNIT_TOKENS: &[&str] = &[
    "cup", "cups", "tbsp", "tablespoon", "tablespoons", "tsp", "teaspoon", "teaspoons", "g",
    "gram", "grams", "kg", "ml", "l", "liter", "litre", "oz", "ounce", "ounces", "lb", "lbs",
    "pound", "pounds", "clove", "cloves", "stick", "sticks", "pinch", "dash", "can", "cans",
    "slice", "slices", "bunch", "head", "sprig", "sprigs", "piece", "pieces", "handful",
    "quart", "pint", "gallon", "stalk", "stalks",
];

/// Common food words; one of these is enough to treat a line as edible.
const FOOD_WORDS: &[&str] = &[
    "flour", "sugar", "butter", "egg", "eggs", "milk", "cream", "cheese", "chicken", "beef",
    "pork", "fish", "salmon", "shrimp", "garlic", "onion", "onions", "tomato", "tomatoes",
    "potato", "potatoes", "carrot", "carrots", "celery", "pepper", "salt", "oil", "vinegar",
    "rice", "pasta", "noodles", "bread", "yeast", "honey", "syrup", "vanilla", "chocolate",
    "cocoa", "cinnamon", "ginger", "basil", "parsley", "cilantro", "thyme", "rosemary",
    "oregano", "cumin", "paprika", "lemon", "lime", "orange", "apple", "banana", "avocado",
    "mushroom", "mushrooms", "spinach", "kale", "lettuce", "cabbage", "broccoli", "corn",
    "bean", "beans", "lentil", "lentils", "chickpea", "chickpeas", "tofu", "yogurt", "stock",
    "broth", "sauce", "water", "wine", "soy", "sesame", "peanut", "almond", "walnut",
    "coconut", "mustard", "ketchup", "mayonnaise",
];

/// Imperative verbs typical of instruction text.
const COOKING_VERBS: &[&str] = &[
    "mix", "stir", "bake", "preheat", "whisk", "chop", "dice", "mince", "simmer", "fry",
    "boil", "add", "combine", "pour", "season", "marinate", "knead", "fold", "grill", "roast",
    "saute", "toss", "drain", "blend", "heat", "cook", "melt", "sprinkle", "serve", "slice",
    "spread", "brush", "cover", "reduce", "chill", "whip", "beat",
];

/// Placeholder lines creators write instead of actual ingredients.
const PLACEHOLDER_PHRASES: &[&str] = &[
    "see video",
    "link in bio",
    "in my bio",
    "recipe below",
    "recipe in comments",
    "full recipe",
    "see below",
    "check my profile",
];

fn quantity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+([.,/]\d+)?|[½¼¾⅓⅔⅛])").unwrap())
}

/// Does the text contain a numeric or vulgar-fraction quantity?
pub fn has_quantity(text: &str) -> bool {
    quantity_re().is_match(text)
}

fn tokens_of(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn contains_any_token(text: &str, vocabulary: &[&str]) -> bool {
    tokens_of(text).iter().any(|t| vocabulary.contains(&t.as_str()))
}

pub fn contains_unit_token(text: &str) -> bool {
    contains_any_token(text, UNIT_TOKENS)
}

pub fn contains_food_word(text: &str) -> bool {
    contains_any_token(text, FOOD_WORDS)
}

pub fn contains_cooking_verb(text: &str) -> bool {
    contains_any_token(text, COOKING_VERBS)
}

fn is_placeholder(line: &str) -> bool {
    let lower = line.to_lowercase();
    PLACEHOLDER_PHRASES.iter().any(|p| lower.contains(p))
}

/// Does a markup ingredient line look like a real ingredient?
///
/// Real lines carry a quantity, a unit token, or a common food word, and
/// are not creator placeholders ("see video", "link in bio").
pub fn looks_like_real_ingredient(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || is_placeholder(line) {
        return false;
    }
    has_quantity(line) || contains_unit_token(line) || contains_food_word(line)
}

/// Count markup ingredient lines that pass [`looks_like_real_ingredient`].
pub fn count_real_ingredients<S: AsRef<str>>(lines: &[S]) -> usize {
    lines
        .iter()
        .filter(|l| looks_like_real_ingredient(l.as_ref()))
        .count()
}

/// Quality gate before the language-model call: does the text show at
/// least two of the three recipe signal classes (quantities, units,
/// cooking verbs)?
pub fn has_recipe_signals(text: &str) -> bool {
    let mut classes = 0;
    if has_quantity(text) {
        classes += 1;
    }
    if contains_unit_token(text) {
        classes += 1;
    }
    if contains_cooking_verb(text) {
        classes += 1;
    }
    classes >= 2
}

/// Score a harvested comment for how much it looks like an ingredient
/// block. Tuned threshold lives in `LadderConfig::comment_score_floor`.
pub fn score_comment(text: &str) -> i32 {
    let mut score = 0i32;
    let lower = text.to_lowercase();

    if lower.contains("ingredient") {
        score += 10;
    }
    if lower.contains("recipe") {
        score += 3;
    }

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let starts_quantified = line.starts_with(['-', '*', '•'])
            || line
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit() || "½¼¾⅓⅔⅛".contains(c));
        if starts_quantified {
            score += 4;
        }
        if contains_unit_token(line) {
            score += 2;
        }
        if contains_food_word(line) {
            score += 1;
        }
    }

    // Short reactions and questions are noise
    if text.len() < 30 {
        score -= 5;
    }
    if text.contains('?') && text.len() < 80 {
        score -= 5;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_ingredient_lines() {
        assert!(looks_like_real_ingredient("2 cups all-purpose flour"));
        assert!(looks_like_real_ingredient("a pinch of salt"));
        assert!(looks_like_real_ingredient("chicken thighs"));
        assert!(looks_like_real_ingredient("½ tsp vanilla"));
    }

    #[test]
    fn test_placeholder_lines_rejected() {
        assert!(!looks_like_real_ingredient("see video for details"));
        assert!(!looks_like_real_ingredient("Full recipe link in bio!"));
        assert!(!looks_like_real_ingredient(""));
        assert!(!looks_like_real_ingredient("my grandma's secret"));
    }

    #[test]
    fn test_recipe_signals_gate() {
        assert!(has_recipe_signals(
            "Whisk 2 cups flour with 1 tsp salt, then bake at 350."
        ));
        // A verb alone is one signal class, not enough
        assert!(!has_recipe_signals("Just mix everything together and enjoy"));
        assert!(!has_recipe_signals("What a great day at the beach"));
    }

    #[test]
    fn test_comment_scoring_separates_recipes_from_praise() {
        let recipe_block = "Ingredients:\n1 cup flour\n2 eggs\n1/2 cup milk\n1 tbsp butter";
        let praise = "Looks amazing!";
        let question = "What temperature do you bake this at?";

        assert!(score_comment(recipe_block) >= 20);
        assert!(score_comment(praise) < 0);
        assert!(score_comment(question) < 20);
    }

    #[test]
    fn test_count_real_ingredients() {
        let lines = ["2 cups flour", "see video", "3 eggs", ""];
        assert_eq!(count_real_ingredients(&lines), 2);
    }
}
