//! Canonical item matching over a static catalog.
//!
//! Matching is three-phase: exact normalized match, alias lookup, then
//! token-overlap fuzzy scoring. The catalog here is a seed set; real
//! deployments load a larger one and keep the same matching rules.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::traits::catalog::{CanonicalCatalog, CatalogMatch};
use crate::types::card::normalize_ingredient_name;

/// Minimum coverage of a catalog item's tokens to accept a fuzzy match.
const FUZZY_FLOOR: f32 = 0.6;

struct CatalogItem {
    id: String,
    name: String,
    tokens: Vec<String>,
}

/// In-memory canonical catalog with alias and fuzzy matching.
pub struct StaticCatalog {
    items: Vec<CatalogItem>,
    by_name: HashMap<String, usize>,
    aliases: HashMap<String, usize>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::with_seed_items()
    }
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            by_name: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Catalog pre-loaded with common pantry staples.
    pub fn with_seed_items() -> Self {
        let mut catalog = Self::new();
        for (id, name, aliases) in SEED_ITEMS {
            catalog.add_item(id, name, aliases);
        }
        catalog
    }

    /// Add an item with its aliases. Names are normalized on insert.
    pub fn add_item(&mut self, id: &str, name: &str, aliases: &[&str]) {
        let normalized = normalize_ingredient_name(name);
        let index = self.items.len();
        self.items.push(CatalogItem {
            id: id.to_string(),
            name: name.to_string(),
            tokens: normalized.split_whitespace().map(String::from).collect(),
        });
        self.by_name.insert(normalized, index);
        for alias in aliases {
            self.aliases
                .insert(normalize_ingredient_name(alias), index);
        }
    }

    fn fuzzy_best(&self, tokens: &[&str]) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32, usize)> = None;
        for (index, item) in self.items.iter().enumerate() {
            let overlap = item
                .tokens
                .iter()
                .filter(|t| tokens.contains(&t.as_str()))
                .count();
            if overlap == 0 {
                continue;
            }
            // How much of the catalog item's name the query covers; ties
            // go to the item matching more tokens
            let score = overlap as f32 / item.tokens.len() as f32;
            if best.map_or(true, |(_, s, o)| score > s || (score == s && overlap > o)) {
                best = Some((index, score, overlap));
            }
        }
        best.filter(|(_, score, _)| *score >= FUZZY_FLOOR)
            .map(|(index, score, _)| (index, score))
    }

    fn to_match(&self, index: usize, score: f32) -> CatalogMatch {
        let item = &self.items[index];
        CatalogMatch {
            item_id: item.id.clone(),
            name: item.name.clone(),
            score,
        }
    }
}

#[async_trait]
impl CanonicalCatalog for StaticCatalog {
    async fn lookup(&self, name: &str) -> Result<Option<CatalogMatch>> {
        let normalized = normalize_ingredient_name(name);
        if normalized.is_empty() {
            return Ok(None);
        }

        if let Some(&index) = self.by_name.get(&normalized) {
            return Ok(Some(self.to_match(index, 1.0)));
        }
        if let Some(&index) = self.aliases.get(&normalized) {
            return Ok(Some(self.to_match(index, 0.95)));
        }

        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        Ok(self
            .fuzzy_best(&tokens)
            .map(|(index, score)| self.to_match(index, score)))
    }
}

/// Seed items: (id, canonical name, aliases).
const SEED_ITEMS: &[(&str, &str, &[&str])] = &[
    ("itm_flour", "all-purpose flour", &["flour", "plain flour", "ap flour"]),
    ("itm_sugar", "granulated sugar", &["sugar", "white sugar", "caster sugar"]),
    ("itm_brown_sugar", "brown sugar", &["light brown sugar", "dark brown sugar"]),
    ("itm_butter", "butter", &["unsalted butter", "salted butter"]),
    ("itm_egg", "egg", &["eggs", "large egg", "large eggs"]),
    ("itm_milk", "milk", &["whole milk", "2% milk"]),
    ("itm_olive_oil", "olive oil", &["extra virgin olive oil", "evoo"]),
    ("itm_veg_oil", "vegetable oil", &["canola oil", "neutral oil"]),
    ("itm_salt", "salt", &["kosher salt", "sea salt", "table salt"]),
    ("itm_pepper", "black pepper", &["pepper", "ground black pepper", "cracked pepper"]),
    ("itm_garlic", "garlic", &["garlic cloves", "garlic clove", "minced garlic"]),
    ("itm_onion", "onion", &["yellow onion", "white onion", "onions"]),
    ("itm_soy_sauce", "soy sauce", &["light soy sauce", "dark soy sauce", "shoyu"]),
    ("itm_chicken_breast", "chicken breast", &["chicken breasts", "boneless chicken breast"]),
    ("itm_chicken_thigh", "chicken thigh", &["chicken thighs", "boneless chicken thighs"]),
    ("itm_ground_beef", "ground beef", &["minced beef", "beef mince"]),
    ("itm_rice", "white rice", &["rice", "jasmine rice", "basmati rice"]),
    ("itm_pasta", "pasta", &["spaghetti", "penne", "noodles"]),
    ("itm_tomato", "tomato", &["tomatoes", "roma tomato", "cherry tomatoes"]),
    ("itm_tomato_paste", "tomato paste", &["tomato puree"]),
    ("itm_parmesan", "parmesan cheese", &["parmesan", "parmigiano reggiano", "grated parmesan"]),
    ("itm_cheddar", "cheddar cheese", &["cheddar", "shredded cheddar"]),
    ("itm_cream", "heavy cream", &["double cream", "whipping cream"]),
    ("itm_lemon", "lemon", &["lemons", "lemon juice"]),
    ("itm_lime", "lime", &["limes", "lime juice"]),
    ("itm_ginger", "ginger", &["fresh ginger", "grated ginger"]),
    ("itm_honey", "honey", &[]),
    ("itm_baking_soda", "baking soda", &["bicarbonate of soda", "bicarb"]),
    ("itm_baking_powder", "baking powder", &[]),
    ("itm_vanilla", "vanilla extract", &["vanilla", "vanilla essence"]),
    ("itm_cinnamon", "ground cinnamon", &["cinnamon"]),
    ("itm_paprika", "paprika", &["smoked paprika", "sweet paprika"]),
    ("itm_cumin", "ground cumin", &["cumin"]),
    ("itm_chili_flakes", "red pepper flakes", &["chili flakes", "chilli flakes"]),
    ("itm_cilantro", "cilantro", &["coriander", "fresh coriander"]),
    ("itm_parsley", "parsley", &["fresh parsley", "flat leaf parsley"]),
    ("itm_basil", "basil", &["fresh basil"]),
    ("itm_scallion", "scallion", &["scallions", "green onion", "green onions", "spring onion"]),
    ("itm_sesame_oil", "sesame oil", &["toasted sesame oil"]),
    ("itm_cornstarch", "cornstarch", &["corn starch", "cornflour"]),
    ("itm_stock_chicken", "chicken stock", &["chicken broth"]),
    ("itm_stock_veg", "vegetable stock", &["vegetable broth", "veggie broth"]),
    ("itm_yogurt", "plain yogurt", &["greek yogurt", "yoghurt"]),
    ("itm_avocado", "avocado", &["avocados"]),
    ("itm_potato", "potato", &["potatoes", "russet potato", "yukon gold potatoes"]),
    ("itm_carrot", "carrot", &["carrots"]),
    ("itm_celery", "celery", &["celery stalks"]),
    ("itm_bell_pepper", "bell pepper", &["red bell pepper", "green bell pepper", "capsicum"]),
    ("itm_mushroom", "mushroom", &["mushrooms", "cremini mushrooms", "button mushrooms"]),
    ("itm_spinach", "spinach", &["baby spinach", "fresh spinach"]),
];
