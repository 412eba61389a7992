//! Recipe registry and its indices.
//! 配方注册表及其索引。

use crate::catalog;
use crate::{Recipe, RecipeKind, RecipeType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while registering or looking up recipes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecipeError {
    #[error("recipe `{0}` is already registered")]
    Duplicate(String),

    #[error("unknown recipe `{0}`")]
    Unknown(String),
}

/// Construction stage a recipe participates in.
/// 配方参与的构建阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Inline text into a tree.
    Parse,
    /// Split nodes into sibling pieces without adding height.
    Horizontal,
    /// Aggregate sibling nodes under a new parent.
    Vertical,
}

impl Stage {
    pub fn of(recipe: &Recipe) -> Stage {
        match recipe.recipe_type() {
            RecipeType::Enclosure | RecipeType::Separator | RecipeType::Primitive => Stage::Parse,
            RecipeType::Pattern => Stage::Horizontal,
            RecipeType::Aggregator => Stage::Vertical,
        }
    }
}

/// Optional recipes a caller can switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyntaxFeature {
    /// `%name%` references.
    Percentages,
    /// The baseline `reserved` pattern recipe.
    Reserved,
}

/// Owns every active recipe, in declaration order.
/// 按声明顺序持有所有启用的配方。
#[derive(Debug, Clone, Default)]
pub struct RecipeManager {
    recipes: Vec<Recipe>,
    by_name: HashMap<String, usize>,
    by_character: HashMap<char, Vec<usize>>,
    by_opener: HashMap<char, Vec<usize>>,
    by_closer: HashMap<char, Vec<usize>>,
    by_type: HashMap<RecipeType, Vec<usize>>,
    by_stage: HashMap<Stage, Vec<usize>>,
}

impl RecipeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default catalog: every enclosure but `percentage`, the three
    /// separators, the primitives and the `function` aggregator.
    pub fn with_defaults() -> Self {
        Self::with_features(&[])
    }

    /// The default catalog plus the requested optional recipes.
    pub fn with_features(features: &[SyntaxFeature]) -> Self {
        let enabled = |feature: SyntaxFeature| features.contains(&feature);

        let mut recipes = vec![
            catalog::imaginary(),
            catalog::parenthesis(),
            catalog::braces(),
            catalog::brackets(),
            catalog::quotes(),
        ];
        if enabled(SyntaxFeature::Percentages) {
            recipes.push(catalog::percentage());
        }
        recipes.extend([
            catalog::comma(),
            catalog::colon(),
            catalog::pipe(),
            catalog::string(),
            catalog::nil(),
            catalog::list(),
            catalog::root(),
            catalog::function(),
        ]);
        if enabled(SyntaxFeature::Reserved) {
            recipes.push(catalog::reserved());
        }

        let mut manager = Self::new();
        for recipe in recipes {
            // The catalog names are distinct, so registration cannot collide.
            if let Err(error) = manager.add(recipe) {
                tracing::warn!(%error, "skipping built-in recipe");
            }
        }
        manager
    }

    /// Register a recipe and index it.
    pub fn add(&mut self, recipe: Recipe) -> Result<(), RecipeError> {
        if self.by_name.contains_key(&recipe.name) {
            return Err(RecipeError::Duplicate(recipe.name));
        }

        let index = self.recipes.len();
        tracing::trace!(recipe = %recipe, index, "registering recipe");

        self.by_name.insert(recipe.name.clone(), index);
        self.by_type.entry(recipe.recipe_type()).or_default().push(index);
        self.by_stage.entry(Stage::of(&recipe)).or_default().push(index);

        for character in recipe.character_set() {
            push_unique(self.by_character.entry(character).or_default(), index);
        }

        if let RecipeKind::Enclosure { opener, closer } = recipe.kind {
            push_unique(self.by_opener.entry(opener).or_default(), index);
            push_unique(self.by_closer.entry(closer).or_default(), index);
        }

        self.recipes.push(recipe);
        Ok(())
    }

    /// Replace a registered recipe in place, keeping its declaration slot.
    pub fn replace(&mut self, recipe: Recipe) -> Result<(), RecipeError> {
        let Some(&index) = self.by_name.get(&recipe.name) else {
            return Err(RecipeError::Unknown(recipe.name));
        };
        let mut recipes = self.recipes.clone();
        recipes[index] = recipe;
        let mut rebuilt = Self::new();
        for next in recipes {
            rebuilt.add(next)?;
        }
        *self = rebuilt;
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.by_name.get(name).map(|&i| &self.recipes[i])
    }

    pub fn require(&self, name: &str) -> Result<&Recipe, RecipeError> {
        self.get(name)
            .ok_or_else(|| RecipeError::Unknown(name.to_string()))
    }

    /// Declaration index, used to break ties deterministically.
    pub fn declaration_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Every character some recipe reacts to.
    pub fn characters(&self) -> Vec<char> {
        let mut characters: Vec<char> = self.by_character.keys().copied().collect();
        characters.sort_unstable();
        characters
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&Recipe> {
        indices
            .map(|indices| indices.iter().map(|&i| &self.recipes[i]).collect())
            .unwrap_or_default()
    }

    pub fn by_character(&self, character: char) -> Vec<&Recipe> {
        self.collect(self.by_character.get(&character))
    }

    pub fn by_opener(&self, character: char) -> Vec<&Recipe> {
        self.collect(self.by_opener.get(&character))
    }

    pub fn by_closer(&self, character: char) -> Vec<&Recipe> {
        self.collect(self.by_closer.get(&character))
    }

    pub fn by_type(&self, recipe_type: RecipeType) -> Vec<&Recipe> {
        self.collect(self.by_type.get(&recipe_type))
    }

    pub fn by_stage(&self, stage: Stage) -> Vec<&Recipe> {
        self.collect(self.by_stage.get(&stage))
    }
}

fn push_unique(indices: &mut Vec<usize>, index: usize) {
    if !indices.contains(&index) {
        indices.push(index);
    }
}
