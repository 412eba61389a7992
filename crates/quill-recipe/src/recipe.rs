//! Recipe descriptors.
//! 配方描述符。

use std::fmt;

/// The broad family a recipe belongs to.
/// 配方所属的类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeType {
    Primitive,
    Enclosure,
    Separator,
    Aggregator,
    Pattern,
}

impl RecipeType {
    pub const ALL: [RecipeType; 5] = [
        RecipeType::Primitive,
        RecipeType::Enclosure,
        RecipeType::Separator,
        RecipeType::Aggregator,
        RecipeType::Pattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeType::Primitive => "primitive",
            RecipeType::Enclosure => "enclosure",
            RecipeType::Separator => "separator",
            RecipeType::Aggregator => "aggregator",
            RecipeType::Pattern => "pattern",
        }
    }
}

impl fmt::Display for RecipeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which relation a restriction list constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    Children,
    Parents,
    Grandparents,
}

/// Whitelists of recipe names or recipe types.
/// 允许的配方名称或类型白名单。
///
/// An empty list places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restrictions {
    pub children: Vec<String>,
    pub parents: Vec<String>,
    pub grandparents: Vec<String>,
}

impl Restrictions {
    pub fn get(&self, restriction: Restriction) -> &[String] {
        match restriction {
            Restriction::Children => &self.children,
            Restriction::Parents => &self.parents,
            Restriction::Grandparents => &self.grandparents,
        }
    }

    fn get_mut(&mut self, restriction: Restriction) -> &mut Vec<String> {
        match restriction {
            Restriction::Children => &mut self.children,
            Restriction::Parents => &mut self.parents,
            Restriction::Grandparents => &mut self.grandparents,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.parents.is_empty() && self.grandparents.is_empty()
    }
}

/// Predicate deciding whether a word starts an aggregate (e.g. a function callee).
pub type Recognizer = fn(&str) -> bool;

/// A keyed set of whole words recognized by a pattern recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxPattern {
    pub key: String,
    pub words: Vec<String>,
}

impl SyntaxPattern {
    pub fn new(key: impl Into<String>, words: &[&str]) -> Self {
        Self {
            key: key.into(),
            words: words.iter().map(|word| word.to_string()).collect(),
        }
    }
}

/// A pattern occurrence inside a run of characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub key: String,
    /// Offset of the first character, relative to the searched slice.
    pub start: usize,
    pub len: usize,
}

/// Construct-specific data of a recipe.
#[derive(Debug, Clone)]
pub enum RecipeKind {
    Primitive,
    Enclosure {
        opener: char,
        closer: char,
    },
    Separator {
        character: char,
    },
    Aggregator {
        keys: Vec<String>,
        /// Enclosure recipe the aggregate is anchored on.
        target: String,
        recognize: Recognizer,
    },
    Pattern {
        patterns: Vec<SyntaxPattern>,
    },
}

/// An immutable descriptor of one syntactic construct.
/// 一种语法结构的不可变描述符。
#[derive(Debug, Clone)]
pub struct Recipe {
    pub name: String,
    /// Glyph used when naming nodes built from this recipe.
    pub prefix: String,
    /// Only meaningful while reorganizing: higher priorities are grouped first.
    pub priority: Option<u32>,
    pub restrictions: Restrictions,
    pub tags: Vec<String>,
    pub kind: RecipeKind,
}

const SUPERSCRIPTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

fn superscript(n: u32) -> String {
    n.to_string()
        .chars()
        .filter_map(|digit| digit.to_digit(10).map(|d| SUPERSCRIPTS[d as usize]))
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn matches_ignore_case(haystack: &[char], word: &[char]) -> bool {
    haystack.len() == word.len()
        && haystack
            .iter()
            .zip(word)
            .all(|(a, b)| a == b || a.to_lowercase().eq(b.to_lowercase()))
}

impl Recipe {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, kind: RecipeKind) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            priority: None,
            restrictions: Restrictions::default(),
            tags: Vec::new(),
            kind,
        }
    }

    pub fn enclosure(name: &str, prefix: &str, opener: char, closer: char) -> Self {
        Self::new(name, prefix, RecipeKind::Enclosure { opener, closer })
    }

    pub fn separator(name: &str, prefix: &str, character: char) -> Self {
        Self::new(name, prefix, RecipeKind::Separator { character })
    }

    pub fn primitive(name: &str, prefix: &str) -> Self {
        Self::new(name, prefix, RecipeKind::Primitive)
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_restriction(mut self, restriction: Restriction, allowed: &[&str]) -> Self {
        let list = self.restrictions.get_mut(restriction);
        list.extend(allowed.iter().map(|name| name.to_string()));
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|tag| tag.to_string()));
        self
    }

    /// Replace the patterns of a pattern recipe. Other kinds are left untouched.
    pub fn with_patterns(mut self, patterns: Vec<SyntaxPattern>) -> Self {
        if let RecipeKind::Pattern { patterns: current } = &mut self.kind {
            *current = patterns;
        }
        self
    }

    pub fn recipe_type(&self) -> RecipeType {
        match self.kind {
            RecipeKind::Primitive => RecipeType::Primitive,
            RecipeKind::Enclosure { .. } => RecipeType::Enclosure,
            RecipeKind::Separator { .. } => RecipeType::Separator,
            RecipeKind::Aggregator { .. } => RecipeType::Aggregator,
            RecipeKind::Pattern { .. } => RecipeType::Pattern,
        }
    }

    pub fn is(&self, recipe_type: RecipeType) -> bool {
        self.recipe_type() == recipe_type
    }

    /// Characters this recipe reacts to while scanning.
    pub fn character_set(&self) -> Vec<char> {
        match self.kind {
            RecipeKind::Enclosure { opener, closer } if opener == closer => vec![opener],
            RecipeKind::Enclosure { opener, closer } => vec![opener, closer],
            RecipeKind::Separator { character } => vec![character],
            _ => Vec::new(),
        }
    }

    pub fn opener(&self) -> Option<char> {
        match self.kind {
            RecipeKind::Enclosure { opener, .. } => Some(opener),
            _ => None,
        }
    }

    pub fn closer(&self) -> Option<char> {
        match self.kind {
            RecipeKind::Enclosure { closer, .. } => Some(closer),
            _ => None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether any (or the given) restriction list is non-empty.
    pub fn has_restriction(&self, restriction: Option<Restriction>) -> bool {
        match restriction {
            Some(restriction) => !self.restrictions.get(restriction).is_empty(),
            None => !self.restrictions.is_empty(),
        }
    }

    /// Every recipe in `recipes` must be whitelisted by name or by type.
    /// 列表中的每个配方都必须按名称或类型出现在白名单中。
    pub fn validate_restriction(&self, restriction: Restriction, recipes: &[&Recipe]) -> bool {
        let allowed = self.restrictions.get(restriction);
        if allowed.is_empty() {
            return true;
        }

        recipes.iter().all(|recipe| {
            allowed
                .iter()
                .any(|entry| entry == &recipe.name || entry == recipe.recipe_type().as_str())
        })
    }

    /// Index of the given key among the aggregate's children.
    pub fn key_index(&self, key: &str) -> Option<usize> {
        match &self.kind {
            RecipeKind::Aggregator { keys, .. } => keys.iter().position(|k| k == key),
            _ => None,
        }
    }

    /// Build a specialized copy named `<name>_<suffix>`.
    /// 构建名为 `<name>_<suffix>` 的特化副本。
    pub fn variant(&self, suffix: &str, n: u32) -> Recipe {
        Recipe {
            name: format!("{}_{}", self.name, suffix),
            prefix: format!("{}{}", self.prefix, superscript(n)),
            ..self.clone()
        }
    }

    /// Name of the recipe every variant descends from.
    pub fn base(&self) -> &str {
        self.name.split('_').next().unwrap_or(&self.name)
    }

    /// Name of the recipe this one was directly cloned from, empty for originals.
    pub fn cloned_from(&self) -> String {
        let parts: Vec<&str> = self.name.split('_').collect();
        parts[..parts.len() - 1].join("_")
    }

    /// Find whole-word pattern occurrences, ignoring case.
    ///
    /// When several words match at one position the first declared one wins;
    /// matches never overlap.
    pub fn find_patterns(&self, text: &[char]) -> Vec<PatternMatch> {
        let RecipeKind::Pattern { patterns } = &self.kind else {
            return Vec::new();
        };

        let words: Vec<(&str, Vec<char>)> = patterns
            .iter()
            .flat_map(|pattern| {
                pattern
                    .words
                    .iter()
                    .map(move |word| (pattern.key.as_str(), word.chars().collect()))
            })
            .filter(|(_, word): &(&str, Vec<char>)| !word.is_empty())
            .collect();

        let mut found = Vec::new();
        let mut i = 0;
        'scan: while i < text.len() {
            let at_boundary = i == 0 || !is_word_char(text[i - 1]);
            if at_boundary {
                for (key, word) in &words {
                    let end = i + word.len();
                    if end > text.len() {
                        continue;
                    }
                    let closes_word = end == text.len() || !is_word_char(text[end]);
                    if closes_word && matches_ignore_case(&text[i..end], word) {
                        found.push(PatternMatch {
                            key: key.to_string(),
                            start: i,
                            len: word.len(),
                        });
                        i = end;
                        continue 'scan;
                    }
                }
            }
            i += 1;
        }

        found
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.recipe_type(), self.name)
    }
}
