//! Object sources.
//! 对象数据源。

use crate::{EnvError, Identifier, Invocation};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type Invoker<T> = Rc<dyn Fn(&Invocation<'_, T>) -> Option<T>>;

/// A value stored in a source.
#[derive(Clone)]
pub enum SourcedValue<T> {
    Simple(T),
    /// Computed at lookup time. `None` means "not available yet".
    Function(Invoker<T>),
    /// Forwards to another identifier of the owning environment.
    Proxy(String),
}

impl<T> SourcedValue<T> {
    pub fn function(invoker: impl Fn(&Invocation<'_, T>) -> Option<T> + 'static) -> Self {
        SourcedValue::Function(Rc::new(invoker))
    }

    pub fn proxy(target: impl Into<String>) -> Self {
        SourcedValue::Proxy(target.into())
    }
}

impl<T: fmt::Debug> fmt::Debug for SourcedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourcedValue::Simple(value) => f.debug_tuple("Simple").field(value).finish(),
            SourcedValue::Function(_) => f.write_str("Function(..)"),
            SourcedValue::Proxy(target) => f.debug_tuple("Proxy").field(target).finish(),
        }
    }
}

/// How an entry is found.
#[derive(Clone)]
pub enum EntryMatcher {
    /// Exact name.
    Key(String),
    /// Predicate over identifiers, e.g. every `XX:Name`.
    Match(Rc<dyn Fn(&Identifier) -> bool>),
}

impl fmt::Debug for EntryMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryMatcher::Key(key) => f.debug_tuple("Key").field(key).finish(),
            EntryMatcher::Match(_) => f.write_str("Match(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceEntry<T> {
    pub name: String,
    pub matcher: EntryMatcher,
    pub value: SourcedValue<T>,
    /// Fallback entries are consulted only after every regular entry of
    /// the environment missed.
    pub fallback: bool,
}

/// Entries indexed by exact key, plus predicate entries.
/// 按键索引的条目以及谓词条目。
#[derive(Debug, Clone)]
pub struct ObjectSource<T> {
    name: String,
    keys: HashMap<String, SourceEntry<T>>,
    /// Predicate entries in insertion order; names are unique.
    matches: Vec<SourceEntry<T>>,
}

impl<T> ObjectSource<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: HashMap::new(),
            matches: Vec::new(),
        }
    }

    /// A source with one simple key entry per pair.
    pub fn from_pairs(
        name: impl Into<String>,
        pairs: impl IntoIterator<Item = (String, T)>,
    ) -> Result<Self, EnvError> {
        let mut source = Self::new(name);
        for (key, value) in pairs {
            source.add_key(key, SourcedValue::Simple(value))?;
        }
        Ok(source)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.keys.len() + self.matches.len()
    }

    pub fn add_key(&mut self, key: impl Into<String>, value: SourcedValue<T>) -> Result<(), EnvError> {
        self.insert_key(key.into(), value, false)
    }

    pub fn add_fallback_key(
        &mut self,
        key: impl Into<String>,
        value: SourcedValue<T>,
    ) -> Result<(), EnvError> {
        self.insert_key(key.into(), value, true)
    }

    /// Insert or overwrite a key entry.
    pub fn set_key(&mut self, key: impl Into<String>, value: SourcedValue<T>) {
        let key = key.into();
        self.keys.insert(
            key.clone(),
            SourceEntry {
                name: key.clone(),
                matcher: EntryMatcher::Key(key),
                value,
                fallback: false,
            },
        );
    }

    fn insert_key(&mut self, key: String, value: SourcedValue<T>, fallback: bool) -> Result<(), EnvError> {
        if self.keys.contains_key(&key) {
            return Err(EnvError::DuplicateKey {
                source_name: self.name.clone(),
                key,
            });
        }
        self.keys.insert(
            key.clone(),
            SourceEntry {
                name: key.clone(),
                matcher: EntryMatcher::Key(key),
                value,
                fallback,
            },
        );
        Ok(())
    }

    pub fn add_match(
        &mut self,
        name: impl Into<String>,
        matcher: impl Fn(&Identifier) -> bool + 'static,
        value: SourcedValue<T>,
    ) -> Result<(), EnvError> {
        self.insert_match(name.into(), Rc::new(matcher), value, false)
    }

    pub fn add_fallback_match(
        &mut self,
        name: impl Into<String>,
        matcher: impl Fn(&Identifier) -> bool + 'static,
        value: SourcedValue<T>,
    ) -> Result<(), EnvError> {
        self.insert_match(name.into(), Rc::new(matcher), value, true)
    }

    fn insert_match(
        &mut self,
        name: String,
        matcher: Rc<dyn Fn(&Identifier) -> bool>,
        value: SourcedValue<T>,
        fallback: bool,
    ) -> Result<(), EnvError> {
        if self.matches.iter().any(|entry| entry.name == name) {
            return Err(EnvError::DuplicateMatch {
                source_name: self.name.clone(),
                name,
            });
        }
        self.matches.push(SourceEntry {
            name,
            matcher: EntryMatcher::Match(matcher),
            value,
            fallback,
        });
        Ok(())
    }

    /// The entry for an identifier among regular (`fallback == false`) or
    /// fallback entries. Keys win over predicates; two matching predicates
    /// are a contract violation.
    pub fn entry(&self, identifier: &Identifier, fallback: bool) -> Result<Option<&SourceEntry<T>>, EnvError> {
        if let Some(entry) = self.keys.get(identifier.name()) {
            if entry.fallback == fallback {
                return Ok(Some(entry));
            }
        }

        let matching: Vec<&SourceEntry<T>> = self
            .matches
            .iter()
            .filter(|entry| entry.fallback == fallback)
            .filter(|entry| match &entry.matcher {
                EntryMatcher::Match(predicate) => predicate(identifier),
                EntryMatcher::Key(key) => key == identifier.name(),
            })
            .collect();

        match matching.as_slice() {
            [] => Ok(None),
            [entry] => Ok(Some(*entry)),
            // Several fallbacks are fine: the first one declared wins.
            [first, ..] if fallback => Ok(Some(*first)),
            entries => Err(EnvError::DuplicateMatches {
                source_name: self.name.clone(),
                identifier: identifier.to_string(),
                entries: entries.iter().map(|entry| entry.name.clone()).collect(),
            }),
        }
    }

    /// Key names, unordered.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}
