//! Environments.
//! 环境。

use crate::source::{ObjectSource, SourceEntry, SourcedValue};
use crate::{EnvError, Identifier, Invocation};
use std::collections::BTreeSet;
use std::rc::Rc;

/// A named chain of sources with an optional parent.
/// 带有可选父环境的数据源链。
///
/// Lookups try every regular entry of the chain (own sources, then the
/// parent) before any fallback entry. Cloning flattens the chain into one
/// detached environment whose sources are shared until written to.
#[derive(Debug)]
pub struct Environment<T> {
    name: String,
    /// Bindings defined directly on this environment; consulted first.
    local: Rc<ObjectSource<T>>,
    sources: Vec<Rc<ObjectSource<T>>>,
    parent: Option<Box<Environment<T>>>,
}

impl<T: Clone> Clone for Environment<T> {
    fn clone(&self) -> Self {
        let mut sources: Vec<_> = self.sources.iter().cloned().collect();
        let mut current = self.parent.as_deref();
        while let Some(env) = current {
            sources.push(Rc::clone(&env.local));
            sources.extend(env.sources.iter().cloned());
            current = env.parent.as_deref();
        }
        Environment {
            name: self.name.clone(),
            local: Rc::clone(&self.local),
            sources,
            parent: None,
        }
    }
}

impl<T: Clone> Environment<T> {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            local: Rc::new(ObjectSource::new(format!("{name}:local"))),
            name,
            sources: Vec::new(),
            parent: None,
        }
    }

    pub fn with_parent(name: impl Into<String>, parent: Environment<T>) -> Self {
        let mut env = Self::new(name);
        env.parent = Some(Box::new(parent));
        env
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Environment<T>> {
        self.parent.as_deref()
    }

    pub fn add_source(&mut self, source: ObjectSource<T>) {
        self.sources.push(Rc::new(source));
    }

    pub fn add_shared_source(&mut self, source: Rc<ObjectSource<T>>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[Rc<ObjectSource<T>>] {
        &self.sources
    }

    /// Define a local binding. Redefinition is an error.
    pub fn define(&mut self, name: impl Into<String>, value: T) -> Result<(), EnvError> {
        Rc::make_mut(&mut self.local).add_key(name, SourcedValue::Simple(value))
    }

    /// Define or overwrite a local binding.
    pub fn set(&mut self, name: impl Into<String>, value: SourcedValue<T>) {
        Rc::make_mut(&mut self.local).set_key(name, value);
    }

    /// First matching entry in the chain, regular entries before fallbacks.
    fn entry(&self, identifier: &Identifier) -> Result<Option<&SourceEntry<T>>, EnvError> {
        for fallback in [false, true] {
            let mut current = Some(self);
            while let Some(env) = current {
                for source in std::iter::once(&env.local).chain(env.sources.iter()) {
                    if let Some(entry) = source.entry(identifier, fallback)? {
                        tracing::trace!(
                            identifier = %identifier,
                            source = source.name(),
                            fallback,
                            "resolved entry"
                        );
                        return Ok(Some(entry));
                    }
                }
                current = env.parent.as_deref();
            }
        }
        Ok(None)
    }

    pub fn has(&self, name: &str) -> Result<bool, EnvError> {
        self.has_visiting(name, &mut Vec::new())
    }

    fn has_visiting(&self, name: &str, visited: &mut Vec<String>) -> Result<bool, EnvError> {
        let identifier = Identifier::named(name);
        match self.entry(&identifier)? {
            None => Ok(false),
            Some(entry) => match &entry.value {
                SourcedValue::Proxy(target) => {
                    enter(visited, name)?;
                    self.has_visiting(target, visited)
                }
                _ => Ok(true),
            },
        }
    }

    /// Value bound to a name. `Ok(None)` when nothing is bound yet.
    pub fn get(&self, name: &str) -> Result<Option<T>, EnvError> {
        self.call(name, &[])
    }

    /// Value of a name invoked with call arguments. Simple values ignore the
    /// arguments.
    pub fn call(&self, name: &str, args: &[T]) -> Result<Option<T>, EnvError> {
        self.call_visiting(name, args, &mut Vec::new())
    }

    fn call_visiting(&self, name: &str, args: &[T], visited: &mut Vec<String>) -> Result<Option<T>, EnvError> {
        let identifier = Identifier::named(name);
        let Some(entry) = self.entry(&identifier)? else {
            return Ok(None);
        };
        match &entry.value {
            SourcedValue::Simple(value) => Ok(Some(value.clone())),
            SourcedValue::Function(invoker) => Ok(invoker(&Invocation {
                identifier: &identifier,
                args,
            })),
            SourcedValue::Proxy(target) => {
                enter(visited, name)?;
                self.call_visiting(target, args, visited)
            }
        }
    }

    /// Identifiers a name resolves through, following proxies.
    pub fn associated_identifiers(&self, name: &str) -> Result<Vec<Identifier>, EnvError> {
        let mut visited = Vec::new();
        let mut out = Vec::new();
        let mut current = name.to_string();
        loop {
            let identifier = Identifier::named(current.as_str());
            let Some(entry) = self.entry(&identifier)? else {
                return Ok(out);
            };
            let SourcedValue::Proxy(target) = &entry.value else {
                return Ok(out);
            };
            enter(&mut visited, &current)?;
            out.push(Identifier::named(target.as_str()));
            current = target.clone();
        }
    }

    /// Every key name of the chain, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        let mut current = Some(self);
        while let Some(env) = current {
            for source in std::iter::once(&env.local).chain(env.sources.iter()) {
                names.extend(source.keys().map(str::to_string));
            }
            current = env.parent.as_deref();
        }
        names.into_iter().collect()
    }
}

fn enter(visited: &mut Vec<String>, name: &str) -> Result<(), EnvError> {
    if visited.iter().any(|seen| seen == name) {
        let mut chain = visited.clone();
        chain.push(name.to_string());
        return Err(EnvError::ProxyCycle { chain });
    }
    visited.push(name.to_string());
    Ok(())
}
