//! Character-by-character tree construction.
//! 逐字符构建语法树。

use crate::node::{Node, NodeId, Relevant, UnbalancedMarker};
use crate::tree::Tree;
use quill_recipe::{Recipe, RecipeKind, RecipeManager, Restriction, catalog};
use std::collections::HashMap;
use std::rc::Rc;

/// What to do with the character under the cursor.
#[derive(Debug)]
enum Directive<'r> {
    String,
    Unbalanced(&'r Recipe),
    OpenNew(&'r Recipe),
    CloseCurrent,
    OpenAndCloseAtChar(&'r Recipe),
}

/// (position, enclosure recipe, recipe of the node it would open inside)
type AttemptKey = (usize, String, String);

struct Resolver<'t> {
    tree: &'t mut Tree,
    recipes: Rc<RecipeManager>,
    /// Openers already known to run off the end of the source.
    failed: HashMap<AttemptKey, NodeId>,
}

/// Resolve the root of a freshly created tree.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn resolve(tree: &mut Tree) {
    let recipes = tree.recipes_rc();
    let root = tree.root();
    let mut resolver = Resolver {
        tree,
        recipes,
        failed: HashMap::new(),
    };
    resolver.resolve(root);
}

impl Resolver<'_> {
    /// Scan a node's range. Returns false when an enclosure never closes.
    fn resolve(&mut self, node: NodeId) -> bool {
        let recipes = Rc::clone(&self.recipes);
        let own = recipes.get(self.tree.syntax(node));
        let own_closer = own.and_then(Recipe::closer);
        let is_enclosure = own.is_some_and(|recipe| recipe.opener().is_some());

        let start = self.tree.node(node).start;
        let len = self.tree.source().len();
        let mut cursor = if is_enclosure { start + 1 } else { start };
        let mut carry: Option<NodeId> = None;

        while cursor < len {
            let Some(character) = self.tree.source().char_at(cursor) else {
                break;
            };

            let directive = if Some(character) == own_closer {
                Directive::CloseCurrent
            } else {
                self.directive(&recipes, node, character)
            };

            match directive {
                Directive::String => {
                    carry = Some(self.extend_carry(node, carry, cursor));
                    cursor += 1;
                }
                Directive::CloseCurrent => {
                    let target = self.tree.node_mut(node);
                    target.length = Some(cursor - start + 1);
                    target.relevant = vec![Relevant::Index(start), Relevant::Index(cursor)];
                    return true;
                }
                Directive::Unbalanced(recipe) => {
                    tracing::trace!(index = cursor, syntax = %recipe.name, "stray closer");
                    self.tree.node_mut(node).unbalanced.push(UnbalancedMarker {
                        index: cursor,
                        syntax: recipe.name.clone(),
                        attempt: None,
                    });
                    carry = Some(self.extend_carry(node, carry, cursor));
                    cursor += 1;
                }
                Directive::OpenAndCloseAtChar(recipe) => {
                    let mut child = Node::new(recipe.name.clone(), cursor, Some(1));
                    child.relevant.push(Relevant::Index(cursor));
                    let child = self.tree.alloc(child);
                    self.tree.push_child(node, child);
                    carry = None;
                    cursor += 1;
                }
                Directive::OpenNew(recipe) => {
                    match self.open(node, recipe, cursor) {
                        Ok(child) => {
                            carry = None;
                            cursor = self
                                .tree
                                .node(child)
                                .end_exclusive()
                                .unwrap_or(cursor + 1);
                        }
                        Err(attempt) => {
                            tracing::trace!(index = cursor, syntax = %recipe.name, "unclosed opener");
                            self.tree.node_mut(node).unbalanced.push(UnbalancedMarker {
                                index: cursor,
                                syntax: recipe.name.clone(),
                                attempt: Some(attempt),
                            });
                            carry = self.resume_carry(node, cursor);
                            carry = Some(self.extend_carry(node, carry, cursor));
                            cursor += 1;
                        }
                    }
                }
            }
        }

        let target = self.tree.node_mut(node);
        if target.is_root() {
            target.length = Some(len);
            return true;
        }
        target.length = None;
        false
    }

    fn directive<'r>(
        &self,
        recipes: &'r RecipeManager,
        node: NodeId,
        character: char,
    ) -> Directive<'r> {
        let current = self.tree.recipe(node);
        let grandparent: Vec<&Recipe> = self
            .tree
            .parent(node)
            .and_then(|parent| self.tree.recipe(parent))
            .into_iter()
            .collect();
        let parents: Vec<&Recipe> = current.into_iter().collect();

        let candidates: Vec<&Recipe> = recipes
            .by_character(character)
            .into_iter()
            .filter(|recipe| {
                recipe.validate_restriction(Restriction::Parents, &parents)
                    && recipe.validate_restriction(Restriction::Grandparents, &grandparent)
                    && current
                        .is_none_or(|own| own.validate_restriction(Restriction::Children, &[*recipe]))
            })
            .collect();

        let Some(&recipe) = candidates.first() else {
            return Directive::String;
        };
        if candidates.len() > 1 {
            tracing::debug!(
                %character,
                chosen = %recipe.name,
                candidates = candidates.len(),
                "several recipes react to one character, using the first declared"
            );
        }

        match recipe.kind {
            RecipeKind::Enclosure { opener, .. } if opener == character => {
                Directive::OpenNew(recipe)
            }
            RecipeKind::Enclosure { .. } => Directive::Unbalanced(recipe),
            RecipeKind::Separator { .. } => Directive::OpenAndCloseAtChar(recipe),
            _ => Directive::String,
        }
    }

    /// Open and resolve a child enclosure. On failure the child is detached
    /// and returned as the attempt.
    fn open(&mut self, parent: NodeId, recipe: &Recipe, at: usize) -> Result<NodeId, NodeId> {
        let key = (at, recipe.name.clone(), self.tree.syntax(parent).to_string());
        if let Some(&attempt) = self.failed.get(&key) {
            return Err(attempt);
        }

        let child = self.tree.alloc(Node::new(recipe.name.clone(), at, None));
        self.tree.push_child(parent, child);

        if self.resolve(child) {
            return Ok(child);
        }

        self.tree.detach_child(parent, child);
        self.failed.insert(key, child);
        Err(child)
    }

    fn extend_carry(&mut self, parent: NodeId, carry: Option<NodeId>, at: usize) -> NodeId {
        if let Some(carry) = carry {
            let node = self.tree.node_mut(carry);
            node.length = node.length.map(|length| length + 1);
            return carry;
        }
        let string = self.tree.alloc(Node::new(catalog::STRING, at, Some(1)));
        self.tree.push_child(parent, string);
        string
    }

    /// Continue the trailing string child when it ends right at `at`.
    fn resume_carry(&self, parent: NodeId, at: usize) -> Option<NodeId> {
        let last = *self.tree.children(parent).last()?;
        let node = self.tree.node(last);
        (node.syntax() == catalog::STRING && node.end_exclusive() == Some(at)).then_some(last)
    }
}
