//! Context-stacked shortcut registry.
//!
//! Bindings live in named contexts. The registry keeps a stack of active
//! contexts with `global` permanently at the bottom; a chord is resolved from
//! the top of the stack down, and a modal context stops the search so nothing
//! beneath it can fire.

use super::keys::KeyChord;
use crate::domain::error::{Result, TodoError};
use std::collections::HashMap;

/// Name of the base context, always active.
pub const GLOBAL_CONTEXT: &str = "global";

#[derive(Debug, Clone)]
struct Context<A> {
    modal: bool,
    bindings: HashMap<KeyChord, A>,
}

impl<A> Context<A> {
    fn new(modal: bool) -> Self {
        Self {
            modal,
            bindings: HashMap::new(),
        }
    }
}

/// Maps key chords to actions of type `A` across a stack of contexts.
///
/// # Examples
///
/// ```
/// use todo_core::shortcuts::{KeyChord, ShortcutRegistry};
///
/// let mut registry = ShortcutRegistry::new();
/// registry.register("global", "/".parse()?, "focus search")?;
/// registry.define_context("dialog", true);
/// registry.register("dialog", "esc".parse()?, "close dialog")?;
///
/// let slash: KeyChord = "/".parse()?;
/// assert_eq!(registry.dispatch(&slash), Some(&"focus search"));
///
/// registry.push_context("dialog")?;
/// assert_eq!(registry.dispatch(&slash), None);
/// # Ok::<(), todo_core::domain::TodoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ShortcutRegistry<A> {
    contexts: HashMap<String, Context<A>>,
    stack: Vec<String>,
}

impl<A> Default for ShortcutRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> ShortcutRegistry<A> {
    #[must_use]
    pub fn new() -> Self {
        let mut contexts = HashMap::new();
        contexts.insert(GLOBAL_CONTEXT.to_string(), Context::new(false));
        Self {
            contexts,
            stack: vec![GLOBAL_CONTEXT.to_string()],
        }
    }

    /// Creates `name` if missing and sets whether it is modal.
    pub fn define_context(&mut self, name: &str, modal: bool) {
        self.contexts
            .entry(name.to_string())
            .and_modify(|context| context.modal = modal)
            .or_insert_with(|| Context::new(modal));
    }

    /// Binds `chord` to `action` in `context`, creating the context if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Shortcut`] if `chord` is already bound in `context`.
    pub fn register(&mut self, context: &str, chord: KeyChord, action: A) -> Result<()> {
        let entry = self
            .contexts
            .entry(context.to_string())
            .or_insert_with(|| Context::new(false));

        if entry.bindings.contains_key(&chord) {
            return Err(TodoError::Shortcut(format!("{chord} is already bound in '{context}'")));
        }
        entry.bindings.insert(chord, action);
        tracing::trace!(context = %context, chord = %chord, "shortcut registered");
        Ok(())
    }

    /// Removes a binding, returning its action.
    pub fn unregister(&mut self, context: &str, chord: &KeyChord) -> Option<A> {
        self.contexts.get_mut(context)?.bindings.remove(chord)
    }

    /// Activates `name` on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Shortcut`] if the context was never defined.
    pub fn push_context(&mut self, name: &str) -> Result<()> {
        if !self.contexts.contains_key(name) {
            return Err(TodoError::Shortcut(format!("unknown shortcut context '{name}'")));
        }
        self.stack.push(name.to_string());
        tracing::debug!(context = %name, depth = self.stack.len(), "shortcut context pushed");
        Ok(())
    }

    /// Deactivates the top context. The global context is never popped.
    pub fn pop_context(&mut self) -> Option<String> {
        if self.stack.len() <= 1 {
            return None;
        }
        let popped = self.stack.pop();
        tracing::debug!(context = ?popped, depth = self.stack.len(), "shortcut context popped");
        popped
    }

    /// Removes the topmost occurrence of `name` wherever it sits in the stack.
    ///
    /// Returns `false` if `name` is not active or is the global context.
    pub fn remove_context(&mut self, name: &str) -> bool {
        if name == GLOBAL_CONTEXT {
            return false;
        }
        match self.stack.iter().rposition(|active| active == name) {
            Some(index) => {
                self.stack.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn active_context(&self) -> &str {
        self.stack.last().map_or(GLOBAL_CONTEXT, String::as_str)
    }

    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.stack.iter().any(|active| active == name)
    }

    #[must_use]
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    /// Resolves `chord` against the active stack, top first.
    #[must_use]
    pub fn dispatch(&self, chord: &KeyChord) -> Option<&A> {
        for name in self.stack.iter().rev() {
            let Some(context) = self.contexts.get(name) else {
                continue;
            };
            if let Some(action) = context.bindings.get(chord) {
                tracing::trace!(context = %name, chord = %chord, "shortcut matched");
                return Some(action);
            }
            if context.modal {
                break;
            }
        }
        None
    }

    /// All bindings of `context`, sorted by their chord's text.
    #[must_use]
    pub fn bindings(&self, context: &str) -> Vec<(KeyChord, &A)> {
        let mut bindings: Vec<(KeyChord, &A)> = self
            .contexts
            .get(context)
            .map(|c| c.bindings.iter().map(|(chord, action)| (*chord, action)).collect())
            .unwrap_or_default();
        bindings.sort_by_key(|(chord, _)| chord.to_string());
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(s: &str) -> KeyChord {
        s.parse().unwrap()
    }

    #[test]
    fn top_of_stack_wins() {
        let mut registry = ShortcutRegistry::new();
        registry.register(GLOBAL_CONTEXT, chord("esc"), "global-esc").unwrap();
        registry.register("selection", chord("esc"), "exit-selection").unwrap();

        assert_eq!(registry.dispatch(&chord("esc")), Some(&"global-esc"));
        registry.push_context("selection").unwrap();
        assert_eq!(registry.dispatch(&chord("esc")), Some(&"exit-selection"));
        assert_eq!(registry.pop_context().as_deref(), Some("selection"));
        assert_eq!(registry.dispatch(&chord("esc")), Some(&"global-esc"));
    }

    #[test]
    fn global_cannot_be_popped() {
        let mut registry: ShortcutRegistry<()> = ShortcutRegistry::new();
        assert_eq!(registry.pop_context(), None);
        assert!(!registry.remove_context(GLOBAL_CONTEXT));
        assert_eq!(registry.active_context(), GLOBAL_CONTEXT);
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let mut registry = ShortcutRegistry::new();
        registry.register("global", chord("ctrl+a"), 1).unwrap();
        assert!(matches!(registry.register("global", chord("ctrl+a"), 2), Err(TodoError::Shortcut(_))));
        registry.register("other", chord("ctrl+a"), 3).unwrap();
    }

    #[test]
    fn non_modal_falls_through_modal_blocks() {
        let mut registry = ShortcutRegistry::new();
        registry.register(GLOBAL_CONTEXT, chord("/"), "search").unwrap();
        registry.define_context("list", false);
        registry.define_context("confirm", true);

        registry.push_context("list").unwrap();
        assert_eq!(registry.dispatch(&chord("/")), Some(&"search"));

        registry.push_context("confirm").unwrap();
        assert_eq!(registry.dispatch(&chord("/")), None);
    }

    #[test]
    fn unknown_context_cannot_be_pushed() {
        let mut registry: ShortcutRegistry<()> = ShortcutRegistry::new();
        assert!(registry.push_context("missing").is_err());
    }

    #[test]
    fn remove_context_from_middle() {
        let mut registry: ShortcutRegistry<()> = ShortcutRegistry::new();
        registry.define_context("a", false);
        registry.define_context("b", false);
        registry.push_context("a").unwrap();
        registry.push_context("b").unwrap();

        assert!(registry.remove_context("a"));
        assert_eq!(registry.stack(), ["global", "b"]);
    }
}
