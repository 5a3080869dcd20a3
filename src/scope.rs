// Lexical scope chains stored in an arena
//
// Frames are addressed by `ScopeId`; each frame records the id of its
// enclosing frame. The checker stores symbols in it, the interpreter
// stores runtime values.

use std::collections::HashMap;

/// Frames pushed later compare greater
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(usize);

#[derive(Debug)]
struct Frame<T> {
    bindings: HashMap<String, T>,
    parent: Option<ScopeId>,
}

#[derive(Debug)]
pub struct ScopeArena<T> {
    frames: Vec<Frame<T>>,
}

impl<T> Default for ScopeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScopeArena<T> {
    /// Create an arena holding only the global frame
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                bindings: HashMap::new(),
                parent: None,
            }],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Open a new frame enclosed by `parent`
    pub fn push(&mut self, parent: ScopeId) -> ScopeId {
        self.frames.push(Frame {
            bindings: HashMap::new(),
            parent: Some(parent),
        });
        ScopeId(self.frames.len() - 1)
    }

    /// Id the next pushed frame will get
    pub fn mark(&self) -> ScopeId {
        ScopeId(self.frames.len())
    }

    /// Drop every frame pushed since `mark`. Ids at or above `mark` become
    /// dangling, so nothing may still refer to them. The global frame stays.
    pub fn truncate(&mut self, mark: ScopeId) {
        self.frames.truncate(mark.0.max(1));
    }

    /// Bind `name` in exactly this frame, replacing any previous binding there
    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>, value: T) -> Option<T> {
        self.frames[scope.0].bindings.insert(name.into(), value)
    }

    /// Look only in this frame
    pub fn get_local(&self, scope: ScopeId, name: &str) -> Option<&T> {
        self.frames[scope.0].bindings.get(name)
    }

    /// Id of the innermost frame on the chain from `scope` that binds `name`
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if frame.bindings.contains_key(name) {
                return Some(id);
            }
            current = frame.parent;
        }
        None
    }

    /// Search `scope` and then each enclosing frame outward
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&T> {
        self.resolve(scope, name)
            .and_then(|id| self.frames[id.0].bindings.get(name))
    }

    /// Overwrite the binding in the frame where `name` is first found.
    /// Gives the value back when no frame on the chain binds `name`.
    pub fn assign(&mut self, scope: ScopeId, name: &str, value: T) -> Result<(), T> {
        match self.resolve(scope, name) {
            Some(id) => {
                if let Some(slot) = self.frames[id.0].bindings.get_mut(name) {
                    *slot = value;
                }
                Ok(())
            }
            None => Err(value),
        }
    }
}
