//! Undo/Redo command stack.
//!
//! Every applied mutation is recorded together with the inverse the engine
//! returned for it. Undo applies the inverse; redo applies the forward
//! mutation again. Both go through `apply_mutation`, so both relayout.
//!
//! View changes (pan, zoom) and selection are not recorded.

use crate::engine::{MindMapEngine, Mutation};

/// Undo depth kept by a new editor.
pub const DEFAULT_UNDO_DEPTH: usize = 200;

/// A forward mutation and the mutation that reverts it.
#[derive(Debug, Clone)]
pub struct Command {
    pub forward: Mutation,
    pub inverse: Mutation,
    pub description: String,
}

/// Bounded undo history with a redo stack.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(256)),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Apply a mutation and record it. Returns `false` (and records
    /// nothing) if the engine rejected the mutation as a no-op.
    pub fn execute(&mut self, engine: &mut MindMapEngine, mutation: Mutation, description: &str) -> bool {
        let Some(inverse) = engine.apply_mutation(mutation.clone()) else {
            log::debug!("{description}: no-op, not recorded");
            return false;
        };

        self.undo_stack.push(Command {
            forward: mutation,
            inverse,
            description: description.to_string(),
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }

        // Clear redo stack on new action
        self.redo_stack.clear();
        true
    }

    /// Undo the last command, returning its description.
    pub fn undo(&mut self, engine: &mut MindMapEngine) -> Option<String> {
        let mut cmd = self.undo_stack.pop()?;
        // The recorded forward may carry data that only exists after the
        // inverse has run (a restored branch), so refresh it.
        if let Some(forward) = engine.apply_mutation(cmd.inverse.clone()) {
            cmd.forward = forward;
        } else {
            log::warn!("undo of {:?} did not apply", cmd.description);
        }
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command, returning its description.
    pub fn redo(&mut self, engine: &mut MindMapEngine) -> Option<String> {
        let mut cmd = self.redo_stack.pop()?;
        if let Some(inverse) = engine.apply_mutation(cmd.forward.clone()) {
            cmd.inverse = inverse;
        } else {
            log::warn!("redo of {:?} did not apply", cmd.description);
        }
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Forget all history, e.g. after loading another diagram.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
