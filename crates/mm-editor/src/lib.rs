pub mod commands;
pub mod editor;
pub mod engine;
pub mod input;
pub mod shortcuts;
pub mod tool;

pub use commands::{CommandStack, DEFAULT_UNDO_DEPTH};
pub use editor::{Editor, EventOutcome};
pub use engine::{MindMapEngine, Mutation};
pub use input::InputEvent;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tool::{PointerTool, Tool, ToolAction};
