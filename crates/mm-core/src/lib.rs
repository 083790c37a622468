pub mod connector;
pub mod error;
pub mod id;
pub mod layout;
pub mod model;
pub mod outline;
pub mod snapshot;
pub mod store;

pub use connector::{Connector, Point, connector_between};
pub use error::{Error, Result};
pub use id::NodeId;
pub use layout::{Extent, LaidOutNode, Layout, LayoutConfig, resolve_layout, resolve_layout_at};
pub use model::*;
pub use outline::{emit_outline, parse_outline};
pub use snapshot::{Snapshot, SnapshotNode};
pub use store::{KeyValueStore, MemoryStore, UserData};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
