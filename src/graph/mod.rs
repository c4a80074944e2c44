//! Data model and external graph-store interface (spec §3, §4.8, §6).

pub mod batch;
pub mod memory;
pub mod model;
pub mod store;

pub use batch::BatchIngestor;
pub use memory::InMemoryGraphStore;
pub use model::{EdgeWrite, EmittedEntity, NodeBuilder, NodeDescriptor, NodeWrite, Props, PropValue};
pub use store::{GraphStore, StoreError, StoreResult};
