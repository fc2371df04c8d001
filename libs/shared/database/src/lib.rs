pub mod memory;
pub mod record;
pub mod scope;
pub mod store;

pub use memory::MemoryStore;
pub use record::{EntityKind, Record};
pub use scope::{ScopedStore, TenantScope};
pub use store::{RecordStore, StoreError};

#[cfg(any(test, feature = "mock"))]
pub use store::MockRecordStore;
