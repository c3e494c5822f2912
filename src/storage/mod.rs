pub mod compaction;
pub mod store;
pub mod version;

pub use compaction::{CompactionStats, Compactor, Vacuum};
pub use store::VersionStore;
pub use version::{Version, VersionChain};
