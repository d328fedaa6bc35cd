pub mod asset;
pub mod video;

pub use asset::{AspectClass, StorageKey, StorageLocator};
pub use video::VideoRecord;
