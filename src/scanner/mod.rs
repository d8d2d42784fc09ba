mod walk;

pub use walk::{discover_files, DiscoveryEvent, DiscoveryStream};
