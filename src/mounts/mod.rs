//! Mount enumeration
//!
//! - [`table`]: mount table reader
//! - [`filter`]: fstype allow/deny filtering

pub mod filter;
pub mod table;

pub use filter::filter_mounts;
pub use table::{parse_mount_table, read_mount_table, MountDescriptor};
