use crate::config::types::FilterSet;
use crate::mounts::table::MountDescriptor;

/// Keep the mounts whose filesystem type passes `filter`, preserving table order
pub fn filter_mounts(mounts: Vec<MountDescriptor>, filter: &FilterSet) -> Vec<MountDescriptor> {
    mounts
        .into_iter()
        .filter(|mount| filter.includes(&mount.fstype))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn mounts() -> Vec<MountDescriptor> {
        vec![
            MountDescriptor::new("/dev/sda1", "/", "ext4"),
            MountDescriptor::new("tmpfs", "/run", "tmpfs"),
            MountDescriptor::new("proc", "/proc", "proc"),
            MountDescriptor::new("nas:/vol", "/mnt/vol", "nfs"),
        ]
    }

    fn types(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn no_filters_keeps_everything_in_order() {
        let kept = filter_mounts(mounts(), &FilterSet::default());
        assert_eq!(kept, mounts());
    }

    #[test]
    fn disabled_types_are_dropped() {
        let filter = FilterSet::new(None, Some(types(&["tmpfs", "proc"]).as_slice()));
        let kept: Vec<_> = filter_mounts(mounts(), &filter)
            .into_iter()
            .map(|m| m.mountpoint)
            .collect();
        assert_eq!(kept, vec![PathBuf::from("/"), PathBuf::from("/mnt/vol")]);
    }

    #[test]
    fn enabled_types_restrict_the_set() {
        let filter = FilterSet::new(Some(types(&["nfs", "ext4"]).as_slice()), None);
        let kept: Vec<_> = filter_mounts(mounts(), &filter)
            .into_iter()
            .map(|m| m.fstype)
            .collect();
        assert_eq!(kept, vec!["ext4", "nfs"]);
    }

    #[test]
    fn empty_enabled_list_excludes_everything() {
        let filter = FilterSet::new(Some(&[][..]), None);
        assert!(filter_mounts(mounts(), &filter).is_empty());
    }
}
