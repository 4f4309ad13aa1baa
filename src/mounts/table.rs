/// Mount table parsing
/// Format: device mountpoint fstype options dump pass
use crate::config::types::{MountCheckError, Result};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

/// One mounted filesystem from the mount table.
///
/// The mountpoint keeps the exact bytes from the table (after escape
/// decoding) so paths that are not valid UTF-8 are probed unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountDescriptor {
    pub device: String,
    pub mountpoint: PathBuf,
    pub fstype: String,
}

impl MountDescriptor {
    pub fn new(
        device: impl Into<String>,
        mountpoint: impl Into<PathBuf>,
        fstype: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            mountpoint: mountpoint.into(),
            fstype: fstype.into(),
        }
    }
}

/// Read and parse the mount table at `path`.
///
/// Only a failure to open or read the table is an error. Individual lines
/// that cannot be parsed are skipped.
pub fn read_mount_table(path: &Path) -> Result<Vec<MountDescriptor>> {
    let file = File::open(path).map_err(|e| {
        MountCheckError::MountTable(format!("Failed to open {}: {}", path.display(), e))
    })?;

    parse_mount_table(BufReader::new(file)).map_err(|e| match e {
        MountCheckError::Io(io) => {
            MountCheckError::MountTable(format!("Failed to read {}: {}", path.display(), io))
        }
        other => other,
    })
}

/// Parse mount table content from any buffered reader.
///
/// Lines are handled as raw bytes; the table is not required to be UTF-8.
pub fn parse_mount_table<R: BufRead>(reader: R) -> Result<Vec<MountDescriptor>> {
    let mut mounts = Vec::new();

    for line in reader.split(b'\n') {
        if let Some(mount) = parse_mount_line(&line?) {
            mounts.push(mount);
        }
    }

    Ok(mounts)
}

/// Parse a single mount table line; `None` when it has fewer than three fields
pub fn parse_mount_line(line: &[u8]) -> Option<MountDescriptor> {
    let mut fields = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|field| !field.is_empty());
    let device = fields.next()?;
    let mountpoint = fields.next()?;
    let fstype = fields.next()?;

    Some(MountDescriptor {
        device: String::from_utf8_lossy(&unescape_octal(device)).into_owned(),
        mountpoint: PathBuf::from(OsString::from_vec(unescape_octal(mountpoint))),
        fstype: String::from_utf8_lossy(fstype).into_owned(),
    })
}

/// Decode the kernel's `\ooo` escapes (space, tab, newline, backslash).
/// Sequences that are not three octal digits are kept as-is.
fn unescape_octal(field: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(field.len());
    let mut i = 0;

    while i < field.len() {
        if field[i] == b'\\' && i + 3 < field.len() {
            let digits = &field[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(field[i]);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::os::unix::ffi::OsStrExt;

    #[test]
    fn parses_typical_table() {
        let table = "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
server:/export /mnt/share nfs4 rw,vers=4.2 0 0
";
        let mounts = parse_mount_table(Cursor::new(table)).unwrap();
        assert_eq!(
            mounts,
            vec![
                MountDescriptor::new("/dev/sda1", "/", "ext4"),
                MountDescriptor::new("proc", "/proc", "proc"),
                MountDescriptor::new("server:/export", "/mnt/share", "nfs4"),
            ]
        );
    }

    #[test]
    fn short_lines_are_skipped() {
        let table = "\n/dev/sdb1\n/dev/sdb2 /data\n  \n/dev/sdb3 /srv xfs\n";
        let mounts = parse_mount_table(Cursor::new(table)).unwrap();
        assert_eq!(mounts, vec![MountDescriptor::new("/dev/sdb3", "/srv", "xfs")]);
    }

    #[test]
    fn extra_whitespace_is_tolerated() {
        let mount = parse_mount_line(b"tmpfs\t/run   tmpfs rw 0 0").unwrap();
        assert_eq!(mount, MountDescriptor::new("tmpfs", "/run", "tmpfs"));
    }

    #[test]
    fn octal_escapes_are_decoded() {
        let mount = parse_mount_line(br"/dev/sdc1 /media/USB\040Drive vfat rw 0 0").unwrap();
        assert_eq!(mount.mountpoint, Path::new("/media/USB Drive"));

        let mount = parse_mount_line(br"//nas/a\134b /mnt/back\134slash cifs rw 0 0").unwrap();
        assert_eq!(mount.device, r"//nas/a\b");
        assert_eq!(mount.mountpoint, Path::new(r"/mnt/back\slash"));
    }

    #[test]
    fn invalid_escapes_are_kept_verbatim() {
        assert_eq!(unescape_octal(br"/mnt/a\09"), br"/mnt/a\09");
        assert_eq!(unescape_octal(br"/mnt/trailing\"), br"/mnt/trailing\");
        assert_eq!(unescape_octal(br"/mnt/\777x"), br"/mnt/\777x");
    }

    #[test]
    fn latin1_mountpoint_keeps_the_rest_of_the_table() {
        let table: &[u8] = b"/dev/sda1 / ext4 rw 0 0\n\
/dev/sdb1 /mnt/caf\xe9 vfat rw 0 0\n\
nas:/vol /mnt/vol nfs rw 0 0\n";
        let mounts = parse_mount_table(Cursor::new(table)).unwrap();

        assert_eq!(mounts.len(), 3);
        assert_eq!(mounts[0].mountpoint, Path::new("/"));
        assert_eq!(mounts[1].mountpoint.as_os_str().as_bytes(), b"/mnt/caf\xe9");
        assert_eq!(mounts[1].fstype, "vfat");
        assert_eq!(mounts[2].mountpoint, Path::new("/mnt/vol"));
    }

    #[test]
    fn escaped_non_utf8_bytes_are_kept_exact() {
        let mount = parse_mount_line(br"/dev/sdb1 /mnt/caf\351\040bar vfat rw 0 0").unwrap();
        assert_eq!(mount.mountpoint.as_os_str().as_bytes(), b"/mnt/caf\xe9 bar");
    }

    #[test]
    fn unreadable_table_is_an_error() {
        let path = std::env::temp_dir().join(format!("mountprobe-no-table-{}", uuid::Uuid::new_v4()));
        let err = read_mount_table(&path).unwrap_err();
        assert!(matches!(err, MountCheckError::MountTable(_)));
    }
}
