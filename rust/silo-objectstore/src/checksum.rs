//! Content checksums for shared-store objects.
//!
//! The store records an xxh3 checksum object next to every ingested data
//! object, named `<object>.crc`. Downloads verify the data against the
//! recorded checksum and leave an equivalent local sidecar file next to
//! every downloaded file.

use xxhash_rust::xxh3::xxh3_64;

/// File name suffix of checksum sidecars, both in the store and on local disk.
pub const CHECKSUM_SUFFIX: &str = ".crc";

/// Computes the checksum of object content.
pub fn content_checksum(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// Encodes a checksum the way it is stored in sidecar files.
pub fn encode_checksum(checksum: u64) -> String {
    format!("{checksum:016x}")
}

/// Returns `true` if the file name denotes a checksum sidecar.
pub fn is_sidecar_name(name: &str) -> bool {
    name.ends_with(CHECKSUM_SUFFIX)
}

/// Returns the sidecar name for a data file name.
pub fn sidecar_name(name: &str) -> String {
    format!("{name}{CHECKSUM_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_naming() {
        assert!(is_sidecar_name("segment-0000000001.seg.crc"));
        assert!(!is_sidecar_name("segment-0000000001.seg"));
        assert_eq!(sidecar_name("manifest.json"), "manifest.json.crc");
    }

    #[test]
    fn test_checksum_encoding() {
        let sum = content_checksum(b"abcdefg");
        assert_eq!(encode_checksum(sum).len(), 16);
        assert_eq!(sum, content_checksum(b"abcdefg"));
        assert_ne!(sum, content_checksum(b"abcdefh"));
    }
}
