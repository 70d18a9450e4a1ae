//! Content fingerprinting.
//!
//! A fingerprint is the SHA-256 digest of a file's full byte content. It is
//! independent of file name, timestamps and platform, so it can be compared
//! across machines and builds.

use std::io::{self, Read};

use sha2::{Digest, Sha256};
use tmpl_core::ContentHash;

use crate::file_tree::FileEntry;

/// Size of the chunks streamed into the hasher.
const CHUNK_SIZE: usize = 8 * 1024;

/// Hashes everything `reader` yields, in fixed-size chunks.
///
/// # Errors
///
/// Returns the first I/O error raised by `reader`. Interrupted reads are
/// retried.
///
/// # Examples
///
/// ```
/// use tmpl_compiler::fingerprint;
///
/// let mut reader: &[u8] = b"hello";
/// let hash = fingerprint::hash_reader(&mut reader)?;
/// assert_eq!(hash, fingerprint::hash_bytes(b"hello"));
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn hash_reader(reader: &mut dyn Read) -> io::Result<ContentHash> {
    let mut hasher = Sha256::new();
    let mut chunk = vec![0_u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => hasher.update(&chunk[..n]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }

    Ok(ContentHash::new(hasher.finalize().into()))
}

/// Hashes an in-memory byte slice.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    ContentHash::new(Sha256::digest(bytes).into())
}

/// Hashes a file-tree entry from a fresh read stream.
///
/// # Errors
///
/// Returns an error if the entry cannot be opened or read.
pub fn hash_entry(entry: &dyn FileEntry) -> io::Result<ContentHash> {
    let mut reader = entry.open_read()?;
    hash_reader(&mut reader)
}
