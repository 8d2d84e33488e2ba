use xxhash_rust::xxh64::xxh64;

use crate::types::{NodeId, NodeKind};

const BASE62_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode a u64 value as a base62 string (11 chars, zero-padded).
fn base62_encode(mut value: u64) -> String {
    let mut result = Vec::with_capacity(11);
    while value > 0 {
        result.push(BASE62_CHARS[(value % 62) as usize] as char);
        value /= 62;
    }
    while result.len() < 11 {
        result.push('0');
    }
    result.iter().rev().collect()
}

/// Hash of a file's raw bytes, used to decide whether it must be reparsed.
pub fn content_hash(bytes: &[u8]) -> String {
    base62_encode(xxh64(bytes, 0))
}

/// Deterministic node id from the node's identity.
///
/// Ids are stable across snapshots, so an incremental rebuild that reinserts an
/// unchanged definition produces the same id.
pub fn node_id(kind: NodeKind, file_path: &str, qualified_name: &str) -> NodeId {
    let mut input = String::with_capacity(file_path.len() + qualified_name.len() + 10);
    input.push_str(kind.as_str());
    input.push('\0');
    input.push_str(file_path);
    input.push('\0');
    input.push_str(qualified_name);
    xxh64(input.as_bytes(), 0)
}

/// Id of the File node for a repo-relative path.
pub fn file_node_id(file_path: &str) -> NodeId {
    node_id(NodeKind::File, file_path, "")
}

/// Repository identity derived from its canonical root path.
pub fn repo_id(canonical_root: &str) -> String {
    base62_encode(xxh64(canonical_root.as_bytes(), 0x5249_5050))
}
