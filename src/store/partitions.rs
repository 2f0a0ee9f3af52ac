//! Key layout for the Fjall partitions.
//!
//! Partition structure:
//! - `resources`: res:{url} -> StoredResource (JSON)
//! - `meta`: whole-document records (endpoint list, crawler progress)

/// Single-record key for the persisted endpoint list document.
pub const ENDPOINT_LIST_KEY: &[u8] = b"endpoint_list";

/// Single-record key for the crawler progress document.
pub const PROGRESS_KEY: &[u8] = b"crawler_progress";

/// Encode a resource key: res:{url}
pub fn encode_resource_key(url: &str) -> Vec<u8> {
    format!("res:{url}").into_bytes()
}

/// Decode a resource key: res:{url} -> url
pub fn decode_resource_key(key: &[u8]) -> Option<String> {
    let key_str = std::str::from_utf8(key).ok()?;
    key_str.strip_prefix("res:").map(String::from)
}
