use derive_more::Display;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

const CATEGORY_PREFIX: &str = "category:";
const MAX_SLUG_LEN: usize = 64;
const URL_KEY_PREFIX: &str = "url_";
const TEXT_KEY_PREFIX: &str = "file_";

/// Store-safe address of one logical resource across every cache namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display("{_0}")]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalized identity of a category name.
///
/// Case-insensitive, an optional `Category:` prefix is ignored and runs of
/// whitespace collapse to a single underscore.
pub fn normalize_identity(identifier: &str) -> String {
    let trimmed = identifier.trim();
    let name = strip_category_prefix(trimmed).trim();

    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Removes a leading `Category:` (any case) from `name`.
pub fn strip_category_prefix(name: &str) -> &str {
    match name.get(..CATEGORY_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(CATEGORY_PREFIX) => &name[CATEGORY_PREFIX.len()..],
        _ => name,
    }
}

/// Derives the cache key for a category.
///
/// The key is a readable slug followed by the MD5 digest of the normalized
/// identity, so inputs that only differ in characters dropped from the slug
/// still map to distinct keys.
pub fn derive_key(identifier: &str) -> CacheKey {
    let identity = normalize_identity(identifier);
    keyed("", &identity, identity.as_bytes())
}

/// Derives the cache key for a web page.
///
/// URL paths and queries are case-sensitive, so the digest covers the URL
/// exactly as given apart from surrounding whitespace.
pub fn derive_url_key(url: &str) -> CacheKey {
    let url = url.trim();
    let readable = url.split_once("://").map_or(url, |(_, rest)| rest);
    keyed(URL_KEY_PREFIX, &readable.to_lowercase(), url.as_bytes())
}

/// Derives the cache key for caller supplied text, such as a local file.
///
/// Both the name and the text feed the digest, so editing a file yields a
/// fresh key instead of a stale hit.
pub fn derive_text_key(name: &str, text: &str) -> CacheKey {
    let mut hasher = Md5::new();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());

    let slug = slugify(&name.trim().to_lowercase());
    CacheKey(format!("{TEXT_KEY_PREFIX}{slug}-{}", hex::encode(hasher.finalize())))
}

fn keyed(prefix: &str, readable: &str, identity: &[u8]) -> CacheKey {
    let slug = slugify(readable);
    let digest = hex::encode(Md5::digest(identity));
    CacheKey(format!("{prefix}{slug}-{digest}"))
}

fn slugify(readable: &str) -> String {
    readable
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .take(MAX_SLUG_LEN)
        .collect()
}
