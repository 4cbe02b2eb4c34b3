use std::hash::Hasher;

use twox_hash::XxHash64;

/// Content hash used to key memoized diff models.
pub fn hash64(text: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(text.as_bytes());
    hasher.finish()
}

/// Key for an old/new text pair; each side is hashed separately.
pub fn text_pair_key(old_text: &str, new_text: &str) -> (u64, u64) {
    (hash64(old_text), hash64(new_text))
}
