use sha2::{Digest, Sha256};

/// Turns arbitrary content into a short identifier.
///
/// Implementations must be deterministic: anonymous types synthesized from the
/// same schema get the same name on every import.
pub trait NamingService: Send + Sync {
    fn hash(&self, data: &str) -> String;
}

pub const MIN_HASH_LENGTH: usize = 8;
pub const MAX_HASH_LENGTH: usize = 12;

/// Digest based naming: hex digest with digits shifted onto `g..=p`, so the
/// result only contains letters.
#[derive(Debug, Clone, Copy)]
pub struct DigestNaming {
    length: usize,
}

impl DigestNaming {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_HASH_LENGTH, MAX_HASH_LENGTH),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for DigestNaming {
    fn default() -> Self {
        Self::new(MAX_HASH_LENGTH)
    }
}

impl NamingService for DigestNaming {
    fn hash(&self, data: &str) -> String {
        let digest = Sha256::digest(data.as_bytes());
        hex::encode(digest)
            .chars()
            .take(self.length)
            .map(shift_digit)
            .collect()
    }
}

fn shift_digit(c: char) -> char {
    match c.to_digit(10) {
        Some(d) => char::from(b'g' + d as u8),
        None => c,
    }
}

/// Name of an anonymous inline object schema.
pub fn anonymous_object_name(naming: &dyn NamingService, schema_json: &str) -> String {
    format!("Object_{}", naming.hash(schema_json))
}

/// Name of a type inferred from sample data.
pub fn sample_type_name(naming: &dyn NamingService, sample_json: &str) -> String {
    format!("Type_{}", naming.hash(sample_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let naming = DigestNaming::default();
        assert_eq!(naming.hash("{\"a\":1}"), naming.hash("{\"a\":1}"));
    }

    #[test]
    fn hash_contains_only_letters() {
        let naming = DigestNaming::default();
        for input in ["", "a", "{\"type\":\"object\"}", "0123456789"] {
            let hash = naming.hash(input);
            assert_eq!(hash.len(), 12);
            assert!(hash.chars().all(|c| c.is_ascii_lowercase()), "{hash}");
        }
    }

    #[test]
    fn digits_are_shifted_past_hex_letters() {
        assert_eq!(shift_digit('0'), 'g');
        assert_eq!(shift_digit('9'), 'p');
        assert_eq!(shift_digit('a'), 'a');
        assert_eq!(shift_digit('f'), 'f');
    }

    #[test]
    fn length_is_clamped() {
        assert_eq!(DigestNaming::new(2).length(), 8);
        assert_eq!(DigestNaming::new(40).length(), 12);
        assert_eq!(DigestNaming::new(10).hash("x").len(), 10);
    }

    #[test]
    fn different_inputs_give_different_names() {
        let naming = DigestNaming::default();
        let a = anonymous_object_name(&naming, "{\"a\":{\"type\":\"string\"}}");
        let b = anonymous_object_name(&naming, "{\"b\":{\"type\":\"string\"}}");
        assert!(a.starts_with("Object_"));
        assert_ne!(a, b);
    }
}
