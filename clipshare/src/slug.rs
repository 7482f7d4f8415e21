// SPDX-License-Identifier: GPL-2.0-or-later
//
// Slugs are the human-facing addresses of clips.
use rand::{distributions::Slice, prelude::*};
use regex::Regex;

/// Length of a generated slug.
pub const SLUG_LENGTH: usize = 8;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random slug of [`SLUG_LENGTH`] lowercase alphanumeric characters.
///
/// Collisions aren't checked here; the store's uniqueness constraint catches them.
pub fn generate() -> String {
    generate_with(&mut thread_rng())
}

/// Generate a slug with the given source of randomness.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    // The alphabet is a non-empty constant
    let alphabet = Slice::new(ALPHABET).expect("slug alphabet is empty");
    rng.sample_iter(alphabet)
        .take(SLUG_LENGTH)
        .map(|&b| char::from(b))
        .collect()
}

/// Check a caller-supplied slug: 1 to 64 ASCII letters, digits, underscores, or hyphens.
pub fn validate(custom_slug: &str) -> bool {
    lazy_static::lazy_static! {
        static ref VALID_SLUG: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("Regex should be valid");
    }
    VALID_SLUG.is_match(custom_slug)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn generated_slugs_use_the_alphabet() {
        for _ in 0..100 {
            let slug = generate();
            assert_eq!(slug.len(), SLUG_LENGTH);
            assert!(slug.bytes().all(|b| ALPHABET.contains(&b)), "{slug}");
        }
    }

    #[test]
    fn generated_slugs_pass_validation() {
        assert!(validate(&generate()));
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let first = generate_with(&mut StdRng::seed_from_u64(7));
        let second = generate_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }

    #[test]
    fn every_symbol_is_reachable() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.extend(generate_with(&mut rng).bytes());
        }
        assert_eq!(seen.len(), ALPHABET.len());
    }

    #[test]
    fn custom_slugs() {
        assert!(validate("my-clip"));
        assert!(validate("My_Clip_2"));
        assert!(validate(&"a".repeat(64)));

        assert!(!validate(""));
        assert!(!validate(&"a".repeat(65)));
        assert!(!validate("has space"));
        assert!(!validate("slash/es"));
        assert!(!validate("../etc"));
        assert!(!validate("émoji"));
    }
}
