//! Random identity material. A fresh identity is generated for every attempt
//! so a rejected email or phone is never resubmitted.

use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "amber", "brisk", "cedar", "coral", "dusty", "eager", "fable", "gray", "hazel", "iron",
    "jolly", "keen", "lunar", "maple", "noble", "olive", "pale", "quiet", "rustic", "slate",
    "tidal", "umber", "vivid", "witty", "young", "zesty",
];

const NOUNS: &[&str] = &[
    "anchor", "badger", "canyon", "delta", "ember", "falcon", "grove", "harbor", "island",
    "jasper", "kestrel", "lantern", "meadow", "north", "orchard", "prairie", "quarry", "ridge",
    "summit", "thicket", "upland", "vale", "willow", "yonder",
];

const FIRST_NAMES: &[&str] = &[
    "Alex", "Casey", "Dana", "Elliot", "Frankie", "Harper", "Jamie", "Jordan", "Morgan",
    "Parker", "Quinn", "Reese", "Riley", "Rowan", "Sam", "Taylor",
];

const LAST_NAMES: &[&str] = &[
    "Adler", "Bennett", "Calloway", "Dawson", "Ellison", "Foster", "Granger", "Hayes",
    "Ingram", "Keller", "Lawson", "Mercer", "Norwood", "Porter", "Sutton", "Whitfield",
];

/// Random adjective+noun username, optionally suffixed with digits.
pub fn generate_username() -> String {
    let mut rng = rand::thread_rng();

    let adjective = ADJECTIVES.choose(&mut rng).unwrap();
    let noun = NOUNS.choose(&mut rng).unwrap();

    if rng.gen_bool(0.5) {
        format!("{}{}{}", adjective, noun, rng.gen_range(10..9999))
    } else {
        format!("{}.{}", adjective, noun)
    }
}

/// Random plausible full name for signup forms.
pub fn generate_full_name() -> String {
    let mut rng = rand::thread_rng();
    let first = FIRST_NAMES.choose(&mut rng).unwrap();
    let last = LAST_NAMES.choose(&mut rng).unwrap();
    format!("{} {}", first, last)
}

/// Strong random password: hex of hashed random bytes with forced case mix,
/// a symbol and digits so it clears common complexity checks.
pub fn generate_password() -> String {
    use sha2::{Digest, Sha256};

    let mut rng = rand::thread_rng();
    let seed: [u8; 32] = rng.gen();
    let digest = Sha256::digest(seed);

    // Hex alone may be all digits; force one of each class.
    let hexpart = hex::encode(&digest[..8]);
    format!("{}Zq!{}", hexpart, rng.gen_range(10..100))
}

/// Compose a mailbox-ready address at the given domain.
pub fn generate_temp_address(domain: &str) -> String {
    format!("{}@{}", generate_username(), domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_shape() {
        for _ in 0..50 {
            let name = generate_username();
            assert!(name.len() >= 8);
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.'));
        }
    }

    #[test]
    fn test_full_name_has_two_parts() {
        let name = generate_full_name();
        assert_eq!(name.split_whitespace().count(), 2);
    }

    #[test]
    fn test_password_complexity() {
        for _ in 0..20 {
            let password = generate_password();
            assert!(password.len() >= 16);
            assert!(password.chars().any(|c| c.is_ascii_uppercase()));
            assert!(password.chars().any(|c| c.is_ascii_lowercase()));
            assert!(password.chars().any(|c| c.is_ascii_digit()));
            assert!(password.contains('!'));
        }
    }

    #[test]
    fn test_temp_address_uses_domain() {
        let address = generate_temp_address("inbox.example");
        assert!(address.ends_with("@inbox.example"));
        assert!(address.contains('@'));
    }
}
