//! Password digests and the password policy.
//!
//! Stored credentials have the form `sha256$<rounds>$<salt hex>$<digest hex>`.

use sha2::{Digest, Sha256};

use crate::config::PasswordPolicy;

const SCHEME: &str = "sha256";
const ROUNDS: u32 = 4096;

/// Salt and digest `password`.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    let salt = hex::encode(salt);
    let digest = digest(&salt, password, ROUNDS);
    format!("{SCHEME}${ROUNDS}${salt}${}", hex::encode(digest))
}

/// Check `password` against a stored credential. Malformed credentials never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    let Ok(expected) = hex::decode(expected) else {
        return false;
    };

    let actual = digest(salt, password, rounds);
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn digest(salt: &str, password: &str, rounds: u32) -> Vec<u8> {
    let mut state = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..rounds {
        state = Sha256::new()
            .chain_update(state)
            .chain_update(password.as_bytes())
            .finalize();
    }
    state.to_vec()
}

/// Check `password` against `policy`, returning the first violated rule as a message.
///
/// `attributes` are `(label, value)` pairs such as `("username", "ann")` the password must
/// not resemble.
pub fn check_password_policy(
    policy: &PasswordPolicy,
    password: &str,
    attributes: &[(&str, &str)],
) -> Result<(), String> {
    if password.chars().count() < policy.min_length {
        return Err(format!(
            "This password is too short. It must contain at least {} characters.",
            policy.min_length
        ));
    }

    let lowered = password.to_lowercase();
    if let Some(max_similarity) = policy.max_similarity {
        for (label, value) in attributes {
            let value = value.to_lowercase();
            let too_similar = std::iter::once(value.as_str())
                .chain(value.split(|c: char| !c.is_alphanumeric()))
                .filter(|part| !part.is_empty())
                .any(|part| similarity(&lowered, part) >= max_similarity);
            if too_similar {
                return Err(format!("The password is too similar to the {label}."));
            }
        }
    }

    if policy
        .common_passwords
        .iter()
        .any(|common| *common == lowered)
    {
        return Err("This password is too common.".into());
    }

    if policy.reject_numeric && password.chars().all(|c| c.is_ascii_digit()) {
        return Err("This password is entirely numeric.".into());
    }

    Ok(())
}

/// Ratio `2 * lcs / (len(a) + len(b))` over characters, in `0.0..=1.0`.
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    let lcs = previous[b.len()];
    (2 * lcs) as f64 / (a.len() + b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let stored = hash_password("Str0ng!pw");
        assert!(stored.starts_with("sha256$"));
        assert!(verify_password("Str0ng!pw", &stored));
        assert!(!verify_password("str0ng!pw", &stored));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("Str0ng!pw"), hash_password("Str0ng!pw"));
    }

    #[test]
    fn malformed_credentials_never_verify() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$1$aa$bb"));
        assert!(!verify_password("x", "sha256$many$aa$bb"));
        assert!(!verify_password("x", "sha256$1$aa$zz"));
    }

    #[test]
    fn policy_accepts_strong_password() {
        let policy = PasswordPolicy::default();
        assert!(
            check_password_policy(
                &policy,
                "Str0ng!pw",
                &[("username", "ann"), ("email address", "a@x.com")]
            )
            .is_ok()
        );
    }

    #[test]
    fn policy_rejects_weak_passwords() {
        let policy = PasswordPolicy::default();
        let short = check_password_policy(&policy, "Ab1!", &[]).unwrap_err();
        assert!(short.contains("too short"));
        let numeric = check_password_policy(&policy, "9081726354", &[]).unwrap_err();
        assert!(numeric.contains("entirely numeric"));
        let common = check_password_policy(&policy, "Password123", &[]).unwrap_err();
        assert!(common.contains("too common"));
        let similar =
            check_password_policy(&policy, "annabelle1", &[("username", "annabelle")]).unwrap_err();
        assert_eq!(similar, "The password is too similar to the username.");
    }

    #[test]
    fn similarity_ratio_bounds() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert!((similarity("abcd", "ab") - 2.0 * 2.0 / 6.0).abs() < f64::EPSILON);
    }
}
