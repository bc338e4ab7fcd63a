use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "pbkdf2_sha256";
const ITERATIONS: u32 = 600000;
const SALT_LENGTH: usize = 22;
const KEY_LENGTH: usize = 32;

/// Hash a password in Django format (compatible with the original backend):
/// `pbkdf2_sha256$iterations$salt$hash` with an alphanumeric salt and a
/// standard-base64 hash.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect();

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt.as_bytes(), ITERATIONS, &mut key)
        .map_err(|e| format!("PBKDF2 hash generation failed: {}", e))?;

    Ok(format!(
        "{}${}${}${}",
        ALGORITHM,
        ITERATIONS,
        salt,
        STANDARD.encode(key)
    ))
}

/// Verify a password against a stored Django-format hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    // Format: pbkdf2_sha256$iterations$salt$hash
    let parts: Vec<&str> = stored_hash.split('$').collect();
    if parts.len() != 4 {
        return Err("Invalid hash format".to_string());
    }

    let (algorithm, iterations_str, salt, hash_b64) =
        (parts[0], parts[1], parts[2], parts[3]);

    if algorithm != ALGORITHM {
        return Err(format!("Unsupported algorithm: {}", algorithm));
    }

    let iterations = iterations_str
        .parse::<u32>()
        .map_err(|_| "Invalid iterations".to_string())?;

    let expected = STANDARD
        .decode(hash_b64)
        .map_err(|e| format!("Base64 decode failed: {}", e))?;

    let mut computed = vec![0u8; expected.len()];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut computed)
        .map_err(|e| format!("PBKDF2 hash verification failed: {}", e))?;

    Ok(computed == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("pbkdf2_sha256$600000$"));
        assert!(verify_password("correct horse battery", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("secret-password").unwrap();
        assert!(!verify_password("other-password", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(verify_password("x", "not-a-hash").is_err());
        assert!(verify_password("x", "md5$260000$salt$hash").is_err());
    }
}
