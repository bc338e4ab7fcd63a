use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of a recipe short-link token.
pub const SHORT_LINK_LENGTH: usize = 4;

/// Generate a random short-link token: 4 alphanumeric characters.
///
/// The token is not guaranteed unique; the caller checks for collisions
/// against existing recipes and regenerates until it finds a free one.
pub fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_LINK_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_length_and_charset() {
        for _ in 0..100 {
            let token = random_token();
            assert_eq!(token.len(), SHORT_LINK_LENGTH);
            assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_tokens_are_distinct() {
        // 20 draws from a 62^4 space; a collision here is ~1e-5.
        let tokens: HashSet<String> = (0..20).map(|_| random_token()).collect();
        assert_eq!(tokens.len(), 20);
    }
}
