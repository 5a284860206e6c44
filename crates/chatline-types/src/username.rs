//! Username rules enforced by clients before anything is sent.

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 50;

/// 3-50 characters, ASCII alphanumeric plus `.` and `_`. Must start and end
/// alphanumeric, and `.`/`_` never appear twice in a row.
pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return false;
    }

    let mut prev_punct = true; // no leading punctuation
    for c in username.chars() {
        if c.is_ascii_alphanumeric() {
            prev_punct = false;
        } else if c == '.' || c == '_' {
            if prev_punct {
                return false;
            }
            prev_punct = true;
        } else {
            return false;
        }
    }

    !prev_punct
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        for name in ["abc", "alice", "a.b", "a_b.c", "Bob99", &"x".repeat(50)] {
            assert!(is_valid_username(name), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_bad_punctuation() {
        for name in ["_bad", "bad_", ".abc", "abc.", "a..b", "a._b", "a__b"] {
            assert!(!is_valid_username(name), "{name} should be invalid");
        }
    }

    #[test]
    fn rejects_bad_length() {
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username(&"x".repeat(51)));
    }

    #[test]
    fn rejects_other_characters() {
        for name in ["al ice", "al-ice", "alice!", "ålice"] {
            assert!(!is_valid_username(name), "{name} should be invalid");
        }
    }
}
