use std::fmt;

use sha1::{Digest, Sha1};

/// A value that must never show up in logs or terminal output.
///
/// Passwords given to the admin commands travel as `Secret<String>` from the
/// command line to the point where they are salted and hashed. The only way
/// to read the value is [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use tinyapp::Secret;
///
/// let pw = Secret::new("xyzzy".to_string());
/// assert_eq!(format!("{:?}", pw), "[REDACTED]");
/// assert_eq!(format!("{}", pw), "[REDACTED]");
/// assert_eq!(pw.expose_secret(), "xyzzy");
/// ```
// Do not derive Clone, Copy or Default; do not implement Deref or AsRef.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Returns the wrapped value. Do not log the result.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl Secret<String> {
    /// True if the password is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.inner.trim().is_empty()
    }

    /// Hex SHA-1 of `"<salt>:<password>"`, the form stored in `users.pw`.
    ///
    /// Leading and trailing whitespace is not part of the password.
    ///
    /// ```
    /// use tinyapp::Secret;
    ///
    /// let pw = Secret::new("password".to_string());
    /// let digest = pw.salted_digest("abcdefgh");
    /// assert_eq!(digest.len(), 40);
    /// assert_eq!(digest, pw.salted_digest("abcdefgh"));
    /// assert_ne!(digest, pw.salted_digest("hgfedcba"));
    /// ```
    pub fn salted_digest(&self, salt: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(salt.as_bytes());
        hasher.update(b":");
        hasher.update(self.inner.trim().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// Both formatters must stay unconditional. Printing the value in any build
// puts passwords into the audit log.
impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_redacted_in_debug_and_display() {
        let pw = Secret::new("hunter2".to_string());
        let debug = format!("{:?}", pw);
        assert_eq!(debug, "[REDACTED]");
        assert!(!debug.contains("String"));
        assert_eq!(pw.to_string(), "[REDACTED]");
    }

    #[test]
    fn redacted_inside_derived_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct ChangePassword {
            name: String,
            password: Secret<String>,
        }

        let cmd = ChangePassword {
            name: "zarf".to_string(),
            password: "hunter2".to_string().into(),
        };
        let debug = format!("{:?}", cmd);
        assert!(debug.contains("zarf"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn salted_digest_matches_known_value() {
        // sha1("salt:pw")
        let pw = Secret::new("pw".to_string());
        assert_eq!(
            pw.salted_digest("salt"),
            "4afa60a91477e2b454959e43ddc6367fc228c012"
        );
    }

    #[test]
    fn salted_digest_ignores_surrounding_whitespace() {
        let padded = Secret::new(" xyzzy \t".to_string());
        let bare = Secret::new("xyzzy".to_string());
        assert_eq!(padded.salted_digest("abcdefgh"), bare.salted_digest("abcdefgh"));
        assert_ne!(
            Secret::new("xy zzy".to_string()).salted_digest("abcdefgh"),
            bare.salted_digest("abcdefgh")
        );
    }

    #[test]
    fn blank_passwords() {
        assert!(Secret::new("   ".to_string()).is_blank());
        assert!(!Secret::new(" x ".to_string()).is_blank());
    }
}
