use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordVerifier},
};

pub fn verify_password(password: &str, hashed: &str) -> Result<(), password_hash::Error> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)?;

    argon2.verify_password(password.as_bytes(), &parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    fn hash_password(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn verifies_the_original_password_only() {
        let hashed = hash_password("s3cret!");

        assert!(hashed.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &hashed).is_ok());
        assert!(verify_password("s3cret?", &hashed).is_err());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_panic() {
        assert!(verify_password("anything", "plain-text-in-db").is_err());
    }
}
