use filehub::auth::{
    create_access_token, hash_password, validate_password, verify_access_token, verify_password,
    PasswordPolicyError,
};
use filehub::storage::models::UserRole;

const SECRET: &str = "test-secret";

// ============================================================================
// Password hashing
// ============================================================================

#[test]
fn test_hash_and_verify_password() {
    let hash = hash_password("Abcdef1!").unwrap();
    assert_ne!(hash, "Abcdef1!");
    assert!(verify_password(&hash, "Abcdef1!"));
    assert!(!verify_password(&hash, "Abcdef1?"));
}

#[test]
fn test_hashes_are_salted() {
    let first = hash_password("Abcdef1!").unwrap();
    let second = hash_password("Abcdef1!").unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_verify_password_garbage_hash() {
    assert!(!verify_password("not-a-hash", "Abcdef1!"));
}

// ============================================================================
// Password composition policy
// ============================================================================

#[test]
fn test_password_policy_accepts_compliant() {
    assert!(validate_password("Abcdef1!").is_ok());
    assert!(validate_password("Sup3r$ecretPass").is_ok());
}

#[test]
fn test_password_policy_rejections() {
    // All lowercase, no digit or symbol
    assert!(validate_password("abcdefgh").is_err());

    assert_eq!(
        validate_password("Ab1!"),
        Err(PasswordPolicyError::TooShort)
    );
    assert_eq!(
        validate_password(&format!("Ab1!{}", "x".repeat(100))),
        Err(PasswordPolicyError::TooLong)
    );
    assert_eq!(
        validate_password("ABCDEF1!"),
        Err(PasswordPolicyError::MissingLowercase)
    );
    assert_eq!(
        validate_password("abcdef1!"),
        Err(PasswordPolicyError::MissingUppercase)
    );
    assert_eq!(
        validate_password("Abcdefg!"),
        Err(PasswordPolicyError::MissingDigit)
    );
    assert_eq!(
        validate_password("Abcdefg1"),
        Err(PasswordPolicyError::MissingSpecial)
    );
}

// ============================================================================
// Access tokens
// ============================================================================

#[test]
fn test_token_round_trip() {
    let token = create_access_token("alice", UserRole::User, SECRET, 30).unwrap();
    let claims = verify_access_token(&token, SECRET).unwrap();

    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.role, UserRole::User);
}

#[test]
fn test_token_carries_admin_role() {
    let token = create_access_token("root", UserRole::Admin, SECRET, 30).unwrap();
    let claims = verify_access_token(&token, SECRET).unwrap();
    assert_eq!(claims.role, UserRole::Admin);
}

#[test]
fn test_expired_token_rejected() {
    let token = create_access_token("alice", UserRole::User, SECRET, -5).unwrap();
    assert!(verify_access_token(&token, SECRET).is_err());
}

#[test]
fn test_wrong_secret_rejected() {
    let token = create_access_token("alice", UserRole::User, SECRET, 30).unwrap();
    assert!(verify_access_token(&token, "other-secret").is_err());
}

#[test]
fn test_tampered_token_rejected() {
    let token = create_access_token("alice", UserRole::User, SECRET, 30).unwrap();
    let mut tampered = token.clone();
    tampered.pop();
    assert!(verify_access_token(&tampered, SECRET).is_err());
}

#[test]
fn test_garbage_token_rejected() {
    assert!(verify_access_token("not.a.token", SECRET).is_err());
    assert!(verify_access_token("", SECRET).is_err());
}

#[test]
fn test_token_missing_role_rejected() {
    // A structurally valid, correctly signed token whose claim set lacks the
    // role must still be rejected.
    #[derive(serde::Serialize)]
    struct PartialClaims {
        sub: String,
        exp: usize,
    }

    let claims = PartialClaims {
        sub: "alice".to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::minutes(30)).timestamp() as usize,
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    assert!(verify_access_token(&token, SECRET).is_err());
}
