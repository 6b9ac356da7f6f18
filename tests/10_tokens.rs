mod common;

use std::io::Write;

use anyhow::Result;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey, KeypairBytes};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{decode, Validation};

use tenant_iam::auth::{DelegationClaims, SigningKeys, TokenError};
use tenant_iam::config::{AppConfig, SigningAlgorithm};
use tenant_iam::database::models::TokenState;
use tenant_iam::database::IdentityStore;

use common::Fixture;

#[tokio::test]
async fn issued_token_introspects_active_in_same_tenant() -> Result<()> {
    let fx = Fixture::new()?;
    let token = fx.issue("t1", "alice").await?;

    assert!(fx.ctx.verifier().introspect(&token, "t1"));
    Ok(())
}

#[tokio::test]
async fn wrong_tenant_is_always_inactive() -> Result<()> {
    let fx = Fixture::new()?;
    let token = fx.issue("t1", "alice").await?;

    assert!(!fx.ctx.verifier().introspect(&token, "t2"));
    assert!(!fx.ctx.verifier().introspect(&token, ""));
    Ok(())
}

#[tokio::test]
async fn claims_round_trip_through_public_key() -> Result<()> {
    let fx = Fixture::new()?;
    let before = chrono::Utc::now().timestamp();
    let token = fx.issue("t1", "alice").await?;

    let keys = fx.ctx.keys();
    let claims = decode::<DelegationClaims>(&token, keys.decoding_key(), &Validation::new(keys.algorithm()))?.claims;

    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.tenant_id, "t1");
    assert_eq!(claims.iss, fx.ctx.config().tokens.issuer);
    assert_eq!(claims.issuer_user_id, "admin");
    assert_eq!(claims.token_type, "PASSWORD_RESET");
    assert!(claims.iat >= before - 1);
    assert_eq!(claims.exp, claims.iat + fx.ctx.config().tokens.ttl_minutes * 60);

    let row = fx.store.find_token(claims.jti).await?.expect("token row recorded");
    assert_eq!(row.signed_value, token);
    assert_eq!(row.state(), TokenState::Issued);
    Ok(())
}

#[tokio::test]
async fn consume_twice_reports_conflict() -> Result<()> {
    let fx = Fixture::new()?;
    let token = fx.issue("t1", "alice").await?;
    let token_id = fx.ctx.verifier().token_id(&token, "t1")?;

    fx.ctx.ledger().consume(token_id).await?;
    let second = fx.ctx.ledger().consume(token_id).await;

    assert!(matches!(second, Err(TokenError::ConsumptionConflict(id)) if id == token_id));
    let row = fx.store.find_token(token_id).await?.expect("token row recorded");
    assert_eq!(row.state(), TokenState::Consumed);
    Ok(())
}

#[tokio::test]
async fn introspection_does_not_look_at_consumption() -> Result<()> {
    let fx = Fixture::new()?;
    let token = fx.issue("t1", "alice").await?;
    let token_id = fx.ctx.verifier().token_id(&token, "t1")?;

    assert!(fx.ctx.verifier().introspect(&token, "t1"));
    assert!(fx.ctx.verifier().introspect(&token, "t1"));
    fx.ctx.ledger().consume(token_id).await?;
    assert!(fx.ctx.verifier().introspect(&token, "t1"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consume_has_exactly_one_winner() -> Result<()> {
    let fx = Fixture::new()?;

    for _ in 0..50 {
        let token = fx.issue("t1", "alice").await?;
        let token_id = fx.ctx.verifier().token_id(&token, "t1")?;

        let contenders: Vec<_> = (0..2)
            .map(|_| {
                let ctx = fx.ctx.clone();
                tokio::spawn(async move {
                    for _ in 0..(rand::random::<u8>() % 4) {
                        tokio::task::yield_now().await;
                    }
                    ctx.ledger().consume(token_id).await
                })
            })
            .collect();

        let outcomes = futures::future::join_all(contenders).await;
        let mut wins = 0;
        let mut conflicts = 0;
        for outcome in outcomes {
            match outcome? {
                Ok(()) => wins += 1,
                Err(TokenError::ConsumptionConflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected consume error: {other}"),
            }
        }
        assert_eq!((wins, conflicts), (1, 1));
    }
    Ok(())
}

#[tokio::test]
async fn restart_with_new_ephemeral_keys_invalidates_tokens() -> Result<()> {
    let fx = Fixture::new()?;
    let token = fx.issue("t1", "alice").await?;

    let restarted = Fixture::new()?;
    assert!(!restarted.ctx.verifier().introspect(&token, "t1"));
    Ok(())
}

#[tokio::test]
async fn pem_file_keys_issue_and_verify() -> Result<()> {
    let signing = SigningKey::generate(&mut rand::rngs::OsRng);
    let private_pem = KeypairBytes {
        secret_key: signing.to_bytes(),
        public_key: None,
    }
    .to_pkcs8_pem(LineEnding::LF)
    .map_err(|e| anyhow::anyhow!("encode private key: {e}"))?;
    let public_pem = signing
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| anyhow::anyhow!("encode public key: {e}"))?;

    let mut private_file = tempfile::NamedTempFile::new()?;
    private_file.write_all(private_pem.as_bytes())?;
    let mut public_file = tempfile::NamedTempFile::new()?;
    public_file.write_all(public_pem.as_bytes())?;

    let mut config = AppConfig::production();
    config.api.enable_request_logging = false;
    config.tokens.algorithm = SigningAlgorithm::EdDsa;
    config.tokens.private_key_path = Some(private_file.path().to_path_buf());
    config.tokens.public_key_path = Some(public_file.path().to_path_buf());

    let keys = SigningKeys::from_config(&config.tokens)?;
    let fx = Fixture::with_keys(config, keys)?;
    let token = fx.issue("t1", "alice").await?;

    assert!(fx.ctx.verifier().introspect(&token, "t1"));
    Ok(())
}

#[tokio::test]
async fn rs256_fixture_keys_issue_and_verify() -> Result<()> {
    let fixtures = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

    let mut config = AppConfig::production();
    config.api.enable_request_logging = false;
    config.tokens.algorithm = SigningAlgorithm::Rs256;
    config.tokens.private_key_path = Some(fixtures.join("rs256_private.pem"));
    config.tokens.public_key_path = Some(fixtures.join("rs256_public.pem"));

    let keys = SigningKeys::from_config(&config.tokens)?;
    assert_eq!(keys.algorithm(), jsonwebtoken::Algorithm::RS256);

    let fx = Fixture::with_keys(config, keys)?;
    let token = fx.issue("t1", "alice").await?;

    let claims = fx.ctx.verifier().verify(&token, "t1")?;
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.tenant_id, "t1");
    assert!(!fx.ctx.verifier().introspect(&token, "t2"));

    // An EdDSA deployment must not accept the RS256 token
    let ed = Fixture::new()?;
    assert!(!ed.ctx.verifier().introspect(&token, "t1"));
    Ok(())
}
