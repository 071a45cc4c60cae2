//! AI provider settings: which backend is active, its model, and its
//! encrypted credential.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::crypto::CredentialCipher;
use crate::errors::AppError;
use crate::llm_client::{ActiveProvider, ProviderError, ProviderKind};
use crate::models::ai_config::{self, AiConfigRow, AiConfigView};

pub mod handlers;

/// Reads the active configuration and turns it into the provider selection
/// for one request. The stored credential wins; otherwise the provider's
/// environment variable is consulted.
pub async fn resolve_active_provider(
    pool: &SqlitePool,
    cipher: &CredentialCipher,
) -> Result<ActiveProvider, AppError> {
    let row = ai_config::find_active(pool).await?.ok_or_else(|| {
        AppError::Validation("No AI provider is configured. Choose one in AI settings.".to_string())
    })?;
    active_from_row(&row, cipher)
}

pub fn active_from_row(row: &AiConfigRow, cipher: &CredentialCipher) -> Result<ActiveProvider, AppError> {
    let kind: ProviderKind = row.provider.parse()?;
    let credential = match &row.encrypted_credential {
        Some(sealed) => Some(cipher.decrypt(sealed)?),
        None => credential_from_env(kind),
    };
    debug!(provider = %kind, model = %row.model_name, stored = row.encrypted_credential.is_some(), "Resolved AI provider");

    Ok(ActiveProvider {
        kind,
        model: row.model_name.clone(),
        credential,
    })
}

pub(crate) fn credential_from_env(kind: ProviderKind) -> Option<String> {
    kind.credential_env()
        .and_then(|var| std::env::var(var).ok())
        .filter(|key| !key.trim().is_empty())
}

/// Rejects keys that obviously belong to another provider.
pub fn validate_credential(kind: ProviderKind, key: &str) -> Result<(), ProviderError> {
    let key = key.trim();
    let reason = match kind {
        ProviderKind::Claude if !key.starts_with("sk-ant-") => Some("Anthropic keys start with 'sk-ant-'"),
        ProviderKind::OpenAi if key.starts_with("sk-ant-") => {
            Some("this is an Anthropic key, not an OpenAI key")
        }
        ProviderKind::OpenAi if !key.starts_with("sk-") => Some("OpenAI keys start with 'sk-'"),
        _ => None,
    };
    match reason {
        Some(reason) => Err(ProviderError::InvalidCredential {
            provider: kind,
            reason,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub provider: ProviderKind,
    pub default_model: &'static str,
    pub credential_env: Option<&'static str>,
    pub env_credential_present: bool,
}

#[derive(Debug, Serialize)]
pub struct AiSettings {
    pub active: Option<AiConfigView>,
    pub configs: Vec<AiConfigView>,
    pub providers: Vec<ProviderInfo>,
}

pub async fn load(pool: &SqlitePool) -> Result<AiSettings, sqlx::Error> {
    let rows = ai_config::list(pool).await?;
    let configs: Vec<AiConfigView> = rows.iter().map(AiConfigView::from).collect();
    let providers = ProviderKind::ALL
        .into_iter()
        .map(|kind| ProviderInfo {
            provider: kind,
            default_model: kind.default_model(),
            credential_env: kind.credential_env(),
            env_credential_present: credential_from_env(kind).is_some(),
        })
        .collect();

    Ok(AiSettings {
        active: configs.iter().find(|c| c.is_active).cloned(),
        configs,
        providers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_credential_prefixes() {
        assert!(validate_credential(ProviderKind::Claude, "sk-ant-api03-abc").is_ok());
        assert!(validate_credential(ProviderKind::Claude, "sk-proj-abc").is_err());
        assert!(validate_credential(ProviderKind::OpenAi, "sk-proj-abc").is_ok());
        assert!(validate_credential(ProviderKind::OpenAi, "sk-ant-api03-abc").is_err());
        assert!(validate_credential(ProviderKind::OpenAi, "pk-live").is_err());
        assert!(validate_credential(ProviderKind::ClaudeCli, "").is_ok());
    }

    #[tokio::test]
    async fn test_nothing_configured_is_a_validation_error() {
        let pool = test_pool().await;
        let cipher = CredentialCipher::new("k");
        let err = resolve_active_provider(&pool, &cipher).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_stored_credential_is_decrypted() {
        let pool = test_pool().await;
        let cipher = CredentialCipher::new("k");
        let sealed = cipher.encrypt("sk-ant-secret").unwrap();
        ai_config::save_active(&pool, "claude", Some(&sealed), "claude-opus-4-20250514")
            .await
            .unwrap();

        let active = resolve_active_provider(&pool, &cipher).await.unwrap();
        assert_eq!(active.kind, ProviderKind::Claude);
        assert_eq!(active.model, "claude-opus-4-20250514");
        assert_eq!(active.credential.as_deref(), Some("sk-ant-secret"));
    }

    #[tokio::test]
    async fn test_cli_needs_no_credential() {
        let pool = test_pool().await;
        ai_config::save_active(&pool, "claude_cli", None, "claude-sonnet-4-20250514")
            .await
            .unwrap();
        let active = resolve_active_provider(&pool, &CredentialCipher::new("k")).await.unwrap();
        assert_eq!(active.kind, ProviderKind::ClaudeCli);
        assert_eq!(active.credential, None);
    }

    #[tokio::test]
    async fn test_settings_never_expose_credentials() {
        let pool = test_pool().await;
        let cipher = CredentialCipher::new("k");
        let sealed = cipher.encrypt("sk-ant-secret").unwrap();
        ai_config::save_active(&pool, "claude", Some(&sealed), "m").await.unwrap();

        let settings = load(&pool).await.unwrap();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains(&sealed));
        assert!(!json.contains("sk-ant-secret"));
        assert_eq!(settings.active.map(|a| a.has_credential), Some(true));
        assert_eq!(settings.providers.len(), 3);
    }
}
