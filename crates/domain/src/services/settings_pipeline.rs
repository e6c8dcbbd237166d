//! Bind, validate and persist settings forms.
//!
//! A submission either ends in [`SettingsOutcome::Done`] with the committed
//! namespace snapshot, or in [`SettingsOutcome::Rejected`] without any write.
//! Subsystem re-initialization is left to the caller once `Done` is returned.

use serde_json::Value;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use super::config_service::ConfigService;
use super::store::StoreError;
use crate::models::config::ConfigSnapshot;
use crate::models::settings::SettingsForm;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A submission that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub errors: Vec<String>,
    /// The submitted values, echoed back for re-display.
    pub form: Value,
}

impl Rejection {
    pub fn new(errors: Vec<String>, form: Value) -> Self {
        Self { errors, form }
    }

    /// Errors joined one per line.
    pub fn message(&self) -> String {
        self.errors.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsOutcome {
    Done(ConfigSnapshot),
    Rejected(Rejection),
}

/// Human-readable messages for every field error, ordered by field name.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let mut messages = Vec::new();
    for (field, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    messages.push(
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{} is invalid", field)),
                    );
                }
            }
            ValidationErrorsKind::Struct(nested) => messages.extend(validation_messages(nested)),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    messages.extend(validation_messages(nested));
                }
            }
        }
    }
    messages
}

/// Deserializes and validates a submitted form.
pub fn bind_form<F: SettingsForm>(raw: Value) -> Result<F, Rejection> {
    let form: F = match serde_json::from_value(raw.clone()) {
        Ok(form) => form,
        Err(e) => return Err(Rejection::new(vec![e.to_string()], raw)),
    };

    match form.validate() {
        Ok(()) => Ok(form),
        Err(errors) => Err(Rejection::new(validation_messages(&errors), raw)),
    }
}

/// Writes a validated form to its namespace.
pub async fn persist_form<F: SettingsForm>(
    config: &ConfigService,
    form: &F,
) -> Result<ConfigSnapshot, SettingsError> {
    let changes = form.changes()?;
    Ok(config.commit(F::NAMESPACE, changes).await?)
}

/// Runs the full pipeline for a submission.
///
/// `check` runs after field validation and may reject the form with
/// additional messages.
pub async fn apply_settings<F, C>(
    config: &ConfigService,
    raw: Value,
    check: C,
) -> Result<SettingsOutcome, SettingsError>
where
    F: SettingsForm,
    C: FnOnce(&F) -> Vec<String>,
{
    let form = match bind_form::<F>(raw.clone()) {
        Ok(form) => form,
        Err(rejection) => {
            tracing::debug!(
                namespace = %F::NAMESPACE,
                errors = ?rejection.errors,
                "Settings rejected"
            );
            return Ok(SettingsOutcome::Rejected(rejection));
        }
    };

    let errors = check(&form);
    if !errors.is_empty() {
        return Ok(SettingsOutcome::Rejected(Rejection::new(errors, raw)));
    }

    let snapshot = persist_form(config, &form).await?;
    Ok(SettingsOutcome::Done(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ConfigNamespace;
    use crate::models::settings::{
        LineBreaksSettingForm, PresentationSettingForm, SecuritySettingForm,
    };
    use crate::services::config_service::InMemoryConfigStore;
    use serde_json::json;
    use std::sync::Arc;

    fn service() -> ConfigService {
        ConfigService::new(Arc::new(InMemoryConfigStore::new()))
    }

    #[tokio::test]
    async fn test_valid_form_is_committed() {
        let config = service();
        let outcome = apply_settings::<LineBreaksSettingForm, _>(
            &config,
            json!({
                "markdown:isEnabledLinebreaks": true,
                "markdown:isEnabledLinebreaksInComments": false
            }),
            |_| vec![],
        )
        .await
        .unwrap();

        match outcome {
            SettingsOutcome::Done(snapshot) => {
                assert_eq!(snapshot["markdown:isEnabledLinebreaks"], json!(true))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let cached = config.get(ConfigNamespace::Markdown).await.unwrap();
        assert_eq!(cached["markdown:isEnabledLinebreaksInComments"], json!(false));
    }

    #[tokio::test]
    async fn test_invalid_form_changes_nothing() {
        let config = service();
        config
            .commit(
                ConfigNamespace::Markdown,
                [(
                    "markdown:presentation:pageBreakSeparator".to_string(),
                    json!(1),
                )]
                .into_iter()
                .collect(),
            )
            .await
            .unwrap();
        let before = config.get(ConfigNamespace::Markdown).await.unwrap();

        let submitted = json!({ "markdown:presentation:pageBreakSeparator": 9 });
        let outcome =
            apply_settings::<PresentationSettingForm, _>(&config, submitted.clone(), |_| vec![])
                .await
                .unwrap();

        match outcome {
            SettingsOutcome::Rejected(rejection) => {
                assert!(!rejection.errors.is_empty());
                assert_eq!(rejection.form, submitted);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(config.get(ConfigNamespace::Markdown).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_malformed_form_is_rejected() {
        let config = service();
        let outcome = apply_settings::<LineBreaksSettingForm, _>(
            &config,
            json!({ "markdown:isEnabledLinebreaks": "sometimes" }),
            |_| vec![],
        )
        .await
        .unwrap();

        assert!(matches!(outcome, SettingsOutcome::Rejected(_)));
        assert!(config.get(ConfigNamespace::Markdown).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_check_can_reject_valid_form() {
        let config = service();
        let outcome = apply_settings::<SecuritySettingForm, _>(
            &config,
            json!({ "security:restrictGuestMode": "Deny" }),
            |form| form.public_wiki_violations(),
        )
        .await
        .unwrap();

        match outcome {
            SettingsOutcome::Rejected(rejection) => assert_eq!(rejection.errors.len(), 1),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(config.get(ConfigNamespace::Crowi).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let store = Arc::new(InMemoryConfigStore::new());
        store.set_fail_writes(true);
        let config = ConfigService::new(store);

        let result = apply_settings::<LineBreaksSettingForm, _>(
            &config,
            json!({
                "markdown:isEnabledLinebreaks": true,
                "markdown:isEnabledLinebreaksInComments": true
            }),
            |_| vec![],
        )
        .await;

        assert!(matches!(result, Err(SettingsError::Store(_))));
    }

    #[test]
    fn test_rejection_message_joins_lines() {
        let rejection = Rejection::new(vec!["a".into(), "b".into()], json!({}));
        assert_eq!(rejection.message(), "a\nb");
    }
}
