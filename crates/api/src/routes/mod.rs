//! HTTP route handlers.
//!
//! Admin views answer with JSON view models, form submissions with a
//! [`FlashRedirect`](crate::responses::FlashRedirect), and `/_api/admin`
//! endpoints with a status or `ApiResponse` body.

pub mod admin;
pub mod external_accounts;
pub mod global_notification;
pub mod health;
pub mod importer;
pub mod markdown;
pub mod notification;
pub mod search;
pub mod settings;
pub mod user_groups;
pub mod users;

use serde::Deserialize;
use serde_json::Value;
use shared::pagination::{compute_window, page_count, Pager, MAX_PAGE_LIST};

use crate::app::AppState;
use crate::middleware::metrics::record_settings_update;
use domain::models::{ConfigSnapshot, SettingsForm};
use domain::services::{apply_settings, Rejection, SettingsOutcome};

/// `?page=` of paginated views.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    /// Requested page, 1 when absent or zero.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Body of settings submissions: the form fields keyed by configuration key.
#[derive(Debug, Deserialize)]
pub struct SettingFormBody {
    #[serde(
        rename = "settingForm",
        alias = "markdownSetting",
        alias = "slackSetting",
        alias = "slackIwhSetting"
    )]
    pub setting_form: Value,
}

/// Page window of a list view.
pub fn pager(total: i64, limit: u32, page: u32) -> Pager {
    let pages = page_count(total, limit);
    compute_window(total, limit, page, pages, MAX_PAGE_LIST)
}

/// Runs the settings pipeline for `F`.
///
/// Store failures are logged and reported as a rejection with a generic
/// message, so callers only deal with "saved" or "not saved".
pub(crate) async fn save_settings<F, C>(
    state: &AppState,
    label: &'static str,
    raw: Value,
    check: C,
) -> Result<ConfigSnapshot, Rejection>
where
    F: SettingsForm,
    C: FnOnce(&F) -> Vec<String>,
{
    match apply_settings::<F, C>(&state.settings, raw.clone(), check).await {
        Ok(SettingsOutcome::Done(snapshot)) => {
            record_settings_update(label, "done");
            tracing::info!(form = label, "Settings updated");
            Ok(snapshot)
        }
        Ok(SettingsOutcome::Rejected(rejection)) => {
            record_settings_update(label, "rejected");
            Err(rejection)
        }
        Err(e) => {
            record_settings_update(label, "error");
            tracing::error!(form = label, error = %e, "Failed to save settings");
            Err(Rejection::new(
                vec!["Failed to save settings. Please try again.".to_string()],
                raw,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_query_defaults_to_first_page() {
        assert_eq!(PageQuery::default().page(), 1);
        assert_eq!(PageQuery { page: Some(0) }.page(), 1);
        assert_eq!(PageQuery { page: Some(7) }.page(), 7);
    }

    #[test]
    fn test_setting_form_body_aliases() {
        let body: SettingFormBody =
            serde_json::from_value(json!({ "markdownSetting": { "a": 1 } })).unwrap();
        assert_eq!(body.setting_form, json!({ "a": 1 }));

        let body: SettingFormBody =
            serde_json::from_value(json!({ "settingForm": { "b": true } })).unwrap();
        assert_eq!(body.setting_form, json!({ "b": true }));
    }

    #[test]
    fn test_pager_for_list() {
        let pager = pager(120, 50, 2);
        assert_eq!(pager.pages_count, 3);
        assert_eq!(pager.pages, vec![1, 2, 3]);
        assert_eq!(pager.previous, Some(1));
        assert_eq!(pager.next, Some(3));

        let empty = super::pager(0, 50, 1);
        assert!(empty.pages.is_empty());
        assert!(!empty.previous_dots && !empty.next_dots);
    }
}
