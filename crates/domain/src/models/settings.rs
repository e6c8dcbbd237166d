//! Settings forms bound to configuration namespaces.
//!
//! Each form field is serialized under its dotted configuration key. Fields
//! left out of a submission are not part of the change set, so a form only
//! ever touches the keys it carries.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::validation::{split_comma_list, split_lines};
use validator::{Validate, ValidationError};

use super::config::{ConfigNamespace, ConfigSnapshot};
use super::presets::highlight_js_style;

/// A form whose fields map one-to-one onto configuration keys.
pub trait SettingsForm: DeserializeOwned + Serialize + Validate + Send + Sync {
    /// Namespace the form writes to.
    const NAMESPACE: ConfigNamespace;

    /// Key/value pairs to persist.
    fn changes(&self) -> Result<ConfigSnapshot, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Ok(ConfigSnapshot::new()),
        }
    }
}

fn validate_highlight_style(key: &str) -> Result<(), ValidationError> {
    if highlight_js_style(key).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("highlight_js_style");
        err.message = Some(format!("Unknown highlight.js style: {}", key).into());
        Err(err)
    }
}

fn validate_global_lang(lang: &str) -> Result<(), ValidationError> {
    match lang {
        "en-US" | "ja" => Ok(()),
        _ => {
            let mut err = ValidationError::new("global_lang");
            err.message = Some("Language must be en-US or ja".into());
            Err(err)
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppSettingForm {
    #[serde(rename = "app:title", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "Site name must be at most 255 characters"))]
    pub title: Option<String>,

    #[serde(rename = "app:confidential", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "Confidential label must be at most 255 characters"))]
    pub confidential: Option<String>,

    #[serde(rename = "app:globalLang", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_global_lang"))]
    pub global_lang: Option<String>,

    #[serde(rename = "app:fileUpload", skip_serializing_if = "Option::is_none")]
    pub file_upload: Option<bool>,
}

impl SettingsForm for AppSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SiteUrlSettingForm {
    #[serde(rename = "app:siteUrl")]
    #[validate(url(message = "Site URL must be a valid URL"))]
    pub site_url: String,
}

impl SettingsForm for SiteUrlSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MailSettingForm {
    #[serde(rename = "mail:from")]
    #[validate(email(message = "Sender must be a valid email address"))]
    pub from: String,

    #[serde(rename = "mail:smtpHost")]
    #[validate(length(min = 1, message = "SMTP host is required"))]
    pub smtp_host: String,

    #[serde(rename = "mail:smtpPort")]
    #[validate(range(min = 1, message = "SMTP port must be positive"))]
    pub smtp_port: u16,

    #[serde(rename = "mail:smtpUser", default)]
    pub smtp_user: String,

    #[serde(rename = "mail:smtpPassword", default)]
    pub smtp_password: String,
}

impl SettingsForm for MailSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

impl MailSettingForm {
    /// Credentials are only used when both parts are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.smtp_user.is_empty() || self.smtp_password.is_empty() {
            None
        } else {
            Some((&self.smtp_user, &self.smtp_password))
        }
    }

    /// Port 465 speaks TLS from the first byte.
    pub fn implicit_tls(&self) -> bool {
        self.smtp_port == 465
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AwsSettingForm {
    #[serde(rename = "aws:region", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(rename = "aws:customEndpoint", skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Custom endpoint must be a valid URL"))]
    pub custom_endpoint: Option<String>,

    #[serde(rename = "aws:bucket", skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(rename = "aws:accessKeyId", skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(rename = "aws:secretAccessKey", skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

impl SettingsForm for AwsSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PluginSettingForm {
    #[serde(rename = "plugin:isEnabledPlugins")]
    pub is_enabled_plugins: bool,
}

impl SettingsForm for PluginSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

// ---------------------------------------------------------------------------
// Security
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuestMode {
    Deny,
    Readonly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationMode {
    Open,
    Restricted,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecuritySettingForm {
    #[serde(rename = "security:restrictGuestMode", skip_serializing_if = "Option::is_none")]
    pub restrict_guest_mode: Option<GuestMode>,

    #[serde(rename = "security:registrationMode", skip_serializing_if = "Option::is_none")]
    pub registration_mode: Option<RegistrationMode>,

    /// One entry per line, stored as an array.
    #[serde(rename = "security:registrationWhiteList", skip_serializing_if = "Option::is_none")]
    pub registration_white_list: Option<String>,

    #[serde(rename = "security:basicName", default)]
    #[validate(length(max = 255, message = "Basic auth user must be at most 255 characters"))]
    pub basic_name: String,

    #[serde(rename = "security:basicSecret", default)]
    #[validate(length(max = 255, message = "Basic auth secret must be at most 255 characters"))]
    pub basic_secret: String,
}

impl SettingsForm for SecuritySettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;

    fn changes(&self) -> Result<ConfigSnapshot, serde_json::Error> {
        let mut changes = match serde_json::to_value(self)? {
            Value::Object(map) => map.into_iter().collect::<ConfigSnapshot>(),
            _ => ConfigSnapshot::new(),
        };
        if let Some(list) = &self.registration_white_list {
            changes.insert(
                "security:registrationWhiteList".to_string(),
                Value::from(split_lines(list)),
            );
        }
        Ok(changes)
    }
}

impl SecuritySettingForm {
    /// Settings a public-only wiki cannot accept.
    pub fn public_wiki_violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.basic_name.is_empty() || !self.basic_secret.is_empty() {
            errors.push("Basic authentication is not available on a public wiki.".to_string());
        }
        if self.restrict_guest_mode == Some(GuestMode::Deny) {
            errors.push("A public wiki cannot be switched to private.".to_string());
        }
        errors
    }
}

// ---------------------------------------------------------------------------
// Passport providers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LdapSettingForm {
    #[serde(rename = "security:passport-ldap:isEnabled")]
    pub is_enabled: bool,

    #[serde(rename = "security:passport-ldap:serverUrl", skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    #[serde(rename = "security:passport-ldap:isUserBind", skip_serializing_if = "Option::is_none")]
    pub is_user_bind: Option<bool>,

    #[serde(rename = "security:passport-ldap:bindDN", skip_serializing_if = "Option::is_none")]
    pub bind_dn: Option<String>,

    #[serde(
        rename = "security:passport-ldap:bindDNPassword",
        skip_serializing_if = "Option::is_none"
    )]
    pub bind_dn_password: Option<String>,

    #[serde(
        rename = "security:passport-ldap:searchFilter",
        skip_serializing_if = "Option::is_none"
    )]
    pub search_filter: Option<String>,

    #[serde(
        rename = "security:passport-ldap:attrMapUsername",
        skip_serializing_if = "Option::is_none"
    )]
    pub attr_map_username: Option<String>,

    #[serde(rename = "security:passport-ldap:attrMapName", skip_serializing_if = "Option::is_none")]
    pub attr_map_name: Option<String>,

    #[serde(rename = "security:passport-ldap:attrMapMail", skip_serializing_if = "Option::is_none")]
    pub attr_map_mail: Option<String>,

    #[serde(
        rename = "security:passport-ldap:isSameUsernameTreatedAsIdenticalUser",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_same_username_treated_as_identical_user: Option<bool>,

    #[serde(
        rename = "security:passport-ldap:groupSearchBase",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_search_base: Option<String>,

    #[serde(
        rename = "security:passport-ldap:groupSearchFilter",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_search_filter: Option<String>,

    #[serde(
        rename = "security:passport-ldap:groupDnProperty",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_dn_property: Option<String>,
}

impl SettingsForm for LdapSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SamlSettingForm {
    #[serde(rename = "security:passport-saml:isEnabled")]
    pub is_enabled: bool,

    #[serde(rename = "security:passport-saml:entryPoint", skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,

    #[serde(rename = "security:passport-saml:callbackUrl", skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,

    #[serde(rename = "security:passport-saml:issuer", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    #[serde(rename = "security:passport-saml:cert", skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,

    #[serde(rename = "security:passport-saml:attrMapId", skip_serializing_if = "Option::is_none")]
    pub attr_map_id: Option<String>,

    #[serde(
        rename = "security:passport-saml:attrMapUsername",
        skip_serializing_if = "Option::is_none"
    )]
    pub attr_map_username: Option<String>,

    #[serde(rename = "security:passport-saml:attrMapMail", skip_serializing_if = "Option::is_none")]
    pub attr_map_mail: Option<String>,

    #[serde(
        rename = "security:passport-saml:attrMapFirstName",
        skip_serializing_if = "Option::is_none"
    )]
    pub attr_map_first_name: Option<String>,

    #[serde(
        rename = "security:passport-saml:attrMapLastName",
        skip_serializing_if = "Option::is_none"
    )]
    pub attr_map_last_name: Option<String>,

    #[serde(
        rename = "security:passport-saml:isSameUsernameTreatedAsIdenticalUser",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_same_username_treated_as_identical_user: Option<bool>,

    #[serde(
        rename = "security:passport-saml:isSameEmailTreatedAsIdenticalUser",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_same_email_treated_as_identical_user: Option<bool>,
}

impl SettingsForm for SamlSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GoogleSettingForm {
    #[serde(rename = "security:passport-google:isEnabled")]
    pub is_enabled: bool,

    #[serde(rename = "security:passport-google:clientId", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(
        rename = "security:passport-google:clientSecret",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_secret: Option<String>,

    #[serde(
        rename = "security:passport-google:isSameUsernameTreatedAsIdenticalUser",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_same_username_treated_as_identical_user: Option<bool>,
}

impl SettingsForm for GoogleSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GitHubSettingForm {
    #[serde(rename = "security:passport-github:isEnabled")]
    pub is_enabled: bool,

    #[serde(rename = "security:passport-github:clientId", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(
        rename = "security:passport-github:clientSecret",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_secret: Option<String>,

    #[serde(
        rename = "security:passport-github:isSameUsernameTreatedAsIdenticalUser",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_same_username_treated_as_identical_user: Option<bool>,
}

impl SettingsForm for GitHubSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

/// Stored under the consumer key and secret names.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TwitterSettingForm {
    #[serde(rename = "security:passport-twitter:isEnabled")]
    pub is_enabled: bool,

    #[serde(
        rename = "security:passport-twitter:consumerKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_id: Option<String>,

    #[serde(
        rename = "security:passport-twitter:consumerSecret",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_secret: Option<String>,

    #[serde(
        rename = "security:passport-twitter:isSameUsernameTreatedAsIdenticalUser",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_same_username_treated_as_identical_user: Option<bool>,
}

impl SettingsForm for TwitterSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SlackPassportSettingForm {
    #[serde(rename = "security:passport-slack:isEnabled")]
    pub is_enabled: bool,

    #[serde(
        rename = "security:passport-slack:consumerKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_id: Option<String>,

    #[serde(
        rename = "security:passport-slack:consumerSecret",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_secret: Option<String>,

    #[serde(
        rename = "security:passport-slack:isSameUsernameTreatedAsIdenticalUser",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_same_username_treated_as_identical_user: Option<bool>,
}

impl SettingsForm for SlackPassportSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineBreaksSettingForm {
    #[serde(rename = "markdown:isEnabledLinebreaks")]
    pub is_enabled_linebreaks: bool,

    #[serde(rename = "markdown:isEnabledLinebreaksInComments")]
    pub is_enabled_linebreaks_in_comments: bool,
}

impl SettingsForm for LineBreaksSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Markdown;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PresentationSettingForm {
    #[serde(rename = "markdown:presentation:pageBreakSeparator")]
    #[validate(range(min = 1, max = 3, message = "Page break separator must be 1, 2 or 3"))]
    pub page_break_separator: u8,

    #[serde(
        rename = "markdown:presentation:pageBreakCustomSeparator",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_break_custom_separator: Option<String>,
}

impl SettingsForm for PresentationSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Markdown;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct XssSettingForm {
    #[serde(rename = "markdown:xss:isEnabledPrevention")]
    pub is_enabled_prevention: bool,

    #[serde(rename = "markdown:xss:option", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 3, message = "XSS option must be 1, 2 or 3"))]
    pub option: Option<u8>,

    /// Comma-separated; stored as an array.
    #[serde(rename = "markdown:xss:tagWhiteList", default)]
    pub tag_white_list: String,

    /// Comma-separated; stored as an array.
    #[serde(rename = "markdown:xss:attrWhiteList", default)]
    pub attr_white_list: String,
}

impl SettingsForm for XssSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Markdown;

    fn changes(&self) -> Result<ConfigSnapshot, serde_json::Error> {
        let mut changes = ConfigSnapshot::new();
        changes.insert(
            "markdown:xss:isEnabledPrevention".to_string(),
            Value::Bool(self.is_enabled_prevention),
        );
        if let Some(option) = self.option {
            changes.insert("markdown:xss:option".to_string(), Value::from(option));
        }
        changes.insert(
            "markdown:xss:tagWhiteList".to_string(),
            Value::from(split_comma_list(&self.tag_white_list)),
        );
        changes.insert(
            "markdown:xss:attrWhiteList".to_string(),
            Value::from(split_comma_list(&self.attr_white_list)),
        );
        Ok(changes)
    }
}

// ---------------------------------------------------------------------------
// Customize
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomizeSettingForm {
    #[serde(rename = "customize:layout", skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    #[serde(rename = "customize:theme", skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(rename = "customize:behavior", skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,

    #[serde(rename = "customize:title", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "Title format must be at most 255 characters"))]
    pub title: Option<String>,

    #[serde(rename = "customize:highlightJsStyle", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_highlight_style"))]
    pub highlight_js_style: Option<String>,

    #[serde(rename = "customize:highlightJsStyleBorder", skip_serializing_if = "Option::is_none")]
    pub highlight_js_style_border: Option<bool>,

    #[serde(rename = "customize:css", skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,

    #[serde(rename = "customize:script", skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(rename = "customize:header", skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    #[serde(rename = "customize:isEnabledTimeline", skip_serializing_if = "Option::is_none")]
    pub is_enabled_timeline: Option<bool>,

    #[serde(
        rename = "customize:isSavedStatesOfTabChanges",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_saved_states_of_tab_changes: Option<bool>,

    #[serde(
        rename = "customize:isEnabledAttachTitleHeader",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_enabled_attach_title_header: Option<bool>,

    #[serde(rename = "customize:showRecentCreatedNumber", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 100, message = "Recent created number must be 1-100"))]
    pub show_recent_created_number: Option<u32>,
}

impl SettingsForm for CustomizeSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SlackAppSettingForm {
    #[serde(rename = "slack:clientId")]
    pub client_id: String,

    #[serde(rename = "slack:clientSecret")]
    pub client_secret: String,
}

impl SettingsForm for SlackAppSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Notification;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SlackIwhSettingForm {
    #[serde(rename = "slack:incomingWebhookUrl")]
    #[validate(url(message = "Incoming webhook URL must be a valid URL"))]
    pub incoming_webhook_url: String,

    #[serde(rename = "slack:isIncomingWebhookPrioritized", default)]
    pub is_incoming_webhook_prioritized: bool,
}

impl SettingsForm for SlackIwhSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Notification;
}

// ---------------------------------------------------------------------------
// Importer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EsaImporterSettingForm {
    #[serde(rename = "importer:esa:team_name")]
    #[validate(length(min = 1, message = "esa team name is required"))]
    pub team_name: String,

    #[serde(rename = "importer:esa:access_token")]
    #[validate(length(min = 1, message = "esa access token is required"))]
    pub access_token: String,
}

impl SettingsForm for EsaImporterSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QiitaImporterSettingForm {
    #[serde(rename = "importer:qiita:team_name")]
    #[validate(length(min = 1, message = "Qiita team name is required"))]
    pub team_name: String,

    #[serde(rename = "importer:qiita:access_token")]
    #[validate(length(min = 1, message = "Qiita access token is required"))]
    pub access_token: String,
}

impl SettingsForm for QiitaImporterSettingForm {
    const NAMESPACE: ConfigNamespace = ConfigNamespace::Crowi;
}
