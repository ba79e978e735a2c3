use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serialized lowercase; parsed case-insensitively from paths and bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Platform {
    Instagram,
    Facebook,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Instagram, Platform::Facebook, Platform::TikTok];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::TikTok => "tiktok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported platform '{}'", s))
    }
}

impl TryFrom<String> for Platform {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Stored OAuth credentials for one platform account of a tenant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialConnection {
    pub organization_id: Uuid,
    pub platform: Platform,
    pub account_id: String,
    pub account_name: Option<String>,
    pub profile_url: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialConnection {
    pub fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at.is_some_and(|expires| expires <= now)
    }
}

/// What the API returns for a connection: never the token itself.
#[derive(Debug, Clone, Serialize)]
pub struct SocialConnectionView {
    #[serde(flatten)]
    pub connection: SocialConnection,
    pub token_expired: bool,
}

impl SocialConnectionView {
    pub fn at(connection: SocialConnection, now: DateTime<Utc>) -> Self {
        let token_expired = connection.is_token_expired(now);
        Self {
            connection,
            token_expired,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrganization {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertConnection {
    pub account_id: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// Lowercase ASCII alphanumerics; any other run of characters becomes one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Acme Coffee Co."), "acme-coffee-co");
        assert_eq!(slugify("  --Hello__World--  "), "hello-world");
        assert_eq!(slugify("Café Olé"), "caf-ol");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("TikTok".parse::<Platform>(), Ok(Platform::TikTok));
        assert_eq!("instagram".parse::<Platform>(), Ok(Platform::Instagram));
        assert!("myspace".parse::<Platform>().is_err());

        let platform: Platform = serde_json::from_str("\"TikTok\"").unwrap();
        assert_eq!(platform, Platform::TikTok);
        assert_eq!(serde_json::to_string(&platform).unwrap(), "\"tiktok\"");
        assert_eq!(serde_json::to_string(&Platform::TikTok).unwrap(), "\"tiktok\"");
    }

    #[test]
    fn view_hides_token_and_flags_expiry() {
        let now = Utc::now();
        let connection = SocialConnection {
            organization_id: Uuid::new_v4(),
            platform: Platform::Facebook,
            account_id: "page-1".into(),
            account_name: Some("Acme".into()),
            profile_url: None,
            access_token: "secret-token".into(),
            token_expires_at: Some(now - Duration::hours(1)),
            connected_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(SocialConnectionView::at(connection, now)).unwrap();
        assert!(json.get("access_token").is_none());
        assert_eq!(json["token_expired"], true);
        assert_eq!(json["platform"], "facebook");
        assert_eq!(json["account_id"], "page-1");
    }
}
