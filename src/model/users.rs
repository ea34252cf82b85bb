// Platform user records.
// Canonical user shape plus display helpers for initials and avatar colour.

use serde::{Deserialize, Serialize};

use super::Searchable;
use super::normalize::{FieldAlias, Fields, Record};

/// A platform user in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserItem {
    pub user_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub created_at: String,
}

impl Record for UserItem {
    const ALIASES: &'static [FieldAlias] = &[
        FieldAlias::new("userId", &["id", "userId", "_id"]),
        FieldAlias::new("email", &["email", "username"]),
        FieldAlias::new("username", &["username"]),
        FieldAlias::new("rawEmail", &["email"]),
        FieldAlias::new("isVerified", &["isVerified", "verified"]),
        FieldAlias::new("firstName", &["firstName", "first_name"]),
        FieldAlias::new("lastName", &["lastName", "last_name"]),
        FieldAlias::new("createdAt", &["createdAt", "created_at"]),
    ];
    const LIST_FIELDS: &'static [&'static str] = &["items", "users"];

    fn from_raw(raw: &Fields<'_>) -> Self {
        let username = raw.text("username").or_else(|| {
            raw.text("rawEmail")
                .filter(|email| !email.is_empty())
                .and_then(|email| email.split('@').next().map(str::to_string))
        });

        Self {
            user_id: raw.text_or("userId", ""),
            email: raw.text_or("email", ""),
            username,
            is_verified: raw.flag("isVerified").unwrap_or(false),
            first_name: raw.text("firstName"),
            last_name: raw.text("lastName"),
            created_at: raw.text_or("createdAt", ""),
        }
    }
}

impl UserItem {
    /// Name shown in listings: username, else the local part of the email.
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.split('@').next().map(str::to_string))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "-".to_string())
    }

    /// Up to two upper-case initials for an avatar.
    pub fn initials(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.chars().take(2).collect::<String>().to_uppercase();
        }

        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if !name.is_empty() {
            return name
                .split(' ')
                .filter_map(|part| part.chars().next())
                .take(2)
                .collect::<String>()
                .to_uppercase();
        }

        if self.email.is_empty() {
            return "?".to_string();
        }
        self.email.chars().take(2).collect::<String>().to_uppercase()
    }

    /// Deterministic avatar colour derived from the display name.
    pub fn avatar_color(&self) -> String {
        let seed = self.username.as_deref().unwrap_or(&self.email);
        color_from(seed)
    }
}

/// Hash a string into a `#RRGGBB` colour.
///
/// Uses the 32-bit `h = (h << 5) - h + c` hash over UTF-16 code units so the
/// colours match those shown by the web console.
pub fn color_from(seed: &str) -> String {
    let hash = seed.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
    });
    format!("#{:06X}", hash & 0x00ff_ffff)
}

impl Searchable for UserItem {
    fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.email.to_lowercase().contains(&query)
            || self
                .username
                .as_deref()
                .is_some_and(|u| u.to_lowercase().contains(&query))
            || self.user_id.to_lowercase().contains(&query)
    }
}
