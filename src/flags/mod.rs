//! Role to capability derivation and flag cache validators.
//!
//! Flow Overview: a request's resolved role (or its absence) maps to a fixed
//! set of boolean capabilities. Derivation is pure and total; flags are never
//! stored, only recomputed. The ETag helpers produce the validator the flags
//! endpoint uses for conditional responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Access tier assigned at registration. Fixed for the lifetime of the user
/// short of an administrative change, which is out of scope here.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

impl Role {
    /// All roles accepted at registration, in capability order.
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Editor, Role::Admin];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "VIEWER",
            Role::Editor => "EDITOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VIEWER" => Ok(Role::Viewer),
            "EDITOR" => Ok(Role::Editor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Boolean capability set consumed by the UI to decide what to render.
///
/// The default value (all false) stands in for "no identity" and is also the
/// client-side fallback when the flags endpoint cannot be reached.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub can_view_analytics: bool,
    pub can_edit_content: bool,
    pub show_admin_dashboard: bool,
    pub can_access_settings: bool,
}

/// Derive the capability set for a role, or the all-false set for anonymous
/// requests. Pure and exhaustive: adding a role forces this match to be
/// revisited.
#[must_use]
pub fn derive_flags(role: Option<Role>) -> FeatureFlags {
    match role {
        None => FeatureFlags::default(),
        Some(Role::Viewer) => FeatureFlags {
            can_view_analytics: true,
            ..FeatureFlags::default()
        },
        Some(Role::Editor) => FeatureFlags {
            can_view_analytics: true,
            can_edit_content: true,
            can_access_settings: true,
            show_admin_dashboard: false,
        },
        Some(Role::Admin) => FeatureFlags {
            can_view_analytics: true,
            can_edit_content: true,
            show_admin_dashboard: true,
            can_access_settings: true,
        },
    }
}

/// Coarse time bucket for the flags validator. Flags change at most once per
/// bucket, so a role change or logout may take up to 60 seconds to be
/// observed by a caching client. That bound matches the endpoint's
/// `Cache-Control: max-age=60` and is intentional.
#[must_use]
pub fn minute_bucket(now_unix: i64) -> i64 {
    now_unix / 60
}

/// Entity tag for the flags response. One tag serves both the
/// `If-None-Match` comparison and the outgoing `ETag` header.
#[must_use]
pub fn flags_etag(identity: Option<(Uuid, Role)>, bucket: i64) -> String {
    match identity {
        Some((user_id, role)) => format!("\"{user_id}-{role}-{bucket}\""),
        None => format!("\"anonymous-anonymous-{bucket}\""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_count(flags: FeatureFlags) -> usize {
        [
            flags.can_view_analytics,
            flags.can_edit_content,
            flags.show_admin_dashboard,
            flags.can_access_settings,
        ]
        .iter()
        .filter(|enabled| **enabled)
        .count()
    }

    fn is_superset(outer: FeatureFlags, inner: FeatureFlags) -> bool {
        (!inner.can_view_analytics || outer.can_view_analytics)
            && (!inner.can_edit_content || outer.can_edit_content)
            && (!inner.show_admin_dashboard || outer.show_admin_dashboard)
            && (!inner.can_access_settings || outer.can_access_settings)
    }

    #[test]
    fn anonymous_flags_all_false() {
        assert_eq!(derive_flags(None), FeatureFlags::default());
        assert_eq!(enabled_count(derive_flags(None)), 0);
    }

    #[test]
    fn derivation_is_deterministic() {
        for role in Role::ALL {
            assert_eq!(derive_flags(Some(role)), derive_flags(Some(role)));
        }
    }

    #[test]
    fn roles_form_strict_superset_chain() {
        let viewer = derive_flags(Some(Role::Viewer));
        let editor = derive_flags(Some(Role::Editor));
        let admin = derive_flags(Some(Role::Admin));

        assert!(is_superset(editor, viewer));
        assert!(is_superset(admin, editor));
        // Strict: each tier enables more than the one below it.
        assert!(enabled_count(editor) > enabled_count(viewer));
        assert!(enabled_count(admin) > enabled_count(editor));
    }

    #[test]
    fn viewer_gets_analytics_only() {
        let flags = derive_flags(Some(Role::Viewer));
        assert!(flags.can_view_analytics);
        assert!(!flags.can_edit_content);
        assert!(!flags.show_admin_dashboard);
        assert!(!flags.can_access_settings);
    }

    #[test]
    fn admin_gets_everything() {
        let flags = derive_flags(Some(Role::Admin));
        assert_eq!(enabled_count(flags), 4);
    }

    #[test]
    fn flags_serialize_camel_case() {
        let json = serde_json::to_value(derive_flags(Some(Role::Editor))).unwrap();
        assert_eq!(json["canViewAnalytics"], true);
        assert_eq!(json["canEditContent"], true);
        assert_eq!(json["showAdminDashboard"], false);
        assert_eq!(json["canAccessSettings"], true);
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("SUPERUSER".parse::<Role>().is_err());
        assert!("viewer".parse::<Role>().is_err());
    }

    #[test]
    fn etag_includes_identity_and_bucket() {
        let user_id = Uuid::new_v4();
        let tag = flags_etag(Some((user_id, Role::Editor)), 42);
        assert_eq!(tag, format!("\"{user_id}-EDITOR-42\""));
        assert_eq!(flags_etag(None, 42), "\"anonymous-anonymous-42\"");
    }

    #[test]
    fn etag_changes_with_bucket_and_role() {
        let user_id = Uuid::new_v4();
        let first = flags_etag(Some((user_id, Role::Viewer)), 1);
        assert_ne!(first, flags_etag(Some((user_id, Role::Viewer)), 2));
        assert_ne!(first, flags_etag(Some((user_id, Role::Admin)), 1));
    }

    #[test]
    fn minute_bucket_is_coarse() {
        assert_eq!(minute_bucket(0), 0);
        assert_eq!(minute_bucket(59), 0);
        assert_eq!(minute_bucket(60), 1);
        assert_eq!(minute_bucket(61), 1);
    }
}
