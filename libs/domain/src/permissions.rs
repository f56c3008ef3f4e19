//! Granular permission model
//!
//! A [`PermissionSet`] maps a module name to the actions allowed on it. The
//! horses module additionally carries a `sections` map that gates individual
//! parts of a horse record. Every lookup treats a missing key as a denial.
//!
//! Evaluation order for [`has_permission`]:
//!
//! 1. an inactive user is denied everything, super admins included;
//! 2. an active super admin is allowed everything, whatever is stored;
//! 3. a user without a stored set is denied;
//! 4. otherwise the stored boolean decides, absent meaning `false`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Role, User};

/// Module names used as top-level permission keys
pub mod modules {
    pub const DASHBOARD: &str = "dashboard";
    pub const HORSES: &str = "horses";
    pub const CLIENTS: &str = "clients";
    pub const EMPLOYEES: &str = "employees";
    pub const EVENTS: &str = "events";
    pub const PAYMENTS: &str = "payments";
    pub const USERS: &str = "users";
    pub const ALERTS: &str = "alerts";
    pub const REPORTS: &str = "reports";

    pub const ALL: &[&str] = &[
        DASHBOARD, HORSES, CLIENTS, EMPLOYEES, EVENTS, PAYMENTS, USERS, ALERTS, REPORTS,
    ];
}

/// Sections of a horse record
pub mod sections {
    pub const INFO: &str = "info";
    pub const FEEDING: &str = "feeding";
    pub const HANDLING: &str = "handling";
    pub const HEALTH_HISTORY: &str = "health_history";
    pub const VACCINES: &str = "vaccines";
    pub const SHOEING: &str = "shoeing";
    pub const DEWORMING: &str = "deworming";
    pub const PHOTOS: &str = "photos";
    pub const QR: &str = "qr";
    pub const SANITARY_PLAN: &str = "sanitary_plan";

    pub const ALL: &[&str] = &[
        INFO,
        FEEDING,
        HANDLING,
        HEALTH_HISTORY,
        VACCINES,
        SHOEING,
        DEWORMING,
        PHOTOS,
        QR,
        SANITARY_PLAN,
    ];
}

string_enum! {
    /// Module-level action
    pub enum Action {
        View => "view",
        Create => "create",
        Edit => "edit",
        Delete => "delete",
    }
}

string_enum! {
    /// Section-level action
    pub enum SectionAction {
        View => "view",
        Edit => "edit",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionPermissions {
    pub view: bool,
    pub edit: bool,
}

impl SectionPermissions {
    pub fn allows(&self, action: SectionAction) -> bool {
        match action {
            SectionAction::View => self.view,
            SectionAction::Edit => self.edit,
        }
    }
}

/// Actions allowed on a single module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePermissions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, SectionPermissions>,
    #[serde(flatten)]
    pub actions: BTreeMap<String, bool>,
}

impl ModulePermissions {
    pub fn allows(&self, action: Action) -> bool {
        self.actions.get(action.as_str()).copied().unwrap_or(false)
    }

    pub fn allows_section(&self, section: &str, action: SectionAction) -> bool {
        self.sections
            .get(section)
            .is_some_and(|perms| perms.allows(action))
    }

    fn with_actions(view: bool, create: bool, edit: bool, delete: bool) -> Self {
        let actions = [
            (Action::View, view),
            (Action::Create, create),
            (Action::Edit, edit),
            (Action::Delete, delete),
        ]
        .into_iter()
        .map(|(action, allowed)| (action.as_str().to_string(), allowed))
        .collect();

        Self {
            sections: BTreeMap::new(),
            actions,
        }
    }
}

/// Stored permission set, keyed by module name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(pub BTreeMap<String, ModulePermissions>);

impl PermissionSet {
    pub fn module(&self, module: &str) -> Option<&ModulePermissions> {
        self.0.get(module)
    }

    pub fn allows(&self, module: &str, action: Action) -> bool {
        self.module(module).is_some_and(|perms| perms.allows(action))
    }

    /// Section lookups also require `view` on the horses module.
    pub fn allows_section(&self, section: &str, action: SectionAction) -> bool {
        self.module(modules::HORSES).is_some_and(|horses| {
            horses.allows(Action::View) && horses.allows_section(section, action)
        })
    }

    pub fn set(&mut self, module: &str, action: Action, allowed: bool) {
        self.0
            .entry(module.to_string())
            .or_default()
            .actions
            .insert(action.as_str().to_string(), allowed);
    }

    pub fn set_section(&mut self, section: &str, perms: SectionPermissions) {
        self.0
            .entry(modules::HORSES.to_string())
            .or_default()
            .sections
            .insert(section.to_string(), perms);
    }

    /// Decode a stored JSON document, dropping every entry whose shape is not
    /// understood instead of failing.
    pub fn from_json_lenient(value: &Value) -> PermissionSet {
        let mut set = PermissionSet::default();
        let Some(modules) = value.as_object() else {
            return set;
        };

        for (module, entry) in modules {
            let Some(entry) = entry.as_object() else {
                continue;
            };
            let mut perms = ModulePermissions::default();

            for (key, value) in entry {
                if key == "sections" {
                    let Some(sections) = value.as_object() else {
                        continue;
                    };
                    for (section, flags) in sections {
                        let Some(flags) = flags.as_object() else {
                            continue;
                        };
                        let flag = |name: &str| {
                            flags.get(name).and_then(Value::as_bool).unwrap_or(false)
                        };
                        perms.sections.insert(
                            section.clone(),
                            SectionPermissions {
                                view: flag("view"),
                                edit: flag("edit"),
                            },
                        );
                    }
                } else if let Some(allowed) = value.as_bool() {
                    perms.actions.insert(key.clone(), allowed);
                }
            }

            set.0.insert(module.clone(), perms);
        }

        set
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Whether `user` may perform `action` on `module`
pub fn has_permission(user: &User, module: &str, action: Action) -> bool {
    if !user.is_active() {
        return false;
    }
    if user.role == Role::SuperAdmin {
        return true;
    }
    match &user.permissions {
        Some(perms) => perms.allows(module, action),
        None => false,
    }
}

/// Whether `user` may perform `action` on a section of a horse record
pub fn has_section_permission(user: &User, section: &str, action: SectionAction) -> bool {
    if !user.is_active() {
        return false;
    }
    if user.role == Role::SuperAdmin {
        return true;
    }
    match &user.permissions {
        Some(perms) => perms.allows_section(section, action),
        None => false,
    }
}

/// Initial permission set stored for a new user of the given role
pub fn default_permissions(role: Role) -> PermissionSet {
    use modules::*;

    // (module, view, create, edit, delete)
    let matrix: [(&str, bool, bool, bool, bool); 9] = match role {
        Role::SuperAdmin => [
            (DASHBOARD, true, true, true, true),
            (HORSES, true, true, true, true),
            (CLIENTS, true, true, true, true),
            (EMPLOYEES, true, true, true, true),
            (EVENTS, true, true, true, true),
            (PAYMENTS, true, true, true, true),
            (USERS, true, true, true, true),
            (ALERTS, true, true, true, true),
            (REPORTS, true, true, true, true),
        ],
        Role::Admin => [
            (DASHBOARD, true, true, true, true),
            (HORSES, true, true, true, true),
            (CLIENTS, true, true, true, true),
            (EMPLOYEES, true, true, true, false),
            (EVENTS, true, true, true, true),
            (PAYMENTS, true, true, true, false),
            (USERS, true, false, false, false),
            (ALERTS, true, true, true, true),
            (REPORTS, true, true, true, false),
        ],
        Role::Employee => [
            (DASHBOARD, true, false, false, false),
            (HORSES, true, true, true, false),
            (CLIENTS, true, true, true, false),
            (EMPLOYEES, true, false, false, false),
            (EVENTS, true, true, true, false),
            (PAYMENTS, true, false, false, false),
            (USERS, false, false, false, false),
            (ALERTS, true, false, false, false),
            (REPORTS, true, false, false, false),
        ],
        Role::Client => [
            (DASHBOARD, true, false, false, false),
            (HORSES, true, false, false, false),
            (CLIENTS, false, false, false, false),
            (EMPLOYEES, false, false, false, false),
            (EVENTS, true, false, false, false),
            (PAYMENTS, true, false, false, false),
            (USERS, false, false, false, false),
            (ALERTS, true, false, false, false),
            (REPORTS, false, false, false, false),
        ],
    };

    let mut set = PermissionSet(
        matrix
            .into_iter()
            .map(|(module, view, create, edit, delete)| {
                (
                    module.to_string(),
                    ModulePermissions::with_actions(view, create, edit, delete),
                )
            })
            .collect(),
    );

    for section in sections::ALL {
        set.set_section(section, default_section(role, section));
    }

    set
}

fn default_section(role: Role, section: &str) -> SectionPermissions {
    match role {
        Role::SuperAdmin | Role::Admin => SectionPermissions {
            view: true,
            edit: true,
        },
        Role::Employee => SectionPermissions {
            view: true,
            edit: !matches!(section, sections::QR | sections::SANITARY_PLAN),
        },
        Role::Client => SectionPermissions {
            view: matches!(
                section,
                sections::INFO
                    | sections::PHOTOS
                    | sections::VACCINES
                    | sections::SANITARY_PLAN
                    | sections::QR
            ),
            edit: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LifecycleStatus;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn user(role: Role, status: LifecycleStatus, permissions: Option<PermissionSet>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "rider@haras.test".to_string(),
            password_hash: String::new(),
            role,
            status,
            permissions,
            last_access: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_inactive_users_are_denied_everything() {
        for role in Role::ALL {
            let u = user(
                *role,
                LifecycleStatus::Inactive,
                Some(default_permissions(Role::SuperAdmin)),
            );
            for module in modules::ALL {
                for action in Action::ALL {
                    assert!(!has_permission(&u, module, *action), "{role} {module} {action}");
                }
            }
            assert!(!has_section_permission(&u, sections::INFO, SectionAction::View));
        }
    }

    #[test]
    fn test_super_admin_bypasses_stored_permissions() {
        let u = user(Role::SuperAdmin, LifecycleStatus::Active, None);
        for module in modules::ALL {
            for action in Action::ALL {
                assert!(has_permission(&u, module, *action));
            }
        }
        assert!(has_permission(&u, "not_a_module", Action::Delete));
        assert!(has_section_permission(&u, sections::QR, SectionAction::Edit));
    }

    #[test]
    fn test_absent_permissions_deny() {
        let u = user(Role::Admin, LifecycleStatus::Active, None);
        assert!(!has_permission(&u, modules::HORSES, Action::View));
        assert!(!has_section_permission(&u, sections::INFO, SectionAction::View));
    }

    #[test]
    fn test_missing_keys_deny() {
        let perms: PermissionSet = serde_json::from_value(json!({"horses": {"view": true}})).unwrap();
        let u = user(Role::Employee, LifecycleStatus::Active, Some(perms));

        assert!(has_permission(&u, "horses", Action::View));
        assert!(!has_permission(&u, "horses", Action::Edit));
        assert!(!has_permission(&u, "clients", Action::View));
        assert!(!has_section_permission(&u, sections::INFO, SectionAction::View));
    }

    #[test]
    fn test_section_requires_module_view() {
        let perms = PermissionSet::from_json_lenient(&json!({
            "horses": {
                "view": false,
                "sections": {"vaccines": {"view": true, "edit": true}}
            }
        }));
        let u = user(Role::Employee, LifecycleStatus::Active, Some(perms.clone()));
        assert!(!has_section_permission(&u, sections::VACCINES, SectionAction::View));

        let mut perms = perms;
        perms.set(modules::HORSES, Action::View, true);
        let u = user(Role::Employee, LifecycleStatus::Active, Some(perms));
        assert!(has_section_permission(&u, sections::VACCINES, SectionAction::Edit));
        assert!(!has_section_permission(&u, sections::FEEDING, SectionAction::View));
    }

    #[test]
    fn test_lenient_decoding_drops_malformed_entries() {
        let perms = PermissionSet::from_json_lenient(&json!({
            "horses": {"view": true, "edit": "yes", "sections": ["info"]},
            "clients": "all",
            "payments": {"view": 1, "delete": false},
            "alerts": {"view": true, "sections": {"bogus": 3, "info": {"view": true}}}
        }));

        assert!(perms.allows("horses", Action::View));
        assert!(!perms.allows("horses", Action::Edit));
        assert!(perms.module("clients").is_none());
        assert!(!perms.allows("payments", Action::View));
        assert!(!perms.allows("payments", Action::Delete));
        assert!(perms.module("payments").is_some());

        let alerts = perms.module("alerts").unwrap();
        assert!(alerts.allows_section("info", SectionAction::View));
        assert!(!alerts.allows_section("bogus", SectionAction::View));
    }

    #[test]
    fn test_lenient_decoding_of_non_object() {
        assert_eq!(PermissionSet::from_json_lenient(&json!(null)), PermissionSet::default());
        assert_eq!(PermissionSet::from_json_lenient(&json!([1, 2])), PermissionSet::default());
    }

    #[test]
    fn test_strict_decoding_rejects_non_boolean_actions() {
        let result: Result<PermissionSet, _> =
            serde_json::from_value(json!({"horses": {"view": "yes"}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_sections() {
        let perms = default_permissions(Role::Client);
        let decoded = PermissionSet::from_json_lenient(&perms.to_json());
        assert_eq!(decoded, perms);
    }

    #[test]
    fn test_default_templates() {
        let admin = default_permissions(Role::Admin);
        assert!(admin.allows(modules::HORSES, Action::Delete));
        assert!(!admin.allows(modules::EMPLOYEES, Action::Delete));
        assert!(!admin.allows(modules::PAYMENTS, Action::Delete));
        assert!(admin.allows(modules::USERS, Action::View));
        assert!(!admin.allows(modules::USERS, Action::Create));

        let employee = default_permissions(Role::Employee);
        assert!(employee.allows(modules::HORSES, Action::Edit));
        assert!(!employee.allows(modules::HORSES, Action::Delete));
        assert!(!employee.allows(modules::USERS, Action::View));
        assert!(employee.allows_section(sections::VACCINES, SectionAction::Edit));
        assert!(!employee.allows_section(sections::SANITARY_PLAN, SectionAction::Edit));

        let client = default_permissions(Role::Client);
        assert!(!client.allows(modules::CLIENTS, Action::View));
        assert!(client.allows_section(sections::SANITARY_PLAN, SectionAction::View));
        assert!(!client.allows_section(sections::FEEDING, SectionAction::View));
        assert!(!client.allows_section(sections::INFO, SectionAction::Edit));

        for role in Role::ALL {
            let perms = default_permissions(*role);
            for module in modules::ALL {
                assert!(perms.module(module).is_some(), "{role} lacks {module}");
            }
        }
    }
}
