//! Directory policy - which staff identities may sign in, and as what
//!
//! The upstream single-sign-on layer asserts an email address. This
//! policy checks it against an optional domain allow-list and assigns a
//! role, honouring per-email overrides from configuration.

use std::collections::HashMap;

use domain::{EmailAddress, Role};
use tracing::{debug, warn};

use crate::error::ApplicationError;

/// Roles a directory user may ask for at sign-in; developer access is
/// only granted through an override
const SELF_SELECTABLE_ROLES: [Role; 2] = [Role::Therapist, Role::Manager];

/// Email → role exceptions, fixed for the process lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleOverrides(HashMap<String, Role>);

impl RoleOverrides {
    /// Parse a JSON object mapping email to role name
    ///
    /// Keys and values are lowercased. Entries whose role is not a staff
    /// role are dropped. Malformed JSON yields an empty map.
    pub fn from_json(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }

        let parsed: HashMap<String, serde_json::Value> = match serde_json::from_str(raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed role overrides");
                return Self::default();
            },
        };

        let overrides = parsed
            .into_iter()
            .filter_map(|(email, role)| {
                let role = role.as_str()?.parse::<Role>().ok()?;
                if role.is_staff() {
                    Some((email.trim().to_lowercase(), role))
                } else {
                    warn!(email = %email, role = %role, "Ignoring override to non-staff role");
                    None
                }
            })
            .collect();

        Self(overrides)
    }

    /// Build from already-typed pairs; non-staff roles are dropped
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Role)>) -> Self {
        Self(
            pairs
                .into_iter()
                .filter(|(_, role)| role.is_staff())
                .map(|(email, role)| (email.trim().to_lowercase(), role))
                .collect(),
        )
    }

    pub fn get(&self, email: &EmailAddress) -> Option<Role> {
        self.0.get(email.as_str()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Domain allow-list plus role assignment for directory identities
#[derive(Debug, Clone)]
pub struct DirectoryPolicy {
    allowed_domain: Option<String>,
    overrides: RoleOverrides,
    default_role: Role,
}

impl DirectoryPolicy {
    /// Create a policy
    ///
    /// `allowed_domain` is trimmed, lowercased and may carry a leading
    /// `@`; an empty value allows every domain.
    ///
    /// # Errors
    ///
    /// Fails with `Configuration` when `default_role` is not a staff role.
    pub fn new(
        allowed_domain: Option<&str>,
        overrides: RoleOverrides,
        default_role: Role,
    ) -> Result<Self, ApplicationError> {
        if !default_role.is_staff() {
            return Err(ApplicationError::Configuration(format!(
                "default directory role must be a staff role, got {default_role}"
            )));
        }

        let allowed_domain = allowed_domain
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty());

        Ok(Self {
            allowed_domain,
            overrides,
            default_role,
        })
    }

    /// Policy that admits every domain with no overrides
    pub fn open() -> Self {
        Self {
            allowed_domain: None,
            overrides: RoleOverrides::default(),
            default_role: Role::Therapist,
        }
    }

    pub fn allowed_domain(&self) -> Option<&str> {
        self.allowed_domain.as_deref()
    }

    pub const fn default_role(&self) -> Role {
        self.default_role
    }

    /// Whether the email's domain passes the allow-list
    pub fn allows(&self, email: &EmailAddress) -> bool {
        self.allowed_domain
            .as_deref()
            .is_none_or(|domain| email.domain() == domain)
    }

    /// Resolve the role of a directory identity
    ///
    /// An exact override wins. Otherwise a requested therapist or manager
    /// role is honoured, and anything else falls back to the default role.
    ///
    /// # Errors
    ///
    /// Returns `DomainRejected` for malformed emails and for domains
    /// outside the allow-list.
    pub fn resolve_employee(
        &self,
        email: &str,
        requested: Option<Role>,
    ) -> Result<(EmailAddress, Role), ApplicationError> {
        let email = EmailAddress::new(email)
            .map_err(|_| ApplicationError::DomainRejected("malformed email".to_string()))?;

        if !self.allows(&email) {
            debug!(domain = %email.domain(), "Directory domain rejected");
            return Err(ApplicationError::DomainRejected(email.domain().to_string()));
        }

        let role = self.overrides.get(&email).unwrap_or_else(|| {
            requested
                .filter(|r| SELF_SELECTABLE_ROLES.contains(r))
                .unwrap_or(self.default_role)
        });

        Ok((email, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hospital_policy(overrides: &str) -> DirectoryPolicy {
        DirectoryPolicy::new(
            Some("hospital.dk"),
            RoleOverrides::from_json(overrides),
            Role::Therapist,
        )
        .unwrap()
    }

    #[test]
    fn foreign_domain_is_rejected() {
        let policy = hospital_policy("");
        let err = policy.resolve_employee("x@other.dk", None).unwrap_err();
        assert!(matches!(err, ApplicationError::DomainRejected(ref d) if d == "other.dk"));
    }

    #[test]
    fn matching_domain_is_accepted() {
        let policy = hospital_policy("");
        let (email, role) = policy.resolve_employee("x@hospital.dk", None).unwrap();
        assert_eq!(email.as_str(), "x@hospital.dk");
        assert_eq!(role, Role::Therapist);
    }

    #[test]
    fn subdomain_is_not_the_same_domain() {
        let policy = hospital_policy("");
        assert!(policy.resolve_employee("x@evil-hospital.dk", None).is_err());
        assert!(policy.resolve_employee("x@sub.hospital.dk", None).is_err());
    }

    #[test]
    fn override_wins() {
        let policy = hospital_policy(r#"{"alice@hospital.dk": "manager"}"#);
        let (_, role) = policy.resolve_employee("alice@hospital.dk", None).unwrap();
        assert_eq!(role, Role::Manager);

        let (_, role) = policy.resolve_employee("bob@hospital.dk", None).unwrap();
        assert_eq!(role, Role::Therapist);
    }

    #[test]
    fn override_beats_requested_role() {
        let policy = hospital_policy(r#"{"alice@hospital.dk": "manager"}"#);
        let (_, role) = policy
            .resolve_employee("alice@hospital.dk", Some(Role::Therapist))
            .unwrap();
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn override_lookup_is_case_insensitive() {
        let policy = hospital_policy(r#"{"Alice@Hospital.DK": "MANAGER"}"#);
        let (_, role) = policy.resolve_employee("ALICE@hospital.dk", None).unwrap();
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn requested_developer_is_not_self_granted() {
        let policy = hospital_policy("");
        let (_, role) = policy
            .resolve_employee("bob@hospital.dk", Some(Role::Developer))
            .unwrap();
        assert_eq!(role, Role::Therapist);

        let (_, role) = policy
            .resolve_employee("bob@hospital.dk", Some(Role::Manager))
            .unwrap();
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn empty_domain_allows_all() {
        let policy = DirectoryPolicy::new(Some("  "), RoleOverrides::default(), Role::Therapist).unwrap();
        assert!(policy.allowed_domain().is_none());
        assert!(policy.resolve_employee("x@anywhere.org", None).is_ok());
    }

    #[test]
    fn domain_is_normalized() {
        let policy = DirectoryPolicy::new(Some(" @Hospital.DK "), RoleOverrides::default(), Role::Therapist)
            .unwrap();
        assert_eq!(policy.allowed_domain(), Some("hospital.dk"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let policy = DirectoryPolicy::open();
        assert!(matches!(
            policy.resolve_employee("not-an-email", None),
            Err(ApplicationError::DomainRejected(_))
        ));
    }

    #[test]
    fn non_staff_default_role_is_a_configuration_error() {
        let result = DirectoryPolicy::new(None, RoleOverrides::default(), Role::Patient);
        assert!(matches!(result, Err(ApplicationError::Configuration(_))));
    }

    #[test]
    fn malformed_overrides_yield_empty_map() {
        assert!(RoleOverrides::from_json("{not json").is_empty());
        assert!(RoleOverrides::from_json("[1, 2]").is_empty());
        assert!(RoleOverrides::from_json("").is_empty());
    }

    #[test]
    fn non_staff_overrides_are_dropped() {
        let overrides = RoleOverrides::from_json(
            r#"{"a@h.dk": "patient", "b@h.dk": "developer", "c@h.dk": "wizard", "d@h.dk": 3}"#,
        );
        assert_eq!(overrides.len(), 1);
        let b = EmailAddress::new("b@h.dk").unwrap();
        assert_eq!(overrides.get(&b), Some(Role::Developer));
    }

    #[test]
    fn from_pairs_filters_and_lowercases() {
        let overrides = RoleOverrides::from_pairs([
            ("Boss@H.dk".to_string(), Role::Manager),
            ("p@h.dk".to_string(), Role::Patient),
        ]);
        assert_eq!(overrides.len(), 1);
        assert_eq!(
            overrides.get(&EmailAddress::new("boss@h.dk").unwrap()),
            Some(Role::Manager)
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn other_domains_always_rejected(local in "[a-z]{1,10}", domain in "[a-z]{1,10}\\.(com|org|se)") {
            let policy = DirectoryPolicy::new(Some("hospital.dk"), RoleOverrides::default(), Role::Therapist).unwrap();
            let result = policy.resolve_employee(&format!("{local}@{domain}"), None);
            let rejected = matches!(result, Err(ApplicationError::DomainRejected(_)));
            prop_assert!(rejected);
        }

        #[test]
        fn resolved_role_is_always_staff(local in "[a-z]{1,10}", requested in proptest::option::of(0usize..4)) {
            let policy = DirectoryPolicy::open();
            let requested = requested.map(|i| Role::ALL[i]);
            let (_, role) = policy.resolve_employee(&format!("{local}@hospital.dk"), requested).unwrap();
            prop_assert!(role.is_staff());
        }
    }
}
