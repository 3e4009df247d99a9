//! Property-based tests for domain invariants
//!
//! These tests use proptest to verify invariants across many random inputs.

use domain::{
    AuthMethod, EmailAddress, Permission, Role, Session, User, UserCredential, Username,
    check_password_policy,
};
use proptest::prelude::*;

fn any_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Patient),
        Just(Role::Therapist),
        Just(Role::Manager),
        Just(Role::Developer),
    ]
}

fn any_permission() -> impl Strategy<Value = Permission> {
    prop_oneof![
        Just(Permission::UseProgram),
        Just(Permission::ViewAssignedPatients),
        Just(Permission::CreateRoleplay),
        Just(Permission::ViewProgress),
        Just(Permission::ViewAllTherapists),
        Just(Permission::ViewUserData),
        Just(Permission::ViewCollectedData),
    ]
}

// ============================================================================
// Role Property Tests
// ============================================================================

mod role_tests {
    use super::*;

    proptest! {
        #[test]
        fn role_parse_ignores_case_and_padding(role in any_role(), upper in any::<bool>()) {
            let raw = if upper { role.as_str().to_uppercase() } else { role.as_str().to_string() };
            let parsed: Role = format!("  {raw} ").parse().unwrap();
            prop_assert_eq!(parsed, role);
        }

        #[test]
        fn every_role_is_local_or_staff(role in any_role()) {
            prop_assert!(role.is_local() || role.is_staff());
        }

        #[test]
        fn developer_is_wildcard(permission in any_permission()) {
            prop_assert!(Role::Developer.has_permission(permission));
        }

        #[test]
        fn listed_permissions_are_held(role in any_role()) {
            for permission in role.permissions() {
                prop_assert!(role.has_permission(*permission));
            }
        }
    }
}

// ============================================================================
// User / Session Property Tests
// ============================================================================

mod account_tests {
    use super::*;

    proptest! {
        #[test]
        fn local_users_always_carry_a_hash(
            name in "[a-z][a-z0-9]{0,15}",
            hash in "[a-zA-Z0-9$=+/]{10,40}",
        ) {
            let user = User::new_local(
                Username::new(&name).unwrap(),
                hash.clone(),
                Role::Developer,
                None,
                None,
            ).unwrap();
            prop_assert_eq!(user.auth_method(), AuthMethod::Local);
            prop_assert_eq!(user.password_hash(), Some(hash.as_str()));
        }

        #[test]
        fn directory_users_never_carry_a_hash(
            local in "[a-z]{1,8}(\\.[a-z]{1,8})?",
            role in prop_oneof![Just(Role::Therapist), Just(Role::Manager), Just(Role::Developer)],
        ) {
            let email = EmailAddress::new(format!("{local}@hospital.dk")).unwrap();
            let user = User::new_directory(&email, role).unwrap();
            prop_assert_eq!(user.credential(), &UserCredential::Directory);
            prop_assert!(user.password_hash().is_none());
        }

        #[test]
        fn session_role_equals_user_role(role in prop_oneof![Just(Role::Patient), Just(Role::Developer)]) {
            let therapist = (role == Role::Patient).then(|| Username::new("t@hospital.dk").unwrap());
            let user = User::new_local(Username::new("someone").unwrap(), "hash", role, None, therapist).unwrap();
            let session = Session::for_user(&user);
            prop_assert_eq!(session.role(), role);
            if role == Role::Patient {
                prop_assert_ne!(session.role(), Role::Developer);
            }
        }

        #[test]
        fn short_passwords_are_rejected(password in ".{0,7}") {
            prop_assert!(check_password_policy(&password).is_err());
        }

        #[test]
        fn long_passwords_are_accepted(password in ".{8,64}") {
            prop_assert!(check_password_policy(&password).is_ok());
        }
    }
}
