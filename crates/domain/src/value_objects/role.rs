//! Roles and the fixed permission table

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Capability that gates a screen or an API operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Practice conversations
    UseProgram,
    /// See patients linked to oneself
    ViewAssignedPatients,
    /// Author roleplay scenarios
    CreateRoleplay,
    /// See activity counts and progress
    ViewProgress,
    /// See every therapist
    ViewAllTherapists,
    /// See every user record
    ViewUserData,
    /// See collected activity data
    ViewCollectedData,
}

impl Permission {
    pub const ALL: [Self; 7] = [
        Self::UseProgram,
        Self::ViewAssignedPatients,
        Self::CreateRoleplay,
        Self::ViewProgress,
        Self::ViewAllTherapists,
        Self::ViewUserData,
        Self::ViewCollectedData,
    ];

    /// Stable identifier
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UseProgram => "use_program",
            Self::ViewAssignedPatients => "view_assigned_patients",
            Self::CreateRoleplay => "create_roleplay",
            Self::ViewProgress => "view_progress",
            Self::ViewAllTherapists => "view_all_therapists",
            Self::ViewUserData => "view_user_data",
            Self::ViewCollectedData => "view_collected_data",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PATIENT_PERMISSIONS: &[Permission] = &[Permission::UseProgram];

const THERAPIST_PERMISSIONS: &[Permission] = &[
    Permission::UseProgram,
    Permission::ViewAssignedPatients,
    Permission::CreateRoleplay,
    Permission::ViewProgress,
];

const MANAGER_PERMISSIONS: &[Permission] = &[
    Permission::ViewAllTherapists,
    Permission::ViewUserData,
    Permission::ViewCollectedData,
    Permission::ViewProgress,
];

/// The single role a user holds
///
/// Local accounts may only be patients or developers. Directory (staff)
/// accounts may be therapists, managers or developers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Therapist,
    Manager,
    Developer,
}

impl Role {
    /// Every role
    pub const ALL: [Self; 4] = [
        Self::Patient,
        Self::Therapist,
        Self::Manager,
        Self::Developer,
    ];

    /// Stable identifier used for storage and configuration
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Therapist => "therapist",
            Self::Manager => "manager",
            Self::Developer => "developer",
        }
    }

    /// Danish label shown in the UI
    pub const fn label(self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Therapist => "Terapeut",
            Self::Manager => "Leder",
            Self::Developer => "Udvikler",
        }
    }

    /// Whether accounts with this role may be created with a local password
    pub const fn is_local(self) -> bool {
        matches!(self, Self::Patient | Self::Developer)
    }

    /// Whether this role may be assigned to a directory (staff) identity
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Therapist | Self::Manager | Self::Developer)
    }

    /// Explicit permissions; developers hold the wildcard and list none
    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Self::Patient => PATIENT_PERMISSIONS,
            Self::Therapist => THERAPIST_PERMISSIONS,
            Self::Manager => MANAGER_PERMISSIONS,
            Self::Developer => &[],
        }
    }

    /// Check a permission against the fixed table
    pub fn has_permission(self, permission: Permission) -> bool {
        matches!(self, Self::Developer) || self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patient" => Ok(Self::Patient),
            "therapist" => Ok(Self::Therapist),
            "manager" => Ok(Self::Manager),
            "developer" => Ok(Self::Developer),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}
