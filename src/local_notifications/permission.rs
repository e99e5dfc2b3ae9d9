use serde::{Deserialize, Serialize};

/// Notification permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

impl PermissionState {
    /// State after the platform reported `reported`.
    ///
    /// `Granted` is sticky for the session. Otherwise the platform verdict
    /// wins, and a request that leaves the state undetermined counts as a
    /// refusal.
    pub fn after_report(self, reported: PermissionState) -> PermissionState {
        match (self, reported) {
            (PermissionState::Granted, _) => PermissionState::Granted,
            (_, reported) => reported,
        }
    }

    /// State after an explicit permission request answered with `reported`.
    pub fn after_request(self, reported: PermissionState) -> PermissionState {
        match self.after_report(reported) {
            PermissionState::Undetermined => PermissionState::Denied,
            state => state,
        }
    }

    /// Whether scheduling has to go through a platform request first.
    pub fn needs_request(self) -> bool {
        self != PermissionState::Granted
    }

    /// Proof of a granted permission, required to reach the platform
    /// scheduling call.
    pub fn grant(self) -> Option<PermissionGrant> {
        match self {
            PermissionState::Granted => Some(PermissionGrant { _private: () }),
            _ => None,
        }
    }
}

/// Only obtainable from [`PermissionState::Granted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGrant {
    _private: (),
}
