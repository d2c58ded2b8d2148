use catalog::CameraStatus;
use serde::{Deserialize, Serialize};

/// Default bound on the active working set.
pub const DEFAULT_MAX_ACTIVE: usize = 8;

/// Which camera statuses qualify for admission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Only cameras the status source reports healthy.
    AvailableOnly,
    /// Healthy cameras plus switched-on cameras the status source has not seen.
    AvailableOrPotential,
    /// Anything not reported as failing, including unknown cameras.
    #[default]
    AnyReachable,
}

impl AdmissionPolicy {
    pub fn admits(self, status: CameraStatus) -> bool {
        match self {
            AdmissionPolicy::AvailableOnly => status == CameraStatus::Available,
            AdmissionPolicy::AvailableOrPotential => {
                matches!(status, CameraStatus::Available | CameraStatus::Potential)
            }
            AdmissionPolicy::AnyReachable => status != CameraStatus::Unavailable,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Maximum number of active cameras (K).
    pub max_active: usize,
    pub policy: AdmissionPolicy,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_active: DEFAULT_MAX_ACTIVE,
            policy: AdmissionPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AdmissionPolicy;
    use catalog::CameraStatus;

    const ALL: [CameraStatus; 4] = [
        CameraStatus::Available,
        CameraStatus::Potential,
        CameraStatus::Unavailable,
        CameraStatus::Unknown,
    ];

    fn admitted(policy: AdmissionPolicy) -> Vec<CameraStatus> {
        ALL.into_iter().filter(|s| policy.admits(*s)).collect()
    }

    #[test]
    fn policies_nest_from_strict_to_loose() {
        assert_eq!(
            admitted(AdmissionPolicy::AvailableOnly),
            vec![CameraStatus::Available]
        );
        assert_eq!(
            admitted(AdmissionPolicy::AvailableOrPotential),
            vec![CameraStatus::Available, CameraStatus::Potential]
        );
        assert_eq!(
            admitted(AdmissionPolicy::AnyReachable),
            vec![
                CameraStatus::Available,
                CameraStatus::Potential,
                CameraStatus::Unknown
            ]
        );
    }

    #[test]
    fn policy_names_are_snake_case() {
        let json = serde_json::to_string(&AdmissionPolicy::AvailableOrPotential).expect("json");
        assert_eq!(json, "\"available_or_potential\"");
    }
}
