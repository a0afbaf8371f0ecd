use serde::{Deserialize, Serialize};

/// Compile-time build details, reported on startup and by the status API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    pub build_profile: String,
    pub build_features: String,
    pub build_timestamp: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} build, features: {}, built {})",
            self.version, self.build_profile, self.build_features, self.build_timestamp
        )
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("REPO_VERSION").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
        build_features: env!("BUILD_FEATURES").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
    }
}
