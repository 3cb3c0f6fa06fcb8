use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Operating system family of a [`Platform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Macos,
    Ios,
    Tvos,
    Watchos,
    Visionos,
}

impl Os {
    /// Name used inside target triples.
    pub fn triple_name(self) -> &'static str {
        match self {
            Os::Macos => "macos",
            Os::Ios => "ios",
            Os::Tvos => "tvos",
            Os::Watchos => "watchos",
            Os::Visionos => "xros",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Os::Macos => "macOS",
            Os::Ios => "iOS",
            Os::Tvos => "tvOS",
            Os::Watchos => "watchOS",
            Os::Visionos => "visionOS",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Device,
    Simulator,
}

/// One build platform: OS family, architecture, deployment version, and
/// device/simulator variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Platform {
    pub os: Os,
    pub arch: SmolStr,
    pub minimum_os_version: SmolStr,
    #[serde(default)]
    pub environment: Environment,
}

impl Platform {
    pub fn new(
        os: Os,
        arch: impl AsRef<str>,
        minimum_os_version: impl AsRef<str>,
        environment: Environment,
    ) -> Self {
        Self {
            os,
            arch: SmolStr::new(arch),
            minimum_os_version: SmolStr::new(minimum_os_version),
            environment,
        }
    }

    /// Triple used to namespace per-architecture Swift module files, e.g.
    /// `arm64-apple-ios` or `x86_64-apple-ios-simulator`.
    pub fn swift_triple(&self) -> String {
        let suffix = match self.environment {
            Environment::Device => "",
            Environment::Simulator => "-simulator",
        };
        format!("{}-apple-{}{}", self.arch, self.os.triple_name(), suffix)
    }

    pub fn is_simulator(&self) -> bool {
        self.environment == Environment::Simulator
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.os.display_name(),
            self.minimum_os_version,
            self.arch
        )?;
        if self.is_simulator() {
            f.write_str(" simulator")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swift_triples() {
        let device = Platform::new(Os::Ios, "arm64", "15.0", Environment::Device);
        let sim = Platform::new(Os::Ios, "x86_64", "15.0", Environment::Simulator);
        let mac = Platform::new(Os::Macos, "arm64", "12.0", Environment::Device);

        assert_eq!(device.swift_triple(), "arm64-apple-ios");
        assert_eq!(sim.swift_triple(), "x86_64-apple-ios-simulator");
        assert_eq!(mac.swift_triple(), "arm64-apple-macos");
    }

    #[test]
    fn environment_defaults_to_device() {
        let platform: Platform = serde_json::from_str(
            r#"{"os": "tvos", "arch": "arm64", "minimum_os_version": "16.0"}"#,
        )
        .unwrap();
        assert_eq!(platform.environment, Environment::Device);
        assert_eq!(platform.to_string(), "tvOS 16.0 (arm64)");
    }
}
