use serde::{Deserialize, Serialize};

/// Kind of product a build-graph target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Application,
    AppClip,
    AppExtension,
    ExtensionKitExtension,
    WatchApp,
    WatchExtension,
    CommandLineTool,
    UnitTestBundle,
    UiTestBundle,
    StaticLibrary,
    DynamicLibrary,
    Framework,
    StaticFramework,
    /// Resource bundle.
    Bundle,
    /// Grouping of other targets with nothing to run.
    Aggregate,
}

impl ProductType {
    pub fn is_testable(self) -> bool {
        matches!(self, ProductType::UnitTestBundle | ProductType::UiTestBundle)
    }

    pub fn is_launchable(self) -> bool {
        matches!(
            self,
            ProductType::Application
                | ProductType::AppClip
                | ProductType::AppExtension
                | ProductType::ExtensionKitExtension
                | ProductType::WatchApp
                | ProductType::WatchExtension
                | ProductType::CommandLineTool
        )
    }

    /// Whether a target of this kind is worth a scheme of its own.
    pub fn should_create_scheme(self) -> bool {
        !matches!(self, ProductType::Bundle | ProductType::Aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(ProductType::UnitTestBundle.is_testable());
        assert!(!ProductType::UnitTestBundle.is_launchable());
        assert!(ProductType::Application.is_launchable());
        assert!(ProductType::AppExtension.is_launchable());
        assert!(!ProductType::StaticLibrary.is_launchable());
        assert!(ProductType::StaticLibrary.should_create_scheme());
        assert!(!ProductType::Bundle.should_create_scheme());
        assert!(!ProductType::Aggregate.should_create_scheme());
    }
}
