//! The native libraries Korova links against.

use crate::util::config::BootstrapConfig;

/// Release of OpenCV built when no packaged version is recent enough.
pub const DEFAULT_OPENCV_TAG: &str = "4.10.0";

/// Qt SDK release the project's kits are set up for.
pub const QT_SDK_VERSION: &str = "6.9.0";

/// How to build a dependency from its source repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecipe {
    /// Git URL of the upstream repository.
    pub repository: String,
    /// Release tag to check out.
    pub tag: String,
    /// Extra CMake configure arguments.
    pub cmake_args: Vec<String>,
}

/// A library the application needs at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    /// Minimum acceptable version (dotted numeric).
    pub minimum: String,
    /// Debian/Ubuntu package name.
    pub apt_package: Option<String>,
    /// pkg-config module used to query the installed version.
    pub pkg_config_module: Option<String>,
    /// Homebrew formula.
    pub brew_formula: Option<String>,
    /// Chocolatey package.
    pub choco_package: Option<String>,
    /// Command printing the installed version, for platforms whose package
    /// manager does not carry the dependency.
    pub version_query: Option<Vec<String>>,
    /// Source build used when the packaged version is missing or too old.
    pub source: Option<SourceRecipe>,
    /// Library stems whose static archives indicate a static install.
    pub static_libraries: Vec<String>,
}

impl Dependency {
    /// Qt 6 widgets toolkit.
    pub fn qt() -> Self {
        Dependency {
            name: "qt".to_string(),
            minimum: "6.5.0".to_string(),
            apt_package: Some("qt6-base-dev".to_string()),
            pkg_config_module: Some("Qt6Core".to_string()),
            brew_formula: Some("qt".to_string()),
            // Qt is not packaged on Chocolatey; the online installer is the supported route.
            choco_package: None,
            version_query: Some(vec![
                "qmake".to_string(),
                "-query".to_string(),
                "QT_VERSION".to_string(),
            ]),
            source: None,
            static_libraries: vec!["Qt6Core".to_string(), "Qt6Widgets".to_string()],
        }
    }

    /// OpenCV, built statically from `tag` when needed.
    pub fn opencv(tag: &str) -> Self {
        Dependency {
            name: "opencv".to_string(),
            minimum: "4.5.0".to_string(),
            apt_package: Some("libopencv-dev".to_string()),
            pkg_config_module: Some("opencv4".to_string()),
            brew_formula: Some("opencv".to_string()),
            choco_package: Some("opencv".to_string()),
            version_query: None,
            source: Some(SourceRecipe {
                repository: "https://github.com/opencv/opencv.git".to_string(),
                tag: tag.to_string(),
                cmake_args: [
                    "-DBUILD_LIST=core,imgproc,imgcodecs,highgui,videoio",
                    "-DBUILD_TESTS=OFF",
                    "-DBUILD_PERF_TESTS=OFF",
                    "-DBUILD_EXAMPLES=OFF",
                    "-DBUILD_opencv_apps=OFF",
                    "-DOPENCV_GENERATE_PKGCONFIG=ON",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }),
            static_libraries: vec!["opencv_core".to_string(), "opencv_imgproc".to_string()],
        }
    }
}

/// Dependencies in the order they are bootstrapped.
pub fn required_dependencies(config: &BootstrapConfig) -> Vec<Dependency> {
    vec![Dependency::qt(), Dependency::opencv(config.opencv_tag())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_dependencies_order() {
        let deps = required_dependencies(&BootstrapConfig::default());
        let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["qt", "opencv"]);
    }

    #[test]
    fn test_opencv_tag_from_config() {
        let config = BootstrapConfig {
            opencv_tag: Some("4.9.0".to_string()),
            ..Default::default()
        };
        let deps = required_dependencies(&config);
        let recipe = deps[1].source.as_ref().unwrap();
        assert_eq!(recipe.tag, "4.9.0");
        assert!(deps[0].source.is_none());
    }
}
