//! The declared third-party dependencies.
//!
//! Each recipe is a plain descriptor value; the registry is assembled once
//! per run from [`default_registry`].

pub mod cmake;
pub mod header;

use crate::core::dependency::DependencyDescriptor;
use crate::core::registry::DependencyRegistry;
use crate::deps::DependencyError;
use crate::sources::{GitHubRepo, SourceSpec};

pub use cmake::CMakeDependency;
pub use header::HeaderOnlyDependency;

pub const GLFW_VERSION: &str = "3.3.2";
pub const GLAD_VERSION: &str = "0.1.33";
pub const STB_IMAGE_VERSION: &str = "2.25";
pub const GOOGLETEST_VERSION: &str = "1.10.0";

/// Commit of `nothings/stb` that ships stb_image 2.25.
const STB_COMMIT: &str = "0224a44a10564a214595797b4c88323f79a5f934";

/// Options that change which dependencies are declared or how.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// OpenGL API version glad generates a loader for.
    pub opengl_version: String,
    /// Declare the test framework.
    pub build_tests: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        RegistryOptions {
            opengl_version: "4.6".to_string(),
            build_tests: false,
        }
    }
}

/// Assemble the registry of every dependency the project needs.
pub fn default_registry(options: &RegistryOptions) -> Result<DependencyRegistry, DependencyError> {
    let mut descriptors: Vec<Box<dyn DependencyDescriptor>> = vec![
        Box::new(
            CMakeDependency::new(
                "glfw",
                "GLFW",
                GLFW_VERSION,
                SourceSpec::git_tag(GitHubRepo::new("glfw", "glfw"), GLFW_VERSION),
            )
            .define("GLFW_BUILD_DOCS", "OFF")
            .define("GLFW_BUILD_TESTS", "OFF")
            .define("GLFW_BUILD_EXAMPLES", "OFF"),
        ),
        Box::new(
            CMakeDependency::new(
                "glad",
                "Glad",
                GLAD_VERSION,
                SourceSpec::git_tag(
                    GitHubRepo::new("Dav1dde", "glad"),
                    format!("v{}", GLAD_VERSION),
                ),
            )
            .define("GLAD_API", format!("gl={}", options.opengl_version))
            .define("GLAD_PROFILE", "core")
            .define("GLAD_INSTALL", "ON")
            .version_data("opengl_version", &options.opengl_version),
        ),
        Box::new(
            HeaderOnlyDependency::new(
                "stb_image",
                "stb_image",
                STB_IMAGE_VERSION,
                SourceSpec::git_rev(GitHubRepo::new("nothings", "stb"), STB_COMMIT),
            )
            .header("stb_image.h"),
        ),
    ];

    if options.build_tests {
        descriptors.push(Box::new(
            CMakeDependency::new(
                "googletest",
                "Google Test",
                GOOGLETEST_VERSION,
                SourceSpec::git_tag(
                    GitHubRepo::new("google", "googletest"),
                    format!("release-{}", GOOGLETEST_VERSION),
                ),
            )
            .define("INSTALL_GTEST", "ON")
            .define("BUILD_GMOCK", "ON"),
        ));
    }

    DependencyRegistry::new(descriptors)
}
