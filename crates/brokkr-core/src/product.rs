//! Fixed conventions of the Brokkr product
//!
//! Every path, file name, and default source the toolkit ships with lives
//! here so no other module hard-codes product layout.

/// Canonical repository the toolkit is cloned from
pub const DEFAULT_CLONE_SOURCE: &str = "https://github.com/brokkr-dev/brokkr.git";

/// Branch used when the caller does not pick one
pub const DEFAULT_BRANCH: &str = "main";

/// Library directory that marks a directory as a Brokkr clone
pub const LIB_DIR: &str = "brokkrlib";

/// Version marker file, relative to the clone root
pub const VERSION_FILE: &str = "brokkrlib/brokkr/version";

/// Sentinel returned when the version marker is absent
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Engine roots relative to the clone root, tried in order (new layout first)
pub const ENGINE_ROOTS: [&str; 2] = ["bin/engines", "bin"];

/// Loader assembly shipped with legacy engines
pub const LEGACY_ENGINE_ASSEMBLY: &str = "BrokkrLoader.dll";

/// Engine versions at or above this are compile-only, not script runtimes
pub const LEGACY_RUNTIME_CUTOFF: u32 = 300;

/// Structured per-clone manifest file at the clone root
pub const MANIFEST_FILE: &str = "Brokkrfile";

/// Redeploy sidecar file at the root of image-deployed clones
pub const DEPLOY_ARGS_FILE: &str = ".brokkrargs";

/// Configuration key holding the clone registry (section.key)
pub const CLONES_CONFIG_KEY: &str = "environment.clones";

/// Environment variable overriding the Brokkr home directory
pub const HOME_ENV_VAR: &str = "BROKKR_HOME";

/// Names a clone may never take: the CLI's own verbs, flags, and the
/// handful of nouns that show up as positional arguments.
pub const RESERVED_NAMES: [&str; 23] = [
    "clone", "clones", "version", "help", "list", "info", "add", "rename", "forget", "delete",
    "update", "engines", "image", "branch", "deploy", "dest", "url", "all", "latest", "base",
    "force", "origin", "commit",
];

/// Check whether a clone name collides with the reserved list
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Archive snapshot URL for a branch of the canonical repository
pub fn default_image_url(branch: &str) -> String {
    format!("https://github.com/brokkr-dev/brokkr/archive/{branch}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names_case_insensitive() {
        assert!(is_reserved_name("clone"));
        assert!(is_reserved_name("Clone"));
        assert!(is_reserved_name("LATEST"));
        assert!(!is_reserved_name("dev"));
    }

    #[test]
    fn test_default_image_url() {
        assert_eq!(
            default_image_url("main"),
            "https://github.com/brokkr-dev/brokkr/archive/main.zip"
        );
    }
}
