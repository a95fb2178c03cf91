//! Property-Based Tests for caddy-storage
//!
//! These tests verify:
//! - Configured roots survive conversion into an engine
//! - Home directory resolution order
//! - Data directory resolution and the XDG override
//! - Key validation never lets a key escape the storage root

use proptest::prelude::*;

use caddy_storage::engine::validate_key;
use caddy_storage::environment::{HOME, HOMEDRIVE, HOMEPATH, USERPROFILE, XDG_DATA_HOME};
use caddy_storage::{data_dir, home_dir, EnvSnapshot, FileSystemStorage, Platform, StorageConverter};

/// Strategy for generating any platform
fn platform_strategy() -> impl Strategy<Value = Platform> {
    prop_oneof![
        Just(Platform::Linux),
        Just(Platform::MacOs),
        Just(Platform::Windows),
        Just(Platform::Unix),
    ]
}

/// Strategy for generating Unix-like platforms
fn unix_platform_strategy() -> impl Strategy<Value = Platform> {
    prop_oneof![
        Just(Platform::Linux),
        Just(Platform::MacOs),
        Just(Platform::Unix),
    ]
}

/// Strategy for clean absolute Unix paths
fn unix_path_strategy() -> impl Strategy<Value = String> {
    "(/[a-z0-9_]{1,8}){1,4}"
}

/// Arbitrary, possibly empty, environment values
fn env_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9:/\\\\._ -]{0,16}"
}

// =============================================================================
// Conversion Property Tests
// =============================================================================

proptest! {
    /// The handle built from any non-empty root is rooted exactly there
    #[test]
    fn file_system_root_roundtrip(root in ".{1,40}") {
        let config = FileSystemStorage::new(root.clone());
        let engine = config.to_storage_engine().unwrap();
        prop_assert_eq!(engine.describe(), format!("FileStorage:{root}"));
    }
}

// =============================================================================
// Home Directory Property Tests
// =============================================================================

proptest! {
    /// HOME wins regardless of platform and the other variables
    #[test]
    fn home_variable_always_wins(
        platform in platform_strategy(),
        home in "[A-Za-z0-9/\\\\:._-]{1,24}",
        drive in env_value_strategy(),
        path in env_value_strategy(),
        profile in env_value_strategy(),
    ) {
        let env = EnvSnapshot::new(platform)
            .with_var(HOME, home.clone())
            .with_var(HOMEDRIVE, drive)
            .with_var(HOMEPATH, path)
            .with_var(USERPROFILE, profile);
        prop_assert_eq!(home_dir(&env), home);
    }

    /// Off Windows, the Windows-only variables are never consulted
    #[test]
    fn windows_variables_ignored_elsewhere(
        platform in unix_platform_strategy(),
        drive in env_value_strategy(),
        path in env_value_strategy(),
        profile in env_value_strategy(),
    ) {
        let env = EnvSnapshot::new(platform)
            .with_var(HOMEDRIVE, drive)
            .with_var(HOMEPATH, path)
            .with_var(USERPROFILE, profile);
        prop_assert_eq!(home_dir(&env), ".");
    }

    /// The home directory is never empty
    #[test]
    fn home_is_never_empty(
        platform in platform_strategy(),
        home in env_value_strategy(),
        drive in env_value_strategy(),
        path in env_value_strategy(),
        profile in env_value_strategy(),
    ) {
        let env = EnvSnapshot::new(platform)
            .with_var(HOME, home)
            .with_var(HOMEDRIVE, drive)
            .with_var(HOMEPATH, path)
            .with_var(USERPROFILE, profile);
        prop_assert!(!home_dir(&env).is_empty());
    }
}

// =============================================================================
// Data Directory Property Tests
// =============================================================================

proptest! {
    /// XDG_DATA_HOME replaces the home-based default entirely
    #[test]
    fn xdg_data_home_overrides_home(
        platform in unix_platform_strategy(),
        xdg in unix_path_strategy(),
        home in unix_path_strategy(),
    ) {
        let env = EnvSnapshot::new(platform)
            .with_var(HOME, home)
            .with_var(XDG_DATA_HOME, xdg.clone());
        prop_assert_eq!(data_dir(&env), format!("{xdg}/caddy"));
    }

    /// Without XDG_DATA_HOME data lives under ~/.local/share
    #[test]
    fn data_dir_under_home(platform in unix_platform_strategy(), home in unix_path_strategy()) {
        let env = EnvSnapshot::new(platform).with_var(HOME, home.clone());
        prop_assert_eq!(data_dir(&env), format!("{home}/.local/share/caddy"));
    }

    /// The data directory always ends in the application directory
    #[test]
    fn data_dir_ends_with_app_dir(
        platform in platform_strategy(),
        home in env_value_strategy(),
        xdg in env_value_strategy(),
    ) {
        let env = EnvSnapshot::new(platform)
            .with_var(HOME, home)
            .with_var(XDG_DATA_HOME, xdg);
        prop_assert!(data_dir(&env).ends_with("caddy"));
    }
}

// =============================================================================
// Key Validation Property Tests
// =============================================================================

proptest! {
    /// A key containing a parent segment is always rejected
    #[test]
    fn parent_segments_rejected(
        before in "([a-z]{1,6}/){0,3}",
        after in "(/[a-z]{1,6}){0,3}",
    ) {
        let key = format!("{before}..{after}");
        prop_assert!(validate_key(&key).is_err());
    }

    /// Plain relative keys are always accepted
    #[test]
    fn relative_keys_accepted(key in "[a-z0-9_.@-]{0,6}[a-z0-9]([/][a-z0-9_-]{1,8}){0,4}") {
        prop_assert!(validate_key(&key).is_ok());
    }
}
