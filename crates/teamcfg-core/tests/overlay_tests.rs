//! Tests for the pending overlay

use serde_json::json;
use teamcfg_core::PendingOverlay;
use teamcfg_model::{ConfigPath, ProfileKey};

fn key(s: &str) -> ProfileKey {
    ProfileKey::parse(s).unwrap()
}

fn prop(profile: &str, name: &str) -> ConfigPath {
    ConfigPath::for_property(&key(profile), name)
}

fn profile(profile: &str) -> ConfigPath {
    ConfigPath::for_profile(&key(profile))
}

mod set_and_delete_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_tombstone_covers_nested_paths() {
        let mut overlay = PendingOverlay::new();
        overlay.delete_value(profile("a"), false);

        assert!(overlay.is_deleted(&prop("a", "host")));
        assert!(overlay.is_deleted(&profile("a.b")));
        assert!(overlay.is_deleted(&prop("a.b.c", "port")));
        assert!(!overlay.is_deleted(&profile("ab")));
        assert!(!overlay.is_deleted(&prop("b", "a")));
    }

    #[test]
    fn test_set_inside_deleted_profile_keeps_tombstone() {
        let mut overlay = PendingOverlay::new();
        overlay.delete_value(profile("a"), false);
        overlay.set_value(prop("a", "host"), json!("h"), key("a"), None);

        assert!(overlay.is_deleted(&prop("a", "host")));
        assert_eq!(overlay.deletions().count(), 1);
    }

    #[test]
    fn test_placeholder_does_not_overwrite_content() {
        let mut overlay = PendingOverlay::new();
        overlay.add_placeholder(&key("group"));
        overlay.add_placeholder(&key("group"));

        let change = overlay.change(&profile("group")).unwrap();
        assert!(change.is_placeholder());
        assert_eq!(overlay.changes().count(), 1);
    }
}

mod secure_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_secure_array_adds_and_suppresses() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("a", "token"), json!("t"), key("a"), Some(true));
        overlay.set_value(prop("a", "user"), json!("u"), key("a"), Some(false));
        overlay.set_value(prop("a", "host"), json!("h"), key("a"), None);

        let base = vec!["user".to_string(), "password".to_string()];
        assert_eq!(
            overlay.secure_array(&base, &[profile("a")]),
            vec!["password", "token"]
        );
        assert!(overlay.has_pending_secure_changes(&key("a")));
    }

    #[test]
    fn test_deleted_secure_property_is_hidden() {
        let mut overlay = PendingOverlay::new();
        let password = prop("a", "password");
        let base = vec!["password".to_string()];

        overlay.delete_value(password.clone(), true);
        assert!(overlay.is_hidden_secure(&password));
        assert!(overlay.secure_array(&base, &[profile("a")]).is_empty());

        overlay.set_value(password.clone(), json!("new"), key("a"), Some(true));
        assert!(!overlay.is_hidden_secure(&password));
        assert_eq!(overlay.secure_array(&base, &[profile("a")]), vec!["password"]);
    }

    #[test]
    fn test_child_secure_edits_stay_with_child() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("a.b", "token"), json!("t"), key("a.b"), Some(true));

        assert!(overlay.secure_array(&[], &[profile("a")]).is_empty());
        assert_eq!(overlay.secure_array(&[], &[profile("a.b")]), vec!["token"]);
    }

    #[test]
    fn test_secure_array_checks_every_profile_path() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("old", "token"), json!("t"), key("old"), Some(true));

        let names = overlay.secure_array(&[], &[profile("new"), profile("old")]);
        assert_eq!(names, vec!["token"]);
    }
}

mod rebase_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rebase_moves_everything_below_profile() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("a.b", "host"), json!("h"), key("a.b"), None);
        overlay.delete_value(prop("a", "port"), true);
        overlay.set_default("zosmf", "a.b");
        overlay.set_default("ssh", "other");

        overlay.rebase_profile(&key("a"), &key("z"));

        assert!(overlay.has_change(&prop("z.b", "host")));
        assert_eq!(overlay.change(&prop("z.b", "host")).unwrap().profile, key("z.b"));
        assert!(overlay.is_deleted(&prop("z", "port")));
        assert!(overlay.is_hidden_secure(&prop("z", "port")));
        assert_eq!(overlay.pending_default("zosmf").unwrap().value, "z.b");
        assert_eq!(overlay.pending_default("ssh").unwrap().value, "other");
        assert_eq!(
            overlay.extract_pending_profiles().into_iter().collect::<Vec<_>>(),
            vec![key("z.b")]
        );
    }

    #[test]
    fn test_purge_drops_descendants_but_keeps_own_tombstone() {
        let mut overlay = PendingOverlay::new();
        overlay.set_value(prop("a", "host"), json!("h"), key("a"), None);
        overlay.set_value(prop("a.b", "port"), json!(1), key("a.b"), None);
        overlay.set_value(prop("c", "port"), json!(2), key("c"), None);
        overlay.delete_value(profile("a"), false);
        overlay.delete_value(prop("a.b", "user"), false);

        overlay.purge_profile(&key("a"));

        let remaining: Vec<String> = overlay.changes().map(|(p, _)| p.to_string()).collect();
        assert_eq!(remaining, vec!["profiles.c.properties.port"]);
        assert_eq!(overlay.deletions().cloned().collect::<Vec<_>>(), vec![profile("a")]);
    }

    #[test]
    fn test_clear_default_falls_back() {
        let mut overlay = PendingOverlay::new();
        overlay.set_default("zosmf", "");
        assert_eq!(overlay.pending_default("zosmf").unwrap().profile(), None);

        let cleared = overlay.clear_default("zosmf").unwrap();
        assert_eq!(cleared.path, vec!["defaults", "zosmf"]);
        assert!(overlay.pending_default("zosmf").is_none());
        assert!(overlay.is_empty());
    }
}
