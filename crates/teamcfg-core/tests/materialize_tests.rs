//! Tests for effective profile views over the fixture project layer

use serde_json::json;
use teamcfg_core::{LayerView, PendingOverlay, RenameGraph};
use teamcfg_model::{ConfigPath, ConfigurationLayer, ProfileKey};
use teamcfg_test_utils::fixtures;

fn key(s: &str) -> ProfileKey {
    ProfileKey::parse(s).unwrap()
}

fn keys(view: &LayerView<'_>) -> Vec<String> {
    view.profile_keys().iter().map(ToString::to_string).collect()
}

struct Fixture {
    layer: ConfigurationLayer,
    renames: RenameGraph,
    overlay: PendingOverlay,
}

impl Fixture {
    fn new() -> Self {
        Self {
            layer: fixtures::project_layer(),
            renames: RenameGraph::new(),
            overlay: PendingOverlay::new(),
        }
    }

    fn rename(&mut self, from: &str, to: &str) {
        self.renames.apply(&key(from), &key(to), false, 1).unwrap();
    }

    fn view(&self) -> LayerView<'_> {
        LayerView::new(&self.layer, &self.renames, &self.overlay)
    }
}

mod persisted_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fixture_profiles() {
        let fixture = Fixture::new();
        let view = fixture.view();

        assert_eq!(keys(&view), vec!["base", "lpar1", "lpar1.ssh", "lpar1.zosmf"]);

        let base = view.materialize(&key("base"));
        assert_eq!(base.kind, "base");
        assert_eq!(base.secure, vec!["password", "user"]);
        assert!(base.has_property("user"));
        assert!(!base.properties.contains_key("user"));

        let group = view.materialize(&key("lpar1"));
        assert!(group.is_untyped());
        assert_eq!(group.properties["host"], json!("lpar1.example.com"));
    }

    #[test]
    fn test_profiles_of_type_and_defaults() {
        let fixture = Fixture::new();
        let view = fixture.view();

        assert_eq!(view.profiles_of_type("ssh"), vec![key("lpar1.ssh")]);
        assert_eq!(view.effective_default("zosmf"), Some(key("lpar1.zosmf")));
        assert!(view.is_profile_default(&key("lpar1.zosmf")));
        assert!(!view.is_profile_default(&key("lpar1")));
        assert_eq!(view.effective_default("tso"), None);
    }
}

mod rename_view_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_edit_stored_under_old_name_follows_rename() {
        let mut fixture = Fixture::new();
        let zosmf = key("lpar1.zosmf");
        fixture.overlay.set_value(
            ConfigPath::for_property(&zosmf, "port"),
            json!(8443),
            zosmf,
            None,
        );
        fixture.rename("lpar1", "prod");

        let view = fixture.view();
        let moved = view.materialize(&key("prod.zosmf"));
        assert_eq!(moved.kind, "zosmf");
        assert_eq!(moved.properties["port"], json!(8443));
        assert!(!view.profile_exists(&key("lpar1.zosmf")));
    }

    #[test]
    fn test_child_rename_moves_default() {
        let mut fixture = Fixture::new();
        fixture.rename("lpar1.ssh", "lpar1.shell");
        let view = fixture.view();

        assert_eq!(view.effective_default("ssh"), Some(key("lpar1.shell")));
        assert_eq!(view.materialize(&key("lpar1.shell")).properties["port"], json!(22));
        assert_eq!(keys(&view), vec!["base", "lpar1", "lpar1.shell", "lpar1.zosmf"]);
    }

    #[test]
    fn test_profile_paths_include_persisted_form() {
        let mut fixture = Fixture::new();
        fixture.rename("lpar1", "prod");
        let view = fixture.view();

        let paths: Vec<String> = view
            .profile_paths(&key("prod.ssh"))
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            paths,
            vec!["profiles.prod.profiles.ssh", "profiles.lpar1.profiles.ssh"]
        );
        assert_eq!(view.profile_paths(&key("base")).len(), 1);
    }
}

mod deletion_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deleted_group_hides_children() {
        let mut fixture = Fixture::new();
        fixture
            .overlay
            .delete_value(ConfigPath::for_profile(&key("lpar1")), false);
        let view = fixture.view();

        assert_eq!(keys(&view), vec!["base"]);
        assert!(!view.profile_exists(&key("lpar1.ssh")));
        assert!(view.materialize(&key("lpar1.zosmf")).properties.is_empty());
    }

    #[test]
    fn test_deleted_secure_property_leaves_secure_list() {
        let mut fixture = Fixture::new();
        fixture
            .overlay
            .delete_value(ConfigPath::for_property(&key("base"), "password"), true);

        let base = fixture.view().materialize(&key("base"));
        assert_eq!(base.secure, vec!["user"]);
        assert!(!base.has_property("password"));
    }
}
