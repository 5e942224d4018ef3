//! Integration tests for tfinventory.
//!
//! These tests verify the end-to-end behaviour of the state loader,
//! template rendering, inventory assembly and output, both through the
//! library API and through the binary.

use serde_json::{json, Value};
use std::path::PathBuf;
use tfinventory::{Config, InventoryBuilder, OutputMode, TemplateRole};

/// Get the path to the test fixtures directory.
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config_for(fixture: &str) -> Config {
    Config {
        state: fixtures_path().join(fixture),
        ..Config::default()
    }
}

fn list(config: Config) -> Value {
    let builder = InventoryBuilder::new(config);
    let inventory = builder.build().unwrap();
    serde_json::from_str(&builder.render(&inventory, &OutputMode::List).unwrap()).unwrap()
}

mod parser_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tfinventory::parser::StateParser;

    #[test]
    fn test_parse_legacy_fixture() {
        let parsed = StateParser::new()
            .parse_file(fixtures_path().join("legacy.tfstate"))
            .unwrap();

        assert_eq!(parsed.version, 3);
        assert_eq!(parsed.terraform_version.as_deref(), Some("0.11.14"));
        assert_eq!(
            parsed.resources.keys().collect::<Vec<_>>(),
            vec![
                "module.database.openstack_compute_instance_v2.db",
                "openstack_compute_instance_v2.web.0",
                "openstack_compute_instance_v2.web.1",
                "openstack_networking_network_v2.net",
            ]
        );

        let web = &parsed.resources["openstack_compute_instance_v2.web.0"];
        assert_eq!(web.id.as_deref(), Some("8a9c0d11"));
        assert_eq!(web.provider.as_deref(), Some("provider.openstack"));
        assert_eq!(web.depends_on, vec!["openstack_networking_network_v2.net"]);
        // Count sentinels keep these nodes maps
        assert_eq!(
            web.expanded_attributes["security_groups"],
            json!({"#": "2", "0": "default", "1": "http"})
        );
        assert_eq!(web.expanded_attributes["network"]["0"]["fixed_ip_v4"], "10.0.0.5");
    }

    #[test]
    fn test_parse_modern_fixture() {
        let parsed = StateParser::new()
            .parse_file(fixtures_path().join("modern.tfstate"))
            .unwrap();

        assert_eq!(parsed.version, 4);
        assert!(parsed.resources.contains_key("data.aws_ami.ubuntu"));
        assert!(parsed.resources.contains_key("module.bastion.aws_instance.this"));

        let blue = &parsed.resources[r#"aws_instance.app["blue"]"#];
        assert_eq!(blue.module_path, "");
        assert_eq!(blue.attributes["tags.Name"], "app-blue");
        assert_eq!(blue.attributes["vpc_security_group_ids.1"], "sg-2");
        assert_eq!(blue.attributes["monitoring"], "false");
        assert_eq!(blue.expanded_attributes["tags"]["Tier"], "app");

        let green = &parsed.resources[r#"aws_instance.app["green"]"#];
        assert!(!green.attributes.contains_key("public_ip"));
    }
}

mod inventory_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_templates_legacy() {
        let inventory = list(config_for("legacy.tfstate"));

        assert_eq!(
            inventory["all"]["hosts"],
            json!([
                "module.database.openstack_compute_instance_v2.db",
                "openstack_compute_instance_v2.web.0",
                "openstack_compute_instance_v2.web.1",
            ])
        );

        let hostvars = &inventory["_meta"]["hostvars"];
        assert_eq!(hostvars["openstack_compute_instance_v2.web.0"]["ansible_host"], "10.0.0.5");
        assert_eq!(hostvars["openstack_compute_instance_v2.web.1"]["ansible_host"], "203.0.113.20");
        assert_eq!(
            hostvars["module.database.openstack_compute_instance_v2.db"]["ansible_host"],
            "10.0.1.7"
        );
        assert_eq!(
            hostvars["module.database.openstack_compute_instance_v2.db"]["tf_user_data"],
            "#cloud-config\\npackages:\\n  - postgresql"
        );
        assert!(hostvars.get("openstack_networking_network_v2.net").is_none());
    }

    #[test]
    fn test_default_templates_modern() {
        let inventory = list(config_for("modern.tfstate"));
        let hostvars = &inventory["_meta"]["hostvars"];

        assert_eq!(hostvars[r#"aws_instance.app["blue"]"#]["ansible_host"], "198.51.100.10");
        assert_eq!(hostvars[r#"aws_instance.app["green"]"#]["ansible_host"], "10.1.0.11");
        assert_eq!(hostvars["module.bastion.aws_instance.this"]["tf_tags.Tier"], "ops");
        // Tag keys containing dots do not drop the instance
        assert_eq!(hostvars["module.bastion.aws_instance.this"]["tf_tags.k8s"], "yes");
        assert_eq!(hostvars["module.bastion.aws_instance.this"]["tf_tags.k8s.io/role"], "bastion");
        assert!(hostvars.get("data.aws_ami.ubuntu").is_none());
    }

    #[test]
    fn test_custom_templates() {
        let mut config = config_for("modern.tfstate");
        config.templates.set(TemplateRole::Name, "{{ tags.Name }}");
        config.templates.set(TemplateRole::Groups, "all\n{{ tags.Tier }}\n{% if module %}modules{% endif %}");
        config.templates.set(TemplateRole::Filter, "{% if type == 'aws_instance' %}True{% else %}False{% endif %}");
        config.templates.set(
            TemplateRole::HostVars,
            "ansible_host={{ private_ip }}\n\
             security_groups={% if vpc_security_group_ids %}{{ vpc_security_group_ids | json_encode() }}{% else %}[]{% endif %}",
        );

        let inventory = list(config);

        assert_eq!(
            inventory,
            json!({
                "all": {"hosts": ["app-blue", "app-green", "bastion"]},
                "app": {"hosts": ["app-blue", "app-green"]},
                "modules": {"hosts": ["bastion"]},
                "ops": {"hosts": ["bastion"]},
                "_meta": {"hostvars": {
                    "app-blue": {"ansible_host": "10.1.0.10", "security_groups": ["sg-1", "sg-2"]},
                    "app-green": {"ansible_host": "10.1.0.11", "security_groups": ["sg-1"]},
                    "bastion": {"ansible_host": "10.1.255.4", "security_groups": []},
                }},
            })
        );
    }

    #[test]
    fn test_filter_excludes_everything() {
        let mut config = config_for("legacy.tfstate");
        config.templates.set(TemplateRole::Filter, "False");

        assert_eq!(list(config), json!({"_meta": {"hostvars": {}}}));
    }
}

mod cli_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use assert_cmd::Command;
    use predicates::prelude::*;

    const ENV_VARS: &[&str] = &[
        "TF_STATE",
        "TF_ANSIBLE_INVENTORY_NAME_TEMPLATE",
        "TF_ANSIBLE_GROUPS_TEMPLATE",
        "TF_ANSIBLE_RESOURCE_FILTER_TEMPLATE",
        "TF_ANSIBLE_HOST_VARS_TEMPLATE",
        "TFINVENTORY_CONFIG",
        "RUST_LOG",
    ];

    fn cmd(workdir: &tempfile::TempDir) -> Command {
        let mut cmd = Command::cargo_bin("tfinventory").unwrap();
        cmd.current_dir(workdir.path());
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    fn stdout_json(output: &std::process::Output) -> Value {
        serde_json::from_slice(&output.stdout).unwrap()
    }

    #[test]
    fn test_list() {
        let workdir = tempfile::tempdir().unwrap();
        let output = cmd(&workdir)
            .arg("--list")
            .arg("--state")
            .arg(fixtures_path().join("legacy.tfstate"))
            .output()
            .unwrap();

        assert!(output.status.success());
        let inventory = stdout_json(&output);
        assert_eq!(inventory["all"]["hosts"].as_array().unwrap().len(), 3);
        assert!(inventory["_meta"]["hostvars"].is_object());
    }

    #[test]
    fn test_host() {
        let workdir = tempfile::tempdir().unwrap();
        let output = cmd(&workdir)
            .args(["--host", "openstack_compute_instance_v2.web.0"])
            .env("TF_STATE", fixtures_path().join("legacy.tfstate"))
            .output()
            .unwrap();

        assert!(output.status.success());
        let vars = stdout_json(&output);
        assert_eq!(vars["ansible_host"], "10.0.0.5");
        assert_eq!(vars["tf_metadata.role"], "web");
    }

    #[test]
    fn test_unknown_host_prints_empty_object() {
        let workdir = tempfile::tempdir().unwrap();
        cmd(&workdir)
            .args(["--host", "nope"])
            .env("TF_STATE", fixtures_path().join("legacy.tfstate"))
            .assert()
            .success()
            .stdout(predicate::str::diff("{}\n"));
    }

    #[test]
    fn test_templates_from_environment() {
        let workdir = tempfile::tempdir().unwrap();
        let output = cmd(&workdir)
            .arg("--list")
            .env("TF_STATE", fixtures_path().join("legacy.tfstate"))
            .env("TF_ANSIBLE_INVENTORY_NAME_TEMPLATE", "{{ attributes.name }}")
            .env("TF_ANSIBLE_GROUPS_TEMPLATE", "{{ metadata.role }}")
            .env("TF_ANSIBLE_HOST_VARS_TEMPLATE", "id={{ id }}")
            .output()
            .unwrap();

        assert!(output.status.success());
        assert_eq!(
            stdout_json(&output),
            json!({
                "db": {"hosts": ["db-0"]},
                "web": {"hosts": ["web-0", "web-1"]},
                "_meta": {"hostvars": {
                    "db-0": {"id": "c0ffee00"},
                    "web-0": {"id": "8a9c0d11"},
                    "web-1": {"id": "41be77f0"},
                }},
            })
        );
    }

    #[test]
    fn test_flag_wins_over_environment() {
        let workdir = tempfile::tempdir().unwrap();
        let output = cmd(&workdir)
            .args(["--list", "--ansible-groups-template", "from_flag"])
            .env("TF_STATE", fixtures_path().join("legacy.tfstate"))
            .env("TF_ANSIBLE_GROUPS_TEMPLATE", "from_env")
            .output()
            .unwrap();

        let inventory = stdout_json(&output);
        assert!(inventory.get("from_flag").is_some());
        assert!(inventory.get("from_env").is_none());
    }

    #[test]
    fn test_config_file_in_working_directory() {
        let workdir = tempfile::tempdir().unwrap();
        std::fs::write(
            workdir.path().join("tfinventory.yaml"),
            format!(
                "state: {}\ntemplates:\n  groups: configured\noutput:\n  format: yaml\n",
                fixtures_path().join("legacy.tfstate").display()
            ),
        )
        .unwrap();

        let output = cmd(&workdir).arg("--list").output().unwrap();

        assert!(output.status.success());
        let inventory: Value = serde_yaml::from_slice(&output.stdout).unwrap();
        assert_eq!(inventory["configured"]["hosts"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_state_file() {
        let workdir = tempfile::tempdir().unwrap();
        cmd(&workdir)
            .arg("--list")
            .assert()
            .failure()
            .code(14)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("terraform.tfstate"));
    }

    #[test]
    fn test_invalid_template_fails() {
        let workdir = tempfile::tempdir().unwrap();
        cmd(&workdir)
            .args(["--list", "--ansible-inventory-name-template", "{{ name"])
            .env("TF_STATE", fixtures_path().join("legacy.tfstate"))
            .assert()
            .failure()
            .code(16)
            .stderr(predicate::str::contains("name template"));
    }

    #[test]
    fn test_mode_is_required() {
        let workdir = tempfile::tempdir().unwrap();
        cmd(&workdir).assert().failure();
    }
}
