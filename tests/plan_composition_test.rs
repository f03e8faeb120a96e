use anyhow::Result;
use plan_composer::core::namespace;
use plan_composer::core::plan::DeploymentPlan;
use plan_composer::{compose_environment, compose_template, parse_environment, parse_template};
use serde_json::json;

const COMPUTE_ROLE: &str = r#"
heat_template_version: 2014-10-16
description: A compute node
parameters:
  key_name:
    type: string
    description: Keypair to inject
resources:
  server:
    type: OS::Nova::Server
    properties:
      key_name: {get_param: key_name}
outputs:
  foo_ip:
    value: {get_attr: [server, first_address]}
"#;

/// 單一角色加入計畫後的 parameter / output / registry 內容
#[test]
fn test_add_compute_role_scenario() -> Result<()> {
    let role = parse_template(COMPUTE_ROLE)?;
    let mut plan = DeploymentPlan::new().with_scaling(false);

    plan.add_template("compute-1", &role, "provider-compute-1.yaml", None)?;

    let parameter = plan.master_template.find_parameter_by_name("compute-1::key_name")?;
    assert_eq!(parameter.param_type, "string");
    assert_eq!(parameter.description.as_deref(), Some("Keypair to inject"));

    let env_parameter = plan.environment.find_parameter_by_name("compute-1::key_name")?;
    assert_eq!(env_parameter.value, json!(""));

    let resource_id = plan.master_resource_id("compute-1");
    let output = plan.master_template.find_output_by_name("compute-1::foo_ip")?;
    assert_eq!(output.value, json!({"get_attr": [resource_id, "foo_ip"]}));

    let entries: Vec<_> = plan.environment.registry_entries().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].alias(), namespace::apply_resource_alias_namespace("compute-1"));
    assert_eq!(entries[0].filename, "provider-compute-1.yaml");

    Ok(())
}

#[test]
fn test_add_then_remove_returns_to_empty_state() -> Result<()> {
    let role = parse_template(COMPUTE_ROLE)?;

    for scaling in [true, false] {
        let mut plan = DeploymentPlan::new().with_scaling(scaling);
        plan.add_template("r-1", &role, "r.yaml", None)?;
        assert!(plan.master_template.parameter_count() > 0);

        plan.remove_template("r-1");

        assert_eq!(plan.master_template.parameter_count(), 0);
        assert_eq!(plan.master_template.output_count(), 0);
        assert_eq!(plan.master_template.resource_count(), 0);
        assert_eq!(plan.environment.parameter_count(), 0);
        assert_eq!(plan.environment.registry_entry_count(), 0);
    }

    Ok(())
}

#[test]
fn test_remove_missing_namespace_is_noop() {
    let mut plan = DeploymentPlan::new();
    let before = plan.clone();
    plan.remove_template("missing");
    assert_eq!(plan, before);
}

/// 計畫經過文字持久化之後仍可以繼續修改
#[test]
fn test_plan_survives_persistence() -> Result<()> {
    let role = parse_template(COMPUTE_ROLE)?;
    let mut plan = DeploymentPlan::new();
    plan.add_template("compute-1", &role, "provider-compute-1.yaml", None)?;
    plan.add_template("compute-2", &role, "provider-compute-2.yaml", None)?;
    plan.set_value("compute-2::count", json!(3))?;

    let template_text = compose_template(&plan.master_template)?;
    let environment_text = compose_environment(&plan.environment)?;
    println!("📄 Composed master template:\n{}", template_text);

    let mut reloaded = DeploymentPlan::from_texts(&template_text, &environment_text)?;
    assert_eq!(reloaded.role_namespaces(), vec!["compute-1", "compute-2"]);
    assert_eq!(
        reloaded.environment.find_parameter_by_name("compute-2::count")?.value,
        json!(3)
    );

    reloaded.remove_template("compute-1");
    assert_eq!(reloaded.role_namespaces(), vec!["compute-2"]);
    assert!(reloaded.master_template.has_resource("compute-2-servers"));
    assert!(!reloaded.master_template.has_parameter("compute-1::key_name"));

    let environment = parse_environment(&compose_environment(&reloaded.environment)?)?;
    assert_eq!(environment.parameter_count(), 2);

    Ok(())
}

#[test]
fn test_template_round_trip_keeps_element_sets() -> Result<()> {
    let original = parse_template(COMPUTE_ROLE)?;
    let reparsed = parse_template(&compose_template(&original)?)?;

    assert_eq!(reparsed, original);
    Ok(())
}

#[test]
fn test_set_value_requires_namespaced_name() -> Result<()> {
    let role = parse_template(COMPUTE_ROLE)?;
    let mut plan = DeploymentPlan::new();
    plan.add_template("compute-1", &role, "provider-compute-1.yaml", None)?;

    assert!(plan.set_value("key_name", json!("k")).is_err());
    plan.set_value("compute-1::key_name", json!("k"))?;
    Ok(())
}
