use anyhow::Result;
use plan_composer::core::seed;
use plan_composer::domain::model::PropertyValue;
use plan_composer::{parse_environment, parse_template, LocalStorage, PlanConfig, PlanEngine};
use serde_json::json;
use tempfile::TempDir;

const SEED: &str = r#"
heat_template_version: 2014-10-16
parameters:
  ComputeCount:
    type: number
    default: 1
  ComputeImage:
    type: string
  NtpServer:
    type: string
    default: pool.ntp.org
resources:
  Compute:
    type: OS::Heat::ResourceGroup
    properties:
      count: {get_param: ComputeCount}
      resource_def:
        type: Tuskar::Compute
        properties:
          Image: abc-123
          ImageRef: {get_param: ComputeImage}
  ComputeAllNodesDeployment:
    type: OS::Heat::StructuredDeployments
    properties:
      servers: compute
      config: {get_resource: AllNodesConfig}
  AllNodesConfig:
    type: OS::Heat::StructuredConfig
outputs:
  NtpServerOut:
    value: {get_param: NtpServer}
"#;

const COMPUTE_ROLE: &str = r#"
parameters:
  Image:
    type: string
  KeyName:
    type: string
    default: default
resources:
  server:
    type: OS::Nova::Server
    properties:
      image: {get_param: Image}
      key_name: {get_param: KeyName}
outputs:
  ip:
    value: {get_attr: [server, first_address]}
"#;

#[test]
fn test_property_map_returns_only_literals() -> Result<()> {
    let seed_template = parse_template(SEED)?;

    let properties = seed::get_property_map_for_role(&seed_template, "Compute")?
        .expect("compute role present in seed");
    assert_eq!(properties.len(), 1);
    assert_eq!(properties["Image"], json!("abc-123"));

    Ok(())
}

/// 端對端：讀取 TOML、角色與 seed，寫出 master 模板與環境檔
#[test]
fn test_engine_composes_plan_with_seed() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base = temp_dir.path();
    std::fs::create_dir_all(base.join("roles"))?;
    std::fs::write(base.join("seed.yaml"), SEED)?;
    std::fs::write(base.join("roles/compute.yaml"), COMPUTE_ROLE)?;

    let config = PlanConfig::from_toml_str(
        r#"
[plan]
name = "overcloud"
description = "Seeded plan"

[plan.parameters]
NtpServer = "time.example.com"

[seed]
template = "seed.yaml"

[[roles]]
name = "compute"
version = 1
template = "roles/compute.yaml"

[roles.parameters]
KeyName = "heat_key"

[output]
path = "out"
"#,
    )?;

    let storage = LocalStorage::new(base.to_str().unwrap().to_string());
    let engine = PlanEngine::new(storage, config);
    let summary = engine.run()?;

    println!("📊 Summary: {:?}", summary);
    assert_eq!(summary.roles, 1);

    let master = parse_template(&std::fs::read_to_string(base.join("out/plan.yaml"))?)?;
    let environment =
        parse_environment(&std::fs::read_to_string(base.join("out/environment.yaml"))?)?;

    assert_eq!(master.description.as_deref(), Some("Seeded plan"));

    // 被 seed 寫死的 Image 不會成為 master 參數
    assert!(!master.has_parameter("compute-1::Image"));
    assert!(master.has_parameter("compute-1::KeyName"));
    assert!(master.has_parameter("compute-1::count"));

    // 角色引用的 seed 參數被排除，其餘的成為頂層參數
    assert!(master.has_parameter("NtpServer"));
    assert!(!master.has_parameter("ComputeCount"));
    assert!(!master.has_parameter("ComputeImage"));

    assert!(master.has_resource("compute-1-servers"));
    assert!(master.has_resource("AllNodesConfig"));
    assert!(!master.has_resource("Compute"));
    assert!(master.has_output("NtpServerOut"));
    assert!(master.has_output("compute-1::ip"));

    let deployment = master.find_resource_by_id("ComputeAllNodesDeployment")?;
    assert_eq!(
        deployment.find_property_by_name("servers").unwrap().value,
        PropertyValue::Value(json!("compute-1-servers"))
    );

    let group = master.find_resource_by_id("compute-1-servers")?;
    match &group.find_property_by_name("resource_def").unwrap().value {
        PropertyValue::Value(definition) => {
            assert_eq!(definition["type"], json!("Tuskar::compute-1"));
            assert_eq!(definition["properties"]["Image"], json!("abc-123"));
            assert_eq!(
                definition["properties"]["KeyName"],
                json!({"get_param": "compute-1::KeyName"})
            );
        }
        other => panic!("unexpected resource_def: {:?}", other),
    }

    assert_eq!(
        environment.find_parameter_by_name("compute-1::KeyName")?.value,
        json!("heat_key")
    );
    assert_eq!(
        environment.find_parameter_by_name("NtpServer")?.value,
        json!("time.example.com")
    );
    assert_eq!(
        environment.find_registry_entry_by_alias("Tuskar::compute-1")?.filename,
        "provider-compute-1.yaml"
    );

    Ok(())
}

#[test]
fn test_engine_is_stable_across_runs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base = temp_dir.path();
    std::fs::write(base.join("seed.yaml"), SEED)?;
    std::fs::write(base.join("compute.yaml"), COMPUTE_ROLE)?;

    let config = PlanConfig::from_toml_str(
        r#"
[plan]
name = "overcloud"

[seed]
template = "seed.yaml"

[[roles]]
name = "compute"
version = 1
template = "compute.yaml"

[output]
path = "out"
"#,
    )?;

    let engine = PlanEngine::new(LocalStorage::new(base.to_str().unwrap().to_string()), config);
    engine.run()?;
    let first = std::fs::read_to_string(base.join("out/plan.yaml"))?;
    engine.run()?;
    let second = std::fs::read_to_string(base.join("out/plan.yaml"))?;

    assert_eq!(first, second);
    Ok(())
}
