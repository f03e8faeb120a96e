use crate::domain::model::{
    Environment, Output, Parameter, ParameterGroup, PropertyValue, Resource, Template, Value,
};
use crate::utils::error::Result;
use serde_json::{json, Map};

/// 將模板轉回 YAML 文字。空的 parameters / parameter_groups / outputs 區段不會輸出。
pub fn compose_template(template: &Template) -> Result<String> {
    let document = template_to_value(template);
    Ok(serde_yaml::to_string(&document)?)
}

pub fn compose_environment(environment: &Environment) -> Result<String> {
    let document = environment_to_value(environment);
    Ok(serde_yaml::to_string(&document)?)
}

pub fn template_to_value(template: &Template) -> Value {
    let mut document = Map::new();
    document.insert(
        "heat_template_version".to_string(),
        Value::String(template.version.clone()),
    );
    if let Some(description) = &template.description {
        document.insert("description".to_string(), Value::String(description.clone()));
    }

    if template.parameter_count() > 0 {
        let parameters: Map<String, Value> = template
            .parameters()
            .map(|p| (p.name().to_string(), parameter_to_value(p)))
            .collect();
        document.insert("parameters".to_string(), Value::Object(parameters));
    }

    if !template.parameter_groups().is_empty() {
        let groups: Vec<Value> = template
            .parameter_groups()
            .iter()
            .map(parameter_group_to_value)
            .collect();
        document.insert("parameter_groups".to_string(), Value::Array(groups));
    }

    // Heat 要求 resources 區段存在，即使是空的
    let resources: Map<String, Value> = template
        .resources()
        .map(|r| (r.resource_id().to_string(), resource_to_value(r)))
        .collect();
    document.insert("resources".to_string(), Value::Object(resources));

    if template.output_count() > 0 {
        let outputs: Map<String, Value> = template
            .outputs()
            .map(|o| (o.name().to_string(), output_to_value(o)))
            .collect();
        document.insert("outputs".to_string(), Value::Object(outputs));
    }

    Value::Object(document)
}

pub fn environment_to_value(environment: &Environment) -> Value {
    let parameters: Map<String, Value> = environment
        .parameters()
        .map(|p| (p.name().to_string(), p.value.clone()))
        .collect();
    let registry: Map<String, Value> = environment
        .registry_entries()
        .map(|e| (e.alias().to_string(), Value::String(e.filename.clone())))
        .collect();

    json!({
        "parameters": parameters,
        "resource_registry": registry,
    })
}

fn parameter_to_value(parameter: &Parameter) -> Value {
    let mut details = Map::new();
    details.insert("type".to_string(), Value::String(parameter.param_type.clone()));
    insert_string(&mut details, "description", &parameter.description);
    insert_string(&mut details, "label", &parameter.label);
    if let Some(default) = &parameter.default {
        details.insert("default".to_string(), default.clone());
    }
    if let Some(hidden) = parameter.hidden {
        details.insert("hidden".to_string(), Value::Bool(hidden));
    }

    if !parameter.constraints().is_empty() {
        let constraints: Vec<Value> = parameter
            .constraints()
            .iter()
            .map(|c| {
                let mut constraint = Map::new();
                constraint.insert(c.constraint_type.clone(), c.definition.clone());
                insert_string(&mut constraint, "description", &c.description);
                Value::Object(constraint)
            })
            .collect();
        details.insert("constraints".to_string(), Value::Array(constraints));
    }

    Value::Object(details)
}

fn parameter_group_to_value(group: &ParameterGroup) -> Value {
    let mut details = Map::new();
    details.insert("label".to_string(), Value::String(group.label.clone()));
    insert_string(&mut details, "description", &group.description);
    let names: Vec<Value> = group
        .parameter_names()
        .map(|n| Value::String(n.to_string()))
        .collect();
    details.insert("parameters".to_string(), Value::Array(names));
    Value::Object(details)
}

/// 內嵌資源會遞迴展開成與一般 mapping 相同的形狀
pub fn resource_to_value(resource: &Resource) -> Value {
    let mut details = Map::new();
    details.insert("type".to_string(), Value::String(resource.resource_type.clone()));

    let optional = [
        ("metadata", &resource.metadata),
        ("depends_on", &resource.depends_on),
        ("update_policy", &resource.update_policy),
        ("deletion_policy", &resource.deletion_policy),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            details.insert(key.to_string(), value.clone());
        }
    }

    if resource.has_properties() {
        let properties: Map<String, Value> = resource
            .properties()
            .map(|p| (p.name.clone(), property_value_to_value(&p.value)))
            .collect();
        details.insert("properties".to_string(), Value::Object(properties));
    }

    Value::Object(details)
}

pub fn property_value_to_value(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Value(v) => v.clone(),
        PropertyValue::Resource(nested) => resource_to_value(nested),
    }
}

fn output_to_value(output: &Output) -> Value {
    let mut details = Map::new();
    details.insert("value".to_string(), output.value.clone());
    insert_string(&mut details, "description", &output.description);
    Value::Object(details)
}

fn insert_string(details: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        details.insert(key.to_string(), Value::String(value.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::{parse_environment, parse_template};
    use crate::domain::model::{
        EnvironmentParameter, ParameterConstraint, RegistryEntry, ResourceProperty,
    };

    fn sample_template() -> Template {
        let mut template = Template::new().with_description("sample");

        let mut count = Parameter::new("count", "number").with_default(json!(1));
        count.add_constraint(ParameterConstraint::new("range", json!({"min": 1})));
        template.add_parameter(count).unwrap();
        template.add_parameter(Parameter::new("key_name", "string")).unwrap();

        let mut server = Resource::new("server", "OS::Nova::Server");
        server.add_property(ResourceProperty::new("key_name", json!({"get_param": "key_name"})));
        server.depends_on = Some(json!("volume"));
        template.add_resource(server).unwrap();
        template.add_resource(Resource::new("volume", "OS::Cinder::Volume")).unwrap();

        let mut output = Output::new("ip", json!({"get_attr": ["server", "first_address"]}));
        output.description = Some("Server IP".to_string());
        template.add_output(output).unwrap();
        template
    }

    #[test]
    fn test_round_trip_preserves_sets() {
        let template = sample_template();
        let text = compose_template(&template).unwrap();
        let parsed = parse_template(&text).unwrap();
        assert_eq!(parsed, template);
    }

    #[test]
    fn test_empty_optional_sections_are_omitted() {
        let template = Template::new();
        let value = template_to_value(&template);
        let document = value.as_object().unwrap();
        assert!(document.contains_key("heat_template_version"));
        assert!(document.contains_key("resources"));
        assert!(!document.contains_key("description"));
        assert!(!document.contains_key("parameters"));
        assert!(!document.contains_key("parameter_groups"));
        assert!(!document.contains_key("outputs"));
    }

    #[test]
    fn test_unset_fields_are_dropped_not_nulled() {
        let mut template = Template::new();
        template.add_parameter(Parameter::new("key_name", "string")).unwrap();
        let value = template_to_value(&template);
        assert_eq!(value["parameters"]["key_name"], json!({"type": "string"}));
        assert!(!compose_template(&template).unwrap().contains("null"));
    }

    #[test]
    fn test_nested_resource_is_expanded() {
        let mut inner = Resource::new("inner", "Tuskar::compute-1");
        inner.add_property(ResourceProperty::new("image", json!("abc")));

        let mut group = Resource::new("compute-1-servers", "OS::Heat::ResourceGroup");
        group.add_property(ResourceProperty::new("count", json!(2)));
        group.add_property(ResourceProperty::new("resource_def", inner));

        let value = resource_to_value(&group);
        assert_eq!(
            value,
            json!({
                "type": "OS::Heat::ResourceGroup",
                "properties": {
                    "count": 2,
                    "resource_def": {
                        "type": "Tuskar::compute-1",
                        "properties": {"image": "abc"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_constraint_layout() {
        let mut parameter = Parameter::new("flavor", "string");
        let mut constraint = ParameterConstraint::new("allowed_values", json!(["a"]));
        constraint.description = Some("known".to_string());
        parameter.add_constraint(constraint);
        assert_eq!(
            parameter_to_value(&parameter)["constraints"],
            json!([{"allowed_values": ["a"], "description": "known"}])
        );
    }

    #[test]
    fn test_environment_round_trip() {
        let mut env = Environment::new();
        env.add_parameter(EnvironmentParameter::new("compute-1::key_name", json!("")))
            .unwrap();
        env.add_registry_entry(RegistryEntry::new("Tuskar::compute-1", "provider-compute-1.yaml"));

        let text = compose_environment(&env).unwrap();
        assert_eq!(parse_environment(&text).unwrap(), env);
    }
}
