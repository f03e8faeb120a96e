use crate::core::composer::property_value_to_value;
use crate::core::namespace::RESOURCE_ALIAS_PREFIX;
use crate::core::plan::{RESOURCE_DEF_PROPERTY, SCALING_RESOURCE_TYPES};
use crate::domain::model::{
    Environment, EnvironmentParameter, PropertyValue, Resource, Template, Value,
};
use crate::utils::error::{PlanError, Result};
use std::collections::{HashMap, HashSet};

/// 角色資源：scaling group 且 `resource_def` 的 type 以角色前綴開頭
pub fn is_role_resource(resource: &Resource) -> bool {
    if !SCALING_RESOURCE_TYPES.contains(&resource.resource_type.as_str()) {
        return false;
    }
    match resource.find_property_by_name(RESOURCE_DEF_PROPERTY).map(|p| &p.value) {
        Some(PropertyValue::Resource(inner)) => inner.resource_type.starts_with(RESOURCE_ALIAS_PREFIX),
        Some(PropertyValue::Value(definition)) => definition
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.starts_with(RESOURCE_ALIAS_PREFIX)),
        None => false,
    }
}

pub fn add_top_level_resources(seed: &Template, destination: &mut Template) -> Result<()> {
    for resource in seed.resources().filter(|r| !is_role_resource(r)) {
        if destination.has_resource(resource.resource_id()) {
            continue;
        }
        tracing::debug!("Adding top-level resource: {}", resource.resource_id());
        destination.add_resource(resource.clone())?;
    }
    Ok(())
}

/// 複製 seed 中不被任何角色資源引用的參數
pub fn add_top_level_parameters(
    seed: &Template,
    destination: &mut Template,
    environment: &mut Environment,
) -> Result<()> {
    let role_parameters = role_parameter_names(seed);

    for parameter in seed.parameters() {
        if role_parameters.contains(parameter.name()) || destination.has_parameter(parameter.name()) {
            continue;
        }
        tracing::debug!("Adding top-level parameter: {}", parameter.name());
        destination.add_parameter(parameter.clone())?;

        if !environment.has_parameter(parameter.name()) {
            let value = parameter
                .default
                .clone()
                .unwrap_or_else(|| Value::String(String::new()));
            environment.add_parameter(EnvironmentParameter::new(parameter.name(), value))?;
        }
    }
    Ok(())
}

pub fn add_top_level_outputs(seed: &Template, destination: &mut Template) -> Result<()> {
    for output in seed.outputs() {
        if destination.has_output(output.name()) {
            continue;
        }
        tracing::debug!("Adding top-level output: {}", output.name());
        destination.add_output(output.clone())?;
    }
    Ok(())
}

/// 取得 seed 中某個角色寫死的屬性 (不是 `get_param` 的值)。
/// 角色不存在時回傳 `None`；多個 id 以不分大小寫比對相同時視為錯誤。
pub fn get_property_map_for_role(
    seed: &Template,
    role_name: &str,
) -> Result<Option<HashMap<String, Value>>> {
    let mut index: HashMap<String, Vec<&Resource>> = HashMap::new();
    for resource in seed.resources() {
        index
            .entry(resource.resource_id().to_lowercase())
            .or_default()
            .push(resource);
    }

    let role = match index.get(&role_name.to_lowercase()).map(Vec::as_slice) {
        None | Some([]) => return Ok(None),
        Some([resource]) => *resource,
        Some(candidates) => {
            return Err(PlanError::AmbiguousMatchError {
                name: role_name.to_string(),
                candidates: candidates
                    .iter()
                    .map(|r| r.resource_id().to_string())
                    .collect(),
            })
        }
    };

    let properties = resource_def_properties(role)
        .into_iter()
        .filter(|(_, value)| parameter_lookup(value).is_none())
        .collect();
    Ok(Some(properties))
}

/// 將頂層資源屬性中等於 `seed_role_name` (不分大小寫) 的字串換成 plan 的資源 id，
/// 回傳替換次數
pub fn update_references(template: &mut Template, seed_role_name: &str, tuskar_resource_name: &str) -> usize {
    let needle = seed_role_name.to_lowercase();
    let mut replaced = 0;

    for resource in template.resources_mut() {
        if is_role_resource(resource) {
            continue;
        }
        replaced += replace_in_resource(resource, &needle, tuskar_resource_name);
    }

    if replaced > 0 {
        tracing::debug!(
            "Replaced {} reference(s) to '{}' with '{}'",
            replaced,
            seed_role_name,
            tuskar_resource_name
        );
    }
    replaced
}

fn replace_in_resource(resource: &mut Resource, needle: &str, replacement: &str) -> usize {
    let mut replaced = 0;
    for property in resource.properties_mut() {
        replaced += match &mut property.value {
            PropertyValue::Value(value) => replace_in_value(value, needle, replacement),
            PropertyValue::Resource(nested) => replace_in_resource(nested, needle, replacement),
        };
    }
    replaced
}

fn replace_in_value(value: &mut Value, needle: &str, replacement: &str) -> usize {
    match value {
        Value::String(s) => {
            if s.to_lowercase() == needle {
                *s = replacement.to_string();
                1
            } else {
                0
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| replace_in_value(item, needle, replacement))
            .sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|item| replace_in_value(item, needle, replacement))
            .sum(),
        other => {
            tracing::trace!("Leaving non-string value untouched: {}", other);
            0
        }
    }
}

/// 所有角色資源引用的參數名稱：直接的 `get_param` 以及 `resource_def` 內屬性的 `get_param`
fn role_parameter_names(seed: &Template) -> HashSet<String> {
    let mut names = HashSet::new();
    for role in seed.resources().filter(|r| is_role_resource(r)) {
        for property in role.properties() {
            if let PropertyValue::Value(value) = &property.value {
                if let Some(name) = parameter_lookup(value) {
                    names.insert(name.to_string());
                }
            }
        }
        for value in resource_def_properties(role).values() {
            if let Some(name) = parameter_lookup(value) {
                names.insert(name.to_string());
            }
        }
    }
    names
}

fn resource_def_properties(role: &Resource) -> HashMap<String, Value> {
    match role.find_property_by_name(RESOURCE_DEF_PROPERTY).map(|p| &p.value) {
        Some(PropertyValue::Resource(inner)) => inner
            .properties()
            .map(|p| (p.name.clone(), property_value_to_value(&p.value)))
            .collect(),
        Some(PropertyValue::Value(definition)) => definition
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default(),
        None => HashMap::new(),
    }
}

/// `{get_param: name}` 或 `{get_param: [name, ...]}` 形式時回傳參數名稱
fn parameter_lookup(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    match map.get("get_param")? {
        Value::String(name) => Some(name.as_str()),
        Value::Array(path) => path.first().and_then(Value::as_str),
        _ => None,
    }
}
