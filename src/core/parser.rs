use crate::domain::model::{
    Environment, EnvironmentParameter, Output, Parameter, ParameterConstraint, ParameterGroup,
    RegistryEntry, Resource, ResourceProperty, Template, Value,
};
use crate::utils::error::{PlanError, Result};
use serde_json::Map;

const TEMPLATE_SECTIONS: &[&str] = &[
    "heat_template_version",
    "description",
    "parameters",
    "parameter_groups",
    "resources",
    "outputs",
];

const ENVIRONMENT_SECTIONS: &[&str] = &["parameters", "resource_registry"];

/// 將模板文字解析為物件模型。缺少的區段視為空的。
pub fn parse_template(content: &str) -> Result<Template> {
    let document = load_document(content)?;
    warn_unknown_sections("template", &document, TEMPLATE_SECTIONS);

    let mut template = Template::new();

    if let Some(version) = document.get("heat_template_version") {
        if let Some(version) = scalar_to_string(version) {
            template.version = version;
        }
    }
    template.description = optional_string(&document, "description", "template", "<root>")?;

    if let Some(parameters) = section(&document, "parameters")? {
        for (name, details) in parameters {
            template.add_parameter(parse_parameter(name, details)?)?;
        }
    }

    if let Some(groups) = sequence_section(&document, "parameter_groups")? {
        for (index, details) in groups.iter().enumerate() {
            template.add_parameter_group(parse_parameter_group(index, details)?);
        }
    }

    if let Some(resources) = section(&document, "resources")? {
        for (resource_id, details) in resources {
            template.add_resource(parse_resource(resource_id, details)?)?;
        }
    }

    if let Some(outputs) = section(&document, "outputs")? {
        for (name, details) in outputs {
            template.add_output(parse_output(name, details)?)?;
        }
    }

    tracing::debug!(
        "Parsed template: {} parameters, {} resources, {} outputs",
        template.parameter_count(),
        template.resource_count(),
        template.output_count()
    );
    Ok(template)
}

/// 將環境文字解析為物件模型
pub fn parse_environment(content: &str) -> Result<Environment> {
    let document = load_document(content)?;
    warn_unknown_sections("environment", &document, ENVIRONMENT_SECTIONS);

    let mut environment = Environment::new();

    if let Some(parameters) = section(&document, "parameters")? {
        for (name, value) in parameters {
            environment.add_parameter(EnvironmentParameter::new(name.clone(), value.clone()))?;
        }
    }

    if let Some(registry) = section(&document, "resource_registry")? {
        for (alias, filename) in registry {
            let filename = match filename {
                Value::String(s) => s.clone(),
                other => {
                    return Err(PlanError::InvalidFieldError {
                        section: "resource_registry".to_string(),
                        name: alias.clone(),
                        field: "filename".to_string(),
                        reason: format!("expected a string, found {}", other),
                    })
                }
            };
            environment.add_registry_entry(RegistryEntry::new(alias.clone(), filename));
        }
    }

    Ok(environment)
}

/// 讀取 YAML 文件並轉換為 JSON 值樹；空文件視為空的 mapping
fn load_document(content: &str) -> Result<Map<String, Value>> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    match yaml_to_value(yaml)? {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(PlanError::InvalidDocumentError {
            message: format!("expected a mapping at the top level, found {}", kind_of(&other)),
        }),
    }
}

pub(crate) fn yaml_to_value(yaml: serde_yaml::Value) -> Result<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| PlanError::InvalidDocumentError {
                        message: format!("unsupported non-finite number: {}", n),
                    })?
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => {
                        return Err(PlanError::InvalidDocumentError {
                            message: format!("unsupported mapping key: {:?}", other),
                        })
                    }
                };
                map.insert(key, yaml_to_value(value)?);
            }
            Value::Object(map)
        }
        // Tags such as `!Ref` carry no meaning for the model
        Yaml::Tagged(tagged) => yaml_to_value(tagged.value)?,
    })
}

fn parse_parameter(name: &str, details: &Value) -> Result<Parameter> {
    let details = entry_mapping(details, "parameters", name)?;

    let param_type = match details.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(other) => {
            return Err(PlanError::InvalidFieldError {
                section: "parameters".to_string(),
                name: name.to_string(),
                field: "type".to_string(),
                reason: format!("expected a string, found {}", kind_of(other)),
            })
        }
        None => {
            return Err(PlanError::MissingFieldError {
                section: "parameters".to_string(),
                name: name.to_string(),
                field: "type".to_string(),
            })
        }
    };

    let mut parameter = Parameter::new(name, param_type);
    parameter.description = optional_string(details, "description", "parameters", name)?;
    parameter.label = optional_string(details, "label", "parameters", name)?;
    parameter.default = optional_value(details, "default");
    parameter.hidden = match details.get("hidden") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => {
            return Err(PlanError::InvalidFieldError {
                section: "parameters".to_string(),
                name: name.to_string(),
                field: "hidden".to_string(),
                reason: format!("expected a boolean, found {}", kind_of(other)),
            })
        }
    };

    match details.get("constraints") {
        None | Some(Value::Null) => {}
        Some(Value::Array(constraints)) => {
            for constraint in constraints {
                parameter.add_constraint(parse_constraint(name, constraint)?);
            }
        }
        Some(other) => {
            return Err(PlanError::InvalidFieldError {
                section: "parameters".to_string(),
                name: name.to_string(),
                field: "constraints".to_string(),
                reason: format!("expected a list, found {}", kind_of(other)),
            })
        }
    }

    Ok(parameter)
}

/// 每個 constraint 去掉 `description` 之後必須恰好剩下一個 key
fn parse_constraint(parameter: &str, constraint: &Value) -> Result<ParameterConstraint> {
    let Value::Object(map) = constraint else {
        return Err(PlanError::MalformedConstraintError {
            parameter: parameter.to_string(),
            reason: format!("expected a mapping, found {}", kind_of(constraint)),
        });
    };

    let mut remaining = map.clone();
    let description = match remaining.remove("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            return Err(PlanError::MalformedConstraintError {
                parameter: parameter.to_string(),
                reason: format!("description must be a string, found {}", kind_of(&other)),
            })
        }
    };

    if remaining.len() != 1 {
        return Err(PlanError::MalformedConstraintError {
            parameter: parameter.to_string(),
            reason: format!(
                "expected exactly one constraint type, found {} ({})",
                remaining.len(),
                remaining.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    let (constraint_type, definition) = remaining
        .into_iter()
        .next()
        .ok_or_else(|| PlanError::MalformedConstraintError {
            parameter: parameter.to_string(),
            reason: "empty constraint".to_string(),
        })?;

    let mut constraint = ParameterConstraint::new(constraint_type, definition);
    constraint.description = description;
    Ok(constraint)
}

fn parse_parameter_group(index: usize, details: &Value) -> Result<ParameterGroup> {
    let entry_name = format!("#{}", index);
    let details = entry_mapping(details, "parameter_groups", &entry_name)?;

    let label = optional_string(details, "label", "parameter_groups", &entry_name)?.ok_or_else(
        || PlanError::MissingFieldError {
            section: "parameter_groups".to_string(),
            name: entry_name.clone(),
            field: "label".to_string(),
        },
    )?;

    let mut group = ParameterGroup::new(label);
    group.description = optional_string(details, "description", "parameter_groups", &entry_name)?;

    match details.get("parameters") {
        None | Some(Value::Null) => {}
        Some(Value::Array(names)) => {
            for name in names {
                let name = scalar_to_string(name).ok_or_else(|| PlanError::InvalidFieldError {
                    section: "parameter_groups".to_string(),
                    name: entry_name.clone(),
                    field: "parameters".to_string(),
                    reason: format!("parameter names must be scalars, found {}", kind_of(name)),
                })?;
                group.add_parameter_name(name);
            }
        }
        Some(other) => {
            return Err(PlanError::InvalidFieldError {
                section: "parameter_groups".to_string(),
                name: entry_name,
                field: "parameters".to_string(),
                reason: format!("expected a list, found {}", kind_of(other)),
            })
        }
    }

    Ok(group)
}

fn parse_resource(resource_id: &str, details: &Value) -> Result<Resource> {
    let details = entry_mapping(details, "resources", resource_id)?;

    let resource_type = optional_string(details, "type", "resources", resource_id)?.ok_or_else(
        || PlanError::MissingFieldError {
            section: "resources".to_string(),
            name: resource_id.to_string(),
            field: "type".to_string(),
        },
    )?;

    let mut resource = Resource::new(resource_id, resource_type);
    resource.metadata = optional_value(details, "metadata");
    resource.depends_on = optional_value(details, "depends_on");
    resource.update_policy = optional_value(details, "update_policy");
    resource.deletion_policy = optional_value(details, "deletion_policy");

    match details.get("properties") {
        None | Some(Value::Null) => {}
        Some(Value::Object(properties)) => {
            for (name, value) in properties {
                resource.add_property(ResourceProperty::new(name.clone(), value.clone()));
            }
        }
        Some(other) => {
            return Err(PlanError::InvalidFieldError {
                section: "resources".to_string(),
                name: resource_id.to_string(),
                field: "properties".to_string(),
                reason: format!("expected a mapping, found {}", kind_of(other)),
            })
        }
    }

    Ok(resource)
}

fn parse_output(name: &str, details: &Value) -> Result<Output> {
    let details = entry_mapping(details, "outputs", name)?;

    let value = details
        .get("value")
        .cloned()
        .ok_or_else(|| PlanError::MissingFieldError {
            section: "outputs".to_string(),
            name: name.to_string(),
            field: "value".to_string(),
        })?;

    let mut output = Output::new(name, value);
    output.description = optional_string(details, "description", "outputs", name)?;
    Ok(output)
}

/// 空值 (`key:` 或 `key: null`) 視為未設定
fn optional_value(details: &Map<String, Value>, key: &str) -> Option<Value> {
    match details.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.clone()),
    }
}

fn section<'a>(document: &'a Map<String, Value>, key: &str) -> Result<Option<&'a Map<String, Value>>> {
    match document.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(PlanError::InvalidDocumentError {
            message: format!("section '{}' must be a mapping, found {}", key, kind_of(other)),
        }),
    }
}

fn sequence_section<'a>(document: &'a Map<String, Value>, key: &str) -> Result<Option<&'a Vec<Value>>> {
    match document.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(PlanError::InvalidDocumentError {
            message: format!("section '{}' must be a list, found {}", key, kind_of(other)),
        }),
    }
}

fn entry_mapping<'a>(details: &'a Value, section: &str, name: &str) -> Result<&'a Map<String, Value>> {
    details.as_object().ok_or_else(|| PlanError::InvalidFieldError {
        section: section.to_string(),
        name: name.to_string(),
        field: "<entry>".to_string(),
        reason: format!("expected a mapping, found {}", kind_of(details)),
    })
}

fn optional_string(
    details: &Map<String, Value>,
    field: &str,
    section: &str,
    name: &str,
) -> Result<Option<String>> {
    match details.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value)
            .map(Some)
            .ok_or_else(|| PlanError::InvalidFieldError {
                section: section.to_string(),
                name: name.to_string(),
                field: field.to_string(),
                reason: format!("expected a string, found {}", kind_of(value)),
            }),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

fn warn_unknown_sections(kind: &str, document: &Map<String, Value>, known: &[&str]) {
    for key in document.keys() {
        if !known.contains(&key.as_str()) {
            tracing::warn!("Ignoring unknown {} section: {}", kind, key);
        }
    }
}
