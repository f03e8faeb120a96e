pub const TEMPLATE_NAMESPACE_DELIMITER: &str = "::";

/// plan 所擁有的 resource registry alias 前綴
pub const RESOURCE_ALIAS_PREFIX: &str = "Tuskar::";

pub fn apply_template_namespace(namespace: &str, name: &str) -> String {
    format!("{}{}{}", namespace, TEMPLATE_NAMESPACE_DELIMITER, name)
}

/// 去掉第一個分隔符號 (含) 之前的部分；沒有 namespace 的名稱原樣回傳
pub fn remove_template_namespace(name: &str) -> &str {
    match name.find(TEMPLATE_NAMESPACE_DELIMITER) {
        Some(index) => &name[index + TEMPLATE_NAMESPACE_DELIMITER.len()..],
        None => name,
    }
}

pub fn matches_template_namespace(namespace: &str, name: &str) -> bool {
    name.strip_prefix(namespace)
        .is_some_and(|rest| rest.starts_with(TEMPLATE_NAMESPACE_DELIMITER))
}

pub fn apply_resource_alias_namespace(alias: &str) -> String {
    format!("{}{}", RESOURCE_ALIAS_PREFIX, alias)
}

pub fn remove_resource_alias_namespace(alias: &str) -> Option<&str> {
    alias.strip_prefix(RESOURCE_ALIAS_PREFIX)
}

/// 角色在 plan 中的資源 id (未啟用 scaling 時)
pub fn generate_resource_id(namespace: &str) -> String {
    format!("{}-resource", namespace)
}

/// 角色被包在 ResourceGroup 中時，外層 group 的資源 id
pub fn generate_group_id(namespace: &str) -> String {
    format!("{}-servers", namespace)
}

pub fn generate_count_property_name(namespace: &str) -> String {
    apply_template_namespace(namespace, "count")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_remove_template_namespace() {
        let cases = [("compute-1", "key_name"), ("", "x"), ("a:b", "image"), ("ns", "")];
        for (ns, name) in cases {
            let namespaced = apply_template_namespace(ns, name);
            assert_eq!(remove_template_namespace(&namespaced), name);
            assert!(matches_template_namespace(ns, &namespaced));
        }
    }

    #[test]
    fn test_apply_template_namespace_format() {
        assert_eq!(apply_template_namespace("compute-1", "key_name"), "compute-1::key_name");
    }

    #[test]
    fn test_remove_template_namespace_without_delimiter() {
        assert_eq!(remove_template_namespace("plain"), "plain");
    }

    #[test]
    fn test_matches_template_namespace_requires_delimiter() {
        assert!(!matches_template_namespace("compute", "compute-1::key_name"));
        assert!(!matches_template_namespace("compute-1", "compute-1"));
        assert!(!matches_template_namespace("compute-1", "compute-10::key_name"));
        assert!(matches_template_namespace("compute-1", "compute-1::key_name"));
    }

    #[test]
    fn test_resource_alias_namespace() {
        let alias = apply_resource_alias_namespace("compute-1");
        assert_eq!(alias, "Tuskar::compute-1");
        assert_eq!(remove_resource_alias_namespace(&alias), Some("compute-1"));
        assert_eq!(remove_resource_alias_namespace("OS::Nova::Server"), None);
    }

    #[test]
    fn test_generated_ids_are_deterministic() {
        assert_eq!(generate_resource_id("compute-1"), "compute-1-resource");
        assert_eq!(generate_group_id("compute-1"), "compute-1-servers");
        assert_eq!(generate_count_property_name("compute-1"), "compute-1::count");
        assert!(matches_template_namespace(
            "compute-1",
            &generate_count_property_name("compute-1")
        ));
    }
}
