//! Helpers for pulling identifiers out of resource names.

/// Registry-local physical id of a resource: the last `/` segment of its ARN.
///
/// `arn:aws:ecs:eu-west-1:123456789012:task/prod/0cc43cdb` yields `0cc43cdb`.
/// An ARN without any `/` is returned unchanged.
pub fn physical_id(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

/// Name of the owning service from a task's `group` (`service:<name>`).
///
/// Tasks launched outside a service (`family:<name>`, or no group) have
/// no owning service.
pub fn service_name_from_group(group: &str) -> Option<&str> {
    group
        .strip_prefix("service:")
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_id_of_task_arn() {
        let arn = "arn:aws:ecs:eu-west-1:123456789012:task/prod-cluster/0cc43cdb3c1a4d0e9a6b";
        assert_eq!(physical_id(arn), "0cc43cdb3c1a4d0e9a6b");
    }

    #[test]
    fn physical_id_of_cloud_map_service_arn() {
        let arn = "arn:aws:servicediscovery:eu-west-1:123456789012:service/srv-abcdefgh12345678";
        assert_eq!(physical_id(arn), "srv-abcdefgh12345678");
    }

    #[test]
    fn physical_id_with_varying_segment_counts() {
        let cases = [
            ("arn:svc:region:acct:type/id", "id"),
            ("arn:svc:region:acct:type/parent/id", "id"),
            ("arn:svc:region:acct:type/a/b/c/d/leaf", "leaf"),
        ];
        for (arn, expected) in cases {
            assert_eq!(physical_id(arn), expected, "arn {arn}");
        }
    }

    #[test]
    fn physical_id_without_slash_is_whole_string() {
        assert_eq!(physical_id("0cc43cdb"), "0cc43cdb");
        assert_eq!(physical_id(""), "");
    }

    #[test]
    fn physical_id_trailing_slash_is_empty() {
        assert_eq!(physical_id("arn:svc:r:a:task/cluster/"), "");
    }

    #[test]
    fn service_name_strips_prefix() {
        assert_eq!(service_name_from_group("service:checkout"), Some("checkout"));
    }

    #[test]
    fn service_name_absent_for_standalone_tasks() {
        assert_eq!(service_name_from_group("family:checkout"), None);
        assert_eq!(service_name_from_group("service:"), None);
        assert_eq!(service_name_from_group(""), None);
    }
}
