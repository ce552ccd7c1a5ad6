use nomadgate_core::PolicyPath;
use serde_json::Value;

use crate::policy::{PolicyDoc, PolicyViolation};

/// Matches a compiled job descriptor against a job-claims policy.
///
/// Keys absent from `actual`, or set to `null`, are skipped. A one-element
/// array policy applies its exemplar to every element of the actual array.
/// String leaves are regular expressions anchored at the start of the value
/// only, so `"gitl"` matches `"gitlab"` while `"^gitl$"` does not.
pub fn match_job_spec(actual: &Value, policy: &PolicyDoc) -> Result<(), PolicyViolation> {
    match_at(actual, policy, &PolicyPath::root())
}

fn match_at(actual: &Value, policy: &PolicyDoc, path: &PolicyPath) -> Result<(), PolicyViolation> {
    match policy {
        PolicyDoc::Map(fields) if fields.is_empty() => Ok(()),
        PolicyDoc::Map(fields) => {
            let Value::Object(actual_fields) = actual else {
                return Err(PolicyViolation::new(path.clone(), "expected a map"));
            };

            for (key, field_policy) in fields {
                match actual_fields.get(key) {
                    None | Some(Value::Null) => continue,
                    Some(value) => match_at(value, field_policy, &path.key(key))?,
                }
            }

            Ok(())
        }
        PolicyDoc::Array(exemplars) => {
            let Some(exemplar) = exemplars.first() else {
                return Ok(());
            };
            let Value::Array(items) = actual else {
                return Err(PolicyViolation::new(path.clone(), "expected an array"));
            };

            for (index, item) in items.iter().enumerate() {
                match_at(item, exemplar, &path.index(index))?;
            }

            Ok(())
        }
        PolicyDoc::Pattern(pattern) => {
            let Value::String(text) = actual else {
                return Err(PolicyViolation::new(path.clone(), "expected a string"));
            };

            if pattern.is_match(text) {
                Ok(())
            } else {
                Err(PolicyViolation::new(
                    path.clone(),
                    format!("value does not match '{}'", pattern.as_str()),
                ))
            }
        }
        PolicyDoc::Exact(expected) => {
            if actual.as_i64() == Some(*expected) {
                Ok(())
            } else {
                Err(PolicyViolation::new(
                    path.clone(),
                    format!("value does not equal {expected}"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{Value, json};

    use super::match_job_spec;
    use crate::policy::PolicyDoc;

    fn check(actual: Value, policy: Value) -> Result<(), String> {
        let policy = PolicyDoc::from_json(&policy).map_err(|error| error.to_string())?;
        match_job_spec(&actual, &policy).map_err(|violation| violation.path().to_string())
    }

    #[test]
    fn patterns_are_prefix_matches() {
        assert!(check(json!({"Name": "gitlab"}), json!({"Name": "^gitl$"})).is_err());
        assert!(check(json!({"Name": "gitlab"}), json!({"Name": "^gitlab$"})).is_ok());
        assert!(check(json!({"Name": "gitlab"}), json!({"Name": "gitl"})).is_ok());
        assert!(check(json!({"Name": "my-gitlab"}), json!({"Name": "gitlab"})).is_err());
    }

    #[test]
    fn alternation_stays_anchored() {
        let policy = json!({"Driver": "docker|exec"});
        assert!(check(json!({"Driver": "exec"}), policy.clone()).is_ok());
        assert!(check(json!({"Driver": "raw_exec"}), policy).is_err());
    }

    #[test]
    fn missing_and_null_keys_are_skipped() {
        let policy = json!({"Name": "^svc$", "Type": "^service$"});
        assert!(check(json!({"Name": "svc"}), policy.clone()).is_ok());
        assert!(check(json!({"Name": "svc", "Type": null}), policy).is_ok());
    }

    #[test]
    fn null_vault_block_is_skipped() {
        let policy = json!({
            "TaskGroups": [{"Tasks": [{"Vault": {"Policies": ["^read-"]}}]}]
        });
        let actual = json!({
            "TaskGroups": [{"Tasks": [{"Name": "server", "Vault": null}]}]
        });

        assert!(check(actual, policy).is_ok());
    }

    #[test]
    fn one_exemplar_checks_every_element() {
        let policy = json!({
            "TaskGroups": [{"Tasks": [{"Config": {"volumes": ["^/srv/"]}}]}]
        });
        let actual = json!({
            "TaskGroups": [{"Tasks": [{"Config": {
                "volumes": ["/srv/a:/a", "/srv/b:/b", "/etc:/etc"]
            }}]}]
        });

        assert_eq!(
            check(actual, policy),
            Err("ROOT.TaskGroups.0.Tasks.0.Config.volumes.2".to_owned())
        );
    }

    #[test]
    fn empty_array_and_empty_map_do_not_constrain() {
        assert!(check(json!({"Tags": ["anything", 1]}), json!({"Tags": []})).is_ok());
        assert!(check(json!({"Meta": {"owner": "ci"}}), json!({"Meta": {}})).is_ok());
        assert!(check(json!({"anything": 1}), json!({})).is_ok());
    }

    #[test]
    fn integer_leaves_need_exact_equality() {
        assert!(check(json!({"Count": 2}), json!({"Count": 2})).is_ok());
        assert_eq!(
            check(json!({"Count": 3}), json!({"Count": 2})),
            Err("ROOT.Count".to_owned())
        );
        assert!(check(json!({"Count": "2"}), json!({"Count": 2})).is_err());
    }

    #[test]
    fn structural_mismatches_fail_at_path() {
        assert_eq!(
            check(json!({"TaskGroups": "web"}), json!({"TaskGroups": [{"Name": "web"}]})),
            Err("ROOT.TaskGroups".to_owned())
        );
        assert_eq!(
            check(json!({"Config": ["x"]}), json!({"Config": {"image": "x"}})),
            Err("ROOT.Config".to_owned())
        );
        assert_eq!(
            check(json!({"Name": 5}), json!({"Name": "x"})),
            Err("ROOT.Name".to_owned())
        );
    }

    #[test]
    fn invalid_pattern_is_rejected_before_matching() {
        let result = check(json!({"Name": "svc"}), json!({"Name": "(unclosed"}));
        assert!(matches!(result, Err(message) if message.contains("invalid pattern")));
    }

    #[test]
    fn first_mismatch_is_reported() {
        let policy = json!({"Name": "^a$", "Type": "^b$"});
        assert_eq!(
            check(json!({"Name": "x", "Type": "y"}), policy),
            Err("ROOT.Name".to_owned())
        );
    }

    proptest! {
        #[test]
        fn escaped_literal_matches_any_extension(prefix in "[a-z0-9-]{1,12}", suffix in "[a-z0-9-]{0,12}") {
            let pattern = regex::escape(&prefix);
            let actual = json!({"Name": format!("{prefix}{suffix}")});
            let policy = json!({"Name": pattern.clone()});
            let prefixed = check(actual.clone(), policy);
            prop_assert!(prefixed.is_ok());

            let anchored = check(actual, json!({"Name": format!("{pattern}$")}));
            prop_assert_eq!(anchored.is_ok(), suffix.is_empty());
        }

        #[test]
        fn array_exemplar_applies_to_all_elements(items in proptest::collection::vec(prop_oneof![Just("ok"), Just("no")], 0..8)) {
            let result = check(json!({"Tags": items.clone()}), json!({"Tags": ["^ok$"]}));
            prop_assert_eq!(result.is_ok(), items.iter().all(|item| *item == "ok"));
        }
    }
}
