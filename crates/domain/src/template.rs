use std::collections::BTreeMap;
use std::sync::LazyLock;

use nomadgate_core::PolicyPath;

use crate::policy::{PolicyDoc, PolicyPattern, PolicyViolation};

static JOB_CLAIMS_TEMPLATE: LazyLock<PolicyDoc> = LazyLock::new(|| {
    let config = map([
        ("network_mode", text()),
        ("image", text()),
        ("network_aliases", list(text())),
        ("port_map", list(map([]))),
        ("volumes", list(text())),
    ]);
    let task = map([
        ("Name", text()),
        ("Driver", text()),
        ("User", text()),
        ("Config", config),
        ("Vault", map([("Policies", list(text()))])),
    ]);
    let task_group = map([("Name", text()), ("Tasks", list(task))]);

    map([
        ("Name", text()),
        ("Type", text()),
        ("TaskGroups", list(task_group)),
    ])
});

/// Returns the fixed shape every job-claims policy must conform to.
#[must_use]
pub fn job_claims_template() -> &'static PolicyDoc {
    &JOB_CLAIMS_TEMPLATE
}

/// Checks that `doc` only uses keys and nesting declared by `template`.
///
/// Template keys are optional. Arrays in `doc` may hold at most one exemplar.
/// Reports the first offending path.
pub fn validate_against_template(
    doc: &PolicyDoc,
    template: &PolicyDoc,
) -> Result<(), PolicyViolation> {
    validate_at(doc, template, &PolicyPath::root())
}

fn validate_at(
    doc: &PolicyDoc,
    template: &PolicyDoc,
    path: &PolicyPath,
) -> Result<(), PolicyViolation> {
    match template {
        PolicyDoc::Map(template_fields) => {
            let PolicyDoc::Map(fields) = doc else {
                return Err(PolicyViolation::new(
                    path.clone(),
                    format!("expected a map, found {}", doc.kind()),
                ));
            };

            for (key, template_value) in template_fields {
                let Some(value) = fields.get(key) else {
                    continue;
                };

                let key_path = path.key(key);
                if value.kind() != template_value.kind() {
                    return Err(PolicyViolation::new(
                        key_path,
                        format!("expected {}, found {}", template_value.kind(), value.kind()),
                    ));
                }

                if matches!(template_value, PolicyDoc::Map(_) | PolicyDoc::Array(_)) {
                    validate_at(value, template_value, &key_path)?;
                }
            }

            if let Some(unknown) = fields.keys().find(|key| !template_fields.contains_key(*key)) {
                return Err(PolicyViolation::new(
                    path.clone(),
                    format!("key '{unknown}' is not allowed here"),
                ));
            }

            Ok(())
        }
        PolicyDoc::Array(exemplars) => {
            let PolicyDoc::Array(items) = doc else {
                return Err(PolicyViolation::new(
                    path.clone(),
                    format!("expected an array, found {}", doc.kind()),
                ));
            };

            if items.len() > 1 {
                return Err(PolicyViolation::new(
                    path.clone(),
                    format!("arrays hold at most one exemplar, found {}", items.len()),
                ));
            }

            let Some(exemplar) = exemplars.first() else {
                return Ok(());
            };

            let structural = match exemplar {
                PolicyDoc::Array(_) => true,
                PolicyDoc::Map(fields) => !fields.is_empty(),
                PolicyDoc::Pattern(_) | PolicyDoc::Exact(_) => false,
            };

            for (index, item) in items.iter().enumerate() {
                let item_path = path.index(index);
                if structural {
                    validate_at(item, exemplar, &item_path)?;
                } else if item.kind() != exemplar.kind() {
                    return Err(PolicyViolation::new(
                        item_path,
                        format!("expected {}, found {}", exemplar.kind(), item.kind()),
                    ));
                }
            }

            Ok(())
        }
        PolicyDoc::Pattern(_) | PolicyDoc::Exact(_) => Ok(()),
    }
}

// Only the leaf kind is compared; an empty pattern always compiles.
fn text() -> PolicyDoc {
    PolicyPattern::new("")
        .map(PolicyDoc::Pattern)
        .unwrap_or_else(|_| PolicyDoc::Map(BTreeMap::new()))
}

fn list(exemplar: PolicyDoc) -> PolicyDoc {
    PolicyDoc::Array(vec![exemplar])
}

fn map<const N: usize>(fields: [(&str, PolicyDoc); N]) -> PolicyDoc {
    PolicyDoc::Map(
        fields
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value))
            .collect::<BTreeMap<_, _>>(),
    )
}
