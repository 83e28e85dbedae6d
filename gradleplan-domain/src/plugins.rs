use crate::error::{PluginViolation, ResolveError};
use gradleplan_types::document::PluginDeclaration;
use std::collections::BTreeMap;
use tracing::debug;

pub const ANDROID_APPLICATION: &str = "com.android.application";
pub const ANDROID_LIBRARY: &str = "com.android.library";
pub const KOTLIN_ANDROID: &str = "kotlin-android";
pub const GOOGLE_SERVICES: &str = "com.google.gms.google-services";
pub const FLUTTER_GRADLE: &str = "dev.flutter.flutter-gradle-plugin";

const ANDROID_PLATFORM: &[&str] = &[ANDROID_APPLICATION, ANDROID_LIBRARY];

/// Ordering constraint for one plugin.
#[derive(Debug, Clone, Copy)]
pub struct OrderingRule {
    pub plugin: &'static str,
    /// At least one of these must be declared earlier.
    pub requires_one_of: &'static [&'static str],
    /// Each of these, when declared, must come earlier.
    pub after_if_present: &'static [&'static str],
}

pub const ORDERING_RULES: &[OrderingRule] = &[
    OrderingRule {
        plugin: KOTLIN_ANDROID,
        requires_one_of: ANDROID_PLATFORM,
        after_if_present: &[],
    },
    OrderingRule {
        plugin: GOOGLE_SERVICES,
        requires_one_of: ANDROID_PLATFORM,
        after_if_present: &[],
    },
    OrderingRule {
        plugin: FLUTTER_GRADLE,
        requires_one_of: ANDROID_PLATFORM,
        after_if_present: &[KOTLIN_ANDROID],
    },
];

/// Map plugin aliases onto one id so duplicates and rules see through spelling differences.
pub fn canonical_plugin_id(id: &str) -> &str {
    match id.trim() {
        "org.jetbrains.kotlin.android" => KOTLIN_ANDROID,
        other => other,
    }
}

/// Check uniqueness and ordering of plugin declarations.
///
/// Returns the declarations sorted by applied order.
pub fn validate_plugins(
    declarations: &[PluginDeclaration],
) -> Result<Vec<PluginDeclaration>, ResolveError> {
    let mut ordered = declarations.to_vec();
    ordered.sort_by_key(|p| p.applied_order);

    let mut violations = Vec::new();
    let mut first_seen: BTreeMap<&str, u32> = BTreeMap::new();

    // Equal positions leave the application order undefined.
    for pair in ordered.windows(2) {
        if pair[0].applied_order == pair[1].applied_order {
            violations.push(PluginViolation::SharedPosition {
                first: pair[0].id.clone(),
                second: pair[1].id.clone(),
                position: pair[0].applied_order,
            });
        }
    }

    for p in &ordered {
        let id = canonical_plugin_id(&p.id);
        if id.is_empty() {
            violations.push(PluginViolation::EmptyId {
                position: p.applied_order,
            });
            continue;
        }
        if let Some(first) = first_seen.get(id) {
            violations.push(PluginViolation::Duplicate {
                id: p.id.clone(),
                first: *first,
                second: p.applied_order,
            });
            continue;
        }
        first_seen.insert(id, p.applied_order);
    }

    for p in &ordered {
        let id = canonical_plugin_id(&p.id);
        let Some(rule) = ORDERING_RULES.iter().find(|r| r.plugin == id) else {
            continue;
        };
        // Rules apply to the first declaration only; later ones are already duplicates.
        if first_seen.get(id) != Some(&p.applied_order) {
            continue;
        }
        check_rule(rule, p, &first_seen, &mut violations);
    }

    if violations.is_empty() {
        debug!(plugins = ordered.len(), "plugin declarations valid");
        Ok(ordered)
    } else {
        Err(ResolveError::PluginOrder { violations })
    }
}

fn check_rule(
    rule: &OrderingRule,
    p: &PluginDeclaration,
    seen: &BTreeMap<&str, u32>,
    violations: &mut Vec<PluginViolation>,
) {
    if !rule.requires_one_of.is_empty() {
        let declared: Vec<(&str, u32)> = rule
            .requires_one_of
            .iter()
            .filter_map(|req| seen.get(req).map(|pos| (*req, *pos)))
            .collect();

        match declared.iter().min_by_key(|(_, pos)| *pos) {
            None => violations.push(PluginViolation::MissingPrerequisite {
                id: p.id.clone(),
                position: p.applied_order,
                requires: rule.requires_one_of.iter().map(|s| s.to_string()).collect(),
            }),
            Some((req, pos)) if *pos > p.applied_order => {
                violations.push(PluginViolation::OutOfOrder {
                    id: p.id.clone(),
                    position: p.applied_order,
                    must_follow: req.to_string(),
                    prerequisite_position: *pos,
                })
            }
            Some(_) => {}
        }
    }

    for req in rule.after_if_present {
        if let Some(pos) = seen.get(req)
            && *pos > p.applied_order
        {
            violations.push(PluginViolation::OutOfOrder {
                id: p.id.clone(),
                position: p.applied_order,
                must_follow: req.to_string(),
                prerequisite_position: *pos,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decls(ids: &[&str]) -> Vec<PluginDeclaration> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| PluginDeclaration {
                id: id.to_string(),
                applied_order: i as u32,
            })
            .collect()
    }

    #[test]
    fn accepts_flutter_template_order() {
        let plugins = decls(&[
            ANDROID_APPLICATION,
            GOOGLE_SERVICES,
            KOTLIN_ANDROID,
            FLUTTER_GRADLE,
        ]);
        let ordered = validate_plugins(&plugins).expect("valid");
        assert_eq!(ordered, plugins);
    }

    #[test]
    fn kotlin_before_application_is_rejected() {
        let err = validate_plugins(&decls(&[KOTLIN_ANDROID, ANDROID_APPLICATION])).unwrap_err();
        let ResolveError::PluginOrder { violations } = err else {
            panic!("expected plugin order error");
        };
        assert_eq!(
            violations,
            vec![PluginViolation::OutOfOrder {
                id: KOTLIN_ANDROID.to_string(),
                position: 0,
                must_follow: ANDROID_APPLICATION.to_string(),
                prerequisite_position: 1,
            }]
        );
    }

    #[test]
    fn kotlin_without_platform_plugin_is_rejected() {
        let err = validate_plugins(&decls(&[KOTLIN_ANDROID])).unwrap_err();
        assert!(matches!(
            &err,
            ResolveError::PluginOrder { violations }
                if matches!(violations[0], PluginViolation::MissingPrerequisite { .. })
        ));
    }

    #[test]
    fn library_plugin_satisfies_platform_requirement() {
        assert!(validate_plugins(&decls(&[ANDROID_LIBRARY, KOTLIN_ANDROID])).is_ok());
    }

    #[test]
    fn duplicates_detected_through_aliases() {
        let err = validate_plugins(&decls(&[
            ANDROID_APPLICATION,
            KOTLIN_ANDROID,
            "org.jetbrains.kotlin.android",
        ]))
        .unwrap_err();
        let ResolveError::PluginOrder { violations } = err else {
            panic!("expected plugin order error");
        };
        assert_eq!(
            violations,
            vec![PluginViolation::Duplicate {
                id: "org.jetbrains.kotlin.android".to_string(),
                first: 1,
                second: 2,
            }]
        );
    }

    #[test]
    fn flutter_must_follow_kotlin_when_present() {
        let err = validate_plugins(&decls(&[
            ANDROID_APPLICATION,
            FLUTTER_GRADLE,
            KOTLIN_ANDROID,
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("must be declared after 'kotlin-android'"));

        // Without Kotlin the Flutter plugin only needs the platform plugin.
        assert!(validate_plugins(&decls(&[ANDROID_APPLICATION, FLUTTER_GRADLE])).is_ok());
    }

    #[test]
    fn sorts_by_applied_order() {
        let plugins = vec![
            PluginDeclaration {
                id: KOTLIN_ANDROID.to_string(),
                applied_order: 5,
            },
            PluginDeclaration {
                id: ANDROID_APPLICATION.to_string(),
                applied_order: 1,
            },
        ];
        let ordered = validate_plugins(&plugins).expect("valid");
        assert_eq!(ordered[0].id, ANDROID_APPLICATION);
    }

    #[test]
    fn shared_position_is_rejected() {
        let plugins = vec![
            PluginDeclaration {
                id: KOTLIN_ANDROID.to_string(),
                applied_order: 0,
            },
            PluginDeclaration {
                id: ANDROID_APPLICATION.to_string(),
                applied_order: 0,
            },
        ];
        let err = validate_plugins(&plugins).unwrap_err();
        let ResolveError::PluginOrder { violations } = err else {
            panic!("expected plugin order error");
        };
        assert_eq!(
            violations,
            vec![PluginViolation::SharedPosition {
                first: KOTLIN_ANDROID.to_string(),
                second: ANDROID_APPLICATION.to_string(),
                position: 0,
            }]
        );
    }

    #[test]
    fn empty_id_is_a_violation() {
        let err = validate_plugins(&decls(&[ANDROID_APPLICATION, "  "])).unwrap_err();
        assert_eq!(err.reasons(), vec!["plugin #1 has an empty id".to_string()]);
    }
}
