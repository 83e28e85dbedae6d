use crate::error::{DependencyIssue, ResolveError};
use crate::ports::BomCatalog;
use gradleplan_types::document::{ArtifactId, BomRef, DependencyDeclaration, VersionConstraint};
use gradleplan_types::plan::{ResolvedDependency, VersionOrigin};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Dependencies with every version pinned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependencies {
    /// Imported BOMs, deduplicated, in declaration order.
    pub boms: Vec<BomRef>,
    /// Resolved entries in declaration order; repeated `(configuration, artifact)` pairs collapse.
    pub dependencies: Vec<ResolvedDependency>,
}

/// Expand BOM imports into concrete versions and check for conflicts.
pub fn resolve_dependencies(
    declarations: &[DependencyDeclaration],
    bom_refs: &[BomRef],
    catalog: &dyn BomCatalog,
) -> Result<ResolvedDependencies, ResolveError> {
    let mut issues = Vec::new();

    let boms = dedup_boms(bom_refs, &mut issues);
    let (managed, unknown_boms) = managed_versions(&boms, catalog, &mut issues);
    check_explicit_versions(declarations, &mut issues);

    let mut seen: BTreeSet<(String, ArtifactId)> = BTreeSet::new();
    let mut dependencies = Vec::new();

    for decl in declarations {
        let pinned = managed.get(&decl.artifact);
        let resolved = match (&decl.version, pinned) {
            (VersionConstraint::Explicit(v), Some((managed_v, bom))) if v != managed_v => {
                issues.push(DependencyIssue::BomVersionMismatch {
                    artifact: decl.artifact.clone(),
                    explicit: v.clone(),
                    managed: managed_v.clone(),
                    bom: bom.clone(),
                });
                continue;
            }
            (VersionConstraint::Explicit(v), _) => ResolvedDependency {
                configuration: decl.configuration.clone(),
                artifact: decl.artifact.clone(),
                version: v.clone(),
                origin: VersionOrigin::Explicit,
            },
            (VersionConstraint::FromBom, Some((managed_v, bom))) => ResolvedDependency {
                configuration: decl.configuration.clone(),
                artifact: decl.artifact.clone(),
                version: managed_v.clone(),
                origin: VersionOrigin::Bom { bom: bom.clone() },
            },
            (VersionConstraint::FromBom, None) => {
                // An unknown BOM may well manage it; that issue is already reported.
                if !unknown_boms {
                    issues.push(DependencyIssue::Unmanaged {
                        artifact: decl.artifact.clone(),
                    });
                }
                continue;
            }
        };

        if seen.insert((resolved.configuration.clone(), resolved.artifact.clone())) {
            dependencies.push(resolved);
        }
    }

    if !issues.is_empty() {
        return Err(ResolveError::DependencyConflict { issues });
    }

    debug!(
        boms = boms.len(),
        dependencies = dependencies.len(),
        "dependencies resolved"
    );
    Ok(ResolvedDependencies { boms, dependencies })
}

fn dedup_boms(bom_refs: &[BomRef], issues: &mut Vec<DependencyIssue>) -> Vec<BomRef> {
    let mut versions: BTreeMap<&ArtifactId, BTreeSet<&str>> = BTreeMap::new();
    let mut out: Vec<BomRef> = Vec::new();

    for bom in bom_refs {
        versions
            .entry(&bom.artifact)
            .or_default()
            .insert(bom.version.as_str());
        if !out
            .iter()
            .any(|b| b.artifact == bom.artifact && b.version == bom.version)
        {
            out.push(bom.clone());
        }
    }

    for (artifact, vs) in versions {
        if vs.len() > 1 {
            issues.push(DependencyIssue::DuplicateBom {
                bom: artifact.clone(),
                versions: vs.into_iter().map(String::from).collect(),
            });
        }
    }

    out
}

/// Artifact -> (version, BOM coordinate). The flag is set when some BOM was not in the catalog.
fn managed_versions(
    boms: &[BomRef],
    catalog: &dyn BomCatalog,
    issues: &mut Vec<DependencyIssue>,
) -> (BTreeMap<ArtifactId, (String, String)>, bool) {
    let mut managed: BTreeMap<ArtifactId, (String, String)> = BTreeMap::new();
    let mut overlaps: BTreeMap<ArtifactId, BTreeSet<String>> = BTreeMap::new();
    let mut unknown = false;

    for bom in boms {
        let coordinate = bom.coordinate();
        let Some(members) = catalog.members(bom) else {
            issues.push(DependencyIssue::UnknownBom { bom: coordinate });
            unknown = true;
            continue;
        };

        for (artifact, version) in members {
            match managed.get(&artifact) {
                Some((existing, existing_bom)) if *existing != version => {
                    let entry = overlaps.entry(artifact.clone()).or_default();
                    entry.insert(existing_bom.clone());
                    entry.insert(coordinate.clone());
                }
                Some(_) => {}
                None => {
                    managed.insert(artifact, (version, coordinate.clone()));
                }
            }
        }
    }

    for (artifact, boms) in overlaps {
        issues.push(DependencyIssue::OverlappingBoms {
            artifact,
            boms: boms.into_iter().collect(),
        });
    }

    (managed, unknown)
}

fn check_explicit_versions(declarations: &[DependencyDeclaration], issues: &mut Vec<DependencyIssue>) {
    let mut explicit: BTreeMap<&ArtifactId, BTreeSet<&str>> = BTreeMap::new();
    for decl in declarations {
        if let VersionConstraint::Explicit(v) = &decl.version {
            explicit.entry(&decl.artifact).or_default().insert(v.as_str());
        }
    }

    for (artifact, versions) in explicit {
        if versions.len() > 1 {
            issues.push(DependencyIssue::ConflictingVersions {
                artifact: artifact.clone(),
                versions: versions.into_iter().map(String::from).collect(),
            });
        }
    }
}
