//! Build planning.
//!
//! The planner expands a package descriptor into the ordered list of
//! build units a run must execute. It is pure: no filesystem, no
//! resolver, no clock. Everything downstream (environment caching, the
//! build loop, installs) keys off the units produced here.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::{PackageDescriptor, Requirement};
use crate::util::fsname::encode_filesystem_name;

/// One unit of build work: a variant, or the whole package when no
/// variants are declared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildUnit {
    /// Position of the variant in the descriptor; `None` for the
    /// variant-less unit
    pub index: Option<usize>,

    /// Directory of this unit relative to the build root (and, on
    /// install, the package install root); empty for the variant-less
    /// unit
    pub subdirectory: PathBuf,

    /// Full requirement list: build requirements, then runtime
    /// requirements, then the variant's own tokens
    pub requirements: Vec<Requirement>,
}

/// Expand a descriptor into its build units, in declaration order.
pub fn plan_builds(descriptor: &PackageDescriptor) -> Vec<BuildUnit> {
    let base: Vec<Requirement> = descriptor
        .package
        .build_requires
        .iter()
        .chain(&descriptor.package.requires)
        .cloned()
        .collect();

    if descriptor.package.variants.is_empty() {
        return vec![BuildUnit {
            index: None,
            subdirectory: PathBuf::new(),
            requirements: base,
        }];
    }

    descriptor
        .package
        .variants
        .iter()
        .enumerate()
        .map(|(index, variant)| {
            let mut requirements = base.clone();
            requirements.extend(variant.iter().cloned());

            let mut subdirectory = PathBuf::new();
            for token in variant {
                subdirectory.push(encode_filesystem_name(token.as_str()));
            }

            BuildUnit {
                index: Some(index),
                subdirectory,
                requirements,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    fn descriptor(content: &str) -> PackageDescriptor {
        PackageDescriptor::parse(content, Path::new("package.toml")).unwrap()
    }

    #[test]
    fn test_no_variants_yields_single_unit() {
        let desc = descriptor(
            r#"
[package]
name = "foo"
requires = ["bar-1.2"]
build_requires = ["cmake-3"]
"#,
        );

        let units = plan_builds(&desc);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].index, None);
        assert_eq!(units[0].subdirectory, PathBuf::new());

        // Build requirements come before runtime requirements
        let tokens: Vec<&str> = units[0].requirements.iter().map(|r| r.as_str()).collect();
        assert_eq!(tokens, vec!["cmake-3", "bar-1.2"]);
    }

    #[test]
    fn test_one_unit_per_variant_in_declaration_order() {
        let desc = descriptor(
            r#"
[package]
name = "foo"
requires = ["bar-1.2"]
variants = [["python-2.7"], ["python-3.11"]]
"#,
        );

        let units = plan_builds(&desc);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].index, Some(0));
        assert_eq!(units[1].index, Some(1));
        assert_eq!(units[0].subdirectory, PathBuf::from("python_2d2_2e7"));
        assert_eq!(units[1].subdirectory, PathBuf::from("python_2d3_2e11"));

        let tokens: Vec<&str> = units[0].requirements.iter().map(|r| r.as_str()).collect();
        assert_eq!(tokens, vec!["bar-1.2", "python-2.7"]);
    }

    #[test]
    fn test_multi_token_variant_nests_subdirectories() {
        let desc = descriptor(
            r#"
[package]
name = "foo"
variants = [["python-2.7", "qt-5"]]
"#,
        );

        let units = plan_builds(&desc);
        assert_eq!(
            units[0].subdirectory,
            Path::new("python_2d2_2e7").join("qt_2d5")
        );
    }

    #[test]
    fn test_variant_subdirectories_are_unique() {
        let desc = descriptor(
            r#"
[package]
name = "foo"
variants = [["python-2.7"], ["python-2.7.1"], ["python_2.7"]]
"#,
        );

        let units = plan_builds(&desc);
        let subdirs: HashSet<&PathBuf> = units.iter().map(|u| &u.subdirectory).collect();
        assert_eq!(subdirs.len(), units.len());
    }

    #[test]
    fn test_units_serialize_for_plan_output() {
        let desc = descriptor(
            r#"
[package]
name = "foo"
requires = ["bar-1.2"]
variants = [["python-2.7"]]
"#,
        );

        let units = plan_builds(&desc);
        let json = serde_json::to_value(&units).unwrap();
        assert_eq!(json[0]["index"], 0);
        assert_eq!(json[0]["requirements"][1], "python-2.7");
    }
}
