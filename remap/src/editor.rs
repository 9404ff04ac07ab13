//! Helpers behind template editing: skeletons, slugs and persistence.
//!
//! These operate on a template's textual form, keeping file I/O and YAML
//! handling out of whatever front end drives them.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::template::scalar_to_string;
use crate::{validate, ColumnSpec, Error, LookupSpec, Map, MissingPolicy, Table, Template};

/// Convert a free-form template name into a safe filename slug.
///
/// `"My Cool Template!"` becomes `"my-cool-template"`; anything that slugs
/// down to nothing becomes `"template"`.
pub fn slugify<N: AsRef<str>>(name: N) -> String {
    let mut slug = String::new();
    for ch in name.as_ref().trim().to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "template".to_string()
    } else {
        slug.to_string()
    }
}

/// A ready-to-edit YAML skeleton for a new template, seeded with a small
/// worked example of every feature.
pub fn skeleton<N: AsRef<str>>(name: N) -> String {
    let mut mapping = Map::new();
    mapping.insert(
        "id".to_string(),
        ColumnSpec {
            from: Some("ID".to_string()),
            transforms: vec!["trim".to_string()],
            lookup: None,
        },
    );
    mapping.insert(
        "sku".to_string(),
        ColumnSpec {
            from: Some("SKU".to_string()),
            transforms: vec!["upper".to_string()],
            lookup: None,
        },
    );
    mapping.insert(
        "qty".to_string(),
        ColumnSpec {
            from: Some("QTY".to_string()),
            transforms: vec!["digits_only".to_string()],
            lookup: None,
        },
    );
    mapping.insert(
        "price_pennies".to_string(),
        ColumnSpec {
            from: Some("PRICE".to_string()),
            transforms: vec!["currency_to_minor".to_string()],
            lookup: None,
        },
    );
    mapping.insert(
        "segment".to_string(),
        ColumnSpec {
            from: None,
            transforms: Vec::new(),
            lookup: Some(LookupSpec {
                file: PathBuf::from("lookups/segments.csv"),
                key: "CUST_ID".to_string(),
                value: "SEGMENT".to_string(),
            }),
        },
    );
    let template = Template {
        version: 1,
        name: name.as_ref().to_string(),
        output_schema: ["id", "sku", "qty", "price_pennies", "segment"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        mapping,
        constants: Map::new(),
        missing: MissingPolicy::default(),
    };
    serde_yaml::to_string(&template).expect("a skeleton template always serializes")
}

/// Read an existing template file into its editable source text.
pub fn load_text<P: AsRef<Path>>(path: P) -> Result<String, Error> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("while trying to read from {}", path.display()), e))
}

/// Where a template ended up after a [`save`] call.
#[derive(Debug, Clone)]
pub struct SavedTemplate {
    /// The file the template text was written to.
    pub path: PathBuf,
    /// Whether the write fell back to the system temp directory because the
    /// requested directory was not writable.
    pub used_fallback: bool,
}

/// Validate template source text and persist it under the given directory.
///
/// The filename is a slug of the document's `name` plus a `.yaml`
/// extension. Invalid templates are refused. When the directory cannot be
/// written (read-only deployments), the template is written to the system
/// temp directory instead.
pub fn save<P: AsRef<Path>>(text: &str, dir: P) -> Result<SavedTemplate, Error> {
    let validation = validate(text)?;
    if !validation.is_valid() {
        return Err(Error::InvalidTemplate(validation.message()));
    }
    let name = validation
        .document()
        .get("name")
        .map(scalar_to_string)
        .unwrap_or_default();
    let filename = format!("{}.yaml", slugify(&name));
    let dest = dir.as_ref().join(&filename);
    match write_text(&dest, text) {
        Ok(()) => Ok(SavedTemplate {
            path: dest,
            used_fallback: false,
        }),
        Err(e) => {
            let fallback = std::env::temp_dir().join(&filename);
            warn!(
                "Could not write {} ({}); falling back to {}",
                dest.display(),
                e,
                fallback.display()
            );
            write_text(&fallback, text)?;
            Ok(SavedTemplate {
                path: fallback,
                used_fallback: true,
            })
        }
    }
}

/// Summarize a template's source as a table with one row per output column,
/// showing where each column's values come from.
pub fn summarize(text: &str) -> Result<Table, Error> {
    let template = Template::parse(text)?;
    let mut outputs = Vec::new();
    let mut froms = Vec::new();
    let mut transforms = Vec::new();
    let mut lookups = Vec::new();
    for column in &template.output_schema {
        let spec = template.mapping.get(column);
        outputs.push(column.clone());
        froms.push(spec.and_then(|s| s.from.clone()).unwrap_or_default());
        transforms.push(spec.map(|s| s.transforms.join(", ")).unwrap_or_default());
        lookups.push(
            spec.map(|s| s.lookup.is_some())
                .unwrap_or(false)
                .to_string(),
        );
    }
    let mut table = Table::new();
    table.push_column("output", outputs);
    table.push_column("from", froms);
    table.push_column("transforms", transforms);
    table.push_column("lookup?", lookups);
    Ok(table)
}

/// All template files (`*.yaml` and `*.yml`) directly under the given
/// directory, in sorted order.
pub fn list_templates<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for pattern in ["*.yaml", "*.yml"] {
        let pattern = dir.as_ref().join(pattern).to_string_lossy().into_owned();
        match glob::glob(&pattern) {
            Ok(entries) => paths.extend(entries.flatten()),
            Err(e) => warn!("Skipping template pattern \"{}\": {}", pattern, e),
        }
    }
    paths.sort();
    paths
}

fn write_text(path: &Path, text: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Io(format!("while creating {}", parent.display()), e))?;
        }
    }
    fs::write(path, text)
        .map_err(|e| Error::Io(format!("while trying to write to {}", path.display()), e))
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn slugify_flattens_punctuation_and_case() {
        assert_eq!(slugify("My Cool Template!"), "my-cool-template");
        assert_eq!(
            slugify("  spaces__and #! punctuation "),
            "spaces-and-punctuation"
        );
        assert_eq!(slugify("a--b"), "a-b");
        assert_eq!(slugify("!!!"), "template");
        assert_eq!(slugify(""), "template");
    }

    #[test]
    fn skeleton_is_a_valid_template() {
        let text = skeleton("my_template");
        let validation = validate(&text).unwrap();
        assert!(validation.is_valid(), "{}", validation.message());

        let template = Template::parse(&text).unwrap();
        assert_eq!(template.name, "my_template");
        assert_eq!(
            template.output_schema,
            vec!["id", "sku", "qty", "price_pennies", "segment"]
        );
        assert!(template.mapping["segment"].lookup.is_some());
    }

    #[test]
    fn save_writes_a_slugged_file() {
        let dir = tempfile::tempdir().unwrap();
        let saved = save(&skeleton("My Cool Template!"), dir.path()).unwrap();
        assert!(!saved.used_fallback);
        assert_eq!(
            saved.path,
            dir.path().join("my-cool-template.yaml")
        );
        let text = fs::read_to_string(&saved.path).unwrap();
        assert!(Template::parse(&text).is_ok());
    }

    #[test]
    fn save_refuses_invalid_templates() {
        let dir = tempfile::tempdir().unwrap();
        match save("name: broken\n", dir.path()) {
            Err(Error::InvalidTemplate(msg)) => {
                assert!(msg.contains("Missing 'output_schema'"));
            }
            other => panic!("expected InvalidTemplate, but got {:?}", other),
        }
        assert!(list_templates(dir.path()).is_empty());
    }

    #[test]
    fn summarize_lists_each_schema_column() {
        let summary = summarize(&skeleton("t")).unwrap();
        assert_eq!(
            summary.column_names(),
            &["output", "from", "transforms", "lookup?"]
        );
        assert_eq!(summary.rows(), 5);
        assert_eq!(summary.row(0), vec!["id", "ID", "trim", "false"]);
        assert_eq!(summary.row(4), vec!["segment", "", "", "true"]);
    }

    #[test]
    fn list_templates_finds_both_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "x").unwrap();
        fs::write(dir.path().join("b.yml"), "x").unwrap();
        fs::write(dir.path().join("c.txt"), "x").unwrap();
        let found = list_templates(dir.path());
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().unwrap() != "txt"));
    }
}
