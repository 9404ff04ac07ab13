//! Mapping templates: the declarative specification of a mapping job.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::Value as YamlValue;

use crate::{Error, Transform};

/// We use [`std::collections::BTreeMap`] as our default map structure.
pub type Map<K, V> = BTreeMap<K, V>;

/// The parsed specification of a mapping job.
///
/// A template is immutable once constructed: the executor never modifies
/// one, so a single instance can safely back any number of mapping runs.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    /// Schema version tag. Currently informational only.
    pub version: i64,
    /// Free-form identifier, also the basis of the on-disk filename.
    pub name: String,
    /// The output columns, in left-to-right output order.
    pub output_schema: Vec<String>,
    /// Per-output-column derivation rules. Output columns without an entry
    /// fall back to `constants`, then to the missing-value policy.
    #[serde(rename = "map")]
    pub mapping: Map<String, ColumnSpec>,
    /// Literal fallback values for unmapped output columns.
    pub constants: Map<String, String>,
    /// The table-wide fallback rule for absent output cells.
    pub missing: MissingPolicy,
}

/// How a single output column derives its values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnSpec {
    /// Input column to read as the base series. Absent, or naming a column
    /// the input table does not have, means a column of empty strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Transform names applied left-to-right to every cell of the base
    /// series.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<String>,
    /// When present, the lookup result replaces whatever the
    /// `from`/`transforms` pipeline produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupSpec>,
}

/// A keyed join against an external two-column lookup table.
#[derive(Debug, Clone, Serialize)]
pub struct LookupSpec {
    /// The delimited lookup file.
    pub file: PathBuf,
    /// Input column whose cells are the lookup keys.
    pub key: String,
    /// Lookup-file column providing the values.
    pub value: String,
}

/// The table-wide fallback rule for absent output cells. Only the `"fill"`
/// policy has any effect at present.
#[derive(Debug, Clone, Serialize)]
pub struct MissingPolicy {
    pub policy: String,
    pub value: String,
}

impl Default for MissingPolicy {
    fn default() -> Self {
        Self {
            policy: "fill".to_string(),
            value: String::new(),
        }
    }
}

impl MissingPolicy {
    /// Whether the executor should fill absent cells after mapping.
    pub fn is_fill(&self) -> bool {
        self.policy == "fill"
    }
}

impl Template {
    /// Parse a template from its YAML source text.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::project(&parse_document(text)?)
    }

    /// Read and parse a template from the given file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("while trying to read from {}", path.display()), e))?;
        Self::parse(&text)
    }

    // Project an untyped YAML document into the typed model. Optional
    // fields default; `output_schema` and `map` are required.
    fn project(doc: &YamlValue) -> Result<Self, Error> {
        let name = doc
            .get("name")
            .map(scalar_to_string)
            .unwrap_or_else(|| "template".to_string());
        let version = doc.get("version").and_then(YamlValue::as_i64).unwrap_or(1);
        let output_schema = doc
            .get("output_schema")
            .and_then(YamlValue::as_sequence)
            .ok_or_else(|| {
                Error::TemplateParse("missing or invalid \"output_schema\"".to_string())
            })?
            .iter()
            .map(scalar_to_string)
            .collect();
        let entries = doc
            .get("map")
            .and_then(YamlValue::as_mapping)
            .ok_or_else(|| Error::TemplateParse("missing or invalid \"map\"".to_string()))?;
        let mut mapping = Map::new();
        for (column, spec) in entries {
            let column = scalar_to_string(column);
            let spec = ColumnSpec::project(&column, spec)?;
            mapping.insert(column, spec);
        }
        let mut constants = Map::new();
        if let Some(entries) = doc.get("constants").and_then(YamlValue::as_mapping) {
            for (column, value) in entries {
                constants.insert(scalar_to_string(column), scalar_to_string(value));
            }
        }
        let missing = match doc.get("missing") {
            Some(m) if m.is_mapping() => MissingPolicy {
                policy: m
                    .get("policy")
                    .map(scalar_to_string)
                    .unwrap_or_else(|| "fill".to_string()),
                value: m.get("value").map(scalar_to_string).unwrap_or_default(),
            },
            _ => MissingPolicy::default(),
        };
        Ok(Self {
            version,
            name,
            output_schema,
            mapping,
            constants,
            missing,
        })
    }
}

impl ColumnSpec {
    fn project(column: &str, spec: &YamlValue) -> Result<Self, Error> {
        if !spec.is_mapping() {
            return Err(Error::TemplateParse(format!(
                "map.{} must be an object",
                column
            )));
        }
        let from = spec.get("from").map(scalar_to_string);
        let transforms = match spec.get("transforms") {
            Some(t) => t
                .as_sequence()
                .ok_or_else(|| {
                    Error::TemplateParse(format!("map.{}: transforms must be a list", column))
                })?
                .iter()
                .map(scalar_to_string)
                .collect(),
            None => Vec::new(),
        };
        let lookup = match spec.get("lookup") {
            Some(lk) => Some(LookupSpec::project(column, lk)?),
            None => None,
        };
        Ok(Self {
            from,
            transforms,
            lookup,
        })
    }
}

impl LookupSpec {
    fn project(column: &str, lookup: &YamlValue) -> Result<Self, Error> {
        let field = |name: &str| {
            lookup.get(name).map(scalar_to_string).ok_or_else(|| {
                Error::TemplateParse(format!("map.{}: lookup needs a \"{}\"", column, name))
            })
        };
        Ok(Self {
            file: PathBuf::from(field("file")?),
            key: field("key")?,
            value: field("value")?,
        })
    }
}

/// The outcome of validating a template's source text.
///
/// Validation never fails outright for a structurally-bad-but-parseable
/// document: it collects every problem it finds instead.
#[derive(Debug, Clone)]
pub struct Validation {
    problems: Vec<String>,
    document: YamlValue,
}

impl Validation {
    /// Returns whether the validated text is a usable template.
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    /// The problems found, in document order.
    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    /// The parsed (but untyped) document behind the validated text.
    pub fn document(&self) -> &YamlValue {
        &self.document
    }

    /// A human-readable summary of the outcome.
    pub fn message(&self) -> String {
        if self.is_valid() {
            "Valid template".to_string()
        } else {
            self.problems.join(" \u{2022} ")
        }
    }
}

/// Check template source text for required keys and known transform names.
///
/// Fails only when the text cannot be parsed as YAML at all; every
/// structural problem is reported through the returned [`Validation`].
pub fn validate(text: &str) -> Result<Validation, Error> {
    let document = parse_document(text)?;
    let mut problems = Vec::new();
    for key in ["version", "name", "output_schema", "map"] {
        if document.get(key).is_none() {
            problems.push(format!("Missing '{}'", key));
        }
    }
    if let Some(schema) = document.get("output_schema") {
        if !schema.is_sequence() {
            problems.push("output_schema must be a list".to_string());
        }
    }
    if let Some(map) = document.get("map").and_then(YamlValue::as_mapping) {
        for (column, spec) in map {
            let column = scalar_to_string(column);
            if !spec.is_mapping() {
                problems.push(format!("map.{} must be an object", column));
                continue;
            }
            if let Some(transforms) = spec.get("transforms").and_then(YamlValue::as_sequence) {
                for name in transforms {
                    let name = scalar_to_string(name);
                    if !Transform::is_registered(&name) {
                        problems.push(format!("Unknown transform '{}' in map.{}", name, column));
                    }
                }
            }
        }
    }
    Ok(Validation { problems, document })
}

// An empty document is treated as a null value rather than a parse error,
// so that validation can report the missing keys individually.
fn parse_document(text: &str) -> Result<YamlValue, Error> {
    if text.trim().is_empty() {
        return Ok(YamlValue::Null);
    }
    serde_yaml::from_str(text).map_err(|e| Error::TemplateParse(format!("YAML error: {}", e)))
}

// Scalars keep their literal text form: everything is text to the engine.
pub(crate) fn scalar_to_string(value: &YamlValue) -> String {
    match value {
        YamlValue::String(s) => s.clone(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FULL: &str = r#"
version: 1
name: orders
output_schema: [id, sku, qty, price_pennies, segment, channel]
map:
  id:
    from: ID
    transforms: [trim]
  sku:
    from: SKU
    transforms: [upper]
  qty:
    from: QTY
    transforms: [digits_only]
  price_pennies:
    from: PRICE
    transforms: [currency_to_minor]
  segment:
    lookup:
      file: lookups/segments.csv
      key: CUST_ID
      value: SEGMENT
constants:
  channel: web
missing:
  policy: fill
  value: "n/a"
"#;

    #[test]
    fn parse_full_template() {
        let template = Template::parse(FULL).unwrap();
        assert_eq!(template.version, 1);
        assert_eq!(template.name, "orders");
        assert_eq!(
            template.output_schema,
            vec!["id", "sku", "qty", "price_pennies", "segment", "channel"]
        );
        assert_eq!(template.mapping.len(), 5);
        let segment = &template.mapping["segment"];
        assert!(segment.from.is_none());
        let lookup = segment.lookup.as_ref().unwrap();
        assert_eq!(lookup.file, PathBuf::from("lookups/segments.csv"));
        assert_eq!(lookup.key, "CUST_ID");
        assert_eq!(lookup.value, "SEGMENT");
        assert_eq!(template.constants["channel"], "web");
        assert!(template.missing.is_fill());
        assert_eq!(template.missing.value, "n/a");
    }

    #[test]
    fn parse_applies_defaults() {
        let template = Template::parse("output_schema: [a]\nmap: {}\n").unwrap();
        assert_eq!(template.name, "template");
        assert_eq!(template.version, 1);
        assert!(template.constants.is_empty());
        assert!(template.missing.is_fill());
        assert_eq!(template.missing.value, "");
    }

    #[test]
    fn parse_rejects_unparseable_yaml() {
        match Template::parse("a: [unclosed") {
            Err(Error::TemplateParse(msg)) => assert!(msg.starts_with("YAML error")),
            other => panic!("expected TemplateParse, but got {:?}", other),
        }
    }

    #[test]
    fn parse_requires_schema_and_map() {
        assert!(matches!(
            Template::parse("map: {}\n"),
            Err(Error::TemplateParse(_))
        ));
        assert!(matches!(
            Template::parse("output_schema: [a]\n"),
            Err(Error::TemplateParse(_))
        ));
    }

    #[test]
    fn validate_accepts_a_complete_template() {
        let validation = validate(FULL).unwrap();
        assert!(validation.is_valid());
        assert_eq!(validation.message(), "Valid template");
    }

    #[test]
    fn validate_reports_each_missing_key() {
        let validation = validate("constants: {}\n").unwrap();
        assert!(!validation.is_valid());
        assert_eq!(
            validation.problems(),
            &[
                "Missing 'version'",
                "Missing 'name'",
                "Missing 'output_schema'",
                "Missing 'map'"
            ]
        );
    }

    #[test]
    fn validate_reports_non_list_schema_and_scalar_specs() {
        let text = "version: 1\nname: t\noutput_schema: nope\nmap:\n  id: just-a-string\n";
        let validation = validate(text).unwrap();
        assert_eq!(
            validation.problems(),
            &["output_schema must be a list", "map.id must be an object"]
        );
    }

    #[test]
    fn validate_names_unknown_transforms_and_their_columns() {
        let text = "version: 1\nname: t\noutput_schema: [id]\nmap:\n  id:\n    from: ID\n    transforms: [trim, reverse]\n";
        let validation = validate(text).unwrap();
        assert_eq!(
            validation.problems(),
            &["Unknown transform 'reverse' in map.id"]
        );
        assert!(validation.message().contains("reverse"));
    }

    #[test]
    fn validate_only_fails_on_unparseable_text() {
        assert!(validate("{{{{").is_err());
        assert_eq!(validate("").unwrap().problems().len(), 4);
    }
}
