//! The mapping executor: applies a template to an input table.

use std::str::FromStr;

use log::debug;

use crate::{Error, Lookups, Table, Template, Transform};

/// Apply a mapping template to an input table, producing the output table.
///
/// Output columns appear exactly in `output_schema` order. The output has
/// the same number of rows as the input, in the same order; the executor
/// never adds, removes or reorders rows. The result is fully determined by
/// the input table, the template and the contents of any lookup files at
/// call time.
pub fn apply_template(
    input: &Table,
    template: &Template,
    lookups: &Lookups,
) -> Result<Table, Error> {
    let rows = input.rows();
    let mut output = Table::new();

    for column in &template.output_schema {
        let spec = match template.mapping.get(column) {
            Some(spec) => spec,
            None => {
                // No mapping entry: a constant if one is declared, otherwise
                // the missing-value literal.
                let value = template
                    .constants
                    .get(column)
                    .cloned()
                    .unwrap_or_else(|| template.missing.value.clone());
                output.push_column(column, vec![value; rows]);
                continue;
            }
        };

        // Base series: the named input column, or empty strings when the
        // name is absent from the input. Absence is not an error.
        let mut series: Vec<String> = match spec.from.as_deref().and_then(|name| input.column(name))
        {
            Some(cells) => cells.to_vec(),
            None => vec![String::new(); rows],
        };

        for name in &spec.transforms {
            let transform = Transform::from_str(name)?;
            series = series.iter().map(|cell| transform.apply(cell)).collect();
        }

        // A lookup replaces whatever the transform pipeline produced for
        // this column; keys with no match become empty strings.
        if let Some(lookup) = &spec.lookup {
            let map = lookups.get_map(&lookup.file, &lookup.key, &lookup.value)?;
            let keys = match input.column(&lookup.key) {
                Some(cells) => cells.to_vec(),
                None => vec![String::new(); rows],
            };
            series = keys
                .iter()
                .map(|key| map.get(key).cloned().unwrap_or_default())
                .collect();
        }

        debug!("Mapped output column {} ({} rows)", column, series.len());
        output.push_column(column, series);
    }

    if template.missing.is_fill() {
        output.fill_missing(&template.missing.value);
    }
    Ok(output)
}

/// The input columns a template references (as `from` sources or lookup
/// keys) that are absent from the given table, in schema order.
///
/// Absent columns silently degrade to empty series during mapping, so this
/// check is purely advisory: it flags a probably-wrong input file without
/// stopping anything.
pub fn missing_source_columns(input: &Table, template: &Template) -> Vec<String> {
    let mut missing = Vec::new();
    for column in &template.output_schema {
        let spec = match template.mapping.get(column) {
            Some(spec) => spec,
            None => continue,
        };
        let mut wanted = Vec::new();
        if let Some(from) = &spec.from {
            wanted.push(from);
        }
        if let Some(lookup) = &spec.lookup {
            wanted.push(&lookup.key);
        }
        for name in wanted {
            if input.column(name).is_none() && !missing.contains(name) {
                missing.push(name.clone());
            }
        }
    }
    missing
}
