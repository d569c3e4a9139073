//! Merge engine: many sheet models in, one dataset out.

use std::collections::HashSet;

use splitkit_io_xlsx::{Dataset, EnumCellValue, StyleSource};

use crate::partition::{compare_rows, resolve_field_indices};
use crate::spec::{EnumJobWarning, EnumKeepFields, JobError};

/// Concatenated rows plus the style template chosen for them.
#[derive(Debug, Clone)]
pub struct SpecMergeResult {
    /// Rows of every model in input order, sorted afterwards when requested.
    pub dataset: Dataset,
    /// First model; its formatting is reused for the output.
    pub style_source: StyleSource,
    /// Non-fatal diagnostics.
    pub warnings: Vec<EnumJobWarning>,
}

/// Concatenate `l_models` into one dataset.
///
/// Retained columns are the first model's columns that are also requested
/// (all of them when nothing is requested for its sheet). A later model
/// lacking a retained column contributes nulls for it. Sorting is applied
/// once, after concatenation.
pub fn merge(
    l_models: &[StyleSource],
    keep_fields: &EnumKeepFields,
    sort_fields: &[String],
) -> Result<SpecMergeResult, JobError> {
    let Some(model_first) = l_models.first() else {
        return Err(JobError::NoData(
            "no input was read successfully".to_string(),
        ));
    };

    let l_columns = derive_retained_columns(model_first, keep_fields.fields_for(&model_first.sheet_name))?;
    let l_sort = resolve_field_indices(&l_columns, sort_fields, &model_first.sheet_name)?;

    let mut warnings = Vec::new();
    let mut rows: Vec<Vec<EnumCellValue>> = Vec::new();
    for model in l_models {
        let l_keep_own = keep_fields.fields_for(&model.sheet_name);
        let l_src_idx: Vec<Option<usize>> = l_columns
            .iter()
            .map(|c_name| {
                let if_requested = l_keep_own.is_empty() || l_keep_own.contains(c_name);
                model.column_index(c_name).filter(|_| if_requested)
            })
            .collect();

        let l_missing: Vec<String> = l_columns
            .iter()
            .zip(&l_src_idx)
            .filter(|(_, idx)| idx.is_none())
            .map(|(c_name, _)| c_name.clone())
            .collect();
        if !l_missing.is_empty() {
            log::warn!(
                "Input {} lacks field(s) {}; filling with nulls",
                model.source_label,
                l_missing.join(", ")
            );
            warnings.push(EnumJobWarning::MergeFieldsMissing {
                path: model.source_label.clone(),
                fields: l_missing,
            });
        }

        rows.extend(model.rows.iter().map(|row| {
            l_src_idx
                .iter()
                .map(|idx| {
                    idx.and_then(|c| row.get(c))
                        .cloned()
                        .unwrap_or(EnumCellValue::None)
                })
                .collect::<Vec<_>>()
        }));
    }

    if !l_sort.is_empty() {
        rows.sort_by(|a, b| compare_rows(a, b, &l_sort));
    }

    log::info!(
        "Merged {} input(s) into {} row(s) x {} column(s)",
        l_models.len(),
        rows.len(),
        l_columns.len()
    );
    Ok(SpecMergeResult {
        dataset: Dataset {
            columns: l_columns,
            rows,
        },
        style_source: StyleSource::clone(model_first),
        warnings,
    })
}

fn derive_retained_columns(model_first: &StyleSource, l_requested: &[String]) -> Result<Vec<String>, JobError> {
    if l_requested.is_empty() {
        return Ok(model_first.columns.clone());
    }
    let mut set_seen: HashSet<String> = HashSet::new();
    let l_columns: Vec<String> = l_requested
        .iter()
        .filter(|c| model_first.column_index(c).is_some())
        .filter(|c| set_seen.insert((*c).clone()))
        .cloned()
        .collect();
    if l_columns.is_empty() {
        return Err(JobError::FieldNotFound {
            field: l_requested[0].clone(),
            sheet: model_first.sheet_name.clone(),
        });
    }
    Ok(l_columns)
}
