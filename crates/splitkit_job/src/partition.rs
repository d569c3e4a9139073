//! Partition engine: one sheet model in, labelled datasets out.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use splitkit_io_xlsx::{Dataset, EnumCellValue, StyleSource, WorkbookModel, sanitize_label};

use crate::spec::{
    EnumJobWarning, EnumPartitionMode, JobError, SpecPartitionOutput, SpecPartitionPlan,
    SpecPartitionSpec,
};

/// Split `model` into output datasets according to `spec`.
///
/// Sorting is stable and applied before grouping, so each output keeps the
/// sorted (or original) relative row order. Rows are grouped by the
/// normalized split value; outputs follow first-occurrence order in value
/// mode and group order in custom mode.
pub fn partition(
    model: &StyleSource,
    spec: &SpecPartitionSpec,
) -> Result<SpecPartitionPlan, JobError> {
    let n_col_split = model
        .column_index(&spec.split_field)
        .ok_or_else(|| JobError::FieldNotFound {
            field: spec.split_field.clone(),
            sheet: model.sheet_name.clone(),
        })?;
    let l_keep = resolve_projection(&model.columns, &spec.keep_fields, &model.sheet_name)?;
    let l_sort = resolve_field_indices(&model.columns, &spec.sort_fields, &model.sheet_name)?;

    let l_order = derive_sorted_order(&model.rows, &l_sort);
    let l_values: Vec<String> = model
        .column_values(n_col_split)
        .map(EnumCellValue::to_normalized_string)
        .collect();

    let l_columns: Vec<String> = l_keep.iter().map(|&c| model.columns[c].clone()).collect();
    let build_output = |label: String, l_row_idx: &[usize]| SpecPartitionOutput {
        label,
        dataset: project_rows(model, &l_columns, &l_keep, l_row_idx),
        style_source: StyleSource::clone(model),
    };

    let mut plan = SpecPartitionPlan::default();
    match spec.mode {
        EnumPartitionMode::OneFilePerValue => {
            for (c_value, l_row_idx) in group_by_value(&l_order, &l_values) {
                plan.l_outputs
                    .push(build_output(sanitize_label(&c_value), &l_row_idx));
            }
        }
        EnumPartitionMode::CustomGroups => {
            let mut set_assigned: HashSet<&str> = HashSet::new();
            for (c_group, l_members) in &spec.l_groups {
                let set_members: HashSet<&str> = l_members.iter().map(String::as_str).collect();
                set_assigned.extend(set_members.iter().copied());
                let l_row_idx: Vec<usize> = l_order
                    .iter()
                    .copied()
                    .filter(|&i| set_members.contains(l_values[i].as_str()))
                    .collect();
                if l_row_idx.is_empty() {
                    log::warn!("Group {c_group:?} matched no rows; no file produced");
                    plan.warnings.push(EnumJobWarning::EmptyGroup(c_group.clone()));
                    continue;
                }
                plan.l_outputs
                    .push(build_output(sanitize_label(c_group), &l_row_idx));
            }

            let l_unassigned_rows: Vec<usize> = l_order
                .iter()
                .copied()
                .filter(|&i| !set_assigned.contains(l_values[i].as_str()))
                .collect();
            plan.l_unassigned = derive_distinct_in_order(
                (0..l_values.len()).filter(|&i| !set_assigned.contains(l_values[i].as_str())),
                &l_values,
            );
            if !plan.l_unassigned.is_empty() {
                log::warn!(
                    "{} value(s) of {:?} belong to no group: {}",
                    plan.l_unassigned.len(),
                    spec.split_field,
                    plan.l_unassigned.join(", ")
                );
                plan.warnings.push(EnumJobWarning::UnassignedValues {
                    values: plan.l_unassigned.clone(),
                    n_rows: l_unassigned_rows.len(),
                });
                if let Some(c_catch_all) = &spec.unassigned_group {
                    plan.l_outputs
                        .push(build_output(sanitize_label(c_catch_all), &l_unassigned_rows));
                }
            }
        }
    }

    log::info!(
        "Partitioned sheet {:?} on {:?}: {} row(s) into {} output(s)",
        model.sheet_name,
        spec.split_field,
        model.n_rows(),
        plan.l_outputs.len()
    );
    Ok(plan)
}

/// Column indices of `l_fields`, or [`JobError::FieldNotFound`] for the first absent one.
pub(crate) fn resolve_field_indices(
    l_columns: &[String],
    l_fields: &[String],
    c_sheet: &str,
) -> Result<Vec<usize>, JobError> {
    l_fields
        .iter()
        .map(|c_field| {
            l_columns
                .iter()
                .position(|c| c == c_field)
                .ok_or_else(|| JobError::FieldNotFound {
                    field: c_field.clone(),
                    sheet: c_sheet.to_string(),
                })
        })
        .collect()
}

/// Indices of kept columns in listed order; all columns when `l_keep` is empty.
pub(crate) fn resolve_projection(
    l_columns: &[String],
    l_keep: &[String],
    c_sheet: &str,
) -> Result<Vec<usize>, JobError> {
    if l_keep.is_empty() {
        return Ok((0..l_columns.len()).collect());
    }
    let mut l_idx = resolve_field_indices(l_columns, l_keep, c_sheet)?;
    let mut set_seen = HashSet::new();
    l_idx.retain(|i| set_seen.insert(*i));
    Ok(l_idx)
}

/// Multi-key ascending comparison over the columns in `l_sort`.
pub(crate) fn compare_rows(a: &[EnumCellValue], b: &[EnumCellValue], l_sort: &[usize]) -> Ordering {
    for &n_col in l_sort {
        let value_a = a.get(n_col).unwrap_or(&EnumCellValue::None);
        let value_b = b.get(n_col).unwrap_or(&EnumCellValue::None);
        let ord = value_a.cmp_for_sort(value_b);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn derive_sorted_order(rows: &[Vec<EnumCellValue>], l_sort: &[usize]) -> Vec<usize> {
    let mut l_order: Vec<usize> = (0..rows.len()).collect();
    if !l_sort.is_empty() {
        l_order.sort_by(|&a, &b| compare_rows(&rows[a], &rows[b], l_sort));
    }
    l_order
}

fn group_by_value(l_order: &[usize], l_values: &[String]) -> Vec<(String, Vec<usize>)> {
    let mut dict_pos: HashMap<&str, usize> = HashMap::new();
    let mut l_groups: Vec<(String, Vec<usize>)> = Vec::new();
    for &i in l_order {
        let c_value = l_values[i].as_str();
        let n_pos = *dict_pos.entry(c_value).or_insert_with(|| {
            l_groups.push((c_value.to_string(), Vec::new()));
            l_groups.len() - 1
        });
        l_groups[n_pos].1.push(i);
    }
    l_groups
}

fn derive_distinct_in_order(iter_idx: impl Iterator<Item = usize>, l_values: &[String]) -> Vec<String> {
    let mut set_seen: HashSet<&str> = HashSet::new();
    let mut l_distinct = Vec::new();
    for i in iter_idx {
        if set_seen.insert(l_values[i].as_str()) {
            l_distinct.push(l_values[i].clone());
        }
    }
    l_distinct
}

fn project_rows(
    model: &WorkbookModel,
    l_columns: &[String],
    l_keep: &[usize],
    l_row_idx: &[usize],
) -> Dataset {
    let rows = l_row_idx
        .iter()
        .map(|&i| {
            l_keep
                .iter()
                .map(|&c| model.rows[i].get(c).cloned().unwrap_or(EnumCellValue::None))
                .collect()
        })
        .collect();
    Dataset {
        columns: l_columns.to_vec(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use splitkit_io_xlsx::{EnumCellValue, StyleSource, WorkbookModel};

    use super::partition;
    use crate::spec::{EnumJobWarning, JobError, SpecPartitionSpec};

    fn s(v: &str) -> EnumCellValue {
        EnumCellValue::String(v.to_string())
    }

    fn n(v: f64) -> EnumCellValue {
        EnumCellValue::Number(v)
    }

    fn staff_model() -> StyleSource {
        Arc::new(WorkbookModel {
            sheet_name: "Staff".to_string(),
            columns: vec!["ID".to_string(), "Dept".to_string(), "Salary".to_string()],
            rows: vec![
                vec![n(1.0), s("Sales"), n(100.0)],
                vec![n(2.0), s("Eng"), n(200.0)],
                vec![n(3.0), s("Sales"), n(150.0)],
            ],
            ..Default::default()
        })
    }

    #[test]
    fn test_partition_by_value_scenario() {
        let model = staff_model();
        let plan = partition(&model, &SpecPartitionSpec::by_value("Dept")).unwrap();

        let l_labels: Vec<&str> = plan.l_outputs.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(l_labels, vec!["Sales", "Eng"]);
        assert_eq!(
            plan.l_outputs[0].dataset.rows,
            vec![
                vec![n(1.0), s("Sales"), n(100.0)],
                vec![n(3.0), s("Sales"), n(150.0)],
            ]
        );
        assert_eq!(plan.l_outputs[1].dataset.rows, vec![vec![n(2.0), s("Eng"), n(200.0)]]);
        assert!(Arc::ptr_eq(&plan.l_outputs[0].style_source, &model));
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_partition_keep_and_sort() {
        let model = staff_model();
        let mut spec = SpecPartitionSpec::by_value("Dept");
        spec.keep_fields = vec!["Salary".to_string(), "ID".to_string()];
        spec.sort_fields = vec!["Salary".to_string()];
        let plan = partition(&model, &spec).unwrap();

        let sales = &plan.l_outputs[0].dataset;
        assert_eq!(sales.columns, vec!["Salary".to_string(), "ID".to_string()]);
        assert_eq!(sales.rows, vec![vec![n(100.0), n(1.0)], vec![n(150.0), n(3.0)]]);
    }

    #[test]
    fn test_partition_sort_ascending_nulls_last_and_stable() {
        let model = Arc::new(WorkbookModel {
            sheet_name: "S".to_string(),
            columns: vec!["K".to_string(), "V".to_string()],
            rows: vec![
                vec![s("x"), EnumCellValue::None],
                vec![s("x"), n(2.0)],
                vec![s("x"), n(1.0)],
                vec![s("x"), n(2.0)],
            ],
            ..Default::default()
        });
        let mut spec = SpecPartitionSpec::by_value("K");
        spec.sort_fields = vec!["V".to_string()];
        spec.keep_fields = vec!["V".to_string()];
        let plan = partition(&model, &spec).unwrap();
        assert_eq!(
            plan.l_outputs[0].dataset.rows,
            vec![vec![n(1.0)], vec![n(2.0)], vec![n(2.0)], vec![EnumCellValue::None]]
        );
    }

    #[test]
    fn test_partition_missing_fields_fail() {
        let model = staff_model();
        let err = partition(&model, &SpecPartitionSpec::by_value("Region")).unwrap_err();
        assert!(matches!(err, JobError::FieldNotFound { ref field, .. } if field == "Region"));

        let mut spec = SpecPartitionSpec::by_value("Dept");
        spec.sort_fields = vec!["Age".to_string()];
        assert!(matches!(
            partition(&model, &spec),
            Err(JobError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_partition_custom_groups_scenario() {
        let model = staff_model();
        let spec = SpecPartitionSpec::by_groups(
            "Dept",
            vec![
                ("A".to_string(), vec!["Sales".to_string()]),
                ("B".to_string(), vec!["Eng".to_string()]),
            ],
        );
        let plan = partition(&model, &spec).unwrap();
        let l_sizes: Vec<(&str, usize)> = plan
            .l_outputs
            .iter()
            .map(|o| (o.label.as_str(), o.dataset.n_rows()))
            .collect();
        assert_eq!(l_sizes, vec![("A", 2), ("B", 1)]);
        assert!(plan.l_unassigned.is_empty());
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_partition_custom_groups_report_unassigned_and_empty() {
        let model = staff_model();
        let mut spec = SpecPartitionSpec::by_groups(
            "Dept",
            vec![
                ("A".to_string(), vec!["Sales".to_string()]),
                ("C".to_string(), vec!["HR".to_string()]),
            ],
        );
        let plan = partition(&model, &spec).unwrap();
        assert_eq!(plan.l_outputs.len(), 1);
        assert_eq!(plan.l_unassigned, vec!["Eng".to_string()]);
        assert_eq!(
            plan.warnings,
            vec![
                EnumJobWarning::EmptyGroup("C".to_string()),
                EnumJobWarning::UnassignedValues {
                    values: vec!["Eng".to_string()],
                    n_rows: 1,
                },
            ]
        );

        spec.unassigned_group = Some("Other".to_string());
        let plan = partition(&model, &spec).unwrap();
        let other = plan.l_outputs.last().unwrap();
        assert_eq!(other.label, "Other");
        assert_eq!(other.dataset.rows, vec![vec![n(2.0), s("Eng"), n(200.0)]]);
    }

    #[test]
    fn test_partition_labels_are_sanitized_and_numbers_normalized() {
        let model = Arc::new(WorkbookModel {
            sheet_name: "S".to_string(),
            columns: vec!["K".to_string()],
            rows: vec![vec![s("R/D")], vec![n(7.0)], vec![EnumCellValue::None]],
            ..Default::default()
        });
        let plan = partition(&model, &SpecPartitionSpec::by_value("K")).unwrap();
        let l_labels: Vec<&str> = plan.l_outputs.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(l_labels, vec!["R_D", "7", "(blank)"]);
    }
}
