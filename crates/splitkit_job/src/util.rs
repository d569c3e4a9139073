//! Stateless helpers for job orchestration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use splitkit_io_xlsx::sanitize_label;

/// Clamp requested worker count to `[1, available_parallelism]`.
pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

/// Return `c_base`, or `c_base__2`, `c_base__3`, ... when already used.
///
/// The returned name is recorded in `set_used`. Comparison is case-insensitive
/// so outputs do not collide on case-folding file systems.
pub(crate) fn derive_unique_name(c_base: &str, set_used: &mut HashSet<String>) -> String {
    let mut c_name = c_base.to_string();
    let mut n_suffix = 2usize;
    while !set_used.insert(c_name.to_lowercase()) {
        c_name = format!("{c_base}__{n_suffix}");
        n_suffix += 1;
    }
    c_name
}

/// Directory name for one sheet of a multi-sheet job.
///
/// Names made only of dots (and spaces) would leave the output directory, so
/// they become `_`.
pub(crate) fn derive_sheet_dir_name(c_sheet: &str) -> String {
    let c_name = sanitize_label(c_sheet);
    if c_name.trim_matches(|c: char| c == '.' || c == ' ').is_empty() {
        return "_".to_string();
    }
    c_name
}

/// `{dir}/{stem}.xlsx`.
pub(crate) fn derive_output_path(path_dir: &Path, c_stem: &str) -> PathBuf {
    path_dir.join(format!("{c_stem}.xlsx"))
}

/// `12.3s` / `4m05s` / `1h02m`.
pub(crate) fn format_duration_short(duration: Duration) -> String {
    let n_secs = duration.as_secs();
    if n_secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if n_secs < 3600 {
        format!("{}m{:02}s", n_secs / 60, n_secs % 60)
    } else {
        format!("{}h{:02}m", n_secs / 3600, (n_secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::{
        calculate_worker_limit, derive_sheet_dir_name, derive_unique_name, format_duration_short,
    };

    #[test]
    fn test_worker_limit_is_at_least_one() {
        assert_eq!(calculate_worker_limit(Some(0)), 1);
        assert_eq!(calculate_worker_limit(Some(1)), 1);
        assert!(calculate_worker_limit(None) >= 1);
    }

    #[test]
    fn test_unique_name_appends_suffix() {
        let mut set_used = HashSet::new();
        assert_eq!(derive_unique_name("Dept-A_B", &mut set_used), "Dept-A_B");
        assert_eq!(derive_unique_name("Dept-A_B", &mut set_used), "Dept-A_B__2");
        assert_eq!(derive_unique_name("dept-a_b", &mut set_used), "dept-a_b__3");
    }

    #[test]
    fn test_sheet_dir_name_never_walks_up() {
        assert_eq!(derive_sheet_dir_name(".."), "_");
        assert_eq!(derive_sheet_dir_name("."), "_");
        assert_eq!(derive_sheet_dir_name(" .. "), "_");
        assert_eq!(derive_sheet_dir_name("a/.."), "a_..");
        assert_eq!(derive_sheet_dir_name("Q1.Sales"), "Q1.Sales");
    }

    #[test]
    fn test_format_duration_short() {
        assert_eq!(format_duration_short(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration_short(Duration::from_secs(245)), "4m05s");
        assert_eq!(format_duration_short(Duration::from_secs(3720)), "1h02m");
    }
}
