//! ZIP collection of finished outputs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::spec::{EnumPartitionMode, JobError};

/// Archive file name of a partition job.
pub fn derive_archive_name(mode: EnumPartitionMode, split_field: &str) -> String {
    match mode {
        EnumPartitionMode::OneFilePerValue => {
            format!("拆分结果_{}.zip", splitkit_io_xlsx::sanitize_label(split_field))
        }
        EnumPartitionMode::CustomGroups => "自定义分组拆分结果.zip".to_string(),
    }
}

/// Zip `l_files` (deflate) into `path_archive`.
///
/// Entry names are paths relative to `path_dir_root` with `/` separators,
/// or the base file name for files outside it. A partial archive is removed
/// on failure.
pub fn build_archive(
    path_dir_root: &Path,
    l_files: &[PathBuf],
    path_archive: &Path,
) -> Result<PathBuf, JobError> {
    let res_build = write_archive(path_dir_root, l_files, path_archive);
    if let Err(message) = res_build {
        let _ = std::fs::remove_file(path_archive);
        return Err(JobError::Archive {
            path: path_archive.to_path_buf(),
            message,
        });
    }
    log::info!(
        "Archived {} file(s) into {}",
        l_files.len(),
        path_archive.display()
    );
    Ok(path_archive.to_path_buf())
}

fn write_archive(path_dir_root: &Path, l_files: &[PathBuf], path_archive: &Path) -> Result<(), String> {
    let file = File::create(path_archive).map_err(|e| e.to_string())?;
    let mut zip_writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path_file in l_files {
        let c_entry = derive_entry_name(path_dir_root, path_file);
        zip_writer
            .start_file(c_entry.as_str(), options)
            .map_err(|e| format!("{c_entry}: {e}"))?;
        let mut file_src = File::open(path_file).map_err(|e| format!("{}: {e}", path_file.display()))?;
        std::io::copy(&mut file_src, &mut zip_writer).map_err(|e| format!("{c_entry}: {e}"))?;
    }

    let mut writer = zip_writer.finish().map_err(|e| e.to_string())?;
    writer.flush().map_err(|e| e.to_string())
}

fn derive_entry_name(path_dir_root: &Path, path_file: &Path) -> String {
    match path_file.strip_prefix(path_dir_root) {
        Ok(path_rel) => path_rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Read;

    use tempfile::tempdir;
    use zip::ZipArchive;

    use super::{build_archive, derive_archive_name};
    use crate::spec::{EnumPartitionMode, JobError};

    #[test]
    fn test_archive_names() {
        assert_eq!(
            derive_archive_name(EnumPartitionMode::OneFilePerValue, "Dept"),
            "拆分结果_Dept.zip"
        );
        assert_eq!(
            derive_archive_name(EnumPartitionMode::CustomGroups, "Dept"),
            "自定义分组拆分结果.zip"
        );
    }

    #[test]
    fn test_build_archive_uses_relative_names() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Staff")).unwrap();
        let path_a = dir.path().join("Dept-Sales.xlsx");
        let path_b = dir.path().join("Staff").join("Dept-Eng.xlsx");
        std::fs::write(&path_a, b"aaa").unwrap();
        std::fs::write(&path_b, b"bbbb").unwrap();

        let path_zip = dir.path().join("out.zip");
        build_archive(dir.path(), &[path_a, path_b], &path_zip).unwrap();

        let mut archive = ZipArchive::new(File::open(&path_zip).unwrap()).unwrap();
        let mut l_names: Vec<String> = archive.file_names().map(str::to_string).collect();
        l_names.sort();
        assert_eq!(l_names, vec!["Dept-Sales.xlsx", "Staff/Dept-Eng.xlsx"]);

        let mut c_text = String::new();
        archive
            .by_name("Staff/Dept-Eng.xlsx")
            .unwrap()
            .read_to_string(&mut c_text)
            .unwrap();
        assert_eq!(c_text, "bbbb");
    }

    #[test]
    fn test_missing_input_removes_partial_archive() {
        let dir = tempdir().unwrap();
        let path_zip = dir.path().join("out.zip");
        let res = build_archive(dir.path(), &[dir.path().join("nope.xlsx")], &path_zip);
        assert!(matches!(res, Err(JobError::Archive { .. })));
        assert!(!path_zip.exists());
    }
}
