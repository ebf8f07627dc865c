use crate::error::{Error, ExtractionError};
use crate::extraction::*;
use crate::types::{ArchiveKind, ExtractionJob};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a valid ZIP archive containing the given files
fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap();
}

/// Create a valid 7z archive from a source directory using sevenz_rust
fn create_7z_archive(archive_path: &Path, source_dir: &Path) {
    sevenz_rust::compress_to_path(source_dir, archive_path).unwrap();
}

/// Create a 7z archive whose entries carry the given names verbatim
fn create_7z_with_entries(archive_path: &Path, staging: &Path, entries: &[(&str, &[u8])]) {
    std::fs::create_dir_all(staging).unwrap();
    let mut writer = sevenz_rust::SevenZWriter::create(archive_path).unwrap();
    for (i, (name, content)) in entries.iter().enumerate() {
        let source = staging.join(format!("entry-{i}"));
        std::fs::write(&source, content).unwrap();
        writer
            .push_archive_entry(
                sevenz_rust::SevenZArchiveEntry::from_path(&source, name.to_string()),
                Some(std::fs::File::open(&source).unwrap()),
            )
            .unwrap();
    }
    writer.finish().unwrap();
}

/// Append a tar entry without the builder's path validation
fn append_raw_tar_entry<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    content: &[u8],
) {
    let mut header = tar::Header::new_gnu();
    header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
    header.set_mode(0o644);
    header.set_size(content.len() as u64);
    header.set_cksum();
    builder.append(&header, content).unwrap();
}

/// Create a gzip-compressed tarball with the given files and directories
fn create_tar_gz_archive(archive_path: &Path, files: &[(&str, &[u8])], dirs: &[&str]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for dir in dirs {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        builder
            .append_data(&mut header, dir, std::io::empty())
            .unwrap();
    }
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o644);
        header.set_size(content.len() as u64);
        builder.append_data(&mut header, name, *content).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
}

/// Relative paths of every file under `root`, sorted
fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[test]
fn test_resolve_known_extensions() {
    assert_eq!(resolve(Path::new("/dl/archive.zip")), ArchiveKind::Zip);
    assert_eq!(resolve(Path::new("/dl/archive.7z")), ArchiveKind::SevenZipOrRar);
    assert_eq!(resolve(Path::new("/dl/archive.rar")), ArchiveKind::SevenZipOrRar);
    assert_eq!(resolve(Path::new("/dl/archive.tar.gz")), ArchiveKind::TarGz);
}

#[test]
fn test_resolve_is_case_insensitive() {
    assert_eq!(resolve(Path::new("/dl/ARCHIVE.ZIP")), ArchiveKind::Zip);
    assert_eq!(resolve(Path::new("/dl/Photos.Rar")), ArchiveKind::SevenZipOrRar);
    assert_eq!(resolve(Path::new("/dl/src.TAR.GZ")), ArchiveKind::TarGz);
}

#[test]
fn test_resolve_unsupported() {
    assert_eq!(resolve(Path::new("/dl/archive.gz")), ArchiveKind::Unsupported);
    assert_eq!(resolve(Path::new("/dl/archive.tar")), ArchiveKind::Unsupported);
    assert_eq!(resolve(Path::new("/dl/archive.tar.bz2")), ArchiveKind::Unsupported);
    assert_eq!(resolve(Path::new("/dl/backup.tar.zip")), ArchiveKind::Unsupported);
    assert_eq!(resolve(Path::new("/dl/notes.txt")), ArchiveKind::Unsupported);
    assert_eq!(resolve(Path::new("/dl/README")), ArchiveKind::Unsupported);
    assert_eq!(resolve(Path::new("/dl/.zip")), ArchiveKind::Unsupported);
    assert_eq!(resolve(Path::new("/dl/movie.zip.part")), ArchiveKind::Unsupported);
}

#[test]
fn test_extractor_for_each_kind() {
    assert_eq!(extractor_for(ArchiveKind::Zip).unwrap().name(), "zip");
    assert_eq!(extractor_for(ArchiveKind::SevenZipOrRar).unwrap().name(), "7z/rar");
    assert_eq!(extractor_for(ArchiveKind::TarGz).unwrap().name(), "tar.gz");
    assert!(extractor_for(ArchiveKind::Unsupported).is_none());
}

// ---------------------------------------------------------------------------
// ZIP
// ---------------------------------------------------------------------------

#[test]
fn test_zip_extracts_nested_members() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("bundle.zip");
    let dest = temp_dir.path().join("bundle");
    create_zip_archive(
        &archive,
        &[
            ("readme.txt", b"hello"),
            ("docs/guide.md", b"# guide"),
            ("docs/img/logo.bin", &[0u8, 1, 2, 3]),
        ],
    );

    let files = ZipExtractor.extract(&archive, &dest).unwrap();

    assert_eq!(files.len(), 3);
    assert_eq!(
        files_under(&dest),
        vec![
            PathBuf::from("docs/guide.md"),
            PathBuf::from("docs/img/logo.bin"),
            PathBuf::from("readme.txt"),
        ]
    );
    assert_eq!(std::fs::read(dest.join("docs/guide.md")).unwrap(), b"# guide");
}

#[test]
fn test_zip_directory_entries_are_created() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("dirs.zip");
    let dest = temp_dir.path().join("dirs");

    let file = std::fs::File::create(&archive).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    writer
        .add_directory("empty/", ::zip::write::FileOptions::default())
        .unwrap();
    writer.finish().unwrap();

    let files = ZipExtractor.extract(&archive, &dest).unwrap();
    assert!(files.is_empty());
    assert!(dest.join("empty").is_dir());
}

#[test]
fn test_zip_skips_unsafe_entries() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("evil.zip");
    let dest = temp_dir.path().join("out");
    create_zip_archive(&archive, &[("../escaped.txt", b"nope"), ("ok.txt", b"fine")]);

    let files = ZipExtractor.extract(&archive, &dest).unwrap();

    assert_eq!(files, vec![dest.join("ok.txt")]);
    assert!(!temp_dir.path().join("escaped.txt").exists());
}

#[test]
fn test_zip_corrupt_archive_fails() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("broken.zip");
    std::fs::write(&archive, b"this is not a zip file").unwrap();

    let err = ZipExtractor
        .extract(&archive, &temp_dir.path().join("broken"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Extraction(ExtractionError::ExtractionFailed { ref archive, .. })
            if archive.ends_with("broken.zip")
    ));
}

#[test]
fn test_zip_missing_archive_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = ZipExtractor
        .extract(&temp_dir.path().join("nope.zip"), &temp_dir.path().join("nope"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
}

// ---------------------------------------------------------------------------
// 7z / RAR
// ---------------------------------------------------------------------------

#[test]
fn test_sniff_container_by_magic() {
    let temp_dir = TempDir::new().unwrap();

    let seven = temp_dir.path().join("mislabelled.rar");
    std::fs::write(&seven, [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, 0x00, 0x04]).unwrap();
    assert_eq!(sniff_container(&seven), Some(ContainerFormat::SevenZip));

    let rar = temp_dir.path().join("mislabelled.7z");
    std::fs::write(&rar, b"Rar!\x1a\x07\x01\x00").unwrap();
    assert_eq!(sniff_container(&rar), Some(ContainerFormat::Rar));
}

#[test]
fn test_sniff_container_falls_back_to_extension() {
    let temp_dir = TempDir::new().unwrap();

    let rar = temp_dir.path().join("garbage.RAR");
    std::fs::write(&rar, b"garbage").unwrap();
    assert_eq!(sniff_container(&rar), Some(ContainerFormat::Rar));

    let seven = temp_dir.path().join("missing.7z");
    assert_eq!(sniff_container(&seven), Some(ContainerFormat::SevenZip));

    let other = temp_dir.path().join("garbage.bin");
    std::fs::write(&other, b"garbage").unwrap();
    assert_eq!(sniff_container(&other), None);
}

#[test]
fn test_7z_extracts_directory_tree() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    std::fs::create_dir_all(source.join("sub")).unwrap();
    std::fs::write(source.join("a.txt"), b"alpha").unwrap();
    std::fs::write(source.join("sub/b.txt"), b"beta").unwrap();

    let archive = temp_dir.path().join("tree.7z");
    create_7z_archive(&archive, &source);

    let dest = temp_dir.path().join("tree");
    let files = SevenZipOrRarExtractor.extract(&archive, &dest).unwrap();

    assert_eq!(files.len(), 2);
    let extracted = files_under(&dest);
    assert!(extracted.iter().any(|p| p.ends_with("a.txt")));
    assert!(extracted.iter().any(|p| p.ends_with("sub/b.txt")));
}

#[test]
fn test_7z_parent_dir_entries_stay_inside_destination() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("evil.7z");
    create_7z_with_entries(
        &archive,
        &temp_dir.path().join("staging"),
        &[("../escaped.txt", b"outside"), ("inside.txt", b"inside")],
    );

    let parent = temp_dir.path().join("sub");
    let dest = parent.join("evil");
    let mut files = SevenZipExtractor.extract(&archive, &dest).unwrap();
    files.sort();

    assert!(!parent.join("escaped.txt").exists(), "entry escaped the destination");
    assert_eq!(files, vec![dest.join("escaped.txt"), dest.join("inside.txt")]);
    assert_eq!(std::fs::read(dest.join("escaped.txt")).unwrap(), b"outside");
    assert_eq!(std::fs::read(dest.join("inside.txt")).unwrap(), b"inside");
}

#[test]
fn test_7z_entry_with_no_safe_name_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("odd.7z");
    create_7z_with_entries(
        &archive,
        &temp_dir.path().join("staging"),
        &[("..", b"nowhere"), ("kept.txt", b"kept")],
    );

    let dest = temp_dir.path().join("odd");
    let files = SevenZipExtractor.extract(&archive, &dest).unwrap();

    assert_eq!(files, vec![dest.join("kept.txt")]);
    assert_eq!(std::fs::read(dest.join("kept.txt")).unwrap(), b"kept");
}

#[test]
fn test_7z_reports_only_its_own_files() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("new.txt"), b"new").unwrap();

    let archive = temp_dir.path().join("update.7z");
    create_7z_archive(&archive, &source);

    let dest = temp_dir.path().join("update");
    std::fs::create_dir_all(&dest).unwrap();
    for name in ["one.txt", "two.txt", "three.txt"] {
        std::fs::write(dest.join(name), b"already here").unwrap();
    }

    let files = SevenZipExtractor.extract(&archive, &dest).unwrap();
    assert_eq!(files, vec![dest.join("new.txt")]);
    assert_eq!(files_under(&dest).len(), 4);
}

#[test]
fn test_7z_content_behind_rar_extension_is_sniffed() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("only.txt"), b"content").unwrap();

    let archive = temp_dir.path().join("renamed.rar");
    create_7z_archive(&archive, &source);

    let dest = temp_dir.path().join("renamed");
    let files = SevenZipOrRarExtractor.extract(&archive, &dest).unwrap();
    assert_eq!(files.len(), 1);
}

#[test]
fn test_7z_corrupt_archive_fails() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("broken.7z");
    std::fs::write(&archive, b"not a 7z archive at all").unwrap();

    let err = SevenZipExtractor
        .extract(&archive, &temp_dir.path().join("broken"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Extraction(ExtractionError::ExtractionFailed { .. })
    ));
}

#[test]
fn test_rar_corrupt_archive_fails() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("broken.rar");
    std::fs::write(&archive, b"not a rar archive").unwrap();

    let result = SevenZipOrRarExtractor.extract(&archive, &temp_dir.path().join("broken"));
    assert!(matches!(
        result,
        Err(Error::Extraction(ExtractionError::ExtractionFailed { .. }))
    ));
}

#[test]
fn test_unknown_container_is_unsupported() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("blob.bin");
    std::fs::write(&archive, b"neither").unwrap();

    let result = SevenZipOrRarExtractor.extract(&archive, &temp_dir.path().join("blob"));
    assert!(matches!(
        result,
        Err(Error::Extraction(ExtractionError::UnsupportedArchive { .. }))
    ));
}

// ---------------------------------------------------------------------------
// tar.gz
// ---------------------------------------------------------------------------

#[test]
fn test_tar_gz_extracts_files_and_directories() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("release.tar.gz");
    create_tar_gz_archive(
        &archive,
        &[("bin/tool", b"#!/bin/sh\n"), ("LICENSE", b"MIT")],
        &["bin/", "empty/"],
    );

    let dest = temp_dir.path().join("release");
    let files = TarGzExtractor.extract(&archive, &dest).unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(
        files_under(&dest),
        vec![PathBuf::from("LICENSE"), PathBuf::from("bin/tool")]
    );
    assert!(dest.join("empty").is_dir());
    assert_eq!(std::fs::read(dest.join("LICENSE")).unwrap(), b"MIT");
}

#[test]
fn test_tar_gz_creates_missing_parents() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("deep.tar.gz");
    create_tar_gz_archive(&archive, &[("a/b/c/deep.txt", b"deep")], &[]);

    let dest = temp_dir.path().join("deep");
    let files = TarGzExtractor.extract(&archive, &dest).unwrap();
    assert_eq!(files, vec![dest.join("a/b/c/deep.txt")]);
}

#[test]
fn test_tar_gz_skips_unsafe_entries() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("evil.tar.gz");
    {
        let file = std::fs::File::create(&archive).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        append_raw_tar_entry(&mut builder, "../escaped.txt", b"outside");
        append_raw_tar_entry(&mut builder, "safe.txt", b"inside");
        builder.into_inner().unwrap().finish().unwrap();
    }

    let parent = temp_dir.path().join("sub");
    let dest = parent.join("evil");
    let files = TarGzExtractor.extract(&archive, &dest).unwrap();

    assert_eq!(files, vec![dest.join("safe.txt")]);
    assert!(!parent.join("escaped.txt").exists());
    assert!(!dest.join("escaped.txt").exists());
    assert_eq!(files_under(&dest), vec![PathBuf::from("safe.txt")]);
}

#[test]
fn test_tar_gz_corrupt_archive_fails() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("broken.tar.gz");
    std::fs::write(&archive, b"not gzip").unwrap();

    let err = TarGzExtractor
        .extract(&archive, &temp_dir.path().join("broken"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Extraction(ExtractionError::ExtractionFailed { .. })
    ));
}

// ---------------------------------------------------------------------------
// extract_archive
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_extract_archive_dispatches_by_kind() {
    let temp_dir = TempDir::new().unwrap();
    let source_path = temp_dir.path().join("movie.zip");
    create_zip_archive(&source_path, &[("movie.mkv", b"frames")]);

    let job = ExtractionJob {
        kind: resolve(&source_path),
        destination_dir: temp_dir.path().join("movie"),
        source_path,
    };

    let files = extract_archive(&job).await.unwrap();
    assert_eq!(files, vec![job.destination_dir.join("movie.mkv")]);
}

#[tokio::test]
async fn test_extract_archive_rejects_unsupported() {
    let temp_dir = TempDir::new().unwrap();
    let job = ExtractionJob {
        source_path: temp_dir.path().join("notes.txt"),
        destination_dir: temp_dir.path().join("notes"),
        kind: ArchiveKind::Unsupported,
    };

    let err = extract_archive(&job).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Extraction(ExtractionError::UnsupportedArchive { .. })
    ));
    assert!(!job.destination_dir.exists());
}
