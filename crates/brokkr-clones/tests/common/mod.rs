//! Shared fixtures for clone registry integration tests

// Not every test binary uses every fixture
#![allow(dead_code)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use brokkr_core::PathsConfig;
use brokkr_clones::Registry;

/// A throwaway Brokkr home with its registry
pub struct TestHome {
    pub paths: PathsConfig,
    pub registry: Registry,
    _dir: TempDir,
}

pub fn test_home() -> TestHome {
    let dir = TempDir::new().unwrap();
    let home = Utf8PathBuf::from_path_buf(dir.path().join("home")).unwrap();
    let paths = PathsConfig::with_home(home);
    paths.ensure_home().unwrap();
    let registry = Registry::new(&paths);
    TestHome {
        paths,
        registry,
        _dir: dir,
    }
}

/// Lay down a minimal valid clone tree (library dir + one legacy engine)
pub fn make_clone_tree(root: &Utf8Path) {
    std::fs::create_dir_all(root.join("brokkrlib/brokkr")).unwrap();
    std::fs::write(root.join("brokkrlib/brokkr/version"), "4.8.12\n").unwrap();
    std::fs::create_dir_all(root.join("bin/engines/273")).unwrap();
    std::fs::write(root.join("bin/engines/273/BrokkrLoader.dll"), b"dll").unwrap();
}

/// Zip a directory tree into `archive`, entry names relative to `src`
pub fn zip_dir(src: &Utf8Path, archive: &Utf8Path) {
    let file = std::fs::File::create(archive).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    for entry in walkdir::WalkDir::new(src.as_std_path()).min_depth(1) {
        let entry = entry.unwrap();
        let rel = entry
            .path()
            .strip_prefix(src.as_std_path())
            .unwrap()
            .to_str()
            .unwrap()
            .replace('\\', "/");
        if entry.file_type().is_dir() {
            writer.add_directory(rel, options).unwrap();
        } else {
            writer.start_file(rel, options).unwrap();
            writer
                .write_all(&std::fs::read(entry.path()).unwrap())
                .unwrap();
        }
    }
    writer.finish().unwrap();
}

/// Build a zip image whose product tree sits under a top-level directory,
/// the way forge-hosted branch archives are laid out
pub fn make_image_archive(work: &Utf8Path, top_dir: &str, with_lib: bool) -> Utf8PathBuf {
    let tree = work.join("image-src").join(top_dir);
    if with_lib {
        make_clone_tree(&tree);
    } else {
        std::fs::create_dir_all(tree.join("docs")).unwrap();
        std::fs::write(tree.join("docs/README.md"), b"not a product").unwrap();
    }
    let archive = work.join("image.zip");
    zip_dir(&work.join("image-src"), &archive);
    archive
}
