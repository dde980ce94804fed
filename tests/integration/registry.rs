//! Plugin registry integration tests
//!
//! Module registration, directory scanning and effect creation through the
//! registry, without loading real plugin binaries.

use std::fs;
use std::path::{Path, PathBuf};

use outboard::plugin::libloading::Library;
use outboard::prelude::*;
use outboard::BridgeError;

use crate::helpers::*;

/// Binding for `.vst3` files that never gets far enough to bind anything,
/// since the test directories only hold placeholder files.
struct PlaceholderBinding;

impl ModuleBinding for PlaceholderBinding {
    fn family(&self) -> &str {
        "VST3"
    }

    fn extensions(&self) -> &[&str] {
        &["vst3"]
    }

    unsafe fn bind(
        &self,
        _library: &Library,
        module: &Path,
    ) -> outboard::plugin::Result<Box<dyn PluginFactory>> {
        Err(BridgeError::ClassNotFound(module.display().to_string()))
    }
}

fn registry() -> PluginRegistry {
    init_tracing();
    PluginRegistry::new(PlaceholderBinding).with_search_paths(Vec::new())
}

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"placeholder").unwrap();
    path
}

#[test]
fn test_registered_module_creates_effects() {
    let registry = registry();
    let (module, factory) = gain_module(2);
    registry.register_module(module);
    assert_eq!(registry.len(), 1);

    let plugin_path = PluginPath::parse(&format!("{};{}", GAIN_MODULE_PATH, GAIN_CLASS))
        .expect("valid plugin path");
    let store = Arc::new(MemorySettingsStore::new());
    let effect = registry
        .create_effect(&plugin_path.module, &plugin_path.class_id, store)
        .unwrap();

    assert_eq!(effect.symbol(), "Gain");
    assert_eq!(effect.path(), plugin_path);
    assert_eq!(factory.instance_count(), 1);

    // cached: the same module backs every effect
    let same = registry.load_module(Path::new(GAIN_MODULE_PATH)).unwrap();
    assert_eq!(same.path(), Path::new(GAIN_MODULE_PATH));
}

#[test]
fn test_unknown_class_is_reported() {
    let registry = registry();
    let (module, _factory) = gain_module(2);
    registry.register_module(module);

    let err = registry
        .create_effect(
            Path::new(GAIN_MODULE_PATH),
            &ClassId([0; 16]),
            Arc::new(MemorySettingsStore::new()),
        )
        .unwrap_err();

    assert!(matches!(err, BridgeError::ClassNotFound(_)));
}

#[test]
fn test_classes_listed_per_module() {
    let registry = registry();
    registry.register_module(gain_module(2).0);

    let classes = registry.classes();
    assert_eq!(classes.len(), 1);
    let (path, class) = &classes[0];
    assert_eq!(path, Path::new(GAIN_MODULE_PATH));
    assert_eq!(class.id, GAIN_CLASS);
    assert_eq!(class.sub_categories_string(), "Fx|Tools");
}

#[test]
fn test_scan_directory_filters_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();

    let upper = touch(dir.path(), "Delay.VST3");
    let lower = touch(dir.path(), "chorus.vst3");
    touch(dir.path(), "readme.txt");
    touch(dir.path(), "plugin.dll");

    let found = registry.scan_directory(dir.path()).unwrap();
    let mut expected = vec![upper, lower];
    expected.sort();
    assert_eq!(found, expected);
}

#[test]
fn test_scan_rejects_files() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let file = touch(dir.path(), "Gain.vst3");

    let err = registry.scan_directory(&file).unwrap_err();
    assert!(matches!(err, BridgeError::NotADirectory(_)));
}

#[test]
fn test_unloadable_modules_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    touch(dir.path(), "Broken.vst3");

    let loaded = registry.load_directory(dir.path()).unwrap();
    assert!(loaded.is_empty());
    assert!(registry.is_empty());

    let err = registry
        .load_module(&dir.path().join("Broken.vst3"))
        .unwrap_err();
    assert!(matches!(err, BridgeError::LoadFailed { .. }));
}

#[test]
fn test_search_paths_scanned_when_present() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Reverb.vst3");
    let registry = registry().with_search_paths(vec![
        dir.path().to_path_buf(),
        dir.path().join("does-not-exist"),
    ]);

    assert_eq!(registry.scan_search_paths(), vec![dir.path().join("Reverb.vst3")]);
}

#[test]
fn test_effects_outlive_registry_shutdown() {
    let registry = registry();
    let (module, factory) = gain_module(2);
    registry.register_module(module);

    let mut effect = registry
        .create_effect(
            Path::new(GAIN_MODULE_PATH),
            &GAIN_CLASS,
            Arc::new(MemorySettingsStore::new()),
        )
        .unwrap();
    registry.shutdown();
    assert!(registry.is_empty());

    assert!(effect.process_initialize(TEST_SAMPLE_RATE));
    let mut block = Block::new(vec![generate_dc(1.0, 16); 2], 16);
    assert_eq!(block.run(|ins, outs| effect.process_block(ins, outs, 16)), 16);
    assert!(effect.process_finalize());
    assert_eq!(factory.instance(0).lock().blocks, vec![16]);
}
