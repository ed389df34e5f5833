use super::*;
use crate::foundation::error::RibResult;
use crate::paths::resolver::PathResolver;
use crate::texture::optimizer::OptimizerConfig;
use crate::tools::runner::{ToolOutput, ToolRunner};
use std::cell::Cell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

struct CountingRunner {
    exit_code: Option<i32>,
    calls: Cell<usize>,
}

impl CountingRunner {
    fn new(exit_code: Option<i32>) -> Self {
        Self {
            exit_code,
            calls: Cell::new(0),
        }
    }
}

impl ToolRunner for CountingRunner {
    fn run(&self, _program: &Path, args: &[OsString]) -> RibResult<ToolOutput> {
        self.calls.set(self.calls.get() + 1);
        if self.exit_code == Some(0)
            && let Some(out) = args.last()
        {
            std::fs::write(out, b"optimized").unwrap();
        }
        Ok(ToolOutput {
            exit_code: self.exit_code,
            stdout: String::new(),
            stderr: "bad image".to_owned(),
        })
    }
}

fn scene_with(source: &Path) -> SceneSnapshot {
    serde_json::from_value(serde_json::json!({
        "textures": { "Wood": { "file_path": source } }
    }))
    .unwrap()
}

fn source_file() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("wood.png");
    std::fs::write(&source, b"png").unwrap();
    (dir, source)
}

#[test]
fn repeated_references_run_the_optimizer_once() {
    let (dir, source) = source_file();
    let scene = scene_with(&source);
    let resolver = PathResolver::default();
    let cfg = OptimizerConfig::default();
    let runner = CountingRunner::new(Some(0));
    let optimizer = TextureOptimizer::new(&resolver, &cfg, &runner);
    let mut cache = TextureCache::new();
    let mut report = FrameReport::default();

    let expected = dir.path().join("wood.tdl").to_string_lossy().into_owned();
    for _ in 0..3 {
        let path = cache.resolve(&scene, &optimizer, "Wood", Frame(1), &mut report);
        assert_eq!(path, expected);
    }
    assert_eq!(runner.calls.get(), 1);
    assert_eq!(cache.len(), 1);

    // A new frame checks staleness again and finds the artifact current.
    let path = cache.resolve(&scene, &optimizer, "Wood", Frame(2), &mut report);
    assert_eq!(path, expected);
    assert_eq!(runner.calls.get(), 1);
    assert_eq!(
        cache.stats(),
        TextureStats {
            reused: 1,
            generated: 1,
            skipped: 0,
            failed: 0,
        }
    );
    assert!(report.warnings.is_empty());
    assert!(report.errors.is_empty());
}

#[test]
fn optimizer_failure_falls_back_to_source_with_a_warning() {
    let (_dir, source) = source_file();
    let scene = scene_with(&source);
    let resolver = PathResolver::default();
    let cfg = OptimizerConfig::default();
    let runner = CountingRunner::new(Some(1));
    let optimizer = TextureOptimizer::new(&resolver, &cfg, &runner);
    let mut cache = TextureCache::new();
    let mut report = FrameReport::default();

    let path = cache.resolve(&scene, &optimizer, "Wood", Frame(1), &mut report);
    assert_eq!(path, source.to_string_lossy());
    // The failure is remembered for the frame.
    cache.resolve(&scene, &optimizer, "Wood", Frame(1), &mut report);
    assert_eq!(runner.calls.get(), 1);

    assert!(report.errors.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        report.warnings[0].error,
        RibError::Optimization {
            exit_code: Some(1),
            ..
        }
    ));
    assert_eq!(report.warnings[0].entity.as_deref(), Some("Wood"));
    assert_eq!(cache.stats().failed, 1);
}

struct Unlaunchable;

impl ToolRunner for Unlaunchable {
    fn run(&self, program: &Path, _args: &[OsString]) -> RibResult<ToolOutput> {
        Err(anyhow::anyhow!("failed to run '{}'", program.display()).into())
    }
}

#[test]
fn optimizer_that_cannot_start_falls_back_to_source_with_a_warning() {
    let (_dir, source) = source_file();
    let scene = scene_with(&source);
    let resolver = PathResolver::default();
    let cfg = OptimizerConfig {
        binary: PathBuf::from("/definitely/not/tdlmake"),
        ..OptimizerConfig::default()
    };
    let optimizer = TextureOptimizer::new(&resolver, &cfg, &Unlaunchable);
    let mut cache = TextureCache::new();
    let mut report = FrameReport::default();

    let path = cache.resolve(&scene, &optimizer, "Wood", Frame(2), &mut report);
    assert_eq!(path, source.to_string_lossy());
    assert!(report.errors.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        report.warnings[0].error,
        RibError::Optimization { exit_code: None, .. }
    ));
    assert_eq!(report.warnings[0].frame, Some(Frame(2)));
}

#[test]
fn missing_source_is_an_error_that_keeps_the_source_path() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("gone.png");
    let scene = scene_with(&source);
    let resolver = PathResolver::default();
    let cfg = OptimizerConfig::default();
    let runner = CountingRunner::new(Some(0));
    let optimizer = TextureOptimizer::new(&resolver, &cfg, &runner);
    let mut cache = TextureCache::new();
    let mut report = FrameReport::default();

    let path = cache.resolve(&scene, &optimizer, "Wood", Frame(4), &mut report);
    assert_eq!(path, source.to_string_lossy());
    assert_eq!(runner.calls.get(), 0);
    assert_eq!(report.errors.len(), 1);
    let issue = &report.errors[0];
    assert!(matches!(issue.error, RibError::TextureNotFound { .. }));
    assert_eq!(issue.frame, Some(Frame(4)));
    assert_eq!(issue.path.as_deref(), Some(source.as_path()));
}

#[test]
fn unknown_texture_writes_an_empty_path() {
    let scene = SceneSnapshot::default();
    let resolver = PathResolver::default();
    let cfg = OptimizerConfig::default();
    let runner = CountingRunner::new(Some(0));
    let optimizer = TextureOptimizer::new(&resolver, &cfg, &runner);
    let mut cache = TextureCache::new();
    let mut report = FrameReport::default();

    let path = cache.resolve(&scene, &optimizer, "Nope", Frame(1), &mut report);
    assert_eq!(path, "");
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        &report.errors[0].error,
        RibError::MissingData { entity, channel } if entity == "Nope" && channel == "texture"
    ));
}
