use super::*;
use crate::paths::resolver::PathConfig;
use crate::tools::runner::ToolOutput;
use std::cell::{Cell, RefCell};
use std::time::{Duration, SystemTime};

struct FakeOptimizer {
    exit_code: Option<i32>,
    calls: Cell<usize>,
    last_args: RefCell<Vec<OsString>>,
}

impl FakeOptimizer {
    fn new(exit_code: Option<i32>) -> Self {
        Self {
            exit_code,
            calls: Cell::new(0),
            last_args: RefCell::default(),
        }
    }
}

impl ToolRunner for FakeOptimizer {
    fn run(&self, _program: &Path, args: &[OsString]) -> RibResult<ToolOutput> {
        self.calls.set(self.calls.get() + 1);
        *self.last_args.borrow_mut() = args.to_vec();
        if self.exit_code == Some(0)
            && let Some(out) = args.last()
        {
            std::fs::write(out, b"optimized").unwrap();
        }
        Ok(ToolOutput {
            exit_code: self.exit_code,
            stdout: String::new(),
            stderr: "tdlmake: done".to_owned(),
        })
    }
}

fn texture(path: &Path) -> TextureDef {
    serde_json::from_value(serde_json::json!({ "file_path": path })).unwrap()
}

fn set_mtime(path: &Path, t: SystemTime) {
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(t)
        .unwrap();
}

struct Fixture {
    _dir: tempfile::TempDir,
    source: PathBuf,
    optimized: PathBuf,
    resolver: PathResolver,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("wood.png");
    std::fs::write(&source, b"png").unwrap();
    let resolver = PathResolver::new(PathConfig::default());
    let optimized = dir.path().join("wood.tdl");
    Fixture {
        _dir: dir,
        source,
        optimized,
        resolver,
    }
}

#[test]
fn missing_artifact_runs_optimizer_once() {
    let fx = fixture();
    let cfg = OptimizerConfig::default();
    let runner = FakeOptimizer::new(Some(0));
    let opt = TextureOptimizer::new(&fx.resolver, &cfg, &runner);
    let tex = texture(&fx.source);

    let out = opt.ensure_optimized_detailed("Wood", &tex, Frame(1)).unwrap();
    assert_eq!(out.path, fx.optimized);
    assert_eq!(out.action, TextureAction::Generated);
    assert_eq!(runner.calls.get(), 1);
    assert_eq!(
        *runner.last_args.borrow(),
        vec![
            OsString::from(fx.source.as_os_str()),
            OsString::from("-o"),
            OsString::from(fx.optimized.as_os_str()),
        ]
    );

    // Second call finds a fresh artifact.
    let again = opt.ensure_optimized("Wood", &tex, Frame(1)).unwrap();
    assert_eq!(again, fx.optimized);
    assert_eq!(runner.calls.get(), 1);
}

#[test]
fn stale_artifact_with_generate_if_older_runs_exactly_once() {
    let fx = fixture();
    std::fs::write(&fx.optimized, b"old").unwrap();
    let now = SystemTime::now();
    set_mtime(&fx.optimized, now - Duration::from_secs(3600));
    set_mtime(&fx.source, now);

    let cfg = OptimizerConfig::default();
    let runner = FakeOptimizer::new(Some(0));
    let opt = TextureOptimizer::new(&fx.resolver, &cfg, &runner);
    let mut tex = texture(&fx.source);
    tex.generate_if_nonexistent = false;
    tex.generate_if_older = true;

    assert_eq!(staleness(&fx.source, &fx.optimized).unwrap(), Staleness::Older);
    let path = opt.ensure_optimized("Wood", &tex, Frame(1)).unwrap();
    assert_eq!(path, fx.optimized);
    assert_eq!(runner.calls.get(), 1);
}

#[test]
fn fresh_artifact_with_both_flags_off_never_runs() {
    let fx = fixture();
    std::fs::write(&fx.optimized, b"new").unwrap();
    let now = SystemTime::now();
    set_mtime(&fx.source, now - Duration::from_secs(3600));
    set_mtime(&fx.optimized, now);

    let cfg = OptimizerConfig::default();
    let runner = FakeOptimizer::new(Some(0));
    let opt = TextureOptimizer::new(&fx.resolver, &cfg, &runner);
    let mut tex = texture(&fx.source);
    tex.generate_if_nonexistent = false;
    tex.generate_if_older = false;

    let out = opt.ensure_optimized_detailed("Wood", &tex, Frame(1)).unwrap();
    assert_eq!(out.action, TextureAction::Reused);
    assert_eq!(runner.calls.get(), 0);
}

#[test]
fn disabled_generation_returns_path_without_running() {
    let fx = fixture();
    let cfg = OptimizerConfig::default();
    let runner = FakeOptimizer::new(Some(0));
    let opt = TextureOptimizer::new(&fx.resolver, &cfg, &runner);
    let mut tex = texture(&fx.source);
    tex.auto_generate = false;

    let out = opt.ensure_optimized_detailed("Wood", &tex, Frame(1)).unwrap();
    assert_eq!(out.action, TextureAction::Skipped);
    assert_eq!(out.path, fx.optimized);
    assert_eq!(runner.calls.get(), 0);
}

#[test]
fn missing_source_is_texture_not_found() {
    let fx = fixture();
    std::fs::remove_file(&fx.source).unwrap();
    let cfg = OptimizerConfig::default();
    let runner = FakeOptimizer::new(Some(0));
    let opt = TextureOptimizer::new(&fx.resolver, &cfg, &runner);

    let err = opt
        .ensure_optimized("Wood", &texture(&fx.source), Frame(1))
        .unwrap_err();
    assert!(matches!(err, RibError::TextureNotFound { ref texture, .. } if texture == "Wood"));
    assert_eq!(runner.calls.get(), 0);
}

#[test]
fn nonzero_exit_is_optimization_error() {
    let fx = fixture();
    let cfg = OptimizerConfig::default();
    let runner = FakeOptimizer::new(Some(3));
    let opt = TextureOptimizer::new(&fx.resolver, &cfg, &runner);

    let err = opt
        .ensure_optimized("Wood", &texture(&fx.source), Frame(1))
        .unwrap_err();
    match err {
        RibError::Optimization {
            source_path,
            exit_code,
        } => {
            assert_eq!(source_path, fx.source);
            assert_eq!(exit_code, Some(3));
        }
        other => panic!("unexpected error: {other}"),
    }
}

struct Unlaunchable;

impl ToolRunner for Unlaunchable {
    fn run(&self, program: &Path, _args: &[OsString]) -> RibResult<ToolOutput> {
        Err(anyhow::anyhow!("failed to run '{}'", program.display()).into())
    }
}

#[test]
fn optimizer_that_cannot_start_is_optimization_error() {
    let fx = fixture();
    let cfg = OptimizerConfig {
        binary: PathBuf::from("/no/such/tdlmake"),
        ..OptimizerConfig::default()
    };
    let opt = TextureOptimizer::new(&fx.resolver, &cfg, &Unlaunchable);

    let err = opt
        .ensure_optimized("Wood", &texture(&fx.source), Frame(1))
        .unwrap_err();
    assert!(matches!(
        err,
        RibError::Optimization { exit_code: None, ref source_path } if source_path == &fx.source
    ));
    assert!(!fx.optimized.exists());
}

#[test]
fn forwarded_settings_precede_source_path() {
    let fx = fixture();
    let cfg = OptimizerConfig {
        extra_args: vec!["-quality".to_owned()],
        forward_texture_settings: true,
        ..OptimizerConfig::default()
    };
    let runner = FakeOptimizer::new(Some(0));
    let opt = TextureOptimizer::new(&fx.resolver, &cfg, &runner);
    let mut tex = texture(&fx.source);
    tex.sampling.flip_s = true;
    tex.sampling.compression = Compression::Zip;

    let flags = opt.flags_for(&tex);
    assert_eq!(flags[0], "-quality");
    assert!(flags.contains(&"-flips".to_owned()));
    assert!(flags.contains(&"-zip".to_owned()));
    assert!(!flags.contains(&"-blur".to_owned()));

    opt.ensure_optimized("Wood", &tex, Frame(1)).unwrap();
    let args = runner.last_args.borrow();
    assert_eq!(args[0], OsString::from("-quality"));
    assert_eq!(args[args.len() - 3], OsString::from(fx.source.as_os_str()));
}

#[test]
fn generation_gate_respects_each_flag() {
    let mut tex: TextureDef = serde_json::from_str("{}").unwrap();
    assert!(should_generate(&tex, Staleness::Missing));
    assert!(should_generate(&tex, Staleness::Older));
    assert!(!should_generate(&tex, Staleness::Fresh));
    tex.generate_if_older = false;
    assert!(!should_generate(&tex, Staleness::Older));
    assert!(should_generate(&tex, Staleness::Missing));
    tex.auto_generate = false;
    assert!(!should_generate(&tex, Staleness::Missing));
}
