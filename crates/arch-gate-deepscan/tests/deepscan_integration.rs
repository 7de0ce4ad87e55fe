//! Integration test: rule document → spec → deep scan end-to-end.
//!
//! Builds a small project on disk, loads its `arch-gate.toml`, and checks
//! it with the real file walker, renderer and JSON usage scanner.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arch_gate_core::spec::{self, LoadSpecError};
use arch_gate_core::{
    Component, ComponentName, DependencyRule, FilesError, PlainRenderer, ProjectFile,
    ProjectFilesResolver, ResolvedPath, Spec, WalkProjectFilesResolver,
};
use arch_gate_deepscan::{
    Criteria, DeepScan, DeepScanError, JsonUsageScanner, ScanError, Usage, UsageScanner,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const BASE_CONFIG: &str = r#"
module = "example.com/shop"
exclude-files = ["_test\\.go$"]

[components.a]
in = "internal/a"

[components.b]
in = "internal/b"

[components.models]
in = "internal/models"
"#;

const MAIN_GO: &str = "package main

import \"example.com/shop/internal/a\"
import \"example.com/shop/internal/b\"

func main() {
\trepo := b.NewPostgres()
\tsvc := a.NewService(repo)
\tsvc.Run()
}
";

/// `cmd/main.go` passes a `b.Postgres` into `a.NewService(repo Repository)`.
fn usages_json(target_file: &str, target_import: &str) -> String {
    format!(
        r#"[{{
  "name": "NewService",
  "definition": {{"file": "internal/a/service.go", "line": 5, "column": 6}},
  "gates": [{{
    "argument_definition": {{"file": "internal/a/service.go", "line": 5, "column": 17}},
    "method_definition": {{"file": "internal/a/service.go", "line": 5, "column": 6}},
    "method_name": "NewService",
    "implementations": [{{
      "injector": {{
        "param_definition": {{"file": "cmd/main.go", "line": 8, "column": 22}},
        "method_definition": {{"file": "cmd/main.go", "line": 6, "column": 1}},
        "code_name": "repo"
      }},
      "target": {{
        "definition": {{
          "place": {{"file": "{target_file}", "line": 3, "column": 6}},
          "import": "{target_import}",
          "pkg": "b"
        }},
        "struct_name": "Postgres"
      }}
    }}]
  }}]
}}]"#
    )
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "cmd/main.go", MAIN_GO);
    write(
        root,
        "internal/a/service.go",
        "package a\n\ntype Repository interface{ Save() }\n\nfunc NewService(repo Repository) *Service { return &Service{repo} }\n",
    );
    write(
        root,
        "internal/b/pg.go",
        "package b\n\ntype Postgres struct{}\n\nfunc NewPostgres() *Postgres { return &Postgres{} }\n",
    );
    write(root, "internal/models/user.go", "package models\n");
    write(
        root,
        "vendor/github.com/lib/pq/conn.go",
        "package pq\n\ntype Conn struct{}\n",
    );
    tmp
}

fn engine(scanner: JsonUsageScanner) -> DeepScan {
    DeepScan::new(
        Arc::new(WalkProjectFilesResolver::new()),
        Arc::new(PlainRenderer::new()),
        Arc::new(scanner),
    )
}

async fn check(root: &Path, config: &str, usages: &str) -> Result<arch_gate_core::CheckResult, DeepScanError> {
    let spec = spec::load_spec(config, root).expect("fixture config should load");
    let scanner = JsonUsageScanner::parse(usages, root).expect("fixture usages should parse");
    engine(scanner)
        .check(Arc::new(spec), CancellationToken::new())
        .await
}

fn cn(name: &str) -> ComponentName {
    ComponentName::new(name).unwrap()
}

// ── Cross-check ──

#[tokio::test]
async fn injection_from_undeclared_component_is_reported() {
    let tmp = project();
    let root = tmp.path();

    let result = check(
        root,
        BASE_CONFIG,
        &usages_json("internal/b/pg.go", "example.com/shop/internal/b"),
    )
    .await
    .expect("check should succeed");

    assert_eq!(result.deepscan_warnings.len(), 1);
    let warning = &result.deepscan_warnings[0];
    assert_eq!(warning.gate.component, cn("a"));
    assert_eq!(warning.gate.method_name, "NewService");
    assert_eq!(warning.gate.relative_path, "internal/a/service.go:5");
    assert_eq!(warning.dependency.component, cn("b"));
    assert_eq!(warning.dependency.name, "b.Postgres");
    assert_eq!(warning.dependency.injection_ast, "repo");
    assert_eq!(warning.dependency.injection_path, "cmd/main.go:8");
    assert_eq!(warning.target.relative_path, "internal/b/pg.go:3");

    let preview = &warning.dependency.source_code_preview;
    assert!(preview.contains("     6 | func main() {"), "preview: {preview}");
    assert!(
        preview.contains(">    8 |   svc := a.NewService(repo)"),
        "preview: {preview}"
    );

    assert_eq!(result.components_checked, 3);
    assert_eq!(result.packages_scanned, 3);
}

#[tokio::test]
async fn declared_dependency_is_compliant() {
    let tmp = project();
    let config = format!("{BASE_CONFIG}\n[deps.a]\nmay-depend-on = [\"b\"]\n");

    let result = check(
        tmp.path(),
        &config,
        &usages_json("internal/b/pg.go", "example.com/shop/internal/b"),
    )
    .await
    .unwrap();
    assert!(!result.has_warnings());
}

#[tokio::test]
async fn common_component_is_compliant() {
    let tmp = project();
    let config = format!("common-components = [\"b\"]\n{BASE_CONFIG}");

    let result = check(
        tmp.path(),
        &config,
        &usages_json("internal/b/pg.go", "example.com/shop/internal/b"),
    )
    .await
    .unwrap();
    assert!(!result.has_warnings());
}

#[tokio::test]
async fn vendored_target_is_out_of_scope() {
    let tmp = project();

    let result = check(
        tmp.path(),
        BASE_CONFIG,
        &usages_json("vendor/github.com/lib/pq/conn.go", "github.com/lib/pq"),
    )
    .await
    .unwrap();
    assert!(!result.has_warnings());
}

#[tokio::test]
async fn zero_usages_is_a_clean_check() {
    let tmp = project();

    let result = check(tmp.path(), BASE_CONFIG, "[]").await.unwrap();
    assert!(!result.has_warnings());
    assert_eq!(result.components_checked, 3);
}

#[tokio::test]
async fn deep_scan_disabled_component_is_skipped() {
    let tmp = project();
    let config = format!("{BASE_CONFIG}\n[deps.a]\ndeep-scan = false\n");

    let result = check(
        tmp.path(),
        &config,
        &usages_json("internal/b/pg.go", "example.com/shop/internal/b"),
    )
    .await
    .unwrap();
    assert!(!result.has_warnings());
    assert_eq!(result.components_checked, 2);
}

// ── Spec assembly ──

#[test]
fn unresolvable_mask_names_the_mask() {
    let tmp = project();
    let config = format!("{BASE_CONFIG}\n[components.ghost]\nin = \"internal/ghost\"\n");

    let err = spec::load_spec(&config, tmp.path()).unwrap_err();
    assert!(matches!(err, LoadSpecError::Assemble(_)));
    assert!(
        err.to_string().contains("failed to resolve mask 'internal/ghost'"),
        "error: {err}"
    );
}

// ── Pool ──

struct NoFiles;

impl ProjectFilesResolver for NoFiles {
    fn project_files(&self, _spec: &Spec) -> Result<Vec<ProjectFile>, FilesError> {
        Ok(Vec::new())
    }
}

/// Records how many `usages` calls overlap.
#[derive(Default)]
struct TrackingScanner {
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    max: Option<NonZeroUsize>,
    failing: Option<PathBuf>,
}

impl UsageScanner for TrackingScanner {
    fn usages(&self, criteria: &Criteria) -> Result<Vec<Usage>, ScanError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.as_deref() == Some(criteria.package_path()) {
            return Err(ScanError::Package {
                package: criteria.package_path().to_path_buf(),
                reason: "syntax error".into(),
            });
        }
        Ok(Vec::new())
    }

    fn max_concurrency(&self) -> Option<NonZeroUsize> {
        self.max
    }
}

fn wide_spec(components: usize) -> Arc<Spec> {
    let mut spec = Spec::new("/p");
    for i in 0..components {
        let dir = format!("internal/c{i}");
        spec = spec.with_component(Component::new(
            cn(&format!("c{i}")),
            vec![dir.clone()],
            vec![ResolvedPath::new(
                format!("example.com/shop/{dir}"),
                dir.as_str(),
                format!("/p/{dir}"),
            )],
            true,
            DependencyRule::default(),
            vec![],
        ));
    }
    Arc::new(spec)
}

fn pool_engine(scanner: &Arc<TrackingScanner>) -> DeepScan {
    DeepScan::new(
        Arc::new(NoFiles),
        Arc::new(PlainRenderer::new()),
        Arc::clone(scanner) as Arc<dyn UsageScanner>,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_never_exceeds_width() {
    let scanner = Arc::new(TrackingScanner::default());
    let engine = pool_engine(&scanner).with_workers(NonZeroUsize::new(2).unwrap());

    let result = engine
        .check(wide_spec(6), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.components_checked, 6);
    assert_eq!(result.packages_scanned, 6);
    assert_eq!(scanner.calls.load(Ordering::SeqCst), 6);
    let peak = scanner.peak.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak concurrency {peak}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn non_reentrant_scanner_runs_alone() {
    let scanner = Arc::new(TrackingScanner {
        max: NonZeroUsize::new(1),
        ..TrackingScanner::default()
    });
    let engine = pool_engine(&scanner).with_workers(NonZeroUsize::new(4).unwrap());

    engine
        .check(wide_spec(4), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(scanner.peak.load(Ordering::SeqCst), 1);
    assert_eq!(scanner.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn first_failure_aborts_the_run() {
    let scanner = Arc::new(TrackingScanner {
        failing: Some(PathBuf::from("/p/internal/c0")),
        ..TrackingScanner::default()
    });
    let engine = pool_engine(&scanner).with_workers(NonZeroUsize::new(1).unwrap());

    let err = engine
        .check(wide_spec(5), CancellationToken::new())
        .await
        .unwrap_err();

    let DeepScanError::Scan { component, path, .. } = &err else {
        panic!("expected scan error, got {err}");
    };
    assert_eq!(component, &cn("c0"));
    assert_eq!(path, &PathBuf::from("/p/internal/c0"));
    // Width 1: nothing past the failing component ran to completion in parallel.
    assert!(scanner.calls.load(Ordering::SeqCst) < 5);
    assert_eq!(scanner.current.load(Ordering::SeqCst), 0);
}
