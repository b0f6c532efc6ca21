//! Encode request construction and multi-pass execution.

use chrono::Utc;
use convy_core::{EncodeRequest, MarkerKind, MarkerRecord, ResolvedSettings, RungOutput, Tier};
use convy_storage::{MarkerStore, StorageError};
use convy_tools::Encoder;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of building a request for one source.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// Every rung already has a marker
    Skip,
    /// Rungs remain; run this request
    Request(EncodeRequest),
}

/// How a request settled. Either way its rungs now carry markers.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// All passes succeeded
    Completed {
        /// Tiers produced
        tiers: Vec<Tier>,
        /// Wall time over all passes
        duration: Duration,
    },
    /// A pass failed; pending rungs are settled as failed
    Failed {
        /// Tiers that were pending
        tiers: Vec<Tier>,
        /// 1-based index of the failing pass
        pass: u32,
        /// Error text
        detail: String,
    },
}

impl Settlement {
    /// Whether the encode succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Settlement::Completed { .. })
    }
}

/// Output path for one rung: `<dir>/<output.directory>/<file name>.<tier>.<ext>`.
///
/// The whole source file name is kept so `a.avi` and `a.mkv` never share a
/// target (or a marker).
pub fn target_path(source: &Path, tier: Tier, settings: &ResolvedSettings) -> PathBuf {
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    let name = source
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(settings.output_directory())
        .join(format!("{}.{}.{}", name, tier.label(), settings.output_extension()))
}

/// Source file name a target was derived from, if `target` has the
/// `<file name>.<tier>.<ext>` shape.
pub fn source_name(target: &Path) -> Option<String> {
    let rest = Path::new(target.file_stem()?);
    let tier = rest.extension()?.to_str()?;
    tier.parse::<Tier>().ok()?;
    rest.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Builds and runs encode requests, recording outcomes as markers.
pub struct CommandBuilder<'a> {
    markers: &'a dyn MarkerStore,
}

impl<'a> CommandBuilder<'a> {
    /// Create a builder over `markers`.
    pub fn new(markers: &'a dyn MarkerStore) -> Self {
        Self { markers }
    }

    /// Build one request for `source` covering every rung of `ladder` that
    /// has no marker yet.
    ///
    /// The pass count comes from the first rung's settings and applies to all
    /// rungs, since they share invocations.
    pub async fn build(
        &self,
        source: &Path,
        ladder: &[Tier],
        resolve: impl Fn(Tier) -> ResolvedSettings,
    ) -> Result<BuildOutcome, StorageError> {
        let mut passes = None;
        let mut outputs = Vec::new();

        for &tier in ladder {
            let settings = resolve(tier);
            passes.get_or_insert(settings.passes());

            let target = target_path(source, tier, &settings);
            if self.markers.exists(&target).await? {
                debug!("Rung {} of {} already settled", tier, source.display());
                continue;
            }
            outputs.push(RungOutput { tier, target, settings });
        }

        if outputs.is_empty() {
            return Ok(BuildOutcome::Skip);
        }

        Ok(BuildOutcome::Request(EncodeRequest {
            source: source.to_path_buf(),
            outputs,
            passes: passes.unwrap_or(1),
        }))
    }

    /// Run every pass of `request` and write one marker per rung.
    ///
    /// Encoder failures are not errors here: they settle the rungs as failed.
    /// Only a marker that cannot be written is reported as an error.
    pub async fn execute(&self, request: &EncodeRequest, encoder: &dyn Encoder) -> Result<Settlement, StorageError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let tiers = request.tiers();
        let mut last_args = Vec::new();

        for pass in request.pass_plan() {
            info!(
                "Encoding {} [{}] pass {} with {}",
                request.source.display(),
                tier_list(&tiers),
                pass,
                encoder.name()
            );

            match encoder.encode(request, pass).await {
                Ok(output) => {
                    debug!("Pass {} finished in {:?}", pass, output.duration);
                    last_args = output.args;
                }
                Err(e) => {
                    let detail = e.to_string();
                    warn!("Encoding {} failed on pass {}: {}", request.source.display(), pass, detail);

                    let args = if e.args().is_empty() { last_args } else { e.args().to_vec() };
                    let finished_at = Utc::now();
                    for output in &request.outputs {
                        let record = MarkerRecord {
                            kind: MarkerKind::Failed,
                            source: request.source.clone(),
                            target: output.target.clone(),
                            tier: Some(output.tier),
                            started_at,
                            finished_at,
                            duration_secs: clock.elapsed().as_secs_f64(),
                            args: args.clone(),
                            error: Some(format!("pass {pass}: {detail}")),
                        };
                        self.markers.write(&output.target, &record).await?;
                    }

                    return Ok(Settlement::Failed {
                        tiers,
                        pass: pass.index,
                        detail,
                    });
                }
            }
        }

        let finished_at = Utc::now();
        let duration = clock.elapsed();
        for output in &request.outputs {
            let record = MarkerRecord {
                kind: MarkerKind::Completed,
                source: request.source.clone(),
                target: output.target.clone(),
                tier: Some(output.tier),
                started_at,
                finished_at,
                duration_secs: duration.as_secs_f64(),
                args: last_args.clone(),
                error: None,
            };
            self.markers.write(&output.target, &record).await?;
        }

        info!("Encoded {} [{}] in {:?}", request.source.display(), tier_list(&tiers), duration);
        Ok(Settlement::Completed { tiers, duration })
    }
}

/// `1k,hd,sd`
pub(crate) fn tier_list(tiers: &[Tier]) -> String {
    tiers.iter().map(Tier::label).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use convy_core::Pass;
    use convy_storage::JsonMarkerStore;
    use convy_tools::{PassOutput, ToolError};
    use std::sync::Mutex;

    /// Records calls; fails on the configured pass index.
    struct FakeEncoder {
        calls: Mutex<Vec<(usize, Pass)>>,
        fail_on: Option<u32>,
    }

    impl FakeEncoder {
        fn new(fail_on: Option<u32>) -> Self {
            Self { calls: Mutex::new(Vec::new()), fail_on }
        }
    }

    #[async_trait]
    impl Encoder for FakeEncoder {
        fn name(&self) -> &str {
            "fake"
        }

        async fn encode(&self, request: &EncodeRequest, pass: Pass) -> Result<PassOutput, ToolError> {
            self.calls.lock().unwrap().push((request.outputs.len(), pass));
            if self.fail_on == Some(pass.index) {
                return Err(ToolError::Failed {
                    program: "fake".to_string(),
                    status: Some(1),
                    stderr: "broken pipe".to_string(),
                    args: vec!["-i".to_string(), "x".to_string()],
                });
            }
            Ok(PassOutput {
                args: vec![format!("pass-{}", pass.index)],
                duration: Duration::from_millis(1),
            })
        }
    }

    fn settings(passes: &str) -> ResolvedSettings {
        [
            ("video.passes".to_string(), passes.to_string()),
            ("output.format".to_string(), "matroska".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_target_path() {
        let target = target_path(Path::new("/m/Heat (1995).mkv"), Tier::Hd, &settings("1"));
        assert_eq!(target, PathBuf::from("/m/.convy/Heat (1995).mkv.hd.mkv"));

        let mp4: ResolvedSettings = [
            ("output.format".to_string(), "mp4".to_string()),
            ("output.directory".to_string(), "encoded".to_string()),
        ]
        .into_iter()
        .collect();
        let target = target_path(Path::new("/m/a.avi"), Tier::FourK, &mp4);
        assert_eq!(target, PathBuf::from("/m/encoded/a.avi.4k.mp4"));
    }

    #[test]
    fn test_same_stem_sources_get_distinct_targets() {
        let s = settings("1");
        let avi = target_path(Path::new("/m/Heat.avi"), Tier::OneK, &s);
        let mkv = target_path(Path::new("/m/Heat.mkv"), Tier::OneK, &s);
        assert_ne!(avi, mkv);
        assert_ne!(convy_storage::marker_path(&avi), convy_storage::marker_path(&mkv));
    }

    #[test]
    fn test_source_name() {
        let target = target_path(Path::new("/m/Heat.mkv"), Tier::Hd, &settings("1"));
        assert_eq!(source_name(&target).as_deref(), Some("Heat.mkv"));
        assert_eq!(source_name(Path::new("/m/.convy/notes.txt")), None);
        assert_eq!(source_name(Path::new("/m/.convy/a.xx.mkv")), None);
    }

    #[tokio::test]
    async fn test_build_prunes_settled_rungs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mkv");
        let store = JsonMarkerStore::new();
        let hd = target_path(&source, Tier::Hd, &settings("2"));
        store.write(&hd, &MarkerRecord::settled(MarkerKind::Completed, &hd)).await.unwrap();

        let builder = CommandBuilder::new(&store);
        let ladder = [Tier::OneK, Tier::Hd, Tier::Sd];
        let outcome = builder.build(&source, &ladder, |_| settings("2")).await.unwrap();

        let BuildOutcome::Request(request) = outcome else {
            panic!("expected a request");
        };
        assert_eq!(request.tiers(), vec![Tier::OneK, Tier::Sd]);
        assert_eq!(request.passes, 2);
    }

    #[tokio::test]
    async fn test_build_skips_when_all_settled() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mkv");
        let store = JsonMarkerStore::new();
        for tier in [Tier::Hd, Tier::Sd] {
            let t = target_path(&source, tier, &settings("1"));
            store.write(&t, &MarkerRecord::settled(MarkerKind::Failed, &t)).await.unwrap();
        }

        let builder = CommandBuilder::new(&store);
        let outcome = builder.build(&source, &[Tier::Hd, Tier::Sd], |_| settings("1")).await.unwrap();
        assert_eq!(outcome, BuildOutcome::Skip);
    }

    #[tokio::test]
    async fn test_pass_count_from_first_rung() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mkv");
        let store = JsonMarkerStore::new();
        let builder = CommandBuilder::new(&store);

        let outcome = builder
            .build(&source, &[Tier::OneK, Tier::Sd], |tier| {
                if tier == Tier::OneK { settings("3") } else { settings("1") }
            })
            .await
            .unwrap();
        let BuildOutcome::Request(request) = outcome else {
            panic!("expected a request");
        };
        assert_eq!(request.passes, 3);
    }

    #[tokio::test]
    async fn test_execute_success_writes_marker_per_rung() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mkv");
        let store = JsonMarkerStore::new();
        let builder = CommandBuilder::new(&store);
        let BuildOutcome::Request(request) = builder
            .build(&source, &[Tier::OneK, Tier::Hd], |_| settings("2"))
            .await
            .unwrap()
        else {
            panic!("expected a request");
        };

        let encoder = FakeEncoder::new(None);
        let settlement = builder.execute(&request, &encoder).await.unwrap();
        assert!(settlement.is_success());

        let calls = encoder.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(2, Pass { index: 1, count: 2 }), (2, Pass { index: 2, count: 2 })]);

        for output in &request.outputs {
            assert!(store.exists(&output.target).await.unwrap());
        }
        let body = std::fs::read_to_string(convy_storage::marker_path(&request.outputs[0].target)).unwrap();
        assert!(body.contains("\"completed\""));
        assert!(body.contains("pass-2"));
    }

    #[tokio::test]
    async fn test_execute_failure_settles_pending_rungs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mkv");
        let store = JsonMarkerStore::new();
        let builder = CommandBuilder::new(&store);
        let BuildOutcome::Request(request) = builder
            .build(&source, &[Tier::Hd, Tier::Sd], |_| settings("2"))
            .await
            .unwrap()
        else {
            panic!("expected a request");
        };

        let encoder = FakeEncoder::new(Some(1));
        let settlement = builder.execute(&request, &encoder).await.unwrap();
        assert!(matches!(settlement, Settlement::Failed { pass: 1, .. }));
        assert_eq!(encoder.calls.lock().unwrap().len(), 1);

        for output in &request.outputs {
            assert!(store.exists(&output.target).await.unwrap());
        }
        let body = std::fs::read_to_string(convy_storage::marker_path(&request.outputs[1].target)).unwrap();
        assert!(body.contains("\"failed\""));
        assert!(body.contains("broken pipe"));

        let again = builder.build(&source, &[Tier::Hd, Tier::Sd], |_| settings("2")).await.unwrap();
        assert_eq!(again, BuildOutcome::Skip);
    }
}
