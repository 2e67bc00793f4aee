mod common;

use std::fs;

use expgrid_core::api::{
    merge, shorten_names, ModelInput, ParameterSet, PipelineError, PipelineRunner, ResultScraper,
    RunnerOptions, ScrapeRun, Stage, StageGraph, StageKind, TrainingRun, Value,
    POST_PROCESS_STAGE,
};
use expgrid_core::config::AppConfig;
use pretty_assertions::assert_eq;

use common::{jvm, runner, training, SpyBackend};

#[tokio::test]
async fn runs_stages_in_dependency_order() {
    let tmp = tempfile::tempdir().unwrap();
    let mut graph = StageGraph::new();
    let root = graph.add_root();
    let prune = graph.add_stage(Stage::script("prune", "echo prune"));
    let second = graph.add_stage(Stage::script("second", "echo second"));
    graph.add_prerequisite(prune, root).unwrap();
    graph.add_prerequisite(second, prune).unwrap();

    let spy = SpyBackend::completing();
    let report = runner(spy.clone())
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap();

    assert_eq!(report.order, vec!["prune", "second"]);
    assert_eq!(spy.names(), vec!["prune", "second"]);
    assert!(tmp.path().join("prune/prune.sh").is_file());
    assert!(tmp.path().join("second/DONE").is_file());
}

#[tokio::test]
async fn duplicate_names_fail_before_anything_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let mut graph = StageGraph::new();
    let root = graph.add_root();
    let a = graph.add_stage(Stage::script("same", "true"));
    let b = graph.add_stage(Stage::script("same", "true"));
    graph.add_prerequisite(a, root).unwrap();
    graph.add_prerequisite(b, root).unwrap();

    let spy = SpyBackend::completing();
    let err = runner(spy.clone())
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::DuplicateStage(ref n) if n == "same"));
    assert!(spy.names().is_empty());
    assert!(!tmp.path().join("same").exists());
}

#[tokio::test]
async fn completed_stages_are_skipped_without_backend_calls() {
    let tmp = tempfile::tempdir().unwrap();
    for name in ["a", "b"] {
        fs::create_dir_all(tmp.path().join(name)).unwrap();
        fs::write(tmp.path().join(name).join("DONE"), b"").unwrap();
    }

    let mut graph = StageGraph::new();
    let root = graph.add_root();
    let a = graph.add_stage(Stage::script("a", "true"));
    let b = graph.add_stage(Stage::script("b", "true"));
    graph.add_prerequisite(a, root).unwrap();
    graph.add_prerequisite(b, a).unwrap();

    let spy = SpyBackend::recording();
    let report = runner(spy.clone())
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap();

    assert!(spy.names().is_empty());
    assert_eq!(report.skipped, vec!["a", "b"]);
}

#[tokio::test]
async fn stale_downstream_sentinel_is_rerun() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("b")).unwrap();
    fs::write(tmp.path().join("b/DONE"), b"").unwrap();

    let mut graph = StageGraph::new();
    let root = graph.add_root();
    let a = graph.add_stage(Stage::script("a", "true"));
    let b = graph.add_stage(Stage::script("b", "true"));
    graph.add_prerequisite(a, root).unwrap();
    graph.add_prerequisite(b, a).unwrap();

    let spy = SpyBackend::recording();
    runner(spy.clone())
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap();

    assert_eq!(spy.names(), vec!["a", "b"]);
    assert_eq!(spy.job("b").unwrap().holds, vec!["a"]);
    assert!(!tmp.path().join("b/DONE").exists());
}

#[tokio::test]
async fn names_not_starting_with_a_letter_are_prefixed() {
    let tmp = tempfile::tempdir().unwrap();
    let mut graph = StageGraph::new();
    let root = graph.add_root();
    let s = graph.add_stage(Stage::script("0.1_lr", "true"));
    graph.add_prerequisite(s, root).unwrap();

    let spy = SpyBackend::completing();
    runner(spy.clone())
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap();

    assert_eq!(spy.names(), vec!["s0.1_lr"]);
    assert!(tmp.path().join("s0.1_lr").is_dir());
}

#[tokio::test]
async fn renamed_prerequisite_still_feeds_its_model() {
    let tmp = tempfile::tempdir().unwrap();
    let prune_params = ParameterSet::new().with("l2", 1000);
    let prune_name = prune_params.name();
    assert!(prune_name.starts_with(|c: char| c.is_ascii_digit()));

    let mut graph = StageGraph::new();
    let root = graph.add_root();
    let prune = graph.add_stage(training(&prune_name, prune_params));
    let run = TrainingRun::new(ParameterSet::new(), jvm(), "edu.example.Trainer")
        .with_input(ModelInput::new("pruneModel", prune_name.as_str(), "model.binary.gz"));
    let second = graph.add_stage(Stage::new("second", StageKind::Training(run)));
    graph.add_prerequisite(prune, root).unwrap();
    graph.add_prerequisite(second, prune).unwrap();

    let spy = SpyBackend::completing();
    let report = runner(spy.clone())
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap();

    let renamed = format!("s{prune_name}");
    assert_eq!(report.order, vec![renamed.clone(), "second".to_string()]);
    let script = fs::read_to_string(tmp.path().join("second/second.sh")).unwrap();
    assert!(script.contains(&format!("--pruneModel {}", tmp.path().join(&renamed).display())));
    assert_eq!(spy.job("second").unwrap().holds, vec![renamed]);
}

#[tokio::test]
async fn experiment_stages_persist_their_parameters() {
    let tmp = tempfile::tempdir().unwrap();
    let base = ParameterSet::new().with("lr", 0.1).with("reg", "L2");
    let params = merge(&base, &ParameterSet::new().with("lr", 0.05));
    assert_eq!(params.name(), "0.05_L2");
    let name = "lr-reg";

    let mut graph = StageGraph::new();
    let root = graph.add_root();
    let t = graph.add_stage(training(name, params));
    graph.add_prerequisite(t, root).unwrap();

    let spy = SpyBackend::recording();
    runner(spy)
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap();

    let saved = ParameterSet::load(&tmp.path().join(name).join("expparams.txt")).unwrap();
    assert_eq!(saved.get("lr"), Some(&Value::Number(0.05)));
    assert_eq!(saved.get("reg"), Some(&Value::Text("L2".into())));

    let script = fs::read_to_string(tmp.path().join(name).join(format!("{name}.sh"))).unwrap();
    assert!(script.contains("--lr 0.05"));
    assert!(script.contains("--reg L2"));
    let last = script.trim_end().lines().last().unwrap();
    assert!(last.starts_with("touch ") && last.contains("DONE"));
}

#[tokio::test]
async fn shortened_names_keep_shared_arguments() {
    let tmp = tempfile::tempdir().unwrap();
    let mut batch = vec![
        ParameterSet::new().with("lr", 0.1).with("threads", 4),
        ParameterSet::new().with("lr", 0.2).with("threads", 4),
    ];
    shorten_names(&mut batch);

    let mut graph = StageGraph::new();
    let root = graph.add_root();
    for params in batch {
        let id = graph.add_stage(training(&params.name(), params));
        graph.add_prerequisite(id, root).unwrap();
    }

    let spy = SpyBackend::recording();
    let report = runner(spy)
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap();

    // "0.1" does not start with a letter, so the runner prefixes it
    assert_eq!(report.order, vec!["s0.1", "s0.2"]);
    let script = fs::read_to_string(tmp.path().join("s0.1/s0.1.sh")).unwrap();
    assert!(script.contains("--threads 4"));
}

#[tokio::test]
async fn post_processing_stage_waits_on_everything() {
    let tmp = tempfile::tempdir().unwrap();
    let mut graph = StageGraph::new();
    let root = graph.add_root();
    for name in ["x", "y"] {
        let id = graph.add_stage(Stage::script(name, "true"));
        graph.add_prerequisite(id, root).unwrap();
    }

    let spy = SpyBackend::recording();
    let opts = RunnerOptions {
        post_process: Some(ScrapeRun::new("expgrid")),
        ..RunnerOptions::default()
    };
    let report = PipelineRunner::new(spy.clone(), opts)
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap();

    assert_eq!(report.order.last().map(String::as_str), Some(POST_PROCESS_STAGE));
    let job = spy.job(POST_PROCESS_STAGE).unwrap();
    assert_eq!(job.holds, vec!["x", "y"]);
}

#[tokio::test]
async fn scraper_leaves_incomplete_stages_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let mut graph = StageGraph::new();
    let root = graph.add_root();
    let params = ParameterSet::new().with("lr", 0.1);
    let t = graph.add_stage(training("lr-0.1", params));
    graph.add_prerequisite(t, root).unwrap();

    // submitted but never finished: params on disk, no stdout, no sentinel
    runner(SpyBackend::recording())
        .run_pipeline(&mut graph, root, tmp.path())
        .await
        .unwrap();

    let scraper = ResultScraper::from_config(&AppConfig::default()).unwrap();
    let table = scraper.scrape_dir(tmp.path()).unwrap();
    assert_eq!(table.rows().len(), 1);
    let row = &table.rows()[0];
    assert!(!row.done);
    assert!(row.metrics.values().all(Value::is_none));
}
