//! Experiment stage kinds: JVM training and evaluation runs plus the
//! result-scraping stage.

use std::path::PathBuf;

use crate::config::{JvmConfig, QueueConfig};
use crate::error::StageError;
use crate::params::ParameterSet;
use crate::stage::script::checked_command;
use crate::stage::{ResourceHints, ScriptContext, ScriptProducing};
use crate::util::shell::quote;

/// Parameter keys read by the runner rather than by the trainer.
pub const THREADS_KEY: &str = "threads";
pub const WORK_MEM_KEY: &str = "work_mem_megs";
pub const TIMEOUT_KEY: &str = "timeout_seconds";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hprof {
    Cpu,
    Heap,
}

impl Hprof {
    pub fn agent_flag(self) -> &'static str {
        match self {
            Hprof::Cpu => "-agentlib:hprof=cpu=samples,depth=7,interval=10",
            Hprof::Heap => "-agentlib:hprof=heap=sites,depth=7",
        }
    }
}

/// How to launch the JVM research tool.
#[derive(Debug, Clone)]
pub struct JvmCommand {
    pub java_bin: String,
    pub classpath: String,
    pub extra_args: Vec<String>,
    pub hprof: Option<Hprof>,
}

impl JvmCommand {
    pub fn from_config(cfg: &JvmConfig, hprof: Option<Hprof>) -> Self {
        Self {
            java_bin: cfg.java_bin.clone(),
            classpath: cfg.classpath.clone(),
            extra_args: cfg.extra_args.clone(),
            hprof,
        }
    }

    /// `java [heap] [gc threads] [extra] [hprof] -cp <cp> <class> <args...>`
    pub fn render(&self, class: &str, params: &ParameterSet, extra: &[(String, String)]) -> String {
        let mut parts = vec![quote(&self.java_bin)];
        if let Some(mb) = params.get_f64(WORK_MEM_KEY) {
            parts.push(format!("-Xmx{}m", mb as u64));
        }
        if let Some(t) = params.get_f64(THREADS_KEY) {
            parts.push(format!("-XX:ParallelGCThreads={}", t as u64));
        }
        parts.extend(self.extra_args.iter().map(|a| quote(a)));
        if let Some(h) = self.hprof {
            parts.push(h.agent_flag().to_string());
        }
        if !self.classpath.is_empty() {
            parts.push("-cp".to_string());
            parts.push(quote(&self.classpath));
        }
        parts.push(class.to_string());

        let args = params.arguments();
        if !args.is_empty() {
            parts.push(args);
        }
        for (k, v) in extra {
            parts.push(format!("--{} {}", k, quote(v)));
        }
        parts.join(" ")
    }
}

/// A model file produced by a named prerequisite stage, passed as `--<arg>`.
#[derive(Debug, Clone)]
pub struct ModelInput {
    pub arg: String,
    pub stage: String,
    pub file: String,
}

impl ModelInput {
    pub fn new(arg: impl Into<String>, stage: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            arg: arg.into(),
            stage: stage.into(),
            file: file.into(),
        }
    }

    fn resolve(&self, ctx: &ScriptContext<'_>) -> Result<(String, String), StageError> {
        let dir = ctx.prerequisite_dir(&self.stage)?;
        Ok((self.arg.clone(), dir.join(&self.file).display().to_string()))
    }
}

/// Scheduler hints derived from a configuration's runner keys.
pub fn resource_hints(params: &ParameterSet, queue: &QueueConfig) -> ResourceHints {
    let threads = params.get_f64(THREADS_KEY).map(|t| t.max(1.0) as u32);
    let memory_mb = params
        .get_f64(WORK_MEM_KEY)
        .map(|mb| mb as u64 + queue.memory_overhead_mb);
    let minutes = params
        .get_f64(TIMEOUT_KEY)
        .map(|s| (s.max(0.0) / 60.0).ceil() as u64)
        .or(Some(queue.default_minutes));
    ResourceHints {
        threads,
        memory_mb,
        minutes,
    }
}

/// Train a model with the JVM tool.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    params: ParameterSet,
    jvm: JvmCommand,
    main_class: String,
    inputs: Vec<ModelInput>,
}

impl TrainingRun {
    pub fn new(params: ParameterSet, jvm: JvmCommand, main_class: impl Into<String>) -> Self {
        Self {
            params,
            jvm,
            main_class: main_class.into(),
            inputs: Vec::new(),
        }
    }

    /// Feed a prerequisite's model in, e.g. a pruning model.
    pub fn with_input(mut self, input: ModelInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn inputs(&self) -> &[ModelInput] {
        &self.inputs
    }
}

impl ScriptProducing for TrainingRun {
    fn script_body(&self, ctx: &ScriptContext<'_>) -> Result<String, StageError> {
        let extra = self
            .inputs
            .iter()
            .map(|i| i.resolve(ctx))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(checked_command(&self.jvm.render(
            &self.main_class,
            &self.params,
            &extra,
        )))
    }
}

/// Evaluate an existing model against gold data.
#[derive(Debug, Clone)]
pub struct EvaluationRun {
    params: ParameterSet,
    jvm: JvmCommand,
    eval_class: String,
    model: EvalModel,
    gold_key: Option<String>,
}

#[derive(Debug, Clone)]
pub enum EvalModel {
    /// Produced by a prerequisite in this run.
    Prerequisite(ModelInput),
    /// Already on disk, e.g. from an earlier experiment directory.
    Path { arg: String, path: PathBuf },
}

impl EvaluationRun {
    pub fn new(
        params: ParameterSet,
        jvm: JvmCommand,
        eval_class: impl Into<String>,
        model: EvalModel,
    ) -> Self {
        Self {
            params,
            jvm,
            eval_class: eval_class.into(),
            model,
            gold_key: None,
        }
    }

    /// Parameter holding the gold file; a missing file is warned about.
    pub fn with_gold_key(mut self, key: impl Into<String>) -> Self {
        self.gold_key = Some(key.into());
        self
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn model(&self) -> &EvalModel {
        &self.model
    }
}

impl ScriptProducing for EvaluationRun {
    fn script_body(&self, ctx: &ScriptContext<'_>) -> Result<String, StageError> {
        if let Some(key) = &self.gold_key {
            match self.params.get_str(key) {
                Some(gold) if !std::path::Path::new(&gold).exists() => {
                    tracing::warn!("stage {}: gold file {} does not exist", ctx.stage_name, gold);
                }
                None => {
                    tracing::warn!("stage {}: no gold file under '{}'", ctx.stage_name, key);
                }
                _ => {}
            }
        }

        let model = match &self.model {
            EvalModel::Prerequisite(input) => input.resolve(ctx)?,
            EvalModel::Path { arg, path } => (arg.clone(), path.display().to_string()),
        };
        Ok(checked_command(&self.jvm.render(
            &self.eval_class,
            &self.params,
            &[model],
        )))
    }
}

/// Harvest results of every stage in the experiment directory.
#[derive(Debug, Clone)]
pub struct ScrapeRun {
    command: String,
    out_file: String,
}

impl ScrapeRun {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            out_file: "results.tsv".to_string(),
        }
    }

    pub fn with_out_file(mut self, out_file: impl Into<String>) -> Self {
        self.out_file = out_file.into();
        self
    }
}

impl ScriptProducing for ScrapeRun {
    fn script_body(&self, ctx: &ScriptContext<'_>) -> Result<String, StageError> {
        let out = ctx.workdir()?.join(&self.out_file);
        Ok(checked_command(&format!(
            "{} scrape {} --out {}",
            quote(&self.command),
            quote(&ctx.top_dir.display().to_string()),
            quote(&out.display().to_string())
        )))
    }
}
