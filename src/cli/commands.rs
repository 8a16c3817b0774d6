//! CLI command implementations
//!
//! Every command boots the same runtime from the configuration file:
//! load and validate config, set the log level, open the ledger, load the
//! catalog. Commands return their JSON payload; `run_command` writes it.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::checker::{
    parse_duration, Clock, CountLimit, Dispatcher, FileLedger, FixityChecker, LocalDigestSource,
    LoggingCollector, MemoryCatalog, ObjectId, OldestPending, RetentionPruner, RunController,
    ScopedResolver, StaticList, SystemClock, TimeLimit,
};
use crate::config::FixityConfig;
use crate::observability::{log_event_with_fields, Event, FixityMetrics, Logger};

use super::args::{CheckOptions, Command};
use super::errors::CliResult;
use super::io::write_response;

/// Everything a command needs, built from one config file.
struct Runtime {
    config: FixityConfig,
    ledger: Arc<FileLedger>,
    catalog: Arc<MemoryCatalog>,
    clock: Arc<dyn Clock>,
    metrics: Arc<FixityMetrics>,
}

impl Runtime {
    fn boot(config_path: &Path) -> CliResult<Self> {
        let config = FixityConfig::load(config_path)?;
        Logger::set_min_severity(config.severity()?);
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("config", &config_path.display().to_string()),
                ("data_dir", &config.data_dir),
                ("digest_algorithm", &config.digest_algorithm),
            ],
        );

        let ledger = Arc::new(FileLedger::open(config.data_path())?);
        let catalog = Arc::new(MemoryCatalog::load(&config.catalog_path())?);

        Ok(Self {
            config,
            ledger,
            catalog,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(FixityMetrics::new()),
        })
    }

    fn controller(&self) -> CliResult<RunController> {
        let algorithm = self.config.algorithm()?;
        let digests = LocalDigestSource::new(self.config.object_root_path(), algorithm);
        let checker = FixityChecker::new(
            self.ledger.clone(),
            self.catalog.clone(),
            Arc::new(digests),
            self.clock.clone(),
        )
        .with_metrics(self.metrics.clone());

        Ok(RunController::new(checker, algorithm.name()))
    }

    fn prune(&self) -> CliResult<Value> {
        let policy = self.config.retention_policy()?;
        let report = RetentionPruner::new(self.ledger.clone(), self.clock.clone())
            .with_metrics(self.metrics.clone())
            .prune(&policy);

        Ok(json!({
            "removed": report.total_removed(),
            "removed_by_outcome": report.removed_by_outcome,
            "failures": report.failures,
        }))
    }

    /// Pick the strategy for the requested scope, then wrap it in limits.
    fn dispatcher(&self, options: &CheckOptions) -> CliResult<Box<dyn Dispatcher>> {
        let scoped: Box<dyn Dispatcher> = if !options.object.is_empty() {
            // the list pops from the end
            let ids = options
                .object
                .iter()
                .rev()
                .map(|id| ObjectId::new(id.as_str()))
                .collect::<Result<Vec<_>, _>>()?;
            Box::new(StaticList::new(ids))
        } else if let Some(handle) = &options.handle {
            Box::new(ScopedResolver::new(self.catalog.as_ref(), handle)?)
        } else if options.continuous {
            Box::new(OldestPending::continuous(self.ledger.clone()))
        } else {
            Box::new(OldestPending::once(self.ledger.clone(), self.clock.now()))
        };

        let timed: Box<dyn Dispatcher> = match &options.duration {
            Some(d) => Box::new(TimeLimit::from_now(
                scoped,
                parse_duration(d)?,
                self.clock.clone(),
            )),
            None => scoped,
        };

        Ok(match options.count {
            Some(limit) => Box::new(CountLimit::new(timed, limit)),
            None => timed,
        })
    }
}

/// Run a CLI command
pub fn run_command(command: Command) -> CliResult<()> {
    let data = match command {
        Command::Check { config, options } => check(&config, &options)?,
        Command::Prune { config } => prune(&config)?,
        Command::Seed { config } => seed(&config)?,
        Command::Remove { config, object } => remove(&config, &object)?,
    };
    write_response(data)
}

/// Seed, optionally prune, then check objects.
pub fn check(config_path: &Path, options: &CheckOptions) -> CliResult<Value> {
    let runtime = Runtime::boot(config_path)?;
    let mut data = Map::new();

    if options.prune {
        data.insert("prune".into(), runtime.prune()?);
    }

    // built before the run starts so the once-mode cutoff precedes every check
    let mut dispatcher = runtime.dispatcher(options)?;
    let controller = runtime.controller()?;
    let mut collector = LoggingCollector::new();

    let summary = controller.run(dispatcher.as_mut(), &mut collector, options.verbose)?;

    data.insert("run".into(), serde_json::to_value(&summary)?);
    data.insert(
        "metrics".into(),
        serde_json::to_value(runtime.metrics.snapshot())?,
    );
    Ok(Value::Object(data))
}

/// Prune history rows only.
pub fn prune(config_path: &Path) -> CliResult<Value> {
    let runtime = Runtime::boot(config_path)?;
    Ok(json!({ "prune": runtime.prune()? }))
}

/// Seed missing ledger rows only.
pub fn seed(config_path: &Path) -> CliResult<Value> {
    let runtime = Runtime::boot(config_path)?;
    let report = runtime.controller()?.seed()?;
    Ok(json!({ "seeded": report }))
}

/// Process an object-removal notification.
pub fn remove(config_path: &Path, object: &str) -> CliResult<Value> {
    let runtime = Runtime::boot(config_path)?;
    let id = ObjectId::new(object)?;
    let report = runtime.controller()?.remove_object(&id)?;
    Ok(json!({ "object_id": id, "removed": report }))
}
