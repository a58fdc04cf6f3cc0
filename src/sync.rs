//! Replays the tracking store: one install batch per tracked manager.

use std::time::Instant;

use crate::command::Composer;
use crate::error::PaktError;
use crate::exec::Executor;
use crate::manager::Action;
use crate::store::TrackingStore;

#[derive(Debug)]
pub struct Failure {
    pub manager: String,
    pub error: PaktError,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<Failure>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Install every tracked package, manager by manager in catalog order.
/// A failing manager is logged and recorded; the rest still run.
pub fn sync(store: &TrackingStore, composer: &Composer, executor: &mut dyn Executor) -> SyncReport {
    let mut managers: Vec<(&String, &Vec<String>)> = store.package_managers.iter().filter(|(_, pkgs)| !pkgs.is_empty()).collect();
    managers.sort_by_key(|(id, _)| composer.catalog().rank(id));

    let mut report = SyncReport::default();
    for (manager, packages) in managers {
        log::info!("syncing {} package(s) via {}", packages.len(), manager);
        let started = Instant::now();
        let result = composer
            .compose_for(Action::Install, &[manager.as_str()], packages)
            .and_then(|composed| executor.run(&composed.chain));
        let elapsed = humantime::format_duration(std::time::Duration::from_secs(started.elapsed().as_secs()));
        match result {
            Ok(()) => {
                log::info!("{} done in {}", manager, elapsed);
                report.succeeded.push(manager.clone());
            }
            Err(error) => {
                log::error!("{} failed after {}: {}", manager, elapsed, error);
                report.failed.push(Failure { manager: manager.clone(), error });
            }
        }
    }
    report
}
