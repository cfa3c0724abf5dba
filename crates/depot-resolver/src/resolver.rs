//! Core resolution algorithm: rule application, version selection,
//! highest-wins conflict resolution, cycle detection, and tree assembly.
//!
//! A `resolve` call runs one or more passes over the requested modules.
//! Siblings are expanded concurrently; every repository call goes through a
//! single-flight cache and a fetch semaphore. After a pass, every module
//! resolved at more than one version is pinned to its highest version and
//! the pass repeats until no pin moves.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use depot_core::config::ResolverConfig;
use depot_core::descriptor::{Descriptor, VersionCatalog};
use depot_core::module::{ModuleIdentifier, ModuleSpecification};
use depot_core::rule::Rule;
use depot_core::version::MavenVersion;
use depot_maven::client::{RepositoryClient, RepositoryError};
use depot_util::errors::DepotError;
use futures_util::future::{join_all, BoxFuture, FutureExt};
use tokio::sync::Semaphore;

use crate::cache::ResolutionCache;
use crate::conflict::{ConflictReport, VersionConflict};
use crate::module::{Module, ModuleError, ModuleState};
use crate::rules::RuleEngine;

const HIGHEST_WINS: &str = "highest version wins";

/// The outcome of one `resolve` call.
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    /// One node per requested specification, in request order.
    pub roots: Vec<Module>,
    /// Every resolved module, unique by identifier, in depth-first order.
    pub resolved: Vec<Module>,
    /// Every unresolved node, in depth-first order.
    pub unresolved: Vec<Module>,
    pub conflicts: ConflictReport,
    /// The call was cancelled; unfinished nodes are `Pending` or `Fetching`.
    pub cancelled: bool,
    /// Number of passes run, including conflict-resolution passes.
    pub passes: usize,
}

impl ResolutionResult {
    pub fn resolved_identifiers(&self) -> Vec<&ModuleIdentifier> {
        self.resolved
            .iter()
            .filter_map(|m| m.resolved_identifier.as_ref())
            .collect()
    }

    /// The canonical resolved node for `id`.
    pub fn get(&self, id: &ModuleIdentifier) -> Option<&Module> {
        self.resolved
            .iter()
            .find(|m| m.resolved_identifier.as_ref() == Some(id))
    }

    /// Whether every module resolved and the call ran to completion.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty() && !self.cancelled
    }
}

/// Cooperative cancellation for a [`Resolver`].
///
/// Once cancelled, no new repository fetches start and results of fetches
/// that were in flight are discarded. The flag stays set until [`reset`].
///
/// [`reset`]: CancellationHandle::reset
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Per-pass state shared by every branch of the pass.
struct Pass<'a> {
    rules: &'a RuleEngine,
    pins: &'a HashMap<(String, String), String>,
    replaced: Mutex<Vec<VersionConflict>>,
}

impl Pass<'_> {
    fn pin(&self, group: &str, name: &str) -> Option<&str> {
        self.pins
            .get(&(group.to_string(), name.to_string()))
            .map(String::as_str)
    }

    fn record(&self, conflict: VersionConflict) {
        self.replaced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(conflict);
    }
}

/// Resolves module specifications against an ordered list of repositories.
///
/// Descriptors and version catalogs are cached for the lifetime of the
/// resolver and reused across `resolve` calls.
pub struct Resolver {
    config: ResolverConfig,
    repositories: Vec<Arc<dyn RepositoryClient>>,
    descriptors: ResolutionCache<ModuleIdentifier, Descriptor, ModuleError>,
    catalogs: ResolutionCache<(String, String), VersionCatalog, ModuleError>,
    fetch_permits: Semaphore,
    repository_lock: tokio::sync::Mutex<()>,
    cancellation: CancellationHandle,
}

impl Resolver {
    pub fn new(config: ResolverConfig, repositories: Vec<Arc<dyn RepositoryClient>>) -> Self {
        let permits = config.max_concurrent_fetches.max(1);
        Self {
            config,
            repositories,
            descriptors: ResolutionCache::new(),
            catalogs: ResolutionCache::new(),
            fetch_permits: Semaphore::new(permits),
            repository_lock: tokio::sync::Mutex::new(()),
            cancellation: CancellationHandle::default(),
        }
    }

    pub fn repositories(&self) -> &[Arc<dyn RepositoryClient>] {
        &self.repositories
    }

    /// Descriptor lookups served from the cache so far.
    pub fn cache_hits(&self) -> u64 {
        self.descriptors.hits()
    }

    /// Version catalog lookups served from the cache so far.
    pub fn catalog_hits(&self) -> u64 {
        self.catalogs.hits()
    }

    pub fn cancellation_handle(&self) -> CancellationHandle {
        self.cancellation.clone()
    }

    /// Resolve `requests` into a dependency tree.
    ///
    /// Per-module failures end up in [`ResolutionResult::unresolved`]; only
    /// invalid rules or specifications fail the call.
    pub async fn resolve(
        &self,
        requests: &[ModuleSpecification],
        rules: &[Rule],
    ) -> Result<ResolutionResult, DepotError> {
        let engine = RuleEngine::new(rules)?;
        for request in requests {
            request.validate()?;
        }

        let mut pins: HashMap<(String, String), String> = HashMap::new();
        let mut conflicts = ConflictReport::new();
        let mut passes = 0;

        let roots = loop {
            passes += 1;
            tracing::info!(
                "resolution pass {passes}: {} requested modules, {} rules, {} pins",
                requests.len(),
                engine.len(),
                pins.len()
            );

            let pass = Pass {
                rules: &engine,
                pins: &pins,
                replaced: Mutex::new(Vec::new()),
            };
            let roots = join_all(
                requests
                    .iter()
                    .map(|spec| self.expand(&pass, spec.clone(), Vec::new(), true)),
            )
            .await;
            let replaced = pass
                .replaced
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner);
            for conflict in replaced {
                conflicts.add(conflict);
            }

            if self.cancellation.is_cancelled() {
                tracing::info!("resolution cancelled during pass {passes}");
                break roots;
            }
            if !raise_pins(&roots, &mut pins, &mut conflicts) {
                break roots;
            }
            if passes >= self.config.max_conflict_rounds {
                tracing::warn!(
                    "version conflicts still moving after {passes} passes; keeping the last tree"
                );
                break roots;
            }
        };

        for ((group, name), winner) in &pins {
            conflicts.settle(group, name, winner);
        }
        conflicts.conflicts.sort_by(|a, b| {
            (&a.group, &a.name)
                .cmp(&(&b.group, &b.name))
                .then_with(|| MavenVersion::parse(&a.requested).cmp(&MavenVersion::parse(&b.requested)))
        });

        let (resolved, unresolved) = collect(&roots);
        tracing::info!(
            "resolved {} modules, {} unresolved, {} conflicts, {} cache hits, {} catalog hits",
            resolved.len(),
            unresolved.len(),
            conflicts.len(),
            self.cache_hits(),
            self.catalog_hits()
        );

        Ok(ResolutionResult {
            roots,
            resolved,
            unresolved,
            conflicts,
            cancelled: self.cancellation.is_cancelled(),
            passes,
        })
    }

    /// Resolve one specification and, recursively, its dependencies.
    fn expand<'a>(
        &'a self,
        pass: &'a Pass<'a>,
        mut spec: ModuleSpecification,
        ancestors: Vec<ModuleIdentifier>,
        is_root: bool,
    ) -> BoxFuture<'a, Module> {
        async move {
            let requested = spec.to_string();
            if pass.rules.rewrite(&mut spec) {
                tracing::debug!("rewrote {requested} to {spec}");
            }

            if pass.rules.is_excluded(&spec.group, &spec.name) {
                tracing::debug!("excluded {spec}");
                return Module::excluded(spec);
            }

            if self.cancellation.is_cancelled() {
                return Module::pending(spec);
            }
            let selected = self.select(pass, &spec).await;
            if self.cancellation.is_cancelled() {
                return in_flight(spec);
            }
            let id = match selected {
                Ok(id) => id,
                Err(reason) => {
                    tracing::debug!("{spec} is unresolved: {reason}");
                    return Module::unresolved(spec, reason);
                }
            };

            if ancestors.contains(&id) {
                tracing::debug!("cycle back to {id}, not expanding again");
                let mut module = Module::resolved(spec, id, Vec::new());
                module.cyclic = true;
                return module;
            }

            let descriptor = self.descriptor(&id).await;
            if self.cancellation.is_cancelled() {
                return in_flight(spec);
            }
            let descriptor = match descriptor {
                Ok(descriptor) => descriptor,
                Err(reason) => {
                    tracing::debug!("{id} is unresolved: {reason}");
                    return Module::unresolved(spec, reason);
                }
            };

            if !is_root && pass.rules.excludes_dependencies(&id) {
                tracing::debug!("dropping dependencies of {id}");
                return Module::resolved(spec, id, Vec::new());
            }

            let mut chain = ancestors;
            chain.push(id.clone());
            let dependencies = join_all(
                descriptor
                    .dependency_specifications
                    .into_iter()
                    .map(|dep| self.expand(pass, dep, chain.clone(), false)),
            )
            .await;

            Module::resolved(spec, id, dependencies)
        }
        .boxed()
    }

    /// Pick the identifier for `spec`, honoring conflict-resolution pins.
    async fn select(
        &self,
        pass: &Pass<'_>,
        spec: &ModuleSpecification,
    ) -> Result<ModuleIdentifier, ModuleError> {
        let constraint = spec.constraint();
        let own = match constraint.exact() {
            Some(version) => version.to_string(),
            None => {
                let catalog = self.catalog(&spec.group, &spec.name).await?;
                catalog
                    .select(&constraint)
                    .map(|id| id.version)
                    .ok_or_else(|| ModuleError::ConstraintUnsatisfiable {
                        module: spec.key(),
                        constraint: spec.version.clone().unwrap_or_default(),
                    })?
            }
        };

        let version = match pass.pin(&spec.group, &spec.name) {
            Some(pin) if MavenVersion::parse(pin) > MavenVersion::parse(&own) => {
                pass.record(VersionConflict {
                    group: spec.group.clone(),
                    name: spec.name.clone(),
                    requested: own,
                    resolved: pin.to_string(),
                    reason: HIGHEST_WINS.to_string(),
                });
                pin.to_string()
            }
            _ => own,
        };
        Ok(ModuleIdentifier::new(&spec.group, &spec.name, version))
    }

    async fn descriptor(&self, id: &ModuleIdentifier) -> Result<Descriptor, ModuleError> {
        let hits = self.descriptors.hits();
        let descriptor = self
            .descriptors
            .get_or_resolve(id, || self.fetch_descriptor(id))
            .await?;
        if self.descriptors.hits() > hits {
            tracing::debug!("cache hit for {id}");
        }
        Ok(descriptor)
    }

    async fn catalog(&self, group: &str, name: &str) -> Result<VersionCatalog, ModuleError> {
        let key = (group.to_string(), name.to_string());
        self.catalogs
            .get_or_resolve(&key, || self.fetch_catalog(group, name))
            .await
    }

    async fn fetch_descriptor(&self, id: &ModuleIdentifier) -> Result<Descriptor, ModuleError> {
        let _permit = self.fetch_permits.acquire().await.map_err(closed)?;
        let _serial = self.serialize().await;

        let mut failure = None;
        for repository in &self.repositories {
            tracing::debug!("fetching descriptor {id} from {}", repository.name());
            match repository.fetch_descriptor(id).await {
                Ok(descriptor) => return Ok(descriptor),
                Err(e) => failure = Some(note_failure(failure, e)),
            }
        }
        Err(into_module_error(failure, id.to_string()))
    }

    async fn fetch_catalog(&self, group: &str, name: &str) -> Result<VersionCatalog, ModuleError> {
        let _permit = self.fetch_permits.acquire().await.map_err(closed)?;
        let _serial = self.serialize().await;

        let mut failure = None;
        for repository in &self.repositories {
            tracing::debug!("fetching versions of {group}:{name} from {}", repository.name());
            match repository.fetch_version_catalog(group, name).await {
                Ok(catalog) => return Ok(catalog),
                Err(e) => failure = Some(note_failure(failure, e)),
            }
        }
        Err(into_module_error(failure, format!("{group}:{name}")))
    }

    async fn serialize(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        if self.config.serialize_repository_access {
            Some(self.repository_lock.lock().await)
        } else {
            None
        }
    }
}

fn in_flight(spec: ModuleSpecification) -> Module {
    Module {
        state: ModuleState::Fetching,
        ..Module::pending(spec)
    }
}

fn closed(_: tokio::sync::AcquireError) -> ModuleError {
    ModuleError::RepositoryUnavailable {
        message: "resolver is shutting down".to_string(),
    }
}

/// Keep the most informative failure: anything beats `NotFound`.
fn note_failure(previous: Option<RepositoryError>, error: RepositoryError) -> RepositoryError {
    if !error.is_not_found() {
        tracing::warn!("{error}");
    }
    match previous {
        Some(prev) if !prev.is_not_found() => prev,
        _ => error,
    }
}

fn into_module_error(failure: Option<RepositoryError>, what: String) -> ModuleError {
    match failure {
        Some(e) if !e.is_not_found() => ModuleError::RepositoryUnavailable {
            message: e.to_string(),
        },
        _ => ModuleError::NotFound { what },
    }
}

/// Pin every module resolved at several versions to the highest one.
///
/// Returns `true` when a pin moved, meaning another pass is needed.
fn raise_pins(
    roots: &[Module],
    pins: &mut HashMap<(String, String), String>,
    conflicts: &mut ConflictReport,
) -> bool {
    let mut versions: HashMap<(String, String), Vec<String>> = HashMap::new();
    for root in roots {
        root.walk(&mut |m| {
            if let (ModuleState::Resolved, Some(id)) = (m.state, &m.resolved_identifier) {
                let seen = versions
                    .entry((id.group.clone(), id.name.clone()))
                    .or_default();
                if !seen.contains(&id.version) {
                    seen.push(id.version.clone());
                }
            }
        });
    }

    let mut raised = false;
    for (key, seen) in versions {
        if seen.len() < 2 {
            continue;
        }
        let Some(highest) = seen.iter().max_by_key(|v| MavenVersion::parse(v)).cloned() else {
            continue;
        };
        for version in seen.iter().filter(|v| **v != highest) {
            conflicts.add(VersionConflict {
                group: key.0.clone(),
                name: key.1.clone(),
                requested: version.clone(),
                resolved: highest.clone(),
                reason: HIGHEST_WINS.to_string(),
            });
        }
        let moved = pins
            .get(&key)
            .map_or(true, |pin| MavenVersion::parse(&highest) > MavenVersion::parse(pin));
        if moved {
            tracing::debug!("pinning {}:{} to {highest}", key.0, key.1);
            pins.insert(key, highest);
            raised = true;
        }
    }
    raised
}

/// Depth-first, left-to-right collection of resolved and unresolved nodes.
fn collect(roots: &[Module]) -> (Vec<Module>, Vec<Module>) {
    let mut seen: HashSet<&ModuleIdentifier> = HashSet::new();
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    for root in roots {
        root.walk(&mut |m| match m.state {
            ModuleState::Resolved => {
                if let Some(id) = &m.resolved_identifier {
                    if seen.insert(id) {
                        resolved.push(m.clone());
                    }
                }
            }
            ModuleState::Unresolved => unresolved.push(m.clone()),
            _ => {}
        });
    }
    (resolved, unresolved)
}
