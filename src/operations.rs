use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use itertools::Itertools;
use tracing::{debug, info};

use crate::error::MediatorError;
use crate::loader;
use crate::metrics::{self, OperationPhases, OperationStats};
use crate::pattern::PatternCache;
use crate::policy::{Route, SecurityPolicy};
use crate::qualify::qualify_all;
use crate::resolver::resolve_expanded_with;
use crate::timers::{PhaseTimer, as_ms};
use crate::types::{
    AttributeName, Criteria, Mapping, OperationCommand, OperationKind, OperationOutcome,
    OperationResult, Table, check_columns, project,
};

/// The caller-facing operations over the active policy.
///
/// Every outbound operation (`get`, `post`, `put`, `delete`) returns exactly
/// one [`OperationCommand`] per configured provider, in policy order, even
/// for providers the request does not touch. `head` returns one [`Mapping`]
/// per provider in the same order.
///
/// # Thread Safety
///
/// `DataOperations` is `Clone + Send + Sync`. Clones share the policy and the
/// command id sequence. Each call takes a snapshot of the policy under a
/// short read lock and works on that snapshot, so a concurrent
/// [`DataOperations::reload_from_str`] never changes the policy under a
/// running call.
///
/// # Example
///
/// ```rust
/// use mediator_core::DataOperations;
///
/// let ops = DataOperations::new_from_str(r#"{
///     "providers": ["csp1", "csp2"],
///     "attributes": [
///         { "name": "patient/pat_id", "providers": ["csp1"] },
///         { "name": "patient/pat_name", "providers": ["csp2"] }
///     ]
/// }"#).unwrap();
///
/// let commands = ops.get(&["pat_id", "patient/pat_name"], &[]).unwrap();
/// assert_eq!(commands.len(), 2);
/// assert_eq!(commands[0].protected_attribute_names(), &["*/patient/pat_id".to_string()]);
/// assert_eq!(commands[1].mapping().get("patient/pat_name"), Some("*/patient/pat_name"));
/// ```
#[derive(Clone)]
pub struct DataOperations {
    inner: Arc<RwLock<Arc<SecurityPolicy>>>,
    next_id: Arc<AtomicU64>,
}

/// One resolved caller name bound for one provider.
#[derive(Debug)]
struct Routed {
    origin: usize,
    provider: usize,
    protected_name: String,
}

#[derive(Debug, Default)]
struct Plan {
    names: Vec<Routed>,
    criteria: Vec<(usize, Criteria)>,
    resolved_names: usize,
}

impl DataOperations {
    pub fn new(policy: SecurityPolicy) -> Self {
        DataOperations {
            inner: Arc::new(RwLock::new(Arc::new(policy))),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn new_from_str(policy_text: &str) -> Result<Self, MediatorError> {
        Ok(Self::new(loader::load_policy(policy_text)?))
    }

    /// Swap in a new policy. Operations already running keep the policy
    /// they started with.
    pub fn reload_from_str(&self, policy_text: &str) -> Result<(), MediatorError> {
        let policy = loader::load_policy(policy_text)?;
        self.reload(policy)
    }

    pub fn reload(&self, policy: SecurityPolicy) -> Result<(), MediatorError> {
        let providers = policy.providers().len();
        let attributes = policy.attributes().len();
        *self.inner.write()? = Arc::new(policy);
        info!(
            event = "Policy",
            phase = "Reloaded",
            providers = providers,
            attributes = attributes
        );
        metrics::record_reload(providers, attributes);
        Ok(())
    }

    /// Snapshot of the active policy.
    pub fn policy(&self) -> Result<Arc<SecurityPolicy>, MediatorError> {
        let guard = self.inner.read()?;
        Ok(Arc::clone(&*guard))
    }

    /// Read `names` matching `criteria`; one command per provider.
    pub fn get<S: AsRef<str>>(
        &self,
        names: &[S],
        criteria: &[Criteria],
    ) -> Result<Vec<OperationCommand>, MediatorError> {
        self.outbound(OperationKind::Get, names, criteria, None)
    }

    /// Store `contents`, whose columns follow `names`.
    pub fn post<S: AsRef<str>>(
        &self,
        names: &[S],
        contents: &Table,
    ) -> Result<Vec<OperationCommand>, MediatorError> {
        self.outbound(OperationKind::Post, names, &[], Some(contents))
    }

    /// Update the rows matching `criteria` with `contents`.
    pub fn put<S: AsRef<str>>(
        &self,
        names: &[S],
        criteria: &[Criteria],
        contents: &Table,
    ) -> Result<Vec<OperationCommand>, MediatorError> {
        self.outbound(OperationKind::Put, names, criteria, Some(contents))
    }

    pub fn delete<S: AsRef<str>>(
        &self,
        names: &[S],
        criteria: &[Criteria],
    ) -> Result<Vec<OperationCommand>, MediatorError> {
        self.outbound(OperationKind::Delete, names, criteria, None)
    }

    /// Resolve names only. Leaf wildcards are allowed, and names that no
    /// governed attribute covers are left out of every mapping.
    pub fn head<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Mapping>, MediatorError> {
        let start = Instant::now();
        let policy = self.policy()?;
        let plan = plan(&policy, OperationKind::Head, names, &[], None)?;

        let mappings: Vec<Mapping> = (0..policy.providers().len())
            .map(|index| {
                let mut mapping = Mapping::new();
                for routed in plan.names.iter().filter(|r| r.provider == index) {
                    mapping.push(names[routed.origin].as_ref(), routed.protected_name.as_str());
                }
                mapping
            })
            .collect();

        metrics::record_operation(OperationStats {
            operation: OperationKind::Head,
            duration: start.elapsed(),
            providers_involved: mappings.iter().filter(|m| !m.is_empty()).count(),
            resolved_names: plan.resolved_names,
        });

        Ok(mappings)
    }

    /// Rebuild caller-facing rows from what each provider returned for a
    /// `get`. `contents[i]` answers `commands[i]`.
    ///
    /// When a provider holding requested columns came back empty while
    /// others returned rows, the result is a fresh command for each such
    /// provider instead.
    pub fn get_response(
        &self,
        commands: &[OperationCommand],
        contents: &[Table],
    ) -> Result<Vec<OperationOutcome>, MediatorError> {
        let start = Instant::now();

        if contents.len() != commands.len() {
            return Err(MediatorError::SchemaMismatch(format!(
                "{} tables for {} commands",
                contents.len(),
                commands.len()
            )));
        }
        let Some(first) = commands.first() else {
            return Err(MediatorError::SchemaMismatch(
                "no commands to answer".to_string(),
            ));
        };

        for (command, table) in commands.iter().zip(contents) {
            if command.mapping().len() != command.protected_attribute_names().len() {
                return Err(MediatorError::SchemaMismatch(format!(
                    "command {}: {} mapping entries for {} protected names",
                    command.id(),
                    command.mapping().len(),
                    command.protected_attribute_names().len()
                )));
            }
            check_columns(
                table,
                command.protected_attribute_names().len(),
                command.provider(),
            )?;
        }

        let row_counts: Vec<usize> = contents
            .iter()
            .filter(|t| !t.is_empty())
            .map(Vec::len)
            .unique()
            .collect();
        if row_counts.len() > 1 {
            return Err(MediatorError::SchemaMismatch(format!(
                "providers returned different row counts: {}",
                row_counts.iter().join(", ")
            )));
        }
        let rows = row_counts.first().copied().unwrap_or(0);

        let lagging: Vec<&OperationCommand> = commands
            .iter()
            .zip(contents)
            // Criteria-only providers filter and return no columns, so an empty
            // table from them is an answer, not a lag.
            .filter(|(command, table)| {
                !command.protected_attribute_names().is_empty() && table.is_empty()
            })
            .map(|(command, _)| command)
            .collect();

        if rows > 0 && !lagging.is_empty() {
            debug!(
                event = "Operation",
                phase = "FollowUp",
                providers = lagging.iter().map(|c| c.provider()).join(",")
            );
            let outcomes = lagging
                .into_iter()
                .map(|command| OperationOutcome::Command(command.reissue(self.next_id())))
                .collect();
            self.record(OperationKind::GetResponse, start, commands, 0);
            return Ok(outcomes);
        }

        let columns = first
            .attribute_names()
            .iter()
            .map(|name| {
                commands
                    .iter()
                    .enumerate()
                    .find_map(|(i, command)| command.mapping().position(name).map(|k| (i, k)))
                    .ok_or_else(|| {
                        MediatorError::SchemaMismatch(format!(
                            "no provider answers for '{name}'"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let table: Table = (0..rows)
            .map(|r| {
                columns
                    .iter()
                    .map(|&(i, k)| contents[i][r][k].clone())
                    .collect()
            })
            .collect();

        debug!(
            event = "Operation",
            phase = "Response",
            columns = columns.len(),
            rows = rows
        );

        self.record(OperationKind::GetResponse, start, commands, columns.len());
        Ok(vec![OperationOutcome::Response(OperationResult::new(
            self.next_id(),
            first.attribute_names().to_vec(),
            table,
        ))])
    }

    fn outbound<S: AsRef<str>>(
        &self,
        kind: OperationKind,
        names: &[S],
        criteria: &[Criteria],
        contents: Option<&Table>,
    ) -> Result<Vec<OperationCommand>, MediatorError> {
        let start = Instant::now();
        let mut resolve = Duration::ZERO;
        let mut build = Duration::ZERO;

        let policy = self.policy()?;

        let plan = {
            let _timer = PhaseTimer::new(&mut resolve);
            plan(&policy, kind, names, criteria, contents)?
        };

        let commands = {
            let _timer = PhaseTimer::new(&mut build);
            self.build_commands(&policy, names, &plan, contents)
        };

        debug!(
            event = "Operation",
            phase = "Commands",
            operation = kind.to_string(),
            names = names.len(),
            resolved = plan.resolved_names,
            providers = commands.len()
        );

        let stats = self.record(kind, start, &commands, plan.resolved_names);
        metrics::record_operation_phases(
            stats,
            OperationPhases {
                resolve_ms: as_ms(resolve),
                build_ms: as_ms(build),
                total_ms: as_ms(start.elapsed()),
            },
        );

        Ok(commands)
    }

    fn build_commands<S: AsRef<str>>(
        &self,
        policy: &SecurityPolicy,
        names: &[S],
        plan: &Plan,
        contents: Option<&Table>,
    ) -> Vec<OperationCommand> {
        policy
            .providers()
            .iter()
            .enumerate()
            .map(|(index, provider)| {
                let mut builder = OperationCommand::builder(
                    self.next_id(),
                    provider.as_str(),
                    names.iter().map(|n| n.as_ref()),
                );

                let mut columns = Vec::new();
                for routed in plan.names.iter().filter(|r| r.provider == index) {
                    builder = builder.protect(names[routed.origin].as_ref(), routed.protected_name.as_str());
                    columns.push(routed.origin);
                }
                for (_, criterion) in plan.criteria.iter().filter(|(p, _)| *p == index) {
                    builder = builder.criterion(criterion.clone());
                }
                if let Some(contents) = contents {
                    builder = builder.contents(if columns.is_empty() {
                        Table::new()
                    } else {
                        project(contents, &columns)
                    });
                }

                builder.build()
            })
            .collect()
    }

    fn record(
        &self,
        kind: OperationKind,
        start: Instant,
        commands: &[OperationCommand],
        resolved_names: usize,
    ) -> OperationStats {
        let stats = OperationStats {
            operation: kind,
            duration: start.elapsed(),
            providers_involved: commands.iter().filter(|c| c.is_involved()).count(),
            resolved_names,
        };
        metrics::record_operation(stats.clone());
        stats
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Qualify, check and resolve the names and criteria of one operation, and
/// route every resolved name to its providers. Nothing is built unless the
/// whole request is valid.
fn plan<S: AsRef<str>>(
    policy: &SecurityPolicy,
    kind: OperationKind,
    names: &[S],
    criteria: &[Criteria],
    contents: Option<&Table>,
) -> Result<Plan, MediatorError> {
    let qualified = qualify_all(names)?;
    let qualified_criteria = qualify_all(criteria.iter().map(|c| c.attribute_name.as_str()))?;

    if !kind.allows_leaf_wildcard() {
        let raw = names
            .iter()
            .map(|n| n.as_ref())
            .chain(criteria.iter().map(|c| c.attribute_name.as_str()));
        if let Some((_, name)) = qualified
            .iter()
            .chain(&qualified_criteria)
            .zip(raw)
            .find(|(q, _)| q.has_leaf_wildcard())
        {
            return Err(MediatorError::UnsupportedLeafWildcard(name.to_string()));
        }
    }

    if let Some(contents) = contents {
        check_columns(contents, names.len(), "contents")?;
    }

    let governed = policy.governed_names();
    let mut cache = PatternCache::new();
    let mut plan = Plan::default();

    let resolutions = resolve_expanded_with(&qualified, &governed, &mut cache)?;
    for (origin, resolution) in resolutions.iter().enumerate() {
        for resolved in &resolution.names {
            plan.resolved_names += 1;
            for route in routes_for(policy, kind, resolved, &mut cache)? {
                plan.names.push(Routed {
                    origin,
                    provider: route.provider,
                    protected_name: route.protected_name,
                });
            }
        }
    }

    let resolutions = resolve_expanded_with(&qualified_criteria, &governed, &mut cache)?;
    for (criterion, resolution) in criteria.iter().zip(&resolutions) {
        for resolved in &resolution.names {
            for route in routes_for(policy, kind, resolved, &mut cache)? {
                plan.criteria
                    .push((route.provider, criterion.renamed(route.protected_name)));
            }
        }
    }

    Ok(plan)
}

fn routes_for(
    policy: &SecurityPolicy,
    kind: OperationKind,
    resolved: &AttributeName,
    cache: &mut PatternCache,
) -> Result<Vec<Route>, MediatorError> {
    let routes = policy.routes(resolved, cache)?;
    if !routes.is_empty() {
        return Ok(routes);
    }

    if kind == OperationKind::Head {
        debug!(
            event = "Operation",
            phase = "Ungoverned",
            name = resolved.as_str()
        );
        return Ok(Vec::new());
    }

    debug!(
        event = "Operation",
        phase = "DefaultProvider",
        name = resolved.as_str(),
        provider = policy.default_provider()
    );
    Ok(vec![policy.default_route(resolved)])
}

#[cfg(test)]
mod tests;
