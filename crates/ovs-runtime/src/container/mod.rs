//! Service container
//!
//! Owns every managed service from discovery to teardown. Startup is
//! all-or-nothing: descriptors are resolved into a dependency order,
//! constructed, then enabled; any failure rolls back what was already
//! enabled, in reverse order, and surfaces the original error. A scoped
//! reload restarts one provider together with its transitive dependents
//! while the rest of the container keeps running.

pub mod discovery;
pub mod resolver;

use ovs_domain::descriptor::{LifecycleState, ServiceDescriptor};
use ovs_domain::error::{Error, Result};
use ovs_domain::key::CapabilityKey;
use ovs_domain::ports::service::{Service, ServiceContext};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

pub use discovery::{DiscoveryReport, RejectedCandidate, discover, discover_from};
pub use resolver::resolve;

/// One managed service slot
#[derive(Debug)]
struct ManagedService {
    descriptor: ServiceDescriptor,
    state: LifecycleState,
    instance: Option<Arc<dyn Service>>,
    context: Option<ServiceContext>,
}

impl ManagedService {
    fn new(descriptor: ServiceDescriptor) -> Self {
        Self {
            descriptor,
            state: LifecycleState::Discovered,
            instance: None,
            context: None,
        }
    }
}

/// Service container and lifecycle scheduler
#[derive(Debug)]
pub struct Container {
    services: Vec<ManagedService>,
    /// Indices into `services`, provider-before-dependent
    start_order: Vec<usize>,
    provider_of: HashMap<CapabilityKey, usize>,
    data_dir: PathBuf,
    config_dir: PathBuf,
    initialized: bool,
}

impl Container {
    /// Create an empty container rooted at the given directories
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(data_dir: P, config_dir: Q) -> Self {
        Self {
            services: Vec::new(),
            start_order: Vec::new(),
            provider_of: HashMap::new(),
            data_dir: data_dir.into(),
            config_dir: config_dir.into(),
            initialized: false,
        }
    }

    /// Create a container from the runtime configuration
    pub fn from_config(config: &crate::config::RuntimeConfig) -> Self {
        Self::new(&config.data_dir, &config.config_dir)
    }

    /// Register a descriptor directly.
    ///
    /// Fails on an invalid descriptor or after initialization.
    pub fn register(&mut self, descriptor: ServiceDescriptor) -> Result<()> {
        if self.initialized {
            return Err(Error::lifecycle(
                &descriptor.name,
                "register",
                "container is already initialized",
            ));
        }
        descriptor.validate()?;
        self.services.push(ManagedService::new(descriptor));
        Ok(())
    }

    /// Register every valid candidate from the static registry.
    ///
    /// Malformed candidates are skipped; the returned report lists them.
    pub fn discover(&mut self) -> Result<DiscoveryReport> {
        if self.initialized {
            return Err(Error::lifecycle(
                "<container>",
                "discover",
                "container is already initialized",
            ));
        }
        let report = discovery::discover();
        for descriptor in &report.descriptors {
            self.services.push(ManagedService::new(descriptor.clone()));
        }
        Ok(report)
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no services are registered
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Lifecycle state of a service, by name
    pub fn state(&self, name: &str) -> Option<LifecycleState> {
        self.services
            .iter()
            .find(|s| s.descriptor.name == name)
            .map(|s| s.state)
    }

    /// Look up the enabled provider of a capability.
    ///
    /// Returns `None` when no provider exists or the provider is not
    /// currently enabled; a disabled or failed service is never handed out.
    pub fn lookup(&self, key: &CapabilityKey) -> Option<Arc<dyn Service>> {
        let &idx = self.provider_of.get(key)?;
        let service = &self.services[idx];
        if !service.state.is_enabled() {
            return None;
        }
        service.instance.clone()
    }

    /// Look up the enabled provider of a capability as a concrete type
    pub fn lookup_as<T: Service>(&self, key: &CapabilityKey) -> Option<Arc<T>> {
        self.lookup(key)?.into_any_arc().downcast::<T>().ok()
    }

    /// Resolve, construct, and enable every registered service.
    ///
    /// All-or-nothing: on any failure the services enabled so far are
    /// disabled again in reverse order and the original error is returned.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::lifecycle(
                "<container>",
                "initialize",
                "container is already initialized",
            ));
        }

        let descriptors: Vec<ServiceDescriptor> =
            self.services.iter().map(|s| s.descriptor.clone()).collect();
        let order = resolver::resolve(&descriptors)?;

        self.provider_of.clear();
        for (idx, service) in self.services.iter_mut().enumerate() {
            for key in &service.descriptor.provides {
                self.provider_of.insert(key.clone(), idx);
            }
            service.state = LifecycleState::Resolved;
        }
        self.start_order = order;

        self.construct_all()?;
        self.enable_all().await?;

        self.initialized = true;
        info!(services = self.services.len(), "container initialized");
        Ok(())
    }

    /// Disable every enabled service in reverse start order.
    ///
    /// Every disable hook runs even when an earlier one fails; the first
    /// error is returned after the sweep completes.
    pub async fn shutdown(&mut self) -> Result<()> {
        let mut first_error: Option<Error> = None;

        for &idx in self.start_order.clone().iter().rev() {
            if self.services[idx].state != LifecycleState::Enabled {
                continue;
            }
            if let Err(e) = self.disable_one(idx).await {
                error!(
                    service = %self.services[idx].descriptor.name,
                    error = %e,
                    "disable hook failed during shutdown"
                );
                first_error.get_or_insert(e);
            }
        }

        for service in &mut self.services {
            service.instance = None;
            service.context = None;
        }
        self.initialized = false;
        info!("container shut down");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Restart the provider of a capability together with every service
    /// that transitively depends on it.
    ///
    /// Affected services are disabled in reverse start order, then
    /// reconstructed and re-enabled in forward start order. Services
    /// outside the affected set keep running untouched.
    pub async fn reload(&mut self, key: &CapabilityKey) -> Result<()> {
        let &target = self
            .provider_of
            .get(key)
            .ok_or_else(|| Error::not_found(format!("capability '{key}'")))?;

        let affected = self.affected_set(target);
        info!(
            capability = %key,
            services = affected.len(),
            "reloading capability scope"
        );

        // Stop the scope, dependents first
        for &idx in self.start_order.clone().iter().rev() {
            if affected.contains(&idx) && self.services[idx].state == LifecycleState::Enabled {
                if let Err(e) = self.disable_one(idx).await {
                    self.services[idx].state = LifecycleState::Failed;
                    return Err(e);
                }
            }
        }

        // Bring it back, providers first, with freshly constructed instances
        for &idx in self.start_order.clone().iter() {
            if !affected.contains(&idx) {
                continue;
            }
            if let Err(e) = self.construct_one(idx) {
                self.services[idx].state = LifecycleState::Failed;
                return Err(e);
            }
            if let Err(e) = self.enable_one(idx).await {
                self.services[idx].state = LifecycleState::Failed;
                return Err(e);
            }
        }
        Ok(())
    }

    /// The service at `target` plus its transitive dependents
    fn affected_set(&self, target: usize) -> HashSet<usize> {
        let mut affected: HashSet<usize> = HashSet::new();
        affected.insert(target);

        // start_order is provider-before-dependent, so one forward pass
        // reaches every transitive dependent
        for &idx in &self.start_order {
            if affected.contains(&idx) {
                continue;
            }
            let depends_on_affected = self.services[idx].descriptor.requires.iter().any(|key| {
                self.provider_of
                    .get(key)
                    .is_some_and(|provider| affected.contains(provider))
            });
            if depends_on_affected {
                affected.insert(idx);
            }
        }
        affected
    }

    /// Wire the context for one service from its providers' instances
    fn build_context(&self, idx: usize) -> Result<ServiceContext> {
        let descriptor = &self.services[idx].descriptor;
        let mut ctx = ServiceContext::new(&self.data_dir, &self.config_dir);
        for key in &descriptor.requires {
            let &provider = self.provider_of.get(key).ok_or_else(|| {
                Error::internal(format!(
                    "provider of '{key}' vanished after resolution"
                ))
            })?;
            let instance = self.services[provider].instance.clone().ok_or_else(|| {
                Error::internal(format!(
                    "provider of '{key}' has no constructed instance"
                ))
            })?;
            ctx = ctx.with_dependency(key.clone(), instance);
        }
        Ok(ctx)
    }

    fn construct_all(&mut self) -> Result<()> {
        for &idx in self.start_order.clone().iter() {
            if let Err(e) = self.construct_one(idx) {
                self.services[idx].state = LifecycleState::Failed;
                self.discard_instances();
                return Err(e);
            }
        }
        Ok(())
    }

    fn construct_one(&mut self, idx: usize) -> Result<()> {
        let ctx = self.build_context(idx)?;
        let name = self.services[idx].descriptor.name.clone();
        let construct = self.services[idx].descriptor.construct;

        let instance = construct(&ctx).map_err(|e| {
            error!(service = %name, error = %e, "construct hook failed");
            Error::lifecycle(&name, "construct", e.to_string())
        })?;

        let service = &mut self.services[idx];
        service.instance = Some(instance);
        service.context = Some(ctx);
        service.state = LifecycleState::Constructed;
        Ok(())
    }

    async fn enable_all(&mut self) -> Result<()> {
        let mut enabled: Vec<usize> = Vec::new();

        for &idx in self.start_order.clone().iter() {
            match self.enable_one(idx).await {
                Ok(()) => enabled.push(idx),
                Err(e) => {
                    self.services[idx].state = LifecycleState::Failed;
                    self.rollback(&enabled).await;
                    self.discard_instances();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn enable_one(&mut self, idx: usize) -> Result<()> {
        let name = self.services[idx].descriptor.name.clone();
        let instance = self.services[idx]
            .instance
            .clone()
            .ok_or_else(|| Error::internal(format!("service '{name}' was never constructed")))?;
        let ctx = self.services[idx]
            .context
            .clone()
            .ok_or_else(|| Error::internal(format!("service '{name}' has no context")))?;

        instance.enable(&ctx).await.map_err(|e| {
            error!(service = %name, error = %e, "enable hook failed");
            Error::lifecycle(&name, "enable", e.to_string())
        })?;

        self.services[idx].state = LifecycleState::Enabled;
        info!(service = %name, "service enabled");
        Ok(())
    }

    async fn disable_one(&mut self, idx: usize) -> Result<()> {
        let name = self.services[idx].descriptor.name.clone();
        let instance = self.services[idx]
            .instance
            .clone()
            .ok_or_else(|| Error::internal(format!("service '{name}' has no instance")))?;

        instance.disable().await.map_err(|e| {
            Error::lifecycle(&name, "disable", e.to_string())
        })?;

        self.services[idx].state = LifecycleState::Disabled;
        info!(service = %name, "service disabled");
        Ok(())
    }

    /// Disable already-enabled services in reverse order after a failure
    async fn rollback(&mut self, enabled: &[usize]) {
        for &idx in enabled.iter().rev() {
            if let Err(e) = self.disable_one(idx).await {
                // Rollback keeps going; the original failure is what the
                // caller needs to see
                warn!(
                    service = %self.services[idx].descriptor.name,
                    error = %e,
                    "disable hook failed during rollback"
                );
            }
        }
    }

    fn discard_instances(&mut self) {
        for service in &mut self.services {
            service.instance = None;
            service.context = None;
        }
    }
}
