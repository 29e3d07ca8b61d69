use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::ModuleCtx;
use crate::contracts::{
    DbModule, Module, OpenApiRegistry, RestHostModule, RestfulModule, StatefulModule,
};

/// One module and the capabilities it exposes to the runtime.
pub struct ModuleEntry {
    pub name: &'static str,
    pub deps: Vec<&'static str>,
    pub core: Arc<dyn Module>,
    pub rest: Option<Arc<dyn RestfulModule>>,
    pub rest_host: Option<Arc<dyn RestHostModule>>,
    pub db: Option<Arc<dyn DbModule>>,
    pub stateful: Option<Arc<dyn StatefulModule>>,
}

impl ModuleEntry {
    pub fn new(name: &'static str, core: Arc<dyn Module>) -> Self {
        Self {
            name,
            deps: Vec::new(),
            core,
            rest: None,
            rest_host: None,
            db: None,
            stateful: None,
        }
    }

    pub fn depends_on(mut self, deps: &[&'static str]) -> Self {
        self.deps.extend_from_slice(deps);
        self
    }

    pub fn with_rest(mut self, m: Arc<dyn RestfulModule>) -> Self {
        self.rest = Some(m);
        self
    }

    pub fn with_rest_host(mut self, m: Arc<dyn RestHostModule>) -> Self {
        self.rest_host = Some(m);
        self
    }

    pub fn with_db(mut self, m: Arc<dyn DbModule>) -> Self {
        self.db = Some(m);
        self
    }

    pub fn with_stateful(mut self, m: Arc<dyn StatefulModule>) -> Self {
        self.stateful = Some(m);
        self
    }
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("has_rest", &self.rest.is_some())
            .field("is_rest_host", &self.rest_host.is_some())
            .field("has_db", &self.db.is_some())
            .field("has_stateful", &self.stateful.is_some())
            .finish()
    }
}

/// Modules in dependency order (dependencies first).
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.modules.iter().map(|m| m.name).collect();
        f.debug_struct("ModuleRegistry")
            .field("modules", &names)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.core.clone())
    }

    pub async fn run_init_phase(&self, base_ctx: &ModuleCtx) -> Result<(), RegistryError> {
        for e in &self.modules {
            let ctx = base_ctx.clone().for_module(e.name);
            e.core
                .init(&ctx)
                .await
                .map_err(|source| RegistryError::Init {
                    module: e.name,
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn run_db_phase(&self, db: &modkit_db::DbHandle) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(dbm) = &e.db {
                tracing::debug!(module = e.name, "running migrations");
                dbm.migrate(db)
                    .await
                    .map_err(|source| RegistryError::DbMigrate {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Host prepare → every module's routes → host finalize.
    pub fn run_rest_phase(
        &self,
        base_ctx: &ModuleCtx,
        mut router: Router,
    ) -> Result<Router, RegistryError> {
        let mut hosts = self.modules.iter().filter_map(|e| {
            e.rest_host.as_ref().map(|h| (e.name, h))
        });
        let Some((host_name, host)) = hosts.next() else {
            return if self.modules.iter().any(|e| e.rest.is_some()) {
                Err(RegistryError::RestRequiresHost)
            } else {
                Ok(router)
            };
        };
        if hosts.next().is_some() {
            return Err(RegistryError::MultipleRestHosts);
        }

        let host_ctx = base_ctx.clone().for_module(host_name);
        let openapi: &dyn OpenApiRegistry = host.as_registry();

        router = host
            .rest_prepare(&host_ctx, router)
            .map_err(|source| RegistryError::RestPrepare {
                module: host_name,
                source,
            })?;

        for e in &self.modules {
            if let Some(rest) = &e.rest {
                let ctx = base_ctx.clone().for_module(e.name);
                router = rest
                    .register_rest(&ctx, router, openapi)
                    .map_err(|source| RegistryError::RestRegister {
                        module: e.name,
                        source,
                    })?;
            }
        }

        host.rest_finalize(&host_ctx, router)
            .map_err(|source| RegistryError::RestFinalize {
                module: host_name,
                source,
            })
    }

    pub async fn run_start_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(s) = &e.stateful {
                s.start(cancel.clone())
                    .await
                    .map_err(|source| RegistryError::Start {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Reverse dependency order; failures are logged, never propagated.
    pub async fn run_stop_phase(&self, cancel: CancellationToken) {
        for e in self.modules.iter().rev() {
            if let Some(s) = &e.stateful {
                if let Err(err) = s.stop(cancel.clone()).await {
                    tracing::warn!(module = e.name, error = %err, "failed to stop module");
                }
            }
        }
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<ModuleEntry>,
}

impl RegistryBuilder {
    pub fn register(mut self, entry: ModuleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Validate names and dependencies, then order modules so that every
    /// dependency precedes its dependents. Ties keep registration order.
    pub fn build(self) -> Result<ModuleRegistry, RegistryError> {
        let mut index: HashMap<&'static str, usize> = HashMap::new();
        for (i, e) in self.entries.iter().enumerate() {
            if index.insert(e.name, i).is_some() {
                return Err(RegistryError::DuplicateModule(e.name));
            }
        }
        if self.entries.iter().filter(|e| e.rest_host.is_some()).count() > 1 {
            return Err(RegistryError::MultipleRestHosts);
        }
        for e in &self.entries {
            if let Some(missing) = e.deps.iter().find(|d| !index.contains_key(*d)) {
                return Err(RegistryError::UnknownDependency {
                    module: e.name,
                    depends_on: missing.to_string(),
                });
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Visiting,
            Done,
        }

        fn visit(
            i: usize,
            entries: &[ModuleEntry],
            index: &HashMap<&'static str, usize>,
            marks: &mut [Mark],
            stack: &mut Vec<usize>,
            order: &mut Vec<usize>,
        ) -> Result<(), RegistryError> {
            match marks[i] {
                Mark::Done => return Ok(()),
                Mark::Visiting => {
                    let start = stack.iter().position(|&n| n == i).unwrap_or(0);
                    let mut path: Vec<&'static str> =
                        stack[start..].iter().map(|&n| entries[n].name).collect();
                    path.push(entries[i].name);
                    return Err(RegistryError::CycleDetected { path });
                }
                Mark::New => {}
            }
            marks[i] = Mark::Visiting;
            stack.push(i);
            for dep in &entries[i].deps {
                visit(index[dep], entries, index, marks, stack, order)?;
            }
            stack.pop();
            marks[i] = Mark::Done;
            order.push(i);
            Ok(())
        }

        let mut marks = vec![Mark::New; self.entries.len()];
        let mut order = Vec::with_capacity(self.entries.len());
        let mut stack = Vec::new();
        for i in 0..self.entries.len() {
            visit(i, &self.entries, &index, &mut marks, &mut stack, &mut order)?;
        }

        let mut slots: Vec<Option<ModuleEntry>> = self.entries.into_iter().map(Some).collect();
        let modules: Vec<ModuleEntry> = order.into_iter().filter_map(|i| slots[i].take()).collect();

        tracing::info!(
            modules = ?modules.iter().map(|e| e.name).collect::<Vec<_>>(),
            "module order resolved"
        );
        Ok(ModuleRegistry { modules })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("initialization failed for module '{module}'")]
    Init {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("start failed for '{module}'")]
    Start {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("DB migration failed for module '{module}'")]
    DbMigrate {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST prepare failed for host module '{module}'")]
    RestPrepare {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST registration failed for module '{module}'")]
    RestRegister {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST finalize failed for host module '{module}'")]
    RestFinalize {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("modules expose REST routes but no module hosts the router")]
    RestRequiresHost,
    #[error("multiple 'rest_host' modules detected; exactly one is allowed")]
    MultipleRestHosts,
    #[error("module '{0}' is registered twice")]
    DuplicateModule(&'static str),
    #[error("module '{module}' depends on unknown '{depends_on}'")]
    UnknownDependency {
        module: &'static str,
        depends_on: String,
    },
    #[error("cyclic dependency detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<&'static str> },
}
