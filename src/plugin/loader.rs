//! A single script plugin: its engine, compiled script, state and actions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rhai::{AST, CallFnOptions, Dynamic, Engine, Scope};
use tracing::{debug, error, info};

use super::action::{Action, ActionKind, Handler};
use super::effect::{Flow, Outbox};
use super::host::{self, ActionSummary, Catalog, HostContext, PluginSummary, Registration};
use crate::config::Config;
use crate::error::{HandlerError, PluginError};
use crate::message::Message;

/// Script extension for plugin files.
pub const EXTENSION: &str = "rhai";

const LOAD_HOOK: &str = "load";
const UNLOAD_HOOK: &str = "unload";

/// A loaded (or loadable) script plugin.
pub struct Plugin {
    name: String,
    path: PathBuf,
    config: Arc<Config>,
    ctx: HostContext,
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
    state: Dynamic,
    actions: Vec<Action>,
    doc: String,
}

impl Plugin {
    /// Prepare a plugin for the file at `path`.
    ///
    /// The name is the path relative to `root` without its extension.
    /// Nothing is executed until [`load`](Self::load).
    pub fn new(
        path: &Path,
        root: &Path,
        config: Arc<Config>,
        outbox: Outbox,
        catalog: Catalog,
    ) -> Result<Self, PluginError> {
        if !path.is_file() {
            return Err(PluginError::NotFound(path.to_path_buf()));
        }

        let name = plugin_name(path, root);
        let logger = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());

        let ctx = HostContext {
            logger,
            config: config.clone(),
            outbox,
            catalog,
            registrations: Arc::new(Mutex::new(Vec::new())),
            doc: Arc::new(Mutex::new(String::new())),
        };
        let engine = host::build_engine(&ctx);

        Ok(Self {
            name,
            path: path.to_path_buf(),
            config,
            ctx,
            engine,
            ast: AST::empty(),
            scope: Scope::new(),
            state: Dynamic::UNIT,
            actions: Vec::new(),
            doc: String::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// A snapshot of the value returned by the script's `load` hook.
    pub fn state(&self) -> Dynamic {
        self.state.flatten_clone()
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Execute the script, run its `load` hook and compile its actions.
    pub fn load(&mut self) -> Result<(), PluginError> {
        let source = std::fs::read_to_string(&self.path).map_err(|source| PluginError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.ast = self
            .engine
            .compile(&source)
            .map_err(|source| PluginError::Compile {
                plugin: self.name.clone(),
                source,
            })?;
        self.ast.set_source(self.path.display().to_string());
        self.scope = Scope::new();
        self.ctx.registrations.lock().clear();

        self.engine
            .run_ast_with_scope(&mut self.scope, &self.ast)
            .map_err(|source| self.script_error(source))?;

        let state = if self.defines(LOAD_HOOK, 0) {
            self.engine
                .call_fn_with_options::<Dynamic>(
                    CallFnOptions::new().eval_ast(false),
                    &mut self.scope,
                    &self.ast,
                    LOAD_HOOK,
                    (),
                )
                .map_err(|source| self.script_error(source))?
        } else {
            Dynamic::UNIT
        };
        // Handlers see this one value through `this` and their state argument.
        self.state = state.into_shared();

        let registrations = std::mem::take(&mut *self.ctx.registrations.lock());
        let mut actions = Vec::with_capacity(registrations.len());
        for reg in registrations {
            actions.push(self.bind(reg)?);
        }
        self.actions = actions;
        self.doc = self.ctx.doc.lock().clone();

        info!(plugin = %self.name, actions = self.actions.len(), "Loaded");
        Ok(())
    }

    /// Run the script's `unload` hook, if it defines one.
    pub fn unload(&mut self) -> Result<(), PluginError> {
        if self.defines(UNLOAD_HOOK, 1) {
            let state = self.state.clone();
            self.engine
                .call_fn_with_options::<Dynamic>(
                    CallFnOptions::new().eval_ast(false),
                    &mut self.scope,
                    &self.ast,
                    UNLOAD_HOOK,
                    (state,),
                )
                .map_err(|source| self.script_error(source))?;
        }
        self.actions.clear();
        info!(plugin = %self.name, "Unloaded");
        Ok(())
    }

    /// Offer `msg` to every action in registration order.
    ///
    /// Handler failures are logged and skipped. A halt or shutdown stops
    /// this plugin and is handed back to the registry.
    pub fn handle(&mut self, msg: &Message) -> Flow {
        let Self {
            name,
            ctx,
            engine,
            ast,
            scope,
            state,
            actions,
            ..
        } = self;

        for action in actions.iter() {
            let result = action.handle(msg, &ctx.outbox, |handler, matched| {
                invoke(engine, ast, scope, state, &ctx.outbox, handler, matched)
            });
            match result {
                Ok(Flow::Continue) => {}
                Ok(flow) => {
                    debug!(plugin = %name, action = %action.name, ?flow, "Dispatch stopped");
                    return flow;
                }
                Err(e) => error!(plugin = %name, action = %action.name, error = %e, "Error handling {msg}"),
            }
        }
        Flow::Continue
    }

    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            name: self.name.clone(),
            doc: self.doc.clone(),
            actions: self
                .actions
                .iter()
                .map(|action| ActionSummary {
                    kind: action.kind_name(),
                    name: action.name.clone(),
                    doc: action.doc.clone(),
                })
                .collect(),
        }
    }

    fn defines(&self, name: &str, arity: usize) -> bool {
        self.ast
            .iter_functions()
            .any(|f| f.name == name && f.params.len() == arity)
    }

    /// Resolve a registration's handler and compile it into an action.
    fn bind(&self, reg: Registration) -> Result<Action, PluginError> {
        let arities: Vec<usize> = self
            .ast
            .iter_functions()
            .filter(|f| f.name == reg.handler)
            .map(|f| f.params.len())
            .collect();
        let arity = match arities.iter().copied().find(|n| matches!(n, 1 | 2)) {
            Some(arity) => arity,
            None => {
                return Err(match arities.first() {
                    Some(&arity) => PluginError::BadArity {
                        plugin: self.name.clone(),
                        handler: reg.handler,
                        arity,
                    },
                    None => PluginError::MissingHandler {
                        plugin: self.name.clone(),
                        handler: reg.handler,
                    },
                });
            }
        };

        let handler = Handler::new(reg.handler, arity);
        let mut action = match reg.kind {
            ActionKind::Command { tokens } => Action::command(tokens, handler),
            ActionKind::Rule { pattern } => Action::rule(pattern, handler),
        }
        .with_event(reg.event)
        .owner_only(reg.require_owner)
        .with_doc(reg.doc);
        if let Some(name) = reg.name {
            action = action.with_name(name);
        }

        action
            .compile(&self.config)
            .map_err(|source| PluginError::Pattern {
                plugin: self.name.clone(),
                action: action.name.clone(),
                source,
            })?;
        Ok(action)
    }

    fn script_error(&self, source: Box<rhai::EvalAltResult>) -> PluginError {
        PluginError::Script {
            plugin: self.name.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("actions", &self.actions.len())
            .finish_non_exhaustive()
    }
}

/// Call one handler with the plugin state bound as `this`.
///
/// Arity-2 handlers also get the shared state handle as their second
/// argument, so changes made through either name persist.
fn invoke(
    engine: &Engine,
    ast: &AST,
    scope: &mut Scope<'static>,
    state: &mut Dynamic,
    outbox: &Outbox,
    handler: &Handler,
    msg: Message,
) -> Result<Flow, HandlerError> {
    let shared = (handler.arity == 2).then(|| state.clone());
    let options = CallFnOptions::new()
        .eval_ast(false)
        .rewind_scope(true)
        .bind_this_ptr(state);

    let result = match shared {
        Some(shared) => {
            engine.call_fn_with_options::<Dynamic>(options, scope, ast, &handler.name, (msg, shared))
        }
        None => engine.call_fn_with_options::<Dynamic>(options, scope, ast, &handler.name, (msg,)),
    };

    let flow = outbox.take_flow();
    result.map_err(|source| HandlerError::Script {
        handler: handler.name.clone(),
        source,
    })?;
    Ok(flow)
}

fn plugin_name(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
