//! Host capabilities injected into each plugin's script engine.
//!
//! Every plugin gets its own [`Engine`] with:
//! - the `Message` type (read-only properties plus reply helpers)
//! - `command(...)` / `rule(...)` registration and `describe(text)`
//! - static modules `irc`, `plugins`, `config` and `log`
//!
//! Host functions only record effects in the shared [`Outbox`]; nothing here
//! touches the connection directly.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rhai::{Array, Dynamic, Engine, EvalAltResult, FnPtr, INT, ImmutableString, Map, Module};
use slirc_proto::{colors, format};
use tracing::{debug, error, info, trace, warn};

use super::action::{ActionKind, EventFilter};
use super::effect::{Flow, Outbox};
use crate::config::Config;
use crate::message::Message;
use crate::network::writer::{action_line, msg_line, notice_line};
use crate::util::human_time_since;

type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

/// Nesting limits for top-level code and function bodies.
const MAX_EXPR_DEPTH: usize = 128;
const MAX_FUNCTION_EXPR_DEPTH: usize = 64;

/// An action as declared by a script, before its handler is resolved.
#[derive(Debug, Clone)]
pub(crate) struct Registration {
    pub kind: ActionKind,
    pub handler: String,
    pub event: EventFilter,
    pub require_owner: bool,
    pub doc: String,
    pub name: Option<String>,
}

/// Summary of one loaded action, for help listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSummary {
    pub kind: &'static str,
    pub name: String,
    pub doc: String,
}

/// Summary of one loaded plugin, for help listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSummary {
    pub name: String,
    pub doc: String,
    pub actions: Vec<ActionSummary>,
}

/// Read-only view of the loaded plugins, shared with every engine.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    inner: Arc<RwLock<Vec<PluginSummary>>>,
}

impl Catalog {
    pub fn replace(&self, plugins: Vec<PluginSummary>) {
        *self.inner.write() = plugins;
    }

    pub fn snapshot(&self) -> Vec<PluginSummary> {
        self.inner.read().clone()
    }
}

/// Everything a plugin engine is wired to.
#[derive(Debug, Clone)]
pub(crate) struct HostContext {
    /// Plugin name, used in log fields.
    pub logger: String,
    pub config: Arc<Config>,
    pub outbox: Outbox,
    pub catalog: Catalog,
    pub registrations: Arc<Mutex<Vec<Registration>>>,
    pub doc: Arc<Mutex<String>>,
}

/// Build a fresh engine for one plugin.
pub(crate) fn build_engine(ctx: &HostContext) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_FUNCTION_EXPR_DEPTH);
    engine.set_max_operations(ctx.config.script_max_operations);

    let logger = ctx.logger.clone();
    engine.on_print(move |text| info!(plugin = %logger, "{text}"));
    let logger = ctx.logger.clone();
    engine.on_debug(move |text, _, pos| debug!(plugin = %logger, %pos, "{text}"));

    register_message(&mut engine, &ctx.outbox);
    register_actions(&mut engine, ctx);

    engine.register_static_module("irc", irc_module(&ctx.outbox).into());
    engine.register_static_module("plugins", plugins_module(ctx).into());
    engine.register_static_module("config", config_module(&ctx.config).into());
    engine.register_static_module("log", log_module(&ctx.logger).into());

    engine
}

fn opt(value: &Option<String>) -> Dynamic {
    value.clone().map_or(Dynamic::UNIT, Dynamic::from)
}

fn register_message(engine: &mut Engine, outbox: &Outbox) {
    engine.register_type_with_name::<Message>("Message");

    engine.register_get("raw", |m: &mut Message| m.raw.clone());
    engine.register_get("source", |m: &mut Message| opt(&m.source));
    engine.register_get("nick", |m: &mut Message| opt(&m.nick));
    engine.register_get("user", |m: &mut Message| opt(&m.user));
    engine.register_get("host", |m: &mut Message| opt(&m.host));
    engine.register_get("event", |m: &mut Message| opt(&m.event));
    engine.register_get("target", |m: &mut Message| opt(&m.target));
    engine.register_get("sender", |m: &mut Message| opt(&m.sender));
    engine.register_get("text", |m: &mut Message| m.text.clone());
    engine.register_get("owner", |m: &mut Message| m.owner);
    engine.register_get("args", |m: &mut Message| {
        m.args.iter().cloned().map(Dynamic::from).collect::<Array>()
    });
    engine.register_get("groups", |m: &mut Message| {
        m.captures
            .as_ref()
            .map(|c| c.groups.iter().skip(1).map(opt).collect::<Array>())
            .unwrap_or_default()
    });

    engine.register_fn("group", |m: &mut Message, name: ImmutableString| {
        m.named(&name).map_or(Dynamic::UNIT, |s| Dynamic::from(s.to_string()))
    });
    engine.register_fn("group", |m: &mut Message, idx: INT| {
        usize::try_from(idx)
            .ok()
            .and_then(|idx| m.group(idx))
            .map_or(Dynamic::UNIT, |s| Dynamic::from(s.to_string()))
    });

    let out = outbox.clone();
    engine.register_fn("reply", move |m: &mut Message, text: ImmutableString| {
        out.send_opt(m.reply(&text))
    });
    let out = outbox.clone();
    engine.register_fn("respond", move |m: &mut Message, text: ImmutableString| {
        out.send_opt(m.respond(&text))
    });
    let out = outbox.clone();
    engine.register_fn("notify", move |m: &mut Message, text: ImmutableString| {
        out.send_opt(m.notify(&text))
    });
    let out = outbox.clone();
    engine.register_fn("act", move |m: &mut Message, text: ImmutableString| {
        out.send_opt(m.act(&text))
    });

    engine.register_fn("to_string", |m: &mut Message| m.to_string());
}

fn register_actions(engine: &mut Engine, ctx: &HostContext) {
    fn command(tokens: Array, handler: String, opts: Option<Map>) -> ScriptResult<Registration> {
        let tokens = tokens
            .into_iter()
            .map(|token| {
                token
                    .into_string()
                    .map_err(|ty| format!("command tokens must be strings, got {ty}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if tokens.is_empty() {
            return Err("command needs at least one token".into());
        }
        registration(ActionKind::Command { tokens }, handler, opts)
    }

    fn rule(pattern: ImmutableString, handler: String, opts: Option<Map>) -> ScriptResult<Registration> {
        registration(
            ActionKind::Rule {
                pattern: pattern.to_string(),
            },
            handler,
            opts,
        )
    }

    let regs = ctx.registrations.clone();
    let push = move |reg: ScriptResult<Registration>| -> ScriptResult<()> {
        regs.lock().push(reg?);
        Ok(())
    };

    let p = push.clone();
    engine.register_fn("command", move |t: Array, h: ImmutableString| p(command(t, h.into(), None)));
    let p = push.clone();
    engine.register_fn("command", move |t: Array, h: FnPtr| {
        p(handler_name(&h).and_then(|h| command(t, h, None)))
    });
    let p = push.clone();
    engine.register_fn("command", move |t: Array, h: ImmutableString, o: Map| {
        p(command(t, h.into(), Some(o)))
    });
    let p = push.clone();
    engine.register_fn("command", move |t: Array, h: FnPtr, o: Map| {
        p(handler_name(&h).and_then(|h| command(t, h, Some(o))))
    });

    let p = push.clone();
    engine.register_fn("rule", move |r: ImmutableString, h: ImmutableString| p(rule(r, h.into(), None)));
    let p = push.clone();
    engine.register_fn("rule", move |r: ImmutableString, h: FnPtr| {
        p(handler_name(&h).and_then(|h| rule(r, h, None)))
    });
    let p = push.clone();
    engine.register_fn("rule", move |r: ImmutableString, h: ImmutableString, o: Map| {
        p(rule(r, h.into(), Some(o)))
    });
    let p = push;
    engine.register_fn("rule", move |r: ImmutableString, h: FnPtr, o: Map| {
        p(handler_name(&h).and_then(|h| rule(r, h, Some(o))))
    });

    let doc = ctx.doc.clone();
    engine.register_fn("describe", move |text: ImmutableString| {
        *doc.lock() = text.to_string();
    });
}

fn handler_name(ptr: &FnPtr) -> ScriptResult<String> {
    if ptr.is_anonymous() || ptr.is_curried() {
        return Err("handler must be a named function".into());
    }
    Ok(ptr.fn_name().to_string())
}

fn registration(kind: ActionKind, handler: String, opts: Option<Map>) -> ScriptResult<Registration> {
    let mut reg = Registration {
        kind,
        handler,
        event: EventFilter::default(),
        require_owner: false,
        doc: String::new(),
        name: None,
    };
    let Some(opts) = opts else {
        return Ok(reg);
    };

    for (key, value) in opts {
        match key.as_str() {
            "owner" => {
                reg.require_owner = value
                    .as_bool()
                    .map_err(|ty| format!("'owner' must be a bool, got {ty}"))?;
            }
            "event" => {
                let event = value
                    .into_string()
                    .map_err(|ty| format!("'event' must be a string, got {ty}"))?;
                reg.event = EventFilter::from(event.as_str());
            }
            "doc" => {
                let doc = value
                    .into_string()
                    .map_err(|ty| format!("'doc' must be a string, got {ty}"))?;
                reg.doc = doc.lines().next().unwrap_or_default().trim().to_string();
            }
            "name" if matches!(reg.kind, ActionKind::Rule { .. }) => {
                reg.name = Some(
                    value
                        .into_string()
                        .map_err(|ty| format!("'name' must be a string, got {ty}"))?,
                );
            }
            other => return Err(format!("unknown action option '{other}'").into()),
        }
    }
    Ok(reg)
}

fn strings(args: Array) -> Vec<String> {
    args.into_iter().map(|arg| arg.to_string()).collect()
}

fn irc_module(outbox: &Outbox) -> Module {
    let mut module = Module::new();

    let out = outbox.clone();
    module.set_native_fn("msg", move |recip: ImmutableString, text: ImmutableString| {
        out.send(msg_line(&recip, &text));
        Ok(())
    });
    let out = outbox.clone();
    module.set_native_fn("notice", move |recip: ImmutableString, text: ImmutableString| {
        out.send(notice_line(&recip, &text));
        Ok(())
    });
    let out = outbox.clone();
    module.set_native_fn("action", move |recip: ImmutableString, text: ImmutableString| {
        out.send(action_line(&recip, &text));
        Ok(())
    });
    let out = outbox.clone();
    module.set_native_fn("write", move |args: Array| {
        out.send(format::line(&strings(args), None));
        Ok(())
    });
    let out = outbox.clone();
    module.set_native_fn("write", move |args: Array, text: ImmutableString| {
        out.send(format::line(&strings(args), Some(text.as_str())));
        Ok(())
    });

    module.set_native_fn("style", |name: ImmutableString| {
        Ok(colors::style(&name).map_or(Dynamic::UNIT, |code| Dynamic::from(code.to_string())))
    });
    module.set_native_fn("styles", || {
        Ok(colors::STYLES
            .iter()
            .map(|(name, code)| ((*name).into(), Dynamic::from(code.to_string())))
            .collect::<Map>())
    });
    module.set_native_fn("format", |template: ImmutableString| {
        Ok(colors::format(&template))
    });
    module.set_native_fn("format", |template: ImmutableString, values: Map| {
        Ok(colors::format_with(&template, |key| {
            values.get(key).map(|value| value.to_string())
        }))
    });
    module.set_native_fn("human_time", |unix_seconds: INT| Ok(human_time_since(unix_seconds)));

    module
}

fn plugins_module(ctx: &HostContext) -> Module {
    let mut module = Module::new();

    let catalog = ctx.catalog.clone();
    module.set_native_fn("names", move || {
        let mut names: Vec<String> = catalog.snapshot().into_iter().map(|p| p.name).collect();
        names.sort();
        Ok(names.into_iter().map(Dynamic::from).collect::<Array>())
    });

    let catalog = ctx.catalog.clone();
    module.set_native_fn("doc", move |name: ImmutableString| {
        Ok(catalog
            .snapshot()
            .into_iter()
            .find(|p| p.name == name.as_str())
            .map_or(Dynamic::UNIT, |p| Dynamic::from(p.doc)))
    });

    let catalog = ctx.catalog.clone();
    module.set_native_fn("actions", move || {
        let mut out = Array::new();
        for plugin in catalog.snapshot() {
            for action in plugin.actions {
                let mut entry = Map::new();
                entry.insert("plugin".into(), Dynamic::from(plugin.name.clone()));
                entry.insert("kind".into(), Dynamic::from(action.kind.to_string()));
                entry.insert("name".into(), Dynamic::from(action.name));
                entry.insert("doc".into(), Dynamic::from(action.doc));
                out.push(Dynamic::from_map(entry));
            }
        }
        Ok(out)
    });

    let out = ctx.outbox.clone();
    module.set_native_fn("reload", move || {
        out.request_reload();
        Ok(())
    });
    let out = ctx.outbox.clone();
    module.set_native_fn("halt", move || {
        out.request(Flow::Halt);
        Ok(())
    });
    let out = ctx.outbox.clone();
    module.set_native_fn("shutdown", move || {
        out.request(Flow::Shutdown);
        Ok(())
    });

    module
}

fn config_module(config: &Config) -> Module {
    let mut module = Module::new();
    module.set_var("nick", config.nick.clone());
    module.set_var("user", config.user.clone());
    module.set_var("name", config.name.clone());
    module.set_var("host", config.host.clone());
    module.set_var("port", INT::from(config.port));
    module.set_var("command_prefix", config.command_prefix.clone());
    module.set_var("plugins", config.plugins.display().to_string());
    module.set_var(
        "owners",
        config.owners.iter().cloned().map(Dynamic::from).collect::<Array>(),
    );
    module.set_var(
        "channels",
        config
            .channels
            .iter()
            .map(|c| Dynamic::from(c.name.clone()))
            .collect::<Array>(),
    );
    module
}

fn log_module(logger: &str) -> Module {
    let mut module = Module::new();

    let name = logger.to_string();
    module.set_native_fn("trace", move |text: Dynamic| {
        trace!(plugin = %name, "{text}");
        Ok(())
    });
    let name = logger.to_string();
    module.set_native_fn("info", move |text: Dynamic| {
        info!(plugin = %name, "{text}");
        Ok(())
    });
    let name = logger.to_string();
    module.set_native_fn("warn", move |text: Dynamic| {
        warn!(plugin = %name, "{text}");
        Ok(())
    });
    let name = logger.to_string();
    module.set_native_fn("error", move |text: Dynamic| {
        error!(plugin = %name, "{text}");
        Ok(())
    });

    module
}
