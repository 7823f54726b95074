//! Integration tests for plugin loading and dispatch.
//!
//! Most tests drive the registry directly with parsed events; the first
//! runs the whole bot against the in-memory server.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{PluginDir, TestServer, event};
use slircbot::config::Config;
use slircbot::plugin::{Dispatch, PluginRegistry};
use slircbot::{Connection, bot};

fn loaded(dir: &PluginDir) -> PluginRegistry {
    let mut registry = PluginRegistry::new(dir.config());
    registry.load();
    registry
}

fn say(registry: &mut PluginRegistry, from: &str, target: &str, text: &str) -> Dispatch {
    let line = format!(":{from}!u@example.org PRIVMSG {target} :{text}");
    registry.handle(&event(&line, &config()))
}

/// Matches the fixture config so ownership is computed the same way.
fn config() -> Config {
    Config {
        nick: "Bot".to_string(),
        owners: vec!["root".to_string()],
        ..Config::default()
    }
}

fn lines(dispatch: &Dispatch) -> Vec<&str> {
    dispatch.lines.iter().map(|l| l.trim_end()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_ping_and_quit() {
    let dir = PluginDir::new().unwrap();
    dir.write(
        "ping.rhai",
        r#"
            command(["ping"], "pong");
            command(["quit"], "quit", #{ owner: true });
            fn load() { irc::write(["MODE", config::nick, "+B"]); }
            fn pong(msg) { msg.reply("pong"); }
            fn quit(msg) { plugins::shutdown(); }
        "#,
    )
    .unwrap();
    let config = dir.config();

    let (mut server, stream) = TestServer::pair();
    let task = tokio::spawn(async move {
        let mut registry = PluginRegistry::new(config.clone());
        registry.load();
        let mut conn = Connection::new(config);
        conn.attach(stream).await?;
        bot::run(&mut conn, &mut registry).await
    });

    server.accept_registration().await.unwrap();
    assert_eq!(server.recv().await.unwrap(), "MODE Bot +B");

    server.send_raw(":alice!a@example.org PRIVMSG Bot :.ping").await.unwrap();
    assert_eq!(server.recv().await.unwrap(), "PRIVMSG alice :pong");

    server.send_raw(":alice!a@example.org PRIVMSG #c :Bot: quit").await.unwrap();
    assert_eq!(
        server.recv().await.unwrap(),
        "PRIVMSG #c :alice: You are not an owner of this bot."
    );

    server.send_raw(":root!r@example.org PRIVMSG #c :Bot, quit").await.unwrap();
    let shutdown = task.await.unwrap().expect("bot failed");
    assert!(shutdown);
}

#[tokio::test(start_paused = true)]
async fn test_run_ends_when_server_closes() {
    let dir = PluginDir::new().unwrap();
    let config = dir.config();

    let (mut server, stream) = TestServer::pair();
    let task = tokio::spawn(async move {
        let mut registry = PluginRegistry::new(config.clone());
        registry.load();
        let mut conn = Connection::new(config);
        conn.attach(stream).await?;
        bot::run(&mut conn, &mut registry).await
    });

    server.accept_registration().await.unwrap();
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    drop(server);

    let shutdown = task.await.unwrap().expect("bot failed");
    assert!(!shutdown);
}

#[test]
fn test_owner_denial_halts_other_plugins() {
    let dir = PluginDir::new().unwrap();
    dir.write(
        "a_guard.rhai",
        r#"command(["secret"], "h", #{ owner: true }); fn h(m) { m.reply("ok"); }"#,
    )
    .unwrap();
    dir.write(
        "b_spy.rhai",
        r#"rule("secret", "spy"); fn spy(m) { m.reply("saw it"); }"#,
    )
    .unwrap();
    let mut registry = loaded(&dir);

    let denied = say(&mut registry, "mallory", "#c", ".secret");
    assert_eq!(
        lines(&denied),
        vec!["PRIVMSG #c :mallory: You are not an owner of this bot."]
    );
    assert!(!denied.shutdown);

    let allowed = say(&mut registry, "root", "#c", ".secret");
    assert_eq!(lines(&allowed), vec!["PRIVMSG #c :ok", "PRIVMSG #c :saw it"]);
}

#[test]
fn test_broken_plugin_does_not_block_others() {
    let dir = PluginDir::new().unwrap();
    dir.write("a_broken.rhai", "fn (").unwrap();
    dir.write("b_missing.rhai", r#"command(["x"], "nowhere");"#).unwrap();
    dir.write(
        "c_good.rhai",
        r#"command(["hi"], "hi"); fn hi(m) { m.reply("hello"); }"#,
    )
    .unwrap();
    dir.write("notes.txt", "not a plugin").unwrap();

    let mut registry = loaded(&dir);
    let names: Vec<_> = registry.plugins().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["c_good"]);

    assert_eq!(lines(&say(&mut registry, "alice", "#c", ".hi")), vec!["PRIVMSG #c :hello"]);
}

#[test]
fn test_handler_error_is_isolated() {
    let dir = PluginDir::new().unwrap();
    dir.write(
        "a_throws.rhai",
        r#"rule("boom", "h"); fn h(m) { throw "kaboom"; }"#,
    )
    .unwrap();
    dir.write(
        "b_fine.rhai",
        r#"rule("boom", "h"); fn h(m) { m.reply("still standing"); }"#,
    )
    .unwrap();
    let mut registry = loaded(&dir);

    let dispatch = say(&mut registry, "alice", "#c", "boom");
    assert_eq!(lines(&dispatch), vec!["PRIVMSG #c :still standing"]);
}

#[test]
fn test_runaway_handler_hits_operation_limit() {
    let dir = PluginDir::new().unwrap();
    dir.write(
        "spin.rhai",
        r#"
            rule("spin", "spin");
            rule("spin", "after");
            fn spin(m) { loop {} }
            fn after(m) { m.reply("recovered"); }
        "#,
    )
    .unwrap();
    let config = Arc::new(Config {
        script_max_operations: 10_000,
        ..(*dir.config()).clone()
    });
    let mut registry = PluginRegistry::new(config);
    registry.load();

    let dispatch = say(&mut registry, "alice", "#c", "spin");
    assert_eq!(lines(&dispatch), vec!["PRIVMSG #c :recovered"]);
}

#[test]
fn test_state_is_shared_across_messages() {
    let dir = PluginDir::new().unwrap();
    dir.write(
        "counter.rhai",
        r#"
            command(["count"], "count");
            command(["peek"], "peek");
            fn load() { #{ count: 0 } }
            fn count(msg) { this.count += 1; msg.reply(`${this.count}`); }
            fn peek(msg, state) { msg.reply("seen " + state.count); }
        "#,
    )
    .unwrap();
    let mut registry = loaded(&dir);

    assert_eq!(lines(&say(&mut registry, "alice", "#c", ".count")), vec!["PRIVMSG #c :1"]);
    assert_eq!(lines(&say(&mut registry, "bob", "#c", ".count")), vec!["PRIVMSG #c :2"]);
    assert_eq!(lines(&say(&mut registry, "bob", "#c", ".peek")), vec!["PRIVMSG #c :seen 2"]);

    let state = registry.get("counter").unwrap().state();
    let map = state.cast::<rhai::Map>();
    assert_eq!(map["count"].as_int().unwrap(), 2);
}

#[test]
fn test_reload_picks_up_changes_after_the_message() {
    let dir = PluginDir::new().unwrap();
    dir.write(
        "a_reload.rhai",
        r#"command(["reload"], "r"); fn r(m) { m.reply("reloading"); plugins::reload(); }"#,
    )
    .unwrap();
    dir.write(
        "b_version.rhai",
        r##"
            command(["version"], "v");
            rule("reload", "spy", #{ name: "reload watcher" });
            fn v(m) { m.reply("v1"); }
            fn spy(m) { m.reply("should not run"); }
            fn unload(state) { irc::msg("#log", "bye v1"); }
        "##,
    )
    .unwrap();
    let mut registry = loaded(&dir);
    assert_eq!(lines(&say(&mut registry, "alice", "#c", ".version")), vec!["PRIVMSG #c :v1"]);

    dir.write(
        "b_version.rhai",
        r#"command(["version"], "v"); fn v(m) { m.reply("v2"); }"#,
    )
    .unwrap();

    let reload = say(&mut registry, "alice", "#c", ".reload");
    assert_eq!(
        lines(&reload),
        vec!["PRIVMSG #c :reloading", "PRIVMSG #log :bye v1"]
    );
    assert_eq!(lines(&say(&mut registry, "alice", "#c", ".version")), vec!["PRIVMSG #c :v2"]);
}

#[test]
fn test_shutdown_stops_dispatch() {
    let dir = PluginDir::new().unwrap();
    dir.write(
        "a_quit.rhai",
        r#"command(["die"], "die"); fn die(m) { m.reply("bye"); plugins::shutdown(); }"#,
    )
    .unwrap();
    dir.write(
        "b_after.rhai",
        r#"rule(".*", "h"); fn h(m) { m.reply("late"); }"#,
    )
    .unwrap();
    let mut registry = loaded(&dir);

    let dispatch = say(&mut registry, "alice", "#c", ".die");
    assert!(dispatch.shutdown);
    assert_eq!(lines(&dispatch), vec!["PRIVMSG #c :bye"]);
}

#[test]
fn test_event_filter_and_wildcard() {
    let dir = PluginDir::new().unwrap();
    dir.write(
        "events.rhai",
        r##"
            rule(".*", "joined", #{ event: "JOIN" });
            rule(".*", "any", #{ event: "*" });
            fn joined(m) { irc::msg(m.target, "welcome " + m.nick); }
            fn any(m) { if m.event == "NOTICE" { irc::msg("#log", "notice from " + m.nick); } }
        "##,
    )
    .unwrap();
    let mut registry = loaded(&dir);
    let config = config();

    let join = registry.handle(&event(":carol!c@h JOIN #rust", &config));
    assert_eq!(lines(&join), vec!["PRIVMSG #rust :welcome carol"]);

    let notice = registry.handle(&event(":dave!d@h NOTICE Bot :psst", &config));
    assert_eq!(lines(&notice), vec!["PRIVMSG #log :notice from dave"]);
}

fn sample_plugins() -> PluginRegistry {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("plugins");
    let mut registry = PluginRegistry::new(Arc::new(Config {
        nick: "Bot".to_string(),
        owners: vec!["root".to_string()],
        plugins: root,
        ..Config::default()
    }));
    registry.load();
    registry
}

#[test]
fn test_sample_plugins_load() {
    let registry = sample_plugins();
    let names: Vec<_> = registry.plugins().iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["admin", "help"]);
    assert_eq!(registry.get("help").unwrap().actions().len(), 4);
    assert_eq!(registry.get("admin").unwrap().actions().len(), 5);
}

#[test]
fn test_sample_help_plugin() {
    let mut registry = sample_plugins();
    assert_eq!(registry.plugins().len(), 2);

    assert_eq!(
        lines(&say(&mut registry, "alice", "#c", ".help")),
        vec!["PRIVMSG #c :Plugins: admin, help"]
    );

    let admin = say(&mut registry, "alice", "#c", ".help admin");
    assert_eq!(lines(&admin)[0], "PRIVMSG #c :admin: Owner-only bot control.");
    assert!(lines(&admin).contains(&"PRIVMSG #c :  reload - Reload all plugins"));

    assert_eq!(
        lines(&say(&mut registry, "alice", "#c", ".help nope")),
        vec!["PRIVMSG #c :No such plugin: nope"]
    );

    let commands = say(&mut registry, "alice", "#c", ".commands");
    assert!(lines(&commands)[0].starts_with("PRIVMSG #c :Commands: .reload, .quit"));

    assert_eq!(
        lines(&say(&mut registry, "alice", "#c", ".rules")),
        vec!["PRIVMSG #c :No rules."]
    );
}

#[test]
fn test_sample_admin_plugin() {
    let mut registry = sample_plugins();

    let denied = say(&mut registry, "alice", "#c", ".quit");
    assert!(!denied.shutdown);

    let said = say(&mut registry, "root", "#c", ".say #other hello there");
    assert_eq!(lines(&said), vec!["PRIVMSG #other :hello there"]);

    let quit = say(&mut registry, "root", "#c", "Bot: quit");
    assert!(quit.shutdown);
    assert_eq!(lines(&quit), vec!["PRIVMSG #c :root: Bye.", "QUIT :Shutting down"]);
}
