use plugkit::command::{CommandHandler, CommandInvocation, Outcome, SenderPolicy, Stage};
use plugkit::config::Config;
use plugkit::host::memory::MemoryHost;
use plugkit::host::Actor;

#[tokio::test]
async fn create_default_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plugkit.toml");
    let path = path.to_str().unwrap();

    Config::create_default(path).await.unwrap();
    let config = Config::load(path).await.unwrap();
    config.validate().unwrap();
    assert_eq!(config.plugin.name, "plugkit");
    assert!(config.command_def("ECHO").is_some());
    assert_eq!(config.gui.sweep_interval_ticks, 200);
}

#[tokio::test]
async fn load_reports_missing_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(Config::load(missing.to_str().unwrap()).await.is_err());

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[plugin\nname = 1").unwrap();
    let err = Config::load(broken.to_str().unwrap()).await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}

#[test]
fn declared_commands_build_pipelines_with_overrides() {
    let config = Config::from_toml_str(
        r#"
        [plugin]
        name = "demo"

        [commands.messages]
        no_permission = "Denied: /{command}"
        not_enough_args = "More please, /{command}."

        [[commands.defs]]
        name = "Home"
        aliases = ["h"]
        sender = "players"
        min_args = 1
        permission = "demo.home"

        [[commands.defs]]
        name = "broadcast"
        sender = "console"
        sender_message = "Console only, sorry."

        [logging]
        level = "warn"
        "#,
    )
    .unwrap();
    config.validate().unwrap();
    let messages = &config.commands.messages;

    let home = CommandHandler::<MemoryHost>::builder_from_def(&config.commands.defs[0], messages)
        .on_execute(|_, _| Ok(()))
        .unwrap();
    assert_eq!(home.name(), "home");
    assert_eq!(home.aliases(), ["h"]);

    let mut host = MemoryHost::new();
    let alice = Actor::player("alice");
    let inv = CommandInvocation::new(alice.clone(), "h", vec![]);
    assert_eq!(home.handle(&mut host, &inv).unwrap(), Outcome::Rejected(Stage::Permission));
    host.grant_permission(&alice, "demo.home");
    assert_eq!(home.handle(&mut host, &inv).unwrap(), Outcome::Rejected(Stage::ArgumentCount));
    assert_eq!(host.messages_for(&alice), vec!["Denied: /home", "More please, /home."]);

    let broadcast =
        CommandHandler::<MemoryHost>::builder_from_def(&config.commands.defs[1], messages)
            .on_execute(|_, _| Ok(()))
            .unwrap();
    assert_eq!(config.commands.defs[1].sender, SenderPolicy::PassiveOnly);
    let inv = CommandInvocation::new(alice.clone(), "broadcast", vec![]);
    assert_eq!(broadcast.handle(&mut host, &inv).unwrap(), Outcome::Rejected(Stage::SenderKind));
    assert_eq!(host.messages_for(&alice).last().copied(), Some("Console only, sorry."));
}

#[test]
fn invalid_declarations_fail_validation() {
    for body in [
        "[[commands.defs]]\nname = \"bad name\"",
        "[[commands.defs]]\nname = \"a\"\n[[commands.defs]]\nname = \"A\"",
        "[[commands.defs]]\nname = \"a\"\npermission = \"x.*.y\"",
        "[gui]\npage_size = 9",
        "[gui]\nsweep_interval_ticks = 0",
    ] {
        let text = format!("[plugin]\nname = \"t\"\n[logging]\nlevel = \"info\"\n{}", body);
        let config = Config::from_toml_str(&text).unwrap();
        assert!(config.validate().is_err(), "accepted: {}", body);
    }
}
