//! Integration tests for manager add/update/remove/toggle.

mod support;

use serde_json::json;

use support::{Failure, kinds, raw, record_events, scripted};
use swarm_core::config::filter_protected_servers;
use swarm_core::error::{FieldError, IpcError, ManagerError, NameError, ValidationError};
use swarm_core::ipc::protocol;
use swarm_core::manager::{AddOutcome, EventKind, ManagerEvent};
use swarm_core::types::EnvValue;

// =============================================================================
// add_servers
// =============================================================================

#[tokio::test]
async fn direct_config_needs_name_then_adds_enabled() {
    let (host, mut manager) = scripted(json!({}));
    manager.initialize().await.unwrap();

    let text = r#"{"command": "node", "args": ["server.js"], "env": {"API_KEY": "sk-1234567890"}}"#;
    let validated = manager.validate_configuration(text).unwrap();
    assert!(validated.needs_name());

    let config = match manager.add_servers(text).await.unwrap() {
        AddOutcome::NeedsName(config) => config,
        other => panic!("expected NeedsName, got {other:?}"),
    };
    assert!(!host.raw().contains_key("my-server"));

    let added = manager.add_named_server("my-server", &config).await.unwrap();

    assert_eq!(added.keys().collect::<Vec<_>>(), vec!["my-server"]);
    let entry = &manager.get_all_servers()["my-server"];
    assert!(entry.metadata.enabled);
    assert!(!entry.metadata.protected);
    assert_eq!(entry.config.args, vec!["server.js"]);
    assert_eq!(
        entry.config.env.as_ref().unwrap()["API_KEY"],
        EnvValue::from("sk-1234567890")
    );
    assert_eq!(
        host.raw()["my-server"],
        json!({"command": "node", "args": ["server.js"], "env": {"API_KEY": "sk-1234567890"}})
    );
}

#[tokio::test]
async fn add_patches_cache_without_reload_and_emits_only_new_entries() {
    let (host, mut manager) = scripted(json!({"existing": {"command": "x"}}));
    manager.initialize().await.unwrap();
    let log = record_events(&mut manager);
    host.clear_calls();

    let outcome = manager
        .add_servers(r#"{"mcpServers": {"a": {"command": "x"}, "b": {"command": "y"}}}"#)
        .await
        .unwrap();

    assert!(matches!(outcome, AddOutcome::Added(ref added) if added.len() == 2));
    assert_eq!(host.calls(), vec![protocol::ADD_SERVERS]);
    assert_eq!(manager.get_server_names(), vec!["a", "b", "existing"]);
    match &log.lock().unwrap()[..] {
        [ManagerEvent::ServersAdded(added)] => {
            assert_eq!(added.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[tokio::test]
async fn add_rejects_duplicate_names_without_side_effects() {
    let (host, mut manager) = scripted(json!({"foo": {"command": "x"}}));
    manager.initialize().await.unwrap();
    let log = record_events(&mut manager);
    host.clear_calls();
    let before = manager.get_all_servers().clone();

    let err = manager
        .add_servers(r#"{"mcpServers":{"foo":{"command":"x"}}}"#)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ManagerError::Validation(NameError::Duplicate("foo".to_string()).into())
    );
    assert_eq!(err.to_string(), "A server named 'foo' already exists");
    assert_eq!(manager.get_all_servers(), &before);
    assert!(host.calls().is_empty());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_rejects_disabled_duplicate() {
    let (_host, mut manager) = scripted(json!({"_disabled_foo": {"command": "x"}}));
    manager.initialize().await.unwrap();

    let err = manager
        .add_servers(r#"{"mcpServers":{"foo":{"command":"y"}}}"#)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ManagerError::Validation(ValidationError::Name(NameError::Duplicate(_)))
    ));
}

#[tokio::test]
async fn add_refuses_name_that_lands_in_protected_disabled_slot() {
    let (host, mut manager) = scripted(json!({"codeagentswarm-tasks": {"command": "node"}}));
    manager.initialize().await.unwrap();
    host.clear_calls();

    let err = manager
        .add_servers(r#"{"mcpServers":{"_disabled_codeagentswarm-tasks":{"command":"evil"}}}"#)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ManagerError::Validation(
            NameError::DisabledPrefix("_disabled_codeagentswarm-tasks".to_string()).into()
        )
    );
    assert!(host.calls().is_empty());
    assert_eq!(
        host.raw(),
        raw(json!({"codeagentswarm-tasks": {"command": "node"}}))
    );
    assert!(manager.get_all_servers().is_empty());
}

#[tokio::test]
async fn add_refuses_name_that_would_disable_existing_server() {
    let (host, mut manager) = scripted(json!({"foo": {"command": "real"}}));
    manager.initialize().await.unwrap();
    host.clear_calls();

    let err = manager
        .add_servers(r#"{"mcpServers":{"_disabled_foo":{"command":"other"}}}"#)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ManagerError::Validation(ValidationError::Name(NameError::DisabledPrefix(_)))
    ));
    assert!(host.calls().is_empty());

    manager.load_servers().await.unwrap();
    assert_eq!(manager.get_server_names(), vec!["foo"]);
    let foo = manager.get_server("foo").unwrap();
    assert!(foo.is_enabled());
    assert_eq!(foo.config.command, "real");
    assert_eq!(
        manager.get_all_servers(),
        &filter_protected_servers(&host.raw())
    );
}

#[tokio::test]
async fn add_rejects_protected_and_malformed_input() {
    let (_host, mut manager) = scripted(json!({}));
    manager.initialize().await.unwrap();

    let err = manager
        .add_servers(r#"{"mcpServers":{"codeagentswarm-tasks":{"command":"x"}}}"#)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ManagerError::Validation(ValidationError::ProtectedName(
            "codeagentswarm-tasks".to_string()
        ))
    );

    let err = manager.add_servers("{not json").await.unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Validation(ValidationError::Parse(_))
    ));

    let err = manager
        .add_servers(r#"{"mcpServers":{"bad name":{"command":"x"}}}"#)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Validation(ValidationError::Name(NameError::InvalidCharacters(_)))
    ));
    assert!(manager.get_all_servers().is_empty());
}

#[tokio::test]
async fn add_ipc_failure_leaves_cache_untouched() {
    let (host, mut manager) = scripted(json!({}));
    manager.initialize().await.unwrap();
    let log = record_events(&mut manager);
    host.fail_next(protocol::ADD_SERVERS, Failure::Reject("EACCES".to_string()));

    let err = manager
        .add_servers(r#"{"mcpServers":{"a":{"command":"x"}}}"#)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "EACCES");
    assert!(err.is_ipc());
    assert!(!manager.has_server("a"));
    assert!(log.lock().unwrap().is_empty());
}

// =============================================================================
// update_server
// =============================================================================

#[tokio::test]
async fn update_replaces_config_and_keeps_state() {
    let (host, mut manager) = scripted(json!({"_disabled_db": {"command": "old", "args": ["a"]}}));
    manager.initialize().await.unwrap();
    let log = record_events(&mut manager);

    let entry = manager
        .update_server("db", &json!({"command": "new", "env": {"PORT": 5432}}))
        .await
        .unwrap();

    assert!(!entry.metadata.enabled);
    assert_eq!(entry.config.command, "new");
    assert!(entry.config.args.is_empty());
    assert_eq!(manager.get_server("db"), Some(&entry));
    assert_eq!(
        host.raw()["_disabled_db"],
        json!({"command": "new", "env": {"PORT": 5432}})
    );
    assert_eq!(kinds(&log), vec![EventKind::ServerUpdated]);
}

#[tokio::test]
async fn update_unknown_server_is_not_found() {
    let (host, mut manager) = scripted(json!({}));
    manager.initialize().await.unwrap();
    host.clear_calls();

    let err = manager
        .update_server("ghost", &json!({"command": "x"}))
        .await
        .unwrap_err();

    assert_eq!(err, ManagerError::NotFound("ghost".to_string()));
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn update_with_invalid_config_reports_field() {
    let (host, mut manager) = scripted(json!({"db": {"command": "x"}}));
    manager.initialize().await.unwrap();
    let before = manager.get_all_servers().clone();
    host.clear_calls();

    let err = manager
        .update_server("db", &json!({"command": "x", "args": ["ok", false]}))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ManagerError::Validation(ValidationError::InvalidField {
            server: "db".to_string(),
            field: FieldError::ArgNotString { index: 1 },
        })
    );
    assert_eq!(manager.get_all_servers(), &before);
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn update_ipc_failure_leaves_cache_untouched() {
    let (host, mut manager) = scripted(json!({"db": {"command": "x"}}));
    manager.initialize().await.unwrap();
    host.fail_next(protocol::UPDATE_SERVER, Failure::Transport("closed".to_string()));

    let err = manager
        .update_server("db", &json!({"command": "y"}))
        .await
        .unwrap_err();

    assert_eq!(err, ManagerError::Ipc(IpcError::Transport("closed".to_string())));
    assert_eq!(manager.get_server("db").unwrap().config.command, "x");
}

// =============================================================================
// remove_server
// =============================================================================

#[tokio::test]
async fn remove_protected_name_is_refused() {
    let (host, mut manager) = scripted(json!({"codeagentswarm": {"command": "x"}}));
    manager.initialize().await.unwrap();
    host.clear_calls();

    let err = manager.remove_server("CodeAgentSwarm").await.unwrap_err();

    assert_eq!(
        err,
        ManagerError::ProtectedName("CodeAgentSwarm".to_string())
    );
    assert!(host.calls().is_empty());
    assert!(host.raw().contains_key("codeagentswarm"));
}

#[tokio::test]
async fn remove_refuses_disabled_form_of_protected_name() {
    let (host, mut manager) = scripted(json!({
        "_disabled_codeagentswarm": {"command": "x"},
        "codeagentswarm-tasks": {"command": "y"}
    }));
    manager.initialize().await.unwrap();
    host.clear_calls();

    for name in ["_disabled_codeagentswarm", "_disabled_CodeAgentSwarm-Tasks"] {
        let err = manager.remove_server(name).await.unwrap_err();
        assert_eq!(err, ManagerError::ProtectedName(name.to_string()));
    }

    assert!(host.calls().is_empty());
    assert!(host.raw().contains_key("_disabled_codeagentswarm"));
    assert!(host.raw().contains_key("codeagentswarm-tasks"));
}

#[tokio::test]
async fn remove_disabled_server_then_reloads() {
    let (host, mut manager) = scripted(json!({
        "keep": {"command": "x"},
        "_disabled_gone": {"command": "y"}
    }));
    manager.initialize().await.unwrap();
    let log = record_events(&mut manager);
    host.clear_calls();

    manager.remove_server("gone").await.unwrap();

    assert_eq!(
        host.calls(),
        vec![protocol::REMOVE_SERVER, protocol::LOAD_CONFIG]
    );
    assert!(!host.raw().contains_key("_disabled_gone"));
    assert_eq!(manager.get_server_names(), vec!["keep"]);
    assert_eq!(
        kinds(&log),
        vec![EventKind::ServerRemoved, EventKind::ServersLoaded]
    );
}

#[tokio::test]
async fn remove_ipc_failure_leaves_cache_untouched() {
    let (host, mut manager) = scripted(json!({"a": {"command": "x"}}));
    manager.initialize().await.unwrap();
    let log = record_events(&mut manager);
    host.fail_next(protocol::REMOVE_SERVER, Failure::Reject("busy".to_string()));

    let err = manager.remove_server("a").await.unwrap_err();

    assert_eq!(err.to_string(), "busy");
    assert!(manager.has_server("a"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn remove_succeeds_when_follow_up_reload_fails() {
    let (host, mut manager) = scripted(json!({"a": {"command": "x"}, "b": {"command": "y"}}));
    manager.initialize().await.unwrap();
    host.fail_next(protocol::LOAD_CONFIG, Failure::Transport("gone".to_string()));

    manager.remove_server("a").await.unwrap();

    assert_eq!(manager.get_server_names(), vec!["b"]);
}

// =============================================================================
// toggle_server
// =============================================================================

#[tokio::test]
async fn toggle_always_reloads_to_host_state() {
    let (host, mut manager) = scripted(json!({
        "git": {"command": "x"},
        "other": {"command": "y"}
    }));
    manager.initialize().await.unwrap();
    let log = record_events(&mut manager);
    host.clear_calls();

    manager.toggle_server("git", false).await.unwrap();

    assert_eq!(
        host.calls(),
        vec![protocol::TOGGLE_SERVER, protocol::LOAD_CONFIG]
    );
    assert!(host.raw().contains_key("_disabled_git"));
    assert!(!host.raw().contains_key("git"));
    assert_eq!(manager.get_all_servers(), &filter_protected_servers(&host.raw()));
    assert!(!manager.get_server("git").unwrap().metadata.enabled);
    assert_eq!(
        kinds(&log),
        vec![EventKind::ServersLoaded, EventKind::ServerToggled]
    );

    manager.toggle_server("git", true).await.unwrap();

    assert!(host.raw().contains_key("git"));
    assert_eq!(manager.get_all_servers(), &filter_protected_servers(&host.raw()));
    assert!(manager.get_server("git").unwrap().metadata.enabled);
}

#[tokio::test]
async fn toggle_picks_up_external_changes() {
    let (host, mut manager) = scripted(json!({"git": {"command": "x"}}));
    manager.initialize().await.unwrap();

    let mut external = host.raw();
    external.insert("added-elsewhere".to_string(), json!({"command": "z"}));
    host.replace(external);
    manager.toggle_server("git", false).await.unwrap();

    assert!(manager.has_server("added-elsewhere"));
}

#[tokio::test]
async fn toggle_unknown_server_is_not_found() {
    let (host, mut manager) = scripted(json!({"codeagentswarm-tasks": {"command": "x"}}));
    manager.initialize().await.unwrap();
    host.clear_calls();

    let err = manager
        .toggle_server("codeagentswarm-tasks", false)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ManagerError::NotFound("codeagentswarm-tasks".to_string())
    );
    assert!(host.calls().is_empty());
    assert!(host.raw().contains_key("codeagentswarm-tasks"));
}

#[tokio::test]
async fn toggle_ipc_failure_leaves_cache_untouched() {
    let (host, mut manager) = scripted(json!({"git": {"command": "x"}}));
    manager.initialize().await.unwrap();
    let log = record_events(&mut manager);
    host.fail_next(protocol::TOGGLE_SERVER, Failure::Reject("nope".to_string()));

    let err = manager.toggle_server("git", false).await.unwrap_err();

    assert!(matches!(err, ManagerError::Ipc(IpcError::Rejected { .. })));
    assert!(manager.get_server("git").unwrap().metadata.enabled);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn toggle_timeout_is_distinct_from_rejection() {
    let (host, mut manager) = scripted(json!({"git": {"command": "x"}}));
    manager.initialize().await.unwrap();
    host.fail_next(protocol::TOGGLE_SERVER, Failure::Hang);

    let err = manager.toggle_server("git", false).await.unwrap_err();

    match err {
        ManagerError::Ipc(ipc) => assert!(ipc.is_timeout()),
        other => panic!("expected IPC timeout, got {other:?}"),
    }
    assert!(manager.get_server("git").unwrap().metadata.enabled);
}

#[tokio::test]
async fn sequential_toggles_settle_on_last_state() {
    let (host, mut manager) = scripted(json!({"git": {"command": "x"}}));
    manager.initialize().await.unwrap();

    manager.toggle_server("git", false).await.unwrap();
    manager.toggle_server("git", false).await.unwrap();
    manager.toggle_server("git", true).await.unwrap();

    assert_eq!(host.raw(), raw(json!({"git": {"command": "x"}})));
    assert!(manager.get_server("git").unwrap().metadata.enabled);
}
