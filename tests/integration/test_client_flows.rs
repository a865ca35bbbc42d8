//! Integration Tests for Console Client Flows
//!
//! These tests drive the full façade lifecycle (connect, authenticate, run,
//! disconnect) against a scripted mock console over real TCP.

#[path = "../test_utils/mock_console.rs"]
mod mock_console;

use mock_console::{MockConsole, Reply};
use promptline::ConsoleClient;

#[tokio::test]
async fn test_execute_returns_echo_stripped_output() {
    let server = MockConsole::new()
        .respond("user -l", Reply::top("No User found."))
        .spawn()
        .await;

    let client = ConsoleClient::new(server.client_config()).unwrap();
    let output = client.execute("user -l").await.unwrap();

    assert_eq!(output, "No User found.");
}

#[tokio::test]
async fn test_execute_ends_the_session() {
    let server = MockConsole::new()
        .respond("stats --http", Reply::top("1 entry"))
        .spawn()
        .await;

    let client = ConsoleClient::new(server.client_config()).unwrap();
    client.execute("stats --http").await.unwrap();

    // The session-ending command goes out even though the caller only asked
    // for one command
    assert_eq!(server.received(), vec!["stats --http", "quit"]);
}

#[tokio::test]
async fn test_sequence_returns_one_output_per_command() {
    let server = MockConsole::new()
        .respond("group -a", Reply::submenu("Adding a new Group: (ok: save, ko: exit)"))
        .respond("gid g1", Reply::submenu(""))
        .respond("ok", Reply::top("Successfully added Group [g1]"))
        .spawn()
        .await;

    let client = ConsoleClient::new(server.client_config()).unwrap();
    let commands = vec![
        "group -a".to_string(),
        "gid g1".to_string(),
        "ok".to_string(),
    ];
    let outputs = client.execute_sequence(&commands).await.unwrap();

    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[0], "Adding a new Group: (ok: save, ko: exit)");
    assert_eq!(outputs[1], "");
    assert_eq!(outputs[2], "Successfully added Group [g1]");
}

#[tokio::test]
async fn test_sequence_saves_and_quits() {
    let server = MockConsole::new()
        .respond("group -a", Reply::submenu(""))
        .respond("gid g1", Reply::submenu(""))
        .respond("ok", Reply::top("Successfully added Group [g1]"))
        .spawn()
        .await;

    let client = ConsoleClient::new(server.client_config()).unwrap();
    let commands = vec![
        "group -a".to_string(),
        "gid g1".to_string(),
        "ok".to_string(),
    ];
    client.execute_sequence(&commands).await.unwrap();

    assert_eq!(
        server.received(),
        vec!["group -a", "gid g1", "ok", "persist", "quit"]
    );
}

#[tokio::test]
async fn test_sequence_can_include_finalizer_outputs() {
    let server = MockConsole::new()
        .respond("user -l", Reply::top("No User found."))
        .respond("persist", Reply::top("[OK] persisted"))
        .spawn()
        .await;

    let mut config = server.client_config();
    config.runner.include_finalizer_outputs = true;

    let client = ConsoleClient::new(config).unwrap();
    let outputs = client
        .execute_sequence(&["user -l".to_string()])
        .await
        .unwrap();

    // One caller command plus the save and end interactions
    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[0], "No User found.");
    assert_eq!(outputs[1], "[OK] persisted");
    assert_eq!(outputs[2], "Good bye !");
}

#[tokio::test]
async fn test_session_marker_treated_as_boundary() {
    let server = MockConsole::new()
        .respond("smppccm -a", Reply::submenu(""))
        .respond("cid C1", Reply::submenu(""))
        .respond("ok", Reply::marker("Successfully added connector [C1]", "41"))
        .spawn()
        .await;

    let client = ConsoleClient::new(server.client_config()).unwrap();
    let commands = vec![
        "smppccm -a".to_string(),
        "cid C1".to_string(),
        "ok".to_string(),
    ];
    let outputs = client.execute_sequence(&commands).await.unwrap();

    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[2], "Successfully added connector [C1]");
}

#[tokio::test]
async fn test_fragmented_delivery_yields_same_results() {
    let server = MockConsole::new()
        .chunked(3)
        .respond("user -l", Reply::top("uid1\nuid2\nuid3"))
        .spawn()
        .await;

    let client = ConsoleClient::new(server.client_config()).unwrap();
    let output = client.execute("user -l").await.unwrap();

    assert_eq!(output, "uid1\nuid2\nuid3");
}

#[tokio::test]
async fn test_each_call_opens_a_fresh_session() {
    let server = MockConsole::new()
        .respond("user -l", Reply::top("No User found."))
        .spawn()
        .await;

    let client = ConsoleClient::new(server.client_config()).unwrap();
    client.execute("user -l").await.unwrap();
    client.execute("user -l").await.unwrap();

    // Two operations, two full command/quit dialogues
    assert_eq!(
        server.received(),
        vec!["user -l", "quit", "user -l", "quit"]
    );
}

#[tokio::test]
async fn test_execute_batches_runs_all_batches_in_order() {
    let server = MockConsole::new()
        .respond("group -r g1", Reply::top("Successfully removed Group id:g1"))
        .respond("group -a", Reply::submenu(""))
        .respond("gid g1", Reply::submenu(""))
        .respond("ok", Reply::top("Successfully added Group [g1]"))
        .spawn()
        .await;

    let client = ConsoleClient::new(server.client_config()).unwrap();
    let batches = vec![
        vec!["group -r g1".to_string()],
        vec![
            "group -a".to_string(),
            "gid g1".to_string(),
            "ok".to_string(),
        ],
    ];
    let outputs = client.execute_batches(&batches).await.unwrap();

    assert_eq!(outputs.len(), 4);
    assert_eq!(
        server.received(),
        vec!["group -r g1", "group -a", "gid g1", "ok", "persist", "quit"]
    );
}
