use serde_json::json;
use uuid::Uuid;

use sabotage::websockets::MessageType;

mod utils;

use utils::*;

#[tokio::test]
async fn test_create_room_over_websocket() {
    let setup = TestSetupBuilder::new().build().await;
    let connection = Uuid::new_v4();

    setup
        .send_request(
            connection,
            MessageType::CreateRoom,
            json!({ "player_name": "alice" }),
            "create-1",
        )
        .await;

    let messages = setup.mock_conn_manager.get_messages_for(connection).await;
    let types: Vec<_> = messages.iter().map(|m| m.message_type).collect();
    assert_eq!(types, vec![MessageType::RoomUpdated, MessageType::Ack]);

    let ack = &messages[1].payload;
    assert_eq!(ack["request_id"], "create-1");
    assert_eq!(ack["success"], true);
    let room_code = ack["data"]["room_code"].as_str().unwrap();
    assert!(!room_code.is_empty());
    assert_eq!(ack["data"]["room"]["host_id"], ack["data"]["player_id"]);
    assert_eq!(ack["data"]["room"]["phase"], "lobby");
    assert!(setup.service.room_snapshot(room_code).await.is_ok());
}

#[tokio::test]
async fn test_join_room_over_websocket() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let connection = Uuid::new_v4();

    setup
        .send_request(
            connection,
            MessageType::JoinRoom,
            json!({ "room_code": setup.room_code, "player_name": "carol" }),
            "join-1",
        )
        .await;

    let joined = MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::PlayerJoined)
        .await;
    assert_eq!(joined.field("player_name"), "carol");
    assert_eq!(joined.field("room")["players"].as_array().unwrap().len(), 3);

    let messages = setup.mock_conn_manager.get_messages_for(connection).await;
    let ack = messages
        .iter()
        .find(|m| m.message_type == MessageType::Ack)
        .unwrap();
    assert_eq!(ack.payload["success"], true);
    assert_eq!(ack.payload["data"]["room_code"], setup.room_code.as_str());
}

#[tokio::test]
async fn test_join_unknown_room_is_not_found() {
    let setup = TestSetupBuilder::new().build().await;
    let connection = Uuid::new_v4();

    setup
        .send_request(
            connection,
            MessageType::JoinRoom,
            json!({ "room_code": "MISSING", "player_name": "carol" }),
            "join-2",
        )
        .await;

    let ack = setup
        .mock_conn_manager
        .consume_message_for(connection)
        .await
        .unwrap();
    assert_eq!(ack.message_type, MessageType::Ack);
    assert_eq!(ack.payload["success"], false);
    assert_eq!(ack.payload["error_kind"], "NOT_FOUND");
    assert_eq!(ack.payload["error"], "Room not found");
}

#[tokio::test]
async fn test_game_start_requires_host() {
    let setup = TestSetupBuilder::new().with_three_players().build().await;

    setup.send_start_game("bob").await; // bob is not host

    setup
        .last_ack("bob")
        .await
        .is_error_kind("FORBIDDEN")
        .with_error("Only the host can do that");
    MessageAssertion::for_all_players(&setup)
        .received_no_broadcasts()
        .await;
}

#[tokio::test]
async fn test_insufficient_players_cannot_start_game() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup.send_start_game("alice").await;

    setup
        .last_ack("alice")
        .await
        .is_error_kind("INVALID_STATE")
        .with_error("Need at least 3 players to start");
    MessageAssertion::for_all_players(&setup)
        .received_no_broadcasts()
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_host_starts_game() {
    let setup = TestSetupBuilder::new().with_three_players().build().await;

    setup.send_start_game("alice").await;

    let ack = setup.last_ack("alice").await.is_success();
    assert_eq!(ack.field("request_id"), "req");
    assert_eq!(ack.field("data")["phase"], "playing");

    MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::GameStarted)
        .await
        .with_phase("playing");
    let round = MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::RoundStarted)
        .await;
    // The reference solution never leaves the server
    let artifact = &round.field("room")["artifact"];
    assert!(artifact["starting_code"].is_string());
    assert!(artifact.get("correct_code").is_none());
}

#[tokio::test]
async fn test_malformed_frame_is_acked() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup.send_raw(setup.conn("bob"), "{not json").await;

    let ack = setup.last_ack("bob").await;
    assert_eq!(ack.field("success"), false);
    assert!(ack.field("request_id").is_null());
    assert!(ack.field("error_kind").is_null());
    assert!(ack.field("error").as_str().unwrap().starts_with("Invalid message"));
}

#[tokio::test]
async fn test_invalid_payload_echoes_request_id() {
    let setup = TestSetupBuilder::new().with_three_players().build().await;

    setup
        .send_request(setup.conn("bob"), MessageType::CastVote, json!({}), "vote-7")
        .await;

    let ack = setup.last_ack("bob").await;
    assert_eq!(ack.field("success"), false);
    assert_eq!(ack.field("request_id"), "vote-7");
    assert!(ack.field("error").as_str().unwrap().starts_with("Invalid payload"));
}

#[tokio::test]
async fn test_server_message_type_rejected_from_client() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup
        .send_message("bob", MessageType::GameEnded, json!({}))
        .await;

    let ack = setup.last_ack("bob").await;
    assert_eq!(ack.field("success"), false);
    assert_eq!(ack.field("request_id"), "req");
    MessageAssertion::for_all_players(&setup)
        .received_no_broadcasts()
        .await;
}

#[tokio::test]
async fn test_request_before_joining_is_rejected() {
    let setup = TestSetupBuilder::new().build().await;
    let connection = Uuid::new_v4();

    setup
        .send_request(connection, MessageType::Buzz, json!({}), "buzz-1")
        .await;

    let ack = setup
        .mock_conn_manager
        .consume_message_for(connection)
        .await
        .unwrap();
    assert_eq!(ack.payload["success"], false);
    assert_eq!(ack.payload["error_kind"], "INVALID_STATE");
    assert_eq!(ack.payload["error"], "You are not connected to a room");
}

#[tokio::test(start_paused = true)]
async fn test_accusation_vote_over_websocket() {
    let setup = TestSetupBuilder::new().with_three_players().build().await;
    setup.start_game_with_saboteur("alice").await;

    setup.send_buzz("carol").await;
    setup.last_ack("carol").await.is_success();
    let buzzed = MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::PlayerBuzzed)
        .await
        .with_player_id(&setup.id("carol"));
    assert_eq!(buzzed.field("player_name"), "carol");

    setup.send_vote("bob", "alice").await;
    let ack = setup.last_ack("bob").await.is_success();
    assert_eq!(ack.field("data")["all_resolved"], false);
    MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::VoteUpdated)
        .await;

    setup.send_vote("bob", "carol").await;
    setup
        .last_ack("bob")
        .await
        .is_error_kind("CONFLICT")
        .with_error("You have already voted");

    setup.send_vote("carol", "alice").await;
    setup.send_vote("alice", "skip").await;

    let ended = MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::VoteEnded)
        .await;
    assert_eq!(ended.field("kicked_player_id"), setup.id("alice").as_str());
    MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::GameEnded)
        .await
        .with_winner("fixers")
        .with_reason("Saboteur was voted out");
}

#[tokio::test(start_paused = true)]
async fn test_code_flow_over_websocket() {
    let setup = TestSetupBuilder::new()
        .with_three_players()
        .with_total_rounds(1)
        .build()
        .await;
    setup.start_game_with_saboteur("alice").await;
    let fixed = setup.correct_code().await;

    setup.send_update_code("bob", &fixed).await;
    MessageAssertion::for_players(&setup, vec!["alice", "carol"])
        .received_message_type(MessageType::CodeUpdated)
        .await
        .with_player_id(&setup.id("bob"));
    setup.last_ack("bob").await.is_success();

    setup.send_submit_fix("carol", &fixed).await;
    let ack = setup.last_ack("carol").await.is_success();
    assert_eq!(ack.field("data")["passed"], true);
    assert_eq!(ack.field("data")["applied"], true);

    setup.send_submit_fix("bob", "process.exit(0)").await;
    setup.last_ack("bob").await.is_error_kind("INVALID_STATE");
}

#[tokio::test(start_paused = true)]
async fn test_unsafe_submission_over_websocket() {
    let setup = TestSetupBuilder::new().with_three_players().build().await;
    setup.start_game_with_saboteur("alice").await;

    setup
        .send_submit_fix("bob", "const fs = require('fs');")
        .await;

    setup.last_ack("bob").await.is_error_kind("UNSAFE");
    MessageAssertion::for_all_players(&setup)
        .did_not_receive(MessageType::FixSubmitted)
        .await;
}

#[tokio::test]
async fn test_leave_over_websocket() {
    let setup = TestSetupBuilder::new().with_three_players().build().await;

    setup.send_leave("carol").await;

    setup.last_ack("carol").await.is_success();
    MessageAssertion::for_players(&setup, vec!["alice", "bob"])
        .received_message_type(MessageType::PlayerLeft)
        .await
        .with_player_id(&setup.id("carol"));

    setup.send_leave("carol").await;
    setup
        .last_ack("carol")
        .await
        .is_error_kind("INVALID_STATE")
        .with_error("You are not connected to a room");
}

#[tokio::test]
async fn test_ready_toggle_over_websocket() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup
        .send_message("bob", MessageType::SetReady, json!({}))
        .await;

    let ack = setup.last_ack("bob").await.is_success();
    assert_eq!(ack.field("data")["players"][1]["is_ready"], true);
    MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::RoomUpdated)
        .await;
}

#[tokio::test]
async fn test_chat_over_websocket() {
    let setup = TestSetupBuilder::new().with_three_players().build().await;

    setup.send_chat("carol", "hi all").await;

    setup.last_ack("carol").await.is_success();
    let chat = MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::ChatMessage)
        .await
        .with_player_id(&setup.id("carol"));
    assert_eq!(chat.field("username"), "carol");
    assert_eq!(chat.field("message"), "hi all");

    setup.send_chat("carol", "   ").await;
    setup
        .last_ack("carol")
        .await
        .is_error_kind("INVALID_STATE")
        .with_error("Message cannot be empty");
    assert_eq!(
        setup.count_message_type("alice", MessageType::ChatMessage).await,
        1
    );
}

#[tokio::test]
async fn test_chat_before_joining_is_rejected() {
    let setup = TestSetupBuilder::new().build().await;
    let connection = Uuid::new_v4();

    setup
        .send_request(
            connection,
            MessageType::ChatMessage,
            json!({ "message": "hello?" }),
            "chat-1",
        )
        .await;

    let ack = setup
        .mock_conn_manager
        .consume_message_for(connection)
        .await
        .unwrap();
    assert_eq!(ack.payload["request_id"], "chat-1");
    assert_eq!(ack.payload["success"], false);
    assert_eq!(ack.payload["error"], "You are not connected to a room");
}
