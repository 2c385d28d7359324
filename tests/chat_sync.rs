//! Integration tests per la sincronizzazione delle conversazioni
//!
//! Test per:
//! - Ordine di arrivo dei messaggi per conversazione
//! - Delete idempotente e dominante sull'edit
//! - Divisore dei non letti e ricevute di lettura
//! - Modalità edit ed etichette di stato

mod common;

#[cfg(test)]
mod chat_sync_tests {
    use super::common::*;
    use funchat::dtos::ClientRequest;
    use funchat::entities::ConversationKey;
    use funchat::services::{self, chat::message_at};
    use funchat::views::main::{DELETED_PLACEHOLDER, EDITED_SUFFIX, UNREAD_DIVIDER};
    use funchat::views::{DialogLine, StatusLabel};
    use funchat::ws::{Redraw, process_event};

    // ============================================================
    // CS1 - Messaggi in ordine di arrivo per chiave canonica
    // ============================================================

    #[test]
    fn test_cs1_messages_kept_in_receipt_order_per_pair() {
        let (mut state, _rx) = create_test_state("alice");

        process_event(&mut state, msg_send(message("1", "alice", "bob", "hi")));
        process_event(&mut state, msg_send(message("2", "bob", "alice", "hey")));
        process_event(&mut state, msg_send(message("3", "carol", "alice", "yo")));
        process_event(&mut state, msg_send(message("4", "alice", "bob", "how are you?")));

        let key = ConversationKey::new("bob", "alice");
        let ids: Vec<&str> = state.chats.messages(&key).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "4"]);
        assert_eq!(state.chats.conversation_count(), 2);
    }

    #[test]
    fn test_cs1_history_merges_with_known_messages() {
        let (mut state, _rx) = create_test_state("alice");
        process_event(&mut state, msg_send(message("live", "bob", "alice", "new")));

        process_event(
            &mut state,
            history(vec![
                read_message("h1", "bob", "alice", "old"),
                read_message("h2", "alice", "bob", "older reply"),
                message("live", "bob", "alice", "new"),
            ]),
        );

        let key = ConversationKey::new("alice", "bob");
        let ids: Vec<&str> = state.chats.messages(&key).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["h1", "h2", "live"]);
    }

    // ============================================================
    // CS2 - Delete su tutte le conversazioni, idempotente
    // ============================================================

    #[test]
    fn test_cs2_delete_is_idempotent_and_not_limited_to_open_chat() {
        let (mut state, _rx) = create_test_state("alice");
        process_event(&mut state, msg_send(message("1", "bob", "alice", "hi")));
        process_event(&mut state, msg_send(message("2", "carol", "alice", "hey")));

        let redraw = process_event(&mut state, msg_deleted("2"));
        // la conversazione con carol non è aperta: nessun ridisegno del dialogo
        assert!(!redraw.dialog);
        let once = state.chats.find("2").cloned().expect("message 2");
        assert!(once.status.is_deleted);

        process_event(&mut state, msg_deleted("2"));
        let twice = state.chats.find("2").cloned().expect("message 2");
        assert_eq!(once, twice);
        assert!(!state.chats.find("1").expect("message 1").status.is_deleted);
    }

    // ============================================================
    // CS3 - Edit e poi delete: il placeholder domina
    // ============================================================

    #[test]
    fn test_cs3_delete_dominates_edit_in_rendering() {
        let (mut state, _rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(&mut state, history(vec![read_message("1", "alice", "bob", "first")]));

        let redraw = process_event(&mut state, msg_edited("1", "second"));
        assert_eq!(redraw, Redraw::DIALOG);
        let msg = state.chats.find("1").unwrap();
        assert_eq!(msg.text, "second");
        assert!(msg.status.is_edited);

        let edited = services::dialog_view(&state).to_string();
        assert!(edited.contains(&format!("second{}", EDITED_SUFFIX)));

        process_event(&mut state, msg_deleted("1"));
        let view = services::dialog_view(&state);
        let line = view.messages().next().unwrap();
        assert_eq!(line.text, DELETED_PLACEHOLDER);
        assert!(!line.edited);
        assert_eq!(line.status, None);
        assert!(!view.to_string().contains("second"));
    }

    #[test]
    fn test_cs3_edit_without_text_is_ignored() {
        let (mut state, _rx) = create_test_state("alice");
        process_event(&mut state, msg_send(message("1", "bob", "alice", "keep")));

        let mut event = msg_edited("1", "x");
        if let funchat::dtos::ServerEvent::MsgEdit(payload) = &mut event {
            payload.message.text = None;
        }
        assert!(process_event(&mut state, event).is_none());
        assert_eq!(state.chats.find("1").unwrap().text, "keep");
    }

    // ============================================================
    // CS5 - Divisore dei non letti e ricevute
    // ============================================================

    #[test]
    fn test_cs5_divider_before_first_unread_and_receipts_on_interaction() {
        let (mut state, mut rx) = create_test_state("alice");
        state.users.set_presence("bob", false);

        services::open_conversation(&mut state, "bob").unwrap();
        let sent = drain_requests(&mut rx);
        assert!(matches!(sent.as_slice(), [ClientRequest::MsgFromUser(p)] if p.user.login == "bob"));

        process_event(
            &mut state,
            history(vec![
                read_message("m1", "bob", "alice", "seen"),
                message("m2", "bob", "alice", "unseen 1"),
                message("m3", "bob", "alice", "unseen 2"),
            ]),
        );

        let view = services::dialog_view(&state);
        assert!(matches!(&view.lines[1], DialogLine::UnreadDivider));
        assert!(matches!(&view.lines[2], DialogLine::Message(m) if m.text == "unseen 1"));
        assert_eq!(
            view.lines.iter().filter(|l| matches!(l, DialogLine::UnreadDivider)).count(),
            1
        );
        assert!(view.to_string().contains(UNREAD_DIVIDER));
        assert!(drain_requests(&mut rx).is_empty());

        assert!(services::acknowledge(&mut state));
        assert!(!services::dialog_view(&state).has_divider());
        assert_eq!(read_receipt_ids(&drain_requests(&mut rx)), ["m2", "m3"]);

        // una seconda interazione non rimanda le ricevute
        assert!(!services::acknowledge(&mut state));
        assert!(drain_requests(&mut rx).is_empty());
    }

    #[test]
    fn test_cs5_history_reload_shows_divider_again() {
        let (mut state, _rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(&mut state, history(vec![message("m1", "bob", "alice", "hi")]));
        services::acknowledge(&mut state);
        assert!(!services::dialog_view(&state).has_divider());

        process_event(&mut state, history(vec![message("m1", "bob", "alice", "hi")]));
        assert!(services::dialog_view(&state).has_divider());
    }

    #[test]
    fn test_cs5_live_message_in_open_chat_gets_receipt() {
        let (mut state, mut rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(&mut state, history(Vec::new()));
        drain_requests(&mut rx);

        let redraw = process_event(&mut state, msg_send(message("m9", "bob", "alice", "ping")));
        assert!(redraw.dialog);
        assert!(!redraw.roster);
        assert_eq!(read_receipt_ids(&drain_requests(&mut rx)), ["m9"]);
        assert_eq!(state.users.unread_count("bob"), 0);
    }

    #[test]
    fn test_cs5_empty_dialog_text() {
        let (mut state, _rx) = create_test_state("alice");
        assert!(services::dialog_view(&state).to_string().contains("Select a user"));

        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(&mut state, history(Vec::new()));
        let text = services::dialog_view(&state).to_string();
        assert!(text.contains("bob (Online)"));
        assert!(text.contains("This is the beginning of the dialogue"));
    }

    // ============================================================
    // CS6 - Modalità edit
    // ============================================================

    #[test]
    fn test_cs6_edit_mode_redirects_next_send() {
        let (mut state, mut rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(
            &mut state,
            history(vec![
                read_message("a1", "alice", "bob", "typo"),
                read_message("b1", "bob", "alice", "answer"),
            ]),
        );
        drain_requests(&mut rx);

        assert!(services::begin_edit(&mut state, 2).is_err(), "peer message is not editable");
        assert_eq!(services::begin_edit(&mut state, 1).unwrap(), "typo");
        assert!(services::dialog_view(&state).editing);

        services::submit(&mut state, "fixed").unwrap();
        let sent = drain_requests(&mut rx);
        assert_eq!(sent, [ClientRequest::edit("a1", "fixed")]);

        // edit mode consumato: il prossimo invio è un messaggio nuovo
        services::submit(&mut state, "next").unwrap();
        assert_eq!(drain_requests(&mut rx), [ClientRequest::send_message("bob", "next")]);
    }

    #[test]
    fn test_cs6_blank_text_is_not_sent_and_cancel_leaves_edit_mode() {
        let (mut state, mut rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(&mut state, history(vec![read_message("a1", "alice", "bob", "x")]));
        drain_requests(&mut rx);

        assert_eq!(services::submit(&mut state, "   ").unwrap(), None);
        assert!(drain_requests(&mut rx).is_empty());

        services::begin_edit(&mut state, 1).unwrap();
        assert!(services::cancel_edit(&mut state));
        assert!(!services::cancel_edit(&mut state));
    }

    #[test]
    fn test_cs6_deleting_message_under_edit_leaves_edit_mode() {
        let (mut state, mut rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(&mut state, history(vec![read_message("a1", "alice", "bob", "x")]));
        services::begin_edit(&mut state, 1).unwrap();

        process_event(&mut state, msg_deleted("a1"));
        assert!(!services::dialog_view(&state).editing);
        assert!(services::delete_message(&mut state, 1).is_err());
        assert!(message_at(&state, 1).unwrap().status.is_deleted);
        drain_requests(&mut rx);
    }

    #[test]
    fn test_cs6_failed_submit_keeps_edit_mode() {
        let (mut state, mut rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(&mut state, history(vec![read_message("a1", "alice", "bob", "typo")]));
        drain_requests(&mut rx);
        services::begin_edit(&mut state, 1).unwrap();

        // testo oltre il limite: rifiutato in validazione, l'edit resta attivo
        assert!(services::submit(&mut state, &"x".repeat(6000)).is_err());
        assert!(services::dialog_view(&state).editing);
        assert!(drain_requests(&mut rx).is_empty());

        services::submit(&mut state, "fixed").unwrap();
        assert_eq!(drain_requests(&mut rx), [ClientRequest::edit("a1", "fixed")]);
        assert!(!services::dialog_view(&state).editing);
    }

    #[test]
    fn test_cs6_submit_on_closed_connection_keeps_edit_mode() {
        let (mut state, rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        process_event(&mut state, msg_send(read_message("a1", "alice", "bob", "typo")));
        services::open_conversation(&mut state, "bob").unwrap();
        services::begin_edit(&mut state, 1).unwrap();
        drop(rx);

        assert!(services::submit(&mut state, "fixed").is_err());
        assert!(services::dialog_view(&state).editing);
    }

    #[test]
    fn test_cs6_submit_without_open_chat_fails() {
        let (mut state, _rx) = create_test_state("alice");
        assert!(services::submit(&mut state, "hello").is_err());
        assert!(services::open_conversation(&mut state, "alice").is_err());
        assert!(services::open_conversation(&mut state, "nobody").is_err());
    }

    // ============================================================
    // CS7 - Etichette di stato
    // ============================================================

    #[test]
    fn test_cs7_status_label_shows_most_advanced_state() {
        let (mut state, _rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(&mut state, history(vec![message("a1", "alice", "bob", "hi")]));

        let label = |state: &funchat::AppState| {
            services::dialog_view(state).messages().next().unwrap().status
        };
        assert_eq!(label(&state), Some(StatusLabel::Sent));

        process_event(&mut state, msg_delivered("a1"));
        assert_eq!(label(&state), Some(StatusLabel::Delivered));

        process_event(&mut state, msg_read("a1", Some("alice")));
        assert_eq!(label(&state), Some(StatusLabel::Read));

        // un MSG_DELIVER in ritardo non fa regredire l'etichetta
        process_event(&mut state, msg_delivered("a1"));
        assert_eq!(label(&state), Some(StatusLabel::Read));
    }

    #[test]
    fn test_cs7_inbound_messages_have_no_status_label() {
        let (mut state, _rx) = create_test_state("alice");
        state.users.set_presence("bob", true);
        services::open_conversation(&mut state, "bob").unwrap();
        process_event(&mut state, history(vec![read_message("b1", "bob", "alice", "hi")]));

        let view = services::dialog_view(&state);
        let line = view.messages().next().unwrap();
        assert!(!line.outgoing);
        assert_eq!(line.status, None);
        assert!(view.to_string().contains("3/5/2024, 2:07:09 PM"));
    }
}
