//! Client tests against scripted server conversations.
//!
//! Each script interleaves the bytes the server sends with the exact bytes
//! the client must write; the mock panics on any deviation.

#![allow(clippy::unwrap_used)]

use mailsheet_imap::{Capability, Client, Error, FetchItem, SeqNum, Uid};
use tokio_test::io::Builder;

const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] Dovecot ready.\r\n";

fn seq(n: u32) -> SeqNum {
    SeqNum::new(n).unwrap()
}

#[tokio::test]
async fn full_read_only_session() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice \"open sesame\"\r\n")
        .read(b"A0000 OK [CAPABILITY IMAP4rev1 SORT] Logged in\r\n")
        .write(b"A0001 EXAMINE INBOX\r\n")
        .read(b"* FLAGS (\\Answered \\Seen)\r\n")
        .read(b"* OK [PERMANENTFLAGS ()] Read-only mailbox.\r\n")
        .read(b"* 3 EXISTS\r\n")
        .read(b"* 0 RECENT\r\n")
        .read(b"* OK [UIDVALIDITY 1700000000] UIDs valid\r\n")
        .read(b"* OK [UIDNEXT 42] Predicted next UID\r\n")
        .read(b"A0001 OK [READ-ONLY] Examine completed\r\n")
        .write(b"A0002 SEARCH ALL\r\n")
        .read(b"* SEARCH 3 1 2\r\n")
        .read(b"A0002 OK Search completed\r\n")
        .write(b"A0003 FETCH 3 (BODY.PEEK[])\r\n")
        .read(b"* 3 FETCH (BODY[] {19}\r\nSubject: hi\r\n\r\nyo\r\n)\r\n")
        .read(b"A0003 OK Fetch completed\r\n")
        .write(b"A0004 LOGOUT\r\n")
        .read(b"* BYE Logging out\r\n")
        .read(b"A0004 OK Logout completed\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    assert!(client.has_capability(&Capability::Auth("PLAIN".to_string())));

    let client = client.login("alice", "open sesame").await.unwrap();
    assert!(client.has_capability(&Capability::Unknown("SORT".to_string())));

    let (mut client, status) = client.examine("INBOX").await.unwrap();
    assert_eq!(status.exists, 3);
    assert_eq!(status.uid_validity, Some(1_700_000_000));
    assert_eq!(status.uid_next, Uid::new(42));
    assert!(status.read_only);
    assert_eq!(client.mailbox().as_str(), "INBOX");

    let ids = client.search("ALL").await.unwrap();
    assert_eq!(ids, vec![seq(3), seq(1), seq(2)]);

    let raw = client.fetch_message(seq(3)).await.unwrap();
    assert_eq!(raw, b"Subject: hi\r\n\r\nyo\r\n");

    client.logout().await.unwrap();
}

#[tokio::test]
async fn rejected_login_returns_the_client_for_logout() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice wrong\r\n")
        .read(b"A0000 NO [AUTHENTICATIONFAILED] Authentication failed.\r\n")
        .write(b"A0001 LOGOUT\r\n")
        .read(b"* BYE bye\r\nA0001 OK done\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let rejected = client.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(&rejected.error, Error::No(text) if text == "Authentication failed."));
    assert!(rejected.error.is_rejection());

    rejected.client.logout().await.unwrap();
}

#[tokio::test]
async fn missing_mailbox_is_rejected() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice secret\r\n")
        .read(b"A0000 OK Logged in\r\n")
        .write(b"A0001 EXAMINE Nope\r\n")
        .read(b"A0001 NO [NONEXISTENT] Mailbox doesn't exist: Nope\r\n")
        .write(b"A0002 LOGOUT\r\n")
        .read(b"* BYE bye\r\nA0002 OK done\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("alice", "secret").await.unwrap();
    let rejected = client.examine("Nope").await.unwrap_err();
    assert!(matches!(rejected.error, Error::No(_)));
    rejected.client.logout().await.unwrap();
}

#[tokio::test]
async fn bad_search_criteria() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice secret\r\n")
        .read(b"A0000 OK Logged in\r\n")
        .write(b"A0001 EXAMINE INBOX\r\n")
        .read(b"* 0 EXISTS\r\nA0001 OK [READ-ONLY] done\r\n")
        .write(b"A0002 SEARCH FLUFFY\r\n")
        .read(b"A0002 BAD Error in IMAP command SEARCH: Unknown argument FLUFFY\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("alice", "secret").await.unwrap();
    let (mut client, _) = client.examine("INBOX").await.unwrap();
    assert!(matches!(client.search("FLUFFY").await, Err(Error::Bad(_))));
}

#[tokio::test]
async fn empty_search_and_unsolicited_fetch() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice secret\r\n")
        .read(b"A0000 OK Logged in\r\n")
        .write(b"A0001 EXAMINE INBOX\r\n")
        .read(b"* 2 EXISTS\r\nA0001 OK done\r\n")
        .write(b"A0002 SEARCH UNSEEN\r\n")
        .read(b"* SEARCH\r\nA0002 OK done\r\n")
        .write(b"A0003 FETCH 2 (BODY.PEEK[])\r\n")
        .read(b"* 1 FETCH (FLAGS (\\Seen))\r\n")
        .read(b"* 2 FETCH (UID 8 BODY[] {1}\r\nx)\r\n")
        .read(b"A0003 OK done\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("alice", "secret").await.unwrap();
    let (mut client, _) = client.examine("INBOX").await.unwrap();
    assert!(client.search("UNSEEN").await.unwrap().is_empty());

    let items = client
        .fetch(seq(2), "")
        .await
        .unwrap();
    assert_eq!(
        items,
        vec![
            FetchItem::Uid(Uid::new(8).unwrap()),
            FetchItem::Body {
                section: String::new(),
                data: Some(b"x".to_vec()),
            },
        ]
    );
}

#[tokio::test]
async fn fetch_without_body_is_a_protocol_error() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice secret\r\n")
        .read(b"A0000 OK Logged in\r\n")
        .write(b"A0001 EXAMINE INBOX\r\n")
        .read(b"* 1 EXISTS\r\nA0001 OK done\r\n")
        .write(b"A0002 FETCH 9 (BODY.PEEK[])\r\n")
        .read(b"A0002 OK Fetch completed (no messages)\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("alice", "secret").await.unwrap();
    let (mut client, _) = client.examine("INBOX").await.unwrap();
    assert!(matches!(
        client.fetch_message(seq(9)).await,
        Err(Error::Protocol(_))
    ));
}

#[tokio::test]
async fn bye_greeting_refuses_connection() {
    let mock = Builder::new().read(b"* BYE Too many connections\r\n").build();
    match Client::from_stream(mock).await {
        Err(Error::Bye(text)) => assert_eq!(text, "Too many connections"),
        other => panic!("expected BYE, got {other:?}"),
    }
}

#[tokio::test]
async fn login_disabled_is_refused_locally() {
    let mock = Builder::new()
        .read(b"* OK [CAPABILITY IMAP4rev1 STARTTLS LOGINDISABLED] ready\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let rejected = client.login("alice", "secret").await.unwrap_err();
    assert!(matches!(rejected.error, Error::No(_)));
}

#[tokio::test]
async fn logout_tolerates_close_after_bye() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGOUT\r\n")
        .read(b"* BYE closing\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    client.logout().await.unwrap();
}

#[tokio::test]
async fn line_breaks_in_arguments_never_reach_the_wire() {
    let mock = Builder::new().read(GREETING).build();

    let client = Client::from_stream(mock).await.unwrap();
    let rejected = client.login("alice", "x\r\nA1 DELETE INBOX").await.unwrap_err();
    assert!(matches!(rejected.error, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn non_ascii_password_goes_out_as_literal() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice {6}\r\n")
        .read(b"+ Ready for literal data\r\n")
        .write("pässe\r\n".as_bytes())
        .read(b"A0000 OK Logged in\r\n")
        .write(b"A0001 LOGOUT\r\n")
        .read(b"* BYE bye\r\nA0001 OK done\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("alice", "pässe").await.unwrap();
    client.logout().await.unwrap();
}

#[tokio::test]
async fn literal_refused_before_continuation() {
    let mock = Builder::new()
        .read(GREETING)
        .write(b"A0000 LOGIN alice {6}\r\n")
        .read(b"A0000 BAD Literal too big\r\n")
        .write(b"A0001 LOGOUT\r\n")
        .read(b"* BYE bye\r\nA0001 OK done\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let rejected = client.login("alice", "pässe").await.unwrap_err();
    assert!(matches!(rejected.error, Error::Bad(_)));
    rejected.client.logout().await.unwrap();
}
