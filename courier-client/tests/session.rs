mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use courier_client::session_backend::{decode_peers, decode_tokens, encode_peers, encode_tokens};
use courier_client::{Config, InvocationError, PeerKey, PeerValue, SessionError, TelegramSession};
use courier_tl as tl;
use courier_tl::{Function, Object};
use tokio_util::sync::CancellationToken;

use common::{FakeGateway, FakeTransport, MemoryStorage, client, config, known, rpc, user};

fn dated(id: i32, date: i32) -> tl::enums::Message {
    tl::enums::Message::Message(tl::types::Message {
        out:     false,
        id,
        from_id: None,
        peer_id: tl::enums::Peer::User(tl::types::PeerUser { user_id: 5 }),
        date,
        message: String::new(),
        media:   None,
    })
}

fn slice(messages: Vec<tl::enums::Message>) -> Object {
    Object::Dialogs(tl::enums::messages::Dialogs::Slice(tl::types::messages::DialogsSlice {
        count: 10,
        messages,
        ..Default::default()
    }))
}

fn session(transport: &Arc<FakeTransport>, config: Config, gateway: &Arc<FakeGateway>) -> TelegramSession {
    TelegramSession::new(client(transport, config), gateway.handle(), Arc::new(MemoryStorage::default()))
}

/// Wait for the background task to issue `name`.
async fn wait_for(transport: &FakeTransport, name: &str, count: usize) {
    for _ in 0..200 {
        if transport.count(name) >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("{name} not called {count} time(s): {:?}", transport.names());
}

#[tokio::test]
async fn signed_in_session_syncs_dialogs_in_pages() {
    let transport = FakeTransport::new(|f| match f {
        Function::UsersGetUsers(_) => {
            Ok(Object::Users(vec![tl::enums::User::User(tl::types::User { is_self: true, ..user(1, 10, "Me") })]))
        }
        Function::MessagesGetDialogs(req) if req.offset_date == 0 => {
            Ok(slice(vec![dated(3, 300), dated(2, 200), tl::enums::Message::Empty(Default::default())]))
        }
        Function::MessagesGetDialogs(_) => Ok(slice(vec![dated(1, 100)])),
        other => Err(rpc(400, other.name())),
    });
    let gateway = FakeGateway::new(&[]);
    let session = session(&transport, Config { dialogs_page: 3, ..config() }, &gateway);
    let cancel = CancellationToken::new();

    session.start(&cancel).await.unwrap();
    assert!(session.is_started());
    assert!(session.client().is_authorized());

    wait_for(&transport, "messages.getDialogs", 2).await;
    let offsets: Vec<i32> = transport
        .calls()
        .into_iter()
        .filter_map(|f| match f {
            Function::MessagesGetDialogs(req) => Some(req.offset_date),
            _ => None,
        })
        .collect();
    assert_eq!(offsets, vec![0, 200]);
    assert!(matches!(session.start(&cancel).await, Err(SessionError::AlreadyRunning)));

    session.stop().await.unwrap();
    assert!(!session.is_started());
}

#[tokio::test]
async fn anonymous_session_starts_without_sync() {
    let transport = FakeTransport::new(|f| match f {
        Function::UsersGetUsers(_) => Err(rpc(401, "AUTH_KEY_UNREGISTERED")),
        other => Err(rpc(400, other.name())),
    });
    let gateway = FakeGateway::new(&[]);
    let session = session(&transport, config(), &gateway);

    session.start(&CancellationToken::new()).await.unwrap();
    assert!(session.is_started());
    assert!(!session.client().is_authorized());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.count("messages.getDialogs"), 0);

    session.stop().await.unwrap();
    // A stopped session may be started again.
    session.start(&CancellationToken::new()).await.unwrap();
    session.stop().await.unwrap();
}

#[tokio::test]
async fn logout_tokens_survive_a_restart() {
    let stored = encode_tokens(&[b"old".to_vec()]).unwrap().unwrap();
    let transport = FakeTransport::new(|_| Err(rpc(401, "AUTH_KEY_UNREGISTERED")));
    let gateway = FakeGateway::new(&[(".auth", stored.as_str())]);
    let session = session(&transport, config(), &gateway);

    session.start(&CancellationToken::new()).await.unwrap();
    assert_eq!(session.authenticator().backup_tokens().await, vec![b"old".to_vec()]);

    session.authenticator().restore_tokens(vec![b"new".to_vec()]).await;
    session.stop().await.unwrap();

    let saved = gateway.metadata.lock().unwrap().get(".auth").cloned().unwrap();
    let tokens = decode_tokens(&saved).unwrap();
    assert_eq!(tokens.len(), 2);
    assert!(tokens.contains(&b"old".to_vec()) && tokens.contains(&b"new".to_vec()));
}

#[tokio::test]
async fn cancelled_start_stops_the_task() {
    let session = session(&FakeTransport::silent(), config(), &FakeGateway::new(&[]));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = session.start(&cancel).await.unwrap_err();
    assert!(matches!(err, SessionError::Invocation(InvocationError::Cancelled)));
    assert!(!session.is_started());
}

#[tokio::test]
async fn user_access_hashes_survive_a_restart() {
    let stored = encode_peers(&HashMap::from([(9, 90)])).unwrap().unwrap();
    let transport = FakeTransport::new(|_| Err(rpc(401, "AUTH_KEY_UNREGISTERED")));
    let gateway = FakeGateway::new(&[(".peers", stored.as_str())]);
    let session = session(&transport, config(), &gateway);

    session.start(&CancellationToken::new()).await.unwrap();
    let peers = session.client().peers();
    assert_eq!(peers.find(PeerKey::user(9)), Some(PeerValue { access_hash: 90 }));

    known(session.client(), user(5, 50, "Ann"));
    session.stop().await.unwrap();

    let saved = gateway.metadata.lock().unwrap().get(".peers").cloned().unwrap();
    assert_eq!(decode_peers(&saved).unwrap(), HashMap::from([(9, 90), (5, 50)]));
}

#[tokio::test]
async fn quick_sign_out_and_in_purges_and_resyncs() {
    let transport = FakeTransport::new(|f| match f {
        Function::UsersGetUsers(_) => {
            Ok(Object::Users(vec![tl::enums::User::User(tl::types::User { is_self: true, ..user(1, 10, "Me") })]))
        }
        Function::MessagesGetDialogs(_) => {
            Ok(Object::Dialogs(tl::enums::messages::Dialogs::Dialogs(Default::default())))
        }
        other => Err(rpc(400, other.name())),
    });
    let gateway = FakeGateway::new(&[]);
    let session = session(&transport, config(), &gateway);

    session.start(&CancellationToken::new()).await.unwrap();
    wait_for(&transport, "messages.getDialogs", 1).await;
    known(session.client(), user(7, 70, "Bob"));

    // Both transitions land before the session task gets to run.
    let me = session.client().me().unwrap();
    let signal = session.client().signal();
    assert!(signal.reset());
    signal.set_user(Some(me));

    wait_for(&transport, "messages.getDialogs", 2).await;
    assert_eq!(session.client().peers().find(PeerKey::user(7)), None);

    session.stop().await.unwrap();
}
