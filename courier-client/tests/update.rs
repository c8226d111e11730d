mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use courier_client::{Client, MediaTransfer, Normalizer, UpdateHandler};
use courier_gateway::MessageKind;
use courier_tl as tl;
use courier_tl::{Function, Object};
use tokio_util::sync::CancellationToken;

use common::{FakeGateway, FakeTransport, MemoryStorage, client, config, known, rpc, updates, user};

fn incoming(from: i64, id: i32, text: &str, media: Option<tl::enums::MessageMedia>) -> tl::enums::Update {
    tl::enums::Update::NewMessage(tl::types::UpdateNewMessage {
        message: tl::enums::Message::Message(tl::types::Message {
            out:     false,
            id,
            from_id: None,
            peer_id: tl::enums::Peer::User(tl::types::PeerUser { user_id: from }),
            date:    1_700_000_000,
            message: text.into(),
            media,
        }),
        pts:       1,
        pts_count: 1,
    })
}

fn read_ok(f: &Function) -> Result<Object, courier_client::InvocationError> {
    match f {
        Function::MessagesReadHistory(_) => Ok(Object::AffectedMessages(
            tl::enums::messages::AffectedMessages::AffectedMessages(tl::types::messages::AffectedMessages {
                pts:       2,
                pts_count: 1,
            }),
        )),
        other => Err(rpc(400, other.name())),
    }
}

struct Fixture {
    transport:  Arc<FakeTransport>,
    gateway:    Arc<FakeGateway>,
    client:     Client,
    normalizer: Normalizer,
}

fn fixture(gateway: Arc<FakeGateway>) -> Fixture {
    let transport = FakeTransport::new(read_ok);
    let client = client(&transport, config());
    known(&client, user(5, 50, "Ann"));
    let media = MediaTransfer::new(client.clone(), Arc::new(MemoryStorage::default()), gateway.handle());
    let normalizer = Normalizer::new(client.clone(), gateway.handle(), media);
    Fixture { transport, gateway, client, normalizer }
}

async fn feed(fx: &Fixture, update: tl::enums::Update) {
    fx.normalizer
        .handle(&CancellationToken::new(), updates(vec![update], vec![]))
        .await
        .unwrap();
}

#[tokio::test]
async fn private_text_is_delivered_and_marked_read() {
    let fx = fixture(FakeGateway::new(&[]));
    feed(&fx, incoming(5, 31, "hi there", None)).await;

    let reads = fx.gateway.reads();
    assert_eq!(reads.len(), 1);
    let update = &reads[0];
    assert_eq!(update.chat.chat_id, "5");
    assert_eq!(update.chat.contact.channel, "telegram");
    assert_eq!(update.chat.contact.first_name, "Ann");
    assert_eq!(update.message.kind, MessageKind::Text);
    assert_eq!(update.message.text, "hi there");
    assert_eq!(update.message.variables, HashMap::from([("5".to_string(), "31".to_string())]));

    let calls = fx.transport.calls();
    let [Function::MessagesReadHistory(read)] = calls.as_slice() else { panic!("{calls:?}") };
    assert_eq!(read.max_id, 31);
    assert_eq!(read.peer, tl::enums::InputPeer::User(tl::types::InputPeerUser { user_id: 5, access_hash: 50 }));
}

#[tokio::test]
async fn new_chat_carries_the_username() {
    let gateway = Arc::new(FakeGateway {
        bot_id:   1,
        metadata: Mutex::new(HashMap::new()),
        reads:    Mutex::new(Vec::new()),
        new_chat: true,
        web_root: std::env::temp_dir(),
    });
    let fx = fixture(gateway);
    known(&fx.client, tl::types::User { username: Some("ann".into()), ..user(5, 50, "Ann") });

    feed(&fx, incoming(5, 1, "yo", None)).await;

    let vars = &fx.gateway.reads()[0].message.variables;
    assert_eq!(vars.get("username").map(String::as_str), Some("ann"));
    assert_eq!(vars.get("5").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn bots_and_outgoing_messages_are_skipped() {
    let fx = fixture(FakeGateway::new(&[]));
    known(&fx.client, tl::types::User { bot: true, ..user(6, 60, "Robo") });

    feed(&fx, incoming(6, 2, "beep", None)).await;

    let tl::enums::Update::NewMessage(mut echo) = incoming(5, 3, "mine", None) else { unreachable!() };
    if let tl::enums::Message::Message(m) = &mut echo.message {
        m.out = true;
    }
    feed(&fx, tl::enums::Update::NewMessage(echo)).await;

    assert!(fx.gateway.reads().is_empty());
    assert!(fx.transport.calls().is_empty());
}

#[tokio::test]
async fn group_messages_are_skipped() {
    let fx = fixture(FakeGateway::new(&[]));
    let tl::enums::Update::NewMessage(mut update) = incoming(5, 4, "all", None) else { unreachable!() };
    if let tl::enums::Message::Message(m) = &mut update.message {
        m.peer_id = tl::enums::Peer::Chat(tl::types::PeerChat { chat_id: 900 });
    }
    feed(&fx, tl::enums::Update::NewMessage(update)).await;
    assert!(fx.gateway.reads().is_empty());
}

#[tokio::test]
async fn unknown_sender_is_looked_up() {
    let transport = FakeTransport::new(|f| match f {
        Function::UsersGetUsers(_) => Ok(Object::Users(vec![tl::enums::User::User(user(8, 80, "Zed"))])),
        other => read_ok(other),
    });
    let gateway = FakeGateway::new(&[]);
    let client = client(&transport, config());
    let media = MediaTransfer::new(client.clone(), Arc::new(MemoryStorage::default()), gateway.handle());
    let normalizer = Normalizer::new(client, gateway.handle(), media);

    normalizer
        .handle(&CancellationToken::new(), updates(vec![incoming(8, 9, "hello", None)], vec![]))
        .await
        .unwrap();

    assert_eq!(transport.names(), vec!["users.getUsers", "messages.readHistory"]);
    assert_eq!(gateway.reads()[0].chat.contact.first_name, "Zed");
}

#[tokio::test]
async fn geo_point_becomes_a_maps_link() {
    let fx = fixture(FakeGateway::new(&[]));
    let geo = tl::enums::MessageMedia::Geo(tl::types::MessageMediaGeo {
        geo: tl::enums::GeoPoint::GeoPoint(tl::types::GeoPoint {
            long:            30.5234,
            lat:             50.4501,
            access_hash:     0,
            accuracy_radius: None,
        }),
    });
    feed(&fx, incoming(5, 10, "", Some(geo))).await;

    let reads = fx.gateway.reads();
    assert_eq!(reads[0].message.kind, MessageKind::Text);
    assert_eq!(reads[0].message.text, "https://www.google.com/maps/place/50.450100,30.523400");
}

#[tokio::test]
async fn shared_own_contact_is_tagged_with_the_chat_contact() {
    let fx = fixture(FakeGateway::new(&[]));
    let own = tl::enums::MessageMedia::Contact(tl::types::MessageMediaContact {
        phone_number: "+380501234567".into(),
        first_name:   "Ann".into(),
        last_name:    "Lee".into(),
        user_id:      5,
        ..Default::default()
    });
    feed(&fx, incoming(5, 11, "", Some(own))).await;

    let other = tl::enums::MessageMedia::Contact(tl::types::MessageMediaContact {
        phone_number: "+15550000000".into(),
        user_id:      99,
        ..Default::default()
    });
    feed(&fx, incoming(5, 12, "", Some(other))).await;

    let reads = fx.gateway.reads();
    assert_eq!(reads.len(), 2);

    let msg = &reads[0].message;
    assert_eq!(msg.kind, MessageKind::Contact);
    assert_eq!(msg.text, "<Ann Lee> +380501234567");
    let contact = msg.contact.as_ref().unwrap();
    assert_eq!(contact.id, 77);
    assert_eq!(contact.channel, "phone");

    let msg = &reads[1].message;
    assert_eq!(msg.text, "+15550000000");
    assert_eq!(msg.contact.as_ref().unwrap().id, 0);
}

#[tokio::test]
async fn unsupported_media_is_still_marked_read() {
    let fx = fixture(FakeGateway::new(&[]));
    feed(&fx, incoming(5, 13, "", Some(tl::enums::MessageMedia::Poll))).await;

    assert!(fx.gateway.reads().is_empty());
    assert_eq!(fx.transport.names(), vec!["messages.readHistory"]);
}
