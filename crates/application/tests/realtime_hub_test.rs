//! 实时核心的行为测试
//!
//! 使用记录型的内存传输层代替真实网络连接，验证注册表、在线广播与消息路由的外部可观察行为。

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use application::realtime::DeletedMessage;
use application::{
    ConnectionId, ConnectionLifecycle, RealtimeEvent, RealtimeHub, RealtimeTransport,
    Registration, RouteOutcome, TransportError,
};
use async_trait::async_trait;
use chrono::Utc;
use config::{DuplicatePolicy, RealtimeConfig};
use domain::{MessageId, MessageSnapshot, UserId};
use uuid::Uuid;

/// 记录所有推送；可指定若干连接为"已断开"，对其推送返回错误
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(ConnectionId, RealtimeEvent)>>,
    closed: Mutex<Vec<ConnectionId>>,
    dead: Mutex<HashSet<ConnectionId>>,
}

impl RecordingTransport {
    fn kill(&self, connection: ConnectionId) {
        self.dead.lock().unwrap().insert(connection);
    }

    fn events_for(&self, connection: ConnectionId) -> Vec<RealtimeEvent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(conn, _)| *conn == connection)
            .map(|(_, event)| event.clone())
            .collect()
    }

    fn last_presence_for(&self, connection: ConnectionId) -> Option<HashSet<UserId>> {
        self.events_for(connection)
            .into_iter()
            .rev()
            .find_map(|event| match event {
                RealtimeEvent::PresenceUpdate(users) => Some(users.into_iter().collect()),
                _ => None,
            })
    }

    fn total_sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn closed(&self) -> Vec<ConnectionId> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RealtimeTransport for RecordingTransport {
    async fn send(
        &self,
        connection: ConnectionId,
        event: RealtimeEvent,
    ) -> Result<(), TransportError> {
        if self.dead.lock().unwrap().contains(&connection) {
            return Err(TransportError::ConnectionClosed(connection));
        }
        self.sent.lock().unwrap().push((connection, event));
        Ok(())
    }

    async fn close(&self, connection: ConnectionId) -> Result<(), TransportError> {
        self.closed.lock().unwrap().push(connection);
        Ok(())
    }
}

fn setup(policy: DuplicatePolicy, evict_superseded: bool) -> (Arc<RecordingTransport>, RealtimeHub) {
    let transport = Arc::new(RecordingTransport::default());
    let hub = RealtimeHub::new(
        transport.clone(),
        &RealtimeConfig {
            duplicate_policy: policy,
            evict_superseded,
        },
    );
    (transport, hub)
}

fn new_user() -> UserId {
    UserId::from(Uuid::new_v4())
}

fn snapshot_for(sender: UserId, recipient: UserId) -> MessageSnapshot {
    MessageSnapshot {
        id: MessageId::from(Uuid::new_v4()),
        sender_id: sender,
        recipient_id: recipient,
        text: Some("hello".into()),
        image_url: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn stale_close_keeps_user_online_via_new_connection() {
    let (_transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let alice = new_user();
    let h1 = ConnectionId::new();
    let h2 = ConnectionId::new();

    hub.on_connection_open(alice, h1).await;
    let registration = hub.on_connection_open(alice, h2).await;
    assert_eq!(registration, Registration::Replaced { superseded: h1 });

    assert!(!hub.on_connection_close(alice, h1).await);
    assert_eq!(hub.registry().lookup(alice).await, Some(h2));
    assert!(hub.is_online(alice).await);
}

#[tokio::test]
async fn presence_fanout_includes_joiner_and_excludes_leaver() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let alice = new_user();
    let bob = new_user();
    let carol = new_user();
    let (ha, hb, hc) = (ConnectionId::new(), ConnectionId::new(), ConnectionId::new());

    hub.on_connection_open(alice, ha).await;
    hub.on_connection_open(bob, hb).await;
    hub.on_connection_open(carol, hc).await;

    for conn in [ha, hb, hc] {
        let online = transport.last_presence_for(conn).unwrap();
        assert_eq!(online, HashSet::from([alice, bob, carol]));
    }

    assert!(hub.on_connection_close(carol, hc).await);
    for conn in [ha, hb] {
        let online = transport.last_presence_for(conn).unwrap();
        assert_eq!(online, HashSet::from([alice, bob]));
    }
}

#[tokio::test]
async fn routing_to_online_recipient_pushes_exactly_once() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let sender = new_user();
    let recipient = new_user();
    let handle = ConnectionId::new();
    hub.on_connection_open(recipient, handle).await;
    transport.clear();

    let message = snapshot_for(sender, recipient);
    let outcome = hub.route_created(&message).await;

    assert_eq!(outcome, RouteOutcome::Delivered(handle));
    assert_eq!(
        transport.events_for(handle),
        vec![RealtimeEvent::MessageCreated(message)]
    );
    assert_eq!(transport.total_sent(), 1);
}

#[tokio::test]
async fn routing_to_offline_recipient_is_a_silent_noop() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let outcome = hub
        .route_created(&snapshot_for(new_user(), new_user()))
        .await;

    assert_eq!(outcome, RouteOutcome::Offline);
    assert_eq!(transport.total_sent(), 0);
}

#[tokio::test]
async fn deletion_routes_a_single_event_to_the_recipient() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let recipient = new_user();
    let handle = ConnectionId::new();
    hub.on_connection_open(recipient, handle).await;
    transport.clear();

    let message_id = MessageId::from(Uuid::new_v4());
    let outcome = hub.route_deleted(message_id, recipient).await;

    assert_eq!(outcome, RouteOutcome::Delivered(handle));
    assert_eq!(
        transport.events_for(handle),
        vec![RealtimeEvent::MessageDeleted(DeletedMessage {
            id: message_id,
            recipient_id: recipient,
        })]
    );
}

#[tokio::test]
async fn repeated_stale_unregister_is_idempotent_and_silent() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let alice = new_user();
    let h1 = ConnectionId::new();
    let h2 = ConnectionId::new();
    hub.on_connection_open(alice, h1).await;
    hub.on_connection_open(alice, h2).await;
    transport.clear();

    assert!(!hub.on_connection_close(alice, h1).await);
    assert!(!hub.on_connection_close(alice, h1).await);

    assert_eq!(transport.total_sent(), 0);
    assert_eq!(hub.registry().lookup(alice).await, Some(h2));
}

#[tokio::test]
async fn dead_connection_does_not_block_other_recipients() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let alice = new_user();
    let bob = new_user();
    let (ha, hb) = (ConnectionId::new(), ConnectionId::new());
    hub.on_connection_open(alice, ha).await;
    transport.kill(ha);

    hub.on_connection_open(bob, hb).await;

    let online = transport.last_presence_for(hb).unwrap();
    assert_eq!(online, HashSet::from([alice, bob]));
    // 推送失败不会把用户移出注册表，只有关闭事件才会
    assert!(hub.is_online(alice).await);
}

#[tokio::test]
async fn failed_push_reports_failure_without_error() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let recipient = new_user();
    let handle = ConnectionId::new();
    hub.on_connection_open(recipient, handle).await;
    transport.kill(handle);

    let outcome = hub.route_created(&snapshot_for(new_user(), recipient)).await;
    assert_eq!(outcome, RouteOutcome::Failed(handle));
}

#[tokio::test]
async fn reject_policy_keeps_first_connection() {
    let (transport, hub) = setup(DuplicatePolicy::Reject, false);
    let alice = new_user();
    let h1 = ConnectionId::new();
    let h2 = ConnectionId::new();
    hub.on_connection_open(alice, h1).await;
    transport.clear();

    let mut second = ConnectionLifecycle::new(alice, h2);
    assert!(second.activate(&hub).await.is_err());

    assert_eq!(hub.registry().lookup(alice).await, Some(h1));
    assert_eq!(transport.total_sent(), 0);
}

#[tokio::test]
async fn superseded_connection_is_closed_when_eviction_enabled() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, true);
    let alice = new_user();
    let h1 = ConnectionId::new();
    let h2 = ConnectionId::new();
    hub.on_connection_open(alice, h1).await;
    hub.on_connection_open(alice, h2).await;

    assert_eq!(transport.closed(), vec![h1]);
}

#[tokio::test]
async fn superseded_connection_is_left_open_by_default() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let alice = new_user();
    hub.on_connection_open(alice, ConnectionId::new()).await;
    hub.on_connection_open(alice, ConnectionId::new()).await;

    assert!(transport.closed().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_connects_converge_on_full_online_set() {
    let (transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let hub = Arc::new(hub);
    let users: Vec<(UserId, ConnectionId)> =
        (0..32).map(|_| (new_user(), ConnectionId::new())).collect();

    let tasks = users.iter().map(|&(user, conn)| {
        let hub = hub.clone();
        tokio::spawn(async move { hub.on_connection_open(user, conn).await })
    });
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    let expected: HashSet<UserId> = users.iter().map(|(user, _)| *user).collect();
    assert_eq!(hub.registry().len().await, users.len());
    for &(_, conn) in &users {
        assert_eq!(transport.last_presence_for(conn).unwrap(), expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reconnects_leave_one_handle_per_user() {
    let (_transport, hub) = setup(DuplicatePolicy::Overwrite, false);
    let hub = Arc::new(hub);
    let alice = new_user();

    let tasks = (0..16).map(|_| {
        let hub = hub.clone();
        tokio::spawn(async move {
            let conn = ConnectionId::new();
            hub.on_connection_open(alice, conn).await;
            hub.on_connection_close(alice, conn).await;
            hub.on_connection_open(alice, conn).await;
            conn
        })
    });
    let handles: Vec<ConnectionId> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .collect();

    let snapshot = hub.registry().snapshot().await;
    assert_eq!(snapshot.len(), 1);
    let current = hub.registry().lookup(alice).await.unwrap();
    assert!(handles.contains(&current));
}
