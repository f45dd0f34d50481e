// Net Connection - ConnMan D-Bus Backend
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! D-Bus backend for a ConnMan-style daemon.
//!
//! All traffic runs on a private tokio runtime. Synchronous trait calls
//! block on that runtime; asynchronous requests and the signal listener
//! are spawned onto it and hand their results to user code on the
//! blocking pool, so callbacks may call back into the API.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};
use zbus::{Connection, MatchRule, Message, MessageStream};

use super::{
    convert, Completion, Daemon, DaemonEvent, EventKind, EventSink, PropertyValue, ServiceRecord,
    ServiceState,
};
use crate::models::{
    AddressFamily, BusType, ClientConfig, Error, Result, StatisticsType, TechnologyKind,
    TechnologyState, CONNMAN_MANAGER_INTERFACE, CONNMAN_SERVICE_INTERFACE,
    NETCONFIG_STATISTICS_INTERFACE,
};

/// Upper bound for connect/disconnect requests; association takes a while.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(120);

/// Service properties whose change can move the default service.
const TRACKED_PROPERTIES: [&str; 5] = ["State", "IPv4", "IPv6", "Proxy", "Nameservers"];

/// Which event kinds are currently forwarded.
#[derive(Default)]
struct Subscriptions([AtomicBool; 3]);

impl Subscriptions {
    fn set(&self, kind: EventKind, on: bool) {
        self.0[kind.index()].store(on, Ordering::SeqCst);
    }

    fn is_on(&self, kind: EventKind) -> bool {
        self.0[kind.index()].load(Ordering::SeqCst)
    }

    fn clear(&self) {
        for kind in EventKind::ALL {
            self.set(kind, false);
        }
    }
}

/// A live bus connection plus the task draining its signals.
struct Session {
    connection: Connection,
    listener: JoinHandle<()>,
}

/// The daemon reached over D-Bus.
pub struct ConnmanDaemon {
    config: ClientConfig,
    runtime: Runtime,
    session: Mutex<Option<Session>>,
    subscriptions: Arc<Subscriptions>,
}

impl ConnmanDaemon {
    /// Create a backend; no bus traffic happens until [`Daemon::connect`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("net-connection-dbus")
            .enable_all()
            .build()?;

        Ok(Self {
            config,
            runtime,
            session: Mutex::new(None),
            subscriptions: Arc::new(Subscriptions::default()),
        })
    }

    fn session_lock(&self) -> MutexGuard<'_, Option<Session>> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("D-Bus session lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn connection(&self) -> Result<Connection> {
        self.session_lock()
            .as_ref()
            .map(|s| s.connection.clone())
            .ok_or(Error::NoSession)
    }

    /// Run a future to completion on the private runtime.
    ///
    /// Callers already inside a runtime (our own blocking pool included)
    /// are moved to a scoped thread, since tokio forbids nested `block_on`.
    fn block_on<T: Send>(&self, fut: impl Future<Output = Result<T>> + Send) -> Result<T> {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.runtime.block_on(fut);
        }
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.runtime.block_on(fut))
                .join()
                .unwrap_or_else(|_| Err(Error::Internal("D-Bus call panicked".to_string())))
        })
    }

    /// Issue a service method in the background and report through `done`.
    fn spawn_service_request(&self, identifier: &str, method: &'static str, done: Completion) -> Result<()> {
        let connection = self.connection()?;
        let destination = self.config.service_name.clone();
        let path = identifier.to_string();

        debug!("Spawning {} for {}", method, path);
        self.runtime.spawn(async move {
            let result = call(
                &connection,
                CONNECT_TIMEOUT,
                &destination,
                &path,
                CONNMAN_SERVICE_INTERFACE,
                method,
                &(),
            )
            .await
            .map(|_| ());

            match &result {
                Ok(()) => info!("{} succeeded for {}", method, path),
                Err(e) => warn!("{} failed for {}: {}", method, path, e),
            }
            complete(done, result).await;
        });
        Ok(())
    }
}

impl Daemon for ConnmanDaemon {
    fn connect(&self, sink: EventSink) -> Result<()> {
        let mut session = self.session_lock();
        if session.is_some() {
            return Ok(());
        }

        let config = self.config.clone();
        let (connection, stream) = self
            .block_on(async move { session_within(config.call_timeout(), open_session(&config)).await })
            .map_err(|e| {
                if matches!(e, Error::SessionFailed(_)) {
                    e
                } else {
                    Error::SessionFailed(e.to_string())
                }
            })?;

        let listener = self.runtime.spawn(listen(
            connection.clone(),
            self.config.clone(),
            Arc::clone(&self.subscriptions),
            sink,
            stream,
        ));

        info!(
            "Connected to {} on the {} bus",
            self.config.service_name,
            self.config.bus.as_str()
        );
        *session = Some(Session {
            connection,
            listener,
        });
        Ok(())
    }

    fn disconnect(&self) {
        if let Some(session) = self.session_lock().take() {
            session.listener.abort();
            self.subscriptions.clear();
            info!("Disconnected from {}", self.config.service_name);
        }
    }

    fn technology(&self, kind: TechnologyKind) -> Result<Option<TechnologyState>> {
        let connection = self.connection()?;
        let config = self.config.clone();

        let technologies: Vec<(OwnedObjectPath, HashMap<String, OwnedValue>)> =
            self.block_on(async move {
                let reply = call(
                    &connection,
                    config.call_timeout(),
                    &config.service_name,
                    &config.manager_path,
                    CONNMAN_MANAGER_INTERFACE,
                    "GetTechnologies",
                    &(),
                )
                .await?;
                Ok(reply.body().deserialize()?)
            })?;

        Ok(technologies.into_iter().find_map(|(_, props)| {
            let props = properties_from_map(props);
            let matches = props.get("Type").and_then(PropertyValue::as_str) == Some(kind.as_native());
            matches.then(|| {
                let flag = |key: &str| props.get(key).and_then(PropertyValue::as_bool).unwrap_or(false);
                TechnologyState {
                    powered: flag("Powered"),
                    connected: flag("Connected"),
                    tethering: flag("Tethering"),
                }
            })
        }))
    }

    fn services(&self) -> Result<Vec<ServiceRecord>> {
        let connection = self.connection()?;
        let config = self.config.clone();
        self.block_on(async move { fetch_services(&connection, &config).await })
    }

    fn subscribe(&self, kind: EventKind) -> Result<()> {
        if self.session_lock().is_none() {
            return Err(Error::NoSession);
        }
        self.subscriptions.set(kind, true);
        debug!(kind = ?kind, "Forwarding daemon events");
        Ok(())
    }

    fn unsubscribe(&self, kind: EventKind) -> Result<()> {
        self.subscriptions.set(kind, false);
        debug!(kind = ?kind, "Stopped forwarding daemon events");
        Ok(())
    }

    fn open_service(&self, identifier: &str, done: Completion) -> Result<()> {
        self.spawn_service_request(identifier, "Connect", done)
    }

    fn close_service(&self, identifier: &str, done: Completion) -> Result<()> {
        self.spawn_service_request(identifier, "Disconnect", done)
    }

    fn set_default_cellular_service(&self, identifier: &str, done: Completion) -> Result<()> {
        self.spawn_service_request(identifier, "SetDefault", done)
    }

    fn remove_service(&self, identifier: &str) -> Result<()> {
        let connection = self.connection()?;
        let config = self.config.clone();
        let path = identifier.to_string();

        self.block_on(async move {
            call(
                &connection,
                config.call_timeout(),
                &config.service_name,
                &path,
                CONNMAN_SERVICE_INTERFACE,
                "Remove",
                &(),
            )
            .await
            .map(|_| ())
        })?;
        info!("Removed service {}", identifier);
        Ok(())
    }

    fn set_service_property(&self, identifier: &str, name: &str, value: PropertyValue) -> Result<()> {
        let connection = self.connection()?;
        let config = self.config.clone();
        let path = identifier.to_string();
        let name = name.to_string();

        self.block_on(async move {
            call(
                &connection,
                config.call_timeout(),
                &config.service_name,
                &path,
                CONNMAN_SERVICE_INTERFACE,
                "SetProperty",
                &(name.as_str(), value_from_property(value)),
            )
            .await
            .map(|_| ())
        })
    }

    fn add_cellular_service(&self, properties: BTreeMap<String, PropertyValue>) -> Result<String> {
        let connection = self.connection()?;
        let config = self.config.clone();
        let settings: HashMap<String, Value<'static>> = properties
            .into_iter()
            .map(|(k, v)| (k, value_from_property(v)))
            .collect();

        let path: OwnedObjectPath = self.block_on(async move {
            let reply = call(
                &connection,
                config.call_timeout(),
                &config.service_name,
                &config.manager_path,
                CONNMAN_MANAGER_INTERFACE,
                "CreateService",
                &("cellular", settings),
            )
            .await?;
            Ok(reply.body().deserialize()?)
        })?;

        info!("Created cellular service {}", path.as_str());
        Ok(path.as_str().to_string())
    }

    fn wifi_statistics(&self, kind: StatisticsType) -> Result<u64> {
        let connection = self.connection()?;
        let config = self.config.clone();
        let method = format!("GetWifi{}", kind.wifi_method_suffix());

        self.block_on(async move {
            let reply = call(
                &connection,
                config.call_timeout(),
                &config.statistics_service,
                &config.statistics_path,
                NETCONFIG_STATISTICS_INTERFACE,
                &method,
                &(),
            )
            .await?;
            Ok(reply.body().deserialize::<u64>()?)
        })
    }

    fn reset_wifi_statistics(&self, kind: StatisticsType) -> Result<()> {
        let connection = self.connection()?;
        let config = self.config.clone();
        let method = format!("ResetWifi{}", kind.wifi_method_suffix());

        self.block_on(async move {
            call(
                &connection,
                config.call_timeout(),
                &config.statistics_service,
                &config.statistics_path,
                NETCONFIG_STATISTICS_INTERFACE,
                &method,
                &(),
            )
            .await
            .map(|_| ())
        })
    }
}

impl Drop for ConnmanDaemon {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Bus connection plus the daemon's `PropertyChanged` signal stream.
async fn open_session(config: &ClientConfig) -> Result<(Connection, MessageStream)> {
    let connection = match config.bus {
        BusType::System => Connection::system().await,
        BusType::Session => Connection::session().await,
    }
    .map_err(|e| Error::SessionFailed(e.to_string()))?;

    let rule = MatchRule::builder()
        .msg_type(zbus::message::Type::Signal)
        .sender(config.service_name.as_str())?
        .member("PropertyChanged")?
        .build();
    let stream = MessageStream::for_match_rule(rule, &connection, None)
        .await
        .map_err(|e| Error::SessionFailed(e.to_string()))?;
    Ok((connection, stream))
}

/// Bound session setup; a bus that never answers fails the session.
async fn session_within<T>(limit: Duration, setup: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, setup)
        .await
        .unwrap_or_else(|_| Err(Error::SessionFailed(format!("no answer within {:?}", limit))))
}

/// One method call with a timeout, daemon errors mapped by name.
async fn call<B>(
    connection: &Connection,
    timeout: Duration,
    destination: &str,
    path: &str,
    interface: &str,
    method: &str,
    body: &B,
) -> Result<Message>
where
    B: serde::Serialize + zbus::zvariant::DynamicType,
{
    let request = connection.call_method(Some(destination), path, Some(interface), method, body);
    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(e)) => Err(map_method_error(method, e)),
        Err(_) => Err(Error::operation_failed(method, "timed out")),
    }
}

fn map_method_error(action: &str, err: zbus::Error) -> Error {
    if let zbus::Error::MethodError(name, detail, _) = &err {
        let detail = detail.clone().unwrap_or_else(|| name.to_string());
        match name.as_str() {
            "net.connman.Error.PermissionDenied" => return Error::PermissionDenied(detail),
            "net.connman.Error.AlreadyExists" | "net.connman.Error.AlreadyConnected" => {
                return Error::AlreadyExists(detail)
            }
            "net.connman.Error.InProgress" => return Error::NowInProgress(detail),
            "net.connman.Error.NotSupported" | "net.connman.Error.NotImplemented" => {
                return Error::NotSupported(detail)
            }
            "org.freedesktop.DBus.Error.NoMemory" => return Error::OutOfMemory,
            _ => {}
        }
    }
    error!("{} failed: {}", action, err);
    Error::operation_failed(action, err.to_string())
}

async fn fetch_services(connection: &Connection, config: &ClientConfig) -> Result<Vec<ServiceRecord>> {
    let reply = call(
        connection,
        config.call_timeout(),
        &config.service_name,
        &config.manager_path,
        CONNMAN_MANAGER_INTERFACE,
        "GetServices",
        &(),
    )
    .await?;

    let services: Vec<(OwnedObjectPath, HashMap<String, OwnedValue>)> = reply.body().deserialize()?;
    Ok(services
        .into_iter()
        .map(|(path, props)| ServiceRecord {
            identifier: path.as_str().to_string(),
            properties: properties_from_map(props),
        })
        .collect())
}

/// Hand a result to a completion on the blocking pool.
async fn complete(done: Completion, result: Result<()>) {
    if let Err(e) = tokio::task::spawn_blocking(move || done(result)).await {
        error!("Completion callback panicked: {}", e);
    }
}

async fn deliver(sink: &EventSink, event: DaemonEvent) {
    let sink = Arc::clone(sink);
    if let Err(e) = tokio::task::spawn_blocking(move || sink(event)).await {
        error!("Event sink panicked: {}", e);
    }
}

/// What subscribers care about on the default service.
#[derive(Debug, Default, PartialEq, Eq)]
struct DefaultSnapshot {
    service_type: Option<String>,
    ipv4: Option<String>,
    ipv6: Option<String>,
    proxy: Option<String>,
}

impl DefaultSnapshot {
    fn of(services: &[ServiceRecord]) -> Self {
        let default = convert::default_service(services);
        Self {
            service_type: default.and_then(ServiceRecord::service_type).map(str::to_string),
            ipv4: default.and_then(|s| convert::address(s, AddressFamily::Ipv4)),
            ipv6: default.and_then(|s| convert::address(s, AddressFamily::Ipv6)),
            proxy: default.and_then(convert::proxy_address),
        }
    }

    /// Events for subscribed kinds whose value moved.
    fn diff(&self, next: &Self, subscriptions: &Subscriptions) -> Vec<DaemonEvent> {
        let mut events = Vec::new();
        if subscriptions.is_on(EventKind::TypeChanged) && self.service_type != next.service_type {
            events.push(DaemonEvent::DefaultServiceChanged {
                service_type: next.service_type.clone(),
            });
        }
        if subscriptions.is_on(EventKind::IpChanged) && (self.ipv4 != next.ipv4 || self.ipv6 != next.ipv6) {
            events.push(DaemonEvent::IpChanged {
                ipv4: next.ipv4.clone(),
                ipv6: next.ipv6.clone(),
            });
        }
        if subscriptions.is_on(EventKind::ProxyChanged) && self.proxy != next.proxy {
            events.push(DaemonEvent::ProxyChanged {
                ipv4: next.proxy.clone(),
                ipv6: None,
            });
        }
        events
    }
}

async fn listen(
    connection: Connection,
    config: ClientConfig,
    subscriptions: Arc<Subscriptions>,
    sink: EventSink,
    mut stream: MessageStream,
) {
    let mut last = match fetch_services(&connection, &config).await {
        Ok(services) => DefaultSnapshot::of(&services),
        Err(e) => {
            warn!("Initial service query failed: {}", e);
            DefaultSnapshot::default()
        }
    };

    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(m) => m,
            Err(e) => {
                warn!("Dropping malformed signal: {}", e);
                continue;
            }
        };

        let header = message.header();
        let path = header.path().map(|p| p.as_str().to_string());
        let from_service = header
            .interface()
            .is_some_and(|i| i.as_str() == CONNMAN_SERVICE_INTERFACE);

        let (name, value): (String, OwnedValue) = match message.body().deserialize() {
            Ok(body) => body,
            Err(e) => {
                debug!("Ignoring PropertyChanged with unexpected body: {}", e);
                continue;
            }
        };

        if from_service && name == "State" {
            if let (Some(identifier), Some(state)) =
                (path, property_from_value(&value).as_ref().and_then(PropertyValue::as_str))
            {
                deliver(
                    &sink,
                    DaemonEvent::ServiceStateChanged {
                        identifier,
                        state: ServiceState::from_native(state),
                    },
                )
                .await;
            }
        }

        if !TRACKED_PROPERTIES.contains(&name.as_str()) {
            continue;
        }

        let next = match fetch_services(&connection, &config).await {
            Ok(services) => DefaultSnapshot::of(&services),
            Err(e) => {
                warn!("Service refresh after {} change failed: {}", name, e);
                continue;
            }
        };
        for event in last.diff(&next, &subscriptions) {
            deliver(&sink, event).await;
        }
        last = next;
    }

    debug!("Signal stream ended");
}

fn properties_from_map(map: HashMap<String, OwnedValue>) -> BTreeMap<String, PropertyValue> {
    map.into_iter()
        .filter_map(|(key, value)| property_from_value(&value).map(|v| (key, v)))
        .collect()
}

/// Reduce a D-Bus value to a [`PropertyValue`]; unsupported shapes yield `None`.
fn property_from_value(value: &Value<'_>) -> Option<PropertyValue> {
    match value {
        Value::Str(s) => Some(PropertyValue::str(s.as_str())),
        Value::ObjectPath(p) => Some(PropertyValue::str(p.as_str())),
        Value::Bool(b) => Some(PropertyValue::Bool(*b)),
        Value::U8(n) => Some(PropertyValue::U32(u32::from(*n))),
        Value::U16(n) => Some(PropertyValue::U32(u32::from(*n))),
        Value::U32(n) => Some(PropertyValue::U32(*n)),
        Value::I16(n) => Some(PropertyValue::I32(i32::from(*n))),
        Value::I32(n) => Some(PropertyValue::I32(*n)),
        Value::Value(inner) => property_from_value(inner),
        Value::Array(_) => Vec::<String>::try_from(value.try_clone().ok()?)
            .ok()
            .map(PropertyValue::List),
        Value::Dict(_) => HashMap::<String, OwnedValue>::try_from(value.try_clone().ok()?)
            .ok()
            .map(|map| PropertyValue::Dict(properties_from_map(map))),
        _ => None,
    }
}

fn value_from_property(value: PropertyValue) -> Value<'static> {
    match value {
        PropertyValue::Str(s) => Value::from(s),
        PropertyValue::Bool(b) => Value::from(b),
        PropertyValue::U32(n) => Value::from(n),
        PropertyValue::I32(n) => Value::from(n),
        PropertyValue::List(items) => Value::from(items),
        PropertyValue::Dict(map) => {
            let dict: HashMap<String, Value<'static>> = map
                .into_iter()
                .map(|(k, v)| (k, value_from_property(v)))
                .collect();
            Value::from(dict)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str, kind: &str, state: &str, ipv4: &str) -> ServiceRecord {
        let mut ip = BTreeMap::new();
        ip.insert("Address".to_string(), PropertyValue::str(ipv4));
        ServiceRecord::new(id)
            .with_property("Type", PropertyValue::str(kind))
            .with_property("State", PropertyValue::str(state))
            .with_property("IPv4", PropertyValue::Dict(ip))
    }

    #[test]
    fn test_value_conversion_keeps_shapes() {
        assert_eq!(
            property_from_value(&Value::from("wifi")),
            Some(PropertyValue::str("wifi"))
        );
        assert_eq!(property_from_value(&Value::from(7u8)), Some(PropertyValue::U32(7)));
        assert_eq!(
            property_from_value(&Value::from(vec!["8.8.8.8".to_string()])),
            Some(PropertyValue::List(vec!["8.8.8.8".to_string()]))
        );
        assert_eq!(property_from_value(&Value::from(1.5f64)), None);
    }

    #[test]
    fn test_snapshot_diff_respects_subscriptions() {
        let subscriptions = Subscriptions::default();
        let before = DefaultSnapshot::of(&[service("/a", "wifi", "online", "10.0.0.2")]);
        let after = DefaultSnapshot::of(&[service("/b", "ethernet", "ready", "10.0.0.3")]);

        assert!(before.diff(&after, &subscriptions).is_empty());

        subscriptions.set(EventKind::IpChanged, true);
        assert_eq!(
            before.diff(&after, &subscriptions),
            vec![DaemonEvent::IpChanged {
                ipv4: Some("10.0.0.3".to_string()),
                ipv6: None,
            }]
        );

        subscriptions.set(EventKind::TypeChanged, true);
        assert_eq!(before.diff(&after, &subscriptions).len(), 2);
        subscriptions.clear();
        assert!(!subscriptions.is_on(EventKind::TypeChanged));
    }

    #[test]
    fn test_snapshot_of_nothing_connected() {
        let snapshot = DefaultSnapshot::of(&[service("/a", "wifi", "idle", "10.0.0.2")]);
        assert_eq!(snapshot, DefaultSnapshot::default());
    }

    #[test]
    fn test_session_setup_times_out() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let result: Result<()> = runtime.block_on(session_within(
            Duration::from_millis(20),
            std::future::pending(),
        ));
        assert!(matches!(result, Err(Error::SessionFailed(_))));

        let ready = runtime.block_on(session_within(Duration::from_secs(1), async { Ok(7) }));
        assert_eq!(ready.unwrap(), 7);
    }

    #[test]
    fn test_backend_requires_session() {
        let daemon = ConnmanDaemon::new(ClientConfig::default()).unwrap();
        assert!(matches!(daemon.services(), Err(Error::NoSession)));
        assert!(matches!(daemon.subscribe(EventKind::IpChanged), Err(Error::NoSession)));
        daemon.disconnect();
    }
}
