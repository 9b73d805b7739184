//! UDP transport on the loopback interface.
//!
//! Each manager binds an ephemeral port, publishes it in the shared
//! [`AddressRegistry`] and runs one receiver thread. The receiver polls with a
//! short read timeout so that `stop` never waits on a blocked socket for
//! longer than one timeout.

use super::manager::{NetworkError, NetworkManager};
use super::message::{NeighborMessage, NeighborState};
use super::registry::{AddressRegistry, AddressResolver};
use crate::identifiers::NodeIdentifier;
use crate::node::NodeHandle;
use crate::sync::lock;
use log::{debug, trace, warn};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long a receive may block before the stop flag is checked again
pub const RECEIVE_TIMEOUT: Duration = Duration::from_millis(50);

/// A neighbor's last message counts as current for this many cycles
pub const STALE_AFTER_CYCLES: u64 = 2;

const MAX_DATAGRAM: usize = 64 * 1024;

#[derive(Debug)]
struct Received {
    round: u64,
    values: BTreeMap<String, f64>,
    cycle: u64,
}

#[derive(Debug)]
struct Active {
    node: Arc<NodeHandle>,
    socket: UdpSocket,
    receiver: JoinHandle<()>,
}

/// Shared between the manager and its receiver thread
#[derive(Debug, Default)]
struct Exchange {
    running: AtomicBool,
    cycle: AtomicU64,
    inbox: Mutex<HashMap<NodeIdentifier, Received>>,
}

#[derive(Debug)]
pub struct UdpNetworkManager {
    registry: Arc<AddressRegistry>,
    exchange: Arc<Exchange>,
    active: Mutex<Option<Active>>,
    snapshot: Mutex<BTreeMap<NodeIdentifier, NeighborState>>,
}

impl UdpNetworkManager {
    pub fn new(registry: Arc<AddressRegistry>) -> Self {
        Self {
            registry,
            exchange: Arc::new(Exchange::default()),
            active: Mutex::new(None),
            snapshot: Mutex::new(BTreeMap::new()),
        }
    }

    /// Address the receiver is bound to while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        lock(&self.active)
            .as_ref()
            .and_then(|active| active.socket.local_addr().ok())
    }
}

impl NetworkManager for UdpNetworkManager {
    fn start(&self, node: Arc<NodeHandle>) -> Result<(), NetworkError> {
        let mut active = lock(&self.active);
        if active.is_some() {
            return Err(NetworkError::AlreadyRunning(node.id().clone()));
        }

        let socket = UdpSocket::bind(("127.0.0.1", 0))?;
        socket.set_read_timeout(Some(RECEIVE_TIMEOUT))?;
        let addr = socket.local_addr()?;
        let receiver_socket = socket.try_clone()?;
        self.registry.register(node.id(), addr)?;

        self.exchange.running.store(true, Ordering::SeqCst);
        let exchange = Arc::clone(&self.exchange);
        let receiver_node = Arc::clone(&node);
        let spawned = thread::Builder::new()
            .name(format!("net-{}", node.id()))
            .spawn(move || receive_loop(receiver_node, receiver_socket, exchange));

        let receiver = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.exchange.running.store(false, Ordering::SeqCst);
                self.registry.unregister(node.id());
                return Err(e.into());
            }
        };

        debug!("Network manager for {} listening on {}", node.id(), addr);
        *active = Some(Active {
            node,
            socket,
            receiver,
        });
        Ok(())
    }

    fn stop(&self) {
        let Some(active) = lock(&self.active).take() else {
            return;
        };

        self.exchange.running.store(false, Ordering::SeqCst);
        self.registry.unregister(active.node.id());
        if active.receiver.join().is_err() {
            warn!("Receiver thread for {} panicked", active.node.id());
        }

        self.clear_neighbor_states();
        debug!("Network manager for {} stopped", active.node.id());
    }

    fn is_running(&self) -> bool {
        lock(&self.active).is_some()
    }

    fn begin_cycle(&self) {
        let Some(node) = lock(&self.active).as_ref().map(|active| Arc::clone(&active.node)) else {
            return;
        };

        let cycle = self.exchange.cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let inbox = lock(&self.exchange.inbox);
        let states = node
            .neighbors()
            .into_keys()
            .map(|neighbor| {
                let state = match inbox.get(&neighbor) {
                    Some(received) if cycle - received.cycle.min(cycle) <= STALE_AFTER_CYCLES => {
                        NeighborState::Known {
                            round: received.round,
                            values: received.values.clone(),
                        }
                    }
                    _ => {
                        debug!("{}: no recent state from neighbor {}", node.id(), neighbor);
                        NeighborState::Unknown
                    }
                };
                (neighbor, state)
            })
            .collect();
        drop(inbox);

        *lock(&self.snapshot) = states;
    }

    fn clear_neighbor_states(&self) {
        lock(&self.exchange.inbox).clear();
        lock(&self.snapshot).clear();
    }

    fn neighbor_states(&self) -> BTreeMap<NodeIdentifier, NeighborState> {
        lock(&self.snapshot).clone()
    }

    fn share(&self, round: u64, values: &BTreeMap<String, f64>) {
        let guard = lock(&self.active);
        let Some(active) = guard.as_ref() else {
            return;
        };

        let message = NeighborMessage {
            sender: active.node.id().clone(),
            round,
            values: values.clone(),
        };
        let bytes = match message.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{}: failed to encode neighbor message: {}", active.node.id(), e);
                return;
            }
        };

        for neighbor in active.node.neighbors().into_keys() {
            let Some(addr) = self.registry.resolve(&neighbor) else {
                debug!("{}: {}", active.node.id(), NetworkError::Unresolved(neighbor));
                continue;
            };
            if let Err(e) = active.socket.send_to(&bytes, addr) {
                debug!("{}: failed to send to {} at {}: {}", active.node.id(), neighbor, addr, e);
            }
        }
    }
}

impl Drop for UdpNetworkManager {
    fn drop(&mut self) {
        self.stop();
    }
}

fn receive_loop(node: Arc<NodeHandle>, socket: UdpSocket, exchange: Arc<Exchange>) {
    let mut buffer = vec![0u8; MAX_DATAGRAM];
    while exchange.running.load(Ordering::SeqCst) {
        let (length, from) = match socket.recv_from(&mut buffer) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(e) => {
                debug!("{}: receive failed: {}", node.id(), e);
                continue;
            }
        };

        let message = match NeighborMessage::decode(&buffer[..length]) {
            Ok(message) => message,
            Err(e) => {
                debug!("{}: dropping undecodable datagram from {}: {}", node.id(), from, e);
                continue;
            }
        };

        if !node.has_neighbor(&message.sender) {
            debug!("{}: dropping message from non-neighbor {}", node.id(), message.sender);
            continue;
        }

        trace!("{}: round {} from {}", node.id(), message.round, message.sender);
        let cycle = exchange.cycle.load(Ordering::SeqCst);
        lock(&exchange.inbox).insert(
            message.sender,
            Received {
                round: message.round,
                values: message.values,
                cycle,
            },
        );
    }
    trace!("{}: receiver exiting", node.id());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn pair() -> (Arc<AddressRegistry>, Arc<NodeHandle>, Arc<NodeHandle>) {
        let registry = Arc::new(AddressRegistry::new());
        let a = Arc::new(NodeHandle::new(NodeIdentifier::new("a")));
        let b = Arc::new(NodeHandle::new(NodeIdentifier::new("b")));
        a.add_neighbor(b.id().clone(), 1024.0);
        b.add_neighbor(a.id().clone(), 1024.0);
        (registry, a, b)
    }

    #[test]
    fn test_start_registers_and_stop_unregisters() {
        let (registry, a, _) = pair();
        let manager = UdpNetworkManager::new(Arc::clone(&registry));

        manager.start(Arc::clone(&a)).unwrap();
        assert!(manager.is_running());
        assert_eq!(registry.resolve(a.id()), manager.local_addr());
        assert!(matches!(manager.start(Arc::clone(&a)), Err(NetworkError::AlreadyRunning(_))));

        let started = Instant::now();
        manager.stop();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!manager.is_running());
        assert_eq!(registry.resolve(a.id()), None);
    }

    #[test]
    fn test_neighbors_exchange_state() {
        let (registry, a, b) = pair();
        let manager_a = UdpNetworkManager::new(Arc::clone(&registry));
        let manager_b = UdpNetworkManager::new(Arc::clone(&registry));
        manager_a.start(Arc::clone(&a)).unwrap();
        manager_b.start(Arc::clone(&b)).unwrap();

        let values = BTreeMap::from([("round".to_string(), 1.0)]);
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut heard = NeighborState::Unknown;
        while Instant::now() < deadline {
            manager_a.share(1, &values);
            thread::sleep(Duration::from_millis(20));
            manager_b.begin_cycle();
            heard = manager_b.neighbor_states()[a.id()].clone();
            if heard.is_known() {
                break;
            }
        }

        assert_eq!(heard.value("round"), Some(1.0));
        manager_a.stop();
        manager_b.stop();
    }

    #[test]
    fn test_unresolved_neighbor_is_unknown() {
        let (registry, a, b) = pair();
        let manager = UdpNetworkManager::new(registry);
        manager.start(Arc::clone(&a)).unwrap();

        // b never started, sharing must not fail
        manager.share(1, &BTreeMap::new());
        manager.begin_cycle();
        assert_eq!(manager.neighbor_states()[b.id()], NeighborState::Unknown);
        manager.stop();
    }
}
