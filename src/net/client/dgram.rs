//! A DNS transport over a datagram socket.
//!
//! One socket serves any number of concurrent requests towards any number
//! of servers. Outstanding transactions live in a table keyed by the
//! message ID; a receiver task owns the socket's read side and routes
//! every arriving datagram to the matching transaction.
//!
//! The same socket can answer queries, too. A received message that does
//! not belong to a pending transaction is handed to a listener channel if
//! one was installed via [`Connection::listen`], so one port can act as
//! client and server at once.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{debug, trace, warn};

use crate::base::message::MAX_UDP_PAYLOAD;
use crate::base::Message;
use crate::net::client::error::Error;
use crate::utils::config::DefMinMax;

//------------ Configuration Constants ---------------------------------------

/// Configuration limits for the number of ID allocation attempts.
const ID_RETRIES: DefMinMax<usize> = DefMinMax::new(32, 1, 1024);

/// Size of the receive buffer.
///
/// Large enough for any reply a server may send after EDNS negotiation.
const RECV_SIZE: usize = 65535;

//------------ Config --------------------------------------------------------

/// Configuration for a datagram transport.
#[derive(Clone, Debug)]
pub struct Config {
    /// The local address to bind to.
    bind_addr: SocketAddr,

    /// Number of times to try a random transaction ID before giving up.
    id_retries: usize,
}

impl Config {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the local address the socket binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Sets the local address to bind to.
    ///
    /// The default binds an ephemeral port on all IPv4 interfaces. A
    /// server transport sets a fixed port here.
    pub fn set_bind_addr(&mut self, addr: SocketAddr) {
        self.bind_addr = addr;
    }

    /// Returns the number of ID allocation attempts.
    pub fn id_retries(&self) -> usize {
        self.id_retries
    }

    /// Sets the number of ID allocation attempts.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_id_retries(&mut self, value: usize) {
        self.id_retries = ID_RETRIES.limit(value);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            id_retries: ID_RETRIES.default(),
        }
    }
}

//------------ Connection ----------------------------------------------------

/// A handle onto a datagram transport.
#[derive(Clone, Debug)]
pub struct Connection {
    /// Reference to the shared transport state.
    inner: Arc<InnerConnection>,
}

impl Connection {
    /// Binds a socket and creates a transport for it.
    ///
    /// Returns a connection handle and the transport itself. The
    /// transport's [`run`][Transport::run] future reads from the socket
    /// and needs to be spawned onto a runtime before any request can
    /// complete.
    pub async fn bind(config: Config) -> Result<(Self, Transport), Error> {
        let sock = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|err| Error::Bind(Arc::new(err)))?;
        let inner = Arc::new(InnerConnection {
            sock,
            config,
            pending: Mutex::new(HashMap::new()),
            listener: Mutex::new(None),
        });
        let conn = Self {
            inner: inner.clone(),
        };
        Ok((conn, Transport { inner }))
    }

    /// Returns the local address of the underlying socket.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.inner
            .sock
            .local_addr()
            .map_err(|err| Error::Bind(Arc::new(err)))
    }

    /// Reserves a transaction ID.
    ///
    /// The ID stays reserved across any number of [`exchange`] attempts
    /// until [`release_id`] is called, so retries of one request go out
    /// under a single ID.
    ///
    /// [`exchange`]: Self::exchange
    /// [`release_id`]: Self::release_id
    pub fn allocate_id(&self) -> Result<u16, Error> {
        let mut pending = self.inner.pending.lock();
        let mut rng = rand::thread_rng();
        for _ in 0..self.inner.config.id_retries {
            let id = rng.gen::<u16>();
            if !pending.contains_key(&id) {
                pending.insert(
                    id,
                    Pending {
                        sender: None,
                        sent_to: None,
                    },
                );
                return Ok(id);
            }
        }
        Err(Error::TransactionIdSpace)
    }

    /// Releases a transaction ID reserved with [`allocate_id`].
    ///
    /// [`allocate_id`]: Self::allocate_id
    pub fn release_id(&self, id: u16) {
        self.inner.pending.lock().remove(&id);
    }

    /// Performs one request attempt towards a server.
    ///
    /// The message's ID must have been reserved with [`allocate_id`]
    /// beforehand. Waits up to `wait` for a reply from `server`; on
    /// expiry the attempt ends with [`Error::Timeout`] while the ID
    /// reservation stays in place for the next attempt.
    ///
    /// [`allocate_id`]: Self::allocate_id
    pub async fn exchange(
        &self,
        server: SocketAddr,
        msg: &Message,
        wait: Duration,
    ) -> Result<Message, Error> {
        let id = msg.header.id;
        let (sender, receiver) = oneshot::channel();
        {
            let mut pending = self.inner.pending.lock();
            match pending.get_mut(&id) {
                Some(entry) => {
                    entry.sender = Some(sender);
                    entry.sent_to = Some(server);
                }
                None => return Err(Error::TransactionIdSpace),
            }
        }

        let dgram = msg.compose(Some(compose_limit(msg)))?;
        trace!(%server, id, "sending request datagram");
        if let Err(err) = self.inner.sock.send_to(&dgram, server).await {
            self.clear_attempt(id);
            return Err(Error::Send(Arc::new(err)));
        }

        match timeout(wait, receiver).await {
            Ok(Ok(res)) => res,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.clear_attempt(id);
                Err(Error::Timeout)
            }
        }
    }

    /// Installs a listener for messages outside any pending transaction.
    ///
    /// Used by a server to take queries off the socket. Replaces any
    /// previously installed listener.
    pub fn listen(&self) -> mpsc::UnboundedReceiver<(Message, SocketAddr)> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.inner.listener.lock() = Some(sender);
        receiver
    }

    /// Sends a message to a peer without entering the pending table.
    ///
    /// This is the reply path of a server running on this socket. The
    /// message is truncated to the UDP payload limit if necessary.
    pub async fn send_to(
        &self,
        msg: &Message,
        peer: SocketAddr,
    ) -> Result<(), Error> {
        let dgram = msg.compose(Some(compose_limit(msg)))?;
        self.inner
            .sock
            .send_to(&dgram, peer)
            .await
            .map_err(|err| Error::Send(Arc::new(err)))?;
        Ok(())
    }

    /// Drops the reply sender of an attempt, keeping the reservation.
    fn clear_attempt(&self, id: u16) {
        if let Some(entry) = self.inner.pending.lock().get_mut(&id) {
            entry.sender = None;
        }
    }
}

/// Returns the compose size limit for a datagram carrying `msg`.
///
/// An EDNS message may use the payload size its OPT record advertises;
/// anything else stays within the traditional 512 octets.
fn compose_limit(msg: &Message) -> usize {
    match msg.opt {
        Some(ref opt) => {
            usize::from(opt.udp_payload_size).max(MAX_UDP_PAYLOAD)
        }
        None => MAX_UDP_PAYLOAD,
    }
}

//------------ Transport -----------------------------------------------------

/// The receive side of a datagram transport.
#[derive(Debug)]
pub struct Transport {
    /// The shared transport state.
    inner: Arc<InnerConnection>,
}

impl Transport {
    /// Runs the receive loop.
    ///
    /// Returns once the last [`Connection`] handle is gone and another
    /// datagram arrives. Aborting the task stops the transport at any
    /// time.
    pub async fn run(self) {
        let mut buf = vec![0u8; RECV_SIZE];
        loop {
            if Arc::strong_count(&self.inner) == 1 {
                // Only the transport itself is left.
                return;
            }
            let (len, peer) = match self.inner.sock.recv_from(&mut buf).await
            {
                Ok(res) => res,
                Err(err) => {
                    warn!(error = %err, "datagram receive failed");
                    continue;
                }
            };
            let msg = match Message::parse(&buf[..len]) {
                Ok(msg) => msg,
                Err(err) => {
                    warn!(%peer, error = %err, "dropping malformed datagram");
                    continue;
                }
            };
            self.dispatch(msg, peer);
        }
    }

    /// Routes one received message.
    fn dispatch(&self, msg: Message, peer: SocketAddr) {
        if msg.header.qr {
            let mut pending = self.inner.pending.lock();
            if let Some(entry) = pending.get_mut(&msg.header.id) {
                if entry.sent_to != Some(peer) {
                    warn!(
                        %peer, id = msg.header.id,
                        "dropping response from unexpected source",
                    );
                    return;
                }
                if let Some(sender) = entry.sender.take() {
                    let _ = sender.send(Ok(msg));
                } else {
                    debug!(
                        id = msg.header.id,
                        "dropping response for abandoned attempt",
                    );
                }
                return;
            }
        }
        let mut listener = self.inner.listener.lock();
        if let Some(sender) = listener.as_ref() {
            if sender.send((msg, peer)).is_err() {
                *listener = None;
            }
        } else {
            debug!(%peer, "dropping unexpected message");
        }
    }
}

//------------ InnerConnection -----------------------------------------------

/// Shared state of a datagram transport.
#[derive(Debug)]
struct InnerConnection {
    /// The socket.
    sock: UdpSocket,

    /// User configuration.
    config: Config,

    /// Outstanding transactions by message ID.
    pending: Mutex<HashMap<u16, Pending>>,

    /// Where to deliver messages outside any pending transaction.
    listener: Mutex<Option<mpsc::UnboundedSender<(Message, SocketAddr)>>>,
}

/// A pending transaction.
#[derive(Debug)]
struct Pending {
    /// Delivers the reply of the current attempt.
    ///
    /// `None` between attempts; the ID then stays reserved but an
    /// arriving reply has nowhere to go and is dropped.
    sender: Option<oneshot::Sender<Result<Message, Error>>>,

    /// The server the current attempt went to.
    ///
    /// A reply from any other source is treated as spoofed and dropped.
    sent_to: Option<SocketAddr>,
}

//============ Tests =========================================================
