//! The resolver: the crate's entry point for asking questions.
//!
//! A [`Resolver`] owns one datagram transport, a cache, and a set of
//! lazily created stream transports. A query runs through the
//! following stations:
//!
//! * the cache, which answers without touching the network;
//! * the in-flight table, which joins the query onto an identical one
//!   already underway so a burst of the same question costs one
//!   exchange;
//! * the retrying datagram pipeline of [`redundant`];
//! * a stream transport towards the same server when the datagram
//!   answer came back truncated.
//!
//! Zone transfers bypass cache and datagram entirely and always run
//! over a stream.
//!
//! [`redundant`]: super::redundant

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::base::iana::Rtype;
use crate::base::opt::OptRecord;
use crate::base::{Message, Name, Question, Record};
use crate::net::client::error::Error;
use crate::net::client::xfr::XfrAccumulator;
use crate::net::client::{cache, dgram, redundant, stream};
use crate::rdata::RecordData;

//------------ Config --------------------------------------------------------

/// Configuration for a resolver.
#[derive(Clone, Debug)]
pub struct Config {
    /// The upstream servers, in rotation order.
    servers: Vec<SocketAddr>,

    /// The local address the datagram socket binds to.
    bind_addr: SocketAddr,

    /// The OPT record attached to every outgoing query, if any.
    opt: Option<OptRecord>,

    /// Configuration of the retry pipeline.
    redundant: redundant::Config,
}

impl Config {
    /// Creates a config querying the given servers.
    pub fn new(servers: Vec<SocketAddr>) -> Self {
        Self {
            servers,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            opt: None,
            redundant: Default::default(),
        }
    }

    /// Returns the upstream servers.
    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    /// Sets the local address the datagram socket binds to.
    pub fn set_bind_addr(&mut self, addr: SocketAddr) {
        self.bind_addr = addr;
    }

    /// Sets the per-attempt timeout schedule.
    pub fn set_schedule(&mut self, schedule: Vec<tokio::time::Duration>) {
        self.redundant.set_schedule(schedule);
    }

    /// Enables EDNS with the given protocol version on all queries.
    ///
    /// Every outgoing query carries an OPT record advertising the
    /// version and [`DEF_UDP_PAYLOAD_SIZE`] octets of receive space.
    /// Tweak the returned record for a different payload size or the
    /// DNSSEC-OK bit.
    ///
    /// [`DEF_UDP_PAYLOAD_SIZE`]: crate::base::opt::DEF_UDP_PAYLOAD_SIZE
    pub fn set_edns_version(&mut self, version: u8) -> &mut OptRecord {
        self.opt.insert(OptRecord::new(version))
    }

    /// Disables EDNS on outgoing queries again.
    pub fn clear_edns(&mut self) {
        self.opt = None;
    }
}

//------------ Resolver ------------------------------------------------------

/// A caching stub resolver.
#[derive(Clone, Debug)]
pub struct Resolver {
    /// The shared resolver state.
    inner: Arc<InnerResolver>,
}

/// The innards of a resolver.
#[derive(Debug)]
struct InnerResolver {
    /// The datagram transport shared by all queries.
    dgram: dgram::Connection,

    /// The retrying pipeline over the server list.
    pipeline: redundant::Connection,

    /// The OPT record attached to every outgoing query, if any.
    opt: Option<OptRecord>,

    /// The response cache.
    cache: cache::Cache,

    /// Queries currently on the network, with everyone waiting for them.
    inflight: Mutex<HashMap<Question, Vec<WaiterSender>>>,

    /// Open stream transports by server.
    streams: Mutex<HashMap<SocketAddr, stream::Connection>>,
}

/// Delivers a shared result to one joined query.
type WaiterSender = oneshot::Sender<Result<Message, Error>>;

impl Resolver {
    /// Creates a resolver and spawns its transport onto the runtime.
    pub async fn new(config: Config) -> Result<Self, Error> {
        let mut dgram_config = dgram::Config::new();
        dgram_config.set_bind_addr(config.bind_addr);
        let (dgram, transport) =
            dgram::Connection::bind(dgram_config).await?;
        tokio::spawn(transport.run());
        let pipeline = redundant::Connection::new(
            dgram.clone(),
            config.servers,
            config.redundant,
        );
        Ok(Self {
            inner: Arc::new(InnerResolver {
                dgram,
                pipeline,
                opt: config.opt,
                cache: Default::default(),
                inflight: Mutex::new(HashMap::new()),
                streams: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Returns the underlying datagram transport.
    ///
    /// A server can install its listener on it to answer queries over
    /// the very socket the resolver queries with.
    pub fn dgram(&self) -> &dgram::Connection {
        &self.inner.dgram
    }

    /// Adds a server to the end of the rotation.
    pub fn add_server(&self, server: SocketAddr) {
        self.inner.pipeline.add_server(server);
    }

    /// Resolves a question to a response message.
    ///
    /// A response whose rcode reports a failure becomes the matching
    /// error; in particular a name that does not exist is
    /// [`Error::NameError`].
    pub async fn query(
        &self,
        question: Question,
    ) -> Result<Message, Error> {
        if let Some(hit) = self.inner.cache.lookup(&question) {
            debug!(%question, "answering from cache");
            let mut msg = Message::default();
            msg.header.qr = true;
            msg.header.rd = true;
            msg.header.ra = true;
            msg.questions.push(question);
            msg.answers = hit.answers;
            msg.authority = hit.authority;
            msg.additional = hit.additional;
            return Ok(msg);
        }

        // Join an identical query already underway, if there is one.
        let receiver = {
            let mut inflight = self.inner.inflight.lock();
            match inflight.get_mut(&question) {
                Some(waiters) => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    Some(receiver)
                }
                None => {
                    inflight.insert(question.clone(), Vec::new());
                    None
                }
            }
        };
        if let Some(receiver) = receiver {
            return receiver
                .await
                .map_err(|_| Error::ConnectionClosed)?;
        }

        // The guard ties the in-flight entry to this future. If the
        // future is dropped mid-exchange, the entry goes away and the
        // joined queries get an error instead of waiting forever.
        let mut guard = FlightGuard {
            inner: self.inner.clone(),
            question: Some(question.clone()),
        };
        let res = self.query_network(&question).await;
        guard.settle(res.clone());
        res
    }

    /// Resolves a question over the network.
    async fn query_network(
        &self,
        question: &Question,
    ) -> Result<Message, Error> {
        let msg = self.build_query(question.clone());
        let (mut reply, server) =
            self.inner.pipeline.request(msg).await?;
        if reply.header.tc {
            debug!(%question, %server, "truncated reply, retrying over stream");
            reply = self
                .stream_request(server, self.build_query(question.clone()))
                .await?;
        }
        if let Some(err) = Error::from_rcode(reply.header.rcode) {
            return Err(err);
        }
        self.inner.cache.insert(question.clone(), &reply);
        Ok(reply)
    }

    /// Builds an outgoing query, attaching the configured OPT record.
    fn build_query(&self, question: Question) -> Message {
        let mut msg = Message::query(question);
        msg.opt = self.inner.opt.clone();
        msg
    }

    /// Performs one request over the stream transport for a server.
    ///
    /// The server may have closed an idle connection since it was last
    /// used; that shows up as a closed-connection error and is retried
    /// once on a fresh one.
    async fn stream_request(
        &self,
        server: SocketAddr,
        msg: Message,
    ) -> Result<Message, Error> {
        let conn = self.stream_conn(server, false);
        match conn.request(msg.clone()).await {
            Ok(reply) => Ok(reply),
            Err(Error::ConnectionClosed) => {
                let conn = self.stream_conn(server, true);
                conn.request(msg).await
            }
            Err(err) => {
                self.inner.streams.lock().remove(&server);
                Err(err)
            }
        }
    }

    /// Returns the stream transport towards a server, creating it if
    /// needed or if `fresh` demands it.
    fn stream_conn(
        &self,
        server: SocketAddr,
        fresh: bool,
    ) -> stream::Connection {
        let mut streams = self.inner.streams.lock();
        if !fresh {
            if let Some(conn) = streams.get(&server) {
                return conn.clone();
            }
        }
        let (conn, transport) = stream::Connection::new(server);
        tokio::spawn(transport.run());
        streams.insert(server, conn.clone());
        conn
    }

    /// Transfers a whole zone from the current server.
    ///
    /// Runs an AXFR over a stream transport and accumulates the answer
    /// records of however many response messages the server sends. The
    /// returned list starts and ends with the zone's SOA record.
    pub async fn transfer_zone(
        &self,
        zone: Name,
    ) -> Result<Vec<Record>, Error> {
        let server = match self.inner.pipeline.current_server() {
            Some(server) => server,
            None => return Err(Error::ConnectionClosed),
        };
        let msg = self.build_query(Question::new(zone, Rtype::AXFR));
        let conn = self.stream_conn(server, false);
        let mut receiver = conn.streaming_request(msg).await?;

        let mut acc = XfrAccumulator::new();
        loop {
            match receiver.recv().await {
                Some(Ok(msg)) => {
                    if let Some(err) =
                        Error::from_rcode(msg.header.rcode)
                    {
                        return Err(err);
                    }
                    if acc.push_message(&msg) {
                        return Ok(acc.into_records());
                    }
                }
                Some(Err(err)) => return Err(err),
                None => return Err(Error::IncompleteTransfer),
            }
        }
    }

    /// Looks up the IPv4 addresses of a host name.
    pub async fn lookup_address(
        &self,
        name: Name,
    ) -> Result<Vec<Ipv4Addr>, Error> {
        let reply = self.query(Question::new(name, Rtype::A)).await?;
        Ok(reply
            .answers
            .iter()
            .filter_map(|record| match &record.data {
                RecordData::A(a) => Some(a.addr),
                _ => None,
            })
            .collect())
    }

    /// Looks up the IPv6 addresses of a host name.
    pub async fn lookup_ipv6(
        &self,
        name: Name,
    ) -> Result<Vec<Ipv6Addr>, Error> {
        let reply = self.query(Question::new(name, Rtype::AAAA)).await?;
        Ok(reply
            .answers
            .iter()
            .filter_map(|record| match &record.data {
                RecordData::Aaaa(aaaa) => Some(aaaa.addr),
                _ => None,
            })
            .collect())
    }

    /// Looks up the host names of an address.
    ///
    /// Queries the PTR records of the address's reverse pointer name.
    pub async fn lookup_ptr(
        &self,
        addr: IpAddr,
    ) -> Result<Vec<Name>, Error> {
        let reply = self
            .query(Question::new(reverse_name(addr), Rtype::PTR))
            .await?;
        Ok(reply
            .answers
            .iter()
            .filter_map(|record| match &record.data {
                RecordData::Ptr(ptr) => Some(ptr.ptrdname.clone()),
                _ => None,
            })
            .collect())
    }
}

//------------ FlightGuard ---------------------------------------------------

/// Removes a query's in-flight entry exactly once.
///
/// Held by the query that leads an exchange. Settling delivers the
/// result to everyone who joined; dropping the guard unsettled means
/// the leading future was cancelled, and the joined queries are failed
/// so they do not wait on a query nobody runs anymore.
struct FlightGuard {
    /// The resolver owning the in-flight table.
    inner: Arc<InnerResolver>,

    /// The entry's key. `None` once settled.
    question: Option<Question>,
}

impl FlightGuard {
    /// Removes the entry and sends `res` to all joined queries.
    fn settle(&mut self, res: Result<Message, Error>) {
        let question = match self.question.take() {
            Some(question) => question,
            None => return,
        };
        let waiters = self
            .inner
            .inflight
            .lock()
            .remove(&question)
            .unwrap_or_default();
        for waiter in waiters {
            let _ = waiter.send(res.clone());
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.settle(Err(Error::ConnectionClosed));
    }
}

//------------ Helpers -------------------------------------------------------

/// Returns the reverse pointer name for an address.
///
/// IPv4 addresses map under `in-addr.arpa` with the octets reversed,
/// IPv6 addresses under `ip6.arpa` with all 32 nibbles reversed.
pub fn reverse_name(addr: IpAddr) -> Name {
    use std::fmt::Write;

    let mut out = String::new();
    match addr {
        IpAddr::V4(addr) => {
            let octets = addr.octets();
            for octet in octets.iter().rev() {
                write!(out, "{}.", octet)
                    .expect("writing to a string cannot fail");
            }
            out.push_str("in-addr.arpa");
        }
        IpAddr::V6(addr) => {
            for octet in addr.octets().iter().rev() {
                write!(out, "{:x}.{:x}.", octet & 0xF, octet >> 4)
                    .expect("writing to a string cannot fail");
            }
            out.push_str("ip6.arpa");
        }
    }
    out.parse().expect("reverse names are well-formed")
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_name_v4() {
        let name = reverse_name(IpAddr::V4([192, 0, 2, 53].into()));
        assert_eq!(name.to_string(), "53.2.0.192.in-addr.arpa");
    }

    #[test]
    fn reverse_name_v6() {
        let addr: Ipv6Addr = "2001:db8::567:89ab".parse().unwrap();
        let name = reverse_name(IpAddr::V6(addr));
        assert_eq!(
            name.to_string(),
            "b.a.9.8.7.6.5.0.0.0.0.0.0.0.0.0.\
             0.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa",
        );
    }
}
