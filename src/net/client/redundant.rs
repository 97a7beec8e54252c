//! Retrying requests over a list of redundant servers.
//!
//! A [`Connection`] holds an ordered list of upstream servers and a
//! rotation index. Every request goes to the server at the index and is
//! retried there over an escalating timeout schedule; only when the full
//! schedule runs out does the index advance to the next server, so a
//! working server keeps serving and a dead one is skipped by everyone
//! after the first caller paid the price of discovery.
//!
//! All attempts of one request go out under the same transaction ID, so
//! a slow reply to an earlier attempt still completes the request.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Duration;
use tracing::{debug, trace};

use crate::base::Message;
use crate::net::client::dgram;
use crate::net::client::error::Error;

//------------ Configuration Constants ---------------------------------------

/// The default per-attempt timeout schedule in seconds.
pub const DEF_SCHEDULE: [u64; 4] = [1, 3, 11, 45];

//------------ Config --------------------------------------------------------

/// User configuration variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Per-attempt timeouts. One attempt is made per entry.
    schedule: Vec<Duration>,
}

impl Config {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the per-attempt timeout schedule.
    pub fn schedule(&self) -> &[Duration] {
        &self.schedule
    }

    /// Sets the per-attempt timeout schedule.
    ///
    /// An empty schedule is replaced by the default.
    pub fn set_schedule(&mut self, schedule: Vec<Duration>) {
        if !schedule.is_empty() {
            self.schedule = schedule;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: DEF_SCHEDULE
                .iter()
                .map(|secs| Duration::from_secs(*secs))
                .collect(),
        }
    }
}

//------------ Connection ----------------------------------------------------

/// A retrying request pipeline over a list of servers.
#[derive(Clone, Debug)]
pub struct Connection {
    /// The datagram transport all requests go out on.
    dgram: dgram::Connection,

    /// Configuration for the pipeline.
    config: Config,

    /// The server list and rotation index.
    servers: Arc<Mutex<Servers>>,
}

/// The mutable server list state.
#[derive(Debug)]
struct Servers {
    /// Known upstream servers in rotation order.
    list: Vec<SocketAddr>,

    /// Index of the server currently in use.
    index: usize,
}

impl Connection {
    /// Creates a new pipeline over the given transport and servers.
    pub fn new(
        dgram: dgram::Connection,
        servers: Vec<SocketAddr>,
        config: Config,
    ) -> Self {
        Self {
            dgram,
            config,
            servers: Arc::new(Mutex::new(Servers {
                list: servers,
                index: 0,
            })),
        }
    }

    /// Adds a server to the end of the rotation.
    pub fn add_server(&self, server: SocketAddr) {
        let mut servers = self.servers.lock();
        if !servers.list.contains(&server) {
            servers.list.push(server);
        }
    }

    /// Returns the server the next request will go to.
    pub fn current_server(&self) -> Option<SocketAddr> {
        let servers = self.servers.lock();
        servers.list.get(servers.index).copied()
    }

    /// Performs a request, retrying over the timeout schedule.
    ///
    /// On success returns the response together with the server that
    /// produced it, so the caller can retarget a truncated exchange to
    /// the same server over a stream transport. When the whole schedule
    /// times out, the rotation advances and the request fails with
    /// [`Error::Timeout`].
    pub async fn request(
        &self,
        mut msg: Message,
    ) -> Result<(Message, SocketAddr), Error> {
        let server = match self.current_server() {
            Some(server) => server,
            None => return Err(Error::ConnectionClosed),
        };
        let id = self.dgram.allocate_id()?;
        msg.header.id = id;

        let res = self.request_attempts(server, &msg).await;
        self.dgram.release_id(id);
        match res {
            Ok(reply) => Ok((reply, server)),
            Err(Error::Timeout) => {
                debug!(%server, "server timed out, rotating");
                self.advance(server);
                Err(Error::Timeout)
            }
            Err(err) => Err(err),
        }
    }

    /// Runs the attempts of one request against one server.
    async fn request_attempts(
        &self,
        server: SocketAddr,
        msg: &Message,
    ) -> Result<Message, Error> {
        for (attempt, wait) in self.config.schedule.iter().enumerate() {
            trace!(%server, attempt, "request attempt");
            match self.dgram.exchange(server, msg, *wait).await {
                Err(Error::Timeout) => continue,
                res => return res,
            }
        }
        Err(Error::Timeout)
    }

    /// Advances the rotation past a failed server.
    ///
    /// Another request may have advanced it already; only move on if
    /// the failed server is still the current one.
    fn advance(&self, failed: SocketAddr) {
        let mut servers = self.servers.lock();
        if servers.list.get(servers.index) == Some(&failed)
            && !servers.list.is_empty()
        {
            servers.index = (servers.index + 1) % servers.list.len();
        }
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::iana::Rtype;
    use crate::base::Question;
    use tokio::net::UdpSocket;

    fn short_config() -> Config {
        let mut config = Config::new();
        config.set_schedule(vec![
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(30),
            Duration::from_millis(40),
        ]);
        config
    }

    async fn bind_client() -> dgram::Connection {
        let mut config = dgram::Config::new();
        config.set_bind_addr(SocketAddr::from(([127, 0, 0, 1], 0)));
        let (conn, transport) = dgram::Connection::bind(config).await.unwrap();
        tokio::spawn(transport.run());
        conn
    }

    #[tokio::test]
    async fn schedule_exhaustion_rotates() {
        // Two black holes; queries are counted at the first one.
        let hole = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let hole_addr = hole.local_addr().unwrap();
        let other = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let other_addr = other.local_addr().unwrap();

        let conn = Connection::new(
            bind_client().await,
            vec![hole_addr, other_addr],
            short_config(),
        );

        let msg = Message::query(Question::new(
            "example.com".parse().unwrap(),
            Rtype::A,
        ));
        let res = conn.request(msg).await;
        assert!(matches!(res, Err(Error::Timeout)));

        // One datagram per schedule entry, all with the same ID.
        let mut buf = [0u8; 512];
        let mut ids = Vec::new();
        for _ in 0..4 {
            let (len, _) = hole.recv_from(&mut buf).await.unwrap();
            ids.push(Message::parse(&buf[..len]).unwrap().header.id);
        }
        assert!(ids.windows(2).all(|w| w[0] == w[1]));

        // Nothing arrived at the second server, but it is next in line.
        assert_eq!(conn.current_server(), Some(other_addr));
    }

    #[tokio::test]
    async fn default_schedule() {
        let config = Config::new();
        let secs: Vec<u64> =
            config.schedule().iter().map(|d| d.as_secs()).collect();
        assert_eq!(secs, [1, 3, 11, 45]);
    }

    #[tokio::test]
    async fn slow_server_answers_on_retry() {
        // A server that ignores the first datagram and answers the
        // second, inside the second attempt's window.
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let _ = server.recv_from(&mut buf).await.unwrap();
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            let query = Message::parse(&buf[..len]).unwrap();
            let reply = Message {
                header: query.header.answer_to(),
                questions: query.questions.clone(),
                ..Default::default()
            };
            let wire = reply.compose(None).unwrap();
            server.send_to(&wire, peer).await.unwrap();
        });

        let conn = Connection::new(
            bind_client().await,
            vec![server_addr],
            short_config(),
        );
        let msg = Message::query(Question::new(
            "example.com".parse().unwrap(),
            Rtype::A,
        ));
        let (reply, from) = conn.request(msg).await.unwrap();
        assert_eq!(from, server_addr);
        assert!(reply.header.qr);
        // The failed attempts did not advance the rotation.
        assert_eq!(conn.current_server(), Some(server_addr));
    }
}
