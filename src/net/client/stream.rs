//! A DNS transport over a TCP stream.
//!
//! Messages travel with a two octet length prefix, RFC 1035 section
//! 4.2.2. The transport is an actor: [`Connection`] is a cloneable
//! handle over a channel, [`Transport::run`] owns the socket and must be
//! spawned onto a runtime. Connecting happens lazily when the first
//! request arrives; requests sent before then queue on the channel and
//! flush in order once the stream is up.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::base::Message;
use crate::net::client::error::Error;
use crate::utils::config::DefMinMax;

//------------ Configuration Constants ---------------------------------------

/// Configuration limits for the response timeout.
const RESPONSE_TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(19),
    Duration::from_millis(1),
    Duration::from_secs(600),
);

/// Capacity of the channel that transports `ChanReq`s.
const DEF_CHAN_CAP: usize = 8;

/// Number of times to try a random transaction ID before giving up.
const ID_RETRIES: usize = 32;

//------------ Config --------------------------------------------------------

/// Configuration for a stream transport.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for the next response on a busy connection.
    response_timeout: Duration,
}

impl Config {
    /// Creates a new, default config.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the response timeout.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Sets the response timeout.
    ///
    /// This is the maximum time to wait for a response while requests
    /// are outstanding. A zone transfer resets it with every message of
    /// the stream. Excessive values are quietly trimmed.
    pub fn set_response_timeout(&mut self, timeout: Duration) {
        self.response_timeout = RESPONSE_TIMEOUT.limit(timeout);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_timeout: RESPONSE_TIMEOUT.default(),
        }
    }
}

//------------ Connection ----------------------------------------------------

/// A handle onto a stream transport.
#[derive(Debug)]
pub struct Connection {
    /// The sender half of the request channel.
    sender: mpsc::Sender<ChanReq>,
}

impl Connection {
    /// Creates a new stream transport with default configuration.
    ///
    /// Returns a connection handle and a transport whose
    /// [`run`][Transport::run] future drives all the IO. Nothing
    /// connects until the first request arrives.
    pub fn new(server: SocketAddr) -> (Self, Transport) {
        Self::with_config(server, Default::default())
    }

    /// Creates a new stream transport with the given configuration.
    pub fn with_config(
        server: SocketAddr,
        config: Config,
    ) -> (Self, Transport) {
        let (sender, receiver) = mpsc::channel(DEF_CHAN_CAP);
        (Self { sender }, Transport::new(server, config, receiver))
    }

    /// Performs a request expecting a single response.
    ///
    /// The message's ID is assigned by the transport.
    pub async fn request(&self, msg: Message) -> Result<Message, Error> {
        let (sender, receiver) = oneshot::channel();
        let req = ChanReq {
            msg,
            sender: ReplySender::Single(Some(sender)),
        };
        self.sender
            .send(req)
            .await
            .map_err(|_| Error::ConnectionClosed)?;
        receiver.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Starts a request that may produce a stream of responses.
    ///
    /// Every message arriving under the request's ID is delivered on the
    /// returned receiver. This is the transport for a zone transfer; it
    /// is the caller's job to detect the end of the stream and drop the
    /// receiver.
    pub async fn streaming_request(
        &self,
        msg: Message,
    ) -> Result<UnboundedReceiver<Result<Message, Error>>, Error> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let req = ChanReq {
            msg,
            sender: ReplySender::Stream(sender),
        };
        self.sender
            .send(req)
            .await
            .map_err(|_| Error::ConnectionClosed)?;
        Ok(receiver)
    }
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

//------------ ReplySender ---------------------------------------------------

/// A sender used to communicate a received response back to the caller.
#[derive(Debug)]
enum ReplySender {
    /// A single response.
    Single(Option<oneshot::Sender<ChanResp>>),

    /// An unknown number of responses, for zone transfers.
    Stream(UnboundedSender<ChanResp>),
}

impl ReplySender {
    /// Sends a response back to the caller.
    fn send(&mut self, resp: ChanResp) -> Result<(), ()> {
        match self {
            ReplySender::Single(sender) => match sender.take() {
                Some(sender) => sender.send(resp).map_err(|_| ()),
                None => Err(()),
            },
            ReplySender::Stream(sender) => {
                sender.send(resp).map_err(|_| ())
            }
        }
    }

    /// Returns whether this sender expects more than one response.
    fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

/// A message from a [`Connection`] to start a new request.
#[derive(Debug)]
struct ChanReq {
    /// The request message. Its ID is assigned by the transport.
    msg: Message,

    /// Where the response goes.
    sender: ReplySender,
}

/// A response travelling back to the caller.
type ChanResp = Result<Message, Error>;

//------------ Transport -----------------------------------------------------

/// The underlying machinery of a stream transport.
#[derive(Debug)]
pub struct Transport {
    /// The address to connect to.
    server: SocketAddr,

    /// Transport configuration.
    config: Config,

    /// The receiver half of the request channel.
    receiver: mpsc::Receiver<ChanReq>,
}

/// An outstanding request inside the transport.
struct Pending {
    /// The request that waits under this ID.
    req: ChanReq,

    /// The query message as sent, to match the response against.
    sent: Message,
}

impl Transport {
    /// Creates a new transport.
    fn new(
        server: SocketAddr,
        config: Config,
        receiver: mpsc::Receiver<ChanReq>,
    ) -> Self {
        Self {
            server,
            config,
            receiver,
        }
    }

    /// Runs the transport machinery.
    ///
    /// Terminates when the last connection handle is dropped or the
    /// stream fails. Every outstanding request receives the error that
    /// took the connection down.
    pub async fn run(mut self) {
        // Lazy connect: wait for the first request before dialing.
        let first = match self.receiver.recv().await {
            Some(req) => req,
            None => return,
        };
        let stream = match TcpStream::connect(self.server).await {
            Ok(stream) => stream,
            Err(err) => {
                let err = Error::Connect(Arc::new(err));
                let mut first = first;
                let _ = first.sender.send(Err(err.clone()));
                // Anything queued behind the first request fails too.
                while let Ok(mut req) = self.receiver.try_recv() {
                    let _ = req.sender.send(Err(err.clone()));
                }
                return;
            }
        };
        trace!(server = %self.server, "stream connected");

        let (mut read_half, mut write_half) = stream.into_split();
        let mut pending: HashMap<u16, Pending> = HashMap::new();
        let mut queued: Option<ChanReq> = Some(first);
        let mut handles_gone = false;

        // Read buffer with a frame extraction loop over it. A single
        // read may complete several frames.
        let mut buf = BytesMut::with_capacity(u16::MAX as usize);
        let mut deadline = Instant::now() + self.config.response_timeout;

        let err = 'run: loop {
            // Flush one queued request before selecting again.
            if let Some(req) = queued.take() {
                match Self::send_request(
                    req,
                    &mut pending,
                    &mut write_half,
                )
                .await
                {
                    Ok(()) => {
                        deadline =
                            Instant::now() + self.config.response_timeout;
                    }
                    Err(Some(err)) => break 'run err,
                    Err(None) => {}
                }
                continue;
            }

            tokio::select! {
                res = read_half.read_buf(&mut buf) => {
                    match res {
                        Ok(0) => break 'run Error::ConnectionClosed,
                        Ok(_) => {}
                        Err(err) => {
                            break 'run Error::Receive(Arc::new(err));
                        }
                    }
                    // Drain every complete frame in the buffer.
                    while let Some(frame) = Self::take_frame(&mut buf) {
                        match Message::parse(&frame) {
                            Ok(msg) => {
                                Self::demux_reply(msg, &mut pending);
                                deadline = Instant::now()
                                    + self.config.response_timeout;
                            }
                            Err(err) => {
                                break 'run Error::FormatError(err);
                            }
                        }
                    }
                }
                res = self.receiver.recv(), if !handles_gone => {
                    match res {
                        Some(req) => queued = Some(req),
                        None => {
                            // Handles are gone but responses may still
                            // be owed. Keep reading until the last of
                            // them arrives or times out.
                            handles_gone = true;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline),
                    if !pending.is_empty() =>
                {
                    break 'run Error::Timeout;
                }
            }

            if pending.is_empty() && handles_gone {
                break 'run Error::ConnectionClosed;
            }
        };

        for (_, mut item) in pending.drain() {
            let _ = item.req.sender.send(Err(err.clone()));
        }
        let _ = write_half.shutdown().await;
    }

    /// Assigns an ID, registers and writes out one request.
    ///
    /// Returns `Err(Some(_))` when the stream failed and the transport
    /// must shut down, `Err(None)` when only this request failed.
    async fn send_request(
        mut req: ChanReq,
        pending: &mut HashMap<u16, Pending>,
        write_half: &mut tokio::net::tcp::OwnedWriteHalf,
    ) -> Result<(), Option<Error>> {
        let id = match Self::fresh_id(pending) {
            Some(id) => id,
            None => {
                let _ = req.sender.send(Err(Error::TransactionIdSpace));
                return Err(None);
            }
        };
        req.msg.header.id = id;
        let wire = match req.msg.compose(None) {
            Ok(wire) => wire,
            Err(err) => {
                let _ = req.sender.send(Err(err.into()));
                return Err(None);
            }
        };
        let mut framed = Vec::with_capacity(wire.len() + 2);
        framed.extend_from_slice(&(wire.len() as u16).to_be_bytes());
        framed.extend_from_slice(&wire);

        let sent = req.msg.clone();
        pending.insert(id, Pending { req, sent });
        if let Err(err) = write_half.write_all(&framed).await {
            return Err(Some(Error::Send(Arc::new(err))));
        }
        trace!(id, "request written to stream");
        Ok(())
    }

    /// Picks a random ID not currently in use.
    fn fresh_id(pending: &HashMap<u16, Pending>) -> Option<u16> {
        let mut rng = rand::thread_rng();
        (0..ID_RETRIES)
            .map(|_| rng.gen::<u16>())
            .find(|id| !pending.contains_key(id))
    }

    /// Takes one complete length-prefixed frame off the buffer.
    fn take_frame(buf: &mut BytesMut) -> Option<BytesMut> {
        if buf.len() < 2 {
            return None;
        }
        let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        if buf.len() < len + 2 {
            return None;
        }
        let mut frame = buf.split_to(len + 2);
        let _ = frame.split_to(2);
        Some(frame)
    }

    /// Routes a response to the request waiting under its ID.
    ///
    /// A streaming request stays registered and receives every further
    /// message with its ID until its receiver goes away.
    fn demux_reply(msg: Message, pending: &mut HashMap<u16, Pending>) {
        let id = msg.header.id;
        let mut item = match pending.remove(&id) {
            Some(item) => item,
            None => {
                debug!(id, "dropping response for unknown request");
                return;
            }
        };
        let keep = item.req.sender.is_stream();
        // Later messages of a zone transfer may leave the question
        // section empty, so the match check only applies to single
        // responses.
        let resp = if keep || msg.is_answer(&item.sent) {
            Ok(msg)
        } else {
            warn!(id, "response does not match request");
            Err(Error::WrongReplyForQuery)
        };
        if item.req.sender.send(resp).is_ok() && keep {
            pending.insert(id, item);
        }
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::iana::Rtype;
    use crate::base::{Name, Question, Record, Ttl};
    use crate::rdata::rfc1035::A;
    use tokio::net::TcpListener;

    /// Accepts one connection and answers every query with one A record.
    async fn answering_server(listener: TcpListener) {
        let (mut stream, _) = listener.accept().await.unwrap();
        loop {
            let len = match stream.read_u16().await {
                Ok(len) => len as usize,
                Err(_) => return,
            };
            let mut buf = vec![0u8; len];
            stream.read_exact(&mut buf).await.unwrap();
            let query = Message::parse(&buf).unwrap();
            let mut reply = Message {
                header: query.header.answer_to(),
                questions: query.questions.clone(),
                ..Default::default()
            };
            let name: Name = "example.com".parse().unwrap();
            reply.answers.push(Record::new(
                name,
                Ttl::from_secs(300),
                A::new([192, 0, 2, 7].into()).into(),
            ));
            let wire = reply.compose(None).unwrap();
            stream.write_u16(wire.len() as u16).await.unwrap();
            stream.write_all(&wire).await.unwrap();
        }
    }

    #[tokio::test]
    async fn request_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(answering_server(listener));

        let (conn, transport) = Connection::new(addr);
        tokio::spawn(transport.run());

        let msg = Message::query(Question::new(
            "example.com".parse().unwrap(),
            Rtype::A,
        ));
        let reply = conn.request(msg).await.unwrap();
        assert_eq!(reply.answers.len(), 1);
        assert_eq!(reply.answers[0].rtype(), Rtype::A);
    }

    #[tokio::test]
    async fn requests_queue_until_connected() {
        // Bind the listener but do not accept until the requests are
        // already underway.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (conn, transport) = Connection::new(addr);
        tokio::spawn(transport.run());

        let first = conn.clone();
        let second = conn.clone();
        let a = tokio::spawn(async move {
            first
                .request(Message::query(Question::new(
                    "a.example.com".parse().unwrap(),
                    Rtype::A,
                )))
                .await
        });
        let b = tokio::spawn(async move {
            second
                .request(Message::query(Question::new(
                    "b.example.com".parse().unwrap(),
                    Rtype::A,
                )))
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::spawn(answering_server(listener));

        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn connect_failure_fails_request() {
        // A listener that is immediately dropped leaves a port nobody
        // listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (conn, transport) = Connection::new(addr);
        tokio::spawn(transport.run());

        let res = conn
            .request(Message::query(Question::new(
                "example.com".parse().unwrap(),
                Rtype::A,
            )))
            .await;
        assert!(matches!(res, Err(Error::Connect(_))));
    }

    #[test]
    fn frame_extraction_drains_multiple_frames() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0, 2, 0xab, 0xcd, 0, 1, 0xee, 0, 3]);
        assert_eq!(
            Transport::take_frame(&mut buf).as_deref(),
            Some(&[0xab, 0xcd][..])
        );
        assert_eq!(
            Transport::take_frame(&mut buf).as_deref(),
            Some(&[0xee][..])
        );
        // The tail is an incomplete frame.
        assert_eq!(Transport::take_frame(&mut buf), None);
        assert_eq!(&buf[..], &[0, 3]);
    }
}
