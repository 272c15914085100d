use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

pub const MAX_DATAGRAM_SIZE: usize = 65_507;

#[derive(Debug)]
pub struct ChannelSocket {
    socket: UdpSocket,
    local_addr: SocketAddr,
    recv_buffer: Box<[u8]>,
}

impl ChannelSocket {
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        Self::from_socket(UdpSocket::bind(addr)?)
    }

    pub fn dial(remote: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(remote)?;
        Self::from_socket(socket)
    }

    fn from_socket(socket: UdpSocket) -> io::Result<Self> {
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            recv_buffer: vec![0u8; MAX_DATAGRAM_SIZE].into_boxed_slice(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn send(&self, payload: &[u8]) -> io::Result<usize> {
        check_size(payload)?;
        self.socket.send(payload)
    }

    pub fn send_to(&self, payload: &[u8], addr: SocketAddr) -> io::Result<usize> {
        check_size(payload)?;
        self.socket.send_to(payload, addr)
    }

    pub fn try_recv(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self.socket.recv(&mut self.recv_buffer) {
            Ok(size) => Ok(Some(self.recv_buffer[..size].to_vec())),
            Err(e) if is_no_data(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn try_recv_from(&mut self) -> io::Result<Option<(Vec<u8>, SocketAddr)>> {
        match self.socket.recv_from(&mut self.recv_buffer) {
            Ok((size, addr)) => Ok(Some((self.recv_buffer[..size].to_vec(), addr))),
            Err(e) if is_no_data(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        let timeout = timeout.max(Duration::from_millis(1));
        self.socket.set_nonblocking(false)?;
        self.socket.set_read_timeout(Some(timeout))?;

        let received = match self.socket.recv(&mut self.recv_buffer) {
            Ok(size) => Ok(Some(self.recv_buffer[..size].to_vec())),
            Err(e) if is_no_data(&e) || e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        };

        self.socket.set_read_timeout(None)?;
        self.socket.set_nonblocking(true)?;
        received
    }
}

// ConnectionRefused/ConnectionReset surface on connected UDP sockets when a
// previous send drew an ICMP unreachable; an absent peer reads the same as
// a silent one.
fn is_no_data(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
    )
}

fn check_size(payload: &[u8]) -> io::Result<()> {
    if payload.len() > MAX_DATAGRAM_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "payload exceeds datagram limit",
        ));
    }
    Ok(())
}
