//! Landmark datagram receiver.
//!
//! Packets are JSON objects:
//!
//! ```json
//! { "hand_detected": true, "landmarks": [[0.41, 0.52, -0.03], ...] }
//! ```
//!
//! with exactly 21 landmarks when a hand is present. The socket is
//! non-blocking; [`LandmarkReceiver::drain`] returns whatever arrived since
//! the previous call, in order, and an empty list when nothing did.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use serde::Deserialize;

use crate::error::TrackingError;
use crate::gesture::{Detection, HandLandmarks};

/// Largest datagram we expect; 21 landmarks fit in well under 2 KiB.
const MAX_PACKET: usize = 8192;

/// Wire form of one detection result.
#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkPacket {
    pub hand_detected: bool,
    #[serde(default)]
    pub landmarks: Vec<[f32; 3]>,
}

impl LandmarkPacket {
    pub fn into_detection(self) -> Result<Detection, TrackingError> {
        if !self.hand_detected {
            return Ok(Detection::none());
        }
        Ok(Detection::with_hand(HandLandmarks::from_triples(
            &self.landmarks,
        )?))
    }
}

/// Parse one datagram into a detection.
pub fn decode_packet(bytes: &[u8]) -> Result<Detection, TrackingError> {
    let packet: LandmarkPacket = serde_json::from_slice(bytes)?;
    packet.into_detection()
}

/// Non-blocking UDP receiver for landmark packets.
pub struct LandmarkReceiver {
    socket: Option<UdpSocket>,
    buf: Vec<u8>,
}

impl LandmarkReceiver {
    /// Bind to `addr` (e.g. `127.0.0.1:39540`) in non-blocking mode.
    pub fn bind(addr: &str) -> Result<Self, TrackingError> {
        let socket = UdpSocket::bind(addr).map_err(|source| TrackingError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|source| TrackingError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        tracing::info!("Landmark receiver listening on {}", addr);

        Ok(Self {
            socket: Some(socket),
            buf: vec![0; MAX_PACKET],
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Take every datagram currently queued on the socket.
    ///
    /// Malformed packets are logged and skipped; only socket failures are
    /// returned as errors.
    pub fn drain(&mut self) -> Result<Vec<Detection>, TrackingError> {
        let socket = match &self.socket {
            Some(s) => s,
            None => return Ok(Vec::new()),
        };

        let mut detections = Vec::new();
        loop {
            match socket.recv(&mut self.buf) {
                Ok(0) => {}
                Ok(size) => match decode_packet(&self.buf[..size]) {
                    Ok(detection) => detections.push(detection),
                    Err(e) => tracing::warn!("Dropping landmark packet: {}", e),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                // Windows reports ICMP port-unreachable from earlier sends here.
                Err(e) if e.kind() == ErrorKind::ConnectionReset => {}
                Err(e) => return Err(TrackingError::Receive(e)),
            }
        }
        Ok(detections)
    }

    /// Release the socket. Further drains return nothing.
    pub fn close(&mut self) {
        if self.socket.take().is_some() {
            tracing::info!("Landmark receiver stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn hand_json() -> String {
        let pts: Vec<[f32; 3]> = (0..21).map(|i| [i as f32 * 0.01, 0.5, 0.0]).collect();
        serde_json::json!({ "hand_detected": true, "landmarks": pts }).to_string()
    }

    #[test]
    fn test_decode_no_hand() {
        let det = decode_packet(br#"{"hand_detected": false}"#).unwrap();
        assert!(det.hand.is_none());
    }

    #[test]
    fn test_decode_hand() {
        let det = decode_packet(hand_json().as_bytes()).unwrap();
        let hand = det.hand.unwrap();
        assert!((hand.pinch_distance() - 0.04).abs() < 1e-5);
    }

    #[test]
    fn test_decode_rejects_partial_hand() {
        let err = decode_packet(br#"{"hand_detected": true, "landmarks": [[0,0,0]]}"#).unwrap_err();
        assert!(matches!(err, TrackingError::Landmarks(1)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_packet(b"not json"),
            Err(TrackingError::Parse(_))
        ));
    }

    #[test]
    fn test_drain_empty_socket_does_not_block() {
        let mut rx = LandmarkReceiver::bind("127.0.0.1:0").unwrap();
        let start = Instant::now();
        assert!(rx.drain().unwrap().is_empty());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_drain_receives_in_order() {
        let mut rx = LandmarkReceiver::bind("127.0.0.1:0").unwrap();
        let addr = rx.local_addr().unwrap();
        let tx = UdpSocket::bind("127.0.0.1:0").unwrap();
        tx.send_to(hand_json().as_bytes(), addr).unwrap();
        tx.send_to(b"garbage", addr).unwrap();
        tx.send_to(br#"{"hand_detected": false}"#, addr).unwrap();

        let mut got = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        while got.len() < 2 && Instant::now() < deadline {
            got.extend(rx.drain().unwrap());
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(got.len(), 2);
        assert!(got[0].hand.is_some());
        assert!(got[1].hand.is_none());
    }

    #[test]
    fn test_close() {
        let mut rx = LandmarkReceiver::bind("127.0.0.1:0").unwrap();
        rx.close();
        assert!(!rx.is_open());
        assert!(rx.drain().unwrap().is_empty());
    }
}
