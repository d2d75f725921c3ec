//! Gesture signal behaviour over detection sequences.

use pinchfield::gesture::{
    Detection, GestureConfig, GestureSignal, HandLandmarks, Landmark, PinchSemantic, INDEX_TIP,
    LANDMARK_COUNT, THUMB_TIP,
};
use pinchfield::tracking::decode_packet;

fn pinch(distance: f32) -> Detection {
    let mut points = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
    points[THUMB_TIP] = Landmark::new(0.2, 0.4, 0.0);
    points[INDEX_TIP] = Landmark::new(0.2, 0.4 + distance, 0.0);
    Detection::with_hand(HandLandmarks::new(points))
}

#[test]
fn test_progress_stays_in_unit_interval() {
    for semantic in [PinchSemantic::Opens, PinchSemantic::Closes] {
        let mut signal = GestureSignal::new(GestureConfig {
            semantic,
            ..GestureConfig::default()
        });
        let mut d = 0.0f32;
        for i in 0..2_000 {
            // Sweep well past both ends of the input range, with dropouts.
            d = (d + 0.013) % 1.5;
            if i % 17 == 0 {
                signal.on_detection(&Detection::none());
            } else {
                signal.on_detection(&pinch(d));
            }
            assert!((0.0..=1.0).contains(&signal.progress()));
            assert!((0.0..=1.0).contains(&signal.target()));
        }
    }
}

#[test]
fn test_fifty_frames_without_hand_decay_target() {
    let mut signal = GestureSignal::new(GestureConfig::default());
    signal.set_target(1.0);
    for _ in 0..50 {
        signal.on_detection(&Detection::none());
    }
    assert!(signal.target() < 0.95f32.powi(50) + 1e-5);
}

#[test]
fn test_lost_hand_does_not_freeze_progress() {
    let mut signal = GestureSignal::new(GestureConfig::default());
    for _ in 0..300 {
        signal.on_detection(&pinch(0.3));
    }
    let held = signal.progress();
    for _ in 0..300 {
        signal.on_detection(&Detection::none());
    }
    assert!(signal.progress() < held * 0.1);
}

#[test]
fn test_semantics_are_mirrored() {
    let mut opens = GestureSignal::new(GestureConfig::default());
    let mut closes = GestureSignal::new(GestureConfig {
        semantic: PinchSemantic::Closes,
        ..GestureConfig::default()
    });
    let wide = pinch(0.25);
    opens.on_detection(&wide);
    closes.on_detection(&wide);
    assert_eq!(opens.target(), 1.0);
    assert_eq!(closes.target(), 0.0);
}

#[test]
fn test_decoded_packets_drive_signal() {
    let mut triples = vec![[0.5f32, 0.5, 0.0]; LANDMARK_COUNT];
    triples[THUMB_TIP] = [0.3, 0.5, 0.0];
    triples[INDEX_TIP] = [0.6, 0.5, 0.0];
    let json = serde_json::json!({ "hand_detected": true, "landmarks": triples }).to_string();

    let detection = decode_packet(json.as_bytes()).unwrap();
    let mut signal = GestureSignal::new(GestureConfig::default());
    signal.on_detection(&detection);
    assert!(signal.hand_present());
    assert_eq!(signal.target(), 1.0);
}

#[test]
fn test_short_landmark_packet_is_rejected() {
    let json = r#"{"hand_detected": true, "landmarks": [[0.1, 0.2, 0.0]]}"#;
    assert!(decode_packet(json.as_bytes()).is_err());
}
