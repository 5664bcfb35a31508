//! Integration tests for the remote detection provider against a local HTTP stub.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use selfie_qa_adapters::{RemoteDetectionProvider, RemoteProviderConfig};
use selfie_qa_core::domain::BoundingBox;
use selfie_qa_core::DetectionProvider;
use selfie_qa_test_support::SyntheticFrameBuilder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What the stub saw in the last request.
#[derive(Debug, Default, Clone)]
struct Seen {
    head: String,
    body: Vec<u8>,
}

/// Serves `status` and `body` to every request, recording the request.
async fn serve(status: &'static str, body: &'static str) -> (String, Arc<Mutex<Seen>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Seen::default()));
    let record = Arc::clone(&seen);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let (head, request_body) = loop {
                let n = stream.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    break (String::new(), Vec::new());
                }
                buf.extend_from_slice(&chunk[..n]);
                let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                    continue;
                };
                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                let length = head
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                while buf.len() < end + 4 + length {
                    let n = stream.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                break (head, buf[end + 4..].to_vec());
            };
            *record.lock().unwrap() = Seen {
                head,
                body: request_body,
            };

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{addr}/detect"), seen)
}

fn provider(endpoint: String) -> RemoteDetectionProvider {
    RemoteDetectionProvider::new(RemoteProviderConfig {
        endpoint,
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

const DETECTED: &str = r#"{
  "face_detected": true,
  "confidence": 0.93,
  "bounding_box": {"x": 0.3, "y": 0.25, "width": 0.4, "height": 0.45},
  "landmarks": {
    "left_eye": {"x": 0.42, "y": 0.43},
    "right_eye": {"x": 0.58, "y": 0.43},
    "nose": {"x": 0.5, "y": 0.52},
    "mouth": {"x": 0.5, "y": 0.61}
  },
  "attributes": {
    "eyes_open": true,
    "head_pose": {"yaw": 3.0, "pitch": -2.0, "roll": 1.0},
    "emotion_confidence": 0.8
  },
  "quality_scores": {"brightness": 55.0, "contrast": 40.0, "sharpness": 70.0}
}"#;

#[tokio::test]
async fn test_posts_png_and_parses_answer() {
    let (endpoint, seen) = serve("200 OK", DETECTED).await;
    let frame = SyntheticFrameBuilder::face(64, 64);

    let detection = provider(endpoint).analyze(&frame).await;
    assert!(detection.face_detected);
    assert!((detection.confidence - 0.93).abs() < 1e-6);
    assert!(detection.attributes.eyes_open);
    assert!(detection.quality_scores.is_some());

    let seen = seen.lock().unwrap().clone();
    assert!(seen.head.starts_with("POST /detect"));
    assert!(seen.head.to_ascii_lowercase().contains("content-type: image/png"));
    assert_eq!(&seen.body[..4], b"\x89PNG");
    let decoded = image::load_from_memory(&seen.body).unwrap();
    assert_eq!(decoded.width(), 64);
}

#[tokio::test]
async fn test_answer_is_sanitized() {
    let (endpoint, _) = serve(
        "200 OK",
        r#"{
          "face_detected": false,
          "confidence": 7.5,
          "bounding_box": {"x": 0.1, "y": 0.1, "width": 0.8, "height": 0.8},
          "landmarks": {
            "left_eye": {"x": 0.0, "y": 0.0}, "right_eye": {"x": 0.0, "y": 0.0},
            "nose": {"x": 0.0, "y": 0.0}, "mouth": {"x": 0.0, "y": 0.0}
          }
        }"#,
    )
    .await;

    let detection = provider(endpoint)
        .analyze(&SyntheticFrameBuilder::dark(16, 16))
        .await;
    assert!(!detection.face_detected);
    assert!(detection.confidence <= 1.0);
    assert_eq!(detection.bounding_box, BoundingBox::FALLBACK);
}

#[tokio::test]
async fn test_server_error_maps_to_not_detected() {
    let (endpoint, _) = serve("500 Internal Server Error", r#"{"detail": "boom"}"#).await;
    let detection = provider(endpoint)
        .analyze(&SyntheticFrameBuilder::dark(16, 16))
        .await;
    assert!(!detection.face_detected);
    assert!(detection.confidence.abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_garbage_body_maps_to_not_detected() {
    let (endpoint, _) = serve("200 OK", "not json at all").await;
    let detection = provider(endpoint)
        .analyze(&SyntheticFrameBuilder::dark(16, 16))
        .await;
    assert!(!detection.face_detected);
    assert_eq!(detection.bounding_box, BoundingBox::FALLBACK);
}

#[tokio::test]
async fn test_unreachable_endpoint_maps_to_not_detected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let detection = provider(format!("http://{addr}/detect"))
        .analyze(&SyntheticFrameBuilder::dark(16, 16))
        .await;
    assert!(!detection.face_detected);
}

#[tokio::test]
async fn test_request_surfaces_error_detail() {
    let (endpoint, _) = serve("503 Service Unavailable", "{}").await;
    let err = provider(endpoint)
        .request(&SyntheticFrameBuilder::dark(16, 16))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("503"));
}
