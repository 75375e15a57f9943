//! Integration tests for playback session issuance (the RequestPlaybackSession
//! boundary): denial reason codes, the no-leak property, and grant contents.

mod common;

use common::TestHarness;

#[tokio::test]
async fn pending_enrollment_denied_with_reason_and_no_url() {
    let (h, addr) = TestHarness::with_server().await;
    let (student, token) = h.create_student("vera", "Vera");
    let course = h.create_course("Rust 101");
    let lecture = h.create_lecture(course.id, "l.mp4", 120);
    h.pending_enrollment(student.id, course.id);
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/lectures/{}/play", lecture.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "enrollment_pending");
    // Deny implies no media reference anywhere in the response.
    assert!(json.get("signed_url").is_none());
    assert!(!json.to_string().contains("token="));
}

#[tokio::test]
async fn missing_enrollment_denied_with_not_enrolled() {
    let (h, addr) = TestHarness::with_server().await;
    let (_student, token) = h.create_student("vera", "Vera");
    let course = h.create_course("Rust 101");
    let lecture = h.create_lecture(course.id, "l.mp4", 120);
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/lectures/{}/play", lecture.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "not_enrolled");
    assert!(json.get("signed_url").is_none());
}

#[tokio::test]
async fn unknown_lecture_denied_with_404() {
    let (h, addr) = TestHarness::with_server().await;
    let (_student, token) = h.create_student("vera", "Vera");
    let client = reqwest::Client::new();

    let resp = client
        .post(format!(
            "http://{addr}/api/lectures/00000000-0000-0000-0000-0000000000cc/play"
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "lecture_not_found");
}

#[tokio::test]
async fn approved_viewer_receives_grant_with_watermark_identity() {
    let (h, addr) = TestHarness::with_server().await;
    let (_student, token, lecture_id) = h.playback_fixture(b"fake video bytes");
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/lectures/{lecture_id}/play"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    let signed_url = json["signed_url"].as_str().unwrap();
    assert!(signed_url.contains(&format!("/api/media/stream/{lecture_id}?token=")));
    assert!(json["watermark_text"].as_str().unwrap().contains("Vera Lane"));
    assert_eq!(json["watermark_course"], "Rust 101");
    assert!(json["expires_at"].is_string());
}

#[tokio::test]
async fn each_play_request_reauthorizes() {
    let (h, addr) = TestHarness::with_server().await;
    let (student, token) = h.create_student("vera", "Vera Lane");
    let course = h.create_course("Rust 101");
    h.write_media_file("l.mp4", b"bytes");
    let lecture = h.create_lecture(course.id, "l.mp4", 120);
    let client = reqwest::Client::new();

    let url = format!("http://{addr}/api/lectures/{}/play", lecture.id);

    // Denied before approval...
    let resp = client.post(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), 403);

    // ...allowed immediately after, with no session cached in between.
    h.approve_enrollment(student.id, course.id);
    let resp = client.post(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn lecture_without_video_is_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    let (student, token) = h.create_student("vera", "Vera");
    let course = h.create_course("Rust 101");
    let lecture = h.create_lecture(course.id, "", 0);
    h.approve_enrollment(student.id, course.id);
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/lectures/{}/play", lecture.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
