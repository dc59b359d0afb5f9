mod common;

use axum::http::StatusCode;
use common::*;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_add_glasses_saves_image_and_returns_links() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    let glasses = write_glasses(dir.path());
    let output_dir = dir.path().join("output");

    let photo = server
        .mock_async(|when, then| {
            when.method(GET).path("/team.jpg");
            then.status(200)
                .header("content-type", "image/jpeg")
                .body(JPEG_BYTES);
        })
        .await;
    let model = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(generate_path())
                .header("x-goog-api-key", TEST_API_KEY)
                .body_contains("ALL FACES in the first image")
                .body_contains(r#""responseModalities":["IMAGE"]"#)
                .body_contains(encode(JPEG_BYTES))
                .body_contains(encode(PNG_BYTES));
            then.status(200)
                .header("content-type", "application/json")
                .body(image_response(PNG_BYTES));
        })
        .await;

    let app = build_test_app(test_config(&server.base_url(), &glasses, &output_dir));
    let response = post_json(
        app.clone(),
        "/add-glasses",
        json!({ "image_url": server.url("/team.jpg") }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Glasses added successfully!");

    photo.assert_async().await;
    model.assert_async().await;

    let files = files_in(&output_dir);
    assert_eq!(files.len(), 1);
    let file_name = &files[0];
    assert!(file_name.starts_with("with_glasses_"));
    assert!(file_name.ends_with("_0.png"));

    assert_eq!(
        body["image_url"],
        format!("https://glasses.example.com/output/{}", file_name)
    );
    assert_eq!(
        body["local_path"],
        output_dir.join(file_name).display().to_string()
    );

    let saved = std::fs::read(output_dir.join(file_name)).unwrap();
    assert_eq!(saved, PNG_BYTES);

    // the artifact is published under /output
    let served = get(app, &format!("/output/{}", file_name)).await;
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(body_bytes(served).await, PNG_BYTES);
}

#[tokio::test]
async fn test_unreachable_image_reports_download_failure() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    let glasses = write_glasses(dir.path());
    let output_dir = dir.path().join("output");

    let model = server
        .mock_async(|when, then| {
            when.method(POST).path(generate_path());
            then.status(200).body(image_response(PNG_BYTES));
        })
        .await;

    let app = build_test_app(test_config(&server.base_url(), &glasses, &output_dir));
    let response = post_json(
        app,
        "/add-glasses",
        json!({ "image_url": "http://127.0.0.1:1/photo.jpg" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to download image: "));
    assert!(body["image_url"].is_null());
    assert!(body["local_path"].is_null());

    assert_eq!(model.hits_async().await, 0);
    assert!(files_in(&output_dir).is_empty());
}

#[tokio::test]
async fn test_image_host_error_status_is_download_failure() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    let glasses = write_glasses(dir.path());

    server
        .mock_async(|when, then| {
            when.method(GET).path("/gone.jpg");
            then.status(404);
        })
        .await;

    let app = build_test_app(test_config(
        &server.base_url(),
        &glasses,
        &dir.path().join("output"),
    ));
    let body = body_json(
        post_json(
            app,
            "/add-glasses",
            json!({ "image_url": server.url("/gone.jpg") }),
        )
        .await,
    )
    .await;

    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to download image: "));
}

#[tokio::test]
async fn test_missing_glasses_fails_before_any_request() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-glasses.png");

    let photo = server
        .mock_async(|when, then| {
            when.method(GET).path("/team.jpg");
            then.status(200).body(JPEG_BYTES);
        })
        .await;
    let model = server
        .mock_async(|when, then| {
            when.method(POST).path(generate_path());
            then.status(200).body(image_response(PNG_BYTES));
        })
        .await;

    let app = build_test_app(test_config(
        &server.base_url(),
        &missing,
        &dir.path().join("output"),
    ));
    let body = body_json(
        post_json(
            app,
            "/add-glasses",
            json!({ "image_url": server.url("/team.jpg") }),
        )
        .await,
    )
    .await;

    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Error processing image: "));
    assert_eq!(photo.hits_async().await, 0);
    assert_eq!(model.hits_async().await, 0);
}

#[tokio::test]
async fn test_text_only_model_reply_is_processing_error() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    let glasses = write_glasses(dir.path());
    let output_dir = dir.path().join("output");

    server
        .mock_async(|when, then| {
            when.method(GET).path("/team.jpg");
            then.status(200)
                .header("content-type", "image/jpeg")
                .body(JPEG_BYTES);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(generate_path());
            then.status(200)
                .body(text_response("I cannot find a face in this photo."));
        })
        .await;

    let app = build_test_app(test_config(&server.base_url(), &glasses, &output_dir));
    let body = body_json(
        post_json(
            app,
            "/add-glasses",
            json!({ "image_url": server.url("/team.jpg") }),
        )
        .await,
    )
    .await;

    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Error processing image: No image was generated"
    );
    assert!(files_in(&output_dir).is_empty());
}

#[tokio::test]
async fn test_rejected_api_key_is_processing_error() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    let glasses = write_glasses(dir.path());

    server
        .mock_async(|when, then| {
            when.method(GET).path("/team.jpg");
            then.status(200).body(JPEG_BYTES);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(generate_path());
            then.status(400).body(
                r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
            );
        })
        .await;

    let app = build_test_app(test_config(
        &server.base_url(),
        &glasses,
        &dir.path().join("output"),
    ));
    let body = body_json(
        post_json(
            app,
            "/add-glasses",
            json!({ "image_url": server.url("/team.jpg") }),
        )
        .await,
    )
    .await;

    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Error processing image: "));
    assert!(message.contains("API key not valid"));
}

#[tokio::test]
async fn test_requests_in_same_second_get_distinct_files() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    let glasses = write_glasses(dir.path());
    let output_dir = dir.path().join("output");

    server
        .mock_async(|when, then| {
            when.method(GET).path("/team.jpg");
            then.status(200).body(JPEG_BYTES);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(generate_path());
            then.status(200).body(image_response(PNG_BYTES));
        })
        .await;

    let app = build_test_app(test_config(&server.base_url(), &glasses, &output_dir));
    let payload = json!({ "image_url": server.url("/team.jpg") });

    let (first, second) = tokio::join!(
        post_json(app.clone(), "/add-glasses", payload.clone()),
        post_json(app, "/add-glasses", payload),
    );
    let first = body_json(first).await;
    let second = body_json(second).await;

    assert_eq!(first["success"], true);
    assert_eq!(second["success"], true);
    assert_ne!(first["image_url"], second["image_url"]);
    assert_eq!(files_in(&output_dir).len(), 2);
}

#[tokio::test]
async fn test_invalid_image_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let glasses = write_glasses(dir.path());
    let app = build_test_app(test_config(
        "http://127.0.0.1:1",
        &glasses,
        &dir.path().join("output"),
    ));

    for bad in ["not a url", "ftp://example.com/photo.jpg", ""] {
        let response = post_json(app.clone(), "/add-glasses", json!({ "image_url": bad })).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", bad);

        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].is_string());
    }

    let response = post_json(app, "/add-glasses", json!({ "url": "https://example.com" })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_health_and_info() {
    let dir = TempDir::new().unwrap();
    // the glasses file is deliberately absent: health does not depend on it
    let app = build_test_app(test_config(
        "http://127.0.0.1:1",
        &dir.path().join("glasses.png"),
        &dir.path().join("output"),
    ));

    let response = get(app.clone(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "status": "healthy", "service": "glasses-overlay-api" })
    );

    let response = get(app.clone(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let info = body_json(response).await;
    assert_eq!(info["name"], "Glasses Overlay API");
    assert!(info["endpoints"]["POST /add-glasses"].is_string());

    let response = get(app, "/output/missing.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
