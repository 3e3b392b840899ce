use std::sync::Arc;

use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

use super::types::{ApiError, ScreenshotEntry};
use crate::error_handling::types::{IngestError, StorageError};
use crate::ingestion::payload::{CaptureAck, CaptureRequest};
use crate::ingestion::IngestionHandler;
use crate::storage::FileStorage;

/// GET /
pub fn dashboard_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).and_then(|| async move {
        let html = r#"<html><head><title>Lucarne</title></head>
                <body><h1>Lucarne collector is running</h1>
                <p>See /screenshots for the catalog; POST /screenshot to submit.</p></body></html>"#;
        Ok::<_, Rejection>(reply::html(html))
    })
}

/// POST /screenshot
///
/// One-shot ingestion. Shares the handler with the persistent channel; only
/// the result translation (HTTP status + JSON body) lives here.
pub fn upload_screenshot_route(
    handler: Arc<IngestionHandler>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("screenshot")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and_then(move |request: CaptureRequest| {
            let handler = handler.clone();
            async move {
                let res = match handler.ingest(request) {
                    Ok(artifact) => reply::with_status(
                        reply::json(&CaptureAck::success(artifact.filename)),
                        StatusCode::OK,
                    ),
                    Err(e @ IngestError::BadPayload(_)) => reply::with_status(
                        reply::json(&CaptureAck::error(e.to_string())),
                        StatusCode::BAD_REQUEST,
                    ),
                    Err(e @ IngestError::StorageFailure(_)) => reply::with_status(
                        reply::json(&CaptureAck::error(e.to_string())),
                        StatusCode::INTERNAL_SERVER_ERROR,
                    ),
                };
                Ok::<_, Rejection>(res)
            }
        })
}

/// GET /screenshots
pub fn list_screenshots_route(
    storage: Arc<FileStorage>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("screenshots")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let storage = storage.clone();
            async move {
                match storage.list_artifacts() {
                    Ok(artifacts) => {
                        let listing: Vec<ScreenshotEntry> = artifacts
                            .iter()
                            .map(|a| ScreenshotEntry {
                                url: format!("/screenshots/{}", a.filename),
                                timestamp: a.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                            })
                            .collect();
                        Ok::<_, Rejection>(reply::with_status(
                            reply::json(&listing),
                            StatusCode::OK,
                        ))
                    }
                    Err(_) => Ok::<_, Rejection>(reply::with_status(
                        reply::json(&ApiError {
                            message: "Failed to list screenshots".to_string(),
                        }),
                        StatusCode::INTERNAL_SERVER_ERROR,
                    )),
                }
            }
        })
}

/// GET /screenshots/:filename
pub fn serve_screenshot_route(
    storage: Arc<FileStorage>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("screenshots" / String)
        .and(warp::get())
        .and_then(move |filename: String| {
            let storage = storage.clone();
            async move {
                match storage.read_artifact(&filename) {
                    Ok(bytes) => {
                        let content_type = mime_guess::from_path(&filename)
                            .first_or_octet_stream()
                            .to_string();
                        let res = reply::with_status(
                            reply::with_header(bytes, "Content-Type", content_type),
                            StatusCode::OK,
                        )
                        .into_response();
                        Ok::<_, Rejection>(res)
                    }
                    Err(StorageError::InvalidFilename(_)) | Err(StorageError::NotFound(_)) => {
                        let res = reply::with_status(
                            reply::json(&ApiError {
                                message: "Screenshot not found".to_string(),
                            }),
                            StatusCode::NOT_FOUND,
                        )
                        .into_response();
                        Ok::<_, Rejection>(res)
                    }
                    Err(_) => {
                        let res = reply::with_status(
                            reply::json(&ApiError {
                                message: "Failed to read screenshot".to_string(),
                            }),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        )
                        .into_response();
                        Ok::<_, Rejection>(res)
                    }
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::EventBroadcaster;
    use crate::ingestion::payload::encode_image;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<FileStorage>, Arc<IngestionHandler>) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        let handler = Arc::new(IngestionHandler::new(
            Arc::clone(&storage),
            EventBroadcaster::new(16),
        ));
        (dir, storage, handler)
    }

    #[tokio::test]
    async fn test_upload_success_returns_filename() {
        let (_dir, storage, handler) = setup();
        let route = upload_screenshot_route(handler);

        let body = json!({
            "image": encode_image(b"uploaded"),
            "device_info": {"type": "Android"},
            "timestamp": "2024-01-01T12:00:00Z",
        });
        let resp = warp::test::request()
            .method("POST")
            .path("/screenshot")
            .json(&body)
            .reply(&route)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let ack: CaptureAck = serde_json::from_slice(resp.body()).unwrap();
        assert!(ack.is_success());
        assert_eq!(
            ack.filename.as_deref(),
            Some("screenshot_Android_20240101_120000.png")
        );
        assert_eq!(storage.list_artifacts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_bad_payload_is_non_2xx() {
        let (_dir, storage, handler) = setup();
        let route = upload_screenshot_route(handler);

        let body = json!({
            "image": "bare-base64-without-delimiter",
            "device_info": {"platform": "iOS"},
        });
        let resp = warp::test::request()
            .method("POST")
            .path("/screenshot")
            .json(&body)
            .reply(&route)
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let ack: CaptureAck = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(ack.status, "error");
        assert!(storage.list_artifacts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_with_urls() {
        let (_dir, storage, _handler) = setup();
        let route = list_screenshots_route(Arc::clone(&storage));

        storage
            .store_artifact(
                "Android",
                Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
                b"one",
            )
            .unwrap();
        storage
            .store_artifact(
                "Android",
                Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
                b"two",
            )
            .unwrap();

        let resp = warp::test::request()
            .method("GET")
            .path("/screenshots")
            .reply(&route)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let listing: Vec<serde_json::Value> = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(listing.len(), 2);
        for entry in &listing {
            let url = entry["url"].as_str().unwrap();
            assert!(url.starts_with("/screenshots/screenshot_Android_"));
            assert!(entry["timestamp"].as_str().is_some());
        }
        // Same creation second resolves deterministically: suffixed name first.
        assert!(listing[0]["url"].as_str().unwrap() > listing[1]["url"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_serve_returns_bytes_with_content_type() {
        let (_dir, storage, _handler) = setup();
        let route = serve_screenshot_route(Arc::clone(&storage));

        let artifact = storage
            .store_artifact(
                "iOS",
                Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
                b"raw-png",
            )
            .unwrap();

        let resp = warp::test::request()
            .method("GET")
            .path(&format!("/screenshots/{}", artifact.filename))
            .reply(&route)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()["content-type"].to_str().unwrap(),
            "image/png"
        );
        assert_eq!(resp.body().as_ref(), b"raw-png");
    }

    #[tokio::test]
    async fn test_serve_rejects_traversal_and_unknown_names() {
        let (_dir, storage, _handler) = setup();
        let route = serve_screenshot_route(storage);

        for path in [
            "/screenshots/.hidden.png",
            "/screenshots/..png",
            "/screenshots/screenshot_iOS_20240101_120000.png",
        ] {
            let resp = warp::test::request().method("GET").path(path).reply(&route).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "path: {}", path);
        }
    }
}
