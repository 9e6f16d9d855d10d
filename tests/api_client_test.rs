// ABOUTME: Integration tests for GarminConnect endpoint wrappers
// ABOUTME: Checks URLs, query parameters, request bodies, downloads, and uploads against a mock API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Local, NaiveDate};
use common::authenticated_client;
use garmin_connect::GarminError;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, header_regex, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_activities_pass_paging_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activitylist-service/activities/search/activities"))
        .and(query_param("start", "20"))
        .and(query_param("limit", "10"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "activityId": 1 }, { "activityId": 2 }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "access-1").await;
    let activities = client.get_activities(20, 10).await.unwrap();

    assert_eq!(activities.as_array().unwrap().len(), 2);
    server.verify().await;
}

#[tokio::test]
async fn test_count_activities_requests_lifetime_stats() {
    let server = MockServer::start().await;
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    Mock::given(method("GET"))
        .and(path("/fitnessstats-service/activity"))
        .and(query_param("aggregation", "lifetime"))
        .and(query_param("startDate", "1970-01-01"))
        .and(query_param("endDate", today.as_str()))
        .and(query_param("metric", "duration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "countOfActivities": 12 }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "access-1").await;
    let stats = client.count_activities().await.unwrap();

    assert_eq!(stats[0]["countOfActivities"], 12);
    server.verify().await;
}

#[tokio::test]
async fn test_daily_endpoints_format_dates() {
    let server = MockServer::start().await;
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    Mock::given(method("GET"))
        .and(path(
            "/usersummary-service/stats/steps/daily/2024-03-09/2024-03-09",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "totalSteps": 9000 }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sleep-service/sleep/dailySleepData"))
        .and(query_param("date", "2024-03-09"))
        .and(query_param("nonSleepBufferMinutes", "60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dailySleepDTO": {} })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weight-service/weight/dayview/2024-03-09"))
        .and(query_param("includeAll", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dateWeightList": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyHeartRate"))
        .and(query_param("date", "2024-03-09"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "restingHeartRate": 48 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "access-1").await;
    assert_eq!(client.get_steps(date).await.unwrap()[0]["totalSteps"], 9000);
    client.get_sleep_data(date).await.unwrap();
    client.get_daily_weight(date).await.unwrap();
    assert_eq!(
        client.get_heart_rate(date).await.unwrap()["restingHeartRate"],
        48
    );
    server.verify().await;
}

#[tokio::test]
async fn test_set_body_weight_sends_grams() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/userprofile-service/userprofile/user-settings/"))
        .and(body_partial_json(json!({ "userData": { "weight": 72500.0 } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "access-1").await;
    let response = client.set_body_weight(72.5).await.unwrap();

    assert!(response.is_null());
    assert!(matches!(
        client.set_body_weight(-1.0).await.unwrap_err(),
        GarminError::Config(_)
    ));
    server.verify().await;
}

#[tokio::test]
async fn test_add_hydration_data_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/usersummary-service/usersummary/hydration/log"))
        .and(body_partial_json(json!({
            "calendarDate": "2024-03-09",
            "timestampLocal": "2024-03-09T07:30:00.000",
            "valueInML": 250.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valueInML": 1250.0 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "access-1").await;
    let timestamp = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(7, 30, 0)
        .unwrap();
    client.add_hydration_data(250.0, timestamp).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_workout_create_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/workout-service/workout"))
        .and(body_partial_json(json!({ "workoutName": "Intervals" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "workoutId": 77 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/workout-service/workout/77"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "access-1").await;
    let created = client
        .create_workout(json!({ "workoutName": "Intervals" }))
        .await
        .unwrap();
    assert_eq!(created["workoutId"], 77);
    client.delete_workout("77").await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_golf_scorecard_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gcs-golfcommunity/api/v2/scorecard/detail"))
        .and(query_param("scorecard-ids", "314"))
        .and(query_param("include-longest-shot-distance", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "scorecardDetails": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "access-1").await;
    client.get_golf_scorecard(314).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_download_uses_content_disposition_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download-service/files/activity/123"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", r#"attachment; filename="123_ACTIVITY.zip""#)
                .set_body_bytes(b"PK\x03\x04zip".to_vec()),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let client = authenticated_client(&server, "access-1").await;
    let written = client
        .download_original_activity_data(123, temp.path())
        .await
        .unwrap();

    assert_eq!(written, temp.path().join("123_ACTIVITY.zip"));
    assert_eq!(std::fs::read(&written).unwrap(), b"PK\x03\x04zip");
}

#[tokio::test]
async fn test_export_download_falls_back_to_activity_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download-service/export/gpx/activity/123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<gpx></gpx>"))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let client = authenticated_client(&server, "access-1").await;
    let written = client
        .download_activity(123, "GPX", temp.path())
        .await
        .unwrap();

    assert_eq!(written, temp.path().join("123.gpx"));
    assert!(matches!(
        client
            .download_activity(123, "fit", temp.path())
            .await
            .unwrap_err(),
        GarminError::Config(_)
    ));
}

#[tokio::test]
async fn test_upload_sends_multipart_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-service/upload/.fit"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains(r#"name="userfile""#))
        .and(body_string_contains(r#"filename="morning_run.fit""#))
        .and(body_string_contains("fit-bytes"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(json!({ "detailedImportResult": { "uploadId": 9 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let file = temp.path().join("morning_run.fit");
    std::fs::write(&file, "fit-bytes").unwrap();

    let client = authenticated_client(&server, "access-1").await;
    let result = client.upload_activity(&file).await.unwrap();

    assert_eq!(result["detailedImportResult"]["uploadId"], 9);
    server.verify().await;
}

#[tokio::test]
async fn test_upload_rejects_unknown_extension() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("notes.txt");
    std::fs::write(&file, "hello").unwrap();

    let client = authenticated_client(&server, "access-1").await;
    let error = client.upload_activity(&file).await.unwrap_err();

    assert!(matches!(error, GarminError::Config(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_text_responses_pass_through_as_strings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/custom/endpoint"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "access-1").await;
    let value = client
        .get(&format!("{}/custom/endpoint", server.uri()), &[])
        .await
        .unwrap();
    assert_eq!(value, json!("plain text"));
}
