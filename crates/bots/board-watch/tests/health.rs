use std::net::SocketAddr;
use std::time::Duration;

use board_watch::health::{ALIVE, HealthServer};
use board_watch::status::{StatusReport, StatusSource};
use board_watch::watermark::Watermark;
use url::Url;

async fn start(watermark: &Watermark, destination: Option<&str>) -> String {
    let status = StatusSource {
        target_url: Url::parse("https://cafe.example.com/board").unwrap(),
        destination: destination.map(str::to_string),
        poll_interval: Duration::from_secs(60),
        watermark: watermark.reader(),
    };

    let server = HealthServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), status)
        .await
        .expect("bind should succeed");
    let base_url = format!("http://{}", server.addr().unwrap());
    tokio::spawn(server.run());
    base_url
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn liveness_route_answers() {
    let watermark = Watermark::new();
    let base_url = start(&watermark, None).await;

    let resp = reqwest::get(format!("{base_url}/")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), ALIVE);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn status_route_reports_watermark() {
    let watermark = Watermark::new();
    let base_url = start(&watermark, Some("123")).await;

    let report: StatusReport = reqwest::get(format!("{base_url}/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report.last_link, None);
    assert_eq!(report.destination.as_deref(), Some("123"));
    assert_eq!(report.poll_interval_secs, 60);
    assert_eq!(report.target_url, "https://cafe.example.com/board");

    watermark.set(Url::parse("https://site/x/2").unwrap());

    let report: StatusReport = reqwest::get(format!("{base_url}/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report.last_link.as_deref(), Some("https://site/x/2"));
}
