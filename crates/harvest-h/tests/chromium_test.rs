use harvest_engine::{LaunchOptions, Launcher, PageExtractor, PageSession};
use harvest_h::{ChromiumLauncher, YelpExtractor};
use serial_test::serial;

fn data_url(body: &str) -> String {
    format!("data:text/html,<html><body>{}</body></html>", body)
}

#[tokio::test]
#[ignore = "needs a local Chromium"]
#[serial]
async fn extracts_listing_signals_from_a_live_page() {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .ok();

    let session = match ChromiumLauncher.launch(&LaunchOptions::default()).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to launch browser (is Chromium installed?): {}", e);
            return;
        }
    };
    let extractor = YelpExtractor::default();

    let listing = data_url(
        r#"<div aria-label="Pagination navigation"><div>prev</div><div><span>3 of 12</span></div></div>
<section aria-label="Recommended Reviews"><h2>Reviews</h2><div><ul>
<li><div class="user-passport-info"><span><a href="/user_details?userid=abc">Ann</a></span></div>
<p class="comment"><span>Lovely</span></p></li>
</ul></div></section>"#,
    );
    session.goto(&listing).await.expect("navigation failed");

    assert!(!extractor.is_blocked(&session).await.unwrap());
    assert!(!extractor.is_removed(&session).await.unwrap());
    let counter = extractor.page_counter(&session).await.unwrap().unwrap();
    assert_eq!((counter.current, counter.total), (3, 12));

    let reviews = extractor.review_items(&session).await.unwrap().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].user_name.as_deref(), Some("Ann"));
    assert_eq!(reviews[0].user_id.as_deref(), Some("abc"));
    assert_eq!(reviews[0].comment.as_deref(), Some("Lovely"));

    session
        .goto(&data_url("<h2>Hey there! Before you continue...</h2>"))
        .await
        .expect("navigation failed");
    assert!(extractor.is_blocked(&session).await.unwrap());
    assert!(extractor.review_items(&session).await.unwrap().is_none());

    let webdriver: bool = session
        .page()
        .evaluate("navigator.webdriver")
        .await
        .unwrap()
        .into_value()
        .unwrap();
    assert!(!webdriver);

    session.close().await.unwrap();
    assert!(session.goto("about:blank").await.is_err());
}
