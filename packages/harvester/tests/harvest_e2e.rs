//! End-to-end harvest tests against a mock archive server.
//!
//! The session speaks blocking HTTP, so each harvest runs inside
//! `spawn_blocking` while wiremock serves scripted SOAP responses.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newswire_harvester::{
    harvest, HarvestOptions, HarvestOutcome, QueryDescriptor, Session, SessionConfig,
};

fn date(s: &str) -> chrono::NaiveDate {
    s.parse().expect("valid date literal")
}

/// A search response with `count` documents and the window total.
fn search_response(total: u64, count: u64, label: &str) -> String {
    let containers: String = (0..count)
        .map(|i| {
            let markup = format!(
                r#"<div class="HEADLINE">{label}-{i}</div><div class="PUB-DATE">January 3, 2017 Tuesday 5:00 PM GMT</div>"#
            );
            format!(
                "<ns1:documentContainer><ns1:documentId>{label}-{i}</ns1:documentId><ns1:document>{}</ns1:document></ns1:documentContainer>",
                BASE64.encode(&markup)
            )
        })
        .collect();
    format!(
        r#"<Envelope xmlns:ns1="urn:results"><ns1:documentsFound>{total}</ns1:documentsFound>{containers}</Envelope>"#
    )
}

fn retrieval_response(text: &str) -> String {
    format!(
        r#"<Envelope xmlns:ns1="urn:retrieve"><ns1:document>{}</ns1:document></Envelope>"#,
        BASE64.encode(text)
    )
}

/// Run a harvest against the mock server on a thread where blocking IO is
/// allowed.
async fn run_harvest(
    server: &MockServer,
    query: QueryDescriptor,
    options: HarvestOptions,
) -> HarvestOutcome {
    let host = server
        .uri()
        .trim_start_matches("http://")
        .to_string();
    tokio::task::spawn_blocking(move || {
        let config = SessionConfig::new(host, "test-project");
        let session =
            Session::with_token(config, "test-token").expect("session construction");
        harvest(&session, query, options).collect_all()
    })
    .await
    .expect("harvest thread")
}

#[tokio::test(flavor = "multi_thread")]
async fn paginated_harvest_collects_every_document() {
    let server = MockServer::start().await;

    for (begin, count) in [(1u64, 10u64), (11, 10), (21, 5)] {
        Mock::given(method("POST"))
            .and(path("/wsapi/v1/services/Search"))
            .and(body_string_contains("test-token"))
            .and(body_string_contains(format!("<begin>{begin}</begin>")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(search_response(25, count, &format!("page{begin}"))),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let query = QueryDescriptor::new("liberal arts", 163_823, date("2017-01-01"), date("2017-01-20"));
    let outcome = run_harvest(&server, query, HarvestOptions::default()).await;

    assert_eq!(outcome.documents.len(), 25);
    assert!(outcome.abandoned.is_empty());
    assert_eq!(outcome.documents[0].headline, "page1-0");
    assert_eq!(
        outcome.documents[0].publication_date,
        "2017-01-03T17:00:00Z"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_shrinks_stride_and_recovers() {
    let server = MockServer::start().await;

    // The first search attempt fails; the retry of the same window succeeds.
    Mock::given(method("POST"))
        .and(path("/wsapi/v1/services/Search"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wsapi/v1/services/Search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_response(3, 3, "w")))
        .expect(1)
        .mount(&server)
        .await;

    let query = QueryDescriptor::new("tuition", 1, date("2017-01-01"), date("2017-01-09"));
    let outcome = run_harvest(&server, query, HarvestOptions::default()).await;

    assert_eq!(outcome.documents.len(), 3);
    assert!(outcome.abandoned.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn full_text_retrieval_populates_documents() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wsapi/v1/services/Search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_response(2, 2, "doc")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wsapi/v1/services/Retrieval"))
        .and(body_string_contains("<documentView>FullText</documentView>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(retrieval_response(
            r#"<div class="BODY">A growing obsession with funding scale.</div>"#,
        )))
        .expect(2)
        .mount(&server)
        .await;

    let query = QueryDescriptor::new("funding", 7, date("2017-01-01"), date("2017-01-05"));
    let options = HarvestOptions {
        include_full_text: true,
        ..HarvestOptions::default()
    };
    let outcome = run_harvest(&server, query, options).await;

    assert_eq!(outcome.documents.len(), 2);
    for document in &outcome.documents {
        let text = document.full_text.as_deref().expect("full text present");
        assert!(text.contains("funding scale"));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_range_yields_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wsapi/v1/services/Search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_response(0, 0, "none")))
        .expect(1)
        .mount(&server)
        .await;

    let query = QueryDescriptor::new("nothing", 7, date("2017-01-01"), date("2017-01-05"));
    let outcome = run_harvest(&server, query, HarvestOptions::default()).await;

    assert!(outcome.documents.is_empty());
    assert!(outcome.abandoned.is_empty());
}
