use harvest_engine::aggregate::{Aggregator, output_file_name};
use harvest_engine::model::{RawReview, Record};
use harvest_engine::selection::{SelectionMode, SelectionSet};
use harvest_engine::sink::{LocalSink, export};
use harvest_engine::{ObjectKind, RunState};

fn review(user: &str, comment: &str) -> harvest_engine::model::ReviewRow {
    let mut row = RawReview {
        user_name: Some(user.to_string()),
        comment: Some(comment.to_string()),
        rating: Some(4),
        ..Default::default()
    }
    .fill();
    row.yelpid = "cafe".to_string();
    row
}

fn sample() -> Aggregator {
    let mut aggregator = Aggregator::new();
    aggregator.insert(
        4,
        Record::Reviews(vec![
            review("Ann", "Great, \"really\" great"),
            review("Bob", "multi\nline"),
        ]),
    );
    aggregator.insert(1, Record::Reviews(vec![review("Cy", "")]));
    aggregator
}

#[test]
fn rendering_twice_is_byte_identical() {
    let aggregator = sample();
    let first = aggregator.table(ObjectKind::Review).unwrap().to_csv().unwrap();
    let second = aggregator.table(ObjectKind::Review).unwrap().to_csv().unwrap();
    assert_eq!(first, second);

    let mut reader = csv::Reader::from_reader(first.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 29);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][2], "Cy");
    assert_eq!(&rows[1][15], "Great, \"really\" great");
    assert_eq!(&rows[2][15], "multi\nline");
}

#[test]
fn file_names_encode_selection() {
    let state = RunState {
        success: 3,
        failure: 0,
        ..Default::default()
    };
    let explicit = SelectionSet {
        indices: vec![1, 2, 3, 8],
        tokens: None,
        mode: SelectionMode::Explicit,
    };
    assert_eq!(
        output_file_name("yelp", ObjectKind::Business, &explicit, &state, true),
        "yelp_res_info_index_specified (3 of 4 restaurants).csv"
    );
    assert_eq!(
        output_file_name("yelp", ObjectKind::Business, &explicit, &state, false),
        "yelp_res_info.csv"
    );

    let range = SelectionSet {
        indices: (0..=9).collect(),
        tokens: None,
        mode: SelectionMode::Range { min: 0, max: 9 },
    };
    assert_eq!(
        output_file_name("yelp", ObjectKind::Review, &range, &state, true),
        "yelp_review_from_0_to_9.csv"
    );
    let failed = RunState {
        failure: 2,
        ..state.clone()
    };
    assert_eq!(
        output_file_name("run", ObjectKind::Review, &range, &failed, true),
        "run_review_from_0_to_9 (2 fails).csv"
    );
}

#[test]
fn empty_partial_window_names_inverted_span() {
    let selection = SelectionSet {
        indices: vec![3],
        tokens: Some(Vec::new()),
        mode: SelectionMode::PartialPage {
            index: 3,
            part: 10,
            window: 0..0,
            total_tokens: 0,
        },
    };
    assert_eq!(
        output_file_name(
            "yelp",
            ObjectKind::Review,
            &selection,
            &RunState::default(),
            true
        ),
        "yelp_review_page_specified (from 0 to -1 of 3 reviews).csv"
    );
}

#[tokio::test]
async fn export_writes_rendered_table() {
    let dir = tempfile::tempdir().unwrap();
    let sink = LocalSink::new(dir.path());
    let table = sample().table(ObjectKind::Review).unwrap();

    let location = export(&table, "out.csv", &sink).await.unwrap();
    assert!(location.ends_with("out.csv"));
    let written = std::fs::read(dir.path().join("out.csv")).unwrap();
    assert_eq!(written, table.to_csv().unwrap());
}
