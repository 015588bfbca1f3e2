use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tick_embed::chart::{embed_tick_chart, render_components, ChartSpec};
use tick_embed::error::ChartError;
use tick_embed::loader::{TickColumns, TickSource};
use tick_embed::model::tick::TickPoint;

fn temp_csv(test_name: &str, body: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("tick-embed-{}-{}.csv", test_name, ts));
    std::fs::write(&path, body).expect("temp csv should be writable");
    path
}

const TICKS: &str = "jst,bid\n\
    2024-01-01T00:00:00.000,71.10\n\
    2024-01-01T00:00:00.500,\n\
    2024-01-01T00:00:01.250,71.30\n";

#[test]
/// Verifies the fixed chart configuration.
fn tick_chart_spec_is_fixed() {
    let spec = ChartSpec::tick_chart();
    assert_eq!(spec.title, "Tick Chart: Bid Price (Static Embed)");
    assert_eq!((spec.width, spec.height), (800, 400));
    assert_eq!(spec.x_axis_type, "datetime");
    assert_eq!(spec.x_label, "Time");
    assert_eq!(spec.y_label, "Bid Price");
    assert_eq!(spec.toolbar_location, "above");
    assert_eq!(spec.tools, &["pan", "wheel_zoom", "box_zoom", "reset", "save"]);
    assert_eq!(spec.line_width, 2);
    assert_eq!(spec.line_color, "navy");
    assert_eq!(spec.legend_label, "Bid");
}

#[test]
/// Verifies a valid file yields non-empty script and div tied by one element id,
/// with the filtered ms timestamps embedded as x values.
fn embed_produces_script_and_div() {
    let source = TickSource::new(temp_csv("chart-embed", TICKS), TickColumns::default());

    let artifact = embed_tick_chart(&source, &ChartSpec::tick_chart()).expect("chart should render");

    assert!(artifact.script.starts_with("<script type=\"text/javascript\">"));
    assert!(artifact.script.trim_end().ends_with("</script>"));
    assert!(artifact.div.starts_with("<div"));
    assert!(artifact.div.contains("<svg"));
    assert!(artifact.div.contains(&artifact.element_id));
    assert!(artifact.script.contains(&artifact.element_id));
    assert!(artifact
        .script
        .contains("\"x\":[1704067200000,1704067201250]"));
    assert!(artifact.script.contains("\"y\":[71.1,71.3]"));
}

#[test]
/// Verifies an infinite bid never reaches the chart document as `null`.
fn embed_drops_infinite_bids() {
    let source = TickSource::new(
        temp_csv(
            "chart-inf",
            "jst,bid\n2024-01-01T00:00:00.000,71.10\n2024-01-01T00:00:00.500,inf\n",
        ),
        TickColumns::default(),
    );

    let artifact = embed_tick_chart(&source, &ChartSpec::tick_chart()).expect("chart should render");

    assert!(artifact.script.contains("\"x\":[1704067200000]"));
    assert!(artifact.script.contains("\"y\":[71.1]"));
}

#[test]
/// Verifies two renders over an unchanged file differ only in the element id.
fn embed_is_idempotent_apart_from_ids() {
    let source = TickSource::new(temp_csv("chart-idempotent", TICKS), TickColumns::default());
    let spec = ChartSpec::tick_chart();

    let first = embed_tick_chart(&source, &spec).expect("first render");
    let second = embed_tick_chart(&source, &spec).expect("second render");

    assert_ne!(first.element_id, second.element_id);
    assert_eq!(
        first.script.replace(&first.element_id, "ID"),
        second.script.replace(&second.element_id, "ID")
    );
    assert_eq!(
        first.div.replace(&first.element_id, "ID"),
        second.div.replace(&second.element_id, "ID")
    );
}

#[test]
/// Verifies a missing column is a client error with the fixed message.
fn embed_missing_column_is_client_error() {
    let source = TickSource::new(
        temp_csv("chart-no-jst", "time,bid\n2024-01-01T00:00:00,71.1\n"),
        TickColumns::default(),
    );

    let err = embed_tick_chart(&source, &ChartSpec::tick_chart()).expect_err("jst is missing");

    assert!(err.is_client_error());
    assert_eq!(err.to_string(), "Missing 'jst' or 'bid' column");
}

#[test]
/// Verifies a missing file is a server-side failure.
fn embed_missing_file_is_server_error() {
    let source = TickSource::new(
        std::env::temp_dir().join("tick-embed-chart-missing.csv"),
        TickColumns::default(),
    );

    let err = embed_tick_chart(&source, &ChartSpec::tick_chart()).expect_err("file is missing");

    assert!(matches!(err, ChartError::Load(_)));
    assert!(!err.is_client_error());
}

#[test]
/// Verifies an empty data set still renders a frame.
fn render_handles_empty_points() {
    let artifact = render_components(&ChartSpec::tick_chart(), &[]).expect("empty chart");
    assert!(artifact.div.contains("<svg"));
    assert!(artifact.script.contains("\"x\":[]"));
}

#[test]
/// Verifies script-terminating sequences in the document cannot break out of
/// the script element.
fn render_escapes_closing_tags() {
    let points = [TickPoint { x: 0, y: 1.0 }];
    let artifact = render_components(&ChartSpec::tick_chart(), &points).expect("chart");
    assert_eq!(artifact.script.matches("</script>").count(), 1);
}
