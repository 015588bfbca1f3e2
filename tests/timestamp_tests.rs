use tick_embed::error::TimestampError;
use tick_embed::timestamp::normalize_timestamp;

#[test]
/// Verifies sub-millisecond digits are truncated, never rounded.
fn truncates_instead_of_rounding() {
    assert_eq!(
        normalize_timestamp("2024-01-01T00:00:00.0009").unwrap(),
        1_704_067_200_000
    );
    assert_eq!(
        normalize_timestamp("2024-01-01T00:00:00.9999").unwrap(),
        1_704_067_200_999
    );
}

#[test]
/// Verifies pre-epoch instants floor toward negative infinity.
fn pre_epoch_floors() {
    assert_eq!(normalize_timestamp("1969-12-31T23:59:59.9995").unwrap(), -1);
    assert_eq!(normalize_timestamp("1970-01-01T00:00:00").unwrap(), 0);
}

#[test]
/// Verifies the accepted separators and reduced-precision forms.
fn accepts_iso8601_variants() {
    let midnight = 1_704_067_200_000;
    assert_eq!(normalize_timestamp("2024-01-01").unwrap(), midnight);
    assert_eq!(normalize_timestamp("2024-01-01T00:00").unwrap(), midnight);
    assert_eq!(normalize_timestamp("2024-01-01 00:00:00").unwrap(), midnight);
    assert_eq!(normalize_timestamp(" 2024-01-01T00:00:00Z ").unwrap(), midnight);
    assert_eq!(
        normalize_timestamp("2024-01-01T00:00:00.123456789123").unwrap(),
        midnight + 123
    );
}

#[test]
/// Verifies garbage and empty input are rejected with a typed error.
fn rejects_invalid_input() {
    assert_eq!(normalize_timestamp(""), Err(TimestampError::Empty));
    assert!(matches!(
        normalize_timestamp("yesterday"),
        Err(TimestampError::Invalid(_))
    ));
    assert!(matches!(
        normalize_timestamp("2024-13-01T00:00:00"),
        Err(TimestampError::Invalid(_))
    ));
    assert!(matches!(
        normalize_timestamp("3000-01-01T00:00:00"),
        Err(TimestampError::OutOfRange(_))
    ));
}
