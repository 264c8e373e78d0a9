use super::*;

const TWO_LINES: &str = "The quick brown fox jumps over the lazy dog again and again";

#[test]
fn wrap_breaks_at_word_boundaries() {
    let lines = wrap_text(TWO_LINES, 35).unwrap();
    assert_eq!(
        lines,
        vec!["The quick brown fox jumps over the", "lazy dog again and again"]
    );
    assert!(lines.iter().all(|l| l.chars().count() <= 35));
}

#[test]
fn wrap_keeps_long_words_whole() {
    let lines = wrap_text("a supercalifragilistic b", 5).unwrap();
    assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
}

#[test]
fn wrap_collapses_whitespace_runs() {
    let lines = wrap_text("  one\t\ttwo \n three  ", 80).unwrap();
    assert_eq!(lines, vec!["one two three"]);
}

#[test]
fn wrap_counts_characters_not_bytes() {
    let lines = wrap_text("héllo wörld", 11).unwrap();
    assert_eq!(lines, vec!["héllo wörld"]);
}

#[test]
fn zero_width_is_rejected() {
    assert!(matches!(wrap_text("x", 0), Err(ReelError::Validation(_))));
}

#[test]
fn two_lines_over_twenty_seconds_split_evenly() {
    let segs = segment_captions(TWO_LINES, 35, 20.0).unwrap();
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[0].start_sec, 0.0);
    assert_eq!(segs[0].duration_sec, 10.0);
    assert_eq!(segs[1].start_sec, 10.0);
    assert_eq!(segs[1].duration_sec, 10.0);
}

#[test]
fn short_letter_sequence_fits_on_one_line() {
    let segs = segment_captions("A B C D E F G H I J K L M N", 35, 20.0).unwrap();
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].text, "A B C D E F G H I J K L M N");
    assert_eq!(segs[0].duration_sec, 20.0);
}

#[test]
fn segments_are_contiguous_and_cover_duration() {
    let text = "one two three four five six seven eight nine ten eleven twelve";
    for duration in [0.5, 7.3, 19.99, 61.0] {
        for width in [3usize, 8, 13, 35] {
            let segs = segment_captions(text, width, duration).unwrap();
            assert!(!segs.is_empty());
            assert_eq!(segs[0].start_sec, 0.0);
            for pair in segs.windows(2) {
                assert!((pair[0].end_sec() - pair[1].start_sec).abs() < 1e-9);
            }
            let total: f64 = segs.iter().map(|s| s.duration_sec).sum();
            assert!((total - duration).abs() < 1e-9);
            assert!((segs.last().unwrap().end_sec() - duration).abs() < 1e-9);
            assert!(segs.iter().all(|s| s.duration_sec > 0.0));
        }
    }
}

#[test]
fn empty_text_yields_one_blank_segment() {
    let segs = segment_captions("   ", 35, 12.0).unwrap();
    assert_eq!(
        segs,
        vec![CaptionSegment {
            text: String::new(),
            start_sec: 0.0,
            duration_sec: 12.0
        }]
    );
}

#[test]
fn non_positive_duration_is_empty_input() {
    for d in [0.0, -3.0, f64::NAN] {
        assert!(matches!(
            segment_captions("hello", 35, d),
            Err(ReelError::EmptyInput(_))
        ));
    }
}
