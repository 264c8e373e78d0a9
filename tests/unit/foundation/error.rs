use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::input_missing("x")
            .to_string()
            .contains("input missing:")
    );
    assert!(
        ReelError::empty_input("x")
            .to_string()
            .contains("empty input:")
    );
    assert!(
        ReelError::font_unavailable("x")
            .to_string()
            .contains("font unavailable:")
    );
    assert!(ReelError::render("x").to_string().contains("render error:"));
    assert!(ReelError::mux("x").to_string().contains("mux error:"));
    assert!(
        ReelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
