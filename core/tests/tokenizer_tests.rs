use tempest_core::tokenizer::tokenize;

#[test]
fn it_lowercases_and_splits_on_punctuation() {
    assert_eq!(tokenize("STORM!! hits; flood."), vec!["storm", "hits", "flood"]);
}

#[test]
fn it_drops_digits_and_splits_mixed_runs() {
    // non-letter characters are boundaries, so only the letter parts survive
    assert_eq!(tokenize("4x4 wind99gust 2003"), vec!["x", "wind", "gust"]);
}

#[test]
fn it_preserves_order_of_appearance() {
    assert_eq!(
        tokenize("Drought, then heat -- then drought again"),
        vec!["drought", "then", "heat", "then", "drought", "again"]
    );
}

#[test]
fn non_ascii_letters_are_boundaries() {
    assert_eq!(tokenize("café"), vec!["caf"]);
}
