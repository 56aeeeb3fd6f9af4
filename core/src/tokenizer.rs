use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[A-Za-z]+").expect("valid regex");
}

/// Tokenize text into lowercase word tokens, in order of appearance.
///
/// A token is a maximal run of ASCII letters; any other character is a
/// boundary, so digits and punctuation never reach the index. The same
/// function handles document text and query strings.
pub fn tokenize(text: &str) -> Vec<String> {
    RE.find_iter(text)
        .map(|mat| mat.as_str().to_ascii_lowercase())
        .collect()
}
