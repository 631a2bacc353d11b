//! Token dumps written by an external page renderer.
//!
//! A dump is a JSON array of pages, each an array of tokens:
//!
//! ```json
//! [[{"text": "Date", "x_start": 60.0, "x_end": 85.0, "vertical_position": 50.0}]]
//! ```

use statement_table_models::Page;

use crate::SourceError;

/// Parses a token dump.
///
/// # Errors
///
/// Returns [`SourceError::Json`] if the bytes are not a valid dump.
pub fn parse(bytes: &[u8]) -> Result<Vec<Page>, SourceError> {
    let pages: Vec<Page> = serde_json::from_slice(bytes)?;
    log::debug!(
        "Token dump holds {} pages, {} tokens",
        pages.len(),
        pages.iter().map(Vec::len).sum::<usize>()
    );
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pages_of_tokens() {
        let pages = parse(
            br#"[[{"text":"Date","x_start":60,"x_end":85,"vertical_position":50.5}],[]]"#,
        )
        .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0][0].text, "Date");
        assert!((pages[0][0].x_end - 85.0).abs() < f64::EPSILON);
        assert!(pages[1].is_empty());
    }

    #[test]
    fn missing_coordinates_are_rejected() {
        let err = parse(br#"[[{"text":"Date"}]]"#).unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }
}
