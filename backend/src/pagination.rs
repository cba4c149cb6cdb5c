//! Forward-only cursor pagination over entities with increasing integer ids.
//!
//! The cursor is the base64 encoding of the last returned id. Callers must
//! treat it as opaque.

use base64::{engine::general_purpose, Engine};
use listing_schema::{Page, PageRequest};
use thiserror::Error;

/// A row that [`paginate`] can page over.
pub trait Identify {
    /// Primary key. Ids grow with insertion order.
    fn id(&self) -> i64;
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid pagination cursor")]
pub struct InvalidCursor;

pub fn encode_cursor(id: i64) -> String {
    general_purpose::STANDARD.encode(id.to_string())
}

pub fn decode_cursor(cursor: &str) -> Result<i64, InvalidCursor> {
    let bytes = general_purpose::STANDARD
        .decode(cursor)
        .map_err(|_| InvalidCursor)?;
    let text = std::str::from_utf8(&bytes).map_err(|_| InvalidCursor)?;
    // Only the canonical form round-trips, so "+5" and "05" are rejected.
    let id: i64 = text.parse().map_err(|_| InvalidCursor)?;
    if id <= 0 || id.to_string() != text {
        return Err(InvalidCursor);
    }
    Ok(id)
}

/// Fetches one page. `fetch` receives the decoded cursor and the number of
/// rows to load (`page_size + 1`) and must return rows with `id > cursor`
/// in ascending id order. Errors from `fetch` are returned unchanged.
pub fn paginate<T, E, F>(request: &PageRequest, fetch: F) -> Result<Page<T>, E>
where
    T: Identify,
    E: From<InvalidCursor>,
    F: FnOnce(Option<i64>, i64) -> Result<Vec<T>, E>,
{
    let cursor = request.cursor.as_deref().map(decode_cursor).transpose()?;
    if request.page_size <= 0 {
        return Ok(Page::empty());
    }
    let page_size = request.page_size;

    let mut rows = fetch(cursor, page_size + 1)?;
    let has_next_page = rows.len() as i64 > page_size;
    rows.truncate(page_size as usize);

    let next_cursor = if has_next_page {
        rows.last().map(|last| encode_cursor(last.id()))
    } else {
        None
    };
    Ok(Page {
        data: rows,
        next_cursor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row(i64);

    impl Identify for Row {
        fn id(&self) -> i64 {
            self.0
        }
    }

    #[derive(Debug, PartialEq)]
    enum FetchError {
        Cursor,
        Down,
    }

    impl From<InvalidCursor> for FetchError {
        fn from(_: InvalidCursor) -> Self {
            FetchError::Cursor
        }
    }

    fn table(ids: &[i64]) -> impl Fn(Option<i64>, i64) -> Result<Vec<Row>, FetchError> + '_ {
        move |cursor, take| {
            Ok(ids
                .iter()
                .copied()
                .filter(|id| cursor.map_or(true, |c| *id > c))
                .take(take as usize)
                .map(Row)
                .collect())
        }
    }

    fn request(cursor: Option<String>, page_size: i64) -> PageRequest {
        PageRequest { cursor, page_size }
    }

    #[test]
    fn walks_all_pages_without_gaps() {
        let ids = [1, 2, 3, 4, 5];

        let first = paginate(&request(None, 2), table(&ids)).unwrap();
        assert_eq!(first.data, vec![Row(1), Row(2)]);
        let cursor = first.next_cursor.clone().unwrap();
        assert_eq!(decode_cursor(&cursor), Ok(2));

        let second = paginate(&request(Some(cursor), 2), table(&ids)).unwrap();
        assert_eq!(second.data, vec![Row(3), Row(4)]);

        let third = paginate(&request(second.next_cursor, 2), table(&ids)).unwrap();
        assert_eq!(third.data, vec![Row(5)]);
        assert_eq!(third.next_cursor, None);
    }

    #[test]
    fn exact_fit_has_no_next_cursor() {
        let page = paginate(&request(None, 5), table(&[1, 2, 3, 4, 5])).unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn zero_page_size_never_fetches() {
        let page: Page<Row> = paginate(&request(None, 0), |_, _| -> Result<Vec<Row>, FetchError> {
            panic!("fetch must not run")
        })
        .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn invalid_cursor_is_rejected() {
        for cursor in ["not base64!", "YWJj", "MA==", "LTE=", ""] {
            let result = paginate(&request(Some(cursor.into()), 2), table(&[1, 2]));
            assert_eq!(result.unwrap_err(), FetchError::Cursor, "cursor {cursor:?}");
        }
    }

    #[test]
    fn fetch_errors_propagate() {
        let result: Result<Page<Row>, FetchError> =
            paginate(&request(None, 2), |_, _| Err(FetchError::Down));
        assert_eq!(result.unwrap_err(), FetchError::Down);
    }

    #[test]
    fn cursor_round_trips() {
        assert_eq!(encode_cursor(42), "NDI=");
        assert_eq!(decode_cursor(&encode_cursor(9_007_199_254)), Ok(9_007_199_254));
    }
}
