//! Tests for raw book clean-up

use std::sync::Arc;

use tempfile::TempDir;

use tipitree::application::services::BookService;
use tipitree::application::ApplicationError;
use tipitree::domain::DomainError;
use tipitree::infrastructure::traits::RealFileSystem;
use tipitree::util::testing::{compact, write_fixture};

const RAW_BOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<doc>
  <nikaya>Dīgha</nikaya>
  <book>Sīlakkhandha</book>
  <chapter>1. Brahmajāla</chapter>
  <hangnum>1</hangnum>
  <p>x</p>
  <chapter>2. Sāmañña</chapter>
  <p>y</p>
</doc>
"#;

fn service() -> BookService {
    BookService::new(Arc::new(RealFileSystem))
}

#[test]
fn given_flat_book_when_cleaning_then_markup_nests_under_headings() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = write_fixture(temp.path(), "book.xml", RAW_BOOK);

    // Act
    let tree = service().clean(&path).unwrap();

    // Assert
    assert_eq!(
        compact(&tree),
        concat!(
            r#"<doc><nikaya title="Dīgha"><book title="Sīlakkhandha">"#,
            r#"<chapter nr="1" title="Brahmajāla"><hangnum>1<p>x</p></hangnum></chapter>"#,
            r#"<chapter nr="2" title="Sāmañña"><p>y</p></chapter>"#,
            r#"</book></nikaya></doc>"#
        )
    );
}

#[test]
fn given_chapter_heading_with_markup_when_cleaning_then_fails_as_malformed() {
    let temp = TempDir::new().unwrap();
    let path = write_fixture(
        temp.path(),
        "book.xml",
        "<doc><chapter>1. <b>Bold</b></chapter></doc>",
    );

    let result = service().clean(&path);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MalformedInput { .. }))
    ));
}

#[test]
fn given_missing_book_when_cleaning_then_reports_read_failure() {
    let temp = TempDir::new().unwrap();

    let result = service().clean(&temp.path().join("missing.xml"));

    assert!(matches!(result, Err(ApplicationError::ReadFailure { .. })));
}
