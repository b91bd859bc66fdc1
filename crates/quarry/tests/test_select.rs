//! Integration tests for SELECT rendering against a TOML-defined schema.
//!
//! The schema lives in `tests/fixtures/schema.toml` and models a small
//! bookstore: books with authors and publishers, reviews pointing at books,
//! and employees extending persons.

use std::path::PathBuf;

use chrono::NaiveDate;
use quarry::{
    EntityRef, JoinKind, NestedBooleanStyle, Operator, QuarryError, Query, RenderConfig,
    SchemaRegistry, SharedResolver, UnionKind, Value,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn registry() -> SharedResolver {
    init_tracing();
    SchemaRegistry::from_file(&fixture("schema.toml"))
        .unwrap()
        .shared()
}

// ============================================================================
// JOINS AND FILTERS
// ============================================================================

#[test]
fn test_books_with_author_and_publisher() {
    let mut q = Query::new(registry(), "Book").unwrap();
    q.add_join("Author", Some("a"), Some("author"), None).unwrap();
    q.add_join("Publisher", Some("p"), None, Some(JoinKind::Left)).unwrap();
    q.select("title").unwrap();
    q.select_of("Author", Some("a"), "fullName").unwrap();
    q.select_of("Publisher", Some("p"), "name").unwrap();
    q.where_op(
        Operator::Between,
        "publishedOn",
        vec![
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().into(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap().into(),
        ],
    )
    .unwrap();
    q.order_by("title", None).unwrap();
    q.offset(40).limit(20);
    q.set_root_alias("b").unwrap();

    assert_eq!(
        q.render().unwrap(),
        "SELECT b.title, a.full_name, p.name FROM book AS b \
         INNER JOIN author a ON b.author_id = a.id \
         LEFT JOIN publisher p ON b.publisher_id = p.id \
         WHERE b.published_on between '2020-01-01' and '2020-12-31' \
         ORDER BY b.title ASC OFFSET 40 LIMIT 20"
    );
}

#[test]
fn test_reviews_joined_through_inverse_relation() {
    let mut q = Query::new(registry(), "Book").unwrap();
    q.add_join("Review", Some("r"), None, None).unwrap();
    q.select("title").unwrap();
    let ratings = q
        .conditions()
        .condition(
            &EntityRef::new("Review"),
            Some("r"),
            Operator::In,
            "rating",
            vec![Value::from(vec![4, 5])],
        )
        .unwrap();
    q.where_condition(ratings);
    q.group_by("title").unwrap();

    assert_eq!(
        q.render().unwrap(),
        "SELECT book.title FROM book INNER JOIN review r ON book.id = r.book_id \
         WHERE r.rating in (4, 5) GROUP BY book.title"
    );
}

#[test]
fn test_auto_expansion_covers_joins() {
    let mut q = Query::new(registry(), "Review").unwrap();
    q.add_join("Book", Some("bk"), Some("book"), None).unwrap();
    q.set_root_alias("r").unwrap();

    assert_eq!(
        q.render().unwrap(),
        "SELECT r.id, r.rating, bk.id, bk.title, bk.price, bk.published_on \
         FROM review AS r INNER JOIN book bk ON r.book_id = bk.id"
    );
}

#[test]
fn test_employee_supertype_join() {
    let mut q = Query::new(registry(), "Employee").unwrap();
    q.set_root_alias("e").unwrap();

    assert_eq!(
        q.render().unwrap(),
        "SELECT e.id, e.salary, person.id, person.name \
         FROM employee AS e INNER JOIN person ON e.id = person.id"
    );
}

#[test]
fn test_typed_literals() {
    let mut q = Query::new(registry(), "Book").unwrap();
    q.select("id").unwrap();

    q.where_eq("id", Uuid::nil()).unwrap();
    assert_eq!(
        q.render().unwrap(),
        "SELECT book.id FROM book WHERE book.id = '00000000-0000-0000-0000-000000000000'"
    );

    q.where_op(
        Operator::Between,
        "price",
        vec![Decimal::new(1000, 2).into(), Decimal::new(2550, 2).into()],
    )
    .unwrap();
    assert_eq!(
        q.render().unwrap(),
        "SELECT book.id FROM book WHERE book.price between 10.00 and 25.50"
    );
}

#[test]
fn test_union_of_people_and_authors() {
    let resolver = registry();
    let mut people = Query::new(resolver.clone(), "Person").unwrap();
    people.select("name").unwrap();
    let mut authors = Query::new(resolver, "Author").unwrap();
    authors.select("fullName").unwrap();
    people.union(authors, UnionKind::UnionAll);

    assert_eq!(
        people.render().unwrap(),
        "SELECT person.name FROM person UNION ALL SELECT author.full_name FROM author"
    );
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_render_config_from_file() {
    let config = RenderConfig::from_file(&fixture("render.toml")).unwrap();
    assert_eq!(config.nested_boolean, NestedBooleanStyle::MixedOnly);

    let mut q = Query::with_config(registry(), "Book", config).unwrap();
    q.select("id").unwrap();
    let f = q.conditions();
    let book = EntityRef::new("Book");
    let cheap = f
        .condition(&book, None, Operator::Eq, "price", vec![5.into()])
        .unwrap();
    let titled = f
        .condition(&book, None, Operator::Eq, "title", vec!["Dune".into()])
        .unwrap();
    let free = f
        .condition(&book, None, Operator::Eq, "price", vec![0.into()])
        .unwrap();
    let both = f.and(vec![cheap, titled]).unwrap();
    q.where_condition(f.or(vec![both, free]).unwrap());

    assert_eq!(
        q.render().unwrap(),
        "SELECT book.id FROM book \
         WHERE (book.price = 5 and book.title = 'Dune') or book.price = 0"
    );
}

#[test]
fn test_invalid_schema_documents() {
    let dangling = r#"
        [[entity]]
        name = "Employee"
        table = "employee"
        extends = "Person"
    "#;
    assert!(matches!(
        SchemaRegistry::from_toml_str(dangling),
        Err(QuarryError::Schema(_))
    ));

    assert!(matches!(
        SchemaRegistry::from_toml_str("[[entity]]\nname = 1"),
        Err(QuarryError::Config(_))
    ));

    assert!(matches!(
        SchemaRegistry::from_file(&fixture("missing.toml")),
        Err(QuarryError::Config(_))
    ));
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn test_concurrent_renders_share_resolver() {
    let resolver = registry();
    let expected = {
        let mut q = Query::new(resolver.clone(), "Book").unwrap();
        q.add_join("Author", Some("a"), Some("author"), None).unwrap();
        q.render().unwrap()
    };

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = resolver.clone();
                scope.spawn(move || {
                    let mut q = Query::new(resolver, "Book").unwrap();
                    q.add_join("Author", Some("a"), Some("author"), None).unwrap();
                    q.render().unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
