use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};

use crate::infra::config::CatalogConfig;
use crate::infra::import::csv::import_csv_to_table;
use crate::*;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("tablature-{prefix}-{nanos}"))
}

fn create_people_db(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir).expect("should create temp dir");
    let db_path = dir.join("people.sqlite");
    let conn = Connection::open(&db_path).expect("should open sqlite db");
    conn.execute_batch(
        "CREATE TABLE person (
             name   TEXT NOT NULL,
             age    INTEGER,
             status TEXT,
             joined DATE
         );",
    )
    .expect("should create person table");
    for (name, age, status, joined) in [
        ("Jane Doe", Some(30), "a", "2021-04-01"),
        ("John Smith", Some(30), "i", "2019-11-23"),
        ("Jane Roe", Some(41), "a", "2020-02-29"),
        ("Bob Stone", None, "a", "2022-08-15"),
    ] {
        conn.execute(
            "INSERT INTO person(name, age, status, joined) VALUES (?1, ?2, ?3, ?4)",
            params![name, age, status, joined],
        )
        .expect("should insert person");
    }
    db_path
}

fn people_view(db_path: &Path) -> TableView<SqliteSource> {
    let source = SqliteSource::open(db_path, "person").expect("should open person table");
    TableView::build(
        ColumnCatalog::builder()
            .columns(["name", "age"])
            .search_lookups(["name__icontains"])
            .access_control_allow_origin("https://example.test"),
        source,
    )
    .expect("catalog should build")
}

#[test]
fn scenario_search_filter_order_first_page() {
    let temp_dir = unique_test_dir("scenario");
    let db_path = create_people_db(&temp_dir);
    let view = people_view(&db_path);

    let response = view
        .handle("q=Jane&choices=,30&orderings=1,0&page=0", "en")
        .expect("request should succeed");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"results":[["Jane Doe","30"]],"count":1}"#);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(
        response.header("Access-Control-Allow-Origin"),
        Some("https://example.test")
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn config_request_lists_filter_pairs_per_column() {
    let temp_dir = unique_test_dir("config");
    let db_path = create_people_db(&temp_dir);
    let source = SqliteSource::open(&db_path, "person").expect("should open person table");
    let view = TableView::build(
        ColumnCatalog::builder()
            .columns(["name", "status"])
            .filter_values("status", FilterValues::pairs([["a", "Alpha"], ["b", "Beta"]]))
            .width("name", "40%"),
        source,
    )
    .expect("catalog should build");

    let response = view.handle("get_config", "en").expect("request should succeed");

    assert_eq!(
        response.body,
        concat!(
            r#"{"columns":["Name","Status"],"columns_widths":["40%","initial"],"#,
            r#""search_enabled":false,"sortables":[true,true],"#,
            r#""filters":[[],[["a","Alpha"],["b","Beta"]]],"results_per_page":15}"#
        )
    );
    assert_eq!(response.header("Access-Control-Allow-Origin"), None);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn sortables_match_ascending_ordering() {
    let schema = Schema::new(
        "person",
        vec![
            SchemaField::stored("name"),
            SchemaField::computed("initials", Some("initials")),
        ],
    );
    let catalog = ColumnCatalog::builder()
        .columns(["name", "initials", "shout"])
        .value_resolver("shout", |_row: &Row| CellValue::from("!"))
        .build(&schema)
        .expect("catalog should build");
    let source = MemorySource::new(schema);
    let view = TableView::new(Arc::new(catalog), source);

    let config = view.responses().config().expect("config payload");
    let expected: Vec<bool> = view
        .catalog()
        .columns()
        .iter()
        .map(|column| !column.ordering_for(Direction::Ascending).is_empty())
        .collect();
    assert_eq!(config.sortables, expected);
    assert_eq!(config.sortables, vec![true, false, false]);
}

#[test]
fn pages_partition_results_and_count_ignores_page() {
    let temp_dir = unique_test_dir("pagination");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("numbers.sqlite");
    let mut conn = Connection::open(&db_path).expect("should open sqlite db");
    conn.execute_batch("CREATE TABLE number (n INTEGER NOT NULL);")
        .expect("should create table");
    let tx = conn.transaction().expect("should start transaction");
    for n in (0..40_i64).rev() {
        tx.execute("INSERT INTO number(n) VALUES (?1)", [n])
            .expect("should insert number");
    }
    tx.commit().expect("should commit");

    let source = SqliteSource::open(&db_path, "number").expect("should open number table");
    let view = TableView::build(ColumnCatalog::builder(), source).expect("catalog should build");
    let page = |index: u64| {
        let params = view
            .parse(&format!("orderings=1&page={index}"))
            .expect("valid parameters");
        view.responses().data(&params, "en").expect("data payload")
    };

    let first = page(0);
    let second = page(1);
    let third = page(2);
    let cells = |payload: &DataPayload| -> Vec<String> {
        payload.results.iter().map(|row| row[0].clone()).collect()
    };
    assert_eq!(cells(&first), (0..15).map(|n| n.to_string()).collect::<Vec<_>>());
    assert_eq!(cells(&second), (15..30).map(|n| n.to_string()).collect::<Vec<_>>());
    assert_eq!(cells(&third), (30..40).map(|n| n.to_string()).collect::<Vec<_>>());
    assert_eq!(first.count, 40);
    assert_eq!(second.count, 40);
    assert_eq!(third.count, 40);
    assert!(page(3).results.is_empty());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn repeated_requests_are_byte_identical() {
    let temp_dir = unique_test_dir("idempotence");
    let db_path = create_people_db(&temp_dir);
    let view = people_view(&db_path);

    let first = view
        .handle("q=j&orderings=-1,1", "en")
        .expect("request should succeed");
    let second = view
        .handle("q=j&orderings=-1,1", "en")
        .expect("request should succeed");
    assert_eq!(first, second);
    assert_eq!(
        first.body,
        r#"{"results":[["John Smith","30"],["Jane Roe","41"],["Jane Doe","30"]],"count":3}"#
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn empty_query_matches_omitted_query() {
    let temp_dir = unique_test_dir("empty-query");
    let db_path = create_people_db(&temp_dir);
    let view = people_view(&db_path);

    let with_empty = view.handle("q=&page=0", "en").expect("request should succeed");
    let without = view.handle("page=0", "en").expect("request should succeed");
    assert_eq!(with_empty.body, without.body);
    assert!(without.body.ends_with(r#""count":4}"#));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn null_values_render_as_empty_cells() {
    let temp_dir = unique_test_dir("null-cells");
    let db_path = create_people_db(&temp_dir);
    let view = people_view(&db_path);

    let response = view.handle("q=bob", "en").expect("request should succeed");
    assert_eq!(response.body, r#"{"results":[["Bob Stone",""]],"count":1}"#);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn malformed_parameters_get_a_bad_request_response() {
    let temp_dir = unique_test_dir("bad-request");
    let db_path = create_people_db(&temp_dir);
    let view = people_view(&db_path);

    for query in ["page=-1", "page=first", "orderings=1,up"] {
        let response = view.handle(query, "en").expect("client errors are responses");
        assert_eq!(response.status, 400, "query `{query}` should be rejected");
        assert!(response.body.starts_with(r#"{"error":"#));
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some("https://example.test")
        );
    }

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn data_source_failures_propagate() {
    let temp_dir = unique_test_dir("source-failure");
    let db_path = create_people_db(&temp_dir);
    let view = people_view(&db_path);
    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");

    let result = view.handle("page=0", "en");
    assert!(matches!(result, Err(TableError::DataSource(_))));
}

#[test]
fn display_variants_computed_values_and_lazy_filters() {
    let temp_dir = unique_test_dir("display");
    let db_path = create_people_db(&temp_dir);
    let source = SqliteSource::open(&db_path, "person")
        .expect("should open person table")
        .with_choices("status", [("a", "Active"), ("i", "Inactive")])
        .with_computed("initial", "substr(name, 1, 1)", Some("first letter"))
        .with_verbose_name("joined", "member since");
    let view = TableView::build(
        ColumnCatalog::builder()
            .columns(["name", "status", "initial", "joined"])
            .filter_values("status", FilterValues::Distinct("status".to_string())),
        source,
    )
    .expect("catalog should build");

    let config = view.responses().config().expect("config payload");
    assert_eq!(
        config.columns,
        vec!["Name", "Status", "First letter", "Member since"]
    );
    assert_eq!(
        config.filters[1],
        vec![FilterChoice::new("a", "Active"), FilterChoice::new("i", "Inactive")]
    );
    assert_eq!(config.sortables, vec![true, true, false, true]);

    let response = view
        .handle("choices=,i&orderings=0,0,0,-1", "en")
        .expect("request should succeed");
    assert_eq!(
        response.body,
        r#"{"results":[["John Smith","Inactive","J","2019-11-23"]],"count":1}"#
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn every_offered_distinct_value_selects_its_rows() {
    let temp_dir = unique_test_dir("distinct-choices");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("visits.sqlite");
    let conn = Connection::open(&db_path).expect("should open sqlite db");
    conn.execute_batch(
        "CREATE TABLE visit (name TEXT, active BOOLEAN, seen DATETIME);
         INSERT INTO visit VALUES ('Ann', 1, '2021-04-01T10:00:00');
         INSERT INTO visit VALUES ('Ben', 0, '2021-04-02T11:00:00');",
    )
    .expect("should seed visit table");

    let source = SqliteSource::open(&db_path, "visit").expect("should open visit table");
    let view = TableView::build(
        ColumnCatalog::builder()
            .filter_values("active", FilterValues::Distinct("active".to_string()))
            .filter_values("seen", FilterValues::Distinct("seen".to_string())),
        source,
    )
    .expect("catalog should build");

    let config = view.responses().config().expect("config payload");
    assert_eq!(
        config.filters[1],
        vec![FilterChoice::new("0", "false"), FilterChoice::new("1", "true")]
    );
    assert_eq!(
        config.filters[2],
        vec![
            FilterChoice::new("2021-04-01T10:00:00", "2021-04-01 10:00:00"),
            FilterChoice::new("2021-04-02T11:00:00", "2021-04-02 11:00:00"),
        ]
    );

    for (index, choices) in config.filters.iter().enumerate() {
        for choice in choices {
            let positional =
                format!("{}{}", ",".repeat(index), urlencoding::encode(&choice.value));
            let query_string = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("choices", &positional)
                .finish();
            let params = view.parse(&query_string).expect("valid parameters");
            let data = view.responses().data(&params, "en").expect("data payload");
            assert_eq!(data.count, 1, "choice {:?} of column {index}", choice.value);
        }
    }

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn csv_import_serves_through_yaml_catalog() {
    let temp_dir = unique_test_dir("csv-import");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let csv_path = temp_dir.join("cities.csv");
    fs::write(
        &csv_path,
        "city,country\nLyon,France\nPorto,Portugal\nParis,France\n",
    )
    .expect("should write csv");
    let db_path = temp_dir.join("cities.sqlite");

    let imported =
        import_csv_to_table(&db_path, &csv_path, "cities", false).expect("csv should import");
    assert_eq!(imported.row_count, 3);
    assert!(import_csv_to_table(&db_path, &csv_path, "cities", false).is_err());
    import_csv_to_table(&db_path, &csv_path, "cities", true).expect("replace should succeed");

    let config = CatalogConfig::from_yaml(
        r#"
table: cities
search_lookups: [city__istartswith, country__iexact]
filter_lookups:
  country: country__istartswith
results_per_page: 2
"#,
    )
    .expect("config parses");
    let source = SqliteSource::open(&db_path, "cities").expect("should open cities table");
    let view = TableView::build(config.into_builder(), source).expect("catalog should build");

    let response = view
        .handle("choices=,fr&orderings=-1,0", "en")
        .expect("request should succeed");
    assert_eq!(
        response.body,
        r#"{"results":[["Paris","France"],["Lyon","France"]],"count":2}"#
    );

    let response = view.handle("q=p&page=1&orderings=1", "en").expect("request should succeed");
    assert_eq!(response.body, r#"{"results":[],"count":2}"#);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn memory_source_full_text_search_through_the_view() {
    let schema = Schema::new(
        "article",
        vec![SchemaField::stored("title"), SchemaField::stored("body")],
    );
    let source = MemorySource::new(schema)
        .with_rows([
            Row::new(1)
                .with("title", "Rust ownership")
                .with("body", "Borrowing rules explained"),
            Row::new(2)
                .with("title", "Gardening")
                .with("body", "Tomatoes need sun"),
        ])
        .with_full_text_search();
    let view = TableView::build(
        ColumnCatalog::builder()
            .columns(["title"])
            .search_lookups(["title", "body"]),
        source,
    )
    .expect("catalog should build");

    let response = view.handle("q=borrow%20rust", "en-GB").expect("request should succeed");
    assert_eq!(response.body, r#"{"results":[["Rust ownership"]],"count":1}"#);
}

#[test]
fn page_adapter_serves_context_or_json() {
    let schema = Schema::new("person", vec![SchemaField::stored("name")]);
    let source = MemorySource::new(schema).with_rows([Row::new(1).with("name", "Jane")]);
    let view = TableView::build(
        ColumnCatalog::builder()
            .verbose_name_plural("People")
            .ajax_url("/people/data"),
        source,
    )
    .expect("catalog should build");
    let page = TablePage::new(&view);

    match page.dispatch(false, "", "en").expect("page request") {
        PageOutcome::Page(context) => {
            assert_eq!(context.verbose_name_plural, "People");
            assert_eq!(context.ajax_url, "/people/data");
            assert_eq!(context.config.columns, vec!["Name"]);
        }
        other => panic!("expected page context, got {other:?}"),
    }

    match page.dispatch(true, "page=0", "en").expect("ajax request") {
        PageOutcome::Json(response) => {
            assert_eq!(response.body, r#"{"results":[["Jane"]],"count":1}"#);
            assert_eq!(
                response.header("Cache-Control"),
                Some("no-cache, no-store, must-revalidate")
            );
        }
        other => panic!("expected json response, got {other:?}"),
    }
}
