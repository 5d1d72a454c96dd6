use rusqlite::types::Value;

use super::*;
use crate::core::issue::{IgnoreMode, RuleType};
use crate::core::store::fixtures::{self, NewIssue};

fn builder() -> QueryBuilder {
    QueryBuilder::new(TableName::new(DEFAULT_ISSUE_TABLE).unwrap(), 1)
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

#[test]
fn test_table_name_validation() {
    assert!(TableName::new("accessibility_checker").is_ok());
    assert!(TableName::new("wp_2_accessibility_checker").is_ok());

    for bad in ["", "1table", "issues; DROP TABLE posts", "a-b", "a.b", "tbl "] {
        let err = TableName::new(bad).unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidTableName { .. }),
            "accepted {:?}",
            bad
        );
        assert!(err.is_configuration());
    }
}

#[test]
fn test_scope_clauses_per_ignore_mode() {
    let base = IssueFilter::new(10).with_post_types(["post"]);

    let exclude = builder().build(&base);
    assert_eq!(
        exclude.where_sql(),
        "site_id = ? AND ignored = 0 AND ignored_globally = 0 AND post_type IN (?)"
    );

    let include = builder().build(&base.clone().with_ignore_mode(IgnoreMode::IncludeIgnored));
    assert_eq!(include.where_sql(), "site_id = ? AND post_type IN (?)");

    let only = builder().build(&base.with_ignore_mode(IgnoreMode::OnlyIgnored));
    assert_eq!(
        only.where_sql(),
        "site_id = ? AND (ignored = 1 OR ignored_globally = 1) AND post_type IN (?)"
    );
}

#[test]
fn test_values_are_bound_not_interpolated() {
    let filter = IssueFilter::new(25)
        .with_post_types(["post", "page"])
        .with_rule_types([RuleType::Error])
        .with_rule_slugs(["empty_link' OR 1=1 --"]);
    let built = builder().build(&filter);

    assert!(!built.where_sql().contains("empty_link"));
    assert!(!built.where_sql().contains("'"));
    assert_eq!(
        built.params(),
        &[
            Value::Integer(1),
            text("page"),
            text("post"),
            text("error"),
            text("empty_link' OR 1=1 --"),
        ]
    );
    assert_eq!(built.limit(), 25);
}

#[test]
fn test_count_statement_sql() {
    let filter = IssueFilter::new(100)
        .with_post_types(["post", "page"])
        .with_rule_types([RuleType::Error]);
    let statement = builder().build(&filter).count();

    insta::assert_snapshot!(
        statement.sql,
        @"SELECT COUNT(*) FROM (SELECT id FROM accessibility_checker WHERE site_id = ? AND ignored = 0 AND ignored_globally = 0 AND post_type IN (?, ?) AND rule_type IN (?) ORDER BY id LIMIT ?)"
    );
    assert_eq!(statement.params.last(), Some(&Value::Integer(100)));
}

#[test]
fn test_all_post_types_skips_post_type_clause() {
    let built = builder().build(&IssueFilter::all_post_types(10).with_post_types(["post"]));
    assert!(!built.where_sql().contains("post_type"));
    assert_eq!(built.params(), &[Value::Integer(1)]);
}

#[test]
fn test_empty_post_types_match_nothing() {
    let built = builder().build(&IssueFilter::new(10));
    assert!(built.where_sql().ends_with("1 = 0"));

    let db = fixtures::database();
    fixtures::insert_issue(db.connection(), NewIssue::default());
    let store = db.issue_store(DEFAULT_ISSUE_TABLE, 1).unwrap();

    assert_eq!(store.count(&IssueFilter::new(10)).unwrap(), 0);
    assert_eq!(
        store.count(&IssueFilter::all_post_types(10)).unwrap(),
        1
    );
}

#[test]
fn test_color_contrast_alias_matches_rule_slug() {
    let by_type = IssueFilter::all_post_types(10).with_rule_types([RuleType::ColorContrast]);
    let by_slug = IssueFilter::all_post_types(10).with_rule_slugs(["color_contrast_failure"]);

    let b = builder();
    assert_eq!(b.build(&by_type), b.build(&by_slug));

    // Adding the slug as well does not duplicate the bound value
    let both = by_type.clone().with_rule_slugs(["color_contrast_failure"]);
    assert_eq!(b.build(&both).params().len(), 2);

    let db = fixtures::database();
    let conn = db.connection();
    fixtures::insert_issue(
        conn,
        NewIssue {
            rule_slug: "color_contrast_failure",
            ..Default::default()
        },
    );
    fixtures::insert_issue(conn, NewIssue::default());
    let store = db.issue_store(DEFAULT_ISSUE_TABLE, 1).unwrap();

    assert_eq!(store.count(&by_type).unwrap(), 1);
    assert_eq!(store.count(&by_slug).unwrap(), 1);
}

#[test]
fn test_distinct_count_never_exceeds_count() {
    let db = fixtures::database();
    let conn = db.connection();
    let store_filter = IssueFilter::all_post_types(100);

    fixtures::insert_issue(conn, NewIssue::default());
    fixtures::insert_issue(
        conn,
        NewIssue {
            object: "<img src=\"b.png\">",
            ..Default::default()
        },
    );

    let store = db.issue_store(DEFAULT_ISSUE_TABLE, 1).unwrap();
    // All pairs unique: equal
    assert_eq!(store.count(&store_filter).unwrap(), 2);
    assert_eq!(store.distinct_count(&store_filter).unwrap(), 2);

    // Same pair on another post: distinct stays put
    fixtures::insert_issue(
        conn,
        NewIssue {
            post_id: 2,
            ..Default::default()
        },
    );
    assert_eq!(store.count(&store_filter).unwrap(), 3);
    assert_eq!(store.distinct_count(&store_filter).unwrap(), 2);
    assert_eq!(store.distinct_post_count(&store_filter).unwrap(), 2);
}

#[test]
fn test_ignore_modes_partition_rows() {
    let db = fixtures::database();
    let conn = db.connection();
    fixtures::insert_issue(conn, NewIssue::default());
    fixtures::insert_issue(conn, NewIssue::default());
    fixtures::insert_issue(
        conn,
        NewIssue {
            ignored: true,
            ..Default::default()
        },
    );
    fixtures::insert_issue(
        conn,
        NewIssue {
            ignored_globally: true,
            ..Default::default()
        },
    );
    fixtures::insert_issue(
        conn,
        NewIssue {
            ignored: true,
            ignored_globally: true,
            ..Default::default()
        },
    );

    let store = db.issue_store(DEFAULT_ISSUE_TABLE, 1).unwrap();
    let filter = IssueFilter::new(100).with_post_types(["post"]);
    let count = |mode| store.count(&filter.clone().with_ignore_mode(mode)).unwrap();

    assert_eq!(count(IgnoreMode::ExcludeIgnored), 2);
    assert_eq!(count(IgnoreMode::OnlyIgnored), 3);
    assert_eq!(
        count(IgnoreMode::ExcludeIgnored) + count(IgnoreMode::OnlyIgnored),
        count(IgnoreMode::IncludeIgnored)
    );
}

#[test]
fn test_site_partition() {
    let db = fixtures::database();
    let conn = db.connection();
    fixtures::insert_issue(conn, NewIssue::default());
    fixtures::insert_issue(
        conn,
        NewIssue {
            site_id: 2,
            ..Default::default()
        },
    );

    let site_two = db.issue_store(DEFAULT_ISSUE_TABLE, 2).unwrap();
    assert_eq!(site_two.site_id(), 2);
    assert_eq!(site_two.count(&IssueFilter::all_post_types(10)).unwrap(), 1);
}

#[test]
fn test_record_limit_bounds_results() {
    let db = fixtures::database();
    let conn = db.connection();
    let inserted: Vec<i64> = (0..5)
        .map(|i| {
            fixtures::insert_issue(
                conn,
                NewIssue {
                    post_id: i + 1,
                    ..Default::default()
                },
            )
        })
        .collect();

    let store = db.issue_store(DEFAULT_ISSUE_TABLE, 1).unwrap();
    let limited = IssueFilter::all_post_types(3);

    assert_eq!(store.count(&limited).unwrap(), 3);
    assert_eq!(store.ids(&limited).unwrap(), inserted[..3].to_vec());
    assert!(store.has_truncated_results(&limited).unwrap());

    let roomy = IssueFilter::all_post_types(5);
    assert_eq!(store.ids(&roomy).unwrap(), inserted);
    assert!(!store.has_truncated_results(&roomy).unwrap());
}

#[test]
fn test_truncation_ignores_rule_filters() {
    let db = fixtures::database();
    let conn = db.connection();
    for _ in 0..3 {
        fixtures::insert_issue(
            conn,
            NewIssue {
                rule_type: "warning",
                rule_slug: "link_blank",
                ..Default::default()
            },
        );
    }

    let store = db.issue_store(DEFAULT_ISSUE_TABLE, 1).unwrap();
    let errors_only = IssueFilter::all_post_types(2).with_rule_types([RuleType::Error]);

    assert_eq!(store.count(&errors_only).unwrap(), 0);
    assert!(store.has_truncated_results(&errors_only).unwrap());
}

#[test]
fn test_missing_table_is_configuration_error() {
    let db = fixtures::database();

    let err = db.issue_store("wp_9_accessibility_checker", 1).err().unwrap();
    assert!(matches!(err, QueryError::MissingTable { ref name } if name == "wp_9_accessibility_checker"));
    assert!(err.is_configuration());

    let err = db.issue_store("bad name", 1).err().unwrap();
    assert!(matches!(err, QueryError::InvalidTableName { .. }));
}

#[test]
fn test_records_follow_filter() {
    let db = fixtures::database();
    let conn = db.connection();
    let first = fixtures::insert_issue(conn, NewIssue::default());
    fixtures::insert_issue(
        conn,
        NewIssue {
            ignored: true,
            ..Default::default()
        },
    );
    fixtures::insert_issue(
        conn,
        NewIssue {
            post_id: 7,
            post_type: "page",
            rule_slug: "link_blank",
            rule_type: "warning",
            object: "<a target=\"_blank\">",
            ..Default::default()
        },
    );

    let store = db.issue_store(DEFAULT_ISSUE_TABLE, 1).unwrap();
    let records = store.records(&IssueFilter::all_post_types(10)).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, first);
    assert_eq!(records[0].rule_slug, "img_alt_missing");
    assert!(!records[0].ignored);
    assert_eq!(records[1].post_type, "page");
    assert_eq!(records[1].rule_type, "warning");
}
