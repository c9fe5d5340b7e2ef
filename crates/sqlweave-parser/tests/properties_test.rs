//! Properties that hold for every resolved statement and segment list

use sqlweave_ast::{Statement, TemplateSegment};
use sqlweave_lexer::Lexicon;
use sqlweave_parser::{analyze_query, parse_segments, resolve_placeholders, Markers, ParseError};

const TEMPLATES: &[&str] = &[
    "SELECT id FROM user",
    "  SELECT id,\n\tname   FROM user\n WHERE id = ${id}  ",
    "UPDATE user SET name = ${name}, email = ${email} WHERE id = ${id}",
    "SELECT * FROM #{table} WHERE id = ${id} ORDER BY #{column} LIMIT ${limit}",
    "INSERT INTO log (a, b, a) VALUES (${a}, ${b}, ${a})",
    "SELECT 'it''s', \"q\" FROM t WHERE name = ${ name }",
];

fn marker_count(stmt: &Statement, markers: &Markers) -> usize {
    stmt.text.matches(markers.bind.as_str()).count() + stmt.text.matches(markers.substitute.as_str()).count()
}

#[test]
fn marker_count_matches_parameter_count() {
    let markers = Markers::default();
    for template in TEMPLATES {
        let stmt = resolve_placeholders(template, &markers).expect("resolve failed");
        assert_eq!(
            marker_count(&stmt, &markers),
            stmt.param_count(),
            "marker count mismatch for {:?} -> {:?}",
            template,
            stmt.text
        );
    }
}

#[test]
fn duplicate_names_are_kept_in_order() {
    let stmt = resolve_placeholders(TEMPLATES[4], &Markers::default()).expect("resolve failed");
    assert_eq!(stmt.bind_params, vec!["a", "b", "a"]);
}

#[test]
fn placeholder_names_are_trimmed() {
    let stmt = resolve_placeholders(TEMPLATES[5], &Markers::default()).expect("resolve failed");
    assert_eq!(stmt.bind_params, vec!["name"]);
}

#[test]
fn text_without_placeholders_is_whitespace_normalized() {
    let template = "  SELECT  a,\n   b\tFROM   t \n";
    let stmt = resolve_placeholders(template, &Markers::default()).expect("resolve failed");
    let normalized: Vec<&str> = template.split_whitespace().collect();
    assert_eq!(stmt.text, normalized.join(" "));
    assert_eq!(stmt.param_count(), 0);
}

#[test]
fn resolving_twice_is_idempotent() {
    let markers = Markers::default();
    for template in TEMPLATES {
        let once = resolve_placeholders(template, &markers).expect("resolve failed");
        let twice = resolve_placeholders(&once.text, &markers).expect("re-resolve failed");
        assert_eq!(twice.text, once.text, "text changed for {:?}", template);
        assert!(twice.bind_params.is_empty());
        assert!(twice.substitute_params.is_empty());
    }
}

#[test]
fn every_segment_statement_keeps_the_marker_invariant() {
    let markers = Markers::default();
    let template = "SELECT a FROM t WHERE x = ${x} \
        %{if ys != nil} AND y IN (%{endif}\
        %{for y in ys join ', '}${y}%{endfor}\
        %{if order} ORDER BY #{order} %{endif}";
    let segments = parse_segments(template, &markers).expect("segments failed");

    assert!(segments.iter().any(TemplateSegment::is_dynamic));
    for segment in &segments {
        let stmt = segment.statement();
        assert_eq!(marker_count(stmt, &markers), stmt.param_count(), "in {:?}", segment);
    }
}

#[test]
fn mismatched_end_tag_is_rejected() {
    let err = parse_segments("SELECT a FROM t %{if x} AND b = 1 %{endfor}", &Markers::default())
        .expect_err("expected a mismatched end tag");
    assert!(matches!(err, ParseError::UnmatchedDirective { ref found, .. } if found == "`endfor`"));
}

#[test]
fn every_field_resolves_to_a_declared_table() {
    let lexicon = Lexicon::sql();
    let queries = [
        "SELECT id, u.name AS uname FROM user u",
        "SELECT a.x, b.y, z FROM alpha a JOIN beta b ON a.id = b.id",
        "SELECT COUNT(*) AS n, IFNULL(t.v, 0) v FROM data t",
        "SELECT o.id FROM shop.orders o, users",
    ];
    for query in queries {
        let shape = analyze_query(query, &lexicon).expect("analyze failed");
        for field in &shape.fields {
            let table = field.table.as_deref().expect("unresolved field");
            assert!(
                shape.tables.iter().any(|t| t.name == table),
                "field {:?} bound to undeclared table in {:?}",
                field,
                query
            );
        }
    }
}
