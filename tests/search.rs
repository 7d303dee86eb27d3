mod common;

use autoadmin_sdk::schema::load_from_value;
use autoadmin_sdk::{classify_foreign_key, compile, compile_with, Condition, Filter, IdKind, ListQuery};
use common::{engine, league_schema, row};
use serde_json::{json, Value};

fn candidates(f: &Filter) -> &[Filter] {
    match f {
        Filter::Or(items) => items,
        other => panic!("expected OR, got {:?}", other),
    }
}

fn on_field<'a>(f: &'a Filter, name: &str) -> Vec<&'a Condition> {
    candidates(f)
        .iter()
        .filter_map(|c| match c {
            Filter::Field { field, condition } if field == name => Some(condition),
            _ => None,
        })
        .collect()
}

#[test]
fn empty_query_means_unfiltered() {
    let schema = league_schema();
    let player = schema.model("Player").unwrap();
    assert!(compile("", player, &schema).is_none());
}

#[test]
fn foreign_keys_are_classified_by_their_generator() {
    let schema = league_schema();
    let player = schema.model("Player").unwrap();
    let badge = schema.model("Badge").unwrap();

    let team_fk = classify_foreign_key(player.field("teamId").unwrap(), player, &schema).unwrap();
    assert_eq!(team_fk.id_kind, IdKind::SequentialInt);
    assert_eq!(team_fk.target.name, "Team");

    let player_fk = classify_foreign_key(badge.field("playerId").unwrap(), badge, &schema).unwrap();
    assert_eq!(player_fk.id_kind, IdKind::RandomUuid);

    assert!(classify_foreign_key(player.field("name").unwrap(), player, &schema).is_none());
}

#[test]
fn integer_foreign_key_needs_integer_text() {
    let schema = league_schema();
    let player = schema.model("Player").unwrap();

    let f = compile("12a", player, &schema).unwrap();
    assert!(on_field(&f, "teamId").is_empty());

    let f = compile("12", player, &schema).unwrap();
    assert_eq!(on_field(&f, "teamId"), vec![&Condition::Equals(json!(12))]);
}

#[test]
fn uuid_foreign_key_needs_canonical_uuid_text() {
    let schema = league_schema();
    let badge = schema.model("Badge").unwrap();

    for raw in ["abc", "12", "3f2c9a10aaaa4bbb8ccc000000000000", "3f2c9a10-aaaa-4bbb-8ccc-00000000000"] {
        let f = compile(raw, badge, &schema).unwrap();
        assert!(on_field(&f, "playerId").is_empty(), "{} produced a candidate", raw);
    }
    let id = "3f2c9a10-aaaa-4bbb-8ccc-000000000000";
    let f = compile(id, badge, &schema).unwrap();
    assert_eq!(on_field(&f, "playerId"), vec![&Condition::Equals(json!(id))]);
}

#[test]
fn enum_members_match_case_insensitively() {
    let schema = league_schema();
    let player = schema.model("Player").unwrap();
    let f = compile("er", player, &schema).unwrap();
    let members: Vec<_> = on_field(&f, "position")
        .into_iter()
        .map(|c| match c {
            Condition::Equals(Value::String(s)) => s.as_str(),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(members, vec!["GOALKEEPER", "DEFENDER", "MIDFIELDER"]);
}

#[test]
fn dialect_decides_case_insensitive_contains() {
    let mysql = load_from_value(json!({
        "dialect": "mysql",
        "models": [{ "name": "Note", "fields": [
            { "kind": "scalar", "name": "id", "type": "Int", "isId": true },
            { "kind": "scalar", "name": "body", "type": "String" }
        ]}]
    }))
    .unwrap();
    let f = compile("x", mysql.model("Note").unwrap(), &mysql).unwrap();
    assert_eq!(
        on_field(&f, "body"),
        vec![&Condition::Contains { value: "x".into(), insensitive: false }]
    );

    let pg = league_schema();
    let f = compile("x", pg.model("Team").unwrap(), &pg).unwrap();
    assert_eq!(
        on_field(&f, "name"),
        vec![&Condition::Contains { value: "x".into(), insensitive: true }]
    );
}

#[test]
fn extension_clauses_are_appended() {
    let schema = league_schema();
    let team = schema.model("Team").unwrap();
    let f = compile_with("7", team, &schema, |raw| vec![Filter::equals("name", format!("Team {}", raw))]).unwrap();
    assert_eq!(candidates(&f).last(), Some(&Filter::equals("name", "Team 7")));
}

#[tokio::test]
async fn any_substring_finds_the_stored_text() {
    let engine = engine();
    engine.create("Team", row(json!({ "name": "Rovers" }))).await.unwrap();
    let created = engine.create("Player", row(json!({ "name": "Alexandra Okafor", "teamId": 1 }))).await.unwrap();
    engine.create("Player", row(json!({ "name": "Ben Ito", "teamId": 1 }))).await.unwrap();

    for needle in ["Alex", "okafor", "ra O", "Alexandra Okafor"] {
        let filter = engine.search("Player", needle).unwrap();
        let page = engine
            .list("player", ListQuery { filter, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.rows.len(), 1, "search {:?}", needle);
        assert_eq!(page.rows[0]["id"], created["id"]);
    }
}

#[tokio::test]
async fn empty_disjunction_matches_nothing() {
    let engine = engine();
    engine.create("Team", row(json!({ "name": "Rovers" }))).await.unwrap();
    let page = engine
        .list("Team", ListQuery { filter: Some(Filter::Or(vec![])), ..Default::default() })
        .await
        .unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.total_pages, 0);
}
