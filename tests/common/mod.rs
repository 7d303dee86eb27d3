#![allow(dead_code)]

use autoadmin_sdk::schema::load_from_value;
use autoadmin_sdk::{AppState, FullSchema, MemoryStorage, ResourceEngine, Row, Settings};
use serde_json::{json, Value};
use std::sync::Arc;

/// League schema: teams with integer ids, players with uuid ids, badges pointing at players.
pub fn league_schema() -> FullSchema {
    load_from_value(json!({
        "dialect": "postgresql",
        "enums": [{ "name": "Position", "values": [
            { "name": "GOALKEEPER" }, { "name": "DEFENDER" }, { "name": "MIDFIELDER" }, { "name": "FORWARD" }
        ]}],
        "models": [
            { "name": "Team", "fields": [
                { "kind": "scalar", "name": "id", "type": "Int", "isId": true, "isRequired": true,
                  "hasDefaultValue": true, "default": { "name": "autoincrement", "args": [] } },
                { "kind": "scalar", "name": "name", "type": "String", "isRequired": true, "isUnique": true },
                { "kind": "object", "name": "players", "type": "Player", "isList": true }
            ]},
            { "name": "Player", "fields": [
                { "kind": "scalar", "name": "id", "type": "String", "isId": true, "isRequired": true,
                  "hasDefaultValue": true, "default": { "name": "uuid", "args": [] } },
                { "kind": "scalar", "name": "name", "type": "String", "isRequired": true },
                { "kind": "scalar", "name": "rating", "type": "Float" },
                { "kind": "enum", "name": "position", "type": "Position" },
                { "kind": "scalar", "name": "teamId", "type": "Int", "isReadOnly": true },
                { "kind": "object", "name": "team", "type": "Team", "relationFromFields": ["teamId"], "relationToFields": ["id"] },
                { "kind": "scalar", "name": "createdAt", "type": "DateTime", "isRequired": true,
                  "hasDefaultValue": true, "default": { "name": "now", "args": [] } },
                { "kind": "scalar", "name": "updatedAt", "type": "DateTime", "isRequired": true, "isUpdatedAt": true }
            ]},
            { "name": "Badge", "fields": [
                { "kind": "scalar", "name": "code", "type": "String", "isId": true, "isRequired": true,
                  "hasDefaultValue": true, "default": { "name": "cuid", "args": [] } },
                { "kind": "scalar", "name": "label", "type": "String", "isRequired": true },
                { "kind": "scalar", "name": "playerId", "type": "String", "isReadOnly": true,
                  "default": { "name": "dbgenerated", "args": ["gen_random_uuid()"] } },
                { "kind": "object", "name": "player", "type": "Player", "relationFromFields": ["playerId"], "relationToFields": ["id"] }
            ]}
        ]
    }))
    .expect("league schema is valid")
}

pub fn engine() -> ResourceEngine {
    ResourceEngine::new(Arc::new(league_schema()), Arc::new(MemoryStorage::new()))
}

pub fn state() -> AppState {
    AppState::new(engine(), Settings::default())
}

pub fn row(v: Value) -> Row {
    v.as_object().expect("object literal").clone()
}
