//! Built-in records used when the API cannot be reached.

use serde_json::{json, Value};

pub fn users() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Alice", "username": "alice", "email": "alice@example.com"}),
        json!({"id": 2, "name": "Bob", "username": "bob", "email": "bob@example.com"}),
    ]
}

pub fn posts() -> Vec<Value> {
    vec![
        json!({"userId": 1, "id": 1, "title": "Hello", "body": "First post"}),
        json!({"userId": 1, "id": 2, "title": "World", "body": "Second post"}),
        json!({"userId": 2, "id": 3, "title": "Another", "body": "Third post"}),
    ]
}
