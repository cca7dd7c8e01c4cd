// Mirrors the DDL in `sqlite::RECREATE_TABLES`.

diesel::table! {
    users (id) {
        id -> BigInt,
        name -> Text,
        username -> Text,
        email -> Text,
    }
}

diesel::table! {
    posts (id) {
        id -> BigInt,
        user_id -> BigInt,
        title -> Text,
        body -> Text,
        title_length -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, posts,);
