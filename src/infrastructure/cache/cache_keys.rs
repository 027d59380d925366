pub fn category_stats_key(user_id: &str) -> String {
    format!("category_stats:{}", user_id)
}
