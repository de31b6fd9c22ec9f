// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub fn matches_query(item: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    item.to_lowercase().contains(&query.to_lowercase())
}

pub fn filter_items<'a, S>(items: &'a [S], query: &str) -> Vec<&'a str>
where
    S: AsRef<str>,
{
    items
        .iter()
        .map(AsRef::as_ref)
        .filter(|item| matches_query(item, query))
        .collect()
}
