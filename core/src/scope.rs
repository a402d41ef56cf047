use zoekt_nav_git::RepositoryResolver;

/// Restricts `query` to `repository_ids` by appending `repo:` terms.
///
/// The query is parenthesized first since `or` binds loosest in Zoekt.
pub fn build_scoped_query<I, S>(query: &str, repository_ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let terms: Vec<String> = repository_ids
        .into_iter()
        .map(|id| format!("repo:{}", id.as_ref()))
        .collect();
    match terms.as_slice() {
        [] => query.to_string(),
        [term] => format!("({query}) {term}"),
        terms => format!("({query}) ({})", terms.join(" or ")),
    }
}

/// All repositories when nothing is checked out locally, otherwise the
/// persisted choice (local only when never chosen).
pub fn default_search_all_repos(resolver: &RepositoryResolver, persisted: Option<bool>) -> bool {
    if !resolver.has_local_repositories() {
        return true;
    }
    persisted.unwrap_or(false)
}
