use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

fn compile_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex literal {pattern}: {err}"))
}

/// `[ssh://][user@]host:owner/repo[.git]` and the `host/owner/repo` variant.
static SCP_REMOTE: Lazy<Regex> = Lazy::new(|| {
    compile_regex(r"^(?:ssh://)?(?:[^@/\s]+@)?(?P<host>[^:/@\s]+)[:/](?P<path>/?[^/\s]+/[^\s]+?)(?:\.git)?/?$")
});

/// Derives the Zoekt repository name from a git fetch URL.
///
/// `git@github.com:owner/repo.git` and `https://github.com/owner/repo.git`
/// both yield `github.com/owner/repo`. Returns `None` for anything that does
/// not look like a hosted remote (local paths, `file://` URLs, garbage).
pub fn repo_name_from_remote_url(remote_url: &str) -> Option<String> {
    let remote_url = remote_url.trim();
    if remote_url.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(remote_url) {
        if url.scheme() == "file" {
            return None;
        }
        // `host:owner/repo` parses as a URL whose scheme is the host; only
        // trust the parse when it produced a real host.
        if let Some(host) = url.host_str() {
            let path = strip_git_suffix(url.path().trim_end_matches('/'));
            // Needs at least `owner/repo` after the host.
            if !path.trim_start_matches('/').contains('/') {
                return None;
            }
            return Some(format!("{host}{path}"));
        }
    }

    let caps = SCP_REMOTE.captures(remote_url)?;
    let host = caps.name("host")?.as_str().to_ascii_lowercase();
    let path = caps.name("path")?.as_str().trim_start_matches('/');
    Some(format!("{host}/{path}"))
}

fn strip_git_suffix(path: &str) -> &str {
    path.strip_suffix(".git").unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scp_and_https_remotes_agree() {
        let expected = Some("github.com/owner/repo".to_string());
        assert_eq!(
            repo_name_from_remote_url("git@github.com:owner/repo.git"),
            expected
        );
        assert_eq!(
            repo_name_from_remote_url("https://github.com/owner/repo.git"),
            expected
        );
        assert_eq!(
            repo_name_from_remote_url("https://github.com/owner/repo"),
            expected
        );
        assert_eq!(repo_name_from_remote_url("git@github.com:owner/repo"), expected);
    }

    #[test]
    fn ssh_urls_with_and_without_scheme_port() {
        assert_eq!(
            repo_name_from_remote_url("ssh://git@github.com/owner/repo.git").as_deref(),
            Some("github.com/owner/repo")
        );
        assert_eq!(
            repo_name_from_remote_url("ssh://git@gitlab.example.com:2222/group/repo.git")
                .as_deref(),
            Some("gitlab.example.com/group/repo")
        );
        // Not a valid URL (port is not numeric), handled as scp-style.
        assert_eq!(
            repo_name_from_remote_url("ssh://git@github.com:owner/repo.git").as_deref(),
            Some("github.com/owner/repo")
        );
    }

    #[test]
    fn colon_and_slash_separators_split_host_correctly() {
        assert_eq!(
            repo_name_from_remote_url("deploy@git.internal:team/service.git").as_deref(),
            Some("git.internal/team/service")
        );
        assert_eq!(
            repo_name_from_remote_url("git.internal/team/service.git").as_deref(),
            Some("git.internal/team/service")
        );
        assert_eq!(
            repo_name_from_remote_url("git@gitlab.com:group/sub/project.git").as_deref(),
            Some("gitlab.com/group/sub/project")
        );
    }

    #[test]
    fn malformed_remotes_are_skipped() {
        assert_eq!(repo_name_from_remote_url(""), None);
        assert_eq!(repo_name_from_remote_url("file:///srv/git/repo.git"), None);
        assert_eq!(repo_name_from_remote_url("https://github.com/"), None);
        assert_eq!(repo_name_from_remote_url("https://github.com/owner"), None);
        assert_eq!(repo_name_from_remote_url("https://github.com/owner.git"), None);
        assert_eq!(repo_name_from_remote_url("git@github.com:repo"), None);
        assert_eq!(repo_name_from_remote_url("not a remote"), None);
    }
}
