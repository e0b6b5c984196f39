//! Working out how to clone the local repository inside a sandbox

use std::path::Path;

use crate::credentials::GhToken;
use crate::error::{Result, SevenError};
use crate::host::{self, HostTools};
use crate::progress::ProgressSink;
use crate::sprite::{ExecRequest, SandboxCli};

/// What `origin` points at, plus the host token if there is one.
#[derive(Debug, Clone, Default)]
pub struct ClonePlan {
    pub url: Option<String>,
    /// `owner/repo` when `url` is on the configured GitHub host.
    pub slug: Option<String>,
    pub token: Option<GhToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStrategy {
    Skip,
    GhAuthenticated,
    GhAnonymous,
    Git,
}

impl ClonePlan {
    pub fn strategy(&self) -> CloneStrategy {
        match (&self.url, &self.slug, &self.token) {
            (None, _, _) => CloneStrategy::Skip,
            (Some(_), Some(_), Some(_)) => CloneStrategy::GhAuthenticated,
            (Some(_), Some(_), None) => CloneStrategy::GhAnonymous,
            (Some(_), None, _) => CloneStrategy::Git,
        }
    }
}

/// Whether `git remote` output lists a remote named exactly `origin`.
pub fn has_origin(remotes: &str) -> bool {
    remotes.lines().any(|line| line.trim() == "origin")
}

/// `owner/repo` for a URL on `gh_host`, or `None`.
pub fn repo_slug(url: &str, gh_host: &str) -> Option<String> {
    let prefixes = [
        format!("git@{}:", gh_host),
        format!("https://{}/", gh_host),
        format!("http://{}/", gh_host),
        format!("ssh://git@{}/", gh_host),
    ];
    let rest = prefixes.iter().find_map(|p| url.strip_prefix(p.as_str()))?;
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let mut segments = rest.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
            Some(format!("{}/{}", owner, repo))
        }
        _ => None,
    }
}

/// Inspect `cwd` and decide what to clone. Never fails for a directory that
/// simply is not a clonable repository; the plan is then empty.
pub fn plan<H: HostTools + ?Sized>(
    host: &H,
    cwd: &Path,
    gh_host: &str,
    log: &dyn ProgressSink,
    prefix: &str,
) -> Result<ClonePlan> {
    if !host.has_binary("git") {
        log.log(&format!("{} git not found", prefix));
        return Ok(ClonePlan::default());
    }

    let dir = cwd.to_string_lossy();
    let inside = host::output_if_success(
        host,
        "git",
        &["-C", &dir, "rev-parse", "--is-inside-work-tree"],
    );
    if inside.as_deref() != Some("true") {
        log.log(&format!("{} not inside a git repo", prefix));
        return Ok(ClonePlan::default());
    }

    let remotes = host.capture("git", &["-C", &dir, "remote"])?;
    if !remotes.success {
        return Err(SevenError::CommandFailed {
            command: "git remote".to_string(),
            detail: remotes.text,
        });
    }
    let remotes = remotes.text.trim();
    if !remotes.is_empty() {
        log.log(&format!(
            "{} git remotes: {}",
            prefix,
            remotes.lines().collect::<Vec<_>>().join(", ")
        ));
    }
    if !has_origin(remotes) {
        return Ok(ClonePlan::default());
    }

    let url = host.capture("git", &["-C", &dir, "remote", "get-url", "origin"])?;
    if !url.success {
        return Err(SevenError::CommandFailed {
            command: "git remote get-url origin".to_string(),
            detail: url.text,
        });
    }
    let url = url.text.trim().to_string();
    if url.is_empty() {
        return Ok(ClonePlan::default());
    }
    log.log(&format!("{} repo url: {}", prefix, url));

    let token = GhToken::from_host(host);
    if token.is_some() {
        log.log(&format!("{} detected gh token on host", prefix));
    }

    Ok(ClonePlan {
        slug: repo_slug(&url, gh_host),
        url: Some(url),
        token,
    })
}

/// Clone into `~/<sandbox>` inside the sandbox. Returns whether a clone ran.
pub fn execute<S: SandboxCli + ?Sized>(
    cli: &S,
    sandbox: &str,
    plan: &ClonePlan,
    log: &dyn ProgressSink,
    prefix: &str,
) -> Result<bool> {
    let req = match (plan.strategy(), &plan.url, &plan.slug, &plan.token) {
        (CloneStrategy::GhAuthenticated, _, Some(slug), Some(token)) => {
            log.log(&format!("{} cloning via gh repo clone: {}", prefix, slug));
            ExecRequest::new(["gh", "repo", "clone", slug.as_str(), sandbox])
                .env("GH_TOKEN", token.expose())
        }
        (CloneStrategy::GhAnonymous, _, Some(slug), _) => {
            log.log(&format!(
                "{} cloning via gh repo clone (no token): {}",
                prefix, slug
            ));
            ExecRequest::new(["gh", "repo", "clone", slug.as_str(), sandbox])
        }
        (CloneStrategy::Git, Some(url), _, _) => {
            log.log(&format!("{} cloning via git clone: {}", prefix, url));
            ExecRequest::new(["git", "clone", url.as_str(), sandbox])
        }
        _ => {
            log.log(&format!("{} no repo url found, skipping clone", prefix));
            return Ok(false);
        }
    };

    cli.exec(sandbox, &req).map_err(SevenError::CloneFailed)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::process::Captured;
    use crate::progress::NullSink;

    #[test]
    fn test_has_origin() {
        assert!(has_origin("upstream\norigin\n"));
        assert!(has_origin("  origin  "));
        assert!(!has_origin("origin2\nmy-origin"));
        assert!(!has_origin(""));
    }

    #[test]
    fn test_repo_slug_accepted_forms() {
        let host = "github.com";
        assert_eq!(
            repo_slug("git@github.com:octo/hello.git", host).as_deref(),
            Some("octo/hello")
        );
        assert_eq!(
            repo_slug("https://github.com/octo/hello", host).as_deref(),
            Some("octo/hello")
        );
        assert_eq!(
            repo_slug("http://github.com/octo/hello.git", host).as_deref(),
            Some("octo/hello")
        );
        assert_eq!(
            repo_slug("ssh://git@github.com/octo/hello.git", host).as_deref(),
            Some("octo/hello")
        );
    }

    #[test]
    fn test_repo_slug_rejections() {
        let host = "github.com";
        assert_eq!(repo_slug("https://gitlab.com/octo/hello.git", host), None);
        assert_eq!(repo_slug("https://github.com/octo", host), None);
        assert_eq!(repo_slug("https://github.com/octo/hello/extra", host), None);
        assert_eq!(repo_slug("https://github.com//hello", host), None);
        assert_eq!(repo_slug("ssh://git@github.com/a/b/c.git", host), None);
        assert_eq!(repo_slug("/srv/git/hello.git", host), None);
    }

    #[test]
    fn test_repo_slug_custom_host() {
        assert_eq!(
            repo_slug("git@ghe.corp:team/svc.git", "ghe.corp").as_deref(),
            Some("team/svc")
        );
        assert_eq!(repo_slug("git@github.com:team/svc.git", "ghe.corp"), None);
    }

    #[test]
    fn test_strategy_precedence() {
        let mut plan = ClonePlan::default();
        assert_eq!(plan.strategy(), CloneStrategy::Skip);

        plan.url = Some("/srv/git/x".to_string());
        assert_eq!(plan.strategy(), CloneStrategy::Git);

        plan.token = GhToken::new("t");
        assert_eq!(plan.strategy(), CloneStrategy::Git);

        plan.slug = Some("o/r".to_string());
        assert_eq!(plan.strategy(), CloneStrategy::GhAuthenticated);

        plan.token = None;
        assert_eq!(plan.strategy(), CloneStrategy::GhAnonymous);
    }

    fn repo_host(cwd: &str) -> FakeHost {
        FakeHost::with_binaries(&["git"])
            .respond(
                &format!("git -C {} rev-parse --is-inside-work-tree", cwd),
                Captured::ok("true"),
            )
            .respond(&format!("git -C {} remote", cwd), Captured::ok("origin"))
            .respond(
                &format!("git -C {} remote get-url origin", cwd),
                Captured::ok("git@github.com:octo/hello.git\n"),
            )
    }

    #[test]
    fn test_plan_without_git_is_empty() {
        let plan = plan(&FakeHost::default(), Path::new("/w"), "github.com", &NullSink, "[t]")
            .unwrap();
        assert_eq!(plan.strategy(), CloneStrategy::Skip);
    }

    #[test]
    fn test_plan_outside_work_tree_is_empty() {
        let host = FakeHost::with_binaries(&["git"]);
        let plan = plan(&host, Path::new("/w"), "github.com", &NullSink, "[t]").unwrap();
        assert!(plan.url.is_none());
    }

    #[test]
    fn test_plan_reads_origin_and_token() {
        let host = repo_host("/w");
        let plan_no_gh = plan(&host, Path::new("/w"), "github.com", &NullSink, "[t]").unwrap();
        assert_eq!(plan_no_gh.slug.as_deref(), Some("octo/hello"));
        assert_eq!(plan_no_gh.strategy(), CloneStrategy::GhAnonymous);

        let mut host = repo_host("/w").respond("gh auth token", Captured::ok("gho_x"));
        host.binaries.push("gh".to_string());
        let plan_gh = plan(&host, Path::new("/w"), "github.com", &NullSink, "[t]").unwrap();
        assert_eq!(plan_gh.strategy(), CloneStrategy::GhAuthenticated);
    }

    #[test]
    fn test_plan_without_origin_is_empty() {
        let host = FakeHost::with_binaries(&["git"])
            .respond(
                "git -C /w rev-parse --is-inside-work-tree",
                Captured::ok("true"),
            )
            .respond("git -C /w remote", Captured::ok("upstream"));
        let plan = plan(&host, Path::new("/w"), "github.com", &NullSink, "[t]").unwrap();
        assert!(plan.url.is_none());
    }
}
