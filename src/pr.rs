//! Pull-request and CI state, read through the `gh` CLI.
//!
//! Every query returns `None` or an empty list when `gh` is missing, fails,
//! times out or prints something that is not the expected JSON.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::trace;

use crate::ports::runner::CommandRunner;

const GH_TIMEOUT: Duration = Duration::from_secs(10);

/// `gh` prints `null` for unset strings such as a pending check's conclusion.
fn nullable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A pull request as reported by `gh pr view` or `gh pr list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrInfo {
    /// PR number.
    pub number: u64,
    /// PR title.
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    /// Web URL.
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    /// `OPEN`, `CLOSED` or `MERGED`.
    #[serde(deserialize_with = "nullable")]
    pub state: String,
    /// `MERGEABLE`, `CONFLICTING` or `UNKNOWN`.
    #[serde(deserialize_with = "nullable")]
    pub mergeable: String,
    /// Target branch.
    #[serde(rename = "baseRefName", deserialize_with = "nullable")]
    pub base_ref: String,
    /// Source branch.
    #[serde(rename = "headRefName", deserialize_with = "nullable")]
    pub head_ref: String,
}

/// One CI check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckInfo {
    /// Check name.
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    /// `COMPLETED`, `IN_PROGRESS`, `QUEUED`, ...
    #[serde(deserialize_with = "nullable")]
    pub status: String,
    /// Meaningful only once the check is completed.
    #[serde(deserialize_with = "nullable")]
    pub conclusion: String,
    /// Link to the check's logs.
    #[serde(rename = "detailsUrl", deserialize_with = "nullable")]
    pub details_url: String,
}

/// A submitted review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewInfo {
    /// Reviewer login.
    pub author: String,
    /// `APPROVED`, `CHANGES_REQUESTED`, `COMMENTED`, ...
    pub state: String,
    /// Review body.
    pub body: String,
}

/// A comment left on the PR, optionally anchored to a file line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewComment {
    /// Commenter login.
    pub author: String,
    /// Comment text.
    pub body: String,
    /// File the comment is attached to, if any.
    pub path: String,
    /// Line the comment is attached to, if any.
    pub line: Option<u64>,
}

impl ReviewComment {
    /// `path:line`, or just `path` when there is no line.
    #[must_use]
    pub fn location(&self) -> String {
        match self.line {
            Some(line) if line > 0 => format!("{}:{line}", self.path),
            _ => self.path.clone(),
        }
    }
}

/// Checks split by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    /// Completed with a failing conclusion.
    pub failing: Vec<CheckInfo>,
    /// Completed with SUCCESS, SKIPPED or NEUTRAL.
    pub passing: Vec<CheckInfo>,
    /// Not completed yet.
    pub pending: Vec<CheckInfo>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Login {
    login: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawReview {
    author: Login,
    #[serde(deserialize_with = "nullable")]
    state: String,
    #[serde(deserialize_with = "nullable")]
    body: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawReviews {
    reviews: Vec<RawReview>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawComment {
    author: Option<Login>,
    user: Option<Login>,
    #[serde(deserialize_with = "nullable")]
    body: String,
    #[serde(deserialize_with = "nullable")]
    path: String,
    line: Option<u64>,
}

impl From<RawComment> for ReviewComment {
    fn from(raw: RawComment) -> Self {
        let author = raw.author.or(raw.user).map(|l| l.login).unwrap_or_default();
        Self { author, body: raw.body, path: raw.path, line: raw.line }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawComments {
    List(Vec<RawComment>),
    Wrapped { comments: Vec<RawComment> },
}

fn gh_json<T: DeserializeOwned>(runner: &dyn CommandRunner, dir: &Path, args: &[&str]) -> Option<T> {
    let output = runner.run_with_timeout(dir, GH_TIMEOUT, "gh", args).ok()?;
    if output.is_empty() {
        return None;
    }
    match serde_json::from_str(&output) {
        Ok(value) => Some(value),
        Err(e) => {
            trace!(error = %e, "unexpected gh output");
            None
        }
    }
}

/// The open PR whose head is `branch`, if any.
pub fn existing_pr_for_branch(runner: &dyn CommandRunner, dir: &Path, branch: &str) -> Option<PrInfo> {
    let prs: Vec<PrInfo> = gh_json(
        runner,
        dir,
        &["pr", "list", "--head", branch, "--json", "number,title,url,state", "--limit", "1"],
    )?;
    prs.into_iter().next()
}

/// The PR associated with the checked-out branch.
pub fn current_pr(runner: &dyn CommandRunner, dir: &Path) -> Option<PrInfo> {
    gh_json(
        runner,
        dir,
        &["pr", "view", "--json", "number,title,url,state,mergeable,baseRefName,headRefName"],
    )
}

/// CI checks for PR `number`.
pub fn checks(runner: &dyn CommandRunner, dir: &Path, number: u64) -> Vec<CheckInfo> {
    let number = number.to_string();
    gh_json(runner, dir, &["pr", "checks", &number, "--json", "name,status,conclusion,detailsUrl"])
        .unwrap_or_default()
}

/// Reviews submitted on PR `number`.
pub fn reviews(runner: &dyn CommandRunner, dir: &Path, number: u64) -> Vec<ReviewInfo> {
    let number = number.to_string();
    let raw: RawReviews =
        gh_json(runner, dir, &["pr", "view", &number, "--json", "reviews"]).unwrap_or_default();
    raw.reviews
        .into_iter()
        .map(|r| ReviewInfo { author: r.author.login, state: r.state, body: r.body })
        .collect()
}

/// Comments on PR `number`.
///
/// Asks `gh pr view` first and falls back to the REST endpoint. Accepts
/// a list of comments with either `author.login` or `user.login`, bare or
/// wrapped in an object under `comments`.
pub fn review_comments(runner: &dyn CommandRunner, dir: &Path, number: u64) -> Vec<ReviewComment> {
    let view = runner
        .run_with_timeout(
            dir,
            GH_TIMEOUT,
            "gh",
            &["pr", "view", &number.to_string(), "--json", "reviewRequests,comments"],
        )
        .ok()
        .filter(|out| !out.is_empty());
    let output = match view {
        Some(out) => out,
        None => {
            trace!("gh pr view gave no comments, trying the API");
            let endpoint = format!("repos/{{owner}}/{{repo}}/pulls/{number}/comments");
            match runner.run_with_timeout(dir, GH_TIMEOUT, "gh", &["api", &endpoint]) {
                Ok(out) if !out.is_empty() => out,
                _ => return Vec::new(),
            }
        }
    };
    parse_comments(&output)
}

/// Parses any of the tolerated comment payload shapes.
#[must_use]
pub fn parse_comments(output: &str) -> Vec<ReviewComment> {
    let raw = match serde_json::from_str::<RawComments>(output) {
        Ok(RawComments::List(list) | RawComments::Wrapped { comments: list }) => list,
        Err(e) => {
            trace!(error = %e, "unrecognised comment payload");
            return Vec::new();
        }
    };
    raw.into_iter().map(ReviewComment::from).collect()
}

/// Splits checks into failing, passing and pending.
///
/// A check that has not completed is pending whatever its conclusion says.
#[must_use]
pub fn categorize_checks(checks: &[CheckInfo]) -> CheckSummary {
    let mut summary = CheckSummary::default();
    for check in checks {
        let bucket = if !check.status.eq_ignore_ascii_case("COMPLETED") {
            &mut summary.pending
        } else if ["SUCCESS", "SKIPPED", "NEUTRAL"]
            .iter()
            .any(|ok| check.conclusion.eq_ignore_ascii_case(ok))
        {
            &mut summary.passing
        } else {
            &mut summary.failing
        };
        bucket.push(check.clone());
    }
    summary
}

/// Human label for `gh`'s mergeable state.
#[must_use]
pub fn mergeable_label(mergeable: &str) -> String {
    match mergeable.to_ascii_uppercase().as_str() {
        "MERGEABLE" => "✅ Yes".to_string(),
        "CONFLICTING" => "❌ Conflicts".to_string(),
        "UNKNOWN" => "⏳ Checking...".to_string(),
        _ => mergeable.to_string(),
    }
}

/// Icon for a review state.
#[must_use]
pub fn review_icon(state: &str) -> &'static str {
    match state.to_ascii_uppercase().as_str() {
        "APPROVED" => "✅",
        "CHANGES_REQUESTED" => "❌",
        "COMMENTED" => "💬",
        "PENDING" => "⏳",
        "DISMISSED" => "🚫",
        _ => "•",
    }
}

/// Ordered list of things blocking the PR.
///
/// Still-running checks are only mentioned when nothing else is wrong.
#[must_use]
pub fn determine_issues(
    pr: &PrInfo,
    checks: &CheckSummary,
    reviews: &[ReviewInfo],
    comments: &[ReviewComment],
) -> Vec<String> {
    let mut issues = Vec::new();
    if pr.mergeable.eq_ignore_ascii_case("CONFLICTING") {
        issues.push("**Merge conflicts** - Resolve conflicts with the base branch".to_string());
    }
    if !checks.failing.is_empty() {
        let names: Vec<&str> = checks.failing.iter().map(|c| c.name.as_str()).collect();
        issues.push(format!("**CI failures** - Fix: {}", names.join(", ")));
    }
    if let Some(review) = reviews.iter().find(|r| r.state.eq_ignore_ascii_case("CHANGES_REQUESTED")) {
        issues.push(format!("**Changes requested** by @{}", review.author));
    }
    if !comments.is_empty() {
        issues.push(format!("**{} review comment(s)** to address", comments.len()));
    }
    if issues.is_empty() && !checks.pending.is_empty() {
        issues.push(format!(
            "**{} check(s) still running** - Wait for completion",
            checks.pending.len()
        ));
    }
    issues
}
